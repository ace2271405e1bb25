use crate::lex::{Error as LexerError, Lexer, Token, TokenType};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Or,
    And,
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
    Contains,
    StartsWith,
    EndsWith,
    Concat,
}

impl BinaryOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            BinaryOp::Or => "or",
            BinaryOp::And => "and",
            BinaryOp::Eq => "eq",
            BinaryOp::Ne => "ne",
            BinaryOp::Gt => "gt",
            BinaryOp::Ge => "ge",
            BinaryOp::Lt => "lt",
            BinaryOp::Le => "le",
            BinaryOp::Contains => "contains",
            BinaryOp::StartsWith => "startswith",
            BinaryOp::EndsWith => "endswith",
            BinaryOp::Concat => "concat",
        }
    }

    /// Written `name(arg1,arg2)` rather than infix.
    pub fn is_function(&self) -> bool {
        matches!(
            self,
            BinaryOp::Contains | BinaryOp::StartsWith | BinaryOp::EndsWith | BinaryOp::Concat
        )
    }

    fn infix_from_word(word: &str) -> Option<BinaryOp> {
        match word {
            "or" => Some(BinaryOp::Or),
            "and" => Some(BinaryOp::And),
            "eq" => Some(BinaryOp::Eq),
            "ne" => Some(BinaryOp::Ne),
            "gt" => Some(BinaryOp::Gt),
            "ge" => Some(BinaryOp::Ge),
            "lt" => Some(BinaryOp::Lt),
            "le" => Some(BinaryOp::Le),
            _ => None,
        }
    }

    fn function_from_word(word: &str) -> Option<BinaryOp> {
        match word {
            "concat" => Some(BinaryOp::Concat),
            "contains" => Some(BinaryOp::Contains),
            "startswith" => Some(BinaryOp::StartsWith),
            "endswith" => Some(BinaryOp::EndsWith),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryFn {
    Not,
    Length,
    IndexOf,
    ToLower,
    ToUpper,
    Trim,
    Year,
    Month,
    Day,
    Hour,
    Minute,
    Second,
    FractionalSecond,
    Date,
    Time,
    Now,
    Round,
    Floor,
    Ceiling,
}

impl UnaryFn {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnaryFn::Not => "not",
            UnaryFn::Length => "length",
            UnaryFn::IndexOf => "indexof",
            UnaryFn::ToLower => "tolower",
            UnaryFn::ToUpper => "toupper",
            UnaryFn::Trim => "trim",
            UnaryFn::Year => "year",
            UnaryFn::Month => "month",
            UnaryFn::Day => "day",
            UnaryFn::Hour => "hour",
            UnaryFn::Minute => "minute",
            UnaryFn::Second => "second",
            UnaryFn::FractionalSecond => "fractionalsecond",
            UnaryFn::Date => "date",
            UnaryFn::Time => "time",
            UnaryFn::Now => "now",
            UnaryFn::Round => "round",
            UnaryFn::Floor => "floor",
            UnaryFn::Ceiling => "ceiling",
        }
    }

    fn from_word(word: &str) -> Option<UnaryFn> {
        match word {
            "not" => Some(UnaryFn::Not),
            "length" => Some(UnaryFn::Length),
            "indexof" => Some(UnaryFn::IndexOf),
            "tolower" => Some(UnaryFn::ToLower),
            "toupper" => Some(UnaryFn::ToUpper),
            "trim" => Some(UnaryFn::Trim),
            "year" => Some(UnaryFn::Year),
            "month" => Some(UnaryFn::Month),
            "day" => Some(UnaryFn::Day),
            "hour" => Some(UnaryFn::Hour),
            "minute" => Some(UnaryFn::Minute),
            "second" => Some(UnaryFn::Second),
            "fractionalsecond" => Some(UnaryFn::FractionalSecond),
            "date" => Some(UnaryFn::Date),
            "time" => Some(UnaryFn::Time),
            "now" => Some(UnaryFn::Now),
            "round" => Some(UnaryFn::Round),
            "floor" => Some(UnaryFn::Floor),
            "ceiling" => Some(UnaryFn::Ceiling),
            _ => None,
        }
    }
}

/// Expressions borrow their textual payload from the query string: the tree
///  lives exactly as long as one parse/build call and nothing escapes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expr<'input> {
    /// A column name or an `a/b/c` navigation path, stored as the source slice.
    Identifier(&'input str),
    /// A single-quoted string, quotes stripped.
    StringLiteral(&'input str),
    /// A base-10 integer, kept as text until binding.
    NumberLiteral(&'input str),
    /// `not` and the unary functions. The operand is `None` only for `now()`.
    Unary(UnaryFn, Option<ExprId>),
    /// Logical connectives, comparisons, and the binary string functions.
    Binary(ExprId, BinaryOp, ExprId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExprId(usize);

/// Instead of generating a tree of references or smart pointers, all
///  expressions are packed into a flat array and refer to each other by an id
///  (an index into that array). The parser owns the tree; everything
///  downstream holds plain ids.
#[derive(Debug)]
pub struct ParseTree<'input> {
    exprs: Vec<Expr<'input>>,
}

impl<'input> ParseTree<'input> {
    fn push_expr(&mut self, expr: Expr<'input>) -> ExprId {
        let id = ExprId(self.exprs.len());
        self.exprs.push(expr);
        id
    }

    #[inline]
    pub fn expr(&self, id: ExprId) -> &Expr<'input> {
        &self.exprs[id.0]
    }

    pub fn print_tree(
        &self,
        id: ExprId,
        f: &mut std::fmt::Formatter,
    ) -> Result<(), std::fmt::Error> {
        match self.expr(id) {
            Expr::Identifier(s) => write!(f, "{s}"),
            Expr::StringLiteral(s) => write!(f, "'{s}'"),
            Expr::NumberLiteral(s) => write!(f, "{s}"),
            Expr::Unary(func, None) => write!(f, "{}()", func.as_str()),
            Expr::Unary(func, Some(arg)) => {
                write!(f, "{}(", func.as_str())?;
                self.print_tree(*arg, f)?;
                write!(f, ")")
            }
            Expr::Binary(l, op, r) if op.is_function() => {
                write!(f, "{}(", op.as_str())?;
                self.print_tree(*l, f)?;
                write!(f, ",")?;
                self.print_tree(*r, f)?;
                write!(f, ")")
            }
            Expr::Binary(l, op, r) => {
                write!(f, "(")?;
                self.print_tree(*l, f)?;
                write!(f, " {} ", op.as_str())?;
                self.print_tree(*r, f)?;
                write!(f, ")")
            }
        }
    }
}

pub struct TreePrinter<'input>(pub ParseTree<'input>, pub ExprId);

impl<'input> std::fmt::Display for TreePrinter<'input> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.print_tree(self.1, f)
    }
}

/// The causes behind a `failed to parse query:` diagnostic. The rendered
///  texts are a stable contract with API consumers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("missing closing bracket ')'")]
    MissingClosingBracket,
    #[error("missing opening bracket '('")]
    MissingOpeningBracket,
    #[error("possible typo in \"{0}\"")]
    Typo(String),
}

fn lex_error(input: &str, e: LexerError) -> Error {
    Error::Typo(input[e.offset()..].trim_end().to_string())
}

pub fn parse(input: &str) -> Result<(ParseTree<'_>, ExprId), Error> {
    let mut lexer = Lexer::new(input);
    let mut tree = ParseTree {
        exprs: Vec::with_capacity(16),
    };

    let root = parse_expr(&mut lexer, &mut tree, input, 0)?;

    // Make sure we've completely parsed the input
    match lexer.next_token().map_err(|e| lex_error(input, e))? {
        None => Ok((tree, root)),
        Some(tok) if tok.ty == TokenType::ParenRight => Err(Error::MissingOpeningBracket),
        Some(tok) => Err(Error::Typo(lexer.remainder_from(&tok).to_string())),
    }
}

// NOTE infix_binding specifies the "binding power" of the infix operators:
//  higher binding power binds more tightly, so a comparison binds tighter
//  than `and`, which binds tighter than `or`. The left/right asymmetry
//  keeps ties from getting stuck and fixes associativity.
fn infix_binding(op: BinaryOp) -> (u8, u8) {
    match op {
        BinaryOp::Or => (10, 11),
        BinaryOp::And => (20, 21),
        _ => (30, 31),
    }
}

fn parse_expr<'input>(
    lexer: &mut Lexer<'input>,
    tree: &mut ParseTree<'input>,
    input: &'input str,
    min_binding_power: u8,
) -> Result<ExprId, Error> {
    let mut lhs = parse_primary(lexer, tree, input)?;

    // now that we have our left side, expect a series of operators or EOF
    loop {
        let op_tok = match lexer.peek_token().map_err(|e| lex_error(input, e))? {
            None => break,
            Some(tok) => tok,
        };
        if op_tok.ty != TokenType::Identifier {
            break;
        }
        let Some(op) = BinaryOp::infix_from_word(lexer.source_of(&op_tok)) else {
            break;
        };

        let (l_pow, r_pow) = infix_binding(op);
        if l_pow < min_binding_power {
            break;
        }

        // Consume the operator token
        _ = lexer.next_token().map_err(|e| lex_error(input, e))?;

        let rhs = parse_expr(lexer, tree, input, r_pow)?;
        lhs = tree.push_expr(Expr::Binary(lhs, op, rhs));
    }

    Ok(lhs)
}

fn parse_primary<'input>(
    lexer: &mut Lexer<'input>,
    tree: &mut ParseTree<'input>,
    input: &'input str,
) -> Result<ExprId, Error> {
    let Some(tok) = lexer.next_token().map_err(|e| lex_error(input, e))? else {
        // Empty input, or an operator dangling at the end
        return Err(Error::Typo(String::new()));
    };

    match tok.ty {
        // Open paren: parse the inner expression and expect a closing paren
        TokenType::ParenLeft => {
            let inner = parse_expr(lexer, tree, input, 0)?;
            expect_close(lexer, input)?;
            Ok(inner)
        }

        TokenType::String => Ok(tree.push_expr(Expr::StringLiteral(lexer.contents(&tok)))),
        TokenType::Number => Ok(tree.push_expr(Expr::NumberLiteral(lexer.contents(&tok)))),

        // Either a function call or a column reference / navigation path
        TokenType::Identifier => {
            let word = lexer.source_of(&tok);
            let called = matches!(
                lexer.peek_token().map_err(|e| lex_error(input, e))?,
                Some(Token {
                    ty: TokenType::ParenLeft,
                    ..
                })
            );
            if called {
                if let Some(func) = UnaryFn::from_word(word) {
                    return parse_unary_call(lexer, tree, input, func);
                }
                if let Some(op) = BinaryOp::function_from_word(word) {
                    return parse_binary_call(lexer, tree, input, op);
                }
                // An unknown name followed by '(' can't be an operand
                return Err(Error::Typo(lexer.remainder_from(&tok).to_string()));
            }
            parse_path(lexer, tree, input, &tok)
        }

        _ => Err(Error::Typo(lexer.remainder_from(&tok).to_string())),
    }
}

// Handles `field` and `a/b/c` navigation paths
fn parse_path<'input>(
    lexer: &mut Lexer<'input>,
    tree: &mut ParseTree<'input>,
    input: &'input str,
    first: &Token,
) -> Result<ExprId, Error> {
    let start = first.start;
    let mut end = first.end;

    while lexer
        .consume(TokenType::Slash)
        .map_err(|e| lex_error(input, e))?
    {
        let seg = lexer.next_token().map_err(|e| lex_error(input, e))?;
        match seg {
            Some(seg) if seg.ty == TokenType::Identifier => end = seg.end,
            Some(seg) => return Err(Error::Typo(lexer.remainder_from(&seg).to_string())),
            None => return Err(Error::Typo(lexer.span(start, end).to_string())),
        }
    }

    Ok(tree.push_expr(Expr::Identifier(lexer.span(start, end))))
}

fn parse_unary_call<'input>(
    lexer: &mut Lexer<'input>,
    tree: &mut ParseTree<'input>,
    input: &'input str,
    func: UnaryFn,
) -> Result<ExprId, Error> {
    // We've already seen the '(' in peek, consume it now
    _ = lexer.next_token().map_err(|e| lex_error(input, e))?;

    // `now()` is the one function with an empty argument list
    if func == UnaryFn::Now
        && lexer
            .consume(TokenType::ParenRight)
            .map_err(|e| lex_error(input, e))?
    {
        return Ok(tree.push_expr(Expr::Unary(UnaryFn::Now, None)));
    }

    let arg = parse_expr(lexer, tree, input, 0)?;
    expect_close(lexer, input)?;
    Ok(tree.push_expr(Expr::Unary(func, Some(arg))))
}

fn parse_binary_call<'input>(
    lexer: &mut Lexer<'input>,
    tree: &mut ParseTree<'input>,
    input: &'input str,
    op: BinaryOp,
) -> Result<ExprId, Error> {
    // Consume the peeked '('
    _ = lexer.next_token().map_err(|e| lex_error(input, e))?;

    let l = parse_expr(lexer, tree, input, 0)?;
    if !lexer
        .consume(TokenType::Comma)
        .map_err(|e| lex_error(input, e))?
    {
        return Err(unexpected_here(lexer, input)?);
    }
    let r = parse_expr(lexer, tree, input, 0)?;
    expect_close(lexer, input)?;

    Ok(tree.push_expr(Expr::Binary(l, op, r)))
}

fn expect_close<'input>(lexer: &mut Lexer<'input>, input: &'input str) -> Result<(), Error> {
    if lexer
        .consume(TokenType::ParenRight)
        .map_err(|e| lex_error(input, e))?
    {
        return Ok(());
    }
    Err(unexpected_here(lexer, input)?)
}

/// A required token was not found: EOF means a bracket never got closed,
///  anything else is reported as a typo at that position.
fn unexpected_here<'input>(
    lexer: &mut Lexer<'input>,
    input: &'input str,
) -> Result<Error, Error> {
    match lexer.peek_token().map_err(|e| lex_error(input, e))? {
        None => Ok(Error::MissingClosingBracket),
        Some(tok) => Ok(Error::Typo(lexer.remainder_from(&tok).to_string())),
    }
}
