use std::sync::Arc;

use crate::builder::{FilterMap, FilterValue, QueryBuilder, Value};
use crate::deep;
use crate::dialect::Dialect;
use crate::error::Error;
use crate::model::Model;
use crate::parser::{BinaryOp, Expr, ExprId, ParseTree, UnaryFn};
use crate::prefix::PrefixTables;

/// Recursive translation of a parsed filter into builder predicates.
///
/// Negation is a mode, not a rewrite: entering `not(...)` flips `negated`
///  and from there every operator and connective emits with reversed
///  polarity (De Morgan), leaving the tree untouched. Each logical
///  connective composes its children in detached session builders so
///  predicates cannot accumulate across sibling subtrees.
pub(crate) struct Emitter<'t, 'q> {
    pub tree: &'t ParseTree<'q>,
    pub dialect: Dialect,
    pub prefixes: Arc<PrefixTables>,
}

impl<'t, 'q> Emitter<'t, 'q> {
    pub fn emit(
        &self,
        id: ExprId,
        db: QueryBuilder,
        negated: bool,
    ) -> Result<QueryBuilder, Error> {
        match self.tree.expr(id) {
            Expr::Binary(l, op @ (BinaryOp::And | BinaryOp::Or), r) => {
                let left = self.emit(*l, db.session(), negated)?;
                let right = self.emit(*r, db.session(), negated)?;
                let or = (*op == BinaryOp::Or) != negated;
                if or {
                    Ok(db.where_group(left).or_group(right))
                } else {
                    Ok(db.where_group(left).where_group(right))
                }
            }

            Expr::Binary(
                l,
                op @ (BinaryOp::Eq
                | BinaryOp::Ne
                | BinaryOp::Gt
                | BinaryOp::Ge
                | BinaryOp::Lt
                | BinaryOp::Le),
                r,
            ) => self.emit_comparison(*l, *op, *r, db, negated),

            Expr::Binary(
                l,
                op @ (BinaryOp::Contains | BinaryOp::StartsWith | BinaryOp::EndsWith),
                r,
            ) => self.emit_string_predicate(*l, *op, *r, db, negated),

            Expr::Binary(_, BinaryOp::Concat, _) => {
                Err(Error::invalid("concat is not a boolean expression"))
            }

            Expr::Unary(UnaryFn::Not, Some(arg)) => {
                if negated {
                    return Err(Error::invalid("nested 'not' is not supported"));
                }
                self.emit(*arg, db, true)
            }

            Expr::Unary(..) => Err(Error::invalid(
                "root level operators other then 'not' are not supported",
            )),

            Expr::Identifier(_) | Expr::StringLiteral(_) | Expr::NumberLiteral(_) => {
                Err(Error::invalid("expression is not a boolean predicate"))
            }
        }
    }

    fn emit_comparison(
        &self,
        l: ExprId,
        op: BinaryOp,
        r: ExprId,
        db: QueryBuilder,
        negated: bool,
    ) -> Result<QueryBuilder, Error> {
        let (literal, param) = match self.tree.expr(r) {
            Expr::StringLiteral(s) => (*s, Value::Str((*s).to_string())),
            Expr::NumberLiteral(s) => (*s, deep::bind(s)),
            Expr::Unary(..) => {
                return Err(Error::invalid(
                    "unary operators not supported as right operand of equality operators",
                ));
            }
            Expr::Binary(_, BinaryOp::Concat, _) => {
                return Err(Error::invalid(
                    "concat not supported as right operand of equality operators",
                ));
            }
            _ => {
                return Err(Error::invalid(
                    "right operand of a comparison must be a literal",
                ));
            }
        };

        // A navigation path switches to the nested-filter form; the
        //  comparison rides along as a prefix on the leaf value
        if let Expr::Identifier(path) = self.tree.expr(l)
            && path.contains('/')
        {
            let prefix = self.prefixes.comparison_prefix(op, negated);
            let map = nested_map(path, literal, prefix, db.model());
            return Ok(db.where_map(map));
        }

        let left = self.emit_operand(l, db.model())?;
        let sql_op = comparison_sql(op, negated);
        Ok(db.where_sql(format!("{left} {sql_op} ?"), vec![param]))
    }

    fn emit_string_predicate(
        &self,
        l: ExprId,
        op: BinaryOp,
        r: ExprId,
        db: QueryBuilder,
        negated: bool,
    ) -> Result<QueryBuilder, Error> {
        let text = match self.tree.expr(r) {
            Expr::StringLiteral(s) => *s,
            _ => {
                return Err(Error::invalid(format!(
                    "{} requires a quoted string as second argument",
                    op.as_str()
                )));
            }
        };

        // A literal '%' must not act as a wildcard; escaping it arms the
        //  ESCAPE clause
        let escaped = text.contains('%');
        let text = text.replace('%', "\\%");
        let pattern = match op {
            BinaryOp::Contains => format!("%{text}%"),
            BinaryOp::StartsWith => format!("{text}%"),
            BinaryOp::EndsWith => format!("%{text}"),
            _ => unreachable!(),
        };

        if let Expr::Identifier(path) = self.tree.expr(l)
            && path.contains('/')
        {
            let prefix = self.prefixes.like_prefix(negated);
            let map = nested_map(path, &pattern, prefix, db.model());
            return Ok(db.where_map(map));
        }

        let left = self.emit_operand(l, db.model())?;
        let like = if negated { "NOT LIKE" } else { "LIKE" };
        let escape = if escaped { " ESCAPE '\\'" } else { "" };
        Ok(db.where_sql(
            format!("{left} {like} ?{escape}"),
            vec![Value::Str(pattern)],
        ))
    }

    /// Renders the left side of a predicate: a plain column reference, a
    ///  unary function chain, or a concat tree.
    fn emit_operand(&self, id: ExprId, model: &Model) -> Result<String, Error> {
        match self.tree.expr(id) {
            Expr::Identifier(name) if !name.contains('/') => Ok(model.column_name(name)),
            Expr::Identifier(_) => Err(Error::invalid(
                "navigation paths are not supported in function arguments",
            )),
            Expr::Unary(func, arg) => self.emit_unary_chain(*func, *arg, model),
            Expr::Binary(l, BinaryOp::Concat, r) => self.emit_concat(*l, *r, model),
            Expr::StringLiteral(_) | Expr::NumberLiteral(_) => Err(Error::invalid(
                "literals are not supported as left operand of comparison operators",
            )),
            Expr::Binary(..) => Err(Error::invalid(
                "expected a column reference, function chain or concat as operand",
            )),
        }
    }

    /// Assembles a possibly nested chain like `length(trim(toupper(x)))`
    ///  from the inside out: the innermost argument renders first and each
    ///  level wraps the running string, so the outer function can never
    ///  end up inside the inner one.
    fn emit_unary_chain(
        &self,
        func: UnaryFn,
        arg: Option<ExprId>,
        model: &Model,
    ) -> Result<String, Error> {
        if func == UnaryFn::Not {
            return Err(Error::invalid("'not' is not supported inside operands"));
        }

        let inner = match arg {
            None => String::new(),
            Some(id) => match self.tree.expr(id) {
                Expr::Identifier(name) if !name.contains('/') => model.column_name(name),
                Expr::Identifier(_) => {
                    return Err(Error::invalid(
                        "navigation paths are not supported in function arguments",
                    ));
                }
                Expr::Unary(inner_func, inner_arg) => {
                    self.emit_unary_chain(*inner_func, *inner_arg, model)?
                }
                Expr::Binary(l, BinaryOp::Concat, r) => self.emit_concat(*l, *r, model)?,
                _ => {
                    return Err(Error::invalid(format!(
                        "{} requires a column reference as argument",
                        func.as_str()
                    )));
                }
            },
        };

        Ok(self.dialect.render_unary(func, &inner))
    }

    /// `concat` joins its children with the SQL-standard ` || `; all four
    ///  supported dialects accept it.
    fn emit_concat(&self, l: ExprId, r: ExprId, model: &Model) -> Result<String, Error> {
        let left = self.concat_operand(l, model)?;
        let right = self.concat_operand(r, model)?;
        Ok(format!("{left} || {right}"))
    }

    fn concat_operand(&self, id: ExprId, model: &Model) -> Result<String, Error> {
        match self.tree.expr(id) {
            // Literal children ride along as written, quotes and all
            Expr::StringLiteral(s) => Ok(format!("'{s}'")),
            Expr::NumberLiteral(n) => Ok((*n).to_string()),
            _ => self.emit_operand(id, model),
        }
    }
}

fn comparison_sql(op: BinaryOp, negated: bool) -> &'static str {
    match (op, negated) {
        (BinaryOp::Eq, false) | (BinaryOp::Ne, true) => "=",
        (BinaryOp::Eq, true) | (BinaryOp::Ne, false) => "!=",
        (BinaryOp::Gt, false) | (BinaryOp::Le, true) => ">",
        (BinaryOp::Ge, false) | (BinaryOp::Lt, true) => ">=",
        (BinaryOp::Lt, false) | (BinaryOp::Ge, true) => "<",
        (BinaryOp::Le, false) | (BinaryOp::Gt, true) => "<=",
        _ => unreachable!(),
    }
}

/// Builds the recursively nested map for a navigation path: every segment
///  becomes a key through the naming strategy and the leaf carries the
///  (possibly prefix-encoded) literal.
fn nested_map(path: &str, literal: &str, prefix: &str, model: &Model) -> FilterMap {
    let mut segments = path.rsplit('/');
    let leaf_key = model.column_name(segments.next().unwrap_or(path));

    let mut map = FilterMap::from([(leaf_key, FilterValue::Leaf(format!("{prefix}{literal}")))]);
    for segment in segments {
        map = FilterMap::from([(model.column_name(segment), FilterValue::Nested(map))]);
    }
    map
}
