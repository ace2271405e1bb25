use crate::error::Error;
use crate::model::Model;
use crate::parser::{BinaryOp, Expr, ExprId, ParseTree};

/// Depth-tracking traversal enforcing the complexity cap and the column
///  whitelist. Identifier text is the one thing that ends up inlined in SQL
///  (column names cannot be parameter-bound), so membership in the model is
///  the line of defense; the depth bound caps pathological nesting.
pub(crate) fn validate_tree(
    tree: &ParseTree,
    root: ExprId,
    model: &Model,
    max_depth: usize,
) -> Result<(), Error> {
    walk(tree, root, model, max_depth, 1, false)
}

fn walk(
    tree: &ParseTree,
    id: ExprId,
    model: &Model,
    max_depth: usize,
    depth: usize,
    in_concat: bool,
) -> Result<(), Error> {
    if max_depth > 0 && depth > max_depth {
        return Err(Error::invalid(format!(
            "maximum query complexity exceeded: {depth} > {max_depth}"
        )));
    }

    match tree.expr(id) {
        // concat mixes literals and identifiers freely, so its direct
        //  children are exempt from the column check
        Expr::Identifier(name) => {
            if !in_concat {
                let head = match name.split_once('/') {
                    Some((head, _)) => head,
                    None => name,
                };
                let column = model.column_name(head);
                if !model.is_queryable(&column) {
                    return Err(Error::invalid(format!("unknown column name '{column}'")));
                }
            }
            Ok(())
        }
        Expr::StringLiteral(_) | Expr::NumberLiteral(_) | Expr::Unary(_, None) => Ok(()),
        Expr::Unary(_, Some(arg)) => walk(tree, *arg, model, max_depth, depth + 1, false),
        Expr::Binary(l, op, r) => {
            let in_concat = *op == BinaryOp::Concat;
            walk(tree, *l, model, max_depth, depth + 1, in_concat)?;
            walk(tree, *r, model, max_depth, depth + 1, in_concat)
        }
    }
}
