use crate::parser::UnaryFn;

/// The SQL flavor targeted by the emitter. Only the unary-function rendering
///  differs: PostgreSQL extracts date/time parts with `EXTRACT`, the other
///  three share the plain function-name forms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    Postgres,
    MySql,
    Sqlite,
    SqlServer,
}

impl Dialect {
    /// Renders one unary SQL function application. `arg` is an already
    ///  rendered column expression; the caller guarantees `func` is never
    ///  `not`, which has no SQL function form.
    pub(crate) fn render_unary(&self, func: UnaryFn, arg: &str) -> String {
        match (self, func) {
            // PostgreSQL-specific forms
            (Dialect::Postgres, UnaryFn::IndexOf) => format!("POSITION({arg})"),
            (Dialect::Postgres, UnaryFn::Year) => format!("EXTRACT(YEAR FROM {arg})"),
            (Dialect::Postgres, UnaryFn::Month) => format!("EXTRACT(MONTH FROM {arg})"),
            (Dialect::Postgres, UnaryFn::Day) => format!("EXTRACT(DAY FROM {arg})"),
            (Dialect::Postgres, UnaryFn::Hour) => format!("EXTRACT(HOUR FROM {arg})"),
            (Dialect::Postgres, UnaryFn::Minute) => format!("EXTRACT(MINUTE FROM {arg})"),
            (Dialect::Postgres, UnaryFn::Second) => format!("EXTRACT(SECOND FROM {arg})"),
            (Dialect::Postgres, UnaryFn::FractionalSecond) => {
                format!("EXTRACT(MICROSECOND FROM {arg})")
            }
            (Dialect::Postgres, UnaryFn::Date) => format!("TO_DATE({arg})"),
            (Dialect::Postgres, UnaryFn::Time) => format!("CAST({arg}::timestamp AS time)"),

            // MySQL, SQLite and SQLServer share one table
            (_, UnaryFn::IndexOf) => format!("LOCATE({arg})"),
            (_, UnaryFn::Year) => format!("YEAR({arg})"),
            (_, UnaryFn::Month) => format!("MONTH({arg})"),
            (_, UnaryFn::Day) => format!("DAY({arg})"),
            (_, UnaryFn::Hour) => format!("HOUR({arg})"),
            (_, UnaryFn::Minute) => format!("MINUTE({arg})"),
            (_, UnaryFn::Second) => format!("SECOND({arg})"),
            (_, UnaryFn::FractionalSecond) => format!("MICROSECOND({arg})"),
            (_, UnaryFn::Date) => format!("DATE({arg})"),
            (_, UnaryFn::Time) => format!("TIME({arg})"),

            // Identical everywhere
            (_, UnaryFn::Length) => format!("LENGTH({arg})"),
            (_, UnaryFn::ToLower) => format!("LOWER({arg})"),
            (_, UnaryFn::ToUpper) => format!("UPPER({arg})"),
            (_, UnaryFn::Trim) => format!("TRIM({arg})"),
            (_, UnaryFn::Now) => format!("NOW({arg})"),
            (_, UnaryFn::Round) => format!("ROUND({arg})"),
            (_, UnaryFn::Floor) => format!("FLOOR({arg})"),
            (_, UnaryFn::Ceiling) => format!("CEIL({arg})"),

            (_, UnaryFn::Not) => unreachable!("'not' is rejected before rendering"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FUNCTIONS: [UnaryFn; 18] = [
        UnaryFn::Length,
        UnaryFn::IndexOf,
        UnaryFn::ToLower,
        UnaryFn::ToUpper,
        UnaryFn::Trim,
        UnaryFn::Year,
        UnaryFn::Month,
        UnaryFn::Day,
        UnaryFn::Hour,
        UnaryFn::Minute,
        UnaryFn::Second,
        UnaryFn::FractionalSecond,
        UnaryFn::Date,
        UnaryFn::Time,
        UnaryFn::Now,
        UnaryFn::Round,
        UnaryFn::Floor,
        UnaryFn::Ceiling,
    ];

    #[test]
    fn non_postgres_dialects_share_one_table() {
        for func in FUNCTIONS {
            let mysql = Dialect::MySql.render_unary(func, "col");
            assert_eq!(mysql, Dialect::Sqlite.render_unary(func, "col"));
            assert_eq!(mysql, Dialect::SqlServer.render_unary(func, "col"));
        }
    }

    #[test]
    fn postgres_datetime_forms() {
        let pg = Dialect::Postgres;
        assert_eq!(pg.render_unary(UnaryFn::Year, "created_at"), "EXTRACT(YEAR FROM created_at)");
        assert_eq!(
            pg.render_unary(UnaryFn::FractionalSecond, "created_at"),
            "EXTRACT(MICROSECOND FROM created_at)"
        );
        assert_eq!(
            pg.render_unary(UnaryFn::Time, "created_at"),
            "CAST(created_at::timestamp AS time)"
        );
        assert_eq!(pg.render_unary(UnaryFn::Date, "created_at"), "TO_DATE(created_at)");
        assert_eq!(pg.render_unary(UnaryFn::IndexOf, "name"), "POSITION(name)");
    }

    #[test]
    fn mysql_datetime_forms() {
        let my = Dialect::MySql;
        assert_eq!(my.render_unary(UnaryFn::Year, "created_at"), "YEAR(created_at)");
        assert_eq!(my.render_unary(UnaryFn::FractionalSecond, "created_at"), "MICROSECOND(created_at)");
        assert_eq!(my.render_unary(UnaryFn::Time, "created_at"), "TIME(created_at)");
        assert_eq!(my.render_unary(UnaryFn::IndexOf, "name"), "LOCATE(name)");
    }

    #[test]
    fn length_is_universal() {
        for dialect in [Dialect::Postgres, Dialect::MySql, Dialect::Sqlite, Dialect::SqlServer] {
            assert_eq!(dialect.render_unary(UnaryFn::Length, "name"), "LENGTH(name)");
        }
    }
}
