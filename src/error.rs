use crate::parser;

/// Everything a build call can fail with. The two renderings are a stable
///  contract: parse failures are `failed to parse query: <cause>` and
///  semantic rejections are `invalid query: <cause>`, single-line and
///  lowercase so API layers can pass them straight through.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("failed to parse query: {0}")]
    Parse(#[from] parser::Error),

    #[error("invalid query: {0}")]
    InvalidQuery(String),
}

impl Error {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidQuery(msg.into())
    }
}
