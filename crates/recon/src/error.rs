use std::fmt;

#[derive(Debug)]
pub enum ReconError {
    /// TOML parse / deserialization error.
    ConfigParse(String),
    /// Config validation error (empty shop URL, bad exchange rate, etc.).
    ConfigValidation(String),
    /// Nothing to reconcile: no dataset matched a known shape, or the
    /// recognized datasets produced zero candidate rows.
    NoUsableData(String),
}

impl fmt::Display for ReconError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigParse(msg) => write!(f, "config parse error: {msg}"),
            Self::ConfigValidation(msg) => write!(f, "config validation error: {msg}"),
            Self::NoUsableData(msg) => write!(f, "no matching data: {msg}"),
        }
    }
}

impl std::error::Error for ReconError {}
