use std::fmt;

#[derive(Debug)]
pub enum IoError {
    /// File could not be opened or read.
    Open(String),
    /// Password-protected workbook (OLE container under an OOXML extension).
    Encrypted(String),
    /// Extension is not one of the supported tabular formats.
    UnsupportedFormat(String),
    /// Contents could not be parsed as a table.
    Parse(String),
    /// Output could not be serialized or written.
    Write(String),
}

impl fmt::Display for IoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open(msg) => write!(f, "cannot open {msg}"),
            Self::Encrypted(path) => write!(f, "{path} is password-protected"),
            Self::UnsupportedFormat(msg) => write!(f, "unsupported format: {msg}"),
            Self::Parse(msg) => write!(f, "parse error: {msg}"),
            Self::Write(msg) => write!(f, "write error: {msg}"),
        }
    }
}

impl std::error::Error for IoError {}
