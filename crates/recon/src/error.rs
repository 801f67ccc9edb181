use std::fmt;

#[derive(Debug)]
pub enum ReconError {
    /// TOML parse / deserialization error.
    ConfigParse(String),
    /// Config validation error (empty prefix, bad interpolation bounds, etc.).
    ConfigValidation(String),
    /// Export has fewer than the two leading lines (metadata + headers).
    MissingHeader { source: String },
    /// Missing required column in input data.
    MissingColumn { source: String, column: String },
    /// Price text that could not be read as a decimal amount.
    PriceParse { source: String, line: usize, value: String },
    /// Malformed delimited data (unbalanced quotes, bad UTF-8 in a record).
    Csv { source: String, message: String },
    /// Measurement mapping JSON could not be read or written.
    Mapping(String),
    /// IO error (file read, etc.).
    Io(String),
}

impl fmt::Display for ReconError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigParse(msg) => write!(f, "config parse error: {msg}"),
            Self::ConfigValidation(msg) => write!(f, "config validation error: {msg}"),
            Self::MissingHeader { source } => {
                write!(f, "{source}: expected a metadata line followed by a header line")
            }
            Self::MissingColumn { source, column } => {
                write!(f, "{source}: missing column '{column}'")
            }
            Self::PriceParse { source, line, value } => {
                write!(f, "{source}, line {line}: cannot parse price '{value}'")
            }
            Self::Csv { source, message } => write!(f, "{source}: {message}"),
            Self::Mapping(msg) => write!(f, "measurement mapping error: {msg}"),
            Self::Io(msg) => write!(f, "IO error: {msg}"),
        }
    }
}

impl std::error::Error for ReconError {}
