//! Error enum
use std::fmt;

#[derive(Debug)]
pub enum Error {
    Io(std::io::Error),
    Serde(serde_json::Error),
    Glob(glob::GlobError),
    GlobPattern(glob::PatternError),
    Xml(quick_xml::Error),
    Zip(zip::result::ZipError),
    /// Missing input, unreadable archive, mixed input formats.
    Input(String),
    /// Converter or store unreachable.
    Unavailable(String),
    /// A pipeline phase called out of order.
    State(String),
    Custom(String),
}

impl Error {
    /// Short name of the error kind, used as `exc_type` in failure events.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Io(_) => "IoError",
            Error::Serde(_) => "SerializationError",
            Error::Glob(_) | Error::GlobPattern(_) => "GlobError",
            Error::Xml(_) => "XmlError",
            Error::Zip(_) => "ArchiveError",
            Error::Input(_) => "InputError",
            Error::Unavailable(_) => "UnavailableError",
            Error::State(_) => "StateError",
            Error::Custom(_) => "UploadError",
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(e) => write!(f, "{}", e),
            Error::Serde(e) => write!(f, "{}", e),
            Error::Glob(e) => write!(f, "{}", e),
            Error::GlobPattern(e) => write!(f, "{}", e),
            Error::Xml(e) => write!(f, "invalid xml: {}", e),
            Error::Zip(e) => write!(f, "{}", e),
            Error::Input(msg)
            | Error::Unavailable(msg)
            | Error::State(msg)
            | Error::Custom(msg) => f.write_str(msg),
        }
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Error {
        Error::Io(e)
    }
}

impl From<glob::GlobError> for Error {
    fn from(e: glob::GlobError) -> Error {
        Error::Glob(e)
    }
}

impl From<glob::PatternError> for Error {
    fn from(e: glob::PatternError) -> Error {
        Error::GlobPattern(e)
    }
}

impl From<quick_xml::Error> for Error {
    fn from(e: quick_xml::Error) -> Error {
        Error::Xml(e)
    }
}

impl From<quick_xml::events::attributes::AttrError> for Error {
    fn from(e: quick_xml::events::attributes::AttrError) -> Error {
        Error::Xml(e.into())
    }
}

impl From<zip::result::ZipError> for Error {
    fn from(e: zip::result::ZipError) -> Error {
        Error::Zip(e)
    }
}

impl From<String> for Error {
    fn from(s: String) -> Error {
        Error::Custom(s)
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Error {
        Error::Serde(e)
    }
}
