use std::str::Utf8Error;

#[non_exhaustive]
#[derive(Debug)]
pub enum Error {
    /// Got an invalid parameter value in a function
    InvalidParameter(String),
    /// Error while serializing/deserializing data
    Json(serde_json::Error),
    /// Error due to C strings containing non-utf8 data
    Utf8(Utf8Error),
    /// The simulation engine could not be constructed. The handle stays
    /// stopped, and the caller may retry.
    EngineInit(String),
    /// Error reported by the simulation engine while executing commands
    Engine(String),
    /// Error while reading input files
    Io(std::io::Error),
    /// Error used when a memory buffer is too small to fit the requested data,
    /// usually in the C API.
    BufferSize(String),
    /// Error used for failed internal consistency check and panics, i.e. bugs
    /// in simsync.
    Internal(String),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::InvalidParameter(e) => write!(f, "invalid parameter: {}", e),
            Error::Json(e) => write!(f, "json error: {}", e),
            Error::Utf8(e) => write!(f, "utf8 decoding error: {}", e),
            Error::EngineInit(e) => write!(f, "failed to start the simulation engine: {}", e),
            Error::Engine(e) => write!(f, "simulation engine error: {}", e),
            Error::Io(e) => write!(f, "io error: {}", e),
            Error::BufferSize(e) => write!(f, "buffer is not big enough: {}", e),
            Error::Internal(e) => {
                write!(f, "internal simsync error")?;
                if e.contains("assertion failed") {
                    write!(f, " (this is likely a bug, please report it)")?;
                }
                write!(f, ": {}", e)
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::InvalidParameter(_) |
            Error::EngineInit(_) |
            Error::Engine(_) |
            Error::BufferSize(_) |
            Error::Internal(_) => None,
            Error::Json(e) => Some(e),
            Error::Utf8(e) => Some(e),
            Error::Io(e) => Some(e),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(error: serde_json::Error) -> Error {
        Error::Json(error)
    }
}

impl From<Utf8Error> for Error {
    fn from(error: Utf8Error) -> Error {
        Error::Utf8(error)
    }
}

impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Error {
        Error::Io(error)
    }
}

// Box<dyn Any + Send + 'static> is the error type in std::panic::catch_unwind
impl From<Box<dyn std::any::Any + Send + 'static>> for Error {
    fn from(error: Box<dyn std::any::Any + Send + 'static>) -> Error {
        let message = if let Some(message) = error.downcast_ref::<String>() {
            message.clone()
        } else if let Some(message) = error.downcast_ref::<&str>() {
            (*message).to_owned()
        } else {
            "panic message is not a string".to_owned()
        };

        Error::Internal(message)
    }
}
