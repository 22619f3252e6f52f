use std::fmt;
use std::io;
use std::path::PathBuf;

pub(crate) type PrismResult<T> = Result<T, Error>;

/// Errors that can occur when loading the catalog or the configuration, or when writing
/// bundles.
///
/// Processing content and building bundles never fail: problems there are
/// recovered locally and reported as [`BuildWarning`](crate::BuildWarning) at most.
#[derive(Debug)]
#[non_exhaustive]
pub enum Error {
    /// An I/O error occurred when reading a catalog, configuration or asset file
    /// or a dump file if the `dump` feature is enabled
    Io(io::Error),

    /// JSON parsing failed when loading a catalog or a configuration.
    Json(serde_json::Error),

    /// Binary encoding or decoding of a catalog dump failed.
    #[cfg(feature = "dump")]
    Dump(bitcode::Error),

    /// The catalog source does not exist at the given path.
    CatalogNotFound(PathBuf),

    /// A cache token that can't be used in a bundle file name.
    InvalidToken(String),

    /// The catalog source parsed but has no `languages` section.
    /// Prism's `components.json` always has one so this is most likely the wrong file.
    MissingLanguages,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(err) => write!(f, "I/O error: {}", err),
            Error::Json(err) => write!(f, "JSON parsing error: {}", err),
            #[cfg(feature = "dump")]
            Error::Dump(err) => write!(f, "catalog dump error: {}", err),
            Error::CatalogNotFound(path) => {
                write!(f, "component catalog not found at '{}'", path.display())
            }
            Error::InvalidToken(token) => write!(f, "invalid cache token '{}'", token),
            Error::MissingLanguages => write!(f, "component catalog has no languages section"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(err) => Some(err),
            Error::Json(err) => Some(err),
            #[cfg(feature = "dump")]
            Error::Dump(err) => Some(err),
            Error::CatalogNotFound(_) | Error::InvalidToken(_) | Error::MissingLanguages => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::Io(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Json(err)
    }
}

#[cfg(feature = "dump")]
impl From<bitcode::Error> for Error {
    fn from(err: bitcode::Error) -> Self {
        Error::Dump(err)
    }
}
