use thiserror::Error;

pub type Result<T> = std::result::Result<T, UoError>;

/// Everything the SDK can fail with. Accessors propagate these; iterators
/// skip the per-entry kinds (`NotFound`, `InvalidFormat`, `Truncated`) and
/// keep going.
#[derive(Debug, Error)]
pub enum UoError {
    #[error("no entry {id} in '{file}'")]
    NotFound { file: String, id: u32 },

    #[error("{what} {value} outside valid range {min}..{max}")]
    OutOfRange {
        what: &'static str,
        value: i64,
        min: i64,
        max: i64,
    },

    #[error("malformed '{file}': {detail}")]
    InvalidFormat { file: String, detail: String },

    #[error("truncated '{file}': {detail}")]
    Truncated { file: String, detail: String },

    #[error("'{file}' holds no entries")]
    EmptyFile { file: String },

    #[error("unsupported compression kind {kind} in '{file}'")]
    UnsupportedCompression { file: String, kind: u16 },

    #[error("adler32 mismatch for entry {id} in '{file}'")]
    ChecksumMismatch { file: String, id: u32 },

    #[error("the SDK has been closed")]
    Closed,

    #[error("I/O on '{file}': {source}")]
    Io {
        file: String,
        #[source]
        source: std::io::Error,
    },
}

impl UoError {
    pub(crate) fn not_found(file: &str, id: u32) -> Self {
        Self::NotFound {
            file: file.to_owned(),
            id,
        }
    }

    pub(crate) fn out_of_range(what: &'static str, value: i64, min: i64, max: i64) -> Self {
        Self::OutOfRange {
            what,
            value,
            min,
            max,
        }
    }

    pub(crate) fn invalid(file: &str, detail: impl Into<String>) -> Self {
        Self::InvalidFormat {
            file: file.to_owned(),
            detail: detail.into(),
        }
    }

    pub(crate) fn truncated(file: &str, detail: impl Into<String>) -> Self {
        Self::Truncated {
            file: file.to_owned(),
            detail: detail.into(),
        }
    }

    pub(crate) fn io(file: &str, source: std::io::Error) -> Self {
        Self::Io {
            file: file.to_owned(),
            source,
        }
    }
}

/// Attaches file/field context to raw `io::Result`s coming out of the
/// byteorder readers, turning short reads into `Truncated`.
pub(crate) trait IoCtx<T> {
    fn ctx(self, file: &str, what: &str) -> Result<T>;
}

impl<T> IoCtx<T> for std::io::Result<T> {
    fn ctx(self, file: &str, what: &str) -> Result<T> {
        self.map_err(|source| match source.kind() {
            std::io::ErrorKind::UnexpectedEof => UoError::truncated(file, what),
            _ => UoError::io(file, source),
        })
    }
}
