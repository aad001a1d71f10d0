use thiserror::Error;

/// Failure kinds surfaced by the Gopher core.
///
/// Every operation reports failure through its return value; none of these
/// abort the process. A `MalformedListing` invalidates only the directory
/// fetch that produced it.
#[derive(Error, Debug)]
pub enum GopherError {
    #[error("malformed URL: {0}")]
    Url(#[from] url::ParseError),
    #[error("connection to {host}:{port} failed: {source}")]
    Connect {
        host: String,
        port: u16,
        source: std::io::Error,
    },
    #[error("unsupported open mode {mode:?}: gopher streams are read-only")]
    UnsupportedMode { mode: String },
    #[error("bad index line in menu response: {line:?}")]
    MalformedListing { line: String },
    #[error("transport error: {0}")]
    Transport(#[from] std::io::Error),
}
