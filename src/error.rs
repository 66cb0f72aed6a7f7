use std::{io, path::PathBuf};

/// Errors produced while building or draining an upload body.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The file to upload could not be opened or inspected.
    #[error("failed to open '{}': {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The path has no usable UTF-8 base name to send as the filename.
    #[error("the path '{}' has no valid file name", .0.display())]
    InvalidPath(PathBuf),

    /// A value that ends up inside a part header cannot be encoded.
    #[error("cannot encode {what} {value:?} into a part header")]
    Encoding { what: &'static str, value: String },

    /// Reading the file content failed mid-stream.
    #[error("failed to read file content: {0}")]
    Read(#[source] io::Error),

    /// The body stream already failed on an earlier pull.
    #[error("the upload body has already failed")]
    Failed,

    /// The session was released before this pull.
    #[error("the upload session has been released")]
    Released,

    /// The HTTP exchange failed before a response was received.
    #[error("request failed: {0}")]
    Http(#[from] Box<ureq::Error>),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
