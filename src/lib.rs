//! Streaming `multipart/form-data` upload bodies.
//!
//! An [`UploadSession`] turns one file plus a handful of text fields into a
//! request body that is produced on demand, so the file is never held in
//! memory. The body is pulled through [`UploadSession::pull`] or through its
//! [`std::io::Read`] implementation.
//!
//! ```no_run
//! use streamupload::{Diagnostics, UploadSession};
//!
//! # fn main() -> streamupload::Result<()> {
//! let (session, content_type) = UploadSession::create(
//!     "file",
//!     "./report.pdf",
//!     [("k1", "101"), ("k2", "333")],
//!     Diagnostics::new("trace-00093"),
//! )?;
//! let request = streamupload::prepare(ureq::post("http://localhost:8080/upload"), &session, &content_type);
//! let response = streamupload::send(request, session)?;
//! println!("{}", response.status());
//! # Ok(())
//! # }
//! ```

mod diagnostics;
mod error;
mod multipart;
mod read_ext;
mod request;
mod session;
mod source;

pub use diagnostics::{DiagnosticSink, Diagnostics, TracingSink};
pub use error::{Error, Result};
pub use request::{post_file, prepare, send};
pub use session::{Pull, State, Status, UploadSession};
