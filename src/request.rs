//! Sending an upload body with `ureq`.

use std::{io::Read, path::Path};

use ureq::{Request, Response};

use crate::{
    diagnostics::Diagnostics,
    error::{Error, Result},
    session::UploadSession,
};

/// Sets the headers an upload body needs on `request`.
///
/// `Content-Length` is only set when the body length is known; otherwise the
/// client falls back to its own framing.
pub fn prepare<R: Read>(request: Request, session: &UploadSession<R>, content_type: &str) -> Request {
    let request = request.set("Content-Type", content_type);
    match session.content_length() {
        Some(len) => request.set("Content-Length", &len.to_string()),
        None => request,
    }
}

/// Sends `body` with a prepared request.
///
/// Error statuses are returned as responses like any other; only transport
/// failures become errors.
pub fn send(request: Request, body: impl Read) -> Result<Response> {
    match request.send(body) {
        Ok(response) | Err(ureq::Error::Status(_, response)) => Ok(response),
        Err(err) => Err(Error::from(Box::new(err))),
    }
}

/// Uploads the file at `path` to `url` as `field_name`, followed by `fields`.
pub fn post_file<P, I, K, V>(
    url: &str,
    field_name: &str,
    path: P,
    fields: I,
    diagnostics: Diagnostics,
) -> Result<Response>
where
    P: AsRef<Path>,
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let (mut session, content_type) = UploadSession::create(field_name, path, fields, diagnostics)?;
    let request = prepare(ureq::post(url), &session, &content_type);
    let result = send(request, &mut session);
    session.release();
    result
}
