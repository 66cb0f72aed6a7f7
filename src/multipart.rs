//! Encoding of the fixed parts of a `multipart/form-data` body.
//!
//! Only the bytes surrounding the file content are built here: the head (the
//! file part's headers) and the tail (the file part terminator, every extra
//! field and the closing boundary). Both are small and fully buffered.

use std::fmt::Write;

use rand::{thread_rng, RngCore};

use crate::error::{Error, Result};

const BOUNDARY_BYTES: usize = 30;

/// The encoded head and tail of one upload body.
#[derive(Debug)]
pub struct Form {
    pub boundary: String,
    pub content_type: String,
    pub head: Segment,
    pub tail: Segment,
}

/// Generates a fresh boundary token: 30 random bytes as lowercase hex.
pub fn boundary() -> String {
    let mut raw = [0u8; BOUNDARY_BYTES];
    thread_rng().fill_bytes(&mut raw);
    raw.iter().fold(String::with_capacity(BOUNDARY_BYTES * 2), |mut out, b| {
        let _ = write!(out, "{b:02x}");
        out
    })
}

/// Encodes the head and tail for `file_name` uploaded under `field_name`,
/// followed by `fields` in the order they are yielded.
pub fn encode<I, K, V>(field_name: &str, file_name: &str, fields: I) -> Result<Form>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    encode_with_boundary(boundary(), field_name, file_name, fields)
}

pub(crate) fn encode_with_boundary<I, K, V>(
    boundary: String,
    field_name: &str,
    file_name: &str,
    fields: I,
) -> Result<Form>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let field_name = header_param("field name", field_name)?;
    let file_name = header_param("file name", file_name)?;

    let content_type = format!("multipart/form-data; boundary={boundary}");

    let head = format!("--{boundary}\r\nContent-Disposition: form-data; name=\"{field_name}\"; filename=\"{file_name}\"\r\nContent-Type: application/octet-stream\r\n\r\n");

    // The file part is always terminated, even when only the closing
    // boundary follows it.
    let mut tail = String::from("\r\n");
    for (key, value) in fields {
        let key = header_param("form field name", key.as_ref())?;
        let value = value.as_ref();
        let _ = write!(
            tail,
            "--{boundary}\r\nContent-Disposition: form-data; name=\"{key}\"\r\n\r\n{value}\r\n"
        );
    }
    let _ = write!(tail, "--{boundary}--\r\n");

    Ok(Form {
        boundary,
        content_type,
        head: Segment::new(head.into_bytes()),
        tail: Segment::new(tail.into_bytes()),
    })
}

/// Escapes a quoted `Content-Disposition` parameter, rejecting characters
/// that would break out of the header line.
fn header_param(what: &'static str, value: &str) -> Result<String> {
    if value.contains(['\r', '\n', '\0']) {
        return Err(Error::Encoding {
            what,
            value: value.to_owned(),
        });
    }
    Ok(value.replace('\\', "\\\\").replace('"', "\\\""))
}

/// A fully buffered span of the body, drained front to back.
#[derive(Debug)]
pub struct Segment {
    bytes: Vec<u8>,
    pos: usize,
}

impl Segment {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes, pos: 0 }
    }

    /// Copies as much of the remaining bytes as fit into `buf`.
    pub fn drain_into(&mut self, buf: &mut [u8]) -> usize {
        let remaining = &self.bytes[self.pos..];
        let n = remaining.len().min(buf.len());
        buf[..n].copy_from_slice(&remaining[..n]);
        self.pos += n;
        n
    }

    pub fn is_drained(&self) -> bool {
        self.pos == self.bytes.len()
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }
}
