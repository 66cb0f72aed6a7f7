//! The pull-based body reader.
//!
//! An [`UploadSession`] owns the open file and the two buffered segments
//! around it. Each [`UploadSession::pull`] fills as much of the caller's
//! buffer as possible, rolling over from the head to the file content to the
//! tail inside a single call.

use std::{
    ffi::OsStr,
    fmt,
    fs::File,
    io::{self, Read},
    path::Path,
};

use crate::{
    diagnostics::Diagnostics,
    error::{Error, Result},
    multipart::{self, Form, Segment},
    source::FileSource,
};

/// Position of a session in the body. Only ever moves forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum State {
    PreSegment,
    FileContent,
    PostSegment,
    Finished,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// More bytes follow.
    More,
    /// The body is complete. Reported once with the final bytes, then on
    /// every later pull with zero bytes.
    EndOfStream,
}

/// Outcome of a successful [`UploadSession::pull`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pull {
    pub written: usize,
    pub status: Status,
}

/// A streaming `multipart/form-data` body for a single file upload.
pub struct UploadSession<R = File> {
    boundary: String,
    head: Segment,
    tail: Segment,
    source: Option<FileSource<R>>,
    file_size: Option<u64>,
    state: State,
    released: bool,
    emitted: u64,
    emitted_from_file: u64,
    diagnostics: Diagnostics,
}

impl UploadSession<File> {
    /// Opens `path` and prepares a body that uploads it under `field_name`,
    /// followed by `fields` in iteration order.
    ///
    /// Returns the session together with the value to send verbatim as the
    /// request's `Content-Type` header. Nothing stays open on failure.
    pub fn create<P, I, K, V>(
        field_name: &str,
        path: P,
        fields: I,
        diagnostics: Diagnostics,
    ) -> Result<(Self, String)>
    where
        P: AsRef<Path>,
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let path = path.as_ref();
        let file_name = path
            .file_name()
            .and_then(OsStr::to_str)
            .ok_or_else(|| Error::InvalidPath(path.to_path_buf()))?;
        let form = multipart::encode(field_name, file_name, fields)?;
        let source = FileSource::open(path)?;
        diagnostics.emit(|| format!("opened {} for upload", path.display()));
        Ok(Self::assemble(form, source, diagnostics))
    }
}

impl<R: Read> UploadSession<R> {
    /// Like [`UploadSession::create`], but streams from an already open
    /// reader sent as `file_name`. The body length is unknown.
    pub fn from_reader<I, K, V>(
        field_name: &str,
        file_name: &str,
        reader: R,
        fields: I,
        diagnostics: Diagnostics,
    ) -> Result<(Self, String)>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let form = multipart::encode(field_name, file_name, fields)?;
        Ok(Self::assemble(form, FileSource::new(reader), diagnostics))
    }

    fn assemble(form: Form, source: FileSource<R>, diagnostics: Diagnostics) -> (Self, String) {
        let Form {
            boundary,
            content_type,
            head,
            tail,
        } = form;
        let session = Self {
            boundary,
            head,
            tail,
            file_size: source.size(),
            source: Some(source),
            state: State::PreSegment,
            released: false,
            emitted: 0,
            emitted_from_file: 0,
            diagnostics,
        };
        (session, content_type)
    }

    /// Fills `buf` with the next bytes of the body.
    ///
    /// The call only returns with spare capacity when the body is complete.
    /// The call that drains the last byte reports [`Status::EndOfStream`],
    /// and every later call returns zero bytes with the same status. A read
    /// failure moves the session to [`State::Failed`] and later calls return
    /// [`Error::Failed`]. After [`UploadSession::release`] every call returns
    /// [`Error::Released`].
    pub fn pull(&mut self, buf: &mut [u8]) -> Result<Pull> {
        if self.released {
            return Err(Error::Released);
        }
        match self.state {
            State::Finished => return Ok(Pull::end(0)),
            State::Failed => return Err(Error::Failed),
            _ => {}
        }
        self.diagnostics
            .emit(|| format!("pull of {} bytes in {:?}", buf.len(), self.state));

        let mut filled = 0;
        while filled < buf.len() {
            match self.state {
                State::PreSegment => {
                    filled += self.head.drain_into(&mut buf[filled..]);
                    if self.head.is_drained() {
                        self.advance(State::FileContent);
                    }
                }
                State::FileContent => {
                    let wanted = buf.len() - filled;
                    let n = match self.read_file(&mut buf[filled..]) {
                        Ok(n) => n,
                        Err(err) => return Err(self.fail(err)),
                    };
                    filled += n;
                    self.emitted_from_file += n as u64;
                    if n < wanted {
                        self.source = None;
                        self.advance(State::PostSegment);
                    }
                }
                State::PostSegment => {
                    filled += self.tail.drain_into(&mut buf[filled..]);
                    if self.tail.is_drained() {
                        self.advance(State::Finished);
                    }
                }
                State::Finished | State::Failed => break,
            }
        }
        self.emitted += filled as u64;

        if self.state == State::Finished {
            self.diagnostics.emit(|| {
                format!(
                    "end of stream after {} bytes ({} from file)",
                    self.emitted, self.emitted_from_file
                )
            });
            Ok(Pull::end(filled))
        } else {
            Ok(Pull::more(filled))
        }
    }

    fn read_file(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.source.as_mut() {
            Some(source) => source.pull(buf),
            None => Err(io::Error::new(io::ErrorKind::Other, "file already closed")),
        }
    }

    fn advance(&mut self, next: State) {
        debug_assert!(next > self.state, "{:?} -> {next:?}", self.state);
        let done = self.state;
        self.diagnostics.emit(|| match done {
            State::FileContent => format!("file content done, {} bytes", self.emitted_from_file),
            _ => format!("{done:?} done"),
        });
        self.state = next;
    }

    fn fail(&mut self, err: io::Error) -> Error {
        self.diagnostics
            .emit(|| format!("read failed in {:?}: {err}", self.state));
        self.state = State::Failed;
        self.source = None;
        Error::Read(err)
    }

    /// Closes the file. Safe to call any number of times, at any point.
    pub fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        if self.source.take().is_some() {
            self.diagnostics
                .emit(|| format!("released in {:?}, file closed", self.state));
        } else {
            self.diagnostics.emit(|| format!("released in {:?}", self.state));
        }
    }

    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    pub fn correlation_id(&self) -> &str {
        self.diagnostics.correlation_id()
    }

    /// Total body length, if the file size was known when the session was
    /// created.
    pub fn content_length(&self) -> Option<u64> {
        self.file_size
            .map(|size| self.head.len() as u64 + size + self.tail.len() as u64)
    }

    /// Bytes handed out so far across all segments.
    pub fn bytes_emitted(&self) -> u64 {
        self.emitted
    }

    pub fn bytes_emitted_from_file(&self) -> u64 {
        self.emitted_from_file
    }
}

impl Pull {
    fn more(written: usize) -> Self {
        Self {
            written,
            status: Status::More,
        }
    }

    fn end(written: usize) -> Self {
        Self {
            written,
            status: Status::EndOfStream,
        }
    }
}

impl<R: Read> Read for UploadSession<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.pull(buf) {
            Ok(pull) => Ok(pull.written),
            Err(Error::Read(err)) => Err(err),
            Err(err) => Err(io::Error::new(io::ErrorKind::Other, err.to_string())),
        }
    }
}

impl<R> fmt::Debug for UploadSession<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadSession")
            .field("boundary", &self.boundary)
            .field("state", &self.state)
            .field("released", &self.released)
            .field("emitted", &self.emitted)
            .field("emitted_from_file", &self.emitted_from_file)
            .field("diagnostics", &self.diagnostics)
            .finish_non_exhaustive()
    }
}
