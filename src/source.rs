use std::{
    fs::File,
    io::{self, BufReader, Read},
    path::Path,
};

use crate::{
    error::{Error, Result},
    read_ext::ReadExt,
};

const READ_BUFFER_SIZE: usize = 16 * 1024;

/// Incremental producer of the file content.
///
/// A source opened from a path yields exactly the size recorded at open,
/// whatever happens to the file afterwards.
#[derive(Debug)]
pub struct FileSource<R = File> {
    reader: BufReader<R>,
    len: Option<u64>,
    remaining: Option<u64>,
}

impl FileSource<File> {
    pub fn open(path: &Path) -> Result<Self> {
        let open_err = |source| Error::Open {
            path: path.to_path_buf(),
            source,
        };
        let file = File::open(path).map_err(open_err)?;
        let len = file.metadata().map_err(open_err)?.len();
        Ok(Self {
            reader: BufReader::with_capacity(READ_BUFFER_SIZE, file),
            len: Some(len),
            remaining: Some(len),
        })
    }
}

impl<R: Read> FileSource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader: BufReader::with_capacity(READ_BUFFER_SIZE, reader),
            len: None,
            remaining: None,
        }
    }

    /// Size of the content, when known up front.
    pub fn size(&self) -> Option<u64> {
        self.len
    }

    /// Fills `buf` from the file. Fewer bytes than `buf.len()` means the file
    /// has cleanly ended; a failed read is returned as an error.
    ///
    /// With a known size, bytes past it are never read, and a file that ends
    /// before it fails with [`io::ErrorKind::UnexpectedEof`].
    pub fn pull(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let Some(remaining) = self.remaining else {
            return self.reader.read_max(buf);
        };
        let wanted = usize::try_from(remaining).map_or(buf.len(), |r| r.min(buf.len()));
        let n = self.reader.read_max(&mut buf[..wanted])?;
        if n < wanted {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("file shrank, {} bytes missing", remaining - n as u64),
            ));
        }
        self.remaining = Some(remaining - n as u64);
        Ok(n)
    }
}
