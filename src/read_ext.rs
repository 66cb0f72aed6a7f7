use std::io::{self, ErrorKind, Read};

pub trait ReadExt {
    /// Reads until `buf` is full or the reader reports end of input.
    ///
    /// A return value shorter than `buf.len()` means the reader is exhausted;
    /// a short read from the underlying reader alone never causes one.
    fn read_max(&mut self, buf: &mut [u8]) -> io::Result<usize>;
}

impl<T: Read> ReadExt for T {
    fn read_max(&mut self, mut buf: &mut [u8]) -> io::Result<usize> {
        let mut bytes_read = 0;
        while !buf.is_empty() {
            match self.read(buf) {
                Ok(0) => break,
                Ok(n) => {
                    let tmp = buf;
                    buf = &mut tmp[n..];
                    bytes_read += n;
                }
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(err),
            }
        }
        Ok(bytes_read)
    }
}
