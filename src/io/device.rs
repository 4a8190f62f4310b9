//! Backing storages for [`BinaryStream`](super::BinaryStream).
//!
//! Every storage implements [`StreamDevice`], so writers never need to know
//! whether they are filling a file, a growable buffer or a fixed slice.
//!
//! | Device         | Extent               | Out-of-range write        |
//! |----------------|----------------------|---------------------------|
//! | [`FileDevice`]   | grows on write       | extends the file          |
//! | [`MemoryDevice`] | grows on write       | extends (zero-filled gap) |
//! | [`FixedBuffer`]  | fixed at creation    | clipped, `StreamOverflow` |

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::Path;

use crate::errors::{Result, RigError};

/// Byte-level storage behind a [`BinaryStream`](super::BinaryStream).
pub trait StreamDevice {
    /// Fills `buf` from the current position and advances past the bytes read.
    ///
    /// A short read zero-fills the rest of `buf` and returns
    /// [`RigError::StreamUnderflow`].
    fn read(&mut self, buf: &mut [u8]) -> Result<()>;

    /// Writes `data` at the current position and advances past it.
    fn write(&mut self, data: &[u8]) -> Result<()>;

    /// Moves to an absolute position.
    fn seek(&mut self, position: u64) -> Result<()>;

    /// Current absolute position.
    fn position(&self) -> u64;

    /// Current extent in bytes.
    fn size(&self) -> u64;

    fn at_end(&self) -> bool {
        self.position() >= self.size()
    }

    /// Pushes buffered bytes down to the underlying storage.
    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

impl<D: StreamDevice + ?Sized> StreamDevice for Box<D> {
    fn read(&mut self, buf: &mut [u8]) -> Result<()> {
        (**self).read(buf)
    }

    fn write(&mut self, data: &[u8]) -> Result<()> {
        (**self).write(data)
    }

    fn seek(&mut self, position: u64) -> Result<()> {
        (**self).seek(position)
    }

    fn position(&self) -> u64 {
        (**self).position()
    }

    fn size(&self) -> u64 {
        (**self).size()
    }

    fn at_end(&self) -> bool {
        (**self).at_end()
    }

    fn flush(&mut self) -> Result<()> {
        (**self).flush()
    }
}

/// Copies from `data[position..]` into `buf`, zero-filling whatever is missing.
fn read_from_slice(data: &[u8], position: &mut usize, buf: &mut [u8]) -> Result<()> {
    let start = (*position).min(data.len());
    let n = buf.len().min(data.len() - start);
    buf[..n].copy_from_slice(&data[start..start + n]);
    buf[n..].fill(0);
    *position = start + n;

    if n < buf.len() {
        return Err(RigError::StreamUnderflow {
            position: start as u64,
            requested: buf.len() as u64,
            available: n as u64,
        });
    }
    Ok(())
}

// ============================================================================
// Fixed-extent memory
// ============================================================================

/// A caller-owned slice with a fixed extent.
///
/// Writes and seeks past the end are clipped to the slice and reported as
/// [`RigError::StreamOverflow`]; neighbouring memory is never touched.
#[derive(Debug)]
pub struct FixedBuffer<'a> {
    data: &'a mut [u8],
    position: usize,
}

impl<'a> FixedBuffer<'a> {
    pub fn new(data: &'a mut [u8]) -> Self {
        Self { data, position: 0 }
    }

    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.data[..]
    }
}

impl StreamDevice for FixedBuffer<'_> {
    fn read(&mut self, buf: &mut [u8]) -> Result<()> {
        read_from_slice(&*self.data, &mut self.position, buf)
    }

    fn write(&mut self, data: &[u8]) -> Result<()> {
        let start = self.position;
        let available = self.data.len() - start;
        let n = data.len().min(available);
        self.data[start..start + n].copy_from_slice(&data[..n]);
        self.position += n;

        if n < data.len() {
            return Err(RigError::StreamOverflow {
                op: "write",
                position: start as u64,
                requested: data.len() as u64,
                available: available as u64,
            });
        }
        Ok(())
    }

    fn seek(&mut self, position: u64) -> Result<()> {
        let len = self.data.len() as u64;
        if position > len {
            let from = self.position as u64;
            self.position = self.data.len();
            return Err(RigError::StreamOverflow {
                op: "seek",
                position: from,
                requested: position,
                available: len,
            });
        }
        self.position = position as usize;
        Ok(())
    }

    fn position(&self) -> u64 {
        self.position as u64
    }

    fn size(&self) -> u64 {
        self.data.len() as u64
    }
}

// ============================================================================
// Growable memory
// ============================================================================

/// An owned, growable byte buffer.
#[derive(Debug, Default, Clone)]
pub struct MemoryDevice {
    data: Vec<u8>,
    position: usize,
}

impl MemoryDevice {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: Vec::with_capacity(capacity),
            position: 0,
        }
    }

    /// Opens existing bytes for reading (or patching) from position 0.
    #[must_use]
    pub fn from_bytes(data: Vec<u8>) -> Self {
        Self { data, position: 0 }
    }

    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    #[must_use]
    pub fn into_inner(self) -> Vec<u8> {
        self.data
    }
}

impl StreamDevice for MemoryDevice {
    fn read(&mut self, buf: &mut [u8]) -> Result<()> {
        read_from_slice(&self.data, &mut self.position, buf)
    }

    fn write(&mut self, data: &[u8]) -> Result<()> {
        let end = self.position + data.len();
        if end > self.data.len() {
            self.data.resize(end, 0);
        }
        self.data[self.position..end].copy_from_slice(data);
        self.position = end;
        Ok(())
    }

    fn seek(&mut self, position: u64) -> Result<()> {
        self.position = position as usize;
        Ok(())
    }

    fn position(&self) -> u64 {
        self.position as u64
    }

    fn size(&self) -> u64 {
        self.data.len() as u64
    }
}

// ============================================================================
// File
// ============================================================================

/// How a [`FileDevice`] opens its file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    /// Existing file, reads only.
    ReadOnly,
    /// Created or truncated, writes (and read-back of written bytes).
    WriteOnly,
    /// Existing file, reads and writes in place.
    ReadWrite,
}

/// A file on disk. Grows on write; there is no fixed extent.
#[derive(Debug)]
pub struct FileDevice {
    file: BufWriter<File>,
    position: u64,
    len: u64,
}

impl FileDevice {
    pub fn open(path: impl AsRef<Path>, mode: OpenMode) -> Result<Self> {
        let path = path.as_ref();
        let file = match mode {
            OpenMode::ReadOnly => File::open(path)?,
            OpenMode::WriteOnly => OpenOptions::new()
                .read(true)
                .write(true)
                .create(true)
                .truncate(true)
                .open(path)?,
            OpenMode::ReadWrite => OpenOptions::new().read(true).write(true).open(path)?,
        };
        let len = file.metadata()?.len();
        log::trace!("Opened {} ({mode:?}, {len} bytes)", path.display());

        Ok(Self {
            file: BufWriter::new(file),
            position: 0,
            len,
        })
    }

    /// Shorthand for [`OpenMode::WriteOnly`].
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        Self::open(path, OpenMode::WriteOnly)
    }
}

impl StreamDevice for FileDevice {
    fn read(&mut self, buf: &mut [u8]) -> Result<()> {
        // Buffered writes must land before the handle is read directly.
        self.file.flush()?;
        let start = self.position;
        let inner = self.file.get_mut();

        let mut filled = 0;
        while filled < buf.len() {
            match inner.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => {}
                Err(e) => return Err(e.into()),
            }
        }
        buf[filled..].fill(0);
        self.position += filled as u64;

        if filled < buf.len() {
            return Err(RigError::StreamUnderflow {
                position: start,
                requested: buf.len() as u64,
                available: filled as u64,
            });
        }
        Ok(())
    }

    fn write(&mut self, data: &[u8]) -> Result<()> {
        self.file.write_all(data)?;
        self.position += data.len() as u64;
        self.len = self.len.max(self.position);
        Ok(())
    }

    fn seek(&mut self, position: u64) -> Result<()> {
        self.file.seek(SeekFrom::Start(position))?;
        self.position = position;
        Ok(())
    }

    fn position(&self) -> u64 {
        self.position
    }

    fn size(&self) -> u64 {
        self.len
    }

    fn flush(&mut self) -> Result<()> {
        self.file.flush()?;
        Ok(())
    }
}
