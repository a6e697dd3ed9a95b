// SPDX-License-Identifier: MPL-2.0

use crate::{
    device::PageDisk,
    ioctl,
    mmap::{MappedRange, MappingTarget},
    prelude::*,
    seek::SeekFrom,
};

/// An open handle to a [`PageDisk`].
///
/// Each session has its own cursor. Dropping the session closes it and frees
/// its slot for a new session.
pub struct Session {
    disk: Arc<PageDisk>,
    offset: Mutex<usize>,
    write_intent: bool,
}

impl Session {
    pub(crate) fn new(disk: Arc<PageDisk>, write_intent: bool) -> Self {
        Self {
            disk,
            offset: Mutex::new(0),
            write_intent,
        }
    }

    /// Reads data at the cursor into `writer` and advances the cursor.
    ///
    /// Returns zero at or past the end of the data. Fails with `EFAULT` if
    /// `writer` faults; the number of bytes copied before the fault is lost.
    pub fn read<W: FallibleVmWrite + ?Sized>(&self, writer: &mut W) -> Result<usize> {
        let mut offset = self.offset.lock();
        let read_len = self.disk.read_at(&mut offset, writer)?;
        trace!("read {} bytes, the cursor is now {}", read_len, *offset);
        Ok(read_len)
    }

    /// Writes the data of `reader` at the cursor and advances the cursor.
    ///
    /// Fails with `ENOMEM` if the disk cannot grow and with `EFAULT` if `reader`
    /// faults. In both cases the data size is left as it was.
    pub fn write<R: FallibleVmRead + ?Sized>(&self, reader: &mut R) -> Result<usize> {
        let mut offset = self.offset.lock();
        let write_len = self.disk.write_at(&mut offset, reader)?;
        trace!("wrote {} bytes, the cursor is now {}", write_len, *offset);
        Ok(write_len)
    }

    pub fn read_bytes(&self, buf: &mut [u8]) -> Result<usize> {
        self.read(&mut VmWriter::from(buf))
    }

    pub fn write_bytes(&self, buf: &[u8]) -> Result<usize> {
        self.write(&mut VmReader::from(buf))
    }

    /// Moves the cursor and returns its new position.
    ///
    /// The position is clamped into `[0, capacity]`.
    pub fn seek(&self, seek_from: SeekFrom) -> usize {
        let mut offset = self.offset.lock();
        *offset = self.disk.seek(*offset, seek_from);
        *offset
    }

    /// Moves the cursor with a raw `offset` and `whence` pair.
    ///
    /// Fails with `EINVAL` if `whence` is unknown, leaving the cursor untouched.
    pub fn lseek(&self, offset: i64, whence: u32) -> Result<usize> {
        let seek_from = SeekFrom::from_raw(offset, whence)?;
        Ok(self.seek(seek_from))
    }

    /// Returns the cursor position.
    pub fn offset(&self) -> usize {
        *self.offset.lock()
    }

    pub fn write_intent(&self) -> bool {
        self.write_intent
    }

    /// Executes a raw control command, reading its argument from `arg`.
    pub fn ioctl<R: FallibleVmRead + ?Sized>(&self, cmd: u32, arg: &mut R) -> Result<i32> {
        ioctl::dispatch(&self.disk, cmd, arg)
    }

    /// Binds the pages of the disk into `target`.
    ///
    /// See [`MappingTarget`] for how the range is laid out.
    pub fn mmap<T: MappingTarget + ?Sized>(&self, target: &mut T) -> Result<MappedRange> {
        self.disk.export(target)
    }

    pub fn disk(&self) -> &Arc<PageDisk> {
        &self.disk
    }

    /// Closes the session.
    pub fn close(self) {}
}

impl Drop for Session {
    fn drop(&mut self) {
        let nr_sessions = self.disk.gate().leave();
        debug!(
            "{}: session closed, {} left",
            self.disk.config().name(),
            nr_sessions
        );
    }
}

impl core::fmt::Debug for Session {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Session")
            .field("offset", &self.offset())
            .field("write_intent", &self.write_intent)
            .finish_non_exhaustive()
    }
}
