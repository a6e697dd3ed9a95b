// SPDX-License-Identifier: MPL-2.0

//! Abstractions for moving bytes between the disk and its callers.
//!
//! The disk copies data in and out of caller-supplied buffers. Such a buffer may
//! live in another address space and become inaccessible in the middle of a copy,
//! so the disk only ever talks to it through the [`FallibleVmRead`] and
//! [`FallibleVmWrite`] traits, whose copies can fail after transferring part of
//! the data.
//!
//! [`VmReader`] and [`VmWriter`] are the infallible cursors over memory the disk
//! owns (the page contents, or kernel-side scratch buffers). They also implement
//! the fallible traits, so plain slices can be passed wherever a caller buffer is
//! expected.

use core::mem;

use crate::prelude::*;

/// A caller buffer that the disk reads data from.
pub trait FallibleVmRead {
    /// Returns the number of bytes that remain to be read.
    fn remain(&self) -> usize;

    /// Reads all data into the writer until one of the three conditions is met:
    /// 1. The reader has no remaining data.
    /// 2. The writer has no available space.
    /// 3. The reader encounters some error.
    ///
    /// On success, the number of bytes read is returned;
    /// On error, both the error and the number of bytes read so far are returned.
    fn read_fallible(
        &mut self,
        writer: &mut VmWriter<'_>,
    ) -> core::result::Result<usize, (Error, usize)>;
}

/// A caller buffer that the disk writes data to.
pub trait FallibleVmWrite {
    /// Returns the number of bytes for the available space.
    fn avail(&self) -> usize;

    /// Writes all data from the reader until one of the three conditions is met:
    /// 1. The reader has no remaining data.
    /// 2. The writer has no available space.
    /// 3. The writer encounters some error.
    ///
    /// On success, the number of bytes written is returned;
    /// On error, both the error and the number of bytes written so far are returned.
    fn write_fallible(
        &mut self,
        reader: &mut VmReader<'_>,
    ) -> core::result::Result<usize, (Error, usize)>;
}

/// `VmReader` is a reader for reading data from a contiguous range of memory.
#[derive(Clone, Debug)]
pub struct VmReader<'a> {
    buf: &'a [u8],
}

impl VmReader<'_> {
    /// Reads all data into the writer until one of the two conditions is met:
    /// 1. The reader has no remaining data.
    /// 2. The writer has no available space.
    ///
    /// Returns the number of bytes read.
    pub fn read(&mut self, writer: &mut VmWriter<'_>) -> usize {
        let copy_len = self.remain().min(writer.avail());
        if copy_len == 0 {
            return 0;
        }

        writer.buf[..copy_len].copy_from_slice(&self.buf[..copy_len]);
        self.skip(copy_len);
        writer.skip(copy_len);
        copy_len
    }

    /// Returns the number of bytes for the remaining data.
    pub fn remain(&self) -> usize {
        self.buf.len()
    }

    /// Returns if it has remaining data to read.
    pub fn has_remain(&self) -> bool {
        self.remain() > 0
    }

    /// Limits the length of remaining data.
    ///
    /// This method ensures the post condition of `self.remain() <= max_remain`.
    pub fn limit(&mut self, max_remain: usize) -> &mut Self {
        if max_remain < self.remain() {
            self.buf = &self.buf[..max_remain];
        }

        self
    }

    /// Skips the first `nbytes` bytes of data.
    /// The length of remaining data is decreased accordingly.
    ///
    /// # Panics
    ///
    /// If `nbytes` is greater than `self.remain()`, then the method panics.
    pub fn skip(&mut self, nbytes: usize) -> &mut Self {
        assert!(nbytes <= self.remain());
        self.buf = &self.buf[nbytes..];

        self
    }
}

impl<'a> From<&'a [u8]> for VmReader<'a> {
    fn from(slice: &'a [u8]) -> Self {
        Self { buf: slice }
    }
}

impl FallibleVmRead for VmReader<'_> {
    fn remain(&self) -> usize {
        self.buf.len()
    }

    fn read_fallible(
        &mut self,
        writer: &mut VmWriter<'_>,
    ) -> core::result::Result<usize, (Error, usize)> {
        Ok(self.read(writer))
    }
}

/// `VmWriter` is a writer for writing data to a contiguous range of memory.
#[derive(Debug)]
pub struct VmWriter<'a> {
    buf: &'a mut [u8],
}

impl VmWriter<'_> {
    /// Writes all data from the reader until one of the two conditions is met:
    /// 1. The reader has no remaining data.
    /// 2. The writer has no available space.
    ///
    /// Returns the number of bytes written.
    pub fn write(&mut self, reader: &mut VmReader<'_>) -> usize {
        reader.read(self)
    }

    /// Returns the number of bytes for the available space.
    pub fn avail(&self) -> usize {
        self.buf.len()
    }

    /// Returns if it has available space to write.
    pub fn has_avail(&self) -> bool {
        self.avail() > 0
    }

    /// Limits the length of available space.
    ///
    /// This method ensures the post condition of `self.avail() <= max_avail`.
    pub fn limit(&mut self, max_avail: usize) -> &mut Self {
        if max_avail < self.avail() {
            let buf = mem::take(&mut self.buf);
            self.buf = &mut buf[..max_avail];
        }

        self
    }

    /// Skips the first `nbytes` bytes of data.
    /// The length of available space is decreased accordingly.
    ///
    /// # Panics
    ///
    /// If `nbytes` is greater than `self.avail()`, then the method panics.
    pub fn skip(&mut self, nbytes: usize) -> &mut Self {
        assert!(nbytes <= self.avail());
        let buf = mem::take(&mut self.buf);
        self.buf = &mut buf[nbytes..];

        self
    }
}

impl<'a> From<&'a mut [u8]> for VmWriter<'a> {
    fn from(slice: &'a mut [u8]) -> Self {
        Self { buf: slice }
    }
}

impl FallibleVmWrite for VmWriter<'_> {
    fn avail(&self) -> usize {
        self.buf.len()
    }

    fn write_fallible(
        &mut self,
        reader: &mut VmReader<'_>,
    ) -> core::result::Result<usize, (Error, usize)> {
        Ok(reader.read(self))
    }
}

/// Reads a native-endian `i32` out of a caller buffer.
///
/// A buffer that faults or holds fewer than four bytes yields `EFAULT`.
pub(crate) fn read_i32<R: FallibleVmRead + ?Sized>(reader: &mut R) -> Result<i32> {
    let mut bytes = [0u8; mem::size_of::<i32>()];
    let mut writer = VmWriter::from(&mut bytes[..]);
    let read_len = reader
        .read_fallible(&mut writer)
        .map_err(|_| Error::with_message(Errno::EFAULT, "failed to read the argument"))?;
    if read_len < bytes.len() {
        return_errno_with_message!(Errno::EFAULT, "the argument is too short");
    }

    Ok(i32::from_ne_bytes(bytes))
}
