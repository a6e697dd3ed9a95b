// SPDX-License-Identifier: MPL-2.0

//! Page frames and the allocation primitives the disk consumes.

use alloc::boxed::Box;
use core::fmt;

use crate::prelude::*;

/// A page of memory backing the disk.
///
/// A `Frame` is a handle: cloning it yields another handle to the same page.
/// The disk keeps one handle per page it owns, and a [`MappingTarget`] receives
/// its own handle for each page it binds, so a mapped page stays alive for as
/// long as the mapping holds it, even after the disk has released it.
///
/// [`MappingTarget`]: crate::MappingTarget
#[derive(Clone)]
pub struct Frame {
    bytes: Arc<RwLock<Box<[u8]>>>,
}

impl Frame {
    /// Allocates a zero-filled frame from the heap.
    ///
    /// Fails with `ENOMEM` if the heap cannot satisfy the request.
    pub fn new_zeroed() -> Result<Self> {
        let mut bytes = Vec::new();
        bytes
            .try_reserve_exact(PAGE_SIZE)
            .map_err(|_| Error::with_message(Errno::ENOMEM, "cannot allocate a frame"))?;
        bytes.resize(PAGE_SIZE, 0);

        Ok(Self {
            bytes: Arc::new(RwLock::new(bytes.into_boxed_slice())),
        })
    }

    /// Returns the size of the frame in bytes.
    pub const fn size(&self) -> usize {
        PAGE_SIZE
    }

    /// Copies up to `len` bytes starting at `offset` into `writer`.
    ///
    /// Returns the number of bytes copied. If the writer faults, the error and the
    /// number of bytes copied before the fault are returned.
    ///
    /// # Panics
    ///
    /// Panics if `offset` is beyond the end of the frame.
    pub fn read_to<W: FallibleVmWrite + ?Sized>(
        &self,
        offset: usize,
        len: usize,
        writer: &mut W,
    ) -> core::result::Result<usize, (Error, usize)> {
        let bytes = self.bytes.read();
        let mut reader = VmReader::from(&bytes[offset..]);
        reader.limit(len);
        writer.write_fallible(&mut reader)
    }

    /// Copies up to `len` bytes from `reader` into the frame, starting at `offset`.
    ///
    /// Returns the number of bytes copied. If the reader faults, the error and the
    /// number of bytes copied before the fault are returned.
    ///
    /// # Panics
    ///
    /// Panics if `offset` is beyond the end of the frame.
    pub fn write_from<R: FallibleVmRead + ?Sized>(
        &self,
        offset: usize,
        len: usize,
        reader: &mut R,
    ) -> core::result::Result<usize, (Error, usize)> {
        let mut bytes = self.bytes.write();
        let mut writer = VmWriter::from(&mut bytes[offset..]);
        writer.limit(len);
        reader.read_fallible(&mut writer)
    }

    /// Copies bytes starting at `offset` into `buf` and returns the number copied.
    pub fn read_bytes(&self, offset: usize, buf: &mut [u8]) -> usize {
        let bytes = self.bytes.read();
        VmReader::from(&bytes[offset..]).read(&mut VmWriter::from(buf))
    }

    /// Copies `buf` into the frame starting at `offset` and returns the number copied.
    pub fn write_bytes(&self, offset: usize, buf: &[u8]) -> usize {
        let mut bytes = self.bytes.write();
        VmWriter::from(&mut bytes[offset..]).write(&mut VmReader::from(buf))
    }

    /// Returns whether both handles refer to the same page.
    pub fn ptr_eq(&self, other: &Frame) -> bool {
        Arc::ptr_eq(&self.bytes, &other.bytes)
    }
}

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Frame")
            .field("addr", &Arc::as_ptr(&self.bytes))
            .finish()
    }
}

/// The page allocation primitives supplied by the host.
///
/// The disk asks for one frame at a time while growing and hands every frame
/// back when it resets or is dropped.
pub trait FrameAllocator: Send + Sync {
    /// Allocates one zero-filled frame.
    ///
    /// Fails with `ENOMEM` if no frame is available.
    fn alloc_frame(&self) -> Result<Frame>;

    /// Releases a frame previously returned by [`alloc_frame`].
    ///
    /// The memory itself is reclaimed once the last handle to the frame is gone.
    ///
    /// [`alloc_frame`]: Self::alloc_frame
    fn dealloc_frame(&self, frame: Frame) {
        drop(frame);
    }
}

/// A frame allocator backed by the global heap.
#[derive(Debug, Default, Clone, Copy)]
pub struct HeapFrameAllocator;

impl FrameAllocator for HeapFrameAllocator {
    fn alloc_frame(&self) -> Result<Frame> {
        Frame::new_zeroed()
    }
}
