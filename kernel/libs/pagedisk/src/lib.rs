// SPDX-License-Identifier: MPL-2.0

//! A RAM disk backed by a growable list of pages.
//!
//! A [`PageDisk`] behaves like a character device whose contents live in memory.
//! Its capacity grows lazily, one page at a time, as data is written past the
//! current end of the backing pages. The contents are reclaimed in bulk when a
//! session opens the disk with write intent.
//!
//! The same backing pages are visible through three views that are kept
//! consistent with each other:
//!
//! - the byte stream seen by [`Session::read`] and [`Session::write`];
//! - the logical data size, which is distinct from the allocated capacity;
//! - the pages exported to a caller's address range by [`Session::mmap`].
//!
//! The crate never touches an address space itself. Page allocation, page
//! release and page binding are supplied by the host through the
//! [`FrameAllocator`] and [`MappingTarget`] traits.
//!
//! # Example
//!
//! ```
//! use pagedisk::{PageDisk, PageDiskConfig, SeekFrom, PAGE_SIZE};
//!
//! let disk = PageDisk::new(PageDiskConfig::default());
//! let session = disk.open(true).unwrap();
//!
//! let data = vec![0xabu8; 5000];
//! assert_eq!(session.write_bytes(&data).unwrap(), 5000);
//! assert_eq!(disk.snapshot().num_pages, 2);
//!
//! // Seeking relative to the end measures from the capacity.
//! assert_eq!(session.seek(SeekFrom::End(0)), 2 * PAGE_SIZE);
//! ```

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

extern crate alloc;

pub mod config;
mod device;
pub mod diagnostics;
pub mod error;
pub mod frame;
mod gate;
pub mod io;
pub mod ioctl;
pub mod mmap;
mod prelude;
mod printer;
pub mod seek;
mod session;
mod store;

pub use self::{
    config::PageDiskConfig,
    device::PageDisk,
    diagnostics::Snapshot,
    error::{Errno, Error},
    frame::{Frame, FrameAllocator, HeapFrameAllocator},
    gate::AccessMode,
    io::{FallibleVmRead, FallibleVmWrite, VmReader, VmWriter},
    mmap::{MappedRange, MappingTarget},
    seek::{SeekFrom, Whence},
    session::Session,
};

/// The size of a page in bytes.
///
/// Every page backing a [`PageDisk`] has exactly this size.
pub const PAGE_SIZE: usize = 4096;
