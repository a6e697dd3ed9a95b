// SPDX-License-Identifier: MPL-2.0

//! Exporting the backing pages into a caller's address range.

use crate::{frame::Frame, prelude::*, store::PageStore};

/// A destination address range that pages can be bound into.
///
/// This is the page binding primitive supplied by the host. The range is made of
/// consecutive page-sized slots; slot `i` starts `i * PAGE_SIZE` bytes after the
/// start of the range.
pub trait MappingTarget {
    /// Returns the length of the range in bytes.
    fn len(&self) -> usize;

    /// Returns whether the range is empty.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the index of the first disk page the range maps.
    fn page_offset(&self) -> usize {
        0
    }

    /// Binds `frame` into slot `slot` of the range.
    ///
    /// The target keeps its own handle to the frame for as long as the binding lives.
    fn bind(&mut self, slot: usize, frame: &Frame) -> Result<()>;
}

/// The pages bound by a successful export.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MappedRange {
    /// The index of the first disk page that was bound.
    pub first_page: usize,
    /// The number of pages that were bound.
    pub nr_pages: usize,
}

impl MappedRange {
    /// Returns the number of bytes covered by the bound pages.
    pub fn len(&self) -> usize {
        self.nr_pages * PAGE_SIZE
    }

    pub fn is_empty(&self) -> bool {
        self.nr_pages == 0
    }
}

/// Binds the pages covered by `target` in order.
///
/// If a bind fails, the export stops there. Slots that were bound before the
/// failing one stay bound; undoing them is left to the owner of the target.
pub(crate) fn export<T: MappingTarget + ?Sized>(
    store: &PageStore,
    target: &mut T,
) -> Result<MappedRange> {
    let len = target.len();
    let first_page = target.page_offset();
    let capacity = store.capacity();

    if len > capacity {
        return_errno_with_message!(Errno::EINVAL, "the mapping is larger than the disk");
    }
    let end = first_page
        .checked_mul(PAGE_SIZE)
        .and_then(|start| start.checked_add(len));
    if end.is_none_or(|end| end > capacity) {
        return_errno_with_message!(Errno::EINVAL, "the mapping runs past the end of the disk");
    }

    let nr_pages = len.div_ceil(PAGE_SIZE);
    let frames = &store.pages()[first_page..first_page + nr_pages];
    for (slot, frame) in frames.iter().enumerate() {
        if let Err(err) = target.bind(slot, frame) {
            warn!(
                "binding disk page {} failed with {:?}, {} pages stay bound",
                first_page + slot,
                err.error(),
                slot
            );
            return_errno_with_message!(Errno::EAGAIN, "failed to bind a page");
        }
    }

    debug!(
        "exported pages [{}, {}) of {}",
        first_page,
        first_page + nr_pages,
        store.num_pages()
    );
    Ok(MappedRange {
        first_page,
        nr_pages,
    })
}
