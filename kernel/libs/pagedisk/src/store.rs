// SPDX-License-Identifier: MPL-2.0

use crate::{
    frame::{Frame, FrameAllocator},
    prelude::*,
};

/// The ordered list of pages backing a disk.
///
/// Page `i` holds the bytes `[i * PAGE_SIZE, (i + 1) * PAGE_SIZE)` of the disk.
/// Pages are only ever appended at the end or released all at once; a page
/// never moves once it is in the list.
///
/// The store also tracks the logical data size, which never exceeds the
/// capacity (`num_pages * PAGE_SIZE`).
pub(crate) struct PageStore {
    pages: Vec<Frame>,
    data_size: usize,
    allocator: Arc<dyn FrameAllocator>,
}

impl PageStore {
    pub(crate) fn new(allocator: Arc<dyn FrameAllocator>) -> Self {
        Self {
            pages: Vec::new(),
            data_size: 0,
            allocator,
        }
    }

    pub(crate) fn num_pages(&self) -> usize {
        self.pages.len()
    }

    /// Returns the number of addressable bytes, regardless of how many hold data.
    pub(crate) fn capacity(&self) -> usize {
        self.pages.len() * PAGE_SIZE
    }

    pub(crate) fn data_size(&self) -> usize {
        self.data_size
    }

    /// Extends the logical data size to `end` if it is not already that large.
    ///
    /// # Panics
    ///
    /// Panics if `end` is beyond the capacity.
    pub(crate) fn extend_data_size(&mut self, end: usize) {
        assert!(end <= self.capacity());
        self.data_size = self.data_size.max(end);
    }

    /// Appends pages until the store holds at least `required_pages` pages.
    ///
    /// If an allocation fails, the pages appended before the failure are kept.
    pub(crate) fn ensure_capacity(&mut self, required_pages: usize) -> Result<()> {
        let Some(nr_missing) = required_pages.checked_sub(self.pages.len()) else {
            return Ok(());
        };
        if nr_missing == 0 {
            return Ok(());
        }

        if self.pages.try_reserve(nr_missing).is_err() {
            return_errno_with_message!(Errno::ENOMEM, "cannot grow the page list");
        }

        while self.pages.len() < required_pages {
            let frame = self.allocator.alloc_frame().inspect_err(|_| {
                warn!(
                    "page allocation failed with {} of {} pages in place",
                    self.pages.len(),
                    required_pages
                );
            })?;
            self.pages.push(frame);
        }

        trace!("the store grows to {} pages", self.pages.len());
        Ok(())
    }

    /// Releases every page and clears the data.
    pub(crate) fn reset(&mut self) {
        for frame in self.pages.drain(..) {
            self.allocator.dealloc_frame(frame);
        }
        self.data_size = 0;
    }

    /// Returns the page at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is not less than the number of pages. The I/O paths always
    /// grow the store before touching a page, so this indicates a broken invariant.
    pub(crate) fn page_at(&self, index: usize) -> &Frame {
        assert!(
            index < self.pages.len(),
            "page index {} is out of range ({} pages)",
            index,
            self.pages.len()
        );
        &self.pages[index]
    }

    pub(crate) fn pages(&self) -> &[Frame] {
        &self.pages
    }
}

impl Drop for PageStore {
    fn drop(&mut self) {
        self.reset();
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::test::CountingAllocator;

    #[test]
    fn ensure_capacity_grows_exactly() {
        let mut store = PageStore::new(Arc::new(CountingAllocator::unlimited()));
        store.ensure_capacity(3).unwrap();
        assert_eq!(store.num_pages(), 3);
        assert_eq!(store.capacity(), 3 * PAGE_SIZE);

        // Never shrinks.
        store.ensure_capacity(1).unwrap();
        assert_eq!(store.num_pages(), 3);
    }

    #[test]
    fn partial_growth_is_kept() {
        let allocator = Arc::new(CountingAllocator::with_limit(2));
        let mut store = PageStore::new(allocator.clone());

        let err = store.ensure_capacity(5).unwrap_err();
        assert_eq!(err.error(), Errno::ENOMEM);
        assert_eq!(store.num_pages(), 2);
        assert_eq!(allocator.nr_allocated(), 2);
    }

    #[test]
    fn reset_releases_every_page() {
        let allocator = Arc::new(CountingAllocator::unlimited());
        let mut store = PageStore::new(allocator.clone());
        store.ensure_capacity(4).unwrap();
        store.extend_data_size(3 * PAGE_SIZE + 1);

        store.reset();
        assert_eq!(store.num_pages(), 0);
        assert_eq!(store.data_size(), 0);
        assert_eq!(allocator.nr_released(), 4);
    }

    #[test]
    fn drop_releases_every_page() {
        let allocator = Arc::new(CountingAllocator::unlimited());
        let mut store = PageStore::new(allocator.clone());
        store.ensure_capacity(2).unwrap();

        drop(store);
        assert_eq!(allocator.nr_released(), 2);
    }

    #[test]
    fn data_size_only_grows() {
        let mut store = PageStore::new(Arc::new(CountingAllocator::unlimited()));
        store.ensure_capacity(1).unwrap();
        store.extend_data_size(100);
        store.extend_data_size(50);
        assert_eq!(store.data_size(), 100);
    }

    #[test]
    #[should_panic]
    fn page_at_out_of_range() {
        let mut store = PageStore::new(Arc::new(CountingAllocator::unlimited()));
        store.ensure_capacity(1).unwrap();
        store.page_at(1);
    }
}
