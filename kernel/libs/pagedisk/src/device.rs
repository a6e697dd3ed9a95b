// SPDX-License-Identifier: MPL-2.0

use crate::{
    config::PageDiskConfig,
    diagnostics::Snapshot,
    frame::{FrameAllocator, HeapFrameAllocator},
    gate::{AccessGate, AccessMode},
    mmap::{self, MappedRange, MappingTarget},
    prelude::*,
    seek::SeekFrom,
    session::Session,
    store::PageStore,
};

/// A RAM disk made of pages that are allocated on demand.
///
/// All sessions share the same pages. Every mutation of the page list or the
/// data size happens under the write lock of `store`, so a reader never sees
/// a data size that covers bytes that are not yet in a page.
pub struct PageDisk {
    config: PageDiskConfig,
    gate: AccessGate,
    store: RwLock<PageStore>,
}

impl PageDisk {
    /// Creates an empty disk whose pages come from the heap.
    pub fn new(config: PageDiskConfig) -> Arc<Self> {
        Self::with_allocator(config, Arc::new(HeapFrameAllocator))
    }

    /// Creates an empty disk whose pages come from `allocator`.
    pub fn with_allocator(config: PageDiskConfig, allocator: Arc<dyn FrameAllocator>) -> Arc<Self> {
        info!(
            "{}: created as {}:{}, up to {} sessions",
            config.name(),
            config.major(),
            config.minor(),
            config.max_sessions()
        );

        Arc::new(Self {
            gate: AccessGate::new(config.max_sessions()),
            store: RwLock::new(PageStore::new(allocator)),
            config,
        })
    }

    /// Opens a new session.
    ///
    /// If `write_intent` is set, the contents of the disk are discarded before
    /// the session is returned. Fails with `EBUSY` if the session cap is reached.
    pub fn open(self: &Arc<Self>, write_intent: bool) -> Result<Session> {
        let nr_sessions = self.gate.enter()?;
        // From here on, dropping the session gives the slot back.
        let session = Session::new(self.clone(), write_intent);

        if write_intent {
            let mut store = self.store.write();
            let nr_pages = store.num_pages();
            store.reset();
            debug!("{}: reset, {} pages released", self.config.name(), nr_pages);
        }

        debug!(
            "{}: session opened ({} of {})",
            self.config.name(),
            nr_sessions,
            self.gate.max_sessions()
        );
        Ok(session)
    }

    /// Opens a new session with raw open flags.
    ///
    /// Only a write-only open discards the contents of the disk.
    pub fn open_with_flags(self: &Arc<Self>, flags: u32) -> Result<Session> {
        let access_mode = AccessMode::from_flags(flags)?;
        self.open(access_mode.has_write_intent())
    }

    /// Replaces the session cap.
    ///
    /// Fails with `EINVAL` if `max_sessions` is less than one. Sessions that are
    /// already open are not affected.
    pub fn set_max_sessions(&self, max_sessions: i32) -> Result<()> {
        self.gate.set_max_sessions(max_sessions)?;
        info!("{}: the session cap is now {}", self.config.name(), max_sessions);
        Ok(())
    }

    /// Takes a snapshot of the disk state.
    pub fn snapshot(&self) -> Snapshot {
        let store = self.store.read();
        Snapshot {
            major: self.config.major(),
            minor: self.config.minor(),
            num_pages: store.num_pages(),
            data_size: store.data_size(),
            active_sessions: self.gate.nr_sessions(),
            max_sessions: self.gate.max_sessions(),
        }
    }

    /// Writes the diagnostics report, starting at byte `offset` of the text, into `writer`.
    pub fn read_diagnostics<W: FallibleVmWrite + ?Sized>(
        &self,
        offset: usize,
        writer: &mut W,
    ) -> Result<usize> {
        self.snapshot().read_at(offset, writer)
    }

    pub fn config(&self) -> &PageDiskConfig {
        &self.config
    }

    /// Copies data at `*pos` into `writer`, advancing `*pos` past the copied bytes.
    ///
    /// The copy stops at the data size. If the writer faults, the bytes of the
    /// pages completed before the fault still count towards `*pos`.
    pub(crate) fn read_at<W: FallibleVmWrite + ?Sized>(
        &self,
        pos: &mut usize,
        writer: &mut W,
    ) -> Result<usize> {
        let store = self.store.read();
        let data_size = store.data_size();
        if *pos >= data_size {
            return Ok(0);
        }

        let end = data_size.min(pos.saturating_add(writer.avail()));
        let start = *pos;
        while *pos < end {
            let page_offset = *pos % PAGE_SIZE;
            let chunk_len = (PAGE_SIZE - page_offset).min(end - *pos);
            let frame = store.page_at(*pos / PAGE_SIZE);
            let copied = frame
                .read_to(page_offset, chunk_len, writer)
                .map_err(|(err, _)| {
                    warn!("{}: read fault at {}: {:?}", self.config.name(), *pos, err);
                    Error::with_message(Errno::EFAULT, "failed to copy to the buffer")
                })?;
            if copied == 0 {
                break;
            }
            *pos += copied;
        }

        Ok(*pos - start)
    }

    /// Copies the data of `reader` to `*pos`, advancing `*pos` past the copied bytes.
    ///
    /// The disk grows as needed. The data size is only updated if the whole copy
    /// succeeds; if the reader faults, the bytes of the pages completed before the
    /// fault still count towards `*pos`.
    pub(crate) fn write_at<R: FallibleVmRead + ?Sized>(
        &self,
        pos: &mut usize,
        reader: &mut R,
    ) -> Result<usize> {
        let Some(end) = pos.checked_add(reader.remain()) else {
            return_errno_with_message!(Errno::ENOMEM, "the write runs past the addressable range");
        };

        let mut store = self.store.write();
        store.ensure_capacity(end.div_ceil(PAGE_SIZE))?;

        let start = *pos;
        while *pos < end {
            let page_offset = *pos % PAGE_SIZE;
            let chunk_len = (PAGE_SIZE - page_offset).min(end - *pos);
            let frame = store.page_at(*pos / PAGE_SIZE);
            let copied = frame
                .write_from(page_offset, chunk_len, reader)
                .map_err(|(err, _)| {
                    warn!("{}: write fault at {}: {:?}", self.config.name(), *pos, err);
                    Error::with_message(Errno::EFAULT, "failed to copy from the buffer")
                })?;
            if copied == 0 {
                break;
            }
            *pos += copied;
        }

        store.extend_data_size(*pos);
        Ok(*pos - start)
    }

    /// Resolves a seek request against the current capacity.
    pub(crate) fn seek(&self, pos: usize, seek_from: SeekFrom) -> usize {
        seek_from.resolve(pos, self.store.read().capacity())
    }

    /// Binds the pages covered by `target`.
    ///
    /// The page list cannot change while the pages are being bound.
    pub(crate) fn export<T: MappingTarget + ?Sized>(&self, target: &mut T) -> Result<MappedRange> {
        mmap::export(&self.store.read(), target)
    }

    pub(crate) fn gate(&self) -> &AccessGate {
        &self.gate
    }
}

impl core::fmt::Debug for PageDisk {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PageDisk")
            .field("config", &self.config)
            .field("snapshot", &self.snapshot())
            .finish()
    }
}
