// SPDX-License-Identifier: MPL-2.0

//! A read-only report of the disk state.

use core::fmt;

use crate::{prelude::*, printer::VmPrinter};

/// A consistent view of the disk state at one point in time.
///
/// Taking a snapshot never changes the disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Snapshot {
    pub major: u32,
    pub minor: u32,
    pub num_pages: usize,
    pub data_size: usize,
    pub active_sessions: usize,
    pub max_sessions: usize,
}

impl Snapshot {
    /// Returns the number of addressable bytes.
    pub fn capacity(&self) -> usize {
        self.num_pages * PAGE_SIZE
    }

    /// Writes the textual report, starting at byte `offset` of the text, into `writer`.
    ///
    /// Returns the number of bytes written; zero once `offset` is past the end of the text.
    pub fn read_at<W: FallibleVmWrite + ?Sized>(&self, offset: usize, writer: &mut W) -> Result<usize> {
        let mut printer = VmPrinter::new_skip(writer, offset);
        write!(printer, "{}", self)?;
        Ok(printer.bytes_written())
    }
}

impl fmt::Display for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Major: {}", self.major)?;
        writeln!(f, "Minor: {}", self.minor)?;
        writeln!(f, "Pages: {}", self.num_pages)?;
        writeln!(f, "Data size: {}", self.data_size)?;
        writeln!(f, "Nprocs: {}", self.active_sessions)?;
        writeln!(f, "Max nprocs: {}", self.max_sessions)
    }
}
