// SPDX-License-Identifier: MPL-2.0

use int_to_c_enum::TryFromInt;

use crate::prelude::*;

/// A seek request.
///
/// The offsets are signed for every variant: a target that falls outside the
/// disk is clamped, not rejected.
#[derive(Copy, PartialEq, Eq, Clone, Debug)]
pub enum SeekFrom {
    /// Seeks relative to the start of the disk.
    Start(i64),
    /// Seeks relative to the current position.
    Current(i64),
    /// Seeks relative to the end of the allocated capacity.
    ///
    /// Note that the end is `num_pages * PAGE_SIZE`, not the logical data size.
    End(i64),
}

/// The raw `whence` argument of an lseek call.
#[expect(non_camel_case_types)]
#[repr(u32)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, TryFromInt)]
pub enum Whence {
    SEEK_SET = 0,
    SEEK_CUR = 1,
    SEEK_END = 2,
}

impl SeekFrom {
    /// Builds a seek request from a raw `offset` and `whence` pair.
    ///
    /// Fails with `EINVAL` if `whence` is not one of [`Whence`].
    pub fn from_raw(offset: i64, whence: u32) -> Result<Self> {
        let seek_from = match Whence::try_from(whence)? {
            Whence::SEEK_SET => SeekFrom::Start(offset),
            Whence::SEEK_CUR => SeekFrom::Current(offset),
            Whence::SEEK_END => SeekFrom::End(offset),
        };
        Ok(seek_from)
    }

    /// Resolves the request against the current position and the capacity.
    ///
    /// The result always lies within `[0, capacity]`.
    pub(crate) fn resolve(self, current: usize, capacity: usize) -> usize {
        let capacity_i64 = i64::try_from(capacity).unwrap_or(i64::MAX);
        let target = match self {
            SeekFrom::Start(offset) => offset,
            SeekFrom::Current(offset) => i64::try_from(current)
                .unwrap_or(i64::MAX)
                .saturating_add(offset),
            SeekFrom::End(offset) => capacity_i64.saturating_add(offset),
        };

        // The clamped value is non-negative and no larger than `capacity`.
        target.clamp(0, capacity_i64) as usize
    }
}
