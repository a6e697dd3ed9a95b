// SPDX-License-Identifier: MPL-2.0

use core::sync::atomic::{AtomicUsize, Ordering};

use int_to_c_enum::TryFromInt;

use crate::prelude::*;

/// The access mode requested by an open call.
#[expect(non_camel_case_types)]
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromInt)]
pub enum AccessMode {
    /// read only
    O_RDONLY = 0,
    /// write only
    O_WRONLY = 1,
    /// read write
    O_RDWR = 2,
}

impl AccessMode {
    /// The bits of the open flags that hold the access mode.
    pub const O_ACCMODE: u32 = 0o3;

    /// Extracts the access mode from raw open flags.
    pub fn from_flags(flags: u32) -> Result<Self> {
        Ok(Self::try_from(flags & Self::O_ACCMODE)?)
    }

    /// Returns whether opening with this mode truncates the disk.
    ///
    /// Only write-only opens truncate; a read-write open keeps the contents.
    pub fn has_write_intent(&self) -> bool {
        *self == AccessMode::O_WRONLY
    }
}

/// Bounds the number of sessions that are open at the same time.
///
/// The cap can be changed at any time. Lowering it below the number of open
/// sessions does not affect them; it only turns away new ones until enough
/// sessions are closed.
pub(crate) struct AccessGate {
    nr_sessions: AtomicUsize,
    max_sessions: AtomicUsize,
}

impl AccessGate {
    pub(crate) fn new(max_sessions: usize) -> Self {
        Self {
            nr_sessions: AtomicUsize::new(0),
            max_sessions: AtomicUsize::new(max_sessions.max(1)),
        }
    }

    /// Admits a new session, returning the number of sessions including it.
    ///
    /// Fails with `EBUSY` if the cap is already reached.
    pub(crate) fn enter(&self) -> Result<usize> {
        self.nr_sessions
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |nr_sessions| {
                (nr_sessions < self.max_sessions.load(Ordering::Acquire))
                    .then_some(nr_sessions + 1)
            })
            .map(|prev| prev + 1)
            .map_err(|nr_sessions| {
                warn!(
                    "rejecting a session: {} of {} sessions are open",
                    nr_sessions,
                    self.max_sessions()
                );
                Error::with_message(Errno::EBUSY, "too many sessions are open")
            })
    }

    /// Removes a session, returning the number of sessions left.
    pub(crate) fn leave(&self) -> usize {
        let prev = self
            .nr_sessions
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |nr_sessions| {
                Some(nr_sessions.saturating_sub(1))
            })
            .unwrap_or_else(|nr_sessions| nr_sessions);
        prev.saturating_sub(1)
    }

    /// Replaces the session cap.
    ///
    /// Fails with `EINVAL` if `max_sessions` is less than one.
    pub(crate) fn set_max_sessions(&self, max_sessions: i32) -> Result<()> {
        if max_sessions < 1 {
            return_errno_with_message!(Errno::EINVAL, "the session cap must be at least one");
        }

        self.max_sessions
            .store(max_sessions as usize, Ordering::Release);
        Ok(())
    }

    pub(crate) fn nr_sessions(&self) -> usize {
        self.nr_sessions.load(Ordering::Acquire)
    }

    pub(crate) fn max_sessions(&self) -> usize {
        self.max_sessions.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn admission_is_capped() {
        let gate = AccessGate::new(2);
        assert_eq!(gate.enter().unwrap(), 1);
        assert_eq!(gate.enter().unwrap(), 2);
        assert_eq!(gate.enter().unwrap_err().error(), Errno::EBUSY);
        assert_eq!(gate.nr_sessions(), 2);

        assert_eq!(gate.leave(), 1);
        assert_eq!(gate.enter().unwrap(), 2);
    }

    #[test]
    fn invalid_cap_is_rejected() {
        let gate = AccessGate::new(4);
        assert_eq!(gate.set_max_sessions(0).unwrap_err().error(), Errno::EINVAL);
        assert_eq!(gate.set_max_sessions(-3).unwrap_err().error(), Errno::EINVAL);
        assert_eq!(gate.max_sessions(), 4);
    }

    #[test]
    fn lowering_the_cap_keeps_open_sessions() {
        let gate = AccessGate::new(3);
        gate.enter().unwrap();
        gate.enter().unwrap();
        gate.enter().unwrap();

        gate.set_max_sessions(1).unwrap();
        assert_eq!(gate.nr_sessions(), 3);
        assert!(gate.enter().is_err());

        gate.leave();
        gate.leave();
        assert!(gate.enter().is_err());
        gate.leave();
        assert_eq!(gate.enter().unwrap(), 1);
    }

    #[test]
    fn leave_never_underflows() {
        let gate = AccessGate::new(1);
        assert_eq!(gate.leave(), 0);
        assert_eq!(gate.nr_sessions(), 0);
    }

    #[test]
    fn access_mode_from_flags() {
        assert_eq!(AccessMode::from_flags(0).unwrap(), AccessMode::O_RDONLY);
        assert_eq!(AccessMode::from_flags(0o101).unwrap(), AccessMode::O_WRONLY);
        assert_eq!(AccessMode::from_flags(0o1002).unwrap(), AccessMode::O_RDWR);
        assert_eq!(AccessMode::from_flags(3).unwrap_err().error(), Errno::EINVAL);

        assert!(AccessMode::O_WRONLY.has_write_intent());
        assert!(!AccessMode::O_RDWR.has_write_intent());
        assert!(!AccessMode::O_RDONLY.has_write_intent());
    }
}
