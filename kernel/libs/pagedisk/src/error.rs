// SPDX-License-Identifier: MPL-2.0

use core::fmt;

/// Error number.
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Errno {
    EAGAIN = 11, /* Try again */
    ENOMEM = 12, /* Out of memory */
    EFAULT = 14, /* Bad address */
    EBUSY = 16,  /* Device or resource busy */
    EINVAL = 22, /* Invalid argument */
    ENOTTY = 25, /* Not a typewriter */
}

/// error used in this crate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Error {
    errno: Errno,
    msg: Option<&'static str>,
}

impl Error {
    pub const fn new(errno: Errno) -> Self {
        Error { errno, msg: None }
    }

    pub const fn with_message(errno: Errno, msg: &'static str) -> Self {
        Error {
            errno,
            msg: Some(msg),
        }
    }

    pub const fn error(&self) -> Errno {
        self.errno
    }

    pub const fn message(&self) -> Option<&'static str> {
        self.msg
    }
}

impl From<int_to_c_enum::TryFromIntError> for Error {
    fn from(_: int_to_c_enum::TryFromIntError) -> Self {
        Error::with_message(Errno::EINVAL, "Invalid enum value")
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.msg {
            Some(msg) => write!(f, "{:?}: {}", self.errno, msg),
            None => write!(f, "{:?}", self.errno),
        }
    }
}

#[macro_export]
macro_rules! return_errno {
    ($errno: expr) => {
        return Err($crate::error::Error::new($errno))
    };
}

#[macro_export]
macro_rules! return_errno_with_message {
    ($errno: expr, $message: expr) => {
        return Err($crate::error::Error::with_message($errno, $message))
    };
}

#[cfg(test)]
mod test {
    use alloc::string::ToString;

    use super::*;

    #[test]
    fn display_with_and_without_message() {
        assert_eq!(Error::new(Errno::EBUSY).to_string(), "EBUSY");
        assert_eq!(
            Error::with_message(Errno::EINVAL, "bad whence").to_string(),
            "EINVAL: bad whence"
        );
        assert_eq!(
            Error::with_message(Errno::EINVAL, "bad whence").message(),
            Some("bad whence")
        );
        assert_eq!(Error::new(Errno::EBUSY).message(), None);
    }

    #[test]
    fn errno_keeps_linux_numbering() {
        assert_eq!(Errno::ENOMEM as i32, 12);
        assert_eq!(Errno::EFAULT as i32, 14);
        assert_eq!(Errno::ENOTTY as i32, 25);
    }
}
