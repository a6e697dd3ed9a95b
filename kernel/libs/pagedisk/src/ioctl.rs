// SPDX-License-Identifier: MPL-2.0

//! The control commands of the disk.
//!
//! Commands follow the Linux `_IOC` encoding: bits 0..8 hold the command number,
//! bits 8..16 the command type, bits 16..30 the argument size and bits 30..32 the
//! transfer direction. Every command of the disk has type `'k'`.
//!
//! Reference: <https://elixir.bootlin.com/linux/v6.18/source/include/uapi/asm-generic/ioctl.h>

use bitflags::bitflags;

use crate::{device::PageDisk, io::read_i32, prelude::*};

const IOC_NRBITS: u32 = 8;
const IOC_TYPEBITS: u32 = 8;
const IOC_SIZEBITS: u32 = 14;

const IOC_NRSHIFT: u32 = 0;
const IOC_TYPESHIFT: u32 = IOC_NRSHIFT + IOC_NRBITS;
const IOC_SIZESHIFT: u32 = IOC_TYPESHIFT + IOC_TYPEBITS;
const IOC_DIRSHIFT: u32 = IOC_SIZESHIFT + IOC_SIZEBITS;

const IOC_NRMASK: u32 = (1 << IOC_NRBITS) - 1;
const IOC_TYPEMASK: u32 = (1 << IOC_TYPEBITS) - 1;
const IOC_SIZEMASK: u32 = (1 << IOC_SIZEBITS) - 1;

bitflags! {
    /// The direction of the data transfer of an ioctl command.
    pub struct IoctlDir: u32 {
        /// The caller passes data to the device.
        const WRITE = 1;
        /// The device passes data to the caller.
        const READ = 2;
    }
}

/// An encoded ioctl command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IoctlCmd(u32);

impl IoctlCmd {
    /// Encodes a command.
    pub const fn new(dir: IoctlDir, type_: u8, nr: u8, size: u16) -> Self {
        Self(
            (dir.bits() << IOC_DIRSHIFT)
                | ((size as u32 & IOC_SIZEMASK) << IOC_SIZESHIFT)
                | ((type_ as u32) << IOC_TYPESHIFT)
                | ((nr as u32) << IOC_NRSHIFT),
        )
    }

    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    pub const fn as_u32(&self) -> u32 {
        self.0
    }

    pub fn dir(&self) -> IoctlDir {
        IoctlDir::from_bits_truncate(self.0 >> IOC_DIRSHIFT)
    }

    pub const fn type_(&self) -> u8 {
        ((self.0 >> IOC_TYPESHIFT) & IOC_TYPEMASK) as u8
    }

    pub const fn nr(&self) -> u8 {
        ((self.0 >> IOC_NRSHIFT) & IOC_NRMASK) as u8
    }

    pub const fn size(&self) -> u16 {
        ((self.0 >> IOC_SIZESHIFT) & IOC_SIZEMASK) as u16
    }
}

/// The command type shared by all commands of the disk.
pub const PAGEDISK_IOC_TYPE: u8 = b'k';

/// The command number of [`SET_NPROC`].
pub const SET_NPROC_NR: u8 = 1;

/// Sets the session cap. The argument is an `i32` that must be at least one.
pub const SET_NPROC: IoctlCmd = IoctlCmd::new(
    IoctlDir::WRITE,
    PAGEDISK_IOC_TYPE,
    SET_NPROC_NR,
    size_of::<i32>() as u16,
);

/// Executes a raw control command against `disk`.
///
/// Only the command type and number are checked.
/// A foreign command type fails with `EINVAL`; an unknown number fails with `ENOTTY`.
pub(crate) fn dispatch<R: FallibleVmRead + ?Sized>(
    disk: &PageDisk,
    raw_cmd: u32,
    arg: &mut R,
) -> Result<i32> {
    let cmd = IoctlCmd::from_raw(raw_cmd);
    if cmd.type_() != PAGEDISK_IOC_TYPE {
        return_errno_with_message!(Errno::EINVAL, "the ioctl command type is unknown");
    }

    match cmd.nr() {
        SET_NPROC_NR => {
            let max_sessions = read_i32(arg)?;
            disk.set_max_sessions(max_sessions)?;
            Ok(0)
        }
        _ => return_errno_with_message!(Errno::ENOTTY, "the ioctl command is not supported"),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn set_nproc_encoding() {
        assert_eq!(SET_NPROC.as_u32(), 0x4004_6b01);
        assert_eq!(SET_NPROC.dir(), IoctlDir::WRITE);
        assert_eq!(SET_NPROC.type_(), b'k');
        assert_eq!(SET_NPROC.nr(), 1);
        assert_eq!(SET_NPROC.size(), 4);
    }

    #[test]
    fn decode_read_write_command() {
        let cmd = IoctlCmd::from_raw(0xc440_5401);
        assert_eq!(cmd.dir(), IoctlDir::READ | IoctlDir::WRITE);
        assert_eq!(cmd.type_(), b'T');
        assert_eq!(cmd.nr(), 1);
        assert_eq!(cmd.size(), 0x440);
    }
}
