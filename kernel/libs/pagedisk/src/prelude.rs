// SPDX-License-Identifier: MPL-2.0

pub(crate) use alloc::{sync::Arc, vec::Vec};

pub(crate) use log::{debug, info, trace, warn};
pub(crate) use spin::{Mutex, RwLock};

pub(crate) use crate::{
    PAGE_SIZE,
    error::{Errno, Error},
    io::{FallibleVmRead, FallibleVmWrite, VmReader, VmWriter},
};
pub(crate) type Result<T> = core::result::Result<T, Error>;
pub(crate) use crate::{return_errno, return_errno_with_message};
