// SPDX-License-Identifier: MPL-2.0

//! The configuration of a disk.
//!
//! A configuration is either built in code or parsed from a kernel command line.
//! On the command line, the options of the disk are given as `pagedisk.OPTION=VALUE`
//! entries separated by whitespace, for example:
//!
//! ```text
//! console=ttyS0 pagedisk.max_sessions=4 pagedisk.name="scratch disk"
//! ```
//!
//! Entries of other modules are ignored.

use alloc::string::{String, ToString};

use crate::prelude::*;

/// The module name that prefixes the options of the disk on the command line.
const MODULE_NAME: &str = "pagedisk";

/// The configuration of a [`PageDisk`](crate::PageDisk).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageDiskConfig {
    name: String,
    major: u32,
    minor: u32,
    max_sessions: usize,
}

impl Default for PageDiskConfig {
    fn default() -> Self {
        Self {
            name: MODULE_NAME.to_string(),
            major: 0,
            minor: 0,
            max_sessions: 1,
        }
    }
}

impl PageDiskConfig {
    pub fn with_name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    pub fn with_major(mut self, major: u32) -> Self {
        self.major = major;
        self
    }

    pub fn with_minor(mut self, minor: u32) -> Self {
        self.minor = minor;
        self
    }

    /// Sets the initial session cap.
    ///
    /// A cap of zero is raised to one.
    pub fn with_max_sessions(mut self, max_sessions: usize) -> Self {
        self.max_sessions = max_sessions.max(1);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn major(&self) -> u32 {
        self.major
    }

    pub fn minor(&self) -> u32 {
        self.minor
    }

    pub fn max_sessions(&self) -> usize {
        self.max_sessions
    }

    /// Parses the options of the disk out of a kernel command line.
    ///
    /// Options that are not given keep their default values. Malformed entries,
    /// unknown options and invalid values are skipped with a warning.
    pub fn from_cmdline(cmdline: &str) -> Self {
        let mut config = Self::default();

        for arg in split_arg(cmdline) {
            let Some((module, option)) = arg.split_once('.') else {
                continue;
            };
            if module != MODULE_NAME {
                continue;
            }

            let Some((key, value)) = option.split_once('=') else {
                warn!("the argument '{}' of {} has no value", arg, MODULE_NAME);
                continue;
            };
            if let Err(err) = config.apply(key, unquote(value)) {
                warn!("skipping the argument '{}': {}", arg, err);
            }
        }

        config
    }

    fn apply(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "name" => {
                if value.is_empty() {
                    return_errno_with_message!(Errno::EINVAL, "the name is empty");
                }
                self.name = value.to_string();
            }
            "major" => self.major = parse_number(value)?,
            "minor" => self.minor = parse_number(value)?,
            "max_sessions" => {
                let max_sessions: usize = parse_number(value)?;
                if max_sessions == 0 {
                    return_errno_with_message!(Errno::EINVAL, "the session cap must be at least one");
                }
                self.max_sessions = max_sessions;
            }
            _ => return_errno!(Errno::EINVAL),
        }

        Ok(())
    }
}

fn parse_number<T: core::str::FromStr>(value: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| Error::with_message(Errno::EINVAL, "the value is not a number"))
}

/// Splits the command line by whitespace, leaving quoted spans intact.
fn split_arg(input: &str) -> impl Iterator<Item = &str> {
    let mut inside_quotes = false;

    input
        .split(move |c: char| {
            if c == '"' {
                inside_quotes = !inside_quotes;
            }

            !inside_quotes && c.is_whitespace()
        })
        .filter(|arg| !arg.is_empty())
}

fn unquote(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|value| value.strip_suffix('"'))
        .unwrap_or(value)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn defaults() {
        let config = PageDiskConfig::default();
        assert_eq!(config.name(), "pagedisk");
        assert_eq!(config.major(), 0);
        assert_eq!(config.minor(), 0);
        assert_eq!(config.max_sessions(), 1);
    }

    #[test]
    fn builder() {
        let config = PageDiskConfig::default()
            .with_name("ram0")
            .with_major(240)
            .with_minor(3)
            .with_max_sessions(0);
        assert_eq!(config.name(), "ram0");
        assert_eq!(config.major(), 240);
        assert_eq!(config.minor(), 3);
        assert_eq!(config.max_sessions(), 1);
    }

    #[test]
    fn parse_cmdline() {
        let config = PageDiskConfig::from_cmdline(
            "console=ttyS0  pagedisk.max_sessions=4 pagedisk.major=240 \
             init.debug=1 pagedisk.name=\"scratch disk\" -- /bin/sh",
        );
        assert_eq!(config.max_sessions(), 4);
        assert_eq!(config.major(), 240);
        assert_eq!(config.minor(), 0);
        assert_eq!(config.name(), "scratch disk");
    }

    #[test]
    fn bad_entries_are_skipped() {
        let config = PageDiskConfig::from_cmdline(
            "pagedisk.max_sessions=0 pagedisk.minor=abc pagedisk.color=blue \
             pagedisk.major pagedisk.name= pagedisk.minor=7",
        );
        assert_eq!(config.max_sessions(), 1);
        assert_eq!(config.major(), 0);
        assert_eq!(config.minor(), 7);
        assert_eq!(config.name(), "pagedisk");
    }

    #[test]
    fn empty_cmdline() {
        assert_eq!(PageDiskConfig::from_cmdline(""), PageDiskConfig::default());
    }
}
