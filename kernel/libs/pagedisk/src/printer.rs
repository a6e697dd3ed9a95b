// SPDX-License-Identifier: MPL-2.0

use core::fmt::{Arguments, Write};

use crate::prelude::*;

/// A printer that formats text into a caller buffer, starting at an offset.
///
/// Textual files such as the diagnostics report are read piecewise at growing
/// offsets. The printer regenerates the whole text on every read and drops the
/// first `bytes_to_skip` bytes, so each read sees the slice of the text that
/// starts at its offset.
pub(crate) struct VmPrinter<'a, W: FallibleVmWrite + ?Sized> {
    writer: &'a mut W,
    bytes_to_skip: usize,
    bytes_written: usize,
}

impl<'a, W: FallibleVmWrite + ?Sized> VmPrinter<'a, W> {
    /// Creates a printer that skips the first `bytes_to_skip` bytes of the output.
    pub(crate) fn new_skip(writer: &'a mut W, bytes_to_skip: usize) -> Self {
        Self {
            writer,
            bytes_to_skip,
            bytes_written: 0,
        }
    }

    /// Returns the total number of bytes written to the underlying writer.
    pub(crate) fn bytes_written(&self) -> usize {
        self.bytes_written
    }

    /// Writes formatted content to the underlying writer.
    ///
    /// Output that does not fit into the writer is dropped silently. A fault
    /// of the writer fails with `EFAULT`.
    pub(crate) fn write_fmt(&mut self, args: Arguments<'_>) -> Result<()> {
        Write::write_fmt(self, args)
            .map_err(|_| Error::with_message(Errno::EFAULT, "failed to print to the buffer"))
    }

    fn write_bytes(&mut self, bytes: &[u8]) -> core::fmt::Result {
        if self.bytes_to_skip >= bytes.len() {
            self.bytes_to_skip -= bytes.len();
            return Ok(());
        }

        let bytes_to_write = &bytes[self.bytes_to_skip..];
        self.bytes_to_skip = 0;

        let mut reader = VmReader::from(bytes_to_write);
        let written_len = self
            .writer
            .write_fallible(&mut reader)
            .map_err(|_| core::fmt::Error)?;

        self.bytes_written += written_len;

        Ok(())
    }
}

impl<W: FallibleVmWrite + ?Sized> Write for VmPrinter<'_, W> {
    fn write_str(&mut self, s: &str) -> core::fmt::Result {
        self.write_bytes(s.as_bytes())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn basic_write() {
        let mut buf = [0u8; 64];
        let mut writer = VmWriter::from(&mut buf[..]);
        let mut printer = VmPrinter::new_skip(&mut writer, 0);

        let res = writeln!(printer, "test");
        assert!(res.is_ok());

        assert_eq!(printer.bytes_written(), 5);
        assert_eq!(&buf[..5], b"test\n");
    }

    #[test]
    fn write_with_skip() {
        let mut buf = [0u8; 3];
        let mut writer = VmWriter::from(&mut buf[..]);
        let mut printer = VmPrinter::new_skip(&mut writer, 3);

        let res = writeln!(printer, "val: {}", 123);
        assert!(res.is_ok());

        assert_eq!(printer.bytes_written(), 3);
        assert_eq!(&buf, b": 1");
    }

    #[test]
    fn skip_all_content() {
        let mut buf = [0u8; 64];
        let mut writer = VmWriter::from(&mut buf[..]);
        let mut printer = VmPrinter::new_skip(&mut writer, 100);

        let res = writeln!(printer, "short message");
        assert!(res.is_ok());

        // Nothing should be written
        assert_eq!(printer.bytes_written(), 0);
        assert_eq!(buf[0], 0);
    }
}
