//! Double SHA-256, Ember's `hash256` primitive (spec.md §4.2).

use sha2::{Digest, Sha256};
use std::io;

/// An incremental double-SHA-256 hasher, usable as an `io::Write` sink so
/// callers can hash bytes as they're produced (e.g. while decoding a block
/// header) without a second buffering pass.
#[derive(Default)]
pub struct Writer(Sha256);

impl Writer {
    pub fn finish(self) -> [u8; 32] {
        let first = self.0.finalize();
        let second = Sha256::digest(first);
        second.into()
    }
}

impl io::Write for Writer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.update(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Hash `bytes` with double SHA-256 in one call.
pub fn hash(bytes: &[u8]) -> [u8; 32] {
    let first = Sha256::digest(bytes);
    let second = Sha256::digest(first);
    second.into()
}
