use crate::codec::{CodecError, Decode, Encode};

/// An `Option` that is never part of a type's canonical encoding.
///
/// Several types (`block::Header`, `transaction::Transaction`) cache their
/// own hash after first computing it. The cache must never affect equality
/// or the wire encoding, so it round-trips through encode/decode as `None`
/// and is populated lazily instead.
#[derive(Clone, Copy, Eq, serde::Serialize, serde::Deserialize)]
pub struct Cached<T: Clone + Copy>(Option<T>);

impl<T: Clone + Copy> Cached<T> {
    pub fn new() -> Cached<T> {
        Cached(None)
    }
    pub fn from(val: T) -> Cached<T> {
        Cached(Some(val))
    }
    pub fn value(&self) -> Option<T> {
        self.0
    }
    pub fn set(&mut self, val: T) {
        self.0 = Some(val);
    }
}

impl<T: Clone + Copy> Default for Cached<T> {
    fn default() -> Self {
        Cached::new()
    }
}

/// Two items compare equal unless both have a populated cache with
/// differing values — this lets freshly constructed values (empty cache)
/// compare equal to their decoded counterparts (populated cache).
impl<T: PartialEq + Copy> PartialEq for Cached<T> {
    fn eq(&self, other: &Self) -> bool {
        match (self.0, other.0) {
            (Some(a), Some(b)) => a == b,
            _ => true,
        }
    }
}

impl<T: Clone + Copy + std::fmt::Debug> std::fmt::Debug for Cached<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl<T: Clone + Copy> Encode for Cached<T> {
    fn encode<W: std::io::Write>(&self, _target: W) -> Result<(), std::io::Error> {
        Ok(())
    }
}

impl<T: Clone + Copy> Decode for Cached<T> {
    fn decode<R: std::io::Read>(_target: R) -> Result<Self, CodecError> {
        Ok(Cached(None))
    }
}
