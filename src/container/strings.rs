//! String pool shared by every record of a container.
//!
//! Index 0 is reserved for an absent or empty string and is never written.
//! Stored strings get 1-based indices in first-seen order.

use std::collections::HashMap;
use std::io::Write;

use super::stream::OStream;
use crate::util::{Error, Result};

#[derive(Debug, Default)]
pub struct StringPool {
    strings: Vec<String>,
    index: HashMap<String, u32>,
    finalized: bool,
}

impl StringPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a string. Repeated adds and absent values are no-ops.
    pub fn add(&mut self, s: Option<&str>) {
        debug_assert!(!self.finalized, "string added after finalize");
        let Some(s) = s.filter(|s| !s.is_empty()) else {
            return;
        };
        if self.index.contains_key(s) {
            return;
        }
        self.strings.push(s.to_string());
        self.index.insert(s.to_string(), self.strings.len() as u32);
    }

    /// Freeze the assignment order. Lookups are only valid afterwards.
    pub fn finalize(&mut self) {
        self.finalized = true;
    }

    /// Index of `s`, 0 for absent or empty.
    pub fn lookup(&self, s: Option<&str>) -> Result<u32> {
        if !self.finalized {
            return Err(Error::PoolNotFinalized);
        }
        match s {
            None | Some("") => Ok(0),
            Some(s) => self
                .index
                .get(s)
                .copied()
                .ok_or_else(|| Error::StringNotInterned(s.to_string())),
        }
    }

    /// Number of stored strings, not counting the reserved slot.
    pub fn len(&self) -> usize {
        self.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }

    /// Stored strings in index order, starting at index 1.
    pub fn strings(&self) -> &[String] {
        &self.strings
    }

    /// Write the pool section: VL count then each VL-length string.
    pub fn write<W: Write>(&self, s: &mut OStream<W>) -> Result<()> {
        s.write_len_vl(self.strings.len())?;
        for value in &self.strings {
            s.write_string_vl(value)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::stream::IStream;

    #[test]
    fn test_dedup_and_order() -> Result<()> {
        let mut pool = StringPool::new();
        for _ in 0..5 {
            pool.add(Some("walk"));
        }
        pool.add(Some("run"));
        pool.add(Some("walk"));
        pool.add(Some("idle"));
        pool.add(None);
        pool.add(Some(""));
        pool.finalize();

        assert_eq!(pool.len(), 3);
        assert_eq!(pool.lookup(Some("walk"))?, 1);
        assert_eq!(pool.lookup(Some("run"))?, 2);
        assert_eq!(pool.lookup(Some("idle"))?, 3);
        assert_eq!(pool.lookup(None)?, 0);
        assert_eq!(pool.lookup(Some(""))?, 0);
        Ok(())
    }

    #[test]
    fn test_unregistered_lookup_fails() {
        let mut pool = StringPool::new();
        pool.add(Some("a"));
        pool.finalize();
        assert!(matches!(
            pool.lookup(Some("b")),
            Err(Error::StringNotInterned(s)) if s == "b"
        ));
    }

    #[test]
    fn test_lookup_before_finalize_fails() {
        let mut pool = StringPool::new();
        pool.add(Some("a"));
        assert!(matches!(pool.lookup(Some("a")), Err(Error::PoolNotFinalized)));
    }

    #[test]
    fn test_section_layout() -> Result<()> {
        let mut pool = StringPool::new();
        pool.add(Some("ab"));
        pool.add(Some("c"));
        pool.finalize();

        let mut s = OStream::new(Vec::new());
        pool.write(&mut s)?;
        let buf = s.into_inner();
        assert_eq!(buf, [2, 2, b'a', b'b', 1, b'c']);

        let mut r = IStream::new(&buf);
        assert_eq!(r.read_len_vl()?, 2);
        assert_eq!(r.read_string_vl()?, "ab");
        assert_eq!(r.read_string_vl()?, "c");
        Ok(())
    }
}
