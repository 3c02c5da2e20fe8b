//! Shared string table.

use crate::util::{AssetReader, AssetWriter, ReadSeek, Result};

/// Count-prefixed table of length-prefixed strings, shared by all class
/// records in a database.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StringTable {
    strings: Vec<String>,
}

impl StringTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn read<R: ReadSeek>(reader: &mut AssetReader<R>) -> Result<Self> {
        let count = reader.read_i32()?.max(0) as usize;
        let mut strings = Vec::with_capacity(count);
        for _ in 0..count {
            strings.push(reader.read_string()?);
        }
        Ok(Self { strings })
    }

    pub fn write<W: std::io::Write>(&self, writer: &mut AssetWriter<W>) -> Result<()> {
        writer.write_i32(self.strings.len() as i32)?;
        for s in &self.strings {
            writer.write_string(s)?;
        }
        Ok(())
    }

    /// String at `index`. Out-of-range indices are a miss, not an error.
    pub fn get(&self, index: u16) -> Option<&str> {
        self.strings.get(index as usize).map(String::as_str)
    }

    /// Index of `s`, appending it if not present yet.
    pub fn add(&mut self, s: &str) -> u16 {
        match self.strings.iter().position(|x| x == s) {
            Some(idx) => idx as u16,
            None => {
                self.strings.push(s.to_owned());
                (self.strings.len() - 1) as u16
            }
        }
    }

    pub fn len(&self) -> usize {
        self.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_add_dedups() {
        let mut table = StringTable::new();
        let a = table.add("GameObject");
        let b = table.add("Transform");
        let a2 = table.add("GameObject");
        assert_eq!(a, a2);
        assert_ne!(a, b);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_get_miss_is_none() {
        let mut table = StringTable::new();
        table.add("only");
        assert_eq!(table.get(0), Some("only"));
        assert_eq!(table.get(42), None);
    }

    #[test]
    fn test_round_trip() {
        let mut table = StringTable::new();
        table.add("m_Name");
        table.add("int");
        table.add("");

        let mut w = AssetWriter::new(Vec::new());
        table.write(&mut w).unwrap();
        let read =
            StringTable::read(&mut AssetReader::new(Cursor::new(w.into_inner()))).unwrap();
        assert_eq!(read, table);
    }
}
