//! Per-op energy reference tables.
//!
//! The table is tab-delimited. A header row starts with `OP`
//! and names one process size per following column; data rows
//! hold an op name and its energy under each process size.

use compact_str::CompactString;
use indexmap::IndexMap;
use std::fs::File;
use std::io::{ self, BufRead, BufReader };
use std::path::Path;

/// Default energy reference table file name.
pub const DEFAULT_ENERGY_MAP: &str =
    "instructionNewFormat_3_0_8_PerOpClassEnergyMap_TechScaled.txt";

#[derive(thiserror::Error, Debug)]
pub enum EnergyError {
    #[error("process size {0} not found")]
    ProcessSizeNotFound(CompactString),
    #[error("cannot read energy table: {0}")]
    Io(#[from] io::Error),
}

/// Op name to energy value, for one process size.
#[derive(Debug, Clone)]
pub struct EnergyTable {
    pub process_size: CompactString,
    pub values: IndexMap<CompactString, CompactString>,
}

impl EnergyTable {
    /// Read the column of `process_size` from a table file.
    pub fn open(
        path: impl AsRef<Path>, process_size: &str
    ) -> Result<EnergyTable, EnergyError> {
        let f = File::open(path)?;
        EnergyTable::from_reader(BufReader::new(f), process_size)
    }

    /// Read the column of `process_size` from any buffered reader.
    ///
    /// Rows before the first matching header are ignored, and
    /// every header row restarts the column search.
    pub fn from_reader(
        r: impl BufRead, process_size: &str
    ) -> Result<EnergyTable, EnergyError> {
        let mut col = None;
        let mut values = IndexMap::new();
        for line in r.lines() {
            let line = line?;
            let cells: Vec<&str> = line.split('\t').collect();
            if cells[0].trim_end() == "OP" {
                col = cells.iter().position(|&c| c == process_size);
                continue;
            }
            let Some(col) = col else { continue };
            if let Some(v) = cells.get(col) {
                values.insert(CompactString::from(cells[0]),
                              CompactString::from(*v));
            }
        }
        if values.is_empty() {
            return Err(EnergyError::ProcessSizeNotFound(process_size.into()))
        }
        clilog::debug!(ENERGY_LOAD, "loaded {} ops for process size {}",
                       values.len(), process_size);
        Ok(EnergyTable { process_size: process_size.into(), values })
    }

    #[inline]
    pub fn get(&self, op: &str) -> Option<&CompactString> {
        self.values.get(op)
    }

    #[inline]
    pub fn contains(&self, op: &str) -> bool {
        self.values.contains_key(op)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TABLE: &str = "OP\tsmall\tlarge\nadd\t1.0\t2.0\nmul\t3.0\t4.5\n";

    #[test]
    fn selects_column() {
        let t = EnergyTable::from_reader(TABLE.as_bytes(), "large").unwrap();
        assert_eq!(t.len(), 2);
        assert_eq!(t.get("add").unwrap().as_str(), "2.0");
        assert_eq!(t.get("mul").unwrap().as_str(), "4.5");
        let t = EnergyTable::from_reader(TABLE.as_bytes(), "small").unwrap();
        assert_eq!(t.get("add").unwrap().as_str(), "1.0");
    }

    #[test]
    fn single_row() {
        let t = EnergyTable::from_reader(
            "OP\tsmall\tlarge\nadd\t1.0\t2.0\n".as_bytes(), "large").unwrap();
        assert_eq!(t.values.len(), 1);
        assert_eq!(t.values["add"], "2.0");
    }

    #[test]
    fn unknown_size() {
        let r = EnergyTable::from_reader(TABLE.as_bytes(), "huge");
        assert!(matches!(r, Err(EnergyError::ProcessSizeNotFound(s)) if s == "huge"));
    }

    #[test]
    fn header_only() {
        let r = EnergyTable::from_reader("OP\tsmall\n".as_bytes(), "small");
        assert!(matches!(r, Err(EnergyError::ProcessSizeNotFound(_))));
    }

    #[test]
    fn header_with_trailing_space_and_short_rows() {
        let text = "junk\t9\nOP  \t22nm\nadd\t0.7\nnop\n";
        let t = EnergyTable::from_reader(text.as_bytes(), "22nm").unwrap();
        assert_eq!(t.len(), 1);
        assert!(t.contains("add"));
        assert!(!t.contains("junk"));
        assert!(!t.contains("nop"));
    }

    #[test]
    fn missing_file() {
        let r = EnergyTable::open("/nonexistent/energy.txt", "small");
        assert!(matches!(r, Err(EnergyError::Io(_))));
    }
}
