//! Weighted category mixes.
//!
//! A mix is a list of `<label>:<percent>` entries summing to 100.
//! Each entry expands into `percent * total / 100` identical rows,
//! and the whole list is shuffled before being written out as
//! a tab-delimited file.

use compact_str::CompactString;
use indexmap::IndexMap;
use rand::Rng;
use rand::seq::SliceRandom;
use std::fmt;
use std::fs::{ self, File };
use std::io::{ self, BufWriter, Write };
use std::path::Path;
use std::str::FromStr;

/// Errors raised while building or checking a mix.
#[derive(thiserror::Error, Debug)]
pub enum MixError {
    #[error("no categories given, expected <label>:<percent> ...")]
    Empty,
    #[error("malformed category `{0}`, expected <label>:<percent>")]
    Malformed(String),
    #[error("category `{0}` is given more than once")]
    Duplicate(CompactString),
    #[error("percentages must sum to 100 (got {0})")]
    BadSum(u32),
    #[error("cannot hold {0} rows in memory")]
    TooManyRows(u64),
    #[error("category `{label}` not found in {within}")]
    NotFound {
        label: CompactString,
        within: String
    },
}

/// One category of a mix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MixEntry {
    pub label: CompactString,
    pub percent: u32,
}

impl MixEntry {
    /// Number of rows this entry expands to, out of `total`.
    ///
    /// Integer division, so remainders are dropped.
    #[inline]
    pub fn count(&self, total: u64) -> u64 {
        percent_of(self.percent, total)
    }
}

impl FromStr for MixEntry {
    type Err = MixError;

    fn from_str(s: &str) -> Result<MixEntry, MixError> {
        let malformed = || MixError::Malformed(s.to_string());
        let (label, percent) = s.split_once(':').ok_or_else(malformed)?;
        if label.is_empty() {
            return Err(malformed())
        }
        let percent: u32 = percent.trim().parse()
            .map_err(|_| malformed())?;
        if percent > 100 {
            return Err(malformed())
        }
        Ok(MixEntry { label: label.into(), percent })
    }
}

impl fmt::Display for MixEntry {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.label, self.percent)
    }
}

/// `floor(percent * total / 100)`, never above `total`
/// for `percent <= 100`.
#[inline]
pub(crate) fn percent_of(percent: u32, total: u64) -> u64 {
    (percent as u128 * total as u128 / 100) as u64
}

/// Allocate room for `n` rows, failing instead of aborting
/// when that much memory cannot be had.
pub(crate) fn alloc_rows(n: u64) -> Result<Vec<MixRow>, MixError> {
    let mut rows = Vec::new();
    let len = usize::try_from(n).map_err(|_| MixError::TooManyRows(n))?;
    rows.try_reserve_exact(len).map_err(|_| MixError::TooManyRows(n))?;
    Ok(rows)
}

/// A generated row with two tab-separated fields.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MixRow(pub CompactString, pub CompactString);

impl MixRow {
    /// A row of `label` and the stub placeholder.
    #[inline]
    pub fn stub(label: &str) -> MixRow {
        MixRow(label.into(), crate::STUB.into())
    }
}

impl fmt::Display for MixRow {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\t{}", self.0, self.1)
    }
}

/// A validated weighted mix.
///
/// Entries keep the order they were given in.
#[derive(Debug, Clone)]
pub struct WeightedMix {
    entries: IndexMap<CompactString, MixEntry>,
}

impl WeightedMix {
    /// Build a mix from entries, checking that the list is not
    /// empty, labels are unique, and percentages add up to 100.
    pub fn new(
        entries: impl IntoIterator<Item = MixEntry>
    ) -> Result<WeightedMix, MixError> {
        let mut map = IndexMap::new();
        for e in entries {
            if map.contains_key(&e.label) {
                return Err(MixError::Duplicate(e.label))
            }
            map.insert(e.label.clone(), e);
        }
        if map.is_empty() {
            return Err(MixError::Empty)
        }
        let sum: u32 = map.values().map(|e| e.percent).sum();
        if sum != 100 {
            return Err(MixError::BadSum(sum))
        }
        Ok(WeightedMix { entries: map })
    }

    /// Parse a mix from `<label>:<percent>` arguments.
    pub fn parse_args<S: AsRef<str>>(
        args: impl IntoIterator<Item = S>
    ) -> Result<WeightedMix, MixError> {
        let entries = args.into_iter()
            .map(|a| a.as_ref().parse::<MixEntry>())
            .collect::<Result<Vec<_>, _>>()?;
        WeightedMix::new(entries)
    }

    #[inline]
    pub fn entries(&self) -> impl Iterator<Item = &MixEntry> {
        self.entries.values()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of rows the whole mix expands to, out of `total`.
    pub fn realized_total(&self, total: u64) -> u64 {
        self.entries().map(|e| e.count(total)).sum()
    }

    /// Check that every label is present in a reference source.
    ///
    /// `within` names the source in the error message.
    pub fn require(
        &self, within: &str, mut has: impl FnMut(&str) -> bool
    ) -> Result<(), MixError> {
        for e in self.entries() {
            if !has(&e.label) {
                return Err(MixError::NotFound {
                    label: e.label.clone(),
                    within: within.to_string()
                })
            }
        }
        Ok(())
    }

    /// Log the per-category breakdown for `total` rows.
    pub fn log_breakdown(&self, total: u64) {
        for e in self.entries() {
            clilog::info!(MIX_BREAKDOWN, "\t {}: {} ({}%)",
                          e.label, e.count(total), e.percent);
        }
    }

    /// Expand every entry into its count of identical rows,
    /// in entry order (unshuffled).
    ///
    /// `row` produces the row for one entry. It is called once
    /// per entry, even when the entry expands to zero rows.
    pub fn expand<E: From<MixError>>(
        &self, total: u64,
        mut row: impl FnMut(&MixEntry) -> Result<MixRow, E>
    ) -> Result<Vec<MixRow>, E> {
        let mut rows = alloc_rows(self.realized_total(total))?;
        for e in self.entries() {
            let r = row(e)?;
            let n = e.count(total) as usize;
            rows.extend(std::iter::repeat(r).take(n));
        }
        Ok(rows)
    }

    /// Expand and shuffle in one go.
    pub fn generate<E: From<MixError>, R: Rng + ?Sized>(
        &self, total: u64, rng: &mut R,
        row: impl FnMut(&MixEntry) -> Result<MixRow, E>
    ) -> Result<Vec<MixRow>, E> {
        let mut rows = self.expand(total, row)?;
        rows.shuffle(rng);
        Ok(rows)
    }
}

/// Write rows as tab-delimited records, one per line.
///
/// The parent directory is created if missing.
pub fn write_rows(path: impl AsRef<Path>, rows: &[MixRow]) -> io::Result<()> {
    let path = path.as_ref();
    if let Some(dir) = path.parent() {
        if !dir.as_os_str().is_empty() {
            fs::create_dir_all(dir)?;
        }
    }
    let mut w = BufWriter::new(File::create(path)?);
    write_rows_to(&mut w, rows)?;
    w.flush()
}

/// Write rows as tab-delimited records to any writer.
pub fn write_rows_to(w: &mut impl Write, rows: &[MixRow]) -> io::Result<()> {
    for r in rows {
        writeln!(w, "{}", r)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use itertools::Itertools;

    fn mix(args: &[&str]) -> WeightedMix {
        WeightedMix::parse_args(args).unwrap()
    }

    #[test]
    fn parse_entry() {
        let e: MixEntry = "add:30".parse().unwrap();
        assert_eq!(e.label, "add");
        assert_eq!(e.percent, 30);
        assert_eq!(e.to_string(), "add:30");
    }

    #[test]
    fn parse_entry_malformed() {
        for s in ["add", ":30", "add:", "add:x", "add:-3", "add:101"] {
            assert!(matches!(s.parse::<MixEntry>(),
                             Err(MixError::Malformed(_))), "{}", s);
        }
    }

    #[test]
    fn rejects_bad_sum() {
        let r = WeightedMix::parse_args(["a:50", "b:40"]);
        assert!(matches!(r, Err(MixError::BadSum(90))));
        let r = WeightedMix::parse_args(["a:60", "b:60"]);
        assert!(matches!(r, Err(MixError::BadSum(120))));
    }

    #[test]
    fn rejects_empty_and_duplicate() {
        let r = WeightedMix::parse_args(Vec::<&str>::new());
        assert!(matches!(r, Err(MixError::Empty)));
        let r = WeightedMix::parse_args(["a:50", "a:50"]);
        assert!(matches!(r, Err(MixError::Duplicate(l)) if l == "a"));
    }

    #[test]
    fn even_split() {
        let m = mix(&["a:50", "b:50"]);
        let mut rng = StdRng::seed_from_u64(7);
        let rows = m.generate(10, &mut rng, |e| {
            Ok::<_, MixError>(MixRow::stub(&e.label))
        }).unwrap();
        assert_eq!(rows.len(), 10);
        let counts = rows.iter().map(|r| r.0.as_str()).counts();
        assert_eq!(counts["a"], 5);
        assert_eq!(counts["b"], 5);
        assert!(rows.iter().all(|r| r.1 == "stub"));
    }

    #[test]
    fn remainders_dropped() {
        let m = mix(&["a:33", "b:33", "c:34"]);
        assert_eq!(m.realized_total(10), 3 + 3 + 3);
        let rows = m.expand(10, |e| {
            Ok::<_, MixError>(MixRow::stub(&e.label))
        }).unwrap();
        assert_eq!(rows.len(), 9);
        let labels = ["a", "b", "c"];
        assert!(rows.iter().all(|r| labels.contains(&r.0.as_str())));
    }

    #[test]
    fn multiset_independent_of_seed() {
        let m = mix(&["x:10", "y:25", "z:65"]);
        let gen = |seed| {
            let mut rng = StdRng::seed_from_u64(seed);
            let mut rows = m.generate(997, &mut rng, |e| {
                Ok::<_, MixError>(MixRow::stub(&e.label))
            }).unwrap();
            rows.sort();
            rows
        };
        let a = gen(1);
        assert_eq!(a, gen(2));
        assert_eq!(a, gen(12345));
        assert_eq!(a.len() as u64, m.realized_total(997));
    }

    #[test]
    fn require_reports_missing() {
        let m = mix(&["a:50", "b:50"]);
        assert!(m.require("test", |l| l == "a" || l == "b").is_ok());
        match m.require("table", |l| l == "a") {
            Err(MixError::NotFound { label, within }) => {
                assert_eq!(label, "b");
                assert_eq!(within, "table");
            }
            r => panic!("unexpected {:?}", r)
        }
    }

    #[test]
    fn row_errors_propagate() {
        let m = mix(&["a:100"]);
        let r = m.expand(10, |e| Err(MixError::Malformed(e.to_string())));
        assert!(matches!(r, Err(MixError::Malformed(s)) if s == "a:100"));
    }

    #[test]
    fn huge_totals() {
        let m = mix(&["a:50", "b:50"]);
        let total = u64::MAX / 10;
        assert_eq!(m.realized_total(total), total / 2 * 2);
        let all = mix(&["a:100"]);
        assert_eq!(all.realized_total(u64::MAX), u64::MAX);
        let r = m.expand(total, |e| Ok::<_, MixError>(MixRow::stub(&e.label)));
        assert!(matches!(r, Err(MixError::TooManyRows(n)) if n == total / 2 * 2));
    }

    #[test]
    fn write_creates_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("input").join("t.task");
        let rows = vec![MixRow::stub("a"), MixRow("1.0".into(), "0.5".into())];
        write_rows(&path, &rows).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text, "a\tstub\n1.0\t0.5\n");
    }
}
