//! Op-class instruction mixes.
//!
//! Ops are grouped into classes, and the percentages are given
//! per class. Every generated instruction is a uniformly random
//! member of its class.

use crate::mix::{ alloc_rows, percent_of, MixError, MixRow };
use compact_str::CompactString;
use itertools::Itertools;
use rand::Rng;
use rand::seq::SliceRandom;
use std::fmt;
use std::str::FromStr;

/// Default number of generated instructions.
pub const DEFAULT_INST_COUNT: u64 = 10000;

/// A class of ops sharing one percentage of the mix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpClass {
    pub name: CompactString,
    pub percent: u32,
    pub ops: Vec<CompactString>,
}

impl OpClass {
    pub fn new(name: &str, percent: u32, ops: &[&str]) -> OpClass {
        OpClass {
            name: name.into(),
            percent,
            ops: ops.iter().map(|&o| o.into()).collect()
        }
    }

    /// Number of instructions of this class, out of `total`.
    #[inline]
    pub fn count(&self, total: u64) -> u64 {
        percent_of(self.percent, total)
    }

    /// The built-in op classes.
    pub fn defaults() -> Vec<OpClass> {
        vec![
            OpClass::new("far-mem", 26, &["dram", "dram-bulk"]),
            OpClass::new("mid-mem", 12, &["bsm-bulk", "bsm"]),
            OpClass::new("close-mem", 12, &[
                "spad-bulk", "spad", "lmem-write", "lmem-read"]),
            OpClass::new("cache", 12, &[
                "l4cache-data-bulk", "l4cache-data",
                "l3cache-data-bulk", "l3cache-data",
                "l2cache-data-bulk", "l2cache-data",
                "l1cache-data-bulk", "l1cache-data"]),
            OpClass::new("adv-fp", 10, &[
                "sincos_fp", "div_fp", "sqrt_fp", "fma_fp", "arith-adv_fp"]),
            OpClass::new("simple-fp", 16, &["arith-simple_fp"]),
            OpClass::new("adv-int", 6, &["div_int", "fma_int", "arith-adv_int"]),
            OpClass::new("simple-int", 6, &["arith-simple_int", "bitops"]),
            OpClass::new("accel", 0, &[
                "rmem", "rmem_sp", "lmem", "lmem_sp", "cache", "cache_sp"]),
        ]
    }

    /// Check a set of classes: percentages must add up to 100,
    /// and every class with a share needs at least one op.
    pub fn validate(classes: &[OpClass]) -> Result<(), MixError> {
        if classes.is_empty() {
            return Err(MixError::Empty)
        }
        if let Some(c) = classes.iter().find(|c| c.percent > 0 && c.ops.is_empty()) {
            return Err(MixError::Malformed(c.to_string()))
        }
        let sum: u32 = classes.iter().map(|c| c.percent).sum();
        if sum != 100 {
            return Err(MixError::BadSum(sum))
        }
        Ok(())
    }

    /// Generate a shuffled list of `<op>\tstub` rows.
    pub fn generate<R: Rng + ?Sized>(
        classes: &[OpClass], total: u64, rng: &mut R
    ) -> Result<Vec<MixRow>, MixError> {
        OpClass::validate(classes)?;
        let realized = classes.iter().map(|c| c.count(total)).sum();
        let mut rows = alloc_rows(realized)?;
        for c in classes {
            for _ in 0..c.count(total) {
                // count > 0 implies validate() saw a non-empty op list
                if let Some(op) = c.ops.choose(rng) {
                    rows.push(MixRow::stub(op));
                }
            }
        }
        rows.shuffle(rng);
        Ok(rows)
    }
}

impl FromStr for OpClass {
    type Err = MixError;

    /// Parse `<name>=<percent>:<op>,<op>,...`.
    fn from_str(s: &str) -> Result<OpClass, MixError> {
        let malformed = || MixError::Malformed(s.to_string());
        let (name, rest) = s.split_once('=').ok_or_else(malformed)?;
        let (percent, ops) = rest.split_once(':').ok_or_else(malformed)?;
        if name.is_empty() {
            return Err(malformed())
        }
        let percent: u32 = percent.parse().map_err(|_| malformed())?;
        let ops = ops.split(',')
            .filter(|o| !o.is_empty())
            .map(CompactString::from)
            .collect();
        Ok(OpClass { name: name.into(), percent, ops })
    }
}

impl fmt::Display for OpClass {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}:{}", self.name, self.percent, self.ops.iter().format(","))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn defaults_are_valid() {
        let classes = OpClass::defaults();
        OpClass::validate(&classes).unwrap();
        let mut rng = StdRng::seed_from_u64(3);
        let rows = OpClass::generate(&classes, DEFAULT_INST_COUNT, &mut rng).unwrap();
        assert_eq!(rows.len(), 10000);
        let far = rows.iter()
            .filter(|r| r.0 == "dram" || r.0 == "dram-bulk")
            .count();
        assert_eq!(far, 2600);
        assert!(rows.iter().all(|r| r.1 == "stub"));
        assert!(!rows.iter().any(|r| r.0 == "rmem"));
    }

    #[test]
    fn parse_and_display() {
        let c: OpClass = "fp=40:add_fp,mul_fp".parse().unwrap();
        assert_eq!(c, OpClass::new("fp", 40, &["add_fp", "mul_fp"]));
        assert_eq!(c.to_string(), "fp=40:add_fp,mul_fp");
        assert!("fp:40".parse::<OpClass>().is_err());
        assert!("=40:a".parse::<OpClass>().is_err());
        assert!("fp=x:a".parse::<OpClass>().is_err());
    }

    #[test]
    fn empty_class_with_share() {
        let classes = vec![
            OpClass::new("a", 50, &["x"]),
            "b=50:".parse().unwrap(),
        ];
        assert!(matches!(OpClass::validate(&classes), Err(MixError::Malformed(_))));
    }

    #[test]
    fn huge_count_fails_cleanly() {
        let classes = vec![OpClass::new("a", 40, &["x"]), OpClass::new("b", 60, &["y"])];
        assert_eq!(classes[1].count(u64::MAX), u64::MAX / 100 * 60 + u64::MAX % 100 * 60 / 100);
        let mut rng = StdRng::seed_from_u64(0);
        assert!(matches!(OpClass::generate(&classes, u64::MAX / 2, &mut rng),
                         Err(MixError::TooManyRows(_))));
    }

    #[test]
    fn bad_sum() {
        let classes = vec![OpClass::new("a", 30, &["x"])];
        let mut rng = StdRng::seed_from_u64(0);
        assert!(matches!(OpClass::generate(&classes, 10, &mut rng),
                         Err(MixError::BadSum(30))));
    }
}
