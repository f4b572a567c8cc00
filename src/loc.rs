//! Hardware location encoded in log file names

use lazy_static::lazy_static;
use regex::Regex;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

lazy_static! {
    /* Capturing groups:
     * 1: board id
     * 2: chip id
     * 3: unit id
     * 4: block id
     * The separators are any single character.
     */
    static ref LOC_REGEX: Regex = Regex::new(
        r"brd(\d+).chp(\d+).unt(\d+).blk(\d+)"
    ).unwrap();
}

/// A board/chip/unit/block location.
#[derive(Hash, Copy, Clone, PartialEq, Eq)]
pub struct HwLoc {
    pub board: u32,
    pub chip: u32,
    pub unit: u32,
    pub block: u32,
}

impl HwLoc {
    /// Find the location in a file name or path.
    ///
    /// Returns `None` if nothing in it looks like
    /// `brd<n>.chp<n>.unt<n>.blk<n>`.
    pub fn from_path(path: impl AsRef<Path>) -> Option<HwLoc> {
        path.as_ref().to_str()?.parse().ok()
    }
}

impl FromStr for HwLoc {
    type Err = ();

    fn from_str(s: &str) -> Result<HwLoc, ()> {
        let caps = LOC_REGEX.captures(s).ok_or(())?;
        let id = |i: usize| caps[i].parse::<u32>().map_err(|_| ());
        Ok(HwLoc {
            board: id(1)?,
            chip: id(2)?,
            unit: id(3)?,
            block: id(4)?
        })
    }
}

impl fmt::Display for HwLoc {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "brd{}.chp{}.unt{}.blk{}",
               self.board, self.chip, self.unit, self.block)
    }
}

impl fmt::Debug for HwLoc {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self)
    }
}
