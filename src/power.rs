//! Power trace aggregation.
//!
//! Each log file belongs to one hardware location, encoded in
//! its file name. Lines of the form
//! `[RMD_TRACE_POWER] Power <value> <cycle>` set the power of
//! that location's grid cell at the given cycle. The aggregated
//! trace reports the total power of every cycle.

use crate::loc::HwLoc;
use indexmap::IndexMap;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{ Serialize, Deserialize };
use std::fs::File;
use std::io::{ self, BufRead, BufReader, BufWriter, Write };
use std::path::Path;

/// Simulated clock speed, in cycles per millisecond.
pub const CLOCK_SPEED: f64 = 4200.0 * 1e3;

lazy_static! {
    static ref POWER_TAG: Regex = Regex::new(
        r"\[RMD_TRACE_POWER\] Power "
    ).unwrap();
    /* Capturing groups:
     * 1: the layout description, e.g. `block layout 4 by 4`
     */
    static ref DIMS_TAG: Regex = Regex::new(
        r"\[RMD_TRACE_POWER\] Simulated (.*)"
    ).unwrap();
    static ref NUMBER: Regex = Regex::new(r"\d+\.*\d*").unwrap();
}

#[derive(thiserror::Error, Debug)]
pub enum PowerError {
    #[error("invalid block dimensions of {0} by {1} specified")]
    InvalidBlockDims(usize, usize),
    #[error("invalid unit dimensions of {0} by {1} specified")]
    InvalidUnitDims(usize, usize),
    #[error("saved trace has layout {saved:?}, expected {expected:?}")]
    DimsMismatch {
        saved: LayoutDims,
        expected: LayoutDims
    },
    #[error("cannot decode saved trace: {0}")]
    Decode(#[from] ciborium::de::Error<io::Error>),
    #[error("cannot encode trace: {0}")]
    Encode(#[from] ciborium::ser::Error<io::Error>),
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// How grid rows are derived from unit ids.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum RowFormula {
    /// `row = blk / bw + (unt / uw) * bw`.
    ///
    /// Uses the block width where the block height belongs.
    /// Matches the output of the existing power graphs.
    #[default]
    Legacy,
    /// `row = blk / bw + (unt / uw) * bh`.
    Symmetric,
}

/// Call `f` on every line of a reader, without the line ending.
///
/// Logs may carry stray non-UTF-8 bytes; those are replaced
/// rather than failing the whole file.
fn for_each_line(
    mut r: impl BufRead, mut f: impl FnMut(&str)
) -> io::Result<()> {
    let mut buf = Vec::new();
    loop {
        buf.clear();
        if r.read_until(b'\n', &mut buf)? == 0 {
            return Ok(())
        }
        let mut line = &buf[..];
        if let Some(l) = line.strip_suffix(b"\n") {
            line = l.strip_suffix(b"\r").unwrap_or(l);
        }
        f(&String::from_utf8_lossy(line));
    }
}

/// Block and unit layout of the simulated chip.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq, Eq)]
pub struct LayoutDims {
    pub block_width: usize,
    pub block_height: usize,
    pub unit_width: usize,
    pub unit_height: usize,
}

impl Default for LayoutDims {
    fn default() -> Self {
        LayoutDims {
            block_width: 4,
            block_height: 4,
            unit_width: 4,
            unit_height: 4,
        }
    }
}

impl LayoutDims {
    /// Create checked layout dimensions.
    pub fn new(
        block_width: usize, block_height: usize,
        unit_width: usize, unit_height: usize
    ) -> Result<LayoutDims, PowerError> {
        let dims = LayoutDims {
            block_width, block_height, unit_width, unit_height
        };
        dims.validate()?;
        Ok(dims)
    }

    /// All four dimensions must be non-zero.
    pub fn validate(&self) -> Result<(), PowerError> {
        if self.block_width == 0 || self.block_height == 0 {
            return Err(PowerError::InvalidBlockDims(
                self.block_width, self.block_height))
        }
        if self.unit_width == 0 || self.unit_height == 0 {
            return Err(PowerError::InvalidUnitDims(
                self.unit_width, self.unit_height))
        }
        Ok(())
    }

    /// Number of grid rows.
    #[inline]
    pub fn rows(&self) -> usize {
        self.block_height * self.unit_height
    }

    /// Number of grid columns.
    #[inline]
    pub fn cols(&self) -> usize {
        self.block_width * self.unit_width
    }

    /// Grid `(row, col)` of a location. May be out of range.
    pub fn coords(&self, loc: &HwLoc, formula: RowFormula) -> (usize, usize) {
        let blk = loc.block as usize;
        let unt = loc.unit as usize;
        let bw = self.block_width;
        let uw = self.unit_width;
        let col = blk % bw + (unt % uw) * bw;
        let row = blk / bw + (unt / uw) * match formula {
            RowFormula::Legacy => bw,
            RowFormula::Symmetric => self.block_height
        };
        (row, col)
    }

    /// Update dimensions from the `Simulated block layout` and
    /// `Simulated unit layout` lines of a log.
    pub fn scan_reader(&mut self, r: impl BufRead) -> io::Result<()> {
        for_each_line(r, |line| {
            for caps in DIMS_TAG.captures_iter(line) {
                let desc = &caps[1];
                let mut nums = NUMBER.find_iter(desc)
                    .filter_map(|m| m.as_str().parse::<f64>().ok())
                    .map(|v| v as usize);
                let (Some(w), Some(h)) = (nums.next(), nums.next())
                else { continue };
                if desc.contains("block layout") {
                    self.block_width = w;
                    self.block_height = h;
                }
                else if desc.contains("unit layout") {
                    self.unit_width = w;
                    self.unit_height = h;
                }
            }
        })
    }

    /// Scan a log file for layout lines.
    ///
    /// Files without a location in their name are not read,
    /// and `false` is returned.
    pub fn scan_log(&mut self, path: impl AsRef<Path>) -> io::Result<bool> {
        let path = path.as_ref();
        if HwLoc::from_path(path).is_none() {
            return Ok(false)
        }
        self.scan_reader(BufReader::new(File::open(path)?))?;
        Ok(true)
    }
}

/// Zero-initialized row-major power grid.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PowerGrid {
    rows: usize,
    cols: usize,
    cells: Vec<f64>,
}

impl PowerGrid {
    #[inline]
    pub fn new(rows: usize, cols: usize) -> PowerGrid {
        PowerGrid { rows, cols, cells: vec![0.0; rows * cols] }
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        if row >= self.rows || col >= self.cols {
            return None
        }
        Some(self.cells[row * self.cols + col])
    }

    #[inline]
    pub fn set(&mut self, row: usize, col: usize, value: f64) {
        self.cells[row * self.cols + col] = value;
    }

    /// Sum of all cells.
    pub fn total(&self) -> f64 {
        self.cells.iter().sum()
    }
}

/// Aggregated power grids, one per cycle, in first-seen order.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PowerTrace {
    pub dims: LayoutDims,
    pub formula: RowFormula,
    pub cycles: IndexMap<u64, PowerGrid>,
}

impl PowerTrace {
    /// Create an empty trace for a layout.
    pub fn new(
        dims: LayoutDims, formula: RowFormula
    ) -> Result<PowerTrace, PowerError> {
        dims.validate()?;
        Ok(PowerTrace { dims, formula, cycles: IndexMap::new() })
    }

    /// Set the power of a location at a cycle.
    ///
    /// Returns false, leaving the trace untouched, if the
    /// location falls outside the grid.
    pub fn record(&mut self, loc: &HwLoc, cycle: u64, value: f64) -> bool {
        let (row, col) = self.dims.coords(loc, self.formula);
        let (rows, cols) = (self.dims.rows(), self.dims.cols());
        if row >= rows || col >= cols {
            return false
        }
        self.cycles.entry(cycle)
            .or_insert_with(|| PowerGrid::new(rows, cols))
            .set(row, col, value);
        true
    }

    /// Record every power tag in a line.
    /// Returns the number of samples recorded.
    pub fn feed_line(&mut self, loc: &HwLoc, line: &str) -> usize {
        let starts: Vec<_> = POWER_TAG.find_iter(line).collect();
        let mut recorded = 0;
        for (i, m) in starts.iter().enumerate() {
            let end = starts.get(i + 1).map(|n| n.start())
                .unwrap_or(line.len());
            let mut nums = NUMBER.find_iter(&line[m.end()..end])
                .map(|n| n.as_str().parse::<f64>());
            let (Some(Ok(value)), Some(Ok(cycle))) = (nums.next(), nums.next())
            else {
                clilog::debug!(POWER_BADTAG, "ignoring malformed power tag in {}", loc);
                continue
            };
            if self.record(loc, cycle as u64, value) {
                recorded += 1;
            }
        }
        recorded
    }

    /// Feed all lines of a reader belonging to `loc`.
    pub fn feed_reader(
        &mut self, loc: &HwLoc, r: impl BufRead
    ) -> io::Result<usize> {
        let mut recorded = 0;
        for_each_line(r, |line| {
            recorded += self.feed_line(loc, line);
        })?;
        Ok(recorded)
    }

    /// Feed one log file.
    ///
    /// Files without a location in their name are skipped
    /// and `None` is returned.
    pub fn feed_log(
        &mut self, path: impl AsRef<Path>
    ) -> io::Result<Option<usize>> {
        let path = path.as_ref();
        let Some(loc) = HwLoc::from_path(path) else {
            clilog::debug!(POWER_SKIP, "skipping {}: no location in name",
                           path.display());
            return Ok(None)
        };
        clilog::info!(POWER_PARSE, "parsing file {} ({})", path.display(), loc);
        let f = File::open(path)?;
        let recorded = self.feed_reader(&loc, BufReader::new(f))?;
        Ok(Some(recorded))
    }

    /// `(time in ms, total power)` of every cycle, in first-seen order.
    pub fn totals(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.cycles.iter().map(|(&cycle, grid)| {
            (cycle as f64 / CLOCK_SPEED, grid.total())
        })
    }

    /// The largest cycle seen, if any.
    pub fn last_cycle(&self) -> Option<u64> {
        self.cycles.keys().copied().max()
    }

    /// Write the power-over-time report.
    pub fn write_report(&self, w: &mut impl Write) -> io::Result<()> {
        writeln!(w, "Power Over Time")?;
        writeln!(w, "time (ms) , Power (W)")?;
        for (time, power) in self.totals() {
            writeln!(w, "{}, {:?}", time, power)?;
        }
        Ok(())
    }

    /// Save the trace as CBOR.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), PowerError> {
        let mut w = BufWriter::new(File::create(path)?);
        ciborium::into_writer(self, &mut w)?;
        w.flush()?;
        Ok(())
    }

    /// Load a trace saved by [`PowerTrace::save`], checking that
    /// it was built for the same layout.
    pub fn load(
        path: impl AsRef<Path>, dims: LayoutDims
    ) -> Result<PowerTrace, PowerError> {
        let trace: PowerTrace = ciborium::from_reader(
            BufReader::new(File::open(path)?))?;
        if trace.dims != dims {
            return Err(PowerError::DimsMismatch {
                saved: trace.dims, expected: dims
            })
        }
        Ok(trace)
    }
}
