// THEORY:
// The command line names the target cell grid as `WIDTHxHEIGHT`. Parsing lives in
// the library so the binary, tests and any other front end share the exact same
// rules: two positive decimal integers separated by a single `x`, nothing else.

use crate::error::DimensionsError;
use std::fmt;
use std::str::FromStr;

/// Target cell-grid dimensions, e.g. `3x3`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridDimensions {
    pub width: usize,
    pub height: usize,
}

impl GridDimensions {
    pub fn new(width: usize, height: usize) -> Self {
        Self { width, height }
    }

    pub fn cell_count(&self) -> usize {
        self.width * self.height
    }
}

impl FromStr for GridDimensions {
    type Err = DimensionsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || DimensionsError::Malformed(s.to_string());

        let (width, height) = s.split_once('x').ok_or_else(malformed)?;
        let is_decimal = |part: &str| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit());
        if !is_decimal(width) || !is_decimal(height) {
            return Err(malformed());
        }

        let width: usize = width.parse().map_err(|_| malformed())?;
        let height: usize = height.parse().map_err(|_| malformed())?;
        if width == 0 || height == 0 {
            return Err(DimensionsError::Zero(s.to_string()));
        }

        Ok(Self { width, height })
    }
}

impl fmt::Display for GridDimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}
