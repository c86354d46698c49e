//! Panel geometry and the pixel to scan position mapping.
//!
//! A HUB75 panel is driven as two halves that share the row address lines:
//! every address selects one row in the upper half (fed by `R1/G1/B1`) and
//! one in the lower half (fed by `R2/G2/B2`). Chained panels form one long
//! shift register, so a row of the chain is `panel_columns * chain_length`
//! clock pulses wide.

use crate::Hub75Error;

/// Row address counts (rows per half) the scan driver can multiplex.
pub const SUPPORTED_SCAN_ROWS: [usize; 4] = [4, 8, 16, 32];

/// Columns of a single panel unless configured otherwise.
pub const DEFAULT_PANEL_COLUMNS: usize = 32;

/// Which half of the panel a pixel is shifted out on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Half {
    /// `R1/G1/B1`
    Upper,
    /// `R2/G2/B2`
    Lower,
}

/// How physical rows are assigned to row addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RowInterleave {
    /// Row `y` and row `y + rows` share address `y`.
    #[default]
    Halves,
    /// Rows `2a` and `2a + 1` share address `a`.
    Alternating,
}

/// Hardware position of a pixel inside the scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanPosition {
    pub address: usize,
    pub column: usize,
    pub half: Half,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PanelGeometry {
    rows: usize,
    chain_length: usize,
    panel_columns: usize,
    fold: usize,
    interleave: RowInterleave,
}

impl PanelGeometry {
    /// Geometry for `chain_length` panels with `rows` row addresses each.
    ///
    /// `rows` is the number of rows per half, so a 64 row panel with 1:32
    /// multiplexing has `rows == 32`.
    pub fn new(rows: usize, chain_length: usize) -> Result<Self, Hub75Error> {
        if rows == 0 {
            return Err(Hub75Error::InvalidConfig("rows must be positive"));
        }
        if !SUPPORTED_SCAN_ROWS.contains(&rows) {
            return Err(Hub75Error::InvalidConfig(
                "rows must be one of 4, 8, 16 or 32",
            ));
        }
        if chain_length == 0 {
            return Err(Hub75Error::InvalidConfig("chain length must be positive"));
        }
        Ok(Self {
            rows,
            chain_length,
            panel_columns: DEFAULT_PANEL_COLUMNS,
            fold: 1,
            interleave: RowInterleave::Halves,
        })
    }

    pub fn with_panel_columns(mut self, panel_columns: usize) -> Result<Self, Hub75Error> {
        if panel_columns == 0 {
            return Err(Hub75Error::InvalidConfig("panel columns must be positive"));
        }
        self.panel_columns = panel_columns;
        Ok(self)
    }

    /// Fold the chain into `bands` horizontal bands stacked top to bottom.
    ///
    /// Band `b` continues the shift chain, so the first `width` columns of
    /// the chain form the top band, the next `width` the one below it.
    pub fn folded(mut self, bands: usize) -> Result<Self, Hub75Error> {
        if bands == 0 || !self.chain_length.is_multiple_of(bands) {
            return Err(Hub75Error::InvalidConfig(
                "fold must evenly divide the chain length",
            ));
        }
        self.fold = bands;
        Ok(self)
    }

    pub fn with_interleave(mut self, interleave: RowInterleave) -> Self {
        self.interleave = interleave;
        self
    }

    /// Row addresses per half.
    pub const fn rows(&self) -> usize {
        self.rows
    }

    pub const fn chain_length(&self) -> usize {
        self.chain_length
    }

    pub const fn panel_columns(&self) -> usize {
        self.panel_columns
    }

    pub const fn fold(&self) -> usize {
        self.fold
    }

    pub const fn interleave(&self) -> RowInterleave {
        self.interleave
    }

    pub const fn panel_height(&self) -> usize {
        self.rows * 2
    }

    /// Clock pulses needed to shift one row into the whole chain.
    pub const fn chain_columns(&self) -> usize {
        self.panel_columns * self.chain_length
    }

    pub const fn width(&self) -> usize {
        self.chain_columns() / self.fold
    }

    pub const fn height(&self) -> usize {
        self.panel_height() * self.fold
    }

    pub const fn pixel_count(&self) -> usize {
        self.width() * self.height()
    }

    /// Number of `A..E` lines needed to select every row address.
    pub const fn address_lines(&self) -> usize {
        self.rows.trailing_zeros() as usize
    }

    /// Map a display coordinate to its scan position.
    pub fn map(&self, x: usize, y: usize) -> Option<ScanPosition> {
        if x >= self.width() || y >= self.height() {
            return None;
        }
        let band = y / self.panel_height();
        let y = y % self.panel_height();
        let (address, half) = match self.interleave {
            RowInterleave::Halves if y < self.rows => (y, Half::Upper),
            RowInterleave::Halves => (y - self.rows, Half::Lower),
            RowInterleave::Alternating if y.is_multiple_of(2) => (y / 2, Half::Upper),
            RowInterleave::Alternating => (y / 2, Half::Lower),
        };
        Some(ScanPosition {
            address,
            column: band * self.width() + x,
            half,
        })
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for PanelGeometry {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(
            f,
            "PanelGeometry<{}x{}> rows: {} chain: {} fold: {}",
            self.width(),
            self.height(),
            self.rows,
            self.chain_length,
            self.fold
        );
    }
}
