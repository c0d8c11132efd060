use super::element::{Element, plain_text};

/// Column alignment from the table delimiter row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Align {
    #[default]
    Default,
    Left,
    Center,
    Right,
}

/// A table with a fixed column count; row 0 is the header row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    rows: usize,
    cols: usize,
    aligns: Vec<Align>,
    /// Row-major, `rows * cols` entries.
    cells: Vec<Vec<Element>>,
}

impl Table {
    /// Builds a table from ragged rows. The column count comes from `aligns`
    /// (at least one column); each row is padded or truncated to fit.
    pub fn new(mut aligns: Vec<Align>, rows: Vec<Vec<Vec<Element>>>) -> Self {
        if aligns.is_empty() {
            aligns.push(Align::Default);
        }
        let cols = aligns.len();
        let row_count = rows.len();
        let mut cells = Vec::with_capacity(row_count * cols);
        for mut row in rows {
            if row.len() != cols {
                log::debug!("table row has {} cells, expected {cols}", row.len());
            }
            row.resize_with(cols, Vec::new);
            cells.extend(row);
        }
        Self {
            rows: row_count,
            cols,
            aligns,
            cells,
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn aligns(&self) -> &[Align] {
        &self.aligns
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<&[Element]> {
        if col >= self.cols {
            return None;
        }
        self.cells.get(row * self.cols + col).map(Vec::as_slice)
    }

    /// Iterates rows as slices of cells.
    pub fn row_iter(&self) -> impl Iterator<Item = &[Vec<Element>]> {
        self.cells.chunks(self.cols)
    }

    /// Plain text of a cell with line breaks flattened to spaces.
    pub fn cell_text(&self, row: usize, col: usize) -> String {
        self.cell(row, col)
            .map(|c| plain_text(c).replace('\n', " "))
            .unwrap_or_default()
    }
}
