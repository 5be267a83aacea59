use std::hash::{Hash, Hasher};

use metrohash::MetroHash64;

use crate::{neighborhood_pattern, pos, Error, Pos, Result, TransitionTable};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Cell {
    active: bool,
}

impl Cell {
    pub fn active() -> Self {
        Self { active: true }
    }

    pub fn inactive() -> Self {
        Self { active: false }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn from_symbol(symbol: char) -> Option<Self> {
        match symbol {
            '0' => Some(Self::inactive()),
            '1' => Some(Self::active()),
            _ => None,
        }
    }

    pub fn symbol(&self) -> char {
        if self.active {
            '1'
        } else {
            '0'
        }
    }

    /// weight of this cell inside a neighborhood pattern.
    pub fn bit(&self) -> usize {
        self.active as usize
    }
}

impl From<bool> for Cell {
    fn from(active: bool) -> Self {
        Self { active }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dim {
    One,
    Two,
}

impl Dim {
    pub fn from_rank(rank: u8) -> Option<Self> {
        match rank {
            1 => Some(Self::One),
            2 => Some(Self::Two),
            _ => None,
        }
    }

    /// number of cells in a neighborhood, and so of bits in a pattern.
    pub fn neighborhood_width(self) -> usize {
        match self {
            Self::One => 3,
            Self::Two => 9,
        }
    }

    pub fn pattern_count(self) -> usize {
        1 << self.neighborhood_width()
    }

    /// rows of an `size`-wide lattice, 1D rings are a single row.
    pub fn rows(self, size: usize) -> usize {
        match self {
            Self::One => 1,
            Self::Two => size,
        }
    }
}

fn cell_count(dim: Dim, size: usize) -> Result<usize> {
    dim.rows(size)
        .checked_mul(size)
        .ok_or_else(|| Error::config(format!("lattice of size {size} is too large")))
}

/// the whole lattice, only ever held by the coordinator.
/// 2D lattices are stored row-major.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Lattice {
    dim: Dim,
    size: usize,
    cells: Vec<Cell>,
}

impl Lattice {
    pub fn new(dim: Dim, size: usize, cells: Vec<Cell>) -> Result<Self> {
        if size == 0 {
            return Err(Error::config("lattice size must be positive"));
        }
        let expected = cell_count(dim, size)?;
        if cells.len() != expected {
            return Err(Error::config(format!(
                "lattice of size {size} needs {expected} cells, got {}",
                cells.len()
            )));
        }
        Ok(Self { dim, size, cells })
    }

    pub fn empty(dim: Dim, size: usize) -> Result<Self> {
        let count = cell_count(dim, size)?;
        Self::new(dim, size, vec![Cell::inactive(); count])
    }

    pub fn dim(&self) -> Dim {
        self.dim
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn rows(&self) -> usize {
        self.dim.rows(self.size)
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn row(&self, row: usize) -> &[Cell] {
        &self.cells[row * self.size..(row + 1) * self.size]
    }

    fn index(&self, pos: Pos) -> usize {
        let (x, y) = pos.wrapped(self.size);
        let y = match self.dim {
            Dim::One => 0,
            Dim::Two => y,
        };
        y * self.size + x
    }

    /// reads a cell, both axes are periodic.
    pub fn get(&self, pos: Pos) -> Cell {
        self.cells[self.index(pos)]
    }

    pub fn set(&mut self, pos: Pos, cell: Cell) {
        let index = self.index(pos);
        self.cells[index] = cell;
    }

    /// single-process generation step, reading every neighbor through the
    /// torus wrap instead of halos.
    pub fn evolve(&self, table: &TransitionTable) -> Result<Self> {
        if table.dim() != self.dim {
            return Err(Error::invalid_table(format!(
                "table is {:?} but lattice is {:?}",
                table.dim(),
                self.dim
            )));
        }
        let rows = self.rows();
        let mut next = Vec::with_capacity(self.cells.len());
        for y in 0..rows as isize {
            for x in 0..self.size as isize {
                let pattern =
                    neighborhood_pattern(self.dim, |dx, dy| self.get(pos!(x + dx, y + dy)).bit());
                next.push(table.lookup(pattern));
            }
        }
        Self::new(self.dim, self.size, next)
    }

    /// hash of the whole lattice, stable within a build.
    pub fn fingerprint(&self) -> u64 {
        let mut hasher = MetroHash64::new();
        self.hash(&mut hasher);
        hasher.finish()
    }
}

pub use partition::{Partition, Side};
mod partition;

#[cfg(test)]
mod tests {
    use super::*;

    fn line(text: &str) -> Lattice {
        let cells = text.chars().filter_map(Cell::from_symbol).collect();
        Lattice::new(Dim::One, text.len(), cells).unwrap()
    }

    #[test]
    fn rejects_length_mismatch() {
        let err = Lattice::new(Dim::Two, 3, vec![Cell::inactive(); 8]).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(Lattice::empty(Dim::One, 0).is_err());
        assert!(matches!(Lattice::new(Dim::Two, usize::MAX, Vec::new()), Err(Error::Config(_))));
    }

    #[test]
    fn get_wraps_both_axes() {
        let mut lattice = Lattice::empty(Dim::Two, 4).unwrap();
        lattice.set(pos!(3, 0), Cell::active());
        assert!(lattice.get(pos!(-1, 4)).is_active());
        assert!(lattice.get(pos!(7, -4)).is_active());
        assert!(!lattice.get(pos!(2, 0)).is_active());
    }

    #[test]
    fn evolve_rule_90() {
        let table = TransitionTable::from_fn(Dim::One, |p| ((p >> 2) ^ p) & 1 == 1);
        let next = line("00010000").evolve(&table).unwrap();
        assert_eq!(next, line("00101000"));
    }

    #[test]
    fn evolve_rejects_dim_mismatch() {
        let table = TransitionTable::from_fn(Dim::Two, |_| false);
        assert!(line("0101").evolve(&table).is_err());
    }

    #[test]
    fn fingerprint_tracks_content() {
        let a = line("0110");
        let b = line("0111");
        assert_eq!(a.fingerprint(), a.clone().fingerprint());
        assert_ne!(a.fingerprint(), b.fingerprint());
    }
}
