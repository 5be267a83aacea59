use std::mem;

use crate::{wrap, Cell, Dim, Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    fn index(self) -> usize {
        match self {
            Self::Left => 0,
            Self::Right => 1,
        }
    }
}

/// one worker's strip of the lattice.
///
/// Cells are stored column-major so that each edge column is a contiguous
/// slice: column `c` covers `[c * rows, (c + 1) * rows)`. A 1D strip is a
/// single row. The two generation buffers are allocated once and swapped
/// after every step; the halos are overwritten in place every generation.
#[derive(Debug, Clone)]
pub struct Partition {
    rank: usize,
    dim: Dim,
    rows: usize,
    width: usize,
    current: Vec<Cell>,
    next: Vec<Cell>,
    halos: [Vec<Cell>; 2],
    fresh: [bool; 2],
}

impl Partition {
    pub fn from_columns(rank: usize, dim: Dim, rows: usize, cells: Vec<Cell>) -> Result<Self> {
        if rows == 0 || cells.is_empty() || cells.len() % rows != 0 {
            return Err(Error::config(format!(
                "strip of {} cells cannot be split into {rows} rows",
                cells.len()
            )));
        }
        if dim == Dim::One && rows != 1 {
            return Err(Error::config("1D strips hold a single row"));
        }
        let width = cells.len() / rows;
        Ok(Self {
            rank,
            dim,
            rows,
            width,
            next: vec![Cell::inactive(); cells.len()],
            current: cells,
            halos: [vec![Cell::inactive(); rows], vec![Cell::inactive(); rows]],
            fresh: [false; 2],
        })
    }

    pub fn rank(&self) -> usize {
        self.rank
    }

    pub fn dim(&self) -> Dim {
        self.dim
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// owned cells of the current generation, column-major.
    pub fn cells(&self) -> &[Cell] {
        &self.current
    }

    pub fn column(&self, column: usize) -> &[Cell] {
        &self.current[column * self.rows..(column + 1) * self.rows]
    }

    /// edge column of the current generation, the slice sent to a neighbor.
    pub fn boundary(&self, side: Side) -> &[Cell] {
        match side {
            Side::Left => self.column(0),
            Side::Right => self.column(self.width - 1),
        }
    }

    pub fn halo(&self, side: Side) -> &[Cell] {
        &self.halos[side.index()]
    }

    /// stores the boundary just received from the neighbor on `side`.
    pub fn set_halo(&mut self, side: Side, cells: &[Cell]) -> Result<()> {
        if cells.len() != self.rows {
            return Err(Error::communication(
                self.rank,
                format!(
                    "{side:?} halo has {} cells, expected {}",
                    cells.len(),
                    self.rows
                ),
            ));
        }
        self.halos[side.index()].copy_from_slice(cells);
        self.fresh[side.index()] = true;
        Ok(())
    }

    /// true once both halos hold this generation's neighbor boundaries.
    pub fn halos_fresh(&self) -> bool {
        self.fresh.iter().all(|&fresh| fresh)
    }

    /// promotes the next generation and invalidates the halos.
    pub(crate) fn swap(&mut self) {
        mem::swap(&mut self.current, &mut self.next);
        self.fresh = [false; 2];
    }

    /// splits the borrow into the current generation (read through `get`)
    /// and the next-generation buffer.
    pub(crate) fn split(&mut self) -> (PartitionView<'_>, &mut [Cell]) {
        let view = PartitionView {
            rows: self.rows,
            width: self.width,
            current: &self.current,
            halos: &self.halos,
        };
        (view, &mut self.next)
    }
}

/// read-only view of a partition's current generation and halos.
pub(crate) struct PartitionView<'a> {
    rows: usize,
    width: usize,
    current: &'a [Cell],
    halos: &'a [Vec<Cell>; 2],
}

impl PartitionView<'_> {
    /// current-generation cell at a column and a row, reaching into the
    /// halos one column past either edge. rows wrap.
    pub fn get(&self, column: isize, row: isize) -> Cell {
        let row = wrap(row, self.rows);
        if column < 0 {
            self.halos[Side::Left.index()][row]
        } else if column as usize >= self.width {
            self.halos[Side::Right.index()][row]
        } else {
            self.current[column as usize * self.rows + row]
        }
    }
}
