use crate::{Cell, Dim, Error, Result};

/// immutable lookup from neighborhood pattern to next state.
///
/// Patterns are read most significant bit first: `left, self, right` in 1D,
/// the Moore neighborhood row by row from top-left to bottom-right in 2D.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionTable {
    dim: Dim,
    entries: Box<[Cell]>,
}

impl TransitionTable {
    /// builds a table that must define every pattern of `dim` exactly.
    pub fn build(dim: Dim, entries: impl IntoIterator<Item = (usize, Cell)>) -> Result<Self> {
        let mut builder = TableBuilder::new(dim);
        for (pattern, cell) in entries {
            builder.insert(pattern, cell)?;
        }
        builder.finish()
    }

    /// total table, mostly for rules expressed as code.
    pub fn from_fn(dim: Dim, rule: impl Fn(usize) -> bool) -> Self {
        let entries = (0..dim.pattern_count()).map(|p| Cell::from(rule(p))).collect();
        Self { dim, entries }
    }

    pub fn dim(&self) -> Dim {
        self.dim
    }

    /// `pattern` must be below `dim.pattern_count()`.
    pub fn lookup(&self, pattern: usize) -> Cell {
        self.entries[pattern]
    }
}

/// accumulates table entries, refusing gaps unless a fill is chosen.
#[derive(Debug, Clone)]
pub struct TableBuilder {
    dim: Dim,
    entries: Vec<Option<Cell>>,
    fill: Option<Cell>,
}

impl TableBuilder {
    pub fn new(dim: Dim) -> Self {
        Self {
            dim,
            entries: vec![None; dim.pattern_count()],
            fill: None,
        }
    }

    /// state used for patterns never inserted, instead of failing.
    pub fn fill_missing(mut self, cell: Cell) -> Self {
        self.fill = Some(cell);
        self
    }

    pub fn insert(&mut self, pattern: usize, cell: Cell) -> Result<()> {
        let count = self.entries.len();
        let slot = self.entries.get_mut(pattern).ok_or_else(|| {
            Error::invalid_table(format!("pattern {pattern} is outside [0, {count})"))
        })?;
        match *slot {
            Some(existing) if existing != cell => Err(Error::invalid_table(format!(
                "pattern {pattern:0width$b} is defined as both {} and {}",
                existing.symbol(),
                cell.symbol(),
                width = self.dim.neighborhood_width()
            ))),
            _ => {
                *slot = Some(cell);
                Ok(())
            }
        }
    }

    pub fn finish(self) -> Result<TransitionTable> {
        let width = self.dim.neighborhood_width();
        if self.fill.is_none() && self.entries.iter().all(Option::is_none) {
            return Err(Error::invalid_table("table has no entries"));
        }
        let missing: Vec<_> = self
            .entries
            .iter()
            .enumerate()
            .filter(|(_, entry)| entry.is_none())
            .map(|(pattern, _)| pattern)
            .collect();
        let entries = match self.fill {
            Some(fill) => self.entries.iter().map(|e| e.unwrap_or(fill)).collect(),
            None if missing.is_empty() => self.entries.iter().flatten().copied().collect(),
            None => {
                let first = missing[0];
                return Err(Error::invalid_table(format!(
                    "{} of {} patterns undefined, first is {first:0width$b}",
                    missing.len(),
                    self.entries.len()
                )));
            }
        };
        Ok(TransitionTable {
            dim: self.dim,
            entries,
        })
    }
}
