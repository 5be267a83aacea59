use std::io::{self, Write};

use crate::{Dim, Lattice};

/// a text frame of a lattice.
pub struct Canvas {
    lines: Vec<String>,
    clear: bool,
}

impl Canvas {
    /// tori draw as `*` over a cleared screen, rings append one line per
    /// generation with `█` marking live cells.
    pub fn from_lattice(lattice: &Lattice) -> Self {
        let (live, clear) = match lattice.dim() {
            Dim::One => ('█', false),
            Dim::Two => ('*', true),
        };
        let lines = (0..lattice.rows())
            .map(|row| {
                lattice
                    .row(row)
                    .iter()
                    .map(|cell| if cell.is_active() { live } else { ' ' })
                    .collect()
            })
            .collect();
        Self { lines, clear }
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn display(&self, out: &mut impl Write) -> io::Result<()> {
        if self.clear {
            let clear = termion::clear::All;
            let home = termion::cursor::Goto(1, 1);
            write!(out, "{clear}{home}")?;
        }
        for line in &self.lines {
            writeln!(out, "{line}")?;
        }
        out.flush()
    }
}
