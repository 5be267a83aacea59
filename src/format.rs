use std::fmt;

use crate::{Cell, Dim, Error, Lattice, Result, TableBuilder, TransitionTable};

/// parses `<bitstring> <symbol>` lines into a table for `dim`.
///
/// Without `fill` every pattern has to be listed.
pub fn parse_table(text: &str, dim: Dim, fill: Option<Cell>) -> Result<TransitionTable> {
    let width = dim.neighborhood_width();
    let mut builder = TableBuilder::new(dim);
    if let Some(fill) = fill {
        builder = builder.fill_missing(fill);
    }
    for (number, line) in text.lines().enumerate() {
        let number = number + 1;
        let mut fields = line.split_whitespace();
        let Some(bits) = fields.next() else {
            continue;
        };
        let symbol = fields
            .next()
            .ok_or_else(|| Error::invalid_table(format!("line {number}: missing next state")))?;
        if fields.next().is_some() {
            return Err(Error::invalid_table(format!("line {number}: trailing fields")));
        }
        if bits.len() != width || !bits.chars().all(|c| c == '0' || c == '1') {
            return Err(Error::invalid_table(format!(
                "line {number}: `{bits}` is not a {width}-bit pattern"
            )));
        }
        let pattern = usize::from_str_radix(bits, 2)
            .map_err(|err| Error::invalid_table(format!("line {number}: {err}")))?;
        let cell = parse_symbol(symbol)
            .ok_or_else(|| Error::invalid_table(format!("line {number}: bad state `{symbol}`")))?;
        builder.insert(pattern, cell)?;
    }
    builder.finish()
}

fn parse_symbol(symbol: &str) -> Option<Cell> {
    let mut chars = symbol.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Cell::from_symbol(c),
        _ => None,
    }
}

/// parses an initial configuration: the size, then one row for a ring or
/// `size` rows for a torus. `dim` forces the layout, otherwise it follows
/// from the row count.
pub fn parse_lattice(text: &str, dim: Option<Dim>) -> Result<Lattice> {
    let mut lines = text.lines().map(str::trim_end);
    let header = lines
        .next()
        .ok_or_else(|| Error::config("configuration file is empty"))?;
    let size: usize = header
        .trim()
        .parse()
        .map_err(|_| Error::config(format!("could not parse lattice size from `{header}`")))?;
    if size == 0 {
        return Err(Error::config("lattice size must be positive"));
    }

    let rows: Vec<&str> = lines.filter(|line| !line.is_empty()).collect();
    let dim = match dim {
        Some(dim) => dim,
        None if rows.len() == 1 => Dim::One,
        None if rows.len() == size => Dim::Two,
        None => {
            return Err(Error::config(format!(
                "expected 1 or {size} rows of states, found {}",
                rows.len()
            )))
        }
    };
    let expected = dim.rows(size);
    if rows.len() != expected {
        return Err(Error::config(format!(
            "{dim:?} lattice of size {size} needs {expected} rows, found {}",
            rows.len()
        )));
    }

    let mut cells = Vec::new();
    for (index, row) in rows.iter().enumerate() {
        let before = cells.len();
        for symbol in row.chars() {
            let cell = Cell::from_symbol(symbol).ok_or_else(|| {
                Error::config(format!("row {}: unexpected state `{symbol}`", index + 1))
            })?;
            cells.push(cell);
        }
        let found = cells.len() - before;
        if found != size {
            return Err(Error::config(format!(
                "row {} has {found} states, expected {size}",
                index + 1
            )));
        }
    }
    Lattice::new(dim, size, cells)
}

/// writes the lattice back in the configuration file format.
impl fmt::Display for Lattice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.size())?;
        for row in 0..self.rows() {
            let line: String = self.row(row).iter().map(Cell::symbol).collect();
            writeln!(f, "{line}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RULE_90: &str = "000 0\n001 1\n010 0\n011 1\n100 1\n101 0\n110 1\n111 0\n";

    #[test]
    fn parses_rule_90() {
        let table = parse_table(RULE_90, Dim::One, None).unwrap();
        assert!(table.lookup(0b001).is_active());
        assert!(!table.lookup(0b101).is_active());
    }

    #[test]
    fn table_requires_every_pattern() {
        let partial = "000 0\n001 1\n\n";
        assert!(matches!(
            parse_table(partial, Dim::One, None),
            Err(Error::InvalidTable(_))
        ));
        let table = parse_table(partial, Dim::One, Some(Cell::inactive())).unwrap();
        assert!(table.lookup(0b001).is_active());
        assert!(!table.lookup(0b111).is_active());
    }

    #[test]
    fn table_rejects_malformed_lines() {
        for text in ["0000 1", "01 1", "0a0 1", "010 2", "010", "010 1 1", "010 11"] {
            let result = parse_table(text, Dim::One, Some(Cell::inactive()));
            assert!(matches!(result, Err(Error::InvalidTable(_))), "{text:?}");
        }
    }

    #[test]
    fn table_width_follows_dim() {
        let text = "000010000 1";
        let table = parse_table(text, Dim::Two, Some(Cell::inactive())).unwrap();
        assert!(table.lookup(16).is_active());
        assert!(parse_table(text, Dim::One, Some(Cell::inactive())).is_err());
    }

    #[test]
    fn parses_ring() {
        let lattice = parse_lattice("8\n00010000\n", None).unwrap();
        assert_eq!(lattice.dim(), Dim::One);
        assert_eq!(lattice.size(), 8);
        assert!(lattice.cells()[3].is_active());
    }

    #[test]
    fn parses_torus() {
        let lattice = parse_lattice("3\r\n010\r\n111\r\n010\r\n", None).unwrap();
        assert_eq!(lattice.dim(), Dim::Two);
        assert_eq!(lattice.to_string(), "3\n010\n111\n010\n");
    }

    #[test]
    fn forced_dim_checks_rows() {
        assert!(parse_lattice("1\n1\n", Some(Dim::Two)).is_ok());
        assert!(parse_lattice("2\n10\n", Some(Dim::Two)).is_err());
    }

    #[test]
    fn rejects_bad_configurations() {
        for text in [
            "", "x\n010", "0\n", "3\n01\n", "3\n012\n", "3\n010\n010\n", "2\n10\n01\n11\n",
            "18446744073709551615\n0101\n",
        ] {
            assert!(matches!(parse_lattice(text, None), Err(Error::Config(_))), "{text:?}");
        }
    }

    #[test]
    fn display_round_trips() {
        let text = "4\n0110\n";
        assert_eq!(parse_lattice(text, None).unwrap().to_string(), text);
    }
}
