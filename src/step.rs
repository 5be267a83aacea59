use crate::{Dim, Error, Partition, Result, TransitionTable};

/// advances a partition by one generation.
///
/// Both halos must have been refreshed for the current generation. Every
/// owned cell reads its neighborhood from the current buffer and the halos
/// and writes into the next buffer, which then becomes current.
pub fn step_partition(partition: &mut Partition, table: &TransitionTable) -> Result<()> {
    if table.dim() != partition.dim() {
        return Err(Error::invalid_table(format!(
            "table is {:?} but partition is {:?}",
            table.dim(),
            partition.dim()
        )));
    }
    if !partition.halos_fresh() {
        return Err(Error::communication(
            partition.rank(),
            "stepping without a completed halo exchange",
        ));
    }

    let dim = partition.dim();
    let rows = partition.rows();
    let width = partition.width();
    let (current, next) = partition.split();
    for column in 0..width {
        for row in 0..rows {
            let pattern = neighborhood_pattern(dim, |dx, dy| {
                current.get(column as isize + dx, row as isize + dy).bit()
            });
            next[column * rows + row] = table.lookup(pattern);
        }
    }
    partition.swap();
    Ok(())
}

/// composes the pattern of a neighborhood, `bit_at(dx, dy)` reads the cell
/// at that offset. the top-left neighbor is the most significant bit.
pub fn neighborhood_pattern(dim: Dim, bit_at: impl Fn(isize, isize) -> usize) -> usize {
    let dy = match dim {
        Dim::One => 0..=0,
        Dim::Two => -1..=1,
    };
    dy.flat_map(|dy| (-1..=1).map(move |dx| (dx, dy)))
        .fold(0, |pattern, (dx, dy)| (pattern << 1) | bit_at(dx, dy))
}
