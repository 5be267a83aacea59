use std::sync::mpsc;

use crate::{wrap, Cell, Error, Partition, Result, Side};

/// a boundary column on its way to a neighbor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HaloMessage {
    pub generation: usize,
    pub cells: Vec<Cell>,
}

/// one worker's connections to its two ring neighbors.
///
/// Sends go over unbounded channels and never block; only receives do. No
/// worker can therefore wait on a send, and a generation's exchange finishes
/// as soon as both neighbors have posted their boundaries.
#[derive(Debug)]
pub struct RingLink {
    rank: usize,
    size: usize,
    to_left: mpsc::Sender<HaloMessage>,
    to_right: mpsc::Sender<HaloMessage>,
    from_left: mpsc::Receiver<HaloMessage>,
    from_right: mpsc::Receiver<HaloMessage>,
}

/// wires `size` workers into a ring, `links[r]` belongs to worker `r`.
pub fn ring(size: usize) -> Vec<RingLink> {
    let mut from_left: Vec<_> = (0..size).map(|_| None).collect();
    let mut from_right: Vec<_> = (0..size).map(|_| None).collect();
    let mut senders = Vec::with_capacity(size);
    for rank in 0..size {
        // rightward traffic of `rank` is what its right neighbor sees on the left
        let (to_right, rightward) = mpsc::channel();
        let (to_left, leftward) = mpsc::channel();
        from_left[wrap(rank as isize + 1, size)] = Some(rightward);
        from_right[wrap(rank as isize - 1, size)] = Some(leftward);
        senders.push((to_left, to_right));
    }
    senders
        .into_iter()
        .zip(from_left.into_iter().zip(from_right))
        .enumerate()
        .filter_map(|(rank, ((to_left, to_right), (from_left, from_right)))| {
            Some(RingLink {
                rank,
                size,
                to_left,
                to_right,
                from_left: from_left?,
                from_right: from_right?,
            })
        })
        .collect()
}

impl RingLink {
    pub fn neighbor(&self, side: Side) -> usize {
        match side {
            Side::Left => wrap(self.rank as isize - 1, self.size),
            Side::Right => wrap(self.rank as isize + 1, self.size),
        }
    }

    /// posts both boundaries of the current generation. never blocks.
    pub fn send_boundaries(&self, partition: &Partition, generation: usize) -> Result<()> {
        for side in [Side::Left, Side::Right] {
            let message = HaloMessage {
                generation,
                cells: partition.boundary(side).to_vec(),
            };
            let sender = match side {
                Side::Left => &self.to_left,
                Side::Right => &self.to_right,
            };
            sender.send(message).map_err(|_| {
                Error::communication(
                    self.rank,
                    format!("{side:?} neighbor {} hung up", self.neighbor(side)),
                )
            })?;
        }
        Ok(())
    }

    /// waits for exactly one boundary from each neighbor and stores them as
    /// halos. a neighbor's left boundary becomes our right halo.
    pub fn receive_halos(&self, partition: &mut Partition, generation: usize) -> Result<()> {
        for side in [Side::Left, Side::Right] {
            let receiver = match side {
                Side::Left => &self.from_left,
                Side::Right => &self.from_right,
            };
            let neighbor = self.neighbor(side);
            let message = receiver.recv().map_err(|_| {
                Error::communication(
                    self.rank,
                    format!("{side:?} neighbor {neighbor} hung up before generation {generation}"),
                )
            })?;
            if message.generation != generation {
                return Err(Error::communication(
                    self.rank,
                    format!(
                        "expected generation {generation} from {side:?} neighbor {neighbor}, got {}",
                        message.generation
                    ),
                ));
            }
            partition.set_halo(side, &message.cells)?;
        }
        Ok(())
    }

    /// one full halo round for this worker.
    pub fn exchange(&self, partition: &mut Partition, generation: usize) -> Result<()> {
        self.send_boundaries(partition, generation)?;
        self.receive_halos(partition, generation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{distribute, pos, Dim, Lattice};
    use std::thread;

    fn column(lattice: &Lattice, x: isize) -> Vec<Cell> {
        (0..lattice.size() as isize).map(|y| lattice.get(pos!(x, y))).collect()
    }

    #[test]
    fn neighbors_wrap() {
        let links = ring(4);
        assert_eq!(links[0].neighbor(Side::Left), 3);
        assert_eq!(links[3].neighbor(Side::Right), 0);
        assert_eq!(links[2].neighbor(Side::Left), 1);
        let single = ring(1);
        assert_eq!(single[0].neighbor(Side::Left), 0);
        assert_eq!(single[0].neighbor(Side::Right), 0);
    }

    #[test]
    fn halos_match_neighbor_boundaries() {
        let mut lattice = Lattice::empty(Dim::Two, 8).unwrap();
        for y in 0..8 {
            for x in 0..8 {
                lattice.set(pos!(x, y), Cell::from((x * 8 + y) % 3 == 0));
            }
        }
        let mut partitions = distribute(&lattice, 4).unwrap();
        let links = ring(4);

        // every send happens before any receive, nothing blocks
        for (link, partition) in links.iter().zip(&partitions) {
            link.send_boundaries(partition, 0).unwrap();
        }
        for (link, partition) in links.iter().zip(&mut partitions) {
            link.receive_halos(partition, 0).unwrap();
        }

        for (rank, partition) in partitions.iter().enumerate() {
            let first = rank as isize * 2;
            assert!(partition.halos_fresh());
            assert_eq!(partition.halo(Side::Left), column(&lattice, first - 1).as_slice());
            assert_eq!(partition.halo(Side::Right), column(&lattice, first + 2).as_slice());
        }
        assert_eq!(partitions[0].halo(Side::Left), column(&lattice, 7).as_slice());
        assert_eq!(partitions[3].halo(Side::Right), column(&lattice, 0).as_slice());
    }

    #[test]
    fn exchange_across_threads() {
        let lattice = Lattice::new(
            Dim::One,
            6,
            "100101".chars().filter_map(Cell::from_symbol).collect(),
        )
        .unwrap();
        let partitions = distribute(&lattice, 3).unwrap();
        let handles: Vec<_> = ring(3)
            .into_iter()
            .zip(partitions)
            .map(|(link, mut partition)| {
                thread::spawn(move || {
                    link.exchange(&mut partition, 0).map(|_| partition)
                })
            })
            .collect();
        let partitions: Vec<_> = handles
            .into_iter()
            .map(|handle| handle.join().unwrap().unwrap())
            .collect();
        let halos: Vec<_> = partitions
            .iter()
            .map(|p| (p.halo(Side::Left)[0].symbol(), p.halo(Side::Right)[0].symbol()))
            .collect();
        assert_eq!(halos, vec![('1', '0'), ('0', '0'), ('1', '1')]);
    }

    #[test]
    fn rejects_out_of_order_generation() {
        let lattice = Lattice::empty(Dim::One, 4).unwrap();
        let mut partitions = distribute(&lattice, 2).unwrap();
        let links = ring(2);
        links[0].send_boundaries(&partitions[0], 1).unwrap();
        links[1].send_boundaries(&partitions[1], 1).unwrap();
        let err = links[0].receive_halos(&mut partitions[0], 0).unwrap_err();
        assert!(matches!(err, Error::CommunicationFailure { rank: 0, .. }));
    }

    #[test]
    fn reports_hung_up_neighbor() {
        let lattice = Lattice::empty(Dim::One, 4).unwrap();
        let mut partitions = distribute(&lattice, 2).unwrap();
        let mut links = ring(2);
        drop(links.pop());
        let err = links[0].receive_halos(&mut partitions[0], 0).unwrap_err();
        assert!(matches!(err, Error::CommunicationFailure { rank: 0, .. }));
    }
}
