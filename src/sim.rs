use std::{
    sync::{mpsc, Arc},
    thread::{self, JoinHandle},
};

use tracing::{debug, info, warn};

use crate::{
    ring, step_partition, Cell, Dim, Error, Lattice, Partition, Result, RingLink, TransitionTable,
};

/// splits the lattice into `workers` equal strips of whole columns.
pub fn distribute(lattice: &Lattice, workers: usize) -> Result<Vec<Partition>> {
    let size = lattice.size();
    if workers == 0 {
        return Err(Error::config("at least one worker is required"));
    }
    if size % workers != 0 {
        return Err(Error::IndivisibleSize { size, workers });
    }
    let rows = lattice.rows();
    let width = size / workers;
    (0..workers)
        .map(|rank| {
            let columns = rank * width..(rank + 1) * width;
            let cells = columns
                .flat_map(|x| (0..rows).map(move |y| lattice.cells()[y * size + x]))
                .collect();
            Partition::from_columns(rank, lattice.dim(), rows, cells)
        })
        .collect()
}

/// reassembles strips, in rank order, into the full lattice.
pub fn collect(partitions: Vec<Partition>) -> Result<Lattice> {
    let partitions = in_ring_order(partitions)?;
    let (dim, rows) = (partitions[0].dim(), partitions[0].rows());
    assemble(dim, rows, partitions.iter().map(Partition::cells))
}

/// sorts by rank and checks the strips form one ring of equal shapes.
fn in_ring_order(mut partitions: Vec<Partition>) -> Result<Vec<Partition>> {
    partitions.sort_by_key(Partition::rank);
    let first = partitions
        .first()
        .ok_or_else(|| Error::config("no partitions given"))?;
    let shape = (first.dim(), first.rows(), first.width());
    if partitions.iter().enumerate().any(|(rank, p)| p.rank() != rank) {
        return Err(Error::config("partition ranks are not a contiguous 0..P range"));
    }
    if partitions.iter().any(|p| (p.dim(), p.rows(), p.width()) != shape) {
        return Err(Error::config("partitions disagree on their shape"));
    }
    Ok(partitions)
}

/// lays column-major strips side by side into a row-major lattice.
fn assemble<'a>(dim: Dim, rows: usize, strips: impl Iterator<Item = &'a [Cell]>) -> Result<Lattice> {
    let columns: Vec<&[Cell]> = strips.flat_map(|strip| strip.chunks(rows)).collect();
    let size = columns.len();
    if dim.rows(size) != rows {
        return Err(Error::config(format!(
            "{size} columns of {rows} rows do not form a {dim:?} lattice"
        )));
    }
    let cells = (0..rows)
        .flat_map(|y| columns.iter().map(move |column| column[y]))
        .collect();
    Lattice::new(dim, size, cells)
}

enum Report {
    Stepped { rank: usize, strip: Option<Vec<Cell>> },
    Failed(Error),
}

/// a running worker thread and the channel that releases its next generation.
struct Worker {
    thread: JoinHandle<Result<Partition>>,
    proceed: mpsc::Sender<()>,
}

impl Worker {
    fn spawn(
        partition: Partition,
        link: RingLink,
        table: Arc<TransitionTable>,
        generations: usize,
        reports: mpsc::Sender<Report>,
        gather: bool,
    ) -> Self {
        let (proceed, released) = mpsc::channel();
        let thread = thread::spawn(move || {
            let guard = PanicGuard(partition.rank(), reports);
            worker_loop(partition, link, &table, generations, &guard.1, released, gather)
        });
        Self { thread, proceed }
    }
}

/// tells the coordinator when a worker unwinds instead of reporting.
struct PanicGuard(usize, mpsc::Sender<Report>);

impl Drop for PanicGuard {
    fn drop(&mut self) {
        if thread::panicking() {
            let failure = Error::communication(self.0, "worker panicked");
            let _ = self.1.send(Report::Failed(failure));
        }
    }
}

fn worker_loop(
    mut partition: Partition,
    link: RingLink,
    table: &TransitionTable,
    generations: usize,
    reports: &mpsc::Sender<Report>,
    released: mpsc::Receiver<()>,
    gather: bool,
) -> Result<Partition> {
    let rank = partition.rank();
    let span = tracing::debug_span!("worker", rank);
    let _enter = span.enter();

    for generation in 0..generations {
        let stepped = link
            .exchange(&mut partition, generation)
            .and_then(|_| step_partition(&mut partition, table));
        if let Err(err) = stepped {
            warn!(generation, %err, "worker failed");
            let _ = reports.send(Report::Failed(err.clone()));
            return Err(err);
        }

        let strip = gather.then(|| partition.cells().to_vec());
        reports
            .send(Report::Stepped { rank, strip })
            .map_err(|_| Error::communication(rank, "coordinator hung up"))?;
        released
            .recv()
            .map_err(|_| Error::communication(rank, "run stopped by the coordinator"))?;
    }
    Ok(partition)
}

/// drives the workers through `generations` synchronized generations.
///
/// No worker starts generation `g + 1` before every worker has finished
/// generation `g`: each reports to the coordinator after stepping and waits
/// to be released. The first failure stops the release, which unwinds every
/// other worker.
pub fn run(
    partitions: Vec<Partition>,
    table: &TransitionTable,
    generations: usize,
    mut observer: Option<&mut dyn FnMut(usize, &Lattice)>,
) -> Result<Vec<Partition>> {
    let partitions = in_ring_order(partitions)?;
    let count = partitions.len();
    let (dim, rows) = (partitions[0].dim(), partitions[0].rows());
    info!(workers = count, generations, "starting run");

    let table = Arc::new(table.clone());
    let (reports, reported) = mpsc::channel();
    let gather = observer.is_some();
    let workers: Vec<Worker> = partitions
        .into_iter()
        .zip(ring(count))
        .map(|(partition, link)| {
            Worker::spawn(partition, link, table.clone(), generations, reports.clone(), gather)
        })
        .collect();
    drop(reports);

    let (threads, proceeds): (Vec<_>, Vec<_>) = workers
        .into_iter()
        .map(|worker| (worker.thread, worker.proceed))
        .unzip();
    let outcome = coordinate(&proceeds, &reported, generations, dim, rows, &mut observer);
    // unblocks every worker still waiting to be released
    drop(proceeds);

    let joined: Vec<Result<Partition>> = threads
        .into_iter()
        .enumerate()
        .map(|(rank, thread)| {
            thread
                .join()
                .map_err(|_| Error::communication(rank, "worker panicked"))
                .and_then(|partition| partition)
        })
        .collect();
    outcome?;
    joined.into_iter().collect()
}

fn coordinate(
    proceeds: &[mpsc::Sender<()>],
    reported: &mpsc::Receiver<Report>,
    generations: usize,
    dim: Dim,
    rows: usize,
    observer: &mut Option<&mut dyn FnMut(usize, &Lattice)>,
) -> Result<()> {
    for generation in 0..generations {
        let mut strips = vec![Vec::new(); proceeds.len()];
        for _ in 0..proceeds.len() {
            match reported.recv() {
                Ok(Report::Stepped { rank, strip }) => {
                    if let Some(strip) = strip {
                        strips[rank] = strip;
                    }
                }
                Ok(Report::Failed(err)) => return Err(err),
                Err(_) => return Err(Error::communication(0, "every worker hung up")),
            }
        }

        if let Some(observer) = observer.as_mut() {
            let lattice = assemble(dim, rows, strips.iter().map(Vec::as_slice))?;
            debug!(generation = generation + 1, fingerprint = lattice.fingerprint(), "gathered");
            observer(generation + 1, &lattice);
        } else {
            debug!(generation = generation + 1, "generation complete");
        }

        for proceed in proceeds {
            // a worker that already quit shows up as a failure report next round
            let _ = proceed.send(());
        }
    }
    Ok(())
}

/// owns the global lattice between distribution and collection.
#[derive(Debug, Clone)]
pub struct Coordinator {
    workers: usize,
}

impl Coordinator {
    pub fn new(workers: usize) -> Self {
        Self { workers }
    }

    pub fn simulate(
        &self,
        lattice: &Lattice,
        table: &TransitionTable,
        generations: usize,
    ) -> Result<Lattice> {
        self.simulate_observed(lattice, table, generations, None)
    }

    /// distributes, runs and collects. `observer` sees the initial lattice as
    /// generation 0 and then every gathered generation.
    pub fn simulate_observed(
        &self,
        lattice: &Lattice,
        table: &TransitionTable,
        generations: usize,
        mut observer: Option<&mut dyn FnMut(usize, &Lattice)>,
    ) -> Result<Lattice> {
        let partitions = distribute(lattice, self.workers)?;
        if let Some(observer) = observer.as_mut() {
            observer(0, lattice);
        }
        let partitions = run(partitions, table, generations, observer)?;
        let result = collect(partitions)?;
        info!(
            generations,
            fingerprint = result.fingerprint(),
            "run collected"
        );
        Ok(result)
    }
}

/// single-process reference run, same observer contract as the coordinator.
pub fn evolve_sequential(
    lattice: &Lattice,
    table: &TransitionTable,
    generations: usize,
    mut observer: Option<&mut dyn FnMut(usize, &Lattice)>,
) -> Result<Lattice> {
    let mut current = lattice.clone();
    if let Some(observer) = observer.as_mut() {
        observer(0, &current);
    }
    for generation in 0..generations {
        current = current.evolve(table)?;
        if let Some(observer) = observer.as_mut() {
            observer(generation + 1, &current);
        }
    }
    info!(generations, fingerprint = current.fingerprint(), "sequential run done");
    Ok(current)
}
