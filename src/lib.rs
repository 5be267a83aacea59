//! a cellular automaton engine for 1D rings and 2D tori, stepping a lattice
//! split into equal strips across a ring of worker threads that trade
//! boundary columns every generation.

pub use utils::{wrap, Pos};
mod utils;

pub use error::{Error, Result};
mod error;

pub use lattice::{Cell, Dim, Lattice, Partition, Side};
mod lattice;

pub use table::{TableBuilder, TransitionTable};
mod table;

pub use halo::{ring, HaloMessage, RingLink};
mod halo;

pub use step::{neighborhood_pattern, step_partition};
mod step;

pub use sim::{collect, distribute, evolve_sequential, run, Coordinator};
mod sim;

pub use format::{parse_lattice, parse_table};
mod format;

pub use view::{Canvas, View, DEFAULT_FRAME_DELAY};
mod view;
