use std::{
    io::{stdout, Write},
    thread,
    time::Duration,
};

use tracing::warn;

use crate::Lattice;

pub use canvas::Canvas;
mod canvas;

pub const DEFAULT_FRAME_DELAY: Duration = Duration::from_millis(100);

/// draws generations as they arrive. purely observational, a failed draw is
/// logged and the run goes on.
pub struct View<W: Write> {
    out: W,
    delay: Duration,
}

impl View<std::io::Stdout> {
    pub fn terminal(delay: Duration) -> Self {
        Self::new(stdout(), delay)
    }
}

impl<W: Write> View<W> {
    pub fn new(out: W, delay: Duration) -> Self {
        Self { out, delay }
    }

    pub fn observe(&mut self, generation: usize, lattice: &Lattice) {
        if generation > 0 && !self.delay.is_zero() {
            thread::sleep(self.delay);
        }
        if let Err(err) = Canvas::from_lattice(lattice).display(&mut self.out) {
            warn!(generation, %err, "could not draw generation");
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}
