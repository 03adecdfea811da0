//! Random numbers for the simulation.
//!
//! Every random decision the simulator makes (the initial spins, which
//! site to try, and whether to accept) is drawn through the [`Draws`]
//! trait, so that a test can replace the generator with a [`Scripted`]
//! list of numbers and get a reproducible trajectory.

use rand::Rng;

/// Our random number generator.
pub type MyRng = rand_xoshiro::Xoshiro256PlusPlus;

/// A source of uniform random numbers in `[0, 1)`.
pub trait Draws {
    /// A uniform deviate in `[0, 1)`.
    fn uniform(&mut self) -> f64;

    /// A fair coin expressed as a spin.
    fn spin(&mut self) -> i8 {
        if self.uniform() < 0.5 {
            1
        } else {
            -1
        }
    }

    /// An index uniformly distributed in `0..n`.
    fn index(&mut self, n: usize) -> usize {
        let i = (self.uniform() * n as f64) as usize;
        // guard against a deviate that rounds up to exactly 1.0
        if i >= n {
            n - 1
        } else {
            i
        }
    }
}

impl Draws for MyRng {
    fn uniform(&mut self) -> f64 {
        self.gen::<f64>()
    }
}

/// A fixed sequence of uniform deviates, replayed in order.
///
/// Once the list is exhausted it starts over from the beginning.
#[derive(Debug, Clone)]
pub struct Scripted {
    values: Vec<f64>,
    next: usize,
}

impl Scripted {
    /// Replay `values`.  An empty list behaves like a generator that
    /// always returns zero.
    pub fn new(values: Vec<f64>) -> Self {
        Scripted { values, next: 0 }
    }

    /// Append the three draws one Metropolis step consumes on an
    /// `n`-wide grid: the row, the column, and the acceptance deviate
    /// `u`.
    pub fn push_step(&mut self, n: usize, i: usize, j: usize, u: f64) {
        self.values.push((i as f64 + 0.5) / n as f64);
        self.values.push((j as f64 + 0.5) / n as f64);
        self.values.push(u);
    }

    /// Append one draw per site that yields exactly `spins` when the
    /// grid is randomized.
    pub fn push_spins(&mut self, spins: &[i8]) {
        for &s in spins {
            self.values.push(if s > 0 { 0.25 } else { 0.75 });
        }
    }
}

impl Draws for Scripted {
    fn uniform(&mut self) -> f64 {
        if self.values.is_empty() {
            return 0.0;
        }
        let v = self.values[self.next % self.values.len()];
        self.next += 1;
        v
    }
}
