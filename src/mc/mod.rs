//! Monte Carlo algorithms for the spin grid.

pub mod metropolis;
pub mod plugin;

use crate::system::ising::LongRangeIsing;

/// A Monte Carlo algorithm.
pub trait MonteCarlo {
    /// The result of a single move.
    type Move;

    /// Make one random move.
    fn move_once(&mut self) -> Self::Move;

    /// The system being simulated.
    fn system(&self) -> &LongRangeIsing;

    /// The number of moves that have been made.
    fn num_moves(&self) -> u64;

    /// The number of accepted moves.
    fn num_accepted_moves(&self) -> u64;

    /// The fraction of moves accepted so far.
    fn acceptance_rate(&self) -> f64 {
        let moves = self.num_moves();
        if moves == 0 {
            0.0
        } else {
            self.num_accepted_moves() as f64 / moves as f64
        }
    }
}
