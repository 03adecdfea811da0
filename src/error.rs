//! Errors raised while building or querying a spin grid.

use thiserror::Error;

/// Things that can go wrong when configuring or querying a simulation.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    /// The parameters describe a lattice we refuse to build.
    #[error("invalid configuration: {0}")]
    Config(String),
    /// A site coordinate lies outside `[0, n)`.
    #[error("site ({i}, {j}) is outside a grid of width {n}")]
    OutOfRange {
        /// The row requested.
        i: usize,
        /// The column requested.
        j: usize,
        /// The width of the grid.
        n: usize,
    },
}
