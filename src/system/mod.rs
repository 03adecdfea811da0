//! Systems are things that have energy and can be changed into
//! different configurations.

pub mod ising;
pub mod torus;

/// An energy, in units where the coupling at unit distance is one.
pub type Energy = f64;

/// The Boltzmann constant, in the same units.
pub const K_B: f64 = 1.0;

/// A physical system, which has some energy.
pub trait System {
    /// Returns the energy of the system, from whatever caches it keeps.
    fn energy(&self) -> Energy;
    /// Recomputes the energy of the system from scratch.
    fn compute_energy(&self) -> Energy;
}
