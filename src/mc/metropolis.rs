//! Single-spin-flip Metropolis Monte Carlo.
//!
//! Each step picks a site uniformly at random, computes the energy
//! change `ΔE` of flipping it, and accepts the flip with probability
//! `min(1, exp(-ΔE/kT))`.  Steps form a Markov chain: each one depends
//! on the state the previous one left behind, which is why
//! [`Metropolis::step`] needs exclusive (`&mut`) access.

use super::*;
use crate::error::Error;
use crate::rng::{Draws, MyRng};
use crate::system::ising::{IsingParams, LongRangeIsing};
use crate::system::torus::Site;
use crate::system::{Energy, System, K_B};

use auto_args::AutoArgs;
use rand::SeedableRng;

/// The temperature used when none is given.
pub const DEFAULT_TEMPERATURE: f64 = 8.8787;

/// The parameters needed to configure a simulation.
#[derive(Serialize, Deserialize, Debug, Clone, AutoArgs)]
pub struct MetropolisParams {
    /// The temperature kT [default 8.8787]
    pub temperature: Option<f64>,
    /// The seed for the random number generator.
    pub seed: Option<u64>,
}

impl Default for MetropolisParams {
    fn default() -> Self {
        MetropolisParams {
            temperature: None,
            seed: None,
        }
    }
}

/// What happened on one step.  This is returned whether or not the
/// flip was accepted.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct Flip {
    /// The site we tried to flip.
    pub site: Site,
    /// The spin at that site after the step.
    pub spin: i8,
    /// Whether the flip happened.
    pub accepted: bool,
    /// The energy change the flip would cause.
    pub delta_e: Energy,
    /// The probability with which we accepted it.
    pub acceptance_probability: f64,
}

/// The Metropolis acceptance probability `min(1, exp(-ΔE/(kB T)))`.
pub fn acceptance_probability(delta_e: Energy, temperature: f64) -> f64 {
    if delta_e <= 0.0 {
        1.0
    } else {
        (-delta_e / (K_B * temperature)).exp().min(1.0)
    }
}

/// A read-only view of the grid, for renderers.
#[derive(Debug, Clone, Copy)]
pub struct State<'a> {
    /// The width of the grid.
    pub n: usize,
    /// The spins, row by row.
    pub spins: &'a [i8],
    /// The delta energy of each site, row by row.
    pub delta_energy: &'a [Energy],
}

impl<'a> State<'a> {
    /// The spin at row `i`, column `j`.
    pub fn spin(&self, i: usize, j: usize) -> i8 {
        self.spins[i * self.n + j]
    }
    /// The delta energy at row `i`, column `j`.
    pub fn delta_energy(&self, i: usize, j: usize) -> Energy {
        self.delta_energy[i * self.n + j]
    }
}

/// A Metropolis simulation of a long-range Ising grid.
#[derive(Debug, Clone)]
pub struct Metropolis<R = MyRng> {
    /// The system we are simulating.
    system: LongRangeIsing,
    /// kT
    temperature: f64,
    /// The random number source.
    rng: R,
    /// The number of moves that have been made.
    moves: u64,
    /// The number of moves that have been accepted.
    accepted_moves: u64,
}

impl Metropolis<MyRng> {
    /// Build a simulation seeded from the parameters.
    pub fn from_params(sys: IsingParams, params: MetropolisParams) -> Result<Self, Error> {
        let rng = MyRng::seed_from_u64(params.seed.unwrap_or(0));
        Self::with_rng(sys, params, rng)
    }
}

impl<R: Draws> Metropolis<R> {
    /// Build a simulation of an `n`-wide grid at temperature `T` with
    /// distance exponent `p`, drawing random numbers from `rng`.
    #[allow(non_snake_case)]
    pub fn new(n: usize, T: f64, p: f64, rng: R) -> Result<Self, Error> {
        Self::with_rng(
            IsingParams {
                n,
                distance_exponent: Some(p),
            },
            MetropolisParams {
                temperature: Some(T),
                seed: None,
            },
            rng,
        )
    }

    /// Build a simulation, drawing random numbers from `rng`.  The
    /// `seed` in `params` is ignored.
    pub fn with_rng(sys: IsingParams, params: MetropolisParams, mut rng: R) -> Result<Self, Error> {
        let temperature = validate_temperature(&params)?;
        let system = LongRangeIsing::from_params(&sys, &mut rng)?;
        log::debug!(
            "{}x{} grid at T = {}, p = {}",
            system.n(),
            system.n(),
            temperature,
            system.torus().distance_exponent()
        );
        Ok(Metropolis {
            system,
            temperature,
            rng,
            moves: 0,
            accepted_moves: 0,
        })
    }

    /// Simulate an existing system.
    pub fn from_system(system: LongRangeIsing, params: MetropolisParams, rng: R) -> Result<Self, Error> {
        let temperature = validate_temperature(&params)?;
        Ok(Metropolis {
            system,
            temperature,
            rng,
            moves: 0,
            accepted_moves: 0,
        })
    }

    /// The temperature kT.
    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    /// The energy change if the spin at `(i, j)` were flipped.
    pub fn flip_energy_change(&self, i: usize, j: usize) -> Result<Energy, Error> {
        self.system.flip_energy_change(i, j)
    }

    /// One Metropolis update.
    ///
    /// Either the flip and the full refresh of the delta-energy cache
    /// both happen, or nothing changes.
    pub fn step(&mut self) -> Flip {
        self.moves += 1;
        let (site, delta_e) = self.system.plan_flip(&mut self.rng);
        let acceptance_probability = acceptance_probability(delta_e, self.temperature);
        let u = self.rng.uniform();
        log::trace!(
            "p = {:.4}, ΔE = {:.4} at ({}, {})",
            acceptance_probability,
            delta_e,
            site.i,
            site.j
        );
        let accepted = u < acceptance_probability;
        if accepted {
            self.system.confirm();
            self.accepted_moves += 1;
        }
        Flip {
            site,
            spin: self.system.spin(site),
            accepted,
            delta_e,
            acceptance_probability,
        }
    }

    /// Start over with a freshly randomized grid, as if newly built.
    pub fn reset(&mut self) {
        self.system.randomize(&mut self.rng);
        self.moves = 0;
        self.accepted_moves = 0;
        log::debug!(
            "reset {}x{} grid, magnetization {:.3}",
            self.system.n(),
            self.system.n(),
            self.system.magnetization()
        );
    }

    /// The current spins and delta energies.
    pub fn state(&self) -> State<'_> {
        State {
            n: self.system.n(),
            spins: self.system.spins(),
            delta_energy: self.system.delta_energies(),
        }
    }

    /// The total energy of the grid.
    pub fn energy(&self) -> Energy {
        self.system.energy()
    }
}

impl<R: Draws> MonteCarlo for Metropolis<R> {
    type Move = Flip;
    fn move_once(&mut self) -> Flip {
        self.step()
    }
    fn system(&self) -> &LongRangeIsing {
        &self.system
    }
    fn num_moves(&self) -> u64 {
        self.moves
    }
    fn num_accepted_moves(&self) -> u64 {
        self.accepted_moves
    }
}

fn validate_temperature(params: &MetropolisParams) -> Result<f64, Error> {
    let t = params.temperature.unwrap_or(DEFAULT_TEMPERATURE);
    if t.is_finite() && t > 0.0 {
        Ok(t)
    } else {
        Err(Error::Config(format!("temperature must be a positive number, not {}", t)))
    }
}
