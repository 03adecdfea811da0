//! The Ising model with long-range couplings on a torus.
//!
//! Every pair of distinct sites interacts with strength `J(d) = d^-p`,
//! so the local field at a site sums over the whole grid.  We keep a
//! cache holding, for each site `i`, the value
//! `-s_i * Σ_{j≠i} s_j J(d_ij)`, which is what gets shaded when the grid
//! is drawn in energy mode.

use super::torus::{Site, Torus};
use super::*;
use crate::error::Error;
use crate::rng::Draws;

use auto_args::AutoArgs;

/// The exponent used when none is given.
pub const DEFAULT_DISTANCE_EXPONENT: f64 = 2.6;

/// The parameters needed to configure a long-range Ising model.
///
/// These parameters are normally set via command-line arguments.
#[derive(Serialize, Deserialize, Debug, Clone, AutoArgs)]
pub struct IsingParams {
    /// Width of the square grid
    pub n: usize,
    /// Exponent p in the coupling J(d) = d^-p [default 2.6]
    pub distance_exponent: Option<f64>,
}

impl Default for IsingParams {
    fn default() -> Self {
        IsingParams {
            n: 16,
            distance_exponent: None,
        }
    }
}

impl IsingParams {
    /// Checks the parameters, returning the torus they describe.
    pub fn torus(&self) -> Result<Torus, Error> {
        let p = self.distance_exponent.unwrap_or(DEFAULT_DISTANCE_EXPONENT);
        if self.n == 0 {
            return Err(Error::Config("grid width must be at least 1".to_string()));
        }
        if !p.is_finite() || p <= 0.0 {
            return Err(Error::Config(format!(
                "distance exponent must be a positive number, not {}",
                p
            )));
        }
        Ok(Torus::new(self.n, p))
    }
}

#[allow(non_snake_case)]
/// A long-range Ising model.
#[derive(Debug, Clone)]
pub struct LongRangeIsing {
    torus: Torus,
    /// The spins themselves
    S: Vec<i8>,
    /// The per-site delta energy
    dE: Vec<Energy>,
    /// The flip we proposed (and might want to confirm).
    possible_change: Option<Site>,
}

impl LongRangeIsing {
    /// A grid with every spin drawn from a fair coin.
    pub fn from_params<R: Draws>(params: &IsingParams, rng: &mut R) -> Result<Self, Error> {
        let torus = params.torus()?;
        let mut ising = LongRangeIsing {
            S: vec![1; torus.num_sites()],
            dE: vec![0.0; torus.num_sites()],
            torus,
            possible_change: None,
        };
        ising.randomize(rng);
        Ok(ising)
    }

    /// A grid with the given spins, stored row by row.
    pub fn from_spins(params: &IsingParams, spins: Vec<i8>) -> Result<Self, Error> {
        let torus = params.torus()?;
        if spins.len() != torus.num_sites() {
            return Err(Error::Config(format!(
                "expected {} spins for a grid of width {}, got {}",
                torus.num_sites(),
                torus.n(),
                spins.len()
            )));
        }
        if let Some(bad) = spins.iter().find(|&&s| s != 1 && s != -1) {
            return Err(Error::Config(format!("spins must be +1 or -1, not {}", bad)));
        }
        let mut ising = LongRangeIsing {
            dE: vec![0.0; spins.len()],
            S: spins,
            torus,
            possible_change: None,
        };
        ising.update_caches();
        Ok(ising)
    }

    /// Draw a fresh spin for every site, and rebuild the cache.
    pub fn randomize<R: Draws>(&mut self, rng: &mut R) {
        for s in self.S.iter_mut() {
            *s = rng.spin();
        }
        self.possible_change = None;
        self.update_caches();
    }

    /// The geometry of the grid.
    pub fn torus(&self) -> &Torus {
        &self.torus
    }

    /// The width of the grid.
    pub fn n(&self) -> usize {
        self.torus.n()
    }

    /// The spins, row by row.
    pub fn spins(&self) -> &[i8] {
        &self.S
    }

    /// The cached delta energies, row by row.
    pub fn delta_energies(&self) -> &[Energy] {
        &self.dE
    }

    /// The spin at a site.
    pub fn spin(&self, s: Site) -> i8 {
        self.S[self.torus.index(s)]
    }

    /// `Σ_{k≠s} s_k J(d_sk)`, the field the rest of the grid exerts on
    /// site `s`.
    pub fn local_field(&self, s: Site) -> f64 {
        let mut field = 0.0;
        for (idx, other) in self.torus.sites().enumerate() {
            if other == s {
                continue;
            }
            field += self.S[idx] as f64 * self.torus.coupling(s, other);
        }
        field
    }

    /// The delta energy of site `s` computed from scratch.
    pub fn site_delta_energy(&self, s: Site) -> Energy {
        -(self.spin(s) as f64) * self.local_field(s)
    }

    /// The whole delta-energy grid computed from scratch, without
    /// touching the cache.
    pub fn compute_delta_energies(&self) -> Vec<Energy> {
        self.torus.sites().map(|s| self.site_delta_energy(s)).collect()
    }

    /// Recompute the delta energy of every site.
    pub fn update_caches(&mut self) {
        self.dE = self.compute_delta_energies();
    }

    /// The change in energy if the spin at `(i, j)` were flipped.
    ///
    /// This sums over every other site on the grid, so it costs
    /// `O(n²)`.  Nothing is modified.
    pub fn flip_energy_change(&self, i: usize, j: usize) -> Result<Energy, Error> {
        let s = self.torus.site(i, j)?;
        Ok(2.0 * self.spin(s) as f64 * self.local_field(s))
    }

    /// Pick a site uniformly at random and return it along with the
    /// energy change of flipping it.  The flip only happens if
    /// [`confirm`](Self::confirm) is called next.
    pub fn plan_flip<R: Draws>(&mut self, rng: &mut R) -> (Site, Energy) {
        let i = rng.index(self.n());
        let j = rng.index(self.n());
        let s = Site::new(i, j);
        self.possible_change = Some(s);
        (s, 2.0 * self.spin(s) as f64 * self.local_field(s))
    }

    /// Carry out the planned flip, and refresh the delta energy of every
    /// site, since all of them feel the flipped spin.
    pub fn confirm(&mut self) {
        if let Some(s) = self.possible_change.take() {
            let idx = self.torus.index(s);
            self.S[idx] *= -1;
            self.update_caches();
        }
    }

    /// The mean spin.
    pub fn magnetization(&self) -> f64 {
        let total: i64 = self.S.iter().map(|&s| s as i64).sum();
        total as f64 / self.S.len() as f64
    }
}

impl System for LongRangeIsing {
    fn energy(&self) -> Energy {
        // each pair shows up in the cache of both its sites
        0.5 * self.dE.iter().sum::<f64>()
    }
    fn compute_energy(&self) -> Energy {
        let mut e = 0.0;
        let sites: Vec<Site> = self.torus.sites().collect();
        for (a, &sa) in sites.iter().enumerate() {
            for &sb in &sites[a + 1..] {
                e -= (self.spin(sa) * self.spin(sb)) as f64 * self.torus.coupling(sa, sb);
            }
        }
        e
    }
}
