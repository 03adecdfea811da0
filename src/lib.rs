//! This crate is for Metropolis Monte Carlo on a spin grid.
//!
//! The grid is a square torus of `+1`/`-1` spins in which every pair of
//! sites interacts with strength `J(d) = d^-p`, `d` being the toroidal
//! distance between them.  A [`mc::metropolis::Metropolis`] simulator
//! owns the grid and advances it one proposed flip at a time; a
//! [`driver::Driver`] decides when to step and hands read-only state to
//! a [`render::Renderer`].

#![cfg_attr(feature = "strict", deny(warnings))]
#![deny(missing_docs)]

#[macro_use]
extern crate serde_derive;

pub mod driver;
pub mod error;
pub mod mc;
pub mod render;
pub mod rng;
pub mod system;

pub use crate::error::Error;

/// The git version this was built from.
pub const VERSION: &str = git_version::git_version!(args = ["--always", "--dirty"], fallback = "unknown");
