extern crate spingrid;

use rand::SeedableRng;

use spingrid::mc::metropolis::{Flip, Metropolis, MetropolisParams};
use spingrid::mc::MonteCarlo;
use spingrid::rng::{MyRng, Scripted};
use spingrid::system::ising::{IsingParams, LongRangeIsing};
use spingrid::system::torus::Site;
use spingrid::system::System;
use spingrid::Error;

fn assert_cache_consistent<R: spingrid::rng::Draws>(mc: &Metropolis<R>) {
    let fresh = mc.system().compute_delta_energies();
    let cached = mc.state().delta_energy;
    assert_eq!(fresh.len(), cached.len());
    for (a, b) in fresh.iter().zip(cached.iter()) {
        assert!((a - b).abs() <= 1e-9 * (1.0 + a.abs()), "{} != {}", a, b);
    }
}

#[test]
fn spins_stay_plus_or_minus_one() {
    for &n in &[1, 2, 3, 5, 8] {
        let mut mc = Metropolis::new(n, 1.5, 2.6, MyRng::seed_from_u64(n as u64)).unwrap();
        for _ in 0..300 {
            mc.step();
            assert!(mc.state().spins.iter().all(|&s| s == 1 || s == -1));
        }
    }
}

#[test]
fn cache_matches_after_every_step() {
    let mut mc = Metropolis::new(6, 3.0, 2.6, MyRng::seed_from_u64(2024)).unwrap();
    assert_cache_consistent(&mc);
    let mut seen_accept = false;
    let mut seen_reject = false;
    for _ in 0..400 {
        let flip = mc.step();
        seen_accept |= flip.accepted;
        seen_reject |= !flip.accepted;
        assert_cache_consistent(&mc);
    }
    assert!(seen_accept && seen_reject);
    assert!((mc.energy() - mc.system().compute_energy()).abs() < 1e-9);
}

#[test]
fn same_script_same_trajectory() {
    let n = 5;
    let mut script = Scripted::new(Vec::new());
    let mut seed = MyRng::seed_from_u64(99);
    let spins: Vec<i8> = (0..n * n)
        .map(|_| if spingrid::rng::Draws::uniform(&mut seed) < 0.5 { 1 } else { -1 })
        .collect();
    script.push_spins(&spins);
    for k in 0..60 {
        script.push_step(n, (7 * k) % n, (3 * k + 1) % n, ((k * 37) % 100) as f64 / 100.0);
    }
    let run = |script: Scripted| -> (Vec<Flip>, Vec<i8>) {
        let mut mc = Metropolis::new(n, 2.0, 2.6, script).unwrap();
        let flips = (0..60).map(|_| mc.step()).collect();
        (flips, mc.state().spins.to_vec())
    };
    let (flips_a, end_a) = run(script.clone());
    let (flips_b, end_b) = run(script);
    assert_eq!(flips_a, flips_b);
    assert_eq!(end_a, end_b);
    for (k, flip) in flips_a.iter().enumerate() {
        assert_eq!(flip.site, Site::new((7 * k) % n, (3 * k + 1) % n));
    }
}

#[test]
fn returned_flip_is_consistent() {
    let mut mc = Metropolis::new(4, 0.5, 2.6, MyRng::seed_from_u64(5)).unwrap();
    for _ in 0..200 {
        let before = mc.state().spins.to_vec();
        let Flip { site, spin, accepted, delta_e, acceptance_probability } = mc.step();
        assert!(acceptance_probability >= 0.0 && acceptance_probability <= 1.0);
        if delta_e <= 0.0 {
            assert_eq!(acceptance_probability, 1.0);
        }
        let idx = site.i * 4 + site.j;
        assert_eq!(spin, mc.state().spins[idx]);
        if accepted {
            assert_eq!(spin, -before[idx]);
        } else {
            assert_eq!(mc.state().spins, &before[..]);
        }
    }
}

#[test]
fn downhill_scenario_on_four_by_four() {
    // Site (2,1) points down in an otherwise aligned grid, so flipping
    // it lowers the energy and must be accepted for any u < 1.
    let mut spins = vec![1i8; 16];
    spins[2 * 4 + 1] = -1;
    let system = LongRangeIsing::from_spins(
        &IsingParams {
            n: 4,
            distance_exponent: Some(2.6),
        },
        spins,
    )
    .unwrap();
    let mut script = Scripted::new(Vec::new());
    script.push_step(4, 2, 1, 0.01);
    let mut mc = Metropolis::from_system(
        system,
        MetropolisParams {
            temperature: Some(1.0),
            seed: None,
        },
        script,
    )
    .unwrap();
    let old_cache = mc.state().delta_energy.to_vec();
    let flip = mc.step();
    assert_eq!(flip.site, Site::new(2, 1));
    assert!(flip.delta_e < 0.0);
    assert_eq!(flip.acceptance_probability, 1.0);
    assert!(flip.accepted);
    assert_eq!(mc.state().spin(2, 1), 1);
    assert!(mc.state().spins.iter().all(|&s| s == 1));
    assert_ne!(mc.state().delta_energy, &old_cache[..]);
    assert_cache_consistent(&mc);
}

#[test]
fn aligned_grid_costs_energy_to_flip() {
    let system = LongRangeIsing::from_spins(
        &IsingParams {
            n: 4,
            distance_exponent: Some(2.6),
        },
        vec![1; 16],
    )
    .unwrap();
    for i in 0..4 {
        for j in 0..4 {
            assert!(system.flip_energy_change(i, j).unwrap() > 0.0);
        }
    }
}

#[test]
fn reset_leaves_no_stale_cache() {
    let mut mc = Metropolis::new(5, 1.0, 2.6, MyRng::seed_from_u64(31)).unwrap();
    for _ in 0..100 {
        mc.step();
    }
    let before = mc.state().spins.to_vec();
    mc.reset();
    assert_eq!(mc.num_moves(), 0);
    assert!(mc.state().spins.iter().all(|&s| s == 1 || s == -1));
    // 25 fresh coin flips matching the old grid would be remarkable
    assert_ne!(mc.state().spins, &before[..]);
    assert_cache_consistent(&mc);
}

#[test]
fn out_of_range_is_an_error() {
    let mc = Metropolis::new(3, 1.0, 2.6, MyRng::seed_from_u64(0)).unwrap();
    assert_eq!(
        mc.flip_energy_change(3, 0),
        Err(Error::OutOfRange { i: 3, j: 0, n: 3 })
    );
    assert!(mc.flip_energy_change(2, 2).is_ok());
}

#[test]
fn energy_change_is_pure() {
    let mc = Metropolis::new(4, 1.0, 2.6, MyRng::seed_from_u64(12)).unwrap();
    let spins = mc.state().spins.to_vec();
    for i in 0..4 {
        for j in 0..4 {
            assert_eq!(mc.flip_energy_change(i, j), mc.flip_energy_change(i, j));
        }
    }
    assert_eq!(mc.state().spins, &spins[..]);
}
