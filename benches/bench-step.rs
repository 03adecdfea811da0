#[macro_use]
extern crate criterion;

use criterion::Criterion;
use rand::SeedableRng;

use spingrid::mc::metropolis::Metropolis;
use spingrid::rng::MyRng;
use spingrid::system::ising::{IsingParams, LongRangeIsing};

fn gen_mc(n: usize) -> Metropolis {
    let mut mc = Metropolis::new(n, 8.8787, 2.6, MyRng::seed_from_u64(1)).unwrap();
    // Randomize things a bit before beginning.
    for _ in 0..n * n {
        mc.step();
    }
    mc
}

fn criterion_benchmark(c: &mut Criterion) {
    for &n in &[4, 8, 16, 32] {
        let mut mc = gen_mc(n);
        c.bench_function(&format!("metropolis_step_{}", n), move |b| b.iter(|| mc.step()));
    }

    for &n in &[8, 16, 32] {
        let mut rng = MyRng::seed_from_u64(2);
        let ising = LongRangeIsing::from_params(
            &IsingParams {
                n,
                distance_exponent: None,
            },
            &mut rng,
        )
        .unwrap();
        c.bench_function(&format!("flip_energy_change_{}", n), move |b| {
            b.iter(|| ising.flip_energy_change(n / 2, n / 3).unwrap())
        });
    }
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
