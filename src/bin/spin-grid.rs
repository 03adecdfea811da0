extern crate spingrid;

use auto_args::AutoArgs;

use std::io::{self, BufRead};
use std::sync::mpsc;
use std::thread;

use spingrid::driver::{Command, Driver, DriverParams};
use spingrid::mc::metropolis::{Metropolis, MetropolisParams};
use spingrid::mc::plugin::{MovieFormat, MovieParams, ReportParams};
use spingrid::render::TextRenderer;
use spingrid::system::ising::IsingParams;

/// Animate a long-range Ising grid in the terminal.  Type r to
/// regenerate, e to switch between spins and energies, q to quit, and
/// an empty line to pause.
#[derive(AutoArgs, Debug)]
struct Params {
    _sys: IsingParams,
    _mc: MetropolisParams,
    _driver: DriverParams,
    _report: ReportParams,
    _movie: MovieParams,
}

fn main() {
    env_logger::init();
    let params = Params::from_args();
    println!("git version: {}", spingrid::VERSION);

    if let Some(ref path) = params._movie.movie {
        if MovieFormat::from_path(path).is_none() {
            eprintln!("error: movie {:?} must end in .yaml, .json or .cbor", path);
            std::process::exit(1);
        }
    }

    let mc = match Metropolis::from_params(params._sys, params._mc) {
        Ok(mc) => mc,
        Err(e) => {
            eprintln!("error: {}", e);
            std::process::exit(1);
        }
    };
    let mut driver = Driver::new(mc, params._driver, params._report, params._movie);

    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let line = match line {
                Ok(l) => l,
                Err(_) => return,
            };
            for cmd in Command::parse_line(&line) {
                if tx.send(cmd).is_err() {
                    return;
                }
            }
        }
    });

    let mut renderer = TextRenderer::terminal(io::stdout());
    if let Err(e) = driver.run(&rx, &mut renderer) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}
