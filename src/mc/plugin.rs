//! A plugin architecture to enable reusing of interfaces and
//! implementation around a Monte Carlo simulation.

use super::*;
use crate::mc::metropolis::State;
use crate::render::Frame;
use crate::system::System;

use auto_args::AutoArgs;
use std::cell::{Cell, RefCell};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time;

/// A `Plugin` is an object that can be used to configure a MonteCarlo
/// simulation.  The plugin will be called regularly, and will have a
/// chance to save data and/or terminate the simulation.
pub trait Plugin<MC: MonteCarlo> {
    /// Run and do something.  If you want to modify information, you
    /// will have to use interior mutability, since the `MC` is only
    /// lent to us.
    fn run(&self, _mc: &MC) -> Action {
        Action::None
    }
    /// How often we need the plugin to run.  This is an upper, not a
    /// lower bound, and is asked again after every run.
    fn run_period(&self) -> TimeToRun {
        TimeToRun::Never
    }
    /// Save whatever we have collected.  This is called in response to
    /// `Action::Save` and `Action::Exit`.
    fn save(&self, _mc: &MC) {}
    /// Print anything interesting.  This is called in response to
    /// `Action::Log`, `Action::Save` and `Action::Exit`.
    fn log(&self, _mc: &MC) {}
    /// The simulation has started over from move zero.
    fn restart(&self) {}
}

/// A time when we want to be run.
#[derive(Serialize, Deserialize, Copy, Clone, Debug, PartialOrd, Ord, PartialEq, Eq)]
pub enum TimeToRun {
    /// Don't stop on our behalf!
    Never,
    /// After this many moves in total.
    TotalMoves(u64),
    /// This often.
    Period(u64),
}

/// An action that should be taken based on this plugin's decision.
#[derive(Copy, Clone, Debug, PartialOrd, Ord, PartialEq, Eq)]
pub enum Action {
    /// Nothing special need be done.
    None,
    /// Log interesting information.
    Log,
    /// Save things.
    Save,
    /// Stop the simulation.
    Exit,
}
impl Action {
    /// Do both of two actions.
    pub fn and(self, other: Action) -> Action {
        ::std::cmp::max(self, other)
    }
}

/// Runs a set of plugins no more often than they ask to be run.
#[derive(Debug)]
pub struct PluginManager {
    period: Cell<u64>,
    moves: Cell<u64>,
}

impl Default for PluginManager {
    fn default() -> Self {
        PluginManager::new()
    }
}

impl PluginManager {
    /// Create a plugin manager.
    pub fn new() -> PluginManager {
        PluginManager {
            period: Cell::new(1),
            moves: Cell::new(0),
        }
    }
    /// Run all the plugins, if needed, and return what they want done.
    /// This should always be called with the same set of plugins.
    pub fn run<MC: MonteCarlo>(&self, mc: &MC, plugins: &[&dyn Plugin<MC>]) -> Action {
        let moves = self.moves.get() + 1;
        self.moves.set(moves);
        if moves < self.period.get() {
            return Action::None;
        }
        self.moves.set(0);
        let mut todo = Action::None;
        for p in plugins.iter() {
            todo = todo.and(p.run(mc));
        }
        if todo >= Action::Log {
            for p in plugins.iter() {
                p.log(mc);
            }
        }
        if todo >= Action::Save {
            for p in plugins.iter() {
                p.save(mc);
            }
        }
        // check in at least every trillion moves
        let mut new_period = 1u64 << 40;
        for p in plugins.iter() {
            match p.run_period() {
                TimeToRun::Never => (),
                TimeToRun::TotalMoves(moves) => {
                    if moves > mc.num_moves() && moves - mc.num_moves() < new_period {
                        new_period = moves - mc.num_moves();
                    }
                }
                TimeToRun::Period(period) => {
                    if period < new_period {
                        new_period = period;
                    }
                }
            }
        }
        self.period.set(new_period);
        todo
    }
    /// Forget where we were, and tell the plugins that the move count
    /// starts over.
    pub fn restart<MC: MonteCarlo>(&self, plugins: &[&dyn Plugin<MC>]) {
        self.period.set(1);
        self.moves.set(0);
        for p in plugins.iter() {
            p.restart();
        }
    }
}

/// A plugin that prints progress and stops after a fixed number of
/// moves.
///
/// The manager asks every plugin to log whenever any of them saves, so
/// a report only prints when its own schedule said it was due.
#[derive(Debug, Clone)]
pub struct Report {
    max_iter: TimeToRun,
    report_every: Option<u64>,
    next_report: Cell<u64>,
    log_due: Cell<bool>,
    exiting: Cell<bool>,
    num_reports: Cell<u64>,
    /// This is when and where the simulation started.
    start: Cell<(time::Instant, u64)>,
    /// The user has requested that nothing be printed!
    pub quiet: bool,
}

/// The parameters to define the report information as well as stop
/// time (which is part of the report).
#[derive(Serialize, Deserialize, AutoArgs, Debug, Clone)]
pub struct ReportParams {
    /// The maximum number of iterations to run.
    pub max_iter: Option<u64>,
    /// Print a progress line this often (in moves).
    pub report_every: Option<u64>,
    /// Do not make reports!
    pub quiet: bool,
}

impl Default for ReportParams {
    fn default() -> Self {
        ReportParams {
            max_iter: None,
            report_every: None,
            quiet: true,
        }
    }
}

impl From<ReportParams> for Report {
    fn from(params: ReportParams) -> Self {
        let report_every = params.report_every.filter(|&e| e > 0);
        Report {
            max_iter: if let Some(mi) = params.max_iter {
                TimeToRun::TotalMoves(mi)
            } else {
                TimeToRun::Never
            },
            next_report: Cell::new(report_every.unwrap_or(0)),
            report_every,
            log_due: Cell::new(false),
            exiting: Cell::new(false),
            num_reports: Cell::new(0),
            start: Cell::new((time::Instant::now(), 0)),
            quiet: params.quiet,
        }
    }
}

impl Report {
    /// The progress line for the current state of `mc`.
    pub fn progress<MC: MonteCarlo>(&self, mc: &MC) -> String {
        let sys = mc.system();
        format!(
            "[{}] accepted {:.1}%  magnetization {:+.3}  energy {:.4}",
            mc.num_moves(),
            100.0 * mc.acceptance_rate(),
            sys.magnetization(),
            sys.energy()
        )
    }

    /// How many progress reports have been made since the start.
    pub fn num_reports(&self) -> u64 {
        self.num_reports.get()
    }

    /// Report progress now, whatever the schedule says.
    pub fn print_progress<MC: MonteCarlo>(&self, mc: &MC) {
        self.num_reports.set(self.num_reports.get() + 1);
        if self.quiet {
            return;
        }
        let (start_time, start_iter) = self.start.get();
        let moves = mc.num_moves();
        let elapsed = start_time.elapsed();
        let per_move = if moves > start_iter {
            duration_to_secs(elapsed) / (moves - start_iter) as f64
        } else {
            0.0
        };
        println!("{} ({:.1}us per move)", self.progress(mc), per_move * 1e6);
    }

    /// Print how many moves were accepted.
    pub fn print_summary<MC: MonteCarlo>(&self, mc: &MC) {
        let moves = mc.num_moves();
        if self.quiet || moves == 0 {
            return;
        }
        println!(
            "        Accepted {}/{} = {:.0}% of the moves",
            mc.num_accepted_moves(),
            moves,
            100.0 * mc.acceptance_rate()
        );
    }
}

impl<MC: MonteCarlo> Plugin<MC> for Report {
    fn run(&self, mc: &MC) -> Action {
        let moves = mc.num_moves();
        if let TimeToRun::TotalMoves(maxiter) = self.max_iter {
            if moves >= maxiter {
                self.log_due.set(true);
                self.exiting.set(true);
                return Action::Exit;
            }
        }
        if let Some(every) = self.report_every {
            if moves >= self.next_report.get() {
                self.next_report.set(moves + every);
                self.log_due.set(true);
                return Action::Log;
            }
        }
        Action::None
    }
    fn run_period(&self) -> TimeToRun {
        match (self.report_every, self.max_iter) {
            (Some(_), TimeToRun::TotalMoves(max)) => {
                TimeToRun::TotalMoves(::std::cmp::min(max, self.next_report.get()))
            }
            (Some(_), _) => TimeToRun::TotalMoves(self.next_report.get()),
            (None, t) => t,
        }
    }
    fn log(&self, mc: &MC) {
        if self.log_due.replace(false) {
            self.print_progress(mc);
        }
    }
    fn save(&self, mc: &MC) {
        if self.exiting.get() {
            self.print_summary(mc);
        }
    }
    fn restart(&self) {
        self.next_report.set(self.report_every.unwrap_or(0));
        self.log_due.set(false);
        self.exiting.set(false);
        self.num_reports.set(0);
        self.start.set((time::Instant::now(), 0));
    }
}

/// Do we want movies? Where?
#[derive(Serialize, Deserialize, AutoArgs, Debug, Clone)]
pub struct MovieParams {
    /// File to write frames to (.yaml, .json or .cbor).
    pub movie: Option<PathBuf>,
    /// Record a frame this often (in moves) [default 1000].
    pub movie_every: Option<u64>,
}

impl Default for MovieParams {
    fn default() -> Self {
        MovieParams {
            movie: None,
            movie_every: None,
        }
    }
}

/// How frames are laid out in a movie file.
///
/// Each frame is appended as it is recorded: one YAML document, one
/// line of JSON, or one CBOR item.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MovieFormat {
    /// `.yaml`
    Yaml,
    /// `.json`, one frame per line
    Json,
    /// `.cbor`
    Cbor,
}

impl MovieFormat {
    /// The format named by the extension of `path`.
    pub fn from_path(path: &Path) -> Option<MovieFormat> {
        match path.extension().and_then(|x| x.to_str()) {
            Some("yaml") => Some(MovieFormat::Yaml),
            Some("json") => Some(MovieFormat::Json),
            Some("cbor") => Some(MovieFormat::Cbor),
            _ => None,
        }
    }

    /// Append one frame to `w`.
    pub fn write_frame<W: Write>(self, w: &mut W, frame: &Frame) -> io::Result<()> {
        match self {
            MovieFormat::Yaml => {
                serde_yaml::to_writer(&mut *w, frame).map_err(other)?;
                w.write_all(b"\n")
            }
            MovieFormat::Json => {
                serde_json::to_writer(&mut *w, frame).map_err(other)?;
                w.write_all(b"\n")
            }
            MovieFormat::Cbor => serde_cbor::to_writer(&mut *w, frame).map_err(other),
        }
    }
}

fn other<E: std::error::Error + Send + Sync + 'static>(e: E) -> io::Error {
    io::Error::new(io::ErrorKind::Other, e)
}

/// A plugin that streams snapshots of the grid to a file for an
/// external renderer.  Nothing is kept in memory once a frame has been
/// written.
#[derive(Debug)]
pub struct Movie {
    target: Option<(PathBuf, MovieFormat)>,
    every: u64,
    next_frame: Cell<u64>,
    last_frame: Cell<Option<u64>>,
    frames_written: Cell<u64>,
    failed: Cell<bool>,
    out: RefCell<Option<BufWriter<File>>>,
}

impl From<MovieParams> for Movie {
    fn from(params: MovieParams) -> Self {
        let every = params.movie_every.filter(|&e| e > 0).unwrap_or(1000);
        let target = params.movie.and_then(|path| match MovieFormat::from_path(&path) {
            Some(format) => Some((path, format)),
            None => {
                log::error!("I don't know how to create movie {:?}", path);
                None
            }
        });
        Movie {
            target,
            every,
            next_frame: Cell::new(0),
            last_frame: Cell::new(None),
            frames_written: Cell::new(0),
            failed: Cell::new(false),
            out: RefCell::new(None),
        }
    }
}

impl Movie {
    /// How many frames have gone to the file.
    pub fn frames_written(&self) -> u64 {
        self.frames_written.get()
    }

    /// The move count of the most recent frame.
    pub fn last_frame(&self) -> Option<u64> {
        self.last_frame.get()
    }

    /// Append a frame of the current state, unless one was already
    /// taken at this move.
    pub fn record<MC: MonteCarlo>(&self, mc: &MC) {
        let (path, format) = match self.target {
            Some((ref path, format)) if !self.failed.get() => (path, format),
            _ => return,
        };
        let moves = mc.num_moves();
        if self.last_frame.get() == Some(moves) {
            return;
        }
        self.next_frame.set(moves + self.every);
        self.last_frame.set(Some(moves));
        let sys = mc.system();
        let state = State {
            n: sys.n(),
            spins: sys.spins(),
            delta_energy: sys.delta_energies(),
        };
        let frame = Frame::capture(moves, &state);
        if let Err(e) = self.append(path, format, &frame) {
            log::error!("error writing movie {:?}: {}", path, e);
            self.failed.set(true);
        }
    }

    fn append(&self, path: &Path, format: MovieFormat, frame: &Frame) -> io::Result<()> {
        let mut out = self.out.borrow_mut();
        let mut w = match out.take() {
            Some(w) => w,
            None => BufWriter::new(File::create(path)?),
        };
        format.write_frame(&mut w, frame)?;
        w.flush()?;
        *out = Some(w);
        self.frames_written.set(self.frames_written.get() + 1);
        Ok(())
    }
}

impl<MC: MonteCarlo> Plugin<MC> for Movie {
    fn run(&self, mc: &MC) -> Action {
        if self.target.is_some() && mc.num_moves() >= self.next_frame.get() {
            Action::Save
        } else {
            Action::None
        }
    }
    fn run_period(&self) -> TimeToRun {
        if self.target.is_some() {
            TimeToRun::TotalMoves(self.next_frame.get())
        } else {
            TimeToRun::Never
        }
    }
    fn save(&self, mc: &MC) {
        self.record(mc);
    }
    fn restart(&self) {
        // later frames go on in the same file, counting moves from zero
        self.next_frame.set(0);
        self.last_frame.set(None);
    }
}

fn duration_to_secs(t: time::Duration) -> f64 {
    t.as_secs() as f64 + t.subsec_nanos() as f64 * 1e-9
}
