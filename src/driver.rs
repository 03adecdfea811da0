//! Driving a simulation on a fixed cadence.
//!
//! The simulator knows nothing of time or pictures.  A [`Driver`] owns
//! it exclusively, steps it once per interval unless paused, redraws
//! after every accepted flip, and reacts to the keyboard: `r`
//! regenerates the grid, `e` switches between showing spins and
//! energies, and space pauses.

use std::io;
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use auto_args::AutoArgs;

use crate::mc::metropolis::{Flip, Metropolis};
use crate::mc::plugin::{Action, Movie, MovieParams, Plugin, PluginManager, Report, ReportParams};
use crate::render::{DisplayMode, Renderer};
use crate::rng::{Draws, MyRng};

/// The time between steps when none is given, in milliseconds.
pub const DEFAULT_INTERVAL_MS: u64 = 7;

/// How to drive the simulation.
#[derive(Serialize, Deserialize, AutoArgs, Debug, Clone)]
pub struct DriverParams {
    /// Milliseconds between spin flips [default 7]
    pub interval_ms: Option<u64>,
    /// Start paused.
    pub paused: bool,
}

impl Default for DriverParams {
    fn default() -> Self {
        DriverParams {
            interval_ms: None,
            paused: false,
        }
    }
}

/// Something the user asked for.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Throw the grid away and draw a new random one.
    Regenerate,
    /// Switch between showing spins and energies.
    ToggleDisplay,
    /// Stop or restart stepping.
    TogglePause,
    /// Stop for good.
    Quit,
}

impl Command {
    /// The command bound to a key, if any.
    pub fn from_key(key: &str) -> Option<Command> {
        match key.to_lowercase().as_str() {
            "r" => Some(Command::Regenerate),
            "e" => Some(Command::ToggleDisplay),
            " " | "spacebar" => Some(Command::TogglePause),
            "q" => Some(Command::Quit),
            _ => None,
        }
    }

    /// The commands typed on one line of input.  An empty line pauses
    /// or resumes.
    pub fn parse_line(line: &str) -> Vec<Command> {
        let line = line.trim_end_matches(|c| c == '\n' || c == '\r');
        if line.trim().is_empty() {
            return vec![Command::TogglePause];
        }
        line.chars()
            .filter_map(|c| Command::from_key(c.encode_utf8(&mut [0; 4])))
            .collect()
    }
}

/// Steps a simulation, draws it, and listens for commands.
pub struct Driver<R = MyRng> {
    mc: Metropolis<R>,
    interval: Duration,
    paused: bool,
    mode: DisplayMode,
    finished: bool,
    report: Report,
    movie: Movie,
    manager: PluginManager,
}

impl<R: Draws> Driver<R> {
    /// Take charge of `mc`.
    pub fn new(mc: Metropolis<R>, params: DriverParams, report: ReportParams, movie: MovieParams) -> Self {
        Driver {
            mc,
            interval: Duration::from_millis(params.interval_ms.unwrap_or(DEFAULT_INTERVAL_MS)),
            paused: params.paused,
            mode: DisplayMode::default(),
            finished: false,
            report: Report::from(report),
            movie: Movie::from(movie),
            manager: PluginManager::new(),
        }
    }

    /// The simulation being driven.
    pub fn simulation(&self) -> &Metropolis<R> {
        &self.mc
    }

    /// The movie recorder.
    pub fn movie(&self) -> &Movie {
        &self.movie
    }

    /// Whether stepping is paused.
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// What we are drawing.
    pub fn mode(&self) -> DisplayMode {
        self.mode
    }

    /// Whether a plugin has asked us to stop.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Draw the current state.
    pub fn draw(&self, renderer: &mut dyn Renderer) -> io::Result<()> {
        renderer.render(&self.mc.state(), self.mode)
    }

    /// React to a command.  Returns `false` once we should stop.
    pub fn handle(&mut self, cmd: Command, renderer: &mut dyn Renderer) -> io::Result<bool> {
        match cmd {
            Command::Regenerate => {
                self.mc.reset();
                let plugins = [&self.report as &dyn Plugin<Metropolis<R>>, &self.movie];
                self.manager.restart(&plugins);
                self.draw(renderer)?;
            }
            Command::ToggleDisplay => {
                self.mode = self.mode.toggled();
                self.draw(renderer)?;
            }
            Command::TogglePause => {
                self.paused = !self.paused;
                log::debug!("{}", if self.paused { "paused" } else { "resumed" });
            }
            Command::Quit => {
                self.finish();
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// One tick of the clock: step unless paused, and redraw if the
    /// grid changed.
    pub fn tick(&mut self, renderer: &mut dyn Renderer) -> io::Result<Option<Flip>> {
        if self.paused || self.finished {
            return Ok(None);
        }
        let flip = self.mc.step();
        if flip.accepted {
            self.draw(renderer)?;
        }
        let plugins = [&self.report as &dyn Plugin<Metropolis<R>>, &self.movie];
        if self.manager.run(&self.mc, &plugins) == Action::Exit {
            self.finished = true;
        }
        Ok(Some(flip))
    }

    /// Draw, then tick once per interval until a plugin or the user
    /// stops us.  Commands are taken from `commands` as they arrive;
    /// if its sender goes away we simply keep ticking.
    pub fn run(&mut self, commands: &Receiver<Command>, renderer: &mut dyn Renderer) -> io::Result<()> {
        self.draw(renderer)?;
        let mut listening = true;
        while !self.finished {
            if listening {
                match commands.recv_timeout(self.interval) {
                    Ok(cmd) => {
                        if !self.handle(cmd, renderer)? {
                            return Ok(());
                        }
                        continue;
                    }
                    Err(RecvTimeoutError::Timeout) => (),
                    Err(RecvTimeoutError::Disconnected) => {
                        listening = false;
                        continue;
                    }
                }
            } else {
                if self.paused {
                    // nobody is left to resume us
                    break;
                }
                thread::sleep(self.interval);
            }
            self.tick(renderer)?;
        }
        Ok(())
    }

    fn finish(&self) {
        self.report.print_progress(&self.mc);
        self.report.print_summary(&self.mc);
        self.movie.record(&self.mc);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mc::metropolis::{MetropolisParams, State};
    use crate::mc::MonteCarlo;
    use crate::system::ising::IsingParams;
    use std::sync::mpsc;

    #[derive(Default)]
    struct Counter {
        frames: Vec<(DisplayMode, Vec<i8>)>,
    }

    impl Renderer for Counter {
        fn render(&mut self, state: &State<'_>, mode: DisplayMode) -> io::Result<()> {
            self.frames.push((mode, state.spins.to_vec()));
            Ok(())
        }
    }

    fn driver(max_iter: Option<u64>) -> Driver {
        let mc = Metropolis::from_params(
            IsingParams {
                n: 4,
                distance_exponent: None,
            },
            MetropolisParams {
                temperature: Some(2.0),
                seed: Some(17),
            },
        )
        .unwrap();
        Driver::new(
            mc,
            DriverParams {
                interval_ms: Some(0),
                paused: false,
            },
            ReportParams {
                max_iter,
                report_every: None,
                quiet: true,
            },
            MovieParams::default(),
        )
    }

    #[test]
    fn keys_map_to_commands() {
        assert_eq!(Command::from_key("R"), Some(Command::Regenerate));
        assert_eq!(Command::from_key("e"), Some(Command::ToggleDisplay));
        assert_eq!(Command::from_key(" "), Some(Command::TogglePause));
        assert_eq!(Command::from_key("Spacebar"), Some(Command::TogglePause));
        assert_eq!(Command::from_key("x"), None);
        assert_eq!(Command::parse_line("\n"), vec![Command::TogglePause]);
        assert_eq!(
            Command::parse_line("ex r\n"),
            vec![Command::ToggleDisplay, Command::TogglePause, Command::Regenerate]
        );
    }

    #[test]
    fn redraws_only_accepted_flips() {
        let mut d = driver(None);
        let mut r = Counter::default();
        let mut accepted = 0;
        for _ in 0..200 {
            if let Some(flip) = d.tick(&mut r).unwrap() {
                if flip.accepted {
                    accepted += 1;
                }
            }
        }
        assert_eq!(r.frames.len(), accepted);
        assert_eq!(d.simulation().num_accepted_moves(), accepted as u64);
    }

    #[test]
    fn paused_driver_does_not_step() {
        let mut d = driver(None);
        let mut r = Counter::default();
        assert!(d.handle(Command::TogglePause, &mut r).unwrap());
        assert!(d.is_paused());
        for _ in 0..10 {
            assert_eq!(d.tick(&mut r).unwrap(), None);
        }
        assert_eq!(d.simulation().num_moves(), 0);
        assert!(r.frames.is_empty());
        d.handle(Command::TogglePause, &mut r).unwrap();
        assert!(d.tick(&mut r).unwrap().is_some());
    }

    #[test]
    fn toggle_display_redraws() {
        let mut d = driver(None);
        let mut r = Counter::default();
        d.handle(Command::ToggleDisplay, &mut r).unwrap();
        assert_eq!(d.mode(), DisplayMode::Energy);
        d.handle(Command::ToggleDisplay, &mut r).unwrap();
        let modes: Vec<DisplayMode> = r.frames.iter().map(|f| f.0).collect();
        assert_eq!(modes, vec![DisplayMode::Energy, DisplayMode::Spin]);
    }

    #[test]
    fn regenerate_starts_over() {
        let mut d = driver(None);
        let mut r = Counter::default();
        for _ in 0..50 {
            d.tick(&mut r).unwrap();
        }
        d.handle(Command::Regenerate, &mut r).unwrap();
        assert_eq!(d.simulation().num_moves(), 0);
        let last = &r.frames.last().unwrap().1;
        assert_eq!(&last[..], d.simulation().state().spins);
        let fresh = d.simulation().system().compute_delta_energies();
        for (a, b) in fresh.iter().zip(d.simulation().state().delta_energy) {
            assert!((a - b).abs() < 1e-12);
        }
    }

    #[test]
    fn run_stops_at_max_iter() {
        let mut d = driver(Some(25));
        let (tx, rx) = mpsc::channel();
        drop(tx);
        let mut r = Counter::default();
        d.run(&rx, &mut r).unwrap();
        assert!(d.is_finished());
        assert_eq!(d.simulation().num_moves(), 25);
    }

    fn movie_driver(path: std::path::PathBuf) -> Driver {
        let mut d = driver(None);
        d.movie = Movie::from(MovieParams {
            movie: Some(path),
            movie_every: Some(5),
        });
        d
    }

    #[test]
    fn quit_does_not_repeat_the_last_frame() {
        let dir = tempfile::tempdir().unwrap();
        let mut d = movie_driver(dir.path().join("movie.json"));
        let mut r = Counter::default();
        for _ in 0..6 {
            d.tick(&mut r).unwrap();
        }
        assert_eq!(d.movie().last_frame(), Some(6));
        assert_eq!(d.movie().frames_written(), 2);
        assert!(!d.handle(Command::Quit, &mut r).unwrap());
        assert_eq!(d.movie().frames_written(), 2);
    }

    #[test]
    fn quit_records_a_final_frame() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("movie.json");
        let mut d = movie_driver(path.clone());
        let mut r = Counter::default();
        for _ in 0..8 {
            d.tick(&mut r).unwrap();
        }
        d.handle(Command::Quit, &mut r).unwrap();
        assert_eq!(d.movie().last_frame(), Some(8));
        assert_eq!(d.movie().frames_written(), 3);
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().count(), 3);
    }

    #[test]
    fn run_obeys_commands() {
        let mut d = driver(None);
        let (tx, rx) = mpsc::channel();
        tx.send(Command::ToggleDisplay).unwrap();
        tx.send(Command::Quit).unwrap();
        let mut r = Counter::default();
        d.run(&rx, &mut r).unwrap();
        assert_eq!(d.mode(), DisplayMode::Energy);
        assert_eq!(r.frames.len(), 2);
    }
}
