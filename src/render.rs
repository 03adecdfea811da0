//! Drawing the grid.
//!
//! A [`Renderer`] is handed a read-only [`State`] whenever the picture
//! should change.  The simulator never calls one itself; the driver
//! decides when to redraw.

use std::io::{self, Write};

use crate::mc::metropolis::State;
use crate::system::Energy;

/// What to draw at each site.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayMode {
    /// The spin itself.
    Spin,
    /// The cached delta energy of the site.
    Energy,
}

impl DisplayMode {
    /// The other mode.
    pub fn toggled(self) -> DisplayMode {
        match self {
            DisplayMode::Spin => DisplayMode::Energy,
            DisplayMode::Energy => DisplayMode::Spin,
        }
    }
    /// The label of the button that switches to the other mode.
    pub fn toggle_label(self) -> &'static str {
        match self {
            DisplayMode::Spin => "Energy",
            DisplayMode::Energy => "State",
        }
    }
}

impl Default for DisplayMode {
    fn default() -> Self {
        DisplayMode::Spin
    }
}

/// Something that can draw the grid.
pub trait Renderer {
    /// Draw the grid in the given mode.
    fn render(&mut self, state: &State<'_>, mode: DisplayMode) -> io::Result<()>;
}

/// Scale the delta energies onto `[0, 1]` between their minimum and
/// maximum.  A flat grid maps to one half everywhere.
pub fn normalized_energies(delta_energy: &[Energy]) -> Vec<f64> {
    let min = delta_energy.iter().cloned().fold(std::f64::INFINITY, f64::min);
    let max = delta_energy.iter().cloned().fold(std::f64::NEG_INFINITY, f64::max);
    delta_energy
        .iter()
        .map(|&e| if max == min { 0.5 } else { (e - min) / (max - min) })
        .collect()
}

/// Shades from low to high energy.
const SHADES: &[u8] = b" .:-=+*#%@";

/// Draws the grid as text, one row per line.
///
/// In energy mode each site is one character on a single brightness
/// ramp, from blank at the lowest normalized energy to `@` at the
/// highest, rather than two colour bands.
pub struct TextRenderer<W> {
    out: W,
    clear: bool,
}

impl<W: Write> TextRenderer<W> {
    /// Write frames one after another.
    pub fn new(out: W) -> Self {
        TextRenderer { out, clear: false }
    }
    /// Clear the terminal before each frame, so the grid animates in
    /// place.
    pub fn terminal(out: W) -> Self {
        TextRenderer { out, clear: true }
    }
    /// Give back the writer.
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Renderer for TextRenderer<W> {
    fn render(&mut self, state: &State<'_>, mode: DisplayMode) -> io::Result<()> {
        let mut text = String::with_capacity(state.n * (2 * state.n + 1) + 8);
        if self.clear {
            text.push_str("\x1b[H\x1b[2J");
        }
        let shades = match mode {
            DisplayMode::Spin => Vec::new(),
            DisplayMode::Energy => normalized_energies(state.delta_energy),
        };
        for i in 0..state.n {
            for j in 0..state.n {
                if j > 0 {
                    text.push(' ');
                }
                let c = match mode {
                    DisplayMode::Spin => {
                        if state.spin(i, j) == 1 {
                            '+'
                        } else {
                            '-'
                        }
                    }
                    DisplayMode::Energy => {
                        let x = shades[i * state.n + j];
                        SHADES[(x * (SHADES.len() - 1) as f64).round() as usize] as char
                    }
                };
                text.push(c);
            }
            text.push('\n');
        }
        text.push_str(&format!("[e] {}\n", mode.toggle_label()));
        self.out.write_all(text.as_bytes())?;
        self.out.flush()
    }
}

/// A snapshot of the grid, as written to movie files.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Frame {
    /// How many moves had been made.
    pub moves: u64,
    /// The width of the grid.
    pub n: usize,
    /// The spins, row by row.
    pub spins: Vec<i8>,
    /// The delta energies, row by row.
    pub delta_energy: Vec<Energy>,
}

impl Frame {
    /// Copy the current state.
    pub fn capture(moves: u64, state: &State<'_>) -> Frame {
        Frame {
            moves,
            n: state.n,
            spins: state.spins.to_vec(),
            delta_energy: state.delta_energy.to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flat_grid_is_half() {
        assert_eq!(normalized_energies(&[2.0, 2.0, 2.0]), vec![0.5, 0.5, 0.5]);
        assert_eq!(normalized_energies(&[-1.0, 0.0, 3.0]), vec![0.0, 0.25, 1.0]);
        assert!(normalized_energies(&[]).is_empty());
    }

    #[test]
    fn toggling_twice_is_identity() {
        for &m in &[DisplayMode::Spin, DisplayMode::Energy] {
            assert_ne!(m.toggled(), m);
            assert_eq!(m.toggled().toggled(), m);
        }
        assert_eq!(DisplayMode::default().toggle_label(), "Energy");
    }

    #[test]
    fn text_spins() {
        let spins = [1, -1, -1, 1];
        let de = [0.0; 4];
        let state = State { n: 2, spins: &spins, delta_energy: &de };
        let mut r = TextRenderer::new(Vec::new());
        r.render(&state, DisplayMode::Spin).unwrap();
        let text = String::from_utf8(r.into_inner()).unwrap();
        assert_eq!(text, "+ -\n- +\n[e] Energy\n");
    }

    #[test]
    fn text_energies() {
        let spins = [1, 1, 1, 1];
        let de = [-1.0, 0.0, 1.0, 0.0];
        let state = State { n: 2, spins: &spins, delta_energy: &de };
        let mut r = TextRenderer::new(Vec::new());
        r.render(&state, DisplayMode::Energy).unwrap();
        let text = String::from_utf8(r.into_inner()).unwrap();
        assert_eq!(text, "  +\n@ +\n[e] State\n");
    }
}
