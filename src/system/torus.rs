//! Geometry of a square grid with periodic boundaries.

use crate::error::Error;

/// A site on the grid, as (row, column).
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Site {
    /// The row.
    pub i: usize,
    /// The column.
    pub j: usize,
}

impl Site {
    /// A site at row `i`, column `j`.
    pub fn new(i: usize, j: usize) -> Site {
        Site { i, j }
    }
}

/// The shorter way around a ring of `n` sites between `a` and `b`.
pub fn wrapped_offset(a: usize, b: usize, n: usize) -> usize {
    let d = if a > b { a - b } else { b - a };
    ::std::cmp::min(d, n - d)
}

/// The Euclidean distance between two sites on an `n`-wide torus,
/// taking the minimum wrap-around offset along each axis.
pub fn distance(n: usize, a: Site, b: Site) -> f64 {
    let di = wrapped_offset(a.i, b.i, n) as f64;
    let dj = wrapped_offset(a.j, b.j, n) as f64;
    (di * di + dj * dj).sqrt()
}

/// The coupling `J(d) = d^-p`.  A site does not couple to itself, so
/// zero distance gives zero.
pub fn coupling(d: f64, p: f64) -> f64 {
    if d > 0.0 {
        d.powf(-p)
    } else {
        0.0
    }
}

/// An `n` by `n` torus, with the coupling between any two sites
/// tabulated by their wrapped offsets.
#[derive(Debug, Clone)]
pub struct Torus {
    n: usize,
    p: f64,
    /// `J` indexed by `di*(n/2 + 1) + dj`.
    couplings: Vec<f64>,
}

impl Torus {
    /// A torus of width `n` with distance exponent `p`.
    pub fn new(n: usize, p: f64) -> Torus {
        let m = n / 2 + 1;
        let mut couplings = vec![0.0; m * m];
        for di in 0..m {
            for dj in 0..m {
                let d = ((di * di + dj * dj) as f64).sqrt();
                couplings[di * m + dj] = coupling(d, p);
            }
        }
        Torus { n, p, couplings }
    }

    /// The width of the grid.
    pub fn n(&self) -> usize {
        self.n
    }

    /// The distance exponent.
    pub fn distance_exponent(&self) -> f64 {
        self.p
    }

    /// The number of sites.
    pub fn num_sites(&self) -> usize {
        self.n * self.n
    }

    /// Check that `(i, j)` is on the grid.
    pub fn site(&self, i: usize, j: usize) -> Result<Site, Error> {
        if i < self.n && j < self.n {
            Ok(Site { i, j })
        } else {
            Err(Error::OutOfRange { i, j, n: self.n })
        }
    }

    /// The position of `s` in row-major storage.
    pub fn index(&self, s: Site) -> usize {
        s.i * self.n + s.j
    }

    /// The site stored at position `idx`.
    pub fn site_at(&self, idx: usize) -> Site {
        Site { i: idx / self.n, j: idx % self.n }
    }

    /// All the sites, in storage order.
    pub fn sites(&self) -> impl Iterator<Item = Site> {
        let n = self.n;
        (0..n * n).map(move |idx| Site { i: idx / n, j: idx % n })
    }

    /// The coupling between two sites, zero if they are the same site.
    pub fn coupling(&self, a: Site, b: Site) -> f64 {
        let m = self.n / 2 + 1;
        let di = wrapped_offset(a.i, b.i, self.n);
        let dj = wrapped_offset(a.j, b.j, self.n);
        self.couplings[di * m + dj]
    }
}

#[test]
fn distance_wraps_around() {
    let n = 16;
    assert_eq!(distance(n, Site::new(0, 0), Site::new(0, 15)), 1.0);
    assert_eq!(distance(n, Site::new(0, 0), Site::new(15, 15)), 2f64.sqrt());
    assert_eq!(distance(n, Site::new(2, 3), Site::new(2, 3)), 0.0);
    assert_eq!(distance(n, Site::new(0, 0), Site::new(8, 8)), 128f64.sqrt());
    assert_eq!(distance(n, Site::new(1, 0), Site::new(4, 4)), 5.0);
}

#[test]
fn coupling_is_symmetric() {
    for &n in &[1, 2, 3, 4, 7, 16] {
        let t = Torus::new(n, 2.6);
        for a in t.sites() {
            for b in t.sites() {
                assert_eq!(t.coupling(a, b), t.coupling(b, a));
                assert_eq!(distance(n, a, b), distance(n, b, a));
            }
        }
    }
}

#[test]
fn coupling_table_matches_direct_power() {
    let n = 9;
    let p = 2.6;
    let t = Torus::new(n, p);
    for a in t.sites() {
        for b in t.sites() {
            assert_eq!(t.coupling(a, b), coupling(distance(n, a, b), p));
        }
    }
    assert_eq!(t.coupling(Site::new(3, 3), Site::new(3, 3)), 0.0);
}

#[test]
fn larger_exponent_decays_faster() {
    for &d in &[1.5, 2.0, 2f64.sqrt(), 7.0] {
        let mut last = coupling(d, 0.5);
        for &p in &[1.0, 2.0, 2.6, 3.0, 6.0] {
            let j = coupling(d, p);
            assert!(j < last, "J({}) with p={} is {} >= {}", d, p, j, last);
            last = j;
        }
    }
    assert_eq!(coupling(1.0, 2.6), 1.0);
}

#[test]
fn site_checks_bounds() {
    let t = Torus::new(4, 2.6);
    assert_eq!(t.site(3, 0), Ok(Site::new(3, 0)));
    assert_eq!(t.site(4, 0), Err(Error::OutOfRange { i: 4, j: 0, n: 4 }));
    assert_eq!(t.site(0, 17), Err(Error::OutOfRange { i: 0, j: 17, n: 4 }));
    for s in t.sites() {
        assert_eq!(t.site_at(t.index(s)), s);
    }
}
