//! Frequency tiling for the wrapping construction.
//!
//! The centered frequency grid is cut into concentric square coronae
//! (scales) and, inside each corona, into angular wedges. Each wedge window
//! `U` is the product of a scale window and an angular window, and the
//! windows satisfy `sum(U^2) == 1` on the whole grid. A wedge's support is
//! wrapped onto a small rectangle (its footprint) where the coefficients of
//! that wedge live.

use super::window::{falling, lowpass_1d};
use crate::error::{CurveletError, Result};
use crate::settings::{flat_radius, DctSettings};
use ndarray::{Array2, Zip};
use std::collections::BTreeMap;

/// One frequency sample of a wedge: where it sits on the image grid, where it
/// lands in the wedge footprint, and its window value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Tap {
    pub grid: (usize, usize),
    pub cell: (usize, usize),
    pub weight: f64,
}

/// Which axis of a wedge runs radially; decides how the footprint is sized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Orientation {
    Isotropic,
    Vertical,
    Horizontal,
}

#[derive(Debug, Clone)]
pub struct WedgeWindow {
    pub scale: usize,
    pub wedge: usize,
    pub footprint: (usize, usize),
    pub(crate) taps: Vec<Tap>,
}

impl WedgeWindow {
    fn from_samples(
        scale: usize,
        wedge: usize,
        support: Vec<Sample>,
        orientation: Orientation,
        (rows, cols): (usize, usize),
    ) -> Result<Self> {
        if support.is_empty() {
            return Err(CurveletError::construction(format!(
                "wedge {wedge} of scale {scale} has no frequency support on a {rows}x{cols} grid"
            )));
        }

        let footprint = match orientation {
            Orientation::Isotropic => (
                span(support.iter().map(|s| s.k1)),
                span(support.iter().map(|s| s.k2)),
            ),
            Orientation::Vertical => (
                span(support.iter().map(|s| s.k1)),
                widest_line(support.iter().map(|s| (s.k1, s.k2))),
            ),
            Orientation::Horizontal => (
                widest_line(support.iter().map(|s| (s.k2, s.k1))),
                span(support.iter().map(|s| s.k2)),
            ),
        };

        let taps = support
            .iter()
            .map(|s| Tap {
                grid: s.grid,
                cell: (wrap(s.k1, footprint.0), wrap(s.k2, footprint.1)),
                weight: s.weight,
            })
            .collect();

        Ok(Self {
            scale,
            wedge,
            footprint,
            taps,
        })
    }

    pub fn support_len(&self) -> usize {
        self.taps.len()
    }
}

struct Sample {
    k1: isize,
    k2: isize,
    grid: (usize, usize),
    weight: f64,
}

/// A grid index with the signed frequency angular wedges read it as.
///
/// On an even axis the Nyquist line `-n/2` is its own grid mirror. Half of
/// that line (the half with a negative cross frequency) is read as `+n/2`,
/// so the grid mirror of every other point sits at the exact negative
/// frequency. Points that are their own mirror are shared evenly between
/// the two antipodal wedges.
#[derive(Debug, Clone, Copy)]
struct GridPoint {
    grid: (usize, usize),
    k: (isize, isize),
    theta: f64,
    self_mirror: bool,
}

impl GridPoint {
    fn new(i: usize, j: usize, rows: usize, cols: usize) -> Self {
        let (mut k1, mut k2) = (centered_frequency(i, rows), centered_frequency(j, cols));
        let nyquist_row = rows % 2 == 0 && i == 0;
        let nyquist_col = cols % 2 == 0 && j == 0;
        let self_mirror = (k1 == 0 || nyquist_row) && (k2 == 0 || nyquist_col);
        if !self_mirror {
            if nyquist_row && k2 < 0 {
                k1 = -k1;
            } else if nyquist_col && k1 < 0 {
                k2 = -k2;
            }
        }
        Self {
            grid: (i, j),
            k: (k1, k2),
            theta: pseudo_angle(k1 as f64 / half(rows), k2 as f64 / half(cols)),
            self_mirror,
        }
    }

    /// Angular weight of `wedge` at this point and the frequency it is
    /// wrapped from.
    fn angular(&self, wedge: usize, count: usize) -> ((isize, isize), f64) {
        let direct = angular_window(self.theta, wedge, count);
        if !self.self_mirror {
            return (self.k, direct);
        }
        let mirrored = angular_window(self.theta + 2.0, wedge, count);
        let weight = ((direct * direct + mirrored * mirrored) / 2.0).sqrt();
        if direct > 0.0 {
            (self.k, weight)
        } else {
            ((-self.k.0, -self.k.1), weight)
        }
    }
}

/// All wedge windows of one (rows, cols, settings) configuration.
#[derive(Debug, Clone)]
pub struct FrequencyTiling {
    rows: usize,
    cols: usize,
    settings: DctSettings,
    scales: Vec<Vec<WedgeWindow>>,
}

impl FrequencyTiling {
    pub fn new(rows: usize, cols: usize, settings: &DctSettings) -> Result<Self> {
        settings.validate(rows, cols)?;
        let settings = settings.with_real(false);
        let nbscales = settings.nbscales;

        let lowpass: Vec<Array2<f64>> = (0..nbscales - 1)
            .map(|scale| separable_lowpass(rows, cols, flat_radius(scale, nbscales)))
            .collect();
        let points: Vec<GridPoint> = (0..rows)
            .flat_map(|i| (0..cols).map(move |j| GridPoint::new(i, j, rows, cols)))
            .collect();

        let mut scales = Vec::with_capacity(nbscales);
        for (scale, &count) in settings.wedges_per_scale().iter().enumerate() {
            let radial = scale_window(&lowpass, scale, rows, cols);
            let wedges = if settings.is_angular(scale) {
                (0..count)
                    .map(|wedge| {
                        let support = angular_samples(&points, &radial, wedge, count);
                        WedgeWindow::from_samples(
                            scale,
                            wedge,
                            support,
                            orientation_of(wedge, count),
                            (rows, cols),
                        )
                    })
                    .collect::<Result<Vec<_>>>()?
            } else {
                vec![WedgeWindow::from_samples(
                    scale,
                    0,
                    isotropic_samples(&radial),
                    Orientation::Isotropic,
                    (rows, cols),
                )?]
            };
            scales.push(wedges);
        }

        Ok(Self {
            rows,
            cols,
            settings,
            scales,
        })
    }

    pub fn dim(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn settings(&self) -> &DctSettings {
        &self.settings
    }

    pub fn scales(&self) -> &[Vec<WedgeWindow>] {
        &self.scales
    }

    pub fn wedge(&self, scale: usize, wedge: usize) -> &WedgeWindow {
        &self.scales[scale][wedge]
    }

    /// Shape of the coefficient array stored at `(scale, wedge)`. In the real
    /// variant the second half of an angular scale holds the imaginary parts
    /// of the first half and shares its footprints.
    pub fn coefficient_shape(&self, scale: usize, wedge: usize, is_real: bool) -> (usize, usize) {
        let count = self.scales[scale].len();
        if is_real && self.settings.is_angular(scale) && wedge >= count / 2 {
            self.scales[scale][wedge - count / 2].footprint
        } else {
            self.scales[scale][wedge].footprint
        }
    }

    /// `sum(U^2)` over every wedge; identically one for a tight frame.
    pub fn squared_sum(&self) -> Array2<f64> {
        let mut total = Array2::<f64>::zeros((self.rows, self.cols));
        for wedge in self.scales.iter().flatten() {
            for tap in &wedge.taps {
                total[tap.grid] += tap.weight * tap.weight;
            }
        }
        total
    }
}

fn centered_frequency(index: usize, n: usize) -> isize {
    index as isize - (n / 2) as isize
}

fn half(n: usize) -> f64 {
    n as f64 / 2.0
}

fn normalized(index: usize, n: usize) -> f64 {
    centered_frequency(index, n) as f64 / half(n)
}

fn isotropic_samples(weights: &Array2<f64>) -> Vec<Sample> {
    let (rows, cols) = weights.dim();
    weights
        .indexed_iter()
        .filter(|&(_, &w)| w > 0.0)
        .map(|((i, j), &w)| Sample {
            k1: centered_frequency(i, rows),
            k2: centered_frequency(j, cols),
            grid: (i, j),
            weight: w,
        })
        .collect()
}

fn angular_samples(points: &[GridPoint], radial: &Array2<f64>, wedge: usize, count: usize) -> Vec<Sample> {
    points
        .iter()
        .filter(|p| radial[p.grid] > 0.0)
        .filter_map(|p| {
            let ((k1, k2), angular) = p.angular(wedge, count);
            let weight = radial[p.grid] * angular;
            (weight > 0.0).then_some(Sample {
                k1,
                k2,
                grid: p.grid,
                weight,
            })
        })
        .collect()
}

/// Maps a signed frequency onto `0..len`; injective on any run of `len`
/// consecutive frequencies.
fn wrap(k: isize, len: usize) -> usize {
    (k + (len / 2) as isize).rem_euclid(len as isize) as usize
}

fn span(values: impl Iterator<Item = isize>) -> usize {
    let (lo, hi) = values.fold((isize::MAX, isize::MIN), |(lo, hi), v| (lo.min(v), hi.max(v)));
    (hi - lo + 1) as usize
}

/// Widest extent of `across` among samples sharing the same `along` value.
fn widest_line(pairs: impl Iterator<Item = (isize, isize)>) -> usize {
    let mut lines: BTreeMap<isize, (isize, isize)> = BTreeMap::new();
    for (along, across) in pairs {
        let entry = lines.entry(along).or_insert((across, across));
        entry.0 = entry.0.min(across);
        entry.1 = entry.1.max(across);
    }
    lines
        .values()
        .map(|&(lo, hi)| (hi - lo + 1) as usize)
        .max()
        .unwrap_or(1)
}

fn separable_lowpass(rows: usize, cols: usize, flat: f64) -> Array2<f64> {
    let along_rows: Vec<f64> = (0..rows).map(|i| lowpass_1d(normalized(i, rows), flat)).collect();
    let along_cols: Vec<f64> = (0..cols).map(|j| lowpass_1d(normalized(j, cols), flat)).collect();
    Array2::from_shape_fn((rows, cols), |(i, j)| along_rows[i] * along_cols[j])
}

/// `W_0 = L_0`, `W_s = sqrt(L_s^2 - L_{s-1}^2)`, with the last lowpass
/// taken as all ones so the squares telescope to one.
fn scale_window(lowpass: &[Array2<f64>], scale: usize, rows: usize, cols: usize) -> Array2<f64> {
    let outer = lowpass
        .get(scale)
        .cloned()
        .unwrap_or_else(|| Array2::ones((rows, cols)));
    if scale == 0 {
        return outer;
    }
    Zip::from(&outer)
        .and(&lowpass[scale - 1])
        .map_collect(|&o, &i| (o * o - i * i).max(0.0).sqrt())
}

/// Position along the boundary of the unit square, in `[0, 4)`: north
/// (`t1 < 0`) covers `[0, 1)`, east `[1, 2)`, south `[2, 3)`, west `[3, 4)`.
/// Antipodal points differ by exactly 2.
pub(crate) fn pseudo_angle(t1: f64, t2: f64) -> f64 {
    let (a1, a2) = (t1.abs(), t2.abs());
    if a1 == 0.0 && a2 == 0.0 {
        return 0.0;
    }
    let theta = if a1 >= a2 {
        if t1 < 0.0 {
            0.5 + 0.5 * t2 / a1
        } else {
            2.5 - 0.5 * t2 / a1
        }
    } else if t2 > 0.0 {
        1.5 + 0.5 * t1 / a2
    } else {
        3.5 - 0.5 * t1 / a2
    };
    theta.rem_euclid(4.0)
}

/// Window of wedge `wedge` out of `count` equal sectors of the pseudo-angle.
/// Neighbouring windows overlap over a quarter sector on each side and are
/// power complementary there.
pub(crate) fn angular_window(theta: f64, wedge: usize, count: usize) -> f64 {
    let width = 4.0 / count as f64;
    let overlap = width / 4.0;
    let center = (wedge as f64 + 0.5) * width;
    let distance = (theta - center + 2.0).rem_euclid(4.0) - 2.0;
    falling((distance.abs() - (width / 2.0 - overlap)) / (2.0 * overlap))
}

fn orientation_of(wedge: usize, count: usize) -> Orientation {
    let center = (wedge as f64 + 0.5) * 4.0 / count as f64;
    if (center as usize) % 2 == 0 {
        Orientation::Vertical
    } else {
        Orientation::Horizontal
    }
}
