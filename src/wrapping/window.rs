//! Meyer-type window pair used by every scale and angle transition.

/// Returns `(wl, wr)` at `x`: `wr` falls smoothly from 1 (for `x <= 0`) to
/// 0 (for `x >= 1`), `wl` rises the other way, and `wl^2 + wr^2 == 1`.
pub fn window_pair(x: f64) -> (f64, f64) {
    let x = if x.abs() < f64::EPSILON { 0.0 } else { x };
    if x <= 0.0 {
        return (0.0, 1.0);
    }
    if x >= 1.0 {
        return (1.0, 0.0);
    }
    let wr = bump(x);
    let wl = bump(1.0 - x);
    let norm = (wl * wl + wr * wr).sqrt();
    (wl / norm, wr / norm)
}

/// Falling half of the window; `window_pair(x).1`.
pub fn falling(x: f64) -> f64 {
    window_pair(x).1
}

fn bump(x: f64) -> f64 {
    (1.0 - 1.0 / (1.0 - (1.0 - 1.0 / x).exp())).exp()
}

/// Separable 1D lowpass: flat on `|t| <= flat`, zero from `|t| >= 2 * flat`.
pub fn lowpass_1d(t: f64, flat: f64) -> f64 {
    falling((t.abs() - flat) / flat)
}
