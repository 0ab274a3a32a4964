//! Extremum detection over a sampled signal.
//!
//! Locates the local maxima and minima used as envelope knots, and counts
//! interior zero crossings for the S-number stopping criterion. Both
//! endpoints of the signal are recorded in both extremum lists so the fitted
//! envelopes always span the whole signal; a flat run of equal samples
//! contributes the midpoint of the run as the extremal position, which is
//! why positions are `f64` rather than indices.
//!
//! When a signal has at least two interior maxima, the recorded endpoint
//! values are raised to the linear extrapolation through the two nearest
//! interior maxima whenever that line passes above the data, so the envelope
//! does not sag below the signal near the boundaries. The minima logic is
//! the exact mirror image: negating a signal negates its detected extrema
//! bit for bit, a property the multivariate sifting relies on.

#[derive(Clone, Copy, PartialEq)]
enum Slope {
    Up,
    Down,
    None,
}

#[derive(Clone, Copy, PartialEq)]
enum Sign {
    Pos,
    Neg,
    None,
}

fn extrapolate(x0: f64, y0: f64, x1: f64, y1: f64, x: f64) -> f64 {
    y0 + (y1 - y0) * (x - x0) / (x1 - x0)
}

/// Locate the local maxima of `x`, including both endpoints.
///
/// `pos` and `val` are cleared and refilled; their capacity is reused
/// across sifting iterations.
pub(crate) fn find_maxima(x: &[f64], pos: &mut Vec<f64>, val: &mut Vec<f64>) {
    pos.clear();
    val.clear();
    let n = x.len();
    if n == 0 {
        return;
    }
    pos.push(0.0);
    val.push(x[0]);
    if n == 1 {
        return;
    }
    let mut slope = Slope::None;
    let mut flat_len = 0usize;
    for i in 0..n - 1 {
        if x[i + 1] > x[i] {
            slope = Slope::Up;
            flat_len = 0;
        } else if x[i + 1] < x[i] {
            if slope == Slope::Up {
                pos.push(i as f64 - flat_len as f64 / 2.0);
                val.push(x[i]);
            }
            slope = Slope::Down;
            flat_len = 0;
        } else {
            flat_len += 1;
        }
    }
    pos.push((n - 1) as f64);
    val.push(x[n - 1]);
    // With two or more interior maxima, extrapolate the envelope ends from
    // the line through the nearest interior pair.
    let m = pos.len();
    if m >= 4 {
        let left = extrapolate(pos[1], val[1], pos[2], val[2], 0.0);
        if left > val[0] {
            val[0] = left;
        }
        let right = extrapolate(
            pos[m - 3],
            val[m - 3],
            pos[m - 2],
            val[m - 2],
            (n - 1) as f64,
        );
        if right > val[m - 1] {
            val[m - 1] = right;
        }
    }
}

/// Locate the local minima of `x`, including both endpoints.
///
/// Mirror image of [`find_maxima`].
pub(crate) fn find_minima(x: &[f64], pos: &mut Vec<f64>, val: &mut Vec<f64>) {
    pos.clear();
    val.clear();
    let n = x.len();
    if n == 0 {
        return;
    }
    pos.push(0.0);
    val.push(x[0]);
    if n == 1 {
        return;
    }
    let mut slope = Slope::None;
    let mut flat_len = 0usize;
    for i in 0..n - 1 {
        if x[i + 1] < x[i] {
            slope = Slope::Down;
            flat_len = 0;
        } else if x[i + 1] > x[i] {
            if slope == Slope::Down {
                pos.push(i as f64 - flat_len as f64 / 2.0);
                val.push(x[i]);
            }
            slope = Slope::Up;
            flat_len = 0;
        } else {
            flat_len += 1;
        }
    }
    pos.push((n - 1) as f64);
    val.push(x[n - 1]);
    let m = pos.len();
    if m >= 4 {
        let left = extrapolate(pos[1], val[1], pos[2], val[2], 0.0);
        if left < val[0] {
            val[0] = left;
        }
        let right = extrapolate(
            pos[m - 3],
            val[m - 3],
            pos[m - 2],
            val[m - 2],
            (n - 1) as f64,
        );
        if right < val[m - 1] {
            val[m - 1] = right;
        }
    }
}

/// Count interior zero crossings: sign flips between strictly positive and
/// strictly negative samples. Exact zeros do not reset the tracked sign.
pub(crate) fn count_zero_crossings(x: &[f64]) -> usize {
    let mut count = 0;
    let mut prev = Sign::None;
    for &v in x {
        if v > 0.0 {
            if prev == Sign::Neg {
                count += 1;
            }
            prev = Sign::Pos;
        } else if v < 0.0 {
            if prev == Sign::Pos {
                count += 1;
            }
            prev = Sign::Neg;
        }
    }
    count
}
