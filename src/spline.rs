//! Envelope evaluation through extremum knots.
//!
//! Evaluates a smooth curve through the given knot points at every integer
//! sample position `0..N`. The curve order adapts to the knot count: two
//! knots give a straight line, three the parabola through all of them, four
//! or more a natural cubic spline. The cubic case solves for the interior
//! second derivatives with the Thomas algorithm inside a caller-provided
//! scratch slice; the scratch is sized once per sifting workspace for the
//! worst case where every sample is a knot, and never resized.

use crate::error::{EmdError, EmdResult};

/// Scratch length needed to evaluate a spline over `n` samples.
///
/// Four tridiagonal bands of at most `n - 2` interior unknowns each fit in
/// `5n - 10` with room to spare.
pub(crate) const fn scratch_len(n: usize) -> usize {
    if n > 2 {
        5 * n - 10
    } else {
        0
    }
}

/// Evaluate the envelope through `(knot_x[i], knot_y[i])` at positions
/// `0, 1, ..., out.len() - 1`.
///
/// Knot positions must start at 0, be strictly increasing, and end at the
/// last sample position.
pub(crate) fn evaluate_spline(
    knot_x: &[f64],
    knot_y: &[f64],
    out: &mut [f64],
    scratch: &mut [f64],
) -> EmdResult<()> {
    let m = knot_x.len();
    let n = out.len();
    debug_assert_eq!(knot_y.len(), m);
    if m < 2 {
        return Err(EmdError::NotEnoughPointsForSpline);
    }
    if knot_x[0] != 0.0 || knot_x[m - 1] != (n - 1) as f64 {
        return Err(EmdError::InvalidSplinePoints);
    }
    if knot_x.windows(2).any(|w| w[1] <= w[0]) {
        return Err(EmdError::InvalidSplinePoints);
    }
    match m {
        2 => {
            let slope = (knot_y[1] - knot_y[0]) / (knot_x[1] - knot_x[0]);
            for (i, o) in out.iter_mut().enumerate() {
                *o = knot_y[0] + slope * i as f64;
            }
        }
        3 => evaluate_parabola(knot_x, knot_y, out),
        _ => evaluate_natural_cubic(knot_x, knot_y, out, scratch),
    }
    Ok(())
}

/// The unique second-degree polynomial through three points, in Lagrange form.
fn evaluate_parabola(xs: &[f64], ys: &[f64], out: &mut [f64]) {
    let (x0, x1, x2) = (xs[0], xs[1], xs[2]);
    let w0 = ys[0] / ((x0 - x1) * (x0 - x2));
    let w1 = ys[1] / ((x1 - x0) * (x1 - x2));
    let w2 = ys[2] / ((x2 - x0) * (x2 - x1));
    for (i, o) in out.iter_mut().enumerate() {
        let t = i as f64;
        *o = w0 * (t - x1) * (t - x2) + w1 * (t - x0) * (t - x2) + w2 * (t - x0) * (t - x1);
    }
}

/// Natural cubic spline: zero second derivative at both ends, interior
/// second derivatives from a tridiagonal solve carried out in `scratch`.
fn evaluate_natural_cubic(xs: &[f64], ys: &[f64], out: &mut [f64], scratch: &mut [f64]) {
    let m = xs.len();
    let k = m - 2;
    let (sub, rest) = scratch.split_at_mut(k);
    let (diag, rest) = rest.split_at_mut(k);
    let (sup, rest) = rest.split_at_mut(k);
    let (rhs, _) = rest.split_at_mut(k);

    for i in 0..k {
        let h0 = xs[i + 1] - xs[i];
        let h1 = xs[i + 2] - xs[i + 1];
        sub[i] = h0;
        diag[i] = 2.0 * (h0 + h1);
        sup[i] = h1;
        rhs[i] = 3.0 * ((ys[i + 2] - ys[i + 1]) / h1 - (ys[i + 1] - ys[i]) / h0);
    }

    // Thomas algorithm: forward elimination, then back substitution.
    // Afterwards rhs[i] holds the second-derivative coefficient c[i + 1].
    for i in 1..k {
        let w = sub[i] / diag[i - 1];
        diag[i] -= w * sup[i - 1];
        rhs[i] -= w * rhs[i - 1];
    }
    rhs[k - 1] /= diag[k - 1];
    for i in (0..k - 1).rev() {
        rhs[i] = (rhs[i] - sup[i] * rhs[i + 1]) / diag[i];
    }

    let c = |j: usize| -> f64 {
        if j == 0 || j == m - 1 {
            0.0
        } else {
            rhs[j - 1]
        }
    };
    let coeffs = |j: usize| -> (f64, f64, f64) {
        let h = xs[j + 1] - xs[j];
        let cj = c(j);
        let cj1 = c(j + 1);
        let b = (ys[j + 1] - ys[j]) / h - h * (cj1 + 2.0 * cj) / 3.0;
        let d = (cj1 - cj) / (3.0 * h);
        (b, cj, d)
    };

    let mut seg = 0usize;
    let (mut b, mut cj, mut d) = coeffs(0);
    for (i, o) in out.iter_mut().enumerate() {
        let t = i as f64;
        while seg + 2 < m && t > xs[seg + 1] {
            seg += 1;
            let (nb, nc, nd) = coeffs(seg);
            b = nb;
            cj = nc;
            d = nd;
        }
        let dx = t - xs[seg];
        *o = ys[seg] + dx * (b + dx * (cj + dx * d));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn eval(xs: &[f64], ys: &[f64], n: usize) -> EmdResult<Vec<f64>> {
        let mut out = vec![0.0; n];
        let mut scratch = vec![0.0; scratch_len(n)];
        evaluate_spline(xs, ys, &mut out, &mut scratch)?;
        Ok(out)
    }

    #[test]
    fn test_too_few_knots() {
        assert_eq!(
            eval(&[0.0], &[1.0], 4),
            Err(EmdError::NotEnoughPointsForSpline)
        );
    }

    #[test]
    fn test_invalid_knots() {
        // Does not start at 0
        assert_eq!(
            eval(&[1.0, 3.0], &[0.0, 0.0], 4),
            Err(EmdError::InvalidSplinePoints)
        );
        // Does not span the signal
        assert_eq!(
            eval(&[0.0, 2.0], &[0.0, 0.0], 4),
            Err(EmdError::InvalidSplinePoints)
        );
        // Not strictly increasing
        assert_eq!(
            eval(&[0.0, 2.0, 2.0, 4.0], &[0.0, 1.0, 1.0, 0.0], 5),
            Err(EmdError::InvalidSplinePoints)
        );
    }

    #[test]
    fn test_two_knots_line() {
        let out = eval(&[0.0, 4.0], &[1.0, 9.0], 5).unwrap();
        for (i, &v) in out.iter().enumerate() {
            assert_relative_eq!(v, 1.0 + 2.0 * i as f64, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_three_knots_exact_parabola() {
        // y = t^2 sampled at knots 0, 2, 4 reproduces t^2 everywhere
        let out = eval(&[0.0, 2.0, 4.0], &[0.0, 4.0, 16.0], 5).unwrap();
        for (i, &v) in out.iter().enumerate() {
            assert_relative_eq!(v, (i * i) as f64, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_cubic_interpolates_knots() {
        let xs = [0.0, 2.0, 5.0, 7.0, 9.0];
        let ys = [1.0, -2.0, 0.5, 3.0, -1.0];
        let out = eval(&xs, &ys, 10).unwrap();
        for (&x, &y) in xs.iter().zip(ys.iter()) {
            assert_relative_eq!(out[x as usize], y, epsilon = 1e-10);
        }
    }

    #[test]
    fn test_cubic_with_half_integer_knots() {
        let xs = [0.0, 1.5, 3.0, 4.5, 6.0];
        let ys = [0.0, 1.0, 0.0, -1.0, 0.0];
        let out = eval(&xs, &ys, 7).unwrap();
        assert_relative_eq!(out[0], 0.0, epsilon = 1e-12);
        assert_relative_eq!(out[3], 0.0, epsilon = 1e-10);
        assert_relative_eq!(out[6], 0.0, epsilon = 1e-12);
        // Between the first two knots the curve stays between their values
        assert!(out[1] > 0.0 && out[1] < 1.1);
    }

    #[test]
    fn test_linearity_under_negation() {
        let xs = [0.0, 2.0, 4.0, 6.0, 8.0];
        let ys = [0.5, 2.0, -1.0, 1.5, 0.0];
        let neg: Vec<f64> = ys.iter().map(|&y| -y).collect();
        let a = eval(&xs, &ys, 9).unwrap();
        let b = eval(&xs, &neg, 9).unwrap();
        for (&u, &v) in a.iter().zip(b.iter()) {
            assert_eq!(u, -v);
        }
    }
}
