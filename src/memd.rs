//! Multivariate EMD and its bivariate specialization.
//!
//! A multivariate signal has no pointwise ordering, so upper and lower
//! envelopes do not exist. Instead the signal is projected onto a set of
//! direction vectors; each projection is a scalar signal whose maxima are
//! interpolated into one directional envelope, and the mean envelope is the
//! direction-weighted average of those, scaled by `2 / num_directions` so
//! that opposite direction pairs reproduce the scalar envelope mean.
//! Sifting subtracts the mean envelope a fixed number of times per mode.
//!
//! [`bemd`] is the two-channel case with complex samples: channel 0 is the
//! real part, channel 1 the imaginary part, and each direction is a point
//! on the unit circle given by its angle.

use num_complex::Complex64;

use crate::emd::emd_num_imfs;
use crate::error::{EmdError, EmdResult};
use crate::extrema::find_maxima;
use crate::spline::{evaluate_spline, scratch_len};

/// `count` direction angles uniformly spaced over the unit circle.
pub fn uniform_directions(count: usize) -> Vec<f64> {
    (0..count)
        .map(|d| 2.0 * std::f64::consts::PI * (d + 1) as f64 / count as f64)
        .collect()
}

struct MemdWorkspace {
    projected: Vec<f64>,
    max_pos: Vec<f64>,
    max_val: Vec<f64>,
    envelope: Vec<f64>,
    scratch: Vec<f64>,
    mean: Vec<Vec<f64>>,
}

impl MemdWorkspace {
    fn new(num_channels: usize, num_samples: usize) -> Self {
        Self {
            projected: vec![0.0; num_samples],
            max_pos: Vec::with_capacity(num_samples),
            max_val: Vec::with_capacity(num_samples),
            envelope: vec![0.0; num_samples],
            scratch: vec![0.0; scratch_len(num_samples)],
            mean: vec![vec![0.0; num_samples]; num_channels],
        }
    }
}

/// One sifting iteration: subtract the projection-mean envelope from `x`.
fn memd_sift_once(
    x: &mut [Vec<f64>],
    directions: &[Vec<f64>],
    w: &mut MemdWorkspace,
) -> EmdResult<()> {
    let n = x[0].len();
    for row in w.mean.iter_mut() {
        row.iter_mut().for_each(|v| *v = 0.0);
    }
    for dir in directions {
        for i in 0..n {
            let mut p = 0.0;
            for (ch, d) in dir.iter().enumerate() {
                p += d * x[ch][i];
            }
            w.projected[i] = p;
        }
        find_maxima(&w.projected, &mut w.max_pos, &mut w.max_val);
        evaluate_spline(&w.max_pos, &w.max_val, &mut w.envelope, &mut w.scratch)?;
        for (ch, d) in dir.iter().enumerate() {
            for (m, &e) in w.mean[ch].iter_mut().zip(w.envelope.iter()) {
                *m += d * e;
            }
        }
    }
    let scale = 2.0 / directions.len() as f64;
    for (xc, mc) in x.iter_mut().zip(w.mean.iter()) {
        for (v, &m) in xc.iter_mut().zip(mc.iter()) {
            *v -= scale * m;
        }
    }
    Ok(())
}

/// Multivariate Empirical Mode Decomposition.
///
/// `channels` holds one equally long sample vector per signal channel, and
/// each direction vector has one component per channel. The result is
/// indexed `[mode][channel][sample]` with `num_imfs` modes (0 = auto from
/// the sample count), the last being the residual. Sifting always runs for
/// exactly `num_siftings` iterations per mode; there is no adaptive
/// stopping criterion for projected envelopes.
pub fn memd(
    channels: &[Vec<f64>],
    directions: &[Vec<f64>],
    num_imfs: usize,
    num_siftings: u32,
) -> EmdResult<Vec<Vec<Vec<f64>>>> {
    if num_siftings == 0 {
        return Err(EmdError::NoConvergencePossible);
    }
    let num_channels = channels.len();
    if directions.is_empty() || directions.iter().any(|d| d.len() != num_channels) {
        return Err(EmdError::InvalidDirections);
    }
    if num_channels == 0 {
        return Ok(Vec::new());
    }
    let n = channels[0].len();
    assert!(
        channels.iter().all(|c| c.len() == n),
        "all channels must have the same length"
    );
    if n == 0 {
        return Ok(Vec::new());
    }
    let num_rows = if num_imfs == 0 {
        emd_num_imfs(n)
    } else {
        num_imfs
    };

    let mut w = MemdWorkspace::new(num_channels, n);
    let mut residual: Vec<Vec<f64>> = channels.to_vec();
    let mut x: Vec<Vec<f64>> = vec![vec![0.0; n]; num_channels];
    let mut modes: Vec<Vec<Vec<f64>>> = Vec::with_capacity(num_rows);

    for _ in 0..num_rows - 1 {
        for (xc, rc) in x.iter_mut().zip(residual.iter()) {
            xc.copy_from_slice(rc);
        }
        for _ in 0..num_siftings {
            memd_sift_once(&mut x, directions, &mut w)?;
        }
        for (rc, xc) in residual.iter_mut().zip(x.iter()) {
            for (r, &v) in rc.iter_mut().zip(xc.iter()) {
                *r -= v;
            }
        }
        modes.push(x.clone());
    }
    modes.push(residual);
    Ok(modes)
}

/// Bivariate EMD over complex samples.
///
/// A thin wrapper around [`memd`] with two channels (real and imaginary
/// parts) and unit-circle directions given by their angles, typically from
/// [`uniform_directions`]. Returns `[mode][sample]` complex rows.
pub fn bemd(
    input: &[Complex64],
    direction_angles: &[f64],
    num_imfs: usize,
    num_siftings: u32,
) -> EmdResult<Vec<Vec<Complex64>>> {
    let channels = vec![
        input.iter().map(|z| z.re).collect::<Vec<f64>>(),
        input.iter().map(|z| z.im).collect::<Vec<f64>>(),
    ];
    let directions: Vec<Vec<f64>> = direction_angles
        .iter()
        .map(|&phi| vec![phi.cos(), phi.sin()])
        .collect();
    let modes = memd(&channels, &directions, num_imfs, num_siftings)?;
    Ok(modes
        .into_iter()
        .map(|mode| {
            mode[0]
                .iter()
                .zip(mode[1].iter())
                .map(|(&re, &im)| Complex64::new(re, im))
                .collect()
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::PI;

    fn two_tone(n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| {
                let t = i as f64 / n as f64;
                (2.0 * PI * 5.0 * t).sin() + 0.5 * (2.0 * PI * 29.0 * t).cos()
            })
            .collect()
    }

    #[test]
    fn test_uniform_directions() {
        let dirs = uniform_directions(4);
        assert_eq!(dirs.len(), 4);
        assert_relative_eq!(dirs[0], PI / 2.0, epsilon = 1e-12);
        assert_relative_eq!(dirs[3], 2.0 * PI, epsilon = 1e-12);
    }

    #[test]
    fn test_zero_siftings_rejected() {
        let channels = vec![vec![0.0; 16]];
        let directions = vec![vec![1.0], vec![-1.0]];
        assert_eq!(
            memd(&channels, &directions, 2, 0),
            Err(EmdError::NoConvergencePossible)
        );
    }

    #[test]
    fn test_bad_directions_rejected() {
        let channels = vec![vec![0.0; 16], vec![0.0; 16]];
        assert_eq!(
            memd(&channels, &[], 2, 10),
            Err(EmdError::InvalidDirections)
        );
        let short = vec![vec![1.0]];
        assert_eq!(
            memd(&channels, &short, 2, 10),
            Err(EmdError::InvalidDirections)
        );
    }

    #[test]
    fn test_memd_reconstruction() {
        let channels = vec![two_tone(128), two_tone(128).iter().map(|v| -v).collect()];
        let directions = vec![
            vec![1.0, 0.0],
            vec![0.0, 1.0],
            vec![-1.0, 0.0],
            vec![0.0, -1.0],
        ];
        let modes = memd(&channels, &directions, 4, 10).unwrap();
        assert_eq!(modes.len(), 4);
        for ch in 0..2 {
            for i in 0..128 {
                let sum: f64 = modes.iter().map(|m| m[ch][i]).sum();
                assert_relative_eq!(sum, channels[ch][i], epsilon = 1e-9, max_relative = 1e-9);
            }
        }
    }

    #[test]
    fn test_bemd_reconstruction() {
        let n = 256;
        let input: Vec<Complex64> = (0..n)
            .map(|i| {
                let t = i as f64 * 2.0 * PI / n as f64;
                Complex64::new(0.0, 2.0 * t).exp() * (0.3 * t).cos()
                    + Complex64::new(0.0, 17.0 * t).exp() * 0.3 * (2.3 * t).sin().abs()
            })
            .collect();
        let modes = bemd(&input, &uniform_directions(16), 3, 10).unwrap();
        assert_eq!(modes.len(), 3);
        for i in 0..n {
            let sum: Complex64 = modes.iter().map(|m| m[i]).sum();
            assert_relative_eq!(sum.re, input[i].re, epsilon = 1e-9, max_relative = 1e-9);
            assert_relative_eq!(sum.im, input[i].im, epsilon = 1e-9, max_relative = 1e-9);
        }
    }

    #[test]
    fn test_empty_input() {
        let modes = bemd(&[], &uniform_directions(8), 0, 10).unwrap();
        assert!(modes.is_empty());
    }
}
