//! The sifting procedure: reduce a working signal to a single IMF.
//!
//! Each iteration finds the extrema of the working signal, fits the upper
//! and lower envelopes through them, and subtracts the pointwise envelope
//! mean. Iteration stops when the S-number stability criterion fires, or
//! when a fixed sifting budget is exhausted; parameter validation guarantees
//! at least one of the two is enabled before sifting ever starts.
//!
//! The S-number criterion declares convergence once the counts of maxima,
//! minima and zero crossings have changed by at most one in total for
//! `s_number` consecutive iterations, *and* the interior extremum and
//! zero-crossing counts differ by at most one. Both endpoints sit in both
//! extremum lists, which inflates the extremum count by four; the `- 4`
//! below removes them.

use crate::error::EmdResult;
use crate::extrema::{count_zero_crossings, find_maxima, find_minima};
use crate::spline::{evaluate_spline, scratch_len};

/// Scratch buffers for one sifting call, allocated once and reused across
/// sifting iterations and across the IMF extractions of one EMD run.
#[derive(Debug)]
pub(crate) struct SiftingWorkspace {
    max_pos: Vec<f64>,
    max_val: Vec<f64>,
    min_pos: Vec<f64>,
    min_val: Vec<f64>,
    upper: Vec<f64>,
    lower: Vec<f64>,
    scratch: Vec<f64>,
}

impl SiftingWorkspace {
    pub(crate) fn new(num_samples: usize) -> Self {
        Self {
            max_pos: Vec::with_capacity(num_samples),
            max_val: Vec::with_capacity(num_samples),
            min_pos: Vec::with_capacity(num_samples),
            min_val: Vec::with_capacity(num_samples),
            upper: vec![0.0; num_samples],
            lower: vec![0.0; num_samples],
            // Worst case: every sample is an extremum.
            scratch: vec![0.0; scratch_len(num_samples)],
        }
    }
}

/// Sift `x` in place until it is an IMF, returning the number of sifting
/// iterations used.
///
/// `s_number == 0` disables the stability criterion; `num_siftings == 0`
/// disables the fixed budget.
pub(crate) fn sift(
    x: &mut [f64],
    w: &mut SiftingWorkspace,
    s_number: u32,
    num_siftings: u32,
) -> EmdResult<u32> {
    let mut sift_counter: u32 = 0;
    let mut s_counter: u32 = 0;
    let mut num_max: i64 = -1;
    let mut num_min: i64 = -1;
    let mut num_zc: i64 = -1;
    while num_siftings == 0 || sift_counter < num_siftings {
        sift_counter += 1;
        if sift_counter == 10_000 {
            tracing::warn!(
                siftings = sift_counter,
                "sift counter has reached 10000; convergence is suspect"
            );
        }
        let prev_num_max = num_max;
        let prev_num_min = num_min;
        let prev_num_zc = num_zc;
        find_maxima(x, &mut w.max_pos, &mut w.max_val);
        find_minima(x, &mut w.min_pos, &mut w.min_val);
        num_max = w.max_pos.len() as i64;
        num_min = w.min_pos.len() as i64;
        num_zc = count_zero_crossings(x) as i64;
        if s_number != 0 {
            let total_change = (num_max - prev_num_max).abs()
                + (num_min - prev_num_min).abs()
                + (num_zc - prev_num_zc).abs();
            if total_change <= 1 {
                s_counter += 1;
                if s_counter >= s_number && (num_max + num_min - 4 - num_zc).abs() <= 1 {
                    // Counts stable for s_number steps and interior extrema
                    // agree with zero crossings: converged.
                    break;
                }
            } else {
                s_counter = 0;
            }
        }
        evaluate_spline(&w.max_pos, &w.max_val, &mut w.upper, &mut w.scratch)?;
        evaluate_spline(&w.min_pos, &w.min_val, &mut w.lower, &mut w.scratch)?;
        for (i, v) in x.iter_mut().enumerate() {
            *v -= 0.5 * (w.upper[i] + w.lower[i]);
        }
    }
    Ok(sift_counter)
}
