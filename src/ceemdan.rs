//! CEEMDAN: complete ensemble EMD with adaptive noise.
//!
//! Where EEMD runs each ensemble member through a full EMD and averages at
//! the end, CEEMDAN extracts one mode at a time across the whole ensemble.
//! The noise added at stage `k` is the `k`-th EMD mode of each member's
//! original noise realization, rescaled so the signal-to-noise ratio against
//! the current residual stays fixed at every stage. This removes the
//! residual noise and mode-mixing artifacts that plain EEMD averaging
//! leaves behind.
//!
//! Within one stage the ensemble members run in parallel and accumulate
//! into the stage's output row under a single shared lock; the residual
//! update that follows is sequential, so the stage boundary is a hard
//! synchronization point.

use std::sync::Mutex;

use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use rayon::prelude::*;

use crate::eemd::{EnsembleConfig, EnsembleWorkspace, FirstError};
use crate::emd::emd_num_imfs;
use crate::error::{validate_ensemble_parameters, EmdResult};
use crate::sift::sift;
use crate::stats;

/// Scale factor applied to a noise channel at one stage.
///
/// Chosen so the scaled noise has standard deviation `noise_strength *
/// sd(residual)` no matter how the channel's own amplitude has evolved.
/// Zero when the channel has no spread left.
fn stage_noise_sigma(noise_strength: f64, residual: &[f64], noise: &[f64]) -> f64 {
    let noise_sd = stats::sd(noise);
    if noise_sd != 0.0 {
        noise_strength * stats::sd(residual) / noise_sd
    } else {
        0.0
    }
}

/// Complete Ensemble Empirical Mode Decomposition with Adaptive Noise.
///
/// Same shape contract as [`crate::eemd`]: `num_imfs` rows (0 = auto), last
/// row the residual. Parameters are validated identically.
pub fn ceemdan(
    input: &[f64],
    num_imfs: usize,
    config: &EnsembleConfig,
) -> EmdResult<Vec<Vec<f64>>> {
    validate_ensemble_parameters(
        config.ensemble_size,
        config.noise_strength,
        config.s_number,
        config.num_siftings,
    )?;
    let n = input.len();
    if n == 0 {
        return Ok(Vec::new());
    }
    let num_rows = if num_imfs == 0 {
        emd_num_imfs(n)
    } else {
        num_imfs
    };
    if num_rows == 1 {
        // The only "mode" is the residual, which is the input itself.
        return Ok(vec![input.to_vec()]);
    }
    let ensemble_size = config.ensemble_size;

    // Precompute every member's unit-variance noise realization up front:
    // stage k needs the k-th EMD mode of this exact noise, so it cannot be
    // drawn on the fly.
    let mut noises: Vec<Vec<f64>> = (0..ensemble_size)
        .into_par_iter()
        .map(|member| {
            let mut rng = StdRng::seed_from_u64(config.rng_seed.wrapping_add(member as u64));
            let normal = Normal::new(0.0, 1.0).unwrap();
            (0..n).map(|_| normal.sample(&mut rng)).collect()
        })
        .collect();
    let mut noise_residuals: Vec<Vec<f64>> = vec![vec![0.0; n]; ensemble_size];

    let mut modes: Vec<Vec<f64>> = Vec::with_capacity(num_rows);
    let mut residual = input.to_vec();

    for imf_i in 0..num_rows - 1 {
        // All members of this stage write to the same output row, so one
        // shared lock suffices.
        let row_accum = Mutex::new(vec![0.0; n]);
        let first_error = FirstError::new();
        noises
            .par_iter_mut()
            .zip(noise_residuals.par_iter_mut())
            .for_each_init(
                || EnsembleWorkspace::new(n),
                |w, (noise, noise_residual)| {
                    if first_error.is_set() {
                        return;
                    }
                    // Hold the SNR constant across stages.
                    let sigma = stage_noise_sigma(config.noise_strength, &residual, noise);
                    for ((x, &r), &z) in
                        w.signal.iter_mut().zip(residual.iter()).zip(noise.iter())
                    {
                        *x = r + sigma * z;
                    }
                    match sift(&mut w.signal, &mut w.emd.sift, config.s_number, config.num_siftings)
                    {
                        Ok(_) => {}
                        Err(err) => {
                            first_error.record(err);
                            return;
                        }
                    }
                    {
                        let mut row = row_accum.lock().unwrap();
                        for (acc, &v) in row.iter_mut().zip(w.signal.iter()) {
                            *acc += v;
                        }
                    }
                    // Advance this member's noise channel to its next EMD
                    // mode, ready for the following stage.
                    if imf_i == 0 {
                        noise_residual.copy_from_slice(noise);
                    } else {
                        noise.copy_from_slice(noise_residual);
                    }
                    if let Err(err) =
                        sift(noise, &mut w.emd.sift, config.s_number, config.num_siftings)
                    {
                        first_error.record(err);
                        return;
                    }
                    for (r, &v) in noise_residual.iter_mut().zip(noise.iter()) {
                        *r -= v;
                    }
                },
            );
        first_error.into_result()?;
        let mut imf = row_accum.into_inner().unwrap();
        let scale = 1.0 / ensemble_size as f64;
        for v in &mut imf {
            *v *= scale;
        }
        for (r, &v) in residual.iter_mut().zip(imf.iter()) {
            *r -= v;
        }
        modes.push(imf);
    }
    modes.push(residual);
    Ok(modes)
}
