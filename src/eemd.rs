//! Ensemble EMD: average many noise-perturbed EMD runs.
//!
//! Every ensemble member decomposes `input + Gaussian(0, noise_strength *
//! sd(input))` and accumulates its rows into one shared output matrix under
//! per-row locks; the matrix is divided by the ensemble size afterwards.
//! Member `i` always seeds its noise generator with `rng_seed + i`, so the
//! result is reproducible regardless of how the members are scheduled
//! across worker threads.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::emd::{emd_num_imfs, emd_onto, EmdWorkspace, SharedImfMatrix};
use crate::error::{validate_ensemble_parameters, EmdError, EmdResult};
use crate::stats;

/// Knobs shared by the ensemble decompositions.
///
/// An ensemble of one with zero noise is plain EMD; an ensemble of more
/// than one requires positive noise (and vice versa). At least one stopping
/// criterion must be enabled: `s_number == 0` disables the stability
/// criterion, `num_siftings == 0` disables the fixed iteration budget.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnsembleConfig {
    /// Number of ensemble members. One means plain EMD.
    pub ensemble_size: usize,
    /// Noise standard deviation as a fraction of the input's.
    pub noise_strength: f64,
    /// Iterations of extremum-count stability required for convergence.
    pub s_number: u32,
    /// Hard cap on sifting iterations per IMF.
    pub num_siftings: u32,
    /// Base RNG seed; member `i` uses `rng_seed + i`.
    pub rng_seed: u64,
}

impl Default for EnsembleConfig {
    fn default() -> Self {
        Self {
            ensemble_size: 100,
            noise_strength: 0.2,
            s_number: 4,
            num_siftings: 50,
            rng_seed: 0,
        }
    }
}

/// Per-worker scratch: a working copy of the signal plus nested EMD
/// buffers. One per worker thread, reused across the ensemble members that
/// thread picks up.
#[derive(Debug)]
pub(crate) struct EnsembleWorkspace {
    pub(crate) signal: Vec<f64>,
    pub(crate) emd: EmdWorkspace,
}

impl EnsembleWorkspace {
    pub(crate) fn new(num_samples: usize) -> Self {
        Self {
            signal: vec![0.0; num_samples],
            emd: EmdWorkspace::new(num_samples),
        }
    }
}

/// Sticky first-error flag shared by the workers of one parallel region.
///
/// Workers check [`FirstError::is_set`] before starting a unit of work and
/// skip the rest of the region once any worker has recorded a failure.
pub(crate) struct FirstError {
    raised: AtomicBool,
    error: Mutex<Option<EmdError>>,
}

impl FirstError {
    pub(crate) fn new() -> Self {
        Self {
            raised: AtomicBool::new(false),
            error: Mutex::new(None),
        }
    }

    pub(crate) fn is_set(&self) -> bool {
        self.raised.load(Ordering::Relaxed)
    }

    pub(crate) fn record(&self, err: EmdError) {
        self.raised.store(true, Ordering::Relaxed);
        self.error.lock().unwrap().get_or_insert(err);
    }

    pub(crate) fn into_result(self) -> EmdResult<()> {
        match self.error.into_inner().unwrap() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

/// Ensemble Empirical Mode Decomposition.
///
/// Returns `num_imfs` rows of `input.len()` samples, the last row being the
/// residual trend; `num_imfs == 0` resolves to [`emd_num_imfs`]. With
/// `ensemble_size == 1` and `noise_strength == 0` this is a plain EMD run.
///
/// # Example
///
/// ```
/// use eemd::{eemd, EnsembleConfig};
///
/// let signal: Vec<f64> = (0..128).map(|i| (i as f64 * 0.3).sin()).collect();
/// let config = EnsembleConfig {
///     ensemble_size: 4,
///     noise_strength: 0.2,
///     rng_seed: 7,
///     ..EnsembleConfig::default()
/// };
/// let modes = eemd(&signal, 0, &config).unwrap();
/// assert_eq!(modes.len(), 7); // floor(log2(128))
/// ```
pub fn eemd(input: &[f64], num_imfs: usize, config: &EnsembleConfig) -> EmdResult<Vec<Vec<f64>>> {
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
    // Noise sigma is relative to the spread of the input data.
    let noise_sigma = if config.noise_strength > 0.0 {
        stats::sd(input) * config.noise_strength
    } else {
        0.0
    };
    let output = SharedImfMatrix::zeros(num_rows, n);
    let first_error = FirstError::new();
    // The parallel items are the ensemble members themselves, so no more
    // than `ensemble_size` of them ever run at once. Each worker thread
    // builds one workspace and reuses it for every member it processes.
    (0..config.ensemble_size).into_par_iter().for_each_init(
        || EnsembleWorkspace::new(n),
        |w, member| {
            if first_error.is_set() {
                return;
            }
            w.signal.copy_from_slice(input);
            if config.noise_strength > 0.0 {
                // Seed from the member index, not the thread, so the
                // realization assigned to each member is fixed.
                let mut rng = StdRng::seed_from_u64(config.rng_seed.wrapping_add(member as u64));
                let normal = Normal::new(0.0, noise_sigma).unwrap();
                for v in w.signal.iter_mut() {
                    *v += normal.sample(&mut rng);
                }
            }
            if let Err(err) = emd_onto(
                &mut w.signal,
                &mut w.emd,
                &output,
                config.s_number,
                config.num_siftings,
            ) {
                first_error.record(err);
            }
        },
    );
    first_error.into_result()?;
    let scale = if config.ensemble_size > 1 {
        1.0 / config.ensemble_size as f64
    } else {
        1.0
    };
    Ok(output.into_rows(scale))
}
