//! # Ensemble Empirical Mode Decomposition
//!
//! This crate decomposes one-dimensional signals into Intrinsic Mode
//! Functions (IMFs): oscillatory components whose local mean is close to
//! zero, extracted directly from the data without a fixed basis.
//!
//! ## Overview
//!
//! Three decomposition front ends share one sifting engine:
//!
//! - **EEMD** ([`eemd`]): average many noise-perturbed EMD runs; an
//!   ensemble of one with zero noise is plain EMD
//! - **CEEMDAN** ([`ceemdan`]): extract modes stage by stage with
//!   adaptive noise, so the modes sum back to the input exactly
//! - **BEMD / MEMD** ([`bemd`], [`memd`]): complex and multichannel
//!   signals via envelopes of directional projections
//!
//! Ensemble members run in parallel on a rayon thread pool, and results are
//! reproducible for a fixed [`EnsembleConfig::rng_seed`] no matter how many
//! threads execute them.
//!
//! ## Example
//!
//! ```rust
//! use ::eemd::{eemd, emd_num_imfs, EnsembleConfig};
//!
//! // A slow and a fast oscillation on a linear trend
//! let signal: Vec<f64> = (0..512)
//!     .map(|i| {
//!         let t = i as f64 / 512.0;
//!         (2.0 * std::f64::consts::PI * 4.0 * t).sin()
//!             + 0.5 * (2.0 * std::f64::consts::PI * 63.0 * t).sin()
//!             + t
//!     })
//!     .collect();
//!
//! let modes = eemd(&signal, 0, &EnsembleConfig::default()).unwrap();
//! assert_eq!(modes.len(), emd_num_imfs(512));
//! assert!(modes.iter().all(|m| m.len() == signal.len()));
//! ```

pub mod ceemdan;
pub mod eemd;
pub mod emd;
pub mod error;
pub mod memd;

mod extrema;
mod sift;
mod spline;
mod stats;

pub use ceemdan::ceemdan;
pub use eemd::{eemd, EnsembleConfig};
pub use emd::emd_num_imfs;
pub use error::{report_if_error, report_to_stream_if_error, EmdError, EmdResult};
pub use memd::{bemd, memd, uniform_directions};

pub use num_complex::Complex64;
