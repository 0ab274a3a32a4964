//! Error handling for the decomposition routines.
//!
//! Every decomposition call returns a single terminal [`EmdError`]: parameter
//! problems are caught before any work starts, and computation errors found
//! inside a parallel region drain the region before surfacing to the caller.
//! No partial output is ever returned.

use std::io::{self, Write};
use thiserror::Error;

/// Result type for decomposition operations.
pub type EmdResult<T> = Result<T, EmdError>;

/// Errors that can occur during a decomposition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum EmdError {
    /// The ensemble size was zero.
    #[error("invalid ensemble size (zero)")]
    InvalidEnsembleSize,

    /// The noise strength was negative.
    #[error("invalid noise strength (negative)")]
    InvalidNoiseStrength,

    /// Positive noise strength with an ensemble of one (regular EMD).
    #[error("positive noise strength but ensemble size is one (regular EMD)")]
    NoiseAddedToEmd,

    /// An ensemble of more than one (EEMD) with zero noise strength.
    #[error("ensemble size is more than one (EEMD) but noise strength is zero")]
    NoNoiseAddedToEemd,

    /// Both stopping criteria disabled: sifting would never terminate.
    #[error("stopping criteria invalid: sifting would never converge")]
    NoConvergencePossible,

    /// Spline evaluation attempted with fewer than two knot points.
    #[error("spline evaluation tried with insufficient points")]
    NotEnoughPointsForSpline,

    /// Spline knot positions were unsorted or did not span the signal.
    #[error("spline evaluation points invalid")]
    InvalidSplinePoints,

    /// Raised by stricter callers when sifting runs away without converging.
    #[error("convergence not reached after sifting 10000 times")]
    NoConvergenceInSifting,

    /// Empty or mis-dimensioned direction set for a multivariate decomposition.
    #[error("invalid direction set for multivariate decomposition")]
    InvalidDirections,
}

/// Validate the parameter combination shared by `eemd` and `ceemdan`.
///
/// Runs before any buffer is allocated, so a rejected call does no work.
pub(crate) fn validate_ensemble_parameters(
    ensemble_size: usize,
    noise_strength: f64,
    s_number: u32,
    num_siftings: u32,
) -> EmdResult<()> {
    if ensemble_size < 1 {
        return Err(EmdError::InvalidEnsembleSize);
    }
    if noise_strength < 0.0 {
        return Err(EmdError::InvalidNoiseStrength);
    }
    if ensemble_size == 1 && noise_strength > 0.0 {
        return Err(EmdError::NoiseAddedToEmd);
    }
    if ensemble_size > 1 && noise_strength == 0.0 {
        return Err(EmdError::NoNoiseAddedToEemd);
    }
    if s_number == 0 && num_siftings == 0 {
        return Err(EmdError::NoConvergencePossible);
    }
    Ok(())
}

/// Write a one-line description of the error to `writer` if `result` is an error.
pub fn report_to_stream_if_error<T, W: Write>(
    mut writer: W,
    result: &EmdResult<T>,
) -> io::Result<()> {
    if let Err(err) = result {
        writeln!(writer, "eemd error: {err}")?;
    }
    Ok(())
}

/// Write a one-line description of the error to standard error if `result` is an error.
pub fn report_if_error<T>(result: &EmdResult<T>) {
    let _ = report_to_stream_if_error(io::stderr().lock(), result);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_combinations() {
        assert!(validate_ensemble_parameters(1, 0.0, 4, 0).is_ok());
        assert!(validate_ensemble_parameters(1, 0.0, 0, 10).is_ok());
        assert!(validate_ensemble_parameters(100, 0.2, 4, 50).is_ok());
    }

    #[test]
    fn test_invalid_combinations() {
        assert_eq!(
            validate_ensemble_parameters(0, 0.2, 4, 50),
            Err(EmdError::InvalidEnsembleSize)
        );
        assert_eq!(
            validate_ensemble_parameters(10, -0.1, 4, 50),
            Err(EmdError::InvalidNoiseStrength)
        );
        assert_eq!(
            validate_ensemble_parameters(1, 0.1, 4, 50),
            Err(EmdError::NoiseAddedToEmd)
        );
        assert_eq!(
            validate_ensemble_parameters(5, 0.0, 4, 50),
            Err(EmdError::NoNoiseAddedToEemd)
        );
        assert_eq!(
            validate_ensemble_parameters(1, 0.0, 0, 0),
            Err(EmdError::NoConvergencePossible)
        );
    }

    #[test]
    fn test_report_to_stream() {
        let mut buf = Vec::new();
        let ok: EmdResult<()> = Ok(());
        report_to_stream_if_error(&mut buf, &ok).unwrap();
        assert!(buf.is_empty());

        let err: EmdResult<()> = Err(EmdError::NoConvergencePossible);
        report_to_stream_if_error(&mut buf, &err).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("never converge"));
    }
}
