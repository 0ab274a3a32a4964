//! Plain EMD: peel IMFs off a residual one at a time.
//!
//! The extractor writes into a shared output matrix through one mutex per
//! row, so several EMD runs can accumulate into the same matrix concurrently
//! (this is exactly what the EEMD orchestrator does). Rows `0..M-1` receive
//! sifted IMFs; the final row receives whatever remains after `M-1` modes
//! and is never itself sifted.

use std::sync::Mutex;

use crate::error::EmdResult;
use crate::sift::{sift, SiftingWorkspace};

/// Default number of IMFs for a signal of `num_samples` samples.
///
/// `floor(log2 N)` for N > 3, one for very short signals, zero for empty
/// input.
pub fn emd_num_imfs(num_samples: usize) -> usize {
    if num_samples == 0 {
        0
    } else if num_samples <= 3 {
        1
    } else {
        num_samples.ilog2() as usize
    }
}

/// An M x N output matrix shared across concurrent EMD runs.
///
/// Each row is guarded by its own lock; accumulation is a commutative
/// vector add, so the numerical result does not depend on the order in
/// which runs acquire the locks.
pub(crate) struct SharedImfMatrix {
    rows: Vec<Mutex<Vec<f64>>>,
}

impl SharedImfMatrix {
    pub(crate) fn zeros(num_rows: usize, num_samples: usize) -> Self {
        Self {
            rows: (0..num_rows)
                .map(|_| Mutex::new(vec![0.0; num_samples]))
                .collect(),
        }
    }

    pub(crate) fn num_rows(&self) -> usize {
        self.rows.len()
    }

    /// Add `data` elementwise into row `row` under that row's lock.
    pub(crate) fn add_to_row(&self, row: usize, data: &[f64]) {
        let mut guard = self.rows[row].lock().unwrap();
        for (acc, &v) in guard.iter_mut().zip(data.iter()) {
            *acc += v;
        }
    }

    /// Unwrap into plain rows, scaling every element by `scale`.
    pub(crate) fn into_rows(self, scale: f64) -> Vec<Vec<f64>> {
        self.rows
            .into_iter()
            .map(|row| {
                let mut row = row.into_inner().unwrap();
                if scale != 1.0 {
                    for v in &mut row {
                        *v *= scale;
                    }
                }
                row
            })
            .collect()
    }
}

/// Per-run scratch for EMD: the running residual plus sifting buffers.
/// Reused across all IMF extractions of one run.
#[derive(Debug)]
pub(crate) struct EmdWorkspace {
    pub(crate) residual: Vec<f64>,
    pub(crate) sift: SiftingWorkspace,
}

impl EmdWorkspace {
    pub(crate) fn new(num_samples: usize) -> Self {
        Self {
            residual: vec![0.0; num_samples],
            sift: SiftingWorkspace::new(num_samples),
        }
    }
}

/// Decompose `x` (destroyed in the process) into `output.num_rows()` rows,
/// accumulating each row under its lock.
pub(crate) fn emd_onto(
    x: &mut [f64],
    w: &mut EmdWorkspace,
    output: &SharedImfMatrix,
    s_number: u32,
    num_siftings: u32,
) -> EmdResult<()> {
    let num_rows = output.num_rows();
    if num_rows == 0 {
        return Ok(());
    }
    w.residual.copy_from_slice(x);
    for imf_i in 0..num_rows - 1 {
        if imf_i != 0 {
            // Restore the previous residual as the next input.
            x.copy_from_slice(&w.residual);
        }
        let count = sift(x, &mut w.sift, s_number, num_siftings)?;
        for (r, &v) in w.residual.iter_mut().zip(x.iter()) {
            *r -= v;
        }
        output.add_to_row(imf_i, x);
        tracing::debug!(imf = imf_i + 1, siftings = count, "IMF extracted");
    }
    output.add_to_row(num_rows - 1, &w.residual);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::PI;

    #[test]
    fn test_emd_num_imfs() {
        assert_eq!(emd_num_imfs(0), 0);
        assert_eq!(emd_num_imfs(1), 1);
        assert_eq!(emd_num_imfs(3), 1);
        assert_eq!(emd_num_imfs(4), 2);
        assert_eq!(emd_num_imfs(511), 8);
        assert_eq!(emd_num_imfs(512), 9);
        assert_eq!(emd_num_imfs(1024), 10);
    }

    #[test]
    fn test_shared_matrix_accumulates() {
        let m = SharedImfMatrix::zeros(2, 3);
        m.add_to_row(0, &[1.0, 2.0, 3.0]);
        m.add_to_row(0, &[1.0, 1.0, 1.0]);
        m.add_to_row(1, &[4.0, 4.0, 4.0]);
        let rows = m.into_rows(0.5);
        assert_eq!(rows[0], vec![1.0, 1.5, 2.0]);
        assert_eq!(rows[1], vec![2.0, 2.0, 2.0]);
    }

    #[test]
    fn test_emd_reconstruction() {
        let n = 256;
        let input: Vec<f64> = (0..n)
            .map(|i| {
                let t = i as f64 / n as f64;
                (2.0 * PI * 4.0 * t).sin() + 0.5 * (2.0 * PI * 24.0 * t).sin() + 2.0 * t
            })
            .collect();
        let m = emd_num_imfs(n);
        let output = SharedImfMatrix::zeros(m, n);
        let mut w = EmdWorkspace::new(n);
        let mut x = input.clone();
        emd_onto(&mut x, &mut w, &output, 4, 50).unwrap();
        let rows = output.into_rows(1.0);
        for i in 0..n {
            let sum: f64 = rows.iter().map(|r| r[i]).sum();
            assert_relative_eq!(sum, input[i], epsilon = 1e-9, max_relative = 1e-9);
        }
    }

    #[test]
    fn test_single_row_is_input_copy() {
        let input = vec![1.0, 2.0, 3.0];
        let output = SharedImfMatrix::zeros(1, 3);
        let mut w = EmdWorkspace::new(3);
        let mut x = input.clone();
        emd_onto(&mut x, &mut w, &output, 4, 50).unwrap();
        assert_eq!(output.into_rows(1.0), vec![input]);
    }
}
