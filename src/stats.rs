//! Descriptive statistics used to scale ensemble noise.

/// Arithmetic mean of a sample. Zero for an empty sample.
pub(crate) fn mean(data: &[f64]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    data.iter().sum::<f64>() / data.len() as f64
}

/// Sample standard deviation with the N-1 denominator.
///
/// Samples shorter than two elements have no spread to estimate and
/// report zero.
pub(crate) fn sd(data: &[f64]) -> f64 {
    if data.len() < 2 {
        return 0.0;
    }
    let m = mean(data);
    let ss: f64 = data.iter().map(|&x| (x - m) * (x - m)).sum();
    (ss / (data.len() - 1) as f64).sqrt()
}
