/// Computes the arithmetic mean of a slice of values. Returns 0.0 for empty input.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Replaces any value outside `[0, 1]` (including NaN) with the last value
/// that was inside it, starting from 0.
pub fn settle_ratios(values: &[f64], carry: &mut f64) -> Vec<f64> {
    values
        .iter()
        .map(|&value| {
            if (0.0..=1.0).contains(&value) {
                *carry = value;
            }
            *carry
        })
        .collect()
}
