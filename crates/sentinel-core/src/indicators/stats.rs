//! Aggregate statistics shared by the estimators.
//!
//! All helpers are total over their input: degenerate samples yield `None`
//! (or `0.0` for the square root) rather than NaN.

/// Upper bound on Newton iterations in [`newton_sqrt`]
pub const SQRT_MAX_ITERATIONS: usize = 100;

/// Geometric mean of the strictly positive values.
///
/// Computed as `exp(mean(ln p))` so long windows of large prices never
/// overflow. Zero, negative and NaN entries are left out of both the sum
/// and the count. Returns `None` when nothing is left.
pub fn geometric_mean(values: &[f64]) -> Option<f64> {
    let (log_sum, count) = values
        .iter()
        .filter(|v| **v > 0.0)
        .fold((0.0_f64, 0_usize), |(sum, n), v| (sum + v.ln(), n + 1));

    if count == 0 {
        return None;
    }

    Some((log_sum / count as f64).exp())
}

/// Arithmetic mean
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Unbiased sample variance (divisor `n - 1`); `None` below two samples
pub fn sample_variance(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let mean = mean(values)?;
    let squares: f64 = values.iter().map(|v| (v - mean) * (v - mean)).sum();
    Some(squares / (values.len() - 1) as f64)
}

/// Square root by Newton iteration.
///
/// Negative, zero and NaN operands return `0.0`. The seed is the power of
/// two nearest the root (half the binary exponent), so a handful of steps
/// converge for any finite operand. After the first step the iterates
/// decrease monotonically and the loop stops once they stop moving.
pub fn newton_sqrt(x: f64) -> f64 {
    if x.is_nan() || x <= 0.0 {
        return 0.0;
    }
    if x.is_infinite() {
        return x;
    }

    #[allow(clippy::cast_possible_truncation)]
    let mut z = 2f64.powi((x.log2() / 2.0).round() as i32);
    for _ in 0..SQRT_MAX_ITERATIONS {
        let next = 0.5 * (z + x / z);
        if (z - next).abs() <= f64::EPSILON * next {
            return next;
        }
        z = next;
    }
    z
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() <= 1e-9 * b.abs().max(1.0)
    }

    #[test]
    fn test_geometric_mean_of_constant_series() {
        let prices = vec![43_210.5; 200];
        assert!(close(geometric_mean(&prices).unwrap(), 43_210.5));
    }

    #[test]
    fn test_geometric_mean_skips_non_positive() {
        // geometric mean of 2 and 8 is 4; the zero and negative entries are ignored
        let values = [2.0, 0.0, 8.0, -5.0];
        assert!(close(geometric_mean(&values).unwrap(), 4.0));
        assert_eq!(geometric_mean(&[0.0, -1.0]), None);
        assert_eq!(geometric_mean(&[]), None);
    }

    #[test]
    fn test_geometric_mean_does_not_overflow() {
        let prices = vec![1e300; 500];
        assert!(close(geometric_mean(&prices).unwrap(), 1e300));
    }

    #[test]
    fn test_sample_variance_uses_n_minus_one() {
        // mean 2, squared deviations 1 + 1 = 2, divided by n - 1 = 1
        assert!(close(sample_variance(&[1.0, 3.0]).unwrap(), 2.0));
        assert_eq!(sample_variance(&[5.0]), None);
        assert!(close(mean(&[1.0, 2.0, 6.0]).unwrap(), 3.0));
    }

    #[test]
    fn test_newton_sqrt() {
        assert!(close(newton_sqrt(16.0), 4.0));
        assert!(close(newton_sqrt(2.0), std::f64::consts::SQRT_2));
        assert!(close(newton_sqrt(1e-8), 1e-4));
        assert!(close(newton_sqrt(1.44), 1.2));
        assert!(close(newton_sqrt(1e12), 1e6));
        assert!(close(newton_sqrt(1e100), 1e50));
        assert!(close(newton_sqrt(1e300), 1e150));
        assert!(close(newton_sqrt(1e-300), 1e-150));
        assert_eq!(newton_sqrt(0.0), 0.0);
        assert_eq!(newton_sqrt(-4.0), 0.0);
        assert_eq!(newton_sqrt(f64::NAN), 0.0);
    }
}
