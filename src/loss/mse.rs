pub struct MseLoss;

impl MseLoss {
    /// Scalar MSE: mean((predicted - expected)²)
    pub fn loss(predicted: &[f64], expected: &[f64]) -> f64 {
        let n = predicted.len() as f64;
        predicted.iter().zip(expected.iter())
            .map(|(a, b)| (a - b).powi(2))
            .sum::<f64>() / n
    }

    /// Per-output gradient: predicted - expected
    pub fn derivative(predicted: &[f64], expected: &[f64]) -> Vec<f64> {
        predicted.iter().zip(expected.iter())
            .map(|(a, b)| a - b)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loss_is_mean_of_squared_errors() {
        let loss = MseLoss::loss(&[1.0, 2.0], &[0.0, 4.0]);
        assert!((loss - (1.0 + 4.0) / 2.0).abs() < 1e-12);
    }

    #[test]
    fn zero_error_means_zero_loss_and_gradient() {
        let p = [0.3, -0.7];
        assert_eq!(MseLoss::loss(&p, &p), 0.0);
        assert!(MseLoss::derivative(&p, &p).iter().all(|&g| g == 0.0));
    }
}
