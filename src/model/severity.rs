//! Accident severity model: multinomial logistic regression over road
//! condition features, returning the raw predicted class.

use crate::model::ModelError;
use serde::{Deserialize, Serialize};

/// Input feature order for the severity model.
pub const SEVERITY_FEATURES: [&str; 8] = [
    "speed",
    "vehicles",
    "casualties",
    "day",
    "light",
    "weather",
    "surface",
    "urban",
];

/// Multinomial logistic model: one weight row and intercept per class.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeverityModel {
    /// Class labels, parallel to `weights` and `intercepts`
    pub classes: Vec<i64>,
    pub weights: Vec<Vec<f64>>,
    pub intercepts: Vec<f64>,
}

impl SeverityModel {
    /// Shape consistency check, run once at load time.
    pub fn validate(&self) -> Result<(), String> {
        if self.classes.is_empty() {
            return Err("model has no classes".to_string());
        }
        if self.weights.len() != self.classes.len() || self.intercepts.len() != self.classes.len()
        {
            return Err(format!(
                "{} classes but {} weight rows and {} intercepts",
                self.classes.len(),
                self.weights.len(),
                self.intercepts.len()
            ));
        }
        let n = SEVERITY_FEATURES.len();
        for (i, row) in self.weights.iter().enumerate() {
            if row.len() != n {
                return Err(format!(
                    "weight row {i} has {} entries, expected {n}",
                    row.len()
                ));
            }
        }
        Ok(())
    }

    /// Predict the class with the highest score.
    pub fn predict(&self, features: &[f64]) -> Result<i64, ModelError> {
        let n = SEVERITY_FEATURES.len();
        if features.len() != n {
            return Err(ModelError::DimensionMismatch {
                expected: n,
                got: features.len(),
            });
        }

        let mut best = 0usize;
        let mut best_score = f64::NEG_INFINITY;
        for (i, (row, intercept)) in self.weights.iter().zip(self.intercepts.iter()).enumerate() {
            let score: f64 = row
                .iter()
                .zip(features.iter())
                .map(|(w, x)| w * x)
                .sum::<f64>()
                + intercept;
            if score > best_score {
                best = i;
                best_score = score;
            }
        }

        Ok(self.classes[best])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    pub(crate) fn test_model() -> SeverityModel {
        // Three severity classes; class 2 favors high speed, class 0 low.
        SeverityModel {
            classes: vec![0, 1, 2],
            weights: vec![
                vec![-1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
                vec![0.0, 0.5, 0.5, 0.0, 0.0, 0.0, 0.0, 0.0],
                vec![1.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0],
            ],
            intercepts: vec![0.0, 0.0, -1.0],
        }
    }

    #[test]
    fn test_predict_argmax_class() {
        let model = test_model();
        let slow = model
            .predict(&[-2.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0])
            .unwrap();
        assert_eq!(slow, 0);

        let fast = model
            .predict(&[3.0, 0.0, 2.0, 0.0, 0.0, 0.0, 0.0, 0.0])
            .unwrap();
        assert_eq!(fast, 2);
    }

    #[test]
    fn test_predict_dimension_mismatch() {
        let model = test_model();
        assert!(model.predict(&[1.0]).is_err());
    }

    #[test]
    fn test_validate_shapes() {
        assert!(test_model().validate().is_ok());

        let mut bad = test_model();
        bad.intercepts.pop();
        assert!(bad.validate().is_err());

        let mut ragged = test_model();
        ragged.weights[1].pop();
        assert!(ragged.validate().is_err());
    }
}
