//! Behavior classifier bundle: standard scaler plus binary logistic
//! regression over a fixed feature order.

use crate::model::ModelError;
use serde::{Deserialize, Serialize};

/// Input feature order for the behavior classifier.
///
/// The HTTP payload uses these names; the vector fed to the scaler and the
/// logistic weights must follow this exact order.
pub const BEHAVIOR_FEATURES: [&str; 7] = [
    "accel_2",
    "accel_3",
    "accel_4",
    "gyro_2",
    "gyro_3",
    "gyro_4",
    "proximity",
];

/// Predicted behavior class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BehaviorClass {
    Safe,
    Risky,
}

impl BehaviorClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            BehaviorClass::Safe => "safe",
            BehaviorClass::Risky => "risky",
        }
    }
}

/// Class probabilities for one prediction. `safe + risky == 1`.
#[derive(Debug, Clone, Copy)]
pub struct ClassProbabilities {
    pub safe: f64,
    pub risky: f64,
}

impl ClassProbabilities {
    /// The argmax class.
    pub fn predicted(&self) -> BehaviorClass {
        if self.risky > self.safe {
            BehaviorClass::Risky
        } else {
            BehaviorClass::Safe
        }
    }

    /// Probability of the predicted class.
    pub fn confidence(&self) -> f64 {
        self.safe.max(self.risky)
    }
}

/// Feature standardization fitted offline: `(x - mean) / scale`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StandardScaler {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

impl StandardScaler {
    pub fn transform(&self, features: &[f64]) -> Result<Vec<f64>, ModelError> {
        if features.len() != self.mean.len() {
            return Err(ModelError::DimensionMismatch {
                expected: self.mean.len(),
                got: features.len(),
            });
        }

        Ok(features
            .iter()
            .zip(self.mean.iter())
            .zip(self.scale.iter())
            .map(|((x, mean), scale)| {
                if *scale == 0.0 {
                    0.0
                } else {
                    (x - mean) / scale
                }
            })
            .collect())
    }
}

/// Binary logistic regression. A positive score means "risky".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BehaviorClassifier {
    pub weights: Vec<f64>,
    pub intercept: f64,
}

impl BehaviorClassifier {
    /// Probabilities from an already-scaled feature vector.
    pub fn predict_proba(&self, scaled: &[f64]) -> Result<ClassProbabilities, ModelError> {
        if scaled.len() != self.weights.len() {
            return Err(ModelError::DimensionMismatch {
                expected: self.weights.len(),
                got: scaled.len(),
            });
        }

        let score: f64 = scaled
            .iter()
            .zip(self.weights.iter())
            .map(|(x, w)| x * w)
            .sum::<f64>()
            + self.intercept;

        let risky = sigmoid(score);
        Ok(ClassProbabilities {
            safe: 1.0 - risky,
            risky,
        })
    }
}

/// The full behavior bundle as serialized on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BehaviorBundle {
    pub scaler: StandardScaler,
    pub classifier: BehaviorClassifier,
}

impl BehaviorBundle {
    /// Shape consistency check, run once at load time.
    pub fn validate(&self) -> Result<(), String> {
        let n = BEHAVIOR_FEATURES.len();
        if self.scaler.mean.len() != n {
            return Err(format!(
                "scaler mean has {} entries, expected {n}",
                self.scaler.mean.len()
            ));
        }
        if self.scaler.scale.len() != n {
            return Err(format!(
                "scaler scale has {} entries, expected {n}",
                self.scaler.scale.len()
            ));
        }
        if self.classifier.weights.len() != n {
            return Err(format!(
                "classifier has {} weights, expected {n}",
                self.classifier.weights.len()
            ));
        }
        Ok(())
    }

    /// Scale a raw feature vector and predict class probabilities.
    pub fn predict(&self, features: &[f64]) -> Result<ClassProbabilities, ModelError> {
        let scaled = self.scaler.transform(features)?;
        self.classifier.predict_proba(&scaled)
    }
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

#[cfg(test)]
mod tests {
    use super::*;

    pub(crate) fn test_bundle() -> BehaviorBundle {
        BehaviorBundle {
            scaler: StandardScaler {
                mean: vec![0.0; 7],
                scale: vec![1.0; 7],
            },
            classifier: BehaviorClassifier {
                weights: vec![1.0, 0.5, -0.25, 0.75, -0.5, 0.25, 2.0],
                intercept: -0.1,
            },
        }
    }

    #[test]
    fn test_probabilities_sum_to_one() {
        let bundle = test_bundle();
        let probs = bundle
            .predict(&[0.2, -0.4, 1.1, 0.0, 0.3, -0.2, 0.5])
            .unwrap();
        assert!((probs.safe + probs.risky - 1.0).abs() < 1e-12);
        assert!(probs.safe >= 0.0 && probs.risky >= 0.0);
    }

    #[test]
    fn test_predicted_matches_argmax() {
        let bundle = test_bundle();
        for features in [
            [5.0, 5.0, 0.0, 5.0, 0.0, 5.0, 5.0],
            [-5.0, -5.0, 0.0, -5.0, 0.0, -5.0, -5.0],
        ] {
            let probs = bundle.predict(&features).unwrap();
            let expected = if probs.risky > probs.safe {
                BehaviorClass::Risky
            } else {
                BehaviorClass::Safe
            };
            assert_eq!(probs.predicted(), expected);
            assert!((probs.confidence() - probs.safe.max(probs.risky)).abs() < 1e-12);
        }
    }

    #[test]
    fn test_strong_risky_signal() {
        let bundle = test_bundle();
        let probs = bundle.predict(&[10.0, 10.0, 0.0, 10.0, 0.0, 10.0, 10.0]).unwrap();
        assert_eq!(probs.predicted(), BehaviorClass::Risky);
        assert!(probs.risky > 0.99);
    }

    #[test]
    fn test_dimension_mismatch_rejected() {
        let bundle = test_bundle();
        let err = bundle.predict(&[1.0, 2.0]).unwrap_err();
        assert!(matches!(
            err,
            ModelError::DimensionMismatch {
                expected: 7,
                got: 2
            }
        ));
    }

    #[test]
    fn test_scaler_zero_scale_does_not_divide() {
        let scaler = StandardScaler {
            mean: vec![1.0, 2.0],
            scale: vec![0.0, 2.0],
        };
        let scaled = scaler.transform(&[5.0, 6.0]).unwrap();
        assert_eq!(scaled, vec![0.0, 2.0]);
    }

    #[test]
    fn test_validate_catches_bad_shapes() {
        let mut bundle = test_bundle();
        bundle.classifier.weights.pop();
        assert!(bundle.validate().is_err());
        assert!(test_bundle().validate().is_ok());
    }
}
