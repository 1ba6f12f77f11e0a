//! Pre-trained model bundles and the registry the server consults.
//!
//! Bundles are JSON files loaded once at startup. A bundle that fails to
//! load leaves its endpoint degraded to a fixed error response; it never
//! takes the process down. Loaded bundles are immutable and shared
//! read-only across requests.

pub mod classifier;
pub mod severity;

// Re-export commonly used types
pub use classifier::{
    BehaviorBundle, BehaviorClass, BehaviorClassifier, ClassProbabilities, StandardScaler,
    BEHAVIOR_FEATURES,
};
pub use severity::{SeverityModel, SEVERITY_FEATURES};

use crate::config::ModelPaths;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Why a bundle failed to load. The three branches stay distinguishable
/// in logs so operators can tell a missing deploy from a bad artifact.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("model file not found: {path}")]
    Missing { path: PathBuf },

    #[error("model file {path} is corrupt: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("model file {path} failed validation: {reason}")]
    Invalid { path: PathBuf, reason: String },

    #[error("failed to read model file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Inference-time errors surfaced to callers.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("{0} model is not available")]
    Unavailable(&'static str),

    #[error("expected {expected} features, got {got}")]
    DimensionMismatch { expected: usize, got: usize },
}

fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T, LoadError> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(LoadError::Missing {
                path: path.to_path_buf(),
            })
        }
        Err(e) => {
            return Err(LoadError::Io {
                path: path.to_path_buf(),
                source: e,
            })
        }
    };

    serde_json::from_str(&content).map_err(|source| LoadError::Corrupt {
        path: path.to_path_buf(),
        source,
    })
}

fn load_bundle<T, V>(path: &Path, name: &'static str, validate: V) -> Option<T>
where
    T: DeserializeOwned,
    V: FnOnce(&T) -> Result<(), String>,
{
    let result = load_json::<T>(path).and_then(|bundle| {
        validate(&bundle).map_err(|reason| LoadError::Invalid {
            path: path.to_path_buf(),
            reason,
        })?;
        Ok(bundle)
    });

    match result {
        Ok(bundle) => {
            tracing::info!(model = name, path = %path.display(), "loaded model bundle");
            Some(bundle)
        }
        Err(e) => {
            tracing::error!(model = name, error = %e, "model bundle unavailable");
            None
        }
    }
}

/// Startup-loaded models, each an explicit optional resource checked at
/// every request.
#[derive(Debug, Default)]
pub struct ModelRegistry {
    behavior: Option<BehaviorBundle>,
    severity: Option<SeverityModel>,
}

impl ModelRegistry {
    /// Load every bundle, degrading each one independently on failure.
    pub fn load(paths: &ModelPaths) -> Self {
        Self {
            behavior: load_bundle(&paths.behavior, "behavior", BehaviorBundle::validate),
            severity: load_bundle(&paths.severity, "severity", SeverityModel::validate),
        }
    }

    /// A registry with nothing loaded; every predictor reports unavailable.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn behavior(&self) -> Result<&BehaviorBundle, ModelError> {
        self.behavior
            .as_ref()
            .ok_or(ModelError::Unavailable("behavior"))
    }

    pub fn severity(&self) -> Result<&SeverityModel, ModelError> {
        self.severity
            .as_ref()
            .ok_or(ModelError::Unavailable("severity"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("drivesense-model-{name}"))
    }

    fn behavior_json(width: usize) -> String {
        let bundle = BehaviorBundle {
            scaler: StandardScaler {
                mean: vec![0.0; width],
                scale: vec![1.0; width],
            },
            classifier: BehaviorClassifier {
                weights: vec![0.5; width],
                intercept: 0.0,
            },
        };
        serde_json::to_string(&bundle).unwrap()
    }

    #[test]
    fn test_registry_loads_valid_bundle() {
        let behavior = temp_path("valid.json");
        std::fs::write(&behavior, behavior_json(7)).unwrap();

        let registry = ModelRegistry::load(&ModelPaths {
            behavior,
            severity: temp_path("nonexistent-severity.json"),
        });

        assert!(registry.behavior().is_ok());
        assert!(matches!(
            registry.severity().unwrap_err(),
            ModelError::Unavailable("severity")
        ));
    }

    #[test]
    fn test_missing_file_degrades_without_panic() {
        let registry = ModelRegistry::load(&ModelPaths {
            behavior: temp_path("missing-behavior.json"),
            severity: temp_path("missing-severity.json"),
        });
        assert!(registry.behavior().is_err());
        assert!(registry.severity().is_err());
    }

    #[test]
    fn test_corrupt_file_degrades_without_panic() {
        let behavior = temp_path("corrupt.json");
        std::fs::write(&behavior, "{ not json").unwrap();

        let registry = ModelRegistry::load(&ModelPaths {
            behavior,
            severity: temp_path("missing-severity.json"),
        });
        assert!(registry.behavior().is_err());
    }

    #[test]
    fn test_invalid_shape_degrades_without_panic() {
        let behavior = temp_path("badshape.json");
        std::fs::write(&behavior, behavior_json(3)).unwrap();

        let registry = ModelRegistry::load(&ModelPaths {
            behavior,
            severity: temp_path("missing-severity.json"),
        });
        assert!(registry.behavior().is_err());
    }

    #[test]
    fn test_load_error_branches_are_distinct() {
        let missing = load_json::<BehaviorBundle>(&temp_path("never-written.json")).unwrap_err();
        assert!(matches!(missing, LoadError::Missing { .. }));

        let corrupt_path = temp_path("branch-corrupt.json");
        std::fs::write(&corrupt_path, "]]").unwrap();
        let corrupt = load_json::<BehaviorBundle>(&corrupt_path).unwrap_err();
        assert!(matches!(corrupt, LoadError::Corrupt { .. }));
    }
}
