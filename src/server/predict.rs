//! Prediction endpoints.
//!
//! Both endpoints are stateless pass-throughs: deserialize the request,
//! build the fixed-order feature vector, run the startup-loaded model,
//! serialize the result. A model that failed to load degrades its
//! endpoint to a fixed error response; the request never reaches the
//! absent model object.

use crate::server::{ErrorResponse, SharedState};
use axum::{
    extract::rejection::JsonRejection,
    extract::State,
    http::StatusCode,
    Form, Json,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Sensor readings for a behavior prediction. Absent fields read as 0.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BehaviorRequest {
    #[serde(default)]
    pub accel_2: f64,
    #[serde(default)]
    pub accel_3: f64,
    #[serde(default)]
    pub accel_4: f64,
    #[serde(default)]
    pub gyro_2: f64,
    #[serde(default)]
    pub gyro_3: f64,
    #[serde(default)]
    pub gyro_4: f64,
    #[serde(default)]
    pub proximity: f64,
}

impl BehaviorRequest {
    /// Feature vector in the order the classifier was trained with.
    fn feature_vector(&self) -> [f64; 7] {
        [
            self.accel_2,
            self.accel_3,
            self.accel_4,
            self.gyro_2,
            self.gyro_3,
            self.gyro_4,
            self.proximity,
        ]
    }
}

/// Behavior prediction with class probabilities as percentages.
#[derive(Debug, Clone, Serialize)]
pub struct BehaviorResponse {
    pub behavior: String,
    pub confidence: f64,
    pub risky_probability: f64,
    pub safe_probability: f64,
}

type PredictError = (StatusCode, Json<ErrorResponse>);

fn error(status: StatusCode, message: impl Into<String>) -> PredictError {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

/// POST /api/predict-behavior/
pub async fn predict_behavior(
    State(state): State<SharedState>,
    payload: Result<Json<BehaviorRequest>, JsonRejection>,
) -> Result<Json<BehaviorResponse>, PredictError> {
    // Model availability is checked before touching the payload; when the
    // bundle failed to load the absent model is never accessed.
    let bundle = state
        .models
        .behavior()
        .map_err(|e| error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    let Json(request) = payload.map_err(|e| error(StatusCode::BAD_REQUEST, e.to_string()))?;

    let probs = bundle
        .predict(&request.feature_vector())
        .map_err(|e| error(StatusCode::BAD_REQUEST, e.to_string()))?;

    Ok(Json(BehaviorResponse {
        behavior: probs.predicted().as_str().to_string(),
        confidence: probs.confidence() * 100.0,
        risky_probability: probs.risky * 100.0,
        safe_probability: probs.safe * 100.0,
    }))
}

/// Severity prediction: the raw predicted class.
#[derive(Debug, Clone, Serialize)]
pub struct SeverityResponse {
    pub prediction: i64,
}

/// Field order fed to the severity model.
const SEVERITY_FIELDS: [&str; 8] = [
    "speed",
    "vehicles",
    "casualties",
    "day",
    "light",
    "weather",
    "surface",
    "urban",
];

/// POST /api/predict-safety/
///
/// Form-encoded severity fields. Any malformed request collapses to one
/// generic 400; callers cannot distinguish causes.
pub async fn predict_safety(
    State(state): State<SharedState>,
    form: Result<Form<HashMap<String, String>>, axum::extract::rejection::FormRejection>,
) -> Result<Json<SeverityResponse>, PredictError> {
    let model = state
        .models
        .severity()
        .map_err(|e| error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    let invalid = || error(StatusCode::BAD_REQUEST, "Invalid request");

    let Form(fields) = form.map_err(|_| invalid())?;

    let mut features = [0.0f64; 8];
    for (slot, name) in features.iter_mut().zip(SEVERITY_FIELDS.iter()) {
        *slot = fields
            .get(*name)
            .and_then(|v| v.trim().parse::<f64>().ok())
            .ok_or_else(|| invalid())?;
    }

    let prediction = model.predict(&features).map_err(|_| invalid())?;

    Ok(Json(SeverityResponse { prediction }))
}
