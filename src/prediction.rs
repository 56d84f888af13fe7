//! Prediction record returned by `create_prediction`.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::types::{Error, PredictionId, PredictorTag};
use crate::values::TypedValue;

/// How a prediction ended. Exactly one of results or error exists.
#[derive(Debug, Clone, PartialEq)]
pub enum PredictionOutcome {
    Results(Vec<TypedValue>),
    Error(String),
}

/// Prediction as delivered to the MCP host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "PredictionRecord", try_from = "PredictionRecord")]
pub struct Prediction {
    pub id: PredictionId,
    pub tag: PredictorTag,
    pub outcome: PredictionOutcome,
    /// Prediction latency in milliseconds.
    pub latency: f64,
    pub logs: Option<String>,
    pub created: String,
}

impl Prediction {
    /// Build a prediction, rejecting a negative or NaN latency.
    pub fn new(
        id: PredictionId,
        tag: PredictorTag,
        outcome: PredictionOutcome,
        latency: f64,
        logs: Option<String>,
        created: String,
    ) -> Result<Self, Error> {
        if latency.is_nan() || latency < 0.0 {
            return Err(Error::invalid_prediction(format!(
                "latency must be non-negative, got {}",
                latency
            )));
        }
        Ok(Self {
            id,
            tag,
            outcome,
            latency,
            logs,
            created,
        })
    }

    pub fn results(&self) -> Option<&[TypedValue]> {
        match &self.outcome {
            PredictionOutcome::Results(values) => Some(values),
            PredictionOutcome::Error(_) => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match &self.outcome {
            PredictionOutcome::Results(_) => None,
            PredictionOutcome::Error(message) => Some(message),
        }
    }
}

/// Flat wire form of [`Prediction`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PredictionRecord {
    /// Prediction identifier.
    pub id: String,
    /// Predictor tag.
    pub tag: String,
    /// Prediction results. `null` if the prediction failed.
    pub results: Option<Vec<TypedValue>>,
    /// Prediction latency in milliseconds.
    pub latency: f64,
    /// Prediction error. `null` if the prediction completed successfully.
    pub error: Option<String>,
    /// Prediction logs.
    pub logs: Option<String>,
    /// Date created.
    pub created: String,
}

impl From<Prediction> for PredictionRecord {
    fn from(prediction: Prediction) -> Self {
        let (results, error) = match prediction.outcome {
            PredictionOutcome::Results(values) => (Some(values), None),
            PredictionOutcome::Error(message) => (None, Some(message)),
        };
        Self {
            id: prediction.id.as_str().to_string(),
            tag: prediction.tag.as_str().to_string(),
            results,
            latency: prediction.latency,
            error,
            logs: prediction.logs,
            created: prediction.created,
        }
    }
}

impl TryFrom<PredictionRecord> for Prediction {
    type Error = Error;

    fn try_from(record: PredictionRecord) -> Result<Self, Self::Error> {
        let outcome = match (record.results, record.error) {
            (Some(values), None) => PredictionOutcome::Results(values),
            (None, Some(message)) => PredictionOutcome::Error(message),
            (Some(_), Some(_)) => {
                return Err(Error::invalid_prediction("both results and error are present"))
            }
            (None, None) => {
                return Err(Error::invalid_prediction("neither results nor error is present"))
            }
        };
        Self::new(
            PredictionId::from_string(record.id).map_err(Error::invalid_prediction)?,
            PredictorTag::from_string(record.tag).map_err(Error::invalid_prediction)?,
            outcome,
            record.latency,
            record.logs,
            record.created,
        )
    }
}
