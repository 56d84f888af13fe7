//! Tool dispatcher: `search_predictors` and `create_prediction` over the
//! value codec and the platform client.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::platform::{Acceleration, NativePrediction, PredictionClient, PredictionRequest, Predictor};
use crate::prediction::{Prediction, PredictionOutcome};
use crate::types::{Error, PredictorTag, Result, SearchConfig};
use crate::values::{TypedValue, ValueCodec};

pub struct ToolDispatcher {
    client: Arc<dyn PredictionClient>,
    codec: ValueCodec,
    search: SearchConfig,
}

impl fmt::Debug for ToolDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolDispatcher")
            .field("codec", &self.codec)
            .field("search", &self.search)
            .finish_non_exhaustive()
    }
}

impl ToolDispatcher {
    pub fn new(client: Arc<dyn PredictionClient>, codec: ValueCodec, search: SearchConfig) -> Self {
        Self {
            client,
            codec,
            search,
        }
    }

    pub fn codec(&self) -> &ValueCodec {
        &self.codec
    }

    /// Resolve every allow-listed tag, in order.
    ///
    /// The query does not affect the result. The first lookup failure aborts
    /// the whole search.
    pub async fn search_predictors(&self, query: &str) -> Result<Vec<Predictor>> {
        tracing::info!(query, tags = self.search.searchable_tags.len(), "Searching predictors");
        let mut predictors = Vec::with_capacity(self.search.searchable_tags.len());
        for tag in &self.search.searchable_tags {
            let predictor = self.client.retrieve(tag).await.map_err(|e| {
                tracing::warn!(tag = %tag, error = %e, "Predictor lookup failed");
                e
            })?;
            predictors.push(predictor);
        }
        Ok(predictors)
    }

    /// Decode inputs, run the prediction, and encode its results.
    ///
    /// No platform call is made unless every input decodes. A prediction that
    /// ran and failed is returned with its error set; a failing platform call
    /// is returned as `Err`.
    pub async fn create_prediction(
        &self,
        tag: &str,
        inputs: BTreeMap<String, TypedValue>,
        acceleration: Acceleration,
    ) -> Result<Prediction> {
        let tag = PredictorTag::from_string(tag.to_string()).map_err(Error::validation)?;
        let inputs = inputs
            .into_iter()
            .map(|(name, value)| {
                self.codec.decode(value).map(|native| (name, native)).map_err(|e| {
                    tracing::warn!(tag = %tag, error = %e, "Input decode failed");
                    e
                })
            })
            .collect::<Result<BTreeMap<_, _>>>()?;

        tracing::info!(
            tag = %tag,
            acceleration = %acceleration,
            inputs = inputs.len(),
            "Creating prediction"
        );
        let request = PredictionRequest {
            tag,
            inputs,
            acceleration,
        };
        let native = if acceleration.is_remote() {
            self.client.create_remote(request).await?
        } else {
            self.client.create(request).await?
        };
        self.finish(native)
    }

    fn finish(&self, native: NativePrediction) -> Result<Prediction> {
        let outcome = match native.error {
            Some(message) => {
                tracing::warn!(id = %native.id, tag = %native.tag, error = %message, "Prediction failed");
                PredictionOutcome::Error(message)
            }
            None => {
                let values = native
                    .results
                    .unwrap_or_default()
                    .into_iter()
                    .map(|value| self.codec.encode(value))
                    .collect::<Result<Vec<_>>>()?;
                tracing::info!(
                    id = %native.id,
                    tag = %native.tag,
                    latency_ms = native.latency,
                    results = values.len(),
                    "Prediction completed"
                );
                PredictionOutcome::Results(values)
            }
        };
        Prediction::new(
            native.id,
            native.tag,
            outcome,
            native.latency,
            native.logs,
            native.created,
        )
    }
}
