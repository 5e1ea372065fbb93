//! Per-file model arbitration.
//!
//! Every requested model answers the same request, one after the other. The
//! answer with the strictly highest quality score wins, so ties go to the
//! model requested first. Failing models score 0.0 and never compete.

use super::interpreter::{interpret, Interpretation};
use super::prompt::build_request;
use super::quality;
use crate::backend::CompletionBackend;
use crate::models::ModelResult;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum ArbitrationError {
    #[error("no models were provided for arbitration")]
    NoModels,
}

/// Outcome of comparing every requested model on one file.
#[derive(Debug, Clone)]
pub struct Arbitration {
    /// One result per requested model, in requested order.
    pub results: Vec<ModelResult>,
    pub best_model: String,
    pub best_score: f64,
}

impl Arbitration {
    /// The winning model's result.
    pub fn winner(&self) -> Option<&ModelResult> {
        self.results.iter().find(|r| r.model == self.best_model)
    }

    /// True when no model produced a response.
    pub fn all_failed(&self) -> bool {
        self.results.iter().all(|r| r.error.is_some())
    }
}

/// Query each model sequentially and pick the best response.
pub async fn compare(
    backend: &dyn CompletionBackend,
    models: &[String],
    content: &str,
    instructions: &str,
) -> Result<Arbitration, ArbitrationError> {
    let first = models.first().ok_or(ArbitrationError::NoModels)?;
    let request = build_request(instructions, content);

    let mut results = Vec::with_capacity(models.len());
    let mut best: Option<(String, f64)> = None;

    for model in models {
        debug!("Querying {}", model);
        match backend.generate(model, &request).await {
            Ok(text) => {
                let response = interpret(&text);
                let quality_score = quality::score(&response);
                info!("Quality score for {}: {:.3}", model, quality_score);

                if best.as_ref().map_or(true, |(_, s)| quality_score > *s) {
                    best = Some((model.clone(), quality_score));
                }
                results.push(ModelResult {
                    model: model.clone(),
                    response,
                    quality_score,
                    error: None,
                });
            }
            Err(e) => {
                warn!("Model {} failed: {}", model, e);
                results.push(ModelResult {
                    model: model.clone(),
                    response: Interpretation::Unparsed,
                    quality_score: 0.0,
                    error: Some(e.to_string()),
                });
            }
        }
    }

    let (best_model, best_score) = best.unwrap_or_else(|| {
        warn!("Every model failed, falling back to {}", first);
        (first.clone(), 0.0)
    });

    Ok(Arbitration {
        results,
        best_model,
        best_score,
    })
}
