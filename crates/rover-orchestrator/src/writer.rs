//! Multi-temperature code generation with best-candidate selection.
//!
//! `CodeWriter` asks one model for a completion at each configured
//! temperature, validates and scores every result, and returns the best.
//! Backend failures never escape: they become zero-scored candidates.

use std::sync::Arc;

use rover_abstraction::{Model, ModelParameters};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::error::{OrchestrationError, Result};
use crate::scoring::{Scorer, is_truncated};

/// System prompt used when the caller does not supply one.
pub const DEFAULT_CODE_SYSTEM_PROMPT: &str = "You are an expert Python programmer. Generate complete, working code.

Requirements:
1. Write COMPLETE implementations - no placeholders or TODO comments
2. Include proper error handling
3. Add comprehensive docstrings
4. Ensure code is syntactically correct
5. DO NOT truncate the code - write the full implementation";

/// Appended to the prompt after a truncated round.
pub const TRUNCATION_DIRECTIVE: &str = "\n\nIMPORTANT: The previous attempt was truncated. Please write the COMPLETE implementation.\nDo not leave any function bodies empty or use placeholder comments.";

/// Score given to a candidate that looks cut off.
const TRUNCATED_SCORE: f64 = 0.3;

/// A clean best candidate above this score ends the retry loop.
const ACCEPT_SCORE: f64 = 0.7;

/// Why a candidate is not a clean result.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum CandidateError {
    /// The backend call failed.
    #[error("{0}")]
    Generation(String),
    /// The trimmed text was below the minimum length.
    #[error("too short ({len} chars)")]
    TooShort {
        /// Trimmed length in characters.
        len: usize,
    },
    /// The text looks cut off.
    #[error("truncated")]
    Truncated,
    /// Every candidate scored zero.
    #[error("all attempts failed")]
    AllFailed,
}

/// One generation attempt at a given temperature.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Candidate {
    /// Sampling temperature used.
    pub temperature: f32,
    /// Generated text; empty when the call failed.
    pub text: String,
    /// Quality estimate in `[0, 1]`.
    pub score: f64,
    /// Set for failed, short or truncated attempts.
    pub error: Option<CandidateError>,
}

impl Candidate {
    /// Whether this candidate is a clean result.
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Outcome of one generation round.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectionResult {
    /// The chosen candidate; always equal to one entry of `candidates`.
    pub best: Candidate,
    /// Every attempt, in configured temperature order.
    pub candidates: Vec<Candidate>,
}

/// Configuration for [`CodeWriter`].
#[derive(Debug, Clone, PartialEq)]
pub struct CodeWriterConfig {
    /// Temperatures tried in order, one backend call each.
    pub temperatures: Vec<f32>,
    /// Token budget per call; also drives the scorer's length penalty.
    pub max_tokens: u32,
    /// Minimum trimmed length in characters.
    pub min_code_length: usize,
}

impl Default for CodeWriterConfig {
    fn default() -> Self {
        Self { temperatures: vec![0.3, 0.7, 1.0], max_tokens: 2000, min_code_length: 50 }
    }
}

/// Generates code at several temperatures and keeps the best.
pub struct CodeWriter {
    model: Arc<dyn Model>,
    config: CodeWriterConfig,
    scorer: Scorer,
}

impl CodeWriter {
    /// Creates a writer over `model`.
    ///
    /// # Errors
    /// Fails when `config.temperatures` is empty.
    pub fn new(model: Arc<dyn Model>, config: CodeWriterConfig) -> Result<Self> {
        if config.temperatures.is_empty() {
            return Err(OrchestrationError::Other(
                "CodeWriter needs at least one temperature".to_string(),
            ));
        }
        let scorer = Scorer::new(config.max_tokens);
        Ok(Self { model, config, scorer })
    }

    /// Writer configuration.
    pub fn config(&self) -> &CodeWriterConfig {
        &self.config
    }

    /// Runs one round: one call per temperature, then selection.
    pub async fn generate_and_pick(
        &self,
        prompt: &str,
        system_prompt: Option<&str>,
    ) -> SelectionResult {
        let system_prompt = system_prompt.unwrap_or(DEFAULT_CODE_SYSTEM_PROMPT);
        let mut candidates = Vec::with_capacity(self.config.temperatures.len());

        for &temperature in &self.config.temperatures {
            let candidate = self.attempt(prompt, system_prompt, temperature).await;
            debug!(
                temperature,
                score = candidate.score,
                error = ?candidate.error,
                "Candidate generated"
            );
            candidates.push(candidate);
        }

        select(candidates)
    }

    /// Repeats [`Self::generate_and_pick`] while the best result is truncated.
    ///
    /// Each truncated round appends [`TRUNCATION_DIRECTIVE`] to the prompt
    /// used by the next round. A `max_attempts` of zero runs one round.
    pub async fn generate_with_retry(
        &self,
        prompt: &str,
        max_attempts: usize,
        system_prompt: Option<&str>,
    ) -> SelectionResult {
        let max_attempts = max_attempts.max(1);
        let mut prompt = prompt.to_string();
        let mut attempt = 1;

        loop {
            let result = self.generate_and_pick(&prompt, system_prompt).await;
            let best = &result.best;

            if best.is_ok() && best.score > ACCEPT_SCORE {
                return result;
            }

            if best.error != Some(CandidateError::Truncated) || attempt >= max_attempts {
                return result;
            }

            info!(attempt, max_attempts, "Best candidate truncated, retrying");
            prompt.push_str(TRUNCATION_DIRECTIVE);
            attempt += 1;
        }
    }

    async fn attempt(&self, prompt: &str, system_prompt: &str, temperature: f32) -> Candidate {
        let params = ModelParameters::new(temperature, self.config.max_tokens)
            .with_system_prompt(Some(system_prompt));

        let text = match self.model.generate_text(prompt, Some(params)).await {
            Ok(response) => response.content,
            Err(e) => {
                warn!(temperature, error = %e, "Generation failed");
                return Candidate {
                    temperature,
                    text: String::new(),
                    score: 0.0,
                    error: Some(CandidateError::Generation(e.to_string())),
                };
            }
        };

        let len = text.trim().chars().count();
        if len < self.config.min_code_length {
            return Candidate {
                temperature,
                text,
                score: 0.0,
                error: Some(CandidateError::TooShort { len }),
            };
        }

        if is_truncated(&text) {
            return Candidate {
                temperature,
                text,
                score: TRUNCATED_SCORE,
                error: Some(CandidateError::Truncated),
            };
        }

        let score = self.scorer.score(&text);
        Candidate { temperature, text, score, error: None }
    }
}

/// Picks the best candidate, preferring clean ones; ties go to the earliest.
fn select(mut candidates: Vec<Candidate>) -> SelectionResult {
    let clean = highest(candidates.iter().enumerate().filter(|(_, c)| c.is_ok()));
    let index = clean.or_else(|| highest(candidates.iter().enumerate())).unwrap_or_default();

    if !candidates[index].is_ok() && candidates[index].score <= 0.0 {
        candidates[index].error = Some(CandidateError::AllFailed);
    }

    SelectionResult { best: candidates[index].clone(), candidates }
}

fn highest<'a>(candidates: impl Iterator<Item = (usize, &'a Candidate)>) -> Option<usize> {
    candidates
        .fold(None::<(usize, f64)>, |best, (i, c)| match best {
            Some((_, score)) if score >= c.score => best,
            _ => Some((i, c.score)),
        })
        .map(|(i, _)| i)
}
