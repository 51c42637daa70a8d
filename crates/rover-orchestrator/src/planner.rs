//! Planning and reasoning on top of a general-purpose model.
//!
//! The planner turns a free-form coding request into a structured [`Plan`]
//! and offers a few small reasoning helpers. Planning never fails: when the
//! model errors or its JSON cannot be read, a fallback plan is returned.

use std::sync::Arc;

use rover_abstraction::{Model, ModelParameters};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{OrchestrationError, Result};

/// System prompt used when none is given.
pub const DEFAULT_PLANNER_SYSTEM_PROMPT: &str = "You are an expert coding assistant and planner.";

const DEFAULT_TESTS: &str = "Test with various inputs";
const DEFAULT_CONSTRAINTS: &str = "Use Python best practices";
const FALLBACK_TESTS: &str = "Test with various inputs and edge cases";
const FALLBACK_CONSTRAINTS: &str = "Use Python standard library and best practices";

/// A structured coding task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    /// What needs to be coded.
    pub task: String,
    /// Test cases or validation criteria.
    pub tests: String,
    /// Technical constraints.
    pub constraints: String,
}

impl Plan {
    /// Plan used when the model's answer is unusable.
    pub fn fallback(request: &str) -> Self {
        Self {
            task: request.to_string(),
            tests: FALLBACK_TESTS.to_string(),
            constraints: FALLBACK_CONSTRAINTS.to_string(),
        }
    }

    /// Prompt handed to the code writer for this plan.
    pub fn code_prompt(&self) -> String {
        format!(
            "Task: {}
Constraints: {}
Tests: {}

Write complete, working Python code to solve this task. Include:
1. Function implementation
2. Proper error handling
3. Docstrings
4. Example usage

Code:",
            self.task, self.constraints, self.tests
        )
    }
}

/// High-level planner and reasoner.
pub struct Planner {
    model: Arc<dyn Model>,
    system_prompt: String,
}

impl Planner {
    /// Creates a planner; `system_prompt` defaults to [`DEFAULT_PLANNER_SYSTEM_PROMPT`].
    pub fn new(model: Arc<dyn Model>, system_prompt: Option<String>) -> Self {
        Self {
            model,
            system_prompt: system_prompt
                .unwrap_or_else(|| DEFAULT_PLANNER_SYSTEM_PROMPT.to_string()),
        }
    }

    /// Model ID of the underlying model.
    pub fn model_id(&self) -> &str {
        self.model.model_id()
    }

    /// Builds a plan for `request`.
    pub async fn plan(&self, request: &str) -> Plan {
        let prompt = format!(
            r#"Given this coding request, create a detailed plan.

USER REQUEST:
{request}

Provide a JSON response with:
1. "task": A clear, specific description of what needs to be coded
2. "tests": Specific test cases or validation criteria
3. "constraints": Any technical constraints or requirements

Example format:
{{
    "task": "Create a function that...",
    "tests": "Should handle edge cases like...",
    "constraints": "Must use only standard library..."
}}

Your response (JSON only):"#
        );

        let response = match self.generate(&prompt, 0.3, 1000).await {
            Ok(text) => text,
            Err(e) => {
                warn!(error = %e, "Planning failed, using fallback plan");
                return Plan::fallback(request);
            }
        };

        match parse_plan(&response, request) {
            Ok(plan) => plan,
            Err(e) => {
                warn!(error = %e, "Unreadable plan, using fallback plan");
                Plan::fallback(request)
            }
        }
    }

    /// Free-form reasoning at `temperature`.
    pub async fn reason(&self, prompt: &str, temperature: f32) -> Result<String> {
        self.generate(prompt, temperature, 2000).await
    }

    /// Asks the model to choose one of `options` given `context`.
    ///
    /// The digits of the reply are read as a 1-based index; anything out of
    /// range falls back to the first option.
    pub async fn decide(&self, options: &[String], context: &str, temperature: f32) -> Result<String> {
        let first = options.first().ok_or_else(|| {
            OrchestrationError::Other("decide needs at least one option".to_string())
        })?;

        let options_text = options
            .iter()
            .enumerate()
            .map(|(i, opt)| format!("{}. {}", i + 1, opt))
            .collect::<Vec<_>>()
            .join("\n");

        let prompt = format!(
            "Given this context, choose the best option.

CONTEXT:
{context}

OPTIONS:
{options_text}

Respond with ONLY the number of your choice (1-{}).
Your choice:",
            options.len()
        );

        let response = self.generate(&prompt, temperature, 10).await?;
        let choice = choice_index(&response, options.len());
        debug!(response = %response, choice = ?choice, "Decision parsed");

        Ok(choice.map_or_else(|| first.clone(), |i| options[i].clone()))
    }

    /// Answers `question` about `code`.
    pub async fn analyze(&self, code: &str, question: &str) -> Result<String> {
        let prompt = format!(
            "Analyze this code and answer the question.

CODE:
```python
{code}
```

QUESTION:
{question}

Your analysis:"
        );

        self.generate(&prompt, 0.3, 500).await
    }

    async fn generate(&self, prompt: &str, temperature: f32, max_tokens: u32) -> Result<String> {
        let params = ModelParameters::new(temperature, max_tokens)
            .with_system_prompt(Some(self.system_prompt.as_str()));
        let response = self.model.generate_text(prompt, Some(params)).await?;
        Ok(response.content)
    }
}

/// Reads a plan out of a model reply, filling in missing fields.
fn parse_plan(response: &str, request: &str) -> Result<Plan> {
    let response = response.trim();
    let (Some(start), Some(end)) = (response.find('{'), response.rfind('}')) else {
        return Ok(Plan::fallback(request));
    };
    if end < start {
        return Err(OrchestrationError::Other("no JSON object in plan".to_string()));
    }

    let value: Value = serde_json::from_str(&response[start..=end])?;
    let object = value
        .as_object()
        .ok_or_else(|| OrchestrationError::Other("plan is not a JSON object".to_string()))?;

    let field = |key: &str, default: &str| match object.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => default.to_string(),
    };

    Ok(Plan {
        task: field("task", request),
        tests: field("tests", DEFAULT_TESTS),
        constraints: field("constraints", DEFAULT_CONSTRAINTS),
    })
}

/// Concatenates the digits of `response` into a 1-based choice.
fn choice_index(response: &str, count: usize) -> Option<usize> {
    let digits: String = response.chars().filter(char::is_ascii_digit).collect();
    let choice: usize = digits.parse().ok()?;
    (1..=count).contains(&choice).then(|| choice - 1)
}
