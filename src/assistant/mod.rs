//! Optional language-model suggestion collaborator
//!
//! Architecture: Ports and Adapters - the facade only sees the `Suggester` capability
//! - Suggestions are additive; they never touch defects, scores or statuses
//! - Every fault (transport, HTTP status, malformed JSON) is absorbed here and logged
//! - The OpenAI-compatible adapter speaks the chat completions protocol over reqwest

use crate::config::AssistantConfig;
use crate::domain::requirements::{Defect, RequirementRecord, Suggestion, SuggestionOrigin};
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

/// Rule id attached to every assistant suggestion
pub const AI_RULE_ID: &str = "AI-001";

/// Source of non-authoritative improvement ideas
#[async_trait]
pub trait Suggester: Send + Sync {
    /// Propose suggestions for a requirement and its defects. Never fails.
    async fn suggest(&self, requirement: &RequirementRecord, defects: &[Defect]) -> Vec<Suggestion>;

    /// Short name for logs
    fn name(&self) -> &str;
}

/// Suggester used when the assistant is off
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledSuggester;

#[async_trait]
impl Suggester for DisabledSuggester {
    async fn suggest(&self, _requirement: &RequirementRecord, _defects: &[Defect]) -> Vec<Suggestion> {
        Vec::new()
    }

    fn name(&self) -> &str {
        "disabled"
    }
}

/// Chat-completions client for OpenAI-compatible endpoints
pub struct OpenAiSuggester {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    max_suggestions: usize,
}

impl OpenAiSuggester {
    pub fn new(config: &AssistantConfig, api_key: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model: config.model.clone(),
            max_suggestions: config.max_suggestions,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, prompt: String) -> Result<String> {
        let body = json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": "You answer with a single JSON object and nothing else." },
                { "role": "user", "content": prompt },
            ],
        });

        let res = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .context("Request to the suggestion endpoint failed")?
            .error_for_status()?;

        let json: Value = res.json().await.context("Response body is not JSON")?;
        let content = json["choices"][0]["message"]["content"]
            .as_str()
            .context("Failed to parse content from chat completion response")?;

        Ok(content.to_string())
    }

    async fn try_suggest(
        &self,
        requirement: &RequirementRecord,
        defects: &[Defect],
    ) -> Result<Vec<Suggestion>> {
        let prompt = build_prompt(requirement, defects, self.max_suggestions);
        let content = self.complete(prompt).await?;
        parse_suggestions(&content, self.max_suggestions)
    }
}

#[async_trait]
impl Suggester for OpenAiSuggester {
    async fn suggest(&self, requirement: &RequirementRecord, defects: &[Defect]) -> Vec<Suggestion> {
        match self.try_suggest(requirement, defects).await {
            Ok(suggestions) => {
                tracing::debug!(
                    "Assistant returned {} suggestion(s) for '{}'",
                    suggestions.len(),
                    requirement.id()
                );
                suggestions
            }
            Err(e) => {
                tracing::warn!(
                    "Assistant suggestion skipped for '{}': {:#}",
                    requirement.id(),
                    e
                );
                Vec::new()
            }
        }
    }

    fn name(&self) -> &str {
        "openai"
    }
}

/// V&V-oriented prompt asking for strict JSON
pub fn build_prompt(requirement: &RequirementRecord, defects: &[Defect], max_suggestions: usize) -> String {
    let defect_lines = if defects.is_empty() {
        "- (none)".to_string()
    } else {
        defects
            .iter()
            .map(|d| format!("- {}", d.format_display()))
            .collect::<Vec<_>>()
            .join("\n")
    };

    format!(
        r#"You are a senior V&V / Requirements Engineering assistant.

TASK:
Given a requirement and detected quality issues, propose up to {max_suggestions} improved requirement formulations
and/or acceptance criteria suggestions.

RULES:
- Suggestions must be measurable and testable.
- Avoid vague terms (e.g. fast, robust, if needed, as appropriate).
- Keep each suggestion short and actionable.
- Output MUST be valid JSON ONLY (no markdown, no prose).

INPUT REQUIREMENT (fields):
id: {id}
title: {title}
text: {text}
verification_method: {method}
acceptance_criteria: {criteria}

DETECTED ISSUES:
{defect_lines}

OUTPUT JSON SCHEMA:
{{
  "suggestions": [
    {{
      "message": "string",
      "rationale": "string",
      "confidence": 0.0
    }}
  ]
}}"#,
        id = requirement.id(),
        title = requirement.title(),
        text = requirement.text(),
        method = requirement.verification_method(),
        criteria = requirement.acceptance_criteria(),
    )
}

/// Parse the assistant's answer into at most `max_suggestions` AI suggestions
pub fn parse_suggestions(content: &str, max_suggestions: usize) -> Result<Vec<Suggestion>> {
    let data: Value =
        serde_json::from_str(strip_code_fence(content)).context("Assistant returned invalid JSON")?;

    let Some(items) = data.get("suggestions").and_then(Value::as_array) else {
        bail!("'suggestions' is missing or not a list");
    };

    let mut suggestions = Vec::new();
    for item in items.iter().take(max_suggestions) {
        let Some(fields) = item.as_object() else {
            continue;
        };
        let message = fields.get("message").and_then(Value::as_str).unwrap_or_default();
        let Ok(suggestion) = Suggestion::new(SuggestionOrigin::Ai, message) else {
            continue;
        };

        let rationale = fields.get("rationale").and_then(Value::as_str).unwrap_or_default();
        let suggestion = suggestion.with_rule_id(AI_RULE_ID).with_rationale(rationale);

        let suggestion = match fields.get("confidence").and_then(Value::as_f64) {
            Some(confidence) => match suggestion.clone().with_confidence(confidence) {
                Ok(with_confidence) => with_confidence,
                Err(_) => suggestion,
            },
            None => suggestion,
        };

        suggestions.push(suggestion);
    }

    Ok(suggestions)
}

fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let body = rest.split_once('\n').map_or("", |(_, body)| body);
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

/// Pick the suggester described by the configuration and the process environment
pub fn suggester_from_config(config: &AssistantConfig) -> Arc<dyn Suggester> {
    let api_key = std::env::var(&config.api_key_env).ok();
    suggester_with_key(config, api_key)
}

/// Same as [`suggester_from_config`] with an explicit key
pub fn suggester_with_key(config: &AssistantConfig, api_key: Option<String>) -> Arc<dyn Suggester> {
    if !config.enabled {
        tracing::debug!("Assistant disabled");
        return Arc::new(DisabledSuggester);
    }

    let Some(api_key) = api_key.filter(|k| !k.trim().is_empty()) else {
        tracing::warn!(
            "Assistant enabled but {} is missing; continuing without AI suggestions",
            config.api_key_env
        );
        return Arc::new(DisabledSuggester);
    };

    match OpenAiSuggester::new(config, api_key.trim()) {
        Ok(suggester) => {
            tracing::info!("Assistant enabled (model {})", suggester.model());
            Arc::new(suggester)
        }
        Err(e) => {
            tracing::warn!("Assistant unavailable: {:#}", e);
            Arc::new(DisabledSuggester)
        }
    }
}
