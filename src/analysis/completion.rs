// src/analysis/completion.rs
use crate::config::CompletionConfig;
use crate::utils::error::AnalysisError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    text: String,
}

/// Client for an OpenAI-style `/v1/completions` endpoint.
pub struct CompletionClient {
    http: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: String,
}

impl CompletionClient {
    pub fn new(config: &CompletionConfig, api_key: String) -> Result<Self, AnalysisError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(120))
            .build()?;
        Ok(Self {
            http,
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
            api_key,
        })
    }

    /// Sends one prompt and returns the text of the first choice.
    pub async fn complete(&self, prompt: &str) -> Result<String, AnalysisError> {
        tracing::info!("Sending {} byte prompt to {} ({})", prompt.len(), self.endpoint, self.model);

        let response = self.http.post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&CompletionRequest { model: &self.model, prompt })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            tracing::error!("Completion API returned {}", status);
            return Err(AnalysisError::Http(status));
        }

        let body = response.text().await?;
        parse_completion(&body)
    }
}

fn parse_completion(body: &str) -> Result<String, AnalysisError> {
    let response: CompletionResponse = serde_json::from_str(body)
        .map_err(|e| AnalysisError::MalformedResponse(e.to_string()))?;
    response
        .choices
        .into_iter()
        .next()
        .map(|choice| choice.text)
        .ok_or_else(|| AnalysisError::MalformedResponse("response has no choices".to_string()))
}
