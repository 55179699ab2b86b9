use serde::{Deserialize, Serialize};
use std::time::Duration;
use crate::error::{MLError, MLResult};

pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash-latest";

#[derive(Debug, Clone, Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Clone, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Clone, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

/// The JSON shape the prompt asks the model to reply with.
#[derive(Debug, Clone, Deserialize)]
struct ScoreReply {
    scores: Vec<f64>,
}

/// Client for a Gemini-compatible `generateContent` endpoint, used to score
/// market headlines.
#[derive(Clone)]
pub struct GeminiClient {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: String,
}

impl GeminiClient {
    pub fn new(base_url: String, model: String, api_key: String, timeout: Duration) -> MLResult<Self> {
        if api_key.trim().is_empty() {
            return Err(MLError::NotConfigured("Gemini API key is empty".to_string()));
        }
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
            api_key,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Score each headline in [-1, 1], returned in input order.
    pub async fn score_headlines(&self, symbol: &str, headlines: &[String]) -> MLResult<Vec<f64>> {
        if headlines.is_empty() {
            return Ok(Vec::new());
        }

        let prompt = build_prompt(symbol, headlines);
        let text = self.generate(&prompt).await?;
        let scores = parse_scores(&text, headlines.len())?;

        tracing::debug!("{} scored {} headlines for {}", self.model, scores.len(), symbol);
        Ok(scores)
    }

    /// Send one prompt, return the first candidate's text.
    pub async fn generate(&self, prompt: &str) -> MLResult<String> {
        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
        };

        let response = self
            .client
            .post(format!(
                "{}/v1beta/models/{}:generateContent",
                self.base_url, self.model
            ))
            .query(&[("key", self.api_key.as_str())])
            .json(&request)
            .send()
            .await
            .map_err(MLError::from_request)?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(MLError::Unauthorized(format!("Status: {}", status)));
        }
        if !status.is_success() {
            return Err(MLError::ServiceUnavailable(format!("Status: {}", status)));
        }

        let body = response
            .json::<GenerateResponse>()
            .await
            .map_err(|e| MLError::InvalidResponse(e.to_string()))?;

        body.candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .and_then(|c| c.parts.into_iter().next())
            .map(|p| p.text)
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| MLError::InvalidResponse("no candidate text".to_string()))
    }
}

fn build_prompt(symbol: &str, headlines: &[String]) -> String {
    let subject = if symbol.is_empty() { "the broad market" } else { symbol };
    let mut prompt = format!(
        "You are a financial news analyst. Rate the market sentiment of each headline \
         below for {} on a scale from -1.0 (very bearish) to 1.0 (very bullish).\n\n",
        subject
    );
    for (i, headline) in headlines.iter().enumerate() {
        prompt.push_str(&format!("{}. {}\n", i + 1, headline));
    }
    prompt.push_str(&format!(
        "\nReturn ONLY a JSON object of the form {{\"scores\": [..]}} with exactly {} numbers, \
         one per headline, in the same order.",
        headlines.len()
    ));
    prompt
}

/// Remove a surrounding Markdown code fence (```json ... ``` or ``` ... ```).
pub fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

/// Parse the model's reply into exactly `expected` scores clamped to [-1, 1].
pub fn parse_scores(text: &str, expected: usize) -> MLResult<Vec<f64>> {
    let reply: ScoreReply = serde_json::from_str(strip_code_fences(text))?;

    if reply.scores.len() != expected {
        return Err(MLError::InvalidResponse(format!(
            "expected {} scores, got {}",
            expected,
            reply.scores.len()
        )));
    }
    if reply.scores.iter().any(|s| !s.is_finite()) {
        return Err(MLError::InvalidResponse("non-finite score".to_string()));
    }

    Ok(reply.scores.into_iter().map(|s| s.clamp(-1.0, 1.0)).collect())
}
