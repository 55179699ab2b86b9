use serde::{Deserialize, Serialize};
use std::time::Duration;
use crate::error::{MLError, MLResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SentimentPrediction {
    pub label: String,
    pub positive: f64,
    pub negative: f64,
    pub neutral: f64,
    #[serde(default)]
    pub confidence: f64,
    /// Signed polarity; older service builds only send the class probabilities
    #[serde(default)]
    pub score: Option<f64>,
}

impl SentimentPrediction {
    /// Signed polarity in [-1, 1]. Falls back to `positive - negative` when the
    /// service omits or garbles `score`.
    pub fn polarity(&self) -> f64 {
        let score = match self.score {
            Some(score) if score.is_finite() => score,
            _ => self.positive - self.negative,
        };
        score.clamp(-1.0, 1.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SentimentResponse {
    pub predictions: Vec<SentimentPrediction>,
    #[serde(default)]
    pub processing_time_ms: f64,
}

#[derive(Debug, Clone, Serialize)]
struct SentimentRequest {
    texts: Vec<String>,
    symbol: Option<String>,
    use_cache: bool,
}

/// Client for the locally hosted FinBERT classification service.
#[derive(Clone)]
pub struct SentimentClient {
    client: reqwest::Client,
    base_url: String,
}

impl SentimentClient {
    pub fn new(base_url: String, timeout: Duration) -> MLResult<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Predict sentiment for text(s)
    pub async fn predict(
        &self,
        texts: Vec<String>,
        symbol: Option<String>,
    ) -> MLResult<SentimentResponse> {
        let expected = texts.len();
        let request = SentimentRequest {
            texts,
            symbol,
            use_cache: true,
        };

        let response = self
            .client
            .post(format!("{}/predict", self.base_url))
            .json(&request)
            .send()
            .await
            .map_err(MLError::from_request)?;

        if !response.status().is_success() {
            return Err(MLError::ServiceUnavailable(format!(
                "Status: {}",
                response.status()
            )));
        }

        let result = response
            .json::<SentimentResponse>()
            .await
            .map_err(|e| MLError::InvalidResponse(e.to_string()))?;

        if result.predictions.len() != expected {
            return Err(MLError::InvalidResponse(format!(
                "expected {} predictions, got {}",
                expected,
                result.predictions.len()
            )));
        }

        Ok(result)
    }

    /// Polarity scores for each text, in input order.
    pub async fn score_texts(&self, texts: Vec<String>) -> MLResult<Vec<f64>> {
        let response = self.predict(texts, None).await?;
        Ok(response.predictions.iter().map(|p| p.polarity()).collect())
    }

    /// Check service health
    pub async fn health(&self) -> MLResult<bool> {
        let response = self
            .client
            .get(format!("{}/health", self.base_url))
            .send()
            .await
            .map_err(MLError::from_request)?;

        Ok(response.status().is_success())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn prediction(score: f64) -> serde_json::Value {
        json!({
            "label": "positive",
            "positive": 0.8,
            "negative": 0.1,
            "neutral": 0.1,
            "confidence": 0.8,
            "score": score
        })
    }

    #[tokio::test]
    async fn test_score_texts_in_order() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/predict"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "predictions": [prediction(0.7), prediction(-0.4)],
                "processing_time_ms": 12.5
            })))
            .mount(&server)
            .await;

        let client = SentimentClient::new(server.uri(), Duration::from_secs(2)).unwrap();
        let scores = client
            .score_texts(vec!["a".into(), "b".into()])
            .await
            .unwrap();
        assert_eq!(scores, vec![0.7, -0.4]);
    }

    #[tokio::test]
    async fn test_prediction_count_mismatch_is_invalid() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/predict"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "predictions": [prediction(0.2)]
            })))
            .mount(&server)
            .await;

        let client = SentimentClient::new(server.uri(), Duration::from_secs(2)).unwrap();
        let result = client.score_texts(vec!["a".into(), "b".into()]).await;
        assert!(matches!(result, Err(MLError::InvalidResponse(_))));
    }

    #[tokio::test]
    async fn test_health_and_server_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/health"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/predict"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let client = SentimentClient::new(format!("{}/", server.uri()), Duration::from_secs(2)).unwrap();
        assert!(client.health().await.unwrap());
        let result = client.score_texts(vec!["a".into()]).await;
        assert!(matches!(result, Err(MLError::ServiceUnavailable(_))));
    }

    #[test]
    fn test_polarity_falls_back_and_clamps() {
        let mut p: SentimentPrediction = serde_json::from_value(prediction(3.0)).unwrap();
        assert_eq!(p.polarity(), 1.0);
        p.score = Some(f64::NAN);
        assert!((p.polarity() - 0.7).abs() < 1e-9);
        p.score = None;
        assert!((p.polarity() - 0.7).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_prediction_without_score_uses_probabilities() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/predict"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "predictions": [{
                    "label": "negative",
                    "positive": 0.1,
                    "negative": 0.75,
                    "neutral": 0.15,
                    "confidence": 0.75
                }]
            })))
            .mount(&server)
            .await;

        let client = SentimentClient::new(server.uri(), Duration::from_secs(2)).unwrap();
        let scores = client.score_texts(vec!["Shares slump".into()]).await.unwrap();
        assert_eq!(scores.len(), 1);
        assert!((scores[0] + 0.65).abs() < 1e-9);
    }
}
