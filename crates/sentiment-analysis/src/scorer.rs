use analysis_core::{adaptive, SentimentLabel, SentimentResult, SentimentSource, SignalError};
use std::time::Duration;

use crate::cancel::CancelToken;
use crate::config::ScorerConfig;
use crate::tier::{CloudTier, KeywordTier, LocalTier, SentimentTier, TierError};

struct BoundedTier {
    tier: Box<dyn SentimentTier>,
    timeout: Duration,
}

/// Resolves a headline set into one sentiment result.
///
/// Fallible tiers are tried in order, each bounded by its own timeout and raced
/// against the caller's cancel token. A tier serves the request only when it
/// scores every headline; anything else falls through. The keyword tier is
/// terminal and cannot fail, so `score` always returns a result.
pub struct SentimentScorer {
    tiers: Vec<BoundedTier>,
    terminal: KeywordTier,
    neutral_band: f64,
}

impl SentimentScorer {
    /// Keyword-only scorer. Add fallible tiers with [`SentimentScorer::with_tier`].
    pub fn new(neutral_band: f64) -> Self {
        Self {
            tiers: Vec::new(),
            terminal: KeywordTier::new(),
            neutral_band,
        }
    }

    pub fn with_tier(mut self, tier: impl SentimentTier + 'static, timeout: Duration) -> Self {
        self.tiers.push(BoundedTier {
            tier: Box::new(tier),
            timeout,
        });
        self
    }

    /// Cloud, then local, then keyword. Unconfigured tiers stay in the chain as
    /// unavailable.
    pub fn from_config(config: &ScorerConfig) -> anyhow::Result<Self> {
        let cloud = CloudTier::new(config.ml.gemini_client()?);
        let local = LocalTier::new(config.ml.sentiment_client()?);

        Ok(Self::new(config.neutral_band)
            .with_tier(cloud, config.cloud_timeout)
            .with_tier(local, config.local_timeout))
    }

    /// Sources in the order they are tried, keyword last.
    pub fn chain(&self) -> Vec<SentimentSource> {
        self.tiers
            .iter()
            .map(|b| b.tier.source())
            .chain(std::iter::once(self.terminal.source()))
            .collect()
    }

    pub async fn score(&self, headlines: &[String], cancel: &CancelToken) -> SentimentResult {
        self.score_for("", headlines, cancel).await
    }

    /// Like [`SentimentScorer::score`], with the symbol passed to tiers that use context.
    pub async fn score_for(&self, symbol: &str, headlines: &[String], cancel: &CancelToken) -> SentimentResult {
        if headlines.is_empty() {
            return SentimentResult::neutral(self.terminal.model_name());
        }

        match self.try_tiers(symbol, headlines, cancel).await {
            Ok(result) => result,
            Err(e) => {
                tracing::debug!("{}; scoring {} headlines with keywords", e, headlines.len());
                let scores = self.terminal.score_all(headlines);
                self.build_result(&self.terminal, headlines, &scores)
            }
        }
    }

    /// Fallible tiers only. `SentimentUnavailable` when none of them served.
    pub async fn try_tiers(
        &self,
        symbol: &str,
        headlines: &[String],
        cancel: &CancelToken,
    ) -> Result<SentimentResult, SignalError> {
        let mut failures = Vec::new();

        for bounded in &self.tiers {
            let tier = bounded.tier.as_ref();
            match run_tier(tier, bounded.timeout, symbol, headlines, cancel).await {
                Ok(scores) => {
                    let result = self.build_result(tier, headlines, &scores);
                    tracing::info!(
                        "Sentiment via {} ({}): {:.2} {} from {} headlines",
                        result.source,
                        result.model_name,
                        result.score,
                        result.label,
                        result.headline_count
                    );
                    return Ok(result);
                }
                Err(e) => {
                    tracing::debug!("{} tier fell through: {}", tier.source(), e);
                    failures.push(format!("{}: {}", tier.source(), e));
                }
            }
        }

        Err(SignalError::SentimentUnavailable(if failures.is_empty() {
            "no model tiers configured".to_string()
        } else {
            failures.join("; ")
        }))
    }

    fn build_result(&self, tier: &dyn SentimentTier, headlines: &[String], scores: &[f64]) -> SentimentResult {
        let score = adaptive::mean(scores).clamp(-1.0, 1.0);
        SentimentResult {
            score,
            label: SentimentLabel::from_score(score, self.neutral_band),
            source: tier.source(),
            model_name: tier.model_name(),
            headline_count: scores.len(),
            high_impact_count: self.terminal.high_impact_count(headlines),
        }
    }
}

async fn run_tier(
    tier: &dyn SentimentTier,
    timeout: Duration,
    symbol: &str,
    headlines: &[String],
    cancel: &CancelToken,
) -> Result<Vec<f64>, TierError> {
    let call = async {
        if !tier.is_available().await {
            return Err(TierError::Unavailable(format!("{} not available", tier.model_name())));
        }
        tier.score_batch(symbol, headlines).await
    };

    let scores = tokio::select! {
        biased;
        _ = cancel.cancelled() => return Err(TierError::Cancelled),
        res = tokio::time::timeout(timeout, call) => res.map_err(|_| TierError::Timeout(timeout))??,
    };

    if scores.len() != headlines.len() {
        return Err(TierError::InvalidScores(format!(
            "expected {} scores, got {}",
            headlines.len(),
            scores.len()
        )));
    }
    if scores.iter().any(|s| !s.is_finite()) {
        return Err(TierError::InvalidScores("non-finite score".to_string()));
    }
    Ok(scores.into_iter().map(|s| s.clamp(-1.0, 1.0)).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use ml_client::{GeminiClient, MLError, SentimentClient};
    use serde_json::json;
    use std::time::Instant;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    struct FixedTier {
        source: SentimentSource,
        scores: Vec<f64>,
    }

    #[async_trait]
    impl SentimentTier for FixedTier {
        fn source(&self) -> SentimentSource {
            self.source
        }
        fn model_name(&self) -> String {
            "fixed".to_string()
        }
        async fn is_available(&self) -> bool {
            true
        }
        async fn score_one(&self, _symbol: &str, _headline: &str) -> Result<f64, TierError> {
            Ok(self.scores[0])
        }
        async fn score_batch(&self, _symbol: &str, _headlines: &[String]) -> Result<Vec<f64>, TierError> {
            Ok(self.scores.clone())
        }
    }

    struct FailingTier(SentimentSource);

    #[async_trait]
    impl SentimentTier for FailingTier {
        fn source(&self) -> SentimentSource {
            self.0
        }
        fn model_name(&self) -> String {
            "failing".to_string()
        }
        async fn is_available(&self) -> bool {
            true
        }
        async fn score_one(&self, _symbol: &str, _headline: &str) -> Result<f64, TierError> {
            Err(MLError::ServiceUnavailable("down".to_string()).into())
        }
    }

    struct SlowTier;

    #[async_trait]
    impl SentimentTier for SlowTier {
        fn source(&self) -> SentimentSource {
            SentimentSource::Cloud
        }
        fn model_name(&self) -> String {
            "slow".to_string()
        }
        async fn is_available(&self) -> bool {
            true
        }
        async fn score_one(&self, _symbol: &str, _headline: &str) -> Result<f64, TierError> {
            tokio::time::sleep(Duration::from_secs(10)).await;
            Ok(1.0)
        }
    }

    fn headlines(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn all_failing() -> SentimentScorer {
        SentimentScorer::new(0.2)
            .with_tier(FailingTier(SentimentSource::Cloud), Duration::from_secs(1))
            .with_tier(FailingTier(SentimentSource::Local), Duration::from_secs(1))
    }

    #[tokio::test]
    async fn test_empty_input_is_neutral_keyword() {
        let result = all_failing().score(&[], &CancelToken::new()).await;
        assert_eq!(result.score, 0.0);
        assert_eq!(result.label, SentimentLabel::Neutral);
        assert_eq!(result.source, SentimentSource::Keyword);
        assert_eq!(result.headline_count, 0);
    }

    #[tokio::test]
    async fn test_gibberish_with_every_tier_down_still_scores() {
        let result = all_failing()
            .score(&headlines(&["¤¤¤ gibberish ¤¤¤"]), &CancelToken::new())
            .await;
        assert_eq!(result.source, SentimentSource::Keyword);
        assert_eq!(result.score, 0.0);
        assert_eq!(result.label, SentimentLabel::Neutral);
        assert_eq!(result.headline_count, 1);
    }

    #[tokio::test]
    async fn test_first_serving_tier_wins_and_scores_are_averaged() {
        let scorer = SentimentScorer::new(0.2)
            .with_tier(FailingTier(SentimentSource::Cloud), Duration::from_secs(1))
            .with_tier(
                FixedTier { source: SentimentSource::Local, scores: vec![0.8, 0.2] },
                Duration::from_secs(1),
            );

        let result = scorer
            .score(&headlines(&["a", "b"]), &CancelToken::new())
            .await;
        assert_eq!(result.source, SentimentSource::Local);
        assert!((result.score - 0.5).abs() < 1e-9);
        assert_eq!(result.label, SentimentLabel::Positive);
    }

    #[tokio::test]
    async fn test_high_impact_topics_are_counted_for_every_tier() {
        let news = headlines(&["Fed signals patience on interest rates", "Local bakery opens"]);

        let keyword = all_failing().score(&news, &CancelToken::new()).await;
        assert_eq!(keyword.source, SentimentSource::Keyword);
        assert_eq!(keyword.high_impact_count, 2);

        let local = SentimentScorer::new(0.2).with_tier(
            FixedTier { source: SentimentSource::Local, scores: vec![0.1, 0.0] },
            Duration::from_secs(1),
        );
        let result = local.score(&news, &CancelToken::new()).await;
        assert_eq!(result.source, SentimentSource::Local);
        assert_eq!(result.high_impact_count, 2);

        let quiet = all_failing()
            .score(&headlines(&["Stocks rally"]), &CancelToken::new())
            .await;
        assert_eq!(quiet.high_impact_count, 0);
    }

    #[tokio::test]
    async fn test_partial_scores_fall_through() {
        let scorer = SentimentScorer::new(0.2).with_tier(
            FixedTier { source: SentimentSource::Cloud, scores: vec![0.9] },
            Duration::from_secs(1),
        );

        let result = scorer
            .score(&headlines(&["Stocks rally", "Markets crash"]), &CancelToken::new())
            .await;
        assert_eq!(result.source, SentimentSource::Keyword);
        assert_eq!(result.score, 0.0);
    }

    #[tokio::test]
    async fn test_cloud_timeout_with_local_unavailable_uses_keywords() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({
                        "candidates": [{ "content": { "parts": [{ "text": "{\"scores\": [0.9]}" }] } }]
                    }))
                    .set_delay(Duration::from_secs(5)),
            )
            .mount(&server)
            .await;

        let client = GeminiClient::new(server.uri(), "m".into(), "k".into(), Duration::from_secs(30)).unwrap();
        let scorer = SentimentScorer::new(0.2)
            .with_tier(CloudTier::new(Some(client)), Duration::from_millis(100))
            .with_tier(LocalTier::new(None), Duration::from_secs(1));

        let started = Instant::now();
        let result = scorer
            .score(&headlines(&["Dow surges on strong jobs data"]), &CancelToken::new())
            .await;

        assert!(started.elapsed() < Duration::from_secs(2));
        assert_eq!(result.source, SentimentSource::Keyword);
        assert_eq!(result.score, 1.0);
        assert_eq!(result.label, SentimentLabel::Positive);
    }

    #[tokio::test]
    async fn test_cancellation_falls_through_immediately() {
        let scorer = SentimentScorer::new(0.2).with_tier(SlowTier, Duration::from_secs(30));
        let cancel = CancelToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            trigger.cancel();
        });

        let started = Instant::now();
        let result = scorer
            .score(&headlines(&["Futures slump on recession fears"]), &cancel)
            .await;

        assert!(started.elapsed() < Duration::from_secs(2));
        assert_eq!(result.source, SentimentSource::Keyword);
        assert!(result.score < 0.0);
    }

    #[tokio::test]
    async fn test_cloud_auth_failure_falls_to_local_and_checks_health_once() {
        let cloud = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&cloud)
            .await;

        let local = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/health"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&local)
            .await;
        Mock::given(method("POST"))
            .and(path("/predict"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "predictions": [{
                    "label": "negative", "positive": 0.1, "negative": 0.8,
                    "neutral": 0.1, "confidence": 0.8, "score": -0.7
                }]
            })))
            .mount(&local)
            .await;

        let gemini = GeminiClient::new(cloud.uri(), "m".into(), "bad".into(), Duration::from_secs(5)).unwrap();
        let finbert = SentimentClient::new(local.uri(), Duration::from_secs(5)).unwrap();
        let scorer = SentimentScorer::new(0.2)
            .with_tier(CloudTier::new(Some(gemini)), Duration::from_secs(5))
            .with_tier(LocalTier::new(Some(finbert)), Duration::from_secs(5));

        for _ in 0..2 {
            let result = scorer
                .score_for("US30", &headlines(&["Dow slides"]), &CancelToken::new())
                .await;
            assert_eq!(result.source, SentimentSource::Local);
            assert_eq!(result.model_name, "finbert");
            assert!((result.score + 0.7).abs() < 1e-9);
            assert_eq!(result.label, SentimentLabel::Negative);
        }
    }

    #[tokio::test]
    async fn test_try_tiers_reports_unavailable() {
        let err = SentimentScorer::new(0.2)
            .try_tiers("US30", &headlines(&["x"]), &CancelToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, SignalError::SentimentUnavailable(_)));
    }

    #[test]
    fn test_default_chain_order() {
        let scorer = SentimentScorer::from_config(&ScorerConfig::default()).unwrap();
        assert_eq!(
            scorer.chain(),
            vec![SentimentSource::Cloud, SentimentSource::Local, SentimentSource::Keyword]
        );
    }
}
