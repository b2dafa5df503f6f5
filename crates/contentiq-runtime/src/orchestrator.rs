//! Analysis orchestrator.
//!
//! Tries the primary provider, falls back to the second provider, and
//! always finishes the base analysis with local scoring:
//! - Primary skipped when unconfigured or its circuit is open
//! - Every provider call bounded by `provider_timeout`
//! - Failures logged and absorbed unless both paths are unavailable and
//!   the primary failed for a configuration reason

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use contentiq_core::{
    AnalysisRequest, BrandContext, ContentAnalysis, RequestError, Synthesizer,
};

use crate::config::{ConfigError, RuntimeConfig, ENV_API_KEY};
use crate::providers::{
    build_client, AnalysisProvider, ApiCredential, CompletionConfig, FallbackAnalyzer, NluClient,
    ProviderError, ProviderOutput, TokenCache, TokenUsage, WatsonxGenerator,
};
use crate::resilience::{CircuitBreaker, CircuitBreakerConfig};

/// Errors from the orchestrator.
#[derive(Error, Debug)]
pub enum RuntimeError {
    #[error("Invalid request: {0}")]
    Request(#[from] RequestError),

    #[error("Provider not configured: {0}")]
    ProviderNotConfigured(String),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("No provider available (primary: {primary}; fallback: {fallback})")]
    ProvidersUnavailable { primary: String, fallback: String },
}

/// Which path produced the base analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisSource {
    Primary,
    Fallback,
    /// Neither provider answered; the neutral analysis was used
    Default,
}

impl AnalysisSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisSource::Primary => "primary",
            AnalysisSource::Fallback => "fallback",
            AnalysisSource::Default => "default",
        }
    }
}

/// The analysis plus how it was produced.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisReport {
    pub analysis: ContentAnalysis,
    pub source: AnalysisSource,

    /// Why the primary was skipped or failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary_error: Option<String>,

    /// Why the fallback failed, when it was tried
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback_error: Option<String>,

    /// Token usage of the fallback model, when it ran
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<TokenUsage>,

    pub analyzed_at: DateTime<Utc>,
}

/// Public entry point for content analysis.
pub struct ContentAnalyzer {
    primary: Option<Arc<dyn AnalysisProvider>>,
    fallback: Option<Arc<dyn AnalysisProvider>>,
    circuit_breaker: CircuitBreaker,
    provider_timeout: Duration,
    synthesizer: Synthesizer,
}

impl ContentAnalyzer {
    pub fn builder() -> ContentAnalyzerBuilder {
        ContentAnalyzerBuilder::new()
    }

    /// Wire the IBM providers from configuration.
    ///
    /// A missing API key is not an error here; calls that need a token
    /// report it and the orchestrator applies its fallback rules.
    pub fn from_config(config: RuntimeConfig) -> Result<Self, RuntimeError> {
        config.validate()?;

        let client = build_client(config.request_timeout)?;
        let credential =
            match ApiCredential::from_config_or_env(config.api_key, ENV_API_KEY, "IBM Cloud API key")
            {
                Ok(credential) => Some(credential),
                Err(e) => {
                    tracing::debug!(error = %e, "No API key, token exchange disabled");
                    None
                }
            };
        let tokens = Arc::new(TokenCache::new(
            client.clone(),
            config.identity_url,
            credential,
        ));

        let nlu = NluClient::new(client.clone(), tokens.clone(), config.nlu);

        let generation = config.generation;
        let generator = WatsonxGenerator::new(client, tokens, &generation);
        let completion = CompletionConfig {
            model: generation.model.clone(),
            max_new_tokens: generation.max_new_tokens,
            temperature: generation.temperature,
            top_p: generation.top_p,
            top_k: generation.top_k,
            repetition_penalty: generation.repetition_penalty,
            ..CompletionConfig::default()
        };
        let fallback = FallbackAnalyzer::new(Arc::new(generator))
            .with_completion_config(completion)
            .with_max_input_chars(generation.max_input_chars);

        Self::builder()
            .primary(Arc::new(nlu))
            .fallback(Arc::new(fallback))
            .circuit_breaker(config.circuit_breaker)
            .provider_timeout(config.provider_timeout)
            .build()
    }

    /// Analyze `text` and return only the analysis.
    pub async fn analyze_content(
        &self,
        text: &str,
        brand_context: Option<BrandContext>,
    ) -> Result<ContentAnalysis, RuntimeError> {
        let mut request = AnalysisRequest::new(text)?;
        if let Some(brand) = brand_context {
            request = request.with_brand_context(brand);
        }
        Ok(self.analyze_detailed(&request).await?.analysis)
    }

    /// Analyze a request and report which path produced it.
    pub async fn analyze_detailed(
        &self,
        request: &AnalysisRequest,
    ) -> Result<AnalysisReport, RuntimeError> {
        let text = request.text();

        let primary_failure = match self.try_primary(text).await {
            Ok(output) => {
                return Ok(self.finish(output, AnalysisSource::Primary, None, None, request));
            }
            Err(e) => e,
        };

        let fallback_failure = match self.try_fallback(text).await {
            Ok(output) => {
                return Ok(self.finish(
                    output,
                    AnalysisSource::Fallback,
                    Some(primary_failure.to_string()),
                    None,
                    request,
                ));
            }
            Err(e) => e,
        };

        if primary_failure.is_configuration() {
            return Err(RuntimeError::ProvidersUnavailable {
                primary: primary_failure.to_string(),
                fallback: fallback_failure.to_string(),
            });
        }

        tracing::warn!(
            primary_error = %primary_failure,
            fallback_error = %fallback_failure,
            "All providers failed, using neutral analysis"
        );

        let output = ProviderOutput {
            analysis: ContentAnalysis::neutral(),
            usage: None,
        };
        Ok(self.finish(
            output,
            AnalysisSource::Default,
            Some(primary_failure.to_string()),
            Some(fallback_failure.to_string()),
            request,
        ))
    }

    async fn try_primary(&self, text: &str) -> Result<ProviderOutput, ProviderError> {
        let primary = match &self.primary {
            Some(p) if p.is_configured() => p,
            Some(p) => {
                return Err(ProviderError::NotConfigured(format!(
                    "{} has no endpoint",
                    p.name()
                )))
            }
            None => {
                return Err(ProviderError::NotConfigured(
                    "no primary provider".to_string(),
                ))
            }
        };
        let name = primary.name();

        if self.circuit_breaker.is_open(name) {
            tracing::warn!(provider = name, "Circuit open, skipping to fallback");
            return Err(ProviderError::CircuitOpen(name.to_string()));
        }

        match self.call_with_timeout(primary.as_ref(), text).await {
            Ok(output) => {
                self.circuit_breaker.record_success(name);
                Ok(output)
            }
            Err(e) => {
                tracing::warn!(provider = name, error = %e, "Primary provider failed, falling back");
                self.circuit_breaker.record_failure(name);
                Err(e)
            }
        }
    }

    async fn try_fallback(&self, text: &str) -> Result<ProviderOutput, ProviderError> {
        let fallback = self
            .fallback
            .as_ref()
            .ok_or_else(|| ProviderError::NotConfigured("no fallback provider".to_string()))?;

        if !fallback.is_configured() {
            return Err(ProviderError::NotConfigured(format!(
                "{} is missing credentials or project",
                fallback.name()
            )));
        }

        self.call_with_timeout(fallback.as_ref(), text)
            .await
            .inspect_err(|e| {
                tracing::warn!(provider = fallback.name(), error = %e, "Fallback provider failed");
            })
    }

    async fn call_with_timeout(
        &self,
        provider: &dyn AnalysisProvider,
        text: &str,
    ) -> Result<ProviderOutput, ProviderError> {
        match tokio::time::timeout(self.provider_timeout, provider.analyze_detailed(text)).await {
            Ok(result) => result,
            Err(_) => Err(ProviderError::Timeout(self.provider_timeout)),
        }
    }

    fn finish(
        &self,
        output: ProviderOutput,
        source: AnalysisSource,
        primary_error: Option<String>,
        fallback_error: Option<String>,
        request: &AnalysisRequest,
    ) -> AnalysisReport {
        tracing::debug!(source = source.as_str(), "Base analysis selected");

        AnalysisReport {
            analysis: self.synthesizer.synthesize(output.analysis, request),
            source,
            primary_error,
            fallback_error,
            usage: output.usage,
            analyzed_at: Utc::now(),
        }
    }

    pub fn circuit_breaker(&self) -> &CircuitBreaker {
        &self.circuit_breaker
    }
}

/// Builder for [`ContentAnalyzer`].
pub struct ContentAnalyzerBuilder {
    primary: Option<Arc<dyn AnalysisProvider>>,
    fallback: Option<Arc<dyn AnalysisProvider>>,
    circuit_breaker: CircuitBreakerConfig,
    provider_timeout: Duration,
}

impl ContentAnalyzerBuilder {
    pub fn new() -> Self {
        Self {
            primary: None,
            fallback: None,
            circuit_breaker: CircuitBreakerConfig::default(),
            provider_timeout: Duration::from_secs(60),
        }
    }

    pub fn primary(mut self, provider: Arc<dyn AnalysisProvider>) -> Self {
        self.primary = Some(provider);
        self
    }

    pub fn fallback(mut self, provider: Arc<dyn AnalysisProvider>) -> Self {
        self.fallback = Some(provider);
        self
    }

    pub fn circuit_breaker(mut self, config: CircuitBreakerConfig) -> Self {
        self.circuit_breaker = config;
        self
    }

    pub fn provider_timeout(mut self, timeout: Duration) -> Self {
        self.provider_timeout = timeout;
        self
    }

    /// Build the analyzer. At least one provider is required.
    pub fn build(self) -> Result<ContentAnalyzer, RuntimeError> {
        if self.primary.is_none() && self.fallback.is_none() {
            return Err(RuntimeError::ProviderNotConfigured(
                "No provider set".to_string(),
            ));
        }

        Ok(ContentAnalyzer {
            primary: self.primary,
            fallback: self.fallback,
            circuit_breaker: CircuitBreaker::new(self.circuit_breaker),
            provider_timeout: self.provider_timeout,
            synthesizer: Synthesizer::new(),
        })
    }
}

impl Default for ContentAnalyzerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use contentiq_core::{
        brand_alignment_score, readability_score, KeywordResult, SentimentLabel, SentimentResult,
        Suggestion,
    };
    use std::sync::atomic::{AtomicUsize, Ordering};

    enum Behavior {
        Succeed(ContentAnalysis),
        Fail(fn() -> ProviderError),
        Hang,
        Unconfigured,
    }

    struct MockProvider {
        name: &'static str,
        behavior: Behavior,
        calls: AtomicUsize,
    }

    impl MockProvider {
        fn new(name: &'static str, behavior: Behavior) -> Arc<Self> {
            Arc::new(Self {
                name,
                behavior,
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl AnalysisProvider for MockProvider {
        async fn analyze(&self, _text: &str) -> Result<ContentAnalysis, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.behavior {
                Behavior::Succeed(analysis) => Ok(analysis.clone()),
                Behavior::Fail(make) => Err(make()),
                Behavior::Hang => {
                    tokio::time::sleep(Duration::from_secs(3600)).await;
                    Ok(ContentAnalysis::neutral())
                }
                Behavior::Unconfigured => Err(ProviderError::NotConfigured("unused".into())),
            }
        }

        fn name(&self) -> &str {
            self.name
        }

        fn is_configured(&self) -> bool {
            !matches!(self.behavior, Behavior::Unconfigured)
        }
    }

    fn server_error() -> ProviderError {
        ProviderError::ApiError {
            status: 500,
            message: "internal error".into(),
        }
    }

    fn transport_error() -> ProviderError {
        ProviderError::HttpError("connection refused".into())
    }

    fn positive_base() -> ContentAnalysis {
        ContentAnalysis {
            sentiment: SentimentResult::new(SentimentLabel::Positive, 0.8),
            keywords: vec![
                KeywordResult::new("summer", 0.9),
                KeywordResult::new("collection", 0.7),
                KeywordResult::new("launch", 0.5),
            ],
            brand_alignment_score: 0,
            readability_score: 3,
            ..ContentAnalysis::neutral()
        }
    }

    fn request(text: &str) -> AnalysisRequest {
        AnalysisRequest::new(text).unwrap()
    }

    #[tokio::test]
    async fn test_primary_success_scores_locally() {
        let analyzer = ContentAnalyzer::builder()
            .primary(MockProvider::new("nlu", Behavior::Succeed(positive_base())))
            .fallback(MockProvider::new("llm", Behavior::Fail(transport_error)))
            .build()
            .unwrap();

        let text = "Our summer collection launch is here. Come and see it.";
        let report = analyzer.analyze_detailed(&request(text)).await.unwrap();

        assert_eq!(report.source, AnalysisSource::Primary);
        assert!(report.primary_error.is_none());
        let analysis = report.analysis;
        assert_eq!(analysis.sentiment.label, SentimentLabel::Positive);
        assert_eq!(analysis.readability_score, readability_score(text));
        assert_eq!(
            analysis.brand_alignment_score,
            brand_alignment_score(text, &analysis.keywords, None)
        );
        assert_eq!(analysis.brand_alignment_score, 77);
    }

    #[tokio::test]
    async fn test_primary_failure_uses_fallback() {
        let primary = MockProvider::new("nlu", Behavior::Fail(server_error));
        let fallback = MockProvider::new("llm", Behavior::Succeed(positive_base()));
        let analyzer = ContentAnalyzer::builder()
            .primary(primary.clone())
            .fallback(fallback.clone())
            .build()
            .unwrap();

        let report = analyzer
            .analyze_detailed(&request("Some campaign text."))
            .await
            .unwrap();

        assert_eq!(report.source, AnalysisSource::Fallback);
        assert!(report.primary_error.unwrap().contains("500"));
        assert_eq!(primary.calls(), 1);
        assert_eq!(fallback.calls(), 1);
    }

    #[tokio::test]
    async fn test_unconfigured_primary_goes_straight_to_fallback() {
        let primary = MockProvider::new("nlu", Behavior::Unconfigured);
        let fallback = MockProvider::new("llm", Behavior::Succeed(positive_base()));
        let analyzer = ContentAnalyzer::builder()
            .primary(primary.clone())
            .fallback(fallback)
            .build()
            .unwrap();

        let report = analyzer
            .analyze_detailed(&request("Some text."))
            .await
            .unwrap();

        assert_eq!(report.source, AnalysisSource::Fallback);
        assert_eq!(primary.calls(), 0);
    }

    #[tokio::test]
    async fn test_both_fail_with_runtime_errors_degrades_to_default() {
        let analyzer = ContentAnalyzer::builder()
            .primary(MockProvider::new("nlu", Behavior::Fail(server_error)))
            .fallback(MockProvider::new("llm", Behavior::Fail(transport_error)))
            .build()
            .unwrap();

        let text = "Buy now! Guaranteed best-in-class results, act today!";
        let brand = BrandContext::new().with_forbidden_words(["guaranteed", "best-in-class"]);
        let report = analyzer
            .analyze_detailed(&request(text).with_brand_context(brand))
            .await
            .unwrap();

        assert_eq!(report.source, AnalysisSource::Default);
        assert!(report.fallback_error.is_some());
        assert_eq!(report.analysis.sentiment, SentimentResult::neutral());
        assert_eq!(report.analysis.brand_alignment_score, 40);
        assert_eq!(report.analysis.readability_score, 64);
        assert!(report
            .analysis
            .suggestions
            .contains(&Suggestion::AddFocus.message().to_string()));
    }

    #[tokio::test]
    async fn test_configuration_failure_with_failing_fallback_is_error() {
        let analyzer = ContentAnalyzer::builder()
            .primary(MockProvider::new("nlu", Behavior::Unconfigured))
            .fallback(MockProvider::new("llm", Behavior::Fail(transport_error)))
            .build()
            .unwrap();

        let err = analyzer
            .analyze_content("Some text.", None)
            .await
            .unwrap_err();
        assert!(matches!(err, RuntimeError::ProvidersUnavailable { .. }));
    }

    #[tokio::test]
    async fn test_unconfigured_fallback_is_not_called() {
        let fallback = MockProvider::new("llm", Behavior::Unconfigured);
        let analyzer = ContentAnalyzer::builder()
            .primary(MockProvider::new("nlu", Behavior::Fail(server_error)))
            .fallback(fallback.clone())
            .build()
            .unwrap();

        let report = analyzer
            .analyze_detailed(&request("Some text."))
            .await
            .unwrap();

        assert_eq!(report.source, AnalysisSource::Default);
        assert!(report.fallback_error.unwrap().contains("not configured"));
        assert_eq!(fallback.calls(), 0);
    }

    #[tokio::test]
    async fn test_auth_failure_with_failing_fallback_is_error() {
        fn auth_error() -> ProviderError {
            ProviderError::AuthError {
                status: 400,
                message: "invalid apikey".into(),
            }
        }

        let analyzer = ContentAnalyzer::builder()
            .primary(MockProvider::new("nlu", Behavior::Fail(auth_error)))
            .fallback(MockProvider::new("llm", Behavior::Fail(transport_error)))
            .build()
            .unwrap();

        let result = analyzer.analyze_content("Some text.", None).await;
        assert!(matches!(
            result,
            Err(RuntimeError::ProvidersUnavailable { .. })
        ));
    }

    #[tokio::test]
    async fn test_empty_text_is_rejected_before_providers() {
        let primary = MockProvider::new("nlu", Behavior::Succeed(positive_base()));
        let analyzer = ContentAnalyzer::builder()
            .primary(primary.clone())
            .build()
            .unwrap();

        let err = analyzer.analyze_content("   ", None).await.unwrap_err();
        assert!(matches!(err, RuntimeError::Request(RequestError::EmptyText)));
        assert_eq!(primary.calls(), 0);
    }

    #[tokio::test]
    async fn test_circuit_opens_and_skips_primary() {
        let primary = MockProvider::new("nlu", Behavior::Fail(server_error));
        let fallback = MockProvider::new("llm", Behavior::Succeed(positive_base()));
        let analyzer = ContentAnalyzer::builder()
            .primary(primary.clone())
            .fallback(fallback.clone())
            .build()
            .unwrap();

        for _ in 0..4 {
            analyzer
                .analyze_detailed(&request("Some text."))
                .await
                .unwrap();
        }

        assert_eq!(primary.calls(), 3);
        assert_eq!(fallback.calls(), 4);
        assert_eq!(analyzer.circuit_breaker().state("nlu").name(), "open");
    }

    #[tokio::test(start_paused = true)]
    async fn test_hanging_primary_times_out() {
        let analyzer = ContentAnalyzer::builder()
            .primary(MockProvider::new("nlu", Behavior::Hang))
            .fallback(MockProvider::new("llm", Behavior::Succeed(positive_base())))
            .provider_timeout(Duration::from_secs(2))
            .build()
            .unwrap();

        let report = analyzer
            .analyze_detailed(&request("Some text."))
            .await
            .unwrap();

        assert_eq!(report.source, AnalysisSource::Fallback);
        assert!(report.primary_error.unwrap().contains("Timeout"));
    }

    #[test]
    fn test_builder_requires_a_provider() {
        assert!(matches!(
            ContentAnalyzer::builder().build(),
            Err(RuntimeError::ProviderNotConfigured(_))
        ));
    }

    #[test]
    fn test_report_serializes_source() {
        let report = AnalysisReport {
            analysis: ContentAnalysis::neutral(),
            source: AnalysisSource::Fallback,
            primary_error: Some("boom".into()),
            fallback_error: None,
            usage: None,
            analyzed_at: Utc::now(),
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["source"], "fallback");
        assert_eq!(json["primaryError"], "boom");
        assert!(json.get("fallbackError").is_none());
        assert_eq!(json["analysis"]["readabilityScore"], 50);
        assert!(json["analyzedAt"].is_string());
    }
}
