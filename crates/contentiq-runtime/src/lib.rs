//! # contentiq-runtime
//!
//! Provider-backed content analysis.
//!
//! This crate talks to the network. It wraps the deterministic scoring in
//! `contentiq-core` with two analysis providers:
//! - IBM Watson NLU as the primary
//! - A Granite model on watsonx.ai as the fallback, prompted to emulate NLU
//!
//! Whatever the providers return, brand alignment, readability and
//! suggestions are recomputed locally before a result leaves
//! [`ContentAnalyzer`].
//!
//! ## Example
//!
//! ```rust,ignore
//! use contentiq_runtime::{ContentAnalyzer, RuntimeConfig};
//!
//! let analyzer = ContentAnalyzer::from_config(RuntimeConfig::from_env()?)?;
//! let analysis = analyzer.analyze_content("Nova coleção de verão!", None).await?;
//! println!("{}", analysis.readability_score);
//! ```

pub mod config;
pub mod orchestrator;
pub mod prompts;
pub mod providers;
pub mod resilience;

pub use config::{ConfigError, GenerationConfig, NluConfig, RuntimeConfig};
pub use orchestrator::{
    AnalysisReport, AnalysisSource, ContentAnalyzer, ContentAnalyzerBuilder, RuntimeError,
};
pub use providers::{
    AnalysisProvider, ApiCredential, FallbackAnalyzer, LlmProvider, NluClient, ProviderError,
    ProviderOutput, TokenCache, TokenUsage, WatsonxGenerator,
};
pub use resilience::{CircuitBreaker, CircuitBreakerConfig, CircuitState};
