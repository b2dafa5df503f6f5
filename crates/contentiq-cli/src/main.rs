use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use contentiq_core::{analyze_offline, parse_list, AnalysisRequest, BrandContext};
use contentiq_runtime::{ContentAnalyzer, RuntimeConfig};

mod output;

#[derive(Parser, Debug)]
#[command(name = "contentiq", version)]
#[command(about = "Sentiment, keywords, brand alignment and readability for content")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Analyze text with the configured providers
    Analyze(AnalyzeArgs),

    /// Score text locally without contacting any provider
    Score(InputArgs),
}

#[derive(Args, Debug)]
struct AnalyzeArgs {
    #[command(flatten)]
    input: InputArgs,

    /// Runtime configuration file (YAML)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Include the provider path and token usage in the output
    #[arg(long)]
    detailed: bool,
}

#[derive(Args, Debug)]
struct InputArgs {
    /// Text to analyze. Read from --file or stdin when omitted.
    text: Option<String>,

    /// Read the text from a file
    #[arg(long, short, value_name = "PATH", conflicts_with = "text")]
    file: Option<PathBuf>,

    /// Brand guidelines file (YAML)
    #[arg(long, value_name = "PATH")]
    brand_file: Option<PathBuf>,

    /// Brand voice description
    #[arg(long)]
    brand_voice: Option<String>,

    /// Comma-separated forbidden words
    #[arg(long, value_name = "a,b")]
    forbidden: Option<String>,

    /// Comma-separated mandatory elements
    #[arg(long, value_name = "a,b")]
    mandatory: Option<String>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    format: OutputFormat,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum OutputFormat {
    Json,
    Text,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze(args) => run_analyze(args).await,
        Commands::Score(args) => run_score(args),
    }
}

async fn run_analyze(args: AnalyzeArgs) -> Result<()> {
    let request = build_request(&args.input)?;
    let config = load_config(args.config.as_deref())?;
    let analyzer = ContentAnalyzer::from_config(config).context("Failed to set up providers")?;

    let report = analyzer
        .analyze_detailed(&request)
        .await
        .context("Analysis failed")?;

    tracing::info!(
        source = report.source.as_str(),
        primary_error = report.primary_error.as_deref(),
        "Analysis completed"
    );

    let rendered = match (args.input.format, args.detailed) {
        (OutputFormat::Json, true) => serde_json::to_string_pretty(&report)?,
        (OutputFormat::Json, false) => serde_json::to_string_pretty(&report.analysis)?,
        (OutputFormat::Text, true) => output::render_report(&report),
        (OutputFormat::Text, false) => output::render_analysis(&report.analysis),
    };
    println!("{}", rendered.trim_end());
    Ok(())
}

fn run_score(args: InputArgs) -> Result<()> {
    let request = build_request(&args)?;
    let analysis = analyze_offline(&request);

    let rendered = match args.format {
        OutputFormat::Json => serde_json::to_string_pretty(&analysis)?,
        OutputFormat::Text => output::render_analysis(&analysis),
    };
    println!("{}", rendered.trim_end());
    Ok(())
}

fn build_request(args: &InputArgs) -> Result<AnalysisRequest> {
    let text = read_text(args)?;
    let mut request = AnalysisRequest::new(text)?;

    let brand = build_brand_context(args)?;
    if !brand.is_empty() {
        request = request.with_brand_context(brand);
    }
    Ok(request)
}

fn read_text(args: &InputArgs) -> Result<String> {
    if let Some(text) = &args.text {
        return Ok(text.clone());
    }
    if let Some(path) = &args.file {
        return std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()));
    }

    let mut text = String::new();
    std::io::stdin()
        .read_to_string(&mut text)
        .context("Failed to read text from stdin")?;
    Ok(text)
}

/// Brand file first, then flags. A flag replaces the file's value.
fn build_brand_context(args: &InputArgs) -> Result<BrandContext> {
    let mut brand = match &args.brand_file {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            parse_brand(&raw).with_context(|| format!("Invalid brand file {}", path.display()))?
        }
        None => BrandContext::new(),
    };

    if let Some(voice) = &args.brand_voice {
        brand = brand.with_brand_voice(voice.clone());
    }
    if let Some(forbidden) = &args.forbidden {
        brand = brand.with_forbidden_words(parse_list(forbidden));
    }
    if let Some(mandatory) = &args.mandatory {
        brand = brand.with_mandatory_elements(parse_list(mandatory));
    }
    Ok(brand)
}

fn parse_brand(raw: &str) -> Result<BrandContext> {
    let parsed: BrandContext = serde_yaml::from_str(raw)?;
    // Re-apply list cleaning to file values.
    let BrandContext {
        brand_voice,
        forbidden_words,
        mandatory_elements,
    } = parsed;
    let mut brand = BrandContext::new()
        .with_forbidden_words(forbidden_words)
        .with_mandatory_elements(mandatory_elements);
    brand.brand_voice = brand_voice.filter(|v| !v.trim().is_empty());
    Ok(brand)
}

fn load_config(path: Option<&Path>) -> Result<RuntimeConfig> {
    let config = match path {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            if raw.trim().is_empty() {
                RuntimeConfig::default()
            } else {
                serde_yaml::from_str(&raw)
                    .with_context(|| format!("Invalid config file {}", path.display()))?
            }
        }
        None => RuntimeConfig::default(),
    };

    Ok(config.with_env_overrides()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_analyze_args() {
        let cli = Cli::try_parse_from([
            "contentiq",
            "analyze",
            "Buy now!",
            "--forbidden",
            "guaranteed, best-in-class,",
            "--format",
            "text",
            "--detailed",
        ])
        .unwrap();

        let Commands::Analyze(args) = cli.command else {
            panic!("expected analyze");
        };
        assert!(args.detailed);
        assert_eq!(args.input.format, OutputFormat::Text);

        let brand = build_brand_context(&args.input).unwrap();
        assert_eq!(brand.forbidden_words, vec!["guaranteed", "best-in-class"]);
        assert!(brand.mandatory_elements.is_empty());
    }

    #[test]
    fn test_text_and_file_conflict() {
        let result = Cli::try_parse_from(["contentiq", "score", "hi", "--file", "x.txt"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_brand_yaml() {
        let brand = parse_brand(
            r#"
brand_voice: "Warm and direct"
forbidden_words: ["guaranteed", "  ", "cheap "]
mandatory_elements:
  - "@acme"
"#,
        )
        .unwrap();

        assert_eq!(brand.brand_voice.as_deref(), Some("Warm and direct"));
        assert_eq!(brand.forbidden_words, vec!["guaranteed", "cheap"]);
        assert_eq!(brand.mandatory_elements, vec!["@acme"]);
    }

    #[test]
    fn test_parse_brand_camel_case_keys() {
        let brand = parse_brand("forbiddenWords: [free]\nmandatoryElements: ['#launch']\n").unwrap();
        assert_eq!(brand.forbidden_words, vec!["free"]);
        assert_eq!(brand.mandatory_elements, vec!["#launch"]);
    }

    #[test]
    fn test_empty_text_is_rejected() {
        let cli = Cli::try_parse_from(["contentiq", "score", "   "]).unwrap();
        let Commands::Score(args) = cli.command else {
            panic!("expected score");
        };
        assert!(build_request(&args).is_err());
    }

    #[test]
    fn test_config_yaml() {
        let config: RuntimeConfig = serde_yaml::from_str(
            r#"
request_timeout: 10s
nlu:
  url: https://api.us-south.natural-language-understanding.watson.cloud.ibm.com/instances/abc
generation:
  project_id: proj-1
  max_input_chars: 2000
"#,
        )
        .unwrap();

        assert_eq!(config.request_timeout.as_secs(), 10);
        assert!(config.nlu.url.is_some());
        assert_eq!(config.generation.max_input_chars, 2000);
        assert_eq!(config.generation.model, "ibm/granite-3.1-8b-instruct");
    }
}
