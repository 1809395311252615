//! `medsynth`: generate synthetic medical records as NDJSON.
//!
//! Usage:
//!   medsynth --num-patients 200 --locale es_ES --skip-freetext
//!   medsynth --config medsynth.toml --api-base https://api.example.com/v1 --api-key ...

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use medsynth::config::GeneratorConfig;
use medsynth::error::{ConfigError, GenerateResult};
use medsynth::generate::{RunSummary, generate_documents};
use medsynth::locale::load_locale;
use medsynth::narrative::{ChatCompletionClient, NarrativeGenerator, is_local_endpoint};

/// Generate synthetic medical records with realistic schema variance.
#[derive(Debug, Parser)]
#[command(name = "medsynth", version, about)]
struct Cli {
    /// TOML file with run settings; flags override it.
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long)]
    num_patients: Option<usize>,

    #[arg(long)]
    seed: Option<u64>,

    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Locale code, e.g. he_IL or es_ES.
    #[arg(long)]
    locale: Option<String>,

    /// Chat model name.
    #[arg(long)]
    model: Option<String>,

    /// OpenAI-compatible API base URL.
    #[arg(long)]
    api_base: Option<String>,

    /// API key (or set LLM_API_KEY / OPENAI_API_KEY / MOONSHOT_API_KEY).
    #[arg(long)]
    api_key: Option<String>,

    /// Fill free-text fields with a placeholder instead of calling the model.
    #[arg(long)]
    skip_freetext: bool,

    /// Overwrite existing .ndjson files in the output directory.
    #[arg(long)]
    force: bool,

    #[arg(long, short)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "info" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .with_target(false)
        .compact()
        .init();

    match run(cli) {
        Ok(summary) => {
            print_summary(&summary);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> GenerateResult<RunSummary> {
    let config = resolve_config(cli)?;
    let locale = load_locale(&config.locale)?;

    let narrative = &config.narrative;
    if !config.skip_freetext && !is_local_endpoint(&narrative.api_base) && narrative.api_key.is_none() {
        return Err(ConfigError::Invalid {
            reason: format!(
                "API key not set for remote provider {}; use --api-key, set LLM_API_KEY, or use --skip-freetext",
                narrative.api_base
            ),
        }
        .into());
    }

    let mut client = if config.skip_freetext {
        None
    } else {
        Some(ChatCompletionClient::new(narrative)?)
    };
    let narrator = client.as_mut().map(|c| c as &mut dyn NarrativeGenerator);
    generate_documents(&config, &locale, narrator)
}

/// File values, then environment, then flags.
fn resolve_config(cli: Cli) -> Result<GeneratorConfig, ConfigError> {
    let mut config = match &cli.config {
        Some(path) => GeneratorConfig::from_toml_file(path)?,
        None => GeneratorConfig::default(),
    };
    config.narrative.apply_env();

    if let Some(n) = cli.num_patients {
        config.num_patients = n;
    }
    if let Some(seed) = cli.seed {
        config.seed = seed;
    }
    if let Some(dir) = cli.output_dir {
        config.output_dir = dir;
    }
    if let Some(locale) = cli.locale {
        config.locale = locale;
    }
    if let Some(model) = cli.model {
        config.narrative.model = model;
    }
    if let Some(base) = cli.api_base {
        config.narrative.api_base = base;
    }
    if let Some(key) = cli.api_key.filter(|key| !key.is_empty()) {
        config.narrative.api_key = Some(key);
    }
    config.skip_freetext |= cli.skip_freetext;
    config.force |= cli.force;

    config.validate()?;
    Ok(config)
}

fn print_summary(summary: &RunSummary) {
    println!(
        "\nDone. {} documents across {} indices.",
        summary.total_documents(),
        summary.indices.len()
    );
    let mut indices: Vec<_> = summary.indices.iter().collect();
    indices.sort_by(|a, b| a.name.cmp(&b.name));
    for index in indices {
        println!("  {}: {}", index.name, index.documents);
    }
    if summary.narratives_failed > 0 {
        println!("  ({} narratives failed and were left empty)", summary.narratives_failed);
    }
}
