//! Lexweave CLI: run queries against corpus files.
//!
//! Usage:
//!   lexweave query <text> --primary corpus.yaml [--foundation doctrine.yaml]... [--lexicon lexicon.yaml]
//!   lexweave health --primary corpus.yaml [--foundation doctrine.yaml]...
//!   lexweave config [--config path]

use clap::{Args, Parser, Subcommand};
use lexweave::{
    ComplexityLevel, ConceptExtractor, InMemoryCorpus, LexiconExtractor, Orchestrator,
    OrchestratorConfig, QueryContext, SourcePreference, SourceType, StaticExtractor,
    TieredFoundationAdapter, DEFAULT_RESULT_LIMIT,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::Level;

#[derive(Parser)]
#[command(
    name = "lexweave",
    version,
    about = "Contextual multi-source retrieval orchestrator"
)]
struct Cli {
    /// Config file (defaults to <config dir>/lexweave/config.yaml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Log verbosity: -v for debug, -vv for trace
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct SourceArgs {
    /// Primary corpus file (YAML or JSON)
    #[arg(long)]
    primary: PathBuf,
    /// Foundation corpus file; repeat for several
    #[arg(long)]
    foundation: Vec<PathBuf>,
    /// Concept lexicon file; without one no concepts are extracted
    #[arg(long)]
    lexicon: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Answer a query and print the integrated response as JSON
    Query {
        /// Query text
        text: String,
        #[command(flatten)]
        sources: SourceArgs,
        /// Maximum number of results across all buckets
        #[arg(long, default_value_t = DEFAULT_RESULT_LIMIT)]
        limit: usize,
        /// foundation_focus, primary_focus, foundation_only or primary_only
        #[arg(long)]
        preference: Option<SourcePreference>,
        /// low, medium or high
        #[arg(long)]
        complexity: Option<ComplexityLevel>,
        /// Do not query foundation corpora
        #[arg(long)]
        no_foundation: bool,
        /// Query adapters one after another instead of concurrently
        #[arg(long)]
        sequential: bool,
    },
    /// Probe the configured corpora and print the health report as JSON
    Health {
        #[command(flatten)]
        sources: SourceArgs,
    },
    /// Print the effective configuration as YAML
    Config,
}

/// Default config path (~/.config/lexweave/config.yaml)
fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("lexweave").join("config.yaml"))
}

fn load_config(explicit: Option<PathBuf>) -> Result<OrchestratorConfig, String> {
    let path = match explicit {
        Some(path) => path,
        None => match default_config_path() {
            Some(path) if path.exists() => path,
            _ => return Ok(OrchestratorConfig::default()),
        },
    };
    OrchestratorConfig::load(&path).map_err(|e| e.to_string())
}

fn load_corpus(path: &Path, expected: SourceType) -> Result<InMemoryCorpus, String> {
    let corpus = InMemoryCorpus::load(path).map_err(|e| e.to_string())?;
    if corpus.source_type_of() != expected {
        return Err(format!(
            "{} declares source_type {}, expected {}",
            path.display(),
            corpus.source_type_of(),
            expected
        ));
    }
    Ok(corpus)
}

fn build_orchestrator(
    config: OrchestratorConfig,
    sources: &SourceArgs,
) -> Result<Orchestrator, String> {
    let extractor: Arc<dyn ConceptExtractor> = match &sources.lexicon {
        Some(path) => Arc::new(LexiconExtractor::load(path).map_err(|e| e.to_string())?),
        None => Arc::new(StaticExtractor::empty()),
    };
    let primary = load_corpus(&sources.primary, SourceType::Primary)?;
    let mut orchestrator = Orchestrator::new(config, extractor, Arc::new(primary));
    for path in &sources.foundation {
        let corpus = load_corpus(path, SourceType::Foundation)?;
        orchestrator = orchestrator
            .with_foundation(Arc::new(TieredFoundationAdapter::new(Arc::new(corpus))));
    }
    Ok(orchestrator)
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

fn print_json<T: serde::Serialize>(value: &T) -> i32 {
    match serde_json::to_string_pretty(value) {
        Ok(json) => {
            println!("{}", json);
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = match load_config(cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let code = match cli.command {
        Commands::Config => match config.to_yaml() {
            Ok(yaml) => {
                print!("{}", yaml);
                0
            }
            Err(e) => {
                eprintln!("Error: {}", e);
                1
            }
        },
        Commands::Health { sources } => match build_orchestrator(config, &sources) {
            Ok(orchestrator) => print_json(&orchestrator.health().await),
            Err(e) => {
                eprintln!("Error: {}", e);
                1
            }
        },
        Commands::Query {
            text,
            sources,
            limit,
            preference,
            complexity,
            no_foundation,
            sequential,
        } => {
            let mut config = config;
            if no_foundation {
                config.runtime.foundation_enabled = false;
            }
            if sequential {
                config.runtime.parallel_enabled = false;
            }
            let orchestrator = match build_orchestrator(config, &sources) {
                Ok(o) => o,
                Err(e) => {
                    eprintln!("Error: {}", e);
                    std::process::exit(1);
                }
            };
            let context = QueryContext {
                preference,
                complexity,
                ..QueryContext::default()
            };
            let response = orchestrator.retrieve(&text, &context, limit).await;
            print_json(&response)
        }
    };
    std::process::exit(code);
}
