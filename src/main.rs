use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use dotenv::dotenv;
use std::path::PathBuf;
use std::sync::Arc;

use recap_rs::adk::model::create_model;
use recap_rs::recap::config::{ConfigLoader, RecapConfig};
use recap_rs::recap::extract::{Extractor, KeywordExtractor, LlmExtractor};
use recap_rs::recap::pipeline::{Recap, RecapOutcome};
use recap_rs::recap::server;
use recap_rs::recap::transcript::{StdinTranscriber, Transcriber, TranscriptBuffer};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Recap a transcript given inline or in a file
    Run {
        /// Transcript text
        #[arg(short, long, conflicts_with = "file")]
        text: Option<String>,

        /// Path to a transcript file
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Path to a YAML config file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Use keyword extraction instead of a model
        #[arg(long)]
        offline: bool,

        /// Print the outcome as JSON
        #[arg(long)]
        json: bool,
    },
    /// Read utterances from stdin until EOF, then recap them
    Listen {
        #[arg(short, long)]
        config: Option<PathBuf>,

        #[arg(long)]
        offline: bool,
    },
    /// Serve the HTTP API
    Serve {
        #[arg(short, long, default_value_t = 3000)]
        port: u16,

        #[arg(short, long)]
        config: Option<PathBuf>,

        #[arg(long)]
        offline: bool,
    },
}

fn build_recap(config_path: Option<PathBuf>, offline: bool) -> anyhow::Result<Recap> {
    let config = ConfigLoader::new().load_or_default(config_path)?;
    let extractor = build_extractor(&config, offline)?;
    Ok(Recap::from_config(extractor, &config)?)
}

fn build_extractor(config: &RecapConfig, offline: bool) -> anyhow::Result<Arc<dyn Extractor>> {
    if offline {
        log::info!("Offline mode: using keyword extraction");
        return Ok(Arc::new(KeywordExtractor::new()));
    }

    let provider = config.model.resolve_provider()?;
    let model = create_model(provider, &config.model.name)?;
    let mut extractor = LlmExtractor::new(model).with_temperature(config.model.temperature);
    if let Some(instruction) = &config.model.instruction {
        extractor = extractor.with_instruction(instruction.clone());
    }
    Ok(Arc::new(extractor))
}

fn print_outcome(outcome: &RecapOutcome, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(outcome)?);
        return Ok(());
    }

    println!("SUMMARY:\n{}\n", outcome.summary);
    println!("ACTIONS TAKEN:");
    if outcome.results.is_empty() {
        println!("(none)");
    }
    for result in &outcome.results {
        println!("- {}", result);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    env_logger::init();

    let args = Args::parse();

    match args.command {
        Commands::Run {
            text,
            file,
            config,
            offline,
            json,
        } => {
            let text = match (text, file) {
                (Some(text), _) => text,
                (None, Some(path)) => tokio::fs::read_to_string(&path)
                    .await
                    .with_context(|| format!("cannot read transcript {}", path.display()))?,
                (None, None) => bail!("pass --text or --file"),
            };

            let recap = build_recap(config, offline)?;
            let outcome = recap.run(&text).await?;
            print_outcome(&outcome, json)?;
        }
        Commands::Listen { config, offline } => {
            let recap = build_recap(config, offline)?;

            let (sink, buffer) = TranscriptBuffer::channel();
            StdinTranscriber::new().listen(sink).await?;
            let text = buffer.collect().await;

            let outcome = recap.run(&text).await?;
            print_outcome(&outcome, false)?;
        }
        Commands::Serve {
            port,
            config,
            offline,
        } => {
            let recap = Arc::new(build_recap(config, offline)?);
            server::serve(recap, port).await?;
        }
    }

    Ok(())
}
