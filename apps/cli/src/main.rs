use std::{
    io::{self, Write},
    time::{Duration, Instant},
};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use console::style;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use factreel_core::{
    Pipeline, PipelineConfig, Provider, RunReport, Services, blob_store_from_env, format_elapsed,
    http_client,
};

/// CLI wrapper for Provider enum (needed for clap ValueEnum)
#[derive(Clone, Default, ValueEnum)]
enum CliProvider {
    #[default]
    Grok,
    Openai,
    Gemini,
}

impl From<CliProvider> for Provider {
    fn from(cli: CliProvider) -> Self {
        match cli {
            CliProvider::Grok => Provider::Grok,
            CliProvider::Openai => Provider::Openai,
            CliProvider::Gemini => Provider::Gemini,
        }
    }
}

#[derive(Parser)]
#[command(name = "factreel")]
#[command(about = "Turn a subject into a narrated fact video and publish it")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate, compose and publish a video for SUBJECT
    Generate {
        /// Who or what the video is about
        subject: String,

        /// Number of images to gather (defaults to FACTREEL_IMAGE_COUNT or 10)
        #[arg(short, long)]
        count: Option<usize>,

        /// AI provider for the narration script
        #[arg(short, long, default_value = "grok")]
        provider: CliProvider,
    },
    /// List previously published video URLs
    List {
        /// Key prefix to list
        #[arg(long, default_value = "videos/")]
        prefix: String,
    },
}

/// Log writer that hides the spinner while a line is printed.
struct SpinnerWriter(ProgressBar);

impl Write for SpinnerWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.suspend(|| io::stderr().write(buf))
    }

    fn flush(&mut self) -> io::Result<()> {
        self.0.suspend(|| io::stderr().flush())
    }
}

fn start_spinner(pb: &ProgressBar, msg: &str) {
    pb.set_style(
        ProgressStyle::default_spinner()
            .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_draw_target(ProgressDrawTarget::stderr());
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
}

fn init_tracing(progress: ProgressBar) {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(move || SpinnerWriter(progress.clone()))
        .init();
}

fn print_json<T: Serialize>(payload: &T) {
    match serde_json::to_string_pretty(payload) {
        Ok(json) => println!("{json}"),
        Err(e) => eprintln!("{} {}", style("Error:").red().bold(), e),
    }
}

fn configure(count: Option<usize>) -> factreel_core::Result<PipelineConfig> {
    let mut config = PipelineConfig::from_env()?;
    if let Some(count) = count {
        config.image_count = count;
    }
    config.validate()?;
    Ok(config)
}

async fn generate(
    subject: &str,
    count: Option<usize>,
    provider: Provider,
    progress: &ProgressBar,
) -> RunReport {
    let services = configure(count).and_then(|config| -> factreel_core::Result<_> {
        let services = Services::from_env(&config, provider)?;
        Ok((config, services))
    });
    let (config, services) = match services {
        Ok(ready) => ready,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            return RunReport::rejected(e);
        }
    };
    let pipeline = Pipeline::new(config, services);

    eprintln!(
        "\n{}  {}\n",
        style("factreel").cyan().bold(),
        style("Fact Video Maker").dim()
    );

    let started = Instant::now();
    start_spinner(progress, &format!("Making a video about {}...", subject));
    let outcome = pipeline.run(subject).await;

    match &outcome {
        Ok(published) => progress.finish_with_message(format!(
            "{} Published {} images over {:.1}s {}",
            style("✓").green().bold(),
            published.image_count,
            published.duration_seconds,
            style(format!("[{}]", format_elapsed(started.elapsed()))).dim()
        )),
        Err(failed) => progress.finish_with_message(format!(
            "{} Failed while {}",
            style("✗").red().bold(),
            failed.stage
        )),
    }

    RunReport::from(&outcome)
}

async fn list(prefix: &str) -> Result<Vec<String>> {
    let config = PipelineConfig::from_env().context("invalid configuration")?;
    let blobs = blob_store_from_env(&config, http_client(&config)?);
    blobs
        .list(prefix)
        .await
        .with_context(|| format!("failed to list '{prefix}'"))
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    let progress = ProgressBar::hidden();
    init_tracing(progress.clone());

    let cli = Cli::parse();

    let ok = match cli.command {
        Command::Generate {
            subject,
            count,
            provider,
        } => {
            let report = generate(&subject, count, provider.into(), &progress).await;
            print_json(&report);
            report.is_ok()
        }
        Command::List { prefix } => match list(&prefix).await {
            Ok(urls) => {
                print_json(&urls);
                true
            }
            Err(e) => {
                eprintln!("{} {:#}", style("Error:").red().bold(), e);
                print_json(&RunReport::rejected(format!("{e:#}")));
                false
            }
        },
    };

    if !ok {
        std::process::exit(1);
    }
}
