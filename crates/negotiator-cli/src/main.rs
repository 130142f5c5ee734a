//! negotiator: command-line negotiation client
//!
//! - `refresh`: fetch once and print the board
//! - `watch`: refresh periodically until interrupted
//! - `templates`: list contract templates and their fields
//! - `render`: fill a local template file with `key=value` arguments

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use negotiator_contract::{plain_text, render, template, ContractArguments, Ledger};
use negotiator_core::{InboxMode, Negotiator, NegotiatorConfig};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "negotiator")]
#[command(about = "Contract negotiation client", version)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, env = "NEGOTIATOR_CONFIG")]
    config: Option<PathBuf>,

    /// Service root (overrides config file)
    #[arg(long, env = "NEGOTIATOR_BASE_URL")]
    base_url: Option<String>,

    /// Consume inbox entries on the server instead of polling by offset
    #[arg(long)]
    drain: bool,

    /// Log filter, e.g. `debug` or `negotiator_core=trace`
    #[arg(long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch reference data and new inbox entries, then print the board
    Refresh,
    /// Refresh every poll interval until Ctrl-C
    Watch {
        /// Seconds between refreshes (overrides config file)
        #[arg(long)]
        interval: Option<u64>,
    },
    /// List contract templates served by the service
    Templates,
    /// Render a template file locally
    Render {
        /// Template text file
        file: PathBuf,
        /// Placeholder values as `key=value`
        args: Vec<String>,
    },
}

impl Cli {
    /// Configuration file (or defaults) with command-line overrides applied
    fn resolve_config(&self) -> anyhow::Result<NegotiatorConfig> {
        let mut config = match &self.config {
            Some(path) => {
                info!("Config file: {}", path.display());
                NegotiatorConfig::load(path)?
            }
            None => NegotiatorConfig::default(),
        };
        if let Some(base_url) = &self.base_url {
            config = config.with_base_url(base_url.clone());
        }
        if self.drain {
            config = config.with_inbox_mode(InboxMode::Drain);
        }
        if let Command::Watch {
            interval: Some(secs),
        } = self.command
        {
            config = config.with_poll_interval_secs(secs);
        }
        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = match &cli.log_level {
        Some(level) => EnvFilter::try_new(level)?,
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = cli.resolve_config()?;

    match cli.command {
        Command::Refresh => {
            let mut negotiator = Negotiator::connect(config)?;
            let report = negotiator.refresh().await;
            print!("{}", negotiator.board());
            if report.failed_reads > 0 {
                anyhow::bail!("{} of 4 reads failed", report.failed_reads);
            }
        }
        Command::Watch { .. } => {
            info!("Refreshing every {}s", config.poll_interval_secs);
            let mut negotiator = Negotiator::connect(config)?;
            negotiator
                .watch(async {
                    if let Err(e) = tokio::signal::ctrl_c().await {
                        tracing::error!("Failed to listen for Ctrl-C: {}", e);
                    }
                })
                .await;
            print!("{}", negotiator.board());
        }
        Command::Templates => {
            let mut negotiator = Negotiator::connect(config)?;
            negotiator.refresh().await;
            for template in negotiator.directory().templates() {
                let fields: Vec<String> = template
                    .placeholders()
                    .iter()
                    .map(|p| p.form_key())
                    .collect();
                println!("{} ({}): {}", template.label, template.name, fields.join(", "));
            }
        }
        Command::Render { file, args } => {
            let text = std::fs::read_to_string(&file)
                .with_context(|| format!("reading {}", file.display()))?;
            if let Err(e) = template::validate(&text) {
                tracing::warn!("{}: {}", file.display(), e);
            }
            let data = parse_arguments(&args)?;
            let segments = render(&text, &data, false, &Ledger::new());
            println!("{}", plain_text(&segments));
        }
    }

    Ok(())
}

fn parse_arguments(args: &[String]) -> anyhow::Result<ContractArguments> {
    args.iter()
        .map(|arg| {
            arg.split_once('=')
                .map(|(key, value)| (key.to_string(), value.to_string()))
                .with_context(|| format!("expected key=value, got `{arg}`"))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn arguments_split_on_first_equals() {
        let args = parse_arguments(&["amount=100".into(), "note=a=b".into()]).unwrap();
        assert_eq!(args.get("amount").map(String::as_str), Some("100"));
        assert_eq!(args.get("note").map(String::as_str), Some("a=b"));
    }

    #[test]
    fn argument_without_equals_is_rejected() {
        let err = parse_arguments(&["a=1".into(), "bad".into()]).unwrap_err();
        assert!(err.to_string().contains("`bad`"));
    }

    #[test]
    fn flags_override_defaults() {
        let cli = Cli::try_parse_from([
            "negotiator",
            "--base-url",
            "http://service:9000",
            "--drain",
            "watch",
            "--interval",
            "30",
        ])
        .unwrap();
        let config = cli.resolve_config().unwrap();
        assert_eq!(config.base_url, "http://service:9000");
        assert_eq!(config.inbox_mode, InboxMode::Drain);
        assert_eq!(config.poll_interval_secs, 30);
    }

    #[test]
    fn flags_override_config_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "base_url = \"http://from-file:1\"\npoll_interval_secs = 5").unwrap();
        let path = file.path().to_str().unwrap().to_string();

        let cli =
            Cli::try_parse_from(["negotiator", "--config", path.as_str(), "refresh"]).unwrap();
        let config = cli.resolve_config().unwrap();
        assert_eq!(config.base_url, "http://from-file:1");
        assert_eq!(config.poll_interval_secs, 5);
        assert_eq!(config.inbox_mode, InboxMode::Poll);

        let cli = Cli::try_parse_from([
            "negotiator",
            "--config",
            path.as_str(),
            "--base-url",
            "http://flag:2",
            "refresh",
        ])
        .unwrap();
        assert_eq!(cli.resolve_config().unwrap().base_url, "http://flag:2");
    }

    #[test]
    fn render_requires_file() {
        assert!(Cli::try_parse_from(["negotiator", "render"]).is_err());
    }
}
