//! eventstream - tail long-lived HTTP event streams
//!
//! Connects to a chunked HTTP endpoint with Basic authentication, prints
//! every CR-LF delimited event and reconnects whenever the stream drops.

mod commands;
mod config;
mod output;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use eventstream_client::Credentials;
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use url::Url;

use crate::config::{Config, StreamArgs};
use crate::output::{OutputContext, OutputFormat};

#[derive(Parser)]
#[command(name = "eventstream")]
#[command(author, version, about = "Tail long-lived HTTP event streams")]
#[command(propagate_version = true)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "EVENTSTREAM_CONFIG")]
    config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum)]
    output: Option<OutputFormat>,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,

    /// Minimal output (for scripting)
    #[arg(short, long)]
    quiet: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Stream events until interrupted
    Tail {
        /// Stream URL (falls back to the config file)
        url: Option<String>,

        /// Basic auth username
        #[arg(short, long, env = "EVENTSTREAM_USERNAME")]
        username: Option<String>,

        /// Basic auth password
        #[arg(short, long, env = "EVENTSTREAM_PASSWORD", hide_env_values = true)]
        password: String,

        /// Delay before reconnecting, in milliseconds
        #[arg(long)]
        retry_ms: Option<u64>,

        /// Give up on a connection after this many seconds (default: never)
        #[arg(long)]
        stream_timeout: Option<u64>,

        /// Join events that are split across body chunks
        #[arg(long)]
        buffered: bool,

        /// Stop after this many events
        #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
        max_events: Option<u64>,
    },

    /// Print the Authorization header for a username/password pair
    AuthHeader {
        /// Username
        username: String,

        /// Password
        #[arg(env = "EVENTSTREAM_PASSWORD", hide_env_values = true)]
        password: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();

    // Load config file
    let config = if let Some(config_path) = &cli.config {
        Config::load_from(config_path)?
    } else {
        Config::load().unwrap_or_default()
    };

    match &cli.command {
        Commands::Tail {
            url,
            username,
            password,
            retry_ms,
            stream_timeout,
            buffered,
            max_events,
        } => {
            let stream_args = StreamArgs {
                retry_ms: *retry_ms,
                stream_timeout_secs: *stream_timeout,
                buffered: *buffered,
            };
            let merged = config.merge_with_args(
                url.as_deref(),
                username.as_deref(),
                cli.output.map(Into::into),
                cli.no_color,
                &stream_args,
            );

            let format = OutputFormat::parse(&merged.output)
                .with_context(|| format!("Unknown output format: {}", merged.output))?;
            let ctx = OutputContext::new(format, merged.no_color, cli.quiet);

            let url = merged
                .url
                .context("No stream URL given (argument or `url` in config file)")?;
            let url = Url::parse(&url).with_context(|| format!("Invalid stream URL: {}", url))?;
            let username = merged
                .username
                .context("No username given (--username, EVENTSTREAM_USERNAME or config file)")?;
            tracing::debug!("Stream settings: {:?}", merged.stream);

            commands::tail(
                merged.stream,
                url,
                Credentials::new(username, password.as_str()),
                *max_events,
                &ctx,
            )
            .await?;
        }

        Commands::AuthHeader { username, password } => {
            commands::auth_header(username, password);
        }
    }

    Ok(())
}

// Implement conversion for OutputFormat to string (for config merge)
impl From<OutputFormat> for &str {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Text => "text",
            OutputFormat::Json => "json",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_max_events_must_be_positive() {
        let parse = |max: &str| {
            Cli::try_parse_from(["eventstream", "tail", "-p", "secret", "--max-events", max])
        };
        assert!(parse("0").is_err());

        let cli = parse("3").unwrap();
        match cli.command {
            Commands::Tail { max_events, .. } => assert_eq!(max_events, Some(3)),
            Commands::AuthHeader { .. } => panic!("expected tail"),
        }
    }
}
