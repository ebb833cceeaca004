use std::time::Duration;

use anyhow::{bail, Context};
use clap::Parser;
use stamper_engine::{ClientSettings, DecodeMode, DEFAULT_BASE_URL};

use crate::logging::LogDestination;

/// Command line configuration for the `stamper` binary.
///
/// Backend settings can also come from the environment; flags win.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "stamper",
    version,
    about = "Submit a video URL to the timestamp backend and stream the result"
)]
pub struct CliArgs {
    /// Base URL of the timestamp backend.
    ///
    /// Environment variable: `STAMPER_API_URL`
    #[arg(long, env = "STAMPER_API_URL", default_value_t = String::from(DEFAULT_BASE_URL))]
    pub api_url: String,

    /// Submit this URL immediately and exit once its stream ends.
    #[arg(long)]
    pub url: Option<String>,

    /// Minute increment forwarded to the backend unchanged.
    #[arg(long, default_value_t = String::from("5"))]
    pub minute_increment: String,

    /// Seconds allowed for establishing a connection.
    ///
    /// Environment variable: `STAMPER_CONNECT_TIMEOUT_SECS`
    #[arg(long, env = "STAMPER_CONNECT_TIMEOUT_SECS", default_value_t = 10)]
    pub connect_timeout_secs: u64,

    /// Seconds allowed for the submission round trip. The stream itself has no limit.
    ///
    /// Environment variable: `STAMPER_SUBMIT_TIMEOUT_SECS`
    #[arg(long, env = "STAMPER_SUBMIT_TIMEOUT_SECS", default_value_t = 30)]
    pub submit_timeout_secs: u64,

    /// Fail the stream on malformed UTF-8 instead of substituting U+FFFD.
    #[arg(long, default_value_t = false)]
    pub strict_utf8: bool,

    /// Mirror the log to the terminal as well as `./stamper.log`.
    #[arg(long, default_value_t = false)]
    pub log_to_terminal: bool,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub settings: ClientSettings,
    /// Set in one-shot mode.
    pub initial_url: Option<String>,
    pub minute_increment: String,
    pub log_destination: LogDestination,
}

impl TryFrom<CliArgs> for AppConfig {
    type Error = anyhow::Error;

    fn try_from(args: CliArgs) -> Result<Self, Self::Error> {
        if args.connect_timeout_secs == 0 {
            bail!("STAMPER_CONNECT_TIMEOUT_SECS must be greater than 0");
        }
        if args.submit_timeout_secs == 0 {
            bail!("STAMPER_SUBMIT_TIMEOUT_SECS must be greater than 0");
        }

        let base = ClientSettings::new(&args.api_url)
            .with_context(|| format!("invalid STAMPER_API_URL {:?}", args.api_url))?;
        let settings = ClientSettings {
            connect_timeout: Duration::from_secs(args.connect_timeout_secs),
            submit_timeout: Duration::from_secs(args.submit_timeout_secs),
            decode_mode: if args.strict_utf8 {
                DecodeMode::Strict
            } else {
                DecodeMode::Replace
            },
            ..base
        };

        Ok(Self {
            settings,
            initial_url: args.url,
            minute_increment: args.minute_increment,
            log_destination: if args.log_to_terminal {
                LogDestination::Both
            } else {
                LogDestination::File
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(args: &[&str]) -> CliArgs {
        CliArgs::try_parse_from(std::iter::once("stamper").chain(args.iter().copied()))
            .expect("valid arguments")
    }

    #[test]
    fn flags_override_defaults() {
        let config = AppConfig::try_from(parse(&[
            "--api-url",
            "http://backend:8080/api",
            "--url",
            "https://youtu.be/x",
            "--minute-increment",
            "10",
            "--submit-timeout-secs",
            "3",
            "--strict-utf8",
        ]))
        .unwrap();

        assert_eq!(config.settings.base_url.as_str(), "http://backend:8080/api");
        assert_eq!(config.settings.submit_timeout, Duration::from_secs(3));
        assert_eq!(config.settings.decode_mode, DecodeMode::Strict);
        assert_eq!(config.initial_url.as_deref(), Some("https://youtu.be/x"));
        assert_eq!(config.minute_increment, "10");
        assert_eq!(config.log_destination, LogDestination::File);
    }

    #[test]
    fn rejects_non_http_backend() {
        let err = AppConfig::try_from(parse(&["--api-url", "ftp://backend"])).unwrap_err();
        assert!(err.to_string().contains("STAMPER_API_URL"));
    }

    #[test]
    fn rejects_zero_timeouts() {
        assert!(AppConfig::try_from(parse(&["--connect-timeout-secs", "0"])).is_err());
        assert!(AppConfig::try_from(parse(&["--submit-timeout-secs", "0"])).is_err());
    }
}
