use clap::{ArgAction, ArgGroup, Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use catchpoint::config::CatchpointConfig;
use catchpoint::error::{
    capture, categorize, parse_body, ErrorClassifier, FailureCategory, FailureSignal,
    RecoveryOutcome, TransportError,
};
use catchpoint::gateway::{MemoryRouter, SharedErrorState};
use catchpoint::logging::{init_logging, LoggingConfig};

#[derive(Parser, Debug)]
#[command(name = "catchpoint")]
#[command(version)]
#[command(about = "Classify failed HTTP calls and report the recovery action")]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to a TOML configuration file
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Classify a failure described on the command line
    #[command(group(ArgGroup::new("transport").args(["status", "no_response", "not_sent"])))]
    Classify {
        /// Caller-supplied description of the failure
        #[arg(long, short, default_value = "")]
        message: String,

        /// A response arrived with this status code
        #[arg(long, short)]
        status: Option<u16>,

        /// Response body (JSON, or plain text)
        #[arg(long, requires = "status")]
        body: Option<String>,

        /// Transport-level message (defaults to "Request failed with status code N")
        #[arg(long, requires = "transport")]
        transport_message: Option<String>,

        /// The request was sent but no response arrived
        #[arg(long)]
        no_response: bool,

        /// The request never left the client
        #[arg(long)]
        not_sent: bool,

        /// Path the client is currently on
        #[arg(long, default_value = "/")]
        current_path: String,
    },
    /// Send a GET request and classify the failure, if any
    Probe {
        /// URL to request
        url: String,

        /// Request timeout in seconds
        #[arg(long, default_value = "15", value_name = "SECONDS")]
        timeout_secs: u64,

        /// Caller-supplied description of the failure
        #[arg(long, short, default_value = "")]
        message: String,

        /// Path the client is currently on
        #[arg(long, default_value = "/")]
        current_path: String,
    },
}

/// JSON report printed on stdout.
#[derive(Debug, Serialize)]
struct Report {
    #[serde(skip_serializing_if = "Option::is_none")]
    status: Option<u16>,
    category: Option<FailureCategory>,
    outcome: Option<RecoveryOutcome>,
    navigated_to: Option<String>,
    published: Option<String>,
    error: Option<String>,
}

fn transport_from_flags(
    status: Option<u16>,
    body: Option<String>,
    transport_message: Option<String>,
    no_response: bool,
    not_sent: bool,
) -> Option<TransportError> {
    if let Some(code) = status {
        let message = transport_message
            .unwrap_or_else(|| format!("Request failed with status code {}", code));
        let body = body.and_then(|b| parse_body(b.as_bytes()));
        return Some(TransportError::with_response(code, body, message));
    }
    let message = transport_message.unwrap_or_default();
    if no_response {
        Some(TransportError::without_response(message))
    } else if not_sent {
        Some(TransportError::not_sent(message))
    } else {
        None
    }
}

fn classify_report(
    config: &CatchpointConfig,
    signal: FailureSignal,
    current_path: &str,
) -> Result<Report, catchpoint::error::ClassifierError> {
    let errors = Arc::new(SharedErrorState::new());
    let router = Arc::new(MemoryRouter::new(config.routes.clone(), current_path));

    let classifier = ErrorClassifier::from_config(errors.clone(), config);
    classifier.set_navigation(router.clone());

    let outcome = classifier.classify_signal(&signal)?;
    let history = router.history();
    let navigated_to = if history.len() > 1 {
        history.last().cloned()
    } else {
        None
    };

    Ok(Report {
        status: signal.transport.as_ref().and_then(|t| t.status()).map(|s| s.code()),
        category: Some(categorize(&signal)),
        outcome: Some(outcome),
        navigated_to,
        published: errors.current(),
        error: Some(classifier.error()),
    })
}

fn print_report(report: &Report) -> Result<ExitCode, Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(report)?);
    Ok(ExitCode::SUCCESS)
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(LoggingConfig::from_verbosity(cli.verbose));

    let loaded = match &cli.config {
        Some(path) => CatchpointConfig::load(path),
        None => CatchpointConfig::from_env(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {}", e);
            return Ok(ExitCode::FAILURE);
        }
    };

    let (signal, current_path) = match cli.command {
        Commands::Classify {
            message,
            status,
            body,
            transport_message,
            no_response,
            not_sent,
            current_path,
        } => {
            let transport =
                transport_from_flags(status, body, transport_message, no_response, not_sent);
            (
                FailureSignal {
                    raw_message: message,
                    transport,
                },
                current_path,
            )
        }
        Commands::Probe {
            url,
            timeout_secs,
            message,
            current_path,
        } => {
            let client = reqwest::Client::builder()
                .timeout(Duration::from_secs(timeout_secs))
                .redirect(reqwest::redirect::Policy::none())
                .build()?;

            match capture(client.get(&url).send().await).await {
                Ok(response) => {
                    tracing::info!(url = %url, status = response.status().as_u16(), "request succeeded");
                    return print_report(&Report {
                        status: Some(response.status().as_u16()),
                        category: None,
                        outcome: None,
                        navigated_to: None,
                        published: None,
                        error: None,
                    });
                }
                Err(transport) => (FailureSignal::new(message).with_transport(transport), current_path),
            }
        }
    };

    match classify_report(&config, signal, &current_path) {
        Ok(report) => print_report(&report),
        Err(e) => {
            tracing::error!("classification failed: {}", e);
            eprintln!("error: {}", e);
            Ok(ExitCode::FAILURE)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_from_flags_status_defaults_message() {
        let transport = transport_from_flags(Some(404), None, None, false, false).unwrap();
        assert_eq!(transport.message(), "Request failed with status code 404");
        assert!(transport.body().is_none());
    }

    #[test]
    fn test_transport_from_flags_modes() {
        assert!(transport_from_flags(None, None, None, false, false).is_none());

        let timeout = transport_from_flags(None, None, Some("t".into()), true, false).unwrap();
        assert!(timeout.has_request() && !timeout.has_response());

        let not_sent = transport_from_flags(None, None, None, false, true).unwrap();
        assert!(!not_sent.has_request());
    }

    #[test]
    fn test_classify_report_records_navigation() {
        let signal = FailureSignal::new("")
            .with_transport(TransportError::with_response(308, None, "moved"));
        let report = classify_report(&CatchpointConfig::default(), signal, "/chats").unwrap();

        assert_eq!(report.navigated_to.as_deref(), Some("/profile"));
        assert!(report.published.is_none());
    }
}
