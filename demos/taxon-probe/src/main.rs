//! Calls every taxon method at once and prints what came back.
//!
//! ```text
//! TAXON_URL=https://ci.kbase.us/services/taxon_api \
//! TAXON_REF=993/674615/1 \
//! TAXON_TOKEN=... \
//! RUST_LOG=taxon=debug \
//! cargo run -p taxon-probe
//! ```
//!
//! `TAXON_TIMEOUT_MS` overrides the per-call deadline. The process exits
//! with status 1 if any call failed.

use std::process::ExitCode;
use std::time::{Duration, Instant};

use futures_util::future::join_all;
use taxon::prelude::*;
use tracing_subscriber::EnvFilter;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

fn env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn config_from_env() -> Result<ClientConfig, ClientError> {
    let endpoint = env("TAXON_URL")
        .ok_or_else(|| ClientError::Configuration("TAXON_URL is not set".into()))?;
    let reference = env("TAXON_REF")
        .ok_or_else(|| ClientError::Configuration("TAXON_REF is not set".into()))?;

    let mut config = ClientConfig::new(reference, endpoint);
    if let Some(token) = env("TAXON_TOKEN") {
        config = config.with_token(Token::new(token)?);
    }
    if let Some(timeout) = env("TAXON_TIMEOUT_MS") {
        let millis: u64 = timeout.parse().map_err(|_| {
            ClientError::Configuration(format!("TAXON_TIMEOUT_MS `{timeout}` is not a number"))
        })?;
        config = config.with_timeout(Duration::from_millis(millis));
    }
    Ok(config)
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

/// Renders a result the way a person wants to read it: empty values are
/// called out explicitly instead of printing nothing.
fn display(value: Option<&Value>) -> String {
    match value {
        None => "* none *".to_string(),
        Some(Value::String(s)) if s.is_empty() => "* empty string *".to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::List { items, .. }) if items.is_empty() => "* empty list *".to_string(),
        Some(Value::List { items, .. }) => items
            .iter()
            .enumerate()
            .map(|(i, item)| match item {
                Value::String(s) => format!("\n    {}. {s}", i + 1),
                other => format!("\n    {}. {other}", i + 1),
            })
            .collect(),
        Some(other) => other.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let client = match config_from_env().and_then(TaxonClient::create) {
        Ok(client) => client,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::from(2);
        }
    };
    println!("object {}", client.reference());

    let started = Instant::now();
    let results = join_all(Method::ALL.into_iter().map(|method| {
        let client = client.clone();
        async move {
            let result = client.call(method).await;
            (method, result, started.elapsed())
        }
    }))
    .await;

    let mut failures = 0;
    for (method, result, elapsed) in results {
        let ms = elapsed.as_millis();
        match result {
            Ok(value) => println!("{method:<24} {ms:>6}ms  {}", display(value.as_ref())),
            Err(e) => {
                failures += 1;
                tracing::warn!(%method, kind = ?e.kind(), "call failed");
                println!("{method:<24} {ms:>6}ms  * ERROR * {e}");
            }
        }
    }

    if failures > 0 {
        eprintln!("{failures} of {} calls failed", Method::ALL.len());
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_calls_out_empty_values() {
        assert_eq!(display(None), "* none *");
        assert_eq!(display(Some(&Value::string(""))), "* empty string *");
        assert_eq!(
            display(Some(&Value::string_list(Vec::<String>::new()))),
            "* empty list *"
        );
    }

    #[test]
    fn test_display_numbers_list_items() {
        let lineage = Value::string_list(["cellular organisms", "Eukaryota"]);
        assert_eq!(
            display(Some(&lineage)),
            "\n    1. cellular organisms\n    2. Eukaryota"
        );
        assert_eq!(display(Some(&Value::I64(747676))), "747676");
    }
}
