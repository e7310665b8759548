use tracing_subscriber::{EnvFilter, fmt};

use crate::Result;
use crate::error::Error;

/// Install the process-wide tracing subscriber.
///
/// Meant for binaries and tests embedding this library; hosts that already
/// run their own subscriber should skip this and filter `medref` targets
/// themselves.
///
/// # Errors
///
/// Returns an error when JSON output is requested without the `json-logs`
/// feature, or when a global subscriber is already installed.
pub fn init_tracing(explicit_filter: Option<&str>, use_json: bool) -> Result<()> {
    let filter = resolve_filter(explicit_filter, std::env::var("RUST_LOG").ok());

    #[cfg(feature = "json-logs")]
    if use_json {
        return fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .json()
            .flatten_event(true)
            .try_init()
            .map_err(|err| Error::Telemetry(err.to_string()));
    }

    #[cfg(not(feature = "json-logs"))]
    if use_json {
        return Err(Error::Telemetry(
            "library was built without the `json-logs` feature".to_string(),
        ));
    }

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .try_init()
        .map_err(|err| Error::Telemetry(err.to_string()))
}

/// First filter that parses wins: the explicit one, then the `RUST_LOG`
/// value, then plain `info`.
fn resolve_filter(explicit: Option<&str>, env: Option<String>) -> EnvFilter {
    explicit
        .map(str::to_owned)
        .into_iter()
        .chain(env)
        .find_map(|candidate| EnvFilter::try_new(candidate).ok())
        .unwrap_or_else(|| EnvFilter::new("info"))
}
