use std::env;
use std::io;

use tracing_subscriber::EnvFilter;

/// Installs the stderr subscriber. `RUST_LOG` wins; otherwise `info`, or
/// `debug` when verbose output was asked for.
pub fn init(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
    if verbose {
        tracing::debug!("verbose logging enabled");
    }
}

const ENV_VERBOSE: &str = "BOOKDOUM_VERBOSE";

/// Whether `BOOKDOUM_VERBOSE` asks for debug output. Unset or unrecognized
/// values mean no.
pub fn env_flag() -> bool {
    env::var(ENV_VERBOSE)
        .ok()
        .and_then(|raw| parse_switch(&raw))
        .unwrap_or(false)
}

/// Reads an on/off switch: `1/0`, `true/false`, `yes/no`, `y/n`, `on/off`
/// or `예/아니오`.
fn parse_switch(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "y" | "on" | "예" => Some(true),
        "0" | "false" | "no" | "n" | "off" | "아니오" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn switch_values_parse_both_ways() {
        for raw in ["1", "true", "YES", " on ", "예"] {
            assert_eq!(parse_switch(raw), Some(true), "{raw}");
        }
        for raw in ["0", "False", "no", "off", "아니오"] {
            assert_eq!(parse_switch(raw), Some(false), "{raw}");
        }
    }

    #[test]
    fn unknown_switch_values_are_not_guessed() {
        for raw in ["", "maybe", "2"] {
            assert_eq!(parse_switch(raw), None, "{raw}");
        }
    }
}
