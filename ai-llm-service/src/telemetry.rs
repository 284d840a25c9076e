//! Log layer for the workspace libraries.
//!
//! The binary composes [`layer`] with its global subscriber. Only events whose
//! target starts with one of [`WORKSPACE_TARGETS`] are rendered by this layer,
//! so third-party crates keep whatever formatting the binary gives them.

use std::io::{self, IsTerminal};

use tracing::Level;
use tracing_subscriber::filter::Directive;
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{EnvFilter, Layer, filter, fmt};

/// Crate target prefix used by this library.
pub const TARGET_PREFIX: &str = "ai_llm_service";

/// Targets of every library crate in the workspace.
pub const WORKSPACE_TARGETS: &[&str] = &[TARGET_PREFIX, "rag_store", "rag_pipeline", "api"];

/// RFC3339 UTC timer implemented via `chrono`.
/// Example output: `2025-09-12T10:20:30Z`
#[derive(Clone, Debug, Default)]
struct ChronoRfc3339Utc;

impl FormatTime for ChronoRfc3339Utc {
    fn format_time(&self, w: &mut Writer<'_>) -> std::fmt::Result {
        let now = chrono::Utc::now();
        let s = now.to_rfc3339_opts(chrono::SecondsFormat::Secs, true);
        w.write_str(&s)
    }
}

fn is_workspace_target(target: &str) -> bool {
    WORKSPACE_TARGETS.iter().any(|p| target.starts_with(p))
}

/// Build a formatting layer that renders ONLY events emitted by workspace crates.
///
/// - RFC3339 UTC timestamps
/// - Compact single-line format with `file:line` and target
/// - Span close events (duration of instrumented provider calls)
/// - ANSI colors only when stdout is a terminal
pub fn layer<S>() -> impl Layer<S> + Send + Sync
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
{
    let use_ansi = io::stdout().is_terminal();
    let only_workspace = filter::filter_fn(|meta| is_workspace_target(meta.target()));

    fmt::layer()
        .with_timer(ChronoRfc3339Utc)
        .with_level(true)
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(use_ansi)
        .with_span_events(fmt::format::FmtSpan::CLOSE)
        .event_format(fmt::format().compact().with_source_location(true))
        .with_filter(only_workspace)
}

fn outside_workspace(meta: &tracing::Metadata<'_>) -> bool {
    !is_workspace_target(meta.target())
}

/// Filter for a second layer that renders third-party events (axum, hyper, ...).
pub fn non_workspace() -> filter::FilterFn {
    filter::FilterFn::new(outside_workspace as fn(&tracing::Metadata<'_>) -> bool)
}

/// Level directives for every workspace target, e.g. `rag_pipeline=debug`.
pub fn level_directives(level: Level) -> Vec<Directive> {
    let lvl = level.as_str().to_lowercase();
    WORKSPACE_TARGETS
        .iter()
        .filter_map(|t| format!("{t}={lvl}").parse::<Directive>().ok())
        .collect()
}

/// `EnvFilter` from `RUST_LOG` (or `default`), with workspace crates raised to `level`.
///
/// `RUST_LOG` wins when it is set, so operators can still narrow the output.
pub fn env_filter_with_level(default: &str, level: Level) -> EnvFilter {
    match EnvFilter::try_from_default_env() {
        Ok(from_env) => from_env,
        Err(_) => level_directives(level)
            .into_iter()
            .fold(EnvFilter::new(default), EnvFilter::add_directive),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directives_cover_all_workspace_crates() {
        let d = level_directives(Level::DEBUG);
        assert_eq!(d.len(), WORKSPACE_TARGETS.len());
        assert!(d.iter().any(|x| x.to_string() == "rag_pipeline=debug"));
    }

    #[test]
    fn target_filter_matches_module_paths() {
        assert!(is_workspace_target("rag_pipeline::pipeline"));
        assert!(is_workspace_target("ai_llm_service::services::cohere_service"));
        assert!(!is_workspace_target("hyper::proto"));
    }
}
