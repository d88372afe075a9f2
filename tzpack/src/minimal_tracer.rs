// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! A small `tracing` subscriber configured from `RUST_LOG`.
//!
//! Filters are comma separated, each either a level (`debug`), a target
//! prefix (`tzpack`) or both (`tzpack::compile=trace`). A filter with a level
//! enables that level and everything more severe. Events go to stderr so
//! command output on stdout stays clean.

use std::env;
use std::fmt::{self, Write};
use std::sync::atomic::{AtomicUsize, Ordering};

use tracing::{field::Visit, Id, Level, Subscriber};
use tracing_core::Field;

use crate::environment::ENV_RUST_LOG;

pub struct StringVisitor<'a> {
    string: &'a mut String,
}

impl<'a> StringVisitor<'a> {
    pub(crate) fn new(string: &'a mut String) -> Self {
        StringVisitor { string }
    }
}

impl Visit for StringVisitor<'_> {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        let _ = if field.name() == "message" {
            write!(self.string, "{value:?} ")
        } else {
            write!(self.string, "{} = {:?}; ", field.name(), value)
        };
    }
}

#[derive(Debug, PartialEq, Eq)]
struct LogFilter {
    target: Option<String>,
    level: Option<Level>,
}

impl LogFilter {
    fn matches(&self, metadata: &tracing::Metadata<'_>) -> bool {
        let level_ok = self.level.map_or(true, |level| *metadata.level() <= level);
        let target_ok = self
            .target
            .as_deref()
            .map_or(true, |target| metadata.target().starts_with(target));
        level_ok && target_ok
    }
}

pub struct MinimalTracer {
    enabled: bool,
    filters: Vec<LogFilter>,
}

fn string_to_level(string: &str) -> Option<Level> {
    match string.to_lowercase().as_str() {
        "info" => Some(Level::INFO),
        "debug" => Some(Level::DEBUG),
        "warn" | "warning" => Some(Level::WARN),
        "trace" => Some(Level::TRACE),
        "error" => Some(Level::ERROR),
        _ => None,
    }
}

fn parse_filters(value: &str) -> Vec<LogFilter> {
    value
        .split(',')
        .map(str::trim)
        .filter(|filter| !filter.is_empty())
        .map(|filter| match filter.split_once('=') {
            Some((target, level)) => LogFilter {
                target: Some(target.to_string()),
                level: string_to_level(level),
            },
            None => match string_to_level(filter) {
                Some(level) => LogFilter {
                    target: None,
                    level: Some(level),
                },
                None => LogFilter {
                    target: Some(filter.to_string()),
                    level: None,
                },
            },
        })
        .collect()
}

impl MinimalTracer {
    pub fn register() -> Result<(), tracing::subscriber::SetGlobalDefaultError> {
        let tracer = match env::var(ENV_RUST_LOG) {
            Ok(value) => MinimalTracer {
                enabled: true,
                filters: parse_filters(&value),
            },
            Err(_) => MinimalTracer {
                enabled: false,
                filters: Vec::new(),
            },
        };
        tracing::subscriber::set_global_default(tracer)
    }
}

static AUTO_ID: AtomicUsize = AtomicUsize::new(1);

impl Subscriber for MinimalTracer {
    fn enabled(&self, metadata: &tracing::Metadata<'_>) -> bool {
        self.enabled
            && (self.filters.is_empty() || self.filters.iter().any(|filter| filter.matches(metadata)))
    }

    fn new_span(&self, _span: &tracing_core::span::Attributes<'_>) -> tracing_core::span::Id {
        Id::from_u64(AUTO_ID.fetch_add(1, Ordering::Relaxed) as u64)
    }

    fn record(&self, _span: &tracing_core::span::Id, _values: &tracing_core::span::Record<'_>) {}

    fn record_follows_from(
        &self,
        _span: &tracing_core::span::Id,
        _follows: &tracing_core::span::Id,
    ) {
    }

    fn event(&self, event: &tracing::Event<'_>) {
        let metadata = event.metadata();

        let mut text = String::new();
        let mut visitor = StringVisitor::new(&mut text);
        event.record(&mut visitor);

        eprintln!("{} {}: {}", metadata.level(), metadata.target(), text.trim_end());
    }

    fn enter(&self, _span: &tracing_core::span::Id) {}

    fn exit(&self, _span: &tracing_core::span::Id) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_filters() {
        assert_eq!(
            parse_filters("debug, tzpack::compile=trace,tzpack_cli"),
            vec![
                LogFilter {
                    target: None,
                    level: Some(Level::DEBUG),
                },
                LogFilter {
                    target: Some("tzpack::compile".into()),
                    level: Some(Level::TRACE),
                },
                LogFilter {
                    target: Some("tzpack_cli".into()),
                    level: None,
                },
            ]
        );
        assert!(parse_filters("").is_empty());
    }

    #[test]
    fn test_unknown_level_matches_target_only() {
        assert_eq!(
            parse_filters("tzpack=loud"),
            vec![LogFilter {
                target: Some("tzpack".into()),
                level: None,
            }]
        );
    }

    #[test]
    fn test_second_registration_is_a_boxed_error() {
        let _ = MinimalTracer::register();
        let err = MinimalTracer::register().unwrap_err();
        let boxed: Box<dyn std::error::Error + Send + Sync> = err.into();
        assert!(boxed.to_string().contains("already been set"));
    }
}
