//! stderr logger configured by `ARMADA_LOG`.
//!
//! The variable holds comma-separated directives. A bare level sets the
//! default and `target=level` overrides it for a module path prefix, e.g.
//! `ARMADA_LOG=warn,armada::session=debug`. Unparsable directives are skipped.

use std::env;
use std::sync::OnceLock;

use log::{LevelFilter, Log, Metadata, Record};

const ENV_VAR: &str = "ARMADA_LOG";

#[derive(Debug, Clone, PartialEq, Eq)]
struct Directives {
    default: LevelFilter,
    /// Sorted longest prefix first.
    targets: Vec<(String, LevelFilter)>,
}

impl Directives {
    fn parse(value: &str) -> Self {
        let mut default = LevelFilter::Info;
        let mut targets = Vec::new();
        for part in value.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            match part.split_once('=') {
                Some((target, level)) => match level.trim().parse::<LevelFilter>() {
                    Ok(level) => targets.push((target.trim().to_string(), level)),
                    Err(_) => eprintln!("{}: ignoring directive {:?}", ENV_VAR, part),
                },
                None => match part.parse::<LevelFilter>() {
                    Ok(level) => default = level,
                    Err(_) => eprintln!("{}: ignoring directive {:?}", ENV_VAR, part),
                },
            }
        }
        targets.sort_by(|a: &(String, LevelFilter), b| b.0.len().cmp(&a.0.len()));
        Self { default, targets }
    }

    fn level_for(&self, target: &str) -> LevelFilter {
        self.targets
            .iter()
            .find(|(prefix, _)| target.starts_with(prefix.as_str()))
            .map(|(_, level)| *level)
            .unwrap_or(self.default)
    }

    /// Most verbose level any directive allows.
    fn ceiling(&self) -> LevelFilter {
        self.targets
            .iter()
            .map(|(_, level)| *level)
            .fold(self.default, |a, b| a.max(b))
    }
}

struct StderrLogger {
    directives: Directives,
}

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.directives.level_for(metadata.target())
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            eprintln!("{:<5} [{}] {}", record.level(), record.target(), record.args());
        }
    }

    fn flush(&self) {}
}

static LOGGER: OnceLock<StderrLogger> = OnceLock::new();

/// Install the logger. Later calls are no-ops. Lines go to stderr so stdout
/// stays free for machine-readable output.
pub fn init_logging() {
    let directives = Directives::parse(&env::var(ENV_VAR).unwrap_or_default());
    let ceiling = directives.ceiling();
    let logger = LOGGER.get_or_init(|| StderrLogger { directives });
    if log::set_logger(logger).is_ok() {
        log::set_max_level(ceiling);
    }
}
