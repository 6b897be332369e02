//! Log setup driven by the `logging` configuration domain.
//!
//! The library itself only uses the `log` macros; binaries call [`init`]
//! once the configuration is loaded. `RUST_LOG` is applied last and wins.

use env_logger::Builder;
use log::LevelFilter;
use std::str::FromStr;

use crate::config::LoggingConfig;

#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("invalid log level '{level}' for {target}")]
    InvalidLevel { target: String, level: String },

    #[error("logger already initialized: {0}")]
    AlreadyInitialized(#[from] log::SetLoggerError),
}

fn level(target: &str, level: &str) -> Result<LevelFilter, LoggingError> {
    LevelFilter::from_str(level).map_err(|_| LoggingError::InvalidLevel {
        target: target.to_string(),
        level: level.to_string(),
    })
}

/// A logger builder configured from `config` but not yet installed.
pub fn builder(config: &LoggingConfig) -> Result<Builder, LoggingError> {
    let mut builder = Builder::new();
    builder.filter_level(level("default", &config.level)?);
    for (module, module_level) in &config.features {
        builder.filter_module(module, level(module, module_level)?);
    }
    builder.parse_default_env();
    Ok(builder)
}

/// Installs the global logger.
pub fn init(config: &LoggingConfig) -> Result<(), LoggingError> {
    builder(config)?.try_init()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_configured_levels() {
        let mut config = LoggingConfig::default();
        config.features.insert("fold_repo::repo".into(), "debug".into());
        assert!(builder(&config).is_ok());
    }

    #[test]
    fn rejects_unknown_level() {
        let mut config = LoggingConfig::default();
        config.features.insert("fold_repo::api".into(), "loud".into());
        let err = builder(&config).err().unwrap();
        assert!(err.to_string().contains("fold_repo::api"));
    }

    #[test]
    fn init_twice_fails_cleanly() {
        let config = LoggingConfig::default();
        let _ = builder(&config).unwrap().is_test(true).try_init();
        assert!(matches!(init(&config), Err(LoggingError::AlreadyInitialized(_))));
    }
}
