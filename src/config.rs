//! Runtime settings.
//!
//! Settings are layered with the `config` crate, lowest priority first:
//! built-in defaults, an optional TOML file, `POWERWATCH_*` environment
//! variables (nested keys separated by `__`) and finally command-line flags.
//!
//! ```toml
//! refresh = "250ms"
//! gpu_cache_ttl = "300s"
//!
//! [telemetry]
//! program = "/usr/bin/powermetrics"
//! sample_interval_ms = 1000
//! samplers = ["cpu_power", "gpu_power"]
//! chunk_size = 4096
//!
//! [commands]
//! sysctl = "/usr/sbin/sysctl"
//! vm_stat = "/usr/bin/vm_stat"
//! system_profiler = "/usr/sbin/system_profiler"
//!
//! [logging]
//! file = "/tmp/powerwatch.log"
//! level = "debug"
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::data::units::parse_duration;
use crate::source::TelemetryCommand;

/// Prefix of environment variables read into [`Settings`].
pub const ENV_PREFIX: &str = "POWERWATCH";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetrySettings {
    pub program: String,
    pub sample_interval_ms: u64,
    pub samplers: Vec<String>,
    /// Largest single read from the telemetry stream, in bytes.
    pub chunk_size: usize,
}

impl Default for TelemetrySettings {
    fn default() -> Self {
        let command = TelemetryCommand::default();
        Self {
            program: command.program,
            sample_interval_ms: command.sample_interval_ms,
            samplers: command.samplers,
            chunk_size: 4096,
        }
    }
}

impl TelemetrySettings {
    pub fn command(&self) -> TelemetryCommand {
        TelemetryCommand {
            program: self.program.clone(),
            sample_interval_ms: self.sample_interval_ms,
            samplers: self.samplers.clone(),
        }
    }
}

/// Paths of the one-shot static info commands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommandPaths {
    pub sysctl: String,
    pub vm_stat: String,
    pub system_profiler: String,
}

impl Default for CommandPaths {
    fn default() -> Self {
        Self {
            sysctl: "/usr/sbin/sysctl".to_string(),
            vm_stat: "/usr/bin/vm_stat".to_string(),
            system_profiler: "/usr/sbin/system_profiler".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    /// Log file. Logging is off when unset, since stdout is the dashboard.
    pub file: Option<PathBuf>,
    /// `EnvFilter` directive used when `POWERWATCH_LOG` is not set.
    pub level: String,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            file: None,
            level: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub telemetry: TelemetrySettings,
    /// Render cadence, e.g. "250ms".
    pub refresh: String,
    /// How long the GPU core count is cached, e.g. "300s".
    pub gpu_cache_ttl: String,
    pub commands: CommandPaths,
    pub logging: LogSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            telemetry: TelemetrySettings::default(),
            refresh: "250ms".to_string(),
            gpu_cache_ttl: "300s".to_string(),
            commands: CommandPaths::default(),
            logging: LogSettings::default(),
        }
    }
}

/// Values given on the command line. They win over every other layer.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub refresh: Option<String>,
    pub sample_interval_ms: Option<u64>,
    pub log_file: Option<PathBuf>,
}

impl Settings {
    /// Load settings from `path` (if any), the process environment and
    /// `overrides`.
    pub fn load(path: Option<&Path>, overrides: &Overrides) -> Result<Self> {
        Self::load_with_env(path, overrides, None)
    }

    /// Like [`load`](Self::load) but reads environment variables from `env`
    /// instead of the process when given.
    pub fn load_with_env(
        path: Option<&Path>,
        overrides: &Overrides,
        env: Option<config::Map<String, String>>,
    ) -> Result<Self> {
        let mut builder = Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(File::from(path));
        }

        builder = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("telemetry.samplers")
                    .source(env),
            )
            .set_override_option("refresh", overrides.refresh.clone())?
            .set_override_option("telemetry.sample_interval_ms", overrides.sample_interval_ms)?
            .set_override_option(
                "logging.file",
                overrides
                    .log_file
                    .as_ref()
                    .map(|p| p.to_string_lossy().into_owned()),
            )?;

        let settings: Settings = builder
            .build()
            .context("failed to read configuration")?
            .try_deserialize()
            .context("invalid configuration")?;

        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<()> {
        self.refresh_interval()?;
        self.gpu_cache_ttl()?;
        if self.telemetry.chunk_size == 0 {
            bail!("telemetry.chunk_size must be greater than zero");
        }
        if self.telemetry.sample_interval_ms == 0 {
            bail!("telemetry.sample_interval_ms must be greater than zero");
        }
        Ok(())
    }

    pub fn refresh_interval(&self) -> Result<Duration> {
        let interval = parse_duration(&self.refresh)
            .with_context(|| format!("invalid refresh interval '{}'", self.refresh))?;
        if interval.is_zero() {
            bail!("refresh interval must be greater than zero");
        }
        Ok(interval)
    }

    pub fn gpu_cache_ttl(&self) -> Result<Duration> {
        parse_duration(&self.gpu_cache_ttl)
            .with_context(|| format!("invalid gpu_cache_ttl '{}'", self.gpu_cache_ttl))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn env(vars: &[(&str, &str)]) -> Option<config::Map<String, String>> {
        Some(
            vars.iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    fn toml_file(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::load_with_env(None, &Overrides::default(), env(&[])).unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.refresh_interval().unwrap(), Duration::from_millis(250));
        assert_eq!(settings.gpu_cache_ttl().unwrap(), Duration::from_secs(300));
        assert_eq!(
            settings.telemetry.command().display(),
            "/usr/bin/powermetrics -i 1000 --samplers cpu_power,gpu_power"
        );
        assert_eq!(settings.logging.file, None);
    }

    #[test]
    fn test_file_overrides_defaults() {
        let file = toml_file(
            r#"
            refresh = "1s"

            [telemetry]
            sample_interval_ms = 500
            samplers = ["cpu_power"]

            [logging]
            file = "/tmp/powerwatch.log"
            "#,
        );

        let settings =
            Settings::load_with_env(Some(file.path()), &Overrides::default(), env(&[])).unwrap();
        assert_eq!(settings.refresh_interval().unwrap(), Duration::from_secs(1));
        assert_eq!(settings.telemetry.sample_interval_ms, 500);
        assert_eq!(settings.telemetry.samplers, vec!["cpu_power"]);
        // Unset keys keep their defaults
        assert_eq!(settings.telemetry.chunk_size, 4096);
        assert_eq!(settings.logging.file, Some(PathBuf::from("/tmp/powerwatch.log")));
        assert_eq!(settings.logging.level, "info");
    }

    #[test]
    fn test_environment_overrides_file() {
        let file = toml_file("refresh = \"1s\"\n");
        let settings = Settings::load_with_env(
            Some(file.path()),
            &Overrides::default(),
            env(&[
                ("POWERWATCH_REFRESH", "100ms"),
                ("POWERWATCH_TELEMETRY__PROGRAM", "/opt/bin/powermetrics"),
                ("POWERWATCH_TELEMETRY__SAMPLERS", "cpu_power,gpu_power,ane_power"),
                ("POWERWATCH_LOGGING__LEVEL", "debug"),
                // The log filter variable is not a settings key
                ("POWERWATCH_LOG", "trace"),
            ]),
        )
        .unwrap();

        assert_eq!(settings.refresh_interval().unwrap(), Duration::from_millis(100));
        assert_eq!(settings.telemetry.program, "/opt/bin/powermetrics");
        assert_eq!(
            settings.telemetry.samplers,
            vec!["cpu_power", "gpu_power", "ane_power"]
        );
        assert_eq!(settings.logging.level, "debug");
    }

    #[test]
    fn test_flags_override_everything() {
        let overrides = Overrides {
            refresh: Some("2s".to_string()),
            sample_interval_ms: Some(250),
            log_file: Some(PathBuf::from("/tmp/pw.log")),
        };
        let settings = Settings::load_with_env(
            None,
            &overrides,
            env(&[("POWERWATCH_REFRESH", "100ms")]),
        )
        .unwrap();

        assert_eq!(settings.refresh_interval().unwrap(), Duration::from_secs(2));
        assert_eq!(settings.telemetry.sample_interval_ms, 250);
        assert_eq!(settings.logging.file, Some(PathBuf::from("/tmp/pw.log")));
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let overrides = Overrides {
            refresh: Some("soon".to_string()),
            ..Overrides::default()
        };
        let err = Settings::load_with_env(None, &overrides, env(&[])).unwrap_err();
        assert!(err.to_string().contains("invalid refresh interval 'soon'"));

        let err = Settings::load_with_env(
            None,
            &Overrides::default(),
            env(&[("POWERWATCH_TELEMETRY__CHUNK_SIZE", "0")]),
        )
        .unwrap_err();
        assert!(err.to_string().contains("chunk_size"));
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let result = Settings::load_with_env(
            Some(Path::new("/nonexistent/powerwatch.toml")),
            &Overrides::default(),
            env(&[]),
        );
        assert!(result.is_err());
    }
}
