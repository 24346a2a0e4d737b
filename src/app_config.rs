//! Application configuration loading for CLI defaults.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use fetchtv_core::HttpTimeouts;
use fetchtv_core::discovery::DEFAULT_DISCOVERY_TIMEOUT;

/// TOML-backed file configuration for fetchtv defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileConfig {
    /// Server IP address, skips SSDP discovery.
    pub ip: Option<String>,
    /// Server port used with `ip`.
    pub port: Option<u16>,
    /// Save root used when `--save` is not given. Setting it turns listings into saves.
    pub save_dir: Option<PathBuf>,
    /// Re-download recordings that are already registered.
    pub overwrite: Option<bool>,
    /// Maximum wait for response headers, in seconds.
    pub probe_timeout_secs: Option<u64>,
    /// TCP connect timeout, in seconds.
    pub connect_timeout_secs: Option<u64>,
    /// Idle read timeout while streaming, in seconds.
    pub read_timeout_secs: Option<u64>,
    /// How long to collect SSDP responses, in seconds.
    pub discovery_timeout_secs: Option<u64>,
}

impl FileConfig {
    /// Validates config values against runtime and CLI constraints.
    pub fn validate(&self) -> Result<()> {
        if let Some(port) = self.port
            && port == 0
        {
            bail!("Invalid config value for `port`: {port}. Expected range: 1..=65535");
        }
        if let Some(ip) = &self.ip
            && ip.trim().is_empty()
        {
            bail!("Invalid config value for `ip`: must not be empty");
        }
        validate_timeout_secs("probe_timeout_secs", self.probe_timeout_secs, 300)?;
        validate_timeout_secs("connect_timeout_secs", self.connect_timeout_secs, 300)?;
        validate_timeout_secs("read_timeout_secs", self.read_timeout_secs, 3600)?;
        validate_timeout_secs("discovery_timeout_secs", self.discovery_timeout_secs, 60)?;
        Ok(())
    }

    /// HTTP timeouts with configured values applied over the defaults.
    #[must_use]
    pub fn http_timeouts(&self) -> HttpTimeouts {
        let defaults = HttpTimeouts::default();
        HttpTimeouts {
            connect: self
                .connect_timeout_secs
                .map_or(defaults.connect, Duration::from_secs),
            read: self
                .read_timeout_secs
                .map_or(defaults.read, Duration::from_secs),
            request: self
                .probe_timeout_secs
                .map_or(defaults.request, Duration::from_secs),
        }
    }

    #[must_use]
    pub fn discovery_timeout(&self) -> Duration {
        self.discovery_timeout_secs
            .map_or(DEFAULT_DISCOVERY_TIMEOUT, Duration::from_secs)
    }
}

fn validate_timeout_secs(field: &str, value: Option<u64>, max: u64) -> Result<()> {
    let Some(value) = value else {
        return Ok(());
    };
    if !(1..=max).contains(&value) {
        bail!("Invalid config value for `{field}`: {value}. Expected range: 1..={max}");
    }
    Ok(())
}

/// Loaded config metadata.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    /// Resolved config path if a base directory is known.
    pub path: Option<PathBuf>,
    /// Parsed file config when a config file exists and was valid.
    pub config: Option<FileConfig>,
}

impl LoadedConfig {
    /// Parsed values, or all-`None` defaults when no file was loaded.
    #[must_use]
    pub fn values(&self) -> FileConfig {
        self.config.clone().unwrap_or_default()
    }
}

/// Resolves default config path.
///
/// Priority:
/// 1. `$XDG_CONFIG_HOME/fetchtv/config.toml`
/// 2. `$HOME/.config/fetchtv/config.toml`
#[must_use]
pub fn resolve_default_config_path() -> Option<PathBuf> {
    if let Some(xdg_config_home) = env_var_non_empty_os("XDG_CONFIG_HOME") {
        return Some(
            PathBuf::from(xdg_config_home)
                .join("fetchtv")
                .join("config.toml"),
        );
    }

    let home = env_var_non_empty_os("HOME")?;
    Some(
        PathBuf::from(home)
            .join(".config")
            .join("fetchtv")
            .join("config.toml"),
    )
}

fn env_var_non_empty_os(name: &str) -> Option<std::ffi::OsString> {
    let value = env::var_os(name)?;
    if value.is_empty() { None } else { Some(value) }
}

/// Loads config from `explicit` when given, otherwise from the default path
/// if a file exists there.
///
/// An explicit path that does not exist is an error.
pub fn load_config(explicit: Option<&Path>) -> Result<LoadedConfig> {
    if let Some(path) = explicit {
        let config = load_file_config(path)?;
        return Ok(LoadedConfig {
            path: Some(path.to_path_buf()),
            config: Some(config),
        });
    }

    let path = resolve_default_config_path();
    let Some(path_ref) = path.as_deref() else {
        return Ok(LoadedConfig { path, config: None });
    };
    if !path_ref.exists() {
        return Ok(LoadedConfig { path, config: None });
    }

    let config = load_file_config(path_ref)?;
    Ok(LoadedConfig {
        path,
        config: Some(config),
    })
}

fn load_file_config(path: &Path) -> Result<FileConfig> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file '{}'", path.display()))?;
    parse_config_str(&raw)
        .with_context(|| format!("Failed to parse config file '{}'", path.display()))
}

fn parse_config_str(raw: &str) -> Result<FileConfig> {
    let mut cfg = FileConfig::default();
    for (line_index, raw_line) in raw.lines().enumerate() {
        let line = strip_inline_comment(raw_line).trim();
        if line.is_empty() {
            continue;
        }

        let Some((raw_key, raw_value)) = line.split_once('=') else {
            bail!(
                "Invalid config syntax on line {}: expected key = value",
                line_index + 1
            );
        };

        let key = raw_key.trim();
        let value = raw_value.trim();
        let invalid = || format!("Invalid `{key}` value on line {}", line_index + 1);

        match key {
            "ip" => cfg.ip = Some(parse_string_literal(value).with_context(invalid)?),
            "port" => {
                let parsed = parse_integer_u64(value).with_context(invalid)?;
                let port = u16::try_from(parsed)
                    .map_err(|_| anyhow::anyhow!("port out of range for u16"))
                    .with_context(invalid)?;
                cfg.port = Some(port);
            }
            "save_dir" => {
                let parsed = parse_string_literal(value).with_context(invalid)?;
                cfg.save_dir = Some(PathBuf::from(parsed));
            }
            "overwrite" => cfg.overwrite = Some(parse_boolean(value).with_context(invalid)?),
            "probe_timeout_secs" => {
                cfg.probe_timeout_secs = Some(parse_integer_u64(value).with_context(invalid)?);
            }
            "connect_timeout_secs" => {
                cfg.connect_timeout_secs = Some(parse_integer_u64(value).with_context(invalid)?);
            }
            "read_timeout_secs" => {
                cfg.read_timeout_secs = Some(parse_integer_u64(value).with_context(invalid)?);
            }
            "discovery_timeout_secs" => {
                cfg.discovery_timeout_secs = Some(parse_integer_u64(value).with_context(invalid)?);
            }
            unknown => {
                bail!(
                    "Unknown configuration key: '{}' on line {}",
                    unknown,
                    line_index + 1
                );
            }
        }
    }
    cfg.validate()?;
    Ok(cfg)
}

fn strip_inline_comment(line: &str) -> &str {
    let mut in_string = false;
    for (index, ch) in line.char_indices() {
        match ch {
            '"' => in_string = !in_string,
            '#' if !in_string => return &line[..index],
            _ => {}
        }
    }
    line
}

fn parse_string_literal(raw_value: &str) -> Result<String> {
    if raw_value.len() < 2 || !raw_value.starts_with('"') || !raw_value.ends_with('"') {
        bail!("Expected double-quoted string");
    }
    Ok(raw_value[1..raw_value.len() - 1].to_string())
}

fn parse_integer_u64(raw_value: &str) -> Result<u64> {
    let token = raw_value.trim();
    if token.is_empty() {
        bail!("Expected integer value");
    }
    let value = token.parse::<i128>()?;
    if value < 0 {
        bail!("Expected non-negative integer");
    }
    u64::try_from(value).map_err(|_| anyhow::anyhow!("Integer value out of range for u64"))
}

fn parse_boolean(raw_value: &str) -> Result<bool> {
    match raw_value.trim() {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => bail!("Expected 'true' or 'false'"),
    }
}
