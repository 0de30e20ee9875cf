//! CLI argument definitions for the Vitalis server.
//!
//! Priority resolution: CLI args > env vars > config file > defaults.

use clap::Parser;
use std::path::PathBuf;

/// Vitalis - a multi-modal assistant server backed by Gemini.
#[derive(Parser, Debug, Default)]
#[command(name = "vitalis", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// Address to bind the API server to.
    #[arg(long = "host")]
    pub host: Option<String>,

    /// API server port.
    #[arg(short = 'p', long = "port")]
    pub port: Option<u16>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level")]
    pub log_level: Option<String>,
}

impl CliArgs {
    /// Priority: --config flag > VITALIS_CONFIG env var > ~/.vitalis/config.toml.
    pub fn resolve_config_path(&self) -> PathBuf {
        if let Some(ref p) = self.config {
            return p.clone();
        }
        if let Ok(p) = std::env::var("VITALIS_CONFIG") {
            return PathBuf::from(p);
        }
        default_config_path()
    }

    /// Priority: --port flag > VITALIS_PORT env var > config file value.
    pub fn resolve_port(&self, config_port: u16) -> u16 {
        if let Some(p) = self.port {
            return p;
        }
        std::env::var("VITALIS_PORT")
            .ok()
            .and_then(|val| val.parse::<u16>().ok())
            .unwrap_or(config_port)
    }

    /// Priority: --host flag > VITALIS_HOST env var > config file value.
    pub fn resolve_host(&self, config_host: &str) -> String {
        if let Some(ref h) = self.host {
            return h.clone();
        }
        std::env::var("VITALIS_HOST").unwrap_or_else(|_| config_host.to_string())
    }

    /// Priority: --log-level flag > config file value.
    pub fn resolve_log_level(&self, config_level: &str) -> String {
        self.log_level
            .clone()
            .unwrap_or_else(|| config_level.to_string())
    }
}

/// Default config file path for the current platform.
fn default_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    if let Ok(home) = std::env::var("USERPROFILE") {
        return PathBuf::from(home).join(".vitalis").join("config.toml");
    }
    #[cfg(not(target_os = "windows"))]
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".vitalis").join("config.toml");
    }
    PathBuf::from("config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flags() {
        let args = CliArgs::parse_from([
            "vitalis",
            "--config",
            "/etc/vitalis.toml",
            "--host",
            "127.0.0.1",
            "-p",
            "8080",
            "--log-level",
            "debug",
        ]);
        assert_eq!(args.resolve_config_path(), PathBuf::from("/etc/vitalis.toml"));
        assert_eq!(args.resolve_port(5000), 8080);
        assert_eq!(args.resolve_host("0.0.0.0"), "127.0.0.1");
        assert_eq!(args.resolve_log_level("info"), "debug");
    }

    #[test]
    fn test_log_level_falls_back_to_config() {
        let args = CliArgs::parse_from(["vitalis"]);
        assert_eq!(args.resolve_log_level("warn"), "warn");
    }
}
