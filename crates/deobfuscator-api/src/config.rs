//! Configuration management for the Moonsec API
//!
//! Loads configuration from environment variables with sensible defaults.

use anyhow::{Context, Result};
use moonsec_deobfuscator::{LaunchStrategy, ToolchainConfig};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// API server host
    pub api_host: String,

    /// API server port
    pub api_port: u16,

    /// Source checkout of the deobfuscator
    pub moonsec_path: PathBuf,

    /// Build output directory, `<moonsec_path>/bin/Release/net8.0` when unset
    pub build_path: Option<PathBuf>,

    /// Explicit tool locations, tried in order
    pub candidates: Option<Vec<PathBuf>>,

    /// Program that builds the tool and launches its assembly
    pub build_program: String,

    /// Wall-clock budget for one tool run, in seconds
    pub timeout_secs: u64,

    /// Parent directory for per-request scratch files
    pub scratch_dir: Option<PathBuf>,

    /// Request body cap in bytes, unlimited when unset
    pub max_body_bytes: Option<usize>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if it exists (for local development)
        dotenvy::dotenv().ok();

        let config = Config {
            api_host: env::var("API_HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),

            api_port: env::var("API_PORT")
                .unwrap_or_else(|_| "5000".to_string())
                .parse()
                .context("Invalid API_PORT")?,

            moonsec_path: env::var("MOONSEC_PATH")
                .unwrap_or_else(|_| "MoonsecDeobfuscator-master".to_string())
                .into(),

            build_path: env::var("MOONSEC_BUILD_PATH").ok().map(PathBuf::from),

            candidates: env::var("MOONSEC_CANDIDATES")
                .ok()
                .map(|list| parse_candidates(&list)),

            build_program: env::var("MOONSEC_BUILD_PROGRAM")
                .unwrap_or_else(|_| "dotnet".to_string()),

            timeout_secs: env::var("MOONSEC_TIMEOUT_SECS")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .context("Invalid MOONSEC_TIMEOUT_SECS")?,

            scratch_dir: env::var("MOONSEC_SCRATCH_DIR").ok().map(PathBuf::from),

            max_body_bytes: env::var("MAX_BODY_BYTES")
                .ok()
                .map(|value| value.parse::<usize>())
                .transpose()
                .context("Invalid MAX_BODY_BYTES")?,
        };

        // Validate configuration
        config.validate()?;

        Ok(config)
    }

    /// Validate configuration
    fn validate(&self) -> Result<()> {
        if self.api_port == 0 {
            anyhow::bail!("API_PORT must be greater than 0");
        }

        if self.timeout_secs == 0 {
            anyhow::bail!("MOONSEC_TIMEOUT_SECS must be greater than 0");
        }

        if self.max_body_bytes == Some(0) {
            anyhow::bail!("MAX_BODY_BYTES must be greater than 0");
        }

        if matches!(&self.candidates, Some(list) if list.is_empty()) {
            anyhow::bail!("MOONSEC_CANDIDATES must name at least one path");
        }

        Ok(())
    }

    /// Get the API server address
    pub fn api_address(&self) -> String {
        format!("{}:{}", self.api_host, self.api_port)
    }

    /// Toolchain settings derived from this configuration
    pub fn toolchain_config(&self) -> ToolchainConfig {
        let mut toolchain = ToolchainConfig::new(&self.moonsec_path);

        if let Some(build_path) = &self.build_path {
            toolchain = toolchain.with_build_output_dir(build_path);
        }

        if let Some(candidates) = &self.candidates {
            toolchain = toolchain.with_candidates(
                candidates
                    .iter()
                    .cloned()
                    .map(LaunchStrategy::from_path)
                    .collect(),
            );
        }

        toolchain.build_program = self.build_program.clone();
        toolchain.scratch_dir = self.scratch_dir.clone();
        toolchain.with_process_timeout(Duration::from_secs(self.timeout_secs))
    }
}

fn parse_candidates(list: &str) -> Vec<PathBuf> {
    list.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(PathBuf::from)
        .collect()
}
