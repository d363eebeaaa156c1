use anyhow::{Context, Result, bail};
use clap::Parser;
use std::env;

/// Centralized application configuration.
/// Combines environment variables and CLI arguments.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub storage_dir: String,
    pub strict_probe: bool,
}

/// Command-line + environment configuration.
#[derive(Parser, Debug, Default)]
#[command(author, version, about = "Image shape metadata service")]
pub struct Args {
    /// Host to bind to (overrides IMAGE_META_HOST)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to (overrides IMAGE_META_PORT)
    #[arg(long)]
    pub port: Option<u16>,

    /// Directory holding one sub-directory per bucket (overrides IMAGE_META_STORAGE_DIR)
    #[arg(long)]
    pub storage_dir: Option<String>,

    /// Reject objects shorter than the 512-byte sniffing probe (overrides IMAGE_META_STRICT_PROBE)
    #[arg(long)]
    pub strict_probe: bool,
}

impl AppConfig {
    /// Parse environment variables + CLI args into AppConfig.
    pub fn from_env_and_args() -> Result<Self> {
        Self::merge(Args::parse(), |name| env::var(name))
    }

    /// Layer `args` over the variables visible through `lookup`, then over
    /// defaults.
    fn merge<F>(args: Args, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Result<String, env::VarError>,
    {
        // --- Environment fallback ---
        let env_host = lookup("IMAGE_META_HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let env_port = match lookup("IMAGE_META_PORT") {
            Ok(value) => value
                .parse::<u16>()
                .with_context(|| format!("parsing IMAGE_META_PORT value `{}`", value))?,
            Err(env::VarError::NotPresent) => 8080,
            Err(err) => return Err(err).context("reading IMAGE_META_PORT"),
        };
        let env_storage =
            lookup("IMAGE_META_STORAGE_DIR").unwrap_or_else(|_| "./data/buckets".into());
        let env_strict = match lookup("IMAGE_META_STRICT_PROBE") {
            Ok(value) => parse_flag(&value)
                .with_context(|| format!("parsing IMAGE_META_STRICT_PROBE value `{}`", value))?,
            Err(env::VarError::NotPresent) => false,
            Err(err) => return Err(err).context("reading IMAGE_META_STRICT_PROBE"),
        };

        // --- Merge ---
        Ok(Self {
            host: args.host.unwrap_or(env_host),
            port: args.port.unwrap_or(env_port),
            storage_dir: args.storage_dir.unwrap_or(env_storage),
            strict_probe: args.strict_probe || env_strict,
        })
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_flag(value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => bail!("expected a boolean, got `{}`", other),
    }
}
