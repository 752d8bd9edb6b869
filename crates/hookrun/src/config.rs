use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::debug;

use crate::cli::{Cli, HOOK_ENV};
use crate::error::Error;

const DEFAULT_CONFIG_NAME: &str = "hookrun.toml";
const USER_CONFIG_NAME: &str = "config.toml";

/// Defaults read from `hookrun.toml`. Every key is optional.
#[derive(Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub hook: Option<String>,
    pub channel: Option<String>,
    pub username: Option<String>,
    pub emoji: Option<String>,
    pub icon: Option<String>,
    pub timing: Option<bool>,
    pub verbose: Option<bool>,
}

impl FileConfig {
    /// Load from an explicit path, or search upward from the current dir and
    /// then the user config dir. Only an explicit path is required to exist.
    pub fn load(path_override: Option<&Path>) -> Result<Self> {
        let path = match path_override {
            Some(p) => p.to_path_buf(),
            None => match find_upwards(DEFAULT_CONFIG_NAME).or_else(user_config) {
                Some(p) => p,
                None => return Ok(Self::default()),
            },
        };
        Self::read(&path)
    }

    fn read(path: &Path) -> Result<Self> {
        debug!(path = %path.display(), "loading config");
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Reading config file {}", path.display()))?;
        let cfg: FileConfig = toml::from_str(&contents)
            .with_context(|| format!("Parsing TOML config {}", path.display()))?;
        Ok(cfg)
    }
}

/// Fully resolved options for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub hook: String,
    pub channel: String,
    pub username: String,
    pub emoji: String,
    pub icon: String,
    pub timing: bool,
    pub verbose: bool,
}

impl Settings {
    /// Merge command-line values over file defaults. Empty strings count as
    /// unset so `-channel ""` falls back to the file.
    pub fn resolve(cli: &Cli, file: FileConfig) -> Result<Self, Error> {
        Self::resolve_with(cli, file, std::env::var(HOOK_ENV).ok())
    }

    /// `env_hook` sits between the flag and the file. clap fills `cli.hook`
    /// from the environment only when the flag is absent, so an explicit
    /// empty `-hook ""` is checked against it again here.
    fn resolve_with(cli: &Cli, file: FileConfig, env_hook: Option<String>) -> Result<Self, Error> {
        let fallback_hook = match env_hook {
            Some(env) if !env.is_empty() => Some(env),
            _ => file.hook,
        };
        let hook = pick(cli.hook.as_deref(), fallback_hook);
        if hook.is_empty() {
            return Err(Error::MissingHook);
        }

        Ok(Self {
            hook,
            channel: pick(cli.channel.as_deref(), file.channel),
            username: pick(cli.username.as_deref(), file.username),
            emoji: pick(cli.emoji.as_deref(), file.emoji),
            icon: pick(cli.icon.as_deref(), file.icon),
            timing: cli.timing.or(file.timing).unwrap_or(false),
            verbose: cli.verbose.or(file.verbose).unwrap_or(false),
        })
    }
}

fn pick(flag: Option<&str>, file: Option<String>) -> String {
    match flag {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => file.unwrap_or_default(),
    }
}

fn find_upwards(file_name: &str) -> Option<PathBuf> {
    let mut dir = std::env::current_dir().ok()?;
    loop {
        let candidate = dir.join(file_name);
        if candidate.is_file() {
            return Some(candidate);
        }
        if !dir.pop() {
            break;
        }
    }
    None
}

fn user_config() -> Option<PathBuf> {
    let path = dirs::config_dir()?.join("hookrun").join(USER_CONFIG_NAME);
    path.is_file().then_some(path)
}
