use anyhow::{Context, Result};
use serde::Deserialize;

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use backtrace::Backtrace;
use log::error;

use crate::attachment_sorter::sorting_settings::SortingSettings;
use crate::mail_reader::decoding::default_encoding_fallbacks;

pub const DEFAULT_SETTINGS_PATH: &str = "src/resources/settings.yaml";

// Main configuration struct
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub imap: ImapConfig,
    #[serde(default)]
    pub mail: MailConfig,
    #[serde(default)]
    pub download: DownloadConfig,
    #[serde(default)]
    pub sorting: SortingSettings,
    #[serde(default)]
    pub roster: RosterConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ImapConfig {
    pub server: String,
    pub port: u16,
    pub username: String,
    #[serde(default = "default_credentials_dir")]
    pub credentials_dir: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct MailConfig {
    #[serde(default = "default_mailbox")]
    pub mailbox: String,
    /// Tried in order when a header is not valid in its declared charset.
    #[serde(default = "default_encoding_fallbacks")]
    pub encoding_fallbacks: Vec<String>,
}

impl Default for MailConfig {
    fn default() -> Self {
        MailConfig {
            mailbox: default_mailbox(),
            encoding_fallbacks: default_encoding_fallbacks(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct DownloadConfig {
    #[serde(default = "default_download_dir")]
    pub directory: PathBuf,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        DownloadConfig { directory: default_download_dir() }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct RosterConfig {
    #[serde(default = "default_students_file")]
    pub students_file: PathBuf,
}

impl Default for RosterConfig {
    fn default() -> Self {
        RosterConfig { students_file: default_students_file() }
    }
}

fn default_credentials_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_mailbox() -> String {
    "INBOX".to_string()
}

fn default_download_dir() -> PathBuf {
    PathBuf::from("downloads")
}

fn default_students_file() -> PathBuf {
    PathBuf::from("students.json")
}

fn log_with_backtrace(err: &dyn std::fmt::Display) {
    error!("Error: {}", err);
    let backtrace = Backtrace::new();
    error!("Backtrace:\n{:?}", backtrace);
}

pub fn parse_settings(reader: impl std::io::Read) -> Result<Config, serde_yaml::Error> {
    serde_yaml::from_reader(reader)
}

pub fn load_settings(path: &Path) -> Result<Config> {
    let file = File::open(path)
        .inspect_err(|err| log_with_backtrace(err))
        .with_context(|| format!("Cannot find settings at {}", path.display()))?;

    // Parse the YAML file into the Config struct
    let config = parse_settings(BufReader::new(file))
        .inspect_err(|err| log_with_backtrace(err))
        .with_context(|| format!("Cannot deserialize settings from {}", path.display()))?;

    Ok(config)
}
