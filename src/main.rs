mod attachment_sorter;
mod logging;
mod mail_reader;
mod settings;
mod submission_check;

use anyhow::{anyhow, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use log::LevelFilter;
use std::path::PathBuf;

use crate::attachment_sorter::bucket_store::DirectoryStore;
use crate::attachment_sorter::AttachmentSorter;
use crate::mail_reader::imap::SearchWindow;
use crate::mail_reader::message::Message;
use crate::settings::Config;

#[derive(Debug, Parser)]
#[command(version, about = "Sorts homework attachments from a mailbox into assignment folders")]
struct Cli {
    #[arg(long, default_value = settings::DEFAULT_SETTINGS_PATH)]
    config: PathBuf,

    /// off, error, warn, info, debug or trace
    #[arg(long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Download and sort attachments of the messages received in a date range
    Fetch {
        /// First day to include (YYYY-MM-DD)
        #[arg(long)]
        since: NaiveDate,
        /// Last day to include (YYYY-MM-DD), open-ended when omitted
        #[arg(long)]
        until: Option<NaiveDate>,
        /// Also accept .txt attachments
        #[arg(long)]
        allow_txt: bool,
    },
    /// Sort attachments of the .eml files in a directory
    Import {
        directory: PathBuf,
        #[arg(long)]
        allow_txt: bool,
    },
    /// Compare one assignment folder with the student roster
    Check {
        bucket: String,
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

fn sort_messages(config: &Config, messages: &[Message], allow_txt: bool) -> Result<()> {
    let sorter = AttachmentSorter::new(config.sorting.clone().with_plain_text(allow_txt))?;
    let mut store = DirectoryStore::new(&config.download.directory);
    let summary = sorter.sort_messages(messages, &mut store);
    summary.log();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let log_level: LevelFilter = cli
        .log_level
        .parse()
        .map_err(|_| anyhow!("Unknown log level {}", cli.log_level))?;
    logging::setup_logger(log_level).context("Cannot initialize logging")?;
    let config = settings::load_settings(&cli.config)?;

    match cli.command {
        Command::Fetch { since, until, allow_txt } => {
            let window = SearchWindow { since, until };
            let messages = mail_reader::fetch_messages(&config, &window).await?;
            sort_messages(&config, &messages, allow_txt)
        }
        Command::Import { directory, allow_txt } => {
            let messages = mail_reader::read_message_files(&directory, &config)?;
            sort_messages(&config, &messages, allow_txt)
        }
        Command::Check { bucket, output } => {
            submission_check::run(&config, &bucket, output.as_deref())?;
            Ok(())
        }
    }
}
