use anyhow::{Context, Result};
use log::{error, info};
use std::fs;
use std::path::{Path, PathBuf};

pub mod decoding;
pub mod encryption;
pub mod imap;
pub mod message;

use crate::mail_reader::decoding::TextDecoder;
use crate::mail_reader::imap::{create_session, fetch_raw_messages, SearchWindow};
use crate::mail_reader::message::{process_raw_message, Message};
use crate::settings::Config;

fn parse_all<'a>(raw_messages: impl IntoIterator<Item = (String, &'a [u8])>, config: &Config) -> Result<Vec<Message>> {
    let decoder = TextDecoder::new(&config.mail.encoding_fallbacks)?;
    let messages = raw_messages
        .into_iter()
        .filter_map(|(label, raw)| {
            match process_raw_message(raw, &decoder, &config.sorting.no_subject_sentinel) {
                Ok(message) => Some(message),
                Err(e) => {
                    error!("Cannot parse message {}: {}", label, e);
                    None
                }
            }
        })
        .collect();
    Ok(messages)
}

/// Downloads and decodes the messages of the configured mailbox inside `window`.
pub async fn fetch_messages(config: &Config, window: &SearchWindow) -> Result<Vec<Message>> {
    let mut imap_session = create_session(&config.imap).await?;
    let raw_messages = fetch_raw_messages(&mut imap_session, &config.mail.mailbox, window).await?;

    // Be nice to the server and log out
    imap_session.logout().await?;

    info!("Fetched {} messages", raw_messages.len());
    parse_all(
        raw_messages
            .iter()
            .enumerate()
            .map(|(index, raw)| (format!("#{}", index + 1), raw.as_slice())),
        config,
    )
}

/// Reads every `.eml` file of `directory`, in file name order.
pub fn read_message_files(directory: &Path, config: &Config) -> Result<Vec<Message>> {
    let mut paths: Vec<PathBuf> = fs::read_dir(directory)
        .with_context(|| format!("Cannot read {}", directory.display()))?
        .filter_map(|entry| entry.ok().map(|entry| entry.path()))
        .filter(|path| {
            path.extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("eml"))
        })
        .collect();
    paths.sort();

    let mut raw_messages = Vec::with_capacity(paths.len());
    for path in paths {
        let raw = fs::read(&path).with_context(|| format!("Cannot read {}", path.display()))?;
        raw_messages.push((path.display().to_string(), raw));
    }
    parse_all(
        raw_messages
            .iter()
            .map(|(label, raw)| (label.clone(), raw.as_slice())),
        config,
    )
}
