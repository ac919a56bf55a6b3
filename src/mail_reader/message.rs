use anyhow::Result;
use mailparse::{parse_content_disposition, parse_mail, MailHeaderMap, ParsedMail};
use serde::Serialize;

use crate::mail_reader::decoding::TextDecoder;

/// An inbound message reduced to what the sorter needs.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Message {
    pub subject: String,
    pub from: Option<String>,
    pub date: Option<String>,
    pub attachments: Vec<RawAttachment>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RawAttachment {
    pub declared_filename: String,
    #[serde(skip)]
    pub payload: Vec<u8>,
}

fn attachment_filename(part: &ParsedMail, decoder: &TextDecoder) -> Option<String> {
    let header = part.headers.get_first_header("Content-Disposition")?;
    let disposition = parse_content_disposition(&decoder.header_text(header.get_value_raw()));
    let raw_name = disposition
        .params
        .get("filename")
        .or_else(|| part.ctype.params.get("name"))?;
    let filename = decoder.decode_encoded_words(raw_name.trim());
    if filename.is_empty() {
        None
    } else {
        Some(filename)
    }
}

fn collect_attachments(part: &ParsedMail, decoder: &TextDecoder, attachments: &mut Vec<RawAttachment>) -> Result<()> {
    if !part.ctype.mimetype.starts_with("multipart/") {
        if let Some(declared_filename) = attachment_filename(part, decoder) {
            attachments.push(RawAttachment {
                declared_filename,
                payload: part.get_body_raw()?,
            });
        }
    }

    for subpart in &part.subparts {
        collect_attachments(subpart, decoder, attachments)?;
    }
    Ok(())
}

pub fn process_raw_message(raw: &[u8], decoder: &TextDecoder, no_subject_sentinel: &str) -> Result<Message> {
    let parsed_mail = parse_mail(raw)?;

    let subject = parsed_mail
        .headers
        .get_first_header("Subject")
        .map(|header| decoder.decode_encoded_words(&decoder.header_text(header.get_value_raw())))
        .map(|subject| subject.trim().to_string())
        .filter(|subject| !subject.is_empty())
        .unwrap_or_else(|| no_subject_sentinel.to_string());
    let from = parsed_mail.headers.get_first_value("From");
    let date = parsed_mail.headers.get_first_value("Date");

    let mut attachments = Vec::new();
    collect_attachments(&parsed_mail, decoder, &mut attachments)?;

    Ok(Message {
        subject,
        from,
        date,
        attachments,
    })
}
