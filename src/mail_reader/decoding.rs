use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig};
use base64::engine::DecodePaddingMode;
use base64::Engine;
use encoding_rs::Encoding;
use log::debug;

// `B` words are accepted with or without trailing padding.
const ENCODED_WORD_BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("Unknown character encoding: {0}")]
    UnknownEncoding(String),

    #[error("Bytes are not valid {0}")]
    Malformed(&'static str),

    #[error("None of the configured encodings could decode the bytes")]
    Exhausted,
}

pub fn default_encoding_fallbacks() -> Vec<String> {
    ["utf-8", "gbk", "gb18030"].iter().map(|label| label.to_string()).collect()
}

pub fn lookup_encoding(label: &str) -> Result<&'static Encoding, DecodeError> {
    Encoding::for_label(label.trim().as_bytes()).ok_or_else(|| DecodeError::UnknownEncoding(label.to_string()))
}

pub fn decode_strict(encoding: &'static Encoding, bytes: &[u8]) -> Result<String, DecodeError> {
    encoding
        .decode_without_bom_handling_and_without_replacement(bytes)
        .map(|text| text.into_owned())
        .ok_or(DecodeError::Malformed(encoding.name()))
}

/// Decodes header bytes by trying a declared charset first and then each
/// configured encoding in order.
#[derive(Debug, Clone)]
pub struct TextDecoder {
    fallbacks: Vec<&'static Encoding>,
}

impl TextDecoder {
    pub fn new(labels: &[String]) -> Result<Self, DecodeError> {
        let fallbacks = labels
            .iter()
            .map(|label| lookup_encoding(label))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(TextDecoder { fallbacks })
    }

    pub fn decode(&self, bytes: &[u8], declared: Option<&str>) -> Result<String, DecodeError> {
        let declared = declared.and_then(|label| lookup_encoding(label).ok());
        for encoding in declared.into_iter().chain(self.fallbacks.iter().copied()) {
            match decode_strict(encoding, bytes) {
                Ok(text) => return Ok(text),
                Err(e) => debug!("{}", e),
            }
        }
        Err(DecodeError::Exhausted)
    }

    /// Like `decode`, but substitutes replacement characters with the last
    /// configured encoding instead of failing.
    pub fn decode_lossy(&self, bytes: &[u8], declared: Option<&str>) -> String {
        match self.decode(bytes, declared) {
            Ok(text) => text,
            Err(_) => {
                let encoding = self.fallbacks.last().copied().unwrap_or(encoding_rs::UTF_8);
                let (text, _) = encoding.decode_without_bom_handling(bytes);
                text.into_owned()
            }
        }
    }

    /// Raw header bytes as unfolded text. 8-bit headers go through the fallback chain.
    pub fn header_text(&self, raw: &[u8]) -> String {
        let text = if raw.is_ascii() {
            String::from_utf8_lossy(raw).into_owned()
        } else {
            self.decode_lossy(raw, None)
        };
        text.replace("\r\n", "").replace('\n', "")
    }

    /// Decodes RFC 2047 encoded words (`=?charset?B?...?=`, `=?charset?Q?...?=`)
    /// in a header value. The declared charset is tried first, then the
    /// fallback chain, so a mislabeled word still decodes. Adjacent words with
    /// the same charset are joined before decoding, since a multi-byte
    /// character may be split across them.
    pub fn decode_encoded_words(&self, text: &str) -> String {
        let mut decoded = String::with_capacity(text.len());
        let mut pending: Option<(&str, Vec<u8>)> = None;
        let mut rest = text;

        while let Some(start) = rest.find("=?") {
            let Some((word, consumed)) = parse_encoded_word(&rest[start..]) else {
                self.flush_word(&mut pending, &mut decoded);
                decoded.push_str(&rest[..start + 2]);
                rest = &rest[start + 2..];
                continue;
            };

            let between = &rest[..start];
            // Whitespace between two encoded words is not part of the text.
            let adjacent = pending.is_some() && between.chars().all(char::is_whitespace);
            let same_charset = pending
                .as_ref()
                .is_some_and(|(charset, _)| charset.eq_ignore_ascii_case(word.charset));
            match pending.as_mut() {
                Some((_, bytes)) if adjacent && same_charset => bytes.extend_from_slice(&word.bytes),
                _ => {
                    self.flush_word(&mut pending, &mut decoded);
                    if !adjacent {
                        decoded.push_str(between);
                    }
                    pending = Some((word.charset, word.bytes));
                }
            }
            rest = &rest[start + consumed..];
        }

        self.flush_word(&mut pending, &mut decoded);
        decoded.push_str(rest);
        decoded
    }

    fn flush_word(&self, pending: &mut Option<(&str, Vec<u8>)>, decoded: &mut String) {
        if let Some((charset, bytes)) = pending.take() {
            decoded.push_str(&self.decode_lossy(&bytes, Some(charset)));
        }
    }
}

struct EncodedWord<'a> {
    charset: &'a str,
    bytes: Vec<u8>,
}

/// Parses one encoded word at the start of `text`, returning it with the
/// number of bytes it spans.
fn parse_encoded_word(text: &str) -> Option<(EncodedWord<'_>, usize)> {
    let body = text.strip_prefix("=?")?;
    let (charset, body) = body.split_once('?')?;
    let (encoding, body) = body.split_once('?')?;
    let end = body.find("?=")?;
    if charset.is_empty() || charset.contains(char::is_whitespace) {
        return None;
    }

    let payload = &body[..end];
    let bytes = match encoding {
        "B" | "b" => ENCODED_WORD_BASE64.decode(payload).ok()?,
        "Q" | "q" => decode_quoted_printable_word(payload)?,
        _ => return None,
    };
    let consumed = 2 + charset.len() + 1 + encoding.len() + 1 + end + 2;
    // RFC 2231 allows a language suffix: `utf-8*zh-CN`.
    let charset = charset.split('*').next().unwrap_or(charset);
    Some((EncodedWord { charset, bytes }, consumed))
}

fn decode_quoted_printable_word(payload: &str) -> Option<Vec<u8>> {
    let raw = payload.as_bytes();
    let mut bytes = Vec::with_capacity(raw.len());
    let mut i = 0;
    while i < raw.len() {
        match raw[i] {
            b'_' => {
                bytes.push(b' ');
                i += 1;
            }
            b'=' => {
                let hex = payload.get(i + 1..i + 3)?;
                bytes.push(u8::from_str_radix(hex, 16).ok()?);
                i += 3;
            }
            byte => {
                bytes.push(byte);
                i += 1;
            }
        }
    }
    Some(bytes)
}
