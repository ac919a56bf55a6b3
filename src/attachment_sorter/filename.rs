use regex::Regex;
use serde::Serialize;

use crate::attachment_sorter::category::fold_fullwidth_digits;

pub const ILLEGAL_CHARACTERS: [char; 9] = ['\\', '/', ':', '*', '?', '"', '<', '>', '|'];

/// Drops every character that cannot appear in a file name on common filesystems.
pub fn sanitize(name: &str) -> String {
    name.chars()
        .filter(|c| !ILLEGAL_CHARACTERS.contains(c))
        .collect()
}

/// Splits `name` into stem and extension (the extension keeps its dot).
/// Leading dots belong to the stem, so `.hidden` has no extension.
pub fn split_extension(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(index) if !name[..index].trim_start_matches('.').is_empty() => name.split_at(index),
        _ => (name, ""),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Rename {
    /// Hash-like or camera-generated name replaced by the subject.
    GarbageRepaired { from: String, to: String },
    /// Subject prefixed so the file carries the sender's identity.
    IdentitySupplemented { from: String, to: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedFilename {
    pub filename: String,
    pub renames: Vec<Rename>,
}

pub struct FilenameNormalizer {
    garbage_stem: Regex,
    student_id: Regex,
    assignment_keyword: Regex,
    no_subject_sentinel: String,
}

impl FilenameNormalizer {
    pub fn new(no_subject_sentinel: &str) -> Result<Self, regex::Error> {
        Ok(FilenameNormalizer {
            garbage_stem: Regex::new(r"(?i)^(?:[a-f0-9]{16,}|image|screenshot|wx_camera|新建|img)")?,
            student_id: Regex::new(r"[0-9]{8,}")?,
            assignment_keyword: Regex::new(r"(?i)作业|实验|报告|文档|docx|pdf")?,
            no_subject_sentinel: no_subject_sentinel.to_string(),
        })
    }

    pub fn is_garbage(&self, filename: &str) -> bool {
        let (stem, _) = split_extension(filename);
        self.garbage_stem.is_match(stem)
    }

    fn usable_subject(&self, subject: &str) -> Option<String> {
        if subject.is_empty() || subject == self.no_subject_sentinel {
            return None;
        }
        Some(sanitize(subject))
    }

    /// Repairs a sanitized filename with the help of the message subject.
    ///
    /// A garbage name is first replaced by the subject; the result is then
    /// checked again for missing identity and prefixed with the subject when
    /// the subject carries a student ID the name lacks, or the name is a
    /// generic assignment title without any ID.
    pub fn repair(&self, sanitized: &str, subject: &str) -> NormalizedFilename {
        let mut filename = sanitized.to_string();
        let mut renames = Vec::new();
        let Some(safe_subject) = self.usable_subject(subject) else {
            return NormalizedFilename { filename, renames };
        };

        if self.is_garbage(&filename) && !safe_subject.is_empty() {
            let (_, extension) = split_extension(&filename);
            let repaired = format!("{}{}", safe_subject, extension);
            renames.push(Rename::GarbageRepaired { from: filename.clone(), to: repaired.clone() });
            filename = repaired;
        }

        let (missing_subject_id, generic_title) = {
            let subject = fold_fullwidth_digits(subject);
            let folded = fold_fullwidth_digits(&filename);
            let subject_id = self.student_id.find(&subject).map(|m| m.as_str());
            (
                subject_id.is_some_and(|id| !folded.contains(id)),
                !self.student_id.is_match(&folded) && self.assignment_keyword.is_match(&folded),
            )
        };

        if (missing_subject_id || generic_title) && !filename.contains(&safe_subject) {
            let supplemented = format!("{}_{}", safe_subject, filename);
            renames.push(Rename::IdentitySupplemented { from: filename.clone(), to: supplemented.clone() });
            filename = supplemented;
        }

        NormalizedFilename { filename, renames }
    }
}
