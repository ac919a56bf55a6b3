use serde::Serialize;

use crate::attachment_sorter::identity::{IdentityExtractor, StudentIdentity};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DuplicateReason {
    SameFilename,
    SameStudentId,
    SameStudentName,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DedupVerdict {
    Unique,
    Duplicate { existing: String, reason: DuplicateReason },
}

fn same_student(candidate: &StudentIdentity, existing: &StudentIdentity) -> Option<DuplicateReason> {
    if let (Some(a), Some(b)) = (&candidate.id, &existing.id) {
        if a == b {
            return Some(DuplicateReason::SameStudentId);
        }
        // Namesakes with different IDs are different students.
        return None;
    }
    match (&candidate.name, &existing.name) {
        (Some(a), Some(b)) if a == b => Some(DuplicateReason::SameStudentName),
        _ => None,
    }
}

pub struct Deduplicator<'a> {
    identities: &'a IdentityExtractor,
}

impl<'a> Deduplicator<'a> {
    pub fn new(identities: &'a IdentityExtractor) -> Self {
        Deduplicator { identities }
    }

    /// Compares `candidate` with each file already in the bucket and reports the
    /// first one submitted by the same student.
    pub fn check(&self, candidate: &str, existing_files: &[String]) -> DedupVerdict {
        let candidate_identity = self.identities.extract(candidate);
        for existing in existing_files {
            if existing == candidate {
                return DedupVerdict::Duplicate {
                    existing: existing.clone(),
                    reason: DuplicateReason::SameFilename,
                };
            }
            let existing_identity = self.identities.extract(existing);
            if let Some(reason) = same_student(&candidate_identity, &existing_identity) {
                return DedupVerdict::Duplicate { existing: existing.clone(), reason };
            }
        }
        DedupVerdict::Unique
    }
}
