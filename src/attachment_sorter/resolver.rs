use log::warn;
use serde::Serialize;
use std::fmt;

use crate::attachment_sorter::category::Category;

pub const UNSORTED_BUCKET: &str = "tmp";

/// Folder an attachment is placed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TargetBucket {
    Assignment(Category),
    Unsorted,
}

impl TargetBucket {
    pub fn name(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for TargetBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetBucket::Assignment(category) => write!(f, "{}", category),
            TargetBucket::Unsorted => f.write_str(UNSORTED_BUCKET),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategoryConflict {
    pub from_subject: Category,
    pub from_filename: Category,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub bucket: TargetBucket,
    pub conflict: Option<CategoryConflict>,
}

/// Merges the subject and filename categories. On disagreement the filename
/// wins, since it belongs to the file being placed.
pub fn resolve(from_subject: Option<Category>, from_filename: Option<Category>) -> Resolution {
    match (from_subject, from_filename) {
        (Some(subject), Some(filename)) if subject != filename => {
            warn!(
                "Category conflict: subject says {} but filename says {}, using the filename",
                subject, filename
            );
            Resolution {
                bucket: TargetBucket::Assignment(filename),
                conflict: Some(CategoryConflict { from_subject: subject, from_filename: filename }),
            }
        }
        (_, Some(category)) | (Some(category), None) => Resolution {
            bucket: TargetBucket::Assignment(category),
            conflict: None,
        },
        (None, None) => Resolution {
            bucket: TargetBucket::Unsorted,
            conflict: None,
        },
    }
}
