pub mod bucket_store;
pub mod category;
pub mod dedup;
pub mod filename;
pub mod identity;
pub mod resolver;
pub mod sorting_settings;

use anyhow::Result;
use log::{error, info, warn};
use serde::Serialize;

use crate::attachment_sorter::bucket_store::BucketStore;
use crate::attachment_sorter::category::{Category, CategoryExtractor};
use crate::attachment_sorter::dedup::{DedupVerdict, Deduplicator, DuplicateReason};
use crate::attachment_sorter::filename::{sanitize, FilenameNormalizer, Rename};
use crate::attachment_sorter::identity::IdentityExtractor;
use crate::attachment_sorter::resolver::{resolve, TargetBucket};
use crate::attachment_sorter::sorting_settings::SortingSettings;
use crate::mail_reader::message::{Message, RawAttachment};

/// Rejected formats never reach classification, so only the other actions name a bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum PlacementAction {
    Place {
        bucket: TargetBucket,
    },
    SkipDuplicate {
        bucket: TargetBucket,
        existing: String,
        reason: DuplicateReason,
    },
    SkipUnsupportedFormat,
}

/// Where an attachment goes and under which name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlacementDecision {
    pub filename: String,
    pub renames: Vec<Rename>,
    pub action: PlacementAction,
}

impl PlacementDecision {
    pub fn bucket(&self) -> Option<&TargetBucket> {
        match &self.action {
            PlacementAction::Place { bucket } | PlacementAction::SkipDuplicate { bucket, .. } => Some(bucket),
            PlacementAction::SkipUnsupportedFormat => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttachmentOutcome {
    Placed { bucket: TargetBucket, filename: String },
    SkippedDuplicate { bucket: TargetBucket, filename: String, existing: String },
    SkippedUnsupportedFormat { filename: String },
    Failed { filename: String, reason: String },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub messages: usize,
    pub messages_without_attachments: usize,
    pub placed: usize,
    pub duplicates: usize,
    pub unsupported: usize,
    pub failed: usize,
}

impl RunSummary {
    pub fn record(&mut self, outcome: &AttachmentOutcome) {
        match outcome {
            AttachmentOutcome::Placed { .. } => self.placed += 1,
            AttachmentOutcome::SkippedDuplicate { .. } => self.duplicates += 1,
            AttachmentOutcome::SkippedUnsupportedFormat { .. } => self.unsupported += 1,
            AttachmentOutcome::Failed { .. } => self.failed += 1,
        }
    }

    pub fn log(&self) {
        info!(
            "Processed {} messages ({} without attachments): {} placed, {} duplicates, {} unsupported, {} failed",
            self.messages,
            self.messages_without_attachments,
            self.placed,
            self.duplicates,
            self.unsupported,
            self.failed
        );
    }
}

/// Routes homework attachments into assignment buckets, one at a time.
pub struct AttachmentSorter {
    categories: CategoryExtractor,
    normalizer: FilenameNormalizer,
    identities: IdentityExtractor,
    settings: SortingSettings,
}

impl AttachmentSorter {
    pub fn new(settings: SortingSettings) -> Result<Self> {
        Ok(AttachmentSorter {
            categories: CategoryExtractor::new()?,
            normalizer: FilenameNormalizer::new(&settings.no_subject_sentinel)?,
            identities: IdentityExtractor::new()?,
            settings,
        })
    }

    pub fn categorize(&self, text: &str) -> Option<Category> {
        self.categories.extract(text)
    }

    /// Decides bucket, final name and whether the attachment should be written.
    /// Only reads the store.
    pub fn decide(
        &self,
        subject: &str,
        subject_category: Option<Category>,
        declared_filename: &str,
        store: &impl BucketStore,
    ) -> std::io::Result<PlacementDecision> {
        let sanitized = sanitize(declared_filename);
        // Classify before any rename so subject text cannot leak into the filename side.
        let filename_category = self.categories.extract(&sanitized);
        let normalized = self.normalizer.repair(&sanitized, subject);

        if !self.settings.is_allowed(&normalized.filename) {
            return Ok(PlacementDecision {
                filename: normalized.filename,
                renames: normalized.renames,
                action: PlacementAction::SkipUnsupportedFormat,
            });
        }

        let bucket = resolve(subject_category, filename_category).bucket;
        let existing = store.list(&bucket.name())?;
        let action = match Deduplicator::new(&self.identities).check(&normalized.filename, &existing) {
            DedupVerdict::Unique => PlacementAction::Place { bucket },
            DedupVerdict::Duplicate { existing, reason } => PlacementAction::SkipDuplicate { bucket, existing, reason },
        };

        Ok(PlacementDecision {
            filename: normalized.filename,
            renames: normalized.renames,
            action,
        })
    }

    pub fn sort_attachment(
        &self,
        subject: &str,
        subject_category: Option<Category>,
        attachment: &RawAttachment,
        store: &mut impl BucketStore,
    ) -> AttachmentOutcome {
        let decision = match self.decide(subject, subject_category, &attachment.declared_filename, &*store) {
            Ok(decision) => decision,
            Err(e) => {
                error!("Cannot inspect target folder for {}: {}", attachment.declared_filename, e);
                return AttachmentOutcome::Failed {
                    filename: attachment.declared_filename.clone(),
                    reason: e.to_string(),
                };
            }
        };

        for rename in &decision.renames {
            match rename {
                Rename::GarbageRepaired { from, to } => info!("  [rename] meaningless filename: {} -> {}", from, to),
                Rename::IdentitySupplemented { from, to } => info!("  [rename] added sender identity: {} -> {}", from, to),
            }
        }

        let PlacementDecision { filename, action, .. } = decision;
        let bucket = match action {
            PlacementAction::SkipUnsupportedFormat => {
                warn!("  [skip] unsupported file format: {}", filename);
                return AttachmentOutcome::SkippedUnsupportedFormat { filename };
            }
            PlacementAction::SkipDuplicate { bucket, existing, reason } => {
                info!("  [skip] duplicate of {} in [{}] ({:?}): {}", existing, bucket, reason, filename);
                return AttachmentOutcome::SkippedDuplicate { bucket, filename, existing };
            }
            PlacementAction::Place { bucket } => bucket,
        };

        let bucket_name = bucket.name();
        let written = if store.exists(&bucket_name) {
            Ok(())
        } else {
            store.create(&bucket_name)
        }
        .and_then(|_| store.write(&bucket_name, &filename, &attachment.payload));

        match written {
            Ok(()) => {
                info!("  [attachment] saved to [{}]: {}", bucket, filename);
                AttachmentOutcome::Placed { bucket, filename }
            }
            Err(e) => {
                error!("  [attachment] failed to save {}: {}", filename, e);
                AttachmentOutcome::Failed { filename, reason: e.to_string() }
            }
        }
    }

    pub fn sort_message(&self, message: &Message, store: &mut impl BucketStore) -> Vec<AttachmentOutcome> {
        info!("Subject: {}", message.subject);
        let subject_category = self.categorize(&message.subject);
        if message.attachments.is_empty() {
            info!("  [no attachments]");
        }
        message
            .attachments
            .iter()
            .map(|attachment| self.sort_attachment(&message.subject, subject_category, attachment, store))
            .collect()
    }

    /// Sorts messages strictly in order; listing, deciding and writing for one
    /// attachment completes before the next one starts.
    pub fn sort_messages<'m>(
        &self,
        messages: impl IntoIterator<Item = &'m Message>,
        store: &mut impl BucketStore,
    ) -> RunSummary {
        let mut summary = RunSummary::default();
        for message in messages {
            summary.messages += 1;
            if message.attachments.is_empty() {
                summary.messages_without_attachments += 1;
            }
            for outcome in self.sort_message(message, store) {
                summary.record(&outcome);
            }
            info!("{}", "-".repeat(30));
        }
        summary
    }
}
