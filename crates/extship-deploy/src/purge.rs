//! Stale asset purge
//!
//! Deletes every file in the destination folder that this deployment does
//! not reference. Directory entries are never touched. Each deletion is
//! attempted independently and failures are collected, not raised.

use std::collections::BTreeSet;

use extship_cms::CmsApi;
use tracing::{info, warn};

/// A deletion that did not go through
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurgeFailure {
    pub uid: String,
    pub title: String,
    pub message: String,
}

/// Result of the purge stage
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PurgeOutcome {
    /// Purging is disabled for this deployment
    Skipped,
    /// The folder was listed and stale assets were processed
    Completed {
        deleted: Vec<String>,
        failed: Vec<PurgeFailure>,
    },
    /// The folder could not be listed; nothing was deleted
    ListingFailed { message: String },
}

impl PurgeOutcome {
    /// Number of problems recorded by the stage
    pub fn problems(&self) -> usize {
        match self {
            PurgeOutcome::Skipped => 0,
            PurgeOutcome::Completed { failed, .. } => failed.len(),
            PurgeOutcome::ListingFailed { .. } => 1,
        }
    }

    /// Titles deleted by the stage
    pub fn deleted(&self) -> &[String] {
        match self {
            PurgeOutcome::Completed { deleted, .. } => deleted,
            _ => &[],
        }
    }
}

/// Titles that survive a purge
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeepSet(BTreeSet<String>);

impl KeepSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn keep(&mut self, title: impl Into<String>) {
        self.0.insert(title.into());
    }

    pub fn contains(&self, title: &str) -> bool {
        self.0.contains(title)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for KeepSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl<S: Into<String>> Extend<S> for KeepSet {
    fn extend<I: IntoIterator<Item = S>>(&mut self, iter: I) {
        self.0.extend(iter.into_iter().map(Into::into));
    }
}

/// Deletes assets outside a keep set
pub struct PurgeAgent<'a> {
    cms: &'a dyn CmsApi,
}

impl<'a> PurgeAgent<'a> {
    pub fn new(cms: &'a dyn CmsApi) -> Self {
        Self { cms }
    }

    /// Delete every file in `folder_uid` whose title is not kept
    pub async fn purge(&self, folder_uid: &str, keep: &KeepSet) -> PurgeOutcome {
        let entries = match self.cms.list_assets(folder_uid).await {
            Ok(entries) => entries,
            Err(err) => {
                warn!("Purge skipped, folder {} could not be listed: {}", folder_uid, err);
                return PurgeOutcome::ListingFailed {
                    message: err.to_string(),
                };
            }
        };

        let mut deleted = Vec::new();
        let mut failed = Vec::new();

        for asset in entries
            .into_iter()
            .filter(|a| !a.is_dir && !keep.contains(&a.title))
        {
            match self.cms.delete_asset(&asset.uid).await {
                Ok(notice) => {
                    info!("Deleted stale asset {} ({}): {}", asset.title, asset.uid, notice);
                    deleted.push(asset.title);
                }
                Err(err) => {
                    warn!("Failed to delete {} ({}): {}", asset.title, asset.uid, err);
                    failed.push(PurgeFailure {
                        uid: asset.uid,
                        title: asset.title,
                        message: err.to_string(),
                    });
                }
            }
        }

        if deleted.is_empty() && failed.is_empty() {
            info!("No stale assets in folder {}", folder_uid);
        }

        PurgeOutcome::Completed { deleted, failed }
    }
}
