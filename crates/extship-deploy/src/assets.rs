//! Asset synchronization
//!
//! Ensures the per-extension folder exists under the configured parent,
//! uploads every referenced file with bounded concurrency, rewrites the entry
//! point so each reference literal points at its uploaded URL, and finally
//! uploads the rewritten entry point into the same folder.

use camino::{Utf8Path, Utf8PathBuf};
use extship_cms::{AssetUpload, CmsApi, RemoteFolder};
use extship_core::{DeploymentConfig, ReferenceMap};
use futures::stream::{FuturesUnordered, StreamExt};
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use crate::error::{DeployError, Result};

/// Whether an upload created a new asset or replaced an existing one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadAction {
    Created,
    Updated,
}

impl std::fmt::Display for UploadAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UploadAction::Created => write!(f, "created"),
            UploadAction::Updated => write!(f, "updated"),
        }
    }
}

/// An asset uploaded during this run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedAsset {
    pub title: String,
    pub uid: String,
    pub url: String,
    pub action: UploadAction,
}

/// A reference together with the asset it was uploaded as
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedReference {
    pub key: String,
    pub literal: String,
    pub asset: UploadedAsset,
}

/// Result of a successful synchronization
#[derive(Debug, Clone)]
pub struct SyncOutcome {
    pub folder: RemoteFolder,
    /// Uploaded references, in reference-map order
    pub references: Vec<ResolvedReference>,
    pub entry_point: UploadedAsset,
    /// Literals that did not occur in the entry point
    pub unmatched_literals: Vec<String>,
}

impl SyncOutcome {
    /// Titles of every asset uploaded in this run
    pub fn uploaded_titles(&self) -> impl Iterator<Item = &str> {
        self.references
            .iter()
            .map(|r| r.asset.title.as_str())
            .chain(std::iter::once(self.entry_point.title.as_str()))
    }
}

/// Uploads a bundle's referenced assets and its entry point
pub struct AssetSynchronizer<'a> {
    cms: &'a dyn CmsApi,
    config: &'a DeploymentConfig,
}

impl<'a> AssetSynchronizer<'a> {
    pub fn new(cms: &'a dyn CmsApi, config: &'a DeploymentConfig) -> Self {
        Self { cms, config }
    }

    /// Run the whole synchronization
    pub async fn sync(&self, references: &ReferenceMap) -> Result<SyncOutcome> {
        let entry_path = self.config.entry_point_path();
        let text = tokio::fs::read_to_string(&entry_path)
            .await
            .map_err(|source| DeployError::EntryPointRead {
                path: entry_path.to_string(),
                source,
            })?;

        let folder = self.ensure_folder().await?;
        let resolved = self.upload_references(&folder.uid, references).await?;

        let (rewritten, unmatched_literals) = rewrite_references(&text, &resolved);
        for literal in &unmatched_literals {
            warn!(
                "Reference {} does not occur in {}; nothing to rewrite",
                literal, entry_path
            );
        }

        tokio::fs::write(&entry_path, &rewritten)
            .await
            .map_err(|source| DeployError::EntryPointWrite {
                path: entry_path.to_string(),
                source,
            })?;
        debug!("Rewrote {} reference(s) in {}", resolved.len(), entry_path);

        let upload = AssetUpload::new(self.config.entry_point_file_name(), rewritten);
        let entry_point = self.put_asset(&folder.uid, &upload).await?;

        Ok(SyncOutcome {
            folder,
            references: resolved,
            entry_point,
            unmatched_literals,
        })
    }

    /// Find the folder named after the extension, creating it if absent
    pub async fn ensure_folder(&self) -> Result<RemoteFolder> {
        let name = self.config.name();
        let parent = self.config.assets_folder();
        let folder_error = |source| DeployError::Folder {
            name: name.to_string(),
            source,
        };

        let existing = self.cms.list_folders(parent).await.map_err(folder_error)?;
        if let Some(folder) = existing.into_iter().find(|f| f.name == name) {
            info!("Using asset folder {} ({})", folder.name, folder.uid);
            return Ok(folder);
        }

        let folder = self
            .cms
            .create_folder(name, parent)
            .await
            .map_err(folder_error)?;
        info!("Created asset folder {} ({})", folder.name, folder.uid);
        Ok(folder)
    }

    /// Upload a local file into `folder_uid`, replacing an asset with the same title
    pub async fn upload_or_update(&self, folder_uid: &str, path: &Utf8Path) -> Result<UploadedAsset> {
        let upload = AssetUpload::from_path(path)
            .await
            .map_err(|e| DeployError::upload(path.as_str(), e))?;
        self.put_asset(folder_uid, &upload).await
    }

    /// Location of a reference's file inside the build folder
    pub fn reference_path(&self, literal: &str) -> Utf8PathBuf {
        self.config
            .build_folder()
            .join(literal.trim_start_matches('/'))
    }

    async fn upload_references(
        &self,
        folder_uid: &str,
        references: &ReferenceMap,
    ) -> Result<Vec<ResolvedReference>> {
        let semaphore = Semaphore::new(self.config.runtime().concurrency.max(1));
        let mut uploads = FuturesUnordered::new();

        for (index, (key, literal)) in references.iter().enumerate() {
            let semaphore = &semaphore;
            uploads.push(async move {
                let _permit = semaphore.acquire().await.ok();
                let path = self.reference_path(literal);
                (index, key, literal, self.upload_or_update(folder_uid, &path).await)
            });
        }

        let mut slots: Vec<Option<ResolvedReference>> = (0..references.len()).map(|_| None).collect();
        while let Some((index, key, literal, result)) = uploads.next().await {
            slots[index] = Some(ResolvedReference {
                key: key.to_string(),
                literal: literal.to_string(),
                asset: result?,
            });
        }

        Ok(slots.into_iter().flatten().collect())
    }

    async fn put_asset(&self, folder_uid: &str, upload: &AssetUpload) -> Result<UploadedAsset> {
        let title = upload.file_name();
        let existing = self
            .cms
            .find_assets(folder_uid, title)
            .await
            .map_err(|e| DeployError::upload(title, e))?;

        let (asset, action) = match existing.first() {
            Some(current) => {
                if existing.len() > 1 {
                    warn!(
                        "{} assets titled {} in folder {}; replacing {}",
                        existing.len(),
                        title,
                        folder_uid,
                        current.uid
                    );
                }
                let asset = self
                    .cms
                    .replace_asset(&current.uid, upload)
                    .await
                    .map_err(|e| DeployError::upload(title, e))?;
                (asset, UploadAction::Updated)
            }
            None => {
                let asset = self
                    .cms
                    .create_asset(folder_uid, upload)
                    .await
                    .map_err(|e| DeployError::upload(title, e))?;
                (asset, UploadAction::Created)
            }
        };

        let url = asset.url.ok_or_else(|| DeployError::MissingUrl {
            title: title.to_string(),
        })?;
        info!("Asset {} {} ({})", title, action, asset.uid);

        Ok(UploadedAsset {
            title: title.to_string(),
            uid: asset.uid,
            url,
            action,
        })
    }
}

/// Replace every occurrence of each reference literal with its asset URL
///
/// The text is scanned once, preferring the longest literal at each position.
/// Absolute URLs already in the text, including the ones written by an
/// earlier run, are copied verbatim, so a literal is never matched inside a
/// URL and rewriting an already rewritten entry point changes nothing.
/// Returns the new text and the literals that did not occur at all.
pub fn rewrite_references(text: &str, references: &[ResolvedReference]) -> (String, Vec<String>) {
    let unmatched = references
        .iter()
        .filter(|r| !text.contains(r.literal.as_str()))
        .map(|r| r.literal.clone())
        .collect();

    let mut by_length: Vec<&ResolvedReference> =
        references.iter().filter(|r| !r.literal.is_empty()).collect();
    by_length.sort_by(|a, b| b.literal.len().cmp(&a.literal.len()));

    let mut rewritten = String::with_capacity(text.len());
    let mut rest = text;
    'scan: while let Some(ch) = rest.chars().next() {
        for reference in &by_length {
            let url = reference.asset.url.as_str();
            if !url.is_empty() && rest.starts_with(url) {
                rewritten.push_str(url);
                rest = &rest[url.len()..];
                continue 'scan;
            }
        }
        for reference in &by_length {
            if let Some(after) = rest.strip_prefix(reference.literal.as_str()) {
                rewritten.push_str(&reference.asset.url);
                rest = after;
                continue 'scan;
            }
        }
        if let Some(len) = absolute_url_len(rest) {
            rewritten.push_str(&rest[..len]);
            rest = &rest[len..];
            continue;
        }
        rewritten.push(ch);
        rest = &rest[ch.len_utf8()..];
    }

    (rewritten, unmatched)
}

/// Length of the `http(s)://` URL at the start of `text`, if there is one
fn absolute_url_len(text: &str) -> Option<usize> {
    if !(text.starts_with("https://") || text.starts_with("http://")) {
        return None;
    }
    let end = text
        .find(|c: char| c.is_whitespace() || matches!(c, '"' | '\'' | '<' | '>' | '(' | ')' | '`'))
        .unwrap_or(text.len());
    Some(end)
}
