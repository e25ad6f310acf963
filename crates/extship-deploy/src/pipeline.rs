//! Pipeline orchestration
//!
//! Runs the stages in a fixed order:
//!
//! ```text
//! Idle -> ResolvingReferences -> SynchronizingAssets -> RegisteringExtension
//!      -> Purging | PurgeSkipped -> Done
//! ```
//!
//! Reference resolution and asset synchronization failures move the pipeline
//! to `Failed` and are returned as errors. Registration and purge failures are
//! recorded in the [`PipelineReport`] and the run continues.

use std::fmt;

use extship_cms::{CmsApi, RemoteFolder};
use extship_core::{DeploymentConfig, ReferenceMap};
use tracing::info;

use crate::assets::{AssetSynchronizer, ResolvedReference, UploadedAsset};
use crate::error::{DeployError, Result};
use crate::purge::{KeepSet, PurgeAgent, PurgeOutcome};
use crate::registrar::{ExtensionRegistrar, RegistrationOutcome};

/// Pipeline state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Idle,
    ResolvingReferences,
    SynchronizingAssets,
    RegisteringExtension,
    Purging,
    PurgeSkipped,
    Done,
    Failed,
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PipelineStage::Idle => "idle",
            PipelineStage::ResolvingReferences => "resolving references",
            PipelineStage::SynchronizingAssets => "synchronizing assets",
            PipelineStage::RegisteringExtension => "registering extension",
            PipelineStage::Purging => "purging",
            PipelineStage::PurgeSkipped => "purge skipped",
            PipelineStage::Done => "done",
            PipelineStage::Failed => "failed",
        };
        write!(f, "{}", name)
    }
}

/// Structured result of a completed run
#[derive(Debug, Clone)]
pub struct PipelineReport {
    pub references: ReferenceMap,
    pub folder: RemoteFolder,
    pub assets: Vec<ResolvedReference>,
    pub entry_point: UploadedAsset,
    pub unmatched_literals: Vec<String>,
    pub registration: RegistrationOutcome,
    pub purge: PurgeOutcome,
    /// Every stage the run passed through, `Idle` first
    pub stages: Vec<PipelineStage>,
}

impl PipelineReport {
    /// URL of the uploaded entry point, the extension's source
    pub fn entry_point_url(&self) -> &str {
        &self.entry_point.url
    }

    /// Count of non-fatal problems: unmatched literals, a failed
    /// registration and purge failures
    pub fn problems(&self) -> usize {
        self.unmatched_literals.len()
            + usize::from(self.registration.is_failed())
            + self.purge.problems()
    }
}

/// Sequences the deployment stages for one configuration
pub struct Pipeline<'a> {
    cms: &'a dyn CmsApi,
    config: &'a DeploymentConfig,
    stages: Vec<PipelineStage>,
}

impl<'a> Pipeline<'a> {
    pub fn new(cms: &'a dyn CmsApi, config: &'a DeploymentConfig) -> Self {
        Self {
            cms,
            config,
            stages: vec![PipelineStage::Idle],
        }
    }

    /// Current stage
    pub fn stage(&self) -> PipelineStage {
        self.stages
            .last()
            .copied()
            .unwrap_or(PipelineStage::Idle)
    }

    /// Stages visited so far
    pub fn stages(&self) -> &[PipelineStage] {
        &self.stages
    }

    fn advance(&mut self, next: PipelineStage) {
        info!("{} -> {}", self.stage(), next);
        self.stages.push(next);
    }

    fn fail(&mut self, err: DeployError) -> DeployError {
        self.advance(PipelineStage::Failed);
        err
    }

    /// Run every stage
    pub async fn run(&mut self) -> Result<PipelineReport> {
        self.advance(PipelineStage::ResolvingReferences);
        let references = match self.config.scan_references() {
            Ok(references) => references,
            Err(e) => return Err(self.fail(DeployError::References(e))),
        };
        info!("Resolved {} reference(s)", references.len());

        self.advance(PipelineStage::SynchronizingAssets);
        let sync = match AssetSynchronizer::new(self.cms, self.config)
            .sync(&references)
            .await
        {
            Ok(sync) => sync,
            Err(e) => return Err(self.fail(e)),
        };
        info!(
            "Uploaded {} asset(s) and entry point {}",
            sync.references.len(),
            sync.entry_point.url
        );

        self.advance(PipelineStage::RegisteringExtension);
        let registration = ExtensionRegistrar::new(self.cms, self.config)
            .register(&sync.entry_point.url)
            .await;

        let purge = if self.config.purge() {
            self.advance(PipelineStage::Purging);
            let mut keep = KeepSet::new();
            keep.keep(self.config.entry_point_file_name());
            keep.extend(references.keys());
            keep.extend(sync.uploaded_titles());
            PurgeAgent::new(self.cms).purge(&sync.folder.uid, &keep).await
        } else {
            self.advance(PipelineStage::PurgeSkipped);
            PurgeOutcome::Skipped
        };

        self.advance(PipelineStage::Done);

        Ok(PipelineReport {
            references,
            folder: sync.folder,
            assets: sync.references,
            entry_point: sync.entry_point,
            unmatched_literals: sync.unmatched_literals,
            registration,
            purge,
            stages: self.stages.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{bundle, config, FakeCms};
    use serde_json::json;

    fn field_bundle() -> (tempfile::TempDir, camino::Utf8PathBuf) {
        bundle(&[
            ("index.html", r#"<script src="main.a1b2.js"></script>"#),
            ("main.a1b2.js", "console.log('field')"),
            ("build.log", "File sizes after gzip:\n  41.2 kB  build/main.a1b2.js\n"),
        ])
    }

    fn field_config(root: &camino::Utf8Path, purge: bool) -> DeploymentConfig {
        config(
            root,
            json!({
                "buildLog": root.join("build.log"),
                "replacement": r"(main\.[0-9a-f]+\.js)",
                "purge": purge
            }),
        )
    }

    #[tokio::test]
    async fn test_stage_sequence_without_purge() {
        let (_dir, root) = field_bundle();
        let config = field_config(&root, false);
        let cms = FakeCms::new();

        let mut pipeline = Pipeline::new(&cms, &config);
        let report = pipeline.run().await.unwrap();

        assert_eq!(
            report.stages,
            vec![
                PipelineStage::Idle,
                PipelineStage::ResolvingReferences,
                PipelineStage::SynchronizingAssets,
                PipelineStage::RegisteringExtension,
                PipelineStage::PurgeSkipped,
                PipelineStage::Done,
            ]
        );
        assert_eq!(report.purge, PurgeOutcome::Skipped);
        assert!(cms.calls_starting_with("list_assets").is_empty());
        assert_eq!(report.problems(), 0);
    }

    #[tokio::test]
    async fn test_registration_uses_entry_point_url() {
        let (_dir, root) = field_bundle();
        let config = field_config(&root, false);
        let cms = FakeCms::new();

        let report = Pipeline::new(&cms, &config).run().await.unwrap();

        let records = cms.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].1.src, report.entry_point_url());
        assert_eq!(records[0].1.kind, "field");
    }

    #[tokio::test]
    async fn test_purge_keeps_current_deployment() {
        let (_dir, root) = field_bundle();
        let config = field_config(&root, true);
        let cms = FakeCms::new()
            .with_folder("bltf", "MyField", "bltparent")
            .with_asset("bltold", "main.0000.js", "bltf")
            .with_asset("bltidx", "index.html", "bltf");

        let report = Pipeline::new(&cms, &config).run().await.unwrap();

        assert_eq!(report.purge.deleted(), ["main.0000.js".to_string()]);
        assert_eq!(report.entry_point.uid, "bltidx");
        assert!(report.stages.contains(&PipelineStage::Purging));
    }

    #[tokio::test]
    async fn test_rerun_without_rebuild_keeps_entry_point_intact() {
        let (_dir, root) = field_bundle();
        let config = field_config(&root, true);
        let cms = FakeCms::new();

        let first = Pipeline::new(&cms, &config).run().await.unwrap();
        let after_first = std::fs::read_to_string(root.join("index.html")).unwrap();
        let second = Pipeline::new(&cms, &config).run().await.unwrap();
        let after_second = std::fs::read_to_string(root.join("index.html")).unwrap();

        let url = &second.assets[0].asset.url;
        assert_eq!(after_second, after_first);
        assert_eq!(after_second, format!(r#"<script src="{}"></script>"#, url));
        assert_eq!(second.entry_point.uid, first.entry_point.uid);
        assert_eq!(second.entry_point.action, crate::UploadAction::Updated);
        assert_eq!(
            cms.content_of(&second.entry_point.uid).unwrap(),
            after_second.into_bytes()
        );
        assert_eq!(second.problems(), 0);
        assert!(second.purge.deleted().is_empty());
    }

    #[tokio::test]
    async fn test_registration_failure_is_not_fatal() {
        let (_dir, root) = field_bundle();
        let config = field_config(&root, true);
        let cms = FakeCms {
            fail_list_extensions: Some(500),
            ..FakeCms::default()
        };

        let report = Pipeline::new(&cms, &config).run().await.unwrap();

        assert!(report.registration.is_failed());
        assert_eq!(report.problems(), 1);
        assert_eq!(report.stages.last(), Some(&PipelineStage::Done));
    }

    #[tokio::test]
    async fn test_upload_failure_moves_to_failed() {
        let (_dir, root) = field_bundle();
        let config = field_config(&root, true);
        let mut cms = FakeCms::new();
        cms.fail_uploads.insert("main.a1b2.js".to_string());

        let mut pipeline = Pipeline::new(&cms, &config);
        let err = pipeline.run().await.unwrap_err();

        assert!(matches!(err, DeployError::Upload { .. }));
        assert_eq!(pipeline.stage(), PipelineStage::Failed);
        assert!(cms.calls_starting_with("list_extensions").is_empty());
    }

    #[tokio::test]
    async fn test_unreadable_build_log_fails_resolution() {
        let (_dir, root) = bundle(&[("index.html", "")]);
        let config = field_config(&root, false);
        let cms = FakeCms::new();

        let mut pipeline = Pipeline::new(&cms, &config);
        let err = pipeline.run().await.unwrap_err();

        assert!(matches!(err, DeployError::References(_)));
        assert_eq!(
            pipeline.stages(),
            [
                PipelineStage::Idle,
                PipelineStage::ResolvingReferences,
                PipelineStage::Failed
            ]
        );
        assert!(cms.calls().is_empty());
    }
}
