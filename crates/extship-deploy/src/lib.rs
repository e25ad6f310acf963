//! # extship-deploy
//!
//! Deployment pipeline publishing a built bundle as a CMS extension:
//! - [`assets`]: destination folder, per-reference uploads, entry-point rewrite
//! - [`registrar`]: create-or-update of the extension record
//! - [`purge`]: best-effort removal of stale assets
//! - [`pipeline`]: the stage sequence and its [`PipelineReport`]

pub mod assets;
pub mod error;
pub mod pipeline;
pub mod purge;
pub mod registrar;

#[cfg(test)]
mod testing;

pub use assets::{AssetSynchronizer, ResolvedReference, SyncOutcome, UploadAction, UploadedAsset};
pub use error::{DeployError, Result};
pub use pipeline::{Pipeline, PipelineReport, PipelineStage};
pub use purge::{KeepSet, PurgeAgent, PurgeFailure, PurgeOutcome};
pub use registrar::{ExtensionRegistrar, RegistrationFailure, RegistrationOutcome};
