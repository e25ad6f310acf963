//! # extship-cms
//!
//! Client for the slice of the content-management REST API that extship
//! consumes: asset folders, assets and extension records.
//!
//! - [`CmsApi`] is the seam the deployment pipeline talks to
//! - [`CmsClient`] implements it over HTTPS with `reqwest`
//! - [`schema`] holds the response schemas, validated at the boundary

mod api;
mod client;
pub mod error;
pub mod schema;
mod types;

pub use api::CmsApi;
pub use client::CmsClient;
pub use error::{CmsError, Result};
pub use types::{
    AssetUpload, ExtensionAck, ExtensionRecord, ExtensionScope, ExtensionSummary, RemoteAsset,
    RemoteFolder,
};
