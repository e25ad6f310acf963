//! CMS API trait definition

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{
    AssetUpload, ExtensionAck, ExtensionRecord, ExtensionSummary, RemoteAsset, RemoteFolder,
};

/// Operations the deployment pipeline needs from the CMS
#[async_trait]
pub trait CmsApi: Send + Sync {
    /// List the folders directly under `parent_uid`
    async fn list_folders(&self, parent_uid: &str) -> Result<Vec<RemoteFolder>>;

    /// Create a folder named `name` under `parent_uid`
    async fn create_folder(&self, name: &str, parent_uid: &str) -> Result<RemoteFolder>;

    /// Assets in `folder_uid` titled exactly `title`
    async fn find_assets(&self, folder_uid: &str, title: &str) -> Result<Vec<RemoteAsset>>;

    /// Every entry in `folder_uid`, sub-folders included
    async fn list_assets(&self, folder_uid: &str) -> Result<Vec<RemoteAsset>>;

    /// Upload a new asset into `folder_uid`
    async fn create_asset(&self, folder_uid: &str, upload: &AssetUpload) -> Result<RemoteAsset>;

    /// Replace the binary of an existing asset, keeping its uid
    async fn replace_asset(&self, uid: &str, upload: &AssetUpload) -> Result<RemoteAsset>;

    /// Delete an asset, returning the API notice
    async fn delete_asset(&self, uid: &str) -> Result<String>;

    /// Extensions of the given kind (`field`, `widget`, `dashboard`)
    async fn list_extensions(&self, kind: &str) -> Result<Vec<ExtensionSummary>>;

    /// Create an extension record
    async fn create_extension(&self, record: &ExtensionRecord) -> Result<ExtensionAck>;

    /// Update the extension record `uid`
    async fn update_extension(&self, uid: &str, record: &ExtensionRecord) -> Result<ExtensionAck>;
}
