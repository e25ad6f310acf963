//! In-memory CMS used by the stage unit tests

use std::collections::HashSet;
use std::sync::Mutex;

use async_trait::async_trait;
use extship_cms::{
    AssetUpload, CmsApi, CmsError, ExtensionAck, ExtensionRecord, ExtensionSummary, RemoteAsset,
    RemoteFolder, Result,
};

#[derive(Default)]
pub(crate) struct State {
    next_uid: u32,
    folders: Vec<RemoteFolder>,
    assets: Vec<RemoteAsset>,
    contents: Vec<(String, Vec<u8>)>,
    extensions: Vec<ExtensionSummary>,
    records: Vec<(String, ExtensionRecord)>,
    calls: Vec<String>,
}

impl State {
    fn uid(&mut self, prefix: &str) -> String {
        self.next_uid += 1;
        format!("{}{}", prefix, self.next_uid)
    }
}

/// Records every call and keeps folders, assets and extensions in memory
#[derive(Default)]
pub struct FakeCms {
    pub(crate) state: Mutex<State>,
    pub fail_list_extensions: Option<u16>,
    pub fail_list_assets: Option<u16>,
    pub fail_uploads: HashSet<String>,
    pub fail_deletes: HashSet<String>,
    pub omit_urls: bool,
}

impl FakeCms {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_folder(self, uid: &str, name: &str, parent_uid: &str) -> Self {
        self.state.lock().unwrap().folders.push(RemoteFolder {
            uid: uid.to_string(),
            name: name.to_string(),
            parent_uid: Some(parent_uid.to_string()),
        });
        self
    }

    pub fn with_asset(self, uid: &str, title: &str, folder_uid: &str) -> Self {
        self.state.lock().unwrap().assets.push(RemoteAsset {
            uid: uid.to_string(),
            title: title.to_string(),
            parent_uid: Some(folder_uid.to_string()),
            url: Some(asset_url(uid, title)),
            is_dir: false,
        });
        self
    }

    pub fn with_extension(self, uid: &str, title: &str, kind: &str) -> Self {
        self.state.lock().unwrap().extensions.push(ExtensionSummary {
            uid: uid.to_string(),
            title: title.to_string(),
            kind: Some(kind.to_string()),
        });
        self
    }

    /// Calls in order, e.g. `create_asset main.js`
    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn calls_starting_with(&self, prefix: &str) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|c| c.starts_with(prefix))
            .collect()
    }

    pub fn assets(&self) -> Vec<RemoteAsset> {
        self.state.lock().unwrap().assets.clone()
    }

    pub fn content_of(&self, uid: &str) -> Option<Vec<u8>> {
        let state = self.state.lock().unwrap();
        state
            .contents
            .iter()
            .rev()
            .find(|(u, _)| u == uid)
            .map(|(_, c)| c.clone())
    }

    pub fn records(&self) -> Vec<(String, ExtensionRecord)> {
        self.state.lock().unwrap().records.clone()
    }

    fn record_call(&self, call: String) {
        self.state.lock().unwrap().calls.push(call);
    }
}

pub fn asset_url(uid: &str, title: &str) -> String {
    format!("https://assets.example.com/{}/{}", uid, title)
}

fn fail(operation: &str, status: u16) -> CmsError {
    CmsError::status(operation, status, "Simulated", Some("simulated failure".into()))
}

#[async_trait]
impl CmsApi for FakeCms {
    async fn list_folders(&self, parent_uid: &str) -> Result<Vec<RemoteFolder>> {
        self.record_call(format!("list_folders {}", parent_uid));
        let state = self.state.lock().unwrap();
        Ok(state
            .folders
            .iter()
            .filter(|f| f.parent_uid.as_deref() == Some(parent_uid))
            .cloned()
            .collect())
    }

    async fn create_folder(&self, name: &str, parent_uid: &str) -> Result<RemoteFolder> {
        self.record_call(format!("create_folder {}", name));
        let mut state = self.state.lock().unwrap();
        let folder = RemoteFolder {
            uid: state.uid("bltfolder"),
            name: name.to_string(),
            parent_uid: Some(parent_uid.to_string()),
        };
        state.folders.push(folder.clone());
        Ok(folder)
    }

    async fn find_assets(&self, folder_uid: &str, title: &str) -> Result<Vec<RemoteAsset>> {
        self.record_call(format!("find_assets {}", title));
        let state = self.state.lock().unwrap();
        Ok(state
            .assets
            .iter()
            .filter(|a| a.parent_uid.as_deref() == Some(folder_uid) && a.title == title)
            .cloned()
            .collect())
    }

    async fn list_assets(&self, folder_uid: &str) -> Result<Vec<RemoteAsset>> {
        self.record_call(format!("list_assets {}", folder_uid));
        if let Some(status) = self.fail_list_assets {
            return Err(fail("list assets", status));
        }
        let state = self.state.lock().unwrap();
        let mut entries: Vec<RemoteAsset> = state
            .assets
            .iter()
            .filter(|a| a.parent_uid.as_deref() == Some(folder_uid))
            .cloned()
            .collect();
        entries.extend(
            state
                .folders
                .iter()
                .filter(|f| f.parent_uid.as_deref() == Some(folder_uid))
                .map(|f| RemoteAsset {
                    uid: f.uid.clone(),
                    title: f.name.clone(),
                    parent_uid: f.parent_uid.clone(),
                    url: None,
                    is_dir: true,
                }),
        );
        Ok(entries)
    }

    async fn create_asset(&self, folder_uid: &str, upload: &AssetUpload) -> Result<RemoteAsset> {
        self.record_call(format!("create_asset {}", upload.file_name()));
        if self.fail_uploads.contains(upload.file_name()) {
            return Err(fail("upload asset", 500));
        }
        let mut state = self.state.lock().unwrap();
        let uid = state.uid("bltasset");
        let asset = RemoteAsset {
            url: (!self.omit_urls).then(|| asset_url(&uid, upload.file_name())),
            uid: uid.clone(),
            title: upload.file_name().to_string(),
            parent_uid: Some(folder_uid.to_string()),
            is_dir: false,
        };
        state.assets.push(asset.clone());
        state.contents.push((uid, upload.bytes().to_vec()));
        Ok(asset)
    }

    async fn replace_asset(&self, uid: &str, upload: &AssetUpload) -> Result<RemoteAsset> {
        self.record_call(format!("replace_asset {} {}", uid, upload.file_name()));
        if self.fail_uploads.contains(upload.file_name()) {
            return Err(fail("replace asset", 500));
        }
        let mut state = self.state.lock().unwrap();
        let asset = state
            .assets
            .iter()
            .find(|a| a.uid == uid)
            .cloned()
            .ok_or_else(|| fail("replace asset", 404))?;
        state.contents.push((uid.to_string(), upload.bytes().to_vec()));
        Ok(asset)
    }

    async fn delete_asset(&self, uid: &str) -> Result<String> {
        self.record_call(format!("delete_asset {}", uid));
        if self.fail_deletes.contains(uid) {
            return Err(fail("delete asset", 500));
        }
        self.state.lock().unwrap().assets.retain(|a| a.uid != uid);
        Ok("Asset deleted successfully.".to_string())
    }

    async fn list_extensions(&self, kind: &str) -> Result<Vec<ExtensionSummary>> {
        self.record_call(format!("list_extensions {}", kind));
        if let Some(status) = self.fail_list_extensions {
            return Err(fail("look up extension", status));
        }
        let state = self.state.lock().unwrap();
        Ok(state
            .extensions
            .iter()
            .filter(|e| e.kind.as_deref() == Some(kind))
            .cloned()
            .collect())
    }

    async fn create_extension(&self, record: &ExtensionRecord) -> Result<ExtensionAck> {
        self.record_call(format!("create_extension {}", record.title));
        let mut state = self.state.lock().unwrap();
        let uid = state.uid("bltext");
        state.extensions.push(ExtensionSummary {
            uid: uid.clone(),
            title: record.title.clone(),
            kind: Some(record.kind.clone()),
        });
        state.records.push((uid.clone(), record.clone()));
        Ok(ExtensionAck {
            uid: Some(uid),
            notice: "Extension created successfully.".to_string(),
        })
    }

    async fn update_extension(&self, uid: &str, record: &ExtensionRecord) -> Result<ExtensionAck> {
        self.record_call(format!("update_extension {}", uid));
        self.state
            .lock()
            .unwrap()
            .records
            .push((uid.to_string(), record.clone()));
        Ok(ExtensionAck {
            uid: Some(uid.to_string()),
            notice: "Extension updated successfully.".to_string(),
        })
    }
}

/// Resolved configuration for a bundle in `build_folder`, overlaid with `extra`
pub fn config(
    build_folder: &camino::Utf8Path,
    extra: serde_json::Value,
) -> extship_core::DeploymentConfig {
    let mut descriptor = serde_json::json!({
        "name": "MyField",
        "extension": "field",
        "type": "text",
        "buildFolder": build_folder,
        "assetsFolder": "bltparent",
        "runtime": { "concurrency": 2 }
    });
    if let (Some(base), serde_json::Value::Object(extra)) = (descriptor.as_object_mut(), extra) {
        base.extend(extra);
    }
    let descriptor: extship_core::config::Descriptor = serde_json::from_value(descriptor).unwrap();
    extship_core::DeploymentConfig::from_descriptor(descriptor, "input.json".into()).unwrap()
}

/// A temp directory holding `files` as a built bundle
pub fn bundle(files: &[(&str, &str)]) -> (tempfile::TempDir, camino::Utf8PathBuf) {
    let dir = tempfile::TempDir::new().unwrap();
    let root = camino::Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
    for (name, content) in files {
        let path = root.join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&path, content).unwrap();
    }
    (dir, root)
}
