//! Deployment descriptor loading and parsing

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use std::fs;
use tracing::debug;

use crate::error::{Error, Result};
use crate::references::{ReferenceMap, ReferencePattern};
use crate::types::{ExtensionKind, KindFields, RuntimeSettings};

/// Entry point used when the descriptor does not name one
pub const DEFAULT_ENTRY_POINT: &str = "index.html";

/// Raw deployment descriptor as written on disk
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Descriptor {
    /// Extension title, also the name of the per-extension asset folder
    #[serde(default)]
    pub name: Option<String>,

    /// Extension kind (`field`, `widget`, `dashboard`)
    #[serde(default)]
    pub extension: Option<String>,

    /// Data type stored by field and widget extensions
    #[serde(default, rename = "type")]
    pub data_type: Option<String>,

    /// Content types a widget is scoped to
    #[serde(default)]
    pub scope: Vec<String>,

    /// Default width of a dashboard extension
    #[serde(default)]
    pub default_width: Option<String>,

    /// Folder holding the built bundle
    #[serde(default)]
    pub build_folder: Option<Utf8PathBuf>,

    /// Build log scanned for references
    #[serde(default)]
    pub build_log: Option<Utf8PathBuf>,

    /// Reference-extraction pattern
    #[serde(default)]
    pub replacement: Option<String>,

    /// Entry point path relative to the build folder
    #[serde(default)]
    pub entry_point: Option<String>,

    /// Parent asset folder uid
    #[serde(default)]
    pub assets_folder: Option<String>,

    /// Delete stale assets after deploying
    #[serde(default)]
    pub purge: bool,

    /// Print progress for every stage
    #[serde(default)]
    pub verbose: bool,

    /// Extension configuration passed through to the CMS
    #[serde(default)]
    pub config: Option<serde_json::Value>,

    /// Tags added to the extension record
    #[serde(default)]
    pub tags: Vec<String>,

    /// Timeouts, concurrency and retry
    #[serde(default)]
    pub runtime: RuntimeSettings,

    /// Load this descriptor instead
    #[serde(default, rename = "ref")]
    pub reference: Option<Utf8PathBuf>,
}

impl Descriptor {
    /// Parse a descriptor from JSON text
    pub fn from_json(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Read and parse a descriptor file
    pub fn read(path: &Utf8Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::descriptor_not_found(path.as_str())
            } else {
                Error::Io(e)
            }
        })?;
        Self::from_json(&content)
            .map_err(|e| Error::invalid_config(format!("Failed to parse {}: {}", path, e)))
    }
}

/// Fully resolved deployment configuration
///
/// Constructed once per run from a [`Descriptor`]; immutable afterwards.
#[derive(Debug, Clone)]
pub struct DeploymentConfig {
    name: String,
    kind_fields: KindFields,
    build_folder: Utf8PathBuf,
    entry_point: String,
    build_log: Option<Utf8PathBuf>,
    pattern: Option<ReferencePattern>,
    assets_folder: String,
    purge: bool,
    verbose: bool,
    extension_config: Option<serde_json::Value>,
    tags: Vec<String>,
    runtime: RuntimeSettings,
    descriptor_path: Utf8PathBuf,
}

impl DeploymentConfig {
    /// Load a descriptor file, following one level of `ref` indirection
    pub fn load(path: &Utf8Path) -> Result<Self> {
        let mut descriptor = Descriptor::read(path)?;
        let mut descriptor_path = path.to_owned();

        if let Some(target) = descriptor.reference.take() {
            debug!("Descriptor {} refers to {}", path, target);
            descriptor = Descriptor::read(&target)?;
            if descriptor.reference.is_some() {
                return Err(Error::invalid_config(format!(
                    "{} is itself a reference; only one level of 'ref' is followed",
                    target
                )));
            }
            descriptor_path = target;
        }

        Self::from_descriptor(descriptor, descriptor_path)
    }

    /// Validate a parsed descriptor and resolve defaults
    pub fn from_descriptor(descriptor: Descriptor, descriptor_path: Utf8PathBuf) -> Result<Self> {
        let name = required(descriptor.name, "name")?;
        let kind: ExtensionKind = required(descriptor.extension, "extension")?.parse()?;
        let build_folder = descriptor
            .build_folder
            .filter(|p| !p.as_str().trim().is_empty())
            .ok_or_else(|| Error::missing_field("buildFolder"))?;
        let assets_folder = required(descriptor.assets_folder, "assetsFolder")?;

        let kind_fields = match kind {
            ExtensionKind::Field => KindFields::Field {
                data_type: required(descriptor.data_type, "type")?,
            },
            ExtensionKind::Widget => KindFields::Widget {
                data_type: required(descriptor.data_type, "type")?,
                content_types: descriptor.scope,
            },
            ExtensionKind::Dashboard => KindFields::Dashboard {
                default_width: descriptor.default_width,
            },
        };

        let pattern = match (&descriptor.build_log, descriptor.replacement.as_deref()) {
            (_, Some(p)) => Some(ReferencePattern::new(p)?),
            (Some(_), None) => return Err(Error::missing_field("replacement")),
            (None, None) => None,
        };

        let entry_point = descriptor
            .entry_point
            .map(|e| e.trim_start_matches('/').to_string())
            .filter(|e| !e.is_empty())
            .unwrap_or_else(|| DEFAULT_ENTRY_POINT.to_string());

        if descriptor.runtime.concurrency == 0 {
            return Err(Error::invalid_config("runtime.concurrency must be at least 1"));
        }
        if descriptor.runtime.retry.max_attempts == 0 {
            return Err(Error::invalid_config(
                "runtime.retry.maxAttempts must be at least 1",
            ));
        }

        Ok(Self {
            name,
            kind_fields,
            build_folder,
            entry_point,
            build_log: descriptor.build_log,
            pattern,
            assets_folder,
            purge: descriptor.purge,
            verbose: descriptor.verbose,
            extension_config: descriptor.config,
            tags: descriptor.tags,
            runtime: descriptor.runtime,
            descriptor_path,
        })
    }

    /// Turn on verbose output regardless of the descriptor
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose |= verbose;
        self
    }

    /// Scan the build log for references
    ///
    /// Without a build log the map is empty.
    pub fn scan_references(&self) -> Result<ReferenceMap> {
        match (&self.build_log, &self.pattern) {
            (Some(log), Some(pattern)) => {
                let text = fs::read_to_string(log).map_err(|e| {
                    Error::invalid_config(format!("Failed to read build log {}: {}", log, e))
                })?;
                Ok(pattern.scan(&text))
            }
            _ => Ok(ReferenceMap::new()),
        }
    }

    /// Extension title
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Extension kind
    pub fn kind(&self) -> ExtensionKind {
        self.kind_fields.kind()
    }

    /// Kind-specific attributes
    pub fn kind_fields(&self) -> &KindFields {
        &self.kind_fields
    }

    /// Folder holding the built bundle
    pub fn build_folder(&self) -> &Utf8Path {
        &self.build_folder
    }

    /// Entry point path relative to the build folder
    pub fn entry_point(&self) -> &str {
        &self.entry_point
    }

    /// Entry point location on disk
    pub fn entry_point_path(&self) -> Utf8PathBuf {
        self.build_folder.join(&self.entry_point)
    }

    /// Entry point file name, as titled in the CMS
    pub fn entry_point_file_name(&self) -> &str {
        Utf8Path::new(&self.entry_point)
            .file_name()
            .unwrap_or(&self.entry_point)
    }

    /// Build log path, if any
    pub fn build_log(&self) -> Option<&Utf8Path> {
        self.build_log.as_deref()
    }

    /// Reference pattern, if any
    pub fn pattern(&self) -> Option<&ReferencePattern> {
        self.pattern.as_ref()
    }

    /// Parent asset folder uid
    pub fn assets_folder(&self) -> &str {
        &self.assets_folder
    }

    /// Whether stale assets are purged
    pub fn purge(&self) -> bool {
        self.purge
    }

    /// Whether progress is printed for every stage
    pub fn verbose(&self) -> bool {
        self.verbose
    }

    /// Extension configuration passed through to the CMS
    pub fn extension_config(&self) -> Option<&serde_json::Value> {
        self.extension_config.as_ref()
    }

    /// Extra tags for the extension record
    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    /// Runtime settings for remote calls
    pub fn runtime(&self) -> &RuntimeSettings {
        &self.runtime
    }

    /// Descriptor the configuration was loaded from
    pub fn descriptor_path(&self) -> &Utf8Path {
        &self.descriptor_path
    }
}

fn required(value: Option<String>, field: &str) -> Result<String> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| Error::missing_field(field))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn utf8_dir(dir: &TempDir) -> Utf8PathBuf {
        Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap()
    }

    fn parse(json: &str) -> Result<DeploymentConfig> {
        DeploymentConfig::from_descriptor(
            Descriptor::from_json(json)?,
            Utf8PathBuf::from("input.json"),
        )
    }

    #[test]
    fn test_parse_field_descriptor() {
        let config = parse(
            r#"{
                "name": "MyField",
                "extension": "field",
                "type": "text",
                "buildFolder": "build",
                "assetsFolder": "blt0001",
                "buildLog": "build.log",
                "replacement": "static/js/([\\w.]+\\.js)",
                "purge": true
            }"#,
        )
        .unwrap();

        assert_eq!(config.name(), "MyField");
        assert_eq!(config.kind(), ExtensionKind::Field);
        assert_eq!(
            config.kind_fields(),
            &KindFields::Field {
                data_type: "text".into()
            }
        );
        assert_eq!(config.entry_point(), DEFAULT_ENTRY_POINT);
        assert_eq!(config.entry_point_path(), Utf8PathBuf::from("build/index.html"));
        assert_eq!(config.assets_folder(), "blt0001");
        assert!(config.purge());
        assert!(!config.verbose());
        assert!(config.pattern().is_some());
        assert_eq!(config.runtime(), &RuntimeSettings::default());
    }

    #[test]
    fn test_parse_widget_descriptor() {
        let config = parse(
            r#"{
                "name": "Related",
                "extension": "widget",
                "type": "text",
                "scope": ["article", "page"],
                "buildFolder": "dist",
                "assetsFolder": "blt0001",
                "tags": ["sidebar"],
                "config": { "apiUrl": "https://example.com" }
            }"#,
        )
        .unwrap();

        assert_eq!(
            config.kind_fields(),
            &KindFields::Widget {
                data_type: "text".into(),
                content_types: vec!["article".into(), "page".into()],
            }
        );
        assert_eq!(config.tags(), ["sidebar".to_string()]);
        assert_eq!(
            config.extension_config().unwrap()["apiUrl"],
            "https://example.com"
        );
        assert!(config.pattern().is_none());
    }

    #[test]
    fn test_parse_dashboard_descriptor() {
        let config = parse(
            r#"{
                "name": "Stats",
                "extension": "dashboard",
                "defaultWidth": "full",
                "buildFolder": "dist",
                "entryPoint": "/app/main.html",
                "assetsFolder": "blt0001"
            }"#,
        )
        .unwrap();

        assert_eq!(
            config.kind_fields(),
            &KindFields::Dashboard {
                default_width: Some("full".into())
            }
        );
        assert_eq!(config.entry_point(), "app/main.html");
        assert_eq!(config.entry_point_file_name(), "main.html");
    }

    #[test]
    fn test_missing_required_fields() {
        let err = parse(r#"{ "extension": "field", "type": "text" }"#).unwrap_err();
        assert!(matches!(err, Error::MissingField { ref field } if field == "name"));

        let err = parse(
            r#"{ "name": "X", "extension": "field", "buildFolder": "b", "assetsFolder": "a" }"#,
        )
        .unwrap_err();
        assert!(matches!(err, Error::MissingField { ref field } if field == "type"));

        let err = parse(r#"{ "name": "X", "extension": "dashboard", "assetsFolder": "a" }"#)
            .unwrap_err();
        assert!(matches!(err, Error::MissingField { ref field } if field == "buildFolder"));
    }

    #[test]
    fn test_unknown_kind() {
        let err = parse(
            r#"{ "name": "X", "extension": "rte", "buildFolder": "b", "assetsFolder": "a" }"#,
        )
        .unwrap_err();
        assert!(matches!(err, Error::InvalidExtensionKind { .. }));
    }

    #[test]
    fn test_build_log_requires_pattern() {
        let err = parse(
            r#"{ "name": "X", "extension": "dashboard", "buildFolder": "b",
                 "assetsFolder": "a", "buildLog": "build.log" }"#,
        )
        .unwrap_err();
        assert!(matches!(err, Error::MissingField { ref field } if field == "replacement"));
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        let err = parse(
            r#"{ "name": "X", "extension": "dashboard", "buildFolder": "b",
                 "assetsFolder": "a", "runtime": { "concurrency": 0 } }"#,
        )
        .unwrap_err();
        assert!(matches!(err, Error::InvalidConfig { .. }));
    }

    #[test]
    fn test_with_verbose_only_turns_on() {
        let config = parse(
            r#"{ "name": "X", "extension": "dashboard", "buildFolder": "b",
                 "assetsFolder": "a", "verbose": true }"#,
        )
        .unwrap();
        assert!(config.clone().with_verbose(false).verbose());

        let quiet = parse(
            r#"{ "name": "X", "extension": "dashboard", "buildFolder": "b", "assetsFolder": "a" }"#,
        )
        .unwrap();
        assert!(!quiet.clone().with_verbose(false).verbose());
        assert!(quiet.with_verbose(true).verbose());
    }

    #[test]
    fn test_load_missing_file() {
        let err = DeploymentConfig::load(Utf8Path::new("/nonexistent/input.json")).unwrap_err();
        assert!(matches!(err, Error::DescriptorNotFound { .. }));
    }

    #[test]
    fn test_load_invalid_json() {
        let dir = TempDir::new().unwrap();
        let path = utf8_dir(&dir).join("input.json");
        fs::write(&path, "{ not json").unwrap();

        let err = DeploymentConfig::load(&path).unwrap_err();
        assert!(matches!(err, Error::InvalidConfig { .. }));
    }

    #[test]
    fn test_load_follows_ref() {
        let dir = TempDir::new().unwrap();
        let root = utf8_dir(&dir);
        let target = root.join("real.json");
        fs::write(
            &target,
            r#"{ "name": "Real", "extension": "dashboard", "buildFolder": "b", "assetsFolder": "a" }"#,
        )
        .unwrap();
        let pointer = root.join("input.json");
        fs::write(
            &pointer,
            format!(r#"{{ "name": "Ignored", "ref": "{}" }}"#, target),
        )
        .unwrap();

        let config = DeploymentConfig::load(&pointer).unwrap();
        assert_eq!(config.name(), "Real");
        assert_eq!(config.descriptor_path(), target.as_path());
    }

    #[test]
    fn test_load_rejects_chained_ref() {
        let dir = TempDir::new().unwrap();
        let root = utf8_dir(&dir);
        let second = root.join("second.json");
        fs::write(&second, format!(r#"{{ "ref": "{}" }}"#, root.join("third.json"))).unwrap();
        let first = root.join("first.json");
        fs::write(&first, format!(r#"{{ "ref": "{}" }}"#, second)).unwrap();

        let err = DeploymentConfig::load(&first).unwrap_err();
        assert!(err.to_string().contains("only one level"));
    }

    #[test]
    fn test_scan_references_from_build_log() {
        let dir = TempDir::new().unwrap();
        let root = utf8_dir(&dir);
        let log = root.join("build.log");
        fs::write(&log, "  12 kB  build/main.a1b2.js\n  3 kB build/main.c3d4.css\n").unwrap();

        let json = serde_json::json!({
            "name": "MyField",
            "extension": "field",
            "type": "text",
            "buildFolder": root.join("build"),
            "assetsFolder": "blt0001",
            "buildLog": log,
            "replacement": r"(main\.\w+\.(?:js|css))"
        });
        let config = DeploymentConfig::from_descriptor(
            serde_json::from_value(json).unwrap(),
            root.join("input.json"),
        )
        .unwrap();

        let refs = config.scan_references().unwrap();
        assert_eq!(refs.len(), 2);
        assert_eq!(refs.get("main.a1b2.js"), Some("main.a1b2.js"));
    }

    #[test]
    fn test_scan_references_without_log_is_empty() {
        let config = parse(
            r#"{ "name": "X", "extension": "dashboard", "buildFolder": "b", "assetsFolder": "a" }"#,
        )
        .unwrap();
        assert!(config.scan_references().unwrap().is_empty());
    }
}
