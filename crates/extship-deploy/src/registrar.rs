//! Extension registration
//!
//! Creates the extension record when no record of the same kind carries the
//! extension's title, and updates the first matching record otherwise.
//! Failures never abort the pipeline; they come back as
//! [`RegistrationOutcome::Failed`].

use extship_cms::{CmsApi, CmsError, ExtensionRecord, ExtensionScope};
use extship_core::types::KindFields;
use extship_core::DeploymentConfig;
use tracing::{info, warn};

/// Tags every extension record carries ahead of the descriptor's own
const BASE_TAGS: [&str; 2] = ["custom-field", "react"];

/// Structured description of a failed lookup, create or update
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationFailure {
    /// HTTP status, absent when no response was received
    pub status: Option<u16>,
    pub status_text: Option<String>,
    pub message: String,
}

impl From<&CmsError> for RegistrationFailure {
    fn from(err: &CmsError) -> Self {
        Self {
            status: err.status_code(),
            status_text: err.status_text().map(str::to_string),
            message: err.to_string(),
        }
    }
}

impl std::fmt::Display for RegistrationFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// What happened to the extension record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistrationOutcome {
    Created { uid: Option<String>, notice: String },
    Updated { uid: String, notice: String },
    Failed(RegistrationFailure),
}

impl RegistrationOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, RegistrationOutcome::Failed(_))
    }
}

/// Build the record for `config` with `src` as the entry-point URL
pub fn build_record(config: &DeploymentConfig, src: &str) -> ExtensionRecord {
    let mut tags: Vec<String> = BASE_TAGS.iter().map(|t| t.to_string()).collect();
    for tag in std::iter::once(config.name()).chain(config.tags().iter().map(String::as_str)) {
        if !tags.iter().any(|t| t == tag) {
            tags.push(tag.to_string());
        }
    }

    let mut record = ExtensionRecord {
        title: config.name().to_string(),
        src: src.to_string(),
        tags,
        kind: config.kind().as_str().to_string(),
        multiple: false,
        config: config.extension_config().cloned(),
        data_type: None,
        scope: None,
        default_width: None,
    };

    match config.kind_fields() {
        KindFields::Field { data_type } => {
            record.data_type = Some(data_type.clone());
        }
        KindFields::Widget {
            data_type,
            content_types,
        } => {
            record.data_type = Some(data_type.clone());
            record.scope = Some(ExtensionScope {
                content_types: content_types.clone(),
            });
        }
        KindFields::Dashboard { default_width } => {
            record.default_width = default_width.clone();
        }
    }

    record
}

/// Creates or updates the extension record
pub struct ExtensionRegistrar<'a> {
    cms: &'a dyn CmsApi,
    config: &'a DeploymentConfig,
}

impl<'a> ExtensionRegistrar<'a> {
    pub fn new(cms: &'a dyn CmsApi, config: &'a DeploymentConfig) -> Self {
        Self { cms, config }
    }

    /// Register the extension with `src` as its source URL
    pub async fn register(&self, src: &str) -> RegistrationOutcome {
        let record = build_record(self.config, src);

        match self.create_or_update(&record).await {
            Ok(outcome) => outcome,
            Err(err) => {
                warn!("Extension {} was not registered: {}", record.title, err);
                RegistrationOutcome::Failed(RegistrationFailure::from(&err))
            }
        }
    }

    async fn create_or_update(
        &self,
        record: &ExtensionRecord,
    ) -> Result<RegistrationOutcome, CmsError> {
        let matches: Vec<_> = self
            .cms
            .list_extensions(&record.kind)
            .await?
            .into_iter()
            .filter(|e| e.title == record.title)
            .collect();

        match matches.first() {
            None => {
                let ack = self.cms.create_extension(record).await?;
                info!("Extension {} created: {}", record.title, ack.notice);
                Ok(RegistrationOutcome::Created {
                    uid: ack.uid,
                    notice: ack.notice,
                })
            }
            Some(existing) => {
                if matches.len() > 1 {
                    warn!(
                        "{} {} extensions titled {}; updating {}",
                        matches.len(),
                        record.kind,
                        record.title,
                        existing.uid
                    );
                }
                let ack = self.cms.update_extension(&existing.uid, record).await?;
                info!("Extension {} updated: {}", record.title, ack.notice);
                Ok(RegistrationOutcome::Updated {
                    uid: existing.uid.clone(),
                    notice: ack.notice,
                })
            }
        }
    }
}
