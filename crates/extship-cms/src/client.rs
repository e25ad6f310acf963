//! HTTPS implementation of [`CmsApi`]

use std::fmt;
use std::future::Future;

use async_trait::async_trait;
use extship_core::retry::{RetryExecutor, TracingObserver, TransientPredicate};
use extship_core::types::{RetryPolicy, RuntimeSettings};
use extship_core::CmsCredentials;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION};
use reqwest::multipart::{Form, Part};
use reqwest::{RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::{debug, trace};

use crate::api::CmsApi;
use crate::error::{CmsError, Result};
use crate::schema::{
    AssetEntry, AssetListResponse, AssetResponse, ErrorBody, ExtensionEntry,
    ExtensionListResponse, ExtensionResponse, NoticeResponse,
};
use crate::types::{
    AssetUpload, ExtensionAck, ExtensionRecord, ExtensionSummary, RemoteAsset, RemoteFolder,
};

/// Page size for listing endpoints
const PAGE_LIMIT: usize = 100;

const ASSETS_PATH: &str = "/v3/assets";
const FOLDERS_PATH: &str = "/v3/assets/folders";
const EXTENSIONS_PATH: &str = "/v3/extensions";

/// Client for the CMS management API
///
/// Every request carries the `api_key` and `authorization` headers and the
/// configured timeout. GET, PUT and DELETE are retried on transient failures;
/// POST is sent exactly once.
pub struct CmsClient {
    http: reqwest::Client,
    base_url: String,
    retry: RetryPolicy,
}

impl fmt::Debug for CmsClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CmsClient")
            .field("base_url", &self.base_url)
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}

impl CmsClient {
    /// Create a client from credentials and runtime settings
    pub fn new(credentials: &CmsCredentials, settings: &RuntimeSettings) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            HeaderName::from_static("api_key"),
            sensitive_header("api_key", credentials.api_key())?,
        );
        headers.insert(
            AUTHORIZATION,
            sensitive_header("authorization", credentials.management_token())?,
        );

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .user_agent(settings.user_agent.as_str())
            .timeout(settings.timeout())
            .build()
            .map_err(|e| CmsError::transport("build HTTP client", e))?;

        Ok(Self {
            http,
            base_url: credentials.base_url().to_string(),
            retry: settings.retry.clone(),
        })
    }

    /// Base URL requests are sent to
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str, params: &[(&str, String)]) -> Result<Url> {
        let raw = format!("{}{}", self.base_url, path);
        let parsed = if params.is_empty() {
            Url::parse(&raw)
        } else {
            Url::parse_with_params(&raw, params)
        };
        parsed.map_err(|e| CmsError::config(format!("invalid URL {}: {}", raw, e)))
    }

    /// Run an idempotent call under the retry policy
    async fn with_retry<T, F, Fut>(&self, operation: &str, op: F) -> Result<T>
    where
        F: FnMut() -> Fut + Send,
        Fut: Future<Output = Result<T>> + Send,
        T: Send,
    {
        RetryExecutor::new(self.retry.clone())
            .with_predicate(TransientPredicate)
            .with_observer(TracingObserver::new(operation))
            .execute(op)
            .await
            .map_err(CmsError::from)
    }

    async fn get_json<T>(&self, operation: &str, url: Url) -> Result<T>
    where
        T: DeserializeOwned + Send,
    {
        self.with_retry(operation, || {
            let url = url.clone();
            async move {
                debug!("GET {}", url);
                let response = send(operation, self.http.get(url)).await?;
                decode(operation, response).await
            }
        })
        .await
    }

    /// Follow `skip`/`limit` paging until a short page
    async fn get_paged<R, E>(
        &self,
        operation: &str,
        path: &str,
        params: &[(&str, String)],
        items: fn(R) -> Vec<E>,
    ) -> Result<Vec<E>>
    where
        R: DeserializeOwned + Send,
        E: Send,
    {
        let mut all = Vec::new();
        let mut skip = 0usize;

        loop {
            let mut query = params.to_vec();
            query.push(("limit", PAGE_LIMIT.to_string()));
            query.push(("skip", skip.to_string()));

            let page = items(self.get_json::<R>(operation, self.url(path, &query)?).await?);
            let count = page.len();
            all.extend(page);

            if count < PAGE_LIMIT {
                break;
            }
            skip += count;
            trace!(operation, skip, "fetching next page");
        }

        Ok(all)
    }
}

#[async_trait]
impl CmsApi for CmsClient {
    async fn list_folders(&self, parent_uid: &str) -> Result<Vec<RemoteFolder>> {
        let operation = "list folders";
        let params = [
            ("include_folders", "true".to_string()),
            ("query", json!({ "is_dir": true }).to_string()),
            ("folder", parent_uid.to_string()),
        ];
        let entries = self
            .get_paged(operation, ASSETS_PATH, &params, |r: AssetListResponse| r.assets)
            .await?;

        entries
            .into_iter()
            .filter(|e| e.is_dir)
            .map(|e| e.into_folder(operation))
            .collect()
    }

    async fn create_folder(&self, name: &str, parent_uid: &str) -> Result<RemoteFolder> {
        let operation = "create folder";
        let body = json!({ "asset": { "name": name, "parent_uid": parent_uid } });
        let url = self.url(FOLDERS_PATH, &[])?;
        debug!("POST {}", url);

        let response = send(operation, self.http.post(url).json(&body)).await?;
        decode::<AssetResponse>(operation, response)
            .await?
            .into_entry(operation)?
            .into_folder(operation)
    }

    async fn find_assets(&self, folder_uid: &str, title: &str) -> Result<Vec<RemoteAsset>> {
        let operation = "find asset";
        let params = [
            ("folder", folder_uid.to_string()),
            ("query", json!({ "title": title }).to_string()),
        ];
        let entries = self
            .get_paged(operation, ASSETS_PATH, &params, |r: AssetListResponse| r.assets)
            .await?;

        let mut found = Vec::new();
        for entry in entries.into_iter().filter(|e| !e.is_dir) {
            let asset = entry.into_asset(operation)?;
            if asset.title == title {
                found.push(asset);
            }
        }
        Ok(found)
    }

    async fn list_assets(&self, folder_uid: &str) -> Result<Vec<RemoteAsset>> {
        let operation = "list assets";
        let params = [
            ("include_folders", "true".to_string()),
            ("folder", folder_uid.to_string()),
        ];
        self.get_paged(operation, ASSETS_PATH, &params, |r: AssetListResponse| r.assets)
            .await?
            .into_iter()
            .map(|e| e.into_asset(operation))
            .collect()
    }

    async fn create_asset(&self, folder_uid: &str, upload: &AssetUpload) -> Result<RemoteAsset> {
        let operation = "upload asset";
        let url = self.url(ASSETS_PATH, &[])?;
        debug!("POST {} ({})", url, upload.file_name());

        let form = upload_form(operation, upload, Some(folder_uid))?;
        let response = send(operation, self.http.post(url).multipart(form)).await?;
        asset_from(operation, response).await
    }

    async fn replace_asset(&self, uid: &str, upload: &AssetUpload) -> Result<RemoteAsset> {
        let operation = "replace asset";
        let url = self.url(&format!("{}/{}", ASSETS_PATH, uid), &[])?;

        self.with_retry(operation, || {
            let url = url.clone();
            async move {
                debug!("PUT {} ({})", url, upload.file_name());
                let form = upload_form(operation, upload, None)?;
                let response = send(operation, self.http.put(url).multipart(form)).await?;
                asset_from(operation, response).await
            }
        })
        .await
    }

    async fn delete_asset(&self, uid: &str) -> Result<String> {
        let operation = "delete asset";
        let url = self.url(&format!("{}/{}", ASSETS_PATH, uid), &[])?;

        let body: NoticeResponse = self
            .with_retry(operation, || {
                let url = url.clone();
                async move {
                    debug!("DELETE {}", url);
                    let response = send(operation, self.http.delete(url)).await?;
                    decode(operation, response).await
                }
            })
            .await?;

        Ok(body
            .notice
            .unwrap_or_else(|| "Asset deleted successfully.".to_string()))
    }

    async fn list_extensions(&self, kind: &str) -> Result<Vec<ExtensionSummary>> {
        let operation = "look up extension";
        let params = [
            ("query", json!({ "type": kind }).to_string()),
            ("only[BASE][]", "title".to_string()),
        ];
        self.get_paged(operation, EXTENSIONS_PATH, &params, |r: ExtensionListResponse| {
            r.extensions
        })
        .await?
        .into_iter()
        .map(|e: ExtensionEntry| e.into_summary(operation))
        .collect()
    }

    async fn create_extension(&self, record: &ExtensionRecord) -> Result<ExtensionAck> {
        let operation = "create extension";
        let url = self.url(EXTENSIONS_PATH, &[])?;
        debug!("POST {}", url);

        let body = json!({ "extension": record });
        let response = send(operation, self.http.post(url).json(&body)).await?;
        Ok(decode::<ExtensionResponse>(operation, response)
            .await?
            .into_ack("Extension created successfully."))
    }

    async fn update_extension(&self, uid: &str, record: &ExtensionRecord) -> Result<ExtensionAck> {
        let operation = "update extension";
        let url = self.url(&format!("{}/{}", EXTENSIONS_PATH, uid), &[])?;
        let body = json!({ "extension": record });

        let response: ExtensionResponse = self
            .with_retry(operation, || {
                let url = url.clone();
                let body = &body;
                async move {
                    debug!("PUT {}", url);
                    let response = send(operation, self.http.put(url).json(body)).await?;
                    decode(operation, response).await
                }
            })
            .await?;

        Ok(response.into_ack("Extension updated successfully."))
    }
}

fn sensitive_header(name: &str, value: &str) -> Result<HeaderValue> {
    let mut header = HeaderValue::from_str(value)
        .map_err(|_| CmsError::config(format!("{} contains characters not allowed in a header", name)))?;
    header.set_sensitive(true);
    Ok(header)
}

fn upload_form(operation: &str, upload: &AssetUpload, parent_uid: Option<&str>) -> Result<Form> {
    let part = Part::bytes(upload.bytes().to_vec())
        .file_name(upload.file_name().to_string())
        .mime_str(upload.mime_type())
        .map_err(|e| CmsError::transport(operation, e))?;

    let form = Form::new().part("asset[upload]", part);
    Ok(match parent_uid {
        Some(parent) => form.text("asset[parent_uid]", parent.to_string()),
        None => form,
    })
}

async fn send(operation: &str, request: RequestBuilder) -> Result<Response> {
    request
        .send()
        .await
        .map_err(|e| CmsError::transport(operation, e))
}

/// Map a response to `T`, or to a status error carrying the API's message
async fn decode<T: DeserializeOwned>(operation: &str, response: Response) -> Result<T> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| CmsError::transport(operation, e))?;

    if !status.is_success() {
        let message = serde_json::from_str::<ErrorBody>(&body)
            .ok()
            .and_then(|b| b.message());
        return Err(CmsError::status(
            operation,
            status.as_u16(),
            status.canonical_reason().unwrap_or("Unknown Status"),
            message,
        ));
    }

    serde_json::from_str(&body).map_err(|e| CmsError::decode(operation, e.to_string()))
}

async fn asset_from(operation: &str, response: Response) -> Result<RemoteAsset> {
    let entry: AssetEntry = decode::<AssetResponse>(operation, response)
        .await?
        .into_entry(operation)?;
    entry.into_asset(operation)
}
