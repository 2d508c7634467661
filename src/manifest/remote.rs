//! Remote manifest stores: an explicit URL (read-only) and a GitHub gist
//! (the default document, readable and writable).

mod security;

use super::document::{parse_manifest, render_manifest};
use crate::core::types::PackageDefinition;
use crate::error::{Result, SyncError};
use crate::project_identity;
use crate::traits::ManifestStore;
use reqwest::StatusCode;
use reqwest::blocking::{Client, RequestBuilder, Response};
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

const HTTP_TIMEOUT_SECS: u64 = 60;
const GITHUB_API_VERSION: &str = "2022-11-28";

fn http_client() -> Result<Client> {
    Client::builder()
        .user_agent(project_identity::USER_AGENT)
        .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
        .build()
        .map_err(|e| SyncError::RemoteFetchError(format!("HTTP client setup failed: {}", e)))
}

fn send(request: RequestBuilder, what: &str) -> Result<Response> {
    request
        .send()
        .map_err(|e| SyncError::RemoteFetchError(format!("{}: network error: {}", what, e)))
}

/// Manifest fetched from an explicit URL. Cannot be written back.
pub struct UrlManifestStore {
    url: String,
}

impl UrlManifestStore {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

impl ManifestStore for UrlManifestStore {
    fn describe(&self) -> String {
        self.url.clone()
    }

    fn get_packages(&self) -> Result<Vec<PackageDefinition>> {
        let url = security::checked_url(&self.url)?;

        let response = send(http_client()?.get(url), &self.url)?;
        match response.status() {
            status if status.is_success() => {}
            StatusCode::NOT_FOUND => {
                return Err(SyncError::ManifestUnavailable(format!(
                    "{} returned 404",
                    self.url
                )));
            }
            status => {
                return Err(SyncError::RemoteFetchError(format!(
                    "{} returned HTTP {}",
                    self.url, status
                )));
            }
        }

        let body = response
            .text()
            .map_err(|e| SyncError::RemoteFetchError(format!("{}: {}", self.url, e)))?;
        parse_manifest(&body, &self.url)
    }

    fn save_packages(&self, _packages: &[PackageDefinition]) -> Result<()> {
        Err(SyncError::ReadOnlyManifest(self.url.clone()))
    }
}

#[derive(Debug, Deserialize)]
struct GistResponse {
    #[serde(default)]
    files: HashMap<String, Option<GistFile>>,
}

#[derive(Debug, Deserialize)]
struct GistFile {
    content: Option<String>,
    #[serde(default)]
    truncated: bool,
    raw_url: Option<String>,
}

#[derive(Debug, PartialEq, Eq)]
enum GistContent {
    Missing,
    Inline(String),
    Truncated(String),
}

fn gist_file_content(gist: GistResponse, file_name: &str) -> GistContent {
    let Some(Some(file)) = gist.files.into_iter().find_map(|(name, file)| {
        name.eq_ignore_ascii_case(file_name).then_some(file)
    }) else {
        return GistContent::Missing;
    };

    match (file.truncated, file.raw_url, file.content) {
        (true, Some(raw_url), _) => GistContent::Truncated(raw_url),
        (_, _, Some(content)) => GistContent::Inline(content),
        (_, Some(raw_url), None) => GistContent::Truncated(raw_url),
        (_, None, None) => GistContent::Missing,
    }
}

fn gist_update_body(file_name: &str, content: &str) -> serde_json::Value {
    serde_json::json!({
        "files": {
            file_name: { "content": content }
        }
    })
}

/// The default remote document: one file inside a GitHub gist.
pub struct GistManifestStore {
    api_url: String,
    gist_id: String,
    file_name: String,
    token: Option<String>,
}

impl GistManifestStore {
    pub fn new(
        api_url: impl Into<String>,
        gist_id: impl Into<String>,
        file_name: impl Into<String>,
        token: Option<String>,
    ) -> Self {
        Self {
            api_url: api_url.into(),
            gist_id: gist_id.into(),
            file_name: file_name.into(),
            token,
        }
    }

    fn gist_url(&self) -> String {
        format!("{}/gists/{}", self.api_url.trim_end_matches('/'), self.gist_id)
    }

    fn authorized(&self, request: RequestBuilder) -> Result<RequestBuilder> {
        let token = self.token.as_deref().ok_or_else(|| {
            SyncError::MissingCredentials(format!(
                "set {} (or GITHUB_TOKEN) to a token with gist scope",
                project_identity::env_key("TOKEN")
            ))
        })?;
        Ok(request
            .bearer_auth(token)
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", GITHUB_API_VERSION))
    }

    fn check_status(&self, response: &Response) -> Result<()> {
        match response.status() {
            status if status.is_success() => Ok(()),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(SyncError::MissingCredentials(
                format!("token rejected for gist {}", self.gist_id),
            )),
            StatusCode::NOT_FOUND => Err(SyncError::ManifestUnavailable(format!(
                "gist {} not found",
                self.gist_id
            ))),
            status => Err(SyncError::RemoteFetchError(format!(
                "gist {} returned HTTP {}",
                self.gist_id, status
            ))),
        }
    }
}

impl ManifestStore for GistManifestStore {
    fn describe(&self) -> String {
        format!("gist {}/{}", self.gist_id, self.file_name)
    }

    fn get_packages(&self) -> Result<Vec<PackageDefinition>> {
        let client = http_client()?;
        let response = send(self.authorized(client.get(self.gist_url()))?, &self.describe())?;
        self.check_status(&response)?;

        let gist: GistResponse = response
            .json()
            .map_err(|e| SyncError::RemoteFetchError(format!("invalid gist response: {}", e)))?;

        let content = match gist_file_content(gist, &self.file_name) {
            GistContent::Missing => return Ok(Vec::new()),
            GistContent::Inline(content) => content,
            GistContent::Truncated(raw_url) => {
                let raw = send(self.authorized(client.get(&raw_url))?, &raw_url)?;
                self.check_status(&raw)?;
                raw.text()
                    .map_err(|e| SyncError::RemoteFetchError(format!("{}: {}", raw_url, e)))?
            }
        };

        parse_manifest(&content, &self.describe())
    }

    fn save_packages(&self, packages: &[PackageDefinition]) -> Result<()> {
        let content = render_manifest(packages)?;
        let body = gist_update_body(&self.file_name, &content);

        let request = self.authorized(http_client()?.patch(self.gist_url()))?.json(&body);
        let response = send(request, &self.describe())?;
        self.check_status(&response)
    }
}
