//! `reqwest` implementation of [`SwiftShareApi`].

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use reqwest::{Method, RequestBuilder, Response};
use serde::Deserialize;
use serde::de::DeserializeOwned;

use super::{
    CreditsResponse, OrderRequest, OrderResponse, RemoteFileRecord, SwiftShareApi,
    ToggleResponse, Transaction, TransactionList, UploadResponse, VerifyRequest, VerifyResponse,
};
use crate::auth::TokenProvider;
use crate::config::ApiConfig;
use crate::error::{Error, Result};
use crate::fs::{FileSystem, TokioFileSystem};
use crate::staging::StagedFile;

/// Builds a configured HTTP client for API requests.
fn build_http_client(timeout: Duration) -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .pool_idle_timeout(Duration::from_secs(60))
        .tcp_keepalive(Duration::from_secs(30))
        .build()
}

/// Error body shape used by the server: `{"error": ...}` or `{"message": ...}`.
#[derive(Deserialize)]
struct ErrorBody {
    error: Option<String>,
    message: Option<String>,
}

/// Extracts the human-readable message from an error response body.
fn error_message(body: &str) -> Option<String> {
    let body = body.trim();
    if body.is_empty() {
        return None;
    }
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(parsed) => parsed.error.or(parsed.message),
        // Some endpoints answer with a bare string
        Err(_) if !body.starts_with('{') && !body.starts_with('<') => Some(body.to_string()),
        Err(_) => None,
    }
}

/// HTTP client for the SwiftShare REST API.
#[derive(Clone)]
pub struct HttpApi {
    http: reqwest::Client,
    base_url: String,
    tokens: Arc<dyn TokenProvider>,
    fs: Arc<dyn FileSystem>,
}

impl HttpApi {
    /// Creates a client for `config.base_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &ApiConfig, tokens: Arc<dyn TokenProvider>) -> Result<Self> {
        Ok(Self {
            http: build_http_client(config.timeout())?,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            tokens,
            fs: Arc::new(TokioFileSystem::new()),
        })
    }

    /// Replaces the file system used to read path-backed staged files.
    #[must_use]
    pub fn with_fs(mut self, fs: Arc<dyn FileSystem>) -> Self {
        self.fs = fs;
        self
    }

    /// Returns the base URL endpoints are resolved against.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Starts a request carrying a fresh bearer token.
    async fn authed(&self, method: Method, path: &str) -> Result<RequestBuilder> {
        let token = self.tokens.token().await?;
        Ok(self.http.request(method, self.url(path)).bearer_auth(token))
    }

    fn public(&self, method: Method, path: &str) -> RequestBuilder {
        self.http.request(method, self.url(path))
    }

    /// Sends the request and turns non-2xx answers into [`Error::Api`].
    async fn send(request: RequestBuilder) -> Result<Response> {
        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        let message = error_message(&body);
        log::debug!("Request failed with {status}: {body}");
        Err(Error::Api {
            status: status.as_u16(),
            message,
        })
    }

    async fn json<T: DeserializeOwned>(request: RequestBuilder) -> Result<T> {
        Ok(Self::send(request).await?.json().await?)
    }
}

#[async_trait]
impl SwiftShareApi for HttpApi {
    async fn credits(&self) -> Result<u64> {
        let request = self.authed(Method::GET, "/users/credits").await?;
        let body: CreditsResponse = Self::json(request).await?;
        Ok(body.credits)
    }

    async fn list_files(&self) -> Result<Vec<RemoteFileRecord>> {
        Self::json(self.authed(Method::GET, "/files/my-files").await?).await
    }

    async fn get_file(&self, id: &str) -> Result<RemoteFileRecord> {
        Self::json(self.authed(Method::GET, &format!("/files/{id}")).await?).await
    }

    async fn upload(&self, files: &[StagedFile]) -> Result<UploadResponse> {
        let mut form = Form::new();
        for file in files {
            let contents = file.contents(self.fs.as_ref()).await?;
            let part = Part::bytes(contents.to_vec()).file_name(file.name.clone());
            form = form.part("files", part);
        }
        log::info!("Uploading {} file(s)", files.len());
        let request = self
            .authed(Method::POST, "/files/upload")
            .await?
            .multipart(form);
        Self::json(request).await
    }

    async fn download(&self, id: &str, public: bool) -> Result<Bytes> {
        let path = format!("/files/download/{id}");
        let request = if public {
            self.public(Method::GET, &path)
        } else {
            self.authed(Method::GET, &path).await?
        };
        Ok(Self::send(request).await?.bytes().await?)
    }

    async fn delete_file(&self, id: &str) -> Result<()> {
        Self::send(self.authed(Method::DELETE, &format!("/files/{id}")).await?).await?;
        Ok(())
    }

    async fn toggle_public(&self, id: &str) -> Result<ToggleResponse> {
        let request = self
            .authed(Method::PATCH, &format!("/files/{id}/toggle-public"))
            .await?
            .json(&serde_json::json!({}));
        let response = Self::send(request).await?;
        // Older servers answer with an empty body
        let body = response.bytes().await?;
        if body.is_empty() {
            return Ok(ToggleResponse::default());
        }
        Ok(serde_json::from_slice(&body).unwrap_or_else(|e| {
            log::debug!("Ignoring unreadable toggle response for {id}: {e}");
            ToggleResponse::default()
        }))
    }

    async fn public_file(&self, id: &str) -> Result<RemoteFileRecord> {
        Self::json(self.public(Method::GET, &format!("/files/public/{id}"))).await
    }

    async fn create_order(&self, request: &OrderRequest) -> Result<OrderResponse> {
        let builder = self
            .authed(Method::POST, "/payments/create-order")
            .await?
            .json(request);
        Self::json(builder).await
    }

    async fn verify_payment(&self, request: &VerifyRequest) -> Result<VerifyResponse> {
        let builder = self
            .authed(Method::POST, "/payments/verify-payment")
            .await?
            .json(request);
        Self::json(builder).await
    }

    async fn transactions(&self) -> Result<Vec<Transaction>> {
        let list: TransactionList =
            Self::json(self.authed(Method::GET, "/transactions").await?).await?;
        Ok(list.into_vec())
    }
}
