//! The SwiftShare REST API: wire types and the client trait.

mod http;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::staging::StagedFile;

pub use http::HttpApi;

/// Metadata of an uploaded file, as owned by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteFileRecord {
    pub id: String,
    pub name: String,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(default)]
    pub size: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clerk_id: Option<String>,
    #[serde(default)]
    pub is_public: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stored_filename: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upload_at: Option<NaiveDateTime>,
}

/// A payment record. Read-only on the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: String,
    #[serde(default)]
    pub plan_id: String,
    /// Amount in minor currency units.
    #[serde(default)]
    pub amount: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(default)]
    pub credits_added: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transactions_date: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreditsResponse {
    pub credits: u64,
}

/// Body of a successful upload.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    /// Authoritative balance after the upload, when the server reports it.
    #[serde(default)]
    pub remaining_credits: Option<u64>,
    #[serde(default)]
    pub files: Vec<RemoteFileRecord>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Body of a successful visibility toggle.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ToggleResponse {
    /// The record after the flip.
    #[serde(default)]
    pub file: Option<RemoteFileRecord>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRequest {
    pub plan_id: String,
    /// Amount in minor currency units.
    pub amount: u64,
    pub currency: String,
    pub credits: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderResponse {
    pub order_id: String,
    pub amount: u64,
    pub currency: String,
}

/// Gateway confirmation forwarded to the server for signature checking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerifyRequest {
    pub razorpay_order_id: String,
    pub razorpay_payment_id: String,
    pub razorpay_signature: String,
    #[serde(rename = "planId")]
    pub plan_id: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct VerifyResponse {
    pub success: bool,
    /// New balance after crediting, when the server reports it.
    #[serde(default)]
    pub credits: Option<u64>,
    #[serde(default)]
    pub message: Option<String>,
}

/// The transaction list arrives bare or wrapped, depending on server version.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum TransactionList {
    Bare(Vec<Transaction>),
    Wrapped {
        #[serde(alias = "data")]
        transactions: Vec<Transaction>,
    },
}

impl TransactionList {
    pub(crate) fn into_vec(self) -> Vec<Transaction> {
        match self {
            Self::Bare(list) | Self::Wrapped { transactions: list } => list,
        }
    }
}

/// Every remote operation the client performs.
///
/// Authenticated methods attach a fresh bearer token; `public_file` and
/// `download` with `public = true` send none.
#[async_trait]
pub trait SwiftShareApi: Send + Sync {
    /// GET `/users/credits`.
    async fn credits(&self) -> Result<u64>;

    /// GET `/files/my-files`.
    async fn list_files(&self) -> Result<Vec<RemoteFileRecord>>;

    /// GET `/files/{id}`.
    async fn get_file(&self, id: &str) -> Result<RemoteFileRecord>;

    /// POST `/files/upload`: one multipart request, a `files` part per file.
    async fn upload(&self, files: &[StagedFile]) -> Result<UploadResponse>;

    /// GET `/files/download/{id}`.
    async fn download(&self, id: &str, public: bool) -> Result<Bytes>;

    /// DELETE `/files/{id}`.
    async fn delete_file(&self, id: &str) -> Result<()>;

    /// PATCH `/files/{id}/toggle-public`.
    async fn toggle_public(&self, id: &str) -> Result<ToggleResponse>;

    /// GET `/files/public/{id}`.
    async fn public_file(&self, id: &str) -> Result<RemoteFileRecord>;

    /// POST `/payments/create-order`.
    async fn create_order(&self, request: &OrderRequest) -> Result<OrderResponse>;

    /// POST `/payments/verify-payment`.
    async fn verify_payment(&self, request: &VerifyRequest) -> Result<VerifyResponse>;

    /// GET `/transactions`.
    async fn transactions(&self) -> Result<Vec<Transaction>>;
}

#[cfg(test)]
pub(crate) mod fake;
