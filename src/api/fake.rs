//! In-memory stand-in for the server, used by unit tests.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;

use super::{
    OrderRequest, OrderResponse, RemoteFileRecord, SwiftShareApi, ToggleResponse, Transaction,
    UploadResponse, VerifyRequest, VerifyResponse,
};
use crate::error::{Error, Result};
use crate::staging::StagedFile;

#[derive(Default)]
struct ServerState {
    credits: u64,
    files: Vec<(RemoteFileRecord, Bytes)>,
    transactions: Vec<Transaction>,
}

/// Knobs controlling how the fake answers.
#[derive(Default)]
pub struct Behaviour {
    pub fail_credits: bool,
    /// Scripted balance answers, each delivered after its delay. When empty
    /// the balance endpoint reports the server's current credits.
    pub credit_replies: VecDeque<(u64, Duration)>,
    pub upload_error: Option<(u16, Option<String>)>,
    pub report_remaining: bool,
    pub fail_toggle: bool,
    pub echo_toggled_file: bool,
    pub verify_success: bool,
    pub report_verified_credits: bool,
}

pub struct FakeApi {
    state: Mutex<ServerState>,
    pub behaviour: Mutex<Behaviour>,
    pub upload_calls: AtomicUsize,
    pub credit_calls: AtomicUsize,
}

fn server_error(status: u16, message: &str) -> Error {
    Error::Api {
        status,
        message: Some(message.to_string()),
    }
}

impl FakeApi {
    pub fn new(credits: u64) -> Self {
        Self {
            state: Mutex::new(ServerState {
                credits,
                ..ServerState::default()
            }),
            behaviour: Mutex::new(Behaviour {
                report_remaining: true,
                verify_success: true,
                report_verified_credits: true,
                ..Behaviour::default()
            }),
            upload_calls: AtomicUsize::new(0),
            credit_calls: AtomicUsize::new(0),
        }
    }

    pub fn with_file(self, id: &str, name: &str, contents: &'static [u8], public: bool) -> Self {
        self.state.lock().unwrap().files.push((
            RemoteFileRecord {
                id: id.to_string(),
                name: name.to_string(),
                content_type: None,
                size: contents.len() as u64,
                clerk_id: Some("user_1".to_string()),
                is_public: public,
                file_location: None,
                stored_filename: None,
                upload_at: None,
            },
            Bytes::from_static(contents),
        ));
        self
    }

    pub fn set_credits(&self, credits: u64) {
        self.state.lock().unwrap().credits = credits;
    }

    pub fn server_credits(&self) -> u64 {
        self.state.lock().unwrap().credits
    }

    pub fn server_files(&self) -> Vec<RemoteFileRecord> {
        self.state
            .lock()
            .unwrap()
            .files
            .iter()
            .map(|(r, _)| r.clone())
            .collect()
    }

    pub fn behave(&self, f: impl FnOnce(&mut Behaviour)) {
        f(&mut self.behaviour.lock().unwrap());
    }
}

#[async_trait]
impl SwiftShareApi for FakeApi {
    async fn credits(&self) -> Result<u64> {
        self.credit_calls.fetch_add(1, Ordering::SeqCst);
        let reply = {
            let mut behaviour = self.behaviour.lock().unwrap();
            if behaviour.fail_credits {
                return Err(server_error(500, "credits unavailable"));
            }
            behaviour.credit_replies.pop_front()
        };
        match reply {
            Some((credits, delay)) => {
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                Ok(credits)
            }
            None => Ok(self.server_credits()),
        }
    }

    async fn list_files(&self) -> Result<Vec<RemoteFileRecord>> {
        Ok(self.server_files())
    }

    async fn get_file(&self, id: &str) -> Result<RemoteFileRecord> {
        self.server_files()
            .into_iter()
            .find(|f| f.id == id)
            .ok_or_else(|| server_error(404, "File not found"))
    }

    async fn upload(&self, files: &[StagedFile]) -> Result<UploadResponse> {
        self.upload_calls.fetch_add(1, Ordering::SeqCst);
        let behaviour = self.behaviour.lock().unwrap();
        if let Some((status, message)) = behaviour.upload_error.clone() {
            return Err(Error::Api { status, message });
        }
        let mut state = self.state.lock().unwrap();
        let needed = files.len() as u64;
        if needed > state.credits {
            return Err(server_error(400, "Insufficient credits"));
        }
        state.credits -= needed;
        let mut uploaded = Vec::new();
        for file in files {
            let id = format!("srv-{}", state.files.len() + 1);
            let contents = match &file.source {
                crate::staging::FileSource::Memory(b) => b.clone(),
                crate::staging::FileSource::Path(_) => Bytes::new(),
            };
            let record = RemoteFileRecord {
                id,
                name: file.name.clone(),
                content_type: None,
                size: file.size,
                clerk_id: Some("user_1".to_string()),
                is_public: false,
                file_location: None,
                stored_filename: None,
                upload_at: None,
            };
            uploaded.push(record.clone());
            state.files.push((record, contents));
        }
        Ok(UploadResponse {
            remaining_credits: behaviour.report_remaining.then_some(state.credits),
            files: uploaded,
            message: Some("Files uploaded successfully".to_string()),
        })
    }

    async fn download(&self, id: &str, public: bool) -> Result<Bytes> {
        let state = self.state.lock().unwrap();
        let (record, bytes) = state
            .files
            .iter()
            .find(|(r, _)| r.id == id)
            .ok_or_else(|| server_error(404, "File not found or not accessible"))?;
        if public && !record.is_public {
            return Err(server_error(403, "File is private"));
        }
        Ok(bytes.clone())
    }

    async fn delete_file(&self, id: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        let before = state.files.len();
        state.files.retain(|(r, _)| r.id != id);
        if state.files.len() == before {
            return Err(server_error(404, "File not found or unauthorized"));
        }
        Ok(())
    }

    async fn toggle_public(&self, id: &str) -> Result<ToggleResponse> {
        let behaviour = self.behaviour.lock().unwrap();
        if behaviour.fail_toggle {
            return Err(server_error(500, "Failed to toggle file"));
        }
        let mut state = self.state.lock().unwrap();
        let (record, _) = state
            .files
            .iter_mut()
            .find(|(r, _)| r.id == id)
            .ok_or_else(|| server_error(404, "File not found"))?;
        record.is_public = !record.is_public;
        Ok(ToggleResponse {
            file: behaviour.echo_toggled_file.then(|| record.clone()),
            message: None,
        })
    }

    async fn public_file(&self, id: &str) -> Result<RemoteFileRecord> {
        let record = self.get_file(id).await?;
        if record.is_public {
            Ok(record)
        } else {
            Err(server_error(403, "File is private"))
        }
    }

    async fn create_order(&self, request: &OrderRequest) -> Result<OrderResponse> {
        let mut state = self.state.lock().unwrap();
        let n = state.transactions.len() + 1;
        let order_id = format!("order_{n}");
        state.transactions.push(Transaction {
            id: format!("tx{n}"),
            plan_id: request.plan_id.clone(),
            amount: request.amount,
            currency: Some(request.currency.clone()),
            credits_added: 0,
            payment_id: None,
            order_id: Some(order_id.clone()),
            status: Some("PENDING".to_string()),
            transactions_date: None,
        });
        Ok(OrderResponse {
            order_id,
            amount: request.amount,
            currency: request.currency.clone(),
        })
    }

    async fn verify_payment(&self, request: &VerifyRequest) -> Result<VerifyResponse> {
        let behaviour = self.behaviour.lock().unwrap();
        if !behaviour.verify_success {
            return Ok(VerifyResponse {
                success: false,
                credits: None,
                message: Some("Payment verification failed".to_string()),
            });
        }
        let added = crate::payments::Plan::find(&request.plan_id)
            .map(|p| p.credits)
            .ok_or_else(|| server_error(400, "Invalid Plan Selected"))?;
        let mut state = self.state.lock().unwrap();
        state.credits += added;
        let credits = state.credits;
        if let Some(tx) = state
            .transactions
            .iter_mut()
            .find(|t| t.order_id.as_deref() == Some(&request.razorpay_order_id))
        {
            tx.status = Some("SUCCESS".to_string());
            tx.credits_added = added;
            tx.payment_id = Some(request.razorpay_payment_id.clone());
        }
        Ok(VerifyResponse {
            success: true,
            credits: behaviour.report_verified_credits.then_some(credits),
            message: None,
        })
    }

    async fn transactions(&self) -> Result<Vec<Transaction>> {
        Ok(self.state.lock().unwrap().transactions.clone())
    }
}
