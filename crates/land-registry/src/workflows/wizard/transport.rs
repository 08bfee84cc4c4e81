//! Capabilities standing in for the document store and the registry back office.
//!
//! The simulated implementations only wait; tests swap in deterministic fakes.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::hash_map::DefaultHasher;
use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use super::domain::{DocumentKind, FileDescriptor, FlowKind};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("transport unavailable: {0}")]
    Unavailable(String),
    #[error("rejected by registry: {0}")]
    Rejected(String),
}

/// Moves one file to content-addressed storage, one progress tick at a time.
#[async_trait]
pub trait UploadTransport: Send + Sync {
    /// Sends the chunk that brings the upload to `progress` percent.
    async fn send_chunk(&self, file: &FileDescriptor, progress: u8) -> Result<(), TransportError>;

    /// Seals the upload and returns its content address.
    async fn finalize(&self, file: &FileDescriptor) -> Result<String, TransportError>;
}

/// Delivers a finished flow to the registry.
#[async_trait]
pub trait SubmissionTransport: Send + Sync {
    async fn submit(
        &self,
        payload: &SubmissionPayload,
    ) -> Result<SubmissionReceipt, TransportError>;
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubmittedDocument {
    pub document: DocumentKind,
    pub file_name: String,
    pub content_address: String,
}

/// Everything the final step hands to the registry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubmissionPayload {
    pub flow: FlowKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub property_id: Option<u32>,
    pub fields: BTreeMap<String, String>,
    pub documents: Vec<SubmittedDocument>,
    pub submitted_at: DateTime<Utc>,
}

impl SubmissionPayload {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmissionReceipt {
    pub reference: String,
    pub accepted_at: DateTime<Utc>,
}

static RECEIPT_SEQUENCE: AtomicU64 = AtomicU64::new(1);
static CONTENT_SEQUENCE: AtomicU64 = AtomicU64::new(1);

pub(crate) fn next_receipt(flow: FlowKind) -> SubmissionReceipt {
    let id = RECEIPT_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    let prefix = match flow {
        FlowKind::Registration => "REG",
        FlowKind::Transfer => "TRF",
    };
    SubmissionReceipt {
        reference: format!("{prefix}-{id:06}"),
        accepted_at: Utc::now(),
    }
}

/// `Qm` followed by 44 hex characters, shaped like a content identifier.
pub fn synthetic_content_address(file: &FileDescriptor) -> String {
    let mut seed = CONTENT_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    let mut address = String::with_capacity(48);
    address.push_str("Qm");
    while address.len() < 46 {
        let mut hasher = DefaultHasher::new();
        file.hash(&mut hasher);
        seed.hash(&mut hasher);
        seed = hasher.finish();
        address.push_str(&format!("{seed:016x}"));
    }
    address.truncate(46);
    address
}

/// Waits a fixed tick per chunk and never fails.
#[derive(Debug, Clone)]
pub struct SimulatedUploadTransport {
    tick: Duration,
}

impl SimulatedUploadTransport {
    pub fn new(tick: Duration) -> Self {
        Self { tick }
    }
}

#[async_trait]
impl UploadTransport for SimulatedUploadTransport {
    async fn send_chunk(
        &self,
        _file: &FileDescriptor,
        _progress: u8,
    ) -> Result<(), TransportError> {
        tokio::time::sleep(self.tick).await;
        Ok(())
    }

    async fn finalize(&self, file: &FileDescriptor) -> Result<String, TransportError> {
        Ok(synthetic_content_address(file))
    }
}

/// Waits a fixed delay and accepts every submission.
#[derive(Debug, Clone)]
pub struct SimulatedSubmissionTransport {
    delay: Duration,
}

impl SimulatedSubmissionTransport {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

#[async_trait]
impl SubmissionTransport for SimulatedSubmissionTransport {
    async fn submit(
        &self,
        payload: &SubmissionPayload,
    ) -> Result<SubmissionReceipt, TransportError> {
        tokio::time::sleep(self.delay).await;
        Ok(next_receipt(payload.flow))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_addresses_look_like_cids_and_differ() {
        let file = FileDescriptor::new("deed.pdf", 1_024, "application/pdf");
        let first = synthetic_content_address(&file);
        let second = synthetic_content_address(&file);
        assert_eq!(first.len(), 46);
        assert!(first.starts_with("Qm"));
        assert_ne!(first, second);
    }

    #[test]
    fn receipts_are_prefixed_by_flow() {
        assert!(next_receipt(FlowKind::Registration).reference.starts_with("REG-"));
        assert!(next_receipt(FlowKind::Transfer).reference.starts_with("TRF-"));
    }

    #[tokio::test(start_paused = true)]
    async fn simulated_submission_waits_for_its_delay() {
        let transport = SimulatedSubmissionTransport::new(Duration::from_millis(2000));
        let payload = SubmissionPayload {
            flow: FlowKind::Registration,
            property_id: None,
            fields: BTreeMap::new(),
            documents: Vec::new(),
            submitted_at: Utc::now(),
        };

        let started = tokio::time::Instant::now();
        let receipt = transport.submit(&payload).await.expect("always accepts");
        assert!(started.elapsed() >= Duration::from_millis(2000));
        assert!(receipt.reference.starts_with("REG-"));
    }
}
