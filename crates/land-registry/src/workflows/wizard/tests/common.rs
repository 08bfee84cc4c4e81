use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::workflows::wizard::transport::synthetic_content_address;
use crate::workflows::wizard::{
    DocumentKind, FileDescriptor, FlowBlueprint, FlowCollaborators, FlowSettings, Navigator,
    Notification, NotificationSink, PropertyContext, Severity, SubmissionFlow, SubmissionGating,
    SubmissionPayload, SubmissionReceipt, SubmissionTransport, TransportError, UploadTransport,
};

pub(super) fn pdf(name: &str) -> FileDescriptor {
    FileDescriptor::new(name, 250_000, "application/pdf")
}

pub(super) fn property_context() -> PropertyContext {
    PropertyContext {
        property_id: 1,
        title: "Residential Plot - Colombo 07".to_string(),
        plot_number: "COL-07-2024-001".to_string(),
        current_owner: "John Doe".to_string(),
        token_id: "0x1234...5678".to_string(),
    }
}

/// Completes every chunk immediately.
pub(super) struct InstantUploads;

#[async_trait]
impl UploadTransport for InstantUploads {
    async fn send_chunk(
        &self,
        _file: &FileDescriptor,
        _progress: u8,
    ) -> Result<(), TransportError> {
        Ok(())
    }

    async fn finalize(&self, file: &FileDescriptor) -> Result<String, TransportError> {
        Ok(synthetic_content_address(file))
    }
}

/// Fails the first chunk at or beyond `fail_at` percent.
pub(super) struct FailingUploads {
    pub(super) fail_at: u8,
}

#[async_trait]
impl UploadTransport for FailingUploads {
    async fn send_chunk(&self, _file: &FileDescriptor, progress: u8) -> Result<(), TransportError> {
        if progress >= self.fail_at {
            return Err(TransportError::Unavailable("storage node offline".to_string()));
        }
        Ok(())
    }

    async fn finalize(&self, file: &FileDescriptor) -> Result<String, TransportError> {
        Ok(synthetic_content_address(file))
    }
}

#[derive(Default)]
pub(super) struct RecordingSubmissions {
    payloads: Mutex<Vec<SubmissionPayload>>,
    failure: Mutex<Option<TransportError>>,
    delay: Option<Duration>,
}

impl RecordingSubmissions {
    pub(super) fn slow(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    pub(super) fn fail_next(&self, error: TransportError) {
        *self.failure.lock().expect("failure mutex poisoned") = Some(error);
    }

    pub(super) fn payloads(&self) -> Vec<SubmissionPayload> {
        self.payloads.lock().expect("payload mutex poisoned").clone()
    }

    pub(super) fn calls(&self) -> usize {
        self.payloads().len()
    }
}

#[async_trait]
impl SubmissionTransport for RecordingSubmissions {
    async fn submit(
        &self,
        payload: &SubmissionPayload,
    ) -> Result<SubmissionReceipt, TransportError> {
        self.payloads
            .lock()
            .expect("payload mutex poisoned")
            .push(payload.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let failure = self.failure.lock().expect("failure mutex poisoned").take();
        match failure {
            Some(error) => Err(error),
            None => Ok(SubmissionReceipt {
                reference: format!("TEST-{:03}", self.calls()),
                accepted_at: chrono::Utc::now(),
            }),
        }
    }
}

#[derive(Default)]
pub(super) struct RecordingNotifier {
    notifications: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub(super) fn notifications(&self) -> Vec<Notification> {
        self.notifications
            .lock()
            .expect("notifier mutex poisoned")
            .clone()
    }

    pub(super) fn with_severity(&self, severity: Severity) -> Vec<String> {
        self.notifications()
            .into_iter()
            .filter(|notification| notification.severity == severity)
            .map(|notification| notification.message)
            .collect()
    }
}

impl NotificationSink for RecordingNotifier {
    fn notify(&self, notification: Notification) {
        self.notifications
            .lock()
            .expect("notifier mutex poisoned")
            .push(notification);
    }
}

#[derive(Default)]
pub(super) struct RecordingNavigator {
    destinations: Mutex<Vec<String>>,
}

impl RecordingNavigator {
    pub(super) fn destinations(&self) -> Vec<String> {
        self.destinations
            .lock()
            .expect("navigator mutex poisoned")
            .clone()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, destination: &str) {
        self.destinations
            .lock()
            .expect("navigator mutex poisoned")
            .push(destination.to_string());
    }
}

pub(super) struct Harness {
    pub(super) flow: Arc<SubmissionFlow>,
    pub(super) submissions: Arc<RecordingSubmissions>,
    pub(super) notifier: Arc<RecordingNotifier>,
    pub(super) navigator: Arc<RecordingNavigator>,
}

pub(super) fn harness(
    blueprint: FlowBlueprint,
    gating: SubmissionGating,
    uploads: Arc<dyn UploadTransport>,
    submissions: RecordingSubmissions,
) -> Harness {
    let submissions = Arc::new(submissions);
    let notifier = Arc::new(RecordingNotifier::default());
    let navigator = Arc::new(RecordingNavigator::default());
    let settings = FlowSettings {
        gating,
        ..FlowSettings::default()
    };
    let flow = SubmissionFlow::new(
        blueprint,
        settings,
        FlowCollaborators {
            uploads,
            submissions: submissions.clone(),
            notifier: notifier.clone(),
            navigator: navigator.clone(),
        },
    );

    Harness {
        flow: Arc::new(flow),
        submissions,
        notifier,
        navigator,
    }
}

pub(super) fn registration(gating: SubmissionGating) -> Harness {
    harness(
        FlowBlueprint::registration(),
        gating,
        Arc::new(InstantUploads),
        RecordingSubmissions::default(),
    )
}

pub(super) fn transfer(gating: SubmissionGating) -> Harness {
    harness(
        FlowBlueprint::transfer(property_context()),
        gating,
        Arc::new(InstantUploads),
        RecordingSubmissions::default(),
    )
}

pub(super) fn fill_registration(flow: &SubmissionFlow) {
    let values = [
        ("propertyTitle", "Residential Plot - Kandy"),
        ("plotNumber", "  KAN-03-2024-017 "),
        ("address", "12 Temple Road, Kandy"),
        ("district", "Kandy"),
        ("province", "Central"),
        ("landArea", "15.5"),
        ("propertyType", "residential"),
        ("ownerNIC", "198512345678"),
    ];
    for (name, value) in values {
        flow.set_field(name, value).expect("known registration field");
    }
}

pub(super) fn fill_transfer(flow: &SubmissionFlow) {
    let values = [
        ("buyerName", "Sarah Johnson"),
        ("buyerNIC", "199012345678"),
        ("buyerEmail", "sarah@example.com"),
        ("buyerPhone", "+94 77 123 4567"),
        ("buyerAddress", "45 Lake Drive, Colombo 07"),
        ("saleAmount", "25000000"),
    ];
    for (name, value) in values {
        flow.set_field(name, value).expect("known transfer field");
    }
}

pub(super) fn walk_to_last(flow: &SubmissionFlow) {
    while !flow.is_final_step() {
        flow.advance().expect("advance succeeds");
    }
}

pub(super) async fn upload_required(flow: &SubmissionFlow) {
    let required: Vec<DocumentKind> = flow
        .blueprint()
        .documents()
        .iter()
        .filter(|requirement| requirement.required)
        .map(|requirement| requirement.document)
        .collect();
    for document in required {
        let rejected = flow
            .select_files(document, vec![pdf(&format!("{}.pdf", document.id()))])
            .expect("known document");
        assert!(rejected.is_empty());
    }
    flow.wait_for_uploads().await;
}
