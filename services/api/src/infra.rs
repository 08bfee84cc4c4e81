use land_registry::config::WizardConfig;
use land_registry::workflows::registry::{
    RegistryCatalog, RegistryDesk, StatusFilter, VerificationQueue, VerificationStatus,
};
use land_registry::workflows::wizard::{
    FileDescriptor, FlowCollaborators, Navigator, Notification, NotificationSink,
    SimulatedUploadTransport, TracingNotifier,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex, PoisonError};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Registry records, the verification queue and wizard timings shared by every request.
#[derive(Clone)]
pub(crate) struct PortalState {
    pub(crate) catalog: Arc<RegistryCatalog>,
    pub(crate) queue: Arc<VerificationQueue<RegistryCatalog>>,
    pub(crate) wizard: WizardConfig,
}

impl PortalState {
    pub(crate) fn new(catalog: RegistryCatalog, wizard: WizardConfig) -> Self {
        let catalog = Arc::new(catalog);
        let queue = Arc::new(VerificationQueue::new(
            catalog.clone(),
            Arc::new(TracingNotifier),
            wizard.review_delay,
        ));
        Self {
            catalog,
            queue,
            wizard,
        }
    }

    pub(crate) fn registration_collaborators(
        &self,
        notifier: Arc<CollectingNotifier>,
        navigator: Arc<RecordingNavigator>,
    ) -> FlowCollaborators {
        self.collaborators(self.wizard.registration_delay, notifier, navigator)
    }

    pub(crate) fn transfer_collaborators(
        &self,
        notifier: Arc<CollectingNotifier>,
        navigator: Arc<RecordingNavigator>,
    ) -> FlowCollaborators {
        self.collaborators(self.wizard.transfer_delay, notifier, navigator)
    }

    fn collaborators(
        &self,
        submit_delay: std::time::Duration,
        notifier: Arc<CollectingNotifier>,
        navigator: Arc<RecordingNavigator>,
    ) -> FlowCollaborators {
        FlowCollaborators {
            uploads: Arc::new(SimulatedUploadTransport::new(self.wizard.upload_tick)),
            submissions: Arc::new(RegistryDesk::new(self.catalog.clone(), submit_delay)),
            notifier,
            navigator,
        }
    }
}

/// Keeps the notifications raised while serving one request and mirrors them to the log.
#[derive(Default)]
pub(crate) struct CollectingNotifier {
    notifications: Mutex<Vec<Notification>>,
}

impl CollectingNotifier {
    pub(crate) fn take(&self) -> Vec<Notification> {
        std::mem::take(
            &mut *self
                .notifications
                .lock()
                .unwrap_or_else(PoisonError::into_inner),
        )
    }
}

impl NotificationSink for CollectingNotifier {
    fn notify(&self, notification: Notification) {
        TracingNotifier.notify(notification.clone());
        self.notifications
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(notification);
    }
}

/// Headless flows cannot move a browser; the destination is reported back instead.
#[derive(Default)]
pub(crate) struct RecordingNavigator {
    destination: Mutex<Option<String>>,
}

impl RecordingNavigator {
    pub(crate) fn destination(&self) -> Option<String> {
        self.destination
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, destination: &str) {
        *self
            .destination
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(destination.to_string());
    }
}

/// Builds a file descriptor, guessing the media type from the extension when none is given.
pub(crate) fn describe_file(
    name: &str,
    size_bytes: u64,
    media_type: Option<&str>,
) -> FileDescriptor {
    let media_type = match media_type {
        Some(declared) if !declared.trim().is_empty() => declared.trim().to_string(),
        _ => mime_guess::from_path(name)
            .first_or_octet_stream()
            .essence_str()
            .to_string(),
    };
    FileDescriptor::new(name, size_bytes, media_type)
}

pub(crate) fn parse_status_filter(value: &str) -> Result<StatusFilter, String> {
    match value.trim().to_ascii_lowercase().replace('-', "_").as_str() {
        "all" => Ok(StatusFilter::All),
        "pending" => Ok(StatusFilter::Pending),
        "under_review" => Ok(StatusFilter::UnderReview),
        other => Err(format!(
            "unknown status filter '{other}' (expected all, pending or under-review)"
        )),
    }
}

pub(crate) fn parse_property_status(value: &str) -> Result<VerificationStatus, String> {
    match value.trim().to_ascii_lowercase().replace('-', "_").as_str() {
        "pending" => Ok(VerificationStatus::Pending),
        "under_review" => Ok(VerificationStatus::UnderReview),
        "verified" => Ok(VerificationStatus::Verified),
        "rejected" => Ok(VerificationStatus::Rejected),
        other => Err(format!(
            "unknown property status '{other}'"
        )),
    }
}
