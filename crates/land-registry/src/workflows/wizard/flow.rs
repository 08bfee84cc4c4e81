use chrono::Utc;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::blueprint::{Completion, FlowBlueprint};
use super::collaborators::{Navigator, Notification, NotificationSink, Severity};
use super::documents::DocumentCollection;
use super::domain::{DocumentKind, FileDescriptor, FlowKind, SubmissionGating};
use super::fields::{FormFieldSet, ValidationErrors};
use super::review::{summarize, ReviewSummary};
use super::steps::StepSequencer;
use super::transport::{
    SubmissionPayload, SubmissionTransport, SubmittedDocument, UploadTransport,
};
use super::upload::{
    RejectionReason, UploadConstraints, UploadError, UploadRejection, UploadSlot, UploadTicket,
};

const EVENT_CAPACITY: usize = 256;
const PROGRESS_STEP: usize = 10;

/// External capabilities a flow talks to.
#[derive(Clone)]
pub struct FlowCollaborators {
    pub uploads: Arc<dyn UploadTransport>,
    pub submissions: Arc<dyn SubmissionTransport>,
    pub notifier: Arc<dyn NotificationSink>,
    pub navigator: Arc<dyn Navigator>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowSettings {
    pub gating: SubmissionGating,
    pub constraints: UploadConstraints,
}

impl Default for FlowSettings {
    fn default() -> Self {
        Self {
            gating: SubmissionGating::default(),
            constraints: UploadConstraints::single_document(
                UploadConstraints::DEFAULT_MAX_SIZE_BYTES,
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SubmissionResult {
    Success { reference: String },
    Failure { reason: String },
}

impl SubmissionResult {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

/// Observable state changes, in the order they were applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum FlowEvent {
    StepChanged {
        index: usize,
        step: &'static str,
    },
    UploadProgress {
        document: DocumentKind,
        progress: u8,
    },
    UploadCompleted {
        document: DocumentKind,
        content_address: String,
    },
    UploadFailed {
        document: DocumentKind,
        message: String,
    },
    SubmissionFinished {
        result: SubmissionResult,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum FlowError {
    #[error(transparent)]
    Validation(#[from] ValidationErrors),
    #[error(transparent)]
    Upload(#[from] UploadError),
    #[error("unknown field '{0}'")]
    UnknownField(String),
    #[error("submission is only available on the final step (on step {active} of {last})")]
    NotAtFinalStep { active: usize, last: usize },
    #[error("required documents are not uploaded: {}", document_list(.0))]
    MissingDocuments(Vec<DocumentKind>),
    #[error("a submission is already in flight")]
    SubmissionInFlight,
    #[error("the flow has been closed")]
    Disposed,
}

fn document_list(documents: &[DocumentKind]) -> String {
    documents
        .iter()
        .map(|document| document.label())
        .collect::<Vec<_>>()
        .join(", ")
}

struct FlowState {
    sequencer: StepSequencer,
    fields: FormFieldSet,
    documents: DocumentCollection,
    submitting: bool,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// One running wizard. Uploads run as spawned tasks tied to the flow's lifetime:
/// dropping or disposing the flow cancels them before they can touch its state.
pub struct SubmissionFlow {
    blueprint: FlowBlueprint,
    settings: FlowSettings,
    collaborators: FlowCollaborators,
    state: Arc<Mutex<FlowState>>,
    uploads: Mutex<HashMap<DocumentKind, JoinHandle<()>>>,
    events: broadcast::Sender<FlowEvent>,
    lifetime: CancellationToken,
}

impl SubmissionFlow {
    pub fn new(
        blueprint: FlowBlueprint,
        settings: FlowSettings,
        collaborators: FlowCollaborators,
    ) -> Self {
        let state = FlowState {
            sequencer: StepSequencer::new(blueprint.steps()),
            fields: FormFieldSet::default(),
            documents: DocumentCollection::new(blueprint.documents()),
            submitting: false,
        };
        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        Self {
            blueprint,
            settings,
            collaborators,
            state: Arc::new(Mutex::new(state)),
            uploads: Mutex::new(HashMap::new()),
            events,
            lifetime: CancellationToken::new(),
        }
    }

    pub fn kind(&self) -> FlowKind {
        self.blueprint.kind()
    }

    pub fn blueprint(&self) -> &FlowBlueprint {
        &self.blueprint
    }

    pub fn settings(&self) -> &FlowSettings {
        &self.settings
    }

    pub fn subscribe(&self) -> broadcast::Receiver<FlowEvent> {
        self.events.subscribe()
    }

    pub fn is_disposed(&self) -> bool {
        self.lifetime.is_cancelled()
    }

    pub fn active_index(&self) -> usize {
        lock(&self.state).sequencer.active_index()
    }

    pub fn current_step(&self) -> &'static str {
        lock(&self.state).sequencer.current_step()
    }

    pub fn is_final_step(&self) -> bool {
        lock(&self.state).sequencer.is_last()
    }

    /// Moves forward one step. In strict mode the current step's fields must validate first.
    pub fn advance(&self) -> Result<usize, FlowError> {
        let mut state = lock(&self.state);
        if self.settings.gating == SubmissionGating::Strict {
            let step = state.sequencer.active_index();
            state
                .fields
                .validate(self.blueprint.fields_for_step(step))?;
        }
        if state.sequencer.advance() {
            self.step_changed(&state.sequencer);
        }
        Ok(state.sequencer.active_index())
    }

    pub fn retreat(&self) -> usize {
        let mut state = lock(&self.state);
        if state.sequencer.retreat() {
            self.step_changed(&state.sequencer);
        }
        state.sequencer.active_index()
    }

    fn step_changed(&self, sequencer: &StepSequencer) {
        debug!(
            flow = ?self.blueprint.kind(),
            index = sequencer.active_index(),
            step = sequencer.current_step(),
            "wizard step changed"
        );
        let _ = self.events.send(FlowEvent::StepChanged {
            index: sequencer.active_index(),
            step: sequencer.current_step(),
        });
    }

    pub fn set_field(&self, name: &str, value: impl Into<String>) -> Result<(), FlowError> {
        let rule = self
            .blueprint
            .field(name)
            .ok_or_else(|| FlowError::UnknownField(name.to_string()))?;
        lock(&self.state).fields.set(rule.name, value);
        Ok(())
    }

    pub fn field(&self, name: &str) -> Option<String> {
        lock(&self.state).fields.get(name).map(str::to_string)
    }

    pub fn field_error(&self, name: &str) -> Option<String> {
        lock(&self.state).fields.error(name).map(str::to_string)
    }

    pub fn slot(&self, document: DocumentKind) -> Option<UploadSlot> {
        lock(&self.state).documents.slot(document).cloned()
    }

    /// Takes files from the picker for one document. Rejected files never reach the
    /// slot; the first accepted file replaces whatever the slot held and starts
    /// uploading. Must be called from within a tokio runtime.
    pub fn select_files(
        &self,
        document: DocumentKind,
        files: Vec<FileDescriptor>,
    ) -> Result<Vec<UploadRejection>, FlowError> {
        if self.is_disposed() {
            return Err(FlowError::Disposed);
        }
        if self
            .blueprint
            .documents()
            .iter()
            .all(|requirement| requirement.document != document)
        {
            return Err(UploadError::UnknownDocument { document }.into());
        }

        let screening = self.settings.constraints.screen(files, 0);
        let mut rejected = screening.rejected;
        let mut accepted = screening.accepted.into_iter();
        let chosen = accepted.next();
        rejected.extend(accepted.map(|file| UploadRejection {
            file_name: file.name,
            reason: RejectionReason::TooManyFiles { limit: 1 },
        }));

        for rejection in &rejected {
            warn!(%document, reason = %rejection, "file rejected by drop surface");
        }

        if let Some(file) = chosen {
            let ticket = lock(&self.state)
                .documents
                .select_file(document, file.clone())?;
            self.spawn_upload(ticket, file);
        }

        Ok(rejected)
    }

    fn spawn_upload(&self, ticket: UploadTicket, file: FileDescriptor) {
        let task = UploadTask {
            state: Arc::clone(&self.state),
            transport: Arc::clone(&self.collaborators.uploads),
            notifier: Arc::clone(&self.collaborators.notifier),
            events: self.events.clone(),
            lifetime: self.lifetime.clone(),
            ticket,
            file,
        };
        let handle = tokio::spawn(task.run());
        if let Some(previous) = lock(&self.uploads).insert(ticket.document, handle) {
            previous.abort();
        }
    }

    /// Clears a document slot. Refused while its upload is still pending.
    pub fn remove_file(&self, document: DocumentKind) -> Result<(), FlowError> {
        lock(&self.state).documents.remove_file(document)?;
        if let Some(handle) = lock(&self.uploads).remove(&document) {
            handle.abort();
        }
        Ok(())
    }

    /// Waits until every upload started so far has finished, failed or been cancelled.
    pub async fn wait_for_uploads(&self) {
        let handles: Vec<JoinHandle<()>> = lock(&self.uploads)
            .drain()
            .map(|(_, handle)| handle)
            .collect();
        for handle in handles {
            let _ = handle.await;
        }
    }

    pub fn review(&self) -> ReviewSummary {
        let state = lock(&self.state);
        summarize(
            &self.blueprint,
            &state.sequencer,
            &state.fields,
            &state.documents,
        )
    }

    /// Validates, hands the flow to the submission transport and applies the outcome.
    ///
    /// Field validation failures and strict-mode document gaps return `Err` without
    /// calling the transport. A transport failure is an `Ok(Failure)`: the user stays
    /// on the last step and may retry.
    pub async fn submit(&self) -> Result<SubmissionResult, FlowError> {
        if self.is_disposed() {
            return Err(FlowError::Disposed);
        }

        let payload = {
            let mut state = lock(&self.state);
            if !state.sequencer.is_last() {
                return Err(FlowError::NotAtFinalStep {
                    active: state.sequencer.active_index(),
                    last: state.sequencer.last_index(),
                });
            }
            if state.submitting {
                return Err(FlowError::SubmissionInFlight);
            }

            state.fields.validate(self.blueprint.fields())?;

            let missing = state.documents.missing_required();
            if !missing.is_empty() {
                match self.settings.gating {
                    SubmissionGating::Strict => return Err(FlowError::MissingDocuments(missing)),
                    SubmissionGating::Lenient => warn!(
                        flow = ?self.blueprint.kind(),
                        missing = %document_list(&missing),
                        "submitting without every required document"
                    ),
                }
            }

            state.submitting = true;
            self.payload(&state)
        };
        let in_flight = InFlight { state: &*self.state };

        let outcome = tokio::select! {
            _ = self.lifetime.cancelled() => return Err(FlowError::Disposed),
            outcome = self.collaborators.submissions.submit(&payload) => outcome,
        };

        let result = match outcome {
            Ok(receipt) => {
                info!(
                    flow = ?self.blueprint.kind(),
                    reference = %receipt.reference,
                    documents = payload.documents.len(),
                    "submission accepted"
                );
                self.collaborators.notifier.notify(Notification::new(
                    self.blueprint.success_message(),
                    Severity::Success,
                ));
                self.finish_successful_submission();
                SubmissionResult::Success {
                    reference: receipt.reference,
                }
            }
            Err(err) => {
                warn!(flow = ?self.blueprint.kind(), error = %err, "submission failed");
                self.collaborators.notifier.notify(Notification::new(
                    self.blueprint.failure_message(),
                    Severity::Error,
                ));
                SubmissionResult::Failure {
                    reason: err.to_string(),
                }
            }
        };
        drop(in_flight);

        let _ = self.events.send(FlowEvent::SubmissionFinished {
            result: result.clone(),
        });
        Ok(result)
    }

    fn payload(&self, state: &FlowState) -> SubmissionPayload {
        SubmissionPayload {
            flow: self.blueprint.kind(),
            property_id: self.blueprint.property().map(|property| property.property_id),
            fields: state
                .fields
                .values()
                .iter()
                .map(|(name, value)| (name.to_string(), value.trim().to_string()))
                .collect(),
            documents: state
                .documents
                .completed()
                .filter_map(|slot| {
                    Some(SubmittedDocument {
                        document: slot.document(),
                        file_name: slot.file()?.name.clone(),
                        content_address: slot.content_address()?.to_string(),
                    })
                })
                .collect(),
            submitted_at: Utc::now(),
        }
    }

    fn finish_successful_submission(&self) {
        match self.blueprint.completion() {
            Completion::Reset => {
                self.abort_uploads();
                let mut state = lock(&self.state);
                state.fields.clear();
                state.documents.clear();
                state.sequencer.reset();
                self.step_changed(&state.sequencer);
            }
            Completion::NavigateTo(destination) => {
                self.collaborators.navigator.navigate(destination);
            }
        }
    }

    fn abort_uploads(&self) {
        for (_, handle) in lock(&self.uploads).drain() {
            handle.abort();
        }
    }

    /// Tears the flow down: pending uploads and submissions stop without touching state.
    pub fn dispose(&self) {
        if self.lifetime.is_cancelled() {
            return;
        }
        self.lifetime.cancel();
        self.abort_uploads();
        debug!(flow = ?self.blueprint.kind(), "wizard flow disposed");
    }
}

impl Drop for SubmissionFlow {
    fn drop(&mut self) {
        self.dispose();
    }
}

/// Clears the in-flight flag however `submit` ends, including when its future
/// is dropped before the transport answers.
struct InFlight<'a> {
    state: &'a Mutex<FlowState>,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        lock(self.state).submitting = false;
    }
}

struct UploadTask {
    state: Arc<Mutex<FlowState>>,
    transport: Arc<dyn UploadTransport>,
    notifier: Arc<dyn NotificationSink>,
    events: broadcast::Sender<FlowEvent>,
    lifetime: CancellationToken,
    ticket: UploadTicket,
    file: FileDescriptor,
}

impl UploadTask {
    async fn run(self) {
        let document = self.ticket.document;

        for progress in (0..=100u8).step_by(PROGRESS_STEP) {
            let sent = tokio::select! {
                _ = self.lifetime.cancelled() => return,
                sent = self.transport.send_chunk(&self.file, progress) => sent,
            };
            if let Err(err) = sent {
                self.fail(err.to_string());
                return;
            }

            let applied = lock(&self.state)
                .documents
                .record_progress(&self.ticket, progress);
            if !applied {
                return;
            }
            let _ = self
                .events
                .send(FlowEvent::UploadProgress { document, progress });
        }

        let finalized = tokio::select! {
            _ = self.lifetime.cancelled() => return,
            finalized = self.transport.finalize(&self.file) => finalized,
        };

        match finalized {
            Ok(content_address) => {
                let completed = lock(&self.state)
                    .documents
                    .complete(&self.ticket, content_address.clone());
                if !completed {
                    return;
                }
                info!(
                    %document,
                    file = %self.file.name,
                    %content_address,
                    "document upload completed"
                );
                self.notifier.notify(Notification::new(
                    format!("{} uploaded successfully", self.file.name),
                    Severity::Success,
                ));
                let _ = self.events.send(FlowEvent::UploadCompleted {
                    document,
                    content_address,
                });
            }
            Err(err) => self.fail(err.to_string()),
        }
    }

    fn fail(&self, message: String) {
        let document = self.ticket.document;
        let failed = lock(&self.state)
            .documents
            .fail(&self.ticket, message.clone());
        if !failed {
            return;
        }
        warn!(%document, file = %self.file.name, error = %message, "document upload failed");
        self.notifier.notify(Notification::new(
            format!("{}: {}", self.file.name, message),
            Severity::Error,
        ));
        let _ = self
            .events
            .send(FlowEvent::UploadFailed { document, message });
    }
}
