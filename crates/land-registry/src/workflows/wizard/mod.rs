//! Stepped submission flow shared by property registration and property transfer.
//!
//! A flow walks a fixed list of steps, collects form fields and one file per
//! document kind, simulates uploads and the final submission through injected
//! transports, and projects its state into a review summary.

pub mod blueprint;
pub mod collaborators;
pub mod documents;
pub mod domain;
pub mod fields;
mod flow;
pub mod review;
pub mod steps;
pub mod transport;
pub mod upload;

#[cfg(test)]
mod tests;

pub use blueprint::{Completion, FlowBlueprint, PropertyContext};
pub use collaborators::{Navigator, Notification, NotificationSink, Severity, TracingNotifier};
pub use documents::DocumentCollection;
pub use domain::{
    DocumentKind, DocumentRequirement, FileDescriptor, FlowKind, SubmissionGating, UploadStatus,
};
pub use fields::{FieldError, FieldKind, FieldRule, FormFieldSet, ValidationErrors};
pub use flow::{
    FlowCollaborators, FlowError, FlowEvent, FlowSettings, SubmissionFlow, SubmissionResult,
};
pub use review::{ReviewDocument, ReviewField, ReviewSummary};
pub use steps::StepSequencer;
pub use transport::{
    SimulatedSubmissionTransport, SimulatedUploadTransport, SubmissionPayload, SubmissionReceipt,
    SubmissionTransport, SubmittedDocument, TransportError, UploadTransport,
};
pub use upload::{
    RejectionReason, Screening, UploadConstraints, UploadError, UploadRejection, UploadSlot,
};
