use serde::Serialize;

use super::blueprint::{FlowBlueprint, PropertyContext};
use super::documents::DocumentCollection;
use super::domain::{DocumentKind, FlowKind, UploadStatus};
use super::fields::FormFieldSet;
use super::steps::StepSequencer;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReviewField {
    pub name: &'static str,
    pub label: &'static str,
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReviewDocument {
    pub document: DocumentKind,
    pub label: &'static str,
    pub required: bool,
    pub status: UploadStatus,
    pub status_label: &'static str,
    pub progress: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_address: Option<String>,
}

/// Read-only snapshot of what the summary step shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReviewSummary {
    pub flow: FlowKind,
    pub flow_label: &'static str,
    pub active_step: usize,
    pub step_label: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub property: Option<PropertyContext>,
    pub fields: Vec<ReviewField>,
    pub documents: Vec<ReviewDocument>,
    pub missing_required: Vec<DocumentKind>,
}

impl ReviewSummary {
    pub fn field(&self, name: &str) -> Option<&ReviewField> {
        self.fields.iter().find(|field| field.name == name)
    }

    pub fn document(&self, document: DocumentKind) -> Option<&ReviewDocument> {
        self.documents.iter().find(|entry| entry.document == document)
    }

    pub fn documents_complete(&self) -> bool {
        self.missing_required.is_empty()
    }
}

pub(crate) fn summarize(
    blueprint: &FlowBlueprint,
    sequencer: &StepSequencer,
    fields: &FormFieldSet,
    documents: &DocumentCollection,
) -> ReviewSummary {
    let review_fields = blueprint
        .fields()
        .iter()
        .map(|rule| ReviewField {
            name: rule.name,
            label: rule.display_label(),
            value: fields.get(rule.name).unwrap_or_default().to_string(),
            error: fields.error(rule.name).map(str::to_string),
        })
        .collect();

    let review_documents = documents
        .requirements()
        .iter()
        .map(|requirement| {
            let slot = documents.slot(requirement.document);
            let status = documents.status(requirement.document);
            ReviewDocument {
                document: requirement.document,
                label: requirement.document.label(),
                required: requirement.required,
                status,
                status_label: status.label(),
                progress: slot.map(|slot| slot.progress()).unwrap_or_default(),
                file_name: slot.and_then(|slot| slot.file()).map(|file| file.name.clone()),
                content_address: slot
                    .and_then(|slot| slot.content_address())
                    .map(str::to_string),
            }
        })
        .collect();

    ReviewSummary {
        flow: blueprint.kind(),
        flow_label: blueprint.kind().label(),
        active_step: sequencer.active_index(),
        step_label: sequencer.current_step(),
        property: blueprint.property().cloned(),
        fields: review_fields,
        documents: review_documents,
        missing_required: documents.missing_required(),
    }
}
