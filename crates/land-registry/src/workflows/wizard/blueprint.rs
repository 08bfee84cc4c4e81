use serde::Serialize;

use super::domain::{DocumentKind, DocumentRequirement, FlowKind};
use super::fields::{FieldKind, FieldRule};
use crate::workflows::registry::domain::Property;

pub const REGISTRATION_STEPS: &[&str] = &[
    "Property Information",
    "Document Upload",
    "Review & Submit",
];

pub const TRANSFER_STEPS: &[&str] = &[
    "Buyer Information",
    "Transfer Documents",
    "Verification",
    "Complete Transfer",
];

pub const PROPERTY_TYPES: &[&str] = &["residential", "commercial", "agricultural", "industrial"];

/// What happens once the registry accepts a submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", content = "destination", rename_all = "snake_case")]
pub enum Completion {
    /// Start over with an empty wizard.
    Reset,
    /// Leave the wizard for another page.
    NavigateTo(String),
}

/// The property a transfer flow acts on, as shown on the summary step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PropertyContext {
    pub property_id: u32,
    pub title: String,
    pub plot_number: String,
    pub current_owner: String,
    pub token_id: String,
}

impl From<&Property> for PropertyContext {
    fn from(property: &Property) -> Self {
        Self {
            property_id: property.id.0,
            title: property.title.clone(),
            plot_number: property.plot_number.clone(),
            current_owner: property.owner.name.clone(),
            token_id: property.token_id.clone(),
        }
    }
}

/// Static shape of a wizard: steps, fields, documents and completion behavior.
#[derive(Debug, Clone)]
pub struct FlowBlueprint {
    kind: FlowKind,
    steps: &'static [&'static str],
    fields: Vec<FieldRule>,
    documents: Vec<DocumentRequirement>,
    completion: Completion,
    property: Option<PropertyContext>,
    success_message: &'static str,
    failure_message: &'static str,
}

impl FlowBlueprint {
    pub fn registration() -> Self {
        Self {
            kind: FlowKind::Registration,
            steps: REGISTRATION_STEPS,
            fields: registration_fields(),
            documents: vec![
                DocumentRequirement::required(DocumentKind::TitleDeed),
                DocumentRequirement::required(DocumentKind::SurveyPlan),
                DocumentRequirement::optional(DocumentKind::OwnershipHistory),
                DocumentRequirement::optional(DocumentKind::TaxReceipts),
            ],
            completion: Completion::Reset,
            property: None,
            success_message:
                "Registration submitted successfully! You will receive updates via email.",
            failure_message: "Registration failed. Please try again.",
        }
    }

    pub fn transfer(property: PropertyContext) -> Self {
        Self {
            kind: FlowKind::Transfer,
            steps: TRANSFER_STEPS,
            fields: transfer_fields(),
            documents: vec![
                DocumentRequirement::required(DocumentKind::TransferDeed),
                DocumentRequirement::required(DocumentKind::BuyerNic),
                DocumentRequirement::required(DocumentKind::PaymentProof),
                DocumentRequirement::optional(DocumentKind::LegalClearance),
            ],
            completion: Completion::NavigateTo(format!("/property/{}", property.property_id)),
            property: Some(property),
            success_message: "Property transfer completed successfully!",
            failure_message: "Transfer failed. Please try again.",
        }
    }

    pub fn kind(&self) -> FlowKind {
        self.kind
    }

    pub fn steps(&self) -> &'static [&'static str] {
        self.steps
    }

    pub fn fields(&self) -> &[FieldRule] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldRule> {
        self.fields.iter().find(|rule| rule.name == name)
    }

    pub fn fields_for_step(&self, step: usize) -> impl Iterator<Item = &FieldRule> {
        self.fields.iter().filter(move |rule| rule.step == step)
    }

    pub fn documents(&self) -> &[DocumentRequirement] {
        &self.documents
    }

    pub fn completion(&self) -> &Completion {
        &self.completion
    }

    pub fn property(&self) -> Option<&PropertyContext> {
        self.property.as_ref()
    }

    pub fn success_message(&self) -> &'static str {
        self.success_message
    }

    pub fn failure_message(&self) -> &'static str {
        self.failure_message
    }
}

fn registration_fields() -> Vec<FieldRule> {
    vec![
        text("propertyTitle", "Property Title", "Property title is required"),
        text("plotNumber", "Survey/Plot Number", "Plot number is required")
            .reviewed_as("Plot Number"),
        text("address", "Property Address", "Address is required")
            .reviewed_as("Address"),
        text("district", "District", "District is required"),
        text("province", "Province", "Province is required"),
        number(
            "landArea",
            "Land Area (in perches)",
            "Land area is required",
        )
        .reviewed_as("Land Area"),
        FieldRule::required(
            "propertyType",
            "Property Type",
            0,
            FieldKind::Choice(PROPERTY_TYPES),
            "Property type is required",
        ),
        text("ownerNIC", "Current Owner's NIC", "Owner NIC is required"),
    ]
}

fn transfer_fields() -> Vec<FieldRule> {
    vec![
        text("buyerName", "Buyer's Full Name", "Buyer name is required")
            .reviewed_as("New Owner"),
        text("buyerNIC", "Buyer's NIC Number", "NIC number is required")
            .reviewed_as("Buyer NIC"),
        FieldRule::required(
            "buyerEmail",
            "Email Address",
            0,
            FieldKind::Email,
            "Email is required",
        ),
        text("buyerPhone", "Phone Number", "Phone number is required"),
        text("buyerAddress", "Buyer's Address", "Address is required"),
        FieldRule::optional("walletAddress", "Buyer's Wallet Address (Optional)", 0),
        number("saleAmount", "Sale Amount (LKR)", "Sale amount is required")
            .reviewed_as("Sale Amount"),
    ]
}

// Every wizard field is entered on the first step.
fn text(name: &'static str, label: &'static str, message: &'static str) -> FieldRule {
    FieldRule::required(name, label, 0, FieldKind::Text, message)
}

fn number(name: &'static str, label: &'static str, message: &'static str) -> FieldRule {
    FieldRule::required(name, label, 0, FieldKind::Number, message)
}
