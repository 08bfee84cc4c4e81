use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowKind {
    Registration,
    Transfer,
}

impl FlowKind {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Registration => "Property Registration",
            Self::Transfer => "Property Transfer",
        }
    }
}

/// Fixed set of documents a flow can collect. Registration and transfer use disjoint kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DocumentKind {
    #[serde(rename = "titleDeed")]
    TitleDeed,
    #[serde(rename = "surveyPlan")]
    SurveyPlan,
    #[serde(rename = "ownershipHistory")]
    OwnershipHistory,
    #[serde(rename = "taxReceipts")]
    TaxReceipts,
    #[serde(rename = "transferDeed")]
    TransferDeed,
    #[serde(rename = "buyerNIC")]
    BuyerNic,
    #[serde(rename = "paymentProof")]
    PaymentProof,
    #[serde(rename = "legalClearance")]
    LegalClearance,
}

impl DocumentKind {
    pub const fn all() -> [Self; 8] {
        [
            Self::TitleDeed,
            Self::SurveyPlan,
            Self::OwnershipHistory,
            Self::TaxReceipts,
            Self::TransferDeed,
            Self::BuyerNic,
            Self::PaymentProof,
            Self::LegalClearance,
        ]
    }

    pub const fn id(self) -> &'static str {
        match self {
            Self::TitleDeed => "titleDeed",
            Self::SurveyPlan => "surveyPlan",
            Self::OwnershipHistory => "ownershipHistory",
            Self::TaxReceipts => "taxReceipts",
            Self::TransferDeed => "transferDeed",
            Self::BuyerNic => "buyerNIC",
            Self::PaymentProof => "paymentProof",
            Self::LegalClearance => "legalClearance",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::TitleDeed => "Title Deed",
            Self::SurveyPlan => "Survey Plan",
            Self::OwnershipHistory => "Previous Ownership Records",
            Self::TaxReceipts => "Property Tax Receipts",
            Self::TransferDeed => "Transfer Deed",
            Self::BuyerNic => "Buyer NIC Copy",
            Self::PaymentProof => "Payment Proof",
            Self::LegalClearance => "Legal Clearance Certificate",
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown document kind '{0}'")]
pub struct UnknownDocumentKind(pub String);

impl FromStr for DocumentKind {
    type Err = UnknownDocumentKind;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        Self::all()
            .into_iter()
            .find(|kind| kind.id().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| UnknownDocumentKind(trimmed.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DocumentRequirement {
    pub document: DocumentKind,
    pub required: bool,
}

impl DocumentRequirement {
    pub const fn required(document: DocumentKind) -> Self {
        Self {
            document,
            required: true,
        }
    }

    pub const fn optional(document: DocumentKind) -> Self {
        Self {
            document,
            required: false,
        }
    }
}

/// Metadata for a file picked from the drop surface. The payload itself never enters the flow.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FileDescriptor {
    pub name: String,
    pub size_bytes: u64,
    pub media_type: String,
}

impl FileDescriptor {
    pub fn new(name: impl Into<String>, size_bytes: u64, media_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            size_bytes,
            media_type: media_type.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadStatus {
    Empty,
    Pending,
    Completed,
    Errored,
}

impl UploadStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Empty => "Not uploaded",
            Self::Pending => "Uploading",
            Self::Completed => "Completed",
            Self::Errored => "Error",
        }
    }
}

/// How hard the final submit leans on document completeness and per-step validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionGating {
    #[default]
    Lenient,
    Strict,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown submission gating '{0}'")]
pub struct UnknownGating(pub String);

impl FromStr for SubmissionGating {
    type Err = UnknownGating;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "lenient" => Ok(Self::Lenient),
            "strict" => Ok(Self::Strict),
            other => Err(UnknownGating(other.to_string())),
        }
    }
}
