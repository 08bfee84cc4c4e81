use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::workflows::wizard::fields::is_email_shaped;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PropertyId(pub u32);

impl fmt::Display for PropertyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegistrationId(pub u32);

impl fmt::Display for RegistrationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Errors raised when a record fails construction-time checks.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RecordError {
    #[error("{field} must not be blank")]
    Blank { field: &'static str },
    #[error("'{0}' is not a valid NIC number")]
    InvalidNic(String),
    #[error("'{0}' is not a valid email address")]
    InvalidEmail(String),
    #[error("land area must be a positive number, got {0}")]
    InvalidArea(f64),
    #[error("unknown property type '{0}'")]
    UnknownPropertyType(String),
    #[error("property {0} does not exist")]
    UnknownProperty(PropertyId),
}

fn require(field: &'static str, value: &str) -> Result<(), RecordError> {
    if value.trim().is_empty() {
        Err(RecordError::Blank { field })
    } else {
        Ok(())
    }
}

/// Sri Lankan NIC: 12 digits, or the older 9 digits followed by `V` or `X`.
pub fn is_valid_nic(nic: &str) -> bool {
    let nic = nic.trim();
    match nic.len() {
        12 => nic.chars().all(|c| c.is_ascii_digit()),
        10 => {
            let (digits, suffix) = nic.split_at(9);
            digits.chars().all(|c| c.is_ascii_digit())
                && matches!(suffix, "V" | "v" | "X" | "x")
        }
        _ => false,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationStatus {
    Pending,
    UnderReview,
    Verified,
    Rejected,
}

impl VerificationStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::UnderReview => "Under Review",
            Self::Verified => "Verified",
            Self::Rejected => "Rejected",
        }
    }

    /// Still waiting on an officer's decision.
    pub const fn is_open(self) -> bool {
        matches!(self, Self::Pending | Self::UnderReview)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Normal,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AreaUnit {
    Perches,
    Acres,
}

impl AreaUnit {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Perches => "perches",
            Self::Acres => "acres",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LandArea {
    pub value: f64,
    pub unit: AreaUnit,
}

impl LandArea {
    pub fn new(value: f64, unit: AreaUnit) -> Result<Self, RecordError> {
        if value.is_finite() && value > 0.0 {
            Ok(Self { value, unit })
        } else {
            Err(RecordError::InvalidArea(value))
        }
    }

    pub fn perches(value: f64) -> Result<Self, RecordError> {
        Self::new(value, AreaUnit::Perches)
    }
}

impl fmt::Display for LandArea {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.value, self.unit.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyType {
    Residential,
    Commercial,
    Agricultural,
    Industrial,
}

impl PropertyType {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Residential => "Residential",
            Self::Commercial => "Commercial",
            Self::Agricultural => "Agricultural",
            Self::Industrial => "Industrial",
        }
    }
}

impl FromStr for PropertyType {
    type Err = RecordError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "residential" => Ok(Self::Residential),
            "commercial" => Ok(Self::Commercial),
            "agricultural" => Ok(Self::Agricultural),
            "industrial" => Ok(Self::Industrial),
            other => Err(RecordError::UnknownPropertyType(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Owner {
    pub name: String,
    pub nic: String,
    pub email: String,
}

impl Owner {
    pub fn new(
        name: impl Into<String>,
        nic: impl Into<String>,
        email: impl Into<String>,
    ) -> Result<Self, RecordError> {
        let owner = Self {
            name: name.into().trim().to_string(),
            nic: nic.into().trim().to_string(),
            email: email.into().trim().to_string(),
        };
        owner.validate()?;
        Ok(owner)
    }

    pub fn validate(&self) -> Result<(), RecordError> {
        require("owner name", &self.name)?;
        if !is_valid_nic(&self.nic) {
            return Err(RecordError::InvalidNic(self.nic.clone()));
        }
        if !is_email_shaped(&self.email) {
            return Err(RecordError::InvalidEmail(self.email.clone()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub address: String,
    pub district: String,
    pub province: String,
}

impl Location {
    pub fn validate(&self) -> Result<(), RecordError> {
        require("address", &self.address)?;
        require("district", &self.district)?;
        require("province", &self.province)
    }
}

/// A registered parcel as held by the registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Property {
    pub id: PropertyId,
    pub title: String,
    pub plot_number: String,
    pub survey_number: String,
    pub owner: Owner,
    pub location: Location,
    pub land_area: LandArea,
    pub property_type: PropertyType,
    pub status: VerificationStatus,
    pub registered_on: NaiveDate,
    pub verified_on: Option<NaiveDate>,
    pub token_id: String,
}

impl Property {
    pub fn validate(&self) -> Result<(), RecordError> {
        require("title", &self.title)?;
        require("plot number", &self.plot_number)?;
        require("survey number", &self.survey_number)?;
        require("token id", &self.token_id)?;
        self.owner.validate()?;
        self.location.validate()?;
        LandArea::new(self.land_area.value, self.land_area.unit).map(|_| ())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OfficerStatus {
    Active,
    Offline,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Officer {
    pub id: u32,
    pub name: String,
    pub department: String,
    pub status: OfficerStatus,
    pub verifications_today: u32,
    pub total_verifications: u32,
}

impl Officer {
    pub fn new(
        id: u32,
        name: impl Into<String>,
        department: impl Into<String>,
        status: OfficerStatus,
    ) -> Result<Self, RecordError> {
        let name = name.into();
        let department = department.into();
        require("officer name", &name)?;
        require("department", &department)?;
        Ok(Self {
            id,
            name,
            department,
            status,
            verifications_today: 0,
            total_verifications: 0,
        })
    }

    pub fn with_counts(mut self, today: u32, total: u32) -> Self {
        self.verifications_today = today;
        self.total_verifications = total.max(today);
        self
    }

    pub fn record_verification(&mut self) {
        self.verifications_today += 1;
        self.total_verifications += 1;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    Verification,
    Submission,
    Transfer,
    Rejection,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Activity {
    pub action: String,
    pub plot_number: String,
    pub actor: String,
    pub kind: ActivityKind,
    pub recorded_at: DateTime<Utc>,
}

impl Activity {
    pub fn new(
        kind: ActivityKind,
        action: impl Into<String>,
        plot_number: impl Into<String>,
        actor: impl Into<String>,
        recorded_at: DateTime<Utc>,
    ) -> Result<Self, RecordError> {
        let activity = Self {
            action: action.into(),
            plot_number: plot_number.into(),
            actor: actor.into(),
            kind,
            recorded_at,
        };
        require("action", &activity.action)?;
        require("plot number", &activity.plot_number)?;
        require("actor", &activity.actor)?;
        Ok(activity)
    }
}

/// A registration waiting in (or decided through) the verification queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingRegistration {
    pub id: RegistrationId,
    pub title: String,
    pub plot_number: String,
    pub submitted_by: String,
    pub submitted_on: NaiveDate,
    pub status: VerificationStatus,
    pub priority: Priority,
    pub documents: Vec<String>,
    pub location: String,
    pub land_area: LandArea,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decided_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decided_at: Option<DateTime<Utc>>,
}

impl PendingRegistration {
    pub fn validate(&self) -> Result<(), RecordError> {
        require("title", &self.title)?;
        require("plot number", &self.plot_number)?;
        require("submitter", &self.submitted_by)?;
        require("location", &self.location)?;
        LandArea::new(self.land_area.value, self.land_area.unit).map(|_| ())
    }
}
