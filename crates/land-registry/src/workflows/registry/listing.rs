use chrono::NaiveDate;
use serde::Serialize;

use super::catalog::RegistryStore;
use super::domain::{Property, PropertyId, VerificationStatus};

/// One row of the property list shown on the portal and citizen dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PropertySummary {
    pub id: PropertyId,
    pub title: String,
    pub plot_number: String,
    pub status: VerificationStatus,
    pub status_label: &'static str,
    pub registered_on: NaiveDate,
    pub land_area: String,
}

impl From<&Property> for PropertySummary {
    fn from(property: &Property) -> Self {
        Self {
            id: property.id,
            title: property.title.clone(),
            plot_number: property.plot_number.clone(),
            status: property.status,
            status_label: property.status.label(),
            registered_on: property.registered_on,
            land_area: property.land_area.to_string(),
        }
    }
}

/// Properties in catalog order, optionally narrowed to one status and capped at `limit`.
pub fn list_properties<S>(
    store: &S,
    status: Option<VerificationStatus>,
    limit: Option<usize>,
) -> Vec<PropertySummary>
where
    S: RegistryStore + ?Sized,
{
    store
        .properties()
        .iter()
        .filter(|property| status.map_or(true, |wanted| property.status == wanted))
        .take(limit.unwrap_or(usize::MAX))
        .map(PropertySummary::from)
        .collect()
}
