use serde::Serialize;

use super::catalog::RegistryStore;
use super::domain::{Activity, ActivityKind, OfficerStatus, VerificationStatus};

pub const DEFAULT_RECENT_ACTIVITIES: usize = 4;

/// Figures for the administrator dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegistryOverview {
    pub total_properties: usize,
    pub verified_properties: usize,
    pub pending_verification: usize,
    pub rejected_applications: usize,
    pub transfers: usize,
    pub active_officers: usize,
    pub recent_activities: Vec<Activity>,
}

impl RegistryOverview {
    pub fn collect<S>(store: &S, recent: usize) -> Self
    where
        S: RegistryStore + ?Sized,
    {
        let properties = store.properties();
        let registrations = store.registrations();
        let activities = store.activities();

        Self {
            total_properties: properties.len(),
            verified_properties: properties
                .iter()
                .filter(|property| property.status == VerificationStatus::Verified)
                .count(),
            pending_verification: registrations
                .iter()
                .filter(|registration| registration.status.is_open())
                .count(),
            rejected_applications: registrations
                .iter()
                .filter(|registration| registration.status == VerificationStatus::Rejected)
                .count(),
            transfers: activities
                .iter()
                .filter(|activity| activity.kind == ActivityKind::Transfer)
                .count(),
            active_officers: store
                .officers()
                .iter()
                .filter(|officer| officer.status == OfficerStatus::Active)
                .count(),
            recent_activities: activities.into_iter().take(recent).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::registry::catalog::RegistryCatalog;

    #[test]
    fn summarises_the_seeded_registry() {
        let catalog = RegistryCatalog::seeded().expect("seed data");
        let overview = RegistryOverview::collect(&catalog, 2);

        assert_eq!(overview.total_properties, 3);
        assert_eq!(overview.verified_properties, 2);
        assert_eq!(overview.pending_verification, 3);
        assert_eq!(overview.rejected_applications, 0);
        assert_eq!(overview.transfers, 1);
        assert_eq!(overview.active_officers, 2);
        assert_eq!(overview.recent_activities.len(), 2);
        assert_eq!(overview.recent_activities[0].action, "Property Verified");
    }
}
