use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Duration, NaiveDate, Utc};

use super::domain::{
    Activity, ActivityKind, AreaUnit, LandArea, Location, Officer, OfficerStatus, Owner,
    PendingRegistration, Priority, Property, PropertyId, PropertyType, RecordError,
    RegistrationId, VerificationStatus,
};
use super::queue::{Decision, QueueError};

const RECENT_ACTIVITY_LIMIT: usize = 50;

/// Storage abstraction for registry records so services can run against fakes.
pub trait RegistryStore: Send + Sync {
    fn properties(&self) -> Vec<Property>;
    fn property(&self, id: PropertyId) -> Option<Property>;
    fn update_property(&self, property: Property) -> Result<(), RecordError>;
    fn officers(&self) -> Vec<Officer>;
    /// Newest first.
    fn activities(&self) -> Vec<Activity>;
    fn record_activity(&self, activity: Activity);
    fn registrations(&self) -> Vec<PendingRegistration>;
    fn registration(&self, id: RegistrationId) -> Option<PendingRegistration>;
    /// Validates the registration and stores it under a freshly assigned id.
    fn enqueue(&self, registration: PendingRegistration)
        -> Result<PendingRegistration, RecordError>;
    /// Applies an officer's decision to an open registration.
    fn decide(
        &self,
        id: RegistrationId,
        decision: &Decision,
    ) -> Result<PendingRegistration, QueueError>;
}

#[derive(Default)]
struct CatalogState {
    properties: BTreeMap<PropertyId, Property>,
    officers: Vec<Officer>,
    activities: Vec<Activity>,
    registrations: BTreeMap<RegistrationId, PendingRegistration>,
    next_registration: u32,
}

/// In-memory registry records.
#[derive(Default)]
pub struct RegistryCatalog {
    state: Mutex<CatalogState>,
}

impl RegistryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, CatalogState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn insert_property(&self, property: Property) -> Result<(), RecordError> {
        property.validate()?;
        self.lock().properties.insert(property.id, property);
        Ok(())
    }

    pub fn insert_officer(&self, officer: Officer) {
        let mut state = self.lock();
        state.officers.retain(|existing| existing.id != officer.id);
        state.officers.push(officer);
    }

    /// The portal's demonstration data set.
    pub fn seeded() -> Result<Self, RecordError> {
        let catalog = Self::new();
        for property in seed_properties()? {
            catalog.insert_property(property)?;
        }
        for officer in seed_officers()? {
            catalog.insert_officer(officer);
        }
        let now = Utc::now();
        for activity in seed_activities(now)? {
            catalog.record_activity(activity);
        }
        for registration in seed_registrations()? {
            catalog.enqueue(registration)?;
        }
        Ok(catalog)
    }
}

impl RegistryStore for RegistryCatalog {
    fn properties(&self) -> Vec<Property> {
        self.lock().properties.values().cloned().collect()
    }

    fn property(&self, id: PropertyId) -> Option<Property> {
        self.lock().properties.get(&id).cloned()
    }

    fn update_property(&self, property: Property) -> Result<(), RecordError> {
        property.validate()?;
        let mut state = self.lock();
        match state.properties.get_mut(&property.id) {
            Some(existing) => {
                *existing = property;
                Ok(())
            }
            None => Err(RecordError::UnknownProperty(property.id)),
        }
    }

    fn officers(&self) -> Vec<Officer> {
        self.lock().officers.clone()
    }

    fn activities(&self) -> Vec<Activity> {
        self.lock().activities.clone()
    }

    fn record_activity(&self, activity: Activity) {
        let mut state = self.lock();
        let position = state
            .activities
            .iter()
            .position(|existing| existing.recorded_at <= activity.recorded_at)
            .unwrap_or(state.activities.len());
        state.activities.insert(position, activity);
        state.activities.truncate(RECENT_ACTIVITY_LIMIT);
    }

    fn registrations(&self) -> Vec<PendingRegistration> {
        self.lock().registrations.values().cloned().collect()
    }

    fn registration(&self, id: RegistrationId) -> Option<PendingRegistration> {
        self.lock().registrations.get(&id).cloned()
    }

    fn enqueue(
        &self,
        mut registration: PendingRegistration,
    ) -> Result<PendingRegistration, RecordError> {
        registration.validate()?;
        let mut state = self.lock();
        state.next_registration += 1;
        registration.id = RegistrationId(state.next_registration);
        state
            .registrations
            .insert(registration.id, registration.clone());
        Ok(registration)
    }

    fn decide(
        &self,
        id: RegistrationId,
        decision: &Decision,
    ) -> Result<PendingRegistration, QueueError> {
        let mut state = self.lock();
        let registration = state
            .registrations
            .get_mut(&id)
            .ok_or(QueueError::NotFound(id))?;
        if !registration.status.is_open() {
            return Err(QueueError::AlreadyDecided {
                id,
                status: registration.status,
            });
        }

        registration.status = decision.outcome;
        registration.decided_by = Some(decision.officer.clone());
        registration.decided_at = Some(decision.decided_at);
        let decided = registration.clone();

        if let Some(officer) = state
            .officers
            .iter_mut()
            .find(|officer| officer.name == decision.officer)
        {
            officer.record_verification();
        }
        Ok(decided)
    }
}

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or_default()
}

fn seed_properties() -> Result<Vec<Property>, RecordError> {
    Ok(vec![
        Property {
            id: PropertyId(1),
            title: "Residential Plot - Colombo 07".to_string(),
            plot_number: "COL-07-2024-001".to_string(),
            survey_number: "SUR-2024-789".to_string(),
            owner: Owner::new("John Doe", "199012345678", "john.doe@example.com")?,
            location: Location {
                address: "No. 123, Galle Road, Colombo 07".to_string(),
                district: "Colombo".to_string(),
                province: "Western Province".to_string(),
            },
            land_area: LandArea::perches(10.0)?,
            property_type: PropertyType::Residential,
            status: VerificationStatus::Verified,
            registered_on: date(2024, 8, 10),
            verified_on: Some(date(2024, 8, 12)),
            token_id: "0x1234...5678".to_string(),
        },
        Property {
            id: PropertyId(2),
            title: "Commercial Building - Kandy".to_string(),
            plot_number: "KAN-2024-045".to_string(),
            survey_number: "SUR-2024-512".to_string(),
            owner: Owner::new("Nimal Perera", "851234567V", "nimal.perera@example.com")?,
            location: Location {
                address: "No. 78, Peradeniya Road, Kandy".to_string(),
                district: "Kandy".to_string(),
                province: "Central Province".to_string(),
            },
            land_area: LandArea::perches(25.0)?,
            property_type: PropertyType::Commercial,
            status: VerificationStatus::Verified,
            registered_on: date(2024, 8, 5),
            verified_on: Some(date(2024, 8, 7)),
            token_id: "0x9abc...def0".to_string(),
        },
        Property {
            id: PropertyId(3),
            title: "Agricultural Land - Galle".to_string(),
            plot_number: "GAL-2024-022".to_string(),
            survey_number: "SUR-2024-903".to_string(),
            owner: Owner::new("Kamala Silva", "197845612309", "kamala.silva@example.com")?,
            location: Location {
                address: "Wakwella Road, Galle".to_string(),
                district: "Galle".to_string(),
                province: "Southern Province".to_string(),
            },
            land_area: LandArea::new(2.0, AreaUnit::Acres)?,
            property_type: PropertyType::Agricultural,
            status: VerificationStatus::Pending,
            registered_on: date(2024, 8, 15),
            verified_on: None,
            token_id: "0x4567...89ab".to_string(),
        },
    ])
}

fn seed_officers() -> Result<Vec<Officer>, RecordError> {
    Ok(vec![
        Officer::new(1, "Sarah Johnson", "Land Registry - Colombo", OfficerStatus::Active)?
            .with_counts(8, 234),
        Officer::new(2, "Michael Brown", "Land Registry - Kandy", OfficerStatus::Active)?
            .with_counts(5, 189),
        Officer::new(3, "Emily Davis", "Land Registry - Galle", OfficerStatus::Offline)?
            .with_counts(3, 156),
    ])
}

fn seed_activities(now: DateTime<Utc>) -> Result<Vec<Activity>, RecordError> {
    Ok(vec![
        Activity::new(
            ActivityKind::Verification,
            "Property Verified",
            "COL-2024-001",
            "Sarah Johnson",
            now - Duration::hours(2),
        )?,
        Activity::new(
            ActivityKind::Submission,
            "Registration Submitted",
            "KAN-2024-045",
            "System",
            now - Duration::hours(3),
        )?,
        Activity::new(
            ActivityKind::Transfer,
            "Property Transferred",
            "GAL-2024-022",
            "Michael Brown",
            now - Duration::hours(5),
        )?,
        Activity::new(
            ActivityKind::Rejection,
            "Application Rejected",
            "MAT-2024-015",
            "Emily Davis",
            now - Duration::days(1),
        )?,
    ])
}

fn seed_registrations() -> Result<Vec<PendingRegistration>, RecordError> {
    let documents = |names: &[&str]| -> Vec<String> {
        names.iter().map(|name| name.to_string()).collect()
    };
    Ok(vec![
        PendingRegistration {
            id: RegistrationId(0),
            title: "Residential Plot - Galle".to_string(),
            plot_number: "GAL-2024-001".to_string(),
            submitted_by: "Alice Johnson".to_string(),
            submitted_on: date(2024, 8, 15),
            status: VerificationStatus::Pending,
            priority: Priority::Normal,
            documents: documents(&["Title Deed", "Survey Plan", "Tax Records"]),
            location: "No. 45, Main Street, Galle".to_string(),
            land_area: LandArea::perches(15.0)?,
            decided_by: None,
            decided_at: None,
        },
        PendingRegistration {
            id: RegistrationId(0),
            title: "Commercial Building - Kandy".to_string(),
            plot_number: "KAN-2024-002".to_string(),
            submitted_by: "Bob Smith".to_string(),
            submitted_on: date(2024, 8, 14),
            status: VerificationStatus::UnderReview,
            priority: Priority::High,
            documents: documents(&["Title Deed", "Survey Plan", "Building Permit"]),
            location: "No. 78, Peradeniya Road, Kandy".to_string(),
            land_area: LandArea::perches(25.0)?,
            decided_by: None,
            decided_at: None,
        },
        PendingRegistration {
            id: RegistrationId(0),
            title: "Agricultural Land - Matara".to_string(),
            plot_number: "MAT-2024-003".to_string(),
            submitted_by: "Carol Brown".to_string(),
            submitted_on: date(2024, 8, 13),
            status: VerificationStatus::Pending,
            priority: Priority::Normal,
            documents: documents(&["Title Deed", "Survey Plan"]),
            location: "Weligama Road, Matara".to_string(),
            land_area: LandArea::new(2.0, AreaUnit::Acres)?,
            decided_by: None,
            decided_at: None,
        },
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded() -> RegistryCatalog {
        RegistryCatalog::seeded().expect("seed data is valid")
    }

    #[test]
    fn seed_matches_the_portal_mock_data() {
        let catalog = seeded();
        assert_eq!(catalog.properties().len(), 3);
        assert_eq!(catalog.officers().len(), 3);
        assert_eq!(catalog.registrations().len(), 3);

        let colombo = catalog.property(PropertyId(1)).expect("property 1");
        assert_eq!(colombo.owner.name, "John Doe");
        assert_eq!(colombo.land_area.to_string(), "10 perches");

        let ids: Vec<u32> = catalog
            .registrations()
            .iter()
            .map(|registration| registration.id.0)
            .collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn activities_stay_newest_first() {
        let catalog = seeded();
        let now = Utc::now();
        catalog.record_activity(
            Activity::new(
                ActivityKind::Submission,
                "Registration Submitted",
                "NEW-1",
                "System",
                now,
            )
            .expect("valid activity"),
        );

        let activities = catalog.activities();
        assert_eq!(activities[0].plot_number, "NEW-1");
        assert!(activities
            .windows(2)
            .all(|pair| pair[0].recorded_at >= pair[1].recorded_at));
    }

    #[test]
    fn invalid_properties_are_refused() {
        let catalog = seeded();
        let mut property = catalog.property(PropertyId(2)).expect("property 2");
        property.plot_number = "  ".to_string();
        assert_eq!(
            catalog.update_property(property),
            Err(RecordError::Blank {
                field: "plot number"
            })
        );

        let mut unknown = catalog.property(PropertyId(1)).expect("property 1");
        unknown.id = PropertyId(99);
        assert_eq!(
            catalog.update_property(unknown),
            Err(RecordError::UnknownProperty(PropertyId(99)))
        );
    }

    #[test]
    fn enqueue_assigns_sequential_ids() {
        let catalog = seeded();
        let mut registration = catalog
            .registration(RegistrationId(1))
            .expect("registration 1");
        registration.plot_number = "GAL-2024-010".to_string();

        let stored = catalog.enqueue(registration).expect("valid registration");
        assert_eq!(stored.id, RegistrationId(4));
        assert_eq!(
            catalog
                .registration(RegistrationId(4))
                .map(|registration| registration.plot_number),
            Some("GAL-2024-010".to_string())
        );
    }
}
