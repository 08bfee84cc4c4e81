//! Registry records, the seeded catalog and the administrative verification queue.

pub mod catalog;
pub mod desk;
pub mod domain;
pub mod listing;
pub mod overview;
pub mod queue;
pub mod router;
pub mod search;

pub use catalog::{RegistryCatalog, RegistryStore};
pub use desk::RegistryDesk;
pub use domain::{
    Activity, ActivityKind, AreaUnit, LandArea, Location, Officer, OfficerStatus, Owner,
    PendingRegistration, Priority, Property, PropertyId, PropertyType, RecordError,
    RegistrationId, VerificationStatus,
};
pub use listing::{list_properties, PropertySummary};
pub use overview::RegistryOverview;
pub use queue::{Decision, QueueCounts, QueueError, StatusFilter, VerificationQueue};
pub use router::registry_router;
pub use search::{mask_name, mask_nic, search, MaskedOwner, PublicRecord};
