use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tracing::info;

use super::catalog::RegistryStore;
use super::domain::{
    Activity, ActivityKind, LandArea, Owner, PendingRegistration, Priority, PropertyId,
    RecordError, RegistrationId, VerificationStatus,
};
use crate::workflows::wizard::transport::next_receipt;
use crate::workflows::wizard::{
    FlowKind, SubmissionPayload, SubmissionReceipt, SubmissionTransport, TransportError,
};

const DEFAULT_SUBMITTER: &str = "Online Portal";

fn rejected(error: RecordError) -> TransportError {
    TransportError::Rejected(error.to_string())
}

/// Registry back office receiving finished wizard flows.
///
/// Registrations land in the verification queue; transfers change the owner on
/// the catalog record right away.
pub struct RegistryDesk<S> {
    store: Arc<S>,
    delay: Duration,
    submitter: String,
}

impl<S> RegistryDesk<S>
where
    S: RegistryStore + 'static,
{
    pub fn new(store: Arc<S>, delay: Duration) -> Self {
        Self {
            store,
            delay,
            submitter: DEFAULT_SUBMITTER.to_string(),
        }
    }

    pub fn submitted_by(mut self, submitter: impl Into<String>) -> Self {
        self.submitter = submitter.into();
        self
    }

    fn enqueue_registration(
        &self,
        payload: &SubmissionPayload,
    ) -> Result<SubmissionReceipt, TransportError> {
        let field = |name: &str| payload.field(name).unwrap_or_default().to_string();

        let raw_area = field("landArea");
        let area: f64 = raw_area.parse().map_err(|_| {
            TransportError::Rejected(format!("land area '{raw_area}' is not a number"))
        })?;
        let location = ["address", "district", "province"]
            .into_iter()
            .map(|name| field(name))
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(", ");

        let registration = PendingRegistration {
            id: RegistrationId(0),
            title: field("propertyTitle"),
            plot_number: field("plotNumber"),
            submitted_by: self.submitter.clone(),
            submitted_on: payload.submitted_at.date_naive(),
            status: VerificationStatus::Pending,
            priority: Priority::Normal,
            documents: payload
                .documents
                .iter()
                .map(|document| document.document.label().to_string())
                .collect(),
            location,
            land_area: LandArea::perches(area).map_err(rejected)?,
            decided_by: None,
            decided_at: None,
        };
        let stored = self.store.enqueue(registration).map_err(rejected)?;

        let activity = Activity::new(
            ActivityKind::Submission,
            "Registration Submitted",
            &stored.plot_number,
            "System",
            payload.submitted_at,
        )
        .map_err(rejected)?;
        self.store.record_activity(activity);

        info!(
            registration = %stored.id,
            plot = %stored.plot_number,
            documents = stored.documents.len(),
            "registration queued for verification"
        );
        Ok(SubmissionReceipt {
            reference: format!("REG-{:06}", stored.id.0),
            accepted_at: Utc::now(),
        })
    }

    fn record_transfer(
        &self,
        payload: &SubmissionPayload,
    ) -> Result<SubmissionReceipt, TransportError> {
        let id = payload
            .property_id
            .map(PropertyId)
            .ok_or_else(|| TransportError::Rejected("transfer names no property".to_string()))?;
        let mut property = self
            .store
            .property(id)
            .ok_or_else(|| rejected(RecordError::UnknownProperty(id)))?;

        let field = |name: &str| payload.field(name).unwrap_or_default();
        let buyer = Owner::new(field("buyerName"), field("buyerNIC"), field("buyerEmail"))
            .map_err(rejected)?;
        let previous = std::mem::replace(&mut property.owner, buyer);
        let plot_number = property.plot_number.clone();
        self.store.update_property(property).map_err(rejected)?;

        let activity = Activity::new(
            ActivityKind::Transfer,
            "Property Transferred",
            &plot_number,
            &self.submitter,
            payload.submitted_at,
        )
        .map_err(rejected)?;
        self.store.record_activity(activity);

        info!(property = %id, plot = %plot_number, from = %previous.name, "ownership transferred");
        Ok(next_receipt(FlowKind::Transfer))
    }
}

#[async_trait]
impl<S> SubmissionTransport for RegistryDesk<S>
where
    S: RegistryStore + 'static,
{
    async fn submit(
        &self,
        payload: &SubmissionPayload,
    ) -> Result<SubmissionReceipt, TransportError> {
        tokio::time::sleep(self.delay).await;
        match payload.flow {
            FlowKind::Registration => self.enqueue_registration(payload),
            FlowKind::Transfer => self.record_transfer(payload),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::registry::catalog::RegistryCatalog;
    use std::collections::BTreeMap;

    fn payload(
        flow: FlowKind,
        property_id: Option<u32>,
        fields: &[(&str, &str)],
    ) -> SubmissionPayload {
        SubmissionPayload {
            flow,
            property_id,
            fields: fields
                .iter()
                .map(|(name, value)| (name.to_string(), value.to_string()))
                .collect::<BTreeMap<_, _>>(),
            documents: Vec::new(),
            submitted_at: Utc::now(),
        }
    }

    fn desk() -> RegistryDesk<RegistryCatalog> {
        let store = Arc::new(RegistryCatalog::seeded().expect("seed data"));
        RegistryDesk::new(store, Duration::ZERO).submitted_by("Alice Johnson")
    }

    #[tokio::test]
    async fn registrations_join_the_queue() {
        let desk = desk();
        let receipt = desk
            .submit(&payload(
                FlowKind::Registration,
                None,
                &[
                    ("propertyTitle", "Residential Plot - Kandy"),
                    ("plotNumber", "KAN-03-2024-017"),
                    ("address", "12 Temple Road"),
                    ("district", "Kandy"),
                    ("province", "Central"),
                    ("landArea", "15.5"),
                ],
            ))
            .await
            .expect("accepted");

        assert_eq!(receipt.reference, "REG-000004");
        let queued = desk
            .store
            .registration(RegistrationId(4))
            .expect("queued registration");
        assert_eq!(queued.status, VerificationStatus::Pending);
        assert_eq!(queued.submitted_by, "Alice Johnson");
        assert_eq!(queued.location, "12 Temple Road, Kandy, Central");
        assert_eq!(queued.land_area.to_string(), "15.5 perches");
    }

    #[tokio::test]
    async fn malformed_registrations_are_rejected() {
        let desk = desk();
        let outcome = desk
            .submit(&payload(
                FlowKind::Registration,
                None,
                &[("propertyTitle", "Plot"), ("plotNumber", "P-1"), ("landArea", "ten")],
            ))
            .await;
        assert!(matches!(outcome, Err(TransportError::Rejected(_))));
        assert_eq!(desk.store.registrations().len(), 3);
    }

    #[tokio::test]
    async fn transfers_change_the_owner() {
        let desk = desk();
        desk.submit(&payload(
            FlowKind::Transfer,
            Some(1),
            &[
                ("buyerName", "Sarah Johnson"),
                ("buyerNIC", "199012345678"),
                ("buyerEmail", "sarah@example.com"),
            ],
        ))
        .await
        .expect("accepted");

        let property = desk.store.property(PropertyId(1)).expect("property 1");
        assert_eq!(property.owner.name, "Sarah Johnson");
        assert_eq!(desk.store.activities()[0].kind, ActivityKind::Transfer);
    }

    #[tokio::test]
    async fn transfers_of_unknown_property_are_rejected() {
        let desk = desk();
        let outcome = desk
            .submit(&payload(FlowKind::Transfer, Some(77), &[]))
            .await;
        assert_eq!(
            outcome,
            Err(TransportError::Rejected("property 77 does not exist".to_string()))
        );
    }
}
