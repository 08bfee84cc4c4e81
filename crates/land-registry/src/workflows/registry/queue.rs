use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::catalog::RegistryStore;
use super::domain::{
    Activity, ActivityKind, PendingRegistration, Priority, RecordError, RegistrationId,
    VerificationStatus,
};
use crate::workflows::wizard::{Notification, NotificationSink, Severity};

/// Queue tab selection. `All` includes decided registrations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusFilter {
    #[default]
    All,
    Pending,
    UnderReview,
}

impl StatusFilter {
    pub fn matches(self, status: VerificationStatus) -> bool {
        match self {
            Self::All => true,
            Self::Pending => status == VerificationStatus::Pending,
            Self::UnderReview => status == VerificationStatus::UnderReview,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct QueueCounts {
    pub pending: usize,
    pub under_review: usize,
    pub high_priority: usize,
    pub total: usize,
}

/// An officer's verdict on one registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    pub outcome: VerificationStatus,
    pub officer: String,
    pub note: Option<String>,
    pub decided_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum QueueError {
    #[error("registration {0} is not in the verification queue")]
    NotFound(RegistrationId),
    #[error("registration {id} has already been decided ({})", status.label())]
    AlreadyDecided {
        id: RegistrationId,
        status: VerificationStatus,
    },
    #[error(transparent)]
    Record(#[from] RecordError),
}

/// Administrative review of submitted registrations.
pub struct VerificationQueue<S> {
    store: Arc<S>,
    notifier: Arc<dyn NotificationSink>,
    review_delay: Duration,
}

impl<S> VerificationQueue<S>
where
    S: RegistryStore + 'static,
{
    pub fn new(store: Arc<S>, notifier: Arc<dyn NotificationSink>, review_delay: Duration) -> Self {
        Self {
            store,
            notifier,
            review_delay,
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn list(&self, filter: StatusFilter) -> Vec<PendingRegistration> {
        self.store
            .registrations()
            .into_iter()
            .filter(|registration| filter.matches(registration.status))
            .collect()
    }

    pub fn counts(&self) -> QueueCounts {
        let registrations = self.store.registrations();
        let open = || registrations.iter().filter(|entry| entry.status.is_open());
        QueueCounts {
            pending: open()
                .filter(|entry| entry.status == VerificationStatus::Pending)
                .count(),
            under_review: open()
                .filter(|entry| entry.status == VerificationStatus::UnderReview)
                .count(),
            high_priority: open()
                .filter(|entry| entry.priority == Priority::High)
                .count(),
            total: registrations.len(),
        }
    }

    pub fn detail(&self, id: RegistrationId) -> Result<PendingRegistration, QueueError> {
        self.store.registration(id).ok_or(QueueError::NotFound(id))
    }

    pub async fn approve(
        &self,
        id: RegistrationId,
        officer: &str,
    ) -> Result<PendingRegistration, QueueError> {
        self.decide(id, VerificationStatus::Verified, officer, None)
            .await
    }

    pub async fn reject(
        &self,
        id: RegistrationId,
        officer: &str,
        note: Option<String>,
    ) -> Result<PendingRegistration, QueueError> {
        self.decide(id, VerificationStatus::Rejected, officer, note)
            .await
    }

    async fn decide(
        &self,
        id: RegistrationId,
        outcome: VerificationStatus,
        officer: &str,
        note: Option<String>,
    ) -> Result<PendingRegistration, QueueError> {
        let verb = match outcome {
            VerificationStatus::Verified => "approve",
            _ => "reject",
        };

        let result = self.apply(id, outcome, officer, note).await;
        match &result {
            Ok(registration) => {
                info!(
                    registration = %id,
                    plot = %registration.plot_number,
                    officer,
                    status = registration.status.label(),
                    "verification decision recorded"
                );
                let notification = match outcome {
                    VerificationStatus::Verified => Notification::new(
                        "Property registration approved successfully!",
                        Severity::Success,
                    ),
                    _ => Notification::new("Property registration rejected", Severity::Warning),
                };
                self.notifier.notify(notification);
            }
            Err(error) => {
                warn!(registration = %id, officer, error = %error, "verification decision failed");
                self.notifier.notify(Notification::new(
                    format!("Failed to {verb} registration"),
                    Severity::Error,
                ));
            }
        }
        result
    }

    async fn apply(
        &self,
        id: RegistrationId,
        outcome: VerificationStatus,
        officer: &str,
        note: Option<String>,
    ) -> Result<PendingRegistration, QueueError> {
        let current = self.detail(id)?;
        if !current.status.is_open() {
            return Err(QueueError::AlreadyDecided {
                id,
                status: current.status,
            });
        }

        let (kind, action) = match outcome {
            VerificationStatus::Verified => (ActivityKind::Verification, "Property Verified"),
            _ => (ActivityKind::Rejection, "Application Rejected"),
        };
        let decided_at = Utc::now();
        let activity = Activity::new(kind, action, &current.plot_number, officer, decided_at)?;

        tokio::time::sleep(self.review_delay).await;

        let decision = Decision {
            outcome,
            officer: officer.trim().to_string(),
            note,
            decided_at,
        };
        let decided = self.store.decide(id, &decision)?;
        self.store.record_activity(activity);
        Ok(decided)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::registry::catalog::RegistryCatalog;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder(Mutex<Vec<Notification>>);

    impl NotificationSink for Recorder {
        fn notify(&self, notification: Notification) {
            self.0.lock().expect("recorder poisoned").push(notification);
        }
    }

    fn queue() -> (VerificationQueue<RegistryCatalog>, Arc<Recorder>) {
        let store = Arc::new(RegistryCatalog::seeded().expect("seed data"));
        let recorder = Arc::new(Recorder::default());
        let queue = VerificationQueue::new(store, recorder.clone(), Duration::ZERO);
        (queue, recorder)
    }

    #[test]
    fn filters_by_tab() {
        let (queue, _) = queue();
        assert_eq!(queue.list(StatusFilter::All).len(), 3);
        assert_eq!(queue.list(StatusFilter::Pending).len(), 2);
        let under_review = queue.list(StatusFilter::UnderReview);
        assert_eq!(under_review.len(), 1);
        assert_eq!(under_review[0].plot_number, "KAN-2024-002");
        assert_eq!(
            queue.counts(),
            QueueCounts {
                pending: 2,
                under_review: 1,
                high_priority: 1,
                total: 3
            }
        );
    }

    #[tokio::test]
    async fn approval_verifies_and_notifies() {
        let (queue, recorder) = queue();

        let decided = queue
            .approve(RegistrationId(1), "Sarah Johnson")
            .await
            .expect("open registration");

        assert_eq!(decided.status, VerificationStatus::Verified);
        assert_eq!(decided.decided_by.as_deref(), Some("Sarah Johnson"));
        let notes = recorder.0.lock().expect("recorder poisoned").clone();
        assert_eq!(
            notes,
            vec![Notification::new(
                "Property registration approved successfully!",
                Severity::Success
            )]
        );
        let activity = &queue.store().activities()[0];
        assert_eq!(activity.kind, ActivityKind::Verification);
        assert_eq!(activity.plot_number, "GAL-2024-001");
        let sarah = queue
            .store()
            .officers()
            .into_iter()
            .find(|officer| officer.name == "Sarah Johnson")
            .expect("seeded officer");
        assert_eq!(sarah.verifications_today, 9);
    }

    #[tokio::test]
    async fn decisions_are_final() {
        let (queue, recorder) = queue();
        queue
            .reject(RegistrationId(3), "Emily Davis", Some("survey mismatch".to_string()))
            .await
            .expect("open registration");

        match queue.approve(RegistrationId(3), "Sarah Johnson").await {
            Err(QueueError::AlreadyDecided { id, status }) => {
                assert_eq!(id, RegistrationId(3));
                assert_eq!(status, VerificationStatus::Rejected);
            }
            other => panic!("expected already decided, got {other:?}"),
        }

        let severities: Vec<Severity> = recorder
            .0
            .lock()
            .expect("recorder poisoned")
            .iter()
            .map(|note| note.severity)
            .collect();
        assert_eq!(severities, vec![Severity::Warning, Severity::Error]);
    }

    #[tokio::test]
    async fn unknown_registrations_are_not_found() {
        let (queue, _) = queue();
        match queue.reject(RegistrationId(42), "Emily Davis", None).await {
            Err(QueueError::NotFound(id)) => assert_eq!(id, RegistrationId(42)),
            other => panic!("expected not found, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn blank_officer_is_refused() {
        let (queue, _) = queue();
        match queue.approve(RegistrationId(2), "  ").await {
            Err(QueueError::Record(RecordError::Blank { field })) => assert_eq!(field, "actor"),
            other => panic!("expected blank actor, got {other:?}"),
        }
        assert!(queue
            .detail(RegistrationId(2))
            .is_ok_and(|registration| registration.status.is_open()));
    }
}
