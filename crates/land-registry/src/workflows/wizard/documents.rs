use std::collections::BTreeMap;

use super::domain::{DocumentKind, DocumentRequirement, FileDescriptor, UploadStatus};
use super::upload::{UploadError, UploadSlot, UploadTicket};

/// Upload slots keyed by document kind. Keys are fixed by the flow's requirements;
/// a slot only exists once a file has been accepted for it.
#[derive(Debug, Clone)]
pub struct DocumentCollection {
    requirements: Vec<DocumentRequirement>,
    slots: BTreeMap<DocumentKind, UploadSlot>,
    next_generation: u64,
}

impl DocumentCollection {
    pub fn new(requirements: &[DocumentRequirement]) -> Self {
        Self {
            requirements: requirements.to_vec(),
            slots: BTreeMap::new(),
            next_generation: 0,
        }
    }

    pub fn requirements(&self) -> &[DocumentRequirement] {
        &self.requirements
    }

    pub fn requirement(&self, document: DocumentKind) -> Option<&DocumentRequirement> {
        self.requirements
            .iter()
            .find(|requirement| requirement.document == document)
    }

    pub fn slot(&self, document: DocumentKind) -> Option<&UploadSlot> {
        self.slots.get(&document)
    }

    pub fn status(&self, document: DocumentKind) -> UploadStatus {
        self.slot(document)
            .map(UploadSlot::status)
            .unwrap_or(UploadStatus::Empty)
    }

    fn ensure_known(&self, document: DocumentKind) -> Result<(), UploadError> {
        match self.requirement(document) {
            Some(_) => Ok(()),
            None => Err(UploadError::UnknownDocument { document }),
        }
    }

    /// Puts `file` into the slot for `document`, replacing any previous file.
    pub(crate) fn select_file(
        &mut self,
        document: DocumentKind,
        file: FileDescriptor,
    ) -> Result<UploadTicket, UploadError> {
        self.ensure_known(document)?;
        self.next_generation += 1;
        let generation = self.next_generation;
        let slot = self
            .slots
            .entry(document)
            .or_insert_with(|| UploadSlot::empty(document));
        Ok(slot.select_file(file, generation))
    }

    pub(crate) fn record_progress(&mut self, ticket: &UploadTicket, progress: u8) -> bool {
        self.slots
            .get_mut(&ticket.document)
            .is_some_and(|slot| slot.record_progress(ticket, progress))
    }

    pub(crate) fn complete(&mut self, ticket: &UploadTicket, content_address: String) -> bool {
        self.slots
            .get_mut(&ticket.document)
            .is_some_and(|slot| slot.complete(ticket, content_address))
    }

    pub(crate) fn fail(&mut self, ticket: &UploadTicket, message: String) -> bool {
        self.slots
            .get_mut(&ticket.document)
            .is_some_and(|slot| slot.fail(ticket, message))
    }

    pub fn remove_file(&mut self, document: DocumentKind) -> Result<(), UploadError> {
        self.ensure_known(document)?;
        match self.slots.get_mut(&document) {
            Some(slot) => slot.remove_file(),
            None => Ok(()),
        }
    }

    /// Required documents whose slot has not reached `Completed`.
    pub fn missing_required(&self) -> Vec<DocumentKind> {
        self.requirements
            .iter()
            .filter(|requirement| requirement.required)
            .map(|requirement| requirement.document)
            .filter(|document| self.status(*document) != UploadStatus::Completed)
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.missing_required().is_empty()
    }

    pub fn completed(&self) -> impl Iterator<Item = &UploadSlot> {
        self.slots
            .values()
            .filter(|slot| slot.status() == UploadStatus::Completed)
    }

    /// Drops every slot. Generations keep counting so in-flight tickets stay stale.
    pub fn clear(&mut self) {
        self.slots.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn requirements() -> Vec<DocumentRequirement> {
        vec![
            DocumentRequirement::required(DocumentKind::TitleDeed),
            DocumentRequirement::required(DocumentKind::SurveyPlan),
            DocumentRequirement::optional(DocumentKind::TaxReceipts),
        ]
    }

    fn pdf(name: &str) -> FileDescriptor {
        FileDescriptor::new(name, 2_048, "application/pdf")
    }

    #[test]
    fn unknown_documents_are_refused() {
        let mut collection = DocumentCollection::new(&requirements());
        assert_eq!(
            collection.select_file(DocumentKind::PaymentProof, pdf("pay.pdf")),
            Err(UploadError::UnknownDocument {
                document: DocumentKind::PaymentProof
            })
        );
        assert!(collection.slot(DocumentKind::PaymentProof).is_none());
    }

    #[test]
    fn missing_required_tracks_completion() {
        let mut collection = DocumentCollection::new(&requirements());
        assert_eq!(
            collection.missing_required(),
            vec![DocumentKind::TitleDeed, DocumentKind::SurveyPlan]
        );

        let ticket = collection
            .select_file(DocumentKind::TitleDeed, pdf("deed.pdf"))
            .expect("known document");
        assert!(collection.record_progress(&ticket, 100));
        assert!(collection.complete(&ticket, "QmDeed".to_string()));

        assert_eq!(collection.missing_required(), vec![DocumentKind::SurveyPlan]);
        assert!(!collection.is_complete());
    }

    #[test]
    fn tickets_issued_before_clear_stay_stale() {
        let mut collection = DocumentCollection::new(&requirements());
        let before = collection
            .select_file(DocumentKind::TitleDeed, pdf("deed.pdf"))
            .expect("known document");
        collection.clear();
        let after = collection
            .select_file(DocumentKind::TitleDeed, pdf("deed-v2.pdf"))
            .expect("known document");

        assert_ne!(before, after);
        assert!(!collection.record_progress(&before, 10));
        assert!(collection.record_progress(&after, 10));
    }
}
