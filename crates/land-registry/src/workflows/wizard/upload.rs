use serde::Serialize;
use std::fmt;

use super::domain::{DocumentKind, FileDescriptor, UploadStatus};

/// Identifies one upload attempt. Updates carrying a stale ticket are dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadTicket {
    pub document: DocumentKind,
    pub(crate) generation: u64,
}

/// Upload state for a single document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadSlot {
    document: DocumentKind,
    file: Option<FileDescriptor>,
    status: UploadStatus,
    progress: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    content_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip)]
    generation: u64,
}

impl UploadSlot {
    pub fn empty(document: DocumentKind) -> Self {
        Self {
            document,
            file: None,
            status: UploadStatus::Empty,
            progress: 0,
            content_address: None,
            error: None,
            generation: 0,
        }
    }

    pub fn document(&self) -> DocumentKind {
        self.document
    }

    pub fn file(&self) -> Option<&FileDescriptor> {
        self.file.as_ref()
    }

    pub fn status(&self) -> UploadStatus {
        self.status
    }

    pub fn progress(&self) -> u8 {
        self.progress
    }

    pub fn content_address(&self) -> Option<&str> {
        self.content_address.as_deref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Replaces whatever the slot held and restarts at `Pending`/0.
    pub(crate) fn select_file(&mut self, file: FileDescriptor, generation: u64) -> UploadTicket {
        self.file = Some(file);
        self.status = UploadStatus::Pending;
        self.progress = 0;
        self.content_address = None;
        self.error = None;
        self.generation = generation;
        self.ticket()
    }

    fn ticket(&self) -> UploadTicket {
        UploadTicket {
            document: self.document,
            generation: self.generation,
        }
    }

    fn accepts(&self, ticket: &UploadTicket) -> bool {
        ticket.document == self.document
            && ticket.generation == self.generation
            && self.status == UploadStatus::Pending
    }

    /// Progress only moves forward and tops out at 100.
    pub(crate) fn record_progress(&mut self, ticket: &UploadTicket, progress: u8) -> bool {
        if !self.accepts(ticket) || progress < self.progress || progress > 100 {
            return false;
        }
        self.progress = progress;
        true
    }

    pub(crate) fn complete(&mut self, ticket: &UploadTicket, content_address: String) -> bool {
        if !self.accepts(ticket) || self.progress != 100 {
            return false;
        }
        self.status = UploadStatus::Completed;
        self.content_address = Some(content_address);
        true
    }

    pub(crate) fn fail(&mut self, ticket: &UploadTicket, message: String) -> bool {
        if !self.accepts(ticket) {
            return false;
        }
        self.status = UploadStatus::Errored;
        self.error = Some(message);
        true
    }

    /// Clears the slot back to `Empty`. Refused while an upload is in flight.
    pub fn remove_file(&mut self) -> Result<(), UploadError> {
        if self.status == UploadStatus::Pending {
            return Err(UploadError::InProgress {
                document: self.document,
            });
        }
        self.file = None;
        self.status = UploadStatus::Empty;
        self.progress = 0;
        self.content_address = None;
        self.error = None;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UploadError {
    #[error("{document} is still uploading and cannot be removed")]
    InProgress { document: DocumentKind },
    #[error("{document} is not collected by this flow")]
    UnknownDocument { document: DocumentKind },
}

/// Drop-surface limits: accepted media types, file count and size.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadConstraints {
    pub accepted_media_types: Vec<String>,
    pub max_file_count: usize,
    pub max_size_bytes: u64,
}

impl UploadConstraints {
    pub const DEFAULT_MAX_FILES: usize = 5;
    pub const DEFAULT_MAX_SIZE_BYTES: u64 = 10 * 1024 * 1024;

    pub fn new(
        accepted_media_types: impl IntoIterator<Item = impl Into<String>>,
        max_file_count: usize,
        max_size_bytes: u64,
    ) -> Self {
        Self {
            accepted_media_types: accepted_media_types.into_iter().map(Into::into).collect(),
            max_file_count,
            max_size_bytes,
        }
    }

    /// One PDF or image per document, as the wizard cards allow.
    pub fn single_document(max_size_bytes: u64) -> Self {
        Self {
            max_file_count: 1,
            max_size_bytes,
            ..Self::default()
        }
    }

    pub fn accepts_media_type(&self, media_type: &str) -> bool {
        let Ok(candidate) = media_type.trim().parse::<mime::Mime>() else {
            return false;
        };

        self.accepted_media_types.iter().any(|pattern| {
            let Ok(pattern) = pattern.trim().parse::<mime::Mime>() else {
                return false;
            };
            if pattern.type_() == mime::STAR {
                return true;
            }
            if pattern.subtype() == mime::STAR {
                return pattern.type_() == candidate.type_();
            }
            pattern.essence_str() == candidate.essence_str()
        })
    }

    /// Splits picked files into accepted and rejected without touching any slot.
    /// `already_held` counts files the surface already holds against `max_file_count`.
    pub fn screen(&self, files: Vec<FileDescriptor>, already_held: usize) -> Screening {
        let mut screening = Screening::default();
        let mut remaining = self.max_file_count.saturating_sub(already_held);

        for file in files {
            let reason = if file.size_bytes > self.max_size_bytes {
                Some(RejectionReason::TooLarge {
                    limit_bytes: self.max_size_bytes,
                })
            } else if !self.accepts_media_type(&file.media_type) {
                Some(RejectionReason::UnsupportedType)
            } else if remaining == 0 {
                Some(RejectionReason::TooManyFiles {
                    limit: self.max_file_count,
                })
            } else {
                None
            };

            match reason {
                Some(reason) => screening.rejected.push(UploadRejection {
                    file_name: file.name,
                    reason,
                }),
                None => {
                    remaining -= 1;
                    screening.accepted.push(file);
                }
            }
        }

        screening
    }
}

impl Default for UploadConstraints {
    fn default() -> Self {
        Self::new(
            ["application/pdf", "image/*"],
            Self::DEFAULT_MAX_FILES,
            Self::DEFAULT_MAX_SIZE_BYTES,
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Screening {
    pub accepted: Vec<FileDescriptor>,
    pub rejected: Vec<UploadRejection>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RejectionReason {
    UnsupportedType,
    TooLarge { limit_bytes: u64 },
    TooManyFiles { limit: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadRejection {
    pub file_name: String,
    pub reason: RejectionReason,
}

impl UploadRejection {
    pub fn message(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for UploadRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.reason {
            RejectionReason::UnsupportedType => {
                write!(f, "{}: File type not supported", self.file_name)
            }
            RejectionReason::TooLarge { limit_bytes } => write!(
                f,
                "{}: File size exceeds {}",
                self.file_name,
                format_mebibytes(limit_bytes)
            ),
            RejectionReason::TooManyFiles { limit } => {
                write!(f, "{}: Too many files (maximum {limit})", self.file_name)
            }
        }
    }
}

fn format_mebibytes(bytes: u64) -> String {
    const MIB: u64 = 1024 * 1024;
    if bytes % MIB == 0 {
        format!("{}MB", bytes / MIB)
    } else {
        format!("{:.1}MB", bytes as f64 / MIB as f64)
    }
}
