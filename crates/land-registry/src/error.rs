use crate::config::ConfigError;
use crate::session::SessionError;
use crate::telemetry::TelemetryError;
use crate::workflows::registry::{QueueError, RecordError};
use crate::workflows::wizard::{FlowError, UploadError};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Server(axum::Error),
    Flow(FlowError),
    Queue(QueueError),
    Record(RecordError),
    Session(SessionError),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Flow(err) => match err {
                FlowError::Validation(_) | FlowError::MissingDocuments(_) => {
                    StatusCode::UNPROCESSABLE_ENTITY
                }
                FlowError::Upload(UploadError::InProgress { .. })
                | FlowError::NotAtFinalStep { .. }
                | FlowError::SubmissionInFlight => StatusCode::CONFLICT,
                FlowError::Upload(UploadError::UnknownDocument { .. })
                | FlowError::UnknownField(_) => StatusCode::BAD_REQUEST,
                FlowError::Disposed => StatusCode::GONE,
            },
            AppError::Queue(err) => match err {
                QueueError::NotFound(_) => StatusCode::NOT_FOUND,
                QueueError::AlreadyDecided { .. } => StatusCode::CONFLICT,
                QueueError::Record(_) => StatusCode::UNPROCESSABLE_ENTITY,
            },
            AppError::Record(RecordError::UnknownProperty(_)) => StatusCode::NOT_FOUND,
            AppError::Record(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Session(SessionError::CorruptProfile(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Session(_) => StatusCode::UNAUTHORIZED,
            AppError::Config(_)
            | AppError::Telemetry(_)
            | AppError::Io(_)
            | AppError::Server(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Server(err) => write!(f, "server error: {}", err),
            AppError::Flow(err) => write!(f, "{}", err),
            AppError::Queue(err) => write!(f, "{}", err),
            AppError::Record(err) => write!(f, "{}", err),
            AppError::Session(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Server(err) => Some(err),
            AppError::Flow(err) => Some(err),
            AppError::Queue(err) => Some(err),
            AppError::Record(err) => Some(err),
            AppError::Session(err) => Some(err),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            AppError::Flow(FlowError::Validation(errors)) => {
                Json(json!({ "error": self.to_string(), "fields": errors.errors }))
            }
            _ => Json(json!({ "error": self.to_string() })),
        };
        (status, body).into_response()
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<axum::Error> for AppError {
    fn from(value: axum::Error) -> Self {
        Self::Server(value)
    }
}

impl From<FlowError> for AppError {
    fn from(value: FlowError) -> Self {
        Self::Flow(value)
    }
}

impl From<QueueError> for AppError {
    fn from(value: QueueError) -> Self {
        Self::Queue(value)
    }
}

impl From<RecordError> for AppError {
    fn from(value: RecordError) -> Self {
        Self::Record(value)
    }
}

impl From<SessionError> for AppError {
    fn from(value: SessionError) -> Self {
        Self::Session(value)
    }
}
