use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use listpull_engine::{
    traits::{EmailQueueError, StaffStoreError},
    OrderFlowError,
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("Could not read request body: {0}")]
    InvalidRequestBody(String),
    #[error("Could not read request path: {0}")]
    InvalidRequestPath(String),
    #[error("Could not read query parameters: {0}")]
    InvalidQuery(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("The server stopped unexpectedly. {0}")]
    Unspecified(String),
    #[error("The data was not found. {0}")]
    NoRecordFound(String),
    #[error("The request conflicts with the current state of the order. {0}")]
    Conflict(String),
    #[error("A valid staff API token is required.")]
    MissingStaffToken,
    #[error("The staff API is disabled on this server.")]
    StaffApiDisabled,
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            Self::InvalidRequestPath(_) => StatusCode::BAD_REQUEST,
            Self::InvalidQuery(_) => StatusCode::BAD_REQUEST,
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::NoRecordFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::MissingStaffToken => StatusCode::UNAUTHORIZED,
            Self::StaffApiDisabled => StatusCode::FORBIDDEN,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .body(serde_json::json!({ "error": self.to_string() }).to_string())
    }
}

impl From<OrderFlowError> for ServerError {
    fn from(e: OrderFlowError) -> Self {
        match e {
            OrderFlowError::OrderNotFound(_) => Self::NoRecordFound(e.to_string()),
            OrderFlowError::InvalidOrder(_) | OrderFlowError::InvalidDecklist(_) => {
                Self::InvalidRequestBody(e.to_string())
            },
            OrderFlowError::TerminalStatus { .. } |
            OrderFlowError::UnchangedStatus { .. } |
            OrderFlowError::ConcurrentUpdate(_) => Self::Conflict(e.to_string()),
            OrderFlowError::DatabaseError(_) |
            OrderFlowError::OrderNumberExhausted(_) |
            OrderFlowError::EmailQueueError(_) => Self::BackendError(e.to_string()),
        }
    }
}

impl From<EmailQueueError> for ServerError {
    fn from(e: EmailQueueError) -> Self {
        Self::BackendError(e.to_string())
    }
}

impl From<StaffStoreError> for ServerError {
    fn from(e: StaffStoreError) -> Self {
        Self::BackendError(e.to_string())
    }
}
