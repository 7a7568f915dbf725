use axum::http::StatusCode;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ErrorCode {
    MissingEventHeader,
    MalformedEventHeader,
    UnsupportedContentType(String),
    UnknownEventType(String),
    MalformedEventBody(#[from] serde_json::Error),
    MalformedEventBodyField(String, String),
}

#[derive(Serialize)]
pub struct ErrorCodeDetail {
    #[serde(skip)]
    status_code: StatusCode,
    internal_code: u32,
    message: String,
}

impl ErrorCode {
    pub fn details(&self) -> ErrorCodeDetail {
        self.into()
    }

    pub(crate) fn missing_field<T: Into<String>>(field: T) -> Self {
        Self::MalformedEventBodyField(field.into(), "missing value".into())
    }
}

impl ErrorCodeDetail {
    pub fn with_status_code<T: Into<String>>(
        status_code: StatusCode,
        internal_code: u32,
        message: T,
    ) -> Self {
        Self {
            internal_code,
            status_code,
            message: message.into(),
        }
    }

    pub fn bad_request<T: Into<String>>(internal_code: u32, message: T) -> Self {
        Self::with_status_code(StatusCode::BAD_REQUEST, internal_code, message)
    }

    pub fn status_code(&self) -> StatusCode {
        self.status_code
    }

    pub fn internal_code(&self) -> u32 {
        self.internal_code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<&ErrorCode> for ErrorCodeDetail {
    fn from(value: &ErrorCode) -> Self {
        match value {
            ErrorCode::MissingEventHeader => Self::bad_request(1, "Missing X-Event-Key header"),
            ErrorCode::MalformedEventHeader => Self::bad_request(2, "Malformed event header"),
            ErrorCode::UnsupportedContentType(content_type) => {
                Self::bad_request(3, format!("Unknown content type: '{}'", content_type))
            }
            ErrorCode::UnknownEventType(event) => {
                Self::bad_request(4, format!("Unknown event: '{}'", event))
            }
            ErrorCode::MalformedEventBody(e) => {
                Self::bad_request(5, format!("Malformed event body: '{}'", e))
            }
            ErrorCode::MalformedEventBodyField(field, e) => Self::bad_request(
                6,
                format!("Malformed event body field '{}': '{}'", field, e),
            ),
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let detail = ErrorCodeDetail::from(self);
        f.write_str(&detail.message)
    }
}
