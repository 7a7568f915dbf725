use axum::{extract::Extension, http::HeaderMap, Json};

use crate::{changes::ChangeBatch, error::ErrorCode};

use super::{WebhookEventNormalizer, WebhookRequest, CONTENT_TYPE_HEADER, EVENT_HEADER};

fn header_str(headers: &HeaderMap, key: &str) -> Result<Option<String>, ErrorCode> {
    headers
        .get(key)
        .map(|v| {
            v.to_str()
                .map(str::to_owned)
                .map_err(|_| ErrorCode::MalformedEventHeader)
        })
        .transpose()
}

#[tracing::instrument(skip_all, fields(event = ?headers.get(EVENT_HEADER)))]
pub async fn webhook(
    headers: HeaderMap,
    normalizer: Extension<WebhookEventNormalizer>,
    body: String,
) -> Result<Json<ChangeBatch>, ErrorCode> {
    let request = WebhookRequest {
        event_key: header_str(&headers, EVENT_HEADER)?,
        content_type: header_str(&headers, CONTENT_TYPE_HEADER)?,
        body,
    };

    let batch = normalizer.process(&request).map_err(|e| {
        tracing::warn!(error = %e, "Rejected webhook delivery");
        e
    })?;

    Ok(Json(batch))
}
