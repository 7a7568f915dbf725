use std::{net::SocketAddr, str::FromStr};

use axum::{
    extract::Extension,
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};

use tower::ServiceBuilder;
use tower_http::{trace::TraceLayer, ServiceBuilderExt};

use crate::{
    backends::bitbucket::WebhookEventNormalizer,
    config::{Config, ConfigError},
    error::{ErrorCode, ErrorCodeDetail},
    server_info::ServerInfo,
};

pub const WEBHOOK_PATH: &str = "/change_hook/bitbucketserver";

impl IntoResponse for ErrorCode {
    fn into_response(self) -> Response {
        let details: ErrorCodeDetail = (&self).into();
        (details.status_code(), Json(details)).into_response()
    }
}

#[tracing::instrument]
async fn root() -> Json<ServerInfo> {
    Json(ServerInfo::new())
}

#[tracing::instrument(skip(normalizer))]
pub async fn start_server(
    config: Config,
    normalizer: WebhookEventNormalizer,
) -> color_eyre::Result<()> {
    let addr = SocketAddr::from_str(config.bind_ip())
        .map_err(|_| ConfigError::MalformedBindIp(config.bind_ip().to_owned()))?;
    let app = build_http_router(normalizer);
    tracing::info!("listening on {}", addr);

    axum::Server::bind(&addr)
        .serve(app.into_make_service())
        .await?;

    Ok(())
}

pub(crate) fn build_http_router(normalizer: WebhookEventNormalizer) -> Router {
    let middleware = ServiceBuilder::new()
        .layer(TraceLayer::new_for_http())
        .insert_response_header_if_not_present(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );

    Router::new()
        .route("/", get(root))
        .route(
            WEBHOOK_PATH,
            post(super::backends::bitbucket::webhook),
        )
        .layer(middleware.into_inner())
        .layer(Extension(normalizer))
}
