use std::{any::Any, time::Duration};

use async_trait::async_trait;
use serde_json::Value;

use crate::server_info::{APP_NAME, APP_VERSION};

use super::error::BitbucketError;

/// Status code and raw body of a REST call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestResponse {
    pub status: u16,
    pub body: String,
}

impl RestResponse {
    pub fn new<T: Into<String>>(status: u16, body: T) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

#[async_trait]
pub trait RestClient: std::fmt::Debug + Send + Sync {
    /// POST `body` as JSON to `path`, relative to the server base URL.
    async fn post_json(&self, path: &str, body: &Value) -> Result<RestResponse, BitbucketError>;

    fn as_any(&self) -> &dyn Any;
}

#[derive(Debug)]
pub struct Client {
    base_url: String,
    username: String,
    password: String,
    http: reqwest::Client,
}

impl Client {
    pub fn new<T: Into<String>>(base_url: T, username: T, password: T) -> Result<Self, BitbucketError> {
        let http = reqwest::ClientBuilder::new()
            .connect_timeout(Duration::from_secs(10))
            .user_agent(format!("{APP_NAME}/{APP_VERSION}"))
            .build()
            .map_err(BitbucketError::CouldNotBuildClient)?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            username: username.into(),
            password: password.into(),
            http,
        })
    }
}

#[async_trait]
impl RestClient for Client {
    #[tracing::instrument(skip(self, body))]
    async fn post_json(&self, path: &str, body: &Value) -> Result<RestResponse, BitbucketError> {
        let root_url = &self.base_url;
        let resp = self
            .http
            .post(format!("{root_url}{path}"))
            .basic_auth(&self.username, Some(&self.password))
            .json(body)
            .send()
            .await
            .map_err(BitbucketError::CouldNotSendRequest)?;

        let status = resp.status().as_u16();
        let body = resp.text().await.map_err(BitbucketError::MalformedResponse)?;
        tracing::debug!(status = status, "Bitbucket Server answered");

        Ok(RestResponse { status, body })
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
