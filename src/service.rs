use std::sync::Arc;

use crate::{
    backends::bitbucket::{BitbucketError, Client, RestClient},
    config::Config,
};

#[derive(Debug, Clone)]
pub struct ServiceHandler {
    rest_client: Arc<dyn RestClient>,
}

impl ServiceHandler {
    pub fn new(rest_client: Arc<dyn RestClient>) -> Self {
        Self { rest_client }
    }

    pub fn new_defaults(config: &Config) -> Result<Self, BitbucketError> {
        Ok(Self {
            rest_client: Arc::new(Client::new(
                config.bitbucket_url().unwrap_or_default(),
                config.bitbucket_user().unwrap_or_default(),
                config.bitbucket_password().unwrap_or_default(),
            )?),
        })
    }

    pub fn rest(&self) -> &dyn RestClient {
        self.rest_client.as_ref()
    }
}
