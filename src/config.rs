use std::{net::SocketAddr, str::FromStr};

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("Malformed bind IP: '{0}'. Make sure you entered a valid IP.")]
    MalformedBindIp(String),
    #[error("Malformed Bitbucket Server URL: '{0}'. Make sure it is an absolute http(s) URL.")]
    MalformedBaseUrl(String),
    #[error("Missing Bitbucket Server URL. Set SH_BITBUCKET_URL or pass --bitbucket-url.")]
    MissingBaseUrl,
}

#[derive(Debug, Clone)]
pub struct Config {
    telemetry_url: Option<String>,
    bind_ip: String,
    bitbucket_url: Option<String>,
    bitbucket_user: Option<String>,
    bitbucket_password: Option<String>,
    status_key: Option<String>,
    status_name: Option<String>,
    start_description: Option<String>,
    end_description: Option<String>,
    comment_text: Option<String>,
    pull_request_comments: bool,
    verbose: bool,
    codebase: Option<String>,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            telemetry_url: env_to_str("SH_TELEMETRY_URL"),
            bind_ip: env_to_str("SH_BIND_IP").unwrap_or_else(|| "127.0.0.1:3000".into()),
            bitbucket_url: env_to_str("SH_BITBUCKET_URL"),
            bitbucket_user: env_to_str("SH_BITBUCKET_USER"),
            bitbucket_password: env_to_str("SH_BITBUCKET_PASSWORD"),
            status_key: env_to_str("SH_STATUS_KEY"),
            status_name: env_to_str("SH_STATUS_NAME"),
            start_description: env_to_str("SH_START_DESCRIPTION"),
            end_description: env_to_str("SH_END_DESCRIPTION"),
            comment_text: env_to_str("SH_COMMENT_TEXT"),
            pull_request_comments: env_to_bool("SH_PR_COMMENTS").unwrap_or(true),
            verbose: env_to_bool("SH_VERBOSE").unwrap_or(false),
            codebase: env_to_str("SH_CODEBASE"),
        }
    }

    pub fn empty() -> Self {
        Self {
            telemetry_url: None,
            bind_ip: "".into(),
            bitbucket_url: None,
            bitbucket_user: None,
            bitbucket_password: None,
            status_key: None,
            status_name: None,
            start_description: None,
            end_description: None,
            comment_text: None,
            pull_request_comments: true,
            verbose: false,
            codebase: None,
        }
    }

    pub fn telemetry_url(&self) -> Option<&str> {
        self.telemetry_url.as_deref()
    }

    pub fn bind_ip(&self) -> &str {
        &self.bind_ip
    }

    pub fn bitbucket_url(&self) -> Option<&str> {
        self.bitbucket_url.as_deref()
    }

    pub fn bitbucket_user(&self) -> Option<&str> {
        self.bitbucket_user.as_deref()
    }

    pub fn bitbucket_password(&self) -> Option<&str> {
        self.bitbucket_password.as_deref()
    }

    pub fn status_key(&self) -> Option<&str> {
        self.status_key.as_deref()
    }

    pub fn status_name(&self) -> Option<&str> {
        self.status_name.as_deref()
    }

    pub fn start_description(&self) -> Option<&str> {
        self.start_description.as_deref()
    }

    pub fn end_description(&self) -> Option<&str> {
        self.end_description.as_deref()
    }

    pub fn comment_text(&self) -> Option<&str> {
        self.comment_text.as_deref()
    }

    pub fn pull_request_comments(&self) -> bool {
        self.pull_request_comments
    }

    pub fn verbose(&self) -> bool {
        self.verbose
    }

    pub fn codebase(&self) -> Option<&str> {
        self.codebase.as_deref()
    }

    pub fn set_telemetry_url<T: Into<String>>(&mut self, value: T) {
        self.telemetry_url = Some(value.into());
    }

    pub fn set_bind_ip<T: Into<String>>(&mut self, value: T) {
        self.bind_ip = value.into();
    }

    pub fn set_bitbucket_url<T: Into<String>>(&mut self, value: T) {
        self.bitbucket_url = Some(value.into());
    }

    pub fn set_bitbucket_user<T: Into<String>>(&mut self, value: T) {
        self.bitbucket_user = Some(value.into());
    }

    pub fn set_bitbucket_password<T: Into<String>>(&mut self, value: T) {
        self.bitbucket_password = Some(value.into());
    }

    pub fn set_status_key<T: Into<String>>(&mut self, value: T) {
        self.status_key = Some(value.into());
    }

    pub fn set_status_name<T: Into<String>>(&mut self, value: T) {
        self.status_name = Some(value.into());
    }

    pub fn set_start_description<T: Into<String>>(&mut self, value: T) {
        self.start_description = Some(value.into());
    }

    pub fn set_end_description<T: Into<String>>(&mut self, value: T) {
        self.end_description = Some(value.into());
    }

    pub fn set_comment_text<T: Into<String>>(&mut self, value: T) {
        self.comment_text = Some(value.into());
    }

    pub fn set_pull_request_comments(&mut self, value: bool) {
        self.pull_request_comments = value;
    }

    pub fn set_verbose(&mut self, value: bool) {
        self.verbose = value;
    }

    pub fn set_codebase<T: Into<String>>(&mut self, value: T) {
        self.codebase = Some(value.into());
    }

    pub fn validate_configuration(&self) -> Result<(), ConfigError> {
        SocketAddr::from_str(&self.bind_ip)
            .map_err(|_| ConfigError::MalformedBindIp(self.bind_ip.clone()))?;

        if let Some(u) = &self.bitbucket_url {
            let parsed =
                url::Url::parse(u).map_err(|_| ConfigError::MalformedBaseUrl(u.clone()))?;
            if !matches!(parsed.scheme(), "http" | "https") {
                return Err(ConfigError::MalformedBaseUrl(u.clone()));
            }
        }

        Ok(())
    }

    /// Reporting needs a server to talk to.
    pub fn validate_reporter_configuration(&self) -> Result<(), ConfigError> {
        match self.bitbucket_url {
            Some(_) => Ok(()),
            None => Err(ConfigError::MissingBaseUrl),
        }
    }
}

fn env_to_str(env_key: &str) -> Option<String> {
    std::env::var(env_key).ok().filter(|s| !s.is_empty())
}

fn env_to_bool(env_key: &str) -> Option<bool> {
    env_to_str(env_key).map(|s| parse_bool(&s))
}

fn parse_bool(value: &str) -> bool {
    matches!(
        &value.trim().to_lowercase()[..],
        "1" | "true" | "yes" | "on"
    )
}
