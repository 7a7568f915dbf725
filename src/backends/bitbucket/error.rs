use thiserror::Error;

#[derive(Debug, Error)]
pub enum BitbucketError {
    #[error("error while building HTTP client.")]
    CouldNotBuildClient(#[source] reqwest::Error),

    #[error("error while sending request to Bitbucket Server.")]
    CouldNotSendRequest(#[source] reqwest::Error),

    #[error("error while reading Bitbucket Server response.")]
    MalformedResponse(#[source] reqwest::Error),
}

#[derive(Debug, Error)]
pub enum ReporterError {
    #[error("Unable to get commit hash for codebase '{0}'")]
    MissingRevision(String),

    #[error("Missing build property '{0}'")]
    MissingProperty(&'static str),

    #[error("Malformed pull request URL: '{0}'")]
    MalformedPullRequestUrl(String),

    #[error("{code}: Unable to send {action}: {body}")]
    RemoteApi {
        code: u16,
        action: &'static str,
        body: String,
    },

    #[error(transparent)]
    Transport(#[from] BitbucketError),
}
