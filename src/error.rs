use thiserror::Error;

#[derive(Error, Debug)]
pub enum PluginError {
    #[error("API server is needed to deploy")]
    MissingApiServer,

    #[error("token is needed to deploy")]
    MissingToken,

    #[error("invalid repo definition: {0}")]
    InvalidRepo(String),

    #[error("error running helm command: {command} -- {source}")]
    CommandFailed {
        command: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("failed to write kubeconfig: {0}")]
    Kubeconfig(#[source] anyhow::Error),
}

pub type PluginResult<T> = Result<T, PluginError>;
