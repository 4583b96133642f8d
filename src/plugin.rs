use std::path::PathBuf;

use crate::{
    command::CommandBuilder,
    config::Config,
    error::{PluginError, PluginResult},
    kubeconfig,
    resolver::{self, Environment},
    runner::Runner,
};

pub struct Plugin<R> {
    pub config: Config,
    /// Build event, used when no helm command is configured.
    pub event: String,
    pub kubeconfig_template: Option<PathBuf>,
    pub runner: R,
}

impl<R: Runner> Plugin<R> {
    pub async fn exec(&self, env: &impl Environment) -> PluginResult<()> {
        let config = resolver::resolve_secrets(&self.config, env);

        if config.debug {
            match serde_yaml::to_string(&config.redacted()) {
                Ok(dump) => log::debug!("Configuration:\n{}", dump),
                Err(e) => log::debug!("Couldn't serialize configuration: {}", e),
            }
        }

        if config.kube_config.exists() {
            log::info!(
                "Using existing kubeconfig {}",
                config.kube_config.display()
            );
        } else {
            validate(&config)?;
            kubeconfig::write(
                &config,
                self.kubeconfig_template.as_deref(),
                &config.kube_config,
            )
            .map_err(PluginError::Kubeconfig)?;
        }

        let plan = CommandBuilder::new(&config).plan(&self.event)?;

        for args in plan {
            let command = args.join(" ");
            log::debug!("helm command: {}", command);

            self.runner
                .run(&args)
                .await
                .map_err(|source| PluginError::CommandFailed { command, source })?;
        }

        Ok(())
    }
}

/// Credentials needed to generate a kubeconfig.
fn validate(config: &Config) -> PluginResult<()> {
    if config.api_server.is_empty() {
        return Err(PluginError::MissingApiServer);
    }
    if config.token.is_empty() && config.certificate.is_empty() && config.eks_cluster.is_empty()
    {
        return Err(PluginError::MissingToken);
    }
    Ok(())
}
