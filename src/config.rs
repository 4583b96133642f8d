use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use serde::Serialize;

/// Runtime options of a single plugin invocation.
#[derive(Parser, Debug)]
#[command(name = "drone-helm", about = "Run helm from a Drone pipeline step")]
pub struct Args {
    #[command(flatten)]
    pub config: Config,

    /// Pipeline event that triggered the build (push, tag, delete, ...)
    #[arg(long, env = "DRONE_BUILD_EVENT", default_value = "")]
    pub event: String,

    #[arg(long, env = "PLUGIN_HELM_BIN", default_value = "/bin/helm")]
    pub helm_bin: PathBuf,

    /// Template for the kubeconfig file. The built-in one is used when unset.
    #[arg(long, env = "PLUGIN_KUBECONFIG_TEMPLATE")]
    pub kubeconfig_template: Option<PathBuf>,
}

#[derive(ValueEnum, Serialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HelmVersion {
    #[default]
    V2,
    V3,
}

#[derive(clap::Args, Serialize, Clone, Debug, Default)]
pub struct Config {
    #[arg(long, env = "PLUGIN_API_SERVER", default_value = "")]
    pub api_server: String,
    #[arg(long, env = "PLUGIN_TOKEN", default_value = "")]
    pub token: String,
    #[arg(long, env = "PLUGIN_CERTIFICATE", default_value = "")]
    pub certificate: String,
    #[arg(long, env = "PLUGIN_SERVICE_ACCOUNT", default_value = "")]
    pub service_account: String,
    #[arg(long, env = "PLUGIN_KUBE_CONFIG", default_value = "/root/.kube/config")]
    pub kube_config: PathBuf,
    #[arg(long, env = "PLUGIN_SKIP_TLS_VERIFY")]
    pub skip_tls_verify: bool,
    #[arg(long, env = "PLUGIN_EKS_CLUSTER", default_value = "")]
    pub eks_cluster: String,
    #[arg(long, env = "PLUGIN_EKS_ROLE_ARN", default_value = "")]
    pub eks_role_arn: String,

    #[arg(long, env = "PLUGIN_CHART", default_value = "")]
    pub chart: String,
    #[arg(long, env = "PLUGIN_VERSION", default_value = "")]
    pub version: String,
    #[arg(long, env = "PLUGIN_RELEASE", default_value = "")]
    pub release: String,
    #[arg(long, env = "PLUGIN_NAMESPACE", default_value = "")]
    pub namespace: String,

    /// Comma separated `key=value` pairs passed to `--set`
    #[arg(long, env = "PLUGIN_VALUES", default_value = "")]
    pub values: String,
    /// Comma separated `key=value` pairs passed to `--set-string`
    #[arg(long, env = "PLUGIN_STRING_VALUES", default_value = "")]
    pub string_values: String,
    /// Comma separated list of values files
    #[arg(long, env = "PLUGIN_VALUES_FILES", default_value = "")]
    pub values_files: String,

    #[arg(long, env = "PLUGIN_DEBUG")]
    pub debug: bool,
    #[arg(long, env = "PLUGIN_DRY_RUN")]
    pub dry_run: bool,
    #[arg(long, env = "PLUGIN_WAIT")]
    pub wait: bool,
    #[arg(long, env = "PLUGIN_RECREATE_PODS")]
    pub recreate_pods: bool,
    #[arg(long, env = "PLUGIN_REUSE_VALUES")]
    pub reuse_values: bool,
    #[arg(long, env = "PLUGIN_FORCE")]
    pub force: bool,
    #[arg(long, env = "PLUGIN_PURGE")]
    pub purge: bool,
    #[arg(long, env = "PLUGIN_TIMEOUT", default_value = "")]
    pub timeout: String,

    #[arg(long, env = "PLUGIN_TILLER_NS", default_value = "")]
    pub tiller_ns: String,
    #[arg(long, env = "PLUGIN_CLIENT_ONLY")]
    pub client_only: bool,
    /// Upgrade tiller itself during init
    #[arg(long, env = "PLUGIN_UPGRADE")]
    pub upgrade: bool,
    #[arg(long, env = "PLUGIN_CANARY_IMAGE")]
    pub canary_image: bool,
    #[arg(long, env = "PLUGIN_STABLE_REPO_URL", default_value = "")]
    pub stable_repo_url: String,

    /// Repositories to add, as `name=url`
    #[arg(long, env = "PLUGIN_HELM_REPOS", value_delimiter = ',')]
    pub helm_repos: Vec<String>,
    #[arg(long, env = "PLUGIN_UPDATE_DEPENDENCIES")]
    pub update_dependencies: bool,

    /// Prefix tried first when resolving `$VAR` placeholders
    #[arg(long, env = "PLUGIN_PREFIX", default_value = "")]
    pub prefix: String,
    /// Deprecated: placeholders are now detected automatically
    #[arg(long, env = "PLUGIN_SECRETS", value_delimiter = ',')]
    pub secrets: Vec<String>,

    /// One of upgrade, delete or lint. Empty selects by build event.
    #[arg(long, env = "PLUGIN_HELM_COMMAND", default_value = "")]
    pub helm_command: String,
    #[arg(long, env = "PLUGIN_HELM_VERSION", value_enum, default_value_t = HelmVersion::V2)]
    pub helm_version: HelmVersion,
}

impl Config {
    /// Copy safe to print: credentials are masked.
    pub fn redacted(&self) -> Config {
        let mask = |s: &str| {
            if s.is_empty() {
                String::new()
            } else {
                "********".to_string()
            }
        };

        Config {
            token: mask(&self.token),
            certificate: mask(&self.certificate),
            ..self.clone()
        }
    }
}
