use std::{io::Write, path::Path};

use anyhow::{Context, Result};
use minijinja::{Environment, UndefinedBehavior};
use tempfile::NamedTempFile;

use crate::config::Config;

pub const DEFAULT_TEMPLATE: &str = include_str!("../templates/kubeconfig.j2");

pub fn render(config: &Config, template: &str) -> Result<String> {
    let mut env = Environment::new();
    env.set_undefined_behavior(UndefinedBehavior::Strict);

    let mut rendered = env
        .render_str(template, config)
        .context("rendering kubeconfig template")?;
    rendered.push('\n');
    Ok(rendered)
}

/// Renders the kubeconfig for `config` and atomically writes it to `target`.
pub fn write(config: &Config, template: Option<&Path>, target: &Path) -> Result<()> {
    let source = match template {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("reading template {}", path.display()))?,
        None => DEFAULT_TEMPLATE.to_string(),
    };
    let rendered = render(config, &source)?;

    let dir = match target.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;

    let mut file = NamedTempFile::new_in(dir)?;
    file.write_all(rendered.as_bytes())?;
    file.persist(target)
        .with_context(|| format!("writing {}", target.display()))?;

    log::info!("Wrote kubeconfig to {}", target.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    fn cluster() -> Config {
        Config {
            api_server: "http://myapiserver".to_string(),
            certificate: "my-cert-data".to_string(),
            service_account: "default-account".to_string(),
            namespace: "default".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn renders_token_user() {
        let config = Config {
            token: "secret-token".to_string(),
            ..cluster()
        };
        let rendered = render(&config, DEFAULT_TEMPLATE).unwrap();

        assert!(rendered.contains("server: http://myapiserver"));
        assert!(rendered.contains("token: secret-token"));
        assert!(rendered.contains("certificate-authority-data: my-cert-data"));
        assert!(rendered.contains("user: default-account"));
        assert!(rendered.contains("namespace: default"));
        assert!(!rendered.contains("aws-iam-authenticator"));
        assert!(!rendered.contains("insecure-skip-tls-verify"));
    }

    #[test]
    fn renders_eks_user() {
        let config = Config {
            eks_cluster: "my-eks-cluster-name".to_string(),
            eks_role_arn: "my-eks-role-arn".to_string(),
            ..cluster()
        };
        let rendered = render(&config, DEFAULT_TEMPLATE).unwrap();

        assert!(!rendered.contains("token:"));
        assert!(rendered.contains("aws-iam-authenticator"));
        assert!(rendered.contains("\"my-eks-cluster-name\""));
        assert!(rendered.contains("\"my-eks-role-arn\""));
        assert!(rendered.contains("certificate-authority-data: my-cert-data"));
    }

    #[test]
    fn skip_tls_verify_replaces_certificate() {
        let config = Config {
            skip_tls_verify: true,
            token: "secret-token".to_string(),
            ..cluster()
        };
        let rendered = render(&config, DEFAULT_TEMPLATE).unwrap();

        assert!(rendered.contains("insecure-skip-tls-verify: true"));
        assert!(!rendered.contains("my-cert-data"));
    }

    #[test]
    fn writes_into_missing_directory() {
        let dir = TempDir::with_prefix("drone-helm").unwrap();
        let target = dir.path().join(".kube").join("config");
        let config = Config {
            token: "secret-token".to_string(),
            ..cluster()
        };

        write(&config, None, &target).unwrap();
        let written = std::fs::read_to_string(&target).unwrap();
        assert!(written.contains("token: secret-token"));
    }

    #[test]
    fn uses_custom_template() {
        let dir = TempDir::with_prefix("drone-helm").unwrap();
        let template = dir.path().join("kubeconfig.tpl");
        std::fs::write(&template, "server={{ api_server }} sa={{ service_account }}").unwrap();
        let target = dir.path().join("config");

        write(&cluster(), Some(&template), &target).unwrap();
        assert_eq!(
            std::fs::read_to_string(&target).unwrap(),
            "server=http://myapiserver sa=default-account\n"
        );
    }

    #[test]
    fn unknown_template_fields_fail() {
        assert!(render(&cluster(), "{{ not_a_field }}").is_err());
    }
}
