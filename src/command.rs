use std::{borrow::Cow, sync::OnceLock};

use regex::Regex;

use crate::{
    config::{Config, HelmVersion},
    error::{PluginError, PluginResult},
};

/// What the installed helm binary supports beyond the common commands.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Capabilities {
    /// `helm init` has to run before anything else.
    pub init: bool,
    /// Commands talk to a tiller deployment (`--tiller-namespace`, `--purge`).
    pub tiller: bool,
}

impl From<HelmVersion> for Capabilities {
    fn from(version: HelmVersion) -> Self {
        match version {
            HelmVersion::V2 => Capabilities {
                init: true,
                tiller: true,
            },
            HelmVersion::V3 => Capabilities {
                init: false,
                tiller: false,
            },
        }
    }
}

/// The main helm command of a run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HelmCommand {
    Upgrade,
    Delete,
    Lint,
    Help,
}

impl HelmCommand {
    /// Picks the command named in the configuration, or derives it from the
    /// build event when none is named.
    pub fn select(name: &str, event: &str) -> Self {
        match name {
            "upgrade" => HelmCommand::Upgrade,
            "delete" => HelmCommand::Delete,
            "lint" => HelmCommand::Lint,
            other => {
                if !other.is_empty() {
                    log::warn!("Unknown helm command {:?}, using the build event", other);
                }
                Self::for_event(event)
            }
        }
    }

    pub fn for_event(event: &str) -> Self {
        match event {
            "push" | "tag" | "deployment" | "pull_request" | "promote" | "rollback" => {
                HelmCommand::Upgrade
            }
            "delete" => HelmCommand::Delete,
            _ => HelmCommand::Help,
        }
    }
}

/// Removes one layer of surrounding quotes, if any.
///
/// Double quoted text has its `\"`, `\\`, `\n` and `\t` escapes decoded. Text
/// with an unescaped inner `"` or an unknown escape is returned unchanged.
pub fn unquote(s: &str) -> Cow<'_, str> {
    if s.len() < 2 {
        return Cow::Borrowed(s);
    }

    if s.starts_with('"') && s.ends_with('"') {
        return match unescape(&s[1..s.len() - 1]) {
            Some(unquoted) => Cow::Owned(unquoted),
            None => Cow::Borrowed(s),
        };
    }

    for quote in ['\'', '`'] {
        if s.starts_with(quote) && s.ends_with(quote) {
            return Cow::Borrowed(&s[1..s.len() - 1]);
        }
    }
    Cow::Borrowed(s)
}

fn unescape(inner: &str) -> Option<String> {
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        match c {
            '"' => return None,
            '\\' => out.push(match chars.next()? {
                '"' => '"',
                '\\' => '\\',
                'n' => '\n',
                't' => '\t',
                _ => return None,
            }),
            c => out.push(c),
        }
    }
    Some(out)
}

fn repo_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(?P<name>[A-Za-z0-9_-]+)=(?P<url>https?://[A-Za-z0-9_./:@-]+)")
            .expect("repo pattern")
    })
}

/// Arguments of `helm repo add` for a `name=url` definition.
pub fn repo_add(repo: &str) -> PluginResult<Vec<String>> {
    let definition = unquote(repo);
    let caps = repo_re()
        .captures(&definition)
        .ok_or_else(|| PluginError::InvalidRepo(repo.to_string()))?;

    Ok(vec![
        "repo".to_string(),
        "add".to_string(),
        caps["name"].to_string(),
        caps["url"].to_string(),
    ])
}

pub fn dependency_update(chart: &str) -> Vec<String> {
    vec![
        "dependency".to_string(),
        "update".to_string(),
        chart.to_string(),
    ]
}

/// Builds helm argument lists out of a resolved configuration.
pub struct CommandBuilder<'a> {
    config: &'a Config,
    capabilities: Capabilities,
}

impl<'a> CommandBuilder<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self::with_capabilities(config, config.helm_version.into())
    }

    pub fn with_capabilities(config: &'a Config, capabilities: Capabilities) -> Self {
        CommandBuilder {
            config,
            capabilities,
        }
    }

    /// Every invocation of a run, in execution order.
    ///
    /// Fails on the first malformed repository, before anything is run.
    pub fn plan(&self, event: &str) -> PluginResult<Vec<Vec<String>>> {
        let mut plan = vec![];

        if let Some(init) = self.init() {
            plan.push(init);
        }
        for repo in &self.config.helm_repos {
            plan.push(repo_add(repo)?);
        }
        if self.config.update_dependencies {
            plan.push(dependency_update(&self.config.chart));
        }
        plan.push(self.command(HelmCommand::select(&self.config.helm_command, event)));

        Ok(plan)
    }

    pub fn command(&self, command: HelmCommand) -> Vec<String> {
        match command {
            HelmCommand::Upgrade => self.upgrade(),
            HelmCommand::Delete => self.delete(),
            HelmCommand::Lint => self.lint(),
            HelmCommand::Help => vec![String::new()],
        }
    }

    /// `helm init`, when the binary needs one.
    pub fn init(&self) -> Option<Vec<String>> {
        if !self.capabilities.init {
            return None;
        }

        let config = self.config;
        let mut args = Args::new("init");
        args.option("--stable-repo-url", &config.stable_repo_url);
        self.tiller_namespace(&mut args);
        args.flag("--client-only", config.client_only);
        args.flag("--upgrade", config.upgrade);
        args.flag("--canary-image", config.canary_image);
        Some(args.0)
    }

    pub fn upgrade(&self) -> Vec<String> {
        let config = self.config;
        let mut args = Args::new("upgrade");
        args.push("--install");
        if !config.release.is_empty() {
            args.push(&config.release);
        }
        args.push(&config.chart);
        args.option("--version", &config.version);
        self.values(&mut args);
        args.option("--namespace", &config.namespace);
        self.tiller_namespace(&mut args);
        args.flag("--dry-run", config.dry_run);
        args.flag("--debug", config.debug);
        args.flag("--wait", config.wait);
        args.flag("--recreate-pods", config.recreate_pods);
        args.flag("--reuse-values", config.reuse_values);
        args.option("--timeout", &config.timeout);
        args.flag("--force", config.force);
        args.0
    }

    pub fn delete(&self) -> Vec<String> {
        let config = self.config;
        let mut args = Args::new("delete");
        args.push(&config.release);
        self.tiller_namespace(&mut args);
        args.flag("--dry-run", config.dry_run);
        args.flag("--purge", config.purge && self.capabilities.tiller);
        args.0
    }

    pub fn lint(&self) -> Vec<String> {
        let config = self.config;
        let mut args = Args::new("lint");
        args.push(&config.chart);
        self.values(&mut args);
        args.option("--namespace", &config.namespace);
        self.tiller_namespace(&mut args);
        args.flag("--debug", config.debug);
        args.0
    }

    fn values(&self, args: &mut Args) {
        let config = self.config;
        args.option("--set", &unquote(&config.values));
        args.option("--set-string", &unquote(&config.string_values));
        if !config.values_files.is_empty() {
            for file in config.values_files.split(',') {
                args.push("--values");
                args.push(file.trim());
            }
        }
    }

    fn tiller_namespace(&self, args: &mut Args) {
        if self.capabilities.tiller {
            args.option("--tiller-namespace", &self.config.tiller_ns);
        }
    }
}

struct Args(Vec<String>);

impl Args {
    fn new(command: &str) -> Self {
        Args(vec![command.to_string()])
    }

    fn push(&mut self, arg: &str) {
        self.0.push(arg.to_string());
    }

    fn flag(&mut self, flag: &str, enabled: bool) {
        if enabled {
            self.push(flag);
        }
    }

    fn option(&mut self, flag: &str, value: &str) {
        if !value.is_empty() {
            self.push(flag);
            self.push(value);
        }
    }
}
