use anyhow::Result;
use clap::Parser;
use config::Args;
use plugin::Plugin;
use resolver::ProcessEnv;
use runner::HelmBinary;

mod command;
mod config;
mod error;
mod kubeconfig;
mod plugin;
mod resolver;
mod runner;

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    let args = Args::parse();

    let level = if args.config.debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let plugin = Plugin {
        config: args.config,
        event: args.event,
        kubeconfig_template: args.kubeconfig_template,
        runner: HelmBinary::new(args.helm_bin),
    };

    log::info!("Running helm for build event {:?}", plugin.event);
    plugin.exec(&ProcessEnv).await?;
    log::info!("Helm run complete");

    Ok(())
}
