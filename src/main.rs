mod batch;
mod cli;

use clap::Parser;
use cli::{Cli, Commands, InitArgs, SchemaTarget};
use spanmerge::config::ConfigFormat;
use spanmerge::{PriorityConfig, Violation};
use std::path::Path;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

const EXIT_FAILURE: i32 = 1;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&cli.log_level))
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Consolidate(args) => {
            let mut config = PriorityConfig::load_or_default(args.config.as_deref().map(Path::new));
            if let Err(e) = config.apply_overrides(&args.config_overrides) {
                error!("{}", e);
                std::process::exit(EXIT_FAILURE);
            }
            batch::orchestrator::orchestrate_and_run(
                &args.inputs,
                config,
                args.max_parallel_workers,
                args.output.as_deref(),
            )
            .await;
        }
        Commands::Init(args) => {
            if let Err(e) = init(&args) {
                error!("{:#}", e);
                std::process::exit(EXIT_FAILURE);
            }
        }
        Commands::Schema(args) => {
            let schema = match args.target {
                SchemaTarget::Violation => schemars::schema_for!(Violation),
                SchemaTarget::Config => schemars::schema_for!(PriorityConfig),
            };
            match serde_json::to_string_pretty(&schema) {
                Ok(json) => println!("{}", json),
                Err(e) => {
                    error!("Failed to render schema: {}", e);
                    std::process::exit(EXIT_FAILURE);
                }
            }
        }
    }
}

/// Write the built-in config, refusing to replace an existing file unless asked
fn init(args: &InitArgs) -> anyhow::Result<()> {
    let path = Path::new(&args.config);
    if path.exists() && !args.r#override {
        anyhow::bail!(
            "Config file {} already exists, use --override to replace it",
            path.display()
        );
    }

    let format = ConfigFormat::from_path(path)?;
    let content = PriorityConfig::builtin().render(format)?;
    std::fs::write(path, content)?;
    info!("Config written to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_writes_loadable_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("spanmerge.toml");
        let args = InitArgs {
            config: path.display().to_string(),
            r#override: false,
        };
        init(&args).unwrap();
        assert_eq!(PriorityConfig::load(&path).unwrap(), PriorityConfig::builtin());

        assert!(init(&args).is_err());
        let args = InitArgs {
            r#override: true,
            ..args
        };
        assert!(init(&args).is_ok());
    }

    #[test]
    fn test_init_rejects_unknown_extension() {
        let dir = tempfile::tempdir().unwrap();
        let args = InitArgs {
            config: dir.path().join("spanmerge.ini").display().to_string(),
            r#override: false,
        };
        assert!(init(&args).is_err());
    }
}
