use anyhow::Result;
use clap::Parser;
use kids_asset_api::app::App;
use kids_asset_api::models::Config;
use kids_asset_api::server;
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "kids-asset-api")]
#[command(about = "Serve the prompt validation and illustration endpoint")]
struct CliArgs {
    /// Listen address, overrides BIND_ADDR.
    #[arg(long, value_name = "ADDR")]
    bind: Option<String>,

    /// Media directory, overrides MEDIA_ROOT.
    #[arg(long, value_name = "DIR")]
    media_root: Option<PathBuf>,
}

impl CliArgs {
    fn apply(self, mut config: Config) -> Config {
        if let Some(bind) = self.bind {
            config.bind_addr = bind;
        }
        if let Some(media_root) = self.media_root {
            config.media_root = media_root;
        }
        config
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "kids_asset_api=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting kids-asset-api");

    let args = CliArgs::parse();
    let config = match Config::from_env() {
        Ok(config) => args.apply(config),
        Err(e) => {
            error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    match App::from_config(config).await {
        Ok(app) => {
            if let Err(e) = server::start_server(app).await {
                error!("Server stopped: {}", e);
                std::process::exit(1);
            }
            Ok(())
        }
        Err(e) => {
            error!("Failed to initialize application: {}", e);
            std::process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_overrides_config() {
        let args = CliArgs::parse_from(["kids-asset-api", "--bind", "127.0.0.1:9000"]);
        let config = args.apply(Config::default());

        assert_eq!(config.bind_addr, "127.0.0.1:9000");
        assert_eq!(config.media_root, PathBuf::from("media"));
    }

    #[test]
    fn test_cli_media_root() {
        let args = CliArgs::parse_from(["kids-asset-api", "--media-root", "/srv/media"]);
        let config = args.apply(Config::default());

        assert_eq!(config.media_root, PathBuf::from("/srv/media"));
        assert_eq!(config.bind_addr, "0.0.0.0:8000");
    }
}
