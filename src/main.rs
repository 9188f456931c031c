use logging_manifest_provider::config::LaunchConfig;
use logging_manifest_provider::{
    init_logging_with_default, serve_on_with_options, serve_with_options, LoggingManifestsProvider,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = LaunchConfig::try_from_env()?;
    init_logging_with_default(&config.log_level);

    let provider = LoggingManifestsProvider::new();
    let options = config.serve_options();
    match config.listen_addr {
        Some(addr) => serve_on_with_options(provider, addr, options).await,
        None => serve_with_options(provider, options).await,
    }
}
