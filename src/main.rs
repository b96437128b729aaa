use clap::Parser;

use atrium_server::ServerConfig;

/// Personal site server with a live webhook callback demo.
#[derive(Parser, Debug)]
#[command(name = "atrium", version)]
struct Args {
    /// Port to listen on.
    #[arg(long, env = "PORT", default_value_t = 8080)]
    port: u16,

    /// Public origin the site is served under (e.g. https://site.example.com).
    #[arg(long, env = "PUBLIC_SITE_ORIGIN")]
    public_origin: Option<String>,

    /// Manual override for the callback base URL handed to external callers.
    #[arg(long, env = "CALLBACK_BASE_URL")]
    callback_base_url: Option<String>,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    tracing::info!("Starting atrium server");

    let config = ServerConfig {
        port: args.port,
        public_origin: args.public_origin,
        callback_base_url: args.callback_base_url,
        ..Default::default()
    };

    let handle = atrium_server::start(config)
        .await
        .expect("Failed to start server");

    tracing::info!(port = handle.port, "atrium server ready");

    // Wait for shutdown signal
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to listen for ctrl+c");

    tracing::info!("Shutting down");
}
