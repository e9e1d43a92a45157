use std::sync::Arc;

use clap::Parser;
use hk_housing_mcp_server::config::{Args, LogFormat};
use hk_housing_mcp_server::fetch::{FetchError, HttpCsvFetcher};
use hk_housing_mcp_server::private_storage::PrivateStorage;
use hk_housing_mcp_server::tools::Deps;
use hk_housing_mcp_server::build_server;

fn init_logging(format: LogFormat) {
    // stdout belongs to the stdio transport.
    let builder = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr);

    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Text => builder.init(),
    }
}

fn build_deps(args: &Args) -> Result<Arc<Deps>, FetchError> {
    let fetcher = HttpCsvFetcher::new(args.fetch_timeout())?;

    Ok(Arc::new(Deps {
        private_storage: Arc::new(PrivateStorage::new(Arc::new(fetcher))),
    }))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    init_logging(args.log_format);

    let deps = build_deps(&args)?;
    let srv = build_server(deps);
    let transport = args.transport();

    tracing::info!(?transport, "starting MCP server");

    if let Err(e) = srv.run(transport).await {
        tracing::error!("server stopped: {}", e);
        return Err(e.into());
    }
    Ok(())
}
