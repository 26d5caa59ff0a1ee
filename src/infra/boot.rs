use std::net::SocketAddr;

use crate::infra::config::Config;
use crate::infra::mcp::make_factory;

pub async fn run_server(cfg: Config) -> anyhow::Result<()> {
    cfg.validate()?;
    tracing::info!(
        mode = %cfg.mode,
        port = cfg.port,
        api_base = %cfg.drive.api_base_url,
        fallback_token = cfg.access_token.is_some(),
        "BOOT drive-mcp-gateway"
    );

    let factory = make_factory(&cfg);

    if cfg.mode == "stdio" {
        crate::infra::runtime::mcp_transport::serve_stdio(factory())
            .await
            .map_err(|e| anyhow::anyhow!(e))?;
        return Ok(());
    }

    let app = crate::infra::http_app::build_app(factory);
    let addr: SocketAddr = ([0, 0, 0, 0], cfg.port).into();
    tracing::info!(%addr, "listening");
    axum::serve(tokio::net::TcpListener::bind(addr).await?, app).await?;
    Ok(())
}
