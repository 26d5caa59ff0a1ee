use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    drive_mcp_gateway::cli::run().await
}
