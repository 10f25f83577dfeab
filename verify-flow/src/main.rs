use tokio::io::BufReader;
use verify_flow::{config::FlowSettings, terminal, FlowController, GatewayClient};

use service_core::observability::logging::init_tracing;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = FlowSettings::from_env()?;

    // Logs go to stderr; stdout is the interactive screen.
    init_tracing("verify-flow", &settings.log_level, None)?;

    tracing::info!(gateway_url = %settings.gateway_url, "Starting TOTP flow");

    let mut flow = FlowController::new(GatewayClient::new(settings.gateway_url));
    let input = BufReader::new(tokio::io::stdin());
    let mut output = tokio::io::stdout();

    terminal::run(&mut flow, input, &mut output).await?;

    tracing::info!("TOTP flow finished");
    Ok(())
}
