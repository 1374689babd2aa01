use anyhow::Context;

use construcard_dashboard::{build_session, run, Command, DashboardConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    construcard_observability::init();

    let command = Command::parse(std::env::args().skip(1))?;
    let config = DashboardConfig::from_env().context("failed to load configuration")?;
    tracing::debug!(session_dir = %config.session_dir.display(), "configuration loaded");

    let session = build_session(&config);
    session.restore();

    let output = run(&session, command).await?;
    println!("{output}");
    Ok(())
}
