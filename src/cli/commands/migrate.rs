use anyhow::Context;

use crate::cli::utils::{connect, output_success};
use crate::cli::OutputFormat;

pub async fn handle(database_url: Option<String>, output_format: OutputFormat) -> anyhow::Result<()> {
    let store = connect(database_url).await?;
    store.migrate().await.context("failed to run migrations")?;
    output_success(&output_format, "Migrations applied", None)
}
