use anyhow::Context;
use serde_json::{json, Value};

use crate::cli::OutputFormat;
use crate::config::AppConfig;
use crate::database::PgStore;

/// Output a success message in the appropriate format
pub fn output_success(output_format: &OutputFormat, message: &str, data: Option<Value>) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            let mut response = json!({
                "success": true,
                "message": message
            });

            if let (Some(Value::Object(extra)), Some(target)) = (data, response.as_object_mut()) {
                target.extend(extra);
            }

            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Text => {
            println!("✓ {}", message);
        }
    }
    Ok(())
}

/// Print `key: value` lines for text output
pub fn output_details(output_format: &OutputFormat, rows: &[(&str, String)]) {
    if let OutputFormat::Text = output_format {
        for (key, value) in rows {
            println!("  {key}: {value}");
        }
    }
}

/// Connect to Postgres using the flag, else the environment
pub async fn connect(database_url: Option<String>) -> anyhow::Result<PgStore> {
    let config = AppConfig::from_env();
    let url = database_url
        .or_else(|| config.database.url.clone())
        .context("No database configured. Pass --database-url or set DATABASE_URL")?;

    PgStore::connect(&url, &config.database)
        .await
        .context("failed to connect to database")
}
