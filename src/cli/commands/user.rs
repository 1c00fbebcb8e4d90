use anyhow::{bail, Context};
use clap::Subcommand;
use serde_json::json;

use crate::auth::password::hash_password;
use crate::cli::utils::{connect, output_details, output_success};
use crate::cli::OutputFormat;
use crate::database::models::{Role, User};
use crate::database::{Store, StoreError};

#[derive(Subcommand)]
pub enum UserCommands {
    #[command(about = "Create an admin or tutor account")]
    Create {
        #[arg(long, help = "Display name")]
        name: String,
        #[arg(long, help = "Login email (stored lowercased)")]
        email: String,
        #[arg(long, help = "Initial password (at least 6 characters)")]
        password: String,
        #[arg(long, help = "Role: admin or tutor", default_value = "tutor")]
        role: Role,
        #[arg(long, help = "Center the tutor is bound to")]
        center: Option<String>,
    },
}

pub async fn handle(cmd: UserCommands, database_url: Option<String>, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        UserCommands::Create {
            name,
            email,
            password,
            role,
            center,
        } => {
            let store = connect(database_url).await?;
            let user = create_account(&store, &name, &email, &password, role, center).await?;

            output_success(
                &output_format,
                &format!("Created {} account {}", user.role, user.email),
                Some(json!({ "user": user })),
            )?;
            output_details(
                &output_format,
                &[
                    ("id", user.id.to_string()),
                    ("center", user.center.clone().unwrap_or_else(|| "-".to_string())),
                ],
            );
            Ok(())
        }
    }
}

/// Insert a new active account, applying the same rules as the admin API
pub async fn create_account(
    store: &dyn Store,
    name: &str,
    email: &str,
    password: &str,
    role: Role,
    center: Option<String>,
) -> anyhow::Result<User> {
    let name = name.trim();
    if name.is_empty() {
        bail!("Name is required");
    }
    if password.len() < 6 {
        bail!("Password must be at least 6 characters long");
    }
    let center = center.map(|c| c.trim().to_string()).filter(|c| !c.is_empty());
    if role == Role::Tutor && center.is_none() {
        bail!("Center is required for tutors");
    }

    let hash = hash_password(password).map_err(|e| anyhow::anyhow!("failed to hash password: {e}"))?;
    let user = User::new(name.to_string(), email, hash, role, center);
    match store.users().insert(&user).await {
        Ok(()) => Ok(user),
        Err(StoreError::UniqueViolation { .. }) => bail!("A user with email {} already exists", user.email),
        Err(e) => Err(e).context("failed to insert user"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MemoryStore;

    #[tokio::test]
    async fn test_create_account_rules() {
        let store = MemoryStore::new();

        let tutor = create_account(&store, "Priya Sharma", "Priya@KalamFoundation.org", "tutor123", Role::Tutor, Some("Delhi Center".into()))
            .await
            .unwrap();
        assert_eq!(tutor.email, "priya@kalamfoundation.org");
        assert_eq!(tutor.center.as_deref(), Some("Delhi Center"));

        let admin = create_account(&store, "Admin", "admin@kalamfoundation.org", "admin123", Role::Admin, Some("Delhi Center".into()))
            .await
            .unwrap();
        assert_eq!(admin.center, None);

        assert!(create_account(&store, "No Center", "nc@kalamfoundation.org", "tutor123", Role::Tutor, None)
            .await
            .is_err());
        assert!(create_account(&store, "Short", "short@kalamfoundation.org", "abc", Role::Admin, None)
            .await
            .is_err());

        let dup = create_account(&store, "Again", "priya@kalamfoundation.org", "tutor123", Role::Tutor, Some("Delhi Center".into()))
            .await
            .unwrap_err();
        assert!(dup.to_string().contains("already exists"));
    }
}
