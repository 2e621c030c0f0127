//! Authentication commands.

use super::AppContext;
use crate::output::{self, OutputFormat};
use anyhow::{bail, Result};
use crew_auth::AuthPhase;
use std::io::{self, Write};

/// Sign in with a display name or email.
pub async fn login(
    context: &AppContext,
    identifier: Option<String>,
    format: &OutputFormat,
) -> Result<()> {
    let snapshot = context.runtime.snapshot();
    if let Some(identity) = snapshot.identity() {
        let who = identity
            .email
            .clone()
            .unwrap_or_else(|| identity.id.clone());
        output::print_success(&format!("Already signed in as {}", who), format);
        return Ok(());
    }

    let identifier = match identifier {
        Some(identifier) => identifier,
        None => {
            print!("Name or email: ");
            io::stdout().flush()?;
            let mut buffer = String::new();
            io::stdin().read_line(&mut buffer)?;
            buffer.trim().to_string()
        }
    };

    if identifier.is_empty() {
        bail!("A name or email is required");
    }

    // Read password without echo
    let password = rpassword::prompt_password("Password: ")?;

    if password.is_empty() {
        bail!("A password is required");
    }

    println!("Signing in...");
    context.runtime.sign_in(&identifier, &password).await?;
    context.sync_bearer();

    let snapshot = context.runtime.snapshot();
    let who = snapshot
        .profile
        .as_ref()
        .map(|p| p.name.clone())
        .or_else(|| snapshot.identity().and_then(|i| i.email.clone()))
        .unwrap_or_else(|| "user".to_string());
    output::print_success(&format!("Signed in as {}", who), format);
    Ok(())
}

/// Sign out and clear the persisted session.
pub async fn logout(context: &AppContext, format: &OutputFormat) -> Result<()> {
    let result = context.runtime.sign_out().await;
    context.sync_bearer();

    match result {
        Ok(()) => output::print_success("Signed out", format),
        Err(error) => {
            // Local state is already cleared; the provider error is
            // informational.
            output::print_error(
                &format!("Provider sign-out failed (local session cleared): {}", error),
                format,
            );
        }
    }
    Ok(())
}

/// Show session and profile status.
pub async fn status(context: &AppContext, format: &OutputFormat) -> Result<()> {
    let snapshot = context.runtime.snapshot();

    match format {
        OutputFormat::Text => match snapshot.phase() {
            AuthPhase::Initializing => println!("Session:  loading"),
            AuthPhase::Unauthenticated => println!("Session:  not signed in"),
            _ => {
                if let Some(session) = &snapshot.session {
                    println!("Session:  active");
                    output::print_row("User ID", &session.identity.id);
                    if let Some(email) = &session.identity.email {
                        output::print_row("Email", email);
                    }
                    output::print_row("Expires", &session.expires_at.to_rfc3339());
                }
                match &snapshot.profile {
                    Some(profile) => {
                        output::print_row("Name", &profile.name);
                        output::print_row("Role", profile.role.as_str());
                        output::print_row(
                            "Team",
                            &format!("{} / {}", profile.department, profile.position),
                        );
                    }
                    None => output::print_row("Profile", "none (account pending setup)"),
                }
            }
        },
        OutputFormat::Json => {
            let json = serde_json::json!({
                "signed_in": snapshot.session.is_some(),
                "loading": snapshot.loading,
                "is_admin": snapshot.is_admin(),
                "user_id": snapshot.identity().map(|i| i.id.clone()),
                "email": snapshot.identity().and_then(|i| i.email.clone()),
                "profile": snapshot.profile,
            });
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
    }

    Ok(())
}
