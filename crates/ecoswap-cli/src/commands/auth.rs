//! Authentication commands.

use super::Context;
use crate::output::{self, OutputFormat};
use anyhow::Result;
use ecoswap_session::{ApiError, RegisterRequest, SessionStatus};
use std::io::{self, Write};

fn prompt(label: &str) -> Result<String> {
    print!("{}: ", label);
    io::stdout().flush()?;
    let mut value = String::new();
    io::stdin().read_line(&mut value)?;
    Ok(value.trim().to_string())
}

/// Message for a failed login or registration.
fn auth_failure(err: &ApiError) -> String {
    match err.server_message() {
        Some(message) => message,
        None => err.to_string(),
    }
}

/// Login with email (or phone) and password.
pub async fn login(ctx: &Context, email: Option<String>, format: &OutputFormat) -> Result<()> {
    if let SessionStatus::SignedIn { email: Some(current), .. } = ctx.session.status() {
        output::print_success(&format!("Already logged in as {}", current), format);
        return Ok(());
    }

    let email = match email {
        Some(email) => email,
        None => prompt("Email")?,
    };
    if email.is_empty() {
        output::print_error("Email is required", format);
        return Ok(());
    }

    // Prompt for password (hidden)
    let password = rpassword::prompt_password("Password: ")?;
    if password.is_empty() {
        output::print_error("Password is required", format);
        return Ok(());
    }

    match ctx.session.login(&email, &password).await {
        Ok(user) => {
            let display = user
                .as_ref()
                .and_then(|u| u.name.clone().or_else(|| u.email.clone()))
                .unwrap_or(email);
            output::print_success(
                &format!(
                    "Logged in as {} ({} eco points)",
                    display,
                    ctx.session.eco_points()
                ),
                format,
            );
        }
        Err(e) => output::print_error(&format!("Login failed: {}", auth_failure(&e)), format),
    }

    Ok(())
}

/// Create an account.
pub async fn register(
    ctx: &Context,
    name: Option<String>,
    email: Option<String>,
    phone: Option<String>,
    format: &OutputFormat,
) -> Result<()> {
    let name = match name {
        Some(name) => name,
        None => prompt("Name")?,
    };
    let email = match email {
        Some(email) => email,
        None => prompt("Email")?,
    };
    if name.is_empty() || email.is_empty() {
        output::print_error("Name and email are required", format);
        return Ok(());
    }

    let password = rpassword::prompt_password("Password: ")?;
    let confirm = rpassword::prompt_password("Confirm password: ")?;
    if password.is_empty() {
        output::print_error("Password is required", format);
        return Ok(());
    }
    if password != confirm {
        output::print_error("Passwords do not match", format);
        return Ok(());
    }

    let request = RegisterRequest {
        name,
        email,
        password,
        phone: phone.filter(|p| !p.trim().is_empty()),
    };

    match ctx.session.register(&request).await {
        Ok(body) => {
            let message = body
                .get("message")
                .and_then(|v| v.as_str())
                .unwrap_or("Registered successfully");
            if ctx.session.state().is_signed_in() {
                output::print_success(&format!("{}. You are now logged in.", message), format);
            } else {
                output::print_success(
                    &format!("{}. Run 'ecoswap login' to sign in.", message),
                    format,
                );
            }
        }
        Err(e) => {
            output::print_error(&format!("Registration failed: {}", auth_failure(&e)), format)
        }
    }

    Ok(())
}

/// Logout and clear the stored session.
pub async fn logout(ctx: &Context, format: &OutputFormat) -> Result<()> {
    ctx.session.logout()?;
    output::print_success("Logged out successfully", format);
    Ok(())
}

/// Show authentication status. With `refresh`, the profile and balance are
/// fetched from the server first.
pub async fn status(ctx: &Context, refresh: bool, format: &OutputFormat) -> Result<()> {
    if refresh && !matches!(ctx.session.status(), SessionStatus::SignedOut) {
        if let Err(e) = ctx.market.users().me().await {
            return super::report(e, format);
        }
        if let Err(e) = ctx.market.points().balance().await {
            return super::report(e, format);
        }
    }

    match format {
        OutputFormat::Json => output::print_json(&ctx.session.snapshot()),
        OutputFormat::Text => {
            match ctx.session.status() {
                SessionStatus::SignedIn {
                    user_id,
                    email,
                    expires_at,
                } => {
                    println!("Auth:     logged in");
                    println!("User ID:  {}", user_id.as_deref().unwrap_or("unknown"));
                    println!("Email:    {}", email.as_deref().unwrap_or("unknown"));
                    println!(
                        "Expires:  {}",
                        expires_at
                            .map(|t| t.to_rfc3339())
                            .unwrap_or_else(|| "unknown".to_string())
                    );
                    println!("Points:   {}", ctx.session.eco_points());
                }
                SessionStatus::Expired { user_id } => {
                    println!("Auth:     token expired (renewed on next request)");
                    println!("User ID:  {}", user_id.as_deref().unwrap_or("unknown"));
                }
                SessionStatus::Refreshing => println!("Auth:     refreshing"),
                SessionStatus::SignedOut => println!("Auth:     not logged in"),
            }
            Ok(())
        }
    }
}
