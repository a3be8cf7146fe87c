//! Command implementations.
//!
//! Each command plays the part of a screen: it reports its route group to
//! the session controller and lets the guard decide whether it may run.

use std::io::{self, BufRead, Write};
use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use chrono::{Local, NaiveDate};
use tracing::info;
use wellpoints_core::auth::{AuthState, SessionController, SessionError};
use wellpoints_core::models::{
    search_partners, CheckIn, Mood, OnboardingCheck, OnboardingCompletion, PointsStatement,
    TransactionFilter, TransactionKind,
};
use wellpoints_core::{Config, ErrorKind, RouteGroup};

use crate::cli::Command;

/// Shown when nothing more specific is known
const GENERIC_FAILURE: &str = "Something went wrong. Please try again.";

pub async fn run(command: Command, controller: &Arc<SessionController>, config: &mut Config) -> Result<()> {
    controller.initialize().await;

    let group = if command.requires_session() {
        RouteGroup::Protected
    } else {
        RouteGroup::Public
    };
    controller.on_route_change(group);

    if command.requires_session() && !controller.state().is_authenticated() {
        bail!("Not signed in. Run `wellpoints login` first.");
    }

    match command {
        Command::Login { registration } => login(controller, config, registration).await,
        Command::Logout => logout(controller).await,
        Command::Status => status(controller),
        Command::FirstAccess => first_access(controller).await,
        Command::Profile => profile(controller).await,
        Command::Statement { kind, from, to } => statement(controller, &kind, from, to).await,
        Command::Stores { search, category } => stores(controller, &search, &category).await,
        Command::Store { id } => store(controller, &id).await,
        Command::CheckIn { mood, note } => check_in(controller, &mood, note).await,
    }
}

/// Human readable message for a failed operation
pub fn describe_error(err: &anyhow::Error) -> String {
    if let Some(session_err) = err.downcast_ref::<SessionError>() {
        return match session_err {
            SessionError::InvalidCredentials | SessionError::PasswordMismatch => session_err.to_string(),
            SessionError::Api(api_err) => describe_api_error(api_err.kind()),
            SessionError::Storage(_) => "Could not access secure storage.".to_string(),
        };
    }
    if let Some(api_err) = err.downcast_ref::<wellpoints_core::ApiError>() {
        return describe_api_error(api_err.kind());
    }
    err.to_string()
}

fn describe_api_error(kind: ErrorKind) -> String {
    match kind {
        ErrorKind::Network => "Could not reach the server. Check your connection.".to_string(),
        ErrorKind::Auth => "Your session has expired. Please sign in again.".to_string(),
        ErrorKind::Validation | ErrorKind::Server => GENERIC_FAILURE.to_string(),
    }
}

// ============================================================================
// Public commands
// ============================================================================

async fn login(controller: &SessionController, config: &mut Config, registration: Option<String>) -> Result<()> {
    if let AuthState::Authenticated(profile) = controller.state() {
        println!("Already signed in as {}.", profile.name);
        return Ok(());
    }

    let registration = match registration.or_else(|| config.last_registration.clone()) {
        Some(r) => r,
        None => prompt("Registration number: ")?,
    };
    let password = rpassword::prompt_password("Password: ").context("Failed to read password")?;

    let profile = controller.sign_in(&registration, &password).await?;

    config.last_registration = Some(registration);
    config.save()?;

    println!("Welcome, {}!", profile.first_name());
    Ok(())
}

async fn logout(controller: &SessionController) -> Result<()> {
    controller.sign_out().await?;
    println!("Signed out.");
    Ok(())
}

fn status(controller: &SessionController) -> Result<()> {
    match controller.state() {
        AuthState::Authenticated(profile) if profile.is_placeholder() => {
            println!("Signed in (new account, run `wellpoints profile` to load your details)");
        }
        AuthState::Authenticated(profile) => {
            println!("Signed in as {} ({}), {}", profile.name, profile.registration, profile.department);
        }
        _ => println!("Not signed in"),
    }
    Ok(())
}

async fn first_access(controller: &SessionController) -> Result<()> {
    println!("First access - let's confirm who you are.\n");
    let document = prompt("CPF: ")?;
    let name = prompt("Full name: ")?;
    let birth_date = prompt("Birth date (YYYY-MM-DD): ")?;
    let birth_date = NaiveDate::parse_from_str(&birth_date, "%Y-%m-%d")
        .map_err(|_| anyhow!("Birth date must look like 1990-05-17"))?;
    let registration = prompt("Registration number: ")?;

    let check = OnboardingCheck::new(&document, &name, birth_date, &registration);
    let candidate = controller.check_onboarding(&check).await?;
    info!("Onboarding identity confirmed");

    println!("\nFound you{}. Now choose your login details.\n",
        candidate.name.as_deref().map(|n| format!(", {}", n)).unwrap_or_default());
    let email = prompt("E-mail: ")?;
    let password = rpassword::prompt_password("Password: ").context("Failed to read password")?;
    let password_confirmation =
        rpassword::prompt_password("Confirm password: ").context("Failed to read password")?;

    let completion = OnboardingCompletion {
        user_uuid: candidate.user_uuid,
        email,
        password,
        password_confirmation,
    };
    controller.complete_registration(&completion).await?;

    println!("Account created. You're signed in.");
    Ok(())
}

// ============================================================================
// Protected commands
// ============================================================================

async fn profile(controller: &SessionController) -> Result<()> {
    let overview = controller.reload_profile().await?;
    let profile = &overview.profile;

    println!("{}", profile.name);
    println!("  Registration: {}", profile.registration);
    println!("  Department:   {}", profile.department);
    println!("  Points:       {}", overview.points_balance);
    Ok(())
}

async fn statement(
    controller: &SessionController,
    kind: &str,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
) -> Result<()> {
    let filter: TransactionFilter = kind.parse()?;
    let overview = controller.api().fetch_profile_overview().await?;
    let statement = PointsStatement::build(&overview.transactions, filter, from, to);

    println!("Balance: {} points\n", overview.points_balance);
    if statement.is_empty() {
        println!("No transactions in this period.");
        return Ok(());
    }
    for entry in &statement.entries {
        let sign = match entry.kind {
            TransactionKind::Earn => "+",
            TransactionKind::Redeem => "-",
        };
        println!(
            "{}  {}{:>5}  {}",
            entry.date.format("%d/%m/%Y"),
            sign,
            entry.amount.saturating_abs(),
            entry.description
        );
    }
    println!(
        "\nEarned {} / redeemed {}",
        statement.total_earned(),
        statement.total_redeemed()
    );
    Ok(())
}

async fn stores(controller: &SessionController, search: &str, category: &str) -> Result<()> {
    let api = controller.api();
    let (partners, categories) = futures::try_join!(api.fetch_partners(), api.fetch_categories())?;

    let label = categories
        .iter()
        .find(|c| c.id == category)
        .map(|c| c.label.as_str())
        .unwrap_or("All");
    println!("Partner stores - {}\n", label);

    let found = search_partners(&partners, search, category);
    if found.is_empty() {
        println!("No stores found.");
    }
    for partner in found {
        let star = if partner.featured { "*" } else { " " };
        println!(
            "{} [{}] {:<30} {:>8}  {}",
            star,
            partner.id,
            partner.name,
            partner.distance_display(),
            partner.address
        );
    }
    Ok(())
}

async fn store(controller: &SessionController, id: &str) -> Result<()> {
    let api = controller.api();
    let (partner, promotions) =
        futures::try_join!(api.fetch_partner(id), api.fetch_promotions(Some(id)))?;

    println!("{} ({})", partner.name, partner.category);
    if !partner.address.is_empty() {
        println!("{}", partner.address);
    }
    println!();

    let today = Local::now().date_naive();
    let balance = controller
        .api()
        .fetch_profile_overview()
        .await
        .map(|o| o.points_balance)
        .ok();

    for promo in promotions.iter().filter(|p| !p.is_expired(today)) {
        let affordable = match balance {
            Some(b) if promo.is_affordable(b) => " (available)",
            _ => "",
        };
        println!("- {} - {} points{}", promo.name, promo.points, affordable);
        if !promo.description.is_empty() {
            println!("    {}", promo.description);
        }
        if let Some(until) = promo.valid_until {
            println!("    valid until {}", until.format("%d/%m/%Y"));
        }
    }
    Ok(())
}

async fn check_in(controller: &SessionController, mood: &str, note: Option<String>) -> Result<()> {
    let mood: Mood = mood.parse().map_err(|e| {
        let options: Vec<String> = Mood::ALL.iter().map(|m| format!("{:?}", m).to_lowercase()).collect();
        anyhow!("{}, expected one of: {}", e, options.join(", "))
    })?;

    let receipt = controller
        .api()
        .submit_check_in(&CheckIn { mood, note })
        .await?;

    println!(
        "Check-in recorded ({}). +{} points",
        mood.label(),
        receipt.points_earned
    );
    Ok(())
}

fn prompt(label: &str) -> Result<String> {
    print!("{}", label);
    io::stdout().flush()?;
    let mut input = String::new();
    io::stdin().lock().read_line(&mut input)?;
    let input = input.trim().to_string();
    if input.is_empty() {
        bail!("{} is required", label.trim_end_matches(": ").trim());
    }
    Ok(input)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wellpoints_core::ApiError;

    #[test]
    fn test_unknown_statement_kind_is_reported() {
        let err = anyhow::Error::from("weekly".parse::<TransactionFilter>().unwrap_err());
        assert_eq!(
            describe_error(&err),
            "unknown transaction kind 'weekly', expected all, earn or redeem"
        );
    }

    #[test]
    fn test_describe_invalid_credentials() {
        let err = anyhow::Error::new(SessionError::InvalidCredentials);
        assert_eq!(describe_error(&err), "Invalid registration number or password");
    }

    #[test]
    fn test_describe_falls_back_to_generic() {
        let err = anyhow::Error::new(ApiError::Server {
            status: 500,
            message: "boom".to_string(),
        });
        assert_eq!(describe_error(&err), GENERIC_FAILURE);
    }

    #[test]
    fn test_describe_expired_session() {
        let inner = ApiError::Unauthorized(String::new());
        let err = anyhow::Error::new(SessionError::Api(ApiError::RefreshFailed(Box::new(inner))));
        assert_eq!(describe_error(&err), "Your session has expired. Please sign in again.");
    }
}
