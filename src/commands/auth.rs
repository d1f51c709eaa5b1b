use anyhow::{Context, Result};
use meetprep_core::service::sign_in_with_provider;
use meetprep_core::{MeetPrepError, Provider, SignUpOutcome};
use owo_colors::OwoColorize;

use crate::app::App;
use crate::commands::connect::{authorize_in_browser, bind_callback, callback_code};
use crate::utils::tui::{create_spinner, prompt_password, prompt_text};

pub async fn signin(email: Option<String>) -> Result<()> {
    let app = App::load()?;

    let email = prompt_text("Email", email)?;
    let password = prompt_password("Password")?;

    let spinner = create_spinner("Signing in");
    let result = app.backend.sign_in_with_password(&email, &password).await;
    spinner.finish_and_clear();

    let session = result.context("Error signing in")?;
    app.store.save(&session)?;

    println!("{} You have successfully signed in.", "Welcome back!".green().bold());
    Ok(())
}

pub async fn signin_with_provider(provider: Provider) -> Result<()> {
    let app = App::load()?;

    let listener = bind_callback(app.config.redirect_port).await?;
    let pending = sign_in_with_provider(&app.backend, provider, &app.config.redirect_uri())?;
    let params = authorize_in_browser(listener, pending.url.as_str()).await?;
    let code = callback_code(&params)?;

    let spinner = create_spinner("Signing in");
    let result = app.backend.exchange_code(code, &pending.verifier).await;
    spinner.finish_and_clear();

    let session = result.with_context(|| format!("Error signing in with {}", provider.display_name()))?;
    app.store.save(&session)?;

    println!(
        "{} Signed in as {}.",
        "Welcome back!".green().bold(),
        session.user.label()
    );
    Ok(())
}

pub async fn signup(email: Option<String>, username: Option<String>) -> Result<()> {
    let app = App::load()?;

    let email = prompt_text("Email", email)?;
    let username = username.filter(|u| !u.trim().is_empty());
    let password = prompt_password("Password")?;
    let confirm = prompt_password("Confirm password")?;

    if password != confirm {
        anyhow::bail!("Passwords do not match");
    }

    let spinner = create_spinner("Creating account");
    let result = app.backend.sign_up(&email, &password, username.as_deref()).await;
    spinner.finish_and_clear();

    match result.context("Error creating account")? {
        SignUpOutcome::SignedIn(session) => {
            app.store.save(&session)?;
            println!(
                "{} Signed in as {}.",
                "Account created.".green().bold(),
                session.user.label()
            );
        }
        SignUpOutcome::ConfirmationSent { email } => {
            println!(
                "{} Please check {} to confirm your account, then run `meetprep signin`.",
                "Account created.".green().bold(),
                email.bold()
            );
        }
    }

    Ok(())
}

pub async fn signout() -> Result<()> {
    let app = App::load()?;

    let Some(session) = app.store.load()? else {
        println!("{}", "Not signed in".dimmed());
        return Ok(());
    };

    // The local session goes regardless; an already-expired token is fine
    match app.backend.sign_out(&session.access_token).await {
        Ok(()) | Err(MeetPrepError::Unauthorized(_)) => {}
        Err(e) => eprintln!("{}", format!("Error signing out remotely: {e}").yellow()),
    }
    app.store.clear()?;

    println!("{} You have been successfully signed out.", "Signed out.".green().bold());
    Ok(())
}

pub async fn whoami() -> Result<()> {
    let app = App::load()?;
    let service = app.service().await?;
    let user = app.backend.get_user(&service.session().access_token).await?;

    println!("{}", user.label().bold());
    if let (Some(_), Some(email)) = (&user.username, &user.email) {
        println!("  {email}");
    }
    println!("  {}", format!("id {}", user.id).dimmed());
    Ok(())
}
