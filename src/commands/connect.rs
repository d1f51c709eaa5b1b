use std::collections::HashMap;

use anyhow::{Context, Result};
use chrono::Utc;
use dialoguer::Select;
use meetprep_core::service::connect_calendar;
use meetprep_core::{CalendarService, CalendarState, Provider};
use owo_colors::OwoColorize;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;

use crate::app::App;
use crate::render::Render;
use crate::utils::tui::create_spinner;

pub async fn run(provider: Option<Provider>) -> Result<()> {
    let provider = match provider {
        Some(provider) => provider,
        None => pick_provider()?,
    };

    let app = App::load()?;
    let redirect_uri = app.config.redirect_uri();

    println!("Connecting to {}...\n", provider.render());

    let listener = bind_callback(app.config.redirect_port).await?;

    let service = if app.config.link_via_function {
        let service = app.service().await?;
        let url = service.oauth_url_from_function(provider, &redirect_uri).await?;

        authorize_in_browser(listener, url.as_str()).await?;
        service
    } else {
        let pending = connect_calendar(&app.backend, provider, &redirect_uri)?;

        let params = authorize_in_browser(listener, pending.url.as_str()).await?;
        let code = callback_code(&params)?;

        println!("\nReceived authorization code, completing connection...");

        let (service, linked) = CalendarService::complete_connection(app.backend.clone(), &pending, code)
            .await
            .context("Error connecting calendar")?;
        app.store.save(service.session())?;

        if !linked {
            anyhow::bail!(
                "Signed in as {}, but {} did not grant calendar access. Try connecting again.",
                service.session().user.label(),
                provider.display_name()
            );
        }
        service
    };

    println!(
        "{} Successfully connected to {}!",
        "Calendar Connected.".green().bold(),
        provider.display_name()
    );

    let prefs = app.preferences()?;
    let cache = app.cache(&prefs);
    let mut state = CalendarState::default();
    state.load_providers(&service).await;
    state.mark_connected(provider);

    let spinner = create_spinner("Loading meetings");
    state.refresh(&service, &cache, true, Utc::now()).await;
    spinner.finish_and_clear();

    match state.error {
        Some(e) => println!("{}", format!("Could not load meetings: {e}").yellow()),
        None => println!(
            "{} upcoming meeting(s). Run `meetprep meetings` to see them.",
            state.upcoming_meetings(Utc::now()).len()
        ),
    }

    Ok(())
}

pub async fn disconnect(provider: Provider) -> Result<()> {
    let app = App::load()?;
    let service = app.service().await?;

    service
        .disconnect(provider)
        .await
        .with_context(|| format!("Error disconnecting {}", provider.display_name()))?;

    let prefs = app.preferences()?;
    app.cache(&prefs).invalidate(service.user_id())?;

    println!("Disconnected {}", provider.render());
    Ok(())
}

pub async fn providers() -> Result<()> {
    let app = App::load()?;
    let service = app.service().await?;

    let spinner = create_spinner("Loading connections");
    let result = service.connected_providers().await;
    spinner.finish_and_clear();

    let connected = result.context("Error loading calendar connections")?;

    for provider in Provider::ALL {
        if connected.contains(&provider) {
            println!("{} {}", "✓".green(), provider.render());
        } else {
            println!(
                "{} {} {}",
                "·".dimmed(),
                provider.display_name().dimmed(),
                format!("(meetprep connect {provider})").dimmed()
            );
        }
    }

    Ok(())
}

fn pick_provider() -> Result<Provider> {
    let items: Vec<&str> = Provider::ALL.iter().map(|p| p.display_name()).collect();

    let selection = Select::new()
        .with_prompt("Choose a calendar to connect")
        .items(&items)
        .default(0)
        .interact()?;

    Ok(Provider::ALL[selection])
}

/// Listen for the OAuth redirect. Bound before the browser opens so a fast
/// redirect can't arrive first.
pub(crate) async fn bind_callback(port: u16) -> Result<TcpListener> {
    TcpListener::bind(("127.0.0.1", port))
        .await
        .with_context(|| format!("Failed to listen for the OAuth callback on port {port}"))
}

/// Send the user to `url` and return the callback's query parameters.
pub(crate) async fn authorize_in_browser(
    listener: TcpListener,
    url: &str,
) -> Result<HashMap<String, String>> {
    open_in_browser(url);
    let params = wait_for_callback(listener).await?;
    check_callback_error(&params)?;
    Ok(params)
}

pub(crate) fn callback_code(params: &HashMap<String, String>) -> Result<&str> {
    params
        .get("code")
        .map(String::as_str)
        .ok_or_else(|| anyhow::anyhow!("No code in callback"))
}

fn open_in_browser(url: &str) {
    println!("Open this URL in your browser to authenticate:\n");
    println!("{url}\n");

    if open::that(url).is_err() {
        println!("(Could not open browser automatically, please copy the URL above)");
    }
}

fn check_callback_error(params: &HashMap<String, String>) -> Result<()> {
    if let Some(error) = params.get("error") {
        let description = params
            .get("error_description")
            .map(String::as_str)
            .unwrap_or(error.as_str());
        anyhow::bail!("Authorization failed: {description}");
    }
    Ok(())
}

/// Accept one HTTP request on `listener` and return its query parameters.
async fn wait_for_callback(listener: TcpListener) -> Result<HashMap<String, String>> {
    let (stream, _) = listener
        .accept()
        .await
        .context("Failed to accept OAuth callback")?;

    let mut reader = BufReader::new(stream);
    let mut request_line = String::new();
    reader
        .read_line(&mut request_line)
        .await
        .context("Failed to read OAuth callback request line")?;

    let params = parse_callback_params(&request_line)?;

    let (title, body) = if params.contains_key("error") {
        ("Connection failed", "Return to the terminal for details.")
    } else {
        ("Authentication successful!", "You can close this window and return to the terminal.")
    };
    let response = format!(
        "HTTP/1.1 200 OK\r\n\
        Content-Type: text/html\r\n\
        Connection: close\r\n\
        \r\n\
        <html><body><h1>{title}</h1><p>{body}</p></body></html>"
    );

    let mut stream = reader.into_inner();
    stream
        .write_all(response.as_bytes())
        .await
        .context("Failed to write OAuth callback response")?;
    stream.flush().await?;

    Ok(params)
}

/// Query parameters from an HTTP request line like `GET /auth/callback?code=abc HTTP/1.1`.
fn parse_callback_params(request_line: &str) -> Result<HashMap<String, String>> {
    let target = request_line
        .split_whitespace()
        .nth(1)
        .ok_or_else(|| anyhow::anyhow!("Invalid HTTP request"))?;

    let url = url::Url::parse(&format!("http://localhost{target}"))?;
    Ok(url.query_pairs().into_owned().collect())
}
