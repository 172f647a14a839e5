/// Example: Login Flow
///
/// Opens the Canvas login page, waits for the redirect on a local callback
/// server, exchanges the code for tokens and logs out again.
///
/// Run:
/// CANVAS_API_HOST=https://canvas.example.com \
/// CANVAS_CLIENT_ID=... CANVAS_CLIENT_SECRET=... \
/// cargo run --example login_flow
use canvas_oauth::prelude::*;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("canvas_oauth=debug")),
        )
        .init();

    println!("=== Canvas Login Flow Example ===\n");

    let config = ClientConfig::from_env()?;
    let transport = Arc::new(HttpTransport::for_client(&config)?);
    let mut client = OAuthClient::new(config, transport);

    // Developer keys usually register a fixed redirect port
    let server = CallbackServer::bind(8080)?;
    let redirect_uri = server.redirect_uri();

    let url = client.login_url(Some(&redirect_uri))?;
    println!("Opening browser for authorization:");
    println!("  {}\n", url);
    if let Err(e) = open_in_browser(&url) {
        println!("Could not open a browser ({}), open the URL manually.", e);
    }

    println!("Waiting for callback on {} ...", redirect_uri);
    let callback = server.wait_for_callback(Duration::from_secs(300))?;
    println!("✓ Received authorization code\n");

    let response = client.exchange_code(Some(&callback.code), Some(&redirect_uri), None)?;
    println!("✓ Tokens received");
    println!("  Refresh token issued: {}", response.refresh_token.is_some());
    if let Some(user) = response.get("user") {
        println!("  User: {}", user);
    }

    if let Some(refresh_token) = client.refresh_token().map(str::to_string) {
        client.refresh_access_token(Some(&refresh_token))?;
        println!("✓ Access token refreshed");
    }

    let logged_out = client.logout()?;
    println!("\nLogged out: {}", logged_out);

    Ok(())
}
