/// Local HTTP server that receives the authorization redirect
use crate::error::{OAuthError, Result};
use std::collections::HashMap;
use std::io::{BufRead, BufReader, ErrorKind, Write};
use std::net::{TcpListener, TcpStream};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

const CALLBACK_PATH: &str = "/callback";
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Parameters delivered to the redirect URI
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallbackResult {
    pub code: String,
    pub state: Option<String>,
}

/// Loopback server for the OAuth redirect
pub struct CallbackServer {
    listener: TcpListener,
    port: u16,
}

impl CallbackServer {
    /// Bind on a random free port
    pub fn new() -> Result<Self> {
        Self::bind(0)
    }

    /// Bind on a specific port, e.g. the one registered with the developer key
    pub fn bind(port: u16) -> Result<Self> {
        let listener = TcpListener::bind(("127.0.0.1", port))?;
        let port = listener.local_addr()?.port();
        listener.set_nonblocking(true)?;

        debug!(port, "Callback server listening");
        Ok(Self { listener, port })
    }

    /// Redirect URI to pass as `callback_url`
    pub fn redirect_uri(&self) -> String {
        format!("http://127.0.0.1:{}{}", self.port, CALLBACK_PATH)
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Wait for the provider to redirect the browser back
    ///
    /// Requests for other paths, or without a query, are answered with an
    /// error page and ignored.
    pub fn wait_for_callback(&self, timeout: Duration) -> Result<CallbackResult> {
        let deadline = Instant::now() + timeout;

        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(OAuthError::CallbackTimeout);
            }

            match self.listener.accept() {
                Ok((stream, _)) => {
                    stream.set_nonblocking(false)?;
                    // A connection that never sends a request must not outlive the deadline
                    stream.set_read_timeout(Some(remaining.max(POLL_INTERVAL)))?;
                    match handle_request(stream) {
                        Ok(Some(result)) => {
                            info!("Received authorization callback");
                            return Ok(result);
                        }
                        Ok(None) => {}
                        Err(OAuthError::IoError(e)) if is_abandoned(&e) => {
                            debug!(error = %e, "Dropped idle callback connection");
                        }
                        Err(e) => return Err(e),
                    }
                }
                Err(e) if e.kind() == ErrorKind::WouldBlock => {
                    std::thread::sleep(POLL_INTERVAL.min(remaining));
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}

fn is_abandoned(e: &std::io::Error) -> bool {
    matches!(
        e.kind(),
        ErrorKind::WouldBlock
            | ErrorKind::TimedOut
            | ErrorKind::ConnectionReset
            | ErrorKind::BrokenPipe
            | ErrorKind::UnexpectedEof
    )
}

fn handle_request(stream: TcpStream) -> Result<Option<CallbackResult>> {
    let mut reader = BufReader::new(stream.try_clone()?);
    let mut request_line = String::new();
    if reader.read_line(&mut request_line)? == 0 {
        return Ok(None);
    }

    // Headers are unused but must be read before the socket is closed
    let mut header = String::new();
    while reader.read_line(&mut header)? > 2 {
        header.clear();
    }

    // GET /callback?code=...&state=... HTTP/1.1
    let target = match request_line.split_whitespace().nth(1) {
        Some(target) => target,
        None => {
            send_response(stream, false, "Invalid request")?;
            return Ok(None);
        }
    };

    let (path, query) = target.split_once('?').unwrap_or((target, ""));
    if path != CALLBACK_PATH {
        send_response(stream, false, "Not found")?;
        return Ok(None);
    }
    if query.is_empty() {
        send_response(stream, false, "Missing query parameters")?;
        return Ok(None);
    }

    let mut params = parse_query_params(query);

    if let Some(error) = params.remove("error") {
        warn!(error = %error, "Authorization was denied");
        send_response(stream, false, &format!("Authorization failed: {}", error))?;
        return Err(OAuthError::AuthorizationDenied {
            error,
            description: params.remove("error_description"),
        });
    }

    let code = match params.remove("code") {
        Some(code) if !code.is_empty() => code,
        _ => {
            send_response(stream, false, "Missing authorization code")?;
            return Err(OAuthError::MissingField("code".into()));
        }
    };

    send_response(stream, true, "You can close this window and return to your terminal.")?;

    Ok(Some(CallbackResult {
        code,
        state: params.remove("state"),
    }))
}

fn parse_query_params(query: &str) -> HashMap<String, String> {
    url::form_urlencoded::parse(query.as_bytes())
        .into_owned()
        .collect()
}

fn send_response(mut stream: TcpStream, success: bool, message: &str) -> Result<()> {
    let (status, title) = if success {
        ("200 OK", "Authorization Successful")
    } else {
        ("400 Bad Request", "Authorization Failed")
    };

    let html = format!(
        "<!DOCTYPE html>\n<html>\n<head><meta charset=\"utf-8\"><title>{title}</title></head>\n\
         <body><h1>{title}</h1><p>{message}</p></body>\n</html>",
        title = title,
        message = escape_html(message)
    );

    let response = format!(
        "HTTP/1.1 {}\r\nContent-Type: text/html; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        html.len(),
        html
    );

    stream.write_all(response.as_bytes())?;
    stream.flush()?;
    Ok(())
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Open a URL in the user's default browser
pub fn open_in_browser(url: &str) -> Result<()> {
    webbrowser::open(url)?;
    Ok(())
}
