use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::{cli::new_hook, info, success, warning};

/// Runs the browser login for the stored CLI session.
///
/// The authorize URL is opened in the default browser, or printed if no
/// browser can be launched. The browser does not carry the CLI's session,
/// so the callback page it lands on cannot finish the login; the address of
/// that page is pasted back here and redeemed for this session.
pub async fn login(backend_url: &str) {
    let mut hook = new_hook(backend_url).await;

    if hook.refresh_session().await {
        success!("Already authenticated with Spotify.");
        return;
    }

    info!("Opening Spotify authorization in your browser...");
    if hook.begin_login().await.is_none() {
        return;
    }

    info!("After approving, paste the address of the page you were redirected to:");
    let mut line = String::new();
    let mut stdin = BufReader::new(tokio::io::stdin());
    if let Err(e) = stdin.read_line(&mut line).await {
        warning!("Cannot read from stdin. Err: {}", e);
        return;
    }

    let pb = spinner("Completing authorization...");
    let authenticated = hook.complete_login(&line).await;
    pb.finish_and_clear();

    if authenticated {
        success!("Authentication successful!");
    } else {
        warning!("Authentication failed.");
    }
}

/// Prints whether the stored session is authenticated.
pub async fn status(backend_url: &str) {
    let mut hook = new_hook(backend_url).await;
    if hook.refresh_session().await {
        success!("Authenticated with Spotify.");
    } else {
        warning!("Not authenticated. Run vinylspin login");
    }
}

pub(crate) fn spinner(message: &'static str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(100));
    if let Ok(style) = ProgressStyle::with_template("{spinner:.blue} {msg}") {
        pb.set_style(style.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"));
    }
    pb
}
