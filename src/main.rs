//! chatgate - the authentication gate of a chat application.
//!
//! Wires the flow controller to real collaborators: a file-backed session
//! store, the HTTP auth client, a stderr notification surface, and a
//! route recorder the prompt loop applies. Run with no flags to log in
//! (or land directly when a session is already stored), `--register` to
//! create an account, `--logout` to clear the stored session.

mod api;
mod auth;
mod config;
mod flow;

use std::cell::Cell;
use std::io::{self, Write};
use std::rc::Rc;

use anyhow::Result;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use api::AuthClient;
use auth::{FileSessionStore, LoginInput, RegisterInput, SessionStore};
use config::Config;
use flow::{
    FlowController, FlowState, MountAction, Navigator, Notifier, NotifyOptions, Route, Screen,
    Severity,
};

/// Initialize the tracing subscriber for logging
fn init_tracing() {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

/// Notification surface that prints to stderr.
#[derive(Clone, Copy)]
struct StderrNotifier;

impl Notifier for StderrNotifier {
    fn notify(&self, message: &str, severity: Severity, _options: &NotifyOptions) {
        match severity {
            Severity::Error => eprintln!("error: {message}"),
            Severity::Success => eprintln!("{message}"),
        }
    }
}

/// Records the most recent redirect; the prompt loop applies it.
#[derive(Clone, Default)]
struct RecordedRouter(Rc<Cell<Option<Route>>>);

impl RecordedRouter {
    fn take(&self) -> Option<Route> {
        self.0.take()
    }
}

impl Navigator for RecordedRouter {
    fn go_to(&self, route: Route) {
        self.0.set(Some(route));
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    init_tracing();
    info!("chatgate starting");

    let config = Config::load()?;
    let store = FileSessionStore::new(config.session_path()?);

    let args: Vec<String> = std::env::args().collect();
    if args.iter().any(|a| a == "--logout") {
        store.clear()?;
        println!("Logged out.");
        return Ok(());
    }
    let register = args.iter().any(|a| a == "--register");

    let gateway = AuthClient::new(config.api_base_url.clone())?;
    let router = RecordedRouter::default();
    let mut gate = FlowController::new(store, gateway, StderrNotifier, router.clone());

    let entry = if register { Screen::Register } else { Screen::Login };
    let mut route = match gate.mount(entry) {
        MountAction::RedirectToLanding => router.take().unwrap_or(Route::Landing),
        _ if register => Route::Register,
        _ => Route::Login,
    };

    loop {
        match route {
            Route::Login => {
                println!("\n=== chatgate login ===");
                println!("(no account? run with --register)\n");
                let input = prompt_login()?;
                gate.submit_login(&input).await;
                if let Some(next) = router.take() {
                    route = next;
                }
                // No redirect means the submit failed; the notification is
                // already on screen, so prompt again.
            }
            Route::Register => {
                println!("\n=== chatgate registration ===");
                println!("(already registered? run without flags)\n");
                let input = prompt_register()?;
                gate.submit_register(&input).await;
                if let Some(next) = router.take() {
                    route = next;
                }
            }
            Route::Landing => {
                if gate.state() == FlowState::Settled {
                    StderrNotifier.notify(
                        "Login successful.",
                        Severity::Success,
                        &NotifyOptions::default(),
                    );
                    if let Err(e) = config.save() {
                        warn!(error = %e, "Failed to save config");
                    }
                }
                if let MountAction::ShowLanding { username } = gate.mount(Screen::Landing) {
                    match username {
                        Some(name) => println!("\nWelcome, {name}!"),
                        None => println!("\nWelcome!"),
                    }
                    println!("Please select a chat to start messaging.");
                }
                info!("chatgate exiting at landing");
                return Ok(());
            }
        }
    }
}

fn prompt_login() -> Result<LoginInput> {
    Ok(LoginInput {
        email: prompt_line("Email: ")?,
        password: rpassword::prompt_password("Password: ")?,
    })
}

fn prompt_register() -> Result<RegisterInput> {
    Ok(RegisterInput {
        username: prompt_line("Username: ")?,
        email: prompt_line("Email: ")?,
        password: rpassword::prompt_password("Password: ")?,
        confirm_password: rpassword::prompt_password("Confirm password: ")?,
    })
}

fn prompt_line(label: &str) -> Result<String> {
    print!("{label}");
    io::stdout().flush()?;

    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    Ok(line.trim().to_string())
}
