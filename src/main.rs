use anyhow::Result;
use clap::Parser;
use log::{error, info, warn, LevelFilter};
use std::env;
use std::io;
use std::path::PathBuf;

mod credentials;
mod ui;
mod utils;

use crate::{
    credentials::{load_credentials, save_credentials, Credentials},
    ui::{AppUI, UiAction},
};
use rolodex::{ApiClient, AuthMode, Decision, Session};

const DEFAULT_AUTH_URL: &str =
    "https://functions.poehali.dev/b0b7286b-dd21-40f9-aa8b-708e1c01bd9f";
const DEFAULT_CONTACTS_URL: &str =
    "https://functions.poehali.dev/0de765d4-97ed-477f-9bd6-252ef21cd7c3";

/// Command line arguments for rolodex
#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Rolodex: a terminal contact-management client.",
    long_about = "Rolodex is a terminal client for a contact-management service:\n\
    register or sign in, search people, send contact requests and accept\n\
    or reject incoming ones. State lives server-side; the client keeps a\n\
    volatile session only.\n\n\
    Endpoint overrides: --auth-url / --contacts-url, or the environment\n\
    variables ROLODEX_AUTH_URL / ROLODEX_CONTACTS_URL."
)]
struct Args {
    /// Auth service endpoint URL
    #[arg(long, value_name = "URL")]
    auth_url: Option<String>,

    /// Contacts service endpoint URL
    #[arg(long, value_name = "URL")]
    contacts_url: Option<String>,

    /// Override the directory for cached credentials
    #[arg(long, value_name = "PATH")]
    config_dir: Option<PathBuf>,

    /// Log file path
    #[arg(long, value_name = "PATH", default_value = "rolodex.log")]
    log_file: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    if let Some(dir) = &args.config_dir {
        credentials::set_config_dir_override(dir.clone());
    }

    utils::setup_logging(args.log_file.to_str(), LevelFilter::Debug)?;
    info!("Rolodex contact client starting up");
    info!("Logging to file: {}", args.log_file.display());

    let auth_url = args
        .auth_url
        .or_else(|| env::var("ROLODEX_AUTH_URL").ok())
        .unwrap_or_else(|| DEFAULT_AUTH_URL.to_string());
    let contacts_url = args
        .contacts_url
        .or_else(|| env::var("ROLODEX_CONTACTS_URL").ok())
        .unwrap_or_else(|| DEFAULT_CONTACTS_URL.to_string());
    info!("Auth endpoint: {}", auth_url);
    info!("Contacts endpoint: {}", contacts_url);

    let mut session = Session::new(ApiClient::new(&auth_url, &contacts_url));
    let mut app_ui = AppUI::new();

    // Prefill the login form: environment variables win over the cached
    // credentials file. Nothing is submitted until the user hits Enter.
    let credentials_from_env = match (env::var("ROLODEX_EMAIL"), env::var("ROLODEX_PASSWORD")) {
        (Ok(email), Ok(password)) => {
            app_ui.prefill_credentials(&email, &password);
            true
        }
        _ => {
            if let Some(creds) = load_credentials()? {
                info!("Using cached credentials for {}", creds.email);
                app_ui.prefill_credentials(&creds.email, &creds.get_password().unwrap_or_default());
            }
            false
        }
    };

    let mut terminal = ui::setup_terminal()?;
    let result = run_main_loop(&mut app_ui, &mut terminal, &mut session, credentials_from_env).await;
    ui::restore_terminal(terminal)?;
    result?;

    println!("Session ended.");
    Ok(())
}

/// Run the main event loop: draw, poll for one key, run at most one
/// session operation, repeat. Single logical thread of event handlers;
/// no operation outlives its loop turn.
async fn run_main_loop(
    app_ui: &mut AppUI,
    terminal: &mut ui::Terminal<ui::CrosstermBackend<io::Stdout>>,
    session: &mut Session,
    credentials_from_env: bool,
) -> Result<()> {
    loop {
        terminal.draw(|f| app_ui.draw(f, session))?;

        app_ui.clean_toast(4);

        let Some(action) = app_ui.handle_input(session)? else {
            continue;
        };

        match action {
            UiAction::Quit => break,

            UiAction::Authenticate {
                mode,
                email,
                password,
                name,
            } => {
                let name = if name.is_empty() { None } else { Some(name.as_str()) };
                match session.authenticate(mode, &email, &password, name).await {
                    Ok(()) => {
                        // Cache credentials on success, but only if they
                        // did not come from the environment.
                        if !credentials_from_env {
                            if let Err(e) = save_credentials(&Credentials::new(&email, &password)) {
                                warn!("Failed to save credentials: {}", e);
                            }
                        }
                        app_ui.show_main();
                        app_ui.show_toast(match mode {
                            AuthMode::Login => "Signed in",
                            AuthMode::Register => "Account created",
                        });
                    }
                    Err(e) => {
                        error!("Authentication failed: {}", e);
                        app_ui.show_error(&e.to_string());
                    }
                }
            }

            UiAction::Logout => {
                session.logout();
                app_ui.show_login();
                app_ui.show_toast("Signed out");
            }

            UiAction::RefreshContacts => {
                if let Err(e) = session.refresh_contacts().await {
                    error!("Failed to refresh contacts: {}", e);
                    app_ui.show_error(&e.to_string());
                }
            }

            UiAction::RefreshRequests => {
                if let Err(e) = session.refresh_requests().await {
                    error!("Failed to refresh requests: {}", e);
                    app_ui.show_error(&e.to_string());
                } else if let Err(e) = session.refresh_sent_requests().await {
                    error!("Failed to refresh sent requests: {}", e);
                    app_ui.show_error(&e.to_string());
                }
            }

            UiAction::Search(query) => {
                if let Err(e) = session.search(&query).await {
                    error!("Search failed: {}", e);
                    app_ui.show_error(&e.to_string());
                }
            }

            UiAction::SendRequest(email) => match session.send_request(&email).await {
                Ok(()) => {
                    app_ui.clear_search_input();
                    app_ui.show_toast("Request sent");
                }
                Err(e) => {
                    error!("Failed to send request to {}: {}", email, e);
                    app_ui.show_error(&e.to_string());
                }
            },

            UiAction::Respond {
                request_id,
                decision,
            } => match session.respond(request_id, decision).await {
                Ok(()) => app_ui.show_toast(match decision {
                    Decision::Accept => "Request accepted",
                    Decision::Reject => "Request rejected",
                }),
                Err(e) => {
                    error!("Failed to resolve request {}: {}", request_id, e);
                    app_ui.show_error(&e.to_string());
                }
            },
        }
    }

    Ok(())
}
