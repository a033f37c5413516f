//! creditline - terminal front-end for the lending backend.
//!
//! Sign in, apply for loans, upload bank statements for a behavior score,
//! and browse partner banks.

mod commands;
mod prompt;

use std::io;

use anyhow::Result;
use creditline_core::{AppContext, ApiError, Config, ErrorKind, SessionEvent, SessionState};
use tokio::sync::broadcast;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const USAGE: &str = "\
Usage: creditline <command> [args]

Commands:
  login [email]                      Sign in
  register                           Create an account
  logout                             Sign out and forget the stored token
  status                             Show the current session
  dashboard                          Loan and behavior overview
  loans                              List your loan applications
  loan <id>                          Show one loan
  apply                              Apply for a loan
  upload <file> <monthly_income>     Upload a statement for analysis [--json]
  behavior                           Show your behavior score [--json]
  banks [all|top|trusted] [limit]    List partner banks

Environment:
  CREDITLINE_API_URL                 Backend address
  CREDITLINE_CREDENTIAL_BACKEND      file or keyring
  RUST_LOG                           Log filter, e.g. debug";

/// Initialize the tracing subscriber for logging
fn init_tracing() {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

/// Turn an error into something a user can act on.
fn describe(err: &anyhow::Error, config: &Config) -> String {
    let Some(api) = err.downcast_ref::<ApiError>() else {
        return err.to_string();
    };
    match api.kind() {
        ErrorKind::Unauthorized => match api.detail() {
            Some(detail) => detail.to_string(),
            None => "Your session has expired. Run `creditline login` to sign in again.".to_string(),
        },
        ErrorKind::NetworkError => format!(
            "Could not reach the backend at {} ({})",
            config.api_url(),
            api.message()
        ),
        ErrorKind::Forbidden => "You do not have access to that.".to_string(),
        ErrorKind::NotFound => api.detail().unwrap_or("Not found.").to_string(),
        ErrorKind::ServerError => {
            format!("The backend failed to handle the request ({})", api.message())
        }
        ErrorKind::Unknown => api.message().to_string(),
    }
}

/// Report session events that happened while a command ran.
fn drain_events(events: &mut broadcast::Receiver<SessionEvent>) {
    loop {
        match events.try_recv() {
            Ok(SessionEvent::Invalidated) => {
                eprintln!("Your session is no longer valid. Run `creditline login` to sign in again.");
            }
            Ok(_) => {}
            Err(broadcast::error::TryRecvError::Lagged(n)) => {
                warn!(skipped = n, "Missed session events");
            }
            Err(_) => break,
        }
    }
}

async fn run(ctx: &AppContext, config: &mut Config, args: &[String]) -> Result<()> {
    let json = args.iter().any(|a| a == "--json");
    let args: Vec<&str> = args
        .iter()
        .map(String::as_str)
        .filter(|a| *a != "--json")
        .collect();

    match args.as_slice() {
        ["login"] => commands::login(ctx, config, None).await,
        ["login", email] => commands::login(ctx, config, Some(email.to_string())).await,
        ["register"] => commands::register(ctx, config).await,
        ["logout"] => {
            commands::logout(ctx);
            Ok(())
        }
        ["status"] => {
            commands::status(ctx, config);
            Ok(())
        }
        [] | ["dashboard"] => commands::dashboard(ctx).await,
        ["loans"] => commands::loans(ctx).await,
        ["loan", id] => commands::loan(ctx, id).await,
        ["apply"] => commands::apply(ctx).await,
        ["upload", path, income] => commands::upload(ctx, path, income, json).await,
        ["behavior"] => commands::behavior(ctx, json).await,
        ["banks"] => commands::banks(ctx, None, None).await,
        ["banks", kind] => commands::banks(ctx, Some(*kind), None).await,
        ["banks", kind, limit] => commands::banks(ctx, Some(*kind), Some(*limit)).await,
        ["help"] | ["--help"] | ["-h"] => {
            println!("{}", USAGE);
            Ok(())
        }
        _ => {
            eprintln!("{}", USAGE);
            anyhow::bail!("Unrecognized command: {}", args.join(" "))
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    init_tracing();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let mut config = Config::load()?;
    let ctx = AppContext::from_config(&config)?;
    let mut events = ctx.session.subscribe();

    info!(api_url = config.api_url(), "creditline starting");

    // Confirm a stored token before doing anything that depends on it.
    let skip_verify = matches!(args.first().map(String::as_str), Some("logout" | "login" | "register"));
    if !skip_verify && ctx.session.state() == SessionState::Verifying {
        if let Err(e) = ctx.session.verify().await {
            warn!(error = %e, "Stored credential was not accepted");
        }
    }
    drain_events(&mut events);

    let result = run(&ctx, &mut config, &args).await;
    drain_events(&mut events);

    if let Err(e) = result {
        eprintln!("Error: {}", describe(&e, &config));
        std::process::exit(1);
    }
    Ok(())
}
