mod render;

use std::{
    io::{self, IsTerminal, Write as _},
    path::PathBuf,
    process::ExitCode,
    time::Duration,
};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use client_core::{
    load_settings,
    resources::{
        CreateBooking, DesignDetail, DesignList, Login, Logout, MyBookings, Notifications,
        Register,
    },
    validation::{BookingForm, LoginForm, RegisterForm},
    ClientContext, Resource, Screen,
};
use shared::domain::DesignId;
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::EnvFilter;

use render::{event_line, View};

#[derive(Parser, Debug)]
#[command(name = "designsphere", about = "Browse and book designs on a DesignSphere server")]
struct Args {
    /// Config file; `designsphere.toml` in the working directory is used when present.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[arg(long, global = true)]
    api_url: Option<String>,
    #[arg(long, global = true)]
    timeout_ms: Option<u64>,
    #[arg(long, global = true)]
    credential_file: Option<PathBuf>,
    /// Print screen data as JSON.
    #[arg(long, global = true)]
    json: bool,
    /// Never prompt to retry a failed request.
    #[arg(long, global = true)]
    no_retry: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Login {
        #[arg(long)]
        username: String,
        #[arg(long, env = "DESIGNSPHERE_PASSWORD", hide_env_values = true)]
        password: String,
    },
    Register {
        #[arg(long)]
        username: String,
        #[arg(long, env = "DESIGNSPHERE_PASSWORD", hide_env_values = true)]
        password: String,
        #[arg(long, default_value = "")]
        email: String,
        /// `client` or `designer`.
        #[arg(long, default_value = "client")]
        role: String,
    },
    Logout,
    /// List all designs.
    Designs,
    /// Show one design.
    Design { id: i64 },
    /// Book a design for a date (YYYY-MM-DD).
    Book {
        design_id: i64,
        #[arg(long)]
        date: String,
        #[arg(long, default_value = "")]
        price: String,
        #[arg(long, default_value = "")]
        notes: String,
    },
    /// List your bookings.
    Bookings,
    Notifications,
}

struct Output {
    json: bool,
    prompt: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();
    let args = Args::parse();

    match run(args).await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<ExitCode> {
    let mut settings = load_settings(args.config.as_deref())?;
    if let Some(api_url) = args.api_url {
        settings.api_base_url = api_url;
    }
    if let Some(timeout_ms) = args.timeout_ms {
        settings.request_timeout = Duration::from_millis(timeout_ms);
    }
    if let Some(path) = args.credential_file {
        settings.credential_path = Some(path);
    }

    let ctx = ClientContext::connect(&settings)
        .await
        .context("failed to start marketplace client")?;
    let output = Output {
        json: args.json,
        prompt: !args.no_retry && io::stdin().is_terminal(),
    };

    match args.command {
        Command::Login { username, password } => {
            let form = LoginForm { username, password };
            drive(Login { form }, &ctx, &output).await
        }
        Command::Register {
            username,
            password,
            email,
            role,
        } => {
            let form = RegisterForm {
                username,
                password,
                email,
                role,
            };
            drive(Register { form }, &ctx, &output).await
        }
        Command::Logout => drive(Logout, &ctx, &output).await,
        Command::Designs => drive(DesignList, &ctx, &output).await,
        Command::Design { id } => drive(DesignDetail { id: DesignId(id) }, &ctx, &output).await,
        Command::Book {
            design_id,
            date,
            price,
            notes,
        } => {
            let form = BookingForm {
                booking_date: date,
                negotiated_price: price,
                notes,
                ..BookingForm::new(DesignId(design_id))
            };
            drive(CreateBooking { form }, &ctx, &output).await
        }
        Command::Bookings => drive(MyBookings, &ctx, &output).await,
        Command::Notifications => drive(Notifications, &ctx, &output).await,
    }
}

/// Mounts the screen for `resource`, echoes navigation notices while the
/// request runs and renders the settled view state.
async fn drive<R>(resource: R, ctx: &ClientContext, output: &Output) -> Result<ExitCode>
where
    R: Resource,
    R::Data: View,
{
    let mut events = ctx.navigator.subscribe();
    let screen = Screen::mount(resource, ctx.clone());

    loop {
        {
            let settle = screen.settle();
            tokio::pin!(settle);
            loop {
                tokio::select! {
                    _ = &mut settle => break,
                    event = events.recv() => match event {
                        Ok(event) => print_event(&event),
                        Err(RecvError::Lagged(skipped)) => {
                            tracing::warn!(skipped, "dropped client events")
                        }
                        Err(RecvError::Closed) => {}
                    },
                }
            }
        }
        while let Ok(event) = events.try_recv() {
            print_event(&event);
        }

        let state = screen.state();
        let Some(error) = state.error else {
            if let Some(data) = &state.data {
                if output.json {
                    println!("{}", serde_json::to_string_pretty(&data.json())?);
                } else {
                    print!("{}", data.text());
                }
            }
            return Ok(ExitCode::SUCCESS);
        };

        eprintln!("{}", error.message);
        let retryable = error.kind.is_remote() && !error.kind.requires_reauth();
        if !(output.prompt && retryable && confirm_retry().await?) {
            return Ok(ExitCode::FAILURE);
        }
        screen.retry();
    }
}

fn print_event(event: &client_core::ClientEvent) {
    if let Some(line) = event_line(event) {
        println!("{line}");
    }
}

async fn confirm_retry() -> Result<bool> {
    let answer = tokio::task::spawn_blocking(|| -> io::Result<String> {
        eprint!("Retry? [y/N] ");
        io::stderr().flush()?;
        let mut line = String::new();
        io::stdin().read_line(&mut line)?;
        Ok(line)
    })
    .await?
    .context("failed to read retry answer")?;
    Ok(matches!(answer.trim(), "y" | "Y" | "yes"))
}
