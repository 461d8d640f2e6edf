use clap::Parser;
use splitsheet::args::{Args, AuthSubcommand, Command, RecurringSubcommand};
use splitsheet::{commands, Config, Mode, Result};
use std::process::ExitCode;
use tracing::{error, trace};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    init_logger(args.common().log_level());

    match main_inner(args).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Exiting with error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

pub async fn main_inner(args: Args) -> Result<()> {
    trace!("{args:?}");
    let home = args.common().home();

    // This allows for testing the program without hitting the Google APIs.
    // When SPLITSHEET_IN_TEST_MODE is set and non-zero in length, the mode
    // will be Mode::Test, otherwise it will be Mode::Google.
    let mode = Mode::from_env();

    // Route to appropriate command handler
    let _: () = match args.command() {
        Command::Init(init_args) => commands::init(&home, init_args.clone()).await?.print(),

        Command::Auth(auth_args) => {
            let config = Config::load(&home).await?;
            match &auth_args.command {
                AuthSubcommand::Login(login_args) => {
                    commands::auth_login(&config, login_args.clone()).await?.print()
                }
                AuthSubcommand::Status => commands::auth_status(&config).await?.print(),
                AuthSubcommand::Signout => commands::auth_signout(&config).await?.print(),
            }
        }

        Command::Add(add_args) => {
            let config = Config::load(&home).await?;
            commands::add(config, mode, *add_args.clone()).await?.print()
        }

        Command::Delete(delete_args) => {
            let config = Config::load(&home).await?;
            commands::delete(config, mode, delete_args.clone())
                .await?
                .print()
        }

        Command::List(list_args) => {
            let config = Config::load(&home).await?;
            commands::list(config, mode, list_args.clone()).await?.print()
        }

        Command::Report => {
            let config = Config::load(&home).await?;
            commands::report(config, mode).await?.print()
        }

        Command::Balance => {
            let config = Config::load(&home).await?;
            commands::balance(config, mode).await?.print()
        }

        Command::Settle => {
            let config = Config::load(&home).await?;
            commands::settle(config, mode).await?.print()
        }

        Command::Recurring(recurring_args) => {
            let config = Config::load(&home).await?;
            match &recurring_args.command {
                RecurringSubcommand::Add(add_args) => {
                    commands::recurring_add(config, mode, *add_args.clone())
                        .await?
                        .print()
                }
                RecurringSubcommand::List => {
                    commands::recurring_list(config, mode).await?.print()
                }
                RecurringSubcommand::Delete(delete_args) => {
                    commands::recurring_delete(config, mode, delete_args.clone())
                        .await?
                        .print()
                }
                RecurringSubcommand::Run => commands::recurring_run(config, mode).await?.print(),
            }
        }

        Command::Refresh => {
            let config = Config::load(&home).await?;
            commands::refresh(config, mode).await?.print()
        }

        Command::Status => {
            let config = Config::load(&home).await?;
            commands::status(config, mode).await?.print()
        }
    };
    Ok(())
}

/// Initializes the tracing subscriber.
fn init_logger(level: LevelFilter) {
    let filter = match std::env::var("RUST_LOG").ok() {
        Some(_) => {
            // RUST_LOG exists; use it.
            EnvFilter::from_default_env()
        }
        None => {
            // RUST_LOG does not exist; use default log level for this crate only.
            EnvFilter::new(format!(
                "{}={},{}={}",
                env!("CARGO_CRATE_NAME"),
                level,
                env!("CARGO_BIN_NAME"),
                level
            ))
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
