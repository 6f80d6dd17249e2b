use std::{path::PathBuf, sync::Arc};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use client_core::{
    AdminConsole, ConsoleEvent, FormInputs, HttpTransportClient, Outcome, VisibilityToggle,
};
use shared::domain::DriveId;
use tokio::{
    io::{AsyncBufReadExt, AsyncWriteExt, BufReader},
    sync::broadcast,
};
use tracing_subscriber::EnvFilter;

mod config;
mod controller;
mod render;

use controller::{
    commands::{parse_command, HELP},
    orchestration::{dispatch_console_command, Step},
};

#[derive(Parser, Debug)]
#[command(about = "Admin console for the community transport service")]
struct Cli {
    /// Overrides the server URL from settings.
    #[arg(long, global = true)]
    server_url: Option<String>,
    /// Settings file (defaults to ./console.toml when present).
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load the snapshot and print every selector and table.
    ListAll,
    CreateResident {
        #[arg(long, default_value = "")]
        name: String,
        /// Typed street; wins over --street-choice.
        #[arg(long, default_value = "")]
        street: String,
        #[arg(long, default_value = "")]
        street_choice: String,
    },
    CreateDriver {
        #[arg(long, default_value = "")]
        status: String,
    },
    CreateDrive {
        #[arg(long, default_value = "")]
        driver: String,
        #[arg(long, default_value = "")]
        location: String,
    },
    CreateStop {
        #[arg(long, default_value = "")]
        resident: String,
        #[arg(long, default_value = "")]
        drive: String,
        #[arg(long, default_value = "")]
        street: String,
    },
    Schedule {
        #[arg(long, default_value = "")]
        driver: String,
    },
    Inbox {
        #[arg(long, default_value = "")]
        resident: String,
        #[arg(long, default_value = "")]
        street: String,
    },
    /// Edit a drive from the driver's schedule and submit it.
    UpdateDrive {
        #[arg(long)]
        driver: String,
        #[arg(long)]
        drive: i64,
        #[arg(long)]
        datetime: Option<String>,
        #[arg(long)]
        location: Option<String>,
    },
    /// Line-driven session (default).
    Interactive,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = config::load_settings(cli.config.as_deref())?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&settings.log_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    let server_url = cli.server_url.unwrap_or(settings.server_url);
    let client = HttpTransportClient::new(&server_url)
        .with_context(|| format!("invalid server url '{server_url}'"))?;
    tracing::info!(server_url = %client.base_url(), "transport console starting");
    let console = AdminConsole::new(client, Arc::new(VisibilityToggle::default()));

    run_command(&console, cli.command.unwrap_or(Command::Interactive)).await
}

async fn run_command(console: &AdminConsole<HttpTransportClient>, command: Command) -> Result<()> {
    let mut inputs = FormInputs::default();
    let mut output = None;

    let outcome = match command {
        Command::ListAll => {
            let outcome = console.refresh_all().await;
            output = Some(render::snapshot(&console.snapshot_view().await));
            outcome
        }
        Command::CreateResident {
            name,
            street,
            street_choice,
        } => {
            inputs.new_resident_name = name;
            inputs.new_resident_street = street;
            inputs.selected_street = street_choice;
            console.create_resident(&inputs).await
        }
        Command::CreateDriver { status } => {
            inputs.new_driver_status = status;
            console.create_driver(&inputs).await
        }
        Command::CreateDrive { driver, location } => {
            inputs.selected_driver = driver;
            inputs.new_drive_location = location;
            console.create_drive(&inputs).await
        }
        Command::CreateStop {
            resident,
            drive,
            street,
        } => {
            inputs.selected_resident = resident;
            inputs.selected_drive = drive;
            inputs.new_stop_street = street;
            console.create_stop(&inputs).await
        }
        Command::Schedule { driver } => {
            inputs.selected_driver = driver;
            let outcome = console.show_schedule(&inputs).await;
            output = console.schedule_view().await.map(|view| render::schedule(&view));
            outcome
        }
        Command::Inbox { resident, street } => {
            inputs.selected_resident = resident;
            inputs.new_stop_street = street;
            let outcome = console.show_inbox(&inputs).await;
            output = console.inbox_view().await.map(|view| render::inbox(&view));
            outcome
        }
        Command::UpdateDrive {
            driver,
            drive,
            datetime,
            location,
        } => {
            inputs.selected_driver = driver;
            update_drive(console, &inputs, DriveId(drive), datetime, location).await
        }
        Command::Interactive => return run_interactive(console).await,
    };

    print!("{}", render::log(console.log_entries().await.iter()));
    if let Some(output) = output {
        print!("{output}");
    }

    if !outcome.is_completed() {
        bail!("command did not complete ({outcome:?})");
    }
    Ok(())
}

async fn update_drive(
    console: &AdminConsole<HttpTransportClient>,
    inputs: &FormInputs,
    drive_id: DriveId,
    datetime: Option<String>,
    location: Option<String>,
) -> Outcome {
    let loaded = console.show_schedule(inputs).await;
    if !loaded.is_completed() {
        return loaded;
    }
    let opened = console.open_editor_for(drive_id).await;
    if !opened.is_completed() {
        return opened;
    }
    console
        .update_edit_form(|form| {
            if let Some(datetime) = datetime {
                form.datetime = datetime;
            }
            if let Some(location) = location {
                form.location = location;
            }
        })
        .await;
    console.submit_edit().await
}

async fn run_interactive(console: &AdminConsole<HttpTransportClient>) -> Result<()> {
    let mut events = console.subscribe_events();
    let mut inputs = FormInputs::default();
    let mut stdout = tokio::io::stdout();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    stdout.write_all(format!("{HELP}\n").as_bytes()).await?;
    console.refresh_all().await;
    flush_log_events(&mut events, &mut stdout).await?;

    loop {
        stdout.write_all(b"> ").await?;
        stdout.flush().await?;
        let Some(line) = lines.next_line().await? else {
            break;
        };

        let cmd = match parse_command(&line) {
            Ok(Some(cmd)) => cmd,
            Ok(None) => continue,
            Err(err) => {
                stdout.write_all(format!("{err}\n").as_bytes()).await?;
                continue;
            }
        };

        let step = dispatch_console_command(console, &mut inputs, cmd).await;
        flush_log_events(&mut events, &mut stdout).await?;
        match step {
            Step::Output(text) => stdout.write_all(text.as_bytes()).await?,
            Step::Quiet => {}
            Step::Quit => break,
        }
    }

    stdout.flush().await?;
    Ok(())
}

/// Prints log entries broadcast since the last call.
async fn flush_log_events(
    events: &mut broadcast::Receiver<ConsoleEvent>,
    stdout: &mut tokio::io::Stdout,
) -> Result<()> {
    loop {
        match events.try_recv() {
            Ok(ConsoleEvent::Logged(entry)) => {
                stdout.write_all(format!("{entry}\n").as_bytes()).await?;
            }
            Ok(_) => {}
            Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "console output fell behind; some log lines skipped");
            }
            Err(_) => break,
        }
    }
    Ok(())
}
