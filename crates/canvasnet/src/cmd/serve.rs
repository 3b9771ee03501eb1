use canvasnet_hub::{Hub, HubConfig, HubHandle};
use canvasnet_reactor::{Backend, WaitTimeout};
use serde::Serialize;

use crate::cmd::ServeArgs;
use crate::exit::{hub_error, CliError, CliResult, INTERNAL, SUCCESS, USAGE};
use crate::output::OutputFormat;

#[derive(Debug, Serialize)]
#[serde(tag = "event", rename_all = "lowercase")]
enum ServeEvent {
    Listening {
        addr: String,
        backend: &'static str,
        max_users: u8,
    },
    Stopped {
        history: usize,
        replayable: usize,
    },
}

pub fn run(args: ServeArgs, format: OutputFormat) -> CliResult<i32> {
    let backend = args.backend.unwrap_or_else(Backend::default_for_platform);
    if !backend.is_available() {
        return Err(CliError::new(
            USAGE,
            format!("backend `{backend}` is not available on this platform"),
        ));
    }

    let config = HubConfig {
        backend,
        wait_timeout: WaitTimeout::from_millis(args.timeout_ms),
        max_users: args.max_users,
        ..HubConfig::default()
    };
    let mut hub = Hub::bind(&args.addr, config).map_err(|err| hub_error("bind failed", err))?;

    install_ctrlc_handler(hub.handle())?;

    print_event(
        &ServeEvent::Listening {
            addr: hub.local_addr().to_string(),
            backend: backend.name(),
            max_users: args.max_users,
        },
        format,
    );

    hub.run().map_err(|err| hub_error("session loop failed", err))?;

    print_event(
        &ServeEvent::Stopped {
            history: hub.history().len(),
            replayable: hub.history().replay().count(),
        },
        format,
    );
    Ok(SUCCESS)
}

fn install_ctrlc_handler(handle: HubHandle) -> CliResult<()> {
    ctrlc::set_handler(move || {
        if let Err(err) = handle.shutdown() {
            tracing::error!(error = %err, "failed to wake hub for shutdown");
        }
    })
    .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))
}

fn print_event(event: &ServeEvent, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string(event).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table | OutputFormat::Pretty => match event {
            ServeEvent::Listening {
                addr,
                backend,
                max_users,
            } => println!("listening on {addr} (backend {backend}, up to {max_users} users)"),
            ServeEvent::Stopped {
                history,
                replayable,
            } => println!("stopped: {history} commands in history, {replayable} still applied"),
        },
        OutputFormat::Raw => {
            if let ServeEvent::Listening { addr, .. } = event {
                println!("{addr}");
            }
        }
    }
    // Callers (and tests) read the address from a pipe.
    let _ = std::io::Write::flush(&mut std::io::stdout());
}
