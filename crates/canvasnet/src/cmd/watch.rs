use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use canvasnet_hub::{Client, ClientConfig, HubError};
use canvasnet_message::{Message, Stream};

use crate::cmd::WatchArgs;
use crate::exit::{hub_error, CliError, CliResult, INTERNAL, SUCCESS};
use crate::output::{print_message, OutputFormat};

/// How often a blocked receive checks for Ctrl-C.
const POLL_INTERVAL: Duration = Duration::from_millis(250);

pub fn run(args: WatchArgs, format: OutputFormat) -> CliResult<i32> {
    let config = ClientConfig {
        timeout: Duration::from_millis(args.timeout_ms),
        recv_timeout: Some(POLL_INTERVAL),
    };
    let mut client =
        Client::connect(&args.addr, &args.name, config).map_err(|err| hub_error("login failed", err))?;
    tracing::info!(ctx = client.context_id(), addr = %args.addr, "watching session");

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone())?;

    let mut printed = 0usize;
    while running.load(Ordering::SeqCst) {
        if args.count.is_some_and(|count| printed >= count) {
            break;
        }
        let message = match client.recv() {
            Ok(message) => message,
            Err(HubError::Timeout(_)) => continue,
            Err(HubError::Message(canvasnet_message::MessageError::ConnectionClosed)) => {
                tracing::info!("hub closed the session");
                break;
            }
            Err(err) => return Err(hub_error("receive failed", err)),
        };
        if !wanted(&message, args.streams.as_deref()) {
            continue;
        }
        print_message(&message, format);
        printed += 1;
    }

    if let Err(err) = client.close() {
        tracing::debug!(error = %err, "close after watch failed");
    }
    Ok(SUCCESS)
}

fn wanted(message: &Message, streams: Option<&[Stream]>) -> bool {
    streams.is_none_or(|streams| streams.contains(&message.stream()))
}

fn install_ctrlc_handler(running: Arc<AtomicBool>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))
}
