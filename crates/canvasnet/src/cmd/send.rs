use std::time::Duration;

use canvasnet_hub::{Client, ClientConfig, HubError};
use canvasnet_message::payload::SessionTitle;
use canvasnet_message::Message;

use crate::cmd::SendArgs;
use crate::exit::{hub_error, CliError, CliResult, SUCCESS, USAGE};
use crate::output::{print_message, OutputFormat};

pub fn run(args: SendArgs, format: OutputFormat) -> CliResult<i32> {
    let message = build_message(&args)?;
    let timeout = Duration::from_millis(args.timeout_ms);
    let config = ClientConfig {
        timeout,
        recv_timeout: Some(timeout),
    };

    let mut client =
        Client::connect(&args.addr, &args.name, config).map_err(|err| hub_error("login failed", err))?;
    client
        .send(&message)
        .map_err(|err| hub_error("send failed", err))?;
    tracing::info!(
        ctx = client.context_id(),
        kind = %message.message_type(),
        "sent message"
    );

    if args.wait {
        let relayed = wait_for_relay(&mut client, &message)?;
        print_message(&relayed, format);
    }

    client.close().map_err(|err| hub_error("close failed", err))?;
    Ok(SUCCESS)
}

fn build_message(args: &SendArgs) -> CliResult<Message> {
    match (&args.chat, &args.title) {
        (Some(text), None) => Ok(Message::chat(0, text.as_str())),
        (None, Some(title)) => Ok(Message::new(
            0,
            SessionTitle {
                title: title.clone(),
            },
        )),
        _ => Err(CliError::new(USAGE, "exactly one of --chat or --title is required")),
    }
}

/// Read until the hub echoes `sent` back stamped with our context id.
fn wait_for_relay(client: &mut Client, sent: &Message) -> CliResult<Message> {
    let ctx = client.context_id();
    let mut expected = sent.clone();
    expected.set_context_id(ctx);
    loop {
        match client.recv() {
            Ok(message) if message == expected => return Ok(message),
            Ok(other) => {
                tracing::debug!(kind = %other.message_type(), ctx = other.context_id(), "skipping");
            }
            Err(HubError::Timeout(elapsed)) => {
                return Err(hub_error(
                    "no relay received (operator-only messages are dropped for other participants)",
                    HubError::Timeout(elapsed),
                ))
            }
            Err(err) => return Err(hub_error("receive failed", err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use canvasnet_message::{Body, MessageType};

    use super::*;

    fn args(chat: Option<&str>, title: Option<&str>) -> SendArgs {
        SendArgs {
            addr: "127.0.0.1:1".to_string(),
            name: "tester".to_string(),
            chat: chat.map(str::to_string),
            title: title.map(str::to_string),
            wait: false,
            timeout_ms: 100,
        }
    }

    #[test]
    fn chat_flag_builds_chat() {
        let message = build_message(&args(Some("hi"), None)).unwrap();
        assert_eq!(message, Message::chat(0, "hi"));
    }

    #[test]
    fn title_flag_builds_session_title() {
        let message = build_message(&args(None, Some("sketch night"))).unwrap();
        assert_eq!(message.message_type(), MessageType::SessionTitle);
        assert!(matches!(message.body(), Body::SessionTitle(t) if t.title == "sketch night"));
    }

    #[test]
    fn missing_payload_is_usage_error() {
        let err = build_message(&args(None, None)).unwrap_err();
        assert_eq!(err.code, USAGE);
    }
}
