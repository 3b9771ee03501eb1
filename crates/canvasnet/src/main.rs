mod cmd;
mod exit;
mod logging;
mod output;

use clap::Parser;

use crate::cmd::Command;
use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "canvasnet", version, about = "Collaborative drawing session hub and tools")]
struct Cli {
    /// Output format.
    #[arg(long, value_name = "FORMAT", global = true)]
    format: Option<OutputFormat>,

    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", default_value = "text", global = true)]
    log_format: LogFormat,

    /// Minimum log level (stderr).
    #[arg(long, value_name = "LEVEL", default_value = "info", global = true)]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_level);

    let format = cli.format.unwrap_or_else(OutputFormat::default_for_stdout);
    let result = cmd::run(cli.command, format);

    match result {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}

#[cfg(test)]
mod tests {
    use canvasnet_message::Stream;
    use canvasnet_reactor::Backend;

    use super::*;

    #[test]
    fn parses_serve_with_backend() {
        let cli = Cli::try_parse_from([
            "canvasnet",
            "serve",
            "127.0.0.1:0",
            "--backend",
            "poll",
            "--max-users",
            "4",
        ])
        .expect("serve args should parse");

        match cli.command {
            Command::Serve(args) => {
                assert_eq!(args.backend, Some(Backend::Poll));
                assert_eq!(args.max_users, 4);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn rejects_zero_max_users() {
        let err = Cli::try_parse_from(["canvasnet", "serve", "127.0.0.1:0", "--max-users", "0"])
            .expect_err("zero users should fail");
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[test]
    fn rejects_unknown_backend() {
        let err = Cli::try_parse_from(["canvasnet", "serve", "127.0.0.1:0", "--backend", "kqueue"])
            .expect_err("unknown backend should fail");
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[test]
    fn rejects_conflicting_payload_args() {
        let err = Cli::try_parse_from([
            "canvasnet",
            "send",
            "127.0.0.1:7000",
            "--chat",
            "hello",
            "--title",
            "board",
        ])
        .expect_err("conflicting args should fail");

        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
    }

    #[test]
    fn send_requires_a_payload() {
        let err = Cli::try_parse_from(["canvasnet", "send", "127.0.0.1:7000"])
            .expect_err("missing payload should fail");
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn parses_watch_stream_list() {
        let cli = Cli::try_parse_from([
            "canvasnet",
            "watch",
            "127.0.0.1:7000",
            "--streams",
            "meta,command",
            "--count",
            "2",
        ])
        .expect("watch args should parse");

        match cli.command {
            Command::Watch(args) => {
                assert_eq!(args.streams, Some(vec![Stream::Meta, Stream::Command]));
                assert_eq!(args.count, Some(2));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
