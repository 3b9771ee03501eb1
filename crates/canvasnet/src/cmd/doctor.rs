use std::net::TcpListener;

use canvasnet_reactor::{open, Backend, EventMask, WaitTimeout, Waker};
use serde::Serialize;

use crate::cmd::DoctorArgs;
use crate::exit::{CliResult, HEALTH_CHECK_FAILED, SUCCESS};
use crate::output::OutputFormat;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
enum CheckStatus {
    Pass,
    Fail,
    Info,
}

#[derive(Debug, Serialize)]
struct CheckResult {
    name: String,
    status: CheckStatus,
    detail: String,
}

#[derive(Debug, Serialize)]
struct DoctorOutput {
    checks: Vec<CheckResult>,
    overall: &'static str,
}

pub fn run(_args: DoctorArgs, format: OutputFormat) -> CliResult<i32> {
    let mut checks: Vec<CheckResult> = Backend::available()
        .iter()
        .map(|backend| backend_check(*backend))
        .collect();
    if checks.is_empty() {
        checks.push(CheckResult {
            name: "backends".to_string(),
            status: CheckStatus::Fail,
            detail: "no readiness backend is compiled for this platform".to_string(),
        });
    }
    checks.push(loopback_check());
    checks.push(default_backend_check());

    let has_fail = checks.iter().any(|c| c.status == CheckStatus::Fail);
    let output = DoctorOutput {
        checks,
        overall: if has_fail { "fail" } else { "pass" },
    };

    print_doctor(&output, format);

    if has_fail {
        Ok(HEALTH_CHECK_FAILED)
    } else {
        Ok(SUCCESS)
    }
}

/// Open the backend, register a waker and expect exactly that waker to be
/// reported readable after a wake.
fn backend_check(backend: Backend) -> CheckResult {
    let name = format!("backend_{backend}");
    match probe(backend) {
        Ok(()) => CheckResult {
            name,
            status: CheckStatus::Pass,
            detail: "wake reported readable".to_string(),
        },
        Err(detail) => CheckResult {
            name,
            status: CheckStatus::Fail,
            detail,
        },
    }
}

fn probe(backend: Backend) -> Result<(), String> {
    let mut mux = open(backend).map_err(|err| err.to_string())?;
    let waker = Waker::new().map_err(|err| err.to_string())?;
    mux.add(waker.fd(), EventMask::READ)
        .map_err(|err| err.to_string())?;
    mux.set_timeout(WaitTimeout::from_millis(1000));

    waker.wake().map_err(|err| err.to_string())?;
    let ready = mux.wait().map_err(|err| err.to_string())?;
    if ready != 1 {
        return Err(format!("expected 1 ready descriptor, wait reported {ready}"));
    }
    match mux.next_event() {
        Some(event) if event.fd == waker.fd() && event.mask.contains(EventMask::READ) => {}
        other => return Err(format!("unexpected event {other:?}")),
    }
    waker.drain().map_err(|err| err.to_string())?;
    mux.remove(waker.fd()).map_err(|err| err.to_string())?;
    Ok(())
}

fn loopback_check() -> CheckResult {
    match TcpListener::bind("127.0.0.1:0").and_then(|l| l.local_addr()) {
        Ok(addr) => CheckResult {
            name: "loopback_listen".to_string(),
            status: CheckStatus::Pass,
            detail: format!("bound {addr}"),
        },
        Err(err) => CheckResult {
            name: "loopback_listen".to_string(),
            status: CheckStatus::Fail,
            detail: format!("loopback bind failed: {err}"),
        },
    }
}

fn default_backend_check() -> CheckResult {
    CheckResult {
        name: "default_backend".to_string(),
        status: CheckStatus::Info,
        detail: Backend::default_for_platform().to_string(),
    }
}

fn print_doctor(output: &DoctorOutput, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string(output).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table | OutputFormat::Pretty => {
            println!("canvasnet doctor\n");
            for c in &output.checks {
                println!(
                    "  [{:>4}] {:<18} {}",
                    status_text(c.status),
                    c.name,
                    c.detail
                );
            }
            if output.overall == "pass" {
                println!("\n  Result: all checks passed");
            } else {
                println!("\n  Result: one or more checks failed");
            }
        }
        OutputFormat::Raw => {
            println!("{}", output.overall);
        }
    }
}

fn status_text(status: CheckStatus) -> &'static str {
    match status {
        CheckStatus::Pass => "PASS",
        CheckStatus::Fail => "FAIL",
        CheckStatus::Info => "INFO",
    }
}
