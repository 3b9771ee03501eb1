use canvasnet_reactor::Backend;

use crate::cmd::VersionArgs;
use crate::exit::{CliResult, SUCCESS};

pub fn run(args: VersionArgs) -> CliResult<i32> {
    if !args.extended {
        println!("canvasnet {}", env!("CARGO_PKG_VERSION"));
        return Ok(SUCCESS);
    }

    let backends: Vec<&str> = Backend::available().iter().map(|b| b.name()).collect();

    println!("name: canvasnet");
    println!("version: {}", env!("CARGO_PKG_VERSION"));
    println!(
        "target: {}",
        option_env!("CANVASNET_BUILD_TARGET").unwrap_or("unknown")
    );
    println!("target_os: {}", std::env::consts::OS);
    println!("target_arch: {}", std::env::consts::ARCH);
    println!("backends: {}", backends.join(", "));
    println!("default_backend: {}", Backend::default_for_platform());
    println!(
        "features: hub={}, async={}, cli=true",
        cfg!(feature = "hub"),
        cfg!(feature = "async")
    );

    Ok(SUCCESS)
}
