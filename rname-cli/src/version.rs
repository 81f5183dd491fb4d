use rname_core::{OutputFormatter, VersionResult};

use crate::cli::OutputFormat;

pub fn handle_version(output: OutputFormat) {
    let result = VersionResult {
        name: "rname".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    };
    println!("{}", result.format(output.into()));
}
