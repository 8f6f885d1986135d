use std::process::ExitCode;

use clap::Parser;

use cutout::cli::{self, CliArgs};
use cutout::logger;

fn main() -> ExitCode {
    // Initialize session log (overwrites previous session log)
    logger::init();

    let args = CliArgs::parse();
    cli::run(args)
}
