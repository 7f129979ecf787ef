mod commands;
mod terminal;

use std::process::ExitCode;

use commands::{CommandLine, Commands, contains, validate};
use terminal::{logging, print};
use tracing::error;

fn main() -> ExitCode {
    let commands = CommandLine::parse_args();

    logging::init_logging(commands.quiet);
    print::banner(commands.no_banner, commands.quiet);

    let command = commands
        .command
        .unwrap_or(Commands::Validate { timeout: None });

    let outcome = match command {
        Commands::Validate { timeout } => {
            print::header("validating firewall rules", commands.quiet);
            validate::validate(timeout, commands.quiet)
        }
        Commands::Contains {
            candidates,
            subnets,
        } => contains::contains(&candidates, &subnets, commands.quiet),
    };

    match outcome {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => {
            error!("Firewall rule validation FAILED");
            ExitCode::FAILURE
        }
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}
