pub mod contains;
pub mod validate;

use clap::{ArgAction, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "vpcgate")]
#[command(about = "Validates shared VPC firewall rule changes before they merge.")]
#[command(version)]
pub struct CommandLine {
    #[command(subcommand)]
    pub command: Option<Commands>,
    /// Reduce output, repeat for less
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub quiet: u8,
    /// Do not print the banner
    #[arg(long, global = true)]
    pub no_banner: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Validate firewall rule files using the action inputs from the environment (default)
    #[command(alias = "v")]
    Validate {
        /// Timeout in seconds for each cloud API call
        #[arg(long, value_name = "SECS", value_parser = clap::value_parser!(u64).range(1..))]
        timeout: Option<u64>,
    },
    /// Check CIDR ranges against subnet ranges without calling the cloud provider
    #[command(alias = "c")]
    Contains {
        /// Ranges declared by a firewall rule
        #[arg(required = true, value_name = "CIDR")]
        candidates: Vec<String>,
        /// Primary or secondary range of the subnet, repeatable
        #[arg(short, long = "subnet", value_name = "CIDR", required = true)]
        subnets: Vec<String>,
    },
}

impl CommandLine {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
