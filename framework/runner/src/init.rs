use crate::cli::LoadCheckScenarioCli;
use clap::Parser;

/// Initialise logging and parse the command line for a scenario binary.
pub fn init() -> LoadCheckScenarioCli {
    env_logger::init();

    LoadCheckScenarioCli::parse()
}
