//! Effective configuration command.

use anyhow::Result;
use clap::Args;

use super::serve::ConfigOverrides;
use crate::output;

#[derive(Args)]
pub struct ConfigArgs {
    #[command(flatten)]
    pub overrides: ConfigOverrides,
}

pub fn execute(args: ConfigArgs) -> Result<()> {
    let config = args.overrides.resolve()?;
    output::print_config(&config)
}
