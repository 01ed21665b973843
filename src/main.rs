use anyhow::Result;
use clap::Parser;

use bootstrapp::Cli;

fn main() -> Result<()> {
    let cli = Cli::parse();
    bootstrapp::run(cli)
}
