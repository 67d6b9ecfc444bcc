//! Travel mashup gateway command line tool.

use clap::Parser;
use mashup_gateway::{Cli, init_logging};
use tracing::debug;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.config.log_level);

    if let Err(errors) = cli.config.validate() {
        for error in &errors {
            eprintln!("Configuration error: {}", error);
        }
        std::process::exit(1);
    }

    debug!(command = ?cli.command, debug = cli.config.debug, "Running command");

    match cli.execute() {
        Ok(output) => {
            println!("{}", output);
            Ok(())
        }
        Err(err) => {
            println!("{}", cli.config.render_json(&err.to_envelope(cli.config.debug)));
            Err(anyhow::Error::new(err).context("command failed"))
        }
    }
}
