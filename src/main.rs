mod cli;
mod commands;
mod libs;
mod logger;
mod schemas;
mod server;

use clap::Parser;
use cli::cmd_enums::{Cli, Commands};
use commands::{install, serve, status, version};
use colored::Colorize;

fn main() {
    let cli = Cli::parse();
    logger::init(cli.debug);

    let result = match &cli.command {
        Commands::Version => {
            version::run();
            Ok(())
        }
        Commands::Status { json } => status::run(&cli.global, *json),
        Commands::Install { event_id, verbose } => install::run(&cli.global, event_id, *verbose),
        Commands::Serve { address } => serve::run(&cli.global, address.as_deref()),
    };

    if let Err(err) = result {
        log_error!("{:#}", err);
        eprintln!("{} {:#}", "error:".red().bold(), err);
        std::process::exit(1);
    }
}
