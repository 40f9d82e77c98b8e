mod adapters;
mod cli;
mod config;
mod core;
mod logging;
#[cfg(test)]
mod test_support;

use clap::Parser;

use cli::context::Context;
use cli::{Cli, Commands};
use crate::core::errors::Result;

fn main() {
    let args = Cli::parse();

    if let Err(e) = run(&args) {
        cli::output::error(&format!("Error: {e}"));
        std::process::exit(1);
    }
}

fn run(args: &Cli) -> Result<()> {
    let ctx = Context::resolve(args)?;
    logging::init(logging::level_for(
        args.verbose,
        args.quiet,
        &ctx.config.logging.level,
    )?);
    tracing::debug!("Using {} backend, layout {:?}", ctx.backend, ctx.layout);

    match &args.command {
        Commands::Init { machine } => cli::commands::init::execute(&ctx, *machine, args.verbose),
        Commands::Add {
            file,
            password,
            exportable,
            target,
        } => cli::commands::add::execute(&ctx, file, password.as_deref(), *exportable, target),
        Commands::Remove { key, target } => cli::commands::remove::execute(&ctx, key, target),
        Commands::Info { key, target } => cli::commands::info::execute(&ctx, key, target),
        Commands::History { store, since, last } => {
            cli::commands::history::execute(&ctx, store.as_deref(), since.as_deref(), *last)
        }
    }
}
