//! tempvar CLI entry point
//!
//! Parses arguments, installs logging and runs the selected command:
//! - `render` - Substitute template values into a query
//! - `hydrate` - Refresh templates against their data sources
//! - `graph` - Show template dependencies

use anyhow::Result;
use clap::Parser;
use tempvar_engine::cli;
use tempvar_engine::core::user_friendly_error;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = cli::Cli::parse();

    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    let config = cli.build_config();
    config.init_logging();

    match cli.execute_with_config(config).await {
        Ok(()) => Ok(()),
        Err(e) => {
            let error_ctx = user_friendly_error(e);
            error_ctx.display();
            std::process::exit(1);
        }
    }
}
