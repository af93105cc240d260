//! # gomarket
//!
//! Command-line client for the GoMarketplace cart.
//!
//! ```text
//! gomarket list
//! gomarket add --id p1 --title "Hat" --image-url https://img/hat.png --price 9.99
//! gomarket increment p1
//! gomarket decrement p1
//! gomarket init-config
//! ```
//!
//! Exit status is 0 on success, otherwise the code of the error category
//! (see `gomarket_cli::error::ErrorCode`).

use clap::Parser;
use std::process::ExitCode;

use gomarket_cli::Cli;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    gomarket_cli::init_tracing();

    let json = cli.json;
    match gomarket_cli::run(cli).await {
        Ok(output) => {
            print!("{}", output);
            ExitCode::SUCCESS
        }
        Err(err) => {
            if json {
                match serde_json::to_string(&err) {
                    Ok(body) => eprintln!("{}", body),
                    Err(_) => eprintln!("{}", err),
                }
            } else {
                eprintln!("error: {}", err.message);
            }
            ExitCode::from(err.exit_code())
        }
    }
}
