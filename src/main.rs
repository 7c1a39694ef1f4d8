// src/main.rs

use karma_driver::errors::ErrorKind;
use karma_driver::{cli, exit_codes, logging, run};
use tracing::error;

#[tokio::main]
async fn main() {
    let args = cli::parse();

    if let Err(err) = logging::init_logging(args.log_level) {
        eprintln!("karma-driver error: {err:?}");
        std::process::exit(exit_codes::ENVIRONMENT_ERROR);
    }

    match run(args).await {
        Ok(_) => std::process::exit(exit_codes::SUCCESS),
        Err(err) => {
            match err.kind() {
                ErrorKind::TestFailure => error!("{err}"),
                ErrorKind::Environment => {
                    error!("There was an error running the test runner: {err}")
                }
            }
            std::process::exit(exit_codes::for_error(&err));
        }
    }
}
