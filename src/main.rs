//! Isekai API entry point
//!
//! Parses arguments, dispatches to the CLI module and exits non-zero on
//! failure. All boot logic lives in `cli`.

use isekai_api::cli;

fn main() {
    if let Err(e) = cli::run() {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}
