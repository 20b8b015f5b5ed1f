mod cli;

use crate::cli::Cli;

fn main() {
    if let Err(err) = Cli::run_from_args() {
        if tracing::dispatcher::has_been_set() {
            tracing::error!("{:#}", err);
        } else {
            eprintln!("sitemerge error: {:#}", err);
        }
        std::process::exit(1);
    }
}
