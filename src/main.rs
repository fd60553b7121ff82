use std::env;

use draftsim::cli::run_with_args;
use draftsim::logging::init_tracing;

fn main() {
    init_tracing();
    let args: Vec<String> = env::args().collect();
    std::process::exit(run_with_args(&args));
}
