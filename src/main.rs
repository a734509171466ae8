mod args;
mod scenario;

use clap::Parser;
use env_logger::Env;
use log::{debug, LevelFilter};

use crate::args::{Args, Command};
use crate::scenario::ScenarioResult;

fn run(args: &Args) -> ScenarioResult<()> {
    match &args.command {
        Command::Aggregate {
            config,
            out,
            reference,
            snapshot_out,
        } => scenario::run_aggregation(config, out, snapshot_out, reference),
        Command::Share { input, base_url } => scenario::run_share(input, base_url).map(|_| ()),
        Command::Unshare { token, out } => scenario::run_unshare(token, out),
        Command::Request {
            input,
            convention,
            out,
        } => scenario::run_request(input, convention, out),
        Command::Results {
            input,
            election,
            ordered_seats,
        } => scenario::run_results(input, election, *ordered_seats).map(|_| ()),
    }
}

fn main() {
    let args = Args::parse();

    let mut builder = env_logger::Builder::from_env(Env::default().default_filter_or("info"));
    if args.verbose {
        builder.filter_level(LevelFilter::Debug);
    }
    builder.init();
    debug!("args: {:?}", args);

    if let Err(e) = run(&args) {
        eprintln!("An error occured: {}", e);
        std::process::exit(1);
    }
}
