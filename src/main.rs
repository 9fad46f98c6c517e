use clap::Parser;
use env_logger::Env;
use idxflow::cli::{run, Cli};

fn main() -> std::process::ExitCode {
    env_logger::init_from_env(Env::default().default_filter_or("info"));
    run(Cli::parse())
}
