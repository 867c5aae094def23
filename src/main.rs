use std::process::ExitCode;

use clap::Parser;

mod app;
mod batch;
mod cli;
mod config;
mod convert;
mod library;
mod runtime;
mod ui;

fn main() -> ExitCode {
    let args = cli::Args::parse();
    match runtime::run(args) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("oggshift: {e:#}");
            ExitCode::from(runtime::EXIT_FATAL)
        }
    }
}
