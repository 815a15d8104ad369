use std::process::ExitCode;

use streambox::cli::Cli;

fn main() -> ExitCode {
    match Cli::init().execute() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err}");
            ExitCode::from(err.exit_code())
        }
    }
}
