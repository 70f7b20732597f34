//! countmap binary entry point.

use std::process::ExitCode;

fn main() -> ExitCode {
    match countmap::cli::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            countmap::ui::output::error(format!("{:#}", err));
            ExitCode::FAILURE
        }
    }
}
