use std::io::{self, Read, Write};
use std::process::ExitCode;

fn main() -> ExitCode {
    env_logger::init();

    let mut input = String::new();
    if let Err(e) = io::stdin().read_to_string(&mut input) {
        log::error!("Failed to read stdin: {e}");
        return ExitCode::FAILURE;
    }

    match transit_catalogue::io::process(&input) {
        Ok(output) => {
            if let Err(e) = io::stdout().write_all(output.as_bytes()) {
                log::error!("Failed to write response: {e}");
                return ExitCode::FAILURE;
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            log::error!("Failed to process request document: {e}");
            ExitCode::FAILURE
        }
    }
}
