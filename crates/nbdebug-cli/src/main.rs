//! Binary entry point for `nbdebug`.

use std::process::ExitCode;

fn main() -> ExitCode {
    nbdebug_cli::run(std::env::args_os(), nbdebug_cli::Console::stdio())
}
