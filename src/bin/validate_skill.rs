//! Forward arguments to the `skills-ref` validator and mirror its result.

use hook_harness::delegate::{delegate, validator_program};
use std::io::{self, Write};
use std::process::ExitCode;

fn main() -> ExitCode {
    hook_harness::logging::init();

    let program = validator_program();
    let args = std::env::args_os().skip(1);

    match delegate(&program, args, &mut io::stdout(), &mut io::stderr()) {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            let _ = writeln!(io::stderr(), "validate-skill: {}", e);
            ExitCode::FAILURE
        }
    }
}
