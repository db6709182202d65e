use std::process::ExitCode;

fn main() -> ExitCode {
    va_cli::run()
}
