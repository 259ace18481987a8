use std::process::ExitCode;

fn main() -> ExitCode {
    basketry_cli::run()
}
