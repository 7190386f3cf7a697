use std::process::ExitCode;

fn main() -> ExitCode {
    kisan_cli::run()
}
