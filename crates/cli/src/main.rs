use std::process::ExitCode;

fn main() -> ExitCode {
    garasi_cli::run()
}
