//! Entry point for the command-line interface.
#![forbid(unsafe_code)]

use radlnavi_cli::CliError;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .init();
    match radlnavi_cli::run() {
        Ok(()) => {}
        // Help and version requests are reported by clap with its own exit code.
        Err(CliError::ArgumentParsing(err)) => err.exit(),
        Err(err) => {
            eprintln!("radlnavi: {err}");
            std::process::exit(1);
        }
    }
}
