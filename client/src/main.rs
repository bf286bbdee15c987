use {
    clap::Parser as _,
    fidelius::{cli::Cli, run, term},
    std::process::ExitCode,
};

fn main() -> ExitCode {
    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            term::error(format!("{err:#}"));
            ExitCode::FAILURE
        }
    }
}
