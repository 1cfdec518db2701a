use clap::Parser;
use log::{error, LevelFilter};
use std::io;
use std::process::ExitCode;
use tpm2_pcr::app;
use tpm2_pcr::configuration::{Config, Options};
use tpm2_pcr::errors::Error;
use tpm2_pcr::trustroot::Tpm2TrustRoot;

fn execute(options: Options) -> Result<(), Error> {
    let config = Config::from_options(options)?;
    let mut root = Tpm2TrustRoot::new(&config.device);
    app::run(&config, &mut root, &mut io::stdout().lock())
}

fn main() -> ExitCode {
    let options = Options::parse();

    let level = if options.verbose() {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();

    match execute(options) {
        Ok(_) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{}", err);
            ExitCode::FAILURE
        }
    }
}
