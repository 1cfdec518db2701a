use crate::errors::Error;
use crate::hasher::DEFAULT_CHUNK_SIZE;
use crate::pcr::PcrIndex;
use crate::trustroot::DEFAULT_DEVICE;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::result;

#[derive(Debug, Clone, Parser)]
#[command(author, version, about = "Read and extend TPM Platform Configuration Registers", long_about = None)]
pub struct Options {
    /// Local TPM character device
    #[arg(long, global = true, default_value = DEFAULT_DEVICE)]
    pub device: PathBuf,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Print the current value of a PCR
    Dump(DumpArgs),
    /// Hash a file or standard input and extend a PCR with the digest
    Extend(ExtendArgs),
}

#[derive(Debug, Clone, Args)]
pub struct DumpArgs {
    /// The PCR to dump
    #[arg(short, long, value_name = "0-PCR_MAX")]
    pub pcr: Option<u32>,
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Debug, Clone, Args)]
pub struct ExtendArgs {
    /// File containing data to extend into the PCR, standard input if omitted
    #[arg(short, long)]
    pub file: Option<PathBuf>,
    /// The PCR to extend
    #[arg(short, long, value_name = "0-PCR_MAX")]
    pub pcr: Option<u32>,
    #[arg(short, long)]
    pub verbose: bool,
}

impl Options {
    pub fn verbose(&self) -> bool {
        match &self.command {
            Command::Dump(args) => args.verbose,
            Command::Extend(args) => args.verbose,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Stdin,
    File(PathBuf),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    Dump { index: PcrIndex },
    Extend { index: PcrIndex, input: Input },
}

// Config is the validated configuration of one invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub device: PathBuf,
    pub operation: Operation,
    pub chunk_size: usize,
    pub verbose: bool,
}

impl Config {
    pub fn from_options(options: Options) -> result::Result<Self, Error> {
        let verbose = options.verbose();
        let operation = match options.command {
            Command::Dump(args) => Operation::Dump {
                index: required_pcr(args.pcr)?,
            },
            Command::Extend(args) => Operation::Extend {
                index: required_pcr(args.pcr)?,
                input: match args.file {
                    Some(path) => Input::File(path),
                    None => Input::Stdin,
                },
            },
        };
        Ok(Config {
            device: options.device,
            operation,
            chunk_size: DEFAULT_CHUNK_SIZE,
            verbose,
        })
    }
}

fn required_pcr(pcr: Option<u32>) -> result::Result<PcrIndex, Error> {
    pcr.map(PcrIndex::new)
        .ok_or_else(|| Error::ConfigError(String::from("No PCR provided.")))
}
