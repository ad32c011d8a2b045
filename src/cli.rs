use clap::Parser;
use std::path::PathBuf;

use crate::runtime::Endianness;
use crate::writer::Strategy;

#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Input C header
    pub input: PathBuf,
    /// Output file (stdout when omitted)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
    /// Extra include directory, searched before the environment ones
    #[arg(short = 'I', long = "include", value_name = "DIR")]
    pub include: Vec<PathBuf>,
    /// Byte order of the packed layouts
    #[arg(long, value_enum)]
    pub endian: Option<Endianness>,
    /// Emission backend
    #[arg(long, value_enum)]
    pub strategy: Option<Strategy>,
    /// JSON configuration file
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
    /// Ignore INCLUDE / C_INCLUDE_PATH
    #[arg(long)]
    pub no_env_include: bool,
    /// More log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    pub fn log_level(&self) -> log::LevelFilter {
        match self.verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            2 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        }
    }
}
