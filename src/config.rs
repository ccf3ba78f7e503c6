use std::path::PathBuf;

use clap::{Args as ClapArgs, Parser, Subcommand};
use clap_num::maybe_hex;
use tracing_subscriber::filter::LevelFilter;

use lcasm_core::MachineConfig;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Diagnostics written to stderr at or above this level (off, error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "warn")]
    pub log_level: LevelFilter,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Load a program of hex words and run it
    Run(RunArgs),
    /// Print the instruction catalog
    List,
    /// Print the disassembly of a program of hex words
    Disasm {
        /// Program file, one hex word per line
        program: PathBuf,
    },
}

#[derive(ClapArgs, Debug)]
pub struct RunArgs {
    /// Program file, one hex word per line
    pub program: PathBuf,

    /// Seed for the random stream; core N uses seed + N (random if omitted)
    #[arg(long)]
    pub seed: Option<u64>,

    /// Stop each core after this many instructions
    #[arg(long, default_value_t = 1_000_000)]
    pub max_steps: u64,

    /// Number of independent machines to run the program on
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..=64))]
    pub cores: u32,

    /// Initial global pointer (hex ok with '0x')
    #[arg(
        long,
        value_parser = maybe_hex::<u32>,
        default_value_t = MachineConfig::DEFAULT_GLOBAL_POINTER
    )]
    pub gp: u32,

    /// Print the non-zero registers of each core after it stops
    #[arg(short, long)]
    pub registers: bool,
}

impl RunArgs {
    pub fn machine_config(&self) -> MachineConfig {
        MachineConfig::default().with_global_pointer(self.gp)
    }
}
