mod config;
mod program;

use std::io;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::prelude::*;

use lcasm_core::cpu::opcode::Opcode32;
use lcasm_core::{MachineConfig, StdoutSink, WORD_BYTES};
use lcasm_lca::{Catalog, LcaCpu, LcaMachine, RunSummary, StopReason};

use crate::config::{Args, Command, RunArgs};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let stderr_format = tracing_subscriber::fmt::layer()
        .with_writer(io::stderr)
        .with_filter(args.log_level);
    tracing_subscriber::registry().with(stderr_format).init();

    match args.command {
        Command::Run(run) => run_program(run).await,
        Command::List => {
            list_catalog();
            Ok(())
        }
        Command::Disasm { program: path } => {
            let words = program::load(&path)?;
            disassemble(&words);
            Ok(())
        }
    }
}

async fn run_program(args: RunArgs) -> Result<()> {
    let words: Arc<[u32]> = program::load(&args.program)?.into();
    let seed = args.seed.unwrap_or_else(rand::random);
    tracing::info!(
        "running {} on {} core(s) with seed {}",
        args.program.display(),
        args.cores,
        seed
    );

    let mut cores = Vec::new();
    for core in 0..args.cores {
        let words = Arc::clone(&words);
        let config = args.machine_config();
        let show_registers = args.registers;
        let multi_core = args.cores > 1;
        let max_steps = args.max_steps;
        cores.push(tokio::task::spawn_blocking(move || {
            run_core(core, seed, config, &words, max_steps, multi_core, show_registers)
        }));
    }

    let mut faulted = 0;
    for (core, handle) in cores.into_iter().enumerate() {
        let summary = handle
            .await
            .with_context(|| format!("core {} did not finish", core))??;
        println!("core {}: {} steps, {}", core, summary.steps, summary.stop);
        if matches!(summary.stop, StopReason::Fault(_)) {
            faulted += 1;
        }
    }
    if faulted > 0 {
        anyhow::bail!("{} of {} core(s) faulted", faulted, args.cores);
    }
    Ok(())
}

fn run_core(
    core: u32,
    seed: u64,
    config: MachineConfig,
    words: &[u32],
    max_steps: u64,
    multi_core: bool,
    show_registers: bool,
) -> Result<RunSummary> {
    let output = if multi_core {
        StdoutSink::with_prefix(&format!("[core {}]", core))
    } else {
        StdoutSink::new()
    };

    let mut lca = LcaMachine::seeded(config, seed.wrapping_add(core.into()), output);
    lca.load(words)
        .with_context(|| format!("core {}: program does not fit the text segment", core))?;
    let summary = lca.run(max_steps);

    if show_registers {
        for (register, value) in lca.machine().registers().iter() {
            if value != 0 {
                println!("core {}: {:>5} = {} (0x{:08X})", core, register, value, value);
            }
        }
        println!("core {}: {:>5} = 0x{:08X}", core, "pc", lca.machine().registers().pc());
    }
    Ok(summary)
}

fn list_catalog() {
    let catalog = Catalog::lca();
    for desc in catalog.iter() {
        println!(
            "{:<22} {:<8} {:<40} {}",
            desc.syntax(),
            desc.format(),
            desc.pattern(),
            desc.description()
        );
    }
    for (first, second) in catalog.collisions() {
        println!(
            "note: `{}` shares its encoding with `{}` and is never dispatched",
            second.mnemonic(),
            first.mnemonic()
        );
    }
}

fn disassemble(words: &[u32]) {
    let cpu = LcaCpu::default();
    let mut address = MachineConfig::DEFAULT_TEXT_BASE;
    for word in words.iter().map(|w| Opcode32::new(*w)) {
        match cpu.decode(word) {
            Ok(ins) => println!("0x{:08X}  {:?}  {}", address, word, ins),
            Err(err) => println!("0x{:08X}  {:?}  <{}>", address, word, err),
        }
        address = address.wrapping_add(WORD_BYTES);
    }
}
