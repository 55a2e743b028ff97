use std::fs::File;
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use gameboy_cpu::config::{Args, RunConfig, DEFAULT_LOG_FILTER};
use gameboy_cpu::{dump, Cpu, Rom, RunOutcome, Snapshot};

fn main() -> Result<()> {
    let config = RunConfig::from(Args::parse());
    init_logging(&config)?;

    let rom_path = resolve_rom_path(&config)?;
    let rom = Rom::load(&rom_path)
        .with_context(|| format!("failed to load ROM {}", rom_path.display()))?;

    let mut cpu = Cpu::new();
    rom.load_into(&mut cpu.memory);

    if let Some(path) = &config.dump_memory {
        write_dump(path, |out| dump::write_memory_dump(&cpu.memory, out))?;
        info!(path = %path.display(), "wrote memory dump");
    }
    if let Some(path) = &config.dump_opcodes {
        let entry = cpu.registers.pc;
        write_dump(path, |out| dump::write_opcode_listing(&cpu.memory, entry, out))?;
        info!(path = %path.display(), "wrote opcode listing");
    }

    let snapshot = if config.window {
        run_windowed(&mut cpu, &rom, &config)?
    } else {
        match cpu.run(config.max_steps) {
            RunOutcome::Halted(snapshot) => snapshot,
            RunOutcome::BudgetExhausted { executed } => {
                warn!(executed, "instruction budget exhausted before halt");
                cpu.snapshot()
            }
        }
    };

    report(&snapshot, config.json)
}

fn init_logging(config: &RunConfig) -> Result<()> {
    let filter = match &config.log_filter {
        Some(directive) => EnvFilter::try_new(directive)
            .with_context(|| format!("invalid log filter {directive:?}"))?,
        None => EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
    Ok(())
}

fn resolve_rom_path(config: &RunConfig) -> Result<PathBuf> {
    if let Some(path) = &config.rom {
        return Ok(path.clone());
    }
    #[cfg(feature = "window")]
    {
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("Game Boy ROM", &["gb", "gbc"])
            .pick_file()
        {
            return Ok(path);
        }
    }
    bail!("no ROM given")
}

fn write_dump<F>(path: &Path, write: F) -> Result<()>
where
    F: FnOnce(&mut BufWriter<File>) -> io::Result<()>,
{
    let file = File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    let mut out = BufWriter::new(file);
    write(&mut out).with_context(|| format!("failed to write {}", path.display()))
}

fn report(snapshot: &Snapshot, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(snapshot)?);
    } else {
        println!("{snapshot}");
    }
    Ok(())
}

#[cfg(not(feature = "window"))]
fn run_windowed(_cpu: &mut Cpu, _rom: &Rom, _config: &RunConfig) -> Result<Snapshot> {
    bail!("--window needs a build with the `window` feature")
}

#[cfg(feature = "window")]
fn run_windowed(cpu: &mut Cpu, rom: &Rom, config: &RunConfig) -> Result<Snapshot> {
    use gameboy_cpu::display::{Display, SCREEN_HEIGHT, SCREEN_WIDTH};
    use minifb::{Key, Window, WindowOptions};

    const SCALE: usize = 3;
    // Roughly one frame's worth of instructions
    const STEPS_PER_FRAME: u64 = 17_556;

    let title = match rom.title() {
        Some(name) if !name.is_empty() => format!("gameboy_cpu - {name}"),
        _ => "gameboy_cpu".to_string(),
    };
    let mut window = Window::new(
        &title,
        SCREEN_WIDTH * SCALE,
        SCREEN_HEIGHT * SCALE,
        WindowOptions::default(),
    )
    .context("failed to create window")?;
    window.set_target_fps(60);

    let mut display = Display::new();
    let mut remaining = config.max_steps;

    while window.is_open() && !window.is_key_down(Key::Escape) {
        if !cpu.is_halted() && remaining != Some(0) {
            let batch = remaining.map_or(STEPS_PER_FRAME, |left| left.min(STEPS_PER_FRAME));
            let before = cpu.executed();
            cpu.run(Some(batch));
            let executed = cpu.executed() - before;
            remaining = remaining.map(|left| left.saturating_sub(executed));
        }
        display.sync(&cpu.memory);
        window.set_title(&format!("{title} | {}", display.status()));
        window
            .update_with_buffer(&display.framebuffer, SCREEN_WIDTH, SCREEN_HEIGHT)
            .context("failed to present framebuffer")?;
    }

    Ok(cpu.snapshot())
}
