use std::path::PathBuf;

use clap::Parser;

/// Default tracing filter when neither `--log` nor `RUST_LOG` is given.
pub const DEFAULT_LOG_FILTER: &str = "gameboy_cpu=info";
const TRACE_LOG_FILTER: &str = "gameboy_cpu=trace";

#[derive(Parser, Debug)]
#[command(
    name = "gameboy_cpu",
    version,
    about = "Sharp LR35902 interpreter: runs a ROM image until it halts."
)]
pub struct Args {
    /// ROM image to load at 0x0000.
    #[arg(value_name = "ROM")]
    pub rom: Option<PathBuf>,

    /// Stop after this many executed instructions.
    #[arg(long, value_name = "N")]
    pub max_steps: Option<u64>,

    /// Log every executed instruction (PC, opcode, A, F).
    #[arg(long, default_value_t = false)]
    pub trace: bool,

    /// Tracing filter directive, e.g. `gameboy_cpu=debug`.
    #[arg(long, value_name = "FILTER")]
    pub log: Option<String>,

    /// Print the final snapshot as JSON instead of a table.
    #[arg(long, default_value_t = false)]
    pub json: bool,

    /// Write a textual dump of all 64 KiB after loading.
    #[arg(long, value_name = "PATH")]
    pub dump_memory: Option<PathBuf>,

    /// Write an opcode listing from the entry point after loading.
    #[arg(long, value_name = "PATH")]
    pub dump_opcodes: Option<PathBuf>,

    /// Present the display framebuffer in a window.
    #[arg(long, default_value_t = false)]
    pub window: bool,
}

/// Everything the driver needs, after defaults are applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    pub rom: Option<PathBuf>,
    pub max_steps: Option<u64>,
    /// Explicit filter from the command line. `None` defers to `RUST_LOG`,
    /// then [`DEFAULT_LOG_FILTER`].
    pub log_filter: Option<String>,
    pub json: bool,
    pub dump_memory: Option<PathBuf>,
    pub dump_opcodes: Option<PathBuf>,
    pub window: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        RunConfig {
            rom: None,
            max_steps: None,
            log_filter: None,
            json: false,
            dump_memory: None,
            dump_opcodes: None,
            window: false,
        }
    }
}

impl From<Args> for RunConfig {
    fn from(args: Args) -> Self {
        // An explicit --log wins over --trace
        let log_filter = match (args.log, args.trace) {
            (Some(filter), _) => Some(filter),
            (None, true) => Some(TRACE_LOG_FILTER.to_string()),
            (None, false) => None,
        };
        RunConfig {
            rom: args.rom,
            max_steps: args.max_steps,
            log_filter,
            json: args.json,
            dump_memory: args.dump_memory,
            dump_opcodes: args.dump_opcodes,
            window: args.window,
        }
    }
}
