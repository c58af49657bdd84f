use clap::{Parser, ValueEnum};

use drawcull_engine::cull::CullMode;

/// Draw call performance demo: GPU culling with two indirect-draw strategies.
#[derive(Parser, Debug)]
#[command(name = "drawcull-demo", version, about)]
pub struct Args {
    /// Number of elements generated at startup.
    #[arg(long, default_value_t = 1_000_000)]
    pub capacity: u32,

    /// Initial active element count.
    #[arg(short = 'n', long, default_value_t = 100_000)]
    pub count: u32,

    /// Initial draw strategy.
    #[arg(short = 'm', long, value_enum, default_value_t = ModeArg::Micro)]
    pub mode: ModeArg,

    /// Seed for the element layout. Random when omitted.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Sync presentation to the display refresh.
    #[arg(long)]
    pub vsync: bool,

    /// Initial window width (logical pixels).
    #[arg(long, default_value_t = 1600.0)]
    pub width: f64,

    /// Initial window height (logical pixels).
    #[arg(long, default_value_t = 900.0)]
    pub height: f64,

    /// Log filter override (env_logger syntax, e.g. "debug").
    #[arg(long)]
    pub log: Option<String>,

    /// Compare the device visible count with a host reference once per mode.
    #[arg(long)]
    pub verify: bool,
}

#[derive(ValueEnum, Debug, Copy, Clone, Eq, PartialEq)]
pub enum ModeArg {
    /// One indirect command per visible element.
    Micro,
    /// Compacted id list with one shared instanced command.
    Compacted,
}

impl From<ModeArg> for CullMode {
    fn from(m: ModeArg) -> Self {
        match m {
            ModeArg::Micro => CullMode::MicroBatch,
            ModeArg::Compacted => CullMode::CompactedInstance,
        }
    }
}

pub fn parse() -> Args {
    Args::parse()
}
