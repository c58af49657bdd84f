mod app;
mod cli;
mod controls;
mod scene;

use anyhow::Result;
use winit::dpi::LogicalSize;

use drawcull_engine::coords::ColorRgba;
use drawcull_engine::device::GpuInit;
use drawcull_engine::logging::{init_logging, LoggingConfig};
use drawcull_engine::window::{Runtime, RuntimeConfig};
use drawcull_engine::EngineConfig;

use crate::app::{DemoApp, TITLE};
use crate::controls::Controls;

fn main() -> Result<()> {
    let args = cli::parse();

    init_logging(LoggingConfig {
        env_filter: args.log.clone(),
        ..Default::default()
    });

    let capacity = args.capacity.max(1);
    let seed = args.seed.unwrap_or_else(rand::random);
    let controls = Controls::new(args.mode.into(), args.count, capacity);

    log::info!(
        "{TITLE}: capacity {capacity}, {} active, {}, vsync {}",
        controls.count(),
        controls.mode(),
        if args.vsync { "on" } else { "off" }
    );
    log::info!("keys: 1/2 or Tab/M switch mode, Up/Down x2 / /2, Right/Left +/-1000, Esc quits");

    let engine_config = EngineConfig {
        capacity,
        clear_color: ColorRgba::gray(0.1),
    };

    let gpu_init = GpuInit {
        // Colors are authored for a linear (non-sRGB) target.
        prefer_srgb: false,
        present_mode: if args.vsync {
            wgpu::PresentMode::AutoVsync
        } else {
            wgpu::PresentMode::AutoNoVsync
        },
        ..Default::default()
    };

    let runtime_config = RuntimeConfig {
        title: TITLE.to_string(),
        initial_size: LogicalSize::new(args.width, args.height),
    };

    Runtime::run(
        runtime_config,
        gpu_init,
        DemoApp::new(engine_config, seed, controls, args.verify),
    )
}
