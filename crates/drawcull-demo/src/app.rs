use std::time::Duration;

use drawcull_engine::core::{App, AppControl, FrameCtx};
use drawcull_engine::cull::{CullMode, CullOutcome};
use drawcull_engine::time::{FrameRate, StatsWindow};
use drawcull_engine::{DrawCullEngine, EngineConfig, FrameInput};

use crate::controls::{ControlFlow, Controls};
use crate::scene::random_instances;

pub const TITLE: &str = "Draw Call Performance Demo";

/// Drives the engine from the keyboard and reports frame statistics.
///
/// The engine is built on the first frame, once the window's device exists.
pub struct DemoApp {
    config: EngineConfig,
    seed: u64,
    engine: Option<DrawCullEngine>,

    controls: Controls,
    verify: bool,
    verified: Vec<CullMode>,

    title_stats: StatsWindow,
    log_stats: StatsWindow,
}

impl DemoApp {
    pub fn new(config: EngineConfig, seed: u64, controls: Controls, verify: bool) -> Self {
        Self {
            config,
            seed,
            engine: None,
            controls,
            verify,
            verified: Vec::new(),
            title_stats: StatsWindow::new(Duration::from_millis(500)),
            log_stats: StatsWindow::new(Duration::from_secs(1)),
        }
    }

    fn ensure_engine(&mut self, device: &wgpu::Device) -> anyhow::Result<&mut DrawCullEngine> {
        if self.engine.is_none() {
            log::info!(
                "generating {} elements (seed {})",
                self.config.capacity,
                self.seed
            );
            let instances = random_instances(self.config.capacity, self.seed);
            self.engine = Some(DrawCullEngine::new(device, &self.config, instances)?);
        }
        self.engine
            .as_mut()
            .ok_or_else(|| anyhow::anyhow!("engine unavailable"))
    }

    fn verify_once(&mut self, outcome: &CullOutcome, input: &FrameInput) {
        if !self.verify || self.verified.contains(&outcome.mode) {
            return;
        }
        let Some(engine) = self.engine.as_ref() else { return };
        self.verified.push(outcome.mode);

        let expected = engine.host_visible_count(outcome.mode, outcome.active_count, &input.projection);
        if expected == outcome.visible_count {
            log::info!(
                "verify {}: device {} == host {}",
                outcome.mode,
                outcome.visible_count,
                expected
            );
        } else {
            log::warn!(
                "verify {}: device {} != host {}",
                outcome.mode,
                outcome.visible_count,
                expected
            );
        }
    }
}

impl App for DemoApp {
    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl {
        if self.controls.apply(ctx.input_frame) == ControlFlow::Exit {
            return AppControl::Exit;
        }

        let input = FrameInput::new(self.controls.mode(), self.controls.count());
        let first_frame = self.engine.is_none();

        let engine = match self.ensure_engine(ctx.gpu.device()) {
            Ok(engine) => engine,
            Err(err) => {
                log::error!("engine setup failed: {err:#}");
                return AppControl::Exit;
            }
        };

        let outcome = match ctx.render(|rctx, target| engine.run_frame(rctx, target, &input)) {
            Ok(Some(outcome)) => outcome,
            Ok(None) => return AppControl::Continue,
            Err(err) => {
                log::error!("frame failed: {err:#}");
                return AppControl::Exit;
            }
        };

        self.verify_once(&outcome, &input);

        if first_frame {
            // The next frame's delta covers the engine build; let it open the windows.
            self.title_stats.reset();
            self.log_stats.reset();
            return AppControl::Continue;
        }

        if let Some(rate) = self.title_stats.push(&ctx.time) {
            ctx.window.set_title(&title_line(&rate, &outcome));
        }
        if let Some(rate) = self.log_stats.push(&ctx.time) {
            log::info!("{}", stats_line(&rate, &outcome));
        }

        AppControl::Continue
    }
}

fn stats_line(rate: &FrameRate, outcome: &CullOutcome) -> String {
    format!(
        "{} | {:.0} FPS | {:.2} ms | draw commands {} | visible {}/{}",
        outcome.mode,
        rate.fps,
        rate.frame_ms,
        outcome.draw_submissions(),
        outcome.visible_count,
        outcome.active_count
    )
}

fn title_line(rate: &FrameRate, outcome: &CullOutcome) -> String {
    format!("{TITLE} | {}", stats_line(rate, outcome))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stats_line_reports_draws_per_mode() {
        let rate = FrameRate {
            fps: 120.0,
            frame_ms: 8.333,
            frames: 60,
        };
        let micro = CullOutcome {
            mode: CullMode::MicroBatch,
            active_count: 1_000,
            visible_count: 900,
        };
        let compacted = CullOutcome {
            mode: CullMode::CompactedInstance,
            ..micro
        };

        assert_eq!(
            stats_line(&rate, &micro),
            "micro-batch indirect | 120 FPS | 8.33 ms | draw commands 900 | visible 900/1000"
        );
        assert!(stats_line(&rate, &compacted).contains("draw commands 1 |"));
        assert!(title_line(&rate, &micro).starts_with(TITLE));
    }
}
