use std::time::{Duration, Instant};

use anyhow::{bail, Result};
use fieldcore::reference::CpuKernel;
use fieldcore::{FrameScheduler, ParameterStore, PointerKind, ResizeRequest, SchedulerOptions};
use serde::Serialize;

/// Simulated frame interval; runs are deterministic regardless of wall time.
const FRAME_STEP: Duration = Duration::from_micros(16_667);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeadlessRun {
    pub frames: u64,
    pub size: (u32, u32),
    /// Sweep the pointer around a circle for the first half of the run.
    pub sweep: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub frames: u64,
    pub width: u32,
    pub height: u32,
    pub max_energy: f32,
    pub finite: bool,
    pub attenuated_ticks: u64,
}

impl RunSummary {
    pub fn line(&self) -> String {
        format!(
            "frames={} size={}x{} max_energy={:.4} finite={} attenuated_ticks={}",
            self.frames, self.width, self.height, self.max_energy, self.finite, self.attenuated_ticks
        )
    }
}

pub fn simulate(params: ParameterStore, options: SchedulerOptions, run: HeadlessRun) -> RunSummary {
    let (width, height) = run.size;
    let mut kernel = CpuKernel::new();
    let mut scheduler = FrameScheduler::new(
        params,
        options,
        ResizeRequest::logical(width as f32, height as f32),
        &mut kernel,
    );

    let start = Instant::now();
    let center = [width as f32 * 0.5, height as f32 * 0.5];
    let radius = width.min(height) as f32 * 0.3;
    let mut summary = RunSummary {
        frames: 0,
        width,
        height,
        max_energy: 0.0,
        finite: true,
        attenuated_ticks: 0,
    };

    for frame in 0..run.frames {
        let now = start + FRAME_STEP * frame as u32;
        if run.sweep && frame < run.frames / 2 {
            let angle = frame as f32 * 0.12;
            let position = [
                center[0] + angle.cos() * radius,
                center[1] + angle.sin() * radius,
            ];
            scheduler.pointer_moved(position, PointerKind::Mouse, now);
        }

        let report = match scheduler.tick(now, &mut kernel) {
            Ok(report) => report,
            Err(never) => match never {},
        };
        if report.soft_reset > 0.0 {
            summary.attenuated_ticks += 1;
        }
        let stats = kernel.stats();
        summary.frames += 1;
        summary.finite &= stats.finite;
        if stats.max_abs.is_finite() {
            summary.max_energy = summary.max_energy.max(stats.max_abs);
        }
    }

    tracing::debug!(
        frames = summary.frames,
        max_energy = summary.max_energy,
        revision = scheduler.params().revision(),
        "headless run finished"
    );
    summary
}

/// Prints the summary and turns divergence into an error exit.
pub fn report(summary: &RunSummary, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string(summary)?);
    } else {
        println!("{}", summary.line());
    }
    if !summary.finite {
        bail!("field diverged during headless run");
    }
    Ok(())
}
