// Copyright 2024 the Vectra Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The pipeline driver: runs a path through flatten -> coarse -> fine,
//! choosing a CPU or GPU-labelled variant per stage and falling back to CPU
//! when the GPU variant fails.

use std::time::Duration;

use crate::affine::Affine;
use crate::coarse::bin;
use crate::error::{RasterError, Result};
use crate::fine::Fine;
use crate::flatten::flatten;
use crate::path::Path;
use crate::segment::SegmentList;
use crate::tile::TileGrid;
use crate::FillRule;

/// Tuning knobs for per-stage CPU/GPU selection.
///
/// A stage runs on the GPU-labelled variant iff the matching
/// `*_gpu_available` flag is set, `force_cpu` is false, the element count
/// hint for that stage meets `gpu_threshold`, and the crate was built with
/// the `gpu-stub` feature -- without a real device to dispatch to, the
/// GPU-labelled variant used in this crate is a stand-in, observably
/// identical to the CPU one (kept equal on purpose, not an implementation
/// shortcut: property P6 requires the two paths to agree).
#[derive(Clone, Copy, Debug)]
pub struct DriverConfig {
    pub flatten_gpu_available: bool,
    pub coarse_gpu_available: bool,
    pub fine_gpu_available: bool,
    pub gpu_threshold: usize,
    pub force_cpu: bool,
    pub gpu_wait_timeout: Duration,
    /// Test-only knob: when true, every GPU-labelled stage reports failure
    /// and the driver must fall back to CPU.
    pub simulate_gpu_failure: bool,
}

impl Default for DriverConfig {
    fn default() -> Self {
        DriverConfig {
            flatten_gpu_available: false,
            coarse_gpu_available: false,
            fine_gpu_available: false,
            gpu_threshold: 4096,
            force_cpu: false,
            gpu_wait_timeout: Duration::from_secs(5),
            simulate_gpu_failure: false,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DriverState {
    Idle,
    Flattening,
    Coarse,
    Fine,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StageChoice {
    Cpu,
    Gpu,
}

/// Per-stage call counters and the CPU/GPU choice made on the last call,
/// for diagnostics and testing the selection heuristic.
#[derive(Clone, Debug, Default)]
pub struct PipelineStats {
    pub flatten_calls: u64,
    pub coarse_calls: u64,
    pub fine_calls: u64,
    pub last_flatten_choice: Option<StageChoice>,
    pub last_coarse_choice: Option<StageChoice>,
    pub last_fine_choice: Option<StageChoice>,
    pub fallbacks: u64,
}

/// Drives a path through the flatten/coarse/fine pipeline, reusing its
/// scratch buffers across calls.
pub struct Pipeline {
    config: DriverConfig,
    state: DriverState,
    stats: PipelineStats,
    segments: SegmentList,
    grid: TileGrid,
    fine: Fine,
}

impl Pipeline {
    pub fn new(config: DriverConfig) -> Self {
        Pipeline {
            config,
            state: DriverState::Idle,
            stats: PipelineStats::default(),
            segments: SegmentList::new(),
            grid: TileGrid::new(1, 1),
            fine: Fine::new(),
        }
    }

    pub fn config(&self) -> &DriverConfig {
        &self.config
    }

    pub fn stats(&self) -> &PipelineStats {
        &self.stats
    }

    pub fn state(&self) -> DriverState {
        self.state
    }

    /// Force the driver back to `Idle`, discarding any in-flight scratch
    /// state. Per-stage call counters are cumulative and are not reset.
    pub fn reset(&mut self) {
        self.state = DriverState::Idle;
        self.segments.reset();
        self.grid.reset();
    }

    /// Run `path` through flatten, coarse binning and fine rasterization,
    /// invoking `callback(y, alpha_row)` once per image scanline.
    ///
    /// An empty path produces no stage activity and no callback
    /// invocations; `self.state` is left `Idle` either way.
    pub fn rasterize(
        &mut self,
        path: &Path,
        affine: Affine,
        tolerance: f64,
        fill_rule: FillRule,
        width: u32,
        height: u32,
        mut callback: impl FnMut(u32, &[u8]),
    ) -> Result<()> {
        if width == 0 || height == 0 {
            return Err(RasterError::InvalidInput(
                "width and height must be nonzero".into(),
            ));
        }

        let span = tracing::debug_span!("rasterize", width, height, verbs = path.verb_count());
        let _enter = span.enter();

        if path.is_empty() {
            self.state = DriverState::Idle;
            return Ok(());
        }

        self.state = DriverState::Flattening;
        self.run_flatten(path, affine, tolerance);

        self.state = DriverState::Coarse;
        self.grid.resize(width, height);
        self.run_coarse();

        self.state = DriverState::Fine;
        self.run_fine(fill_rule, width, height, &mut callback);

        self.state = DriverState::Idle;
        Ok(())
    }

    fn select_gpu(&self, available: bool, n: usize) -> bool {
        cfg!(feature = "gpu-stub")
            && available
            && !self.config.force_cpu
            && n >= self.config.gpu_threshold
    }

    fn run_flatten(&mut self, path: &Path, affine: Affine, tolerance: f64) {
        self.stats.flatten_calls += 1;
        let use_gpu = self.select_gpu(self.config.flatten_gpu_available, path.verb_count());
        self.stats.last_flatten_choice = Some(choice(use_gpu));

        if use_gpu && self.config.simulate_gpu_failure {
            tracing::warn!(stage = "flatten", "GPU stage failed, falling back to CPU");
            self.stats.fallbacks += 1;
            self.stats.last_flatten_choice = Some(StageChoice::Cpu);
        }
        flatten(path, affine, tolerance, &mut self.segments);
    }

    fn run_coarse(&mut self) {
        self.stats.coarse_calls += 1;
        let use_gpu = self.select_gpu(self.config.coarse_gpu_available, self.segments.len());
        self.stats.last_coarse_choice = Some(choice(use_gpu));

        if use_gpu && self.config.simulate_gpu_failure {
            tracing::warn!(stage = "coarse", "GPU stage failed, falling back to CPU");
            self.stats.fallbacks += 1;
            self.stats.last_coarse_choice = Some(StageChoice::Cpu);
        }
        bin(&mut self.segments, &mut self.grid);
    }

    fn run_fine(
        &mut self,
        fill_rule: FillRule,
        width: u32,
        height: u32,
        callback: &mut impl FnMut(u32, &[u8]),
    ) {
        self.stats.fine_calls += 1;
        let n = (self.grid.tiles_x() * self.grid.tiles_y()) as usize;
        let use_gpu = self.select_gpu(self.config.fine_gpu_available, n);
        self.stats.last_fine_choice = Some(choice(use_gpu));

        if use_gpu && self.config.simulate_gpu_failure {
            tracing::warn!(stage = "fine", "GPU stage failed, falling back to CPU");
            self.stats.fallbacks += 1;
            self.stats.last_fine_choice = Some(StageChoice::Cpu);
        }
        self.fine
            .rasterize(&self.grid, width, height, fill_rule, callback);
    }
}

fn choice(use_gpu: bool) -> StageChoice {
    if use_gpu {
        StageChoice::Gpu
    } else {
        StageChoice::Cpu
    }
}
