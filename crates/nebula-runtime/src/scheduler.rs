#![forbid(unsafe_code)]

//! Tiled frame scheduler.
//!
//! # Frame production
//!
//! 1. Pick the path: full resolution when `render_scale >= 0.999`, otherwise
//!    render a `floor(W*s) x floor(H*s)` grid and upscale.
//! 2. Split the target buffer into tiles of `clamp(chunk, 8, 64)` pixels.
//!    Each tile job owns `&mut` row segments of the buffer, so tiles cannot
//!    overlap and no locking is needed.
//! 3. Run the jobs sequentially, or on the worker pool with a distribution
//!    strategy chosen by [`SchedulePolicy`]. `ThreadPool::install` returns
//!    only after every tile has finished.
//! 4. Low-res path: upscale row by row with nearest mapping.
//!
//! The result never depends on the policy, worker count, or tile order:
//! each pixel is a pure function of `(x, y, t)`.

use std::fmt;
use std::time::{Duration, Instant};

use nebula_core::{Config, SchedulePolicy, Tile, TileGrid, tile_size_for_chunk};
use nebula_core::config::FULL_RES_THRESHOLD;
use nebula_render::buffer::{
    LowResBuffer, PixelBuffer, low_res_source_coord, upscale_nearest, upscale_nearest_row,
};
use nebula_render::{PackedArgb, PixelSource};
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuildError, ThreadPoolBuilder};

// =============================================================================
// Errors and modes
// =============================================================================

/// Failure to set up the scheduler.
#[derive(Debug)]
pub enum SchedulerError {
    /// The worker pool could not be created.
    ThreadPool(ThreadPoolBuildError),
}

impl fmt::Display for SchedulerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ThreadPool(e) => write!(f, "failed to build worker pool: {e}"),
        }
    }
}

impl std::error::Error for SchedulerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::ThreadPool(e) => Some(e),
        }
    }
}

impl From<ThreadPoolBuildError> for SchedulerError {
    fn from(e: ThreadPoolBuildError) -> Self {
        Self::ThreadPool(e)
    }
}

/// Whether tiles run on the calling thread or on a worker pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecutionMode {
    Sequential,
    #[default]
    Parallel,
}

impl ExecutionMode {
    #[inline]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sequential => "sequential",
            Self::Parallel => "parallel",
        }
    }
}

impl fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which path produced a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderPath {
    #[default]
    FullRes,
    LowRes,
}

impl RenderPath {
    #[inline]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::FullRes => "full",
            Self::LowRes => "lowres",
        }
    }
}

/// Bookkeeping for the most recent frame.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FrameStats {
    /// Frames computed so far, including this one.
    pub frames: u64,
    pub path: RenderPath,
    /// Tiles dispatched for this frame.
    pub tiles: usize,
    /// Size of the grid that was actually sampled.
    pub sampled_width: u32,
    pub sampled_height: u32,
    /// Whether the low-res buffer had to be resized for this frame.
    pub low_res_resized: bool,
    pub duration: Duration,
}

// =============================================================================
// Tile jobs
// =============================================================================

/// One tile plus exclusive access to its row segments.
struct TileJob<'a> {
    tile: Tile,
    rows: Vec<&'a mut [PackedArgb]>,
}

/// Maps grid coordinates to the full-resolution coordinate handed to the
/// source.
#[derive(Debug, Clone, Copy)]
enum SampleGrid {
    Full,
    Reduced { scale: f32, width: u32, height: u32 },
}

impl SampleGrid {
    #[inline]
    fn source_coord(self, x: u32, y: u32) -> (u32, u32) {
        match self {
            Self::Full => (x, y),
            Self::Reduced {
                scale,
                width,
                height,
            } => (
                low_res_source_coord(x, scale, width),
                low_res_source_coord(y, scale, height),
            ),
        }
    }
}

impl TileJob<'_> {
    fn render<S: PixelSource + ?Sized>(self, source: &S, grid: SampleGrid, t: f32) {
        let Self { tile, rows } = self;
        for (y, row) in (tile.y0..tile.y1).zip(rows) {
            for (x, px) in (tile.x0..tile.x1).zip(row.iter_mut()) {
                let (sx, sy) = grid.source_coord(x, y);
                *px = source.sample(sx, sy, t);
            }
        }
    }
}

/// Split `pixels` (row-major, `grid`-sized) into row-major tile jobs.
fn tile_jobs<'a>(
    pixels: &'a mut [PackedArgb],
    width: u32,
    grid: &TileGrid,
) -> Vec<TileJob<'a>> {
    let w = width as usize;
    let ts = grid.tile_size() as usize;
    if w == 0 || ts == 0 || grid.is_empty() {
        return Vec::new();
    }

    let mut jobs = Vec::with_capacity(grid.len());
    for (ty, band) in pixels.chunks_mut(w * ts).enumerate() {
        let mut band_jobs: Vec<TileJob<'a>> = (0..grid.columns())
            .map(|tx| TileJob {
                tile: grid.tile(tx, ty as u32),
                rows: Vec::with_capacity(ts),
            })
            .collect();
        for row in band.chunks_mut(w) {
            let mut rest = row;
            for job in &mut band_jobs {
                let (segment, tail) =
                    std::mem::take(&mut rest).split_at_mut(job.tile.width() as usize);
                job.rows.push(segment);
                rest = tail;
            }
        }
        jobs.extend(band_jobs);
    }
    jobs
}

// =============================================================================
// Dispatch
// =============================================================================

/// How a frame's tiles are distributed.
#[derive(Clone, Copy)]
struct Dispatch<'p> {
    pool: Option<&'p ThreadPool>,
    policy: SchedulePolicy,
    chunk: usize,
}

impl Dispatch<'_> {
    fn run<S: PixelSource + ?Sized>(
        self,
        jobs: Vec<TileJob<'_>>,
        source: &S,
        grid: SampleGrid,
        t: f32,
    ) {
        let Some(pool) = self.pool else {
            jobs.into_iter().for_each(|job| job.render(source, grid, t));
            return;
        };

        let n = jobs.len();
        let workers = pool.current_num_threads().max(1);
        let chunk = self.chunk.clamp(1, n.max(1));
        pool.install(|| {
            let jobs = jobs.into_par_iter();
            let render = |job: TileJob<'_>| job.render(source, grid, t);
            match self.policy {
                // One contiguous block of tiles per worker.
                SchedulePolicy::Static => jobs
                    .with_min_len(n.div_ceil(workers).max(1))
                    .for_each(render),
                // Fixed grabs of `chunk` tiles.
                SchedulePolicy::Dynamic => {
                    jobs.with_min_len(chunk).with_max_len(chunk).for_each(render)
                }
                // Adaptive splitting, never below `chunk` tiles.
                SchedulePolicy::Guided => jobs.with_min_len(chunk).for_each(render),
                SchedulePolicy::Auto => jobs.for_each(render),
            }
        });
    }
}

/// Sample every pixel of `target` through `grid`. Returns the tile count.
fn render_tiles<S: PixelSource + ?Sized>(
    source: &S,
    target: &mut PixelBuffer,
    grid: SampleGrid,
    tile_size: u32,
    t: f32,
    dispatch: Dispatch<'_>,
) -> usize {
    let width = target.width();
    let tiles = TileGrid::new(width, target.height(), tile_size);
    let jobs = tile_jobs(target.pixels_mut(), width, &tiles);
    let count = jobs.len();
    dispatch.run(jobs, source, grid, t);
    count
}

fn upscale(src: &PixelBuffer, dst: &mut PixelBuffer, scale: f32, pool: Option<&ThreadPool>) {
    let width = dst.width() as usize;
    match pool {
        Some(pool) if width > 0 => pool.install(|| {
            dst.pixels_mut()
                .par_chunks_mut(width)
                .enumerate()
                .for_each(|(y, row)| upscale_nearest_row(src, row, y as u32, scale));
        }),
        _ => upscale_nearest(src, dst, scale),
    }
}

fn build_pool(threads: usize) -> Result<ThreadPool, ThreadPoolBuildError> {
    ThreadPoolBuilder::new()
        .num_threads(threads)
        .thread_name(|i| format!("nebula-tile-{i}"))
        .build()
}

// =============================================================================
// FrameScheduler
// =============================================================================

/// Produces complete frames from a [`PixelSource`].
///
/// Owns the output buffer, the low-res scratch buffer, and (in parallel
/// mode) a dedicated worker pool. Buffers are reused across frames.
pub struct FrameScheduler<S> {
    source: S,
    width: u32,
    height: u32,
    render_scale: f32,
    tile_size: u32,
    policy: SchedulePolicy,
    chunk: u32,
    mode: ExecutionMode,
    pool: Option<ThreadPool>,
    frame: PixelBuffer,
    low_res: LowResBuffer,
    stats: FrameStats,
}

impl<S: PixelSource> FrameScheduler<S> {
    /// Create a scheduler for `config`'s frame size, scale, and policy.
    ///
    /// `config` is expected to be clamped already. In parallel mode a pool of
    /// `config.threads` workers is built (0 = one per core).
    pub fn new(source: S, config: &Config, mode: ExecutionMode) -> Result<Self, SchedulerError> {
        let pool = match mode {
            ExecutionMode::Sequential => None,
            ExecutionMode::Parallel => Some(build_pool(config.threads)?),
        };
        let scheduler = Self {
            source,
            width: config.width,
            height: config.height,
            render_scale: config.render_scale,
            tile_size: tile_size_for_chunk(config.chunk),
            policy: config.schedule,
            chunk: config.chunk,
            mode,
            pool,
            frame: PixelBuffer::new(config.width, config.height),
            low_res: LowResBuffer::new(),
            stats: FrameStats::default(),
        };
        tracing::info!(
            source = scheduler.source.name(),
            mode = %mode,
            workers = scheduler.workers(),
            schedule = %scheduler.policy,
            chunk = scheduler.chunk,
            tile_size = scheduler.tile_size,
            width = scheduler.width,
            height = scheduler.height,
            render_scale = scheduler.render_scale,
            "frame scheduler ready"
        );
        Ok(scheduler)
    }

    /// Compute the frame for `t` seconds and return it.
    ///
    /// Every pixel of the returned buffer is overwritten by this call.
    pub fn compute_frame(&mut self, t: f32) -> &PixelBuffer {
        let start = Instant::now();
        let dispatch = Dispatch {
            pool: self.pool.as_ref(),
            policy: self.policy,
            chunk: self.chunk as usize,
        };

        let mut stats = FrameStats {
            frames: self.stats.frames + 1,
            ..FrameStats::default()
        };

        if self.render_scale >= FULL_RES_THRESHOLD {
            let span = tracing::debug_span!(
                "compute_frame",
                t,
                path = "full",
                tiles = tracing::field::Empty
            );
            let _guard = span.enter();
            stats.path = RenderPath::FullRes;
            stats.tiles = render_tiles(
                &self.source,
                &mut self.frame,
                SampleGrid::Full,
                self.tile_size,
                t,
                dispatch,
            );
            span.record("tiles", stats.tiles);
            stats.sampled_width = self.width;
            stats.sampled_height = self.height;
        } else {
            let span = tracing::debug_span!(
                "compute_frame",
                t,
                path = "lowres",
                tiles = tracing::field::Empty
            );
            let _guard = span.enter();
            let scale = self.render_scale;
            stats.path = RenderPath::LowRes;
            stats.low_res_resized = self.low_res.ensure(self.width, self.height, scale);
            if stats.low_res_resized {
                tracing::debug!(
                    width = self.low_res.buffer().width(),
                    height = self.low_res.buffer().height(),
                    scale,
                    "low-res buffer resized"
                );
            }
            let grid = SampleGrid::Reduced {
                scale,
                width: self.width,
                height: self.height,
            };
            stats.tiles = render_tiles(
                &self.source,
                self.low_res.buffer_mut(),
                grid,
                self.tile_size,
                t,
                dispatch,
            );
            span.record("tiles", stats.tiles);
            stats.sampled_width = self.low_res.buffer().width();
            stats.sampled_height = self.low_res.buffer().height();
            upscale(self.low_res.buffer(), &mut self.frame, scale, dispatch.pool);
        }

        stats.duration = start.elapsed();
        tracing::trace!(
            frame = stats.frames,
            tiles = stats.tiles,
            elapsed_us = stats.duration.as_micros() as u64,
            "frame computed"
        );
        self.stats = stats;
        &self.frame
    }

    /// The most recently computed frame.
    #[inline]
    pub fn frame(&self) -> &PixelBuffer {
        &self.frame
    }

    #[inline]
    pub fn stats(&self) -> FrameStats {
        self.stats
    }

    #[inline]
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Worker threads in use; 1 in sequential mode.
    #[inline]
    pub fn workers(&self) -> usize {
        self.pool.as_ref().map_or(1, ThreadPool::current_num_threads)
    }

    #[inline]
    pub const fn mode(&self) -> ExecutionMode {
        self.mode
    }

    #[inline]
    pub const fn policy(&self) -> SchedulePolicy {
        self.policy
    }

    #[inline]
    pub const fn tile_size(&self) -> u32 {
        self.tile_size
    }

    #[inline]
    pub const fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    #[inline]
    pub const fn render_scale(&self) -> f32 {
        self.render_scale
    }
}

impl<S> fmt::Debug for FrameScheduler<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameScheduler")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("render_scale", &self.render_scale)
            .field("tile_size", &self.tile_size)
            .field("policy", &self.policy)
            .field("mode", &self.mode)
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(x: u32, y: u32, _t: f32) -> PackedArgb {
        PackedArgb(0xff00_0000 | (x << 12) | y)
    }

    #[test]
    fn tile_jobs_own_disjoint_segments() {
        let (w, h) = (37u32, 23u32);
        let grid = TileGrid::new(w, h, 8);
        let mut pixels = vec![PackedArgb::TRANSPARENT; (w * h) as usize];
        let jobs = tile_jobs(&mut pixels, w, &grid);
        assert_eq!(jobs.len(), grid.len());

        let expected: Vec<Tile> = grid.iter().collect();
        for (job, tile) in jobs.iter().zip(&expected) {
            assert_eq!(job.tile, *tile);
            assert_eq!(job.rows.len(), tile.height() as usize);
            assert!(job.rows.iter().all(|r| r.len() == tile.width() as usize));
        }

        for job in jobs {
            job.render(&encode, SampleGrid::Full, 0.0);
        }
        for y in 0..h {
            for x in 0..w {
                assert_eq!(pixels[(y * w + x) as usize], encode(x, y, 0.0));
            }
        }
    }

    #[test]
    fn empty_targets_yield_no_jobs() {
        let grid = TileGrid::new(0, 10, 8);
        assert!(tile_jobs(&mut [], 0, &grid).is_empty());
    }

    #[test]
    fn reduced_grid_samples_footprint_centers() {
        let grid = SampleGrid::Reduced {
            scale: 0.5,
            width: 10,
            height: 6,
        };
        assert_eq!(grid.source_coord(0, 0), (1, 1));
        assert_eq!(grid.source_coord(4, 2), (9, 5));
        // Clamped to the last valid coordinate.
        let grid = SampleGrid::Reduced {
            scale: 0.3,
            width: 10,
            height: 10,
        };
        assert_eq!(grid.source_coord(2, 2), (8, 8));
        assert_eq!(grid.source_coord(3, 3), (9, 9));
    }

    #[test]
    fn sequential_full_res_writes_every_pixel() {
        let config = Config {
            width: 50,
            height: 30,
            chunk: 16,
            ..Config::default()
        };
        let mut sched = FrameScheduler::new(encode, &config, ExecutionMode::Sequential)
            .expect("sequential scheduler");
        let frame = sched.compute_frame(0.0);
        for y in 0..30 {
            for x in 0..50 {
                assert_eq!(frame.get(x, y), Some(encode(x, y, 0.0)));
            }
        }
        let stats = sched.stats();
        assert_eq!(stats.path, RenderPath::FullRes);
        assert_eq!(stats.tiles, 4 * 2);
        assert_eq!(stats.frames, 1);
        assert_eq!(sched.workers(), 1);
    }

    #[test]
    fn tile_size_follows_chunk() {
        for (chunk, ts) in [(1, 8), (32, 32), (500, 64)] {
            let config = Config {
                width: 16,
                height: 16,
                chunk,
                ..Config::default()
            };
            let sched = FrameScheduler::new(encode, &config, ExecutionMode::Sequential)
                .expect("sequential scheduler");
            assert_eq!(sched.tile_size(), ts);
        }
    }

    #[test]
    fn parallel_pool_honours_thread_count() {
        let config = Config {
            width: 16,
            height: 16,
            threads: 3,
            ..Config::default()
        };
        let sched = FrameScheduler::new(encode, &config, ExecutionMode::Parallel)
            .expect("parallel scheduler");
        assert_eq!(sched.workers(), 3);
        assert_eq!(sched.mode(), ExecutionMode::Parallel);
    }

    #[test]
    fn mode_and_path_names() {
        assert_eq!(ExecutionMode::Parallel.to_string(), "parallel");
        assert_eq!(ExecutionMode::Sequential.as_str(), "sequential");
        assert_eq!(RenderPath::FullRes.as_str(), "full");
        assert_eq!(RenderPath::LowRes.as_str(), "lowres");
    }
}
