use std::{
    collections::VecDeque,
    fmt,
    sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError},
    thread::JoinHandle,
    time::Duration,
};

use anyhow::Context as _;

use crate::{
    assets::{
        decode::Raster,
        fit::{DEFAULT_FILL_RATIO, fit_to_bounds, validate_render_target},
    },
    foundation::{
        core::{Point, Rect, Size},
        error::{SortError, SortResult},
    },
    game::Game,
    model::item::LabeledItem,
};

/// An item fitted to the render bounds and ready to show.
#[derive(Clone, Debug)]
pub struct ReadyItem {
    pub item: Arc<LabeledItem>,
    /// Raster scaled to fit the render bounds.
    pub raster: Raster,
    /// Where to draw `raster`, centred on the render centre.
    pub placement: Rect,
}

/// Counters maintained by the prefetch worker.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PrefetchStats {
    /// Items fitted and enqueued.
    pub produced: u64,
    /// Items skipped because they could not be decoded or fitted.
    pub failed: u64,
    /// Times the worker stopped because the game ran out of items.
    pub exhausted: u64,
}

struct State {
    queue: VecDeque<ReadyItem>,
    outstanding: usize,
    busy: bool,
    shutdown: bool,
    stats: PrefetchStats,
}

struct Shared {
    state: Mutex<State>,
    /// Signalled when work is requested or shutdown begins.
    wake: Condvar,
    /// Signalled after every worker iteration.
    progress: Condvar,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[derive(Clone, Copy, Debug)]
struct RenderTarget {
    bounds: Size,
    center: Point,
    fill_ratio: f64,
}

/// Bounded lookahead of display-ready items.
///
/// A single background worker pulls items from the shared [`Game`], fits them to the render
/// bounds and appends them to a FIFO. Each [`request_more`](Self::request_more) asks for one
/// more item; construction asks for `target` items up front. Items that fail to decode are
/// logged and skipped. When the game runs out of items the worker drops the remaining requests
/// and goes idle until asked again.
///
/// Dropping the buffer stops the worker between items and joins it.
pub struct PrefetchBuffer {
    shared: Arc<Shared>,
    worker: Option<JoinHandle<()>>,
    target: usize,
    render: RenderTarget,
}

impl PrefetchBuffer {
    pub fn new(
        target: usize,
        game: Arc<Mutex<Game>>,
        bounds: Size,
        center: Point,
    ) -> SortResult<Self> {
        Self::with_fill_ratio(target, game, bounds, center, DEFAULT_FILL_RATIO)
    }

    pub fn with_fill_ratio(
        target: usize,
        game: Arc<Mutex<Game>>,
        bounds: Size,
        center: Point,
        fill_ratio: f64,
    ) -> SortResult<Self> {
        validate_render_target(bounds, center)?;
        if !fill_ratio.is_finite() || fill_ratio <= 0.0 {
            return Err(SortError::validation("fill ratio must be finite and > 0"));
        }

        let render = RenderTarget {
            bounds,
            center,
            fill_ratio,
        };
        let shared = Arc::new(Shared {
            state: Mutex::new(State {
                queue: VecDeque::with_capacity(target),
                outstanding: target,
                busy: false,
                shutdown: false,
                stats: PrefetchStats::default(),
            }),
            wake: Condvar::new(),
            progress: Condvar::new(),
        });

        let worker_shared = Arc::clone(&shared);
        let worker = std::thread::Builder::new()
            .name("minute-sort-prefetch".to_string())
            .spawn(move || run_worker(&worker_shared, &game, render))
            .context("spawn prefetch worker")?;

        tracing::debug!(target, "prefetch buffer started");
        Ok(Self {
            shared,
            worker: Some(worker),
            target,
            render,
        })
    }

    /// Ask the worker for one more item.
    pub fn request_more(&self) {
        let mut st = self.shared.lock();
        st.outstanding += 1;
        drop(st);
        self.shared.wake.notify_one();
    }

    /// Take the oldest ready item.
    pub fn next_image(&self) -> SortResult<ReadyItem> {
        self.shared
            .lock()
            .queue
            .pop_front()
            .ok_or(SortError::BufferEmpty)
    }

    /// Number of ready items.
    pub fn size(&self) -> usize {
        self.shared.lock().queue.len()
    }

    pub fn target(&self) -> usize {
        self.target
    }

    pub fn bounds(&self) -> Size {
        self.render.bounds
    }

    pub fn center(&self) -> Point {
        self.render.center
    }

    /// Requests the worker has not served yet.
    pub fn outstanding(&self) -> usize {
        self.shared.lock().outstanding
    }

    pub fn stats(&self) -> PrefetchStats {
        self.shared.lock().stats
    }

    /// Block until at least `n` items are ready, the worker goes idle, or `timeout` elapses.
    ///
    /// Returns `true` if `n` items are ready.
    pub fn wait_for_size(&self, n: usize, timeout: Duration) -> bool {
        let st = self.shared.lock();
        let (st, _) = self
            .shared
            .progress
            .wait_timeout_while(st, timeout, |st| {
                st.queue.len() < n && !st.shutdown && (st.outstanding > 0 || st.busy)
            })
            .unwrap_or_else(PoisonError::into_inner);
        st.queue.len() >= n
    }

    /// Block until the worker has no outstanding requests, or `timeout` elapses.
    ///
    /// Returns `true` if the worker is idle.
    pub fn wait_idle(&self, timeout: Duration) -> bool {
        let st = self.shared.lock();
        let (st, _) = self
            .shared
            .progress
            .wait_timeout_while(st, timeout, |st| {
                !st.shutdown && (st.outstanding > 0 || st.busy)
            })
            .unwrap_or_else(PoisonError::into_inner);
        st.outstanding == 0 && !st.busy
    }

    /// Stop the worker after its current item and wait for it to exit.
    pub fn shutdown(&mut self) {
        let Some(worker) = self.worker.take() else {
            return;
        };
        self.shared.lock().shutdown = true;
        self.shared.wake.notify_all();
        self.shared.progress.notify_all();
        if worker.join().is_err() {
            tracing::error!("prefetch worker panicked");
        }
    }
}

impl Drop for PrefetchBuffer {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl fmt::Debug for PrefetchBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let st = self.shared.lock();
        f.debug_struct("PrefetchBuffer")
            .field("target", &self.target)
            .field("ready", &st.queue.len())
            .field("outstanding", &st.outstanding)
            .field("stats", &st.stats)
            .finish_non_exhaustive()
    }
}

fn run_worker(shared: &Shared, game: &Mutex<Game>, render: RenderTarget) {
    loop {
        {
            let mut st = shared.lock();
            while st.outstanding == 0 && !st.shutdown {
                st = shared
                    .wake
                    .wait(st)
                    .unwrap_or_else(PoisonError::into_inner);
            }
            if st.shutdown {
                break;
            }
            st.busy = true;
        }

        let produced = produce_one(game, render);

        let mut st = shared.lock();
        st.busy = false;
        match produced {
            Ok(ready) => {
                st.queue.push_back(ready);
                st.outstanding = st.outstanding.saturating_sub(1);
                st.stats.produced += 1;
            }
            Err(SortError::Exhausted) => {
                tracing::debug!(
                    dropped_requests = st.outstanding,
                    "game exhausted, prefetch worker going idle"
                );
                st.outstanding = 0;
                st.stats.exhausted += 1;
            }
            Err(err) => {
                tracing::warn!(error = %err, "skipping item that could not be prepared");
                st.outstanding = st.outstanding.saturating_sub(1);
                st.stats.failed += 1;
            }
        }
        drop(st);
        shared.progress.notify_all();
    }
    tracing::debug!("prefetch worker stopped");
}

fn produce_one(game: &Mutex<Game>, render: RenderTarget) -> SortResult<ReadyItem> {
    let (item, decoder) = {
        let mut game = game.lock().unwrap_or_else(PoisonError::into_inner);
        let item = game.next_item()?;
        (item, Arc::clone(game.decoder()))
    };

    // Decode outside the game lock so scoring never waits on it.
    let raster = item.load(decoder.as_ref())?;
    let fitted = fit_to_bounds(&raster, render.bounds, render.center, render.fill_ratio)?;
    Ok(ReadyItem {
        item,
        raster: fitted.raster,
        placement: fitted.placement,
    })
}
