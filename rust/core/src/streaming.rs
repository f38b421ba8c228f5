// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Fragment streaming
//!
//! Fragments are fetched one at a time by express ID, opened as tape data,
//! loaded into the scene and closed again. Batch mode walks a fixed list with
//! a fixed pause between fragments; exactly one fetch is in flight at a time.
//!
//! The controller is shared by every UI action (file load, single fragment,
//! batch stream), so its state is synchronized: the byte counter is atomic and
//! the engine and scene sit behind mutexes that are never held across an
//! await. A fragment's nodes therefore land in the scene as one unit.

use crate::config::ViewerConfig;
use crate::engine::{GeometryEngine, ModelHandle};
use crate::error::{Error, Result};
use crate::loader::{load_all_geometry, LoadStats};
use crate::scene::{NodeId, Scene};
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Source of fragment bytes
pub trait Fetcher {
    /// Fetch the complete fragment for `express_id`
    fn fetch(&self, express_id: u32) -> impl Future<Output = Result<Vec<u8>>>;
}

/// Timer used between batch fragments
pub trait Pacer {
    fn pause(&self, delay: Duration) -> impl Future<Output = ()>;
}

/// Cumulative bytes downloaded, shared with the UI
#[derive(Debug, Clone, Default)]
pub struct DownloadCounter(Arc<AtomicU64>);

impl DownloadCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `bytes` and return the new total
    pub fn add(&self, bytes: u64) -> u64 {
        self.0.fetch_add(bytes, Ordering::Relaxed) + bytes
    }

    pub fn total(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}

/// Cooperative stop signal for a batch stream, checked before each fragment
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    fn same_as(&self, other: &CancellationToken) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

/// Outcome of [`StreamToggle::toggle`]
#[derive(Debug, Clone)]
pub enum Toggle {
    /// A new stream should start, observing this token
    Started(CancellationToken),
    /// The running stream was asked to stop
    Stopped,
}

/// Start/stop switch for batch streaming
#[derive(Debug, Default)]
pub struct StreamToggle {
    active: Mutex<Option<CancellationToken>>,
}

impl StreamToggle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a stream when idle, cancel the running one otherwise
    pub fn toggle(&self) -> Toggle {
        let mut active = lock(&self.active);
        match active.take() {
            Some(token) => {
                token.cancel();
                Toggle::Stopped
            }
            None => {
                let token = CancellationToken::new();
                *active = Some(token.clone());
                Toggle::Started(token)
            }
        }
    }

    /// Mark the stream owning `token` as finished
    pub fn finish(&self, token: &CancellationToken) {
        let mut active = lock(&self.active);
        if active.as_ref().is_some_and(|t| t.same_as(token)) {
            *active = None;
        }
    }

    pub fn is_running(&self) -> bool {
        lock(&self.active).is_some()
    }
}

/// One fragment that made it into the scene
#[derive(Debug, Clone, PartialEq)]
pub struct FragmentReport {
    pub express_id: u32,
    pub bytes: usize,
    /// Download total after this fragment
    pub total_downloaded: u64,
    pub stats: LoadStats,
}

/// Result of a batch stream
#[derive(Debug, Default)]
pub struct StreamSummary {
    pub completed: Vec<FragmentReport>,
    pub failed: Vec<(u32, Error)>,
    /// The token was cancelled before the list was exhausted
    pub cancelled: bool,
}

impl StreamSummary {
    pub fn bytes(&self) -> usize {
        self.completed.iter().map(|r| r.bytes).sum()
    }
}

/// Parse a typed express ID the way a lenient integer parse would:
/// an optional `+` and leading digits after trimming, anything else ignored.
/// Negative numbers are not IDs.
pub fn parse_express_id(text: &str) -> Option<u32> {
    let trimmed = text.trim();
    let trimmed = trimmed.strip_prefix('+').unwrap_or(trimmed);
    let end = trimmed
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(trimmed.len());
    trimmed[..end].parse().ok()
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Drives file loads and fragment streams into one scene
pub struct StreamingController<E, F, P> {
    engine: Mutex<E>,
    scene: Mutex<Scene>,
    fetcher: F,
    pacer: P,
    downloaded: DownloadCounter,
    config: ViewerConfig,
}

impl<E, F, P> StreamingController<E, F, P>
where
    E: GeometryEngine,
    F: Fetcher,
    P: Pacer,
{
    pub fn new(engine: E, fetcher: F, pacer: P, config: ViewerConfig) -> Self {
        Self {
            engine: Mutex::new(engine),
            scene: Mutex::new(Scene::new()),
            fetcher,
            pacer,
            downloaded: DownloadCounter::new(),
            config,
        }
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    /// Shared handle to the download counter
    pub fn downloaded(&self) -> DownloadCounter {
        self.downloaded.clone()
    }

    pub fn total_downloaded(&self) -> u64 {
        self.downloaded.total()
    }

    /// Run `f` against the scene
    pub fn with_scene<R>(&self, f: impl FnOnce(&Scene) -> R) -> R {
        f(&lock(&self.scene))
    }

    /// Run `f` against the engine
    pub fn with_engine<R>(&self, f: impl FnOnce(&mut E) -> R) -> R {
        f(&mut lock(&self.engine))
    }

    pub fn node_count(&self) -> usize {
        lock(&self.scene).len()
    }

    /// Evict the nodes produced by `model`
    pub fn remove_model(&self, model: ModelHandle) -> Vec<NodeId> {
        lock(&self.scene).remove_model(model)
    }

    pub fn clear_scene(&self) -> Vec<NodeId> {
        lock(&self.scene).clear()
    }

    /// Open a complete model and load its geometry.
    ///
    /// The model stays open; its handle keys the nodes it produced. When
    /// loading fails the model is closed and its partial nodes are removed.
    pub fn load_from_bytes(&self, name: &str, data: &[u8]) -> Result<(ModelHandle, LoadStats)> {
        let mut engine = lock(&self.engine);
        let start = engine.now_ms();
        let model = engine.open_model(name, data)?;
        tracing::info!(
            model = %model,
            file = name,
            bytes = data.len(),
            open_ms = engine.now_ms() - start,
            "Opened model"
        );

        let mut scene = lock(&self.scene);
        match load_all_geometry(&mut *engine, &mut scene, model) {
            Ok(stats) => Ok((model, stats)),
            Err(e) => {
                // A half-loaded file is discarded whole
                let removed = scene.remove_model(model);
                if let Err(close) = engine.close_model(model) {
                    tracing::warn!(model = %model, error = %close, "Failed to close model");
                }
                tracing::warn!(
                    model = %model,
                    file = name,
                    removed = removed.len(),
                    error = %e,
                    "Model load failed"
                );
                Err(e)
            }
        }
    }

    /// Fetch one fragment, load it and close its model.
    ///
    /// The model is closed even when loading fails.
    pub async fn stream_one(&self, express_id: u32) -> Result<FragmentReport> {
        let data = self.fetcher.fetch(express_id).await?;
        if data.is_empty() {
            return Err(Error::EmptyFragment { express_id });
        }

        let bytes = data.len();
        let total_downloaded = self.downloaded.add(bytes as u64);
        tracing::debug!(express_id, bytes, total_downloaded, "Received fragment");

        let stats = {
            let mut engine = lock(&self.engine);
            let mut scene = lock(&self.scene);
            let model = engine.open_model_from_tape(&data)?;
            let loaded = load_all_geometry(&mut *engine, &mut scene, model);
            let closed = engine.close_model(model);
            let stats = loaded?;
            closed?;
            stats
        };

        Ok(FragmentReport {
            express_id,
            bytes,
            total_downloaded,
            stats,
        })
    }

    /// Stream `ids` in order, pausing between fragments.
    ///
    /// `token` is checked before every fragment. A failing fragment is logged
    /// and recorded; the stream moves on to the next ID.
    pub async fn stream_all(&self, ids: &[u32], token: &CancellationToken) -> StreamSummary {
        self.stream_all_with(ids, token, |_| {}).await
    }

    /// [`stream_all`](Self::stream_all), calling `on_fragment` after each loaded fragment
    pub async fn stream_all_with(
        &self,
        ids: &[u32],
        token: &CancellationToken,
        mut on_fragment: impl FnMut(&FragmentReport),
    ) -> StreamSummary {
        let mut summary = StreamSummary::default();
        let delay = self.config.fragment_delay();

        for (i, &express_id) in ids.iter().enumerate() {
            if token.is_cancelled() {
                tracing::info!(streamed = i, remaining = ids.len() - i, "Stream cancelled");
                summary.cancelled = true;
                break;
            }

            match self.stream_one(express_id).await {
                Ok(report) => {
                    on_fragment(&report);
                    summary.completed.push(report);
                }
                Err(e) => {
                    tracing::warn!(express_id, error = %e, "Fragment failed");
                    summary.failed.push((express_id, e));
                }
            }

            if i + 1 < ids.len() {
                self.pacer.pause(delay).await;
            }
        }

        tracing::info!(
            completed = summary.completed.len(),
            failed = summary.failed.len(),
            bytes = summary.bytes(),
            "Stream finished"
        );
        summary
    }

    /// Stream the configured batch list
    pub async fn stream_batch(&self, token: &CancellationToken) -> StreamSummary {
        self.stream_all(&self.config.batch_ids, token).await
    }
}
