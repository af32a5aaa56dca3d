//! Background loading of definition files.
//!
//! Reading and decoding run on the worker pool. Decoded documents come back
//! through a channel that the main thread drains with
//! [`AssetLoader::poll_results`]; validation and registration happen there,
//! never on a worker.

use std::path::{Path, PathBuf};
use std::sync::mpsc;

use cobalt_core::data::{load_file, DataError, Format, Value};
use cobalt_core::worker::{WorkerError, WorkerPool};

/// Opaque identifier for an in-flight load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AssetRequestId(u64);

/// What a loaded document describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetKind {
    Shader,
    Material,
    Scene,
}

/// A finished load.
#[derive(Debug)]
pub struct LoadedAsset {
    pub id: AssetRequestId,
    pub kind: AssetKind,
    pub path: PathBuf,
    pub document: Result<Value, DataError>,
}

/// Non-blocking loader for shader, material and scene documents.
pub struct AssetLoader {
    pool: WorkerPool,
    format: Option<Format>,
    result_tx: mpsc::Sender<LoadedAsset>,
    result_rx: mpsc::Receiver<LoadedAsset>,
    next_id: u64,
    in_flight: usize,
}

impl AssetLoader {
    /// `format` forces a format; `None` picks it from each file's extension.
    pub fn new(pool: WorkerPool, format: Option<Format>) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            pool,
            format,
            result_tx: tx,
            result_rx: rx,
            next_id: 0,
            in_flight: 0,
        }
    }

    /// Queues a file for loading. Fails when the pool's queue is full.
    pub fn request(
        &mut self,
        path: impl AsRef<Path>,
        kind: AssetKind,
    ) -> Result<AssetRequestId, WorkerError> {
        let id = AssetRequestId(self.next_id);
        let path = path.as_ref().to_path_buf();
        let format = self.format;
        let tx = self.result_tx.clone();

        self.pool.execute(move || {
            let document = load_file::<Value>(&path, format);
            let _ = tx.send(LoadedAsset {
                id,
                kind,
                path,
                document,
            });
        })?;

        self.next_id += 1;
        self.in_flight += 1;
        log::debug!("Queued {kind:?} load {id:?}");
        Ok(id)
    }

    /// Drains every load finished so far.
    pub fn poll_results(&mut self) -> Vec<LoadedAsset> {
        let mut results = Vec::new();
        while let Ok(item) = self.result_rx.try_recv() {
            results.push(item);
        }
        self.in_flight = self.in_flight.saturating_sub(results.len());
        results
    }

    /// Blocks until every queued load finished, then drains them.
    pub fn wait(&mut self) -> Vec<LoadedAsset> {
        self.pool.wait_idle();
        self.poll_results()
    }

    /// Loads requested but not yet drained.
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Drops loads that have not started yet. Returns how many.
    pub fn cancel_pending(&mut self) -> usize {
        let dropped = self.pool.clear();
        self.in_flight = self.in_flight.saturating_sub(dropped);
        dropped
    }
}
