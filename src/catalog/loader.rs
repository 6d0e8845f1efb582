//! Background thread that decodes the current image.
//!
//! Selection changes are cheap and frequent; decoding a full-resolution image
//! is not. [`CurrentImageLoader`] moves decoding onto a worker thread and
//! hands results back to the interactive thread through [`poll`].
//!
//! Results are last-write-wins: each request bumps a generation counter and
//! only a result carrying the latest generation is ever exposed. Requests
//! that pile up while the worker is busy are collapsed to the newest one.
//!
//! [`poll`]: CurrentImageLoader::poll

use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use super::decode::{ImageDecoder, Pixels};
use super::{CatalogImage, ImageCatalog};
use crate::error::BoxmarkError;
use crate::model::ImageId;

/// Outcome of decoding the current image.
#[derive(Clone, Debug, PartialEq)]
pub enum LoadResult {
    Loaded { id: ImageId, pixels: Arc<Pixels> },
    Failed { id: ImageId, error: String },
}

impl LoadResult {
    pub fn id(&self) -> &ImageId {
        match self {
            LoadResult::Loaded { id, .. } | LoadResult::Failed { id, .. } => id,
        }
    }
}

struct LoadRequest {
    generation: u64,
    id: ImageId,
    path: PathBuf,
}

enum ThreadMessage {
    Load(LoadRequest),
    Shutdown,
}

/// Decodes the selected image off the interactive thread.
pub struct CurrentImageLoader {
    request_tx: Sender<ThreadMessage>,
    result_rx: Receiver<(u64, LoadResult)>,
    thread_handle: Option<JoinHandle<()>>,
    generation: u64,
    requested: Option<ImageId>,
    current: Option<LoadResult>,
}

impl CurrentImageLoader {
    /// Spawns the decoder thread.
    pub fn spawn(decoder: Arc<dyn ImageDecoder>) -> Result<Self, BoxmarkError> {
        let (request_tx, request_rx) = mpsc::channel::<ThreadMessage>();
        let (result_tx, result_rx) = mpsc::channel::<(u64, LoadResult)>();

        let thread_handle = thread::Builder::new()
            .name("current-image-loader".to_string())
            .spawn(move || {
                log::debug!("Current image loader thread started");
                thread_loop(decoder.as_ref(), request_rx, result_tx);
                log::debug!("Current image loader thread exiting");
            })?;

        Ok(Self {
            request_tx,
            result_rx,
            thread_handle: Some(thread_handle),
            generation: 0,
            requested: None,
            current: None,
        })
    }

    /// Requests the given image, or clears the current image for `None`.
    ///
    /// Re-requesting the image that is already requested is a no-op.
    /// Returns the generation that a matching result will carry.
    pub fn request(&mut self, image: Option<&CatalogImage>) -> u64 {
        let id = image.map(|image| image.id.clone());
        if id == self.requested {
            return self.generation;
        }

        self.generation += 1;
        self.requested = id;
        self.current = None;

        if let Some(image) = image {
            let request = LoadRequest {
                generation: self.generation,
                id: image.id.clone(),
                path: image.path.clone(),
            };
            if self.request_tx.send(ThreadMessage::Load(request)).is_err() {
                log::error!("Failed to send load request: loader thread is gone");
            } else {
                log::debug!("Requested {} (generation {})", image.id, self.generation);
            }
        }
        self.generation
    }

    /// Requests whatever the catalog currently has selected.
    pub fn follow(&mut self, catalog: &ImageCatalog) -> u64 {
        self.request(catalog.current_image())
    }

    /// Drains finished work without blocking.
    ///
    /// Returns the current result if it arrived during this call. Results for
    /// superseded requests are discarded.
    pub fn poll(&mut self) -> Option<&LoadResult> {
        let mut arrived = false;
        loop {
            match self.result_rx.try_recv() {
                Ok((generation, result)) => arrived |= self.accept(generation, result),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    log::warn!("Loader thread disconnected");
                    break;
                }
            }
        }
        if arrived {
            self.current.as_ref()
        } else {
            None
        }
    }

    /// Blocks until the current request resolves or `timeout` elapses.
    pub fn wait(&mut self, timeout: Duration) -> Option<&LoadResult> {
        let deadline = Instant::now() + timeout;
        while self.is_pending() {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.result_rx.recv_timeout(remaining) {
                Ok((generation, result)) => {
                    self.accept(generation, result);
                }
                Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => break,
            }
        }
        self.current.as_ref()
    }

    fn accept(&mut self, generation: u64, result: LoadResult) -> bool {
        if generation != self.generation {
            log::debug!(
                "Discarding stale result for {} (generation {} < {})",
                result.id(),
                generation,
                self.generation
            );
            return false;
        }
        self.current = Some(result);
        true
    }

    /// The latest result for the latest request, if it has arrived.
    pub fn current(&self) -> Option<&LoadResult> {
        self.current.as_ref()
    }

    /// True while a requested image has not resolved yet.
    pub fn is_pending(&self) -> bool {
        self.requested.is_some() && self.current.is_none()
    }
}

fn thread_loop(
    decoder: &dyn ImageDecoder,
    request_rx: Receiver<ThreadMessage>,
    result_tx: Sender<(u64, LoadResult)>,
) {
    while let Ok(message) = request_rx.recv() {
        let ThreadMessage::Load(mut request) = message else {
            log::debug!("Received shutdown signal");
            return;
        };

        // Skip anything that was superseded while we were busy.
        loop {
            match request_rx.try_recv() {
                Ok(ThreadMessage::Load(newer)) => request = newer,
                Ok(ThreadMessage::Shutdown) => return,
                Err(_) => break,
            }
        }

        let result = match decoder.decode(&request.path) {
            Ok(pixels) => LoadResult::Loaded {
                id: request.id,
                pixels: Arc::new(pixels),
            },
            Err(err) => {
                log::warn!("Failed to load {}: {}", request.path.display(), err);
                LoadResult::Failed {
                    id: request.id,
                    error: err.to_string(),
                }
            }
        };

        if result_tx.send((request.generation, result)).is_err() {
            log::warn!("Result channel closed, loader thread exiting");
            return;
        }
    }
}

impl Drop for CurrentImageLoader {
    fn drop(&mut self) {
        let _ = self.request_tx.send(ThreadMessage::Shutdown);

        if let Some(handle) = self.thread_handle.take() {
            if let Err(e) = handle.join() {
                log::warn!("Loader thread panicked: {:?}", e);
            }
        }
    }
}
