//! In-process embedded surface.
//!
//! Each load spawns a task that owns a [`MapDocument`]. The task is the
//! document's isolated context: the host reaches it only through channels,
//! and the SDK load races the load deadline inside it. Replacing or tearing
//! down the surface aborts the task, which drops the pending load and the
//! deadline together.

use crate::{
    bridge::{
        document::{BootStep, MapDocument},
        headless::HeadlessLoader,
        host::{EmbeddedSurface, SurfaceSignal, TransportError},
        sdk::SdkLoader,
    },
    core::config::SurfaceConfig,
    runtime::{self, AsyncHandle},
    ui::surface::SurfaceFactory,
    MapError, Result,
};
use crossbeam_channel::{Receiver, Sender};
use std::{
    sync::{Arc, Mutex, MutexGuard},
    time::Duration,
};
use tokio::sync::mpsc;

/// Builds a fresh SDK loader for every document
pub type LoaderFactory = Arc<dyn Fn() -> Box<dyn SdkLoader> + Send + Sync>;

/// What reaches the document from outside
#[derive(Debug, Clone, PartialEq)]
enum DocumentInput {
    Command(String),
    MapClick,
    MarkerClick(String),
}

#[derive(Default)]
struct Endpoints {
    inputs: Option<mpsc::UnboundedSender<DocumentInput>>,
    signals: Option<Sender<SurfaceSignal>>,
}

/// Reaches into whichever document the surface currently runs, the way a
/// user touching the map would
#[derive(Clone, Default)]
pub struct LocalSurfaceHandle {
    endpoints: Arc<Mutex<Endpoints>>,
}

impl LocalSurfaceHandle {
    fn lock(&self) -> MutexGuard<'_, Endpoints> {
        self.endpoints.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn send(&self, input: DocumentInput) -> bool {
        match &self.lock().inputs {
            Some(inputs) => inputs.send(input).is_ok(),
            None => false,
        }
    }

    pub fn click_marker(&self, id: &str) -> bool {
        self.send(DocumentInput::MarkerClick(id.to_string()))
    }

    pub fn click_map(&self) -> bool {
        self.send(DocumentInput::MapClick)
    }

    /// Posts a raw bridge string as if the document had sent it
    pub fn post_raw(&self, raw: impl Into<String>) -> bool {
        self.signal(SurfaceSignal::Message(raw.into()))
    }

    /// Makes the surface report a failure of its own
    pub fn fail(&self, error: TransportError) -> bool {
        self.signal(SurfaceSignal::Failed(error))
    }

    fn signal(&self, signal: SurfaceSignal) -> bool {
        match &self.lock().signals {
            Some(signals) => signals.send(signal).is_ok(),
            None => false,
        }
    }
}

pub struct LocalSurface {
    loaders: LoaderFactory,
    load_timeout: Duration,
    handle: LocalSurfaceHandle,
    signals: Option<Receiver<SurfaceSignal>>,
    messages: Option<Receiver<String>>,
    task: Option<Box<dyn AsyncHandle>>,
}

impl LocalSurface {
    pub fn new(loaders: LoaderFactory, load_timeout: Duration) -> Self {
        Self {
            loaders,
            load_timeout,
            handle: LocalSurfaceHandle::default(),
            signals: None,
            messages: None,
            task: None,
        }
    }

    pub fn handle(&self) -> LocalSurfaceHandle {
        self.handle.clone()
    }
}

impl EmbeddedSurface for LocalSurface {
    fn load(&mut self, payload: &str) -> Result<()> {
        self.teardown();
        // Remounts can happen long after creation, off the runtime thread
        tokio::runtime::Handle::try_current()
            .map_err(|err| MapError::SurfaceUnavailable(err.to_string()))?;

        let (outbox, messages) = crossbeam_channel::unbounded();
        let document = MapDocument::from_json(payload, outbox)
            .map_err(|err| MapError::TransportRenderFailure(format!("unreadable document payload: {err}")))?;
        let (signal_tx, signal_rx) = crossbeam_channel::unbounded();
        let (input_tx, input_rx) = mpsc::unbounded_channel();

        let task = run_document(
            document,
            (self.loaders)(),
            self.load_timeout,
            input_rx,
            signal_tx.clone(),
        );
        self.task = Some(runtime::spawn(task));

        let mut endpoints = self.handle.lock();
        endpoints.inputs = Some(input_tx);
        endpoints.signals = Some(signal_tx);
        drop(endpoints);

        self.signals = Some(signal_rx);
        self.messages = Some(messages);
        Ok(())
    }

    fn inject(&mut self, command: &str) {
        if !self.handle.send(DocumentInput::Command(command.to_string())) {
            log::debug!("no running document, dropping command");
        }
    }

    fn poll_signal(&mut self) -> Option<SurfaceSignal> {
        if let Some(signal) = self.signals.as_ref().and_then(|rx| rx.try_recv().ok()) {
            return Some(signal);
        }
        self.messages
            .as_ref()
            .and_then(|rx| rx.try_recv().ok())
            .map(SurfaceSignal::Message)
    }

    fn teardown(&mut self) {
        if let Some(task) = self.task.take() {
            task.cancel();
        }
        *self.handle.lock() = Endpoints::default();
        self.signals = None;
        self.messages = None;
    }
}

impl Drop for LocalSurface {
    fn drop(&mut self) {
        self.teardown();
    }
}

async fn run_document(
    mut document: MapDocument,
    mut loader: Box<dyn SdkLoader>,
    load_timeout: Duration,
    mut inputs: mpsc::UnboundedReceiver<DocumentInput>,
    signals: Sender<SurfaceSignal>,
) {
    let script_url = match document.boot() {
        BootStep::LoadScript(url) => Some(url),
        BootStep::Halted => None,
    };
    let mut loading = script_url.is_some();
    if signals.send(SurfaceSignal::LoadEnd).is_err() {
        return;
    }

    let load = async {
        match script_url.as_deref() {
            Some(url) => loader.load(url).await,
            None => futures::future::pending().await,
        }
    };
    tokio::pin!(load);
    let deadline = tokio::time::sleep(load_timeout);
    tokio::pin!(deadline);

    loop {
        tokio::select! {
            result = &mut load, if loading => {
                loading = false;
                match result {
                    Ok(sdk) => document.on_sdk_loaded(sdk),
                    Err(err) => document.on_sdk_load_failed(err),
                }
            }
            _ = &mut deadline, if loading => {
                loading = false;
                log::warn!("map SDK did not load within {load_timeout:?}");
                document.on_load_timeout();
            }
            input = inputs.recv() => match input {
                Some(DocumentInput::Command(raw)) => {
                    if let Err(err) = document.handle_command_json(&raw) {
                        log::warn!("document rejected host command: {err}");
                    }
                }
                Some(DocumentInput::MapClick) => document.on_map_click(),
                Some(DocumentInput::MarkerClick(id)) => document.click_marker(&id),
                None => break,
            },
        }
    }
    log::debug!("map document stopped in state {:?}", document.state());
}

/// Creates [`LocalSurface`]s on the ambient tokio runtime
#[derive(Clone)]
pub struct LocalSurfaceFactory {
    loaders: LoaderFactory,
    latest: Arc<Mutex<Option<LocalSurfaceHandle>>>,
}

impl LocalSurfaceFactory {
    pub fn new<F>(loaders: F) -> Self
    where
        F: Fn() -> Box<dyn SdkLoader> + Send + Sync + 'static,
    {
        Self {
            loaders: Arc::new(loaders),
            latest: Arc::default(),
        }
    }

    /// Every surface gets a clone of `loader`
    pub fn headless(loader: HeadlessLoader) -> Self {
        Self::new(move || Box::new(loader.clone()) as Box<dyn SdkLoader>)
    }

    /// Handle of the most recently created surface
    pub fn latest(&self) -> Option<LocalSurfaceHandle> {
        self.latest.lock().ok().and_then(|latest| latest.clone())
    }
}

impl SurfaceFactory for LocalSurfaceFactory {
    fn create(&mut self, config: &SurfaceConfig) -> Result<Box<dyn EmbeddedSurface>> {
        tokio::runtime::Handle::try_current()
            .map_err(|err| MapError::SurfaceUnavailable(err.to_string()))?;

        let surface = LocalSurface::new(self.loaders.clone(), config.sdk_load_timeout());
        if let Ok(mut latest) = self.latest.lock() {
            *latest = Some(surface.handle());
        }
        Ok(Box::new(surface))
    }
}
