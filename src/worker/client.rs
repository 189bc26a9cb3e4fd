use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicBool, Ordering},
        mpsc::{self, Receiver, RecvTimeoutError, Sender},
        Arc,
    },
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use super::{
    paged::is_streaming,
    protocol::{FullDiff, PagedDiff, Request, RequestId, Response},
    runner::{self, Envelope},
    WorkerSettings,
};
use crate::{error::WorkerError, render::RenderMode};

struct Route {
    events: Sender<Response>,
    cancel: Arc<AtomicBool>,
}

type Routes = Arc<Mutex<HashMap<RequestId, Route>>>;

/// A running worker thread and the thread that routes its responses.
struct Connection {
    requests: Sender<Envelope>,
    routes: Routes,
    worker: JoinHandle<()>,
    dispatcher: JoinHandle<()>,
}

impl Connection {
    fn spawn(settings: WorkerSettings) -> Result<Connection, WorkerError> {
        let (requests, requests_rx) = mpsc::channel();
        let (responses, responses_rx) = mpsc::channel();
        let routes: Routes = Arc::default();

        let worker = thread::Builder::new()
            .name("notediff-worker".to_owned())
            .spawn(move || runner::run(requests_rx, responses, settings))
            .map_err(|e| WorkerError::Failed(e.to_string()))?;
        let dispatcher_routes = routes.clone();
        let dispatcher = thread::Builder::new()
            .name("notediff-dispatch".to_owned())
            .spawn(move || dispatch(responses_rx, dispatcher_routes))
            .map_err(|e| WorkerError::Failed(e.to_string()))?;

        info!("diff worker started");
        Ok(Connection {
            requests,
            routes,
            worker,
            dispatcher,
        })
    }

    fn is_finished(&self) -> bool {
        self.worker.is_finished() || self.dispatcher.is_finished()
    }

    fn shutdown(self) {
        for route in self.routes.lock().values() {
            route.cancel.store(true, Ordering::Relaxed);
        }
        drop(self.requests);
        let worker = self.worker.join();
        let dispatcher = self.dispatcher.join();
        if worker.is_err() || dispatcher.is_err() {
            warn!("diff worker thread panicked");
        }
        info!("diff worker stopped");
    }
}

fn dispatch(responses: Receiver<Response>, routes: Routes) {
    for response in responses {
        let id = response.id();
        let mut routes = routes.lock();
        if response.is_terminal() {
            if let Some(route) = routes.remove(&id) {
                let _ = route.events.send(response);
            }
        } else if let Some(route) = routes.get(&id) {
            let _ = route.events.send(response);
        }
    }
    // Waiting callers see a disconnect.
    routes.lock().clear();
}

/// Handle to the background diff worker.
///
/// The worker thread is started by the first request, and started again if it has stopped.
/// Requests from several threads may be in flight at the same time; they are served in order.
pub struct WorkerClient {
    settings: WorkerSettings,
    connection: Mutex<Option<Connection>>,
}

impl WorkerClient {
    pub fn new(settings: WorkerSettings) -> WorkerClient {
        WorkerClient {
            settings,
            connection: Mutex::new(None),
        }
    }

    pub fn settings(&self) -> &WorkerSettings {
        &self.settings
    }

    /// Sends `request` to the worker. The returned handle times out after `timeout`.
    pub fn submit(&self, request: Request, timeout: Duration) -> Result<PendingRequest, WorkerError> {
        let mut connection = self.connection.lock();
        if connection.as_ref().map_or(true, Connection::is_finished) {
            if let Some(stale) = connection.take() {
                stale.shutdown();
            }
            *connection = Some(Connection::spawn(self.settings.clone())?);
        }
        let Some(connection) = connection.as_ref() else {
            return Err(WorkerError::Disconnected);
        };

        let id = request.id();
        let cancel = Arc::new(AtomicBool::new(false));
        let (events, events_rx) = mpsc::channel();
        connection.routes.lock().insert(
            id,
            Route {
                events,
                cancel: cancel.clone(),
            },
        );
        let envelope = Envelope {
            request,
            cancel: cancel.clone(),
        };
        if connection.requests.send(envelope).is_err() {
            connection.routes.lock().remove(&id);
            return Err(WorkerError::Disconnected);
        }
        debug!(%id, ?timeout, "request submitted");
        Ok(PendingRequest {
            id,
            events: events_rx,
            cancel,
            timeout,
            finished: false,
        })
    }

    /// Runs a full diff, passing progress and partial results to `on_event`.
    pub fn diff(
        &self,
        original_text: &str,
        modified_text: &str,
        diff_mode: RenderMode,
        on_event: impl FnMut(&Response),
    ) -> Result<FullDiff, WorkerError> {
        let request = Request::Diff {
            id: RequestId::new(),
            original_text: original_text.to_owned(),
            modified_text: modified_text.to_owned(),
            diff_mode,
        };
        match self.submit(request, self.settings.full_timeout)?.wait(on_event)? {
            Response::Complete { data, .. } => Ok(data),
            other => Err(WorkerError::UnexpectedResponse(other.kind())),
        }
    }

    /// Diffs one page of lines. Pages large enough to be streamed get the longer timeout.
    pub fn paged_diff(
        &self,
        original_text: &str,
        modified_text: &str,
        page_number: usize,
        lines_per_page: usize,
        diff_mode: RenderMode,
        on_event: impl FnMut(&Response),
    ) -> Result<PagedDiff, WorkerError> {
        let streaming = is_streaming(
            original_text,
            modified_text,
            page_number,
            lines_per_page,
            self.settings.stream_threshold_chars,
        );
        let timeout = if streaming {
            self.settings.streaming_timeout
        } else {
            self.settings.paged_timeout
        };
        let request = Request::PagedDiff {
            id: RequestId::new(),
            original_text: original_text.to_owned(),
            modified_text: modified_text.to_owned(),
            page_number,
            lines_per_page,
            diff_mode,
        };
        match self.submit(request, timeout)?.wait(on_event)? {
            Response::PagedComplete { data, .. } => Ok(data),
            other => Err(WorkerError::UnexpectedResponse(other.kind())),
        }
    }

    /// Number of requests that have not received their last response yet.
    pub fn in_flight(&self) -> usize {
        self.connection
            .lock()
            .as_ref()
            .map_or(0, |connection| connection.routes.lock().len())
    }

    pub fn is_running(&self) -> bool {
        self.connection
            .lock()
            .as_ref()
            .is_some_and(|connection| !connection.is_finished())
    }

    /// Cancels everything in flight and stops the worker thread. The next request starts a new one.
    pub fn shutdown(&self) {
        if let Some(connection) = self.connection.lock().take() {
            connection.shutdown();
        }
    }

    pub fn restart(&self) {
        self.shutdown();
        warn!("diff worker restarted");
    }
}

impl Default for WorkerClient {
    fn default() -> WorkerClient {
        WorkerClient::new(WorkerSettings::default())
    }
}

impl Drop for WorkerClient {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// A submitted request. Dropping it before the last response arrives cancels the request.
pub struct PendingRequest {
    id: RequestId,
    events: Receiver<Response>,
    cancel: Arc<AtomicBool>,
    timeout: Duration,
    finished: bool,
}

impl PendingRequest {
    pub fn id(&self) -> RequestId {
        self.id
    }

    /// Asks the worker to stop. The request then ends with [`WorkerError::Cancelled`], unless it
    /// finished first.
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::Relaxed);
    }

    /// Waits for the last response, passing the others to `on_event`. `error` and `cancelled`
    /// responses are returned as errors. On timeout the request is cancelled.
    pub fn wait(mut self, mut on_event: impl FnMut(&Response)) -> Result<Response, WorkerError> {
        let deadline = Instant::now() + self.timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.events.recv_timeout(remaining) {
                Ok(response) if response.is_terminal() => {
                    self.finished = true;
                    return match response {
                        Response::Error { error, .. } => Err(WorkerError::Failed(error)),
                        Response::Cancelled { .. } => Err(WorkerError::Cancelled),
                        response => Ok(response),
                    };
                }
                Ok(event) => on_event(&event),
                Err(RecvTimeoutError::Timeout) => {
                    warn!(id = %self.id, timeout = ?self.timeout, "diff request timed out");
                    self.cancel();
                    return Err(WorkerError::Timeout(self.timeout));
                }
                Err(RecvTimeoutError::Disconnected) => {
                    self.finished = true;
                    return Err(WorkerError::Disconnected);
                }
            }
        }
    }
}

impl Drop for PendingRequest {
    fn drop(&mut self) {
        if !self.finished {
            self.cancel();
        }
    }
}
