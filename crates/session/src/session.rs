//! Session actor: owns every piece of console state and processes commands,
//! frames, timers, requests and polls sequentially on one task.
//!
//! External callers talk to it through `SessionHandle`, which sends
//! `SessionCommand` messages over an mpsc channel. Lock-free reads go
//! through `ArcSwap`.
//!
//! HTTP calls never run inside the loop. Each one is spawned into a
//! `JoinSet` and its `RequestDone` is applied when it lands, so stream
//! frames, the reconnect timer and teardown are handled while it is pending.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use futures::StreamExt;
use maestro_protocol::rest::OpenedProject;
use maestro_protocol::{ClientMessage, ProjectSummary, Provider};
use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinHandle, JoinSet};
use tokio::time::Sleep;
use tokio_tungstenite::tungstenite::{self, Message};
use tracing::{debug, info, warn};

use crate::activity::ActivityEntry;
use crate::api::{model_listed, ApiClient};
use crate::catalog::{CatalogView, PendingDelete, ProjectCatalog};
use crate::config::SessionConfig;
use crate::connection::{
    decode, ConnectionManager, ConnectionState, FrameReader, Inbound, WsStream,
};
use crate::error::{ApiError, ConnectionError, RunRejection};
use crate::events::{ConsoleEvent, Notice, View};
use crate::guidance::GuidanceChannel;
use crate::poll::{poll_until, PollOutcome};
use crate::router;
use crate::session_command::SessionCommand;
use crate::state::ConsoleState;
use crate::status_board::AgentSlot;

const COMMAND_CHANNEL_CAPACITY: usize = 256;
const SNAPSHOT_ACTIVITY: usize = 20;

type DialFuture = Pin<Box<dyn Future<Output = Result<WsStream, ConnectionError>> + Send>>;

/// Lock-free view of a session for renderers and status queries
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub id: String,
    pub connection: ConnectionState,
    pub reconnect_attempt: u64,
    pub agents: Vec<AgentSlot>,
    pub bound_project: Option<String>,
    pub start_enabled: bool,
    pub view: View,
    /// Newest first
    pub recent_activity: Vec<ActivityEntry>,
    pub pending_requests: usize,
    pub pending_polls: usize,
    pub delete_pending: Option<String>,
}

/// What teardown cleaned up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionExit {
    pub aborted_requests: usize,
    pub aborted_polls: usize,
}

#[derive(Debug)]
struct PollReport {
    model: String,
    outcome: PollOutcome,
}

type Listing = Result<Vec<ProjectSummary>, ApiError>;

/// Completion of one collaborator call
#[derive(Debug)]
enum RequestDone {
    RunStarted(Result<String, ApiError>),
    ProjectsListed(Listing),
    /// `listing` is the follow-up refresh, only made when the open succeeded
    ProjectOpened {
        id: String,
        opened: Result<OpenedProject, ApiError>,
        listing: Option<Listing>,
    },
    ProjectDeleted {
        id: String,
        deleted: Result<(), ApiError>,
        listing: Option<Listing>,
    },
    PullAccepted {
        model: String,
        accepted: Result<(), ApiError>,
    },
}

/// Handle to a running session actor (cheap to Clone).
#[derive(Clone)]
pub struct SessionHandle {
    pub id: String,
    command_tx: mpsc::Sender<SessionCommand>,
    snapshot: Arc<ArcSwap<SessionSnapshot>>,
}

impl SessionHandle {
    /// Spawn the actor. Observable changes are published on `events`; the
    /// returned join handle resolves once teardown has finished.
    pub fn spawn(
        config: SessionConfig,
        api: ApiClient,
        events: mpsc::UnboundedSender<ConsoleEvent>,
    ) -> (SessionHandle, JoinHandle<SessionExit>) {
        let (command_tx, command_rx) = mpsc::channel(COMMAND_CHANNEL_CAPACITY);
        let session = Session::new(config, api, events);
        let handle = SessionHandle {
            id: session.id.clone(),
            command_tx,
            snapshot: session.snapshot.clone(),
        };
        let task = tokio::spawn(session.run(command_rx));
        (handle, task)
    }

    /// Send a command to the actor (fire-and-forget).
    pub async fn send(&self, cmd: SessionCommand) {
        if self.command_tx.send(cmd).await.is_err() {
            warn!(
                component = "session",
                event = "session.command.send_failed",
                session_id = %self.id,
                "Failed to send command to session actor (channel closed)"
            );
        }
    }

    /// Read the latest snapshot (lock-free).
    pub fn snapshot(&self) -> Arc<SessionSnapshot> {
        self.snapshot.load_full()
    }

    pub async fn teardown(&self) {
        self.send(SessionCommand::Teardown).await;
    }
}

struct Session {
    id: String,
    config: SessionConfig,
    api: ApiClient,
    connection: ConnectionManager,
    state: ConsoleState,
    guidance: GuidanceChannel,
    catalog: ProjectCatalog,
    view: View,
    pending_delete: Option<PendingDelete>,
    /// A start request is in flight
    starting_run: bool,
    requests: JoinSet<RequestDone>,
    polls: JoinSet<PollReport>,
    dialing: Option<DialFuture>,
    reader: Option<FrameReader>,
    reconnect: Option<Pin<Box<Sleep>>>,
    events: mpsc::UnboundedSender<ConsoleEvent>,
    snapshot: Arc<ArcSwap<SessionSnapshot>>,
}

impl Session {
    fn new(
        config: SessionConfig,
        api: ApiClient,
        events: mpsc::UnboundedSender<ConsoleEvent>,
    ) -> Self {
        let connection = ConnectionManager::new(
            config.resolved_stream_url(),
            config.backoff(),
            config.connect_timeout(),
        );
        let state = ConsoleState::new(&config);
        let id = maestro_protocol::new_id();
        let mut session = Self {
            id: id.clone(),
            config,
            api,
            connection,
            state,
            guidance: GuidanceChannel::new(),
            catalog: ProjectCatalog::new(),
            view: View::Console,
            pending_delete: None,
            starting_run: false,
            requests: JoinSet::new(),
            polls: JoinSet::new(),
            dialing: None,
            reader: None,
            reconnect: None,
            events,
            snapshot: Arc::new(ArcSwap::from_pointee(empty_snapshot(id))),
        };
        session.publish_snapshot();
        session
    }

    async fn run(mut self, mut commands: mpsc::Receiver<SessionCommand>) -> SessionExit {
        info!(
            component = "session",
            event = "session.started",
            session_id = %self.id,
            server = %self.api.base_url(),
            stream = %self.connection.url(),
            "Session started"
        );
        self.start_connect();

        loop {
            tokio::select! {
                command = commands.recv() => match command {
                    Some(SessionCommand::Teardown) | None => break,
                    Some(command) => self.handle_command(command),
                },
                result = wait_dial(&mut self.dialing) => {
                    self.dialing = None;
                    self.on_dial(result);
                }
                message = next_frame(&mut self.reader) => self.on_inbound(message),
                _ = wait_timer(&mut self.reconnect) => {
                    self.reconnect = None;
                    self.start_connect();
                }
                Some(joined) = self.requests.join_next(), if !self.requests.is_empty() => {
                    self.on_request_finished(joined);
                }
                Some(joined) = self.polls.join_next(), if !self.polls.is_empty() => {
                    self.on_poll_finished(joined);
                }
            }
            self.publish_snapshot();
        }

        self.teardown()
    }

    // -- Connection ----------------------------------------------------------

    fn start_connect(&mut self) {
        self.dialing = Some(Box::pin(self.connection.connect()));
    }

    fn on_dial(&mut self, result: Result<WsStream, ConnectionError>) {
        match result {
            Ok(stream) => {
                self.reader = Some(self.connection.attach(stream));
                self.emit(ConsoleEvent::Connection { open: true });
                self.emit(ConsoleEvent::Notice(Notice::info(format!(
                    "Connected to {}",
                    self.connection.url()
                ))));
            }
            Err(e) => {
                warn!(
                    component = "session",
                    event = "session.connect.failed",
                    session_id = %self.id,
                    error = %e,
                    "Event stream connect failed"
                );
                self.on_loss();
            }
        }
    }

    fn on_inbound(&mut self, message: Option<Result<Message, tungstenite::Error>>) {
        match message {
            None => self.on_loss(),
            Some(Err(e)) => {
                warn!(
                    component = "session",
                    event = "session.stream.error",
                    session_id = %self.id,
                    error = %e,
                    "Event stream transport error"
                );
                self.on_loss();
            }
            Some(Ok(message)) => match decode(message) {
                Inbound::Frame(frame) => {
                    for event in router::dispatch(&mut self.state, frame) {
                        self.emit(event);
                    }
                }
                Inbound::Skip => {}
                Inbound::Closed => self.on_loss(),
            },
        }
    }

    fn on_loss(&mut self) {
        self.reader = None;
        let Some(delay) = self.connection.on_loss() else {
            return;
        };
        self.reconnect = Some(Box::pin(tokio::time::sleep(delay)));
        self.emit(ConsoleEvent::Connection { open: false });
        self.emit(ConsoleEvent::Notice(Notice::warn(format!(
            "Disconnected, reconnecting in {}",
            format_delay(delay)
        ))));
    }

    // -- Commands ------------------------------------------------------------

    fn handle_command(&mut self, command: SessionCommand) {
        debug!(
            component = "session",
            event = "session.command",
            session_id = %self.id,
            command = ?command,
            "Handling command"
        );
        match command {
            SessionCommand::Guidance { text } => self.submit_guidance(text),
            SessionCommand::StartRun {
                objective,
                project_name,
            } => self.start_run(&objective, project_name.as_deref()),
            SessionCommand::ShowProjects => self.show_projects(),
            SessionCommand::ShowConsole => self.set_view(View::Console),
            SessionCommand::OpenProject { id } => self.open_project(id),
            SessionCommand::RequestDelete { id } => self.request_delete(&id),
            SessionCommand::ConfirmDelete { confirmed } => self.confirm_delete(confirmed),
            SessionCommand::PullModel { model } => self.pull_model(model),
            SessionCommand::ClearBoard => {
                for event in router::clear(&mut self.state) {
                    self.emit(event);
                }
            }
            // Handled by the run loop
            SessionCommand::Teardown => {}
        }
    }

    fn submit_guidance(&mut self, text: String) {
        self.guidance.set_draft(text);
        match self.guidance.submit(&mut self.connection) {
            Ok(ClientMessage::Guidance { project_id, text }) => {
                self.emit(ConsoleEvent::GuidanceSent { project_id, text });
            }
            Err(rejection) => {
                self.emit(ConsoleEvent::Notice(Notice::warn(format!(
                    "Guidance not sent: {rejection}"
                ))));
            }
        }
    }

    fn start_run(&mut self, objective: &str, project_name: Option<&str>) {
        if let Err(rejection) = self.request_run(objective, project_name) {
            self.emit(ConsoleEvent::Notice(Notice::error(format!(
                "Run not started: {rejection}"
            ))));
        }
    }

    fn request_run(
        &mut self,
        objective: &str,
        project_name: Option<&str>,
    ) -> Result<(), RunRejection> {
        let objective = objective.trim().to_string();
        if objective.is_empty() {
            return Err(RunRejection::EmptyObjective);
        }
        if self.state.run_active || self.starting_run {
            return Err(RunRejection::AlreadyRunning);
        }
        let project_name = project_name
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string);

        self.starting_run = true;
        let api = self.api.clone();
        self.requests.spawn(async move {
            RequestDone::RunStarted(api.start_run(&objective, project_name.as_deref()).await)
        });
        Ok(())
    }

    fn on_run_started(&mut self, result: Result<String, ApiError>) {
        self.starting_run = false;
        match result {
            Ok(project_id) => {
                self.guidance.bind(project_id.clone());
                self.state.run_active = true;
                info!(
                    component = "session",
                    event = "session.run.started",
                    session_id = %self.id,
                    project_id = %project_id,
                    "Run started"
                );
                self.emit(ConsoleEvent::ProjectBound {
                    project_id: project_id.clone(),
                });
                self.emit(ConsoleEvent::RunControl {
                    start_enabled: false,
                });
                self.emit(ConsoleEvent::Notice(Notice::info(format!(
                    "Run started for project {project_id}"
                ))));
            }
            Err(e) => {
                self.emit(ConsoleEvent::Notice(Notice::error(format!(
                    "Run not started: {}",
                    RunRejection::Api(e)
                ))));
            }
        }
    }

    fn set_view(&mut self, view: View) {
        if self.view != view {
            self.view = view;
            self.emit(ConsoleEvent::ViewChanged(view));
        }
    }

    fn show_projects(&mut self) {
        self.set_view(View::Projects);
        let api = self.api.clone();
        self.requests
            .spawn(async move { RequestDone::ProjectsListed(api.list_projects().await) });
    }

    fn on_projects_listed(&mut self, listing: Listing) {
        self.catalog.apply_listing(listing);
        let snapshot = self.catalog.snapshot();
        if let CatalogView::Error(message) = &snapshot.view {
            self.emit(ConsoleEvent::Notice(Notice::error(format!(
                "Could not load projects: {message}"
            ))));
        }
        self.emit(ConsoleEvent::Catalog(snapshot));
    }

    fn open_project(&mut self, id: String) {
        let api = self.api.clone();
        self.requests.spawn(async move {
            let opened = api.open_project(&id).await;
            let listing = match opened {
                Ok(_) => Some(api.list_projects().await),
                Err(_) => None,
            };
            RequestDone::ProjectOpened {
                id,
                opened,
                listing,
            }
        });
    }

    fn on_project_opened(
        &mut self,
        id: String,
        opened: Result<OpenedProject, ApiError>,
        listing: Option<Listing>,
    ) {
        match opened {
            Ok(project) => {
                if let Some(listing) = listing {
                    self.catalog.apply_listing(listing);
                }
                self.guidance.bind(id.clone());
                self.emit(ConsoleEvent::ProjectBound { project_id: id });
                self.set_view(View::Console);
                self.emit(ConsoleEvent::Notice(Notice::info(format!(
                    "Opened {}",
                    project.name
                ))));
            }
            Err(e) => {
                self.catalog.record_failure(&e);
                self.emit(ConsoleEvent::Notice(Notice::error(format!(
                    "Could not open {id}: {e}"
                ))));
            }
        }
        self.emit(ConsoleEvent::Catalog(self.catalog.snapshot()));
    }

    fn request_delete(&mut self, id: &str) {
        let pending = self.catalog.request_delete(id);
        self.emit(ConsoleEvent::ConfirmDelete {
            id: pending.id().to_string(),
            name: pending.name().map(str::to_string),
        });
        self.pending_delete = Some(pending);
    }

    fn confirm_delete(&mut self, confirmed: bool) {
        let Some(pending) = self.pending_delete.take() else {
            self.emit(ConsoleEvent::Notice(Notice::warn("No delete is waiting for confirmation")));
            return;
        };
        if !confirmed {
            self.emit(ConsoleEvent::Notice(Notice::info(format!(
                "Kept {}",
                pending.id()
            ))));
            return;
        }

        let id = pending.id().to_string();
        let api = self.api.clone();
        self.requests.spawn(async move {
            let deleted = api.delete_project(&id).await;
            let listing = match deleted {
                Ok(()) => Some(api.list_projects().await),
                Err(_) => None,
            };
            RequestDone::ProjectDeleted {
                id,
                deleted,
                listing,
            }
        });
    }

    fn on_project_deleted(
        &mut self,
        id: String,
        deleted: Result<(), ApiError>,
        listing: Option<Listing>,
    ) {
        match deleted {
            Ok(()) => {
                info!(
                    component = "session",
                    event = "session.project.deleted",
                    session_id = %self.id,
                    project = %id,
                    "Project deleted"
                );
                if let Some(listing) = listing {
                    self.catalog.apply_listing(listing);
                }
                if self.guidance.bound_project() == Some(id.as_str()) {
                    self.guidance.unbind();
                }
                self.emit(ConsoleEvent::Notice(Notice::info(format!("Deleted {id}"))));
            }
            Err(e) => {
                self.catalog.record_failure(&e);
                self.emit(ConsoleEvent::Notice(Notice::error(format!(
                    "Could not delete {id}: {e}"
                ))));
            }
        }
        self.emit(ConsoleEvent::Catalog(self.catalog.snapshot()));
    }

    fn pull_model(&mut self, model: String) {
        let model = model.trim().to_string();
        if model.is_empty() {
            self.emit(ConsoleEvent::Notice(Notice::warn("Model name is empty")));
            return;
        }
        let api = self.api.clone();
        self.requests.spawn(async move {
            let accepted = api.pull_model(&model).await;
            RequestDone::PullAccepted { model, accepted }
        });
    }

    fn on_pull_accepted(&mut self, model: String, accepted: Result<(), ApiError>) {
        if let Err(e) = accepted {
            self.emit(ConsoleEvent::Notice(Notice::error(format!(
                "Could not pull {model}: {e}"
            ))));
            return;
        }

        let api = self.api.clone();
        let interval = self.config.pull_poll_interval();
        let ceiling = self.config.pull_poll_ceiling();
        let watched = model.clone();
        self.polls.spawn(async move {
            let outcome = poll_until(interval, ceiling, || {
                let api = api.clone();
                let model = watched.clone();
                async move {
                    match api.provider_models(Provider::Ollama).await {
                        Ok(names) => model_listed(&names, &model),
                        Err(e) => {
                            debug!(
                                component = "session",
                                event = "session.pull.poll_failed",
                                error = %e,
                                "Model listing failed during pull"
                            );
                            false
                        }
                    }
                }
            })
            .await;
            PollReport {
                model: watched,
                outcome,
            }
        });

        info!(
            component = "session",
            event = "session.pull.started",
            session_id = %self.id,
            model = %model,
            "Model pull started"
        );
        self.emit(ConsoleEvent::Notice(Notice::info(format!("Pulling {model}"))));
    }

    fn on_request_finished(&mut self, joined: Result<RequestDone, JoinError>) {
        match joined {
            Ok(RequestDone::RunStarted(result)) => self.on_run_started(result),
            Ok(RequestDone::ProjectsListed(listing)) => self.on_projects_listed(listing),
            Ok(RequestDone::ProjectOpened {
                id,
                opened,
                listing,
            }) => self.on_project_opened(id, opened, listing),
            Ok(RequestDone::ProjectDeleted {
                id,
                deleted,
                listing,
            }) => self.on_project_deleted(id, deleted, listing),
            Ok(RequestDone::PullAccepted { model, accepted }) => {
                self.on_pull_accepted(model, accepted)
            }
            Err(e) if e.is_cancelled() => {}
            Err(e) => warn!(
                component = "session",
                event = "session.request.panicked",
                session_id = %self.id,
                error = %e,
                "Request task failed"
            ),
        }
    }

    fn on_poll_finished(&mut self, joined: Result<PollReport, JoinError>) {
        match joined {
            Ok(PollReport {
                model,
                outcome: PollOutcome::Ready,
            }) => {
                self.emit(ConsoleEvent::Notice(Notice::info(format!("{model} is ready"))));
            }
            Ok(PollReport {
                model,
                outcome: PollOutcome::TimedOut,
            }) => {
                self.emit(ConsoleEvent::Notice(Notice::warn(format!(
                    "Stopped waiting for {model}"
                ))));
            }
            Err(e) if e.is_cancelled() => {}
            Err(e) => warn!(
                component = "session",
                event = "session.poll.panicked",
                session_id = %self.id,
                error = %e,
                "Poll task failed"
            ),
        }
    }

    // -- Teardown ------------------------------------------------------------

    fn teardown(&mut self) -> SessionExit {
        let aborted_requests = self.requests.len();
        let aborted_polls = self.polls.len();
        self.requests.abort_all();
        self.polls.abort_all();
        self.reconnect = None;
        self.dialing = None;
        self.reader = None;
        self.connection.close();
        self.publish_snapshot();
        info!(
            component = "session",
            event = "session.teardown",
            session_id = %self.id,
            aborted_requests,
            aborted_polls,
            "Session torn down"
        );
        SessionExit {
            aborted_requests,
            aborted_polls,
        }
    }

    // -- Publishing ----------------------------------------------------------

    fn emit(&self, event: ConsoleEvent) {
        if self.events.send(event).is_err() {
            debug!(
                component = "session",
                event = "session.emit.no_listener",
                session_id = %self.id,
                "Console event dropped, no listener"
            );
        }
    }

    fn publish_snapshot(&mut self) {
        self.snapshot.store(Arc::new(SessionSnapshot {
            id: self.id.clone(),
            connection: self.connection.state(),
            reconnect_attempt: self.connection.attempt(),
            agents: self.state.board.slots().to_vec(),
            bound_project: self.guidance.bound_project().map(str::to_string),
            start_enabled: self.state.start_enabled() && !self.starting_run,
            view: self.view,
            recent_activity: self.state.activity.latest(SNAPSHOT_ACTIVITY),
            pending_requests: self.requests.len(),
            pending_polls: self.polls.len(),
            delete_pending: self.pending_delete.as_ref().map(|p| p.id().to_string()),
        }));
    }
}

fn empty_snapshot(id: String) -> SessionSnapshot {
    SessionSnapshot {
        id,
        connection: ConnectionState::Closed,
        reconnect_attempt: 0,
        agents: Vec::new(),
        bound_project: None,
        start_enabled: true,
        view: View::Console,
        recent_activity: Vec::new(),
        pending_requests: 0,
        pending_polls: 0,
        delete_pending: None,
    }
}

fn format_delay(delay: Duration) -> String {
    if delay.as_millis() % 1_000 == 0 {
        format!("{}s", delay.as_secs())
    } else {
        format!("{}ms", delay.as_millis())
    }
}

async fn wait_dial(dialing: &mut Option<DialFuture>) -> Result<WsStream, ConnectionError> {
    match dialing.as_mut() {
        Some(dial) => dial.await,
        None => std::future::pending().await,
    }
}

async fn next_frame(
    reader: &mut Option<FrameReader>,
) -> Option<Result<Message, tungstenite::Error>> {
    match reader.as_mut() {
        Some(reader) => reader.next().await,
        None => std::future::pending().await,
    }
}

async fn wait_timer(timer: &mut Option<Pin<Box<Sleep>>>) {
    match timer.as_mut() {
        Some(sleep) => sleep.as_mut().await,
        None => std::future::pending().await,
    }
}
