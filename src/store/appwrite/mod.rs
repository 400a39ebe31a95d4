pub mod model;

use std::sync::mpsc::{Receiver, Sender, TryRecvError, channel};
use std::thread;

use anyhow::{Context, Result, anyhow};
use reqwest::Method;

use super::{Outcome, Readiness, StoreEvent, TaskStore};
use crate::domain::task::{Task, TaskId};
use model::{CompletedField, CreateDocument, Document, DocumentList, TaskFields, UpdateCompleted};

#[derive(Debug, Clone)]
pub struct AppwriteConfig {
    /// API base, e.g. `https://fra.cloud.appwrite.io/v1`.
    pub endpoint: String,
    pub project: String,
    pub database_id: String,
    pub collection_id: String,
    pub api_key: Option<String>,
}

enum Command {
    List,
    Create { text: String },
    Update { id: TaskId, completed: bool },
    Delete { id: TaskId },
}

enum Event {
    Loaded(Vec<Task>),
    LoadFailed(String),
    Created(Task),
    Updated(Task),
    Deleted(TaskId),
    Failed(String),
}

/// Remote store over a document collection. One worker thread owns the HTTP
/// client and performs one request per command; the cache on this side holds
/// confirmed state only, so a failed round trip changes nothing.
pub struct AppwriteStore {
    commands: Sender<Command>,
    events: Receiver<Event>,
    cache: Vec<Task>,
    readiness: Readiness,
}

impl AppwriteStore {
    /// Spawns the worker thread and enqueues the initial collection fetch.
    pub fn connect(config: AppwriteConfig) -> Result<Self> {
        let (cmd_tx, cmd_rx) = channel();
        let (evt_tx, evt_rx) = channel();
        thread::Builder::new()
            .name("appwrite-worker".into())
            .spawn(move || worker(config, cmd_rx, evt_tx))
            .context("failed to spawn backend worker")?;
        cmd_tx
            .send(Command::List)
            .map_err(|_| anyhow!("backend worker exited before the initial fetch"))?;
        Ok(Self {
            commands: cmd_tx,
            events: evt_rx,
            cache: Vec::new(),
            readiness: Readiness::Loading,
        })
    }

    fn send(&self, cmd: Command) -> Result<()> {
        self.commands
            .send(cmd)
            .map_err(|_| anyhow!("backend worker is gone"))
    }

    /// Sole place the cache changes: after the backend confirmed the round
    /// trip.
    fn apply(&mut self, event: Event) -> StoreEvent {
        match event {
            Event::Loaded(tasks) => {
                let count = tasks.len();
                self.cache = tasks;
                self.readiness = Readiness::Ready;
                StoreEvent::Loaded(count)
            }
            Event::LoadFailed(err) => {
                self.readiness = Readiness::Failed;
                StoreEvent::LoadFailed(err)
            }
            Event::Created(task) => {
                self.cache.push(task.clone());
                StoreEvent::Added(task)
            }
            Event::Updated(task) => {
                if let Some(slot) = self.cache.iter_mut().find(|t| t.id == task.id) {
                    *slot = task.clone();
                }
                StoreEvent::Toggled(task)
            }
            Event::Deleted(id) => {
                self.cache.retain(|t| t.id != id);
                StoreEvent::Deleted(id)
            }
            Event::Failed(err) => StoreEvent::Failed(err),
        }
    }
}

impl TaskStore for AppwriteStore {
    fn readiness(&self) -> Readiness {
        self.readiness
    }

    fn tasks(&self) -> Vec<Task> {
        self.cache.clone()
    }

    fn add(&mut self, text: &str) -> Result<Outcome> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(Outcome::Rejected);
        }
        self.send(Command::Create {
            text: text.to_owned(),
        })?;
        Ok(Outcome::Pending)
    }

    fn toggle(&mut self, id: &TaskId) -> Result<Outcome> {
        let Some(task) = self.cache.iter().find(|t| t.id == *id) else {
            return Ok(Outcome::NotFound);
        };
        self.send(Command::Update {
            id: id.clone(),
            completed: !task.completed,
        })?;
        Ok(Outcome::Pending)
    }

    fn delete(&mut self, id: &TaskId) -> Result<Outcome> {
        if !self.cache.iter().any(|t| t.id == *id) {
            return Ok(Outcome::NotFound);
        }
        self.send(Command::Delete { id: id.clone() })?;
        Ok(Outcome::Pending)
    }

    fn refresh(&mut self) -> Result<()> {
        self.send(Command::List)
    }

    fn poll(&mut self) -> Vec<StoreEvent> {
        let mut out = Vec::new();
        loop {
            match self.events.try_recv() {
                Ok(event) => out.push(self.apply(event)),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    if self.readiness == Readiness::Loading {
                        self.readiness = Readiness::Failed;
                        out.push(StoreEvent::LoadFailed("backend worker is gone".into()));
                    }
                    break;
                }
            }
        }
        out
    }
}

/// Worker loop: owns its own Tokio runtime, one request per command, result
/// reported back over the event channel.
fn worker(config: AppwriteConfig, commands: Receiver<Command>, events: Sender<Event>) {
    let rt = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(rt) => rt,
        Err(e) => {
            let _ = events.send(Event::LoadFailed(format!("failed to build tokio runtime: {e}")));
            return;
        }
    };
    let client = Client::new(config);

    while let Ok(cmd) = commands.recv() {
        let event = rt.block_on(run_command(&client, cmd));
        if events.send(event).is_err() {
            break; // store side dropped, nothing left to report to
        }
    }
}

async fn run_command(client: &Client, cmd: Command) -> Event {
    match cmd {
        Command::List => match client.list().await {
            Ok(tasks) => Event::Loaded(tasks),
            Err(e) => Event::LoadFailed(format!("{e:#}")),
        },
        Command::Create { text } => match client.create(&text).await {
            Ok(task) => Event::Created(task),
            Err(e) => Event::Failed(format!("add failed: {e:#}")),
        },
        Command::Update { id, completed } => match client.update(&id, completed).await {
            Ok(task) => Event::Updated(task),
            Err(e) => Event::Failed(format!("toggle failed: {e:#}")),
        },
        Command::Delete { id } => match client.delete(&id).await {
            Ok(()) => Event::Deleted(id),
            Err(e) => Event::Failed(format!("delete failed: {e:#}")),
        },
    }
}

struct Client {
    http: reqwest::Client,
    config: AppwriteConfig,
}

impl Client {
    fn new(config: AppwriteConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    fn documents_url(&self) -> String {
        format!(
            "{}/databases/{}/collections/{}/documents",
            self.config.endpoint.trim_end_matches('/'),
            self.config.database_id,
            self.config.collection_id
        )
    }

    fn document_url(&self, id: &TaskId) -> String {
        format!("{}/{id}", self.documents_url())
    }

    fn request(&self, method: Method, url: String) -> reqwest::RequestBuilder {
        let mut req = self
            .http
            .request(method, url)
            .header("X-Appwrite-Project", &self.config.project);
        if let Some(key) = &self.config.api_key {
            req = req.header("X-Appwrite-Key", key);
        }
        req
    }

    async fn list(&self) -> Result<Vec<Task>> {
        let resp = self
            .request(Method::GET, self.documents_url())
            .send()
            .await
            .context("list request failed")?;
        let resp = check_status(resp).await?;
        let list: DocumentList = resp.json().await.context("malformed list response")?;

        let mut tasks: Vec<Task> = list.documents.into_iter().map(Document::into_task).collect();
        // Stable: documents created within the same second keep API order.
        tasks.sort_by_key(|t| t.created_at_unix);
        Ok(tasks)
    }

    async fn create(&self, text: &str) -> Result<Task> {
        let body = CreateDocument {
            document_id: "unique()",
            data: TaskFields {
                text,
                completed: false,
            },
        };
        let resp = self
            .request(Method::POST, self.documents_url())
            .json(&body)
            .send()
            .await
            .context("create request failed")?;
        let resp = check_status(resp).await?;
        let doc: Document = resp.json().await.context("malformed create response")?;
        Ok(doc.into_task())
    }

    async fn update(&self, id: &TaskId, completed: bool) -> Result<Task> {
        let body = UpdateCompleted {
            data: CompletedField { completed },
        };
        let resp = self
            .request(Method::PATCH, self.document_url(id))
            .json(&body)
            .send()
            .await
            .context("update request failed")?;
        let resp = check_status(resp).await?;
        let doc: Document = resp.json().await.context("malformed update response")?;
        Ok(doc.into_task())
    }

    async fn delete(&self, id: &TaskId) -> Result<()> {
        let resp = self
            .request(Method::DELETE, self.document_url(id))
            .send()
            .await
            .context("delete request failed")?;
        check_status(resp).await?;
        Ok(())
    }
}

async fn check_status(resp: reqwest::Response) -> Result<reqwest::Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(anyhow!("backend returned {status}: {}", body.trim()))
}

#[cfg(test)]
mod tests {
    use super::*;

    // No worker: the returned receiver stands in for it so sends succeed,
    // and `apply` is driven by hand.
    fn store_with_cache(cache: Vec<Task>) -> (AppwriteStore, Receiver<Command>) {
        let (cmd_tx, cmd_rx) = channel();
        let (_evt_tx, evt_rx) = channel();
        let store = AppwriteStore {
            commands: cmd_tx,
            events: evt_rx,
            cache,
            readiness: Readiness::Ready,
        };
        (store, cmd_rx)
    }

    #[test]
    fn mutations_only_land_on_confirmation() {
        let task = Task::new("remote");
        let (mut store, _cmds) = store_with_cache(vec![task.clone()]);

        // Accepted but pending: the snapshot must not move yet.
        assert_eq!(store.toggle(&task.id).unwrap(), Outcome::Pending);
        assert!(!store.tasks()[0].completed);
        assert_eq!(store.delete(&task.id).unwrap(), Outcome::Pending);
        assert_eq!(store.tasks().len(), 1);

        // A failed round trip leaves the snapshot untouched.
        let event = store.apply(Event::Failed("toggle failed: 503".into()));
        assert_eq!(event, StoreEvent::Failed("toggle failed: 503".into()));
        assert!(!store.tasks()[0].completed);

        // Confirmation lands the change.
        let mut flipped = task.clone();
        flipped.completed = true;
        store.apply(Event::Updated(flipped));
        assert!(store.tasks()[0].completed);

        store.apply(Event::Deleted(task.id.clone()));
        assert!(store.tasks().is_empty());
    }

    #[test]
    fn unknown_ids_never_reach_the_wire() {
        let (mut store, cmds) = store_with_cache(Vec::new());
        let ghost = TaskId::generate();
        assert_eq!(store.toggle(&ghost).unwrap(), Outcome::NotFound);
        assert_eq!(store.delete(&ghost).unwrap(), Outcome::NotFound);
        assert!(cmds.try_recv().is_err());
    }

    #[test]
    fn empty_text_is_rejected_before_enqueueing() {
        let (mut store, cmds) = store_with_cache(Vec::new());
        assert_eq!(store.add("   ").unwrap(), Outcome::Rejected);
        assert!(cmds.try_recv().is_err());
    }

    #[test]
    fn initial_load_transitions_readiness() {
        let (mut store, _cmds) = store_with_cache(Vec::new());
        store.readiness = Readiness::Loading;

        let event = store.apply(Event::Loaded(vec![Task::new("fetched")]));
        assert_eq!(event, StoreEvent::Loaded(1));
        assert_eq!(store.readiness(), Readiness::Ready);
        assert_eq!(store.tasks().len(), 1);
    }

    #[test]
    fn failed_load_is_not_an_empty_list() {
        let (mut store, _cmds) = store_with_cache(Vec::new());
        store.readiness = Readiness::Loading;

        store.apply(Event::LoadFailed("timeout".into()));
        assert_eq!(store.readiness(), Readiness::Failed);
    }
}
