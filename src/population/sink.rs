use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{debug, warn};

use crate::graph::{LinkKind, NodeMeta, Profile};

#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("persistence writer is no longer running")]
    Disconnected,
}

/// Profile upsert, keyed by node id.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileRecord {
    pub id: String,
    pub level: u8,
    pub parent_id: Option<String>,
    pub group: String,
    #[serde(flatten)]
    pub profile: Profile,
}

impl ProfileRecord {
    pub fn new(meta: &NodeMeta, profile: &Profile) -> Self {
        Self {
            id: meta.id.clone(),
            level: meta.level,
            parent_id: meta.parent_id.clone(),
            group: meta.group.clone(),
            profile: profile.clone(),
        }
    }
}

/// Connection upsert, keyed by `<source>_<target>`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ConnectionRecord {
    pub source: String,
    pub target: String,
    #[serde(rename = "type")]
    pub kind: LinkKind,
}

impl ConnectionRecord {
    pub fn key(&self) -> String {
        format!("{}_{}", self.source, self.target)
    }
}

/// Best-effort destination for everything the pipeline discovers.
///
/// Callers log and drop errors; a failing sink never stops population.
pub trait PersistenceSink {
    fn upsert_profile(&self, record: ProfileRecord) -> Result<(), SinkError>;
    fn upsert_connection(&self, record: ConnectionRecord) -> Result<(), SinkError>;
}

pub struct NullSink;

impl PersistenceSink for NullSink {
    fn upsert_profile(&self, _record: ProfileRecord) -> Result<(), SinkError> {
        Ok(())
    }

    fn upsert_connection(&self, _record: ConnectionRecord) -> Result<(), SinkError> {
        Ok(())
    }
}

enum SinkMessage {
    Profile(ProfileRecord),
    Connection(ConnectionRecord),
}

/// Writes `profiles.json` and `connections.json` snapshots from a background thread.
///
/// Records are upserted into in-memory maps by key and the snapshot files are
/// rewritten whenever the channel drains, so sends never block the frame loop.
pub struct JsonSink {
    tx: Option<Sender<SinkMessage>>,
    worker: Option<JoinHandle<()>>,
}

impl JsonSink {
    pub fn spawn(dir: &Path) -> Result<Self> {
        fs::create_dir_all(dir)
            .with_context(|| format!("failed to create export directory {}", dir.display()))?;

        let (tx, rx) = mpsc::channel();
        let worker_dir = dir.to_owned();
        let worker = thread::Builder::new()
            .name("relgraph-sink".to_owned())
            .spawn(move || run_writer(&worker_dir, rx))
            .context("failed to spawn persistence writer thread")?;

        Ok(Self {
            tx: Some(tx),
            worker: Some(worker),
        })
    }

    /// Closes the channel and waits for the final snapshot to be written.
    pub fn shutdown(&mut self) {
        self.tx.take();
        if let Some(worker) = self.worker.take()
            && worker.join().is_err()
        {
            warn!("persistence writer thread panicked");
        }
    }

    fn send(&self, message: SinkMessage) -> Result<(), SinkError> {
        let tx = self.tx.as_ref().ok_or(SinkError::Disconnected)?;
        tx.send(message).map_err(|_| SinkError::Disconnected)
    }
}

impl Drop for JsonSink {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl PersistenceSink for JsonSink {
    fn upsert_profile(&self, record: ProfileRecord) -> Result<(), SinkError> {
        self.send(SinkMessage::Profile(record))
    }

    fn upsert_connection(&self, record: ConnectionRecord) -> Result<(), SinkError> {
        self.send(SinkMessage::Connection(record))
    }
}

#[derive(Default)]
struct Snapshot {
    profiles: BTreeMap<String, ProfileRecord>,
    connections: BTreeMap<String, ConnectionRecord>,
}

impl Snapshot {
    fn apply(&mut self, message: SinkMessage) {
        match message {
            SinkMessage::Profile(record) => {
                self.profiles.insert(record.id.clone(), record);
            }
            SinkMessage::Connection(record) => {
                self.connections.insert(record.key(), record);
            }
        }
    }
}

fn run_writer(dir: &Path, rx: Receiver<SinkMessage>) {
    let mut snapshot = Snapshot::default();

    while let Ok(message) = rx.recv() {
        snapshot.apply(message);
        while let Ok(message) = rx.try_recv() {
            snapshot.apply(message);
        }

        if let Err(error) = write_snapshot(dir, &snapshot) {
            warn!(%error, dir = %dir.display(), "failed to write persistence snapshot");
        }
    }

    debug!(
        profiles = snapshot.profiles.len(),
        connections = snapshot.connections.len(),
        "persistence writer stopped"
    );
}

fn write_snapshot(dir: &Path, snapshot: &Snapshot) -> io::Result<()> {
    write_json(&dir.join("profiles.json"), &snapshot.profiles)?;
    write_json(&dir.join("connections.json"), &snapshot.connections)
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> io::Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, value).map_err(io::Error::other)?;
    writer.flush()
}
