//! In-memory [`RemoteTransport`] for orchestrator tests.

#![allow(dead_code)]

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use memo_core::remote::{RemoteEntry, RemoteError, RemoteResult, RemoteTransport};
use memo_core::{Note, NoteId};
use tokio::sync::Notify;

pub const MONDAY_2024_W01: i64 = 1_704_067_200_000;
pub const MONDAY_2024_W02: i64 = MONDAY_2024_W01 + 7 * 24 * 60 * 60 * 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    Mkcol,
    List,
    Get,
    Put,
    Delete,
}

#[derive(Default)]
pub struct FakeRemote {
    files: Mutex<BTreeMap<String, Vec<u8>>>,
    collections: Mutex<BTreeSet<String>>,
    failures: Mutex<HashMap<(Op, String), u16>>,
    puts: AtomicUsize,
    deletes: AtomicUsize,
    list_gate: Option<Arc<Notify>>,
}

impl FakeRemote {
    pub fn new() -> Self {
        Self::default()
    }

    /// Block every listing until `gate` is notified.
    pub fn with_list_gate(mut self, gate: Arc<Notify>) -> Self {
        self.list_gate = Some(gate);
        self
    }

    pub fn insert_text(&self, path: &str, body: &str) {
        self.insert_bytes(path, body.as_bytes().to_vec());
    }

    pub fn insert_bytes(&self, path: &str, bytes: Vec<u8>) {
        self.files.lock().unwrap().insert(path.to_string(), bytes);
    }

    pub fn insert_shard(&self, path: &str, notes: &[Note]) {
        self.insert_text(path, &serde_json::to_string(notes).unwrap());
    }

    pub fn file(&self, path: &str) -> Option<Vec<u8>> {
        self.files.lock().unwrap().get(path).cloned()
    }

    pub fn shard(&self, path: &str) -> Option<Vec<Note>> {
        self.file(path)
            .map(|bytes| serde_json::from_slice(&bytes).unwrap())
    }

    pub fn shard_note(&self, path: &str, id: &str) -> Option<Note> {
        let id = NoteId::from(id);
        self.shard(path)?.into_iter().find(|note| note.id == id)
    }

    pub fn has_collection(&self, path: &str) -> bool {
        self.collections.lock().unwrap().contains(path)
    }

    /// Make `op` on `path` fail with an HTTP-like status.
    pub fn fail(&self, op: Op, path: &str, status: u16) {
        self.failures
            .lock()
            .unwrap()
            .insert((op, path.to_string()), status);
    }

    pub fn heal(&self, op: Op, path: &str) {
        self.failures.lock().unwrap().remove(&(op, path.to_string()));
    }

    pub fn puts(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }

    pub fn deletes(&self) -> usize {
        self.deletes.load(Ordering::SeqCst)
    }

    fn check(&self, op: Op, path: &str) -> RemoteResult<()> {
        let Some(status) = self
            .failures
            .lock()
            .unwrap()
            .get(&(op, path.to_string()))
            .copied()
        else {
            return Ok(());
        };

        let method = format!("{op:?}").to_uppercase();
        let path = path.to_string();
        Err(match status {
            401 => RemoteError::Authentication { path },
            500..=599 => RemoteError::Server {
                method,
                path,
                status,
            },
            _ => RemoteError::Status {
                method,
                path,
                status,
            },
        })
    }

    fn not_found(op: Op, path: &str) -> RemoteError {
        RemoteError::Status {
            method: format!("{op:?}").to_uppercase(),
            path: path.to_string(),
            status: 404,
        }
    }
}

#[async_trait]
impl RemoteTransport for FakeRemote {
    async fn exists(&self, path: &str) -> bool {
        self.files.lock().unwrap().contains_key(path) || self.has_collection(path)
    }

    async fn ensure_collection(&self, path: &str) -> RemoteResult<()> {
        self.check(Op::Mkcol, path)?;
        self.collections.lock().unwrap().insert(path.to_string());
        Ok(())
    }

    async fn list_entries(&self, path: &str) -> RemoteResult<Vec<RemoteEntry>> {
        if let Some(gate) = &self.list_gate {
            gate.notified().await;
        }
        self.check(Op::List, path)?;

        let prefix = format!("{}/", path.trim_end_matches('/'));
        let files = self.files.lock().unwrap();
        Ok(files
            .iter()
            .filter_map(|(file, bytes)| {
                let name = file.strip_prefix(&prefix)?;
                (!name.contains('/')).then(|| RemoteEntry {
                    name: name.to_string(),
                    path: format!("/{file}"),
                    is_collection: false,
                    last_modified: None,
                    size: bytes.len() as u64,
                })
            })
            .collect())
    }

    async fn get_text(&self, path: &str) -> RemoteResult<String> {
        let bytes = self.get_binary(path).await?;
        String::from_utf8(bytes).map_err(|_| RemoteError::InvalidResponse {
            path: path.to_string(),
            message: "not UTF-8".to_string(),
        })
    }

    async fn put_text(&self, path: &str, body: &str) -> RemoteResult<()> {
        self.put_binary(path, body.as_bytes()).await
    }

    async fn get_binary(&self, path: &str) -> RemoteResult<Vec<u8>> {
        self.check(Op::Get, path)?;
        self.file(path).ok_or_else(|| Self::not_found(Op::Get, path))
    }

    async fn put_binary(&self, path: &str, body: &[u8]) -> RemoteResult<()> {
        self.check(Op::Put, path)?;
        self.puts.fetch_add(1, Ordering::SeqCst);
        self.insert_bytes(path, body.to_vec());
        Ok(())
    }

    async fn delete(&self, path: &str) -> RemoteResult<()> {
        self.check(Op::Delete, path)?;
        self.deletes.fetch_add(1, Ordering::SeqCst);
        self.files.lock().unwrap().remove(path);
        Ok(())
    }
}

pub fn note_at(id: &str, content: &str, timestamp: i64, updated_at: i64) -> Note {
    let mut note = Note::new(content);
    note.id = NoteId::from(id);
    note.timestamp = timestamp;
    note.created_at = None;
    note.updated_at = Some(updated_at);
    note
}
