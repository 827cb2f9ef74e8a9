//! File-backed ticket store.
//!
//! Tickets live in memory as an ordered sequence and are mirrored to a
//! single JSON file (a top-level array of records). Every `create` rewrites
//! the whole file through a sibling temp file and a rename.
//!
//! Records that do not decode as tickets (edited by hand, written by an
//! older tool) are carried through rewrites untouched. They never show up
//! in listings, but their ids still count when numbering new tickets.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tokio::fs;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use super::model::{DEFAULT_PRIORITY, Ticket, TicketStatus, parse_id};
use crate::error::TicketError;

/// What `TicketStore::open` found on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// No backing file yet.
    Missing,
    /// File parsed; `count` tickets loaded, `skipped` records kept on disk
    /// but not decodable as tickets.
    Loaded { count: usize, skipped: usize },
    /// File existed but could not be read or was not a JSON array; started
    /// empty.
    Discarded { reason: String },
}

/// One record of the backing array.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
enum Entry {
    Ticket(Ticket),
    Unrecognized(serde_json::Value),
}

impl Entry {
    fn decode(value: serde_json::Value) -> Self {
        match serde_json::from_value::<Ticket>(value.clone()) {
            Ok(ticket) => Self::Ticket(ticket),
            Err(e) => {
                warn!(error = %e, record = %value, "Skipping ticket record that does not decode");
                Self::Unrecognized(value)
            }
        }
    }

    fn ticket(&self) -> Option<&Ticket> {
        match self {
            Self::Ticket(ticket) => Some(ticket),
            Self::Unrecognized(_) => None,
        }
    }

    fn number(&self) -> Option<u64> {
        match self {
            Self::Ticket(ticket) => ticket.number(),
            Self::Unrecognized(value) => value.get("id")?.as_str().and_then(parse_id),
        }
    }
}

struct Log {
    entries: Vec<Entry>,
    /// The file on disk failed to parse and must be moved aside before the
    /// first write replaces it.
    set_aside_pending: bool,
}

impl Log {
    fn tickets(&self) -> impl Iterator<Item = &Ticket> {
        self.entries.iter().filter_map(Entry::ticket)
    }

    fn next_number(&self) -> Result<u64, TicketError> {
        let last = self.entries.iter().filter_map(Entry::number).max().unwrap_or(0);
        last.checked_add(1).ok_or(TicketError::IdsExhausted { last })
    }
}

/// Ordered, durable log of incident tickets.
pub struct TicketStore {
    path: PathBuf,
    log: RwLock<Log>,
    outcome: LoadOutcome,
}

impl TicketStore {
    /// Open the store backed by `path`.
    ///
    /// Never fails: a missing file or one that does not hold a JSON array
    /// yields an empty store. The distinction is kept in
    /// [`TicketStore::load_outcome`].
    pub async fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let (log, outcome) = load(&path).await;

        match &outcome {
            LoadOutcome::Missing => {
                debug!(path = %path.display(), "No ticket log yet, starting empty")
            }
            LoadOutcome::Loaded { count, skipped: 0 } => {
                info!(path = %path.display(), count, "Loaded ticket log")
            }
            LoadOutcome::Loaded { count, skipped } => warn!(
                path = %path.display(),
                count,
                skipped,
                "Loaded ticket log with records that are not tickets"
            ),
            LoadOutcome::Discarded { reason } => warn!(
                path = %path.display(),
                reason = %reason,
                "Ticket log unreadable, starting with an empty store"
            ),
        }

        Self {
            path,
            log: RwLock::new(log),
            outcome,
        }
    }

    /// Path of the backing JSON file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// How the backing file was handled at open time.
    pub fn load_outcome(&self) -> &LoadOutcome {
        &self.outcome
    }

    /// Create a ticket and persist the full log.
    ///
    /// `priority` defaults to `P2`. Inputs are stored as given. If the file
    /// write fails the ticket is dropped from memory and the error returned.
    /// A log that failed to parse at open time is renamed to
    /// `<file>.corrupt` before it is replaced.
    pub async fn create(
        &self,
        service: &str,
        summary: &str,
        priority: Option<&str>,
    ) -> Result<Ticket, TicketError> {
        let mut log = self.log.write().await;

        let ticket = Ticket::new(
            log.next_number()?,
            service,
            summary,
            priority.unwrap_or(DEFAULT_PRIORITY),
        );

        if log.set_aside_pending {
            set_aside(&self.path).await?;
            log.set_aside_pending = false;
        }

        log.entries.push(Entry::Ticket(ticket.clone()));
        if let Err(e) = persist(&self.path, &log.entries).await {
            log.entries.pop();
            return Err(e);
        }

        info!(
            ticket_id = %ticket.id,
            service = %ticket.service,
            priority = %ticket.priority,
            "Ticket created"
        );
        Ok(ticket)
    }

    /// List tickets with the given status, in creation order.
    ///
    /// `status` is matched case-insensitively and must be `OPEN` or `CLOSED`.
    pub async fn list(&self, status: &str) -> Result<Vec<Ticket>, TicketError> {
        let status: TicketStatus = status.parse()?;
        Ok(self.list_status(status).await)
    }

    /// List open tickets.
    pub async fn list_open(&self) -> Vec<Ticket> {
        self.list_status(TicketStatus::Open).await
    }

    async fn list_status(&self, status: TicketStatus) -> Vec<Ticket> {
        self.log
            .read()
            .await
            .tickets()
            .filter(|t| t.status == status)
            .cloned()
            .collect()
    }

    /// Snapshot of every ticket, in creation order.
    pub async fn all(&self) -> Vec<Ticket> {
        self.log.read().await.tickets().cloned().collect()
    }

    pub async fn len(&self) -> usize {
        self.log.read().await.tickets().count()
    }

    pub async fn is_empty(&self) -> bool {
        self.log.read().await.tickets().next().is_none()
    }
}

async fn load(path: &Path) -> (Log, LoadOutcome) {
    let empty = |set_aside_pending| Log {
        entries: Vec::new(),
        set_aside_pending,
    };

    let raw = match fs::read_to_string(path).await {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return (empty(false), LoadOutcome::Missing);
        }
        Err(e) => {
            return (
                empty(false),
                LoadOutcome::Discarded {
                    reason: e.to_string(),
                },
            );
        }
    };

    let records = match serde_json::from_str::<Vec<serde_json::Value>>(&raw) {
        Ok(records) => records,
        Err(e) => {
            return (
                empty(true),
                LoadOutcome::Discarded {
                    reason: e.to_string(),
                },
            );
        }
    };

    let entries: Vec<Entry> = records.into_iter().map(Entry::decode).collect();
    let count = entries.iter().filter(|e| e.ticket().is_some()).count();
    let outcome = LoadOutcome::Loaded {
        count,
        skipped: entries.len() - count,
    };
    (
        Log {
            entries,
            set_aside_pending: false,
        },
        outcome,
    )
}

fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}

/// Move an unparseable log out of the way so the next write cannot lose it.
async fn set_aside(path: &Path) -> Result<(), TicketError> {
    let target = sibling(path, ".corrupt");
    match fs::rename(path, &target).await {
        Ok(()) => {
            warn!(
                path = %path.display(),
                moved_to = %target.display(),
                "Moved unreadable ticket log aside"
            );
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(source) => Err(TicketError::Write {
            path: path.display().to_string(),
            source,
        }),
    }
}

/// Serialize the whole log and replace the backing file.
async fn persist(path: &Path, entries: &[Entry]) -> Result<(), TicketError> {
    let write_err = |source| TicketError::Write {
        path: path.display().to_string(),
        source,
    };

    let mut body = serde_json::to_vec_pretty(entries)?;
    body.push(b'\n');

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).await.map_err(write_err)?;
    }

    let tmp = sibling(path, ".tmp");
    fs::write(&tmp, &body).await.map_err(write_err)?;
    if let Err(e) = fs::rename(&tmp, path).await {
        if let Err(cleanup) = fs::remove_file(&tmp).await {
            debug!(path = %tmp.display(), error = %cleanup, "Could not remove temp file");
        }
        return Err(write_err(e));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn log_path(dir: &TempDir) -> PathBuf {
        dir.path().join("data").join("tickets.json")
    }

    #[tokio::test]
    async fn open_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let store = TicketStore::open(log_path(&dir)).await;
        assert!(store.is_empty().await);
        assert_eq!(store.load_outcome(), &LoadOutcome::Missing);
    }

    #[tokio::test]
    async fn open_invalid_json_is_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tickets.json");
        std::fs::write(&path, "{ not json").unwrap();

        let store = TicketStore::open(&path).await;
        assert!(store.is_empty().await);
        assert!(matches!(store.load_outcome(), LoadOutcome::Discarded { .. }));
    }

    #[tokio::test]
    async fn open_non_array_json_is_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tickets.json");
        std::fs::write(&path, r#"{"id": "T-0001"}"#).unwrap();

        let store = TicketStore::open(&path).await;
        assert!(store.is_empty().await);
        assert!(matches!(store.load_outcome(), LoadOutcome::Discarded { .. }));
    }

    #[tokio::test]
    async fn ids_are_sequential() {
        let dir = TempDir::new().unwrap();
        let store = TicketStore::open(log_path(&dir)).await;

        let mut ids = Vec::new();
        for i in 0..12 {
            let t = store
                .create("svc", &format!("incident {i}"), None)
                .await
                .unwrap();
            ids.push(t.id);
        }

        let expected: Vec<String> = (1..=12).map(|n| format!("T-{n:04}")).collect();
        assert_eq!(ids, expected);
    }

    #[tokio::test]
    async fn create_defaults_priority_and_status() {
        let dir = TempDir::new().unwrap();
        let store = TicketStore::open(log_path(&dir)).await;

        let t = store.create("payments", "Latency", None).await.unwrap();
        assert_eq!(t.priority, "P2");
        assert_eq!(t.status, TicketStatus::Open);

        let t = store.create("", "", Some("P9")).await.unwrap();
        assert_eq!(t.priority, "P9");
        assert_eq!(t.service, "");
    }

    #[tokio::test]
    async fn list_open_returns_all_in_order() {
        let dir = TempDir::new().unwrap();
        let store = TicketStore::open(log_path(&dir)).await;
        for i in 0..3 {
            store.create("svc", &format!("s{i}"), None).await.unwrap();
        }

        let open = store.list("OPEN").await.unwrap();
        assert_eq!(open.len(), 3);
        assert!(open.iter().all(|t| t.status == TicketStatus::Open));
        let summaries: Vec<&str> = open.iter().map(|t| t.summary.as_str()).collect();
        assert_eq!(summaries, vec!["s0", "s1", "s2"]);
    }

    #[tokio::test]
    async fn list_status_is_case_insensitive() {
        let dir = TempDir::new().unwrap();
        let store = TicketStore::open(log_path(&dir)).await;
        store.create("svc", "one", None).await.unwrap();

        let a = store.list("closed").await.unwrap();
        let b = store.list("CLOSED").await.unwrap();
        let c = store.list("Closed").await.unwrap();
        assert!(a.is_empty());
        assert_eq!(a, b);
        assert_eq!(b, c);
        assert_eq!(store.list("open").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn list_rejects_unknown_status() {
        let dir = TempDir::new().unwrap();
        let store = TicketStore::open(log_path(&dir)).await;
        let err = store.list("bogus").await.unwrap_err();
        assert!(matches!(err, TicketError::InvalidStatus { .. }));
    }

    #[tokio::test]
    async fn reopen_reproduces_sequence() {
        let dir = TempDir::new().unwrap();
        let path = log_path(&dir);

        let store = TicketStore::open(&path).await;
        store.create("payments", "Latency", Some("P1")).await.unwrap();
        store.create("search", "Índice caído ✓", None).await.unwrap();
        let before = store.all().await;

        let reopened = TicketStore::open(&path).await;
        assert_eq!(reopened.load_outcome(), &LoadOutcome::Loaded { count: 2, skipped: 0 });
        assert_eq!(reopened.all().await, before);
    }

    #[tokio::test]
    async fn file_is_pretty_array_with_unescaped_text() {
        let dir = TempDir::new().unwrap();
        let path = log_path(&dir);
        let store = TicketStore::open(&path).await;
        store.create("search", "Índice caído", None).await.unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.starts_with("[\n  {\n    \"id\": \"T-0001\""));
        assert!(raw.contains("Índice caído"));

        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        let record = value.as_array().unwrap()[0].as_object().unwrap();
        assert_eq!(record.len(), 6);
        assert!(!dir.path().join("data").join("tickets.json.tmp").exists());
    }

    #[tokio::test]
    async fn closed_tickets_from_disk_are_listed() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tickets.json");
        std::fs::write(
            &path,
            r#"[
  {"id": "T-0001", "service": "db", "summary": "old", "priority": "P2",
   "created_at": "2025-01-01T00:00:00+00:00", "status": "CLOSED"},
  {"id": "T-0002", "service": "db", "summary": "new", "priority": "P1",
   "created_at": "2025-01-02T00:00:00+00:00", "status": "OPEN"}
]"#,
        )
        .unwrap();

        let store = TicketStore::open(&path).await;
        let closed = store.list("closed").await.unwrap();
        assert_eq!(closed.len(), 1);
        assert_eq!(closed[0].id, "T-0001");
        assert_eq!(store.list_open().await[0].id, "T-0002");
    }

    #[tokio::test]
    async fn next_id_follows_highest_existing_number() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tickets.json");
        std::fs::write(
            &path,
            r#"[
  {"id": "T-0001", "service": "a", "summary": "x", "priority": "P2",
   "created_at": "2025-01-01T00:00:00Z", "status": "OPEN"},
  {"id": "T-0005", "service": "b", "summary": "y", "priority": "P2",
   "created_at": "2025-01-01T00:00:00Z", "status": "OPEN"}
]"#,
        )
        .unwrap();

        let store = TicketStore::open(&path).await;
        let t = store.create("c", "z", None).await.unwrap();
        assert_eq!(t.id, "T-0006");
    }

    #[tokio::test]
    async fn failed_write_leaves_memory_unchanged() {
        let dir = TempDir::new().unwrap();
        // A directory where the log file should be makes the rename fail.
        let path = dir.path().join("tickets.json");
        std::fs::create_dir_all(path.join("occupied")).unwrap();

        let store = TicketStore::open(&path).await;
        let err = store.create("svc", "boom", None).await.unwrap_err();
        assert!(matches!(err, TicketError::Write { .. }));
        assert!(store.is_empty().await);
        assert!(!dir.path().join("tickets.json.tmp").exists());
        assert!(path.join("occupied").exists());
    }

    const MIXED_LOG: &str = r#"[
  {"id": "T-0001", "service": "payments", "summary": "Latency", "priority": "P1",
   "created_at": "2025-01-01T00:00:00Z", "status": "OPEN"},
  {"id": "T-0002", "service": "db", "summary": "hand edited", "priority": "P2",
   "created_at": "2025-01-02T00:00:00Z", "status": "closed"}
]"#;

    #[tokio::test]
    async fn bad_record_does_not_discard_the_log() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tickets.json");
        std::fs::write(&path, MIXED_LOG).unwrap();

        let store = TicketStore::open(&path).await;
        assert_eq!(
            store.load_outcome(),
            &LoadOutcome::Loaded {
                count: 1,
                skipped: 1
            }
        );
        assert_eq!(store.len().await, 1);
        assert_eq!(store.list_open().await[0].id, "T-0001");
        assert!(store.list("CLOSED").await.unwrap().is_empty());

        // The undecodable record keeps its id and survives the rewrite.
        let t = store.create("search", "stale index", None).await.unwrap();
        assert_eq!(t.id, "T-0003");

        let raw = std::fs::read_to_string(&path).unwrap();
        let records: Vec<serde_json::Value> = serde_json::from_str(&raw).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[1]["status"], "closed");
        assert_eq!(records[1]["summary"], "hand edited");
        assert_eq!(records[2]["id"], "T-0003");
    }

    #[tokio::test]
    async fn unparseable_log_is_moved_aside_on_first_write() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tickets.json");
        let truncated = r#"[{"id": "T-0001", "service": "payments","#;
        std::fs::write(&path, truncated).unwrap();

        let store = TicketStore::open(&path).await;
        assert!(matches!(store.load_outcome(), LoadOutcome::Discarded { .. }));
        // Nothing is touched until a write happens.
        assert_eq!(std::fs::read_to_string(&path).unwrap(), truncated);

        store.create("payments", "retry", None).await.unwrap();
        let saved = dir.path().join("tickets.json.corrupt");
        assert_eq!(std::fs::read_to_string(&saved).unwrap(), truncated);

        store.create("payments", "again", None).await.unwrap();
        assert_eq!(std::fs::read_to_string(&saved).unwrap(), truncated);
        let raw = std::fs::read_to_string(&path).unwrap();
        let records: Vec<serde_json::Value> = serde_json::from_str(&raw).unwrap();
        assert_eq!(records.len(), 2);
    }

    #[tokio::test]
    async fn exhausted_id_space_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tickets.json");
        let log = format!(
            r#"[{{"id": "T-{}", "service": "a", "summary": "x", "priority": "P2",
   "created_at": "2025-01-01T00:00:00Z", "status": "OPEN"}}]"#,
            u64::MAX
        );
        std::fs::write(&path, &log).unwrap();

        let store = TicketStore::open(&path).await;
        let err = store.create("b", "y", None).await.unwrap_err();
        assert!(matches!(err, TicketError::IdsExhausted { last } if last == u64::MAX));
        assert_eq!(store.len().await, 1);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), log);
    }
}
