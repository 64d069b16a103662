//! Document store for taskboard
//!
//! All collections live in memory behind one lock. With a data directory the
//! store persists every collection as JSONL after each committed write
//! section. A write section is the transaction boundary: it runs against a
//! staged copy that replaces the live collections only once it has been
//! saved, so a failed section or a failed save leaves them as they were.

use crate::audit::{Actor, AuditEvent, Log};
use crate::id::{LOG_PREFIX, generate_id};
use crate::limits::OrgLimit;
use crate::model::{Board, Card, List};
use crate::ordering::Placement;
use crate::subscription::OrgSubscription;
use crate::Result;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

const BOARDS_FILE: &str = "boards.jsonl";
const LISTS_FILE: &str = "lists.jsonl";
const CARDS_FILE: &str = "cards.jsonl";
const LOGS_FILE: &str = "logs.jsonl";
const ORG_LIMITS_FILE: &str = "org_limits.jsonl";
const SUBSCRIPTIONS_FILE: &str = "org_subscriptions.jsonl";

/// Every collection, keyed by document ID (or organization ID for the
/// per-organization aggregates)
#[derive(Debug, Default, Clone)]
pub struct Collections {
    pub boards: HashMap<String, Board>,
    pub lists: HashMap<String, List>,
    pub cards: HashMap<String, Card>,
    /// Append-only, in insertion order
    pub logs: Vec<Log>,
    pub org_limits: HashMap<String, OrgLimit>,
    pub subscriptions: HashMap<String, OrgSubscription>,
}

impl Collections {
    /// Generate an ID that no document in the collection uses yet
    pub fn fresh_id(&self, prefix: &str, taken: impl Fn(&Self, &str) -> bool) -> String {
        loop {
            let id = generate_id(prefix);
            if !taken(self, &id) {
                return id;
            }
        }
    }

    /// Lists of a board, sorted by order
    pub fn lists_of(&self, board_id: &str) -> Vec<List> {
        let mut lists: Vec<List> = self
            .lists
            .values()
            .filter(|l| l.board_id == board_id)
            .cloned()
            .collect();
        lists.sort_by_key(|l| l.order);
        lists
    }

    /// Cards of a list, sorted by order
    pub fn cards_of(&self, list_id: &str) -> Vec<Card> {
        let mut cards: Vec<Card> = self
            .cards
            .values()
            .filter(|c| c.list_id == list_id)
            .cloned()
            .collect();
        cards.sort_by_key(|c| c.order);
        cards
    }

    /// Organization owning a list, through its board
    pub fn org_of_list(&self, list: &List) -> Option<&str> {
        self.boards
            .get(&list.board_id)
            .map(|b| b.organization_id.as_str())
    }

    /// Bulk write of list orders
    pub fn apply_list_placements(&mut self, placements: &[Placement]) {
        for placement in placements {
            if let Some(list) = self.lists.get_mut(&placement.id) {
                list.set_order(placement.order);
            }
        }
    }

    /// Bulk write of card orders
    pub fn apply_card_placements(&mut self, placements: &[Placement]) {
        for placement in placements {
            if let Some(card) = self.cards.get_mut(&placement.id) {
                card.set_order(placement.order);
            }
        }
    }

    /// Delete every card of a list, returning how many were removed
    pub fn remove_cards_of(&mut self, list_id: &str) -> usize {
        let before = self.cards.len();
        self.cards.retain(|_, c| c.list_id != list_id);
        before - self.cards.len()
    }

    /// Append an audit entry for `actor`
    pub fn append_log(&mut self, actor: &Actor, event: AuditEvent) -> &Log {
        let id = self.fresh_id(LOG_PREFIX, |db, id| db.logs.iter().any(|l| l.id == id));
        self.logs.push(Log::new(
            id,
            event.action,
            event.organization_id,
            event.entity,
            actor.clone(),
        ));
        let log = &self.logs[self.logs.len() - 1];
        tracing::debug!("{} {}", log.user.id, log.summary());
        log
    }
}

/// Lock-guarded collections with optional JSONL persistence
pub struct Store {
    root: Option<PathBuf>,
    data: RwLock<Collections>,
}

impl Store {
    /// Store without persistence
    pub fn in_memory() -> Self {
        Self {
            root: None,
            data: RwLock::new(Collections::default()),
        }
    }

    /// Open (or create) a store persisted under `root`
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;

        let boards: Vec<Board> = load_jsonl(&root.join(BOARDS_FILE))?;
        let lists: Vec<List> = load_jsonl(&root.join(LISTS_FILE))?;
        let cards: Vec<Card> = load_jsonl(&root.join(CARDS_FILE))?;
        let mut logs: Vec<Log> = load_jsonl(&root.join(LOGS_FILE))?;
        let limits: Vec<OrgLimit> = load_jsonl(&root.join(ORG_LIMITS_FILE))?;
        let subscriptions: Vec<OrgSubscription> = load_jsonl(&root.join(SUBSCRIPTIONS_FILE))?;
        logs.sort_by_key(|l| l.created_at);

        let data = Collections {
            boards: boards.into_iter().map(|b| (b.id.clone(), b)).collect(),
            lists: lists.into_iter().map(|l| (l.id.clone(), l)).collect(),
            cards: cards.into_iter().map(|c| (c.id.clone(), c)).collect(),
            logs,
            org_limits: limits
                .into_iter()
                .map(|l| (l.organization_id.clone(), l))
                .collect(),
            subscriptions: subscriptions
                .into_iter()
                .map(|s| (s.organization_id.clone(), s))
                .collect(),
        };

        tracing::info!(
            "Opened store at {} ({} boards, {} lists, {} cards)",
            root.display(),
            data.boards.len(),
            data.lists.len(),
            data.cards.len()
        );

        Ok(Self {
            root: Some(root),
            data: RwLock::new(data),
        })
    }

    /// Directory the store persists to, if any
    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    /// Run a read-only query
    pub fn read<R>(&self, f: impl FnOnce(&Collections) -> R) -> R {
        let guard = self.data.read().unwrap_or_else(PoisonError::into_inner);
        f(&guard)
    }

    /// Run a write section and commit it once it is persisted
    ///
    /// The closure works on a staged copy. Its changes become visible only
    /// when it returns `Ok` and the copy reached disk.
    pub fn write<R>(&self, f: impl FnOnce(&mut Collections) -> Result<R>) -> Result<R> {
        let mut guard = self.data.write().unwrap_or_else(PoisonError::into_inner);
        let mut staged = guard.clone();
        let result = f(&mut staged)?;
        if let Err(e) = self.save(&staged) {
            tracing::error!("Failed to persist store: {}", e);
            return Err(e);
        }
        *guard = staged;
        Ok(result)
    }

    fn save(&self, data: &Collections) -> Result<()> {
        let Some(root) = &self.root else {
            return Ok(());
        };

        save_jsonl(&root.join(BOARDS_FILE), data.boards.values())?;
        save_jsonl(&root.join(LISTS_FILE), data.lists.values())?;
        save_jsonl(&root.join(CARDS_FILE), data.cards.values())?;
        save_jsonl(&root.join(LOGS_FILE), data.logs.iter())?;
        save_jsonl(&root.join(ORG_LIMITS_FILE), data.org_limits.values())?;
        save_jsonl(&root.join(SUBSCRIPTIONS_FILE), data.subscriptions.values())?;
        Ok(())
    }
}

/// Load all documents from a JSONL file
fn load_jsonl<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let mut docs = Vec::new();

    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        docs.push(serde_json::from_str(&line)?);
    }

    Ok(docs)
}

/// Write documents to a JSONL file, replacing it atomically
fn save_jsonl<'a, T, I>(path: &Path, docs: I) -> Result<()>
where
    T: Serialize + 'a,
    I: Iterator<Item = &'a T>,
{
    let tmp = path.with_extension("jsonl.tmp");
    {
        let file = File::create(&tmp)?;
        let mut writer = BufWriter::new(file);

        for doc in docs {
            serde_json::to_writer(&mut writer, doc)?;
            writeln!(writer)?;
        }

        writer.flush()?;
    }
    fs::rename(&tmp, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use crate::audit::{Action, Entity, EntityType};
    use crate::model::BoardImage;

    fn board(id: &str) -> Board {
        Board::new(
            id.to_string(),
            "org_1".to_string(),
            "Roadmap".to_string(),
            BoardImage::default(),
        )
    }

    #[test]
    fn test_failed_write_is_not_persisted() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(dir.path()).unwrap();

        let result: Result<()> = store.write(|_| Err(Error::bad_request("nope")));
        assert!(result.is_err());
        assert!(!dir.path().join(BOARDS_FILE).exists());
    }

    #[test]
    fn test_failed_section_leaves_memory_untouched() {
        let store = Store::in_memory();
        let result: Result<()> = store.write(|db| {
            db.boards.insert("board-1".into(), board("board-1"));
            Err(Error::bad_request("nope"))
        });
        assert!(result.is_err());
        assert_eq!(store.read(|db| db.boards.len()), 0);
    }

    #[test]
    fn test_failed_save_is_not_committed() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(dir.path()).unwrap();
        store
            .write(|db| {
                db.boards.insert("board-1".into(), board("board-1"));
                Ok(())
            })
            .unwrap();

        // A directory in place of the temp file makes the next save fail
        fs::create_dir(dir.path().join("boards.jsonl.tmp")).unwrap();
        let result = store.write(|db| {
            db.boards.insert("board-2".into(), board("board-2"));
            Ok(())
        });
        assert!(matches!(result, Err(Error::Io(_))));
        assert!(store.read(|db| !db.boards.contains_key("board-2")));

        fs::remove_dir(dir.path().join("boards.jsonl.tmp")).unwrap();
        store.write(|_| Ok(())).unwrap();
        let reopened = Store::open(dir.path()).unwrap();
        reopened.read(|db| {
            assert_eq!(db.boards.len(), 1);
            assert!(db.boards.contains_key("board-1"));
        });
    }

    #[test]
    fn test_persist_and_reopen() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = Store::open(dir.path()).unwrap();
            store
                .write(|db| {
                    db.boards.insert("board-1".into(), board("board-1"));
                    db.lists.insert(
                        "list-1".into(),
                        List::new("list-1".into(), "board-1".into(), "Todo".into(), 1),
                    );
                    db.cards.insert(
                        "card-1".into(),
                        Card::new("card-1".into(), "list-1".into(), "Task".into(), None, 1),
                    );
                    db.append_log(
                        &Actor::default(),
                        AuditEvent::new(
                            Action::Create,
                            "org_1",
                            Entity::new("board-1", EntityType::Board, "Roadmap"),
                        ),
                    );
                    Ok(())
                })
                .unwrap();
        }

        let reopened = Store::open(dir.path()).unwrap();
        reopened.read(|db| {
            assert_eq!(db.boards.len(), 1);
            assert_eq!(db.lists_of("board-1").len(), 1);
            assert_eq!(db.cards_of("list-1")[0].title, "Task");
            assert_eq!(db.logs.len(), 1);
        });
        assert_eq!(reopened.root(), Some(dir.path()));
    }

    #[test]
    fn test_sibling_queries_are_sorted() {
        let store = Store::in_memory();
        store
            .write(|db| {
                for (id, order) in [("c", 3), ("a", 1), ("b", 2)] {
                    db.cards.insert(
                        id.into(),
                        Card::new(id.into(), "list-1".into(), id.into(), None, order),
                    );
                }
                db.cards.insert(
                    "other".into(),
                    Card::new("other".into(), "list-2".into(), "o".into(), None, 1),
                );
                Ok(())
            })
            .unwrap();

        let ids: Vec<String> = store.read(|db| db.cards_of("list-1").into_iter().map(|c| c.id).collect());
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert_eq!(store.read(|db| db.cards.len()), 4);
        assert_eq!(store.write(|db| Ok(db.remove_cards_of("list-1"))).unwrap(), 3);
    }
}
