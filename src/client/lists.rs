//! Client-local word lists.
//!
//! Lists hold snapshots of words (copies taken when the word was added) and
//! are persisted per user under `wordLists_<owner>`. They are never sent to the
//! server and are not reconciled with it: a word deleted on the server stays in
//! every list that captured it.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::db::{timestamp_now, Word};

use super::quiz::Quiz;
use super::storage::{KeyValueStore, StorageError};

const LISTS_KEY_PREFIX: &str = "wordLists_";
const DEFAULT_OWNER: &str = "default";

#[derive(Debug, Error)]
pub enum ListError {
    #[error("List name is required")]
    EmptyName,

    #[error("List {0} not found")]
    NotFound(i64),

    #[error("List {0} has no words to quiz")]
    EmptyList(i64),

    #[error("Stored lists for '{owner}' are unreadable: {source}")]
    Corrupt {
        owner: String,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Storage(#[from] StorageError),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WordList {
    /// Creation time in milliseconds, bumped when needed to stay unique
    pub id: i64,
    pub name: String,
    pub words: Vec<Word>,
    pub created_at: String,
    pub owner: String,
}

impl WordList {
    pub fn contains(&self, word_id: &str) -> bool {
        self.words.iter().any(|w| w.id == word_id)
    }
}

/// Storage scope for a user's lists.
///
/// Precedence: `id`, then `name`, then `username`; blank or non-string values
/// are skipped. Falls back to `"default"` when no profile is available.
pub fn resolve_owner_key(user: Option<&Value>) -> String {
    let Some(user) = user else {
        return DEFAULT_OWNER.to_string();
    };

    ["id", "name", "username"]
        .into_iter()
        .filter_map(|field| user.get(field)?.as_str())
        .map(str::trim)
        .find(|value| !value.is_empty())
        .unwrap_or(DEFAULT_OWNER)
        .to_string()
}

pub fn storage_key(owner: &str) -> String {
    format!("{}{}", LISTS_KEY_PREFIX, owner)
}

/// In-memory list collection for one owner, written through to `S` after
/// every mutation
#[derive(Debug)]
pub struct ListEngine<S> {
    store: S,
    owner: String,
    lists: Vec<WordList>,
    last_id: i64,
}

impl<S: KeyValueStore> ListEngine<S> {
    pub fn load(store: S, owner: impl Into<String>) -> Result<Self, ListError> {
        let owner = owner.into();

        let lists: Vec<WordList> = match store.get(&storage_key(&owner))? {
            Some(raw) => serde_json::from_str(&raw).map_err(|source| ListError::Corrupt {
                owner: owner.clone(),
                source,
            })?,
            None => Vec::new(),
        };

        let last_id = lists.iter().map(|l| l.id).max().unwrap_or(0);

        Ok(Self {
            store,
            owner,
            lists,
            last_id,
        })
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn lists(&self) -> &[WordList] {
        &self.lists
    }

    pub fn get(&self, id: i64) -> Option<&WordList> {
        self.lists.iter().find(|l| l.id == id)
    }

    pub fn into_store(self) -> S {
        self.store
    }

    fn list_mut(&mut self, id: i64) -> Result<&mut WordList, ListError> {
        self.lists
            .iter_mut()
            .find(|l| l.id == id)
            .ok_or(ListError::NotFound(id))
    }

    fn next_id(&mut self) -> i64 {
        let now = chrono::Utc::now().timestamp_millis();
        self.last_id = now.max(self.last_id.saturating_add(1));
        self.last_id
    }

    fn persist(&mut self) -> Result<(), ListError> {
        let raw = serde_json::to_string(&self.lists).map_err(|source| ListError::Corrupt {
            owner: self.owner.clone(),
            source,
        })?;
        self.store.set(&storage_key(&self.owner), &raw)?;
        debug!(owner = %self.owner, lists = self.lists.len(), "Persisted word lists");
        Ok(())
    }

    pub fn create_list(&mut self, name: &str) -> Result<WordList, ListError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ListError::EmptyName);
        }

        let list = WordList {
            id: self.next_id(),
            name: name.to_string(),
            words: Vec::new(),
            created_at: timestamp_now(),
            owner: self.owner.clone(),
        };
        self.lists.push(list.clone());
        self.persist()?;
        Ok(list)
    }

    /// Rename a list. Blank or unchanged names leave it untouched.
    pub fn rename_list(&mut self, id: i64, new_name: &str) -> Result<(), ListError> {
        let new_name = new_name.trim();
        let list = self.list_mut(id)?;
        if new_name.is_empty() || new_name == list.name {
            return Ok(());
        }
        list.name = new_name.to_string();
        self.persist()
    }

    pub fn delete_list(&mut self, id: i64) -> Result<WordList, ListError> {
        let pos = self
            .lists
            .iter()
            .position(|l| l.id == id)
            .ok_or(ListError::NotFound(id))?;
        let removed = self.lists.remove(pos);
        self.persist()?;
        Ok(removed)
    }

    /// Snapshot `word` into the list. Returns `false` if a word with the same
    /// id is already there.
    pub fn add_word_to_list(&mut self, id: i64, word: &Word) -> Result<bool, ListError> {
        let list = self.list_mut(id)?;
        if list.contains(&word.id) {
            return Ok(false);
        }
        list.words.push(word.clone());
        self.persist()?;
        Ok(true)
    }

    /// Returns `false` when the word was not in the list
    pub fn remove_word_from_list(&mut self, id: i64, word_id: &str) -> Result<bool, ListError> {
        let list = self.list_mut(id)?;
        let before = list.words.len();
        list.words.retain(|w| w.id != word_id);
        if list.words.len() == before {
            return Ok(false);
        }
        self.persist()?;
        Ok(true)
    }

    pub fn start_quiz(&self, id: i64) -> Result<Quiz, ListError> {
        let list = self.get(id).ok_or(ListError::NotFound(id))?;
        Quiz::new(list.words.clone()).ok_or(ListError::EmptyList(id))
    }
}
