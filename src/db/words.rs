//! Word repository.
//!
//! Ownership is tagged at creation from the caller-supplied owner id. Whether a
//! caller may mutate a given word is decided by the API layer, not here.

use uuid::Uuid;

use super::{timestamp_now, CefrLevel, DbPool, StoreError, Word, WordDraft};

/// Newest first; rowid breaks ties between rows created in the same microsecond
const NEWEST_FIRST: &str = "ORDER BY created_at DESC, rowid DESC";

#[derive(Debug, Clone)]
pub struct WordRepository {
    pool: DbPool,
}

impl WordRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, draft: &WordDraft, owner_id: &str) -> Result<Word, StoreError> {
        let id = Uuid::new_v4().to_string();
        let now = timestamp_now();

        sqlx::query(
            r#"
            INSERT INTO words (id, word, meaning, example, level, user_id, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(&draft.word)
        .bind(&draft.meaning)
        .bind(&draft.example)
        .bind(draft.level.as_str())
        .bind(owner_id)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        self.find_by_id(&id).await?.ok_or(StoreError::NotFound)
    }

    pub async fn find_all(&self) -> Result<Vec<Word>, StoreError> {
        let words = sqlx::query_as::<_, Word>(&format!("SELECT * FROM words {NEWEST_FIRST}"))
            .fetch_all(&self.pool)
            .await?;
        Ok(words)
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<Word>, StoreError> {
        let word = sqlx::query_as::<_, Word>("SELECT * FROM words WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(word)
    }

    pub async fn find_by_level(&self, level: CefrLevel) -> Result<Vec<Word>, StoreError> {
        let words = sqlx::query_as::<_, Word>(&format!(
            "SELECT * FROM words WHERE level = ? {NEWEST_FIRST}"
        ))
        .bind(level.as_str())
        .fetch_all(&self.pool)
        .await?;
        Ok(words)
    }

    /// Owner-scoped query
    pub async fn find_by_owner(&self, owner_id: &str) -> Result<Vec<Word>, StoreError> {
        let words = sqlx::query_as::<_, Word>(&format!(
            "SELECT * FROM words WHERE user_id = ? {NEWEST_FIRST}"
        ))
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(words)
    }

    pub async fn count_by_owner(&self, owner_id: &str) -> Result<i64, StoreError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM words WHERE user_id = ?")
            .bind(owner_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Replace every editable field of a word. The owner and `created_at` are kept.
    pub async fn update(&self, id: &str, draft: &WordDraft) -> Result<Word, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE words SET
                word = ?,
                meaning = ?,
                example = ?,
                level = ?,
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&draft.word)
        .bind(&draft.meaning)
        .bind(&draft.example)
        .bind(draft.level.as_str())
        .bind(timestamp_now())
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }

        self.find_by_id(id).await?.ok_or(StoreError::NotFound)
    }

    pub async fn delete(&self, id: &str) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM words WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{init_in_memory, UserStore};

    struct Fixture {
        words: WordRepository,
        alice: String,
        bob: String,
    }

    async fn fixture() -> Fixture {
        let pool = init_in_memory().await.unwrap();
        let users = UserStore::new(pool.clone());
        let alice = users.create("Alice", "alice@example.com", "h").await.unwrap();
        let bob = users.create("Bob", "bob@example.com", "h").await.unwrap();
        Fixture {
            words: WordRepository::new(pool),
            alice: alice.id,
            bob: bob.id,
        }
    }

    fn draft(word: &str, level: CefrLevel) -> WordDraft {
        WordDraft {
            word: word.to_string(),
            meaning: format!("meaning of {}", word),
            example: None,
            level,
        }
    }

    #[tokio::test]
    async fn test_create_then_find_round_trip() {
        let f = fixture().await;
        let input = WordDraft {
            word: "serendipity".to_string(),
            meaning: "a happy accident".to_string(),
            example: Some("Finding it was pure serendipity.".to_string()),
            level: CefrLevel::C1,
        };

        let created = f.words.create(&input, &f.alice).await.unwrap();
        let found = f.words.find_by_id(&created.id).await.unwrap().unwrap();

        assert_eq!(found, created);
        assert_eq!(found.word, input.word);
        assert_eq!(found.meaning, input.meaning);
        assert_eq!(found.example, input.example);
        assert_eq!(found.level, CefrLevel::C1);
        assert_eq!(found.user, f.alice);
        assert!(!found.created_at.is_empty());
    }

    #[tokio::test]
    async fn test_find_all_newest_first() {
        let f = fixture().await;
        for w in ["one", "two", "three"] {
            f.words.create(&draft(w, CefrLevel::A1), &f.alice).await.unwrap();
        }

        let all = f.words.find_all().await.unwrap();
        let terms: Vec<&str> = all.iter().map(|w| w.word.as_str()).collect();
        assert_eq!(terms, vec!["three", "two", "one"]);
    }

    #[tokio::test]
    async fn test_find_by_owner_is_scoped() {
        let f = fixture().await;
        let alices = f.words.create(&draft("apple", CefrLevel::A1), &f.alice).await.unwrap();
        f.words.create(&draft("banana", CefrLevel::A2), &f.bob).await.unwrap();

        let bobs = f.words.find_by_owner(&f.bob).await.unwrap();
        assert_eq!(bobs.len(), 1);
        assert!(bobs.iter().all(|w| w.id != alices.id));

        assert_eq!(f.words.count_by_owner(&f.alice).await.unwrap(), 1);
        assert!(f.words.find_by_owner("nobody").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_find_by_level() {
        let f = fixture().await;
        f.words.create(&draft("cat", CefrLevel::A1), &f.alice).await.unwrap();
        f.words.create(&draft("ubiquitous", CefrLevel::C2), &f.bob).await.unwrap();

        let c2 = f.words.find_by_level(CefrLevel::C2).await.unwrap();
        assert_eq!(c2.len(), 1);
        assert_eq!(c2[0].word, "ubiquitous");
        assert!(f.words.find_by_level(CefrLevel::B1).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_replaces_fields_and_keeps_owner() {
        let f = fixture().await;
        let mut original = draft("colour", CefrLevel::A2);
        original.example = Some("What colour is it?".to_string());
        let created = f.words.create(&original, &f.alice).await.unwrap();

        let updated = f
            .words
            .update(&created.id, &draft("color", CefrLevel::B1))
            .await
            .unwrap();

        assert_eq!(updated.word, "color");
        assert_eq!(updated.level, CefrLevel::B1);
        assert_eq!(updated.example, None);
        assert_eq!(updated.user, f.alice);
        assert_eq!(updated.created_at, created.created_at);
    }

    #[tokio::test]
    async fn test_update_and_delete_missing() {
        let f = fixture().await;
        let err = f
            .words
            .update("missing", &draft("x", CefrLevel::A1))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound));

        let err = f.words.delete("missing").await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound));
    }

    #[tokio::test]
    async fn test_delete() {
        let f = fixture().await;
        let created = f.words.create(&draft("gone", CefrLevel::A1), &f.alice).await.unwrap();

        f.words.delete(&created.id).await.unwrap();
        assert!(f.words.find_by_id(&created.id).await.unwrap().is_none());
    }
}
