//! Prompt database operations
//!
//! Prompts are scoped to their owning user; every operation takes the
//! caller's user id and never touches another user's rows. A save writes
//! the prompt row and its tag rows inside one transaction.

use std::collections::BTreeMap;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::error::{AppError, Result};

/// Supported model labels on a prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PromptModel {
    #[serde(rename = "gpt-4")]
    Gpt4,
    #[serde(rename = "gpt-3.5")]
    Gpt35,
    #[serde(rename = "claude-3")]
    Claude3,
    #[serde(rename = "gemini-pro")]
    GeminiPro,
    #[serde(rename = "mistral")]
    Mistral,
    #[serde(rename = "zephyr")]
    Zephyr,
    #[serde(rename = "mixtral")]
    Mixtral,
}

impl PromptModel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gpt4 => "gpt-4",
            Self::Gpt35 => "gpt-3.5",
            Self::Claude3 => "claude-3",
            Self::GeminiPro => "gemini-pro",
            Self::Mistral => "mistral",
            Self::Zephyr => "zephyr",
            Self::Mixtral => "mixtral",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "gpt-4" => Some(Self::Gpt4),
            "gpt-3.5" => Some(Self::Gpt35),
            "claude-3" => Some(Self::Claude3),
            "gemini-pro" => Some(Self::GeminiPro),
            "mistral" => Some(Self::Mistral),
            "zephyr" => Some(Self::Zephyr),
            "mixtral" => Some(Self::Mixtral),
            _ => None,
        }
    }
}

/// Prompt record with its tag set attached.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prompt {
    pub id: String,
    pub title: String,
    pub content: String,
    pub model: PromptModel,
    pub collection: String,
    pub tags: Vec<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Save request (create or update).
#[derive(Debug, Clone, Deserialize)]
pub struct SavePrompt {
    /// Client-generated id; a fresh one is issued when absent
    pub id: Option<Uuid>,
    /// Defaults to the leading characters of the content
    pub title: Option<String>,
    pub content: String,
    pub model: PromptModel,
    #[serde(default)]
    pub collection: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Title fallback used by the OCR capture flow: the first characters of
/// the content.
pub fn default_title(content: &str) -> String {
    let title: String = content.trim().chars().take(60).collect();
    if title.is_empty() {
        "Untitled Prompt".to_string()
    } else {
        title
    }
}

#[derive(sqlx::FromRow)]
struct PromptRow {
    id: String,
    title: String,
    content: String,
    model: String,
    collection: String,
    created_at: String,
    updated_at: String,
}

impl PromptRow {
    fn into_prompt(self, tags: Vec<String>) -> Result<Prompt> {
        let model = PromptModel::parse(&self.model)
            .ok_or_else(|| AppError::Internal(format!("Unknown prompt model: {}", self.model)))?;
        Ok(Prompt {
            id: self.id,
            title: self.title,
            content: self.content,
            model,
            collection: self.collection,
            tags,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// Prompt repository
pub struct PromptRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> PromptRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Get a prompt by id, scoped to its owner
    pub async fn get(&self, user_id: &str, id: &str) -> Result<Option<Prompt>> {
        let row = sqlx::query_as::<_, PromptRow>(
            r#"
            SELECT id, title, content, model, collection, created_at, updated_at
            FROM prompts
            WHERE id = ? AND user_id = ?
            "#,
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let tags: Vec<(String,)> = sqlx::query_as("SELECT tag FROM tags WHERE prompt_id = ?")
            .bind(id)
            .fetch_all(self.pool)
            .await?;

        Ok(Some(
            row.into_prompt(tags.into_iter().map(|(tag,)| tag).collect())?,
        ))
    }

    /// List all prompts for a user, newest first
    pub async fn list_for_user(&self, user_id: &str) -> Result<Vec<Prompt>> {
        let rows = sqlx::query_as::<_, PromptRow>(
            r#"
            SELECT id, title, content, model, collection, created_at, updated_at
            FROM prompts
            WHERE user_id = ?
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        let tag_rows: Vec<(String, String)> = sqlx::query_as(
            r#"
            SELECT t.prompt_id, t.tag
            FROM tags t
            JOIN prompts p ON p.id = t.prompt_id
            WHERE p.user_id = ?
            "#,
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        let mut tags_by_prompt: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (prompt_id, tag) in tag_rows {
            tags_by_prompt.entry(prompt_id).or_default().push(tag);
        }

        rows.into_iter()
            .map(|row| {
                let tags = tags_by_prompt.remove(&row.id).unwrap_or_default();
                row.into_prompt(tags)
            })
            .collect()
    }

    /// Create or update a prompt together with its tags.
    ///
    /// The prompt row and the tag replacement commit atomically: a failed
    /// tag write rolls back the whole save.
    pub async fn save(&self, user_id: &str, data: &SavePrompt) -> Result<Prompt> {
        let id = data
            .id
            .map(|id| id.to_string())
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        let now = Utc::now().to_rfc3339();
        let title = data
            .title
            .clone()
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| default_title(&data.content));
        let collection = data
            .collection
            .clone()
            .filter(|c| !c.trim().is_empty())
            .unwrap_or_else(|| "uncategorized".to_string());

        let mut tx = self.pool.begin().await?;

        let existing: Option<(String,)> =
            sqlx::query_as("SELECT id FROM prompts WHERE id = ? AND user_id = ?")
                .bind(&id)
                .bind(user_id)
                .fetch_optional(&mut *tx)
                .await?;

        if existing.is_some() {
            sqlx::query(
                r#"
                UPDATE prompts
                SET title = ?, content = ?, model = ?, collection = ?, updated_at = ?
                WHERE id = ? AND user_id = ?
                "#,
            )
            .bind(&title)
            .bind(&data.content)
            .bind(data.model.as_str())
            .bind(&collection)
            .bind(&now)
            .bind(&id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;
        } else {
            sqlx::query(
                r#"
                INSERT INTO prompts (id, user_id, title, content, model, collection, created_at, updated_at)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&id)
            .bind(user_id)
            .bind(&title)
            .bind(&data.content)
            .bind(data.model.as_str())
            .bind(&collection)
            .bind(&now)
            .bind(&now)
            .execute(&mut *tx)
            .await?;
        }

        // Replace the tag set wholesale
        sqlx::query("DELETE FROM tags WHERE prompt_id = ?")
            .bind(&id)
            .execute(&mut *tx)
            .await?;

        let mut seen = Vec::new();
        for tag in &data.tags {
            let tag = tag.trim();
            if tag.is_empty() || seen.iter().any(|s| s == tag) {
                continue;
            }
            seen.push(tag.to_string());
            sqlx::query("INSERT INTO tags (prompt_id, tag) VALUES (?, ?)")
                .bind(&id)
                .bind(tag)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        self.get(user_id, &id)
            .await?
            .ok_or_else(|| AppError::Internal("Failed to fetch saved prompt".to_string()))
    }

    /// Delete a prompt; tag rows cascade with it
    pub async fn delete(&self, user_id: &str, id: &str) -> Result<()> {
        let result = sqlx::query("DELETE FROM prompts WHERE id = ? AND user_id = ?")
            .bind(id)
            .bind(user_id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Prompt not found: {}", id)));
        }
        Ok(())
    }

    /// Search prompts by title or content
    pub async fn search(&self, user_id: &str, query: &str) -> Result<Vec<Prompt>> {
        let all = self.list_for_user(user_id).await?;
        let filters = PromptFilters {
            query: Some(query.to_string()),
            ..PromptFilters::default()
        };
        Ok(filter_prompts(&all, &filters))
    }
}

/// Search/filter criteria, all optional and combined with AND.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PromptFilters {
    pub query: Option<String>,
    pub model: Option<PromptModel>,
    pub collection: Option<String>,
    pub tag: Option<String>,
}

/// Filter a prompt list. A `tag` criterion matches the primary collection
/// as well as the free-form tags.
pub fn filter_prompts(prompts: &[Prompt], filters: &PromptFilters) -> Vec<Prompt> {
    prompts
        .iter()
        .filter(|prompt| {
            if let Some(query) = &filters.query {
                let query = query.to_lowercase();
                let matches = prompt.title.to_lowercase().contains(&query)
                    || prompt.content.to_lowercase().contains(&query);
                if !matches {
                    return false;
                }
            }
            if let Some(model) = filters.model {
                if prompt.model != model {
                    return false;
                }
            }
            if let Some(collection) = &filters.collection {
                if &prompt.collection != collection {
                    return false;
                }
            }
            if let Some(tag) = &filters.tag {
                let in_primary = &prompt.collection == tag;
                let in_extra = prompt.tags.iter().any(|t| t == tag);
                if !in_primary && !in_extra {
                    return false;
                }
            }
            true
        })
        .cloned()
        .collect()
}

/// Group prompts by their collection.
pub fn group_by_collection(prompts: &[Prompt]) -> BTreeMap<String, Vec<Prompt>> {
    let mut groups: BTreeMap<String, Vec<Prompt>> = BTreeMap::new();
    for prompt in prompts {
        groups
            .entry(prompt.collection.clone())
            .or_default()
            .push(prompt.clone());
    }
    groups
}

/// Group prompts by the union of collection and tags. A prompt appears
/// once per distinct label; the dedup is presentation-only and nothing
/// here is persisted.
pub fn group_by_tag(prompts: &[Prompt]) -> BTreeMap<String, Vec<Prompt>> {
    let mut groups: BTreeMap<String, Vec<Prompt>> = BTreeMap::new();
    for prompt in prompts {
        let mut labels = vec![prompt.collection.clone()];
        labels.extend(prompt.tags.iter().cloned());
        let mut unique = Vec::new();
        for label in labels {
            if !unique.contains(&label) {
                unique.push(label);
            }
        }
        for label in unique {
            groups.entry(label).or_default().push(prompt.clone());
        }
    }
    for group in groups.values_mut() {
        group.sort_by(|a, b| a.title.cmp(&b.title));
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;

    use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
    use std::str::FromStr;

    async fn test_pool() -> SqlitePool {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .unwrap()
            .foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .unwrap();
        crate::db::initialize_schema(&pool).await.unwrap();
        pool
    }

    fn save_request(content: &str, tags: &[&str]) -> SavePrompt {
        SavePrompt {
            id: None,
            title: None,
            content: content.to_string(),
            model: PromptModel::Zephyr,
            collection: Some("ocr".to_string()),
            tags: tags.iter().map(|t| t.to_string()).collect(),
        }
    }

    fn sample(id: &str, title: &str, collection: &str, tags: &[&str]) -> Prompt {
        Prompt {
            id: id.to_string(),
            title: title.to_string(),
            content: format!("content of {title}"),
            model: PromptModel::Zephyr,
            collection: collection.to_string(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            created_at: "2026-01-01T00:00:00Z".to_string(),
            updated_at: "2026-01-01T00:00:00Z".to_string(),
        }
    }

    #[tokio::test]
    async fn saved_prompt_round_trips_with_its_tag_set() {
        let pool = test_pool().await;
        let repo = PromptRepository::new(&pool);

        let saved = repo
            .save("user-1", &save_request("extracted text", &["ocr", "printed"]))
            .await
            .unwrap();

        let fetched = repo.get("user-1", &saved.id).await.unwrap().unwrap();

        assert_eq!(fetched.content, "extracted text");
        assert_eq!(fetched.title, saved.title);

        let mut expected = vec!["ocr".to_string(), "printed".to_string()];
        expected.sort();
        let mut actual = fetched.tags.clone();
        actual.sort();
        assert_eq!(actual, expected);
    }

    #[tokio::test]
    async fn title_and_collection_get_defaults() {
        let pool = test_pool().await;
        let repo = PromptRepository::new(&pool);

        let long_content = "x".repeat(100);
        let saved = repo
            .save(
                "user-1",
                &SavePrompt {
                    id: None,
                    title: None,
                    content: long_content.clone(),
                    model: PromptModel::Mistral,
                    collection: None,
                    tags: vec![],
                },
            )
            .await
            .unwrap();

        assert_eq!(saved.title.chars().count(), 60);
        assert_eq!(saved.collection, "uncategorized");
    }

    #[tokio::test]
    async fn saving_an_existing_id_updates_in_place() {
        let pool = test_pool().await;
        let repo = PromptRepository::new(&pool);

        let first = repo
            .save("user-1", &save_request("first version", &["ocr"]))
            .await
            .unwrap();

        let updated = repo
            .save(
                "user-1",
                &SavePrompt {
                    id: Some(Uuid::parse_str(&first.id).unwrap()),
                    title: Some("Edited".to_string()),
                    content: "second version".to_string(),
                    model: PromptModel::Mixtral,
                    collection: Some("work".to_string()),
                    tags: vec!["edited".to_string()],
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.id, first.id);
        assert_eq!(updated.content, "second version");
        assert_eq!(updated.created_at, first.created_at);
        assert_eq!(updated.tags, vec!["edited".to_string()]);

        let all = repo.list_for_user("user-1").await.unwrap();
        assert_eq!(all.len(), 1);
    }

    #[tokio::test]
    async fn duplicate_and_blank_tags_are_dropped_on_save() {
        let pool = test_pool().await;
        let repo = PromptRepository::new(&pool);

        let saved = repo
            .save("user-1", &save_request("text", &["ocr", "ocr", "  ", "b"]))
            .await
            .unwrap();

        let mut tags = saved.tags.clone();
        tags.sort();
        assert_eq!(tags, vec!["b".to_string(), "ocr".to_string()]);
    }

    #[tokio::test]
    async fn deleting_twice_reports_not_found() {
        let pool = test_pool().await;
        let repo = PromptRepository::new(&pool);

        let saved = repo
            .save("user-1", &save_request("text", &["ocr"]))
            .await
            .unwrap();

        repo.delete("user-1", &saved.id).await.unwrap();

        let err = repo.delete("user-1", &saved.id).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn deleting_a_prompt_cascades_its_tags() {
        let pool = test_pool().await;
        let repo = PromptRepository::new(&pool);

        let saved = repo
            .save("user-1", &save_request("text", &["ocr", "printed"]))
            .await
            .unwrap();
        repo.delete("user-1", &saved.id).await.unwrap();

        let remaining: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM tags")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(remaining.0, 0);
    }

    #[tokio::test]
    async fn prompts_are_scoped_to_their_owner() {
        let pool = test_pool().await;
        let repo = PromptRepository::new(&pool);

        let saved = repo
            .save("user-1", &save_request("secret", &[]))
            .await
            .unwrap();

        assert!(repo.get("user-2", &saved.id).await.unwrap().is_none());
        assert!(repo.delete("user-2", &saved.id).await.is_err());
        assert!(repo.list_for_user("user-2").await.unwrap().is_empty());
    }

    #[test]
    fn filters_combine_with_and() {
        let prompts = vec![
            sample("1", "Alpha", "work", &["ocr"]),
            sample("2", "Beta", "home", &["printed"]),
        ];

        let by_query = filter_prompts(
            &prompts,
            &PromptFilters {
                query: Some("ALPHA".to_string()),
                ..Default::default()
            },
        );
        assert_eq!(by_query.len(), 1);
        assert_eq!(by_query[0].id, "1");

        let by_tag = filter_prompts(
            &prompts,
            &PromptFilters {
                tag: Some("home".to_string()),
                ..Default::default()
            },
        );
        // Collection counts as a tag match
        assert_eq!(by_tag.len(), 1);
        assert_eq!(by_tag[0].id, "2");

        let none = filter_prompts(
            &prompts,
            &PromptFilters {
                query: Some("Alpha".to_string()),
                collection: Some("home".to_string()),
                ..Default::default()
            },
        );
        assert!(none.is_empty());
    }

    #[test]
    fn tag_grouping_deduplicates_collection_overlap() {
        let prompts = vec![sample("1", "Alpha", "ocr", &["ocr", "printed"])];

        let groups = group_by_tag(&prompts);

        // "ocr" appears as collection and tag but the prompt is listed once
        assert_eq!(groups.get("ocr").unwrap().len(), 1);
        assert_eq!(groups.get("printed").unwrap().len(), 1);
        assert_eq!(groups.len(), 2);
    }

    #[test]
    fn collection_grouping_keys_by_collection() {
        let prompts = vec![
            sample("1", "Alpha", "work", &[]),
            sample("2", "Beta", "work", &[]),
            sample("3", "Gamma", "home", &[]),
        ];

        let groups = group_by_collection(&prompts);
        assert_eq!(groups.get("work").unwrap().len(), 2);
        assert_eq!(groups.get("home").unwrap().len(), 1);
    }

    #[test]
    fn default_title_truncates_on_char_boundaries() {
        assert_eq!(default_title("short"), "short");
        assert_eq!(default_title("  padded  "), "padded");
        assert_eq!(default_title(""), "Untitled Prompt");
        let accented = "é".repeat(100);
        assert_eq!(default_title(&accented).chars().count(), 60);
    }
}
