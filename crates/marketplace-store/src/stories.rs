use anyhow::Result;
use artisan_core::{MarketplaceError, Story, StoryInput};
use chrono::{DateTime, Utc};
use sqlx::FromRow;

use crate::db::MarketplaceDb;

#[derive(Debug, FromRow)]
struct StoryRow {
    id: String,
    artisan_id: String,
    title: String,
    content: String,
    audio_url: Option<String>,
    video_url: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<StoryRow> for Story {
    fn from(row: StoryRow) -> Self {
        Story {
            id: row.id,
            artisan_id: row.artisan_id,
            title: row.title,
            content: row.content,
            audio_url: row.audio_url,
            video_url: row.video_url,
            created_at: row.created_at,
        }
    }
}

pub struct StoryArchive {
    db: MarketplaceDb,
}

impl StoryArchive {
    pub fn new(db: MarketplaceDb) -> Self {
        Self { db }
    }

    pub async fn create(&self, artisan_id: &str, input: StoryInput) -> Result<Story> {
        input.validate()?;
        let story = Story::new(artisan_id, input);

        sqlx::query(
            r#"
            INSERT INTO stories (id, artisan_id, title, content, audio_url, video_url, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&story.id)
        .bind(&story.artisan_id)
        .bind(&story.title)
        .bind(&story.content)
        .bind(&story.audio_url)
        .bind(&story.video_url)
        .bind(story.created_at)
        .execute(self.db.pool())
        .await?;

        Ok(story)
    }

    pub async fn list(&self, limit: i64) -> Result<Vec<Story>> {
        let rows = sqlx::query_as::<_, StoryRow>(
            "SELECT * FROM stories ORDER BY created_at DESC LIMIT ?",
        )
        .bind(limit)
        .fetch_all(self.db.pool())
        .await?;

        Ok(rows.into_iter().map(Story::from).collect())
    }

    pub async fn list_by_artisan(&self, artisan_id: &str, limit: i64) -> Result<Vec<Story>> {
        let rows = sqlx::query_as::<_, StoryRow>(
            "SELECT * FROM stories WHERE artisan_id = ? ORDER BY created_at DESC LIMIT ?",
        )
        .bind(artisan_id)
        .bind(limit)
        .fetch_all(self.db.pool())
        .await?;

        Ok(rows.into_iter().map(Story::from).collect())
    }

    pub async fn get(&self, id: &str) -> Result<Option<Story>> {
        let row = sqlx::query_as::<_, StoryRow>("SELECT * FROM stories WHERE id = ?")
            .bind(id)
            .fetch_optional(self.db.pool())
            .await?;

        Ok(row.map(Story::from))
    }

    pub async fn require(&self, id: &str) -> Result<Story> {
        self.get(id)
            .await?
            .ok_or_else(|| MarketplaceError::not_found("Story").into())
    }
}
