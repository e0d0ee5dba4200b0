use serde::Serialize;
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::catalog::dto::MediaKind;
use crate::watchlist::dto::{NewEntry, Priority, UpdateEntryRequest};

const ENTRY_COLUMNS: &str = r#"id, user_id, tmdb_id, media_kind, title, poster, release_date,
       overview, rating, watched, date_watched, thoughts, genres,
       streaming_providers, priority, created_at, updated_at"#;

/// One user's record of interest in one external title.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct WatchlistEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub tmdb_id: i64,
    #[sqlx(try_from = "String")]
    pub media_kind: MediaKind,
    pub title: String,
    pub poster: String,
    pub release_date: String,
    pub overview: String,
    pub rating: f64,
    pub watched: bool,
    pub date_watched: Option<OffsetDateTime>,
    pub thoughts: String,
    pub genres: Vec<String>,
    pub streaming_providers: Vec<String>,
    #[sqlx(try_from = "String")]
    pub priority: Priority,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl WatchlistEntry {
    /// Merge a partial update into this entry. Absent fields keep their
    /// stored values. date_watched is set on the first false→true watched
    /// transition and never cleared afterwards.
    pub fn apply(&mut self, changes: &UpdateEntryRequest, now: OffsetDateTime) {
        if let Some(rating) = changes.rating {
            self.rating = rating;
        }
        if let Some(watched) = changes.watched {
            if watched && self.date_watched.is_none() {
                self.date_watched = Some(now);
            }
            self.watched = watched;
        }
        if let Some(thoughts) = &changes.thoughts {
            self.thoughts = thoughts.clone();
        }
        if let Some(priority) = changes.priority {
            self.priority = priority;
        }
        if let Some(genres) = &changes.genres {
            self.genres = genres.clone();
        }
        if let Some(providers) = &changes.streaming_providers {
            self.streaming_providers = providers.clone();
        }
        self.updated_at = now;
    }

    pub async fn insert(db: &PgPool, owner_id: Uuid, entry: &NewEntry) -> sqlx::Result<Self> {
        sqlx::query_as::<_, Self>(&format!(
            r#"
            INSERT INTO watchlist_entries
                (user_id, tmdb_id, media_kind, title, poster, release_date,
                 overview, genres, streaming_providers, priority)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {ENTRY_COLUMNS}
            "#
        ))
        .bind(owner_id)
        .bind(entry.tmdb_id)
        .bind(entry.media_kind.as_str())
        .bind(&entry.title)
        .bind(&entry.poster)
        .bind(&entry.release_date)
        .bind(&entry.overview)
        .bind(&entry.genres)
        .bind(&entry.streaming_providers)
        .bind(entry.priority.as_str())
        .fetch_one(db)
        .await
    }

    /// All entries owned by `owner_id`, newest-created-first, optionally
    /// narrowed by watched status and media kind.
    pub async fn list_by_owner(
        db: &PgPool,
        owner_id: Uuid,
        watched: Option<bool>,
        media_kind: Option<MediaKind>,
    ) -> sqlx::Result<Vec<Self>> {
        sqlx::query_as::<_, Self>(&format!(
            r#"
            SELECT {ENTRY_COLUMNS}
            FROM watchlist_entries
            WHERE user_id = $1
              AND ($2::boolean IS NULL OR watched = $2)
              AND ($3::text IS NULL OR media_kind = $3)
            ORDER BY created_at DESC
            "#
        ))
        .bind(owner_id)
        .bind(watched)
        .bind(media_kind.map(|k| k.as_str()))
        .fetch_all(db)
        .await
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> sqlx::Result<Option<Self>> {
        sqlx::query_as::<_, Self>(&format!(
            r#"
            SELECT {ENTRY_COLUMNS}
            FROM watchlist_entries
            WHERE id = $1
            "#
        ))
        .bind(id)
        .fetch_optional(db)
        .await
    }

    pub async fn exists_for_owner(db: &PgPool, owner_id: Uuid, tmdb_id: i64) -> sqlx::Result<bool> {
        let found: Option<(Uuid,)> = sqlx::query_as(
            r#"
            SELECT id FROM watchlist_entries
            WHERE user_id = $1 AND tmdb_id = $2
            "#,
        )
        .bind(owner_id)
        .bind(tmdb_id)
        .fetch_optional(db)
        .await?;
        Ok(found.is_some())
    }

    /// Persist the mutable fields of an already-merged entry.
    pub async fn save(&self, db: &PgPool) -> sqlx::Result<Self> {
        sqlx::query_as::<_, Self>(&format!(
            r#"
            UPDATE watchlist_entries
            SET rating = $2, watched = $3, date_watched = $4, thoughts = $5,
                priority = $6, genres = $7, streaming_providers = $8,
                updated_at = $9
            WHERE id = $1
            RETURNING {ENTRY_COLUMNS}
            "#
        ))
        .bind(self.id)
        .bind(self.rating)
        .bind(self.watched)
        .bind(self.date_watched)
        .bind(&self.thoughts)
        .bind(self.priority.as_str())
        .bind(&self.genres)
        .bind(&self.streaming_providers)
        .bind(self.updated_at)
        .fetch_one(db)
        .await
    }

    /// Hard delete, no tombstone.
    pub async fn delete(db: &PgPool, id: Uuid) -> sqlx::Result<()> {
        sqlx::query("DELETE FROM watchlist_entries WHERE id = $1")
            .bind(id)
            .execute(db)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::Duration;

    fn entry() -> WatchlistEntry {
        let now = OffsetDateTime::now_utc();
        WatchlistEntry {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            tmdb_id: 550,
            media_kind: MediaKind::Movie,
            title: "Fight Club".into(),
            poster: "/fc.jpg".into(),
            release_date: "1999-10-15".into(),
            overview: String::new(),
            rating: 0.0,
            watched: false,
            date_watched: None,
            thoughts: String::new(),
            genres: vec!["Drama".into()],
            streaming_providers: vec![],
            priority: Priority::Medium,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn absent_fields_keep_stored_values() {
        let mut e = entry();
        e.rating = 7.5;
        e.thoughts = "great".into();
        let now = OffsetDateTime::now_utc();
        e.apply(
            &UpdateEntryRequest {
                priority: Some(Priority::High),
                ..Default::default()
            },
            now,
        );
        assert_eq!(e.rating, 7.5);
        assert_eq!(e.thoughts, "great");
        assert_eq!(e.priority, Priority::High);
        assert_eq!(e.updated_at, now);
    }

    #[test]
    fn date_watched_is_set_on_first_transition_only() {
        let mut e = entry();
        let first = OffsetDateTime::now_utc();
        e.apply(
            &UpdateEntryRequest {
                watched: Some(true),
                ..Default::default()
            },
            first,
        );
        assert!(e.watched);
        assert_eq!(e.date_watched, Some(first));

        // Flipping back does not clear it
        let later = first + Duration::hours(1);
        e.apply(
            &UpdateEntryRequest {
                watched: Some(false),
                ..Default::default()
            },
            later,
        );
        assert!(!e.watched);
        assert_eq!(e.date_watched, Some(first));

        // Watching again keeps the original timestamp
        let latest = first + Duration::hours(2);
        e.apply(
            &UpdateEntryRequest {
                watched: Some(true),
                ..Default::default()
            },
            latest,
        );
        assert_eq!(e.date_watched, Some(first));
    }

    #[test]
    fn setting_watched_true_twice_keeps_first_timestamp() {
        let mut e = entry();
        let first = OffsetDateTime::now_utc();
        e.apply(
            &UpdateEntryRequest {
                watched: Some(true),
                ..Default::default()
            },
            first,
        );
        e.apply(
            &UpdateEntryRequest {
                watched: Some(true),
                rating: Some(9.0),
                ..Default::default()
            },
            first + Duration::days(1),
        );
        assert_eq!(e.date_watched, Some(first));
        assert_eq!(e.rating, 9.0);
    }

    #[test]
    fn entry_serializes_camel_case() {
        let e = entry();
        let json = serde_json::to_value(&e).unwrap();
        assert!(json.get("tmdbId").is_some());
        assert!(json.get("mediaKind").is_some());
        assert!(json.get("streamingProviders").is_some());
        assert!(json.get("dateWatched").is_some());
        assert_eq!(json["mediaKind"], "movie");
        assert_eq!(json["priority"], "medium");
    }
}
