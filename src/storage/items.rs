use sqlx::QueryBuilder;

use super::schema::Database;
use super::types::{DatabaseError, ItemRow, ProfileRow, Seed, SeedItem, SeedProfile};
use crate::engine::{ContentItem, Profile, UserId};

/// Maximum number of candidates returned by one feed load (OOM protection)
const MAX_CANDIDATES: i64 = 500;

impl Database {
    // ========================================================================
    // Feed Candidates
    // ========================================================================

    /// Candidate items for `viewer` in insertion order, excluding the viewer's
    /// own items. Owners come back as placeholders.
    pub async fn list_candidates(&self, viewer: &UserId) -> Result<Vec<ContentItem>, DatabaseError> {
        let rows: Vec<ItemRow> = sqlx::query_as(
            r#"
            SELECT i.id, i.owner_id, i.media_ref, i.title, i.category,
                   i.view_count, i.like_count,
                   EXISTS(
                       SELECT 1 FROM likes l
                       WHERE l.item_id = i.id AND l.viewer_id = ?
                   ) AS liked
            FROM items i
            WHERE i.owner_id != ?
            ORDER BY i.seq
            LIMIT ?
            "#,
        )
        .bind(viewer.as_str())
        .bind(viewer.as_str())
        .bind(MAX_CANDIDATES)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(ItemRow::into_item).collect())
    }

    pub async fn get_profile(&self, user: &UserId) -> Result<Option<Profile>, DatabaseError> {
        let row: Option<ProfileRow> = sqlx::query_as(
            "SELECT user_id, display_name, photo_url, user_type, company, location, bio \
             FROM profiles WHERE user_id = ?",
        )
        .bind(user.as_str())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(ProfileRow::into_profile))
    }

    // ========================================================================
    // Seeding
    // ========================================================================

    /// Insert or replace a profile.
    pub async fn upsert_profile(&self, profile: &SeedProfile) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            INSERT INTO profiles (user_id, display_name, photo_url, user_type, company, location, bio)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(user_id) DO UPDATE SET
                display_name = excluded.display_name,
                photo_url = excluded.photo_url,
                user_type = excluded.user_type,
                company = excluded.company,
                location = excluded.location,
                bio = excluded.bio
            "#,
        )
        .bind(&profile.user_id)
        .bind(&profile.display_name)
        .bind(&profile.photo_url)
        .bind(profile.user_type.as_str())
        .bind(&profile.company)
        .bind(&profile.location)
        .bind(&profile.bio)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Insert an item. Returns false if an item with the same id exists.
    pub async fn insert_item(&self, item: &SeedItem) -> Result<bool, DatabaseError> {
        let now = chrono::Utc::now().timestamp();
        let result = sqlx::query(
            "INSERT OR IGNORE INTO items (id, owner_id, media_ref, title, category, created_at) \
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&item.id)
        .bind(&item.owner_id)
        .bind(&item.media_ref)
        .bind(&item.title)
        .bind(item.category.as_str())
        .bind(now)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Import a fixture in one transaction. Existing items are left alone so
    /// re-importing keeps their counters. Returns (profiles, new items).
    pub async fn import_seed(&self, seed: &Seed) -> Result<(usize, usize), DatabaseError> {
        const BATCH_SIZE: usize = 50;
        let now = chrono::Utc::now().timestamp();
        let mut tx = self.pool.begin().await?;

        for chunk in seed.profiles.chunks(BATCH_SIZE) {
            let mut builder: QueryBuilder<sqlx::Sqlite> = QueryBuilder::new(
                "INSERT OR REPLACE INTO profiles \
                 (user_id, display_name, photo_url, user_type, company, location, bio) ",
            );
            builder.push_values(chunk, |mut b, p| {
                b.push_bind(&p.user_id)
                    .push_bind(&p.display_name)
                    .push_bind(&p.photo_url)
                    .push_bind(p.user_type.as_str())
                    .push_bind(&p.company)
                    .push_bind(&p.location)
                    .push_bind(&p.bio);
            });
            builder.build().execute(&mut *tx).await?;
        }

        let mut inserted = 0usize;
        for chunk in seed.items.chunks(BATCH_SIZE) {
            let mut builder: QueryBuilder<sqlx::Sqlite> = QueryBuilder::new(
                "INSERT OR IGNORE INTO items \
                 (id, owner_id, media_ref, title, category, created_at) ",
            );
            builder.push_values(chunk, |mut b, item| {
                b.push_bind(&item.id)
                    .push_bind(&item.owner_id)
                    .push_bind(&item.media_ref)
                    .push_bind(&item.title)
                    .push_bind(item.category.as_str())
                    .push_bind(now);
            });
            let result = builder.build().execute(&mut *tx).await?;
            inserted += result.rows_affected() as usize;
        }

        tx.commit().await?;
        tracing::info!(
            profiles = seed.profiles.len(),
            items = inserted,
            "Imported seed data"
        );
        Ok((seed.profiles.len(), inserted))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{ItemCategory, UserType};

    fn profile(id: &str, name: Option<&str>) -> SeedProfile {
        SeedProfile {
            user_id: id.to_string(),
            display_name: name.map(str::to_string),
            photo_url: None,
            user_type: UserType::Startup,
            company: Some("Acme".to_string()),
            location: None,
            bio: None,
        }
    }

    fn seed_item(id: &str, owner: &str) -> SeedItem {
        SeedItem {
            id: id.to_string(),
            owner_id: owner.to_string(),
            media_ref: format!("media/{id}.mp4"),
            title: None,
            category: ItemCategory::Pitch,
        }
    }

    #[tokio::test]
    async fn test_candidates_exclude_own_items_in_insertion_order() {
        let db = Database::open(":memory:").await.unwrap();
        for (id, owner) in [("c", "u1"), ("a", "me"), ("b", "u2")] {
            assert!(db.insert_item(&seed_item(id, owner)).await.unwrap());
        }

        let items = db.list_candidates(&UserId::new("me")).await.unwrap();
        let ids: Vec<&str> = items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["c", "b"]);
        assert!(items.iter().all(|i| !i.liked_by_viewer && i.like_count == 0));
    }

    #[tokio::test]
    async fn test_insert_item_duplicate_is_ignored() {
        let db = Database::open(":memory:").await.unwrap();
        assert!(db.insert_item(&seed_item("v1", "u1")).await.unwrap());
        assert!(!db.insert_item(&seed_item("v1", "u2")).await.unwrap());
    }

    #[tokio::test]
    async fn test_profile_defaults_filled() {
        let db = Database::open(":memory:").await.unwrap();
        db.upsert_profile(&profile("u1", None)).await.unwrap();

        let p = db.get_profile(&UserId::new("u1")).await.unwrap().unwrap();
        assert_eq!(p.display_name, "Anonymous");
        assert_eq!(p.location, "Unknown");
        assert_eq!(p.user_type, UserType::Startup);
        assert_eq!(p.subtitle(), "Acme");

        assert!(db.get_profile(&UserId::new("nobody")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_import_seed_is_repeatable() {
        let db = Database::open(":memory:").await.unwrap();
        let seed = Seed {
            profiles: vec![profile("u1", Some("Ada")), profile("u2", Some("Grace"))],
            items: vec![seed_item("v1", "u1"), seed_item("v2", "u2")],
        };

        assert_eq!(db.import_seed(&seed).await.unwrap(), (2, 2));
        assert_eq!(db.import_seed(&seed).await.unwrap(), (2, 0));
        assert_eq!(db.list_candidates(&UserId::new("x")).await.unwrap().len(), 2);
    }
}
