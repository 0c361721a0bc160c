use super::schema::Database;
use super::types::DatabaseError;
use crate::engine::{ItemId, LikeOutcome, Profile, UserId};

impl Database {
    // ========================================================================
    // Likes
    // ========================================================================

    /// Flip the viewer's like on `item` and return the authoritative state.
    pub async fn toggle_like(
        &self,
        item: &ItemId,
        viewer: &UserId,
    ) -> Result<LikeOutcome, DatabaseError> {
        let mut tx = self.pool.begin().await?;

        let exists: Option<(i64,)> = sqlx::query_as("SELECT 1 FROM items WHERE id = ?")
            .bind(item.as_str())
            .fetch_optional(&mut *tx)
            .await?;
        if exists.is_none() {
            return Err(DatabaseError::NotFound(format!("item {item}")));
        }

        let removed = sqlx::query("DELETE FROM likes WHERE item_id = ? AND viewer_id = ?")
            .bind(item.as_str())
            .bind(viewer.as_str())
            .execute(&mut *tx)
            .await?
            .rows_affected()
            > 0;

        if removed {
            sqlx::query("UPDATE items SET like_count = MAX(like_count - 1, 0) WHERE id = ?")
                .bind(item.as_str())
                .execute(&mut *tx)
                .await?;
        } else {
            sqlx::query("INSERT INTO likes (item_id, viewer_id, created_at) VALUES (?, ?, ?)")
                .bind(item.as_str())
                .bind(viewer.as_str())
                .bind(chrono::Utc::now().timestamp())
                .execute(&mut *tx)
                .await?;
            sqlx::query("UPDATE items SET like_count = like_count + 1 WHERE id = ?")
                .bind(item.as_str())
                .execute(&mut *tx)
                .await?;
        }

        let (like_count,): (i64,) = sqlx::query_as("SELECT like_count FROM items WHERE id = ?")
            .bind(item.as_str())
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(LikeOutcome {
            like_count: u64::try_from(like_count).unwrap_or(0),
            liked_by_viewer: !removed,
        })
    }

    // ========================================================================
    // Connections
    // ========================================================================

    /// Record a pending connection request from `from` to `to`.
    ///
    /// Self-connection and a second request to the same owner are rejected.
    pub async fn request_connection(
        &self,
        from: &UserId,
        to: &UserId,
        from_profile: &Profile,
    ) -> Result<(), DatabaseError> {
        if from == to {
            return Err(DatabaseError::Rejected(
                "cannot connect with yourself".to_string(),
            ));
        }

        let result = sqlx::query(
            "INSERT INTO connection_requests (from_id, to_id, from_name, from_type, status, created_at) \
             VALUES (?, ?, ?, ?, 'pending', ?) \
             ON CONFLICT(from_id, to_id) DO NOTHING",
        )
        .bind(from.as_str())
        .bind(to.as_str())
        .bind(&from_profile.display_name)
        .bind(from_profile.user_type.as_str())
        .bind(chrono::Utc::now().timestamp())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::Rejected(format!(
                "connection request to {to} already sent"
            )));
        }
        Ok(())
    }

    /// Pending requests addressed to `to`, oldest first, as (from, from_name).
    pub async fn pending_requests(&self, to: &UserId) -> Result<Vec<(String, String)>, DatabaseError> {
        let rows: Vec<(String, String)> = sqlx::query_as(
            "SELECT from_id, from_name FROM connection_requests \
             WHERE to_id = ? AND status = 'pending' ORDER BY created_at, id",
        )
        .bind(to.as_str())
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    // ========================================================================
    // Views
    // ========================================================================

    /// Append a durable view and bump the item's view counter.
    pub async fn record_view(&self, item: &ItemId, viewer: &UserId) -> Result<(), DatabaseError> {
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query("UPDATE items SET view_count = view_count + 1 WHERE id = ?")
            .bind(item.as_str())
            .execute(&mut *tx)
            .await?
            .rows_affected();
        if updated == 0 {
            return Err(DatabaseError::NotFound(format!("item {item}")));
        }

        sqlx::query("INSERT INTO views (item_id, viewer_id, viewed_at) VALUES (?, ?, ?)")
            .bind(item.as_str())
            .bind(viewer.as_str())
            .bind(chrono::Utc::now().timestamp())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    pub async fn view_count(&self, item: &ItemId) -> Result<u64, DatabaseError> {
        let row: Option<(i64,)> = sqlx::query_as("SELECT view_count FROM items WHERE id = ?")
            .bind(item.as_str())
            .fetch_optional(&self.pool)
            .await?;
        match row {
            Some((count,)) => Ok(u64::try_from(count).unwrap_or(0)),
            None => Err(DatabaseError::NotFound(format!("item {item}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::types::SeedItem;
    use crate::engine::ItemCategory;

    async fn db_with_item(id: &str, owner: &str) -> Database {
        let db = Database::open(":memory:").await.unwrap();
        db.insert_item(&SeedItem {
            id: id.to_string(),
            owner_id: owner.to_string(),
            media_ref: "m".to_string(),
            title: None,
            category: ItemCategory::Pitch,
        })
        .await
        .unwrap();
        db
    }

    #[tokio::test]
    async fn test_toggle_like_round_trip() {
        let db = db_with_item("v1", "u1").await;
        let item = ItemId::new("v1");
        let me = UserId::new("me");

        let first = db.toggle_like(&item, &me).await.unwrap();
        assert_eq!(first, LikeOutcome { like_count: 1, liked_by_viewer: true });

        let second = db.toggle_like(&item, &me).await.unwrap();
        assert_eq!(second, LikeOutcome { like_count: 0, liked_by_viewer: false });
    }

    #[tokio::test]
    async fn test_like_flag_visible_in_candidates() {
        let db = db_with_item("v1", "u1").await;
        db.toggle_like(&ItemId::new("v1"), &UserId::new("me")).await.unwrap();

        let mine = db.list_candidates(&UserId::new("me")).await.unwrap();
        assert!(mine[0].liked_by_viewer);
        assert_eq!(mine[0].like_count, 1);

        let theirs = db.list_candidates(&UserId::new("other")).await.unwrap();
        assert!(!theirs[0].liked_by_viewer);
        assert_eq!(theirs[0].like_count, 1);
    }

    #[tokio::test]
    async fn test_toggle_like_missing_item() {
        let db = Database::open(":memory:").await.unwrap();
        let err = db
            .toggle_like(&ItemId::new("nope"), &UserId::new("me"))
            .await
            .unwrap_err();
        assert!(matches!(err, DatabaseError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_connection_rejections() {
        let db = Database::open(":memory:").await.unwrap();
        let me = UserId::new("me");
        let owner = UserId::new("u1");
        let profile = Profile::placeholder(me.clone());

        db.request_connection(&me, &owner, &profile).await.unwrap();
        let dup = db.request_connection(&me, &owner, &profile).await.unwrap_err();
        assert!(matches!(dup, DatabaseError::Rejected(_)));

        let own = db.request_connection(&me, &me, &profile).await.unwrap_err();
        assert!(matches!(own, DatabaseError::Rejected(_)));

        let pending = db.pending_requests(&owner).await.unwrap();
        assert_eq!(pending, vec![("me".to_string(), "Anonymous".to_string())]);
    }

    #[tokio::test]
    async fn test_record_view_counts() {
        let db = db_with_item("v1", "u1").await;
        let item = ItemId::new("v1");
        db.record_view(&item, &UserId::new("me")).await.unwrap();
        db.record_view(&item, &UserId::new("you")).await.unwrap();
        assert_eq!(db.view_count(&item).await.unwrap(), 2);

        let err = db
            .record_view(&ItemId::new("gone"), &UserId::new("me"))
            .await
            .unwrap_err();
        assert!(matches!(err, DatabaseError::NotFound(_)));
    }
}
