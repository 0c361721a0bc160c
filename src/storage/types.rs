use serde::Deserialize;
use thiserror::Error;

use crate::engine::{
    ContentItem, ItemCategory, ItemId, Profile, ServiceError, UserId, UserType,
};

// ============================================================================
// Error Types
// ============================================================================

/// Database-specific errors with user-friendly messages
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Another instance of the application has locked the database
    #[error("Another instance of pitchswipe appears to be running. Please close it and try again.")]
    InstanceLocked,

    /// Migration failed
    #[error("Database migration failed: {0}")]
    Migration(String),

    /// Referenced row does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Request violates a constraint the caller can act on
    #[error("Rejected: {0}")]
    Rejected(String),

    /// Generic database error
    #[error("Database error: {0}")]
    Other(#[from] sqlx::Error),
}

impl DatabaseError {
    /// Check if a sqlx error indicates database locking
    pub(crate) fn from_sqlx(err: sqlx::Error) -> Self {
        let error_string = err.to_string().to_lowercase();

        // SQLITE_BUSY (5), SQLITE_LOCKED (6), SQLITE_CANTOPEN (14)
        if error_string.contains("database is locked")
            || error_string.contains("database table is locked")
            || error_string.contains("sqlite_busy")
            || error_string.contains("sqlite_locked")
            || error_string.contains("unable to open database file")
        {
            return DatabaseError::InstanceLocked;
        }

        DatabaseError::Other(err)
    }
}

impl From<DatabaseError> for ServiceError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::NotFound(what) => ServiceError::NotFound(what),
            DatabaseError::Rejected(why) => ServiceError::Rejected(why),
            DatabaseError::InstanceLocked => ServiceError::Unavailable(err.to_string()),
            other => ServiceError::Storage(other.to_string()),
        }
    }
}

// ============================================================================
// Row Types
// ============================================================================

/// Candidate row joined with the viewer's like flag
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct ItemRow {
    pub id: String,
    pub owner_id: String,
    pub media_ref: String,
    pub title: Option<String>,
    pub category: String,
    pub view_count: i64,
    pub like_count: i64,
    pub liked: bool,
}

impl ItemRow {
    /// Owner is a placeholder; the engine resolves the real profile.
    pub(crate) fn into_item(self) -> ContentItem {
        let owner_id = UserId::new(self.owner_id);
        ContentItem {
            id: ItemId::new(self.id),
            owner: Profile::placeholder(owner_id.clone()),
            owner_id,
            media_ref: self.media_ref,
            title: self.title,
            view_count: u64::try_from(self.view_count).unwrap_or(0),
            like_count: u64::try_from(self.like_count).unwrap_or(0),
            liked_by_viewer: self.liked,
            category: ItemCategory::parse_lossy(&self.category),
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct ProfileRow {
    pub user_id: String,
    pub display_name: Option<String>,
    pub photo_url: Option<String>,
    pub user_type: String,
    pub company: Option<String>,
    pub location: Option<String>,
    pub bio: Option<String>,
}

impl ProfileRow {
    /// Fill missing display fields with the placeholder defaults.
    pub(crate) fn into_profile(self) -> Profile {
        let defaults = Profile::placeholder(UserId::new(self.user_id));
        Profile {
            display_name: self
                .display_name
                .filter(|n| !n.trim().is_empty())
                .unwrap_or(defaults.display_name),
            photo_url: self.photo_url,
            user_type: UserType::parse_lossy(&self.user_type),
            company: self.company,
            location: self
                .location
                .filter(|l| !l.trim().is_empty())
                .unwrap_or(defaults.location),
            bio: self.bio,
            user_id: defaults.user_id,
        }
    }
}

// ============================================================================
// Seed Data
// ============================================================================

/// Fixture file imported with `--seed`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Seed {
    pub profiles: Vec<SeedProfile>,
    pub items: Vec<SeedItem>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeedProfile {
    pub user_id: String,
    pub display_name: Option<String>,
    pub photo_url: Option<String>,
    #[serde(default)]
    pub user_type: UserType,
    pub company: Option<String>,
    pub location: Option<String>,
    pub bio: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeedItem {
    pub id: String,
    pub owner_id: String,
    pub media_ref: String,
    pub title: Option<String>,
    #[serde(default)]
    pub category: ItemCategory,
}
