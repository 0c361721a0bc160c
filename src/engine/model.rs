use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

// ============================================================================
// Identifiers
// ============================================================================

/// Identity of a content item.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub Arc<str>);

/// Identity of a user (item owner or viewer).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub Arc<str>);

impl ItemId {
    pub fn new(id: impl Into<Arc<str>>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl UserId {
    pub fn new(id: impl Into<Arc<str>>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// Profiles
// ============================================================================

/// Kind of account that owns a profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserType {
    Startup,
    Investor,
    #[default]
    Individual,
}

impl UserType {
    /// Stable lowercase name used in storage and seed files.
    pub fn as_str(self) -> &'static str {
        match self {
            UserType::Startup => "startup",
            UserType::Investor => "investor",
            UserType::Individual => "individual",
        }
    }

    /// Parse a stored name, falling back to `Individual` for anything unknown.
    pub fn parse_lossy(s: &str) -> Self {
        match s {
            "startup" => UserType::Startup,
            "investor" => UserType::Investor,
            _ => UserType::Individual,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            UserType::Startup => "Startup",
            UserType::Investor => "Investor",
            UserType::Individual => "Individual",
        }
    }
}

/// Display data for a user.
///
/// Every field except `user_id` is optional upstream; missing values are
/// filled with the defaults in [`Profile::placeholder`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub user_id: UserId,
    pub display_name: String,
    pub photo_url: Option<String>,
    #[serde(default)]
    pub user_type: UserType,
    pub company: Option<String>,
    pub location: String,
    pub bio: Option<String>,
}

impl Profile {
    /// Profile used when the resolver has no record for a user.
    pub fn placeholder(user_id: UserId) -> Self {
        Self {
            user_id,
            display_name: "Anonymous".to_string(),
            photo_url: None,
            user_type: UserType::Individual,
            company: None,
            location: "Unknown".to_string(),
            bio: None,
        }
    }

    /// Second line under the owner's name: the company for startups that
    /// have one, otherwise the location.
    pub fn subtitle(&self) -> &str {
        match (&self.user_type, &self.company) {
            (UserType::Startup, Some(company)) if !company.is_empty() => company,
            _ => &self.location,
        }
    }

    /// First letter of the display name, used when there is no photo.
    pub fn initial(&self) -> char {
        self.display_name
            .chars()
            .next()
            .map(|c| c.to_uppercase().next().unwrap_or(c))
            .unwrap_or('?')
    }
}

// ============================================================================
// Content Items
// ============================================================================

/// What an item is pitching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemCategory {
    #[default]
    Pitch,
    Investment,
}

impl ItemCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            ItemCategory::Pitch => "pitch",
            ItemCategory::Investment => "investment",
        }
    }

    pub fn parse_lossy(s: &str) -> Self {
        match s {
            "investment" => ItemCategory::Investment,
            _ => ItemCategory::Pitch,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ItemCategory::Pitch => "Pitch Video",
            ItemCategory::Investment => "Investment Opportunity",
        }
    }
}

/// Engagement counters as reported by the like service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LikeOutcome {
    pub like_count: u64,
    pub liked_by_viewer: bool,
}

/// A media item in the discovery feed.
///
/// `owner` starts out as a placeholder from the feed source and is replaced by
/// the resolved profile before the item reaches the cursor.
#[derive(Debug, Clone, PartialEq)]
pub struct ContentItem {
    pub id: ItemId,
    pub owner_id: UserId,
    pub media_ref: String,
    pub title: Option<String>,
    pub view_count: u64,
    pub like_count: u64,
    pub liked_by_viewer: bool,
    pub category: ItemCategory,
    pub owner: Profile,
}

impl ContentItem {
    /// Replace the like counters with authoritative values.
    pub fn apply_like(&mut self, outcome: LikeOutcome) {
        self.like_count = outcome.like_count;
        self.liked_by_viewer = outcome.liked_by_viewer;
    }
}
