//! Collaborator contracts the engine is written against.
//!
//! Each trait is a single request/response capability. The engine never
//! assumes a transport; [`crate::storage::Database`] implements all of them
//! for the terminal host, and tests use scripted in-memory fakes.

use async_trait::async_trait;
use std::sync::Arc;

use super::error::{EngineError, ServiceError};
use super::model::{ContentItem, ItemId, LikeOutcome, Profile, UserId};

/// Source of candidate items for a viewer.
#[async_trait]
pub trait FeedSource: Send + Sync {
    /// Items the viewer may be shown, excluding the viewer's own. Owner
    /// profiles may be placeholders; the engine decorates them.
    async fn list_candidates(&self, viewer: &UserId) -> Result<Vec<ContentItem>, ServiceError>;
}

/// Lookup of user display data.
#[async_trait]
pub trait ProfileResolver: Send + Sync {
    /// `Ok(None)` when the user has no profile record.
    async fn get_profile(&self, user: &UserId) -> Result<Option<Profile>, ServiceError>;
}

/// Outbound connection requests.
#[async_trait]
pub trait ConnectionService: Send + Sync {
    async fn request_connection(
        &self,
        from: &UserId,
        to: &UserId,
        from_profile: &Profile,
    ) -> Result<(), ServiceError>;
}

/// Like toggling. The service, not the caller, owns the resulting count.
#[async_trait]
pub trait LikeService: Send + Sync {
    async fn toggle_like(&self, item: &ItemId, viewer: &UserId)
        -> Result<LikeOutcome, ServiceError>;
}

/// Durable view recording.
#[async_trait]
pub trait ViewRecorder: Send + Sync {
    async fn record_view(&self, item: &ItemId, viewer: &UserId) -> Result<(), ServiceError>;
}

/// What gets handed to the platform share sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SharePayload {
    pub title: String,
    pub text: String,
    pub url: String,
}

/// Optional platform share primitive.
pub trait ShareCapability: Send + Sync {
    fn share(&self, payload: &SharePayload) -> Result<(), EngineError>;
}

/// Bundle of collaborators handed to the engine.
#[derive(Clone)]
pub struct Services {
    pub feed: Arc<dyn FeedSource>,
    pub profiles: Arc<dyn ProfileResolver>,
    pub connections: Arc<dyn ConnectionService>,
    pub likes: Arc<dyn LikeService>,
    pub views: Arc<dyn ViewRecorder>,
    pub share: Option<Arc<dyn ShareCapability>>,
}

impl Services {
    /// Use one backend for every remote collaborator.
    pub fn from_backend<B>(backend: Arc<B>) -> Self
    where
        B: FeedSource + ProfileResolver + ConnectionService + LikeService + ViewRecorder + 'static,
    {
        Self {
            feed: backend.clone(),
            profiles: backend.clone(),
            connections: backend.clone(),
            likes: backend.clone(),
            views: backend,
            share: None,
        }
    }

    pub fn with_share(mut self, share: Arc<dyn ShareCapability>) -> Self {
        self.share = Some(share);
        self
    }
}
