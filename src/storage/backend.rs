//! Collaborator trait implementations backed by the local database.

use async_trait::async_trait;

use super::schema::Database;
use crate::engine::{
    ConnectionService, ContentItem, FeedSource, ItemId, LikeOutcome, LikeService, Profile,
    ProfileResolver, ServiceError, UserId, ViewRecorder,
};

#[async_trait]
impl FeedSource for Database {
    async fn list_candidates(&self, viewer: &UserId) -> Result<Vec<ContentItem>, ServiceError> {
        Ok(Database::list_candidates(self, viewer).await?)
    }
}

#[async_trait]
impl ProfileResolver for Database {
    async fn get_profile(&self, user: &UserId) -> Result<Option<Profile>, ServiceError> {
        Ok(Database::get_profile(self, user).await?)
    }
}

#[async_trait]
impl ConnectionService for Database {
    async fn request_connection(
        &self,
        from: &UserId,
        to: &UserId,
        from_profile: &Profile,
    ) -> Result<(), ServiceError> {
        Ok(Database::request_connection(self, from, to, from_profile).await?)
    }
}

#[async_trait]
impl LikeService for Database {
    async fn toggle_like(
        &self,
        item: &ItemId,
        viewer: &UserId,
    ) -> Result<LikeOutcome, ServiceError> {
        Ok(Database::toggle_like(self, item, viewer).await?)
    }
}

#[async_trait]
impl ViewRecorder for Database {
    async fn record_view(&self, item: &ItemId, viewer: &UserId) -> Result<(), ServiceError> {
        Ok(Database::record_view(self, item, viewer).await?)
    }
}
