//! Scripted in-memory collaborators for engine tests.

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tokio::time::Instant;

use pitchswipe::engine::{
    ConnectionService, ContentItem, EngineError, EngineEvent, EngineSettings, FeedEngine,
    FeedSource, ItemCategory, ItemId, LikeOutcome, LikeService, Profile, ProfileResolver,
    ServiceError, Services, ShareCapability, SharePayload, UserId, ViewRecorder,
};

pub const VIEWER: &str = "me";

#[derive(Default)]
pub struct FakeBackend {
    pub items: Mutex<Vec<ContentItem>>,
    pub profiles: Mutex<HashMap<UserId, Profile>>,
    likes: Mutex<HashSet<ItemId>>,

    pub fail_feed: AtomicBool,
    pub fail_profiles: AtomicBool,
    pub fail_connect: AtomicBool,
    pub fail_like: AtomicBool,
    pub fail_view: AtomicBool,
    pub panic_on_feed: AtomicBool,
    pub panic_on_connect: AtomicBool,
    pub panic_on_view: AtomicBool,

    pub feed_calls: AtomicUsize,
    pub connect_calls: AtomicUsize,
    pub like_calls: AtomicUsize,
    pub view_calls: AtomicUsize,

    pub connections: Mutex<Vec<(UserId, UserId, String)>>,
    pub recorded: Mutex<Vec<(ItemId, UserId)>>,
}

impl FakeBackend {
    pub fn with_items(items: Vec<ContentItem>) -> Arc<Self> {
        let backend = Self::default();
        *backend.items.lock().unwrap() = items;
        Arc::new(backend)
    }

    pub fn add_profile(&self, id: &str, name: &str) {
        let mut profile = Profile::placeholder(UserId::new(id));
        profile.display_name = name.to_string();
        self.profiles.lock().unwrap().insert(UserId::new(id), profile);
    }

    pub fn set(flag: &AtomicBool, on: bool) {
        flag.store(on, Ordering::SeqCst);
    }

    pub fn count(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FeedSource for FakeBackend {
    async fn list_candidates(&self, _viewer: &UserId) -> Result<Vec<ContentItem>, ServiceError> {
        self.feed_calls.fetch_add(1, Ordering::SeqCst);
        if self.panic_on_feed.load(Ordering::SeqCst) {
            panic!("feed exploded");
        }
        if self.fail_feed.load(Ordering::SeqCst) {
            return Err(ServiceError::Unavailable("feed offline".to_string()));
        }
        Ok(self.items.lock().unwrap().clone())
    }
}

#[async_trait]
impl ProfileResolver for FakeBackend {
    async fn get_profile(&self, user: &UserId) -> Result<Option<Profile>, ServiceError> {
        if self.fail_profiles.load(Ordering::SeqCst) {
            return Err(ServiceError::Unavailable("profiles offline".to_string()));
        }
        Ok(self.profiles.lock().unwrap().get(user).cloned())
    }
}

#[async_trait]
impl ConnectionService for FakeBackend {
    async fn request_connection(
        &self,
        from: &UserId,
        to: &UserId,
        from_profile: &Profile,
    ) -> Result<(), ServiceError> {
        self.connect_calls.fetch_add(1, Ordering::SeqCst);
        if self.panic_on_connect.load(Ordering::SeqCst) {
            panic!("connect exploded");
        }
        if self.fail_connect.load(Ordering::SeqCst) {
            return Err(ServiceError::Unavailable("connections offline".to_string()));
        }
        self.connections.lock().unwrap().push((
            from.clone(),
            to.clone(),
            from_profile.display_name.clone(),
        ));
        Ok(())
    }
}

#[async_trait]
impl LikeService for FakeBackend {
    async fn toggle_like(&self, item: &ItemId, _viewer: &UserId) -> Result<LikeOutcome, ServiceError> {
        self.like_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_like.load(Ordering::SeqCst) {
            return Err(ServiceError::Unavailable("likes offline".to_string()));
        }
        let mut items = self.items.lock().unwrap();
        let stored = items
            .iter_mut()
            .find(|i| &i.id == item)
            .ok_or_else(|| ServiceError::NotFound(item.to_string()))?;
        let mut likes = self.likes.lock().unwrap();
        let liked = if likes.remove(item) {
            stored.like_count -= 1;
            false
        } else {
            likes.insert(item.clone());
            stored.like_count += 1;
            true
        };
        Ok(LikeOutcome {
            like_count: stored.like_count,
            liked_by_viewer: liked,
        })
    }
}

#[async_trait]
impl ViewRecorder for FakeBackend {
    async fn record_view(&self, item: &ItemId, viewer: &UserId) -> Result<(), ServiceError> {
        self.view_calls.fetch_add(1, Ordering::SeqCst);
        if self.panic_on_view.load(Ordering::SeqCst) {
            panic!("recorder exploded");
        }
        if self.fail_view.load(Ordering::SeqCst) {
            return Err(ServiceError::Unavailable("recorder offline".to_string()));
        }
        self.recorded
            .lock()
            .unwrap()
            .push((item.clone(), viewer.clone()));
        Ok(())
    }
}

/// Share capability that remembers what it was handed.
#[derive(Default)]
pub struct RecordingShare {
    pub shared: Mutex<Vec<SharePayload>>,
}

impl ShareCapability for RecordingShare {
    fn share(&self, payload: &SharePayload) -> Result<(), EngineError> {
        self.shared.lock().unwrap().push(payload.clone());
        Ok(())
    }
}

pub fn item(id: &str, owner: &str) -> ContentItem {
    let owner_id = UserId::new(owner);
    ContentItem {
        id: ItemId::new(id),
        owner: Profile::placeholder(owner_id.clone()),
        owner_id,
        media_ref: format!("media/{id}.mp4"),
        title: Some(format!("Pitch {id}")),
        view_count: 0,
        like_count: 0,
        liked_by_viewer: false,
        category: ItemCategory::Pitch,
    }
}

pub fn engine_with(
    backend: Arc<FakeBackend>,
    share: Option<Arc<RecordingShare>>,
) -> (FeedEngine, mpsc::Receiver<EngineEvent>) {
    let (tx, rx) = mpsc::channel(32);
    let mut services = Services::from_backend(backend);
    if let Some(share) = share {
        services = services.with_share(share);
    }
    let engine = FeedEngine::new(UserId::new(VIEWER), EngineSettings::default(), services, tx);
    (engine, rx)
}

/// Wait for the next completion and apply it at `now`.
pub async fn pump(engine: &mut FeedEngine, rx: &mut mpsc::Receiver<EngineEvent>, now: Instant) {
    let event = rx.recv().await.expect("engine event channel closed");
    engine.handle_event(event, now);
}

/// Give spawned tasks a chance to run, then report whether anything arrived.
pub async fn nothing_pending(rx: &mut mpsc::Receiver<EngineEvent>) -> bool {
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
    rx.try_recv().is_err()
}
