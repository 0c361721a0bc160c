//! The SQLite store acting as every engine collaborator.
//!
//! Each test creates its own in-memory database for isolation.

use pitchswipe::engine::{
    ActionKind, EngineError, EngineEvent, EngineSettings, FeedEngine, FeedbackState, ItemCategory,
    ItemId, LoadState, ServiceError, Services, UserId, UserType, VisibilityEvent,
};
use pitchswipe::storage::{Database, Seed};
use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;

const SEED: &str = r#"{
    "profiles": [
        {"user_id": "ada", "display_name": "Ada", "user_type": "startup", "company": "Analytical Engines"},
        {"user_id": "bob", "display_name": "Bob", "user_type": "investor", "location": "Lisbon"},
        {"user_id": "me", "display_name": "Viewer"}
    ],
    "items": [
        {"id": "v1", "owner_id": "ada", "media_ref": "media/v1.mp4", "title": "Steam compute"},
        {"id": "v2", "owner_id": "me", "media_ref": "media/v2.mp4"},
        {"id": "v3", "owner_id": "bob", "media_ref": "media/v3.mp4", "category": "investment"}
    ]
}"#;

async fn seeded_db() -> Database {
    let db = Database::open(":memory:").await.unwrap();
    let seed: Seed = serde_json::from_str(SEED).unwrap();
    assert_eq!(db.import_seed(&seed).await.unwrap(), (3, 3));
    db
}

async fn loaded_engine(db: Database) -> (FeedEngine, mpsc::Receiver<EngineEvent>) {
    let (tx, mut rx) = mpsc::channel(32);
    let services = Services::from_backend(Arc::new(db));
    let mut engine = FeedEngine::new(UserId::new("me"), EngineSettings::default(), services, tx);
    engine.refresh();
    let event = rx.recv().await.unwrap();
    engine.handle_event(event, Instant::now());
    assert_eq!(engine.load_state(), &LoadState::Ready);
    (engine, rx)
}

async fn pump(engine: &mut FeedEngine, rx: &mut mpsc::Receiver<EngineEvent>, now: Instant) {
    let event = rx.recv().await.unwrap();
    engine.handle_event(event, now);
}

#[tokio::test]
async fn test_feed_from_database() {
    let (engine, _rx) = loaded_engine(seeded_db().await).await;

    let items = engine.cursor().items();
    let ids: Vec<&str> = items.iter().map(|i| i.id.as_str()).collect();
    assert_eq!(ids, vec!["v1", "v3"]);

    assert_eq!(items[0].owner.display_name, "Ada");
    assert_eq!(items[0].owner.user_type, UserType::Startup);
    assert_eq!(items[0].owner.subtitle(), "Analytical Engines");
    assert_eq!(items[1].owner.subtitle(), "Lisbon");
    assert_eq!(items[1].category, ItemCategory::Investment);
}

#[tokio::test]
async fn test_like_round_trip_through_engine() {
    let db = seeded_db().await;
    let (mut engine, mut rx) = loaded_engine(db.clone()).await;
    let now = Instant::now();

    engine.dispatch(ActionKind::Like, now);
    pump(&mut engine, &mut rx, now).await;
    let current = engine.current().unwrap();
    assert!(current.liked_by_viewer);
    assert_eq!(current.like_count, 1);

    // A fresh load sees the stored like
    let stored = db.list_candidates(&UserId::new("me")).await.unwrap();
    assert!(stored[0].liked_by_viewer);

    engine.dispatch(ActionKind::Like, now);
    pump(&mut engine, &mut rx, now).await;
    assert!(!engine.current().unwrap().liked_by_viewer);
    assert_eq!(engine.current().unwrap().like_count, 0);
}

#[tokio::test]
async fn test_connect_then_duplicate_is_rejected() {
    let db = seeded_db().await;
    let (mut engine, mut rx) = loaded_engine(db.clone()).await;
    let t0 = Instant::now();

    engine.dispatch(ActionKind::Connect, t0);
    pump(&mut engine, &mut rx, t0).await;
    engine.fire_due(t0 + Duration::from_millis(800));
    assert_eq!(engine.cursor().position(), 1);
    assert_eq!(
        db.pending_requests(&UserId::new("ada")).await.unwrap(),
        vec![("me".to_string(), "Viewer".to_string())]
    );

    // Reload and try the same owner again
    engine.refresh();
    pump(&mut engine, &mut rx, t0).await;
    let t1 = t0 + Duration::from_secs(2);
    engine.dispatch(ActionKind::Connect, t1);
    pump(&mut engine, &mut rx, t1).await;

    assert_eq!(engine.feedback_for(&ItemId::new("v1")), FeedbackState::ConnectError);
    assert!(matches!(
        engine.take_error(),
        Some(EngineError::Action {
            action: ActionKind::Connect,
            source: ServiceError::Rejected(_),
        })
    ));
    engine.fire_due(t1 + Duration::from_millis(1500));
    assert_eq!(engine.cursor().position(), 0);
}

#[tokio::test]
async fn test_view_recorded_in_database() {
    let db = seeded_db().await;
    let (mut engine, mut rx) = loaded_engine(db.clone()).await;
    let t0 = Instant::now();
    let v1 = ItemId::new("v1");

    engine.handle_visibility(&VisibilityEvent::enter(v1.clone()), t0);
    engine.fire_due(t0 + Duration::from_millis(3100));
    pump(&mut engine, &mut rx, t0 + Duration::from_millis(3100)).await;

    assert_eq!(db.view_count(&v1).await.unwrap(), 1);
    assert_eq!(db.view_count(&ItemId::new("v3")).await.unwrap(), 0);
}

#[tokio::test]
async fn test_missing_profile_gets_placeholder() {
    let db = Database::open(":memory:").await.unwrap();
    let seed: Seed = serde_json::from_str(
        r#"{"items": [{"id": "x1", "owner_id": "nobody", "media_ref": "m"}]}"#,
    )
    .unwrap();
    db.import_seed(&seed).await.unwrap();

    let (engine, _rx) = loaded_engine(db).await;
    let owner = &engine.current().unwrap().owner;
    assert_eq!(owner.display_name, "Anonymous");
    assert_eq!(owner.subtitle(), "Unknown");
}
