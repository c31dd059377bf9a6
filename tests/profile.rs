//! Integration tests for player profiles: contact edits, ratings, confirmation and photos.

use chrono::{NaiveDate, NaiveTime, Utc};
use halisaha::logic::matches::create_match;
use halisaha::logic::profile::{confirm_player, get_player, update_player_photo, update_profile, ProfileUpdate};
use halisaha::logic::PlayerIdentity;
use halisaha::photos::PhotoStorage;
use halisaha::{db, register_player, AppError, DbPool, PlayerId};
use std::path::{Path, PathBuf};

async fn pool_with_players(n: usize) -> (DbPool, Vec<PlayerId>) {
    let pool = db::memory_pool().await.unwrap();
    let m = create_match(
        &pool,
        NaiveDate::from_ymd_opt(2024, 4, 25).unwrap(),
        NaiveTime::from_hms_opt(21, 0, 0).unwrap(),
        None,
        Utc::now(),
    )
    .await
    .unwrap();
    let mut ids = Vec::new();
    for i in 0..n {
        let who = PlayerIdentity {
            name: format!("P{i}"),
            phone: Some(format!("0755{i:04}")),
            ..Default::default()
        };
        ids.push(register_player(&pool, m.id, &who, 16, Utc::now()).await.unwrap().registration.player_id);
    }
    (pool, ids)
}

fn photo_dir() -> PathBuf {
    std::env::temp_dir().join(format!("halisaha-profile-{}", uuid::Uuid::new_v4()))
}

fn files_in(dir: &Path) -> usize {
    std::fs::read_dir(dir).map(|entries| entries.count()).unwrap_or(0)
}

fn file_for(dir: &Path, url: &str) -> PathBuf {
    dir.join(url.trim_start_matches("/photos/"))
}

#[tokio::test]
async fn replacing_a_photo_removes_the_old_file() {
    let (pool, ids) = pool_with_players(1).await;
    let dir = photo_dir();
    let photos = PhotoStorage::new(&dir);

    let first = update_player_photo(&pool, &photos, ids[0], "jpg", b"first").await.unwrap();
    let old_url = first.photo_url.unwrap();
    let second = update_player_photo(&pool, &photos, ids[0], "png", b"second").await.unwrap();
    let new_url = second.photo_url.unwrap();

    assert_ne!(old_url, new_url);
    assert!(!file_for(&dir, &old_url).exists());
    assert_eq!(std::fs::read(file_for(&dir, &new_url)).unwrap(), b"second");
    assert_eq!(files_in(&dir), 1);
    std::fs::remove_dir_all(dir).ok();
}

#[tokio::test]
async fn failed_photo_write_keeps_the_old_photo() {
    let (pool, ids) = pool_with_players(1).await;
    let dir = photo_dir();
    let photos = PhotoStorage::new(&dir);
    let old_url = update_player_photo(&pool, &photos, ids[0], "jpg", b"old")
        .await
        .unwrap()
        .photo_url
        .unwrap();

    sqlx::query(
        "CREATE TRIGGER reject_photo BEFORE UPDATE OF photo_url ON players
         BEGIN SELECT RAISE(ABORT, 'photo changes are locked'); END",
    )
    .execute(&pool)
    .await
    .unwrap();

    let result = update_player_photo(&pool, &photos, ids[0], "png", b"new").await;
    assert!(matches!(result, Err(AppError::Persistence(_))));

    assert_eq!(get_player(&pool, ids[0]).await.unwrap().photo_url.as_deref(), Some(old_url.as_str()));
    assert_eq!(std::fs::read(file_for(&dir, &old_url)).unwrap(), b"old");
    assert_eq!(files_in(&dir), 1);
    std::fs::remove_dir_all(dir).ok();
}

#[tokio::test]
async fn photo_for_an_unknown_player_uploads_nothing() {
    let (pool, _) = pool_with_players(0).await;
    let dir = photo_dir();
    let photos = PhotoStorage::new(&dir);
    assert!(matches!(
        update_player_photo(&pool, &photos, uuid::Uuid::new_v4(), "jpg", b"x").await,
        Err(AppError::NotFound("player"))
    ));
    assert_eq!(files_in(&dir), 0);
}

#[tokio::test]
async fn phone_must_stay_unique() {
    let (pool, ids) = pool_with_players(2).await;
    let taken = ProfileUpdate {
        phone: Some("07550001".to_string()),
        email: None,
    };
    assert!(matches!(
        update_profile(&pool, ids[0], &taken).await,
        Err(AppError::Validation(_))
    ));

    let update = ProfileUpdate {
        phone: Some(" 07999999 ".to_string()),
        email: Some("ali@example.com".to_string()),
    };
    let player = update_profile(&pool, ids[0], &update).await.unwrap();
    assert_eq!(player.phone, "07999999");
    assert_eq!(player.email.as_deref(), Some("ali@example.com"));

    let clear = ProfileUpdate {
        phone: None,
        email: Some(String::new()),
    };
    let player = update_profile(&pool, ids[0], &clear).await.unwrap();
    assert_eq!(player.phone, "07999999");
    assert_eq!(player.email, None);
}

#[tokio::test]
async fn confirming_sets_the_flag() {
    let (pool, ids) = pool_with_players(1).await;
    assert!(!get_player(&pool, ids[0]).await.unwrap().confirmed);
    assert!(confirm_player(&pool, ids[0]).await.unwrap().confirmed);
}
