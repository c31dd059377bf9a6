//! Integration tests for the registration state machine: capacity, waitlist, cancel and promotion.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use halisaha::logic::matches::create_match;
use halisaha::logic::profile::{list_players, player_by_phone};
use halisaha::logic::{PlayerIdentity, RegistrationOutcome};
use halisaha::{
    active_player_count, cancel_registration, cancel_with_promotion, db, match_roster, promote_from_waitlist,
    register_player, remove_player_from_match, waitlist, waitlist_position, AppError, DbPool, MatchId, Position,
    Registration, RegistrationStatus, Tables,
};

const CAPACITY: usize = 16;

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 4, 22, 9, 0, 0).unwrap()
}

fn at(secs: i64) -> DateTime<Utc> {
    t0() + Duration::seconds(secs)
}

async fn new_match(pool: &DbPool, date: NaiveDate) -> MatchId {
    create_match(pool, date, NaiveTime::from_hms_opt(21, 0, 0).unwrap(), Some(750), t0())
        .await
        .unwrap()
        .id
}

async fn pool_with_match() -> (DbPool, MatchId) {
    let pool = db::memory_pool().await.unwrap();
    let m = new_match(&pool, NaiveDate::from_ymd_opt(2024, 4, 25).unwrap()).await;
    (pool, m)
}

fn identity(n: usize) -> PlayerIdentity {
    PlayerIdentity {
        name: format!("P{n}"),
        phone: Some(format!("07000000{n:03}")),
        email: None,
        position: Position::Midfielder,
    }
}

/// Registers P1..=Pn one second apart.
async fn fill(pool: &DbPool, match_id: MatchId, n: usize) {
    for i in 1..=n {
        register_player(pool, match_id, &identity(i), CAPACITY, at(i as i64))
            .await
            .unwrap();
    }
}

async fn registration_of(pool: &DbPool, match_id: MatchId, n: usize) -> Registration {
    let player = player_by_phone(pool, &format!("07000000{n:03}")).await.unwrap();
    sqlx::query_as::<_, Registration>("SELECT * FROM registrations WHERE match_id = ? AND player_id = ?")
        .bind(match_id)
        .bind(player.id)
        .fetch_one(pool)
        .await
        .unwrap()
}

async fn tables(pool: &DbPool, match_id: MatchId) -> Tables {
    let mut conn = pool.acquire().await.unwrap();
    Tables::load_match(&mut conn, match_id).await.unwrap()
}

async fn registration_count(pool: &DbPool) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM registrations")
        .fetch_one(pool)
        .await
        .unwrap()
}

#[tokio::test]
async fn seventeenth_player_is_waitlisted() {
    let (pool, m) = pool_with_match().await;
    fill(&pool, m, 16).await;
    let result = register_player(&pool, m, &identity(17), CAPACITY, at(17)).await.unwrap();
    assert_eq!(result.outcome, RegistrationOutcome::Waitlisted);
    assert_eq!(result.registration.status, RegistrationStatus::Waitlist);
    assert_eq!(result.waitlist_position, Some(1));
    assert_eq!(active_player_count(&pool, m).await.unwrap(), 16);
}

#[tokio::test]
async fn registration_reports_its_waitlist_rank() {
    let (pool, m) = pool_with_match().await;
    fill(&pool, m, 16).await;
    let p17 = register_player(&pool, m, &identity(17), CAPACITY, at(17)).await.unwrap();
    let p18 = register_player(&pool, m, &identity(18), CAPACITY, at(18)).await.unwrap();
    let p1 = register_player(&pool, m, &identity(1), CAPACITY, at(19)).await.unwrap();

    assert_eq!(p17.waitlist_position, Some(1));
    assert_eq!(p18.waitlist_position, Some(2));
    assert_eq!(p1.outcome, RegistrationOutcome::AlreadyRegistered);
    assert_eq!(p1.waitlist_position, None);

    let again = register_player(&pool, m, &identity(18), CAPACITY, at(20)).await.unwrap();
    assert_eq!(again.outcome, RegistrationOutcome::AlreadyRegistered);
    assert_eq!(again.waitlist_position, Some(2));
}

#[tokio::test]
async fn canceling_an_active_player_promotes_the_waitlist_head() {
    let (pool, m) = pool_with_match().await;
    fill(&pool, m, 17).await;
    let p3 = registration_of(&pool, m, 3).await;

    assert_eq!(cancel_registration(&pool, p3.id, at(100)).await.unwrap(), Some(m));
    let promoted = promote_from_waitlist(&pool, m, CAPACITY).await.unwrap();

    let p17 = registration_of(&pool, m, 17).await;
    assert_eq!(promoted, Some(p17.id));
    assert_eq!(p17.status, RegistrationStatus::Active);
    assert!(waitlist(&tables(&pool, m).await, m).is_empty());
    assert_eq!(active_player_count(&pool, m).await.unwrap(), 16);
    assert_eq!(registration_of(&pool, m, 3).await.canceled_at, Some(at(100)));
}

#[tokio::test]
async fn only_the_earliest_waitlisted_entry_is_promoted() {
    let (pool, m) = pool_with_match().await;
    fill(&pool, m, 18).await;
    let p1 = registration_of(&pool, m, 1).await;
    cancel_registration(&pool, p1.id, at(100)).await.unwrap();
    promote_from_waitlist(&pool, m, CAPACITY).await.unwrap();

    assert_eq!(registration_of(&pool, m, 17).await.status, RegistrationStatus::Active);
    let p18 = registration_of(&pool, m, 18).await;
    assert_eq!(p18.status, RegistrationStatus::Waitlist);
    assert_eq!(waitlist_position(&tables(&pool, m).await, p18.id).unwrap(), Some(1));
}

#[tokio::test]
async fn canceling_a_waitlisted_entry_in_a_full_match_promotes_nobody() {
    let (pool, m) = pool_with_match().await;
    fill(&pool, m, 18).await;
    let p17 = registration_of(&pool, m, 17).await;
    cancel_registration(&pool, p17.id, at(100)).await.unwrap();

    assert_eq!(promote_from_waitlist(&pool, m, CAPACITY).await.unwrap(), None);
    assert_eq!(registration_of(&pool, m, 18).await.status, RegistrationStatus::Waitlist);
    assert_eq!(active_player_count(&pool, m).await.unwrap(), 16);
}

#[tokio::test]
async fn registering_twice_changes_nothing() {
    let (pool, m) = pool_with_match().await;
    let first = register_player(&pool, m, &identity(1), CAPACITY, at(1)).await.unwrap();
    let second = register_player(&pool, m, &identity(1), CAPACITY, at(50)).await.unwrap();

    assert_eq!(second.outcome, RegistrationOutcome::AlreadyRegistered);
    assert_eq!(second.registration, first.registration);
    assert_eq!(registration_count(&pool).await, 1);
    assert_eq!(list_players(&pool).await.unwrap().len(), 1);
}

#[tokio::test]
async fn reactivation_resets_registered_at() {
    let (pool, m) = pool_with_match().await;
    let first = register_player(&pool, m, &identity(1), CAPACITY, at(1)).await.unwrap();
    cancel_registration(&pool, first.registration.id, at(10)).await.unwrap();

    let again = register_player(&pool, m, &identity(1), CAPACITY, at(20)).await.unwrap();
    assert_eq!(again.outcome, RegistrationOutcome::Reactivated);
    assert_eq!(again.registration.id, first.registration.id);
    assert_eq!(again.registration.status, RegistrationStatus::Active);
    assert_eq!(again.registration.registered_at, at(20));
    assert_eq!(again.registration.canceled_at, None);
}

#[tokio::test]
async fn reactivation_into_a_full_match_goes_to_the_waitlist() {
    let (pool, m) = pool_with_match().await;
    fill(&pool, m, 16).await;
    let p1 = registration_of(&pool, m, 1).await;
    cancel_registration(&pool, p1.id, at(100)).await.unwrap();
    register_player(&pool, m, &identity(17), CAPACITY, at(110)).await.unwrap();

    let again = register_player(&pool, m, &identity(1), CAPACITY, at(120)).await.unwrap();
    assert_eq!(again.outcome, RegistrationOutcome::Reactivated);
    assert_eq!(again.registration.status, RegistrationStatus::Waitlist);
    assert_eq!(again.waitlist_position, Some(1));
}

#[tokio::test]
async fn canceling_twice_is_a_no_op() {
    let (pool, m) = pool_with_match().await;
    let r = register_player(&pool, m, &identity(1), CAPACITY, at(1)).await.unwrap();
    assert_eq!(cancel_registration(&pool, r.registration.id, at(10)).await.unwrap(), Some(m));
    assert_eq!(cancel_registration(&pool, r.registration.id, at(20)).await.unwrap(), None);
    assert_eq!(registration_of(&pool, m, 1).await.canceled_at, Some(at(10)));
    assert!(matches!(
        cancel_registration(&pool, uuid::Uuid::new_v4(), at(30)).await,
        Err(AppError::NotFound("registration"))
    ));
}

#[tokio::test]
async fn blank_name_is_rejected() {
    let (pool, m) = pool_with_match().await;
    let mut who = identity(1);
    who.name = "   ".to_string();
    assert!(matches!(
        register_player(&pool, m, &who, CAPACITY, at(1)).await,
        Err(AppError::Validation(_))
    ));
    assert!(list_players(&pool).await.unwrap().is_empty());
}

#[tokio::test]
async fn unknown_match_is_not_found_and_creates_no_player() {
    let (pool, _) = pool_with_match().await;
    assert!(matches!(
        register_player(&pool, uuid::Uuid::new_v4(), &identity(1), CAPACITY, at(1)).await,
        Err(AppError::NotFound("match"))
    ));
    assert!(list_players(&pool).await.unwrap().is_empty());
}

#[tokio::test]
async fn missing_phone_gets_a_placeholder() {
    let (pool, m) = pool_with_match().await;
    let who = PlayerIdentity {
        name: "Guest".to_string(),
        ..Default::default()
    };
    register_player(&pool, m, &who, CAPACITY, at(1)).await.unwrap();
    assert!(list_players(&pool).await.unwrap()[0].has_placeholder_phone());
}

#[tokio::test]
async fn known_phone_reuses_the_player_and_refreshes_the_name() {
    let (pool, m) = pool_with_match().await;
    register_player(&pool, m, &identity(1), CAPACITY, at(1)).await.unwrap();
    let mut renamed = identity(1);
    renamed.name = "Renamed".to_string();
    renamed.position = Position::Goalkeeper;

    let next_week = new_match(&pool, NaiveDate::from_ymd_opt(2024, 5, 2).unwrap()).await;
    register_player(&pool, next_week, &renamed, CAPACITY, at(6)).await.unwrap();

    let players = list_players(&pool).await.unwrap();
    assert_eq!(players.len(), 1);
    assert_eq!(players[0].name, "Renamed");
    assert_eq!(players[0].position, Position::Goalkeeper);
}

#[tokio::test]
async fn roster_lists_active_then_waitlist_then_canceled() {
    let (pool, m) = pool_with_match().await;
    fill(&pool, m, 18).await;
    let p2 = registration_of(&pool, m, 2).await;
    cancel_registration(&pool, p2.id, at(100)).await.unwrap();

    let roster = match_roster(&pool, m).await.unwrap();
    assert_eq!(roster.len(), 18);
    let statuses: Vec<RegistrationStatus> = roster.iter().map(|p| p.status).collect();
    assert!(statuses[..15].iter().all(|s| *s == RegistrationStatus::Active));
    assert_eq!(&statuses[15..], &[
        RegistrationStatus::Waitlist,
        RegistrationStatus::Waitlist,
        RegistrationStatus::Canceled
    ]);
    assert_eq!(roster[15].name, "P17");
    assert_eq!(roster[15].waitlist_position, Some(1));
    assert_eq!(roster[16].waitlist_position, Some(2));
    assert_eq!(roster[17].name, "P2");
}

#[tokio::test]
async fn removing_a_player_deletes_the_registration_without_promotion() {
    let (pool, m) = pool_with_match().await;
    fill(&pool, m, 17).await;
    let p1 = registration_of(&pool, m, 1).await;
    remove_player_from_match(&pool, m, p1.player_id).await.unwrap();

    assert_eq!(registration_count(&pool).await, 16);
    assert_eq!(active_player_count(&pool, m).await.unwrap(), 15);
    assert_eq!(registration_of(&pool, m, 17).await.status, RegistrationStatus::Waitlist);
    assert!(matches!(
        remove_player_from_match(&pool, m, p1.player_id).await,
        Err(AppError::NotFound(_))
    ));
}

#[tokio::test]
async fn cancel_with_promotion_runs_both_steps() {
    let (pool, m) = pool_with_match().await;
    fill(&pool, m, 17).await;
    let p5 = registration_of(&pool, m, 5).await;
    let p17 = registration_of(&pool, m, 17).await;

    let result = cancel_with_promotion(&pool, p5.id, CAPACITY, at(200)).await.unwrap();
    assert_eq!(result.canceled, p5.id);
    assert_eq!(result.promoted, Some(p17.id));
    assert_eq!(registration_of(&pool, m, 17).await.status, RegistrationStatus::Active);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_registrations_fill_only_the_last_slot() {
    let path = std::env::temp_dir().join(format!("halisaha-race-{}.db", uuid::Uuid::new_v4()));
    let pool = db::create_pool(&format!("sqlite:{}", path.display())).await.unwrap();
    db::run_migrations(&pool).await.unwrap();
    let m = new_match(&pool, NaiveDate::from_ymd_opt(2024, 4, 25).unwrap()).await;
    fill(&pool, m, CAPACITY - 1).await;

    let contenders: Vec<_> = (0..8)
        .map(|i| {
            let pool = pool.clone();
            tokio::spawn(async move {
                register_player(&pool, m, &identity(100 + i), CAPACITY, at(1000 + i as i64)).await
            })
        })
        .collect();
    let mut outcomes = Vec::new();
    for handle in contenders {
        outcomes.push(handle.await.unwrap().unwrap().outcome);
    }

    let admitted = outcomes.iter().filter(|o| **o == RegistrationOutcome::Admitted).count();
    let waitlisted = outcomes.iter().filter(|o| **o == RegistrationOutcome::Waitlisted).count();
    assert_eq!(admitted, 1);
    assert_eq!(waitlisted, 7);
    assert_eq!(active_player_count(&pool, m).await.unwrap(), CAPACITY);

    pool.close().await;
    for suffix in ["", "-wal", "-shm"] {
        std::fs::remove_file(format!("{}{suffix}", path.display())).ok();
    }
}
