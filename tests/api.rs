//! HTTP-level tests: routes, JSON shapes and error mapping over an in-memory database.

use actix_web::{http::StatusCode, test, web, App};
use halisaha::api::{self, AppState};
use serde_json::{json, Value};
use std::path::PathBuf;

fn photo_dir() -> PathBuf {
    let dir = std::env::temp_dir().join(format!("halisaha-api-{}", uuid::Uuid::new_v4()));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

macro_rules! app {
    ($dir:expr) => {
        test::init_service(App::new().configure(api::configure(web::Data::new(AppState::in_memory($dir).await.unwrap())))).await
    };
}

#[actix_web::test]
async fn health_reports_ok() {
    let app = app!(photo_dir());
    let req = test::TestRequest::get().uri("/api/health").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["ok"], true);
}

#[actix_web::test]
async fn full_match_waitlists_and_cancel_promotes() {
    let app = app!(photo_dir());
    let req = test::TestRequest::post()
        .uri("/api/matches")
        .set_json(json!({ "date": "2024-04-25" }))
        .to_request();
    let m: Value = test::call_and_read_body_json(&app, req).await;
    let match_id = m["id"].as_str().unwrap().to_string();
    assert_eq!(m["time"], "21:00:00");
    assert_eq!(m["status"], "registering");

    let mut registrations = Vec::new();
    for i in 1..=17 {
        let req = test::TestRequest::post()
            .uri(&format!("/api/matches/{match_id}/registrations"))
            .set_json(json!({ "name": format!("P{i}"), "phone": format!("0733{i:04}"), "position": "forward" }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        registrations.push(body);
    }
    assert_eq!(registrations[15]["outcome"], "admitted");
    assert_eq!(registrations[16]["outcome"], "waitlisted");
    assert_eq!(registrations[16]["waitlist_position"], 1);

    let p3 = registrations[2]["registration"]["id"].as_str().unwrap().to_string();
    let req = test::TestRequest::post()
        .uri(&format!("/api/registrations/{p3}/cancel"))
        .to_request();
    let cancel: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(cancel["promoted"], registrations[16]["registration"]["id"]);

    let req = test::TestRequest::get()
        .uri(&format!("/api/matches/{match_id}/players"))
        .to_request();
    let roster: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(roster["capacity"], 16);
    assert_eq!(roster["active_count"], 16);
    assert_eq!(roster["players"].as_array().unwrap().len(), 17);

    let req = test::TestRequest::get()
        .uri(&format!("/api/matches/{match_id}/waitlist"))
        .to_request();
    let waitlist: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(waitlist, json!([]));
}

#[actix_web::test]
async fn unknown_match_is_a_localized_404() {
    let app = app!(photo_dir());
    let req = test::TestRequest::get()
        .uri(&format!("/api/matches/{}", uuid::Uuid::new_v4()))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "Maç bulunamadı");
}

#[actix_web::test]
async fn negative_score_is_a_bad_request() {
    let app = app!(photo_dir());
    let req = test::TestRequest::post().uri("/api/matches/next-thursday").to_request();
    let m: Value = test::call_and_read_body_json(&app, req).await;
    let req = test::TestRequest::put()
        .uri(&format!("/api/matches/{}/score", m["id"].as_str().unwrap()))
        .set_json(json!({ "score_a": -1, "score_b": 3 }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn active_match_is_the_latest_open_one() {
    let app = app!(photo_dir());
    let req = test::TestRequest::get().uri("/api/matches/active").to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);

    let req = test::TestRequest::post()
        .uri("/api/matches")
        .set_json(json!({ "date": "2024-04-25", "price": 800 }))
        .to_request();
    let m: Value = test::call_and_read_body_json(&app, req).await;
    let req = test::TestRequest::get().uri("/api/matches/active").to_request();
    let active: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(active["id"], m["id"]);
    assert_eq!(active["price"], 800);
}

#[actix_web::test]
async fn card_checkout_without_stripe_is_rejected() {
    let app = app!(photo_dir());
    let req = test::TestRequest::post()
        .uri(&format!("/api/registrations/{}/checkout", uuid::Uuid::new_v4()))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn uploaded_photo_is_served_back() {
    let dir = photo_dir();
    let app = app!(dir.clone());
    let req = test::TestRequest::post().uri("/api/matches/next-thursday").to_request();
    let m: Value = test::call_and_read_body_json(&app, req).await;
    let req = test::TestRequest::post()
        .uri(&format!("/api/matches/{}/registrations", m["id"].as_str().unwrap()))
        .set_json(json!({ "name": "Ali", "phone": "07000000001" }))
        .to_request();
    let reg: Value = test::call_and_read_body_json(&app, req).await;
    let player_id = reg["registration"]["player_id"].as_str().unwrap().to_string();

    let req = test::TestRequest::put()
        .uri(&format!("/api/players/{player_id}/photo?ext=png"))
        .set_payload(&b"\x89PNG fake"[..])
        .to_request();
    let player: Value = test::call_and_read_body_json(&app, req).await;
    let url = player["photo_url"].as_str().unwrap().to_string();
    assert!(url.starts_with("/photos/"));

    let req = test::TestRequest::get().uri(&url).to_request();
    let bytes = test::call_and_read_body(&app, req).await;
    assert_eq!(&bytes[..], b"\x89PNG fake");
    std::fs::remove_dir_all(dir).ok();
}

#[actix_web::test]
async fn ratings_out_of_range_are_rejected() {
    let app = app!(photo_dir());
    let req = test::TestRequest::post().uri("/api/matches/next-thursday").to_request();
    let m: Value = test::call_and_read_body_json(&app, req).await;
    let req = test::TestRequest::post()
        .uri(&format!("/api/matches/{}/registrations", m["id"].as_str().unwrap()))
        .set_json(json!({ "name": "Ali" }))
        .to_request();
    let reg: Value = test::call_and_read_body_json(&app, req).await;
    let player_id = reg["registration"]["player_id"].as_str().unwrap().to_string();

    let req = test::TestRequest::put()
        .uri(&format!("/api/players/{player_id}/ratings"))
        .set_json(json!({ "power": 11 }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::put()
        .uri(&format!("/api/players/{player_id}/ratings"))
        .set_json(json!({ "power": 9, "position_weight": 4 }))
        .to_request();
    let player: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(player["power"], 9);
    assert_eq!(player["position_weight"], 4);
}
