//! Workshop cache reads and event ingress.

use std::time::Duration;

use actix_web::http::StatusCode;
use actix_web::test;
use serde_json::{Value, json};

use report_workshop_lib::store::WorkshopCacheReader;

use super::common::*;

/// Wait for the synchronizer to apply queued events.
async fn wait_for_snapshot(ctx: &TestContext, id: i32, name: &str) {
    for _ in 0..50 {
        if let Some(snapshot) = ctx.cache.find_by_id(id).await.unwrap()
            && snapshot.name == name
        {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("snapshot {} never became '{}'", id, name);
}

#[actix_rt::test]
async fn test_list_and_get_cache() {
    let ctx = TestContext::new(vec![]);
    ctx.seed_snapshot(2, "Taller B", date(2024, 2, 1), date(2024, 2, 2))
        .await;
    ctx.seed_snapshot(1, "Taller A", date(2024, 1, 1), date(2024, 1, 2))
        .await;
    let app = create_test_app(&ctx).await;

    let req = test::TestRequest::get().uri("/api/workshop-cache").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let ids: Vec<i64> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, vec![1, 2]);
    assert_eq!(body[0]["dateStart"], "2024-01-01");

    let req = test::TestRequest::get()
        .uri("/api/workshop-cache?status=i")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body, json!([]));

    let req = test::TestRequest::get().uri("/api/workshop-cache/2").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["name"], "Taller B");

    let req = test::TestRequest::get().uri("/api/workshop-cache/9").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_rt::test]
async fn test_events_upsert_cache_and_refresh_views() {
    let ctx = TestContext::new(vec![report(1, 2024, "abril-junio", "A")]);
    let app = create_test_app(&ctx).await;

    let req = test::TestRequest::post()
        .uri("/api/workshop-events")
        .set_json(json!({
            "id": 4, "name": "Taller X", "startDate": "2024-04-05", "endDate": "2024-04-07", "state": "A"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::ACCEPTED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "accepted");
    wait_for_snapshot(&ctx, 4, "Taller X").await;

    let req = test::TestRequest::put()
        .uri("/api/reports-workshop/1")
        .set_json(json!({
            "report": { "year": 2024, "trimester": "abril-junio", "status": "A" },
            "workshops": [{ "workshopId": 4 }]
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    // A later event renames the workshop; views follow the cache.
    let req = test::TestRequest::post()
        .uri("/api/workshop-events")
        .set_json(json!({
            "id": 4, "name": "Taller X2", "startDate": "2024-04-06", "endDate": "2024-04-08", "state": "I"
        }))
        .to_request();
    test::call_service(&app, req).await;
    wait_for_snapshot(&ctx, 4, "Taller X2").await;

    let req = test::TestRequest::get()
        .uri("/api/reports-workshop/1/filtered")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let workshop = &body["workshops"][0];
    assert_eq!(workshop["workshopName"], "Taller X2");
    assert_eq!(workshop["workshopDateStart"], "2024-04-06");
    assert_eq!(workshop["workshopStatus"], "I");
}

#[actix_rt::test]
async fn test_unusable_events_are_accepted_and_dropped() {
    let ctx = TestContext::new(vec![]);
    let app = create_test_app(&ctx).await;

    for payload in [
        "not json".to_string(),
        json!({ "name": "sin id" }).to_string(),
    ] {
        let req = test::TestRequest::post()
            .uri("/api/workshop-events")
            .insert_header(("content-type", "application/json"))
            .set_payload(payload)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::ACCEPTED);
    }

    // A valid event queued after the bad ones still lands.
    let req = test::TestRequest::post()
        .uri("/api/workshop-events")
        .set_json(json!({
            "id": 1, "name": "Taller", "startDate": "2024-01-01", "endDate": "2024-01-02", "state": "A"
        }))
        .to_request();
    test::call_service(&app, req).await;
    wait_for_snapshot(&ctx, 1, "Taller").await;
    assert_eq!(ctx.cache.len().unwrap(), 1);
}
