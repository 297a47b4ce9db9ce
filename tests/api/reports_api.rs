//! Report workshop endpoints.

use actix_web::http::{StatusCode, header};
use actix_web::test;
use serde_json::{Value, json};

use report_workshop_lib::middleware::{ArtifactOutcome, REQUEST_ID_HEADER};

use super::common::*;

fn artifact_outcome(resp: &actix_web::dev::ServiceResponse) -> Option<ArtifactOutcome> {
    resp.response().extensions().get::<ArtifactOutcome>().cloned()
}

fn create_body(year: i32, trimester: &str, workshops: Value) -> Value {
    json!({
        "report": {
            "year": year,
            "trimester": trimester,
            "descriptionUrl": "https://docs.test/d.html",
            "status": "A"
        },
        "workshops": workshops
    })
}

#[actix_rt::test]
async fn test_create_then_list_resolves_cache_links() {
    let ctx = TestContext::new(vec![]);
    ctx.seed_snapshot(4, "Taller X", date(2024, 4, 5), date(2024, 4, 7))
        .await;
    let app = create_test_app(&ctx).await;

    let req = test::TestRequest::post()
        .uri("/api/reports-workshop")
        .set_json(create_body(
            2024,
            "abril-junio",
            json!([
                { "workshopId": 4, "workshopName": "ignored" },
                {
                    "workshopName": "Charla",
                    "workshopDateStart": "2024-05-01",
                    "workshopDateEnd": "2024-05-01",
                    "imageUrl": ["https://img.test/1.jpg"]
                }
            ]),
        ))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created: Value = test::read_body_json(resp).await;
    assert_eq!(created["report"]["id"], 1);
    assert_eq!(created["workshops"].as_array().unwrap().len(), 2);
    // The linked row stores a copy of the snapshot taken at write time.
    assert_eq!(created["workshops"][0]["workshopName"], "Taller X");

    let req = test::TestRequest::get()
        .uri("/api/reports-workshop")
        .to_request();
    let listed: Value = test::call_and_read_body_json(&app, req).await;
    let workshops = &listed[0]["workshops"];
    assert_eq!(workshops[0]["workshopName"], "Taller X");
    assert_eq!(workshops[0]["workshopStatus"], "A");
    assert_eq!(workshops[1]["workshopName"], "Charla");
    assert_eq!(workshops[1]["imageUrl"][0], "https://img.test/1.jpg");
    assert!(workshops[1]["workshopStatus"].is_null());
}

#[actix_rt::test]
async fn test_list_sorts_and_drops_reports_without_workshops() {
    let ctx = TestContext::new(vec![
        report(1, 2023, "octubre-diciembre", "A"),
        report(2, 2024, "julio-septiembre", "A"),
        report(3, 2024, "enero-marzo", "A"),
        report(4, 2024, "abril-junio", "A"),
    ]);
    let app = create_test_app(&ctx).await;

    for (id, year, trimester) in [
        (1, 2023, "octubre-diciembre"),
        (2, 2024, "julio-septiembre"),
        (3, 2024, "enero-marzo"),
    ] {
        let req = test::TestRequest::put()
            .uri(&format!("/api/reports-workshop/{}", id))
            .set_json(create_body(
                year,
                trimester,
                json!([{ "workshopName": format!("w{}", id) }]),
            ))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }

    let req = test::TestRequest::get()
        .uri("/api/reports-workshop")
        .to_request();
    let listed: Value = test::call_and_read_body_json(&app, req).await;
    let ids: Vec<i64> = listed
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v["report"]["id"].as_i64().unwrap())
        .collect();
    // Report 4 has no workshops and is left out.
    assert_eq!(ids, vec![3, 2, 1]);
}

#[actix_rt::test]
async fn test_list_applies_report_and_date_filters() {
    let ctx = TestContext::new(vec![
        report(1, 2024, "abril-junio", "A"),
        report(2, 2024, "abril-junio", "I"),
    ]);
    let app = create_test_app(&ctx).await;

    for id in [1, 2] {
        let req = test::TestRequest::put()
            .uri(&format!("/api/reports-workshop/{}", id))
            .set_json(create_body(
                2024,
                "abril-junio",
                json!([
                    { "workshopName": "early", "workshopDateStart": "2024-04-02", "workshopDateEnd": "2024-04-03" },
                    { "workshopName": "late", "workshopDateStart": "2024-06-10", "workshopDateEnd": "2024-06-12" }
                ]),
            ))
            .to_request();
        test::call_service(&app, req).await;
    }
    let req = test::TestRequest::delete()
        .uri("/api/reports-workshop/2")
        .to_request();
    test::call_service(&app, req).await;

    let req = test::TestRequest::get()
        .uri("/api/reports-workshop?status=a&trimester=ABRIL-JUNIO&year=2024&workshopDateStart=2024-06-01")
        .to_request();
    let listed: Value = test::call_and_read_body_json(&app, req).await;
    let listed = listed.as_array().unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0]["report"]["id"], 1);
    let workshops = listed[0]["workshops"].as_array().unwrap();
    assert_eq!(workshops.len(), 1);
    assert_eq!(workshops[0]["workshopName"], "late");
}

#[actix_rt::test]
async fn test_filtered_report_is_null_when_unknown() {
    let ctx = TestContext::new(vec![report(1, 2024, "abril-junio", "A")]);
    let app = create_test_app(&ctx).await;

    let req = test::TestRequest::get()
        .uri("/api/reports-workshop/99/filtered")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert!(body.is_null());

    // A known report comes back even with no workshop in the window.
    let req = test::TestRequest::get()
        .uri("/api/reports-workshop/1/filtered?workshopDateStart=2030-01-01")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["report"]["id"], 1);
    assert_eq!(body["workshops"], json!([]));
}

#[actix_rt::test]
async fn test_create_rejects_unnamed_unlinked_workshop() {
    let ctx = TestContext::new(vec![]);
    let app = create_test_app(&ctx).await;

    let req = test::TestRequest::post()
        .uri("/api/reports-workshop")
        .set_json(create_body(2024, "abril-junio", json!([{ "description": "no name" }])))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "INVALID_INPUT");
    // Nothing reached the remote service.
    assert!(ctx.reports.get(1).unwrap().is_none());
}

#[actix_rt::test]
async fn test_update_replaces_workshop_set() {
    let ctx = TestContext::new(vec![]);
    let app = create_test_app(&ctx).await;

    let req = test::TestRequest::post()
        .uri("/api/reports-workshop")
        .set_json(create_body(
            2024,
            "abril-junio",
            json!([{ "workshopName": "a" }, { "workshopName": "b" }]),
        ))
        .to_request();
    let created: Value = test::call_and_read_body_json(&app, req).await;
    let old_id = created["workshops"][0]["id"].as_i64().unwrap();

    let req = test::TestRequest::put()
        .uri("/api/reports-workshop/1")
        .set_json(create_body(2024, "julio-septiembre", json!([{ "workshopName": "c" }])))
        .to_request();
    let updated: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(updated["report"]["trimester"], "julio-septiembre");
    assert_eq!(updated["workshops"].as_array().unwrap().len(), 1);
    assert_eq!(updated["workshops"][0]["workshopName"], "c");

    let req = test::TestRequest::get()
        .uri(&format!("/api/reports-workshop/workshops/{}", old_id))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_rt::test]
async fn test_disable_restore_and_hard_delete() {
    let ctx = TestContext::new(vec![report(1, 2024, "abril-junio", "A")]);
    let app = create_test_app(&ctx).await;

    let req = test::TestRequest::put()
        .uri("/api/reports-workshop/1")
        .set_json(create_body(2024, "abril-junio", json!([{ "workshopName": "a" }])))
        .to_request();
    test::call_service(&app, req).await;

    let req = test::TestRequest::delete()
        .uri("/api/reports-workshop/1")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    assert_eq!(ctx.reports.get(1).unwrap().unwrap().status.as_deref(), Some("I"));
    // Soft delete keeps the local rows.
    assert_eq!(ctx.extensions.len().unwrap(), 1);

    let req = test::TestRequest::put()
        .uri("/api/reports-workshop/restore/1")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    assert_eq!(ctx.reports.get(1).unwrap().unwrap().status.as_deref(), Some("A"));

    let req = test::TestRequest::delete()
        .uri("/api/reports-workshop/hard-delete/1")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    assert!(ctx.reports.get(1).unwrap().is_none());
    assert!(ctx.extensions.is_empty().unwrap());
}

#[actix_rt::test]
async fn test_remote_failure_status_is_passed_through() {
    let ctx = TestContext::new(vec![report(1, 2024, "abril-junio", "A")]);
    let app = create_test_app(&ctx).await;
    ctx.reports.fail_with(409).unwrap();

    let req = test::TestRequest::post()
        .uri("/api/reports-workshop")
        .set_json(create_body(2024, "abril-junio", json!([{ "workshopName": "a" }])))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "UPSTREAM_ERROR");
    assert!(ctx.extensions.is_empty().unwrap());

    let req = test::TestRequest::get()
        .uri("/api/reports-workshop")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
}

#[actix_rt::test]
async fn test_exists_checks_year_and_trimester() {
    let ctx = TestContext::new(vec![report(1, 2024, "abril-junio", "A")]);
    let app = create_test_app(&ctx).await;

    let req = test::TestRequest::get()
        .uri("/api/reports-workshop/exists?year=2024&trimester=abril-junio")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body, json!({ "exists": true }));

    let req = test::TestRequest::get()
        .uri("/api/reports-workshop/exists?year=2023&trimester=abril-junio")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body, json!({ "exists": false }));
}

#[actix_rt::test]
async fn test_single_workshop_get_and_delete() {
    let ctx = TestContext::new(vec![]);
    let app = create_test_app(&ctx).await;

    let req = test::TestRequest::post()
        .uri("/api/reports-workshop")
        .set_json(create_body(
            2024,
            "abril-junio",
            // Linked to a workshop the cache has not seen yet.
            json!([{ "workshopId": 77, "workshopName": "Pendiente" }]),
        ))
        .to_request();
    let created: Value = test::call_and_read_body_json(&app, req).await;
    let id = created["workshops"][0]["id"].as_i64().unwrap();

    // Listings omit the row until its snapshot arrives...
    let req = test::TestRequest::get()
        .uri("/api/reports-workshop/1/filtered")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["workshops"], json!([]));

    // ...but addressing it directly shows the stored fields.
    let req = test::TestRequest::get()
        .uri(&format!("/api/reports-workshop/workshops/{}", id))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["workshopName"], "Pendiente");
    assert_eq!(body["workshopId"], 77);

    let req = test::TestRequest::delete()
        .uri(&format!("/api/reports-workshop/workshops/{}", id))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let req = test::TestRequest::delete()
        .uri(&format!("/api/reports-workshop/workshops/{}", id))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_rt::test]
async fn test_pdf_is_rendered_once_then_redirected() {
    let ctx = TestContext::new(vec![report(1, 2024, "abril-junio", "A")]);
    let app = create_test_app(&ctx).await;

    let req = test::TestRequest::put()
        .uri("/api/reports-workshop/1")
        .set_json(create_body(
            2024,
            "abril-junio",
            json!([{ "workshopName": "Taller", "workshopDateStart": "2024-04-05", "workshopDateEnd": "2024-04-07" }]),
        ))
        .to_request();
    test::call_service(&app, req).await;

    let uri = "/api/reports-workshop/1/pdf?workshopDateStart=2024-04-01&workshopDateEnd=2024-06-30";
    let resp = test::call_service(&app, test::TestRequest::get().uri(uri).to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers().get(header::CONTENT_TYPE).unwrap(),
        "application/pdf"
    );
    assert_eq!(
        resp.headers().get(header::CONTENT_DISPOSITION).unwrap(),
        "attachment; filename=\"report_1_from_2024-04-01_to_2024-06-30.pdf\""
    );
    assert!(resp.headers().contains_key(REQUEST_ID_HEADER));
    assert_eq!(
        artifact_outcome(&resp),
        Some(ArtifactOutcome {
            key: "report_1_from_2024-04-01_to_2024-06-30.pdf".into(),
            cached: false,
        })
    );
    let bytes = test::read_body(resp).await;
    assert!(bytes.starts_with(b"%PDF"));
    assert_eq!(ctx.artifacts.put_count(), 1);

    let resp = test::call_service(&app, test::TestRequest::get().uri(uri).to_request()).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(
        resp.headers().get(header::LOCATION).unwrap(),
        "http://objects.test/reports/pdf/report_1_from_2024-04-01_to_2024-06-30.pdf"
    );
    assert_eq!(artifact_outcome(&resp).map(|o| o.cached), Some(true));
    assert_eq!(ctx.artifacts.put_count(), 1);

    // A different window is a different artifact.
    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/api/reports-workshop/1/pdf")
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(ctx.artifacts.put_count(), 2);
}

#[actix_rt::test]
async fn test_pdf_for_unknown_report_is_not_found() {
    let ctx = TestContext::new(vec![]);
    let app = create_test_app(&ctx).await;

    let req = test::TestRequest::get()
        .uri("/api/reports-workshop/5/pdf")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(ctx.artifacts.put_count(), 0);
}
