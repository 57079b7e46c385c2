//! End-to-end flow: JSON requests through the router, down through the
//! coordinator, scraper and cache, against a fixture-armed gateway and a
//! real cache file on disk.

use std::path::Path;
use std::sync::Arc;

use serde_json::json;

use cache_coordinator::{Coordinator, CoordinatorPolicy};
use mailnav_cli::{build_fixture_site, Fixture, FixturePractice};
use message_router::MessageRouter;
use page_gateway::FakeSite;
use practice_cache::{CachePolicy, FileCacheStore, PracticeCache};

fn fixture() -> Fixture {
    Fixture {
        practices: vec![
            FixturePractice {
                identifier: "A12345".into(),
                display_name: "Oak Clinic".into(),
                cells: vec!["Dental".into(), "50".into(), "12".into(), "Gold".into()],
            },
            FixturePractice {
                identifier: "B22222".into(),
                display_name: "Elm Practice".into(),
                cells: vec![],
            },
        ],
        secondary_code: Some("CDB9".into()),
    }
}

fn fast_policy() -> CoordinatorPolicy {
    let mut policy = CoordinatorPolicy::default();
    policy.wait.wait_timeout_ms = 80;
    policy.wait.poll_interval_ms = 5;
    policy.wait.click_base_delay_ms = 2;
    policy.wait.click_step_delay_ms = 1;
    policy
}

fn service(cache_path: &Path) -> (Arc<FakeSite>, MessageRouter) {
    let site = build_fixture_site(&fixture());
    let coordinator = Coordinator::new(
        Arc::new(PracticeCache::new(CachePolicy::default())),
        Arc::new(FileCacheStore::new(cache_path)),
        site.clone(),
        site.clone(),
        fast_policy(),
    );
    (site, MessageRouter::new(coordinator))
}

#[tokio::test]
async fn cold_start_scrapes_then_mirror_serves_without_touching_the_site() {
    let dir = tempfile::tempdir().expect("tempdir");
    let cache_path = dir.path().join("practice-cache.json");

    let (site, router) = service(&cache_path);
    let response = router.handle(json!({ "action": "getPracticeCache" })).await;
    let cache = response
        .get("practiceCache")
        .and_then(|v| v.as_object())
        .expect("practiceCache map");
    assert_eq!(cache.len(), 2);
    assert!(cache.contains_key("Oak Clinic (A12345)"));
    assert!(cache.contains_key("Elm Practice (B22222)"));
    assert!(site.injection_calls() > 0, "cold start scraped the site");
    assert_eq!(site.open_page_count(), 0, "listing page closed afterwards");
    assert!(cache_path.exists(), "mirror written to disk");

    // A fresh process over the same file serves from the mirror.
    let (site2, router2) = service(&cache_path);
    let response = router2.handle(json!({ "action": "getPracticeCache" })).await;
    let cache = response
        .get("practiceCache")
        .and_then(|v| v.as_object())
        .expect("practiceCache map");
    assert_eq!(cache.len(), 2);
    assert_eq!(site2.injection_calls(), 0, "mirror adoption needs no scrape");
}

#[tokio::test]
async fn secondary_code_search_and_status_round_trip() {
    let dir = tempfile::tempdir().expect("tempdir");
    let (_site, router) = service(&dir.path().join("cache.json"));

    let response = router
        .handle(json!({ "action": "requestActiveScrape" }))
        .await;
    assert_eq!(response["success"], json!(true));
    assert_eq!(response["practicesCount"], json!(2));

    // Nothing resolved yet, so the search falls back to detail scrapes.
    let response = router
        .handle(json!({ "action": "searchBySecondaryCode", "code": "CDB9" }))
        .await;
    assert_eq!(response["success"], json!(true));
    assert_eq!(response["record"]["secondaryCode"], json!("CDB9"));
    let identifier = response["record"]["identifier"]
        .as_str()
        .expect("identifier")
        .to_string();

    let response = router
        .handle(json!({ "action": "getPracticeStatus", "identifier": identifier }))
        .await;
    assert_eq!(response["success"], json!(true));
    assert_eq!(response["status"]["secondaryCode"], json!("CDB9"));
}

#[tokio::test]
async fn open_practice_clicks_the_requested_tab_in_the_foreground() {
    let dir = tempfile::tempdir().expect("tempdir");
    let (site, router) = service(&dir.path().join("cache.json"));

    let response = router
        .handle(json!({
            "action": "openPractice",
            "input": "oak",
            "settingType": "billing",
        }))
        .await;
    assert_eq!(response, json!({ "success": true }));
    assert!(site.clicks().contains(&"#tab-billing".to_string()));
    assert_eq!(site.open_page_count(), 1, "foreground page stays open");

    let pages = site.pages();
    let kept = pages.iter().find(|p| !p.closed).expect("open page");
    assert!(kept.foreground);
    assert!(kept.url.contains("/admin/practices/A12345/settings"));
}

#[tokio::test]
async fn malformed_requests_still_get_exactly_one_error_reply() {
    let dir = tempfile::tempdir().expect("tempdir");
    let (_site, router) = service(&dir.path().join("cache.json"));

    let response = router.handle(json!({ "action": "reboot" })).await;
    let error = response.get("error").and_then(|v| v.as_str()).expect("error");
    assert!(error.starts_with("unrecognized request"));
}
