//! Integration tests for entitlement catalog import.

mod common;

use common::*;
use serde_json::json;
use vigil_connector::entitlement::EntitlementStore;
use vigil_connector_bitwarden::{BitwardenError, RESOURCE_GROUP, RESOURCE_TYPE};

/// Import materializes one head entitlement per group and per fixed role.
#[tokio::test]
async fn test_import_creates_group_and_role_entitlements() {
    let ctx = TestContext::new().await;
    ctx.mock_groups_endpoint(vec![
        group_json("g-1", "Engineering"),
        group_json("g-2", "Operations"),
    ])
    .await;

    ctx.connector.import_entitlements().await.unwrap();

    let heads = ctx.entitlements.list_heads(ctx.instance_id).await.unwrap();
    assert_eq!(heads.len(), 6, "2 groups + 4 roles");

    let engineering = heads.iter().find(|e| e.name == "Engineering").unwrap();
    assert_eq!(engineering.resource_type, RESOURCE_GROUP);
    assert_eq!(engineering.extra_params, json!({ "id": "g-1" }));

    let admin = heads.iter().find(|e| e.name == "Admin").unwrap();
    assert_eq!(admin.resource_type, RESOURCE_TYPE);
    assert_eq!(admin.extra_params, json!({ "type": 1 }));
}

/// Re-running the import over identical provider data refreshes the
/// existing heads instead of duplicating them.
#[tokio::test]
async fn test_import_is_idempotent() {
    let ctx = TestContext::new().await;
    ctx.mock_groups_endpoint(vec![group_json("g-1", "Engineering")]).await;

    ctx.connector.import_entitlements().await.unwrap();
    let first_pass = ctx.entitlements.list_heads(ctx.instance_id).await.unwrap();

    ctx.connector.import_entitlements().await.unwrap();
    let second_pass = ctx.entitlements.list_heads(ctx.instance_id).await.unwrap();

    assert_eq!(first_pass.len(), 5, "1 group + 4 roles");
    assert_eq!(second_pass.len(), 5, "second run must not duplicate heads");

    let ids_first: Vec<_> = first_pass.iter().map(|e| e.id).collect();
    for head in &second_pass {
        assert!(
            ids_first.contains(&head.id),
            "head {} should survive the second pass unchanged",
            head.name
        );
        assert!(!head.stale);
    }
}

/// The Custom role (code 4) never produces an entitlement.
#[tokio::test]
async fn test_custom_role_is_never_materialized() {
    let ctx = TestContext::new().await;
    ctx.mock_groups_endpoint(vec![]).await;

    ctx.connector.import_entitlements().await.unwrap();

    let heads = ctx.entitlements.list_heads(ctx.instance_id).await.unwrap();
    let role_names: Vec<_> = heads
        .iter()
        .filter(|e| e.resource_type == RESOURCE_TYPE)
        .map(|e| e.name.as_str())
        .collect();

    assert_eq!(heads.len(), 4);
    assert!(!role_names.contains(&"Custom"));
    assert!(heads
        .iter()
        .all(|e| e.extra_params.get("type").and_then(|v| v.as_i64()) != Some(4)));
}

/// Groups are load-bearing: a failed group fetch fails the whole import
/// before any entitlement is touched.
#[tokio::test]
async fn test_group_fetch_failure_fails_import() {
    let ctx = TestContext::new().await;
    wiremock::Mock::given(wiremock::matchers::method("GET"))
        .and(wiremock::matchers::path("/public/groups"))
        .respond_with(wiremock::ResponseTemplate::new(500).set_body_string("upstream error"))
        .mount(&ctx.server)
        .await;

    let result = ctx.connector.import_entitlements().await;

    assert!(matches!(result, Err(BitwardenError::Api { status: 500, .. })));
    let heads = ctx.entitlements.list_heads(ctx.instance_id).await.unwrap();
    assert!(heads.is_empty(), "no role entitlements on group failure");
}
