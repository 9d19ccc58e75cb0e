//! Integration tests for the recipe catalog endpoints.

use reqwest::{StatusCode, header};
use serde_json::json;

use forkful_integration_tests::{
    ADMIN_TOKEN, ALICE_TOKEN, BOB_TOKEN, TestContext, json_body, recipe_body, recipe_id,
};

// ============================================================================
// Authentication
// ============================================================================

#[tokio::test]
async fn test_create_requires_bearer_token() {
    let ctx = TestContext::new().await;

    let resp = ctx
        .post("/food-recipes")
        .json(&recipe_body("Som Tam"))
        .send()
        .await
        .expect("request failed");

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        resp.headers()
            .get(header::WWW_AUTHENTICATE)
            .and_then(|v| v.to_str().ok()),
        Some("Bearer")
    );
    let body = json_body(resp).await;
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_unknown_token_is_unauthorized() {
    let ctx = TestContext::new().await;

    let resp = ctx
        .post("/food-recipes")
        .bearer_auth("not-a-real-token")
        .json(&recipe_body("Som Tam"))
        .send()
        .await
        .expect("request failed");

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_create_before_sync_is_rejected() {
    let ctx = TestContext::new().await;

    let resp = ctx
        .post("/food-recipes")
        .bearer_auth(ALICE_TOKEN)
        .json(&recipe_body("Som Tam"))
        .send()
        .await
        .expect("request failed");

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = json_body(resp).await;
    assert!(
        body["error"]
            .as_str()
            .is_some_and(|e| e.contains("sync the profile first"))
    );
}

// ============================================================================
// Create & Read
// ============================================================================

#[tokio::test]
async fn test_create_then_get() {
    let ctx = TestContext::new().await;
    ctx.sync(ALICE_TOKEN).await;

    let created = ctx.create_recipe(ALICE_TOKEN, "  Khao Man Gai ").await;
    assert_eq!(created["name"], "Khao Man Gai");
    assert_eq!(created["owner"]["id"], "alice");
    assert_eq!(created["difficulty"]["name"], "Easy");
    assert_eq!(created["cookingDuration"]["name"], "11 - 30");
    assert_eq!(created["averageRating"], 0.0);
    assert_eq!(created["ratingCount"], 0);
    assert_eq!(created["loveCount"], 0);

    let id = recipe_id(&created);
    let resp = ctx
        .get(&format!("/food-recipes/{id}"))
        .send()
        .await
        .expect("request failed");
    assert_eq!(resp.status(), StatusCode::OK);
    let fetched = json_body(resp).await;
    assert_eq!(fetched["id"], created["id"]);
    assert_eq!(fetched["ingredient"], "rice, chili, lime");
}

#[tokio::test]
async fn test_create_validates_fields() {
    let ctx = TestContext::new().await;
    ctx.sync(ALICE_TOKEN).await;

    for body in [
        json!({"name": "  ", "difficultyId": 1, "cookingDurationId": 1}),
        json!({"name": "Larb", "difficultyId": 99, "cookingDurationId": 1}),
        json!({"name": "Larb", "difficultyId": 1, "cookingDurationId": 1, "imageUrl": "ftp://x/y.png"}),
    ] {
        let resp = ctx
            .post("/food-recipes")
            .bearer_auth(ALICE_TOKEN)
            .json(&body)
            .send()
            .await
            .expect("request failed");
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "body: {body}");
    }
}

#[tokio::test]
async fn test_malformed_body_is_json_error() {
    let ctx = TestContext::new().await;
    ctx.sync(ALICE_TOKEN).await;

    let resp = ctx
        .post("/food-recipes")
        .bearer_auth(ALICE_TOKEN)
        .header(header::CONTENT_TYPE, "application/json")
        .body("{not json")
        .send()
        .await
        .expect("request failed");

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert!(json_body(resp).await["error"].is_string());
}

#[tokio::test]
async fn test_get_missing_and_malformed_ids() {
    let ctx = TestContext::new().await;

    let resp = ctx
        .get("/food-recipes/4242")
        .send()
        .await
        .expect("request failed");
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(json_body(resp).await["error"], "find recipe: not found");

    let resp = ctx
        .get("/food-recipes/pad-thai")
        .send()
        .await
        .expect("request failed");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

// ============================================================================
// Search & Pagination
// ============================================================================

#[tokio::test]
async fn test_search_pages_and_counts() {
    let ctx = TestContext::new().await;
    ctx.sync(ALICE_TOKEN).await;

    for name in ["Green Curry", "Red Curry", "Massaman Curry", "Mango Sticky Rice"] {
        ctx.create_recipe(ALICE_TOKEN, name).await;
    }

    let resp = ctx
        .get("/food-recipes?search=curry&page=1&limit=2")
        .send()
        .await
        .expect("request failed");
    assert_eq!(resp.status(), StatusCode::OK);
    let page = json_body(resp).await;
    assert_eq!(page["total"], 3);
    let names: Vec<_> = page["results"]
        .as_array()
        .expect("results array")
        .iter()
        .map(|r| r["name"].as_str().unwrap_or_default().to_string())
        .collect();
    assert_eq!(names, ["Green Curry", "Massaman Curry"]);

    let page = json_body(
        ctx.get("/food-recipes?search=CURRY&page=2&limit=2")
            .send()
            .await
            .expect("request failed"),
    )
    .await;
    assert_eq!(page["results"].as_array().map(Vec::len), Some(1));
    assert_eq!(page["results"][0]["name"], "Red Curry");

    let all = json_body(ctx.get("/food-recipes").send().await.expect("request failed")).await;
    assert_eq!(all["total"], 4);
}

#[tokio::test]
async fn test_search_treats_wildcards_literally() {
    let ctx = TestContext::new().await;
    ctx.sync(ALICE_TOKEN).await;
    ctx.create_recipe(ALICE_TOKEN, "Tom Yum").await;

    let page = json_body(
        ctx.get("/food-recipes?search=%25")
            .send()
            .await
            .expect("request failed"),
    )
    .await;
    assert_eq!(page["total"], 0);
}

#[tokio::test]
async fn test_lookups_are_listed() {
    let ctx = TestContext::new().await;

    let difficulties = json_body(ctx.get("/difficulties").send().await.expect("request failed")).await;
    assert_eq!(difficulties.as_array().map(Vec::len), Some(3));
    assert_eq!(difficulties[0], json!({"id": 1, "name": "Easy"}));

    let durations =
        json_body(ctx.get("/cooking-durations").send().await.expect("request failed")).await;
    assert_eq!(durations.as_array().map(Vec::len), Some(4));
}

// ============================================================================
// Update & Delete
// ============================================================================

#[tokio::test]
async fn test_only_owner_can_update() {
    let ctx = TestContext::new().await;
    ctx.sync(ALICE_TOKEN).await;
    ctx.sync(BOB_TOKEN).await;
    let id = recipe_id(&ctx.create_recipe(ALICE_TOKEN, "Pad See Ew").await);

    let resp = ctx
        .put(&format!("/food-recipes/{id}"))
        .bearer_auth(BOB_TOKEN)
        .json(&json!({"name": "Bob's Noodles"}))
        .send()
        .await
        .expect("request failed");
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let resp = ctx
        .put(&format!("/food-recipes/{id}"))
        .bearer_auth(ALICE_TOKEN)
        .json(&json!({"name": "Pad See Ew (extra garlic)", "difficultyId": 3}))
        .send()
        .await
        .expect("request failed");
    assert_eq!(resp.status(), StatusCode::OK);
    let updated = json_body(resp).await;
    assert_eq!(updated["name"], "Pad See Ew (extra garlic)");
    assert_eq!(updated["difficulty"]["name"], "Hard");
    assert_eq!(updated["ingredient"], "rice, chili, lime");
}

#[tokio::test]
async fn test_update_without_fields_is_rejected() {
    let ctx = TestContext::new().await;
    ctx.sync(ALICE_TOKEN).await;
    let id = recipe_id(&ctx.create_recipe(ALICE_TOKEN, "Pad See Ew").await);

    let resp = ctx
        .put(&format!("/food-recipes/{id}"))
        .bearer_auth(ALICE_TOKEN)
        .json(&json!({}))
        .send()
        .await
        .expect("request failed");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(resp).await["error"], "no fields to update");
}

#[tokio::test]
async fn test_delete_by_owner_admin_and_stranger() {
    let ctx = TestContext::new().await;
    ctx.sync(ALICE_TOKEN).await;
    ctx.sync(BOB_TOKEN).await;
    let first = recipe_id(&ctx.create_recipe(ALICE_TOKEN, "Boat Noodles").await);
    let second = recipe_id(&ctx.create_recipe(ALICE_TOKEN, "Crispy Pork").await);

    let resp = ctx
        .delete(&format!("/food-recipes/{first}"))
        .bearer_auth(BOB_TOKEN)
        .send()
        .await
        .expect("request failed");
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let resp = ctx
        .delete(&format!("/food-recipes/{first}"))
        .bearer_auth(ALICE_TOKEN)
        .send()
        .await
        .expect("request failed");
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    // The admin never synced; deleting needs only the role.
    let resp = ctx
        .delete(&format!("/food-recipes/{second}"))
        .bearer_auth(ADMIN_TOKEN)
        .send()
        .await
        .expect("request failed");
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp = ctx
        .get(&format!("/food-recipes/{second}"))
        .send()
        .await
        .expect("request failed");
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_missing_recipe_succeeds() {
    let ctx = TestContext::new().await;

    let resp = ctx
        .delete("/food-recipes/777")
        .bearer_auth(BOB_TOKEN)
        .send()
        .await
        .expect("request failed");
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
}
