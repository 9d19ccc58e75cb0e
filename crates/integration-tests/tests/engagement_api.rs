//! Integration tests for loves and ratings.

use reqwest::StatusCode;
use serde_json::json;

use forkful_integration_tests::{
    ALICE_TOKEN, BOB_TOKEN, TestContext, json_body, recipe_id,
};

/// Alice and Bob synced, one recipe owned by Alice.
async fn setup() -> (TestContext, i64) {
    let ctx = TestContext::new().await;
    ctx.sync(ALICE_TOKEN).await;
    ctx.sync(BOB_TOKEN).await;
    let id = recipe_id(&ctx.create_recipe(ALICE_TOKEN, "Kanom Krok").await);
    (ctx, id)
}

// ============================================================================
// Loves
// ============================================================================

#[tokio::test]
async fn test_loving_twice_keeps_one_love() {
    let (ctx, id) = setup().await;
    let path = format!("/food-recipes/{id}/love");

    let first = ctx
        .post(&path)
        .bearer_auth(BOB_TOKEN)
        .send()
        .await
        .expect("request failed");
    assert_eq!(first.status(), StatusCode::CREATED);

    let second = ctx
        .post(&path)
        .bearer_auth(BOB_TOKEN)
        .send()
        .await
        .expect("request failed");
    assert_eq!(second.status(), StatusCode::OK);
    assert_eq!(json_body(second).await, json!({"loved": true}));

    let recipe = json_body(
        ctx.get(&format!("/food-recipes/{id}"))
            .send()
            .await
            .expect("request failed"),
    )
    .await;
    assert_eq!(recipe["loveCount"], 1);
}

#[tokio::test]
async fn test_has_loved_and_unlove() {
    let (ctx, id) = setup().await;
    let path = format!("/food-recipes/{id}/love");

    let before = json_body(
        ctx.get(&path)
            .bearer_auth(BOB_TOKEN)
            .send()
            .await
            .expect("request failed"),
    )
    .await;
    assert_eq!(before["loved"], false);

    ctx.post(&path)
        .bearer_auth(BOB_TOKEN)
        .send()
        .await
        .expect("request failed");

    let during = json_body(
        ctx.get(&path)
            .bearer_auth(BOB_TOKEN)
            .send()
            .await
            .expect("request failed"),
    )
    .await;
    assert_eq!(during["loved"], true);

    let resp = ctx
        .delete(&path)
        .bearer_auth(BOB_TOKEN)
        .send()
        .await
        .expect("request failed");
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    // Un-loving again is harmless.
    let resp = ctx
        .delete(&path)
        .bearer_auth(BOB_TOKEN)
        .send()
        .await
        .expect("request failed");
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let after = json_body(
        ctx.get(&path)
            .bearer_auth(BOB_TOKEN)
            .send()
            .await
            .expect("request failed"),
    )
    .await;
    assert_eq!(after["loved"], false);
}

#[tokio::test]
async fn test_toggle_flips_state() {
    let (ctx, id) = setup().await;
    let path = format!("/food-recipes/{id}/love/toggle");

    for expected in [true, false, true] {
        let resp = ctx
            .post(&path)
            .bearer_auth(BOB_TOKEN)
            .send()
            .await
            .expect("request failed");
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(json_body(resp).await["loved"], expected);
    }
}

#[tokio::test]
async fn test_loved_recipes_newest_first() {
    let (ctx, first) = setup().await;
    let second = recipe_id(&ctx.create_recipe(ALICE_TOKEN, "Roti Sai Mai").await);

    for id in [first, second] {
        ctx.post(&format!("/food-recipes/{id}/love"))
            .bearer_auth(BOB_TOKEN)
            .send()
            .await
            .expect("request failed");
    }

    let loved = json_body(
        ctx.get("/users/self/loved-recipes")
            .bearer_auth(BOB_TOKEN)
            .send()
            .await
            .expect("request failed"),
    )
    .await;
    let ids: Vec<_> = loved
        .as_array()
        .expect("array")
        .iter()
        .filter_map(|r| r["id"].as_i64())
        .collect();
    assert_eq!(ids, [second, first]);
}

#[tokio::test]
async fn test_love_missing_recipe_is_not_found() {
    let (ctx, _) = setup().await;

    let resp = ctx
        .post("/food-recipes/9999/love")
        .bearer_auth(BOB_TOKEN)
        .send()
        .await
        .expect("request failed");
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(json_body(resp).await["error"], "find recipe: not found");
}

#[tokio::test]
async fn test_love_by_unsynced_user_is_not_found() {
    let ctx = TestContext::new().await;
    ctx.sync(ALICE_TOKEN).await;
    let id = recipe_id(&ctx.create_recipe(ALICE_TOKEN, "Kanom Krok").await);

    let resp = ctx
        .post(&format!("/food-recipes/{id}/love"))
        .bearer_auth(BOB_TOKEN)
        .send()
        .await
        .expect("request failed");
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(json_body(resp).await["error"], "find user: not found");
}

#[tokio::test]
async fn test_loves_vanish_with_recipe() {
    let (ctx, id) = setup().await;
    ctx.post(&format!("/food-recipes/{id}/love"))
        .bearer_auth(BOB_TOKEN)
        .send()
        .await
        .expect("request failed");

    ctx.delete(&format!("/food-recipes/{id}"))
        .bearer_auth(ALICE_TOKEN)
        .send()
        .await
        .expect("request failed");

    let loved = json_body(
        ctx.get("/users/self/loved-recipes")
            .bearer_auth(BOB_TOKEN)
            .send()
            .await
            .expect("request failed"),
    )
    .await;
    assert_eq!(loved, json!([]));
}

// ============================================================================
// Ratings
// ============================================================================

#[tokio::test]
async fn test_rate_and_average() {
    let (ctx, id) = setup().await;
    let path = format!("/food-recipes/{id}/ratings");

    for (token, score) in [(ALICE_TOKEN, 4.0), (BOB_TOKEN, 5.0)] {
        let resp = ctx
            .post(&path)
            .bearer_auth(token)
            .json(&json!({"score": score}))
            .send()
            .await
            .expect("request failed");
        assert_eq!(resp.status(), StatusCode::CREATED);
        let rating = json_body(resp).await;
        assert_eq!(rating["score"], score);
        assert_eq!(rating["recipeId"], id);
    }

    let ratings = json_body(ctx.get(&path).send().await.expect("request failed")).await;
    assert_eq!(ratings.as_array().map(Vec::len), Some(2));
    assert_eq!(ratings[0]["userId"], "bob");

    let recipe = json_body(
        ctx.get(&format!("/food-recipes/{id}"))
            .send()
            .await
            .expect("request failed"),
    )
    .await;
    assert_eq!(recipe["ratingCount"], 2);
    assert_eq!(recipe["averageRating"], 4.5);
}

#[tokio::test]
async fn test_rate_rejects_out_of_range_scores() {
    let (ctx, id) = setup().await;

    for score in [0.0, 5.5, -1.0] {
        let resp = ctx
            .post(&format!("/food-recipes/{id}/ratings"))
            .bearer_auth(BOB_TOKEN)
            .json(&json!({"score": score}))
            .send()
            .await
            .expect("request failed");
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "score {score}");
    }
}

#[tokio::test]
async fn test_ratings_of_missing_recipe_is_not_found() {
    let ctx = TestContext::new().await;

    let resp = ctx
        .get("/food-recipes/31337/ratings")
        .send()
        .await
        .expect("request failed");
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
