//! HTTP tests for signup, login and the user pages.

mod common;

use axum::http::StatusCode;
use common::{Client, TestApp, create_user, flash_messages, spawn_app};
use warbler::models::user::User;

struct Fixture {
    app: TestApp,
    testuser: User,
    u1: User,
    u2: User,
}

/// testuser follows u1; u2 follows testuser.
async fn setup() -> Fixture {
    let app = spawn_app("warbler-user-view-test").await;
    let testuser = create_user(&app.store, "testuser", "test@test.com", "testpass").await;
    let u1 = create_user(&app.store, "abc", "abc@test.com", "password").await;
    let u2 = create_user(&app.store, "efg", "efg@test.com", "password").await;

    app.store.follow(testuser.id, u1.id).await.unwrap();
    app.store.follow(u2.id, testuser.id).await.unwrap();

    Fixture {
        app,
        testuser,
        u1,
        u2,
    }
}

async fn logged_in(fixture: &Fixture) -> Client {
    let mut client = Client::new(&fixture.app);
    client.login("testuser", "testpass").await;
    client
}

#[tokio::test]
async fn test_anonymous_home() {
    let app = spawn_app("warbler-user-view-test").await;
    let mut client = Client::new(&app);

    let response = client.get("/").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["anonymous"], true);
}

#[tokio::test]
async fn test_signup_logs_in() {
    let app = spawn_app("warbler-user-view-test").await;
    let mut client = Client::new(&app);

    let response = client
        .post(
            "/signup",
            "username=newuser&email=new%40test.com&password=secret123&image_url=",
        )
        .await;
    assert_eq!(response.status, StatusCode::FOUND);
    assert_eq!(response.location.as_deref(), Some("/"));

    let home = client.follow(&response).await;
    assert_eq!(home.body["data"]["user"]["username"], "newuser");
    assert!(flash_messages(&home.body).contains(&"Welcome to Warbler, newuser!".to_string()));

    let user = app.store.get_user_by_username("newuser").await.unwrap().unwrap();
    assert_eq!(user.email, "new@test.com");
    assert_eq!(user.image_url, "/static/images/default-pic.png");
}

#[tokio::test]
async fn test_signup_rejects_invalid_form() {
    let app = spawn_app("warbler-user-view-test").await;
    let mut client = Client::new(&app);

    let response = client
        .post("/signup", "username=&email=not-an-email&password=123")
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(response.body["errors"]["username"].is_array());
    assert!(response.body["errors"]["email"].is_array());
    assert!(response.body["errors"]["password"].is_array());
    assert!(!client.has_session());
}

#[tokio::test]
async fn test_signup_rejects_taken_username() {
    let fixture = setup().await;
    let mut client = Client::new(&fixture.app);

    let response = client
        .post(
            "/signup",
            "username=testuser&email=fresh%40test.com&password=secret123",
        )
        .await;

    assert_eq!(response.status, StatusCode::CONFLICT);
    assert_eq!(response.body["success"], false);
}

#[tokio::test]
async fn test_login_and_logout() {
    let fixture = setup().await;
    let mut client = Client::new(&fixture.app);

    let bad = client
        .post("/login", "username=testuser&password=wrongpass")
        .await;
    assert_eq!(bad.status, StatusCode::UNAUTHORIZED);
    assert_eq!(bad.body["error"], "Invalid credentials.");

    client.login("testuser", "testpass").await;
    let home = client.get("/").await;
    assert_eq!(home.body["data"]["user"]["id"], fixture.testuser.id);
    assert!(flash_messages(&home.body).contains(&"Hello, testuser!".to_string()));

    let response = client.post("/logout", "").await;
    assert_eq!(response.status, StatusCode::FOUND);

    let home = client.follow(&response).await;
    assert_eq!(home.body["data"]["anonymous"], true);
    assert!(flash_messages(&home.body).contains(&"You have successfully logged out.".to_string()));
}

#[tokio::test]
async fn test_users_index_and_search() {
    let fixture = setup().await;
    let mut client = Client::new(&fixture.app);

    let response = client.get("/users").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["users"].as_array().unwrap().len(), 3);

    let response = client.get("/users?q=test").await;
    let users = response.body["data"]["users"].as_array().unwrap();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0]["username"], "testuser");
}

#[tokio::test]
async fn test_user_profile() {
    let fixture = setup().await;
    fixture
        .app
        .store
        .create_message(fixture.testuser.id, "profile post")
        .await
        .unwrap();
    let mut client = Client::new(&fixture.app);

    let response = client.get(&format!("/users/{}", fixture.testuser.id)).await;

    assert_eq!(response.status, StatusCode::OK);
    let data = &response.body["data"];
    assert_eq!(data["user"]["username"], "testuser");
    assert_eq!(data["stats"]["messages"], 1);
    assert_eq!(data["stats"]["following"], 1);
    assert_eq!(data["stats"]["followers"], 1);
    assert_eq!(data["messages"][0]["text"], "profile post");
    assert!(data["is_followed_by_viewer"].is_null());

    let missing = client.get("/users/99999").await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_show_following() {
    let fixture = setup().await;
    let mut client = logged_in(&fixture).await;

    let response = client
        .get(&format!("/users/{}/following", fixture.testuser.id))
        .await;

    assert_eq!(response.status, StatusCode::OK);
    let users = response.body["data"]["users"].as_array().unwrap();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0]["username"], "abc");
    assert_eq!(users[0]["following"], true);
}

#[tokio::test]
async fn test_show_followers() {
    let fixture = setup().await;
    let mut client = logged_in(&fixture).await;

    let response = client
        .get(&format!("/users/{}/followers", fixture.testuser.id))
        .await;

    assert_eq!(response.status, StatusCode::OK);
    let users = response.body["data"]["users"].as_array().unwrap();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0]["username"], "efg");
    assert_eq!(users[0]["following"], false);
}

#[tokio::test]
async fn test_follow_pages_logged_out() {
    let fixture = setup().await;
    let mut client = Client::new(&fixture.app);

    for page in ["following", "followers", "likes"] {
        let response = client
            .get(&format!("/users/{}/{page}", fixture.testuser.id))
            .await;
        assert_eq!(response.status, StatusCode::FOUND);
        assert_eq!(response.location.as_deref(), Some("/"));

        let home = client.follow(&response).await;
        assert!(flash_messages(&home.body).contains(&"Access unauthorized.".to_string()));
    }
}

#[tokio::test]
async fn test_follow_and_stop_following() {
    let fixture = setup().await;
    let mut client = logged_in(&fixture).await;
    let me = fixture.testuser.id;

    let response = client
        .post(&format!("/users/follow/{}", fixture.u2.id), "")
        .await;
    assert_eq!(response.status, StatusCode::FOUND);
    assert_eq!(response.location, Some(format!("/users/{me}/following")));
    assert!(fixture.app.store.is_following(me, fixture.u2.id).await.unwrap());

    let response = client
        .post(&format!("/users/stop-following/{}", fixture.u1.id), "")
        .await;
    assert_eq!(response.status, StatusCode::FOUND);
    assert!(!fixture.app.store.is_following(me, fixture.u1.id).await.unwrap());

    let own = client.post(&format!("/users/follow/{me}"), "").await;
    assert_eq!(own.status, StatusCode::BAD_REQUEST);

    let missing = client.post("/users/follow/99999", "").await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_show_likes() {
    let fixture = setup().await;
    let m = fixture
        .app
        .store
        .create_message(fixture.u1.id, "likeable")
        .await
        .unwrap();
    fixture.app.store.add_like(fixture.testuser.id, m.id).await.unwrap();
    let mut client = logged_in(&fixture).await;

    let response = client
        .get(&format!("/users/{}/likes", fixture.testuser.id))
        .await;

    assert_eq!(response.status, StatusCode::OK);
    let messages = response.body["data"]["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0]["text"], "likeable");
    assert_eq!(messages[0]["liked"], true);
}

#[tokio::test]
async fn test_edit_profile() {
    let fixture = setup().await;
    let mut client = logged_in(&fixture).await;
    let me = fixture.testuser.id;

    let response = client.get("/users/profile").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["username"], "testuser");

    let response = client
        .post(
            "/users/profile",
            "username=renamed&email=test%40test.com&bio=Hi+there&password=wrongpass",
        )
        .await;
    assert_eq!(response.status, StatusCode::FOUND);
    assert_eq!(response.location.as_deref(), Some("/"));
    let home = client.follow(&response).await;
    assert!(flash_messages(&home.body).contains(&"Wrong password, please try again.".to_string()));
    assert_eq!(
        fixture.app.store.get_user(me).await.unwrap().unwrap().username,
        "testuser"
    );

    let response = client
        .post(
            "/users/profile",
            "username=renamed&email=test%40test.com&bio=Hi+there&location=Home&password=testpass",
        )
        .await;
    assert_eq!(response.status, StatusCode::FOUND);
    assert_eq!(response.location, Some(format!("/users/{me}")));

    let user = fixture.app.store.get_user(me).await.unwrap().unwrap();
    assert_eq!(user.username, "renamed");
    assert_eq!(user.bio.as_deref(), Some("Hi there"));
    assert_eq!(user.location.as_deref(), Some("Home"));

    let taken = client
        .post(
            "/users/profile",
            "username=abc&email=test%40test.com&password=testpass",
        )
        .await;
    assert_eq!(taken.status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_delete_account() {
    let fixture = setup().await;
    let mut client = logged_in(&fixture).await;
    let me = fixture.testuser.id;

    let response = client.post("/users/delete", "").await;
    assert_eq!(response.status, StatusCode::FOUND);
    assert_eq!(response.location.as_deref(), Some("/"));

    assert!(fixture.app.store.get_user(me).await.unwrap().is_none());
    assert!(fixture.app.store.followers(fixture.u1.id).await.unwrap().is_empty());
    assert!(fixture.app.store.following(fixture.u2.id).await.unwrap().is_empty());

    let home = client.follow(&response).await;
    assert_eq!(home.body["data"]["anonymous"], true);
}

#[tokio::test]
async fn test_health() {
    let app = spawn_app("warbler-user-view-test").await;
    let mut client = Client::new(&app);

    let response = client.get("/health").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["status"], "ok");
}
