use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use blog_api::{
    ApiError, AppConfig, AppState, InMemoryRepository,
    auth::AuthUser,
    handlers::{self, AppJson, AppPath},
    models::{CommentRequest, LoginRequest, Post, PostRequest, RegisterRequest, User},
    password, seed,
};
use std::sync::Arc;

// --- Helpers ---

fn create_state() -> AppState {
    AppState::new(Arc::new(InMemoryRepository::new()), &AppConfig::default())
}

async fn register(state: &AppState, email: &str, name: &str) -> AuthUser {
    let (status, Json(body)) = handlers::register(
        State(state.clone()),
        AppJson(RegisterRequest {
            email: email.to_string(),
            password: "password123".to_string(),
            name: name.to_string(),
        }),
    )
    .await
    .unwrap();
    assert_eq!(status, StatusCode::CREATED);
    AuthUser { id: body.user.id }
}

async fn create_post(state: &AppState, owner: AuthUser, title: &str) -> Post {
    let (_, Json(post)) = handlers::create_post(
        owner,
        State(state.clone()),
        AppJson(PostRequest {
            title: title.to_string(),
            content: "A body long enough to pass validation.".to_string(),
        }),
    )
    .await
    .unwrap();
    post
}

async fn comment(state: &AppState, author: AuthUser, post_id: i64, content: &str) -> i64 {
    let (status, Json(comment)) = handlers::create_comment(
        author,
        State(state.clone()),
        AppPath(post_id),
        AppJson(CommentRequest {
            content: content.to_string(),
        }),
    )
    .await
    .unwrap();
    assert_eq!(status, StatusCode::CREATED);
    comment.id
}

fn assert_error(err: ApiError, status: StatusCode, message: &str) {
    assert_eq!(err.status(), status, "unexpected status for {err}");
    assert_eq!(err.to_string(), message);
}

// --- Registration & Login ---

#[tokio::test]
async fn test_register_returns_token_and_public_user() {
    let state = create_state();

    let (status, Json(body)) = handlers::register(
        State(state.clone()),
        AppJson(RegisterRequest {
            email: "alice@example.com".to_string(),
            password: "secret1".to_string(),
            name: "Alice".to_string(),
        }),
    )
    .await
    .unwrap();

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body.user.email, "alice@example.com");
    assert_eq!(state.tokens.validate(&body.token), Ok(body.user.id));

    let json = serde_json::to_value(&body.user).unwrap();
    assert!(json.get("password").is_none());
    assert!(json.get("password_hash").is_none());
}

#[tokio::test]
async fn test_register_reports_first_violated_rule() {
    let state = create_state();
    let long_name = "N".repeat(101);
    let cases = [
        (("", "", ""), "email is required"),
        (("a@b.co", "", "Al"), "password is required"),
        (("a@b.co", "secret", ""), "name is required"),
        (("not-an-email", "secret", "Al"), "Invalid email format"),
        (("a@b.co", "12345", "Al"), "Password must be at least 6 characters"),
        (
            ("a@b.co", "123456", long_name.as_str()),
            "Name must be between 1 and 100 characters",
        ),
    ];

    for ((email, password, name), expected) in cases {
        let err = handlers::register(
            State(state.clone()),
            AppJson(RegisterRequest {
                email: email.to_string(),
                password: password.to_string(),
                name: name.to_string(),
            }),
        )
        .await
        .unwrap_err();
        assert_error(err, StatusCode::BAD_REQUEST, expected);
    }
}

#[tokio::test]
async fn test_register_duplicate_email_is_rejected() {
    let state = create_state();
    let first = register(&state, "dup@example.com", "First").await;

    let err = handlers::register(
        State(state.clone()),
        AppJson(RegisterRequest {
            email: "dup@example.com".to_string(),
            password: "other-password".to_string(),
            name: "Second".to_string(),
        }),
    )
    .await
    .unwrap_err();

    assert_error(err, StatusCode::BAD_REQUEST, "Email already exists");
    assert_eq!(state.repo.count_users().await.unwrap(), 1);

    // The original account and password are untouched.
    let Json(body) = handlers::login(
        State(state.clone()),
        AppJson(LoginRequest {
            email: "dup@example.com".to_string(),
            password: "password123".to_string(),
        }),
    )
    .await
    .unwrap();
    assert_eq!(body.user.id, first.id);
    assert_eq!(body.user.name, "First");
}

#[tokio::test]
async fn test_login_success_issues_token_for_user() {
    let state = create_state();
    let alice = register(&state, "alice@example.com", "Alice").await;

    let Json(body) = handlers::login(
        State(state.clone()),
        AppJson(LoginRequest {
            email: "alice@example.com".to_string(),
            password: "password123".to_string(),
        }),
    )
    .await
    .unwrap();

    assert_eq!(body.user.id, alice.id);
    assert_eq!(state.tokens.validate(&body.token), Ok(alice.id));
}

#[tokio::test]
async fn test_login_does_not_reveal_which_credential_was_wrong() {
    let state = create_state();
    register(&state, "alice@example.com", "Alice").await;

    let wrong_password = handlers::login(
        State(state.clone()),
        AppJson(LoginRequest {
            email: "alice@example.com".to_string(),
            password: "wrong-password".to_string(),
        }),
    )
    .await
    .unwrap_err();
    let unknown_email = handlers::login(
        State(state.clone()),
        AppJson(LoginRequest {
            email: "nobody@example.com".to_string(),
            password: "password123".to_string(),
        }),
    )
    .await
    .unwrap_err();

    let a = wrong_password.into_response();
    let b = unknown_email.into_response();
    assert_eq!(a.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(b.status(), StatusCode::UNAUTHORIZED);
    let a = axum::body::to_bytes(a.into_body(), usize::MAX).await.unwrap();
    let b = axum::body::to_bytes(b.into_body(), usize::MAX).await.unwrap();
    assert_eq!(a, b);
    assert_eq!(&a[..], br#"{"error":"Invalid credentials"}"#);
}

#[tokio::test]
async fn test_soft_deleted_user_cannot_log_in_but_keeps_posts() {
    let state = create_state();
    let alice = register(&state, "alice@example.com", "Alice").await;
    let post = create_post(&state, alice, "Still visible").await;

    let mut tx = state.repo.begin().await.unwrap();
    tx.soft_delete_user(alice.id).await.unwrap();
    tx.commit().await.unwrap();

    let err = handlers::login(
        State(state.clone()),
        AppJson(LoginRequest {
            email: "alice@example.com".to_string(),
            password: "password123".to_string(),
        }),
    )
    .await
    .unwrap_err();
    assert_error(err, StatusCode::UNAUTHORIZED, "Invalid credentials");

    let Json(found) = handlers::get_post(State(state), AppPath(post.id)).await.unwrap();
    assert_eq!(found.user.id, alice.id);
    assert_eq!(found.user.name, "Alice");
}

#[tokio::test]
async fn test_login_requires_both_fields() {
    let state = create_state();

    let err = handlers::login(State(state), AppJson(LoginRequest::default()))
        .await
        .unwrap_err();

    assert_error(err, StatusCode::BAD_REQUEST, "email is required");
}

// --- Posts ---

#[tokio::test]
async fn test_create_post_embeds_owner() {
    let state = create_state();
    let alice = register(&state, "alice@example.com", "Alice").await;

    let post = create_post(&state, alice, "Hello World").await;

    assert_eq!(post.user_id, alice.id);
    assert_eq!(post.user.name, "Alice");
    assert!(post.comments.is_empty());
}

#[tokio::test]
async fn test_create_post_validation_messages() {
    let state = create_state();
    let alice = register(&state, "alice@example.com", "Alice").await;
    let cases = [
        (("", "long enough content"), "title is required"),
        (("Title", ""), "content is required"),
        (("Hi", "long enough content"), "Title must be between 3 and 200 characters"),
        (("Title", "too short"), "Content must be between 10 and 10000 characters"),
    ];

    for ((title, content), expected) in cases {
        let err = handlers::create_post(
            alice,
            State(state.clone()),
            AppJson(PostRequest {
                title: title.to_string(),
                content: content.to_string(),
            }),
        )
        .await
        .unwrap_err();
        assert_error(err, StatusCode::BAD_REQUEST, expected);
    }

    let Json(posts) = handlers::get_posts(State(state)).await.unwrap();
    assert!(posts.is_empty(), "rejected input must not persist anything");
}

#[tokio::test]
async fn test_get_missing_post_is_not_found() {
    let state = create_state();

    let err = handlers::get_post(State(state), AppPath(999)).await.unwrap_err();

    assert_error(err, StatusCode::NOT_FOUND, "Post not found");
}

#[tokio::test]
async fn test_update_post_by_owner() {
    let state = create_state();
    let alice = register(&state, "alice@example.com", "Alice").await;
    let post = create_post(&state, alice, "Original").await;

    let Json(updated) = handlers::update_post(
        alice,
        State(state.clone()),
        AppPath(post.id),
        AppJson(PostRequest {
            title: "Updated".to_string(),
            content: "Updated content body".to_string(),
        }),
    )
    .await
    .unwrap();

    assert_eq!(updated.id, post.id);
    assert_eq!(updated.title, "Updated");
    assert!(updated.updated_at >= post.updated_at);
}

#[tokio::test]
async fn test_update_post_by_non_owner_is_forbidden_and_leaves_post_unchanged() {
    let state = create_state();
    let alice = register(&state, "alice@example.com", "Alice").await;
    let bob = register(&state, "bob@example.com", "Bob").await;
    let post = create_post(&state, alice, "Alice's post").await;

    let err = handlers::update_post(
        bob,
        State(state.clone()),
        AppPath(post.id),
        AppJson(PostRequest {
            title: "Hijacked".to_string(),
            content: "Hijacked content body".to_string(),
        }),
    )
    .await
    .unwrap_err();
    assert_error(err, StatusCode::FORBIDDEN, "You can only update your own posts");

    let Json(current) = handlers::get_post(State(state), AppPath(post.id)).await.unwrap();
    assert_eq!(current.title, "Alice's post");
}

#[tokio::test]
async fn test_update_missing_post_is_not_found_before_ownership() {
    let state = create_state();
    let alice = register(&state, "alice@example.com", "Alice").await;

    let err = handlers::update_post(
        alice,
        State(state),
        AppPath(12345),
        AppJson(PostRequest {
            title: "Updated".to_string(),
            content: "Updated content body".to_string(),
        }),
    )
    .await
    .unwrap_err();

    assert_error(err, StatusCode::NOT_FOUND, "Post not found");
}

#[tokio::test]
async fn test_delete_post_by_non_owner_is_forbidden() {
    let state = create_state();
    let alice = register(&state, "alice@example.com", "Alice").await;
    let bob = register(&state, "bob@example.com", "Bob").await;
    let post = create_post(&state, alice, "Alice's post").await;

    let err = handlers::delete_post(bob, State(state.clone()), AppPath(post.id))
        .await
        .unwrap_err();

    assert_error(err, StatusCode::FORBIDDEN, "You can only delete your own posts");
    assert!(handlers::get_post(State(state), AppPath(post.id)).await.is_ok());
}

#[tokio::test]
async fn test_delete_post_cascades_to_comments() {
    let state = create_state();
    let alice = register(&state, "alice@example.com", "Alice").await;
    let bob = register(&state, "bob@example.com", "Bob").await;
    let post = create_post(&state, alice, "Doomed post").await;
    comment(&state, bob, post.id, "first!").await;
    comment(&state, alice, post.id, "thanks").await;

    let Json(message) = handlers::delete_post(alice, State(state.clone()), AppPath(post.id))
        .await
        .unwrap();
    assert_eq!(message.message, "Post deleted successfully");

    let err = handlers::get_post(State(state.clone()), AppPath(post.id))
        .await
        .unwrap_err();
    assert_error(err, StatusCode::NOT_FOUND, "Post not found");

    let err = handlers::get_comments(State(state.clone()), AppPath(post.id))
        .await
        .unwrap_err();
    assert_error(err, StatusCode::NOT_FOUND, "Post not found");

    let Json(posts) = handlers::get_posts(State(state.clone())).await.unwrap();
    assert!(posts.iter().all(|p| p.id != post.id));

    let err = handlers::create_comment(
        bob,
        State(state),
        AppPath(post.id),
        AppJson(CommentRequest {
            content: "too late".to_string(),
        }),
    )
    .await
    .unwrap_err();
    assert_error(err, StatusCode::NOT_FOUND, "Post not found");
}

#[tokio::test]
async fn test_deleted_post_cannot_be_deleted_twice() {
    let state = create_state();
    let alice = register(&state, "alice@example.com", "Alice").await;
    let post = create_post(&state, alice, "Once only").await;

    handlers::delete_post(alice, State(state.clone()), AppPath(post.id))
        .await
        .unwrap();
    let err = handlers::delete_post(alice, State(state), AppPath(post.id))
        .await
        .unwrap_err();

    assert_error(err, StatusCode::NOT_FOUND, "Post not found");
}

// --- Comments ---

#[tokio::test]
async fn test_comment_validation() {
    let state = create_state();
    let alice = register(&state, "alice@example.com", "Alice").await;
    let post = create_post(&state, alice, "Commentable").await;

    let err = handlers::create_comment(
        alice,
        State(state.clone()),
        AppPath(post.id),
        AppJson(CommentRequest::default()),
    )
    .await
    .unwrap_err();
    assert_error(err, StatusCode::BAD_REQUEST, "content is required");

    let err = handlers::create_comment(
        alice,
        State(state),
        AppPath(post.id),
        AppJson(CommentRequest {
            content: "x".repeat(1001),
        }),
    )
    .await
    .unwrap_err();
    assert_error(
        err,
        StatusCode::BAD_REQUEST,
        "Content must be between 1 and 1000 characters",
    );
}

#[tokio::test]
async fn test_get_post_includes_comments_with_owners() {
    let state = create_state();
    let alice = register(&state, "alice@example.com", "Alice").await;
    let bob = register(&state, "bob@example.com", "Bob").await;
    let post = create_post(&state, alice, "With comments").await;
    comment(&state, bob, post.id, "Nice post").await;

    let Json(found) = handlers::get_post(State(state.clone()), AppPath(post.id))
        .await
        .unwrap();
    assert_eq!(found.comments.len(), 1);
    let owner: &User = found.comments[0].user.as_ref().expect("owner attached");
    assert_eq!(owner.name, "Bob");

    let Json(comments) = handlers::get_comments(State(state), AppPath(post.id))
        .await
        .unwrap();
    assert_eq!(comments.len(), 1);
    assert_eq!(comments[0].user_id, bob.id);
}

#[tokio::test]
async fn test_delete_comment_through_other_post_is_not_found() {
    let state = create_state();
    let alice = register(&state, "alice@example.com", "Alice").await;
    let first = create_post(&state, alice, "First post").await;
    let second = create_post(&state, alice, "Second post").await;
    let comment_id = comment(&state, alice, first.id, "on the first post").await;

    let err = handlers::delete_comment(alice, State(state.clone()), AppPath((second.id, comment_id)))
        .await
        .unwrap_err();
    assert_error(err, StatusCode::NOT_FOUND, "Comment not found");

    let Json(comments) = handlers::get_comments(State(state), AppPath(first.id))
        .await
        .unwrap();
    assert_eq!(comments.len(), 1, "comment must survive the mismatched delete");
}

#[tokio::test]
async fn test_delete_comment_by_non_owner_is_forbidden() {
    let state = create_state();
    let alice = register(&state, "alice@example.com", "Alice").await;
    let bob = register(&state, "bob@example.com", "Bob").await;
    let post = create_post(&state, alice, "Alice's post").await;
    let comment_id = comment(&state, bob, post.id, "Bob's comment").await;

    // Owning the post does not grant rights over other people's comments.
    let err = handlers::delete_comment(alice, State(state.clone()), AppPath((post.id, comment_id)))
        .await
        .unwrap_err();
    assert_error(err, StatusCode::FORBIDDEN, "You can only delete your own comments");

    let Json(message) = handlers::delete_comment(bob, State(state.clone()), AppPath((post.id, comment_id)))
        .await
        .unwrap();
    assert_eq!(message.message, "Comment deleted successfully");

    let Json(comments) = handlers::get_comments(State(state), AppPath(post.id))
        .await
        .unwrap();
    assert!(comments.is_empty());
}

// --- Seed ---

#[tokio::test]
async fn test_seed_inserts_demo_users_once() {
    let state = create_state();

    let inserted = seed::seed_demo_users(state.repo.as_ref()).await.unwrap();
    assert_eq!(inserted, 2);
    let again = seed::seed_demo_users(state.repo.as_ref()).await.unwrap();
    assert_eq!(again, 0);

    let Json(body) = handlers::login(
        State(state),
        AppJson(LoginRequest {
            email: "john@example.com".to_string(),
            password: seed::DEMO_PASSWORD.to_string(),
        }),
    )
    .await
    .unwrap();
    assert_eq!(body.user.name, "John Doe");
}

#[tokio::test]
async fn test_seed_salts_each_demo_password_separately() {
    let state = create_state();
    seed::seed_demo_users(state.repo.as_ref()).await.unwrap();

    let mut hashes = Vec::new();
    for (email, _) in seed::DEMO_USERS {
        let user = state.repo.find_user_by_email(email).await.unwrap().unwrap();
        assert!(password::verify_password(&user.password_hash, seed::DEMO_PASSWORD));
        hashes.push(user.password_hash);
    }

    assert_ne!(hashes[0], hashes[1]);
}

#[tokio::test]
async fn test_seed_skips_when_users_exist() {
    let state = create_state();
    register(&state, "someone@example.com", "Someone").await;

    let inserted = seed::seed_demo_users(state.repo.as_ref()).await.unwrap();

    assert_eq!(inserted, 0);
}
