mod common;

use actix_web::http::StatusCode;
use actix_web::test;
use community_server::build_app;
use community_server::data::comment_repository::CommentRepository;
use community_server::data::follow_repository::FollowRepository;
use community_server::data::post_repository::PostRepository;
use community_server::domain::post::PostScope;
use community_server::presentation::middleware::SESSION_COOKIE;
use serde_json::{Value, json};

use common::{ADMIN_TOKEN, fixture, location};

#[actix_web::test]
async fn anonymous_visitors_are_sent_to_login() {
    let f = fixture().await;
    let post = f.post(&f.leo, "someone else's post", None).await;
    let app = test::init_service(build_app(f.state.clone())).await;

    let resp =
        test::call_service(&app, test::TestRequest::get().uri("/create/").to_request()).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/auth/login/?next=/create/");

    let edit = format!("/posts/{}/edit/", post.id);
    let comment = format!("/posts/{}/comment/", post.id);
    for (req, next) in [
        (test::TestRequest::get().uri(&edit), edit.clone()),
        (
            test::TestRequest::post()
                .uri(&comment)
                .set_json(json!({ "text": "hi" })),
            comment.clone(),
        ),
        (test::TestRequest::get().uri("/follow/"), "/follow/".into()),
        (
            test::TestRequest::get().uri("/profile/leo/follow/"),
            "/profile/leo/follow/".into(),
        ),
    ] {
        let resp = test::call_service(&app, req.to_request()).await;
        assert_eq!(resp.status(), StatusCode::FOUND, "{next}");
        assert_eq!(location(&resp), format!("/auth/login/?next={next}"));
    }

    assert!(f.repos.comments.list_for_post(post.id).await.unwrap().is_empty());
}

#[actix_web::test]
async fn create_post_redirects_to_profile_and_leads_the_feed() {
    let f = fixture().await;
    f.post(&f.ann, "an older post", None).await;
    let app = test::init_service(build_app(f.state.clone())).await;

    let form: Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::get()
            .uri("/create/")
            .cookie(f.session(&f.leo))
            .to_request(),
    )
    .await;
    assert_eq!(form["is_edit"], false);
    assert_eq!(form["groups"][0]["slug"], "rust");

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/create/")
            .cookie(f.session(&f.leo))
            .set_json(json!({ "text": "Fresh from the form", "group": f.group.id }))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/profile/leo/");

    let latest = f.repos.posts.list(PostScope::All, 10, 0).await.unwrap();
    assert_eq!(latest.len(), 2);
    assert_eq!(latest[0].text, "Fresh from the form");
    assert_eq!(latest[0].author_id, f.leo.id);
    assert_eq!(latest[0].group_id, Some(f.group.id));
}

#[actix_web::test]
async fn invalid_post_is_redisplayed_with_errors() {
    let f = fixture().await;
    let app = test::init_service(build_app(f.state.clone())).await;

    for payload in [
        json!({ "text": "" }),
        json!({ "text": "abc" }),
        json!({ "text": "valid enough", "group": 9999 }),
    ] {
        let resp = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/create/")
                .cookie(f.session(&f.leo))
                .set_json(&payload)
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK, "{payload}");
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["form"]["fields"]["text"], payload["text"]);
        let errors = body["form"]["errors"].as_object().unwrap();
        assert!(!errors.is_empty(), "{payload}");
    }

    assert_eq!(f.repos.posts.count(PostScope::All).await.unwrap(), 0);
}

#[actix_web::test]
async fn only_the_author_can_edit() {
    let f = fixture().await;
    let post = f.post(&f.leo, "the original text", None).await;
    let app = test::init_service(build_app(f.state.clone())).await;
    let edit = format!("/posts/{}/edit/", post.id);
    let detail = format!("/posts/{}/", post.id);

    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri(&edit)
            .cookie(f.session(&f.ann))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), detail);

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri(&edit)
            .cookie(f.session(&f.ann))
            .set_json(json!({ "text": "hijacked text" }))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), detail);
    let unchanged = f.repos.posts.find_by_id(post.id).await.unwrap().unwrap();
    assert_eq!(unchanged.text, "the original text");

    let form: Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::get()
            .uri(&edit)
            .cookie(f.session(&f.leo))
            .to_request(),
    )
    .await;
    assert_eq!(form["is_edit"], true);
    assert_eq!(form["post_id"], post.id);
    assert_eq!(form["form"]["fields"]["text"], "the original text");

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri(&edit)
            .cookie(f.session(&f.leo))
            .set_json(json!({ "text": "the edited text", "group": f.group.id }))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), detail);
    let edited = f.repos.posts.find_by_id(post.id).await.unwrap().unwrap();
    assert_eq!(edited.text, "the edited text");
    assert_eq!(edited.group_id, Some(f.group.id));
    assert_eq!(edited.created_at, post.created_at);
}

#[actix_web::test]
async fn editing_a_missing_post_is_not_found() {
    let f = fixture().await;
    let app = test::init_service(build_app(f.state.clone())).await;

    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/posts/404/edit/")
            .cookie(f.session(&f.leo))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn comments_are_attached_or_rejected() {
    let f = fixture().await;
    let post = f.post(&f.leo, "comment on me", None).await;
    let app = test::init_service(build_app(f.state.clone())).await;
    let uri = format!("/posts/{}/comment/", post.id);

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri(&uri)
            .cookie(f.session(&f.ann))
            .set_json(json!({ "text": "Nice one" }))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), format!("/posts/{}/", post.id));

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri(&uri)
            .cookie(f.session(&f.ann))
            .set_json(json!({ "text": "   " }))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert!(body["form"]["errors"]["text"].is_array());
    assert_eq!(body["post"]["id"], post.id);

    let comments = f.repos.comments.list_for_post(post.id).await.unwrap();
    assert_eq!(comments.len(), 1);
    assert_eq!(comments[0].text, "Nice one");
    assert_eq!(comments[0].author_id, f.ann.id);

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/posts/777/comment/")
            .cookie(f.session(&f.ann))
            .set_json(json!({ "text": "into the void" }))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn follow_and_unfollow_round() {
    let f = fixture().await;
    let app = test::init_service(build_app(f.state.clone())).await;

    for _ in 0..2 {
        let resp = test::call_service(
            &app,
            test::TestRequest::get()
                .uri("/profile/leo/follow/")
                .cookie(f.session(&f.ann))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::FOUND);
        assert_eq!(location(&resp), "/profile/leo/");
    }
    assert_eq!(f.repos.follows.count().await.unwrap(), 1);
    assert!(f.repos.follows.exists(f.ann.id, f.leo.id).await.unwrap());

    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/profile/leo/unfollow/")
            .cookie(f.session(&f.ann))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(f.repos.follows.count().await.unwrap(), 0);

    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/profile/leo/follow/")
            .cookie(f.session(&f.leo))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(f.repos.follows.count().await.unwrap(), 0);

    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/profile/ghost/follow/")
            .cookie(f.session(&f.ann))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn admin_routes_require_the_token() {
    let f = fixture().await;
    let app = test::init_service(build_app(f.state.clone())).await;

    let resp = test::call_service(
        &app,
        test::TestRequest::post().uri("/admin/cache/clear/").to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/admin/groups/")
            .insert_header(("X-Admin-Token", "wrong"))
            .set_json(json!({ "title": "Go", "slug": "go" }))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn deleting_a_group_keeps_its_posts() {
    let f = fixture().await;
    let post = f.post(&f.leo, "filed then orphaned", Some(&f.group)).await;
    let app = test::init_service(build_app(f.state.clone())).await;

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/admin/groups/")
            .insert_header(("X-Admin-Token", ADMIN_TOKEN))
            .set_json(json!({ "title": "Rust again", "slug": "rust" }))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    let resp = test::call_service(
        &app,
        test::TestRequest::delete()
            .uri("/admin/groups/rust/")
            .insert_header(("X-Admin-Token", ADMIN_TOKEN))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let orphan = f.repos.posts.find_by_id(post.id).await.unwrap().unwrap();
    assert_eq!(orphan.group_id, None);
    assert_eq!(orphan.group_slug, None);

    let resp =
        test::call_service(&app, test::TestRequest::get().uri("/group/rust/").to_request()).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn signup_then_login_follows_next() {
    let f = fixture().await;
    let app = test::init_service(build_app(f.state.clone())).await;

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/auth/signup/")
            .set_json(json!({
                "username": "mira",
                "email": "Mira@Example.com",
                "password": "long-enough-password"
            }))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert!(
        resp.response()
            .cookies()
            .any(|c| c.name() == SESSION_COOKIE && !c.value().is_empty())
    );

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/auth/login/?next=/create/")
            .set_json(json!({ "username": "mira", "password": "long-enough-password" }))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/create/");
    let token = resp
        .response()
        .cookies()
        .find(|c| c.name() == SESSION_COOKIE)
        .map(|c| c.value().to_string())
        .unwrap();

    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/create/")
            .cookie(actix_web::cookie::Cookie::new(SESSION_COOKIE, token))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/auth/login/")
            .set_json(json!({ "username": "mira", "password": "wrong-password" }))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}
