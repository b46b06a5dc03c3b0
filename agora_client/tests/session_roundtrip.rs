use agora_backend::api;
use agora_backend::bootstrap;
use agora_backend::config::{AgoraConfig, AgoraPaths};
use agora_client::models::{CreatePostRequest, EngagementKind, NotificationKind, TargetRef};
use agora_client::notifications::NotificationInbox;
use agora_client::session::{ActionOutcome, ResumeOutcome};
use agora_client::{ApiClient, ClientConfig, ContentApi, PostViewSession, SessionStatus};
use reqwest::Url;
use tempfile::{tempdir, TempDir};
use tokio::net::TcpListener;
use tokio::time::{sleep, Duration};

struct Backend {
    _dir: TempDir,
    server: tokio::task::JoinHandle<()>,
    config: ClientConfig,
}

impl Backend {
    async fn start() -> Self {
        let dir = tempdir().expect("tempdir");
        let paths = AgoraPaths::from_base_dir(dir.path()).expect("paths");
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let port = listener.local_addr().expect("local addr").port();
        let server_config = AgoraConfig::new(port, paths);
        let resources = bootstrap::initialize(&server_config).expect("bootstrap");
        let database = resources.database.clone();
        let server = tokio::spawn(async move {
            let _ = api::serve_with_listener(listener, server_config, database).await;
        });

        let config = ClientConfig::default().with_api_url(format!("http://127.0.0.1:{port}"));
        wait_for_health(&config.api_url).await;
        Self {
            _dir: dir,
            server,
            config,
        }
    }

    fn client(&self) -> ApiClient {
        ApiClient::new(&self.config).expect("api client")
    }

    async fn shutdown(self) {
        self.server.abort();
        let _ = self.server.await;
    }
}

async fn wait_for_health(base_url: &str) {
    let client = reqwest::Client::new();
    for _ in 0..50 {
        if let Ok(resp) = client.get(format!("{base_url}/health")).send().await {
            if resp.status().is_success() {
                return;
            }
        }
        sleep(Duration::from_millis(100)).await;
    }
    panic!("server did not become healthy in time");
}

fn callback_from_redirect(redirect_url: &str) -> String {
    let url = Url::parse("http://localhost/")
        .and_then(|base| base.join(redirect_url))
        .expect("redirect url");
    url.query_pairs()
        .find(|(key, _)| key == "callbackUrl")
        .map(|(_, value)| value.into_owned())
        .expect("callbackUrl parameter")
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn upvote_survives_sign_in_and_notifies_author() {
    let backend = Backend::start().await;
    let post = backend
        .client()
        .create_post(&CreatePostRequest {
            author_id: "alice".into(),
            title: "Hello".into(),
            body: "First post".into(),
            ..CreatePostRequest::default()
        })
        .await
        .expect("create post");
    let location = format!("/post/{}/hello", post.id);

    let mut visitor = PostViewSession::new(
        backend.client(),
        &backend.config,
        post.id.clone(),
        location.clone(),
    );
    visitor.set_status(SessionStatus::Unauthenticated);
    visitor.load().await.expect("load as visitor");
    let outcome = visitor
        .toggle_engagement(&TargetRef::post(post.id.as_str()), EngagementKind::Upvote)
        .await
        .expect("toggle as visitor");
    let ActionOutcome::SignInRequired { redirect_url } = outcome else {
        panic!("expected sign-in redirect, got {outcome:?}");
    };
    assert!(redirect_url.starts_with("/auth/signin?callbackUrl="));
    let callback = callback_from_redirect(&redirect_url);
    assert_eq!(callback, format!("{location}?upvote=Post"));

    let mut returning =
        PostViewSession::new(backend.client(), &backend.config, post.id.clone(), callback);
    assert_eq!(returning.resume_continuation().await, ResumeOutcome::Deferred);
    returning.set_status(SessionStatus::Authenticated {
        viewer_id: "dave".into(),
    });
    returning.load().await.expect("load as dave");
    assert_eq!(returning.resume_continuation().await, ResumeOutcome::Replayed);
    assert_eq!(returning.resume_continuation().await, ResumeOutcome::Idle);
    assert_eq!(returning.location(), location);

    let post_ref = TargetRef::post(post.id.as_str());
    assert!(returning.engagement(&post_ref).upvote);
    assert_eq!(returning.vote_display(&post_ref).map(|vote| vote.score), Some(1));

    let alice_api = backend.client();
    let mut inbox = NotificationInbox::new("alice");
    inbox.refresh(&alice_api).await.expect("notifications");
    assert_eq!(inbox.unread_count(), 1);
    assert_eq!(inbox.items()[0].kind, NotificationKind::Upvote);
    assert_eq!(inbox.items()[0].actor_id, "dave");

    inbox.open();
    let (ids, result) = inbox.close(&alice_api).await.expect("mark read");
    assert_eq!(ids.len(), 1);
    assert_eq!(result.expect("server ack"), 1);

    inbox.refresh(&alice_api).await.expect("notifications again");
    assert_eq!(inbox.unread_count(), 0);

    backend.shutdown().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn comment_and_reply_build_the_tree() {
    let backend = Backend::start().await;
    let api = backend.client();
    let post = api
        .create_post(&CreatePostRequest {
            author_id: "alice".into(),
            title: "Tree".into(),
            body: "Body".into(),
            ..CreatePostRequest::default()
        })
        .await
        .expect("create post");

    let mut bob = PostViewSession::new(
        backend.client(),
        &backend.config,
        post.id.clone(),
        format!("/post/{}?commenting", post.id),
    );
    bob.set_status(SessionStatus::Authenticated {
        viewer_id: "bob".into(),
    });
    bob.load().await.expect("load");
    assert_eq!(bob.resume_continuation().await, ResumeOutcome::Opened);
    assert_eq!(
        bob.submit_comment("first!").await.expect("comment"),
        ActionOutcome::Completed
    );

    let comment_id = bob.tree().expect("tree").comments()[0].id.clone();
    bob.submit_reply(&comment_id, "replying to myself", None)
        .await
        .expect("reply");

    let tree = bob.tree().expect("tree");
    assert_eq!(tree.comments().len(), 1);
    assert_eq!(tree.replies_for(&comment_id).len(), 1);
    assert_eq!(tree.skipped_replies(), 0);
    assert_eq!(bob.post().map(|post| post.comment_count), Some(1));

    let outcome = bob
        .toggle_engagement(&TargetRef::comment(comment_id.as_str()), EngagementKind::Bookmark)
        .await;
    assert!(outcome.is_err(), "bookmarks apply to posts only");
    assert!(bob.post().is_some());

    let alice_notifications = api.list_notifications("alice").await.expect("list");
    assert_eq!(alice_notifications.len(), 1);
    assert_eq!(alice_notifications[0].kind, NotificationKind::Comment);
    // bob replying to his own comment does not notify him
    assert!(api.list_notifications("bob").await.expect("list").is_empty());

    backend.shutdown().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn page_view_is_counted_once_across_refreshes() {
    let backend = Backend::start().await;
    let post = backend
        .client()
        .create_post(&CreatePostRequest {
            author_id: "alice".into(),
            title: "Counted".into(),
            body: "Body".into(),
            ..CreatePostRequest::default()
        })
        .await
        .expect("create post");

    let mut view = PostViewSession::new(
        backend.client(),
        &backend.config,
        post.id.clone(),
        format!("/post/{}", post.id),
    );
    view.set_status(SessionStatus::Authenticated {
        viewer_id: "dave".into(),
    });
    view.load().await.expect("load");
    let post_ref = TargetRef::post(post.id.as_str());
    for _ in 0..4 {
        view.toggle_engagement(&post_ref, EngagementKind::Upvote)
            .await
            .expect("toggle");
    }

    assert_eq!(view.post().map(|post| post.view_count), Some(1));
    let fetched = backend.client().get_post(&post.id).await.expect("fetch");
    assert_eq!(fetched.view_count, 1);
    assert_eq!(fetched.upvote_count, 0);

    backend.shutdown().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn returning_with_an_active_upvote_keeps_it() {
    let backend = Backend::start().await;
    let post = backend
        .client()
        .create_post(&CreatePostRequest {
            author_id: "alice".into(),
            title: "Kept".into(),
            body: "Body".into(),
            ..CreatePostRequest::default()
        })
        .await
        .expect("create post");
    let location = format!("/post/{}", post.id);
    let post_ref = TargetRef::post(post.id.as_str());

    let mut elsewhere =
        PostViewSession::new(backend.client(), &backend.config, post.id.clone(), location.clone());
    elsewhere.set_status(SessionStatus::Authenticated {
        viewer_id: "dave".into(),
    });
    elsewhere.load().await.expect("load");
    elsewhere
        .toggle_engagement(&post_ref, EngagementKind::Upvote)
        .await
        .expect("upvote");

    let mut returning = PostViewSession::new(
        backend.client(),
        &backend.config,
        post.id.clone(),
        format!("{location}?upvote=Post"),
    );
    returning.set_status(SessionStatus::Authenticated {
        viewer_id: "dave".into(),
    });
    returning.load().await.expect("load");
    assert_eq!(returning.resume_continuation().await, ResumeOutcome::Satisfied);
    assert_eq!(returning.location(), location);
    assert!(returning.engagement(&post_ref).upvote);
    assert_eq!(returning.vote_display(&post_ref).map(|vote| vote.score), Some(1));

    backend.shutdown().await;
}
