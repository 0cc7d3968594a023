//! Drives `HttpBackend` against a local axum server that speaks the
//! backend's wire format.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};

use axum::extract::{Multipart, Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use coursekit::resources::Document;
use coursekit::{
    AuthUser, ClientConfig, ContentBlock, ContentKind, CourseBuilder, CurriculumEditor, DraftId,
    DropReason, Error, HttpBackend, PricingModel, ResourceView, Session, ToastLog, UploadFile,
};
use secrecy::SecretString;
use serde_json::{json, Value};
use url::Url;

const TOKEN: &str = "secret-token";

#[derive(Clone)]
struct Store {
    curriculum: Arc<Mutex<Value>>,
    courses: Arc<Mutex<Vec<Value>>>,
    next_id: Arc<AtomicI64>,
}

impl Store {
    fn new(curriculum: Value) -> Self {
        Self {
            curriculum: Arc::new(Mutex::new(curriculum)),
            courses: Arc::default(),
            next_id: Arc::new(AtomicI64::new(100)),
        }
    }
}

fn assign_ids(items: &mut Value, next_id: &AtomicI64) {
    let Some(items) = items.as_array_mut() else {
        return;
    };

    for item in items {
        if item["id"].is_null() {
            item["id"] = json!(next_id.fetch_add(1, Ordering::SeqCst));
        }

        if item.get("lectures").is_some() {
            assign_ids(&mut item["lectures"], next_id);
        }
    }
}

async fn get_curriculum(State(store): State<Store>, Path(_course_id): Path<i64>) -> Json<Value> {
    Json(store.curriculum.lock().unwrap().clone())
}

async fn put_curriculum(
    State(store): State<Store>,
    Path(_course_id): Path<i64>,
    Json(mut sections): Json<Value>,
) -> Json<Value> {
    assign_ids(&mut sections, &store.next_id);
    *store.curriculum.lock().unwrap() = sections.clone();

    Json(sections)
}

async fn create_course(State(store): State<Store>, Json(course): Json<Value>) -> (StatusCode, Json<Value>) {
    if course["title"].as_str().map_or(true, |title| title.trim().is_empty()) {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({ "message": "Title is required" })),
        );
    }

    store.courses.lock().unwrap().push(course);

    (StatusCode::CREATED, Json(json!({ "id": 41 })))
}

async fn course_documents(headers: HeaderMap, Path(course_id): Path<i64>) -> (StatusCode, Json<Value>) {
    let authorized = headers
        .get("authorization")
        .and_then(|value| value.to_str().ok())
        .map_or(false, |value| value == format!("Bearer {TOKEN}"));

    if !authorized {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": "Unauthenticated" })),
        );
    }

    (
        StatusCode::OK,
        Json(json!([
            { "id": 5, "courseId": course_id, "title": "Syllabus", "fileUrl": "https://cdn.test/docs/syllabus.pdf" }
        ])),
    )
}

async fn upload(mut multipart: Multipart) -> (StatusCode, Json<Value>) {
    let mut folder = None;
    let mut file_name = None;

    while let Ok(Some(field)) = multipart.next_field().await {
        match field.name().map(str::to_owned).as_deref() {
            Some("folder") => folder = field.text().await.ok(),
            Some("file") => {
                file_name = field.file_name().map(str::to_owned);
                let bytes = field.bytes().await.unwrap_or_default();
                assert!(!bytes.is_empty());
            }
            _ => {}
        }
    }

    match (folder, file_name) {
        (Some(folder), Some(file_name)) => (
            StatusCode::OK,
            Json(json!({ "publicUrl": format!("https://cdn.test/{folder}/{file_name}") })),
        ),
        _ => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "message": "file and folder are required" })),
        ),
    }
}

async fn serve(store: Store) -> Url {
    let router = Router::new()
        .route(
            "/api/courses/:id/curriculum",
            get(get_curriculum).put(put_curriculum),
        )
        .route("/api/courses", post(create_course))
        .route("/api/getCourseDocuments/:id", get(course_documents))
        .route("/api/upload", post(upload))
        .with_state(store);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind");
    let addr = listener.local_addr().expect("Failed to get local addr");

    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("Server failed");
    });

    Url::parse(&format!("http://{addr}/")).expect("Invalid server URL")
}

fn backend(api_url: Url, token: Option<&str>) -> HttpBackend {
    let mut config = ClientConfig::new(api_url);
    if let Some(token) = token {
        config = config.with_token(SecretString::new(token.to_owned()));
    }

    HttpBackend::new(config).expect("Failed to build client")
}

fn instructor() -> Session {
    Session::new(AuthUser {
        id: 1,
        name: "Ada".into(),
        email: Some("ada@example.com".into()),
        role_id: 2,
        is_admin: false,
    })
}

#[tokio::test]
async fn curriculum_edits_survive_a_save() {
    let store = Store::new(json!([
        {
            "id": 1,
            "title": "Intro",
            "order": 1,
            "lectures": [{
                "id": 2,
                "name": "Welcome",
                "order": 1,
                "contents": [
                    { "type": "desc", "order": 1, "text": "Hello" },
                    { "type": "quiz", "order": 2, "quizId": 9 }
                ]
            }]
        }
    ]));
    let api_url = serve(store.clone()).await;
    let backend = backend(api_url, Some(TOKEN));

    let (mut editor, dropped) = CurriculumEditor::load(&backend, 7, |_: &str| true)
        .await
        .unwrap();

    assert_eq!(dropped.len(), 1);
    assert!(matches!(dropped[0].reason, DropReason::UnknownType));
    assert!(!editor.is_dirty());

    let section_id = editor.add_section();
    let lecture_id = editor.add_lecture(&section_id).unwrap();
    assert!(section_id.is_temp() && lecture_id.is_temp());
    assert!(editor.is_dirty());

    let modal = editor
        .open_content(&section_id, &lecture_id, ContentKind::Video)
        .unwrap();
    let block = modal
        .upload_block(&backend, UploadFile::new("intro.mp4", vec![1, 2, 3]), Some(42.0))
        .await
        .unwrap();
    editor.apply(&modal, block).unwrap();

    let dropped = editor.save(&backend, 7).await.unwrap();
    assert!(dropped.is_empty());
    assert!(!editor.is_dirty());

    let draft = editor.draft();
    assert_eq!(draft.sections.len(), 2);
    assert_eq!(draft.sections[1].id, DraftId::Server(100));
    assert_eq!(draft.sections[1].lectures[0].id, DraftId::Server(101));
    match draft.sections[1].lectures[0].content.get(ContentKind::Video) {
        Some(ContentBlock::Video(video)) => {
            assert_eq!(video.url, "https://cdn.test/lectures/videos/intro.mp4");
            assert_eq!(video.duration, Some(42.0));
        }
        other => panic!("unexpected video slot: {other:?}"),
    }

    let stored = store.curriculum.lock().unwrap().clone();
    assert_eq!(stored[0]["lectures"][0]["contents"].as_array().unwrap().len(), 1);
    assert_eq!(stored[1]["title"], "Section 2");
    assert_eq!(stored[1]["lectures"][0]["contents"][0]["type"], "video");
}

#[tokio::test]
async fn rejected_saves_surface_the_backend_message() {
    let store = Store::new(json!([]));
    let api_url = serve(store.clone()).await;
    let toasts = ToastLog::default();
    let mut builder = CourseBuilder::new(backend(api_url, Some(TOKEN)), toasts.clone());

    let err = builder.save().await.unwrap_err();
    assert!(matches!(err, Error::Status { status, .. } if status.as_u16() == 422));
    assert_eq!(toasts.last().unwrap().message, "Title is required");
    assert_eq!(builder.course_id(), None);

    let draft = builder.draft_mut();
    draft.title = "Rust 101".into();
    draft.pricing_model = PricingModel::Free;
    draft.regular_price = "49".into();

    assert_eq!(builder.save_and_preview().await.unwrap(), "/courses/41");
    assert_eq!(builder.course_id(), Some(41));

    let courses = store.courses.lock().unwrap().clone();
    assert_eq!(courses.len(), 1);
    assert_eq!(courses[0]["regularPrice"], 0.0);
}

#[tokio::test]
async fn lists_need_the_bearer_token() {
    let api_url = serve(Store::new(json!([]))).await;
    let session = instructor();

    let anonymous = backend(api_url.clone(), None);
    let toasts = ToastLog::default();
    let mut view = ResourceView::<Document, _, _>::new(&anonymous, toasts.clone(), &session, 7);

    let err = view.load().await.unwrap_err();
    assert_eq!(err.user_message(), "Unauthenticated");
    assert!(!view.is_loaded());
    assert_eq!(toasts.toasts().len(), 1);

    let signed_in = backend(api_url, Some(TOKEN));
    let mut view = ResourceView::<Document, _, _>::new(&signed_in, ToastLog::default(), &session, 7);
    view.load().await.unwrap();

    assert_eq!(view.items().len(), 1);
    assert_eq!(view.items()[0].title, "Syllabus");
    assert_eq!(view.items()[0].course_id, 7);
}
