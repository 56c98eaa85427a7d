#![allow(dead_code)]

use axum::extract::Multipart;
use axum::http::header::CONTENT_TYPE;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::Router;
use image_enhancer::config::AppConfig;
use image_enhancer::proxy::server::router;
use image_enhancer::proxy::ProxyState;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

/// What the fake backend saw in its last `file` field.
#[derive(Debug, Clone, Default)]
pub struct Received {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

pub async fn spawn(app: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

/// Backend answering `POST /enhance` with `status` and `body` labelled as JPEG.
pub async fn spawn_backend(
    status: StatusCode,
    body: &'static [u8],
) -> (String, Arc<Mutex<Option<Received>>>) {
    let seen = Arc::new(Mutex::new(None));
    let seen_in_handler = Arc::clone(&seen);

    let app = Router::new().route(
        "/enhance",
        post(move |mut multipart: Multipart| {
            let seen = Arc::clone(&seen_in_handler);
            async move {
                while let Some(field) = multipart.next_field().await.unwrap() {
                    if field.name() == Some("file") {
                        let file_name = field.file_name().map(str::to_string);
                        let content_type = field.content_type().map(str::to_string);
                        let bytes = field.bytes().await.unwrap().to_vec();
                        *seen.lock().unwrap() = Some(Received {
                            file_name,
                            content_type,
                            bytes,
                        });
                    }
                }
                (status, [(CONTENT_TYPE, "image/jpeg")], body).into_response()
            }
        }),
    );

    (spawn(app).await, seen)
}

pub async fn spawn_proxy(backend_url: &str) -> String {
    let state = ProxyState::new(AppConfig::default())
        .unwrap()
        .with_backend(backend_url);
    spawn(router(Arc::new(state)).unwrap()).await
}
