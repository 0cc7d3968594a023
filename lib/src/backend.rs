use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Paths of the REST contract that are not tied to one resource kind.
pub mod paths {
    pub const COURSES: &str = "/api/courses";
    pub const UPLOAD: &str = "/api/upload";

    pub fn course(course_id: i64) -> String {
        format!("{COURSES}/{course_id}")
    }

    pub fn curriculum(course_id: i64) -> String {
        format!("{COURSES}/{course_id}/curriculum")
    }

    pub fn course_topics(course_id: i64) -> String {
        format!("/api/getCourseTopics/{course_id}")
    }

    /// Public page a course preview navigates to.
    pub fn course_page(course_id: i64) -> String {
        format!("/courses/{course_id}")
    }
}

/// A file picked for upload.
#[derive(Clone, Debug)]
pub struct UploadFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub mime: Option<String>,
}

impl UploadFile {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
            mime: None,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub public_url: String,
}

/// The REST backend. It is the only stateful party; every method is one
/// request/response round trip.
#[allow(async_fn_in_trait)]
pub trait Backend {
    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T>;

    async fn post<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned;

    async fn put<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned;

    async fn delete(&self, path: &str) -> Result<()>;

    /// Uploads `file` into `folder` and returns its public URL.
    async fn upload(&self, file: UploadFile, folder: &str) -> Result<String>;
}

impl<K: Backend + ?Sized> Backend for &K {
    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        (**self).get(path).await
    }

    async fn post<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        (**self).post(path, body).await
    }

    async fn put<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        (**self).put(path, body).await
    }

    async fn delete(&self, path: &str) -> Result<()> {
        (**self).delete(path).await
    }

    async fn upload(&self, file: UploadFile, folder: &str) -> Result<String> {
        (**self).upload(file, folder).await
    }
}

impl<K: Backend + ?Sized> Backend for Arc<K> {
    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        (**self).get(path).await
    }

    async fn post<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        (**self).post(path, body).await
    }

    async fn put<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        (**self).put(path, body).await
    }

    async fn delete(&self, path: &str) -> Result<()> {
        (**self).delete(path).await
    }

    async fn upload(&self, file: UploadFile, folder: &str) -> Result<String> {
        (**self).upload(file, folder).await
    }
}
