//! In-memory `Backend` for unit tests.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};

use crate::backend::{paths, Backend, UploadFile, UploadResponse};
use crate::error::{Error, Result};

type Reply = std::result::Result<Value, (StatusCode, Option<String>)>;

/// Replies are queued per `METHOD path`; the last one repeats.
#[derive(Default)]
pub(crate) struct FakeBackend {
    routes: Mutex<HashMap<String, VecDeque<Reply>>>,
    requests: Mutex<Vec<(String, Value)>>,
    latency: Option<Duration>,
}

impl FakeBackend {
    pub(crate) fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub(crate) fn respond(&self, method: &str, path: &str, body: Value) {
        self.push(method, path, Ok(body));
    }

    pub(crate) fn fail(&self, method: &str, path: &str, status: StatusCode, message: Option<&str>) {
        self.push(method, path, Err((status, message.map(str::to_owned))));
    }

    fn push(&self, method: &str, path: &str, reply: Reply) {
        self.routes
            .lock()
            .unwrap()
            .entry(format!("{method} {path}"))
            .or_default()
            .push_back(reply);
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|(call, _)| call.clone())
            .collect()
    }

    /// Bodies sent to `METHOD path`, oldest first.
    pub(crate) fn bodies(&self, method: &str, path: &str) -> Vec<Value> {
        let key = format!("{method} {path}");

        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|(call, _)| *call == key)
            .map(|(_, body)| body.clone())
            .collect()
    }

    async fn call(&self, method: &str, path: &str, body: Value) -> Result<Value> {
        let key = format!("{method} {path}");
        self.requests.lock().unwrap().push((key.clone(), body));

        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        let reply = {
            let mut routes = self.routes.lock().unwrap();

            match routes.get_mut(&key) {
                Some(queue) if queue.len() > 1 => queue.pop_front(),
                Some(queue) => queue.front().cloned(),
                None => None,
            }
        };

        match reply {
            Some(Ok(value)) => Ok(value),
            Some(Err((status, message))) => Err(Error::status(status, message)),
            None => Err(Error::status(
                StatusCode::NOT_FOUND,
                Some(format!("no route for {key}")),
            )),
        }
    }

    fn decode<T: DeserializeOwned>(value: Value) -> Result<T> {
        serde_json::from_value(value).map_err(|err| Error::Decode(err.to_string()))
    }
}

impl Backend for FakeBackend {
    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        Self::decode(self.call("GET", path, Value::Null).await?)
    }

    async fn post<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let body = serde_json::to_value(body)?;

        Self::decode(self.call("POST", path, body).await?)
    }

    async fn put<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let body = serde_json::to_value(body)?;

        Self::decode(self.call("PUT", path, body).await?)
    }

    async fn delete(&self, path: &str) -> Result<()> {
        self.call("DELETE", path, Value::Null).await.map(drop)
    }

    async fn upload(&self, file: UploadFile, folder: &str) -> Result<String> {
        let key = format!("POST {}", paths::UPLOAD);
        let body = json!({ "folder": folder, "fileName": file.file_name, "size": file.bytes.len() });
        let routed = self.routes.lock().unwrap().contains_key(&key);

        if !routed {
            self.requests.lock().unwrap().push((key, body));

            return Ok(format!("https://cdn.example.com/{folder}/{}", file.file_name));
        }

        let uploaded: UploadResponse = Self::decode(self.call("POST", paths::UPLOAD, body).await?)?;

        Ok(uploaded.public_url)
    }
}
