use reqwest::multipart::{Form, Part};
use reqwest::{Client, Method, RequestBuilder, Response};
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::backend::{paths, Backend, UploadFile, UploadResponse};
use crate::error::{Error, Result};
use crate::session::ClientConfig;

/// Body shape the backend uses for failures.
#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// `Backend` over HTTP.
#[derive(Clone, Debug)]
pub struct HttpBackend {
    client: Client,
    config: ClientConfig,
}

impl HttpBackend {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let client = Client::builder().timeout(config.timeout).build()?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn url(&self, path: &str) -> Result<Url> {
        let base = self.config.api_url.as_str().trim_end_matches('/');
        let path = path.trim_start_matches('/');

        Url::parse(&format!("{base}/{path}"))
            .map_err(|err| Error::InvalidInput(format!("bad request path {path:?}: {err}")))
    }

    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder> {
        let url = self.url(path)?;
        tracing::debug!(%method, %url, "sending request");

        let builder = self.client.request(method, url);

        Ok(match &self.config.token {
            Some(token) => builder.bearer_auth(token.expose_secret()),
            None => builder,
        })
    }

    async fn send(builder: RequestBuilder) -> Result<Response> {
        let response = builder.send().await?;
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        let body = response.bytes().await.unwrap_or_default();
        let message = serde_json::from_slice::<ErrorBody>(&body)
            .ok()
            .and_then(|body| body.message.or(body.error));

        tracing::debug!(%status, ?message, "request rejected");

        Err(Error::status(status, message))
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
        let body = response.bytes().await?;
        let body: &[u8] = if body.iter().all(u8::is_ascii_whitespace) {
            b"null"
        } else {
            &body
        };

        serde_json::from_slice(body).map_err(|err| Error::Decode(err.to_string()))
    }

    async fn send_json<B, T>(&self, method: Method, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = Self::send(self.request(method, path)?.json(body)).await?;

        Self::decode(response).await
    }
}

impl Backend for HttpBackend {
    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = Self::send(self.request(Method::GET, path)?).await?;

        Self::decode(response).await
    }

    async fn post<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send_json(Method::POST, path, body).await
    }

    async fn put<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send_json(Method::PUT, path, body).await
    }

    async fn delete(&self, path: &str) -> Result<()> {
        Self::send(self.request(Method::DELETE, path)?).await?;

        Ok(())
    }

    async fn upload(&self, file: UploadFile, folder: &str) -> Result<String> {
        let mut part = Part::bytes(file.bytes).file_name(file.file_name);

        if let Some(mime) = file.mime.as_deref() {
            part = part.mime_str(mime)?;
        }

        let form = Form::new()
            .part("file", part)
            .text("folder", folder.to_owned());

        let response = Self::send(self.request(Method::POST, paths::UPLOAD)?.multipart(form)).await?;
        let uploaded: UploadResponse = Self::decode(response).await?;

        Ok(uploaded.public_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend(api_url: &str) -> HttpBackend {
        HttpBackend::new(ClientConfig::new(Url::parse(api_url).unwrap())).unwrap()
    }

    #[test]
    fn urls_join_without_doubled_slashes() {
        let with_slash = backend("https://lms.example.com/");
        let without_slash = backend("https://lms.example.com");

        assert_eq!(
            with_slash.url("/api/courses/3").unwrap().as_str(),
            "https://lms.example.com/api/courses/3"
        );
        assert_eq!(
            without_slash.url("api/upload").unwrap().as_str(),
            "https://lms.example.com/api/upload"
        );
    }

    #[test]
    fn urls_keep_a_base_path_prefix() {
        let prefixed = backend("https://lms.example.com/v2/");

        assert_eq!(
            prefixed.url("/api/storeQuizInfo").unwrap().as_str(),
            "https://lms.example.com/v2/api/storeQuizInfo"
        );
    }
}
