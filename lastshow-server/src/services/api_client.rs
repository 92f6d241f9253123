//! Typed client for the remote obituary/auth API.
//!
//! [`ObituaryApi`] is the seam the workflows depend on; [`HttpObituaryApi`]
//! is the `reqwest` implementation used by the running gateway.

use async_trait::async_trait;
use axum::http::StatusCode;
use reqwest::{
    Client, RequestBuilder, Response,
    multipart::{Form, Part},
};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{Instrument, debug, info_span};
use url::Url;

use shared::models::{
    Credentials, ErrorBody, Obituary, ObituaryDraft, ObituaryList, Registration, TokenResponse,
    User,
};

use crate::auth::session::SessionToken;

const USER_AGENT: &str = concat!("lastshow-gateway/", env!("CARGO_PKG_VERSION"));

pub type ApiResult<T> = Result<T, ApiClientError>;

/// Failure of a call to the remote API.
#[derive(Debug, Clone, Error)]
pub enum ApiClientError {
    /// The API answered with a non-success status.
    #[error("remote API rejected the request with status {status}")]
    Rejected {
        status: StatusCode,
        body: Option<ErrorBody>,
    },
    /// No response was received.
    #[error("remote API unreachable: {0}")]
    Transport(String),
    /// The request could not be built or the response could not be read.
    #[error("unexpected remote API exchange: {0}")]
    Unexpected(String),
}

impl ApiClientError {
    #[must_use]
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Rejected { status, .. } => Some(*status),
            Self::Transport(_) | Self::Unexpected(_) => None,
        }
    }

    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(StatusCode::UNAUTHORIZED)
    }
}

impl From<reqwest::Error> for ApiClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_builder() || err.is_decode() {
            Self::Unexpected(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}

/// Operations the gateway performs against the remote API.
#[async_trait]
pub trait ObituaryApi: Send + Sync {
    /// `POST /auth/login`
    async fn login(&self, credentials: &Credentials) -> ApiResult<TokenResponse>;

    /// `POST /auth/register`
    ///
    /// Any success status counts; the created account is returned only when
    /// the body parses as a [`User`].
    async fn register(&self, registration: &Registration) -> ApiResult<Option<User>>;

    /// `GET /auth/me`
    async fn current_user(&self, token: &SessionToken) -> ApiResult<User>;

    /// `GET /obituaries/my-obituaries`
    async fn list_my_obituaries(&self, token: &SessionToken) -> ApiResult<ObituaryList>;

    /// `POST /obituaries/` as `multipart/form-data`
    async fn create_obituary(
        &self,
        token: &SessionToken,
        draft: &ObituaryDraft,
    ) -> ApiResult<Obituary>;

    /// `DELETE /obituaries/{id}`
    async fn delete_obituary(&self, token: &SessionToken, id: &str) -> ApiResult<()>;

    /// `GET /health`
    async fn health(&self) -> ApiResult<()>;
}

/// [`ObituaryApi`] over HTTP.
#[derive(Debug, Clone)]
pub struct HttpObituaryApi {
    client: Client,
    base_url: Url,
}

impl HttpObituaryApi {
    /// Builds a client rooted at `base_url`.
    ///
    /// # Errors
    /// Returns [`ApiClientError::Unexpected`] if the HTTP client cannot be constructed
    /// or the URL cannot carry a path.
    pub fn new(base_url: Url) -> ApiResult<Self> {
        if base_url.cannot_be_a_base() {
            return Err(ApiClientError::Unexpected(format!(
                "API base URL {base_url} cannot carry a path"
            )));
        }

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|err| ApiClientError::Unexpected(err.to_string()))?;

        Ok(Self { client, base_url })
    }

    fn endpoint(&self, segments: &[&str]) -> ApiResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| {
                ApiClientError::Unexpected(format!(
                    "API base URL {} cannot carry a path",
                    self.base_url
                ))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn send(&self, name: &'static str, request: RequestBuilder) -> ApiResult<Response> {
        let request = request.build()?;
        let span = info_span!(
            "remote_api",
            operation = name,
            http.method = %request.method(),
            url = %request.url()
        );

        let response = self.client.execute(request).instrument(span).await?;
        debug!(operation = name, status = %response.status(), "remote API responded");
        Ok(response)
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> ApiResult<T> {
    let status = response.status();
    let bytes = response.bytes().await?;

    if !status.is_success() {
        return Err(ApiClientError::Rejected {
            status,
            body: ErrorBody::parse(&bytes),
        });
    }

    serde_json::from_slice(&bytes)
        .map_err(|err| ApiClientError::Unexpected(format!("invalid response body: {err}")))
}

async fn decode_if_present<T: DeserializeOwned>(response: Response) -> ApiResult<Option<T>> {
    let status = response.status();
    let bytes = response.bytes().await?;

    if !status.is_success() {
        return Err(ApiClientError::Rejected {
            status,
            body: ErrorBody::parse(&bytes),
        });
    }

    match serde_json::from_slice(&bytes) {
        Ok(value) => Ok(Some(value)),
        Err(err) => {
            debug!(error = %err, "success body ignored");
            Ok(None)
        }
    }
}

async fn expect_success(response: Response) -> ApiResult<()> {
    let status = response.status();
    if status.is_success() {
        return Ok(());
    }

    let bytes = response.bytes().await?;
    Err(ApiClientError::Rejected {
        status,
        body: ErrorBody::parse(&bytes),
    })
}

fn obituary_form(draft: &ObituaryDraft) -> ApiResult<Form> {
    let mut form = Form::new()
        .text("name", draft.name.clone())
        .text("birth_date", draft.birth_date_iso())
        .text("death_date", draft.death_date_iso())
        .text("is_public", draft.is_public_value());

    if let Some(image) = &draft.image {
        let mut part = Part::bytes(image.bytes.clone()).file_name(image.file_name.clone());
        if let Some(content_type) = &image.content_type {
            part = part.mime_str(content_type)?;
        }
        form = form.part("image", part);
    }

    Ok(form)
}

#[async_trait]
impl ObituaryApi for HttpObituaryApi {
    async fn login(&self, credentials: &Credentials) -> ApiResult<TokenResponse> {
        let url = self.endpoint(&["auth", "login"])?;
        let response = self
            .send("login", self.client.post(url).json(credentials))
            .await?;
        decode(response).await
    }

    async fn register(&self, registration: &Registration) -> ApiResult<Option<User>> {
        let url = self.endpoint(&["auth", "register"])?;
        let response = self
            .send("register", self.client.post(url).json(registration))
            .await?;
        decode_if_present(response).await
    }

    async fn current_user(&self, token: &SessionToken) -> ApiResult<User> {
        let url = self.endpoint(&["auth", "me"])?;
        let response = self
            .send(
                "current_user",
                self.client.get(url).bearer_auth(token.expose()),
            )
            .await?;
        decode(response).await
    }

    async fn list_my_obituaries(&self, token: &SessionToken) -> ApiResult<ObituaryList> {
        let url = self.endpoint(&["obituaries", "my-obituaries"])?;
        let response = self
            .send(
                "list_my_obituaries",
                self.client.get(url).bearer_auth(token.expose()),
            )
            .await?;
        decode(response).await
    }

    async fn create_obituary(
        &self,
        token: &SessionToken,
        draft: &ObituaryDraft,
    ) -> ApiResult<Obituary> {
        // Trailing empty segment keeps the collection's trailing slash.
        let url = self.endpoint(&["obituaries", ""])?;
        let form = obituary_form(draft)?;
        let response = self
            .send(
                "create_obituary",
                self.client
                    .post(url)
                    .bearer_auth(token.expose())
                    .multipart(form),
            )
            .await?;
        decode(response).await
    }

    async fn delete_obituary(&self, token: &SessionToken, id: &str) -> ApiResult<()> {
        let url = self.endpoint(&["obituaries", id])?;
        let response = self
            .send(
                "delete_obituary",
                self.client.delete(url).bearer_auth(token.expose()),
            )
            .await?;
        expect_success(response).await
    }

    async fn health(&self) -> ApiResult<()> {
        let url = self.endpoint(&["health"])?;
        let response = self.send("health", self.client.get(url)).await?;
        expect_success(response).await
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::json;
    use shared::models::{ErrorDetail, ImageUpload};
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> HttpObituaryApi {
        HttpObituaryApi::new(Url::parse(&server.uri()).unwrap()).unwrap()
    }

    fn token() -> SessionToken {
        SessionToken::new("tok-123").unwrap()
    }

    fn draft(image: Option<ImageUpload>) -> ObituaryDraft {
        ObituaryDraft {
            name: "Grace Hopper".into(),
            birth_date: NaiveDate::from_ymd_opt(1906, 12, 9).unwrap(),
            death_date: NaiveDate::from_ymd_opt(1992, 1, 1).unwrap(),
            is_public: false,
            image,
        }
    }

    #[test]
    fn endpoint_respects_base_path_and_encodes_ids() {
        let api = HttpObituaryApi::new(Url::parse("http://api.internal/v1/").unwrap()).unwrap();
        assert_eq!(
            api.endpoint(&["obituaries", ""]).unwrap().as_str(),
            "http://api.internal/v1/obituaries/"
        );
        assert_eq!(
            api.endpoint(&["obituaries", "a b/c"]).unwrap().as_str(),
            "http://api.internal/v1/obituaries/a%20b%2Fc"
        );
    }

    #[test]
    fn rejects_base_urls_without_paths() {
        let err = HttpObituaryApi::new(Url::parse("mailto:someone@example.com").unwrap())
            .unwrap_err();
        assert!(matches!(err, ApiClientError::Unexpected(_)));
    }

    #[tokio::test]
    async fn login_posts_json_and_returns_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/login"))
            .and(body_json(json!({ "email": "ada@example.com", "password": "pw" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "tok-123",
                "token_type": "bearer"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let token = client_for(&server)
            .login(&Credentials {
                email: "ada@example.com".into(),
                password: "pw".into(),
            })
            .await
            .unwrap();
        assert_eq!(token.access_token, "tok-123");
        assert_eq!(token.token_type.as_deref(), Some("bearer"));
    }

    #[tokio::test]
    async fn rejection_keeps_status_and_detail() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/register"))
            .respond_with(
                ResponseTemplate::new(400)
                    .set_body_json(json!({ "detail": "Email already registered" })),
            )
            .mount(&server)
            .await;

        let err = client_for(&server)
            .register(&Registration {
                email: "ada@example.com".into(),
                password: "pw".into(),
                full_name: "Ada".into(),
            })
            .await
            .unwrap_err();

        match err {
            ApiClientError::Rejected { status, body } => {
                assert_eq!(status, StatusCode::BAD_REQUEST);
                assert_eq!(
                    body.and_then(|body| body.detail),
                    Some(ErrorDetail::Message("Email already registered".into()))
                );
            }
            other => panic!("expected rejection, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn register_succeeds_whatever_the_created_body_looks_like() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/register"))
            .respond_with(
                ResponseTemplate::new(201).set_body_json(json!({ "id": 7, "email": "a@b.c" })),
            )
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/auth/register"))
            .respond_with(ResponseTemplate::new(201))
            .mount(&server)
            .await;

        let api = client_for(&server);
        let registration = Registration {
            email: "a@b.c".into(),
            password: "pw".into(),
            full_name: "Ada".into(),
        };
        assert_eq!(api.register(&registration).await.unwrap(), None);
        assert_eq!(api.register(&registration).await.unwrap(), None);
    }

    #[tokio::test]
    async fn undecodable_success_body_is_unexpected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/login"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>ok</html>"))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .login(&Credentials::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ApiClientError::Unexpected(_)));
    }

    #[tokio::test]
    async fn protected_calls_send_bearer_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/obituaries/my-obituaries"))
            .and(header("authorization", "Bearer tok-123"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "obituaries": [], "total": 0 })),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/auth/me"))
            .and(header("authorization", "Bearer tok-123"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "user-1",
                "email": "ada@example.com",
                "full_name": "Ada Lovelace"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let api = client_for(&server);
        let list = api.list_my_obituaries(&token()).await.unwrap();
        assert_eq!(list.total, 0);
        let user = api.current_user(&token()).await.unwrap();
        assert_eq!(user.email, "ada@example.com");
    }

    #[tokio::test]
    async fn create_sends_multipart_fields_and_image() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/obituaries/"))
            .and(header("authorization", "Bearer tok-123"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "id": "obit-1",
                "user_id": "user-1",
                "name": "Grace Hopper",
                "birth_date": "1906-12-09",
                "death_date": "1992-01-01",
                "obituary_text": "A pioneer.",
                "image_url": null,
                "audio_url": null,
                "is_public": false,
                "created_at": "2024-01-01T00:00:00Z"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let image = ImageUpload {
            file_name: "portrait.png".into(),
            content_type: Some("image/png".into()),
            bytes: vec![0x89, 0x50, 0x4E, 0x47],
        };
        let created = client_for(&server)
            .create_obituary(&token(), &draft(Some(image)))
            .await
            .unwrap();
        assert_eq!(created.id, "obit-1");

        let requests = server.received_requests().await.unwrap();
        let body = String::from_utf8_lossy(&requests[0].body).to_string();
        assert!(body.contains("name=\"name\""));
        assert!(body.contains("Grace Hopper"));
        assert!(body.contains("1906-12-09"));
        assert!(body.contains("name=\"is_public\"\r\n\r\nfalse"));
        assert!(body.contains("filename=\"portrait.png\""));
        assert!(body.contains("image/png"));
    }

    #[tokio::test]
    async fn create_without_image_omits_the_part() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/obituaries/"))
            .respond_with(ResponseTemplate::new(422).set_body_json(json!({
                "detail": [{ "loc": ["body", "death_date"], "msg": "must follow birth date", "type": "value_error" }]
            })))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .create_obituary(&token(), &draft(None))
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(StatusCode::UNPROCESSABLE_ENTITY));

        let requests = server.received_requests().await.unwrap();
        let body = String::from_utf8_lossy(&requests[0].body).to_string();
        assert!(!body.contains("name=\"image\""));
    }

    #[tokio::test]
    async fn delete_accepts_empty_success_body() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/obituaries/obit-1"))
            .and(header("authorization", "Bearer tok-123"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        client_for(&server)
            .delete_obituary(&token(), "obit-1")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn unauthorized_rejection_is_flagged() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/obituaries/obit-1"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "detail": "Could not validate credentials"
            })))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .delete_obituary(&token(), "obit-1")
            .await
            .unwrap_err();
        assert!(err.is_unauthorized());
    }

    #[tokio::test]
    async fn unreachable_api_is_a_transport_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let api = HttpObituaryApi::new(Url::parse(&format!("http://{addr}/")).unwrap()).unwrap();
        let err = api.health().await.unwrap_err();
        assert!(matches!(err, ApiClientError::Transport(_)));
    }
}
