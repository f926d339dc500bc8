use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use std::marker::PhantomData;
use uuid::Uuid;

use super::{ClientError, Session};
use crate::{
    models::{DataEnvelope, ListEnvelope, MessageResponse},
    resource::{Document, Resource},
};

const DEFAULT_API_URL: &str = "http://localhost:3000";

/// ApiClient
///
/// Builds every authorized request: picks the `/api/{Admin|Subadmin}/private` prefix
/// from the session role and attaches the bearer token.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    session: Option<Session>,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            session: None,
        }
    }

    /// Base URL from `LAB_API_URL`, falling back to a local server.
    pub fn from_env() -> Self {
        Self::new(std::env::var("LAB_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string()))
    }

    pub fn with_session(mut self, session: Session) -> Self {
        self.session = Some(session);
        self
    }

    pub fn sign_in(&mut self, session: Session) {
        self.session = Some(session);
    }

    pub fn sign_out(&mut self) {
        self.session = None;
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `{base}/api/{prefix}/private/{op}{Name}[/{arg}]`, with `arg` percent-encoded.
    pub fn endpoint(&self, op: &str, name: &str, arg: Option<&str>) -> Result<Url, ClientError> {
        let session = self.session.as_ref().ok_or(ClientError::NoSession)?;
        let mut url =
            Url::parse(&self.base_url).map_err(|e| ClientError::InvalidUrl(e.to_string()))?;
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| ClientError::InvalidUrl(self.base_url.clone()))?;
            segments
                .pop_if_empty()
                .extend(["api", session.role.route_prefix(), "private"])
                .push(&format!("{op}{name}"));
            if let Some(arg) = arg {
                segments.push(arg);
            }
        }
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> Result<RequestBuilder, ClientError> {
        let session = self.session.as_ref().ok_or(ClientError::NoSession)?;
        Ok(self
            .http
            .request(method, url)
            .header(reqwest::header::AUTHORIZATION, session.bearer()))
    }

    /// Sends once. Non-2xx statuses become `ClientError::Server`, carrying the body's
    /// `message` when it has one.
    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, ClientError> {
        let response = builder.send().await?;
        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<MessageResponse>()
                .await
                .ok()
                .map(|body| body.message);
            return Err(ClientError::Server {
                status: status.as_u16(),
                message,
            });
        }
        response
            .json::<T>()
            .await
            .map_err(|e| ClientError::Decode(e.to_string()))
    }
}

/// ResourceApi
///
/// Remote CRUD operations for one resource type. `ListResource` is generic over this
/// seam so it can run against the HTTP API or a test double.
#[async_trait]
pub trait ResourceApi<R: Resource>: Send + Sync {
    async fn fetch_all(&self, search: Option<&str>) -> Result<Vec<Document<R>>, ClientError>;
    async fn fetch_matching(&self, query: &str) -> Result<Vec<Document<R>>, ClientError>;
    async fn create(&self, body: &R) -> Result<Document<R>, ClientError>;
    async fn update(&self, id: Uuid, body: &R) -> Result<Document<R>, ClientError>;
    async fn delete(&self, id: Uuid) -> Result<(), ClientError>;
}

/// HttpResourceApi
///
/// `ResourceApi` over the REST endpoints named after `R::NAME`.
pub struct HttpResourceApi<R> {
    client: ApiClient,
    _resource: PhantomData<fn() -> R>,
}

impl<R: Resource> HttpResourceApi<R> {
    pub fn new(client: ApiClient) -> Self {
        Self {
            client,
            _resource: PhantomData,
        }
    }
}

#[async_trait]
impl<R: Resource> ResourceApi<R> for HttpResourceApi<R> {
    async fn fetch_all(&self, search: Option<&str>) -> Result<Vec<Document<R>>, ClientError> {
        let mut url = self.client.endpoint("getAll", R::NAME, None)?;
        if let Some(term) = search.map(str::trim).filter(|t| !t.is_empty()) {
            url.query_pairs_mut().append_pair("search", term);
        }
        let envelope: ListEnvelope<Document<R>> =
            self.client.send(self.client.request(Method::GET, url)?).await?;
        Ok(envelope.data)
    }

    async fn fetch_matching(&self, query: &str) -> Result<Vec<Document<R>>, ClientError> {
        let url = self.client.endpoint("get", R::NAME, Some(query))?;
        let envelope: ListEnvelope<Document<R>> =
            self.client.send(self.client.request(Method::GET, url)?).await?;
        Ok(envelope.data)
    }

    async fn create(&self, body: &R) -> Result<Document<R>, ClientError> {
        let url = self.client.endpoint("create", R::NAME, None)?;
        let envelope: DataEnvelope<Document<R>> = self
            .client
            .send(self.client.request(Method::POST, url)?.json(body))
            .await?;
        Ok(envelope.data)
    }

    async fn update(&self, id: Uuid, body: &R) -> Result<Document<R>, ClientError> {
        let url = self
            .client
            .endpoint("update", R::NAME, Some(&id.to_string()))?;
        let envelope: DataEnvelope<Document<R>> = self
            .client
            .send(self.client.request(Method::PUT, url)?.json(body))
            .await?;
        Ok(envelope.data)
    }

    async fn delete(&self, id: Uuid) -> Result<(), ClientError> {
        let url = self
            .client
            .endpoint("delete", R::NAME, Some(&id.to_string()))?;
        let _: MessageResponse = self
            .client
            .send(self.client.request(Method::DELETE, url)?)
            .await?;
        Ok(())
    }
}
