//! The document store facade: create, read, update and delete single
//! documents over the REST API.

use fireside_common::error::{AuthError, EncodeError, TransportError};
use fireside_common::http_client::HttpClient;
use fireside_common::{DocumentReference, MAX_LEAF_VALUES, Map, count_leaves, encode_fields};
use http::header::{AUTHORIZATION, CONTENT_TYPE};
use http::{HeaderValue, Method, StatusCode};
use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};
use smol_str::SmolStr;
use url::Url;

use crate::credentials::{Authenticator, Credentials};

mod error;
mod options;
mod response;
mod update;

pub use error::StoreError;
pub use options::{DEFAULT_DATABASE, DEFAULT_ENDPOINT, RetryPolicy, StoreOptions};
pub use response::Document;

use response::CreateRequest;

/// Characters escaped inside a single path segment. `/` separates segments
/// and is escaped only where a name is known to be one segment.
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

const JSON_UTF8: &str = "application/json; charset=UTF-8";

/// Client for the documents of one project.
///
/// Every operation asks the [`Authenticator`] for credentials first and fails
/// with [`AuthError::NotAuthenticated`] when there are none. An empty
/// `collection` or `document` argument stands for the signed-in user's id, so
/// per-user data can live at `{uid}/{uid}` without the caller tracking it.
///
/// ```no_run
/// # async fn demo() -> Result<(), fireside::StoreError> {
/// use fireside::{Credentials, DocumentStore, Replace, Value};
///
/// let store = DocumentStore::with_reqwest(Credentials::new("uid", "ID_TOKEN"), "my-project");
/// let doc = store.read("users", "").await?;
/// let replace = Replace::tree([("visits".into(), Value::Integer(1))].into());
/// store.update("users", "", &replace, &Default::default()).await?;
/// # let _ = doc;
/// # Ok(())
/// # }
/// ```
pub struct DocumentStore<C, A> {
    client: C,
    auth: A,
    project_id: SmolStr,
    options: StoreOptions,
}

impl<C, A> DocumentStore<C, A> {
    /// Create a store for `project_id` with default options.
    pub fn new(client: C, auth: A, project_id: impl Into<SmolStr>) -> Self {
        Self {
            client,
            auth,
            project_id: project_id.into(),
            options: StoreOptions::default(),
        }
    }

    /// Return a copy configured with the provided options.
    pub fn with_options(self, options: StoreOptions) -> Self {
        Self { options, ..self }
    }

    /// Current options.
    pub fn options(&self) -> &StoreOptions {
        &self.options
    }

    /// The project this store reads and writes.
    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    /// The underlying HTTP client.
    pub fn client(&self) -> &C {
        &self.client
    }

    /// The credential source.
    pub fn authenticator(&self) -> &A {
        &self.auth
    }

    /// Reference to a document in this store's database.
    ///
    /// The names are used verbatim; empty names are not replaced here since no
    /// credentials are consulted.
    pub fn reference(&self, collection: &str, document: &str) -> DocumentReference {
        DocumentReference::from_parts(
            &self.project_id,
            &self.options.database,
            collection,
            document,
        )
    }

    fn documents_url(&self, path: &str) -> Url {
        let mut url = self.options.endpoint.clone();
        let mut full = url.path().trim_end_matches('/').to_owned();
        full.push_str("/projects/");
        full.push_str(&encode_segment(&self.project_id));
        full.push_str("/databases/");
        full.push_str(&encode_segment(&self.options.database));
        full.push_str("/documents");
        if !path.is_empty() {
            full.push('/');
            full.push_str(path);
        }
        url.set_path(&full);
        url
    }

    fn document_url(&self, collection: &str, document: &str) -> Url {
        self.documents_url(&format!(
            "{}/{}",
            encode_path(collection),
            encode_segment(document)
        ))
    }

    fn commit_url(&self) -> Url {
        let mut url = self.documents_url("");
        let path = format!("{}:commit", url.path());
        url.set_path(&path);
        url
    }
}

impl<A> DocumentStore<reqwest::Client, A> {
    /// Create a store backed by a fresh [`reqwest::Client`].
    pub fn with_reqwest(auth: A, project_id: impl Into<SmolStr>) -> Self {
        Self::new(reqwest::Client::new(), auth, project_id)
    }
}

impl<C, A> DocumentStore<C, A>
where
    C: HttpClient + Sync,
    A: Authenticator + Sync,
{
    /// Create `collection/document` with the given contents.
    ///
    /// Fails with [`StoreError::SizeLimitExceeded`] before sending when `data`
    /// holds more than [`MAX_LEAF_VALUES`] scalar values, and with
    /// [`StoreError::Api`] when the document already exists.
    #[cfg_attr(feature = "tracing", tracing::instrument(level = "debug", skip(self, data), fields(collection = %collection, document = %document)))]
    pub async fn create(
        &self,
        collection: &str,
        document: &str,
        data: &Map,
    ) -> Result<Document, StoreError> {
        let credentials = self.credentials().await?;
        let (collection, document) = resolve_path(&credentials, collection, document);
        check_size(data)?;

        let body = serde_json::to_vec(&CreateRequest {
            fields: encode_fields(data)?,
        })
        .map_err(EncodeError::from)?;
        let mut url = self.documents_url(&encode_path(&collection));
        url.query_pairs_mut().append_pair("documentId", &document);

        let response = self
            .send(self.request(Method::POST, &url, &credentials, body)?)
            .await?;
        document_from_response(response)
    }

    /// Read `collection/document`.
    #[cfg_attr(feature = "tracing", tracing::instrument(level = "debug", skip(self), fields(collection = %collection, document = %document)))]
    pub async fn read(&self, collection: &str, document: &str) -> Result<Document, StoreError> {
        let credentials = self.credentials().await?;
        let (collection, document) = resolve_path(&credentials, collection, document);
        self.read_as(&credentials, &collection, &document).await
    }

    /// Delete `collection/document`. Succeeds only on HTTP 200.
    #[cfg_attr(feature = "tracing", tracing::instrument(level = "debug", skip(self), fields(collection = %collection, document = %document)))]
    pub async fn delete(&self, collection: &str, document: &str) -> Result<(), StoreError> {
        let credentials = self.credentials().await?;
        let (collection, document) = resolve_path(&credentials, collection, document);
        let url = self.document_url(&collection, &document);
        let response = self
            .send(self.request(Method::DELETE, &url, &credentials, Vec::new())?)
            .await?;
        if response.status() == StatusCode::OK {
            Ok(())
        } else {
            Err(StoreError::from_response(
                response.status(),
                response.body(),
            ))
        }
    }

    pub(crate) async fn read_as(
        &self,
        credentials: &Credentials,
        collection: &str,
        document: &str,
    ) -> Result<Document, StoreError> {
        let url = self.document_url(collection, document);
        let response = self
            .send(self.request(Method::GET, &url, credentials, Vec::new())?)
            .await?;
        document_from_response(response)
    }

    pub(crate) async fn credentials(&self) -> Result<Credentials, StoreError> {
        self.auth
            .credentials()
            .await
            .filter(|credentials| !credentials.id_token.is_empty())
            .ok_or(StoreError::Auth(AuthError::NotAuthenticated))
    }

    pub(crate) fn request(
        &self,
        method: Method,
        url: &Url,
        credentials: &Credentials,
        body: Vec<u8>,
    ) -> Result<http::Request<Vec<u8>>, StoreError> {
        let authorization = HeaderValue::try_from(&credentials.authorization())
            .map_err(|_| AuthError::InvalidToken)?;
        let request = http::Request::builder()
            .method(method)
            .uri(url.as_str())
            .header(CONTENT_TYPE, JSON_UTF8)
            .header(AUTHORIZATION, authorization)
            .body(body)
            .map_err(TransportError::from)?;
        Ok(request)
    }

    pub(crate) async fn send(
        &self,
        request: http::Request<Vec<u8>>,
    ) -> Result<http::Response<Vec<u8>>, StoreError> {
        match tokio::time::timeout(self.options.timeout, self.client.send_http(request)).await {
            Ok(Ok(response)) => Ok(response),
            Ok(Err(e)) => Err(TransportError::Other(Box::new(e)).into()),
            Err(_) => Err(TransportError::Timeout.into()),
        }
    }
}

/// Substitute the signed-in user's id for empty names.
fn resolve_path(credentials: &Credentials, collection: &str, document: &str) -> (SmolStr, SmolStr) {
    let or_user = |name: &str| {
        if name.is_empty() {
            credentials.local_id.clone()
        } else {
            SmolStr::new(name)
        }
    };
    (or_user(collection), or_user(document))
}

fn check_size(fields: &Map) -> Result<(), StoreError> {
    let count = count_leaves(fields);
    if count > MAX_LEAF_VALUES {
        #[cfg(feature = "tracing")]
        tracing::warn!(count, limit = MAX_LEAF_VALUES, "document too large");
        return Err(StoreError::SizeLimitExceeded {
            count,
            limit: MAX_LEAF_VALUES,
        });
    }
    Ok(())
}

fn document_from_response(response: http::Response<Vec<u8>>) -> Result<Document, StoreError> {
    let status = response.status();
    if status.is_success() {
        Ok(Document::from_body(response.body())?)
    } else {
        Err(StoreError::from_response(status, response.body()))
    }
}

fn encode_segment(segment: &str) -> String {
    utf8_percent_encode(segment, SEGMENT).to_string()
}

/// Collections may be nested (`users/alice/posts`); keep their separators.
fn encode_path(path: &str) -> String {
    path.split('/')
        .map(encode_segment)
        .collect::<Vec<_>>()
        .join("/")
}
