//! Optimistic read-merge-commit updates.
//!
//! Each attempt reads the current document, merges the overlays into it and
//! commits the result on the condition that the document is still at the
//! version that was read. When another writer got there first the commit is
//! refused and the attempt starts over from a fresh read, after the backoff
//! wait prescribed by [`RetryPolicy`](super::RetryPolicy).

use fireside_common::error::{EncodeError, parse_api_error};
use fireside_common::http_client::HttpClient;
use fireside_common::merge::{apply_delete, apply_replace};
use fireside_common::{DeleteTree, Map, ReplaceTree, Timestamp, encode_fields};
use http::{Method, StatusCode};

use super::response::{CommitRequest, committed_version};
use super::{Document, DocumentStore, StoreError, check_size, resolve_path};
use crate::credentials::{Authenticator, Credentials};

/// Result of one conditional commit.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum CommitOutcome {
    /// Written; carries the new version token.
    Committed(Timestamp),
    /// The document changed since it was read.
    Conflict,
}

impl<C, A> DocumentStore<C, A>
where
    C: HttpClient + Sync,
    A: Authenticator + Sync,
{
    /// Apply `replace` then `delete` to `collection/document` atomically with
    /// respect to other writers.
    ///
    /// Returns the merged document as committed, with the version token the
    /// service assigned. See [`update_with`](Self::update_with) for the
    /// failure modes.
    pub async fn update(
        &self,
        collection: &str,
        document: &str,
        replace: &ReplaceTree,
        delete: &DeleteTree,
    ) -> Result<Document, StoreError> {
        self.update_with(collection, document, replace, delete, |_| {})
            .await
    }

    /// Like [`update`](Self::update), running `validate` over the merged
    /// fields before they are size checked and committed.
    ///
    /// `validate` runs once per attempt, each time on a freshly read and
    /// merged copy, so it must not depend on having run before.
    ///
    /// Fails with
    /// - the read error, if the document cannot be read (not retried);
    /// - [`StoreError::SizeLimitExceeded`] if the merged document is too large;
    /// - [`StoreError::UpdateTimedOut`] once the retry schedule is exhausted;
    /// - any other commit error as returned by the service.
    #[cfg_attr(feature = "tracing", tracing::instrument(level = "debug", skip(self, replace, delete, validate), fields(collection = %collection, document = %document)))]
    pub async fn update_with<F>(
        &self,
        collection: &str,
        document: &str,
        replace: &ReplaceTree,
        delete: &DeleteTree,
        mut validate: F,
    ) -> Result<Document, StoreError>
    where
        F: FnMut(&mut Map),
    {
        let credentials = self.credentials().await?;
        let (collection, document) = resolve_path(&credentials, collection, document);
        let name = self.reference(&collection, &document);

        let mut attempt = 0u32;
        loop {
            attempt += 1;
            let Some(wait) = self.options.retry.backoff_for(attempt) else {
                #[cfg(feature = "tracing")]
                tracing::warn!(attempts = attempt - 1, "update gave up under contention");
                return Err(StoreError::UpdateTimedOut {
                    collection,
                    document,
                    attempts: attempt - 1,
                });
            };
            if !wait.is_zero() {
                #[cfg(feature = "tracing")]
                tracing::debug!(attempt, wait_ms = wait.as_millis() as u64, "backing off");
                tokio::time::sleep(wait).await;
            }

            let current = self.read_as(&credentials, &collection, &document).await?;
            let mut fields = current.fields;
            apply_replace(&mut fields, replace);
            apply_delete(&mut fields, delete);
            validate(&mut fields);
            check_size(&fields)?;

            match self
                .commit(&credentials, name.as_str(), &fields, &current.update_time)
                .await?
            {
                CommitOutcome::Committed(version) => {
                    return Ok(Document {
                        name: name.as_str().into(),
                        fields,
                        create_time: current.create_time,
                        update_time: version,
                    });
                }
                CommitOutcome::Conflict => {
                    #[cfg(feature = "tracing")]
                    tracing::debug!(attempt, base = %current.update_time, "commit precondition failed");
                }
            }
        }
    }

    async fn commit(
        &self,
        credentials: &Credentials,
        name: &str,
        fields: &Map,
        base_version: &Timestamp,
    ) -> Result<CommitOutcome, StoreError> {
        let request = CommitRequest::new(name, encode_fields(fields)?, base_version);
        let body = serde_json::to_vec(&request).map_err(EncodeError::from)?;
        let url = self.commit_url();
        let response = self
            .send(self.request(Method::POST, &url, credentials, body)?)
            .await?;

        let status = response.status();
        let body = response.into_body();
        if status.is_success() {
            return Ok(CommitOutcome::Committed(committed_version(&body)?));
        }
        if status == StatusCode::BAD_REQUEST
            && parse_api_error(&body).is_some_and(|error| error.is_failed_precondition())
        {
            return Ok(CommitOutcome::Conflict);
        }
        Err(StoreError::from_response(status, &body))
    }
}
