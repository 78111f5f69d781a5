//! Form-to-endpoint create flow.
//!
//! A submit validates the draft locally, posts the normalized payload to
//! `/api/<collection>` and waits for the server. Only a successful response
//! invalidates the entity's list query and redirects to the list route;
//! nothing is applied to the cache optimistically.

use std::sync::atomic::{AtomicBool, Ordering};

use serde_json::Value;
use tracing::{info, warn};

use crate::api_client::{ApiError, ApiResult, CrmApi};
use crate::error::ValidationError;
use crate::models::{Entity, Record};
use crate::query_cache::QueryCache;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Error,
}

/// Toast-style notification shown after a submit resolves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub title: String,
    pub description: String,
}

impl Notice {
    fn created(label: &str) -> Self {
        Self {
            kind: NoticeKind::Success,
            title: format!("{label} created"),
            description: format!(
                "The {} has been created successfully.",
                label.to_lowercase()
            ),
        }
    }

    fn failed(label: &str) -> Self {
        Self {
            kind: NoticeKind::Error,
            title: "Error".to_string(),
            description: format!(
                "Failed to create {}. Please try again.",
                label.to_lowercase()
            ),
        }
    }
}

pub enum Submission<T: Entity> {
    /// Local validation failed; nothing was sent.
    Invalid {
        draft: T::Draft,
        errors: ValidationError,
    },
    Created {
        record: Record<T>,
        redirect: String,
        notice: Notice,
    },
    /// The server call failed; the user stays on the form.
    Failed {
        draft: T::Draft,
        error: ApiError,
        notice: Notice,
    },
}

impl<T: Entity> Submission<T> {
    pub fn notice(&self) -> Option<&Notice> {
        match self {
            Submission::Invalid { .. } => None,
            Submission::Created { notice, .. } | Submission::Failed { notice, .. } => Some(notice),
        }
    }

    pub fn is_created(&self) -> bool {
        matches!(self, Submission::Created { .. })
    }
}

/// UI route of an entity's list page.
pub fn list_route<T: Entity>() -> String {
    format!("/{}", T::COLLECTION)
}

pub struct CreateFlow<A> {
    api: A,
    cache: QueryCache,
    pending: AtomicBool,
}

struct PendingGuard<'a>(&'a AtomicBool);

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl<A: CrmApi> CreateFlow<A> {
    pub fn new(api: A, cache: QueryCache) -> Self {
        Self {
            api,
            cache,
            pending: AtomicBool::new(false),
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    /// True while a submit is waiting on the server.
    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::SeqCst)
    }

    pub async fn submit<T: Entity>(&self, draft: T::Draft) -> Submission<T> {
        let data = match T::validate(&draft) {
            Ok(data) => data,
            Err(errors) => {
                warn!(entity = T::LABEL, %errors, "draft rejected before submit");
                return Submission::Invalid { draft, errors };
            }
        };

        let result = {
            self.pending.store(true, Ordering::SeqCst);
            let _pending = PendingGuard(&self.pending);
            self.post::<T>(&data).await
        };

        match result {
            Ok(record) => {
                info!(entity = T::LABEL, id = %record.id, "created");
                Submission::Created {
                    record,
                    redirect: list_route::<T>(),
                    notice: Notice::created(T::LABEL),
                }
            }
            Err(error) => {
                warn!(entity = T::LABEL, %error, "create failed");
                Submission::Failed {
                    draft,
                    error,
                    notice: Notice::failed(T::LABEL),
                }
            }
        }
    }

    async fn post<T: Entity>(&self, data: &T) -> ApiResult<Record<T>> {
        let body = serde_json::to_value(data)?;
        let created = self.api.post_json(&format!("/api/{}", T::COLLECTION), &body).await?;
        let record = serde_json::from_value(created)?;
        self.cache.invalidate(&T::list_key());
        Ok(record)
    }

    /// The entity's list, served from the cache while it is fresh.
    pub async fn list<T: Entity>(&self) -> ApiResult<Value> {
        let key = T::list_key();
        self.cache.fetch(&key, || self.api.get_json(&key)).await
    }
}
