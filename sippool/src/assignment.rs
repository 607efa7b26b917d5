//! The assignment service: turns "a user needs a SIP line" into a race-free
//! credential handout.
//!
//! Assignment uses optimistic concurrency: candidates are read fresh from the
//! store, then claimed with a conditional update. Losing the race on one
//! candidate moves on to the next, bounded by `min(max_retries, available)`.
//! Pool sizes are small and contention is rare, so retrying beats a global
//! lock while staying correct under concurrent requests.

use crate::api::models::assignments::AssignRequest;
use crate::config::AssignmentConfig;
use crate::db::{
    errors::DbError,
    handlers::{Repository, SipConfigs},
    models::sip_configs::{AssignmentHolder, SipConfigDBResponse},
};
use crate::errors::{Error, Result};
use crate::types::{ConfigId, UserId, abbrev_uuid};
use sqlx::PgPool;
use tracing::{debug, info, instrument};

/// Stateless assignment engine; all pool state lives in the database.
#[derive(Debug, Clone, Copy)]
pub struct Assigner {
    max_retries: i64,
}

impl Assigner {
    pub fn new(config: &AssignmentConfig) -> Self {
        Self {
            max_retries: config.max_retries,
        }
    }

    /// Assign the first available record (lowest id) to the requesting user.
    ///
    /// Re-assignment by a user who already holds a line returns that line
    /// unchanged, which is what keeps a single user from ever holding two
    /// records. Exhausting all candidates, or losing the race on every one of
    /// them, fails with [`Error::PoolExhausted`].
    #[instrument(skip_all, fields(user_id = %abbrev_uuid(&request.user_id)), err)]
    pub async fn assign_next(&self, db: &PgPool, request: AssignRequest) -> Result<SipConfigDBResponse> {
        let mut conn = db.acquire().await.map_err(|e| Error::Database(e.into()))?;
        let mut repo = SipConfigs::new(&mut conn);

        if let Some(held) = repo.find_by_user(request.user_id).await? {
            debug!(config_id = held.id, "user already holds a line");
            return Ok(held);
        }

        let (_, available) = repo.counts().await?;
        if available == 0 {
            return Err(Error::PoolExhausted);
        }

        // Bounded candidate walk, not recursion: each iteration reads state
        // the database confirmed at candidate-query time and re-checks it in
        // the conditional update.
        let budget = self.max_retries.min(available);
        let candidates = repo.list_available(budget).await?;
        let holder = AssignmentHolder::from(request);

        for candidate in candidates {
            match repo.assign(candidate.id, &holder).await {
                Ok(record) => {
                    info!(config_id = record.id, "assigned SIP line");
                    return Ok(record);
                }
                Err(DbError::AssignmentConflict { id }) => {
                    debug!(config_id = id, "candidate taken concurrently, trying next");
                    continue;
                }
                // Deleted between candidate query and claim; skip it
                Err(DbError::NotFound) => continue,
                Err(e) => return Err(e.into()),
            }
        }

        Err(Error::PoolExhausted)
    }

    /// Admin-directed assignment of a specific record.
    ///
    /// Same conditional-update discipline as [`assign_next`](Self::assign_next):
    /// already held by the same user is an idempotent success, held by anyone
    /// else is a conflict and leaves the pool untouched.
    #[instrument(skip_all, fields(config_id = id, user_id = %abbrev_uuid(&request.user_id)), err)]
    pub async fn assign_specific(&self, db: &PgPool, id: ConfigId, request: AssignRequest) -> Result<SipConfigDBResponse> {
        let mut conn = db.acquire().await.map_err(|e| Error::Database(e.into()))?;
        let mut repo = SipConfigs::new(&mut conn);

        let user_id = request.user_id;
        let holder = AssignmentHolder::from(request);

        match repo.assign(id, &holder).await {
            Ok(record) => {
                info!("assigned SIP line");
                Ok(record)
            }
            Err(DbError::AssignmentConflict { .. }) => {
                let current = repo.get_by_id(id).await?.ok_or_else(|| Error::NotFound {
                    resource: "SIP config".to_string(),
                    id: id.to_string(),
                })?;
                if current.assigned_user_id == Some(user_id) {
                    debug!("record already held by this user");
                    Ok(current)
                } else {
                    Err(Error::Conflict {
                        message: format!("SIP config {id} is already assigned to another user"),
                    })
                }
            }
            Err(DbError::NotFound) => Err(Error::NotFound {
                resource: "SIP config".to_string(),
                id: id.to_string(),
            }),
            Err(e) => Err(e.into()),
        }
    }

    /// Release a record back to the pool.
    ///
    /// `requesting_user` selects the owner-checked self-service path; `None`
    /// is the admin force-release.
    #[instrument(skip_all, fields(config_id = id), err)]
    pub async fn release(&self, db: &PgPool, id: ConfigId, requesting_user: Option<UserId>) -> Result<SipConfigDBResponse> {
        let mut conn = db.acquire().await.map_err(|e| Error::Database(e.into()))?;
        let mut repo = SipConfigs::new(&mut conn);

        match repo.release(id, requesting_user).await {
            Ok(record) => {
                info!("released SIP line");
                Ok(record)
            }
            Err(DbError::NotFound) => Err(Error::NotFound {
                resource: "SIP config".to_string(),
                id: id.to_string(),
            }),
            Err(DbError::AssignmentConflict { .. }) => Err(Error::Conflict {
                message: format!("SIP config {id} is not held by the requesting user"),
            }),
            Err(e) => Err(e.into()),
        }
    }

    /// Release whatever the user holds; used on logout and deactivation.
    ///
    /// Idempotent: a user holding nothing is a successful no-op, and losing
    /// the release race to a concurrent caller still converges on the same
    /// end state.
    #[instrument(skip_all, fields(user_id = %abbrev_uuid(&user_id)), err)]
    pub async fn release_for_user(&self, db: &PgPool, user_id: UserId) -> Result<Option<SipConfigDBResponse>> {
        let mut conn = db.acquire().await.map_err(|e| Error::Database(e.into()))?;
        let mut repo = SipConfigs::new(&mut conn);

        let Some(held) = repo.find_by_user(user_id).await? else {
            debug!("user holds no line, nothing to release");
            return Ok(None);
        };

        match repo.release(held.id, Some(user_id)).await {
            Ok(record) => {
                info!(config_id = record.id, "released SIP line");
                Ok(Some(record))
            }
            // The hold disappeared between lookup and release; same end state
            Err(DbError::NotFound) | Err(DbError::AssignmentConflict { .. }) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// The record currently held by a user, if any.
    ///
    /// This is the recovery path after an indeterminate outcome (e.g. a
    /// timed-out assign): callers re-query their state instead of guessing.
    #[instrument(skip_all, fields(user_id = %abbrev_uuid(&user_id)), err)]
    pub async fn current_assignment(&self, db: &PgPool, user_id: UserId) -> Result<Option<SipConfigDBResponse>> {
        let mut conn = db.acquire().await.map_err(|e| Error::Database(e.into()))?;
        let mut repo = SipConfigs::new(&mut conn);
        Ok(repo.find_by_user(user_id).await?)
    }

    /// Peek at the first available record without reserving it.
    ///
    /// Purely informational: two callers may see the same record here. A
    /// caller that needs a hold must go through [`assign_next`](Self::assign_next),
    /// never pre-select an id from this read.
    #[instrument(skip_all, err)]
    pub async fn peek_available(&self, db: &PgPool) -> Result<Option<SipConfigDBResponse>> {
        let mut conn = db.acquire().await.map_err(|e| Error::Database(e.into()))?;
        let mut repo = SipConfigs::new(&mut conn);
        Ok(repo.list_available(1).await?.pop())
    }
}
