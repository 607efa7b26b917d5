//! Database repository for the SIP credential pool.
//!
//! All mutations of the assignment fields go through [`SipConfigs::assign`]
//! and [`SipConfigs::release`], which are single conditional UPDATE statements.
//! The precondition lives in the WHERE clause, so the database decides the
//! winner of every race; callers only ever observe "row updated" or
//! [`DbError::AssignmentConflict`].

use crate::api::models::sip_configs::AssignmentStatus;
use crate::types::{ConfigId, UserId, abbrev_uuid};
use crate::db::{
    errors::{DbError, Result},
    handlers::repository::Repository,
    models::sip_configs::{AssignmentHolder, SipConfigCreateDBRequest, SipConfigDBResponse, SipConfigUpdateDBRequest},
};
use sqlx::PgConnection;
use tracing::instrument;

/// Filter for listing SIP configs
#[derive(Debug, Clone)]
pub struct SipConfigFilter {
    pub skip: i64,
    pub limit: i64,
    pub status: Option<AssignmentStatus>,
}

impl SipConfigFilter {
    pub fn new(skip: i64, limit: i64) -> Self {
        Self {
            skip,
            limit,
            status: None,
        }
    }

    pub fn with_status(mut self, status: AssignmentStatus) -> Self {
        self.status = Some(status);
        self
    }
}

pub struct SipConfigs<'c> {
    db: &'c mut PgConnection,
}

#[async_trait::async_trait]
impl<'c> Repository for SipConfigs<'c> {
    type CreateRequest = SipConfigCreateDBRequest;
    type UpdateRequest = SipConfigUpdateDBRequest;
    type Response = SipConfigDBResponse;
    type Id = ConfigId;
    type Filter = SipConfigFilter;

    #[instrument(skip(self, request), fields(username = %request.username, domain = %request.domain), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let record = sqlx::query_as::<_, SipConfigDBResponse>(
            r#"
            INSERT INTO sip_configs (username, password, domain, server, port, transport)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(&request.username)
        .bind(&request.password)
        .bind(&request.domain)
        .bind(&request.server)
        .bind(request.port)
        .bind(request.transport)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(record)
    }

    #[instrument(skip(self), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let record = sqlx::query_as::<_, SipConfigDBResponse>("SELECT * FROM sip_configs WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(record)
    }

    #[instrument(skip(self, filter), fields(limit = filter.limit, skip = filter.skip), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        // Ascending id keeps pagination stable while records churn through
        // assign/release cycles.
        let query = match filter.status {
            Some(AssignmentStatus::Available) => {
                "SELECT * FROM sip_configs WHERE assigned_user_id IS NULL ORDER BY id ASC LIMIT $1 OFFSET $2"
            }
            Some(AssignmentStatus::Assigned) => {
                "SELECT * FROM sip_configs WHERE assigned_user_id IS NOT NULL ORDER BY id ASC LIMIT $1 OFFSET $2"
            }
            None => "SELECT * FROM sip_configs ORDER BY id ASC LIMIT $1 OFFSET $2",
        };

        let records = sqlx::query_as::<_, SipConfigDBResponse>(query)
            .bind(filter.limit)
            .bind(filter.skip)
            .fetch_all(&mut *self.db)
            .await?;

        Ok(records)
    }

    #[instrument(skip(self), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        // Deleting a held line would strand its holder; only unassigned
        // records can be retired.
        let result = sqlx::query("DELETE FROM sip_configs WHERE id = $1 AND assigned_user_id IS NULL")
            .bind(id)
            .execute(&mut *self.db)
            .await?;

        if result.rows_affected() > 0 {
            return Ok(true);
        }

        if self.exists(id).await? {
            Err(DbError::AssignmentConflict { id })
        } else {
            Ok(false)
        }
    }

    #[instrument(skip(self, request), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        // Admin correction of the SIP account fields; never concurrent with an
        // assignment, so the same unassigned precondition applies.
        let record = sqlx::query_as::<_, SipConfigDBResponse>(
            r#"
            UPDATE sip_configs SET
                username = COALESCE($2, username),
                password = COALESCE($3, password),
                domain = COALESCE($4, domain),
                server = COALESCE($5, server),
                port = COALESCE($6, port),
                transport = COALESCE($7, transport),
                updated_at = NOW()
            WHERE id = $1 AND assigned_user_id IS NULL
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&request.username)
        .bind(&request.password)
        .bind(&request.domain)
        .bind(&request.server)
        .bind(request.port)
        .bind(request.transport)
        .fetch_optional(&mut *self.db)
        .await?;

        match record {
            Some(record) => Ok(record),
            None => {
                if self.exists(id).await? {
                    Err(DbError::AssignmentConflict { id })
                } else {
                    Err(DbError::NotFound)
                }
            }
        }
    }
}

impl<'c> SipConfigs<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    async fn exists(&mut self, id: ConfigId) -> Result<bool> {
        let exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM sip_configs WHERE id = $1)")
            .bind(id)
            .fetch_one(&mut *self.db)
            .await?;
        Ok(exists)
    }

    /// Available candidates for the assignment loop, lowest id first
    #[instrument(skip(self), err)]
    pub async fn list_available(&mut self, limit: i64) -> Result<Vec<SipConfigDBResponse>> {
        let records = sqlx::query_as::<_, SipConfigDBResponse>(
            "SELECT * FROM sip_configs WHERE assigned_user_id IS NULL ORDER BY id ASC LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(records)
    }

    /// Atomically assign a record to a holder.
    ///
    /// Compare-and-swap semantics: succeeds only if the record is currently
    /// unassigned. A record that exists but was taken concurrently yields
    /// [`DbError::AssignmentConflict`].
    #[instrument(skip(self, holder), fields(user_id = %abbrev_uuid(&holder.user_id)), err)]
    pub async fn assign(&mut self, id: ConfigId, holder: &AssignmentHolder) -> Result<SipConfigDBResponse> {
        let record = sqlx::query_as::<_, SipConfigDBResponse>(
            r#"
            UPDATE sip_configs SET
                assigned_user_id = $2,
                assigned_username = $3,
                assigned_email = $4,
                assigned_at = NOW(),
                updated_at = NOW()
            WHERE id = $1 AND assigned_user_id IS NULL
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(holder.user_id)
        .bind(&holder.username)
        .bind(&holder.email)
        .fetch_optional(&mut *self.db)
        .await?;

        match record {
            Some(record) => Ok(record),
            None => {
                if self.exists(id).await? {
                    Err(DbError::AssignmentConflict { id })
                } else {
                    Err(DbError::NotFound)
                }
            }
        }
    }

    /// Atomically release a record back to the pool.
    ///
    /// With `expected_user` set this is the self-service path: the update only
    /// applies while that user still holds the record. With `None` it is the
    /// admin force-release, which clears any holder (and is a no-op success on
    /// an already-available record).
    #[instrument(skip(self), err)]
    pub async fn release(&mut self, id: ConfigId, expected_user: Option<UserId>) -> Result<SipConfigDBResponse> {
        let record = match expected_user {
            Some(user_id) => {
                sqlx::query_as::<_, SipConfigDBResponse>(
                    r#"
                    UPDATE sip_configs SET
                        assigned_user_id = NULL,
                        assigned_username = NULL,
                        assigned_email = NULL,
                        assigned_at = NULL,
                        updated_at = NOW()
                    WHERE id = $1 AND assigned_user_id = $2
                    RETURNING *
                    "#,
                )
                .bind(id)
                .bind(user_id)
                .fetch_optional(&mut *self.db)
                .await?
            }
            None => {
                sqlx::query_as::<_, SipConfigDBResponse>(
                    r#"
                    UPDATE sip_configs SET
                        assigned_user_id = NULL,
                        assigned_username = NULL,
                        assigned_email = NULL,
                        assigned_at = NULL,
                        updated_at = NOW()
                    WHERE id = $1
                    RETURNING *
                    "#,
                )
                .bind(id)
                .fetch_optional(&mut *self.db)
                .await?
            }
        };

        match record {
            Some(record) => Ok(record),
            None => {
                if self.exists(id).await? {
                    // Record exists but the expected holder does not match
                    Err(DbError::AssignmentConflict { id })
                } else {
                    Err(DbError::NotFound)
                }
            }
        }
    }

    /// The record currently held by a user, if any.
    ///
    /// At most one row matches under normal assignment flow; lowest id wins
    /// if manual intervention ever broke that.
    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&user_id)), err)]
    pub async fn find_by_user(&mut self, user_id: UserId) -> Result<Option<SipConfigDBResponse>> {
        let record = sqlx::query_as::<_, SipConfigDBResponse>(
            "SELECT * FROM sip_configs WHERE assigned_user_id = $1 ORDER BY id ASC LIMIT 1",
        )
        .bind(user_id)
        .fetch_optional(&mut *self.db)
        .await?;

        Ok(record)
    }

    /// Total and available record counts, from one aggregate over current rows
    #[instrument(skip(self), err)]
    pub async fn counts(&mut self) -> Result<(i64, i64)> {
        let (total, available) = sqlx::query_as::<_, (i64, i64)>(
            "SELECT COUNT(*), COUNT(*) FILTER (WHERE assigned_user_id IS NULL) FROM sip_configs",
        )
        .fetch_one(&mut *self.db)
        .await?;

        Ok((total, available))
    }
}
