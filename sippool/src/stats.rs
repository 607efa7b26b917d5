//! Pool utilization statistics.
//!
//! Stats are always derived from the current record rows in one aggregate
//! query; there is no separately maintained counter that could drift from the
//! pool's actual state.

use crate::db::handlers::SipConfigs;
use crate::errors::{Error, Result};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::instrument;
use utoipa::ToSchema;

/// Snapshot of pool utilization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PoolStats {
    pub total: i64,
    pub available: i64,
    pub assigned: i64,
    /// Rounded share of assigned records, 0 for an empty pool
    pub percentage_used: i64,
}

impl PoolStats {
    pub fn from_counts(total: i64, available: i64) -> Self {
        let assigned = total - available;
        let percentage_used = if total == 0 {
            0
        } else {
            (assigned as f64 / total as f64 * 100.0).round() as i64
        };
        Self {
            total,
            available,
            assigned,
            percentage_used,
        }
    }
}

/// Compute current pool statistics
#[instrument(skip_all, err)]
pub async fn pool_stats(db: &PgPool) -> Result<PoolStats> {
    let mut conn = db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = SipConfigs::new(&mut conn);
    let (total, available) = repo.counts().await?;
    Ok(PoolStats::from_counts(total, available))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_pool_has_zero_percentage() {
        let stats = PoolStats::from_counts(0, 0);
        assert_eq!(stats.percentage_used, 0);
        assert_eq!(stats.assigned, 0);
    }

    #[test]
    fn test_counts_always_balance() {
        for (total, available) in [(3, 1), (10, 10), (7, 0)] {
            let stats = PoolStats::from_counts(total, available);
            assert_eq!(stats.available + stats.assigned, stats.total);
        }
    }

    #[test]
    fn test_percentage_rounds_to_nearest() {
        // 2 of 3 assigned -> 66.67 -> 67
        assert_eq!(PoolStats::from_counts(3, 1).percentage_used, 67);
        // 1 of 3 assigned -> 33.33 -> 33
        assert_eq!(PoolStats::from_counts(3, 2).percentage_used, 33);
        assert_eq!(PoolStats::from_counts(10, 0).percentage_used, 100);
        assert_eq!(PoolStats::from_counts(10, 10).percentage_used, 0);
    }
}
