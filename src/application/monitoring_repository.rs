// Repository trait for monitoring server access
use crate::domain::entity::{EntityKind, EntityRecord};
use crate::domain::error::MonitoringResult;
use crate::domain::historical::HistoricalPoint;
use crate::domain::query::TimeRange;
use crate::domain::status::ServerStatus;
use async_trait::async_trait;

#[async_trait]
pub trait MonitoringRepository: Send + Sync {
    /// Server version and health summary
    async fn status(&self) -> MonitoringResult<ServerStatus>;

    /// Full listing of one entity kind, bounded by the configured row ceiling
    async fn entities(&self, kind: EntityKind) -> MonitoringResult<Vec<EntityRecord>>;

    /// Historic rows for one object. An empty result is an error.
    async fn historical_data(
        &self,
        object_id: &str,
        range: TimeRange,
    ) -> MonitoringResult<Vec<HistoricalPoint>>;
}
