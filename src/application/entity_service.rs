// Entity service - Listing use cases behind the host's query editor
use crate::application::cancellation::run_cancellable;
use crate::application::monitoring_repository::MonitoringRepository;
use crate::domain::entity::{EntityKind, EntityRecord};
use crate::domain::error::MonitoringResult;
use crate::domain::historical::HistoricalPoint;
use crate::domain::query::TimeRange;
use crate::domain::status::ServerStatus;
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

#[derive(Clone)]
pub struct EntityService {
    repository: Arc<dyn MonitoringRepository>,
}

impl EntityService {
    pub fn new(repository: Arc<dyn MonitoringRepository>) -> Self {
        Self { repository }
    }

    pub async fn status(&self, cancel: &CancellationToken) -> MonitoringResult<ServerStatus> {
        run_cancellable(cancel, self.repository.status()).await
    }

    pub async fn groups(&self, cancel: &CancellationToken) -> MonitoringResult<Vec<EntityRecord>> {
        self.list(EntityKind::Group, cancel).await
    }

    pub async fn devices(&self, cancel: &CancellationToken) -> MonitoringResult<Vec<EntityRecord>> {
        self.list(EntityKind::Device, cancel).await
    }

    pub async fn sensors(&self, cancel: &CancellationToken) -> MonitoringResult<Vec<EntityRecord>> {
        self.list(EntityKind::Sensor, cancel).await
    }

    pub async fn list(
        &self,
        kind: EntityKind,
        cancel: &CancellationToken,
    ) -> MonitoringResult<Vec<EntityRecord>> {
        let records = run_cancellable(cancel, self.repository.entities(kind)).await?;
        tracing::debug!("Listed {} {} entries", records.len(), kind);
        Ok(records)
    }

    pub async fn historical_data(
        &self,
        object_id: &str,
        range: TimeRange,
        cancel: &CancellationToken,
    ) -> MonitoringResult<Vec<HistoricalPoint>> {
        run_cancellable(cancel, self.repository.historical_data(object_id, range)).await
    }

    /// Numeric channel names an object reports over `range`, sorted.
    pub async fn channels(
        &self,
        object_id: &str,
        range: TimeRange,
        cancel: &CancellationToken,
    ) -> MonitoringResult<Vec<String>> {
        let points = self.historical_data(object_id, range, cancel).await?;
        let names: BTreeSet<&str> = points.iter().flat_map(|p| p.numeric_channels()).collect();
        Ok(names.into_iter().map(str::to_string).collect())
    }
}
