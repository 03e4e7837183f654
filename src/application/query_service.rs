// Query service - Routes a host query to the matching normalization path
use crate::application::cancellation::run_cancellable;
use crate::application::monitoring_repository::MonitoringRepository;
use crate::application::property_resolver::{PropertyResolver, PropertyTarget};
use crate::domain::datetime::{parse_vendor_datetime, row_datetime};
use crate::domain::entity::EntityKind;
use crate::domain::error::{MonitoringError, MonitoringResult};
use crate::domain::frame::{build_frame, FrameValues, ResponseFrame};
use crate::domain::historical::HistoricalPoint;
use crate::domain::query::{QueryDescriptor, QueryKind};
use crate::infrastructure::config::MissingValuePolicy;
use chrono::{DateTime, FixedOffset, Utc};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

#[derive(Debug, Clone, Copy)]
pub struct QueryOptions {
    pub missing_values: MissingValuePolicy,
    pub server_offset: FixedOffset,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedSeries {
    pub times: Vec<DateTime<Utc>>,
    pub values: Vec<f64>,
}

/// Extract one channel from historic rows.
///
/// Rows whose channel is absent or not numeric follow `policy`. A row whose
/// datetime text is empty falls back to its OLE `datetime_raw`; a row with no
/// usable timestamp fails the whole series.
pub fn normalize_series(
    points: &[HistoricalPoint],
    channel: &str,
    policy: MissingValuePolicy,
    server_offset: FixedOffset,
) -> MonitoringResult<NormalizedSeries> {
    let mut series = NormalizedSeries {
        times: Vec::with_capacity(points.len()),
        values: Vec::with_capacity(points.len()),
    };
    let mut unusable = 0usize;

    for point in points {
        let time = match row_datetime(&point.datetime, point.datetime_raw, server_offset)? {
            Some(time) => time,
            None => parse_vendor_datetime(&point.datetime, server_offset)?,
        };
        let value = point.channel(channel).and_then(|raw| raw.as_f64());
        match (value, policy) {
            (Some(value), _) => {
                series.times.push(time);
                series.values.push(value);
            }
            (None, MissingValuePolicy::Zero) => {
                unusable += 1;
                series.times.push(time);
                series.values.push(0.0);
            }
            (None, MissingValuePolicy::Skip) => unusable += 1,
        }
    }

    if unusable > 0 {
        tracing::warn!(
            "Channel '{}' missing or non-numeric in {} of {} rows ({:?})",
            channel,
            unusable,
            points.len(),
            policy
        );
    }
    Ok(series)
}

#[derive(Clone)]
pub struct QueryService {
    repository: Arc<dyn MonitoringRepository>,
    resolver: PropertyResolver,
    options: QueryOptions,
}

impl QueryService {
    pub fn new(repository: Arc<dyn MonitoringRepository>, options: QueryOptions) -> Self {
        let resolver = PropertyResolver::new(repository.clone(), options.server_offset);
        Self {
            repository,
            resolver,
            options,
        }
    }

    /// Run one visualization query. Either a complete frame or an error.
    pub async fn query(
        &self,
        descriptor: &QueryDescriptor,
        cancel: &CancellationToken,
    ) -> MonitoringResult<ResponseFrame> {
        let span = tracing::info_span!(
            "query",
            ref_id = %descriptor.ref_id,
            query_type = %descriptor.query_type
        );
        let result = run_cancellable(cancel, self.dispatch(descriptor))
            .instrument(span.clone())
            .await;

        span.in_scope(|| match &result {
            Ok(frame) => tracing::debug!("Query produced {} rows", frame.len()),
            Err(err) => tracing::debug!("Query failed: {}", err),
        });
        result
    }

    async fn dispatch(&self, descriptor: &QueryDescriptor) -> MonitoringResult<ResponseFrame> {
        match descriptor.kind()? {
            QueryKind::Metric => self.metric_query(descriptor).await,
            kind => self.property_query(descriptor, kind).await,
        }
    }

    async fn metric_query(&self, descriptor: &QueryDescriptor) -> MonitoringResult<ResponseFrame> {
        if descriptor.object_id.trim().is_empty() {
            return Err(MonitoringError::validation("missing objid parameter"));
        }
        let channel = descriptor.channel.trim();
        if channel.is_empty() {
            return Err(MonitoringError::validation("missing channel parameter"));
        }

        tracing::info!(
            "Fetching historical data for object {} channel '{}'",
            descriptor.object_id,
            channel
        );
        let points = self
            .repository
            .historical_data(&descriptor.object_id, descriptor.time_range)
            .await?;
        let series = normalize_series(
            &points,
            channel,
            self.options.missing_values,
            self.options.server_offset,
        )?;

        let mut label = descriptor.included_names();
        label.push(channel);
        build_frame(series.times, FrameValues::Number(series.values), &label).map_err(|err| match err {
            MonitoringError::EmptyResult { .. } => MonitoringError::empty(format!(
                "channel '{}' of object {}",
                channel, descriptor.object_id
            )),
            other => other,
        })
    }

    async fn property_query(
        &self,
        descriptor: &QueryDescriptor,
        kind: QueryKind,
    ) -> MonitoringResult<ResponseFrame> {
        if descriptor.property.trim().is_empty() {
            return Err(MonitoringError::validation("missing property parameter"));
        }
        if descriptor.filter_property.trim().is_empty() {
            return Err(MonitoringError::validation("missing filterProperty parameter"));
        }

        let entity_kind = EntityKind::parse(&descriptor.property)?;
        let filter_property = descriptor.effective_filter_property(kind);
        let name = match entity_kind {
            EntityKind::Group => descriptor.group.as_str(),
            EntityKind::Device => descriptor.device.as_str(),
            EntityKind::Sensor => descriptor.sensor.as_str(),
        };
        let target = PropertyTarget {
            kind: entity_kind,
            name,
            group: descriptor.group.as_str(),
            device: descriptor.device.as_str(),
        };

        let observation = self
            .resolver
            .resolve(&target, &filter_property, descriptor.time_range.to)
            .await?;

        let mut label = descriptor.included_names();
        label.push(&filter_property);
        build_frame(
            vec![observation.timestamp],
            FrameValues::from_cells(vec![observation.value]),
            &label,
        )
    }
}
