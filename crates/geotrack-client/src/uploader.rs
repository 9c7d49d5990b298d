//! Buffers tracker output into batches and hands them to a [`BatchSink`]

use chrono::Utc;
use geotrack_core::UtcDateTime;
use geotrack_types::LocationSample;
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::api::BatchSink;
use crate::mapper::LocationDataMapper;
use crate::tracker::TrackerEvent;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryStatus {
    Success,
    Failure(String),
}

impl DeliveryStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, DeliveryStatus::Success)
    }

    pub fn display_message(&self) -> String {
        match self {
            DeliveryStatus::Success => "Sent".to_string(),
            DeliveryStatus::Failure(reason) => format!("Send failed: {}", reason),
        }
    }
}

/// Outcome of one delivery attempt
#[derive(Debug, Clone, PartialEq)]
pub struct DeliveryLogEntry {
    pub id: Uuid,
    pub recorded_at: UtcDateTime,
    /// Newest sample in the attempted batch
    pub last_sample: LocationSample,
    pub sample_count: usize,
    pub status: DeliveryStatus,
}

pub struct BatchUploader<S> {
    sink: S,
    mapper: LocationDataMapper,
    batch_size: usize,
    buffer: Vec<LocationSample>,
    log: Vec<DeliveryLogEntry>,
}

impl<S: BatchSink> BatchUploader<S> {
    /// `batch_size` below one is treated as one.
    pub fn new(sink: S, mapper: LocationDataMapper, batch_size: usize) -> Self {
        Self {
            sink,
            mapper,
            batch_size: batch_size.max(1),
            buffer: Vec::new(),
            log: Vec::new(),
        }
    }

    pub fn mapper_mut(&mut self) -> &mut LocationDataMapper {
        &mut self.mapper
    }

    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    pub fn log(&self) -> &[DeliveryLogEntry] {
        &self.log
    }

    /// Consume events until the tracker goes away, then flush what is left.
    pub async fn run(
        mut self,
        mut events: mpsc::UnboundedReceiver<TrackerEvent>,
    ) -> Vec<DeliveryLogEntry> {
        while let Some(event) = events.recv().await {
            self.handle_event(event).await;
        }
        self.flush().await;
        self.log
    }

    pub async fn handle_event(&mut self, event: TrackerEvent) {
        match event {
            TrackerEvent::LocationUpdated(fix) => {
                self.buffer.push(self.mapper.map_fix(&fix));
                if self.buffer.len() >= self.batch_size {
                    self.flush().await;
                }
            }
            TrackerEvent::AuthorizationChanged(status) => {
                info!("Location authorization is now {:?}", status);
            }
            TrackerEvent::Failed(error) => {
                warn!("Tracker reported an error: {}", error);
            }
        }
    }

    /// Send everything buffered as one batch. Failed batches are not retried.
    pub async fn flush(&mut self) -> Option<&DeliveryLogEntry> {
        let last_sample = self.buffer.last().cloned()?;
        let batch = self.mapper.batch_from_samples(std::mem::take(&mut self.buffer));
        let sample_count = batch.len();

        let status = match self.sink.send_location_batch(&batch).await {
            Ok(true) => {
                info!("Delivered {} locations", sample_count);
                DeliveryStatus::Success
            }
            Ok(false) => {
                warn!("Server refused {} locations", sample_count);
                DeliveryStatus::Failure("Server refused the batch".to_string())
            }
            Err(e) => {
                warn!("Failed to deliver {} locations: {}", sample_count, e);
                DeliveryStatus::Failure(e.to_string())
            }
        };

        self.log.push(DeliveryLogEntry {
            id: Uuid::new_v4(),
            recorded_at: Utc::now(),
            last_sample,
            sample_count,
            status,
        });
        self.log.last()
    }
}
