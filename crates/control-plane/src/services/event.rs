// Event service: validation, derived state and ownership rules for events
// Decision: Event::update() runs on every create and update before the row is written
// Decision: Update checks run in order: existence, validation, ownership

use crate::storage::{EventPageRequest, EventRow, StorageBackend};
use anyhow::Result;
use meetup_core::{Event, EventRequest, EventValidator, ValidationErrors};
use thiserror::Error;
use tracing::Instrument;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum EventServiceError {
    #[error("event not found")]
    NotFound,
    #[error("invalid event: {0}")]
    Validation(ValidationErrors),
    #[error("caller is not the event manager")]
    NotManager,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

/// One page of events plus the total count across all pages
#[derive(Debug, Clone)]
pub struct EventPage {
    pub events: Vec<Event>,
    pub total: i64,
    pub request: EventPageRequest,
}

pub struct EventService {
    db: StorageBackend,
    validator: EventValidator,
}

impl EventService {
    pub fn new(db: StorageBackend) -> Self {
        Self {
            db,
            validator: EventValidator::new(),
        }
    }

    pub async fn list(&self, request: EventPageRequest) -> Result<EventPage> {
        let (rows, total) = self.db.list_events(request).await?;
        Ok(EventPage {
            events: rows.into_iter().map(Event::from).collect(),
            total,
            request,
        })
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<Event>> {
        Ok(self.db.get_event(id).await?.map(Event::from))
    }

    /// Validate the submission and store it as a new DRAFT event managed by `manager_id`
    pub async fn create(
        &self,
        req: EventRequest,
        manager_id: Uuid,
    ) -> Result<Event, EventServiceError> {
        let span = tracing::info_span!(
            "create_event",
            manager_id = %manager_id,
            event_id = tracing::field::Empty,
        );

        async move {
            let details = self
                .validator
                .validate(&req)
                .map_err(EventServiceError::Validation)?;

            let event = Event::draft(details, manager_id);
            tracing::Span::current().record("event_id", event.id.to_string().as_str());

            let row = self.db.create_event(&EventRow::from(&event)).await?;
            tracing::info!(free = row.free, offline = row.offline, "Event created");
            Ok(Event::from(row))
        }
        .instrument(span)
        .await
    }

    /// Replace the submitted fields of an event. Only its manager may do this.
    pub async fn update(
        &self,
        id: Uuid,
        req: EventRequest,
        caller_id: Uuid,
    ) -> Result<Event, EventServiceError> {
        let span = tracing::info_span!("update_event", event_id = %id, caller_id = %caller_id);

        async move {
            let mut event = self.get(id).await?.ok_or(EventServiceError::NotFound)?;

            let details = self
                .validator
                .validate(&req)
                .map_err(EventServiceError::Validation)?;

            if !event.is_managed_by(caller_id) {
                tracing::warn!(manager_id = %event.manager.id, "Update rejected, caller is not the manager");
                return Err(EventServiceError::NotManager);
            }

            event.apply(details);

            let row = self
                .db
                .update_event(&EventRow::from(&event))
                .await?
                .ok_or(EventServiceError::NotManager)?;

            tracing::info!("Event updated");
            Ok(Event::from(row))
        }
        .instrument(span)
        .await
    }
}
