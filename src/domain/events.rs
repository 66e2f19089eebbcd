//! Domain events and the in-process dispatcher that fans them out to
//! registered handlers.

use std::collections::HashMap;
use std::fmt;

use bigdecimal::BigDecimal;
use serde::Serialize;
use uuid::Uuid;

use super::sale::Sale;
use super::user::User;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event_type", content = "data")]
pub enum DomainEvent {
    SaleCreated(SaleSnapshot),
    SaleModified(SaleSnapshot),
    SaleCancelled(SaleSnapshot),
    SaleItemCancelled { sale_id: Uuid, product_id: Uuid },
    UserRegistered { user_id: Uuid, username: String },
    UserUpdated { user_id: Uuid, username: String },
    UserDeleted { user_id: Uuid },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SaleSnapshot {
    pub sale_id: Uuid,
    pub number: i64,
    pub customer_id: Uuid,
    pub branch_id: Uuid,
    pub total_amount: BigDecimal,
    pub is_cancelled: bool,
}

impl From<&Sale> for SaleSnapshot {
    fn from(sale: &Sale) -> Self {
        Self {
            sale_id: sale.id,
            number: sale.number,
            customer_id: sale.customer_id,
            branch_id: sale.branch_id,
            total_amount: sale.total_amount.clone(),
            is_cancelled: sale.is_cancelled,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    SaleCreated,
    SaleModified,
    SaleCancelled,
    SaleItemCancelled,
    UserRegistered,
    UserUpdated,
    UserDeleted,
}

impl EventKind {
    pub const ALL: [EventKind; 7] = [
        EventKind::SaleCreated,
        EventKind::SaleModified,
        EventKind::SaleCancelled,
        EventKind::SaleItemCancelled,
        EventKind::UserRegistered,
        EventKind::UserUpdated,
        EventKind::UserDeleted,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::SaleCreated => "SaleCreated",
            EventKind::SaleModified => "SaleModified",
            EventKind::SaleCancelled => "SaleCancelled",
            EventKind::SaleItemCancelled => "SaleItemCancelled",
            EventKind::UserRegistered => "UserRegistered",
            EventKind::UserUpdated => "UserUpdated",
            EventKind::UserDeleted => "UserDeleted",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl DomainEvent {
    pub fn sale_created(sale: &Sale) -> Self {
        DomainEvent::SaleCreated(sale.into())
    }

    pub fn sale_modified(sale: &Sale) -> Self {
        DomainEvent::SaleModified(sale.into())
    }

    pub fn sale_cancelled(sale: &Sale) -> Self {
        DomainEvent::SaleCancelled(sale.into())
    }

    pub fn user_registered(user: &User) -> Self {
        DomainEvent::UserRegistered {
            user_id: user.id,
            username: user.username.clone(),
        }
    }

    pub fn user_updated(user: &User) -> Self {
        DomainEvent::UserUpdated {
            user_id: user.id,
            username: user.username.clone(),
        }
    }

    pub fn kind(&self) -> EventKind {
        match self {
            DomainEvent::SaleCreated(_) => EventKind::SaleCreated,
            DomainEvent::SaleModified(_) => EventKind::SaleModified,
            DomainEvent::SaleCancelled(_) => EventKind::SaleCancelled,
            DomainEvent::SaleItemCancelled { .. } => EventKind::SaleItemCancelled,
            DomainEvent::UserRegistered { .. } => EventKind::UserRegistered,
            DomainEvent::UserUpdated { .. } => EventKind::UserUpdated,
            DomainEvent::UserDeleted { .. } => EventKind::UserDeleted,
        }
    }

    /// Id of the entity the event is about.
    pub fn aggregate_id(&self) -> Uuid {
        match self {
            DomainEvent::SaleCreated(s) | DomainEvent::SaleModified(s) | DomainEvent::SaleCancelled(s) => {
                s.sale_id
            }
            DomainEvent::SaleItemCancelled { sale_id, .. } => *sale_id,
            DomainEvent::UserRegistered { user_id, .. }
            | DomainEvent::UserUpdated { user_id, .. }
            | DomainEvent::UserDeleted { user_id } => *user_id,
        }
    }

    /// The event body as stored in the outbox, without the type tag.
    pub fn payload(&self) -> serde_json::Value {
        match serde_json::to_value(self) {
            Ok(serde_json::Value::Object(mut map)) => {
                map.remove("data").unwrap_or(serde_json::Value::Null)
            }
            _ => serde_json::Value::Null,
        }
    }
}

pub type EventHandler = Box<dyn Fn(&DomainEvent) + Send + Sync>;

/// Synchronous observer registry: each event kind maps to an ordered list
/// of handlers, called in registration order.
#[derive(Default)]
pub struct EventDispatcher {
    handlers: HashMap<EventKind, Vec<EventHandler>>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// A dispatcher that logs every event kind.
    pub fn with_logging() -> Self {
        let mut dispatcher = Self::new();
        for kind in EventKind::ALL {
            dispatcher.register(kind, log_event);
        }
        dispatcher
    }

    pub fn register<F>(&mut self, kind: EventKind, handler: F)
    where
        F: Fn(&DomainEvent) + Send + Sync + 'static,
    {
        self.handlers.entry(kind).or_default().push(Box::new(handler));
    }

    pub fn dispatch(&self, event: &DomainEvent) {
        if let Some(handlers) = self.handlers.get(&event.kind()) {
            for handler in handlers {
                handler(event);
            }
        }
    }

    pub fn dispatch_all(&self, events: &[DomainEvent]) {
        for event in events {
            self.dispatch(event);
        }
    }
}

impl fmt::Debug for EventDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let counts: HashMap<_, _> = self.handlers.iter().map(|(k, v)| (*k, v.len())).collect();
        f.debug_struct("EventDispatcher").field("handlers", &counts).finish()
    }
}

fn log_event(event: &DomainEvent) {
    log::info!(
        "{} aggregate_id={} payload={}",
        event.kind(),
        event.aggregate_id(),
        event.payload()
    );
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;

    fn deleted() -> DomainEvent {
        DomainEvent::UserDeleted {
            user_id: Uuid::new_v4(),
        }
    }

    #[test]
    fn handlers_run_in_registration_order() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut dispatcher = EventDispatcher::new();
        for tag in ["first", "second"] {
            let seen = Arc::clone(&seen);
            dispatcher.register(EventKind::UserDeleted, move |_| seen.lock().unwrap().push(tag));
        }

        dispatcher.dispatch(&deleted());

        assert_eq!(*seen.lock().unwrap(), vec!["first", "second"]);
    }

    #[test]
    fn only_handlers_of_the_event_kind_run() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut dispatcher = EventDispatcher::new();
        let s = Arc::clone(&seen);
        dispatcher.register(EventKind::SaleCreated, move |e| s.lock().unwrap().push(e.kind()));

        dispatcher.dispatch_all(&[deleted(), deleted()]);
        assert!(seen.lock().unwrap().is_empty());
    }

    #[test]
    fn payload_drops_the_type_tag() {
        let sale_id = Uuid::new_v4();
        let product_id = Uuid::new_v4();
        let event = DomainEvent::SaleItemCancelled { sale_id, product_id };

        let payload = event.payload();

        assert_eq!(event.kind().as_str(), "SaleItemCancelled");
        assert_eq!(event.aggregate_id(), sale_id);
        assert_eq!(payload["sale_id"], serde_json::json!(sale_id));
        assert_eq!(payload["product_id"], serde_json::json!(product_id));
        assert!(payload.get("event_type").is_none());
    }
}
