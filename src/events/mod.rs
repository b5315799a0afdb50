use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::entities::sea_orm_active_enums::StockableKind;

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    /// Creates a new EventSender
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }

    /// Sends an event, logging instead of propagating failures. Events are
    /// best-effort notifications; a full or closed channel must not fail the
    /// operation that produced them.
    pub async fn send_or_log(&self, event: Event) {
        if let Err(e) = self.send(event).await {
            tracing::error!("{}", e);
        }
    }
}

// Define the various events that can occur in the system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    // Stock events
    StockAdded {
        stockable_kind: StockableKind,
        stockable_id: i32,
        location_id: i32,
        quantity: Decimal,
    },
    StockRemoved {
        stockable_kind: StockableKind,
        stockable_id: i32,
        location_id: i32,
        quantity: Decimal,
    },
    StockTransferred {
        stockable_kind: StockableKind,
        stockable_id: i32,
        from_location_id: i32,
        to_location_id: i32,
        quantity: Decimal,
    },

    // Loss accounting events
    LossRecorded {
        loss_id: i32,
        stockable_kind: StockableKind,
        stockable_id: i32,
        quantity: Decimal,
    },
    LossRolledBack {
        loss_id: i32,
    },

    // Perishable tracking events
    PerishableExpired {
        perishable_id: i32,
        ingredient_id: i32,
        location_id: i32,
        quantity: Decimal,
    },

    // Order workflow events
    OrderCreated(i32),
    OrderStatusChanged {
        order_id: i32,
        old_status: String,
        new_status: String,
    },
    StepMenuStatusChanged {
        step_menu_id: i32,
        old_status: String,
        new_status: String,
    },
}

// Function to process incoming events. Side effects that must stay
// consistent with the data (perishable sync, loss writes, history rows)
// happen inside the service transactions; this loop is for operational
// visibility only.
pub async fn process_events(mut rx: mpsc::Receiver<Event>) {
    info!("Starting event processing loop");

    while let Some(event) = rx.recv().await {
        match event {
            Event::StockAdded {
                stockable_kind,
                stockable_id,
                location_id,
                quantity,
            } => {
                info!(
                    "Stock added: {} {} +{} at location {}",
                    stockable_kind, stockable_id, quantity, location_id
                );
            }
            Event::StockRemoved {
                stockable_kind,
                stockable_id,
                location_id,
                quantity,
            } => {
                info!(
                    "Stock removed: {} {} -{} at location {}",
                    stockable_kind, stockable_id, quantity, location_id
                );
            }
            Event::StockTransferred {
                stockable_kind,
                stockable_id,
                from_location_id,
                to_location_id,
                quantity,
            } => {
                info!(
                    "Stock transferred: {} {} moved {} from location {} to location {}",
                    stockable_kind, stockable_id, quantity, from_location_id, to_location_id
                );
            }
            Event::LossRecorded {
                loss_id,
                stockable_kind,
                stockable_id,
                quantity,
            } => {
                info!(
                    "Loss recorded: loss {} ({} {}, quantity {})",
                    loss_id, stockable_kind, stockable_id, quantity
                );
            }
            Event::LossRolledBack { loss_id } => {
                info!("Loss rolled back: {}", loss_id);
            }
            Event::PerishableExpired {
                perishable_id,
                ingredient_id,
                location_id,
                quantity,
            } => {
                info!(
                    "Perishable expired: batch {} (ingredient {}, location {}, quantity {})",
                    perishable_id, ingredient_id, location_id, quantity
                );
            }
            Event::OrderCreated(order_id) => {
                info!("Order created: {}", order_id);
            }
            Event::OrderStatusChanged {
                order_id,
                old_status,
                new_status,
            } => {
                info!(
                    "Order {} status changed: {} -> {}",
                    order_id, old_status, new_status
                );
            }
            Event::StepMenuStatusChanged {
                step_menu_id,
                old_status,
                new_status,
            } => {
                info!(
                    "Step menu {} status changed: {} -> {}",
                    step_menu_id, old_status, new_status
                );
            }
        }
    }

    warn!("Event processing loop has ended");
}
