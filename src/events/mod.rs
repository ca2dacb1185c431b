use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{error, info};
use uuid::Uuid;

/// Events emitted by the checkout engine. All checkout-related events fire
/// only after the surrounding transaction has committed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    // Order events
    OrderCreated(Uuid),
    CheckoutCompleted {
        order_id: Uuid,
        user_id: Uuid,
    },

    // Payment events
    PaymentAuthorized {
        reference: String,
        amount: i64,
    },

    // Inventory events
    InventoryDecremented {
        product_id: Uuid,
        quantity: i32,
    },
    ProductRestocked {
        product_id: Uuid,
        quantity: i32,
    },
    ProductCreated(Uuid),

    // Cart events
    CartLineAdded {
        user_id: Uuid,
        product_id: Uuid,
    },
    CartLineRemoved {
        user_id: Uuid,
        product_id: Uuid,
    },
    CartCleared(Uuid),
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event, surfacing the failure to the caller.
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }

    /// Sends an event, logging instead of failing when the receiver is gone.
    /// Used after commit, where a dropped event must not fail the request.
    pub async fn send_or_log(&self, event: Event) {
        if let Err(e) = self.sender.send(event).await {
            error!("Event dropped: {}", e);
        }
    }
}

/// Drains the event channel. Downstream consumers (notifications, reporting)
/// hang off this loop; the engine itself only requires that events are logged.
pub async fn process_events(mut rx: mpsc::Receiver<Event>) {
    info!("Starting event processing loop");

    while let Some(event) = rx.recv().await {
        match &event {
            Event::OrderCreated(order_id) => {
                info!(%order_id, "order created");
            }
            Event::CheckoutCompleted { order_id, user_id } => {
                info!(%order_id, %user_id, "checkout completed");
            }
            Event::PaymentAuthorized { reference, amount } => {
                info!(%reference, amount, "payment authorized");
            }
            Event::InventoryDecremented {
                product_id,
                quantity,
            } => {
                info!(%product_id, quantity, "inventory decremented");
            }
            Event::ProductRestocked {
                product_id,
                quantity,
            } => {
                info!(%product_id, quantity, "product restocked");
            }
            _ => {
                info!("Received event: {:?}", event);
            }
        }
    }
}
