use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

/// Domain events published after successful inventory mutations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    StockMovementRecorded {
        movement_id: Uuid,
        organization_id: Uuid,
        product_id: Uuid,
        branch_id: Uuid,
        movement_type: String,
        quantity: Decimal,
        new_quantity: Decimal,
    },
    StockTransferred {
        transfer_id: Uuid,
        organization_id: Uuid,
        product_id: Uuid,
        from_branch_id: Uuid,
        to_branch_id: Uuid,
        quantity: Decimal,
    },
    PurchaseRegistered {
        purchase_id: Uuid,
        organization_id: Uuid,
        branch_id: Uuid,
        movements_created: usize,
        total_cost: Decimal,
    },
    LowStockDetected {
        organization_id: Uuid,
        product_id: Uuid,
        branch_id: Uuid,
        quantity: Decimal,
        threshold: Decimal,
        detected_at: DateTime<Utc>,
    },
    InventorySettingsUpdated {
        organization_id: Uuid,
    },
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }
}

/// Creates a connected sender/receiver pair with the given channel capacity.
pub fn channel(capacity: usize) -> (EventSender, mpsc::Receiver<Event>) {
    let (tx, rx) = mpsc::channel(capacity);
    (EventSender::new(tx), rx)
}

/// Consumes events off the channel. Downstream delivery (alerts, dashboards,
/// notification fan-out) hangs off this loop; the core only logs.
pub async fn process_events(mut rx: mpsc::Receiver<Event>) {
    while let Some(event) = rx.recv().await {
        match &event {
            Event::LowStockDetected {
                product_id,
                branch_id,
                quantity,
                threshold,
                ..
            } => {
                warn!(
                    product_id = %product_id,
                    branch_id = %branch_id,
                    quantity = %quantity,
                    threshold = %threshold,
                    "Low stock detected"
                );
            }
            other => {
                info!(event = ?other, "Processing event");
            }
        }
    }
    info!("Event channel closed; event processor exiting");
}
