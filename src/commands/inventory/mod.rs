pub mod apply;
pub mod record_movement_command;
pub mod register_purchase_command;
pub mod transfer_stock_command;

pub use record_movement_command::{MovementResult, RecordMovementCommand};
pub use register_purchase_command::{PurchaseLine, PurchaseResult, RegisterPurchaseCommand};
pub use transfer_stock_command::{TransferResult, TransferStockCommand};
