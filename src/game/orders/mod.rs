/// Order layer - shared commands and the per-unit queues built from them.
///
/// This module is organized into:
/// - **types**: Order tags, tag sets, targets, payloads, handles
/// - **order**: The shared order record
/// - **link**: Graph edges between orders
/// - **notify**: Destruction notification channel
/// - **graph**: The order graph resource (queueing, advancing, collection)
/// - **observe**: Read-only summaries for encoders
/// - **systems**: Order command processing and target tracking

pub mod types;
pub mod order;
pub mod link;
pub mod notify;
pub mod graph;
pub mod observe;
pub mod systems;

pub use types::*;
pub use order::Order;
pub use link::Link;
pub use notify::{DestructionChannel, DestructionObserver};
pub use graph::{Advance, OrderEvent, OrderGraph, OrderGraphError};
pub use observe::{order_sequence, summarize_unit, UnitOrderSummary};
pub use systems::OrdersPlugin;
