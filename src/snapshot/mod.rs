//! Price snapshot module
//!
//! The immutable snapshot value, the reducer that folds ticks into it, and
//! the store that owns the current snapshot and connection status.

mod reducer;
mod store;
mod types;

pub use reducer::{reduce, reduce_synthetic};
pub use store::{PriceStore, Writer};
pub use types::{PriceSnapshot, ASK_OFFSET, BID_OFFSET};
