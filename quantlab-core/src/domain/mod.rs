//! Domain types: bars, positions, trades.

pub mod bar;
pub mod position;
pub mod trade;

pub use bar::PriceBar;
pub use position::{Position, Side};
pub use trade::{ExitReason, Trade};
