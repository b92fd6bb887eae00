//! Presentation contracts: what the board's cards, detail view and columns
//! show, as plain data. Rendering is left to the caller.

pub mod card;
pub mod columns;
pub mod detail;
pub mod format;

pub use card::*;
pub use columns::*;
pub use detail::*;
pub use format::{format_brl, format_currency, relative_time, Currency};
