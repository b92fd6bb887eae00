//! Pure data structures shared by the access layer, the board and the views.

pub mod event;
pub mod order;
pub mod session;
pub mod status;
pub mod store;

pub use event::*;
pub use order::*;
pub use session::*;
pub use status::*;
pub use store::*;
