//! Domain types for the regime engine.

pub mod bar;
pub mod event;

pub use bar::Bar;
pub use event::EconomicEvent;

/// Symbol type alias
pub type Symbol = String;
