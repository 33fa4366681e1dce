//! Per-context message routers
//!
//! Each execution context owns one router: it drains the context's inbox,
//! dispatches to local handlers, and answers any reply slot exactly once.
//! Dispatch matches on the full closed message set so adding a variant is a
//! compile error until every router decides how to treat it.

pub mod background;
pub mod content;
pub mod player;

pub use background::BackgroundRouter;
pub use content::{ContentRouter, PageSelection, SelectionProvider};
pub use player::PlayerRouter;
