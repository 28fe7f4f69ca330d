//! Delivery strategies.
//!
//! - `single_shot`: one envelope, then terminal
//! - `incremental`: `@defer`-style initial part plus a final part
//! - `streaming`: one envelope per continuation trigger until completed

pub mod incremental;
pub mod single_shot;
pub mod streaming;

pub use incremental::{Incremental, IncrementalParts, IncrementalState};
pub use single_shot::SingleShot;
pub use streaming::Streaming;
