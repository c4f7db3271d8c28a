//! # System Interaction Layer
//!
//! The boundary between the menu core and the outside world: where menu data
//! comes from, where triggered actions go, and what menus are drawn on.
//!
//! ## Modules
//!
//! - **`source`**: The `DataSource` trait plus a directory-backed `FileSource` and an
//!   in-memory `MemorySource`.
//! - **`executor`**: The `ActionSink` trait. `CommandSink` runs an opener command for
//!   navigation actions; `LogSink` only logs them.
//! - **`surface`**: The `MenuSurface` trait and `TextSurface`, a headless
//!   character-cell renderer.

pub mod executor;
pub mod source;
pub mod surface;
