//! Infrastructure layer - Store backends and process plumbing

pub mod logging;
pub mod store;
