//! UI layer for the desktop GUI: app shell, result panel, and image textures.

pub mod app;

pub use app::SporecheckApp;
