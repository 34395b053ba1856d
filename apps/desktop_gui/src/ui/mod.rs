//! UI layer for desktop GUI: app shell, screens, and chart painting.

pub mod app;
pub mod charts;

pub use app::DesktopGuiApp;
