pub mod bus;
pub mod clipboard;

pub use bus::EventBus;
pub use clipboard::SystemClipboard;
