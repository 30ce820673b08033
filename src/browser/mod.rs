//! Chromium-backed implementation of the session traits

pub mod connection;
pub mod launch;
pub mod login;
pub mod session;

pub use connection::connect_to_browser;
pub use launch::launch_browser;
pub use login::{ChromeSessionProvider, Credentials};
pub use session::ChromeSession;
