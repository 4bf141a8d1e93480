pub mod client;
pub mod config;
pub mod event_loop;
pub mod input;
pub mod relay;
pub mod transport;

pub use client::GameClient;
pub use config::{ClientConfig, ConfigError};
pub use input::{ClientInput, LocalAction};
pub use relay::{ChannelRelay, RelayAdapter, RelayError};
