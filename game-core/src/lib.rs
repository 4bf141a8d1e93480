pub mod authority;
pub mod errors;
pub mod game_events;
pub mod ranking;
pub mod registry;
pub mod timer;
pub mod turn;

// Re-export main components
pub use authority::*;
pub use errors::*;
pub use game_events::*;
pub use ranking::*;
pub use registry::*;
pub use timer::*;
pub use turn::*;
