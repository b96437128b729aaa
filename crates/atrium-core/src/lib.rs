pub mod events;
pub mod ids;

pub use events::{CallbackEvent, WireEvent};
pub use ids::{ChannelId, SessionId};
