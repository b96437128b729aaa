pub mod bus;
pub mod error;
pub mod handlers;
pub mod origin;
pub mod server;

pub use bus::{CallbackBus, ChannelHandle};
pub use error::ApiError;
pub use server::{start, ServerConfig, ServerHandle};
