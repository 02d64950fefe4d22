//! Fleet deployment

pub mod dispatch;
pub mod probe;
pub mod push;
pub mod remote;

pub use dispatch::Dispatcher;
pub use remote::RemoteOptions;
