//! Client message delivery

pub mod channel;

pub use channel::ChannelClientLink;
