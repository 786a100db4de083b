pub mod addresses;
pub mod args;
pub mod config;
pub mod duration;
pub mod engine;
pub mod error;
pub mod message;
pub mod peer;
pub mod poll;
pub mod recorder;
pub mod sockaddr;
pub mod socket;
pub mod source;
pub mod summary;
pub mod timer;
pub mod timestamp;
pub mod trace;
