#![doc = include_str!("../README.md")]

pub mod prelude {
    pub use crate::listener::{ListenerState, LogListener, LogListenerBuilder, Phase};
    pub use crate::message::{Message, MessageType};
    pub use crate::message_store::{
        shared_store, BlockFilter, LogSummary, MessageStore, SharedMessageStore,
    };
    pub use crate::runner::LineFeeder;
    pub use crate::sink::{LogSink, SinkFanout, StoreSink, TextSink};
    pub use crate::stat_store::StatStore;
    pub use log::{debug, error, info, log_enabled, Level};
}

pub mod cli;
pub use cli::Cli;
pub mod config;
pub use config::Settings;
pub mod constants;
pub mod export;
pub use export::write_artifacts;
pub mod listener;
pub use listener::{LogListener, LogListenerBuilder};
pub mod message;
pub mod message_store;
pub mod parsers;
pub mod path_stripper;
pub mod patterns;
pub mod report;
pub use report::generate_comfy_report;
pub mod runner;
pub mod sink;
pub mod stat_store;
