mod listen_thread;

pub use listen_thread::{ChannelListenThread, ListenThread, NullListenThread, ReportPhase, StatusReport};
