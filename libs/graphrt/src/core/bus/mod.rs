mod connector;

pub use connector::{Connector, POLL_INTERVAL};
