pub mod config;
pub mod events;
pub mod logging;
pub mod metrics;

pub use config::{Config, RegionProfile};
pub use events::{Event, EventLevel, EventSink};
pub use logging::init_logging;
pub use metrics::Metrics;
