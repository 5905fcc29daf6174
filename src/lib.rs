pub mod aggregate;
pub mod codec;
pub mod config;
pub mod error;
pub mod exporter;
pub mod monitor;
pub mod point;
pub mod source;

pub use aggregate::Summary;
pub use config::Config;
pub use error::{CycleError, DeliveryError, SourceError};
pub use monitor::Monitor;
pub use point::Point;
