pub mod config;
pub mod driver;
pub mod error;
pub mod pacer;
pub mod reader;
pub mod selector;
pub mod source;
pub mod transformer;
pub mod types;

pub use config::{PacingConfig, StreamConfig, TargetSource, WindowConfig};
pub use driver::{drive_forecaster, DriveSummary, Forecaster, WindowStream};
pub use error::{WindowError, WindowResult};
pub use pacer::Pacer;
pub use selector::FeatureSelector;
pub use source::{BoundedSource, ChannelSource, Fetch, IntoObservation, ListSource, Source};
pub use transformer::WindowTransformer;
pub use types::*;
