pub mod config;
pub mod debounce;
pub mod detection;
pub mod error;
pub mod models;
pub mod notify;
pub mod pipeline;
pub mod source;

pub use config::{Config, DebounceSettings, DetectionSettings, SinkKind};
pub use debounce::{AlertDebouncer, DebouncePhase};
pub use detection::{BackgroundModel, FrameAnalysis, MotionDetector, Observation, RegionExtractor};
pub use error::{ConfigError, DetectionError, FrameAcquisitionError, NotificationError, RunError};
pub use models::{AlertEvent, Frame, OccupancyVerdict, RawFrame, Region};
pub use notify::{Delivery, Dispatch, NotificationSink, Notifier};
pub use pipeline::{CancelToken, Pipeline, RunSummary, StopReason};
pub use source::{FrameSource, ImageDirSource, ReplaySource};
