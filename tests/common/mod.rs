#![allow(dead_code, unused_imports)]

mod fixtures;
pub use fixtures::*;

// Re-export commonly used types from roomwatch for tests
pub use roomwatch::{
    AlertDebouncer, BackgroundModel, CancelToken, Dispatch, NotificationSink, Notifier,
    OccupancyVerdict, Observation, Pipeline, RegionExtractor, ReplaySource, StopReason,
};
