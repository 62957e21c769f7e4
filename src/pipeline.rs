use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use image::{GrayImage, RgbImage};
use time::OffsetDateTime;
use time::macros::format_description;
use tracing::{debug, info, warn};

use crate::config::{Config, DebounceSettings, DetectionSettings};
use crate::debounce::AlertDebouncer;
use crate::detection::{FrameAnalysis, MotionDetector, classifier};
use crate::error::{ConfigError, RunError};
use crate::models::{AlertEvent, OccupancyVerdict, RawFrame};
use crate::notify::Notifier;
use crate::source::FrameSource;

/// Cooperative stop signal, checked once per frame
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Debug configuration for pipeline execution
#[derive(Clone, Debug)]
pub struct DebugConfig {
    /// Root directory for debug outputs
    pub output_dir: PathBuf,
}

/// Settings shared by every frame of a run
#[derive(Clone, Debug, Default)]
pub struct PipelineContext {
    pub show_video: bool,
    /// Per-stage images are written only when set
    pub debug: Option<DebugConfig>,
}

/// What happened to a single frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameOutcome {
    pub timestamp: OffsetDateTime,
    /// False for the frame that seeded the background
    pub evaluated: bool,
    pub verdict: OccupancyVerdict,
    pub region_count: usize,
    pub alerted: bool,
    pub notification_failed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    Cancelled,
    Exhausted,
    FrameLimit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub frames: u64,
    pub occupied_frames: u64,
    pub alerts: u64,
    pub failed_notifications: u64,
    pub stop: StopReason,
}

/// Sequential surveillance loop: detector, debouncer and notifier
pub struct Pipeline {
    detector: MotionDetector,
    debouncer: AlertDebouncer,
    notifier: Notifier,
    context: PipelineContext,
    max_frames: Option<u64>,
}

impl Pipeline {
    pub fn new(detection: DetectionSettings, debounce: DebounceSettings, notifier: Notifier) -> Self {
        Self {
            detector: MotionDetector::new(detection),
            debouncer: AlertDebouncer::new(debounce),
            notifier,
            context: PipelineContext::default(),
            max_frames: None,
        }
    }

    pub fn from_config(config: &Config, notifier: Notifier) -> Result<Self, ConfigError> {
        Ok(Self::new(config.detection_settings()?, config.debounce_settings()?, notifier)
            .with_show_video(config.show_video))
    }

    /// Log the room status of every frame at info level
    pub fn with_show_video(mut self, show_video: bool) -> Self {
        self.context.show_video = show_video;
        self
    }

    /// Stop after this many frames
    pub fn with_max_frames(mut self, max_frames: Option<u64>) -> Self {
        self.max_frames = max_frames;
        self
    }

    /// Enable debug mode with output directory
    /// The directory must be empty or non-existent
    pub fn with_debug(mut self, output_dir: PathBuf) -> Result<Self, RunError> {
        if output_dir.exists() {
            let entries = std::fs::read_dir(&output_dir).map_err(debug_err)?;
            if entries.count() > 0 {
                return Err(RunError::Debug(format!(
                    "debug directory is not empty: {}",
                    output_dir.display()
                )));
            }
        } else {
            std::fs::create_dir_all(&output_dir).map_err(debug_err)?;
        }

        self.context.debug = Some(DebugConfig { output_dir });

        Ok(self)
    }

    pub fn debouncer(&self) -> &AlertDebouncer {
        &self.debouncer
    }

    pub fn detector(&self) -> &MotionDetector {
        &self.detector
    }

    /// Pull frames until cancelled, exhausted or the frame limit is hit
    pub fn run<S: FrameSource + ?Sized>(
        &mut self,
        source: &mut S,
        cancel: &CancelToken,
    ) -> Result<RunSummary, RunError> {
        let mut frames = 0u64;
        let mut occupied_frames = 0u64;
        let mut alerts = 0u64;
        let mut failed_notifications = 0u64;

        let stop = loop {
            if cancel.is_cancelled() {
                break StopReason::Cancelled;
            }
            if self.max_frames.is_some_and(|max| frames >= max) {
                break StopReason::FrameLimit;
            }
            let Some(raw) = source.next_frame()? else {
                break StopReason::Exhausted;
            };

            let outcome = self.process(raw, frames)?;
            frames += 1;
            if outcome.verdict.is_occupied() {
                occupied_frames += 1;
            }
            if outcome.alerted {
                alerts += 1;
            }
            if outcome.notification_failed {
                failed_notifications += 1;
            }
        };

        info!(
            "Stopped ({:?}) after {} frame(s), {} alert(s)",
            stop, frames, alerts
        );

        Ok(RunSummary {
            frames,
            occupied_frames,
            alerts,
            failed_notifications,
            stop,
        })
    }

    /// Push one frame through every stage
    pub fn process(&mut self, raw: RawFrame, index: u64) -> Result<FrameOutcome, RunError> {
        let analysis = self.detector.analyze(&raw)?;
        let timestamp = analysis.frame.timestamp;

        if !analysis.evaluated {
            info!("Background gathered, watching for motion");
            self.save_debug_output(index, &analysis, None)?;
            return Ok(FrameOutcome {
                timestamp,
                evaluated: false,
                verdict: OccupancyVerdict::Empty,
                region_count: 0,
                alerted: false,
                notification_failed: false,
            });
        }

        let mut annotated = analysis.frame.color.clone();
        classifier::annotate(&mut annotated, &analysis.regions);
        self.report_status(analysis.verdict, timestamp);
        self.save_debug_output(index, &analysis, Some(&annotated))?;

        let alerted = self.debouncer.step(analysis.verdict, timestamp);
        let mut notification_failed = false;

        if alerted {
            let event = AlertEvent {
                snapshot: annotated,
                timestamp,
                regions: analysis.regions.clone(),
            };
            // A failed delivery still counts as sent for the cooldown
            match self.notifier.notify(event) {
                Ok(delivery) => debug!("Alert delivered: {:?}", delivery),
                Err(e) => {
                    warn!("Notification failed: {}", e);
                    notification_failed = true;
                }
            }
        }

        Ok(FrameOutcome {
            timestamp,
            evaluated: true,
            verdict: analysis.verdict,
            region_count: analysis.regions.len(),
            alerted,
            notification_failed,
        })
    }

    /// Stop the notifier, draining any queued alerts
    pub fn finish(self) {
        self.notifier.shutdown();
    }

    fn report_status(&self, verdict: OccupancyVerdict, timestamp: OffsetDateTime) {
        let when = format_status_time(timestamp);
        if self.context.show_video {
            info!("Room Status: {} | {}", verdict, when);
        } else {
            debug!("Room Status: {} | {}", verdict, when);
        }
    }

    fn save_debug_output(
        &self,
        index: u64,
        analysis: &FrameAnalysis,
        annotated: Option<&RgbImage>,
    ) -> Result<(), RunError> {
        let Some(debug_config) = &self.context.debug else {
            return Ok(());
        };

        let filename = format!("{:06}.png", index);
        let root = &debug_config.output_dir;

        save_gray(&root.join("00_input"), &filename, &analysis.frame.gray)?;
        if analysis.evaluated {
            save_gray(&root.join("01_deviation"), &filename, &analysis.deviation)?;
            save_gray(&root.join("02_mask"), &filename, &analysis.mask)?;
        }
        if let Some(annotated) = annotated {
            let dir = root.join("03_annotated");
            std::fs::create_dir_all(&dir).map_err(debug_err)?;
            annotated
                .save(dir.join(&filename))
                .map_err(|e| RunError::Debug(format!("failed to save debug image: {}", e)))?;
        }

        debug!("Debug: saved frame {}", filename);
        Ok(())
    }
}

/// Timestamp as shown next to the room status, e.g. "Monday 05 March 2024 09:15:02PM"
pub fn format_status_time(timestamp: OffsetDateTime) -> String {
    let format = format_description!(
        "[weekday] [day] [month repr:long] [year] [hour repr:12]:[minute]:[second][period]"
    );
    timestamp
        .format(format)
        .unwrap_or_else(|_| timestamp.to_string())
}

fn save_gray(dir: &Path, filename: &str, image: &GrayImage) -> Result<(), RunError> {
    std::fs::create_dir_all(dir).map_err(debug_err)?;
    image
        .save(dir.join(filename))
        .map_err(|e| RunError::Debug(format!("failed to save debug image: {}", e)))
}

fn debug_err(e: std::io::Error) -> RunError {
    RunError::Debug(e.to_string())
}
