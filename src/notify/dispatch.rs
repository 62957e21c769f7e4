use std::sync::mpsc::{self, SyncSender, TrySendError};
use std::thread::JoinHandle;

use tracing::{error, warn};

use super::{Delivery, NotificationSink};
use crate::error::NotificationError;
use crate::models::AlertEvent;

/// How alerts reach the sink
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Dispatch {
    /// Deliver on the frame loop; a slow sink stalls acquisition
    #[default]
    Blocking,
    /// Hand alerts to a worker thread through a bounded queue; alerts are
    /// dropped when the queue is full
    Queued { capacity: usize },
}

enum Route {
    Direct(NotificationSink),
    Worker {
        sender: SyncSender<AlertEvent>,
        worker: JoinHandle<()>,
    },
}

/// Front end for the notification sink used by the frame loop
pub struct Notifier {
    route: Route,
}

impl Notifier {
    pub fn new(sink: NotificationSink, dispatch: Dispatch) -> Result<Self, NotificationError> {
        let route = match dispatch {
            Dispatch::Blocking => Route::Direct(sink),
            Dispatch::Queued { capacity } => {
                let (sender, receiver) = mpsc::sync_channel::<AlertEvent>(capacity.max(1));
                let worker = std::thread::Builder::new()
                    .name("notifier".to_string())
                    .spawn(move || {
                        for event in receiver {
                            if let Err(e) = sink.deliver(&event) {
                                warn!("Notification for alert at {} failed: {}", event.timestamp, e);
                            }
                        }
                    })?;
                Route::Worker { sender, worker }
            }
        };
        Ok(Self { route })
    }

    /// Deliver an alert, or queue it for delivery.
    ///
    /// With a queue the outcome is logged by the worker.
    pub fn notify(&self, event: AlertEvent) -> Result<Delivery, NotificationError> {
        match &self.route {
            Route::Direct(sink) => sink.deliver(&event),
            Route::Worker { sender, .. } => match sender.try_send(event) {
                Ok(()) => Ok(Delivery::Queued),
                Err(TrySendError::Full(_)) => Err(NotificationError::QueueFull),
                Err(TrySendError::Disconnected(_)) => {
                    Err(NotificationError::Send("notification worker stopped".to_string()))
                }
            },
        }
    }

    /// Wait for queued alerts to drain
    pub fn shutdown(self) {
        if let Route::Worker { sender, worker } = self.route {
            drop(sender);
            if worker.join().is_err() {
                error!("Notification worker panicked");
            }
        }
    }
}
