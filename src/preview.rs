//! Polling synchronization against the asynchronously rendered preview.
//!
//! A worker thread issues one fetch immediately, then re-polls on a fixed
//! interval until stopped. Ticks are strictly sequential: the next one is
//! scheduled only after the previous fetch resolved, so a slow backend never
//! piles up concurrent polls. Completions carry a generation token; stopping
//! bumps the generation, and the consumer-side handle discards anything
//! stamped with a stale one, so no state transition is observable after
//! `stop` returns even if an in-flight fetch resolves later.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::mpsc::{Receiver, Sender, TryRecvError};
use std::sync::{Arc, mpsc};
use std::thread;
use std::time::{Duration, Instant};

use crate::gateway::MaskGateway;
use crate::model::{JobArtifact, MaskId};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

#[derive(Clone, Debug, PartialEq)]
pub enum PreviewState {
    /// Not running: never started, or explicitly stopped (terminal).
    Idle,
    /// A fetch is outstanding and nothing newer has resolved.
    Polling,
    /// Latest poll: the backend has not finished rendering yet.
    NotReady,
    /// Latest poll: rendered markup is available.
    Ready,
    /// Latest poll failed; the loop keeps polling regardless.
    Error(String),
}

enum PreviewEvent {
    TickStarted {
        generation: u64,
    },
    Resolved {
        generation: u64,
        outcome: TickOutcome,
    },
}

enum TickOutcome {
    NotReady,
    Ready(String),
    Failed(String),
}

struct Shared {
    generation: AtomicU64,
    stopped: AtomicBool,
}

/// Handle to one running loop, bound to one mask identity. Dropping it stops
/// the loop.
pub struct PreviewLoop {
    shared: Arc<Shared>,
    events: Receiver<PreviewEvent>,
    state: PreviewState,
    html: Option<String>,
}

impl PreviewLoop {
    /// Starts polling for the given mask: one immediate fetch, then one per
    /// interval, each scheduled after the previous completion.
    pub fn start(gateway: Arc<dyn MaskGateway>, mask_id: MaskId, interval: Duration) -> Self {
        let shared = Arc::new(Shared {
            generation: AtomicU64::new(1),
            stopped: AtomicBool::new(false),
        });
        let (tx, rx) = mpsc::channel();

        let worker_shared = Arc::clone(&shared);
        thread::spawn(move || run_worker(gateway, mask_id, interval, worker_shared, tx));

        Self {
            shared,
            events: rx,
            state: PreviewState::Polling,
            html: None,
        }
    }

    /// Drains resolved events into the visible state. Returns true when the
    /// state changed. Events from a stale generation (anything issued before
    /// a stop) are discarded, never applied.
    pub fn pump(&mut self) -> bool {
        let mut changed = false;
        loop {
            let event = match self.events.try_recv() {
                Ok(event) => event,
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            };
            if self.shared.stopped.load(Ordering::SeqCst) {
                continue;
            }
            let current = self.shared.generation.load(Ordering::SeqCst);
            match event {
                PreviewEvent::TickStarted { generation } if generation == current => {
                    changed |= self.transition(PreviewState::Polling);
                }
                PreviewEvent::Resolved {
                    generation,
                    outcome,
                } if generation == current => match outcome {
                    TickOutcome::NotReady => {
                        changed |= self.transition(PreviewState::NotReady);
                    }
                    TickOutcome::Ready(html) => {
                        // Wholesale replacement; no merging with the prior render.
                        self.html = Some(html);
                        changed |= self.transition(PreviewState::Ready);
                    }
                    TickOutcome::Failed(message) => {
                        changed |= self.transition(PreviewState::Error(message));
                    }
                },
                _ => {}
            }
        }
        changed
    }

    pub fn state(&self) -> &PreviewState {
        &self.state
    }

    /// The most recent rendered markup, kept across later `NotReady`/`Error`
    /// ticks until a newer render replaces it.
    pub fn html(&self) -> Option<&str> {
        self.html.as_deref()
    }

    pub fn is_stopped(&self) -> bool {
        self.shared.stopped.load(Ordering::SeqCst)
    }

    /// Stops the loop. Synchronous and leak-free: after this returns the
    /// state is `Idle` forever, and a fetch that was already in flight
    /// resolves into a stale generation and is discarded.
    pub fn stop(&mut self) {
        self.shared.stopped.store(true, Ordering::SeqCst);
        self.shared.generation.fetch_add(1, Ordering::SeqCst);
        self.state = PreviewState::Idle;
        // Flush whatever already arrived so nothing lingers.
        while self.events.try_recv().is_ok() {}
    }

    fn transition(&mut self, next: PreviewState) -> bool {
        if self.state == next {
            return false;
        }
        self.state = next;
        true
    }
}

impl Drop for PreviewLoop {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run_worker(
    gateway: Arc<dyn MaskGateway>,
    mask_id: MaskId,
    interval: Duration,
    shared: Arc<Shared>,
    tx: Sender<PreviewEvent>,
) {
    let mut first = true;
    loop {
        if shared.stopped.load(Ordering::SeqCst) {
            return;
        }
        // The generation this tick belongs to, captured before the fetch so a
        // stop during the fetch invalidates its result.
        let generation = shared.generation.load(Ordering::SeqCst);

        if !first && tx.send(PreviewEvent::TickStarted { generation }).is_err() {
            return;
        }
        first = false;

        let outcome = match gateway.poll_job(&mask_id) {
            Ok(JobArtifact::Ready { html }) => TickOutcome::Ready(html),
            Ok(JobArtifact::Processing) => TickOutcome::NotReady,
            Ok(JobArtifact::Failed) => {
                TickOutcome::Failed("job completed without rendered markup".to_string())
            }
            Err(err) => {
                log::debug!("preview poll for {} failed: {}", mask_id, err);
                TickOutcome::Failed(err.to_string())
            }
        };

        if tx
            .send(PreviewEvent::Resolved {
                generation,
                outcome,
            })
            .is_err()
        {
            return;
        }

        if !sleep_unless_stopped(&shared, interval) {
            return;
        }
    }
}

// Sleeps in short slices so a stop takes effect promptly. Returns false when
// stopped mid-sleep.
fn sleep_unless_stopped(shared: &Shared, interval: Duration) -> bool {
    const SLICE: Duration = Duration::from_millis(10);
    let deadline = Instant::now() + interval;
    while Instant::now() < deadline {
        if shared.stopped.load(Ordering::SeqCst) {
            return false;
        }
        thread::sleep(SLICE.min(deadline.saturating_duration_since(Instant::now())));
    }
    !shared.stopped.load(Ordering::SeqCst)
}

#[cfg(test)]
#[path = "tests/preview_tests.rs"]
mod tests;
