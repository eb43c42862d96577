use std::{
    sync::mpsc::{self, Receiver, Sender},
    thread::JoinHandle,
};

use burn::{
    data::dataloader::Progress,
    train::{
        TrainingInterrupter,
        metric::{
            MetricEntry, Numeric,
            state::{FormatOptions, NumericMetricState},
        },
        renderer::{MetricState, MetricsRenderer, TrainingProgress, tui::TuiMetricsRenderer},
    },
};
use log::warn;

use super::report::{Reporter, Snapshot};
use crate::error::Result;

struct Update {
    progress: Progress,
    episode: usize,
    updates: Vec<(MetricEntry, f64)>,
}

struct Metrics {
    reward: NumericMetricState,
    loss: NumericMetricState,
    baseline_reward: NumericMetricState,
    baseline_loss: NumericMetricState,
}

impl Metrics {
    fn new() -> Self {
        Self {
            reward: NumericMetricState::new(),
            loss: NumericMetricState::new(),
            baseline_reward: NumericMetricState::new(),
            baseline_loss: NumericMetricState::new(),
        }
    }

    fn update(&mut self, snapshot: &Snapshot<'_>) -> Vec<(MetricEntry, f64)> {
        let mut updates = Vec::new();

        if let Some(reward) = snapshot.policy.rewards.last() {
            updates.push((
                self.reward.update(
                    *reward as f64,
                    1,
                    FormatOptions::new("reward").precision(2),
                ),
                self.reward.value(),
            ));
        }
        if let Some(loss) = snapshot.policy.losses.last() {
            updates.push((
                self.loss
                    .update(*loss as f64, 1, FormatOptions::new("loss").precision(4)),
                self.loss.value(),
            ));
        }

        if let Some(baseline) = snapshot.baseline {
            if let Some(reward) = baseline.rewards.last() {
                updates.push((
                    self.baseline_reward.update(
                        *reward as f64,
                        1,
                        FormatOptions::new("baseline reward").precision(2),
                    ),
                    self.baseline_reward.value(),
                ));
            }
            if let Some(loss) = baseline.losses.last() {
                updates.push((
                    self.baseline_loss.update(
                        *loss as f64,
                        1,
                        FormatOptions::new("baseline loss").precision(4),
                    ),
                    self.baseline_loss.value(),
                ));
            }
        }

        updates
    }
}

/// Sending half of the render channel.
struct Feed {
    tx: Sender<Update>,
    closed: bool,
}

impl Feed {
    fn new(tx: Sender<Update>) -> Self {
        Self { tx, closed: false }
    }

    /// Returns false once the render thread has gone away.
    fn send(&mut self, update: Update) -> bool {
        if self.closed {
            return false;
        }

        if self.tx.send(update).is_err() {
            warn!("Dashboard closed, dropping further training updates");
            self.closed = true;
        }

        !self.closed
    }
}

/// Terminal dashboard of the reward and loss curves.
///
/// Rendering runs on its own thread; `report` only formats the latest values
/// and hands them over.
pub struct TuiReporter {
    metrics: Metrics,
    episodes: usize,
    feed: Feed,
    thread: JoinHandle<()>,
}

impl TuiReporter {
    pub fn new(episodes: usize) -> Self {
        let (tx, rx) = mpsc::channel();

        let interuptor = TrainingInterrupter::new();
        let renderer = TuiMetricsRenderer::new(interuptor, None);

        let thread = std::thread::spawn(move || Self::run(renderer, rx));

        Self {
            metrics: Metrics::new(),
            episodes,
            feed: Feed::new(tx),
            thread,
        }
    }

    fn run(mut renderer: TuiMetricsRenderer, rx: Receiver<Update>) {
        rx.iter().for_each(|update| {
            for (entry, value) in update.updates {
                renderer.update_train(MetricState::Numeric(entry, value));
            }

            renderer.render_train(TrainingProgress {
                progress: update.progress,
                epoch: 1,
                epoch_total: 1,
                iteration: update.episode,
            });
        });

        renderer.persistent();
    }

    /// Closes the channel and waits for the dashboard to exit.
    pub fn join(self) {
        drop(self.feed);

        if self.thread.join().is_err() {
            warn!("Render thread panicked");
        }
    }
}

impl Reporter for TuiReporter {
    fn report(&mut self, snapshot: &Snapshot<'_>) -> Result<()> {
        let update = Update {
            progress: Progress {
                items_processed: snapshot.episode + 1,
                items_total: self.episodes,
            },
            episode: snapshot.episode,
            updates: self.metrics.update(snapshot),
        };

        self.feed.send(update);

        Ok(())
    }
}
