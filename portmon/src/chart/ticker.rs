//! Periodic chart updates
//!
//! The redraw schedule is an explicit task: a dedicated thread
//! multiplexes a tick channel with a command channel, and the `Stop`
//! command (or the command channel going away) is the cancellation
//! token. The thread owns the canonical `ViewRange`; display-side
//! readers poll the published `ChartView`.

use super::{ChartConfig, ViewRange};
use crate::data::{SampleStore, Snapshot};
use crossbeam::channel::{tick, unbounded, Sender};
use crossbeam::select;
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

enum Command {
    ZoomIn,
    ZoomOut,
    Stop,
}

/// Snapshot of the chart state for display-side readers.
#[derive(Debug, Clone)]
pub struct ChartView {
    /// Number of samples currently plotted.
    pub samples: usize,
    /// Latest (temperature, humidity) pair, if any.
    pub latest: Option<(f64, f64)>,
    /// Current vertical bounds.
    pub range: ViewRange,
}

pub struct ChartTask {
    cmds: Sender<Command>,
    published: Arc<Mutex<ChartView>>,
    handle: Option<JoinHandle<ViewRange>>,
}

impl ChartTask {
    pub fn spawn(store: Arc<SampleStore>, config: &ChartConfig) -> ChartTask {
        let (cmds, cmd_rx) = unbounded::<Command>();
        let published = Arc::new(Mutex::new(ChartView {
            samples: 0,
            latest: None,
            range: config.view,
        }));
        let slot = Arc::clone(&published);
        let cadence = config.cadence;
        let mut view = config.view;
        let handle = thread::Builder::new()
            .name("chart-tick".to_string())
            .spawn(move || {
                let ticker = tick(cadence);
                loop {
                    select! {
                        recv(cmd_rx) -> msg => match msg {
                            // Zooms take effect immediately, out of band
                            // from the tick cadence. Over an empty store
                            // they are no-ops.
                            Ok(Command::ZoomIn) => {
                                let snap = store.snapshot();
                                if let Some((lo, _)) = snap.value_bounds() {
                                    view.zoom_in(lo);
                                }
                                publish(&slot, &snap, view);
                            }
                            Ok(Command::ZoomOut) => {
                                let snap = store.snapshot();
                                if let Some((lo, _)) = snap.value_bounds() {
                                    view.zoom_out(lo);
                                }
                                publish(&slot, &snap, view);
                            }
                            Ok(Command::Stop) | Err(_) => break,
                        },
                        recv(ticker) -> _ => {
                            let snap = store.snapshot();
                            if let Some((lo, hi)) = snap.value_bounds() {
                                view.rescroll_to(lo, hi);
                            }
                            publish(&slot, &snap, view);
                        }
                    }
                }
                view
            })
            .expect("failed to spawn chart task");
        ChartTask {
            cmds,
            published,
            handle: Some(handle),
        }
    }

    pub fn view(&self) -> ChartView {
        self.published.lock().unwrap().clone()
    }

    pub fn zoom_in(&self) {
        let _ = self.cmds.send(Command::ZoomIn);
    }

    pub fn zoom_out(&self) {
        let _ = self.cmds.send(Command::ZoomOut);
    }

    /// Stop ticking and return the final view bounds.
    pub fn stop(mut self) -> ViewRange {
        let _ = self.cmds.send(Command::Stop);
        match self.handle.take() {
            Some(handle) => handle.join().expect("chart task panicked"),
            None => self.view().range,
        }
    }
}

impl Drop for ChartTask {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            let _ = self.cmds.send(Command::Stop);
            let _ = handle.join();
        }
    }
}

fn publish(slot: &Mutex<ChartView>, snap: &Snapshot, range: ViewRange) {
    *slot.lock().unwrap() = ChartView {
        samples: snap.len(),
        latest: snap.latest(),
        range,
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Sample;
    use std::time::Duration;

    fn wait_for(task: &ChartTask, pred: impl Fn(&ChartView) -> bool) -> ChartView {
        for _ in 0..200 {
            let view = task.view();
            if pred(&view) {
                return view;
            }
            thread::sleep(Duration::from_millis(5));
        }
        panic!("chart view never converged: {:?}", task.view());
    }

    #[test]
    fn ticks_pick_up_appended_samples_and_rescroll() {
        let store = Arc::new(SampleStore::default());
        let config = ChartConfig {
            cadence: Duration::from_millis(10),
            ..ChartConfig::default()
        };
        let task = ChartTask::spawn(Arc::clone(&store), &config);

        store.append(Sample {
            timestamp: "10:00:00".to_string(),
            temperature: 25.0,
            humidity: 70.0,
        });
        let view = wait_for(&task, |v| v.samples == 1);
        assert_eq!(view.latest, Some((25.0, 70.0)));
        // 70 escaped the default 20..50 range, so it recentered on the
        // data minimum.
        assert_eq!(view.range.y_min(), 10.0);
        assert_eq!(view.range.y_max(), 40.0);

        let final_view = task.stop();
        assert_eq!(final_view.y_span(), 30.0);
    }

    #[test]
    fn zoom_over_an_empty_store_is_a_no_op() {
        let store = Arc::new(SampleStore::default());
        let task = ChartTask::spawn(store, &ChartConfig::default());
        task.zoom_in();
        task.zoom_out();
        let view = task.stop();
        assert_eq!(view, ViewRange::default());
    }
}
