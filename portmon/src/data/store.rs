use crate::data::Sample;
use std::sync::Mutex;

/// Append-only store of the samples collected during one graphing
/// session.
///
/// The three columns are kept in parallel vectors and only ever touched
/// under one lock, so a reader can never observe them at different
/// lengths. Readers take a full copy; the producer appends and moves on.
/// There is no capacity bound: the store grows for the duration of the
/// graphing session and is cleared when the next one starts.
#[derive(Default)]
pub struct SampleStore {
    columns: Mutex<Columns>,
}

#[derive(Default, Clone)]
struct Columns {
    timestamps: Vec<String>,
    temperatures: Vec<f64>,
    humidities: Vec<f64>,
}

/// A consistent copy of the three parallel columns.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub timestamps: Vec<String>,
    pub temperatures: Vec<f64>,
    pub humidities: Vec<f64>,
}

impl Snapshot {
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    /// Min and max over the union of both value series, or `None` when
    /// the store was empty.
    pub fn value_bounds(&self) -> Option<(f64, f64)> {
        let mut values = self.temperatures.iter().chain(self.humidities.iter());
        let first = *values.next()?;
        let (mut lo, mut hi) = (first, first);
        for &v in values {
            lo = lo.min(v);
            hi = hi.max(v);
        }
        Some((lo, hi))
    }

    /// Latest (temperature, humidity) pair, if any.
    pub fn latest(&self) -> Option<(f64, f64)> {
        Some((*self.temperatures.last()?, *self.humidities.last()?))
    }
}

impl SampleStore {
    pub fn append(&self, sample: Sample) {
        let mut columns = self.columns.lock().unwrap();
        columns.timestamps.push(sample.timestamp);
        columns.temperatures.push(sample.temperature);
        columns.humidities.push(sample.humidity);
    }

    /// Reset to empty. Used at graph-session start only.
    pub fn clear(&self) {
        let mut columns = self.columns.lock().unwrap();
        columns.timestamps.clear();
        columns.temperatures.clear();
        columns.humidities.clear();
    }

    pub fn len(&self) -> usize {
        self.columns.lock().unwrap().timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy-on-read view for the chart; the copy is taken under the
    /// same lock the producer appends under.
    pub fn snapshot(&self) -> Snapshot {
        let columns = self.columns.lock().unwrap();
        Snapshot {
            timestamps: columns.timestamps.clone(),
            temperatures: columns.temperatures.clone(),
            humidities: columns.humidities.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn sample(t: f64, h: f64) -> Sample {
        Sample {
            timestamp: "12:00:00".to_string(),
            temperature: t,
            humidity: h,
        }
    }

    #[test]
    fn columns_stay_the_same_length() {
        let store = SampleStore::default();
        for i in 0..10 {
            store.append(sample(20.0 + i as f64, 40.0));
            let snap = store.snapshot();
            assert_eq!(snap.timestamps.len(), snap.temperatures.len());
            assert_eq!(snap.temperatures.len(), snap.humidities.len());
            assert_eq!(snap.len(), i + 1);
        }
    }

    #[test]
    fn clear_resets_to_empty() {
        let store = SampleStore::default();
        store.append(sample(21.0, 45.0));
        store.clear();
        assert!(store.is_empty());
        assert!(store.snapshot().is_empty());
    }

    #[test]
    fn snapshot_is_isolated_from_later_appends() {
        let store = SampleStore::default();
        store.append(sample(21.0, 45.0));
        let snap = store.snapshot();
        store.append(sample(22.0, 46.0));
        assert_eq!(snap.len(), 1);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn value_bounds_cover_both_series() {
        let store = SampleStore::default();
        store.append(sample(21.5, 45.0));
        store.append(sample(19.0, 60.5));
        assert_eq!(store.snapshot().value_bounds(), Some((19.0, 60.5)));
        assert_eq!(SampleStore::default().snapshot().value_bounds(), None);
    }

    #[test]
    fn concurrent_reader_never_sees_torn_columns() {
        let store = Arc::new(SampleStore::default());
        let producer = {
            let store = Arc::clone(&store);
            std::thread::spawn(move || {
                for i in 0..1000 {
                    store.append(sample(i as f64, i as f64 / 2.0));
                }
            })
        };
        while store.len() < 1000 {
            let snap = store.snapshot();
            assert_eq!(snap.timestamps.len(), snap.temperatures.len());
            assert_eq!(snap.temperatures.len(), snap.humidities.len());
        }
        producer.join().unwrap();
    }
}
