/// Per-node rolling rainfall history.
///
/// Each node owns a fixed-length window of the most recent rainfall values,
/// pre-seeded with zeros so the window is always full. Appends push at the
/// tail and evict at the head. The node's most recent full reading is kept
/// alongside the window for scorers that work from live values.
///
/// # Concurrency
/// The node map is behind an `RwLock`; each node's state is behind its own
/// `Mutex`. Appends for distinct nodes only contend on the read lock, while
/// appends for the same node are serialized by that node's mutex.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use crate::model::{EngineError, HISTORY_CAPACITY, SensorReading};

#[derive(Debug)]
struct NodeSlot {
    window: VecDeque<f64>,
    latest: Option<SensorReading>,
}

impl NodeSlot {
    fn seeded(capacity: usize) -> Self {
        let mut window = VecDeque::with_capacity(capacity + 1);
        window.extend(std::iter::repeat_n(0.0, capacity));
        NodeSlot { window, latest: None }
    }

    fn push(&mut self, value: f64, capacity: usize) {
        self.window.push_back(value);
        while self.window.len() > capacity {
            self.window.pop_front();
        }
    }
}

/// Owned store of every node's history. Construct one at startup and share
/// it by reference; there is no global instance.
#[derive(Debug)]
pub struct HistoryStore {
    capacity: usize,
    nodes: RwLock<HashMap<String, Arc<Mutex<NodeSlot>>>>,
}

impl Default for HistoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl HistoryStore {
    pub fn new() -> Self {
        Self::with_capacity(HISTORY_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        HistoryStore {
            capacity,
            nodes: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the node's slot, creating a zero-seeded one if absent.
    fn slot(&self, node_id: &str) -> Arc<Mutex<NodeSlot>> {
        if let Some(slot) = self
            .nodes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(node_id)
        {
            return Arc::clone(slot);
        }

        let mut nodes = self.nodes.write().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(
            nodes
                .entry(node_id.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(NodeSlot::seeded(self.capacity)))),
        )
    }

    fn existing(&self, node_id: &str) -> Option<Arc<Mutex<NodeSlot>>> {
        self.nodes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(node_id)
            .map(Arc::clone)
    }

    /// Appends a rainfall value to the node's window, evicting the oldest
    /// value once the window is over capacity. Unknown nodes are created.
    pub fn append(&self, node_id: &str, rainfall: f64) {
        let slot = self.slot(node_id);
        let mut slot = slot.lock().unwrap_or_else(PoisonError::into_inner);
        slot.push(rainfall, self.capacity);
    }

    /// Stores `reading` as the node's latest reading and appends its rainfall.
    /// Both updates happen under the node's lock.
    pub fn record(&self, reading: SensorReading) {
        let slot = self.slot(&reading.node_id);
        let mut slot = slot.lock().unwrap_or_else(PoisonError::into_inner);
        slot.push(reading.rainfall_mm_per_hr, self.capacity);
        slot.latest = Some(reading);
    }

    /// Returns the node's window, oldest first.
    ///
    /// Reading never creates a node: an id that was never appended yields
    /// `NodeNotFound`.
    pub fn get(&self, node_id: &str) -> Result<Vec<f64>, EngineError> {
        let slot = self
            .existing(node_id)
            .ok_or_else(|| EngineError::NodeNotFound(node_id.to_string()))?;
        let slot = slot.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(slot.window.iter().copied().collect())
    }

    /// Returns the node's latest reading together with its window, read
    /// under a single lock so both belong to the same append.
    pub fn snapshot(&self, node_id: &str) -> Result<(SensorReading, Vec<f64>), EngineError> {
        let slot = self
            .existing(node_id)
            .ok_or_else(|| EngineError::NodeNotFound(node_id.to_string()))?;
        let slot = slot.lock().unwrap_or_else(PoisonError::into_inner);
        let latest = slot
            .latest
            .clone()
            .ok_or_else(|| EngineError::NodeNotFound(node_id.to_string()))?;
        Ok((latest, slot.window.iter().copied().collect()))
    }

    pub fn latest(&self, node_id: &str) -> Option<SensorReading> {
        let slot = self.existing(node_id)?;
        let slot = slot.lock().unwrap_or_else(PoisonError::into_inner);
        slot.latest.clone()
    }

    pub fn contains(&self, node_id: &str) -> bool {
        self.existing(node_id).is_some()
    }

    /// All known node ids, sorted.
    pub fn node_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self
            .nodes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.nodes.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    // --- Window shape -------------------------------------------------------

    #[test]
    fn test_first_append_creates_zero_seeded_window() {
        let store = HistoryStore::new();
        store.append("chennai_adyar", 4.5);
        let window = store.get("chennai_adyar").expect("node was appended");
        assert_eq!(window, vec![0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 4.5]);
    }

    #[test]
    fn test_eight_appends_keep_last_seven_fifo() {
        let store = HistoryStore::new();
        for v in 1..=8 {
            store.append("n1", v as f64);
        }
        let window = store.get("n1").unwrap();
        assert_eq!(window, vec![2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0]);
    }

    #[test]
    fn test_window_length_is_always_capacity() {
        let store = HistoryStore::new();
        for v in 0..20 {
            store.append("n1", v as f64);
            assert_eq!(store.get("n1").unwrap().len(), HISTORY_CAPACITY);
        }
    }

    #[test]
    fn test_duplicate_appends_shift_window() {
        let store = HistoryStore::new();
        store.append("n1", 10.0);
        store.append("n1", 10.0);
        let window = store.get("n1").unwrap();
        assert_eq!(&window[5..], &[10.0, 10.0]);
        assert_eq!(window[4], 0.0);
    }

    // --- Lookup -------------------------------------------------------------

    #[test]
    fn test_get_unknown_node_is_not_found() {
        let store = HistoryStore::new();
        assert_eq!(
            store.get("ghost"),
            Err(EngineError::NodeNotFound("ghost".to_string()))
        );
        assert!(!store.contains("ghost"), "reading must not create a node");
    }

    #[test]
    fn test_record_sets_latest_and_appends() {
        let store = HistoryStore::new();
        store.record(SensorReading::rainfall("n1", 3.0).with_water_level(40.0));
        store.record(SensorReading::rainfall("n1", 7.0));

        let latest = store.latest("n1").expect("latest reading stored");
        assert_eq!(latest.rainfall_mm_per_hr, 7.0);
        assert_eq!(latest.water_level_cm, None, "latest is superseded, not merged");

        let (snap_latest, window) = store.snapshot("n1").unwrap();
        assert_eq!(snap_latest, latest);
        assert_eq!(&window[5..], &[3.0, 7.0]);
    }

    #[test]
    fn test_snapshot_without_latest_reading_is_not_found() {
        let store = HistoryStore::new();
        store.append("n1", 1.0);
        assert!(matches!(store.snapshot("n1"), Err(EngineError::NodeNotFound(_))));
    }

    #[test]
    fn test_node_ids_are_sorted() {
        let store = HistoryStore::new();
        store.append("b", 0.0);
        store.append("a", 0.0);
        assert_eq!(store.node_ids(), vec!["a".to_string(), "b".to_string()]);
        assert_eq!(store.len(), 2);
    }

    // --- Concurrency --------------------------------------------------------

    #[test]
    fn test_concurrent_appends_to_same_node_are_serialized() {
        let store = Arc::new(HistoryStore::with_capacity(1000));
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    for _ in 0..100 {
                        store.append("shared", 1.0);
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        let window = store.get("shared").unwrap();
        assert_eq!(window.len(), 1000);
        assert_eq!(window.iter().sum::<f64>(), 400.0, "no append may be lost");
    }
}
