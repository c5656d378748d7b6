use std::{
    collections::BTreeMap,
    fmt::Display,
    sync::{Arc, Mutex},
    time::Instant,
};

use lazy_static::lazy_static;

/// A shared node of the hierarchical timing statistics.
pub type StatsNode = Arc<Mutex<Stats>>;

lazy_static! {
    static ref ROOT_STATS: StatsNode = Arc::new(Mutex::new(Stats::new(1)));
}

/// Hierarchical timing statistics, e.g., for the build and the query phase.
pub struct Stats {
    /// The hierarchical depth of the stats node
    depth: usize,

    /// The accumulated timings of the node in nanoseconds
    timings_ns: u128,

    /// The number of recorded timings
    num_recordings: usize,

    /// Further children timings ordered by their name
    children: BTreeMap<String, StatsNode>,
}

/// Guard that adds the time elapsed since its creation to the stats node when dropped.
pub struct TimeRecording {
    dst_node: StatsNode,
    t0: Instant,
}

pub trait StatsNodeTrait {
    /// Starts a timing that is recorded into this node once the returned guard is dropped.
    fn register_timing(&self) -> TimeRecording;

    /// Returns the child node with the given name and creates it if needed.
    fn get_child(&self, name: &str) -> StatsNode;
}

impl TimeRecording {
    pub fn new(dst_node: StatsNode) -> Self {
        let t0 = Instant::now();

        Self { dst_node, t0 }
    }
}

impl Drop for TimeRecording {
    #[inline]
    fn drop(&mut self) {
        let ns = self.t0.elapsed().as_nanos();

        // a poisoned lock only means another recording panicked, the counters stay usable
        let mut node = self
            .dst_node
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        node.timings_ns += ns;
        node.num_recordings += 1;
    }
}

impl Stats {
    /// Returns the root stats node
    #[inline]
    pub fn root() -> StatsNode {
        ROOT_STATS.clone()
    }

    /// Creates a new detached root node, e.g., for collecting the stats of a single run.
    pub fn new_root() -> StatsNode {
        Arc::new(Mutex::new(Stats::new(1)))
    }

    /// Returns a children time node for the given identifier.
    ///
    /// # Arguments
    /// * `name` - The name of the children time.
    #[inline]
    pub fn get_child(&mut self, name: String) -> StatsNode {
        let depth = self.depth + 1;
        self.children
            .entry(name)
            .or_insert_with(|| Arc::new(Mutex::new(Stats::new(depth))))
            .clone()
    }

    /// Returns the elapsed time of the node in nano-seconds
    #[inline]
    pub fn as_nanos(&self) -> u128 {
        self.timings_ns
    }

    /// Returns the elapsed time of the node in milli-seconds
    #[inline]
    pub fn as_millis(&self) -> u128 {
        self.timings_ns / 1000000u128
    }

    /// Returns the number of recorded timings
    #[inline]
    pub fn num_recordings(&self) -> usize {
        self.num_recordings
    }

    /// Internal function for creating a new time node.
    fn new(depth: usize) -> Self {
        Self {
            depth,
            timings_ns: 0u128,
            num_recordings: 0,
            children: BTreeMap::new(),
        }
    }
}

impl Display for Stats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let ms = self.timings_ns as f64 / 1e6f64;

        if self.children.is_empty() {
            return writeln!(f, "{:.3} ms ({}x),", ms, self.num_recordings);
        }

        if self.num_recordings == 0 {
            writeln!(f, "{{")?;
        } else {
            writeln!(f, "{:.3} ms ({}x) {{", ms, self.num_recordings)?;
        }

        for (name, child) in self.children.iter() {
            write!(f, "{:indent$}{}: ", "", name, indent = self.depth * 2)?;

            match child.lock() {
                Ok(child) => child.fmt(f)?,
                Err(_) => writeln!(f, "<unavailable>,")?,
            }
        }

        writeln!(f, "}},")
    }
}

impl StatsNodeTrait for StatsNode {
    #[inline]
    fn register_timing(&self) -> TimeRecording {
        TimeRecording::new(self.clone())
    }

    #[inline]
    fn get_child(&self, name: &str) -> StatsNode {
        self.lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get_child(name.to_owned())
    }
}
