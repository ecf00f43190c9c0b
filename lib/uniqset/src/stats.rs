use serde::Serialize;

#[derive(Default, Clone, Debug, Serialize)]
pub struct MapStats {
    pub files: usize,
    pub lines_in: u64,
    pub total_emits: u64,
    pub min_task_ms: u64,
    pub max_task_ms: u64,
    pub wall_ms: u64,
}

#[derive(Default, Clone, Debug, Serialize)]
pub struct ReduceStats {
    pub groups: u64,
    pub values_in: u64,
    pub records_out: u64,
    pub write_ms: u64,
    pub wall_ms: u64,
}

/// Per-phase counters of one run, returned to the caller and logged at the end of each phase.
#[derive(Default, Clone, Debug, Serialize)]
pub struct RunSummary {
    pub map: Option<MapStats>,
    pub reduce: Option<ReduceStats>,
}

impl RunSummary {
    pub fn new() -> Self { Self::default() }

    /// `per_task` holds `(lines_in, emits, wall_ms)` for each map task.
    pub fn record_map(&mut self, per_task: &[(u64, u64, u64)], wall_ms: u64) {
        let files = per_task.len();
        let lines_in = per_task.iter().map(|t| t.0).sum();
        let total_emits = per_task.iter().map(|t| t.1).sum();
        let min_task_ms = per_task.iter().map(|t| t.2).min().unwrap_or(0);
        let max_task_ms = per_task.iter().map(|t| t.2).max().unwrap_or(0);
        self.map = Some(MapStats { files, lines_in, total_emits, min_task_ms, max_task_ms, wall_ms });
    }

    pub fn record_reduce(&mut self, stats: ReduceStats) {
        self.reduce = Some(stats);
    }

    pub fn groups(&self) -> u64 {
        self.reduce.as_ref().map(|r| r.groups).unwrap_or(0)
    }
}
