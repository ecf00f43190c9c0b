use crate::api::{ExecutablePipeline, Mapper, Reducer};
use crate::constants::{DEFAULT_OUTPUT_FILE, ENV_OUTPUT_FILE, ENV_RAYON_THREADS, ENV_SEQUENTIAL};
use crate::error::ReduceError;
use crate::io::{list_files_recursive, read_lines, Sink, TextLineSink};
use crate::stats::{ReduceStats, RunSummary};
use crate::utils::{env_parse, env_var_truthy};
use anyhow::{Context, Result};
use rayon::prelude::*;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Display;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, error, info};

#[derive(Clone, Debug)]
pub struct RuntimeConfig {
    /// Worker threads for map tasks and reducer invocations; `None` keeps rayon's default.
    pub threads: Option<usize>,
    /// Run reducer invocations one after another instead of on the pool.
    pub sequential: bool,
    /// File name created inside the output directory.
    pub output_file: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self { threads: None, sequential: false, output_file: DEFAULT_OUTPUT_FILE.to_string() }
    }
}

impl RuntimeConfig {
    pub fn from_env() -> Self {
        Self {
            threads: env_parse::<usize>(ENV_RAYON_THREADS).filter(|&n| n > 0),
            sequential: env_var_truthy(ENV_SEQUENTIAL),
            output_file: std::env::var(ENV_OUTPUT_FILE)
                .ok()
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_OUTPUT_FILE.to_string()),
        }
    }
}

/// Single-process driver: maps every input file, groups pairs by key in memory and runs
/// one reducer invocation per key. The output file appears only if every invocation succeeds.
pub struct LocalPipeline {
    inputs: Vec<String>,
    output: Option<String>,
    config: RuntimeConfig,
}

impl LocalPipeline {
    pub fn new() -> Self { Self { inputs: vec![], output: None, config: RuntimeConfig::from_env() } }

    pub fn with_config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &RuntimeConfig { &self.config }

    pub fn output_path(&self) -> Option<PathBuf> {
        self.output.as_ref().map(|dir| Path::new(dir).join(&self.config.output_file))
    }
}

impl Default for LocalPipeline { fn default() -> Self { Self::new() } }

impl ExecutablePipeline for LocalPipeline {
    fn add_input(&mut self, input_path: impl Into<String>) { self.inputs.push(input_path.into()); }

    fn add_output(&mut self, output_path: impl Into<String>) { self.output = Some(output_path.into()); }

    fn map_reduce<M, R>(&mut self, mapper: M, reducer: R) -> Result<RunSummary>
    where
        M: Mapper<Input = String> + Send + Sync + 'static,
        R: Reducer<Key = M::Key, ValueIn = M::Value> + Send + Sync + 'static,
        R::Out: Display,
    {
        let output_path = self.output_path().context("output not set")?;
        let mut builder = rayon::ThreadPoolBuilder::new();
        if let Some(n) = self.config.threads {
            builder = builder.num_threads(n);
        }
        let pool = builder.build().context("build rayon pool")?;

        // A failed run must not leave an earlier run's output looking current
        if output_path.exists() {
            info!(output = %output_path.display(), "removing previous output");
            fs::remove_file(&output_path).with_context(|| format!("remove {}", output_path.display()))?;
        }

        let mut all_files = Vec::new();
        for inp in &self.inputs {
            let mut files = list_files_recursive(inp)?;
            all_files.append(&mut files);
        }
        info!(
            inputs = self.inputs.len(), files = all_files.len(), threads = pool.current_num_threads(),
            sequential = self.config.sequential, output = %output_path.display(),
            "uniqset starting map phase"
        );

        let sequential = self.config.sequential;
        pool.install(|| -> Result<RunSummary> {
            let mut summary = RunSummary::new();

            // Map phase
            let map_phase_start = Instant::now();
            let per_file: Vec<MapTaskOutput<M::Key, M::Value>> = all_files
                .par_iter()
                .enumerate()
                .map(|(task_id, file)| run_map_task(&mapper, task_id, file))
                .collect::<Result<_>>()?;
            let task_stats: Vec<(u64, u64, u64)> = per_file.iter().map(|t| (t.lines_in, t.pairs.len() as u64, t.wall_ms)).collect();
            summary.record_map(&task_stats, map_phase_start.elapsed().as_millis() as u64);
            if let Some(map) = &summary.map {
                info!(phase = "map",
                      files = map.files, lines_in = map.lines_in, total_emits = map.total_emits,
                      min_task_ms = map.min_task_ms, max_task_ms = map.max_task_ms,
                      wall_ms = map.wall_ms,
                      "Map phase complete");
            }

            // Group phase: stands in for the shuffle, keys come out ascending
            let groups = group_by_key(per_file.into_iter().flat_map(|t| t.pairs));

            // Reduce phase
            let mut sink = TextLineSink::create(&output_path)?;
            match reduce_groups(&reducer, groups, &mut sink, sequential) {
                Ok(stats) => {
                    info!(phase = "reduce",
                          groups = stats.groups, values_in = stats.values_in, records_out = stats.records_out,
                          write_ms = stats.write_ms, wall_ms = stats.wall_ms,
                          "Reduce phase complete");
                    summary.record_reduce(stats);
                    Ok(summary)
                }
                Err(e) => {
                    sink.abort();
                    Err(e)
                }
            }
        })
    }
}

pub fn default_pipeline() -> LocalPipeline { LocalPipeline::new() }

struct MapTaskOutput<K, V> {
    pairs: Vec<(K, V)>,
    lines_in: u64,
    wall_ms: u64,
}

fn run_map_task<M>(mapper: &M, task_id: usize, file: &Path) -> Result<MapTaskOutput<M::Key, M::Value>>
where
    M: Mapper<Input = String>,
{
    let task_start = Instant::now();
    let lines: Vec<String> = read_lines(file)?
        .collect::<io::Result<_>>()
        .with_context(|| format!("read {}", file.display()))?;
    let lines_in = lines.len() as u64;
    let mut pairs = Vec::new();
    mapper.do_map(lines, &mut |k, v| pairs.push((k, v)));
    debug!(task_id, file = %file.display(), lines_in, emits = pairs.len(), "map task done");
    Ok(MapTaskOutput { pairs, lines_in, wall_ms: task_start.elapsed().as_millis() as u64 })
}

/// Groups pairs by key in ascending key order; values keep their arrival order.
pub fn group_by_key<K: Ord, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Vec<(K, Vec<V>)> {
    let mut grouped: BTreeMap<K, Vec<V>> = BTreeMap::new();
    for (k, v) in pairs {
        grouped.entry(k).or_default().push(v);
    }
    grouped.into_iter().collect()
}

/// Runs one reducer invocation per group, then writes every record to `sink` in group order
/// and finishes it. The first failed invocation aborts the whole call before anything is
/// written.
pub fn reduce_groups<R, S>(reducer: &R, groups: Vec<(R::Key, Vec<R::ValueIn>)>, sink: &mut S, sequential: bool) -> Result<ReduceStats>
where
    R: Reducer + Sync,
    S: Sink<R::Out>,
{
    let reduce_start = Instant::now();
    let invoke = |(key, values): (R::Key, Vec<R::ValueIn>)| -> Result<(u64, Vec<R::Out>)> {
        let values_in = values.len() as u64;
        let outs = invoke_buffered(reducer, &key, values.into_iter().map(Ok)).map_err(|e| {
            error!(key = %describe_key(&key), error = %e, "reducer invocation failed");
            anyhow::Error::new(e).context(format!("reduce key {}", describe_key(&key)))
        })?;
        Ok((values_in, outs))
    };
    let groups_len = groups.len() as u64;
    let results: Vec<(u64, Vec<R::Out>)> = if sequential {
        groups.into_iter().map(&invoke).collect::<Result<_>>()?
    } else {
        groups.into_par_iter().map(&invoke).collect::<Result<_>>()?
    };

    let mut stats = ReduceStats { groups: groups_len, ..ReduceStats::default() };
    let mut write_time = Duration::from_nanos(0);
    for (values_in, outs) in results {
        stats.values_in += values_in;
        let w_start = Instant::now();
        for out in outs {
            sink.write(&out).map_err(ReduceError::Emit).context("write output record")?;
            stats.records_out += 1;
        }
        write_time += w_start.elapsed();
    }
    sink.finish().map_err(ReduceError::Emit).context("commit output")?;
    stats.write_ms = write_time.as_millis() as u64;
    stats.wall_ms = reduce_start.elapsed().as_millis() as u64;
    Ok(stats)
}

/// One invocation whose emitted records are kept only if it returns `Ok`.
pub fn invoke_buffered<R, I>(reducer: &R, key: &R::Key, values: I) -> Result<Vec<R::Out>, ReduceError>
where
    R: Reducer,
    I: IntoIterator<Item = io::Result<R::ValueIn>>,
{
    let mut buffered = Vec::new();
    reducer.do_reduce(key, values, &mut |out| {
        buffered.push(out);
        Ok(())
    })?;
    Ok(buffered)
}

fn describe_key<K: Serialize>(key: &K) -> String {
    serde_json::to_string(key).unwrap_or_else(|_| "<unserializable key>".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::VecSink;
    use crate::reduce::{OutputRecord, UniqueValuesReducer};

    fn groups(input: &[(&str, &[&str])]) -> Vec<(String, Vec<String>)> {
        input
            .iter()
            .map(|(k, vs)| (k.to_string(), vs.iter().map(|v| v.to_string()).collect()))
            .collect()
    }

    #[test]
    fn grouping_orders_keys_and_keeps_value_order() {
        let grouped = group_by_key(vec![("b", 1), ("a", 2), ("b", 3), ("a", 4)]);
        assert_eq!(grouped, vec![("a", vec![2, 4]), ("b", vec![1, 3])]);
    }

    #[test]
    fn one_record_per_group_in_order() {
        let reducer = UniqueValuesReducer::<String>::new();
        let mut sink = VecSink::default();
        for sequential in [true, false] {
            sink.records.clear();
            let stats = reduce_groups(
                &reducer,
                groups(&[("cat", &["meow", "meow", "purr"]), ("dog", &[]), ("x", &["a"]), ("y", &["a", "a", "a", "a"])]),
                &mut sink,
                sequential,
            )
            .unwrap();
            assert_eq!(stats.groups, 4);
            assert_eq!(stats.values_in, 8);
            assert_eq!(stats.records_out, 4);
            let rendered: Vec<(String, String)> = sink.records.iter().map(|r: &OutputRecord<String>| (r.key.clone(), r.value.clone())).collect();
            assert_eq!(
                rendered,
                vec![
                    ("cat".to_string(), "[meow, purr]".to_string()),
                    ("dog".to_string(), "[]".to_string()),
                    ("x".to_string(), "[a]".to_string()),
                    ("y".to_string(), "[a]".to_string()),
                ]
            );
            assert!(sink.finished);
        }
    }

    struct FailingSink;

    impl<T> Sink<T> for FailingSink {
        fn write(&mut self, _record: &T) -> io::Result<()> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "disk gone"))
        }
        fn finish(&mut self) -> io::Result<()> { Ok(()) }
    }

    #[test]
    fn sink_failure_surfaces_as_emit_error() {
        let reducer = UniqueValuesReducer::<String>::new();
        let err = reduce_groups(&reducer, groups(&[("cat", &["meow"])]), &mut FailingSink, true).unwrap_err();
        let reduce_err = err.downcast_ref::<ReduceError>().expect("ReduceError in chain");
        assert!(reduce_err.is_emit());
    }

    #[test]
    fn buffered_invocation_drops_partial_output() {
        let reducer = UniqueValuesReducer::<String>::new();
        let values = vec![Ok("a".to_string()), Err(io::Error::new(io::ErrorKind::Interrupted, "interrupted"))];
        let err = invoke_buffered(&reducer, &"k".to_string(), values).unwrap_err();
        assert!(err.is_input());
    }

    #[test]
    fn config_defaults() {
        let config = RuntimeConfig::default();
        assert_eq!(config.output_file, DEFAULT_OUTPUT_FILE);
        assert!(!config.sequential);
        assert!(config.threads.is_none());
    }
}
