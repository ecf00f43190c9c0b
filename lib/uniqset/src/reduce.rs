use crate::api::Reducer;
use crate::error::ReduceError;
use crate::set::ValueSet;
use serde::Serialize;
use std::fmt;
use std::io;
use std::marker::PhantomData;

/// One output line: the grouping key and the rendered set of its distinct values.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct OutputRecord<K> {
    pub key: K,
    pub value: String,
}

/// TSV line: JSON-encoded key, a tab, then the rendered set as-is.
impl<K: Serialize> fmt::Display for OutputRecord<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let key = serde_json::to_string(&self.key).map_err(|_| fmt::Error)?;
        write!(f, "{}\t{}", key, self.value)
    }
}

/// Collects every value for `key` into a set and returns the single output record.
///
/// The sequence is consumed exactly once. The first `Err` it yields aborts the call.
pub fn aggregate<K, I>(key: K, values: I) -> Result<OutputRecord<K>, ReduceError>
where
    I: IntoIterator<Item = io::Result<String>>,
{
    let mut unique = ValueSet::new();
    for value in values {
        unique.insert(value.map_err(ReduceError::Input)?);
    }
    Ok(OutputRecord { key, value: unique.render() })
}

pub struct UniqueValuesReducer<K = String> {
    _key: PhantomData<fn() -> K>,
}

impl<K> UniqueValuesReducer<K> {
    pub fn new() -> Self {
        Self { _key: PhantomData }
    }
}

impl<K> Default for UniqueValuesReducer<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K> Reducer for UniqueValuesReducer<K>
where
    K: Send + Sync + Serialize + Ord + Clone + 'static,
{
    type Key = K;
    type ValueIn = String;
    type Out = OutputRecord<K>;

    fn do_reduce<I, F>(&self, key: &Self::Key, values: I, emit: &mut F) -> Result<(), ReduceError>
    where
        I: IntoIterator<Item = io::Result<Self::ValueIn>>,
        F: FnMut(Self::Out) -> io::Result<()>,
    {
        let record = aggregate(key.clone(), values)?;
        emit(record).map_err(ReduceError::Emit)
    }
}
