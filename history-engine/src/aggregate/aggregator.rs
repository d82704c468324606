//! The generic per-analyzer aggregator: coalesces a stream of TCs into
//! per-tick payloads, spilling to disk under a memory budget (spec §4.3).

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::Serialize;

use history_core::errors::AggregatorError;
use history_core::ids::Tick;
use history_core::tc::{Tc, TickPayload};
use history_core::types::FxHashMap;

use super::spill_store::SpillStore;

/// The three type functions plus `extract` that parameterize one
/// aggregator instance, implemented once per analyzer's state type.
pub trait AggregatorSpec: Send {
    type Contribution: Send + 'static;
    type State: Default + Clone + Send + Serialize + DeserializeOwned + 'static;

    /// Folds one TC's contribution into the in-memory `tick -> State` map.
    /// Analyzers that key by commit hash wrap a hash-hex -> record map in
    /// `State` and insert rather than merge within one tick.
    fn extract(&self, by_tick: &mut FxHashMap<Tick, Self::State>, tc: Tc<Self::Contribution>);

    /// Associative, commutative, idempotent on equal inputs.
    fn merge(existing: Self::State, incoming: Self::State) -> Self::State;

    /// Coarse upper-bound byte estimate, used to trigger `Spill`.
    fn size(state: &Self::State) -> u64;

    /// Produces the final TICK envelope for one tick. May return
    /// `{tick, data: None}` when `state` is empty.
    fn build(&self, tick: Tick, state: Self::State) -> TickPayload<Self::State>;
}

/// Checkpointable spill location + segment count (spec §4.8).
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct SpillState {
    pub dir: std::path::PathBuf,
    pub count: usize,
}

pub struct Aggregator<Spec: AggregatorSpec> {
    spec: Spec,
    in_memory: FxHashMap<Tick, Spec::State>,
    spill_budget: u64,
    spill: SpillStore,
}

impl<Spec: AggregatorSpec> Aggregator<Spec> {
    pub fn new(spec: Spec, spill_budget: u64, spill_dir: impl Into<std::path::PathBuf>) -> Result<Self, AggregatorError> {
        Ok(Self {
            spec,
            in_memory: FxHashMap::default(),
            spill_budget,
            spill: SpillStore::new(spill_dir)?,
        })
    }

    fn size_total(&self) -> u64 {
        self.in_memory.values().map(Spec::size).sum()
    }

    /// Folds one TC; spills automatically when the in-memory size exceeds
    /// the configured budget.
    pub fn add(&mut self, tc: Tc<Spec::Contribution>) -> Result<(), AggregatorError> {
        if tc.is_empty() {
            return Ok(());
        }
        self.spec.extract(&mut self.in_memory, tc);
        if self.spill_budget > 0 && self.size_total() > self.spill_budget {
            self.spill()?;
        }
        Ok(())
    }

    /// Serializes the in-memory map to a fresh on-disk segment and clears
    /// it, returning the number of bytes freed.
    pub fn spill(&mut self) -> Result<u64, AggregatorError> {
        if self.in_memory.is_empty() {
            return Ok(0);
        }
        let freed = self.size_total();
        let records = std::mem::take(&mut self.in_memory)
            .into_iter()
            .map(|(tick, state)| encode_entry(tick, &state))
            .collect::<Result<Vec<_>, AggregatorError>>()?;
        self.spill.write_segment(records)?;
        Ok(freed)
    }

    /// Merges every on-disk segment into the in-memory map under `merge`.
    /// After `collect`, disk is empty.
    pub fn collect(&mut self) -> Result<(), AggregatorError> {
        if self.spill.is_empty() {
            return Ok(());
        }
        for (key, value) in self.spill.drain()? {
            let tick = decode_tick(&key)?;
            let incoming: Spec::State = decode_value(&value)?;
            self.in_memory
                .entry(tick)
                .and_modify(|existing| {
                    let taken = std::mem::take(existing);
                    *existing = Spec::merge(taken, incoming.clone());
                })
                .or_insert(incoming);
        }
        Ok(())
    }

    /// Produces the TICK for one tick, after collecting any spilled state.
    pub fn flush_tick(&mut self, tick: Tick) -> Result<Option<TickPayload<Spec::State>>, AggregatorError> {
        self.collect()?;
        let state = self.in_memory.remove(&tick).unwrap_or_default();
        Ok(Some(self.spec.build(tick, state)))
    }

    /// Produces every outstanding TICK, strictly ascending in tick index
    /// (spec §4.4 ordering guarantee).
    pub fn flush_all_ticks(&mut self) -> Result<Vec<TickPayload<Spec::State>>, AggregatorError> {
        self.collect()?;
        let ordered: BTreeMap<Tick, Spec::State> = std::mem::take(&mut self.in_memory).into_iter().collect();
        Ok(ordered
            .into_iter()
            .map(|(tick, state)| self.spec.build(tick, state))
            .collect())
    }

    /// Clears everything in memory and on disk.
    pub fn discard_state(&mut self) -> Result<(), AggregatorError> {
        self.in_memory.clear();
        self.spill.clear()
    }

    pub fn estimated_state_size(&self) -> u64 {
        self.size_total()
    }

    pub fn spill_state(&self) -> SpillState {
        SpillState {
            dir: self.spill.dir().to_path_buf(),
            count: self.spill.segment_count(),
        }
    }

    pub fn restore_spill_state(&mut self, info: SpillState) -> Result<(), AggregatorError> {
        self.spill = SpillStore::restore(info.dir, info.count)?;
        Ok(())
    }

    /// Idempotent; removes spill files.
    pub fn close(&mut self) -> Result<(), AggregatorError> {
        self.spill.clear()
    }

    pub fn spec(&self) -> &Spec {
        &self.spec
    }
}

fn encode_entry<S: Serialize>(tick: Tick, state: &S) -> Result<(Vec<u8>, Vec<u8>), AggregatorError> {
    let value = bincode::serialize(state).map_err(|e| AggregatorError::Spill {
        path: "<in-memory encode>".to_string(),
        message: e.to_string(),
    })?;
    Ok((tick.get().to_le_bytes().to_vec(), value))
}

fn decode_tick(key: &[u8]) -> Result<Tick, AggregatorError> {
    let bytes: [u8; 4] = key.try_into().map_err(|_| AggregatorError::Collect {
        path: "<segment key>".to_string(),
        message: "malformed tick key".to_string(),
    })?;
    Ok(Tick(u32::from_le_bytes(bytes)))
}

fn decode_value<S: DeserializeOwned>(value: &[u8]) -> Result<S, AggregatorError> {
    bincode::deserialize(value).map_err(|e| AggregatorError::Collect {
        path: "<segment value>".to_string(),
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Default, serde::Serialize, serde::Deserialize)]
    struct Counter(u64);

    struct CounterSpec;

    impl AggregatorSpec for CounterSpec {
        type Contribution = u64;
        type State = Counter;

        fn extract(&self, by_tick: &mut FxHashMap<Tick, Counter>, tc: Tc<u64>) {
            if let Some(value) = tc.data {
                by_tick.entry(tc.tick).or_default().0 += value;
            }
        }

        fn merge(existing: Counter, incoming: Counter) -> Counter {
            Counter(existing.0 + incoming.0)
        }

        fn size(state: &Counter) -> u64 {
            let _ = state;
            8
        }

        fn build(&self, tick: Tick, state: Counter) -> TickPayload<Counter> {
            if state.0 == 0 {
                TickPayload::empty(tick)
            } else {
                TickPayload::with_data(tick, state)
            }
        }
    }

    fn commit_hash(b: u8) -> history_core::ids::Hash {
        history_core::ids::Hash::from_bytes([b; 20])
    }

    #[test]
    fn add_and_flush_all_ticks_sums_contributions() {
        let dir = tempfile::tempdir().unwrap();
        let mut agg = Aggregator::new(CounterSpec, 1_000_000, dir.path()).unwrap();
        agg.add(Tc::with_data(Tick(0), commit_hash(1), 3)).unwrap();
        agg.add(Tc::with_data(Tick(0), commit_hash(2), 4)).unwrap();
        agg.add(Tc::with_data(Tick(1), commit_hash(3), 10)).unwrap();

        let ticks = agg.flush_all_ticks().unwrap();
        assert_eq!(ticks.len(), 2);
        assert_eq!(ticks[0].tick, Tick(0));
        assert_eq!(ticks[0].data.as_ref().unwrap().0, 7);
        assert_eq!(ticks[1].data.as_ref().unwrap().0, 10);
    }

    #[test]
    fn spill_then_collect_is_equivalent_to_no_spill() {
        let dir = tempfile::tempdir().unwrap();
        let mut agg = Aggregator::new(CounterSpec, 0, dir.path()).unwrap();
        for i in 0..20u64 {
            agg.add(Tc::with_data(Tick(0), commit_hash(i as u8), i)).unwrap();
        }
        let ticks = agg.flush_all_ticks().unwrap();
        let expected: u64 = (0..20).sum();
        assert_eq!(ticks[0].data.as_ref().unwrap().0, expected);
    }

    #[test]
    fn empty_tc_is_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let mut agg = Aggregator::new(CounterSpec, 1_000_000, dir.path()).unwrap();
        agg.add(Tc::empty(Tick(0), commit_hash(1))).unwrap();
        let ticks = agg.flush_all_ticks().unwrap();
        assert!(ticks.is_empty());
    }

    #[test]
    fn discard_state_clears_memory_and_disk() {
        let dir = tempfile::tempdir().unwrap();
        let mut agg = Aggregator::new(CounterSpec, 0, dir.path()).unwrap();
        agg.add(Tc::with_data(Tick(0), commit_hash(1), 5)).unwrap();
        agg.discard_state().unwrap();
        let ticks = agg.flush_all_ticks().unwrap();
        assert!(ticks.is_empty());
    }
}
