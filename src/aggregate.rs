use crate::extract::Extraction;
use log::trace;
use std::{collections::HashMap, hash::Hash};

/// Occurrence count for one key, along with when the key was first seen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Tally {
    count: u64,
    first_seen: u64,
}

/// Counts of each distinct key. Ranking ties are broken by first-seen order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrequencyTable<K: Eq + Hash> {
    tallies: HashMap<K, Tally>,
    next_seen: u64,
}

/// One `(key, count)` row of a ranking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankedEntry<K> {
    pub key: K,
    pub count: u64,
}

impl<K: Eq + Hash> Default for FrequencyTable<K> {
    fn default() -> Self {
        Self {
            tallies: HashMap::new(),
            next_seen: 0,
        }
    }
}

impl<K: Eq + Hash + Clone> FrequencyTable<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bump the count for `key`, inserting it with a count of one if it's new.
    pub fn increment(&mut self, key: K) {
        let next_seen = &mut self.next_seen;
        self.tallies
            .entry(key)
            .or_insert_with(|| {
                let tally = Tally {
                    count: 0,
                    first_seen: *next_seen,
                };
                *next_seen += 1;
                tally
            })
            .count += 1;
    }

    pub fn get(&self, key: &K) -> u64 {
        self.tallies.get(key).map_or(0, |t| t.count)
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.tallies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tallies.is_empty()
    }

    /// Sum of all counts.
    pub fn total(&self) -> u64 {
        self.tallies.values().map(|t| t.count).sum()
    }

    /// Entries sorted by count, highest first, with ties in first-seen order.
    /// With `Some(limit)` at most `limit` entries come back, otherwise all of them do.
    pub fn rank(&self, limit: Option<usize>) -> Vec<RankedEntry<K>> {
        let mut entries: Vec<_> = self.tallies.iter().collect();
        entries.sort_by(|(_, a), (_, b)| b.count.cmp(&a.count).then(a.first_seen.cmp(&b.first_seen)));
        entries
            .into_iter()
            .take(limit.unwrap_or(usize::MAX))
            .map(|(key, tally)| RankedEntry {
                key: key.clone(),
                count: tally.count,
            })
            .collect()
    }

    /// Entries sorted by key instead of by count.
    pub fn by_key(&self) -> Vec<RankedEntry<K>>
    where
        K: Ord,
    {
        let mut entries: Vec<_> = self
            .tallies
            .iter()
            .map(|(key, tally)| RankedEntry {
                key: key.clone(),
                count: tally.count,
            })
            .collect();
        entries.sort_by(|a, b| a.key.cmp(&b.key));
        entries
    }
}

/// All four frequency tables plus the line counter. Only reachable read-only once built.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AggregateState {
    total_requests: u64,
    addresses: FrequencyTable<String>,
    statuses: FrequencyTable<String>,
    request_targets: FrequencyTable<String>,
    hours: FrequencyTable<u32>,
}

impl AggregateState {
    /// Every line observed, whether or not anything matched in it.
    pub fn total_requests(&self) -> u64 {
        self.total_requests
    }

    pub fn addresses(&self) -> &FrequencyTable<String> {
        &self.addresses
    }

    pub fn statuses(&self) -> &FrequencyTable<String> {
        &self.statuses
    }

    pub fn request_targets(&self) -> &FrequencyTable<String> {
        &self.request_targets
    }

    pub fn hours(&self) -> &FrequencyTable<u32> {
        &self.hours
    }
}

/// Single-pass accumulator over a stream of log lines.
#[derive(Debug, Default)]
pub struct Aggregator {
    state: AggregateState,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one line, then count each field that could be extracted from it.
    pub fn observe(&mut self, line: &str) {
        self.state.total_requests += 1;
        self.record(Extraction::from_line(line));
    }

    fn record(&mut self, extraction: Extraction) {
        if extraction.is_empty() {
            trace!("line {} matched no fields", self.state.total_requests);
        }
        let Extraction {
            address,
            status,
            request_target,
            hour,
        } = extraction;
        if let Some(address) = address {
            self.state.addresses.increment(address);
        }
        if let Some(status) = status {
            self.state.statuses.increment(status);
        }
        if let Some(request_target) = request_target {
            self.state.request_targets.increment(request_target);
        }
        if let Some(hour) = hour {
            self.state.hours.increment(hour);
        }
    }

    /// Read-only view of the state accumulated so far.
    pub fn snapshot(&self) -> &AggregateState {
        &self.state
    }

    /// Stop accepting lines and hand back the final state.
    pub fn finish(self) -> AggregateState {
        self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use maplit::hashmap;

    const LINES: &[&str] = &[
        r#"10.0.0.1 - - [10/Oct/2023:13:55:36 +0000] "GET /index.html HTTP/1.1" 200 1024"#,
        r#"10.0.0.2 - - [10/Oct/2023:13:56:01 +0000] "GET /about HTTP/1.1" 404 0"#,
        r#"10.0.0.1 - - [10/Oct/2023:14:02:11 +0000] "POST /login HTTP/1.1" 302 0"#,
        "complete garbage",
        r#"cdn.example - - [32/Xyz/2023:99:00:00 +0000] "GET /index.html HTTP/1.1" 200 88"#,
    ];

    fn table_from(keys: &[&str]) -> FrequencyTable<String> {
        let mut table = FrequencyTable::new();
        for key in keys {
            table.increment(key.to_string());
        }
        table
    }

    fn aggregate(lines: &[&str]) -> AggregateState {
        let mut aggregator = Aggregator::new();
        for line in lines {
            aggregator.observe(line);
        }
        aggregator.finish()
    }

    #[test]
    fn test_every_line_is_counted() {
        let mut aggregator = Aggregator::new();
        for (i, line) in LINES.iter().enumerate() {
            aggregator.observe(line);
            assert_eq!(aggregator.snapshot().total_requests(), i as u64 + 1);
        }
        let state = aggregator.finish();
        assert_eq!(state.total_requests(), 5);
        assert!(state.addresses().total() <= state.total_requests());
        assert!(state.statuses().total() <= state.total_requests());
        assert!(state.request_targets().total() <= state.total_requests());
        assert!(state.hours().total() <= state.total_requests());
    }

    #[test]
    fn test_tables() {
        let state = aggregate(LINES);
        let counts = |table: &FrequencyTable<String>| -> HashMap<String, u64> {
            table.rank(None).into_iter().map(|e| (e.key, e.count)).collect()
        };
        assert_eq!(counts(state.addresses()), hashmap! { "10.0.0.1".to_string() => 2, "10.0.0.2".to_string() => 1 });
        assert_eq!(
            counts(state.statuses()),
            hashmap! { "200".to_string() => 2, "404".to_string() => 1, "302".to_string() => 1 }
        );
        assert_eq!(
            counts(state.request_targets()),
            hashmap! { "/index.html".to_string() => 2, "/about".to_string() => 1, "/login".to_string() => 1 }
        );
        assert_eq!(state.hours().get(&13), 2);
        assert_eq!(state.hours().get(&14), 1);
        assert_eq!(state.hours().total(), 3);
    }

    #[test]
    fn test_rank_ties_use_first_seen_order() {
        let table = table_from(&["c", "b", "a", "b", "a", "c", "a", "b", "a", "b", "a", "b"]);
        // a:5, b:5, c:2 with b seen before a
        let ranked = table.rank(Some(2));
        assert_eq!(
            ranked,
            vec![
                RankedEntry {
                    key: "b".to_string(),
                    count: 5
                },
                RankedEntry {
                    key: "a".to_string(),
                    count: 5
                },
            ]
        );
        assert_eq!(table.rank(Some(2)), ranked);
    }

    #[test]
    fn test_rank_limit() {
        let table = table_from(&["a", "a", "a", "a", "a", "b", "b", "b", "b", "b", "c", "c", "c"]);
        assert_eq!(table.rank(Some(2)).len(), 2);
        assert!(table.rank(Some(2)).iter().all(|e| e.count == 5));
        assert!(table.rank(Some(0)).is_empty());
        assert_eq!(table.rank(Some(10)).len(), 3);
        let all = table.rank(None);
        assert_eq!(all.len(), 3);
        assert_eq!(
            all[2],
            RankedEntry {
                key: "c".to_string(),
                count: 3
            }
        );
    }

    #[test]
    fn test_same_stream_same_state() {
        assert_eq!(aggregate(LINES), aggregate(LINES));
        assert_eq!(aggregate(LINES).addresses().rank(Some(10)), aggregate(LINES).addresses().rank(Some(10)));
    }

    #[test]
    fn test_status_rank_is_complete() {
        let state = aggregate(LINES);
        let statuses = state.statuses().rank(None);
        assert_eq!(statuses.len(), state.statuses().len());
        assert_eq!(
            statuses[0],
            RankedEntry {
                key: "200".to_string(),
                count: 2
            }
        );
        assert!(statuses.iter().map(|e| e.count).sum::<u64>() <= state.total_requests());
    }

    #[test]
    fn test_by_key() {
        let mut hours = FrequencyTable::new();
        for hour in [23, 4, 4, 11] {
            hours.increment(hour);
        }
        let keys: Vec<_> = hours.by_key().into_iter().map(|e| (e.key, e.count)).collect();
        assert_eq!(keys, vec![(4, 2), (11, 1), (23, 1)]);
    }

    #[test]
    fn test_empty_state() {
        let state = Aggregator::new().finish();
        assert_eq!(state.total_requests(), 0);
        assert!(state.addresses().is_empty());
        assert!(state.statuses().rank(None).is_empty());
    }
}
