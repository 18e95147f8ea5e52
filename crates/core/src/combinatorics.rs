//! Enumeration, ranking, and unranking of `t`-subsets of `{1..T}`.
//!
//! Subsets are ordered lexicographically by smallest element first, then the
//! next, and so on; `group_id` is the 1-based rank of a subset in that
//! ordering.

use crate::errors::ProtocolError;

/// A process-wide, eagerly computed binomial-coefficient table.
///
/// Computed once via Pascal's triangle up to `total_parties`, per the system
/// design's guidance to replace the C++ prototype's lazily-memoized,
/// globally-mutable `ncr_cache` with an immutable-after-init table.
#[derive(Debug, Clone)]
pub struct Binomial {
    table: Vec<Vec<u64>>,
    max_n: usize,
}

impl Binomial {
    pub fn new(max_n: usize) -> Self {
        let mut table = vec![vec![0u64; max_n + 1]; max_n + 1];
        for n in 0..=max_n {
            table[n][0] = 1;
            for r in 1..=n {
                table[n][r] = if r == n {
                    1
                } else {
                    table[n - 1][r - 1] + table[n - 1][r]
                };
            }
        }
        Self { table, max_n }
    }

    /// `C(n, r)`, or `0` if `r > n`.
    pub fn c(&self, n: usize, r: usize) -> u64 {
        if r > n || n > self.max_n {
            return 0;
        }
        self.table[n][r]
    }
}

/// Canonical lexicographic indexer over `t`-subsets of `{1..total_parties}`.
#[derive(Debug, Clone)]
pub struct GroupIndexer {
    binomial: Binomial,
    total_parties: usize,
    threshold: usize,
}

impl GroupIndexer {
    pub fn new(total_parties: usize, threshold: usize) -> Self {
        Self {
            binomial: Binomial::new(total_parties),
            total_parties,
            threshold,
        }
    }

    /// Total number of groups, `C(T, t)`.
    pub fn group_count(&self) -> usize {
        self.binomial.c(self.total_parties, self.threshold) as usize
    }

    pub fn total_parties(&self) -> usize {
        self.total_parties
    }

    pub fn threshold(&self) -> usize {
        self.threshold
    }

    /// Unranks `group_id` (1-based) into its `t` members, smallest first.
    pub fn unrank(&self, group_id: usize) -> Result<Vec<usize>, ProtocolError> {
        let group_count = self.group_count();
        if group_id == 0 || group_id > group_count {
            return Err(ProtocolError::InvalidParameter);
        }
        let t = self.threshold;
        let total = self.total_parties;
        let mut members = Vec::with_capacity(t);
        let mut remaining_rank = group_id as u64;
        let mut i = 1usize;
        while members.len() < t {
            let chosen_so_far = members.len();
            let skip_weight = self.binomial.c(total - i, t - chosen_so_far - 1);
            if remaining_rank > skip_weight {
                remaining_rank -= skip_weight;
            } else {
                members.push(i);
            }
            i += 1;
        }
        Ok(members)
    }

    /// Ranks a `t`-subset (need not be pre-sorted) into its `group_id` (1-based).
    pub fn rank(&self, members: &[usize]) -> Result<usize, ProtocolError> {
        if members.len() != self.threshold {
            return Err(ProtocolError::InvalidParameter);
        }
        let mut sorted = members.to_vec();
        sorted.sort_unstable();
        sorted.dedup();
        if sorted.len() != self.threshold {
            return Err(ProtocolError::InvalidParameter);
        }
        let t = self.threshold;
        let total = self.total_parties;
        let mut group_id: u64 = 1;
        let mut chosen_so_far = 0usize;
        for i in 1..=total {
            if chosen_so_far == t {
                break;
            }
            if sorted.binary_search(&i).is_ok() {
                chosen_so_far += 1;
            } else {
                group_id += self.binomial.c(total - i, t - chosen_so_far - 1);
            }
        }
        Ok(group_id as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binomial_matches_pascals_triangle() {
        let table = Binomial::new(6);
        assert_eq!(table.c(5, 3), 10);
        assert_eq!(table.c(5, 0), 1);
        assert_eq!(table.c(5, 5), 1);
        assert_eq!(table.c(2, 3), 0);
    }

    #[test]
    fn rank_unrank_bijection_round_trips_every_group() {
        let indexer = GroupIndexer::new(5, 3);
        let group_count = indexer.group_count();
        assert_eq!(group_count, 10);
        for g in 1..=group_count {
            let members = indexer.unrank(g).unwrap();
            assert_eq!(members.len(), 3);
            let mut sorted = members.clone();
            sorted.sort_unstable();
            assert_eq!(members, sorted, "members must already be smallest-first");
            assert_eq!(indexer.rank(&members).unwrap(), g);
        }
    }

    #[test]
    fn rank_sanity_from_seed_scenario_6() {
        let indexer = GroupIndexer::new(5, 3);
        assert_eq!(indexer.rank(&[1, 2, 3]).unwrap(), 1);
        assert_eq!(indexer.rank(&[3, 4, 5]).unwrap(), 10);
        assert_eq!(indexer.unrank(4).unwrap(), vec![1, 3, 4]);
    }

    #[test]
    fn unrank_rejects_out_of_range_group_id() {
        let indexer = GroupIndexer::new(5, 3);
        assert!(indexer.unrank(0).is_err());
        assert!(indexer.unrank(11).is_err());
    }

    #[test]
    fn rank_rejects_wrong_arity_or_duplicates() {
        let indexer = GroupIndexer::new(5, 3);
        assert!(indexer.rank(&[1, 2]).is_err());
        assert!(indexer.rank(&[1, 1, 2]).is_err());
    }
}
