// In-place comparison sorts over bid sequences.
// Quicksort uses a middle-index Hoare partition; selection sort scans for the
// minimum. Neither is stable. Element access is bounds-checked so a bad range
// surfaces as an Index error instead of a panic.
use serde::Serialize;

use crate::core::error::{Error, ErrorKind, index_error};
use crate::core::record::Bid;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum SortKey {
    Id,
    Title,
    Fund,
}

impl SortKey {
    /// The bid field this key compares.
    pub fn field(self, bid: &Bid) -> &str {
        match self {
            SortKey::Id => &bid.bid_id,
            SortKey::Title => &bid.title,
            SortKey::Fund => &bid.fund,
        }
    }

    /// Lowercase name as accepted by `--by`.
    pub fn name(self) -> &'static str {
        match self {
            SortKey::Id => "id",
            SortKey::Title => "title",
            SortKey::Fund => "fund",
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Algorithm {
    Quick,
    Selection,
}

impl Algorithm {
    /// Lowercase name as accepted by `--algo`.
    pub fn name(self) -> &'static str {
        match self {
            Algorithm::Quick => "quick",
            Algorithm::Selection => "selection",
        }
    }
}

/// Work counters for one sort call.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize)]
pub struct SortStats {
    pub records: usize,
    pub comparisons: u64,
    pub swaps: u64,
}

struct Sorter<'a> {
    seq: &'a mut [Bid],
    key: SortKey,
    stats: SortStats,
}

impl<'a> Sorter<'a> {
    fn new(seq: &'a mut [Bid], key: SortKey) -> Self {
        let records = seq.len();
        Self {
            seq,
            key,
            stats: SortStats {
                records,
                ..SortStats::default()
            },
        }
    }

    fn field(&self, index: usize) -> Result<&str, Error> {
        self.seq
            .get(index)
            .map(|bid| self.key.field(bid))
            .ok_or_else(|| index_error("record", index, self.seq.len()))
    }

    fn less(&mut self, a: usize, b: usize) -> Result<bool, Error> {
        self.stats.comparisons += 1;
        Ok(self.field(a)? < self.field(b)?)
    }

    fn swap(&mut self, a: usize, b: usize) -> Result<(), Error> {
        let len = self.seq.len();
        if a >= len || b >= len {
            return Err(index_error("record", a.max(b), len));
        }
        self.seq.swap(a, b);
        self.stats.swaps += 1;
        Ok(())
    }

    // Recurse into the smaller half and loop on the larger one, so stack depth
    // stays logarithmic even when every partition is lopsided.
    fn quick_sort(&mut self, mut begin: usize, mut end: usize) -> Result<(), Error> {
        while begin < end {
            let split = self.partition(begin, end)?;
            if split - begin < end - split {
                self.quick_sort(begin, split)?;
                begin = split + 1;
            } else {
                self.quick_sort(split + 1, end)?;
                end = split;
            }
        }
        Ok(())
    }

    // Every comparison reads the record currently at `pivot`. When a swap moves
    // that record, `pivot` moves with it; a pivot index left in place would
    // compare against whichever record landed there and can leave the range
    // unsorted.
    fn partition(&mut self, begin: usize, end: usize) -> Result<usize, Error> {
        let mut low = begin;
        let mut high = end;
        let mut pivot = begin + (end - begin) / 2;

        loop {
            while self.less(low, pivot)? {
                low += 1;
                if low > end {
                    return Err(cursor_error(low, begin, end));
                }
            }
            while self.less(pivot, high)? {
                high = match high.checked_sub(1) {
                    Some(next) if next >= begin => next,
                    _ => return Err(cursor_error(high, begin, end)),
                };
            }

            if low >= high {
                return Ok(high);
            }

            self.swap(low, high)?;
            if pivot == low {
                pivot = high;
            } else if pivot == high {
                pivot = low;
            }
            low += 1;
            high -= 1;
        }
    }

    fn selection_sort(&mut self) {
        let len = self.seq.len();
        for pos in 0..len {
            let mut min = pos;
            for candidate in pos + 1..len {
                self.stats.comparisons += 1;
                if self.key.field(&self.seq[candidate]) < self.key.field(&self.seq[min]) {
                    min = candidate;
                }
            }
            if min != pos {
                self.seq.swap(pos, min);
                self.stats.swaps += 1;
            }
        }
    }
}

fn cursor_error(cursor: usize, begin: usize, end: usize) -> Error {
    Error::new(ErrorKind::Index).with_message(format!(
        "partition cursor {cursor} left range [{begin}, {end}]"
    ))
}

fn check_range(seq: &[Bid], begin: usize, end: usize) -> Result<(), Error> {
    for index in [begin, end] {
        if index >= seq.len() {
            return Err(index_error("sort range", index, seq.len()));
        }
    }
    Ok(())
}

/// Quicksort `seq[begin..=end]` by title.
pub fn quick_sort(seq: &mut [Bid], begin: usize, end: usize) -> Result<(), Error> {
    quick_sort_by(seq, begin, end, SortKey::Title).map(|_| ())
}

/// Quicksort `seq[begin..=end]` by `key`. Both bounds must index into `seq`.
pub fn quick_sort_by(
    seq: &mut [Bid],
    begin: usize,
    end: usize,
    key: SortKey,
) -> Result<SortStats, Error> {
    check_range(seq, begin, end)?;
    let mut sorter = Sorter::new(seq, key);
    sorter.quick_sort(begin, end)?;
    Ok(sorter.stats)
}

/// Quicksort the whole sequence by title.
pub fn quick_sort_all(seq: &mut [Bid]) -> Result<(), Error> {
    quick_sort_all_by(seq, SortKey::Title).map(|_| ())
}

pub fn quick_sort_all_by(seq: &mut [Bid], key: SortKey) -> Result<SortStats, Error> {
    if seq.len() < 2 {
        return Ok(SortStats {
            records: seq.len(),
            ..SortStats::default()
        });
    }
    let end = seq.len() - 1;
    quick_sort_by(seq, 0, end, key)
}

pub fn selection_sort(seq: &mut [Bid], key: SortKey) -> SortStats {
    let mut sorter = Sorter::new(seq, key);
    sorter.selection_sort();
    sorter.stats
}

pub fn selection_sort_by_id(seq: &mut [Bid]) -> SortStats {
    selection_sort(seq, SortKey::Id)
}

pub fn selection_sort_by_title(seq: &mut [Bid]) -> SortStats {
    selection_sort(seq, SortKey::Title)
}

pub fn selection_sort_by_fund(seq: &mut [Bid]) -> SortStats {
    selection_sort(seq, SortKey::Fund)
}

pub fn sort_records(seq: &mut [Bid], key: SortKey, algorithm: Algorithm) -> Result<SortStats, Error> {
    match algorithm {
        Algorithm::Quick => quick_sort_all_by(seq, key),
        Algorithm::Selection => Ok(selection_sort(seq, key)),
    }
}

pub fn is_sorted_by(seq: &[Bid], key: SortKey) -> bool {
    seq.windows(2)
        .all(|pair| key.field(&pair[0]) <= key.field(&pair[1]))
}

#[cfg(test)]
mod tests {
    use super::{
        Algorithm, SortKey, is_sorted_by, quick_sort, quick_sort_all, quick_sort_all_by,
        quick_sort_by, selection_sort, selection_sort_by_fund, selection_sort_by_id,
        selection_sort_by_title, sort_records,
    };
    use crate::core::error::ErrorKind;
    use crate::core::record::Bid;

    fn bid(id: &str, title: &str, fund: &str) -> Bid {
        Bid::new(id, title, fund, "$1.00")
    }

    fn titles(seq: &[Bid]) -> Vec<&str> {
        seq.iter().map(|bid| bid.title.as_str()).collect()
    }

    fn fields(seq: &[Bid], key: SortKey) -> Vec<&str> {
        seq.iter().map(|bid| key.field(bid)).collect()
    }

    fn canonical(seq: &[Bid]) -> Vec<(String, String, String)> {
        let mut out: Vec<_> = seq
            .iter()
            .map(|bid| (bid.bid_id.clone(), bid.title.clone(), bid.fund.clone()))
            .collect();
        out.sort();
        out
    }

    // Small deterministic generator so sequences are reproducible.
    struct Lcg(u64);

    impl Lcg {
        fn next(&mut self) -> u64 {
            self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            self.0 >> 33
        }

        fn word(&mut self, alphabet: &[u8], max_len: u64) -> String {
            let len = 1 + self.next() % max_len;
            (0..len)
                .map(|_| alphabet[(self.next() % alphabet.len() as u64) as usize] as char)
                .collect()
        }
    }

    fn random_bids(rng: &mut Lcg, len: usize) -> Vec<Bid> {
        (0..len)
            .map(|i| {
                let title = rng.word(b"abcd", 3);
                let fund = rng.word(b"xyz", 2);
                bid(&format!("{:05}", rng.next() % 1000 + i as u64), &title, &fund)
            })
            .collect()
    }

    #[test]
    fn quick_sort_orders_titles() {
        let mut seq = vec![
            bid("1", "Pencil", "General"),
            bid("2", "Apple", "Enterprise"),
            bid("3", "Mango", "Police"),
        ];
        quick_sort(&mut seq, 0, 2).unwrap();
        assert_eq!(titles(&seq), ["Apple", "Mango", "Pencil"]);
    }

    #[test]
    fn quick_sort_subrange_leaves_rest_alone() {
        let mut seq = vec![
            bid("1", "d", "f"),
            bid("2", "c", "f"),
            bid("3", "b", "f"),
            bid("4", "a", "f"),
        ];
        quick_sort(&mut seq, 1, 2).unwrap();
        assert_eq!(titles(&seq), ["d", "b", "c", "a"]);
    }

    #[test]
    fn quick_sort_rejects_out_of_range_bounds() {
        let mut seq = vec![bid("1", "a", "f"), bid("2", "b", "f")];
        assert_eq!(quick_sort(&mut seq, 0, 2).unwrap_err().kind(), ErrorKind::Index);
        assert_eq!(quick_sort(&mut seq, 2, 1).unwrap_err().kind(), ErrorKind::Index);
        let mut empty: Vec<Bid> = Vec::new();
        assert_eq!(quick_sort(&mut empty, 0, 0).unwrap_err().kind(), ErrorKind::Index);
        // In-range but empty ranges are a no-op.
        quick_sort(&mut seq, 1, 0).unwrap();
        quick_sort(&mut seq, 1, 1).unwrap();
        assert_eq!(titles(&seq), ["a", "b"]);
    }

    #[test]
    fn quick_sort_all_handles_tiny_inputs() {
        let mut empty: Vec<Bid> = Vec::new();
        quick_sort_all(&mut empty).unwrap();
        let mut single = vec![bid("1", "only", "f")];
        quick_sort_all(&mut single).unwrap();
        assert_eq!(titles(&single), ["only"]);
    }

    #[test]
    fn quick_sort_is_sorted_permutation() {
        let mut rng = Lcg(7);
        for len in 0..40 {
            for _ in 0..25 {
                let input = random_bids(&mut rng, len);
                let mut seq = input.clone();
                quick_sort_all(&mut seq).unwrap();
                assert!(is_sorted_by(&seq, SortKey::Title), "{:?}", titles(&seq));
                assert_eq!(canonical(&seq), canonical(&input));
            }
        }
    }

    #[test]
    fn quick_sort_handles_ordered_and_reversed_input() {
        let mut seq: Vec<Bid> = (0..200).map(|i| bid("1", &format!("{i:04}"), "f")).collect();
        quick_sort_all(&mut seq).unwrap();
        assert!(is_sorted_by(&seq, SortKey::Title));
        seq.reverse();
        quick_sort_all(&mut seq).unwrap();
        assert!(is_sorted_by(&seq, SortKey::Title));

        let mut same: Vec<Bid> = (0..50).map(|i| bid(&i.to_string(), "same", "f")).collect();
        quick_sort_all(&mut same).unwrap();
        assert_eq!(same.len(), 50);
    }

    #[test]
    fn selection_sorts_by_each_field() {
        let mut seq = vec![
            bid("30", "b", "Police"),
            bid("10", "c", "General"),
            bid("20", "a", "Enterprise"),
        ];
        selection_sort_by_id(&mut seq);
        assert_eq!(fields(&seq, SortKey::Id), ["10", "20", "30"]);
        selection_sort_by_title(&mut seq);
        assert_eq!(fields(&seq, SortKey::Title), ["a", "b", "c"]);
        selection_sort_by_fund(&mut seq);
        assert_eq!(fields(&seq, SortKey::Fund), ["Enterprise", "General", "Police"]);
    }

    #[test]
    fn selection_sort_has_no_early_exit() {
        let mut seq: Vec<Bid> = (0..10).map(|i| bid(&i.to_string(), "t", "f")).collect();
        let stats = selection_sort(&mut seq, SortKey::Id);
        assert_eq!(stats.records, 10);
        assert_eq!(stats.comparisons, 45);
        assert_eq!(stats.swaps, 0);
    }

    #[test]
    fn algorithms_agree_on_field_order() {
        let mut rng = Lcg(42);
        for key in [SortKey::Id, SortKey::Title, SortKey::Fund] {
            for len in [0, 1, 2, 5, 17, 64] {
                let input = random_bids(&mut rng, len);
                let mut quick = input.clone();
                let mut selection = input.clone();
                sort_records(&mut quick, key, Algorithm::Quick).unwrap();
                sort_records(&mut selection, key, Algorithm::Selection).unwrap();
                assert_eq!(fields(&quick, key), fields(&selection, key));
                assert_eq!(canonical(&quick), canonical(&selection));
            }
        }
    }

    #[test]
    fn resorting_sorted_input_is_stable_in_field_order() {
        let mut rng = Lcg(99);
        let mut seq = random_bids(&mut rng, 30);
        selection_sort(&mut seq, SortKey::Fund);
        let once = seq.clone();
        selection_sort(&mut seq, SortKey::Fund);
        assert_eq!(seq, once);

        quick_sort_all_by(&mut seq, SortKey::Fund).unwrap();
        let before = fields(&seq, SortKey::Fund).join("|");
        quick_sort_all_by(&mut seq, SortKey::Fund).unwrap();
        assert_eq!(fields(&seq, SortKey::Fund).join("|"), before);
    }

    #[test]
    fn quick_sort_is_idempotent_with_distinct_keys() {
        let mut seq: Vec<Bid> = ["kiwi", "fig", "pear", "apple", "lime", "date"]
            .iter()
            .enumerate()
            .map(|(i, title)| bid(&i.to_string(), title, "f"))
            .collect();
        quick_sort_all(&mut seq).unwrap();
        let once = seq.clone();
        quick_sort_all(&mut seq).unwrap();
        assert_eq!(seq, once);
    }

    // Arrange ranks so each partition finds the range minimum at its middle
    // index: the pivot swaps to the front and splits off a single record.
    fn middle_minimum_bids(len: usize) -> Vec<Bid> {
        let mut origin: Vec<usize> = (0..len).collect();
        let mut rank = vec![0; len];
        for begin in 0..len {
            let mid = begin + (len - 1 - begin) / 2;
            origin.swap(begin, mid);
            rank[origin[begin]] = begin;
        }
        rank.iter()
            .map(|r| bid(&r.to_string(), &format!("{r:06}"), "f"))
            .collect()
    }

    #[test]
    fn quick_sort_depth_stays_small_on_lopsided_partitions() {
        let len = 4000;
        let handle = std::thread::Builder::new()
            .stack_size(128 * 1024)
            .spawn(move || {
                let mut seq = middle_minimum_bids(len);
                quick_sort_all(&mut seq).map(|_| seq)
            })
            .expect("spawn");
        let seq = handle.join().expect("no stack overflow").expect("sorted");
        assert_eq!(seq.len(), len);
        assert!(is_sorted_by(&seq, SortKey::Title));
        assert_eq!(seq[0].title, "000000");
        assert_eq!(seq[len - 1].title, format!("{:06}", len - 1));
    }

    #[test]
    fn stats_count_work() {
        let mut seq = vec![bid("2", "b", "f"), bid("1", "a", "f")];
        let stats = quick_sort_by(&mut seq, 0, 1, SortKey::Id).unwrap();
        assert_eq!(stats.records, 2);
        assert_eq!(stats.swaps, 1);
        assert!(stats.comparisons >= 2);
        assert_eq!(fields(&seq, SortKey::Id), ["1", "2"]);
    }
}
