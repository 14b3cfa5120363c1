use crate::alignment_record::{AlignedRead, Strand};
use crate::seqidx::{ContigRef, SequenceIndex};
use std::io;

// Trait for range queries over different alignment stores
pub trait AlignmentStore {
    /// Contigs known to the store
    fn sequences(&self) -> &SequenceIndex;

    /// Reads on `contig` overlapping the 0-based inclusive interval `[start, end]`
    /// for which `keep(strand, map_qv)` holds, in the store's enumeration order
    ///
    /// `keep` is applied before a read's bases and kinetics are decoded, so records
    /// it rejects never cause an error.
    fn reads_in_range(
        &mut self,
        contig: &ContigRef,
        start: i64,
        end: i64,
        keep: &dyn Fn(Strand, u8) -> bool,
    ) -> io::Result<Vec<AlignedRead>>;
}

/// Store holding its reads in memory, in insertion order
#[derive(Default)]
pub struct InMemoryStore {
    seq_index: SequenceIndex,
    reads: Vec<(u32, AlignedRead)>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_contig(&mut self, name: &str, length: u64) -> u32 {
        self.seq_index.push(name, length)
    }

    pub fn add_read(&mut self, contig_id: u32, read: AlignedRead) {
        self.reads.push((contig_id, read));
    }
}

impl AlignmentStore for InMemoryStore {
    fn sequences(&self) -> &SequenceIndex {
        &self.seq_index
    }

    fn reads_in_range(
        &mut self,
        contig: &ContigRef,
        start: i64,
        end: i64,
        keep: &dyn Fn(Strand, u8) -> bool,
    ) -> io::Result<Vec<AlignedRead>> {
        let contig_id = self.seq_index.resolve(contig)?;
        Ok(self
            .reads
            .iter()
            .filter(|(id, _)| *id == contig_id)
            .filter(|(_, read)| {
                let positions = read.reference_positions();
                match (positions.first(), positions.last()) {
                    (Some(&first), Some(&last)) => first <= end && last >= start,
                    _ => false,
                }
            })
            .filter(|(_, read)| keep(read.strand(), read.map_qv()))
            .map(|(_, read)| read.clone())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn any(_: Strand, _: u8) -> bool {
        true
    }

    fn read_at(name: &str, start: i64, len: usize) -> AlignedRead {
        AlignedRead::new(
            name.to_string(),
            Strand::Forward,
            60,
            (start..start + len as i64).collect(),
            vec![b'A'; len],
            vec![b'A'; len],
            vec![1.0; len],
        )
        .unwrap()
    }

    #[test]
    fn test_range_query_overlap_and_order() {
        let mut store = InMemoryStore::new();
        let chr1 = store.add_contig("chr1", 100);
        let chr2 = store.add_contig("chr2", 100);
        store.add_read(chr1, read_at("late", 20, 5));
        store.add_read(chr1, read_at("early", 0, 10));
        store.add_read(chr2, read_at("other", 0, 50));
        store.add_read(chr1, read_at("edge", 10, 5));

        let names: Vec<String> = store
            .reads_in_range(&ContigRef::Index(1), 9, 10, &any)
            .unwrap()
            .iter()
            .map(|r| r.name().to_string())
            .collect();
        assert_eq!(names, vec!["early", "edge"]);

        let by_name = store
            .reads_in_range(&ContigRef::Name("chr2".to_string()), 0, 0, &any)
            .unwrap();
        assert_eq!(by_name.len(), 1);
    }

    #[test]
    fn test_unknown_contig_is_an_error() {
        let mut store = InMemoryStore::new();
        store.add_contig("chr1", 100);
        let err = store
            .reads_in_range(&ContigRef::Index(2), 0, 10, &any)
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }

    #[test]
    fn test_keep_predicate_filters_reads() {
        let mut store = InMemoryStore::new();
        let chr1 = store.add_contig("chr1", 100);
        store.add_read(chr1, read_at("fwd", 0, 10));
        let low = AlignedRead::new(
            "low".to_string(),
            Strand::Reverse,
            3,
            (0..10).collect(),
            vec![b'T'; 10],
            vec![b'T'; 10],
            vec![2.0; 10],
        )
        .unwrap();
        store.add_read(chr1, low);

        let reverse = store
            .reads_in_range(&ContigRef::Index(1), 0, 9, &|strand, _| {
                strand == Strand::Reverse
            })
            .unwrap();
        assert_eq!(reverse.len(), 1);
        assert_eq!(reverse[0].name(), "low");

        let confident = store
            .reads_in_range(&ContigRef::Index(1), 0, 9, &|_, map_qv| map_qv >= 10)
            .unwrap();
        assert_eq!(confident.len(), 1);
        assert_eq!(confident[0].name(), "fwd");
    }
}
