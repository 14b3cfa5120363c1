use std::io;

/// Marker used in aligned base strings for a column with no base
pub const GAP: u8 = b'-';

/// Strand orientation for alignments
#[derive(Default, PartialEq, Eq, Clone, Copy, Debug)]
#[repr(u8)]
pub enum Strand {
    #[default]
    Forward,
    Reverse,
}

impl Strand {
    pub fn from_is_reverse(is_reverse: bool) -> Self {
        if is_reverse {
            Strand::Reverse
        } else {
            Strand::Forward
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            Strand::Forward => Strand::Reverse,
            Strand::Reverse => Strand::Forward,
        }
    }
}

/// A read aligned to a reference contig, laid out column by column
///
/// Every per-column array has the same length and is in reference orientation,
/// whatever strand the read came from:
/// - `reference_positions`: 0-based reference coordinate of each column. Insertion
///   columns carry the coordinate of the next reference base.
/// - `reference` / `read`: aligned bases, with [`GAP`] where the column has no base.
/// - `ipd`: inter-pulse duration of the read base in each column, `NaN` on deletions.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignedRead {
    name: String,
    strand: Strand,
    map_qv: u8,
    reference_positions: Vec<i64>,
    reference: Vec<u8>,
    read: Vec<u8>,
    ipd: Vec<f32>,
}

impl AlignedRead {
    pub fn new(
        name: String,
        strand: Strand,
        map_qv: u8,
        reference_positions: Vec<i64>,
        reference: Vec<u8>,
        read: Vec<u8>,
        ipd: Vec<f32>,
    ) -> io::Result<Self> {
        let columns = reference_positions.len();
        if reference.len() != columns || read.len() != columns || ipd.len() != columns {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "Aligned arrays of read '{}' differ in length: {} positions, {} reference bases, {} read bases, {} IPDs",
                    name,
                    columns,
                    reference.len(),
                    read.len(),
                    ipd.len()
                ),
            ));
        }
        Ok(AlignedRead {
            name,
            strand,
            map_qv,
            reference_positions,
            reference,
            read,
            ipd,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn strand(&self) -> Strand {
        self.strand
    }

    pub fn map_qv(&self) -> u8 {
        self.map_qv
    }

    pub fn reference_positions(&self) -> &[i64] {
        &self.reference_positions
    }

    pub fn reference(&self) -> &[u8] {
        &self.reference
    }

    pub fn read(&self) -> &[u8] {
        &self.read
    }

    pub fn ipd(&self) -> &[f32] {
        &self.ipd
    }

    /// Number of alignment columns
    pub fn len(&self) -> usize {
        self.reference_positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reference_positions.is_empty()
    }

    /// Index of the first column aligned to the 0-based reference position `pos`
    pub fn column_of(&self, pos: i64) -> Option<usize> {
        self.reference_positions.iter().position(|&p| p == pos)
    }
}

/// Alignment file format types
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AlignmentFormat {
    Bam,
    Cram,
}

impl AlignmentFormat {
    /// Detect format from file extension
    pub fn from_path(path: &str) -> Option<Self> {
        if path.ends_with(".bam") {
            Some(AlignmentFormat::Bam)
        } else if path.ends_with(".cram") {
            Some(AlignmentFormat::Cram)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_detection() {
        assert_eq!(
            AlignmentFormat::from_path("aligned_reads.bam"),
            Some(AlignmentFormat::Bam)
        );
        assert_eq!(
            AlignmentFormat::from_path("subreads.cram"),
            Some(AlignmentFormat::Cram)
        );
        assert_eq!(AlignmentFormat::from_path("aligned_reads.cmp.h5"), None);
    }

    #[test]
    fn test_strand_operations() {
        assert_eq!(Strand::from_is_reverse(false), Strand::Forward);
        assert_eq!(Strand::from_is_reverse(true), Strand::Reverse);
        assert_eq!(Strand::Forward.opposite(), Strand::Reverse);
        assert_eq!(Strand::Reverse.opposite(), Strand::Forward);
        assert_eq!(Strand::default(), Strand::Forward);
    }

    #[test]
    fn test_column_lookup() {
        // Insertion between 11 and 12 keeps the coordinate of the next reference base
        let read = AlignedRead::new(
            "m1/1/0_5".to_string(),
            Strand::Forward,
            30,
            vec![10, 11, 12, 12, 13],
            b"AC-GT".to_vec(),
            b"ACTGT".to_vec(),
            vec![1.0, 2.0, 3.0, 4.0, 5.0],
        )
        .unwrap();
        assert_eq!(read.len(), 5);
        assert_eq!(read.column_of(10), Some(0));
        assert_eq!(read.column_of(12), Some(2));
        assert_eq!(read.column_of(14), None);
    }

    #[test]
    fn test_mismatched_arrays_rejected() {
        let err = AlignedRead::new(
            "bad".to_string(),
            Strand::Forward,
            30,
            vec![0, 1],
            b"AC".to_vec(),
            b"A".to_vec(),
            vec![1.0, 2.0],
        )
        .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
        assert!(err.to_string().contains("differ in length"));
    }
}
