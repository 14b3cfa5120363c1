use crate::alignment_record::{AlignedRead, Strand, GAP};
use crate::seqidx::ContigRef;
use crate::store::AlignmentStore;
use log::{debug, info};
use std::io;

/// What to do with a read that overlaps the query window but has no column at the
/// queried position
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum UncoveredPolicy {
    /// Abort the whole query
    #[default]
    Fail,
    /// Drop the read and carry on
    Skip,
}

/// A single IPD query against one reference position
#[derive(Debug, Clone, PartialEq)]
pub struct IpdQuery {
    pub contig: ContigRef,
    /// 1-based position, as in motifs.gff
    pub ref_pos: u64,
    /// Strand of the motif annotation; reads from the opposite strand are sampled
    pub motif_strand: Strand,
    /// Bases on each side of the position that must align without gaps
    pub k: usize,
    pub min_map_qv: u8,
    pub uncovered: UncoveredPolicy,
}

impl IpdQuery {
    pub fn new(contig: ContigRef, ref_pos: u64, motif_strand: Strand) -> Self {
        IpdQuery {
            contig,
            ref_pos,
            motif_strand,
            k: 1,
            min_map_qv: 10,
            uncovered: UncoveredPolicy::Fail,
        }
    }

    /// 0-based position of the query
    pub fn zero_based_pos(&self) -> io::Result<i64> {
        if self.ref_pos == 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "Reference position is 1-based, 0 is not a valid position",
            ));
        }
        i64::try_from(self.ref_pos - 1).map_err(|_| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("Reference position {} is out of range", self.ref_pos),
            )
        })
    }

    /// 0-based inclusive bounds `[pos - k, pos + k]` of the range query, clamped at 0
    pub fn window(&self) -> io::Result<(i64, i64)> {
        let pos = self.zero_based_pos()?;
        let out_of_range = || {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!(
                    "Window half-width {} is too large for position {}",
                    self.k, self.ref_pos
                ),
            )
        };
        let k = i64::try_from(self.k).map_err(|_| out_of_range())?;
        // One past the end must stay representable for half-open region queries
        let end = pos
            .checked_add(k)
            .filter(|end| end.checked_add(1).is_some())
            .ok_or_else(out_of_range)?;
        Ok(((pos - k).max(0), end))
    }
}

/// True when a read on `read_strand` is on the complement of `motif_strand`
pub fn is_complement_strand(read_strand: Strand, motif_strand: Strand) -> bool {
    read_strand == motif_strand.opposite()
}

/// Why a read was left out of the result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rejection {
    SameStrand,
    LowMapQv,
    Uncovered,
    WindowOutOfRead,
    GapInWindow,
}

/// Collect the IPD at the queried position from every read passing the strand,
/// mapping quality, and gap-free window filters, in store order
pub fn get_ipd<S: AlignmentStore + ?Sized>(store: &mut S, query: &IpdQuery) -> io::Result<Vec<f32>> {
    let pos = query.zero_based_pos()?;
    let (window_start, window_end) = query.window()?;

    let sequences = store.sequences();
    let contig_id = sequences.resolve(&query.contig)?;
    if let Some(length) = sequences.get_len_from_id(contig_id).filter(|&len| len > 0) {
        if pos as u64 >= length {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!(
                    "Reference position {} is beyond the end of contig {} (length {})",
                    query.ref_pos, query.contig, length
                ),
            ));
        }
    }
    info!(
        "Querying {}:{}-{} (0-based) for reads on the {:?} strand with MapQV >= {}",
        sequences.get_name(contig_id).unwrap_or_default(),
        window_start,
        window_end,
        query.motif_strand.opposite(),
        query.min_map_qv
    );
    let keep = |strand: Strand, map_qv: u8| {
        is_complement_strand(strand, query.motif_strand) && map_qv >= query.min_map_qv
    };
    let reads = store.reads_in_range(&query.contig, window_start, window_end, &keep)?;

    let mut ipds = Vec::new();
    for read in &reads {
        match ipd_at(read, pos, query)? {
            Ok(ipd) => ipds.push(ipd),
            Err(reason) => debug!("Skipping read {}: {:?}", read.name(), reason),
        }
    }
    info!("Kept {} of {} selected reads", ipds.len(), reads.len());

    Ok(ipds)
}

/// IPD of one read at `pos`, or the reason the read does not qualify
fn ipd_at(read: &AlignedRead, pos: i64, query: &IpdQuery) -> io::Result<Result<f32, Rejection>> {
    if !is_complement_strand(read.strand(), query.motif_strand) {
        return Ok(Err(Rejection::SameStrand));
    }
    if read.map_qv() < query.min_map_qv {
        return Ok(Err(Rejection::LowMapQv));
    }

    let idx = match read.column_of(pos) {
        Some(idx) => idx,
        None => {
            return match query.uncovered {
                UncoveredPolicy::Skip => Ok(Err(Rejection::Uncovered)),
                UncoveredPolicy::Fail => Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!(
                        "Read '{}' does not cover reference position {}:{} (1-based)",
                        read.name(),
                        query.contig,
                        query.ref_pos
                    ),
                )),
            };
        }
    };

    if idx < query.k || idx + query.k + 1 > read.len() {
        return Ok(Err(Rejection::WindowOutOfRead));
    }
    let window = idx - query.k..idx + query.k + 1;
    if read.reference()[window.clone()].contains(&GAP) || read.read()[window].contains(&GAP) {
        return Ok(Err(Rejection::GapInWindow));
    }

    Ok(Ok(read.ipd()[idx]))
}

/// Render IPDs as a bracketed, comma separated list
pub fn format_ipds(ipds: &[f32]) -> String {
    format!("{ipds:?}")
}
