use crate::alignment_record::{AlignedRead, AlignmentFormat, Strand, GAP};
use crate::faidx::ReferenceFasta;
use crate::kinetics::{IpdTag, IpdUnit};
use crate::seqidx::{ContigRef, SequenceIndex};
use crate::store::AlignmentStore;
use log::{debug, info, warn};
use rust_htslib::bam::record::{Aux, Cigar, Record};
use rust_htslib::bam::{self, Read};
use std::io;

/// Base used for aligned reference columns when no reference FASTA is available
const UNKNOWN_BASE: u8 = b'N';

/// Kinetics tag holding per-base inter-pulse durations
const IPD_TAG: &[u8] = b"ip";

/// Alignment store backed by a coordinate-sorted, indexed BAM (or CRAM) file
pub struct BamStore {
    reader: bam::IndexedReader,
    seq_index: SequenceIndex,
    reference: Option<ReferenceFasta>,
    unit: IpdUnit,
}

impl BamStore {
    pub fn open(path: &str, reference: Option<ReferenceFasta>, unit: IpdUnit) -> io::Result<Self> {
        if !std::path::Path::new(path).exists() {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("Alignment file '{path}' not found"),
            ));
        }
        let mut reader = bam::IndexedReader::from_path(path).map_err(|e| {
            io::Error::other(format!("Failed to open indexed alignment file '{path}': {e}"))
        })?;

        match (AlignmentFormat::from_path(path), &reference) {
            (Some(AlignmentFormat::Cram), Some(fasta)) => {
                reader.set_reference(fasta.path()).map_err(|e| {
                    io::Error::other(format!(
                        "Failed to set CRAM reference '{}': {e}",
                        fasta.path()
                    ))
                })?;
            }
            (Some(AlignmentFormat::Cram), None) => {
                warn!("Decoding CRAM file {path} without --reference, htslib will look up the reference itself");
            }
            (None, _) => {
                warn!("Unrecognized extension for {path}, assuming BAM");
            }
            _ => {}
        }

        let mut seq_index = SequenceIndex::new();
        let header = reader.header();
        for tid in 0..header.target_count() {
            let name = String::from_utf8_lossy(header.tid2name(tid)).into_owned();
            seq_index.push(&name, header.target_len(tid).unwrap_or(0));
        }
        info!("Opened {} with {} contig(s)", path, seq_index.len());

        Ok(BamStore {
            reader,
            seq_index,
            reference,
            unit,
        })
    }

    fn to_aligned_read(&self, record: &Record, contig_name: &str) -> io::Result<AlignedRead> {
        let name = String::from_utf8_lossy(record.qname()).into_owned();
        let seq = record.seq().as_bytes();
        let cigar: Vec<Cigar> = record.cigar().iter().copied().collect();

        let ipd = match read_ipd_tag(record)? {
            Some(tag) if tag.len() == seq.len() => {
                tag.to_seq_orientation(record.is_reverse(), self.unit)
            }
            Some(tag) => {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!(
                        "Read '{}' has {} IPD values for {} bases",
                        name,
                        tag.len(),
                        seq.len()
                    ),
                ))
            }
            None => {
                debug!("Read {name} has no ip tag");
                vec![f32::NAN; seq.len()]
            }
        };

        // Reference bases are informative only; the gap filter looks at `-` alone
        let reference = match &self.reference {
            Some(fasta) => {
                let span = reference_span(&cigar);
                let start = record.pos() as u64;
                if span == 0 {
                    None
                } else {
                    match fasta.fetch_sequence(contig_name, start, start + span) {
                        Ok(bases) => Some(bases),
                        Err(e) => {
                            warn!("Using unknown reference bases for read {name}: {e}");
                            None
                        }
                    }
                }
            }
            None => None,
        };

        build_aligned_read(
            name,
            Strand::from_is_reverse(record.is_reverse()),
            record.mapq(),
            record.pos(),
            &cigar,
            &seq,
            &ipd,
            reference.as_deref(),
        )
    }
}

impl AlignmentStore for BamStore {
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
        let tid = self.seq_index.resolve(contig)?;
        let contig_name = self.seq_index.get_name(tid).unwrap_or_default().to_string();

        // htslib regions are half-open
        self.reader
            .fetch((tid, start, end + 1))
            .map_err(|e| io::Error::other(format!("Failed to fetch {contig_name}:{start}-{end}: {e}")))?;

        let mut records = Vec::new();
        let mut fetched = 0usize;
        for result in self.reader.records() {
            let record = result.map_err(|e| {
                io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("Failed to read alignment record: {e}"),
                )
            })?;
            if record.is_unmapped() {
                continue;
            }
            fetched += 1;
            if !keep(Strand::from_is_reverse(record.is_reverse()), record.mapq()) {
                debug!(
                    "Skipping read {} before decoding: strand {:?}, MapQV {}",
                    String::from_utf8_lossy(record.qname()),
                    Strand::from_is_reverse(record.is_reverse()),
                    record.mapq()
                );
                continue;
            }
            records.push(record);
        }
        debug!(
            "Fetched {} record(s) from {}:{}-{}, {} selected",
            fetched,
            contig_name,
            start,
            end,
            records.len()
        );

        records
            .iter()
            .map(|record| self.to_aligned_read(record, &contig_name))
            .collect()
    }
}

fn read_ipd_tag(record: &Record) -> io::Result<Option<IpdTag>> {
    match record.aux(IPD_TAG) {
        Ok(Aux::ArrayU8(codes)) => Ok(Some(IpdTag::Codec(codes.iter().collect()))),
        Ok(Aux::ArrayU16(frames)) => Ok(Some(IpdTag::Frames(frames.iter().collect()))),
        Ok(_) => Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!(
                "Read '{}' has an ip tag that is not a B:C or B:S array",
                String::from_utf8_lossy(record.qname())
            ),
        )),
        Err(_) => Ok(None),
    }
}

/// Number of reference bases consumed by an alignment
pub fn reference_span(cigar: &[Cigar]) -> u64 {
    cigar
        .iter()
        .map(|op| match op {
            Cigar::Match(len)
            | Cigar::Equal(len)
            | Cigar::Diff(len)
            | Cigar::Del(len)
            | Cigar::RefSkip(len) => *len as u64,
            _ => 0,
        })
        .sum()
}

/// Lay out a read column by column in reference orientation
///
/// `seq` and `ipd` are in SEQ orientation, `reference` (when given) starts at `pos`
/// and spans the whole alignment.
#[allow(clippy::too_many_arguments)]
pub fn build_aligned_read(
    name: String,
    strand: Strand,
    map_qv: u8,
    pos: i64,
    cigar: &[Cigar],
    seq: &[u8],
    ipd: &[f32],
    reference: Option<&[u8]>,
) -> io::Result<AlignedRead> {
    let invalid = |msg: String| io::Error::new(io::ErrorKind::InvalidData, msg);

    let columns: usize = cigar
        .iter()
        .map(|op| match op {
            Cigar::SoftClip(_) | Cigar::HardClip(_) | Cigar::Pad(_) => 0,
            _ => op.len() as usize,
        })
        .sum();
    let mut reference_positions = Vec::with_capacity(columns);
    let mut ref_bases = Vec::with_capacity(columns);
    let mut read_bases = Vec::with_capacity(columns);
    let mut ipds = Vec::with_capacity(columns);

    let ref_base = |offset: i64| -> io::Result<u8> {
        match reference {
            Some(bases) => bases.get(offset as usize).copied().ok_or_else(|| {
                invalid(format!("Reference is too short for read '{name}'"))
            }),
            None => Ok(UNKNOWN_BASE),
        }
    };

    let mut ref_offset: i64 = 0;
    let mut query_idx: usize = 0;
    for op in cigar {
        let len = op.len() as usize;
        match op {
            Cigar::Match(_) | Cigar::Equal(_) | Cigar::Diff(_) | Cigar::Ins(_) => {
                if query_idx + len > seq.len() || query_idx + len > ipd.len() {
                    return Err(invalid(format!(
                        "CIGAR of read '{name}' consumes more bases than its sequence"
                    )));
                }
                let is_insertion = matches!(op, Cigar::Ins(_));
                for i in query_idx..query_idx + len {
                    reference_positions.push(pos + ref_offset);
                    if is_insertion {
                        ref_bases.push(GAP);
                    } else {
                        ref_bases.push(ref_base(ref_offset)?);
                        ref_offset += 1;
                    }
                    read_bases.push(seq[i]);
                    ipds.push(ipd[i]);
                }
                query_idx += len;
            }
            Cigar::Del(_) | Cigar::RefSkip(_) => {
                for _ in 0..len {
                    reference_positions.push(pos + ref_offset);
                    ref_bases.push(ref_base(ref_offset)?);
                    read_bases.push(GAP);
                    ipds.push(f32::NAN);
                    ref_offset += 1;
                }
            }
            Cigar::SoftClip(_) => query_idx += len,
            Cigar::HardClip(_) | Cigar::Pad(_) => {}
        }
    }

    AlignedRead::new(
        name,
        strand,
        map_qv,
        reference_positions,
        ref_bases,
        read_bases,
        ipds,
    )
}
