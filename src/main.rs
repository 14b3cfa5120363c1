use clap::{ArgGroup, Parser};
use ipdget::alignment_record::Strand;
use ipdget::bam::BamStore;
use ipdget::faidx::ReferenceFasta;
use ipdget::ipd::{format_ipds, get_ipd, IpdQuery, UncoveredPolicy};
use ipdget::kinetics::IpdUnit;
use ipdget::seqidx::ContigRef;
use log::info;
use std::io;

/// Get IPDs for a reference position from reads on the strand opposite a motif.
#[derive(Parser, Debug)]
#[command(author, version, about)]
#[command(group(ArgGroup::new("strand").required(true).args(["forward", "reverse"])))]
struct Args {
    /// Indexed BAM (or CRAM) of aligned subreads carrying ip kinetics tags, corresponding to motifs.gff
    #[clap(value_parser)]
    alignment_file: String,

    /// Reference contig: contig name, or 1-based index (1 if single contig). A contig named like the number is preferred over the index
    #[clap(value_parser)]
    ref_idx: String,

    /// 1-based position of the modified cognate base, 4th column in motifs.gff
    #[clap(value_parser)]
    ref_pos: u64,

    /// Motif is on the + strand in motifs.gff
    #[clap(short = 'f', action)]
    forward: bool,

    /// Motif is on the - strand in motifs.gff
    #[clap(short = 'r', action)]
    reverse: bool,

    /// Minimum number of bases on each side of the modified base which must align in the read
    #[clap(short = 'k', value_parser, default_value_t = 1)]
    k: usize,

    /// Minimum mapping QV of read
    #[clap(short = 'q', long = "min-map-qv", visible_alias = "minMapQV", value_parser, default_value_t = 10)]
    min_map_qv: u8,

    /// Reference FASTA used to decode CRAM and to fill aligned reference bases of selected reads (informative only, falls back to N)
    #[clap(long, value_parser)]
    reference: Option<String>,

    /// Report IPDs in seconds using this frame rate (Hz) instead of frames
    #[clap(long, value_parser)]
    frame_rate: Option<f32>,

    /// Skip reads that overlap the window but do not cover the position, instead of failing
    #[clap(long, action)]
    skip_uncovered: bool,

    /// Verbosity level (0 = error, 1 = info, 2 = debug)
    #[clap(short, long, default_value = "0")]
    verbose: u8,
}

fn main() -> io::Result<()> {
    let args = Args::parse();

    // Initialize logger based on verbosity
    env_logger::Builder::new()
        .filter_level(match args.verbose {
            0 => log::LevelFilter::Error,
            1 => log::LevelFilter::Info,
            _ => log::LevelFilter::Debug,
        })
        .init();

    let unit = match args.frame_rate {
        Some(rate) if rate > 0.0 && rate.is_finite() => IpdUnit::Seconds(rate),
        Some(rate) => {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("Frame rate must be a positive number of Hz, got {rate}"),
            ))
        }
        None => IpdUnit::Frames,
    };

    let reference = args
        .reference
        .as_deref()
        .map(ReferenceFasta::from_path)
        .transpose()?;
    let mut store = BamStore::open(&args.alignment_file, reference, unit)?;

    // -f and -r are mutually exclusive, clap guarantees exactly one is set
    let motif_strand = if args.forward {
        Strand::Forward
    } else {
        Strand::Reverse
    };
    let query = IpdQuery {
        contig: ContigRef::parse(&args.ref_idx),
        ref_pos: args.ref_pos,
        motif_strand,
        k: args.k,
        min_map_qv: args.min_map_qv,
        uncovered: if args.skip_uncovered {
            UncoveredPolicy::Skip
        } else {
            UncoveredPolicy::Fail
        },
    };
    info!("Running {:?}", query);

    let ipds = get_ipd(&mut store, &query)?;
    println!("{}", format_ipds(&ipds));

    Ok(())
}
