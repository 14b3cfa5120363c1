use log::info;
use rust_htslib::faidx;
use rustc_hash::FxHashMap;
use std::io;

// Indexed FASTA holding the contigs the reads were aligned to
pub struct ReferenceFasta {
    path: String,
    reader: faidx::Reader,
    sequence_lengths: FxHashMap<String, u64>,
}

impl ReferenceFasta {
    pub fn from_path(fasta_path: &str) -> io::Result<Self> {
        // rust-htslib builds the .fai next to the FASTA if it is missing
        let reader = faidx::Reader::from_path(fasta_path).map_err(|e| {
            io::Error::other(format!("Failed to open FASTA file '{fasta_path}': {e}"))
        })?;

        let fai_path = format!("{fasta_path}.fai");
        let fai_content = std::fs::read_to_string(&fai_path).map_err(|e| {
            io::Error::new(
                e.kind(),
                format!("Failed to read FASTA index '{fai_path}': {e}"),
            )
        })?;

        // Parse the .fai file to get sequence names and lengths
        let mut sequence_lengths = FxHashMap::default();
        for line in fai_content.lines() {
            let fields: Vec<&str> = line.split('\t').collect();
            if fields.len() >= 2 && !fields[0].is_empty() {
                if let Ok(length) = fields[1].parse::<u64>() {
                    sequence_lengths.insert(fields[0].to_string(), length);
                }
            }
        }
        info!(
            "Loaded reference {} with {} sequence(s)",
            fasta_path,
            sequence_lengths.len()
        );

        Ok(ReferenceFasta {
            path: fasta_path.to_string(),
            reader,
            sequence_lengths,
        })
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn get_sequence_length(&self, seq_name: &str) -> io::Result<u64> {
        self.sequence_lengths.get(seq_name).copied().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("Sequence '{seq_name}' not found in {}", self.path),
            )
        })
    }

    /// Uppercase bases of `seq_name` over the 0-based half-open interval `[start, end)`
    pub fn fetch_sequence(&self, seq_name: &str, start: u64, end: u64) -> io::Result<Vec<u8>> {
        let length = self.get_sequence_length(seq_name)?;
        if start >= end || end > length {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("Interval {start}-{end} is outside '{seq_name}' (length {length})"),
            ));
        }

        // fetch_seq expects 0-based inclusive end coordinate
        match self
            .reader
            .fetch_seq(seq_name, start as usize, (end - 1) as usize)
        {
            Ok(seq) => {
                let mut seq_vec = seq.to_vec();
                unsafe { libc::free(seq.as_ptr() as *mut std::ffi::c_void) }; // Free up memory to avoid memory leak (bug https://github.com/rust-bio/rust-htslib/issues/401#issuecomment-1704290171)
                seq_vec.make_ascii_uppercase();
                Ok(seq_vec)
            }
            Err(e) => Err(io::Error::other(format!(
                "Failed to fetch sequence for {seq_name}: {e}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_fasta(dir: &TempDir) -> String {
        let path = dir.path().join("ref.fa");
        let mut file = File::create(&path).unwrap();
        writeln!(file, ">chr1").unwrap();
        writeln!(file, "acgtACGTnnGG").unwrap();
        writeln!(file, ">chr2").unwrap();
        writeln!(file, "TTTT").unwrap();
        path.to_str().unwrap().to_string()
    }

    #[test]
    fn test_fetch_uppercases_and_uses_half_open_interval() {
        let dir = TempDir::new().unwrap();
        let fasta = ReferenceFasta::from_path(&write_fasta(&dir)).unwrap();
        assert_eq!(fasta.get_sequence_length("chr1").unwrap(), 12);
        assert_eq!(fasta.fetch_sequence("chr1", 0, 4).unwrap(), b"ACGT".to_vec());
        assert_eq!(fasta.fetch_sequence("chr1", 8, 12).unwrap(), b"NNGG".to_vec());
        assert_eq!(fasta.fetch_sequence("chr2", 1, 2).unwrap(), b"T".to_vec());
    }

    #[test]
    fn test_fetch_errors() {
        let dir = TempDir::new().unwrap();
        let fasta = ReferenceFasta::from_path(&write_fasta(&dir)).unwrap();
        assert_eq!(
            fasta.fetch_sequence("chr3", 0, 1).unwrap_err().kind(),
            io::ErrorKind::NotFound
        );
        assert_eq!(
            fasta.fetch_sequence("chr2", 2, 10).unwrap_err().kind(),
            io::ErrorKind::InvalidInput
        );
    }
}
