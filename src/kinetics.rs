//! Per-base kinetics as stored in PacBio BAM files.
//!
//! The `ip` tag holds one inter-pulse duration per base of the read, in
//! sequencing (native) orientation, either as raw 16-bit frame counts or
//! compressed to one byte with the lossy codec below.

/// Decode one byte of the 8-bit lossy frame codec into a frame count
///
/// Codes are split in four bands of 64, each band doubling the step size:
/// `[0, 64)` step 1, `[64, 128)` step 2, `[128, 192)` step 4, `[192, 256)` step 8.
pub fn decode_frames(code: u8) -> u16 {
    let code = code as u16;
    match code {
        0..=63 => code,
        64..=127 => 64 + (code - 64) * 2,
        128..=191 => 192 + (code - 128) * 4,
        _ => 448 + (code - 192) * 8,
    }
}

/// Unit in which IPD values are reported
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum IpdUnit {
    Frames,
    /// Seconds, given the instrument frame rate in Hz
    Seconds(f32),
}

impl IpdUnit {
    pub fn convert(self, frames: u16) -> f32 {
        match self {
            IpdUnit::Frames => frames as f32,
            IpdUnit::Seconds(frame_rate) => frames as f32 / frame_rate,
        }
    }
}

/// Raw content of an `ip` tag
#[derive(Debug, Clone, PartialEq)]
pub enum IpdTag {
    Codec(Vec<u8>),
    Frames(Vec<u16>),
}

impl IpdTag {
    pub fn len(&self) -> usize {
        match self {
            IpdTag::Codec(codes) => codes.len(),
            IpdTag::Frames(frames) => frames.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Per-base IPDs in `unit`, in the orientation of the stored SEQ
    ///
    /// The tag is in sequencing orientation, so reverse-strand reads are flipped.
    pub fn to_seq_orientation(&self, is_reverse: bool, unit: IpdUnit) -> Vec<f32> {
        let mut ipds: Vec<f32> = match self {
            IpdTag::Codec(codes) => codes
                .iter()
                .map(|&code| unit.convert(decode_frames(code)))
                .collect(),
            IpdTag::Frames(frames) => frames.iter().map(|&f| unit.convert(f)).collect(),
        };
        if is_reverse {
            ipds.reverse();
        }
        ipds
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codec_band_boundaries() {
        assert_eq!(decode_frames(0), 0);
        assert_eq!(decode_frames(63), 63);
        assert_eq!(decode_frames(64), 64);
        assert_eq!(decode_frames(65), 66);
        assert_eq!(decode_frames(127), 190);
        assert_eq!(decode_frames(128), 192);
        assert_eq!(decode_frames(191), 444);
        assert_eq!(decode_frames(192), 448);
        assert_eq!(decode_frames(255), 952);
    }

    #[test]
    fn test_codec_is_monotonic() {
        for code in 1..=255u8 {
            assert!(decode_frames(code) > decode_frames(code - 1));
        }
    }

    #[test]
    fn test_orientation_and_units() {
        let tag = IpdTag::Codec(vec![10, 20, 64]);
        assert_eq!(
            tag.to_seq_orientation(false, IpdUnit::Frames),
            vec![10.0, 20.0, 64.0]
        );
        assert_eq!(
            tag.to_seq_orientation(true, IpdUnit::Frames),
            vec![64.0, 20.0, 10.0]
        );

        let raw = IpdTag::Frames(vec![80, 1000]);
        assert_eq!(
            raw.to_seq_orientation(false, IpdUnit::Seconds(80.0)),
            vec![1.0, 12.5]
        );
    }
}
