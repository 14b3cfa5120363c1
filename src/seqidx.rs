use rustc_hash::FxHashMap;
use std::fmt;
use std::io;

/// Contig as given on the command line: a 1-based index or a name
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContigRef {
    Index(u32),
    Name(String),
}

impl ContigRef {
    /// Integers are 1-based contig indices, anything else is a contig name
    ///
    /// An integer still selects a contig of that exact name first, see [`SequenceIndex::resolve`].
    pub fn parse(value: &str) -> Self {
        match value.parse::<u32>() {
            Ok(index) => ContigRef::Index(index),
            Err(_) => ContigRef::Name(value.to_string()),
        }
    }
}

impl fmt::Display for ContigRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContigRef::Index(index) => write!(f, "#{index}"),
            ContigRef::Name(name) => write!(f, "{name}"),
        }
    }
}

/// Contig names and lengths of an alignment store, addressed by 0-based id
pub struct SequenceIndex {
    name_to_id: FxHashMap<String, u32>,
    names: Vec<String>,
    lengths: Vec<u64>,
}

impl Default for SequenceIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl SequenceIndex {
    pub fn new() -> Self {
        SequenceIndex {
            name_to_id: FxHashMap::default(),
            names: Vec::new(),
            lengths: Vec::new(),
        }
    }

    pub fn push(&mut self, name: &str, length: u64) -> u32 {
        let id = self.names.len() as u32;
        self.name_to_id.entry(name.to_owned()).or_insert(id);
        self.names.push(name.to_owned());
        self.lengths.push(length);
        id
    }

    pub fn get_id(&self, name: &str) -> Option<u32> {
        self.name_to_id.get(name).copied()
    }

    pub fn get_name(&self, id: u32) -> Option<&str> {
        self.names.get(id as usize).map(|s| s.as_str())
    }

    pub fn get_len_from_id(&self, id: u32) -> Option<u64> {
        self.lengths.get(id as usize).copied()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Resolve a contig reference to its 0-based id
    ///
    /// A contig literally named like an index (e.g. `2`) wins over the index.
    pub fn resolve(&self, contig: &ContigRef) -> io::Result<u32> {
        if let ContigRef::Index(index) = contig {
            if let Some(id) = self.get_id(&index.to_string()) {
                return Ok(id);
            }
        }
        match contig {
            ContigRef::Index(0) => Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "Contig index is 1-based, 0 is not a valid contig",
            )),
            ContigRef::Index(index) if *index as usize > self.len() => Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!(
                    "Contig index {} out of range, the alignment file has {} contig(s)",
                    index,
                    self.len()
                ),
            )),
            ContigRef::Index(index) => Ok(index - 1),
            ContigRef::Name(name) => self.get_id(name).ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("Contig '{name}' not found in the alignment file"),
                )
            }),
        }
    }
}
