use nutype::nutype;
use xxhash_rust::xxh3::xxh3_64;

/// The literal value of the GTF `source` column.
pub const GTF_SOURCE: &str = "RepeatMasker";
/// The literal value of the GTF `feature` column. Telescope counts reads
/// over `exon` features, so every TE locus is written as a single exon.
pub const GTF_FEATURE_TYPE: &str = "exon";
/// The literal value of the GTF `frame` column.
pub const GTF_FRAME: &str = ".";

/// The comment block written at the top of every generated GTF file.
pub const GTF_HEADER: [&str; 5] = [
    "# GTF annotation of Drosophila melanogaster transposable elements",
    "# Generated from RepeatMasker output",
    "# Format: GTF (compatible with Telescope)",
    "# Overlap mode: union (handles nested TEs)",
    "#",
];

/// The number of leading columns of a RepeatMasker `.out` record that are consumed.
pub(crate) const RMSK_CONSUMED_FIELDS: usize = 11;

/// Pseudo identifiers are reduced to this many distinct values, i.e. 7 decimal digits.
pub(crate) const TE_ID_MODULUS: u64 = 10_000_000;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
/// The strand of a TE locus.
///
/// RepeatMasker writes `+` for a match on the forward strand and `C` (complement)
/// for a match on the reverse strand.
pub enum Strand {
    Positive,
    Negative,
}

impl Strand {
    /// Normalizes a RepeatMasker strand symbol. `C` maps to [`Strand::Negative`];
    /// every other symbol, including an empty one, maps to [`Strand::Positive`].
    pub fn from_rmsk(symbol: &str) -> Strand {
        if symbol == "C" {
            Strand::Negative
        } else {
            Strand::Positive
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Strand::Positive => "+",
            Strand::Negative => "-",
        }
    }
}

impl std::fmt::Display for Strand {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[nutype(derive(Debug, Clone, Copy, PartialEq, Eq, Hash, AsRef))]
/// The numeric part of a synthesized TE identifier, always below 10,000,000.
pub struct TeId(u32);

impl TeId {
    /// Derives the identifier of a locus from its locus id.
    ///
    /// The id is the XXH3 64-bit hash of `locus_id` reduced to 7 digits. XXH3 with the
    /// default seed does not depend on the process or the platform, so the same locus
    /// id maps to the same identifier on every run. Distinct locus ids may collide;
    /// collisions are neither detected nor resolved.
    pub fn from_locus_id(locus_id: &str) -> TeId {
        TeId::new((xxh3_64(locus_id.as_bytes()) % TE_ID_MODULUS) as u32)
    }

    /// Renders the identifier as `prefix` followed by a 7-digit zero-padded number,
    /// e.g. `TE0012345`.
    pub fn to_gene_id(self, prefix: &str) -> String {
        format!("{}{:07}", prefix, self.into_inner())
    }
}
