use crate::te_utils::RMSK_CONSUMED_FIELDS;

#[derive(Clone, Debug, PartialEq, Eq)]
/// Options controlling how a RepeatMasker `.out` report is parsed.
///
/// # Fields
///
/// * `header_lines`: The number of leading lines to skip before the first record. A
///   RepeatMasker `.out` file starts with two column-title lines and a blank line.
/// * `min_fields`: Lines with fewer whitespace-separated fields than this are dropped.
///   Values below the number of consumed columns (11) are raised to 11.
/// * `id_prefix`: The tag prepended to the 7-digit pseudo identifier used as the
///   `gene_id` and `transcript_id` of each locus.
/// * `locus_separator`: The text placed between the repeat name and the per-family
///   ordinal when building the `locus_id` of each locus.
///
/// # Examples
///
/// ```rust
/// use rmsk2gtf::options::ParseOptions;
///
/// let po = ParseOptions::default();
/// assert_eq!(po.header_lines, 3);
/// assert_eq!(po.min_fields, 15);
/// assert_eq!(po.id_prefix, "TE");
/// ```
pub struct ParseOptions {
    pub header_lines: usize,
    pub min_fields: usize,
    pub id_prefix: String,
    pub locus_separator: String,
}

impl Default for ParseOptions {
    fn default() -> ParseOptions {
        ParseOptions {
            header_lines: 3,
            min_fields: 15,
            id_prefix: String::from("TE"),
            locus_separator: String::from("{}"),
        }
    }
}

impl ParseOptions {
    pub fn new<T: ToString>(id_prefix: T, locus_separator: T) -> ParseOptions {
        ParseOptions {
            id_prefix: id_prefix.to_string(),
            locus_separator: locus_separator.to_string(),
            ..Default::default()
        }
    }

    /// The field count a line must reach to be kept.
    pub fn effective_min_fields(&self) -> usize {
        self.min_fields.max(RMSK_CONSUMED_FIELDS)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
/// Options controlling the family frequency summary.
pub struct SummaryOptions {
    /// How many of the most frequent families to report.
    pub top_n: usize,
}

impl Default for SummaryOptions {
    fn default() -> SummaryOptions {
        SummaryOptions { top_n: 10 }
    }
}

impl SummaryOptions {
    pub fn new(top_n: usize) -> SummaryOptions {
        SummaryOptions { top_n }
    }
}
