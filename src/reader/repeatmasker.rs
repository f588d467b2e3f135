use crate::options::ParseOptions;
use crate::te_utils::{Strand, TeId};
use anyhow::{bail, Context};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::{debug, info};

#[derive(Clone, Debug, PartialEq, Eq)]
/// One TE locus parsed from a RepeatMasker `.out` record.
///
/// # Fields
///
/// * `seqname`: The query sequence (chromosome or contig) name.
/// * `start`, `end`: The 1-based, inclusive coordinates of the match. `end >= start` is
///   assumed but not checked.
/// * `strand`: The normalized strand of the match.
/// * `family`: The repeat name. It labels the locus and keys the per-family counter.
/// * `repeat_class`: The repeat class/family column, kept verbatim.
/// * `gene_id`: The synthesized pseudo identifier, also used as the transcript id.
/// * `locus_id`: The repeat name joined with the per-family ordinal of this locus.
/// * `locus_ordinal`: The 1-based occurrence index of this locus within its family.
/// * `length`: `end - start + 1`.
/// * `perc_div`: The percent divergence column, kept verbatim.
/// * `score`: The Smith-Waterman score column, kept verbatim.
pub struct TeRecord {
    pub seqname: String,
    pub start: i64,
    pub end: i64,
    pub strand: Strand,
    pub family: String,
    pub repeat_class: String,
    pub gene_id: String,
    pub locus_id: String,
    pub locus_ordinal: u32,
    pub length: i64,
    pub perc_div: String,
    pub score: String,
}

impl TeRecord {
    /// The transcript id of a TE locus is its gene id.
    pub fn transcript_id(&self) -> &str {
        &self.gene_id
    }
}

/// Accumulates the records of a RepeatMasker `.out` report in file order.
///
/// # Fields
///
/// * `records`: The parsed records, one per kept line, in input order.
/// * `locus_counter`: The number of loci seen so far for each repeat name.
/// * `n_short`: The number of non-blank lines dropped for having too few fields.
pub struct RmStruct {
    pub records: Vec<TeRecord>,
    pub locus_counter: HashMap<String, u32>,
    pub n_short: usize,
}

impl RmStruct {
    pub fn new() -> RmStruct {
        RmStruct {
            records: Vec::with_capacity(10_000),
            locus_counter: HashMap::with_capacity(1_000),
            n_short: 0,
        }
    }

    /// Parses the RepeatMasker `.out` report at `file_path`.
    ///
    /// ### Arguments
    ///
    /// * `file_path`: The path of the report.
    /// * `po`: The [ParseOptions] describing the header size, the minimum field count
    ///   and how identifiers are synthesized.
    ///
    /// ### Returns
    ///
    /// Returns `anyhow::Result<RmStruct>`:
    /// * `Ok(RmStruct)`: the records of every line that passed the field-count check.
    /// * `Err(anyhow::Error)`: the file cannot be opened or read, it is shorter than the
    ///   header, or a record carries a non-integer coordinate.
    pub fn from_rmsk_out<T: AsRef<Path>>(
        file_path: T,
        po: &ParseOptions,
    ) -> anyhow::Result<RmStruct> {
        let file_path = file_path.as_ref();
        let file = File::open(file_path).with_context(|| {
            format!(
                "Could not open the RepeatMasker output file {:?}",
                file_path.as_os_str()
            )
        })?;

        RmStruct::from_reader(BufReader::new(file), po).with_context(|| {
            format!(
                "Could not parse the RepeatMasker output file {:?}",
                file_path.as_os_str()
            )
        })
    }

    /// Parses a RepeatMasker `.out` report from any buffered reader.
    pub fn from_reader<R: BufRead>(rdr: R, po: &ParseOptions) -> anyhow::Result<RmStruct> {
        let mut rm = RmStruct::new();
        let min_fields = po.effective_min_fields();
        let mut lines = rdr.lines();

        // the header is skipped blindly, but it has to be there
        for n_skipped in 0..po.header_lines {
            match lines.next() {
                Some(l) => {
                    l?;
                }
                None => bail!(
                    "The input ended after {} line(s) while skipping the {}-line RepeatMasker header.",
                    n_skipped,
                    po.header_lines
                ),
            }
        }
        debug!("Skipped {} header lines", po.header_lines);

        for (idx, l) in lines.enumerate() {
            let line = l?;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.len() < min_fields {
                rm.n_short += 1;
                continue;
            }

            // 1-based line number in the file, header included
            let line_no = idx + po.header_lines + 1;
            rm.push_fields(&fields, line_no, po)?;
        }

        if rm.n_short > 0 {
            debug!(
                "Dropped {} line(s) with fewer than {} fields",
                rm.n_short, min_fields
            );
        }
        info!("Parsed {} RepeatMasker records", rm.records.len());

        Ok(rm)
    }

    /// Builds a [TeRecord] from the fields of one `.out` line and appends it.
    ///
    /// The column layout is: score, % divergence, % deletion, % insertion, query
    /// sequence, query begin, query end, query (left), strand, repeat name, repeat
    /// class/family. Columns past the repeat class are ignored.
    fn push_fields(
        &mut self,
        fields: &[&str],
        line_no: usize,
        po: &ParseOptions,
    ) -> anyhow::Result<()> {
        let start = parse_coordinate(fields[5], "start", line_no)?;
        let end = parse_coordinate(fields[6], "end", line_no)?;
        let length = match end.checked_sub(start).and_then(|d| d.checked_add(1)) {
            Some(length) => length,
            None => bail!(
                "The length of the interval [{}, {}] on line {} does not fit in a 64-bit integer",
                start,
                end,
                line_no
            ),
        };
        let family = fields[9];

        let locus_ordinal = {
            let count = self.locus_counter.entry(family.to_string()).or_insert(0);
            *count += 1;
            *count
        };
        let locus_id = format!("{}{}{}", family, po.locus_separator, locus_ordinal);
        let gene_id = TeId::from_locus_id(&locus_id).to_gene_id(&po.id_prefix);

        self.records.push(TeRecord {
            seqname: fields[4].to_string(),
            start,
            end,
            strand: Strand::from_rmsk(fields[8]),
            family: family.to_string(),
            repeat_class: fields[10].to_string(),
            gene_id,
            locus_id,
            locus_ordinal,
            length,
            perc_div: fields[1].to_string(),
            score: fields[0].to_string(),
        });

        Ok(())
    }
}

impl Default for RmStruct {
    fn default() -> RmStruct {
        RmStruct::new()
    }
}

fn parse_coordinate(field: &str, name: &str, line_no: usize) -> anyhow::Result<i64> {
    field.parse::<i64>().with_context(|| {
        format!(
            "Found an invalid {} coordinate {:?} on line {}",
            name, field, line_no
        )
    })
}
