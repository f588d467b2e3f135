use crate::options::{ParseOptions, SummaryOptions};
use crate::reader::{RmStruct, TeRecord};
use crate::te_utils::{GTF_FEATURE_TYPE, GTF_FRAME, GTF_HEADER, GTF_SOURCE};
use anyhow::Context;
use polars::prelude::{CsvWriter, DataFrame, NamedFrom, SerWriter, Series};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::info;

impl TeRecord {
    /// Renders the GTF attribute column of this locus.
    ///
    /// The seven attributes always appear in the same order. Every value is quoted
    /// except `divergence`, which Telescope reads as a bare number.
    ///
    /// ```text
    /// gene_id "TE0012345"; transcript_id "TE0012345"; family_id "roo"; locus_id "roo{}1"; length "151"; repeat_class "LTR/Pao"; divergence 12.3;
    /// ```
    pub fn gtf_attributes(&self) -> String {
        format!(
            "gene_id \"{}\"; transcript_id \"{}\"; family_id \"{}\"; locus_id \"{}\"; length \"{}\"; repeat_class \"{}\"; divergence {};",
            self.gene_id,
            self.transcript_id(),
            self.family,
            self.locus_id,
            self.length,
            self.repeat_class,
            self.perc_div,
        )
    }

    /// Renders this locus as one tab-separated, 9-column GTF line, without the line break.
    pub fn gtf_line(&self) -> String {
        format!(
            "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
            self.seqname,
            GTF_SOURCE,
            GTF_FEATURE_TYPE,
            self.start,
            self.end,
            self.score,
            self.strand,
            GTF_FRAME,
            self.gtf_attributes(),
        )
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
/// The console summary of a parsed report.
///
/// # Fields
///
/// * `n_records`: The number of TE loci.
/// * `n_families`: The number of distinct repeat names.
/// * `top`: The most frequent families with their locus counts, sorted by count
///   (descending) and then by the order in which each family was first seen.
pub struct FamilySummary {
    pub n_records: usize,
    pub n_families: usize,
    pub top: Vec<(String, usize)>,
}

#[derive(Clone, Debug, Default)]
/// An ordered collection of TE loci converted from a RepeatMasker report.
pub struct TeAnnotations {
    records: Vec<TeRecord>,
}

impl TeAnnotations {
    pub fn new(records: Vec<TeRecord>) -> TeAnnotations {
        TeAnnotations { records }
    }

    pub fn from_rmstruct(rm: RmStruct) -> TeAnnotations {
        TeAnnotations::new(rm.records)
    }

    /// Constructs a [TeAnnotations] instance from a RepeatMasker `.out` file.
    ///
    /// ### Arguments
    ///
    /// * `file_path`: An [`AsRef<std::path::Path>`] specifying the location of the report.
    /// * `po`: The [ParseOptions] used by the reader.
    ///
    /// ### Returns
    ///
    /// Returns an [`anyhow::Result<TeAnnotations>`] holding one record per kept line of the
    /// report, in file order.
    ///
    /// ### Example
    ///
    /// ```rust,no_run
    /// use rmsk2gtf::options::ParseOptions;
    /// use rmsk2gtf::TeAnnotations;
    ///
    /// let tes = TeAnnotations::from_rmsk_out("dm6.fa.out", &ParseOptions::default())?;
    /// tes.write_gtf("dm6_te.gtf")?;
    /// # Ok::<(), anyhow::Error>(())
    /// ```
    pub fn from_rmsk_out<P: AsRef<Path>>(
        file_path: P,
        po: &ParseOptions,
    ) -> anyhow::Result<TeAnnotations> {
        let rm = RmStruct::from_rmsk_out(file_path, po)?;
        Ok(TeAnnotations::from_rmstruct(rm))
    }

    pub fn records(&self) -> &[TeRecord] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TeRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Counts the loci of each family. Families are listed in the order in which they
    /// first appear in the input.
    pub fn family_counts(&self) -> Vec<(String, usize)> {
        let mut index: HashMap<&str, usize> = HashMap::new();
        let mut counts: Vec<(String, usize)> = Vec::new();

        for r in self.records.iter() {
            match index.get(r.family.as_str()) {
                Some(&i) => counts[i].1 += 1,
                None => {
                    index.insert(r.family.as_str(), counts.len());
                    counts.push((r.family.clone(), 1));
                }
            }
        }
        counts
    }

    /// Summarizes the collection for the console report.
    ///
    /// Families with equal counts keep their first-seen order, so the report is the same
    /// on every run.
    pub fn summary(&self, so: &SummaryOptions) -> FamilySummary {
        let mut top = self.family_counts();
        let n_families = top.len();

        // stable sort
        top.sort_by(|a, b| b.1.cmp(&a.1));
        top.truncate(so.top_n);

        FamilySummary {
            n_records: self.len(),
            n_families,
            top,
        }
    }

    /// Writes the collection as a Telescope-compatible GTF file.
    ///
    /// An existing file at `file_path` is overwritten. The write is not atomic: if it
    /// fails midway, a truncated file is left behind.
    ///
    /// ### Errors
    ///
    /// This function returns an error if the file cannot be created or written, for
    /// example when its directory does not exist or is not writable.
    pub fn write_gtf<T: AsRef<Path>>(&self, file_path: T) -> anyhow::Result<()> {
        let file_path = file_path.as_ref();
        let file = File::create(file_path).with_context(|| {
            format!(
                "Could not create the output GTF file {:?}",
                file_path.as_os_str()
            )
        })?;

        self.write_gtf_to(BufWriter::with_capacity(4194304, file))
            .with_context(|| format!("Could not write the GTF file {:?}", file_path.as_os_str()))?;

        info!("Wrote {} GTF records to {:?}", self.len(), file_path);
        Ok(())
    }

    /// Writes the GTF header block followed by one line per record to `writer`.
    pub fn write_gtf_to<W: Write>(&self, mut writer: W) -> anyhow::Result<()> {
        for h in GTF_HEADER.iter() {
            writeln!(writer, "{}", h)?;
        }
        for r in self.records.iter() {
            writeln!(writer, "{}", r.gtf_line())?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Returns the collection as a polars [DataFrame], one row per locus.
    ///
    /// The columns are `seqname`, `start`, `end`, `strand`, `family`, `repeat_class`,
    /// `gene_id`, `locus_id`, `length`, `divergence` and `score`. `divergence` and
    /// `score` are kept as the strings found in the report.
    pub fn df(&self) -> anyhow::Result<DataFrame> {
        let df_vec = vec![
            str_series("seqname", self.iter().map(|r| r.seqname.as_str())),
            i64_series("start", self.iter().map(|r| r.start)),
            i64_series("end", self.iter().map(|r| r.end)),
            str_series("strand", self.iter().map(|r| r.strand.as_str())),
            str_series("family", self.iter().map(|r| r.family.as_str())),
            str_series("repeat_class", self.iter().map(|r| r.repeat_class.as_str())),
            str_series("gene_id", self.iter().map(|r| r.gene_id.as_str())),
            str_series("locus_id", self.iter().map(|r| r.locus_id.as_str())),
            i64_series("length", self.iter().map(|r| r.length)),
            str_series("divergence", self.iter().map(|r| r.perc_div.as_str())),
            str_series("score", self.iter().map(|r| r.score.as_str())),
        ];

        Ok(DataFrame::new(df_vec)?)
    }

    /// Writes [TeAnnotations::df] as a tab-separated table with a header row.
    pub fn write_table<T: AsRef<Path>>(&self, file_path: T) -> anyhow::Result<()> {
        let file_path = file_path.as_ref();
        let mut out_df = self.df()?;

        let file = File::create(file_path).with_context(|| {
            format!(
                "Could not create the output table {:?}",
                file_path.as_os_str()
            )
        })?;
        let mut file = BufWriter::with_capacity(4194304, file);
        CsvWriter::new(&mut file)
            .include_header(true)
            .with_separator(b'\t')
            .finish(&mut out_df)?;

        info!("Wrote the record table to {:?}", file_path);
        Ok(())
    }
}

fn str_series<'a>(name: &str, values: impl Iterator<Item = &'a str>) -> Series {
    Series::new(name, values.collect::<Vec<&str>>())
}

fn i64_series(name: &str, values: impl Iterator<Item = i64>) -> Series {
    Series::new(name, values.collect::<Vec<i64>>())
}

impl<'a> IntoIterator for &'a TeAnnotations {
    type Item = &'a TeRecord;
    type IntoIter = std::slice::Iter<'a, TeRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::te_utils::{Strand, TeId};

    fn te(family: &str, ordinal: u32, start: i64, end: i64, strand: Strand) -> TeRecord {
        let locus_id = format!("{}{{}}{}", family, ordinal);
        let gene_id = TeId::from_locus_id(&locus_id).to_gene_id("TE");
        TeRecord {
            seqname: String::from("chr2L"),
            start,
            end,
            strand,
            family: family.to_string(),
            repeat_class: String::from("LTR"),
            gene_id,
            locus_id,
            locus_ordinal: ordinal,
            length: end - start + 1,
            perc_div: String::from("12.3"),
            score: String::from("1504"),
        }
    }

    #[test]
    fn test_gtf_line() {
        let r = te("DNAREP1", 1, 100, 250, Strand::Negative);
        let id = r.gene_id.clone();
        let expected = format!(
            "chr2L\tRepeatMasker\texon\t100\t250\t1504\t-\t.\tgene_id \"{id}\"; transcript_id \"{id}\"; family_id \"DNAREP1\"; locus_id \"DNAREP1{{}}1\"; length \"151\"; repeat_class \"LTR\"; divergence 12.3;"
        );
        assert_eq!(r.gtf_line(), expected);

        let line = r.gtf_line();
        let fields: Vec<&str> = line.split('\t').collect();
        assert_eq!(fields.len(), 9);

        let attrs: Vec<&str> = fields[8].trim_end_matches(';').split("; ").collect();
        let keys: Vec<&str> = attrs
            .iter()
            .filter_map(|a| a.split_once(' ').map(|(k, _)| k))
            .collect();
        assert_eq!(
            keys,
            vec![
                "gene_id",
                "transcript_id",
                "family_id",
                "locus_id",
                "length",
                "repeat_class",
                "divergence"
            ]
        );
        for a in &attrs[..6] {
            let (_, v) = a.split_once(' ').unwrap();
            assert!(v.starts_with('"') && v.ends_with('"'), "{}", a);
        }
        assert_eq!(attrs[6], "divergence 12.3");
    }

    #[test]
    fn test_write_gtf_to() -> anyhow::Result<()> {
        let tes = TeAnnotations::new(vec![
            te("roo", 1, 1, 10, Strand::Positive),
            te("roo", 2, 20, 40, Strand::Negative),
        ]);
        let mut buf: Vec<u8> = Vec::new();
        tes.write_gtf_to(&mut buf)?;
        let text = String::from_utf8(buf)?;
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 7);
        assert_eq!(&lines[..5], &GTF_HEADER[..]);
        assert_eq!(lines[5], tes.records()[0].gtf_line());
        assert_eq!(lines[6], tes.records()[1].gtf_line());
        assert!(text.ends_with(";\n"));
        Ok(())
    }

    #[test]
    fn test_empty_collection() -> anyhow::Result<()> {
        let tes = TeAnnotations::default();
        let mut buf: Vec<u8> = Vec::new();
        tes.write_gtf_to(&mut buf)?;
        assert_eq!(String::from_utf8(buf)?, format!("{}\n", GTF_HEADER.join("\n")));

        let s = tes.summary(&SummaryOptions::default());
        assert_eq!(s.n_records, 0);
        assert_eq!(s.n_families, 0);
        assert!(s.top.is_empty());
        assert_eq!(tes.df()?.height(), 0);
        Ok(())
    }

    #[test]
    fn test_summary_ties_keep_first_seen_order() {
        let tes = TeAnnotations::new(vec![
            te("gypsy", 1, 1, 2, Strand::Positive),
            te("roo", 1, 1, 2, Strand::Positive),
            te("copia", 1, 1, 2, Strand::Positive),
            te("roo", 2, 1, 2, Strand::Positive),
            te("copia", 2, 1, 2, Strand::Positive),
            te("Doc", 1, 1, 2, Strand::Positive),
        ]);

        assert_eq!(
            tes.family_counts(),
            vec![
                (String::from("gypsy"), 1),
                (String::from("roo"), 2),
                (String::from("copia"), 2),
                (String::from("Doc"), 1),
            ]
        );

        let s = tes.summary(&SummaryOptions::new(3));
        assert_eq!(s.n_records, 6);
        assert_eq!(s.n_families, 4);
        assert_eq!(
            s.top,
            vec![
                (String::from("roo"), 2),
                (String::from("copia"), 2),
                (String::from("gypsy"), 1),
            ]
        );
    }

    #[test]
    fn test_df() -> anyhow::Result<()> {
        let tes = TeAnnotations::new(vec![
            te("roo", 1, 1, 10, Strand::Positive),
            te("Doc", 1, 5, 7, Strand::Negative),
        ]);
        let df = tes.df()?;
        assert_eq!(df.height(), 2);
        assert_eq!(
            df.get_column_names(),
            vec![
                "seqname",
                "start",
                "end",
                "strand",
                "family",
                "repeat_class",
                "gene_id",
                "locus_id",
                "length",
                "divergence",
                "score"
            ]
        );
        let length: Vec<Option<i64>> = df.column("length")?.i64()?.into_iter().collect();
        assert_eq!(length, vec![Some(10), Some(3)]);
        Ok(())
    }
}
