//! rmsk2gtf converts the transposable element (TE) annotations reported by
//! [RepeatMasker](https://www.repeatmasker.org/) into a GTF file that can be passed to
//! [Telescope](https://github.com/mlbendall/telescope) for locus-level TE quantification.
//!
//! A RepeatMasker `.out` report is read by [reader::RmStruct], which assigns each TE
//! locus a per-family ordinal and a reproducible pseudo identifier. The resulting
//! [TeAnnotations] can then be written as GTF, summarized by family, or exported as a
//! [Polars](https://pola.rs/) data frame.

pub mod options;
pub mod reader;
pub mod te_annotations;
pub mod te_utils;
pub use reader::TeRecord;
pub use te_annotations::{FamilySummary, TeAnnotations};
