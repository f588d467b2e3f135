pub mod repeatmasker;
pub use repeatmasker::RmStruct;
pub use repeatmasker::TeRecord;
