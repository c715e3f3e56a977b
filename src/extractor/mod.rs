pub mod file_extractor;
pub mod output_manager;

pub use file_extractor::{
    BlockEvent, BlockFailure, ExtractionOutcome, ExtractionProgress, FileOperations, PlannedFile,
    WrittenFile,
};
pub use output_manager::{ConfigSnapshot, ExtractionReport, ExtractionSummary, OutputManager};
