pub mod candidates;
pub use candidates::{CandidateExtractor, EdgeContourExtractor, detect_candidates_from_image};
