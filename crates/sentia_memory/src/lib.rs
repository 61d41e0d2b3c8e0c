pub mod appraisal;
pub mod autobiography;
pub mod narrative;
pub mod similarity;

pub use appraisal::{AppraisalEngine, EmotionalProfile, OutcomeSign};
pub use autobiography::{AutobiographicalEvent, AutobiographicalMemory};
pub use narrative::{NarrativeEngine, NarrativeTheme, SelfNarrative};
pub use similarity::{Experience, ExperienceProfile, SimilarMatch, SimilarityEngine};
