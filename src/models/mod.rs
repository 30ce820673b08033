pub mod facility;
pub mod record;

pub use facility::{normalize_selection, FacilityCode, KNOWN_FACILITIES};
pub use record::{
    CollectionResult, ConductRecord, FacilityResult, RecordStub, UNAVAILABLE,
};
