use crate::models::{CollectionResult, ConductRecord, FacilityCode};

/// Folds per-facility record lists into the export structure.
///
/// Facility order and record order are kept as given. A facility with no
/// records still gets an (empty) entry; a repeated facility has its records
/// appended to the first entry.
pub fn aggregate<I>(per_facility: I) -> CollectionResult
where
    I: IntoIterator<Item = (FacilityCode, Vec<ConductRecord>)>,
{
    let mut result = CollectionResult::new();
    for (facility, records) in per_facility {
        result.extend(&facility, records);
    }
    result
}
