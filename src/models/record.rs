use serde::{Deserialize, Serialize};

use super::facility::FacilityCode;

/// Placeholder conduct value for an individual whose detail page could not be read.
pub const UNAVAILABLE: &str = "UNAVAILABLE";

/// An individual as listed on a facility roster, before the detail page is read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordStub {
    pub id: String,
    pub ward: String,
    pub name: String,
}

impl RecordStub {
    pub fn new(id: impl Into<String>, ward: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ward: ward.into(),
            name: name.into(),
        }
    }
}

/// A roster entry enriched with its conduct classification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConductRecord {
    pub id: String,
    pub ward: String,
    pub name: String,
    pub conduct: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl ConductRecord {
    pub fn found(stub: &RecordStub, conduct: impl Into<String>) -> Self {
        Self {
            id: stub.id.clone(),
            ward: stub.ward.clone(),
            name: stub.name.clone(),
            conduct: conduct.into(),
            note: None,
        }
    }

    pub fn unavailable(stub: &RecordStub, detail: impl Into<String>) -> Self {
        Self {
            id: stub.id.clone(),
            ward: stub.ward.clone(),
            name: stub.name.clone(),
            conduct: UNAVAILABLE.to_string(),
            note: Some(detail.into()),
        }
    }

    pub fn is_unavailable(&self) -> bool {
        self.conduct == UNAVAILABLE
    }
}

/// Records of one facility, in roster order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacilityResult {
    pub facility: FacilityCode,
    pub records: Vec<ConductRecord>,
}

/// Everything collected in one run, keyed by facility in selection order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionResult {
    facilities: Vec<FacilityResult>,
}

impl CollectionResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends records to a facility, creating its entry if needed.
    pub fn extend(&mut self, facility: &FacilityCode, records: impl IntoIterator<Item = ConductRecord>) {
        match self.facilities.iter_mut().find(|f| &f.facility == facility) {
            Some(existing) => existing.records.extend(records),
            None => self.facilities.push(FacilityResult {
                facility: facility.clone(),
                records: records.into_iter().collect(),
            }),
        }
    }

    pub fn get(&self, facility: &str) -> Option<&[ConductRecord]> {
        self.facilities
            .iter()
            .find(|f| f.facility.as_str() == facility)
            .map(|f| f.records.as_slice())
    }

    pub fn contains(&self, facility: &str) -> bool {
        self.get(facility).is_some()
    }

    pub fn facilities(&self) -> &[FacilityResult] {
        &self.facilities
    }

    pub fn facility_codes(&self) -> impl Iterator<Item = &FacilityCode> {
        self.facilities.iter().map(|f| &f.facility)
    }

    pub fn is_empty(&self) -> bool {
        self.facilities.is_empty()
    }

    pub fn record_count(&self) -> usize {
        self.facilities.iter().map(|f| f.records.len()).sum()
    }

    pub fn unavailable_count(&self) -> usize {
        self.facilities
            .iter()
            .flat_map(|f| f.records.iter())
            .filter(|r| r.is_unavailable())
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unavailable_record_keeps_stub_identity() {
        let stub = RecordStub::new("1234", "D7", "John Doe");
        let record = ConductRecord::unavailable(&stub, "timed out");
        assert_eq!(record.id, "1234");
        assert_eq!(record.name, "John Doe");
        assert_eq!(record.conduct, UNAVAILABLE);
        assert_eq!(record.note.as_deref(), Some("timed out"));
        assert!(record.is_unavailable());
    }

    #[test]
    fn extend_keeps_first_seen_facility_order() {
        let stub = RecordStub::new("1", "A01", "A");
        let mut result = CollectionResult::new();
        result.extend(&"X2".into(), Vec::new());
        result.extend(&"X1".into(), vec![ConductRecord::found(&stub, "GOOD")]);
        result.extend(&"X2".into(), vec![ConductRecord::found(&stub, "BAD")]);

        let codes: Vec<&str> = result.facility_codes().map(FacilityCode::as_str).collect();
        assert_eq!(codes, vec!["X2", "X1"]);
        assert_eq!(result.get("X2").map(<[_]>::len), Some(1));
        assert_eq!(result.record_count(), 2);
    }
}
