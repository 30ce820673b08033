use serde::{Deserialize, Serialize};
use std::fmt;

/// Facilities offered for selection when nothing else is configured.
pub const KNOWN_FACILITIES: [&str; 5] = ["PAMC", "CPBV", "CPFBV", "CPP", "UPRRO"];

/// Short code identifying a detention facility on the portal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FacilityCode(String);

impl FacilityCode {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FacilityCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FacilityCode {
    fn from(code: &str) -> Self {
        Self::new(code)
    }
}

impl From<String> for FacilityCode {
    fn from(code: String) -> Self {
        Self(code)
    }
}

/// Trims the operator's selection, drops blanks and keeps the first
/// occurrence of each code.
pub fn normalize_selection<I, S>(codes: I) -> Vec<FacilityCode>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut selected: Vec<FacilityCode> = Vec::new();
    for code in codes {
        let code = code.as_ref().trim();
        if code.is_empty() || selected.iter().any(|c| c.as_str() == code) {
            continue;
        }
        selected.push(FacilityCode::new(code));
    }
    selected
}
