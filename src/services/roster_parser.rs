//! Roster entry parsing
//!
//! A roster entry is a text block of five lines: the prefixed code, three
//! lines the export does not use, and the ward.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::ParseError;
use crate::models::RecordStub;

const FIELD_COUNT: usize = 5;
const CODE_PREFIX_LEN: usize = 2;
const WARD_SUFFIX_LEN: usize = 3;

/// How the ward is taken from the last line of a roster block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WardPolicy {
    /// The whole line
    Raw,
    /// Only its last three characters
    #[default]
    LastThree,
}

impl WardPolicy {
    pub fn apply(self, field: &str) -> String {
        match self {
            WardPolicy::Raw => field.to_string(),
            WardPolicy::LastThree => {
                let len = field.chars().count();
                field.chars().skip(len.saturating_sub(WARD_SUFFIX_LEN)).collect()
            }
        }
    }
}

impl FromStr for WardPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "raw" => Ok(WardPolicy::Raw),
            "last_three" | "last3" => Ok(WardPolicy::LastThree),
            other => Err(format!("unknown ward policy '{}'", other)),
        }
    }
}

/// Turns a roster block and its name field into a stub.
///
/// Whitespace inside the block is discarded except line breaks, which separate
/// the fields.
pub fn parse_roster_entry(block: &str, name: &str, policy: WardPolicy) -> Result<RecordStub, ParseError> {
    let compact: String = block
        .chars()
        .filter(|c| *c == '\n' || !c.is_whitespace())
        .collect();
    let fields: Vec<&str> = compact.trim().split('\n').collect();
    if fields.len() != FIELD_COUNT {
        return Err(ParseError::FieldCount { found: fields.len() });
    }

    let code = fields[0];
    let id: String = code.chars().skip(CODE_PREFIX_LEN).collect();
    if id.is_empty() {
        return Err(ParseError::EmptyIdentifier {
            raw: code.to_string(),
        });
    }

    Ok(RecordStub::new(id, policy.apply(fields[4]), name.trim()))
}
