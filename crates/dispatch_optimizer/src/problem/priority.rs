use std::{borrow::Cow, fmt};

use schemars::{JsonSchema, Schema, SchemaGenerator, json_schema};
use serde::{Deserialize, Serialize};

use crate::error::DataValidationError;

/// Urgency class of an order. Serialized as its numeric code.
#[derive(
    Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default,
)]
#[serde(try_from = "u8", into = "u8")]
pub enum Priority {
    /// `1`
    #[default]
    Normal,
    /// `2`, "priority" orders.
    High,
    /// `3`
    Express,
}

impl Priority {
    pub const ALL: [Priority; 3] = [Priority::Normal, Priority::High, Priority::Express];

    pub const fn code(self) -> u8 {
        match self {
            Priority::Normal => 1,
            Priority::High => 2,
            Priority::Express => 3,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Priority::Normal => "normal",
            Priority::High => "priority",
            Priority::Express => "express",
        }
    }
}

impl TryFrom<u8> for Priority {
    type Error = DataValidationError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Priority::Normal),
            2 => Ok(Priority::High),
            3 => Ok(Priority::Express),
            other => Err(DataValidationError::InvalidPriority(other)),
        }
    }
}

impl From<Priority> for u8 {
    fn from(value: Priority) -> Self {
        value.code()
    }
}

impl JsonSchema for Priority {
    fn schema_name() -> Cow<'static, str> {
        "Priority".into()
    }

    fn json_schema(_generator: &mut SchemaGenerator) -> Schema {
        json_schema!({
            "description": "1 = normal, 2 = priority, 3 = express",
            "type": "integer",
            "enum": [1, 2, 3]
        })
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
