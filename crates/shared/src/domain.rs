use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Run timestamp as the tracking backends emit it: epoch milliseconds or preformatted text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RunTime {
    Millis(i64),
    Text(String),
}

impl RunTime {
    pub fn as_datetime(&self) -> Option<DateTime<Utc>> {
        match self {
            RunTime::Millis(ms) => DateTime::<Utc>::from_timestamp_millis(*ms),
            RunTime::Text(text) => DateTime::parse_from_rfc3339(text)
                .or_else(|_| DateTime::parse_from_rfc2822(text))
                .ok()
                .map(|parsed| parsed.with_timezone(&Utc)),
        }
    }

    pub fn display(&self) -> String {
        match self.as_datetime() {
            Some(at) => at.format("%Y-%m-%d %H:%M").to_string(),
            None => match self {
                RunTime::Millis(ms) => ms.to_string(),
                RunTime::Text(text) => text.clone(),
            },
        }
    }
}

/// Run identifier; tracking backends emit either a string or a number.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RunId {
    Number(i64),
    Text(String),
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunId::Number(id) => write!(f, "{id}"),
            RunId::Text(id) => f.write_str(id),
        }
    }
}

impl From<&str> for RunId {
    fn from(value: &str) -> Self {
        RunId::Text(value.to_string())
    }
}

impl From<i64> for RunId {
    fn from(value: i64) -> Self {
        RunId::Number(value)
    }
}

macro_rules! run_record {
    (
        $(#[$meta:meta])* $name:ident
        $({ $($(#[$field_meta:meta])* pub $field:ident: $ty:ty),* $(,)? })?
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
        #[serde(rename_all = "camelCase")]
        pub struct $name {
            pub id: RunId,
            #[serde(default, skip_serializing_if = "Option::is_none")]
            pub name: Option<String>,
            #[serde(default, skip_serializing_if = "Option::is_none")]
            pub user: Option<String>,
            #[serde(default, skip_serializing_if = "Option::is_none")]
            pub start_time: Option<RunTime>,
            #[serde(default, skip_serializing_if = "Option::is_none")]
            pub end_time: Option<RunTime>,
            #[serde(default, skip_serializing_if = "Option::is_none")]
            pub status: Option<String>,
            #[serde(default, skip_serializing_if = "Option::is_none")]
            pub description: Option<String>,
            $($($(#[$field_meta])* pub $field: $ty,)*)?
        }
    };
}

run_record!(
    /// Generated case file, listed by the case generator.
    CaseBucket
);
run_record!(
    /// Populated schedule, listed by the scheduler.
    PopSchedule
);
run_record!(
    /// Simulation run (experiment) listed by the risk-based simulation service.
    SimulationRun {
        #[serde(default)]
        pub is_selected: bool,
    }
);
