use crate::domain::fields::{
    first_non_empty, parse_timestamp, scalar_text, CAMPAIGN_KEYS, EMAIL_KEYS, ID_KEYS, NAME_KEYS,
    PHONE_KEYS, SOURCE_KEYS, SOURCE_TYPE_KEYS,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};

/// Assignment fields carried on a lead. Present as a whole or not at all.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct LeadAssignment {
    pub assigned_to: String,
    pub assigned_role: String,
    pub assigned_to_name: Option<String>,
    pub assignment_notes: Option<String>,
    pub assignment_date: Option<DateTime<Utc>>,
    /// Set while the write only exists in the local outbox.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub pending_sync: bool,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Lead {
    pub id: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub source: Option<String>,
    pub source_type: Option<String>,
    pub campaign: Option<String>,
    #[serde(flatten)]
    pub assignment: Option<LeadAssignment>,
    /// The upstream record as received.
    #[serde(skip)]
    pub raw: Map<String, Value>,
}

impl Lead {
    /// Builds a lead from an arbitrary upstream record. Records without any
    /// usable identifier are rejected.
    pub fn from_value(value: Value) -> Option<Self> {
        let Value::Object(raw) = value else {
            return None;
        };
        let id = first_non_empty(&raw, ID_KEYS)?;

        let assignment = raw
            .get("assigned_to")
            .and_then(scalar_text)
            .map(|assigned_to| LeadAssignment {
                assigned_to,
                assigned_role: raw
                    .get("assigned_role")
                    .and_then(scalar_text)
                    .unwrap_or_default(),
                assigned_to_name: raw.get("assigned_to_name").and_then(scalar_text),
                assignment_notes: raw.get("assignment_notes").and_then(scalar_text),
                assignment_date: raw
                    .get("assignment_date")
                    .and_then(Value::as_str)
                    .and_then(parse_timestamp),
                pending_sync: false,
            });

        Some(Self {
            id,
            name: first_non_empty(&raw, NAME_KEYS),
            email: first_non_empty(&raw, EMAIL_KEYS),
            phone: first_non_empty(&raw, PHONE_KEYS),
            source: first_non_empty(&raw, SOURCE_KEYS),
            source_type: first_non_empty(&raw, SOURCE_TYPE_KEYS),
            campaign: first_non_empty(&raw, CAMPAIGN_KEYS),
            assignment,
            raw,
        })
    }

    pub fn from_values(values: Vec<Value>) -> Vec<Self> {
        let total = values.len();
        let leads: Vec<Lead> = values.into_iter().filter_map(Lead::from_value).collect();
        if leads.len() < total {
            tracing::warn!("Dropped {} lead records without an identifier", total - leads.len());
        }
        leads
    }

    pub fn assigned_to(&self) -> Option<&str> {
        self.assignment.as_ref().map(|a| a.assigned_to.as_str())
    }

    pub fn is_assigned(&self) -> bool {
        self.assignment.is_some()
    }
}
