//! Predicate filtering and 1-based pagination over the in-memory lead list.
//! Every call rescans the whole collection; the list is bounded by the fetch limit.

use crate::domain::lead::Lead;
use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE_SIZE: usize = 10;
pub const UNASSIGNED: &str = "unassigned";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "user_id")]
pub enum AssigneeFilter {
    #[default]
    Any,
    Unassigned,
    User(String),
}

impl AssigneeFilter {
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            None | Some("") => AssigneeFilter::Any,
            Some(value) if value.eq_ignore_ascii_case(UNASSIGNED) => AssigneeFilter::Unassigned,
            Some(value) => AssigneeFilter::User(value.to_string()),
        }
    }

    fn matches(&self, lead: &Lead) -> bool {
        match self {
            AssigneeFilter::Any => true,
            AssigneeFilter::Unassigned => !lead.is_assigned(),
            AssigneeFilter::User(id) => lead.assigned_to() == Some(id.as_str()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LeadFilter {
    pub source: Option<String>,
    pub campaign: Option<String>,
    pub assigned_to: AssigneeFilter,
    pub search: Option<String>,
}

/// Query-string shape of a filter; blank values are treated as absent.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LeadFilterParams {
    pub source: Option<String>,
    pub campaign: Option<String>,
    pub assigned_to: Option<String>,
    pub search: Option<String>,
}

impl From<LeadFilterParams> for LeadFilter {
    fn from(params: LeadFilterParams) -> Self {
        Self {
            source: non_blank(params.source),
            campaign: non_blank(params.campaign),
            assigned_to: AssigneeFilter::parse(params.assigned_to.as_deref()),
            search: non_blank(params.search),
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn active(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl LeadFilter {
    pub fn is_active(&self) -> bool {
        active(&self.source).is_some()
            || active(&self.campaign).is_some()
            || self.assigned_to != AssigneeFilter::Any
            || active(&self.search).is_some()
    }

    pub fn matches(&self, lead: &Lead) -> bool {
        if let Some(source) = active(&self.source) {
            let hit = lead.source.as_deref() == Some(source) || lead.source_type.as_deref() == Some(source);
            if !hit {
                return false;
            }
        }

        if let Some(campaign) = active(&self.campaign) {
            if lead.campaign.as_deref() != Some(campaign) {
                return false;
            }
        }

        if !self.assigned_to.matches(lead) {
            return false;
        }

        if let Some(search) = active(&self.search) {
            let needle = search.to_lowercase();
            let hit = [&lead.name, &lead.email, &lead.phone]
                .into_iter()
                .flatten()
                .any(|field| field.to_lowercase().contains(&needle));
            if !hit {
                return false;
            }
        }

        true
    }

    /// Leads satisfying every active predicate, in their original order.
    pub fn apply<'a>(&self, leads: &'a [Lead]) -> Vec<&'a Lead> {
        leads.iter().filter(|lead| self.matches(lead)).collect()
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: usize,
    pub page_size: usize,
    pub total: usize,
    pub total_pages: usize,
}

impl<T> Page<T> {
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            page_size: self.page_size,
            total: self.total,
            total_pages: self.total_pages,
        }
    }
}

/// Slices `items` to the 1-based `page`. Page 0 is read as page 1, a zero
/// page size as the default, and pages past the end come back empty.
pub fn paginate<T: Clone>(items: &[T], page: usize, page_size: usize) -> Page<T> {
    let page = page.max(1);
    let page_size = if page_size == 0 { DEFAULT_PAGE_SIZE } else { page_size };
    let total = items.len();
    let total_pages = total.div_ceil(page_size);
    let start = (page - 1).saturating_mul(page_size);

    let items = items
        .iter()
        .skip(start)
        .take(page_size)
        .cloned()
        .collect();

    Page {
        items,
        page,
        page_size,
        total,
        total_pages,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Vec<Lead> {
        Lead::from_values(vec![
            json!({ "id": 1, "name": "A", "source": "meta_ads" }),
            json!({ "id": 2, "name": "B", "source": "google_sheets", "assigned_to": "7" }),
            json!({ "id": 3, "full_name": "Chitra Rao", "source_type": "meta_ads", "campaign": "Holi", "email": "CHITRA@corp.in" }),
            json!({ "id": 4, "Name": "Dev", "source": "api", "mobile": "+91 99000 11111", "assigned_to": "3" }),
        ])
    }

    fn ids(leads: &[&Lead]) -> Vec<String> {
        leads.iter().map(|l| l.id.clone()).collect()
    }

    #[test]
    fn test_source_filter_example() {
        let leads = Lead::from_values(vec![
            json!({ "id": 1, "name": "A", "source": "meta_ads" }),
            json!({ "id": 2, "name": "B", "source": "google_sheets", "assigned_to": "7" }),
        ]);
        let filter = LeadFilter {
            source: Some("meta_ads".into()),
            ..Default::default()
        };
        assert_eq!(ids(&filter.apply(&leads)), vec!["1"]);
    }

    #[test]
    fn test_source_matches_either_field() {
        let filter = LeadFilter {
            source: Some("meta_ads".into()),
            ..Default::default()
        };
        assert_eq!(ids(&filter.apply(&sample())), vec!["1", "3"]);
    }

    #[test]
    fn test_empty_filter_is_identity() {
        let leads = sample();
        let filter = LeadFilter::from(LeadFilterParams {
            source: Some("  ".into()),
            search: Some(String::new()),
            ..Default::default()
        });
        assert!(!filter.is_active());
        let out: Vec<Lead> = filter.apply(&leads).into_iter().cloned().collect();
        assert_eq!(out, leads);
    }

    #[test]
    fn test_unassigned_and_user_filters() {
        let leads = sample();
        let unassigned = LeadFilter {
            assigned_to: AssigneeFilter::parse(Some("unassigned")),
            ..Default::default()
        };
        assert_eq!(ids(&unassigned.apply(&leads)), vec!["1", "3"]);

        let user = LeadFilter {
            assigned_to: AssigneeFilter::parse(Some("7")),
            ..Default::default()
        };
        assert_eq!(ids(&user.apply(&leads)), vec!["2"]);

        let nobody = LeadFilter {
            assigned_to: AssigneeFilter::parse(Some("99")),
            ..Default::default()
        };
        assert!(nobody.apply(&leads).is_empty());
    }

    #[test]
    fn test_search_is_case_insensitive_over_aliases() {
        let leads = sample();
        let by_email = LeadFilter {
            search: Some("chitra@".into()),
            ..Default::default()
        };
        assert_eq!(ids(&by_email.apply(&leads)), vec!["3"]);

        let by_phone = LeadFilter {
            search: Some("99000".into()),
            ..Default::default()
        };
        assert_eq!(ids(&by_phone.apply(&leads)), vec!["4"]);

        let by_name = LeadFilter {
            search: Some("DEV".into()),
            ..Default::default()
        };
        assert_eq!(ids(&by_name.apply(&leads)), vec!["4"]);
    }

    #[test]
    fn test_predicates_combine() {
        let filter = LeadFilter {
            source: Some("meta_ads".into()),
            campaign: Some("Holi".into()),
            assigned_to: AssigneeFilter::Unassigned,
            search: Some("rao".into()),
        };
        assert_eq!(ids(&filter.apply(&sample())), vec!["3"]);
    }

    #[test]
    fn test_pages_reassemble_filtered_set() {
        let items: Vec<usize> = (0..23).collect();
        for page_size in [1, 5, 10, 23, 50] {
            let first = paginate(&items, 1, page_size);
            let mut rebuilt = Vec::new();
            for page in 1..=first.total_pages {
                rebuilt.extend(paginate(&items, page, page_size).items);
            }
            assert_eq!(rebuilt, items, "page_size {}", page_size);
            assert_eq!(first.total, 23);
        }
    }

    #[test]
    fn test_pagination_edges() {
        let items = vec!["a", "b", "c"];
        let page = paginate(&items, 0, 2);
        assert_eq!(page.page, 1);
        assert_eq!(page.items, vec!["a", "b"]);
        assert_eq!(page.total_pages, 2);

        assert!(paginate(&items, 5, 2).items.is_empty());
        assert_eq!(paginate(&items, 1, 0).page_size, DEFAULT_PAGE_SIZE);

        let empty: Vec<u8> = Vec::new();
        let page = paginate(&empty, 1, 10);
        assert_eq!(page.total, 0);
        assert_eq!(page.total_pages, 0);
    }
}
