use serde::{Deserialize, Serialize};

use crate::record::TxtRecord;

/// A DNS record as represented by the name.com v4 API
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NameComRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain_name: Option<String>,
    /// Host relative to the zone, absent (or empty) for the apex
    #[serde(default)]
    pub host: String,
    /// Fully qualified name, usually with a trailing dot
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fqdn: Option<String>,
    #[serde(rename = "type")]
    pub record_type: String,
    pub answer: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ttl: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct ListRecordsResponse {
    #[serde(default)]
    pub records: Vec<NameComRecord>,
    #[serde(default)]
    pub next_page: Option<u32>,
}

impl From<&TxtRecord> for NameComRecord {
    fn from(r: &TxtRecord) -> Self {
        NameComRecord {
            id: r.id,
            domain_name: None,
            host: r.host.to_owned(),
            fqdn: None,
            record_type: "TXT".to_string(),
            answer: r.value.to_owned(),
            ttl: r.ttl,
        }
    }
}

impl From<NameComRecord> for TxtRecord {
    fn from(r: NameComRecord) -> Self {
        TxtRecord {
            host: r.host,
            value: r.answer,
            ttl: r.ttl,
            id: r.id,
        }
    }
}

impl NameComRecord {
    /// Whether this record is a TXT record named `fqdn` in `zone`.
    /// Trailing dots are ignored on both sides.
    pub fn matches_host(&self, zone: &str, fqdn: &str) -> bool {
        if !self.record_type.eq_ignore_ascii_case("TXT") {
            return false;
        }
        let wanted = fqdn.trim().trim_end_matches('.');
        if let Some(f) = &self.fqdn {
            if f.trim().trim_end_matches('.') == wanted {
                return true;
            }
        }
        let zone = self.domain_name.as_deref().unwrap_or(zone);
        let own = if self.host.is_empty() {
            zone.to_owned()
        } else {
            format!("{}.{}", self.host.trim(), zone)
        };
        own.trim_end_matches('.') == wanted
    }
}

/// Pick the TXT record named `fqdn`. When several records share that name (apex and wildcard challenges
/// both live at `_acme-challenge.<zone>`), the one whose answer is `answer` wins over the first match.
pub(super) fn select_by_host(
    records: Vec<NameComRecord>,
    zone: &str,
    fqdn: &str,
    answer: Option<&str>,
) -> Option<NameComRecord> {
    let candidates: Vec<_> = records
        .into_iter()
        .filter(|r| r.matches_host(zone, fqdn))
        .collect();
    let preferred = answer
        .and_then(|a| candidates.iter().position(|r| r.answer == a))
        .unwrap_or(0);
    candidates.into_iter().nth(preferred)
}
