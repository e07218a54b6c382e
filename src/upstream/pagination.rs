//! Date-keyed batch pagination over an upstream whose `offset` is capped
//! within a single filter "window" (spec §4.5, §9).

use serde_json::Value;

/// Page size. The spec allows 1..1000 but names 50 as canonical.
pub const PAGE_LIMIT: u32 = 50;
/// Beyond this cumulative offset the upstream refuses further pages for the
/// same filter expression; the filter must be rewritten to advance.
pub const OFFSET_CAP: u32 = 500;
/// Safety bound on total batches, so a pathological upstream (or filter
/// rewrite that never advances) cannot loop forever.
pub const MAX_BATCHES: u32 = 100;

/// Record-date field candidates, tried in order (glossary "record date").
const DATE_FIELDS: &[&str] = &[
    "creation-date",
    "creationDate",
    "last-tracked-time",
    "lastTrackedTime",
    "date",
];

pub fn extract_record_date(item: &Value) -> Option<String> {
    DATE_FIELDS
        .iter()
        .find_map(|&field| item.get(field).and_then(Value::as_str))
        .map(str::to_string)
}

/// Rewrite `filter`'s `startdate:'...'` clause to `last_date`, inserting the
/// clause if absent. `filter` is treated as an opaque brace-delimited,
/// comma-separated `key:'value'` expression — the gateway never otherwise
/// parses it.
pub fn rewrite_filter_with_startdate(filter: &str, last_date: &str) -> String {
    let trimmed = filter.trim();
    if trimmed.is_empty() {
        return format!("{{startdate:'{last_date}'}}");
    }

    if let Some(start) = trimmed.find("startdate:'") {
        let value_start = start + "startdate:'".len();
        if let Some(rel_end) = trimmed[value_start..].find('\'') {
            let value_end = value_start + rel_end;
            let mut rewritten = String::with_capacity(trimmed.len());
            rewritten.push_str(&trimmed[..value_start]);
            rewritten.push_str(last_date);
            rewritten.push_str(&trimmed[value_end..]);
            return rewritten;
        }
    }

    // No existing clause: splice one in just before the closing brace.
    if let Some(body) = trimmed.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
        let body = body.trim();
        if body.is_empty() {
            format!("{{startdate:'{last_date}'}}")
        } else {
            format!("{{{body}, startdate:'{last_date}'}}")
        }
    } else {
        format!("{{{trimmed}, startdate:'{last_date}'}}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn extracts_first_matching_candidate() {
        let item = json!({"lastTrackedTime": "2024-05-01T00:00:00Z", "date": "ignored"});
        assert_eq!(
            extract_record_date(&item).as_deref(),
            Some("2024-05-01T00:00:00Z")
        );
    }

    #[test]
    fn returns_none_when_no_candidate_present() {
        let item = json!({"foo": "bar"});
        assert_eq!(extract_record_date(&item), None);
    }

    #[test]
    fn inserts_startdate_into_existing_filter() {
        let filter = "{timewindow:'1h', status:'FAILED'}";
        let rewritten = rewrite_filter_with_startdate(filter, "2024-05-01T12:34:56Z");
        assert_eq!(
            rewritten,
            "{timewindow:'1h', status:'FAILED', startdate:'2024-05-01T12:34:56Z'}"
        );
    }

    #[test]
    fn replaces_existing_startdate_clause() {
        let filter = "{startdate:'2024-01-01T00:00:00Z', status:'FAILED'}";
        let rewritten = rewrite_filter_with_startdate(filter, "2024-05-01T12:34:56Z");
        assert_eq!(
            rewritten,
            "{startdate:'2024-05-01T12:34:56Z', status:'FAILED'}"
        );
    }

    #[test]
    fn builds_filter_from_empty_string() {
        assert_eq!(
            rewrite_filter_with_startdate("", "2024-05-01T12:34:56Z"),
            "{startdate:'2024-05-01T12:34:56Z'}"
        );
    }
}
