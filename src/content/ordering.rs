use std::cmp::Ordering;

use serde_json::Value;

use super::RecordMap;

pub const DISPLAY_ORDER: &str = "displayOrder";

/// Read `displayOrder`, treating missing or unparsable values as 0.
/// Form submissions sometimes deliver it as a string.
pub fn display_order(record: &RecordMap) -> i64 {
    match record.get(DISPLAY_ORDER) {
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .unwrap_or(0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0),
        _ => 0,
    }
}

fn text_key<'a>(record: &'a RecordMap, key: &str) -> &'a str {
    record.get(key).and_then(Value::as_str).unwrap_or("")
}

/// Dictionary-style comparison: letters compare case-insensitively first and
/// lowercase sorts before uppercase only when the texts are otherwise equal.
pub fn locale_cmp(a: &str, b: &str) -> Ordering {
    let folded = a
        .chars()
        .flat_map(char::to_lowercase)
        .cmp(b.chars().flat_map(char::to_lowercase));
    if folded != Ordering::Equal {
        return folded;
    }

    for (ca, cb) in a.chars().zip(b.chars()) {
        if ca == cb {
            continue;
        }
        match (ca.is_lowercase(), cb.is_lowercase()) {
            (true, false) => return Ordering::Less,
            (false, true) => return Ordering::Greater,
            _ => return ca.cmp(&cb),
        }
    }
    a.len().cmp(&b.len())
}

/// Stable sort by `displayOrder`, ties broken by the collection's text key.
pub fn sort_records(records: &mut [RecordMap], sort_key: &str) {
    records.sort_by(|a, b| {
        display_order(a)
            .cmp(&display_order(b))
            .then_with(|| locale_cmp(text_key(a, sort_key), text_key(b, sort_key)))
    });
}

/// Rewrite every `displayOrder` to the record's 0-based position.
pub fn renumber(records: &mut [RecordMap]) {
    for (index, record) in records.iter_mut().enumerate() {
        record.insert(DISPLAY_ORDER.to_string(), Value::from(index as i64));
    }
}

/// Newest first by `publishDate` (RFC 3339 or plain date strings compare
/// lexically), then by title.
pub fn sort_news(records: &mut [RecordMap]) {
    records.sort_by(|a, b| {
        text_key(b, "publishDate")
            .cmp(text_key(a, "publishDate"))
            .then_with(|| locale_cmp(text_key(a, "title"), text_key(b, "title")))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rec(v: Value) -> RecordMap {
        v.as_object().cloned().unwrap()
    }

    fn names(records: &[RecordMap]) -> Vec<&str> {
        records.iter().map(|r| text_key(r, "name")).collect()
    }

    #[test]
    fn test_ties_break_on_name() {
        let mut records = vec![
            rec(json!({"name": "Bob", "displayOrder": 0})),
            rec(json!({"name": "Alice", "displayOrder": 0})),
        ];
        sort_records(&mut records, "name");
        assert_eq!(names(&records), vec!["Alice", "Bob"]);
    }

    #[test]
    fn test_display_order_wins_over_name() {
        let mut records = vec![
            rec(json!({"name": "Alice", "displayOrder": 2})),
            rec(json!({"name": "Carol"})),
            rec(json!({"name": "Bob", "displayOrder": "1"})),
        ];
        sort_records(&mut records, "name");
        assert_eq!(names(&records), vec!["Carol", "Bob", "Alice"]);
    }

    #[test]
    fn test_locale_cmp_is_case_insensitive_first() {
        assert_eq!(locale_cmp("apple", "Banana"), Ordering::Less);
        assert_eq!(locale_cmp("Zed", "alpha"), Ordering::Greater);
        assert_eq!(locale_cmp("bob", "Bob"), Ordering::Less);
        assert_eq!(locale_cmp("Bob", "Bob"), Ordering::Equal);
        assert_eq!(locale_cmp("Bo", "Bob"), Ordering::Less);
    }

    #[test]
    fn test_renumber_uses_positions() {
        let mut records = vec![
            rec(json!({"name": "C", "displayOrder": 7})),
            rec(json!({"name": "A", "displayOrder": 7})),
            rec(json!({"name": "B"})),
        ];
        renumber(&mut records);
        let orders: Vec<i64> = records.iter().map(display_order).collect();
        assert_eq!(orders, vec![0, 1, 2]);
        assert_eq!(names(&records), vec!["C", "A", "B"]);
    }

    #[test]
    fn test_news_newest_first() {
        let mut records = vec![
            rec(json!({"title": "Old", "publishDate": "2024-01-05"})),
            rec(json!({"title": "New", "publishDate": "2024-03-01"})),
            rec(json!({"title": "Undated"})),
        ];
        sort_news(&mut records);
        let titles: Vec<&str> = records.iter().map(|r| text_key(r, "title")).collect();
        assert_eq!(titles, vec!["New", "Old", "Undated"]);
    }
}
