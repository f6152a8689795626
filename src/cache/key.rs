use std::fmt::Display;

use crate::api::{value_to_query, Params};

/// Build the cache key for a resource type or URL plus its query params.
///
/// Entries are emitted in sorted key order as `_key-value`, with the
/// delimiters `_` and `-` (and the escape char `%`) percent-escaped in both
/// halves so that no two distinct parameter sets share a key.
pub fn generate_key(base: &str, params: &Params) -> String {
    let mut key = base.to_string();
    for (name, value) in params.iter() {
        key.push('_');
        key.push_str(&escape(name));
        key.push('-');
        key.push_str(&escape(&value_to_query(value)));
    }
    key
}

/// Cache key of a single item.
///
/// The id is escaped like param text, so it never contains a bare `-` and
/// can't be mistaken for a list key.
pub fn item_key(resource_type: &str, id: impl Display) -> String {
    format!("{}_{}", resource_type, escape(&id.to_string()))
}

fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '%' => out.push_str("%25"),
            '_' => out.push_str("%5F"),
            '-' => out.push_str("%2D"),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_params_is_bare_base() {
        assert_eq!(generate_key("areas", &Params::new()), "areas");
    }

    #[test]
    fn test_insertion_order_does_not_matter() {
        let a = Params::new().with("page", 2).with("count", 5);
        let b = Params::new().with("count", 5).with("page", 2);

        assert_eq!(generate_key("areas", &a), "areas_count-5_page-2");
        assert_eq!(generate_key("areas", &a), generate_key("areas", &b));
    }

    #[test]
    fn test_delimiters_in_values_do_not_collide() {
        // Naive concatenation would render both as "x_a-b_c-d"
        let one = Params::new().with("a", "b_c-d");
        let two = Params::new().with("a", "b").with("c", "d");

        assert_ne!(generate_key("x", &one), generate_key("x", &two));
    }

    #[test]
    fn test_distinct_values_distinct_keys() {
        let one = Params::new().with("hours", 24);
        let two = Params::new().with("hours", 48);
        let nested = Params::new().with("filter", json!({"a": 1}));

        assert_ne!(generate_key("co2", &one), generate_key("co2", &two));
        assert_eq!(generate_key("co2", &nested), "co2_filter-{\"a\":1}");
    }

    #[test]
    fn test_item_key() {
        assert_eq!(item_key("terminals", 5), "terminals_5");
        assert_eq!(item_key("areas", "lab-1"), "areas_lab%2D1");
    }

    #[test]
    fn test_item_key_never_matches_list_key() {
        let list = generate_key("areas", &Params::new().with("lab", 1));

        assert_eq!(list, "areas_lab-1");
        assert_ne!(item_key("areas", "lab-1"), list);
    }
}
