//! Ordered header list shared by requests and responses
//!
//! Header lines are kept in arrival order and repeated names are kept as
//! separate entries, so several `Set-Cookie` lines survive a round trip.

/// Header lines as `(name, value)` pairs, in wire order.
pub type Headers = Vec<(String, String)>;

/// First value for `key`, ignoring ASCII case.
pub fn header_value<'a>(headers: &'a [(String, String)], key: &str) -> Option<&'a str> {
    header_values(headers, key).next()
}

/// Every value for `key`, ignoring ASCII case, in wire order.
pub fn header_values<'a, 'k>(
    headers: &'a [(String, String)],
    key: &'k str,
) -> impl Iterator<Item = &'a str> + use<'a, 'k> {
    headers
        .iter()
        .filter(move |(k, _)| k.eq_ignore_ascii_case(key))
        .map(|(_, v)| v.as_str())
}

/// Drops every line named `key`, ignoring ASCII case.
pub fn remove_header(headers: &mut Headers, key: &str) {
    headers.retain(|(k, _)| !k.eq_ignore_ascii_case(key));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cookies() -> Headers {
        vec![
            ("Set-Cookie".into(), "AUTH_SESSION_ID=a".into()),
            ("Content-Type".into(), "text/html".into()),
            ("set-cookie".into(), "KC_RESTART=b".into()),
        ]
    }

    #[test]
    fn first_match_wins() {
        assert_eq!(header_value(&cookies(), "SET-COOKIE"), Some("AUTH_SESSION_ID=a"));
        assert_eq!(header_value(&cookies(), "Location"), None);
    }

    #[test]
    fn repeated_lines_are_all_visible() {
        let headers = cookies();
        let values: Vec<_> = header_values(&headers, "Set-Cookie").collect();
        assert_eq!(values, vec!["AUTH_SESSION_ID=a", "KC_RESTART=b"]);
    }

    #[test]
    fn remove_drops_every_casing() {
        let mut headers = cookies();
        remove_header(&mut headers, "Set-Cookie");
        assert_eq!(headers, vec![("Content-Type".to_string(), "text/html".to_string())]);
    }
}
