//! In-page scripts.
//!
//! Arguments are embedded as JSON literals so selectors and URLs never need
//! manual escaping.

use serde_json::Value;

fn literal<T: serde::Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "null".to_string())
}

const SNAPSHOT_FN: &str = r#"const snap = (el) => ({
    text: (el.innerText || el.textContent || '').trim(),
    attributes: Object.fromEntries(Array.from(el.attributes).map((a) => [a.name, a.value])),
  });"#;

/// Snapshot every match of `selector`.
pub fn query_all(selector: &str) -> String {
    format!(
        r#"(() => {{
  {snap}
  return Array.from(document.querySelectorAll({sel})).map(snap);
}})()"#,
        snap = SNAPSHOT_FN,
        sel = literal(selector),
    )
}

/// Snapshot matches of `child` inside the `index`-th match of `selector`.
pub fn query_within(selector: &str, index: usize, child: &str) -> String {
    format!(
        r#"(() => {{
  {snap}
  const root = document.querySelectorAll({sel})[{index}];
  if (!root) return [];
  return Array.from(root.querySelectorAll({child})).map(snap);
}})()"#,
        snap = SNAPSHOT_FN,
        sel = literal(selector),
        index = index,
        child = literal(child),
    )
}

/// Scroll the first scrollable box at or under `selector` to its bottom.
/// Evaluates to its scroll height, or `null` when `selector` is absent.
pub fn scroll_to_bottom(selector: &str) -> String {
    format!(
        r#"(() => {{
  const root = document.querySelector({sel});
  if (!root) return null;
  const scrollable = [root, ...root.querySelectorAll('*')]
    .find((el) => el.scrollHeight > el.clientHeight + 1) || root;
  scrollable.scrollTop = scrollable.scrollHeight;
  return scrollable.scrollHeight;
}})()"#,
        sel = literal(selector),
    )
}

pub const VIEWPORT: &str = "({ width: window.innerWidth, height: window.innerHeight })";

/// Credentialed `fetch` from the page. Evaluates to `{ ok, status, body }`.
pub fn fetch_json(url: &str, headers: &[(&str, &str)]) -> String {
    let headers: serde_json::Map<String, Value> = headers
        .iter()
        .map(|(k, v)| (k.to_string(), Value::String(v.to_string())))
        .collect();
    format!(
        r#"(async () => {{
  const res = await fetch({url}, {{ headers: {headers}, credentials: 'include' }});
  if (!res.ok) return {{ ok: false, status: res.status }};
  return {{ ok: true, status: res.status, body: await res.json() }};
}})()"#,
        url = literal(url),
        headers = literal(&headers),
    )
}

/// Extract the body of a [`fetch_json`] result; `None` for a non-2xx status.
pub fn fetch_body(result: Value) -> Option<Value> {
    match result {
        Value::Object(mut map) if map.get("ok") == Some(&Value::Bool(true)) => {
            Some(map.remove("body").unwrap_or(Value::Null))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_selector_is_json_quoted() {
        let script = query_all(r#"svg[aria-label="Like"]"#);
        assert!(script.contains(r#"document.querySelectorAll("svg[aria-label=\"Like\"]")"#));
    }

    #[test]
    fn test_query_within_embeds_index() {
        let script = query_within("article", 2, "a[href*=\"/p/\"]");
        assert!(script.contains("document.querySelectorAll(\"article\")[2]"));
        assert!(script.contains(r#"root.querySelectorAll("a[href*=\"/p/\"]")"#));
    }

    #[test]
    fn test_fetch_headers_embedded() {
        let script = fetch_json(
            "https://www.instagram.com/api/v1/users/web_profile_info/?username=anna",
            &[("X-IG-App-ID", "936619743392459")],
        );
        assert!(script.contains(r#"{"X-IG-App-ID":"936619743392459"}"#));
        assert!(script.contains("credentials: 'include'"));
    }

    #[test]
    fn test_fetch_body() {
        assert_eq!(
            fetch_body(json!({ "ok": true, "status": 200, "body": { "data": 1 } })),
            Some(json!({ "data": 1 }))
        );
        assert_eq!(fetch_body(json!({ "ok": false, "status": 404 })), None);
        assert_eq!(fetch_body(Value::Null), None);
    }
}
