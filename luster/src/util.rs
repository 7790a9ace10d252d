use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

/// Join a base URL and path segments with exactly one `/` between each part.
pub fn build_url(base: &str, segments: &[&str]) -> String {
    let mut url = base.trim_end_matches('/').to_string();
    for seg in segments {
        url.push('/');
        url.push_str(seg.trim_start_matches('/'));
    }
    url
}

/// Append a urlencoded query string, skipping it when empty.
pub fn with_query(mut url: String, query: &str) -> String {
    if !query.is_empty() {
        url.push('?');
        url.push_str(query);
    }
    url
}

/// Location of a cleared field (`Description`, `StatusText`, ...) inside an
/// object: the top-level key and, for nested fields, the inner key.
fn clear_path(field: &str) -> (String, Option<&'static str>) {
    match field {
        "StatusText" => ("status".into(), Some("text")),
        "StatusPresence" => ("status".into(), Some("presence")),
        "ProfileContent" => ("profile".into(), Some("content")),
        "ProfileBackground" => ("profile".into(), Some("background")),
        other => (pascal_to_snake(other), None),
    }
}

pub fn pascal_to_snake(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 4);
    for (i, ch) in s.chars().enumerate() {
        if ch.is_ascii_uppercase() {
            if i > 0 {
                out.push('_');
            }
            out.push(ch.to_ascii_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}

/// Apply a partial update event to an entity.
///
/// Fields named in `clear` are removed first, then every top-level key of
/// `data` overwrites the entity's key. A `data` that is not an object only
/// clears.
pub fn apply_partial<T>(target: &mut T, data: &Value, clear: &[String]) -> Result<(), serde_json::Error>
where
    T: Serialize + DeserializeOwned,
{
    let mut value = serde_json::to_value(&*target)?;

    if let Value::Object(obj) = &mut value {
        for field in clear {
            match clear_path(field) {
                (key, None) => {
                    obj.remove(&key);
                }
                (key, Some(inner)) => {
                    if let Some(Value::Object(nested)) = obj.get_mut(&key) {
                        nested.remove(inner);
                    }
                }
            }
        }

        if let Value::Object(patch) = data {
            for (k, v) in patch {
                obj.insert(k.clone(), v.clone());
            }
        }
    }

    *target = serde_json::from_value(value)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Thing {
        name: String,
        description: Option<String>,
        #[serde(default)]
        status: Option<Value>,
    }

    #[test]
    fn snake_case_conversion() {
        assert_eq!(pascal_to_snake("Description"), "description");
        assert_eq!(pascal_to_snake("DefaultPermissions"), "default_permissions");
    }

    #[test]
    fn partial_update_clears_then_patches() {
        let mut thing = Thing {
            name: "general".into(),
            description: Some("old".into()),
            status: Some(json!({"text": "busy", "presence": "Busy"})),
        };

        apply_partial(
            &mut thing,
            &json!({"name": "chat"}),
            &["Description".into(), "StatusText".into()],
        )
        .unwrap();

        assert_eq!(thing.name, "chat");
        assert_eq!(thing.description, None);
        assert_eq!(thing.status, Some(json!({"presence": "Busy"})));
    }

    #[test]
    fn joins_segments_without_doubling_slashes() {
        assert_eq!(
            build_url("https://api.revolt.chat/", &["channels", "/01H", "messages"]),
            "https://api.revolt.chat/channels/01H/messages"
        );
        assert_eq!(build_url("http://x", &[]), "http://x");
    }

    #[test]
    fn empty_query_is_skipped() {
        assert_eq!(with_query("http://x/a".into(), ""), "http://x/a");
        assert_eq!(with_query("http://x/a".into(), "limit=5"), "http://x/a?limit=5");
    }
}
