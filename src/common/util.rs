use anyhow::bail;
use serde_json::Value;

/// Parses a `key=value` pair from the command line into a selection entry.
///
/// The value is read as JSON when possible (`currentIdea=42`, `flag=true`,
/// `currentIdea=null`) and as a plain string otherwise.
pub fn parse_selection_pair(arg: &str) -> anyhow::Result<(String, Value)> {
    let Some((key, raw)) = arg.split_once('=') else {
        bail!("expected KEY=VALUE, got {arg:?}");
    };
    let key = key.trim();
    if key.is_empty() {
        bail!("empty selection key in {arg:?}");
    }

    let raw = raw.trim();
    let value = match serde_json::from_str::<Value>(raw) {
        Ok(value) => value,
        Err(_) => Value::String(unquote(raw).to_string()),
    };

    Ok((key.to_string(), value))
}

fn unquote(raw: &str) -> &str {
    for quote in ['\'', '"'] {
        if let Some(inner) = raw.strip_prefix(quote).and_then(|r| r.strip_suffix(quote)) {
            return inner;
        }
    }
    raw
}
