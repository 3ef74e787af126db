use anyhow::Result;
use serde_json::Value;

pub fn render_json(value: &Value, pretty: bool) -> Result<String> {
    let rendered = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    Ok(rendered)
}

pub fn print_json(value: &Value, pretty: bool) -> Result<()> {
    println!("{}", render_json(value, pretty)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_render_compact_and_pretty() {
        let value = json!({ "a": 1 });
        assert_eq!(render_json(&value, false).unwrap(), r#"{"a":1}"#);
        assert_eq!(render_json(&value, true).unwrap(), "{\n  \"a\": 1\n}");
    }
}
