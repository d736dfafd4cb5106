// src/pipeline/parser.rs

use serde_json::Value;

/// Failure to recover a JSON payload from the raw model text.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("no JSON object found in model response")]
    NoJsonFound,

    #[error("model response JSON is malformed: {0}")]
    MalformedJson(String),
}

/// Extract the JSON payload embedded in a model response.
///
/// The model is asked to return only JSON, but in practice the text often
/// carries leading/trailing commentary (and sometimes single-quoted
/// pseudo-JSON, because the prompt's template uses single quotes). The
/// recovery is deliberately minimal: slice from the first `{` to the last
/// `}`, try a strict decode, and on failure retry exactly once with all
/// single quotes replaced by double quotes. No bracket balancing, no
/// trailing-comma stripping.
pub fn parse(raw_text: &str) -> Result<Value, ParseError> {
    let start = raw_text.find('{').ok_or(ParseError::NoJsonFound)?;
    let end = raw_text.rfind('}').ok_or(ParseError::NoJsonFound)?;
    if end < start {
        return Err(ParseError::MalformedJson(
            "closing brace precedes opening brace".into(),
        ));
    }
    let candidate = &raw_text[start..=end];

    match serde_json::from_str(candidate) {
        Ok(payload) => Ok(payload),
        Err(_) => {
            // Single repair pass, then give up with the decoder's message.
            let repaired = candidate.replace('\'', "\"");
            serde_json::from_str(&repaired)
                .map_err(|e| ParseError::MalformedJson(e.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strict_json_with_commentary() {
        let raw = "Sure, here is the data: {\"报销单号\":\"A001\"} hope that helps";
        let payload = parse(raw).unwrap();
        assert_eq!(payload["报销单号"], "A001");
    }

    #[test]
    fn single_quote_repair() {
        let raw = "{'报销单号':'A001','总金额':42.5}";
        let payload = parse(raw).unwrap();
        assert_eq!(payload["报销单号"], "A001");
        assert_eq!(payload["总金额"], 42.5);
    }

    #[test]
    fn repaired_equals_strict() {
        let single = parse("{'名称':'打印','金额':12.5}").unwrap();
        let double = parse("{\"名称\":\"打印\",\"金额\":12.5}").unwrap();
        assert_eq!(single, double);
    }

    #[test]
    fn no_opening_brace() {
        let err = parse("the model refused to answer").unwrap_err();
        assert!(matches!(err, ParseError::NoJsonFound));
    }

    #[test]
    fn no_closing_brace() {
        let err = parse("{\"报销单号\":\"A001\"").unwrap_err();
        assert!(matches!(err, ParseError::NoJsonFound));
    }

    #[test]
    fn closing_before_opening() {
        let err = parse("} nonsense {").unwrap_err();
        assert!(matches!(err, ParseError::MalformedJson(_)));
    }

    #[test]
    fn malformed_after_repair() {
        let err = parse("{'报销单号': }").unwrap_err();
        assert!(matches!(err, ParseError::MalformedJson(_)));
    }
}
