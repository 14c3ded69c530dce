//! Bounded parser for the Python-literal subset some backend versions emit
//! instead of JSON (`{'a': None, 'b': True}`), plus the inverse serializer used
//! when a batch reference has to travel as a `literal_eval`-able query parameter.
//!
//! Accepted: dicts, lists, tuples, quoted strings, numbers, `None`/`True`/`False`
//! (and their JSON spellings), and `ObjectId('...')`. Nothing is ever evaluated.

use serde_json::{Map, Number, Value};
use thiserror::Error;

/// Maximum container nesting accepted before giving up.
pub const MAX_DEPTH: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} at offset {offset}")]
pub struct LiteralError {
    pub offset: usize,
    pub message: String,
}

/// Parse a complete literal. Surrounding whitespace is ignored; anything else after
/// the value is an error.
pub fn parse_literal(text: &str) -> Result<Value, LiteralError> {
    let mut parser = Parser {
        src: text,
        pos: 0,
        depth: 0,
    };
    parser.skip_ws();
    let value = parser.parse_value()?;
    parser.skip_ws();
    if parser.pos < text.len() {
        return Err(parser.error("unexpected trailing input"));
    }
    Ok(value)
}

/// Serialize a JSON value as a Python literal.
pub fn to_literal(value: &Value) -> String {
    let mut out = String::new();
    write_literal(value, &mut out);
    out
}

fn write_literal(value: &Value, out: &mut String) {
    match value {
        Value::Null => out.push_str("None"),
        Value::Bool(true) => out.push_str("True"),
        Value::Bool(false) => out.push_str("False"),
        Value::Number(n) => out.push_str(&n.to_string()),
        Value::String(s) => write_quoted(s, out),
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_literal(item, out);
            }
            out.push(']');
        }
        Value::Object(map) => {
            out.push('{');
            for (i, (key, item)) in map.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_quoted(key, out);
                out.push_str(": ");
                write_literal(item, out);
            }
            out.push('}');
        }
    }
}

fn write_quoted(s: &str, out: &mut String) {
    out.push('\'');
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 || c == '\u{7f}' => {
                out.push_str(&format!("\\x{:02x}", c as u32));
            }
            c => out.push(c),
        }
    }
    out.push('\'');
}

struct Parser<'a> {
    src: &'a str,
    pos: usize,
    depth: usize,
}

type ParseResult<T> = Result<T, LiteralError>;

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.bump();
        }
    }

    fn error(&self, message: impl Into<String>) -> LiteralError {
        LiteralError {
            offset: self.pos,
            message: message.into(),
        }
    }

    fn expect(&mut self, expected: char) -> ParseResult<()> {
        match self.peek() {
            Some(c) if c == expected => {
                self.bump();
                Ok(())
            }
            Some(c) => Err(self.error(format!("expected {expected:?}, found {c:?}"))),
            None => Err(self.error(format!("expected {expected:?}, found end of input"))),
        }
    }

    fn parse_value(&mut self) -> ParseResult<Value> {
        match self.peek() {
            None => Err(self.error("unexpected end of input")),
            Some('{') => self.nested(Self::parse_dict),
            Some('[') => self.nested(Self::parse_list),
            Some('(') => self.nested(Self::parse_tuple),
            Some('\'' | '"') => self.parse_string().map(Value::String),
            Some(c) if c == '-' || c == '+' || c == '.' || c.is_ascii_digit() => {
                self.parse_number()
            }
            Some(c) if c.is_ascii_alphabetic() || c == '_' => self.parse_word(),
            Some(c) => Err(self.error(format!("unexpected character {c:?}"))),
        }
    }

    fn nested(&mut self, parse: fn(&mut Self) -> ParseResult<Value>) -> ParseResult<Value> {
        if self.depth >= MAX_DEPTH {
            return Err(self.error("nesting too deep"));
        }
        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    fn parse_dict(&mut self) -> ParseResult<Value> {
        self.expect('{')?;
        let mut map = Map::new();
        loop {
            self.skip_ws();
            if self.peek() == Some('}') {
                self.bump();
                return Ok(Value::Object(map));
            }
            let key = self.parse_key()?;
            self.skip_ws();
            self.expect(':')?;
            self.skip_ws();
            let value = self.parse_value()?;
            map.insert(key, value);
            self.skip_ws();
            match self.peek() {
                Some(',') => {
                    self.bump();
                }
                Some('}') => {
                    self.bump();
                    return Ok(Value::Object(map));
                }
                _ => return Err(self.error("expected ',' or '}' in dict")),
            }
        }
    }

    fn parse_key(&mut self) -> ParseResult<String> {
        let offset = self.pos;
        match self.parse_value()? {
            Value::String(s) => Ok(s),
            Value::Number(n) => Ok(n.to_string()),
            Value::Bool(b) => Ok(b.to_string()),
            Value::Null => Ok("null".to_string()),
            Value::Array(_) | Value::Object(_) => Err(LiteralError {
                offset,
                message: "unhashable dict key".to_string(),
            }),
        }
    }

    fn parse_list(&mut self) -> ParseResult<Value> {
        self.parse_sequence('[', ']').map(|(items, _)| Value::Array(items))
    }

    /// `(x)` is just a parenthesized value; `(x,)` and `(x, y)` are tuples.
    fn parse_tuple(&mut self) -> ParseResult<Value> {
        let (mut items, saw_comma) = self.parse_sequence('(', ')')?;
        if items.len() == 1 && !saw_comma {
            return Ok(items.remove(0));
        }
        Ok(Value::Array(items))
    }

    fn parse_sequence(&mut self, open: char, close: char) -> ParseResult<(Vec<Value>, bool)> {
        self.expect(open)?;
        let mut items = Vec::new();
        let mut saw_comma = false;
        loop {
            self.skip_ws();
            if self.peek() == Some(close) {
                self.bump();
                return Ok((items, saw_comma));
            }
            items.push(self.parse_value()?);
            self.skip_ws();
            match self.peek() {
                Some(',') => {
                    saw_comma = true;
                    self.bump();
                }
                Some(c) if c == close => {
                    self.bump();
                    return Ok((items, saw_comma));
                }
                _ => return Err(self.error(format!("expected ',' or {close:?}"))),
            }
        }
    }

    fn parse_string(&mut self) -> ParseResult<String> {
        let start = self.pos;
        let quote = self
            .bump()
            .ok_or_else(|| self.error("expected string"))?;
        let mut out = String::new();
        loop {
            let c = match self.bump() {
                Some(c) => c,
                None => {
                    return Err(LiteralError {
                        offset: start,
                        message: "unterminated string".to_string(),
                    })
                }
            };
            match c {
                c if c == quote => return Ok(out),
                '\n' => {
                    return Err(LiteralError {
                        offset: start,
                        message: "unterminated string".to_string(),
                    })
                }
                '\\' => self.parse_escape(&mut out)?,
                c => out.push(c),
            }
        }
    }

    fn parse_escape(&mut self, out: &mut String) -> ParseResult<()> {
        let escape_at = self.pos;
        match self.bump() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('0') => out.push('\0'),
            Some('\\') => out.push('\\'),
            Some('\'') => out.push('\''),
            Some('"') => out.push('"'),
            // Line continuation.
            Some('\n') => {}
            Some('x') => {
                let code = self.parse_hex(2)?;
                out.push(char::from_u32(code).ok_or_else(|| self.error("invalid \\x escape"))?);
            }
            Some('u') => {
                let high = self.parse_hex(4)?;
                let code = if (0xD800..0xDC00).contains(&high) {
                    if !self.src[self.pos..].starts_with("\\u") {
                        return Err(self.error("unpaired surrogate in \\u escape"));
                    }
                    self.pos += 2;
                    let low = self.parse_hex(4)?;
                    if !(0xDC00..0xE000).contains(&low) {
                        return Err(self.error("invalid low surrogate in \\u escape"));
                    }
                    0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00)
                } else {
                    high
                };
                out.push(char::from_u32(code).ok_or_else(|| self.error("invalid \\u escape"))?);
            }
            // Unknown escapes are kept verbatim, backslash included.
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => {
                return Err(LiteralError {
                    offset: escape_at,
                    message: "dangling escape".to_string(),
                })
            }
        }
        Ok(())
    }

    fn parse_hex(&mut self, digits: usize) -> ParseResult<u32> {
        let end = self.pos + digits;
        let chunk = self
            .src
            .get(self.pos..end)
            .filter(|s| s.chars().all(|c| c.is_ascii_hexdigit()))
            .ok_or_else(|| self.error(format!("expected {digits} hex digits")))?;
        let code = u32::from_str_radix(chunk, 16).map_err(|_| self.error("invalid hex escape"))?;
        self.pos = end;
        Ok(code)
    }

    fn parse_number(&mut self) -> ParseResult<Value> {
        let start = self.pos;
        if matches!(self.peek(), Some('-' | '+')) {
            self.bump();
        }
        let mut is_float = false;
        let mut prev = None;
        while let Some(c) = self.peek() {
            let accepted = match c {
                '0'..='9' | '_' => true,
                '.' | 'e' | 'E' => {
                    is_float = true;
                    true
                }
                '+' | '-' => matches!(prev, Some('e' | 'E')),
                _ => false,
            };
            if !accepted {
                break;
            }
            prev = Some(c);
            self.bump();
        }

        let raw: String = self.src[start..self.pos].chars().filter(|c| *c != '_').collect();
        let invalid = || LiteralError {
            offset: start,
            message: format!("invalid number {:?}", &self.src[start..self.pos]),
        };

        if !is_float {
            if let Ok(n) = raw.parse::<i64>() {
                return Ok(Value::Number(n.into()));
            }
            if let Ok(n) = raw.parse::<u64>() {
                return Ok(Value::Number(n.into()));
            }
        }
        raw.parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .ok_or_else(invalid)
    }

    fn parse_word(&mut self) -> ParseResult<Value> {
        let start = self.pos;
        while matches!(self.peek(), Some(c) if c.is_ascii_alphanumeric() || c == '_') {
            self.bump();
        }
        match &self.src[start..self.pos] {
            "None" | "null" => Ok(Value::Null),
            "True" | "true" => Ok(Value::Bool(true)),
            "False" | "false" => Ok(Value::Bool(false)),
            "ObjectId" => {
                self.skip_ws();
                self.expect('(')?;
                self.skip_ws();
                let id = match self.peek() {
                    Some('\'' | '"') => self.parse_string()?,
                    _ => return Err(self.error("ObjectId expects a string argument")),
                };
                self.skip_ws();
                self.expect(')')?;
                Ok(Value::String(id))
            }
            word => Err(LiteralError {
                offset: start,
                message: format!("unknown identifier {word:?}"),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn python_tokens_become_json_values() {
        let value = parse_literal("{'a': None, 'b': True}").unwrap();
        assert_eq!(value, json!({"a": null, "b": true}));
    }

    #[test]
    fn parses_a_python_repr_of_a_fermenter() {
        let text = r#"{'_id': ObjectId('65a1f0c2e4b0a1b2c3d4e5f6'), 'litros': 500, 'estado': "activo",
            'lote': {'cerveza': 'IPA', 'valor': 3, 'abv': 6.5}, 'tags': ('a', 'b',), 'ok': False}"#;
        let value = parse_literal(text).unwrap();
        assert_eq!(
            value,
            json!({
                "_id": "65a1f0c2e4b0a1b2c3d4e5f6",
                "litros": 500,
                "estado": "activo",
                "lote": {"cerveza": "IPA", "valor": 3, "abv": 6.5},
                "tags": ["a", "b"],
                "ok": false,
            })
        );
    }

    #[test]
    fn json_text_is_also_accepted() {
        let value = parse_literal(r#"{"data": [1, -2, 3.5e1, null, true]}"#).unwrap();
        assert_eq!(value, json!({"data": [1, -2, 35.0, null, true]}));
    }

    #[test]
    fn parenthesized_single_value_is_not_a_tuple() {
        assert_eq!(parse_literal("(7)").unwrap(), json!(7));
        assert_eq!(parse_literal("(7,)").unwrap(), json!([7]));
        assert_eq!(parse_literal("()").unwrap(), json!([]));
    }

    #[test]
    fn string_escapes() {
        let value = parse_literal(r"'it\'s\tfine \x41é \q'").unwrap();
        assert_eq!(value, json!("it's\tfine Aé \\q"));
    }

    #[test]
    fn surrogate_pairs_combine() {
        let value = parse_literal(r#""\ud83c\udf7a""#).unwrap();
        assert_eq!(value, json!("🍺"));
    }

    #[test]
    fn numeric_keys_are_stringified() {
        let value = parse_literal("{1: 'one', 2.5: 'two and a half'}").unwrap();
        assert_eq!(value, json!({"1": "one", "2.5": "two and a half"}));
    }

    #[test]
    fn big_integers_fall_back_to_float() {
        let value = parse_literal("123456789012345678901234567890").unwrap();
        assert!(value.as_f64().unwrap() > 1e29);
    }

    #[test]
    fn trailing_garbage_is_rejected() {
        let err = parse_literal("{'a': 1} extra").unwrap_err();
        assert_eq!(err.offset, 9);
        assert!(err.message.contains("trailing"));
    }

    #[test]
    fn code_is_never_evaluated() {
        assert!(parse_literal("__import__('os').system('ls')").is_err());
        assert!(parse_literal("[x for x in range(3)]").is_err());
    }

    #[test]
    fn unterminated_string_reports_its_start() {
        let err = parse_literal("['ok', 'broken]").unwrap_err();
        assert_eq!(err.offset, 7);
        assert_eq!(err.message, "unterminated string");
    }

    #[test]
    fn nesting_is_bounded() {
        let deep = format!("{}{}", "[".repeat(MAX_DEPTH + 1), "]".repeat(MAX_DEPTH + 1));
        let err = parse_literal(&deep).unwrap_err();
        assert_eq!(err.message, "nesting too deep");

        let ok = format!("{}{}", "[".repeat(MAX_DEPTH), "]".repeat(MAX_DEPTH));
        assert!(parse_literal(&ok).is_ok());
    }

    #[test]
    fn unhashable_keys_are_rejected() {
        let err = parse_literal("{[1]: 2}").unwrap_err();
        assert_eq!(err.message, "unhashable dict key");
    }

    #[test]
    fn serializes_a_batch_reference_for_literal_eval() {
        let lote = json!({"_id": "65a1f0c2e4b0a1b2c3d4e5f6", "cerveza": "Stout d'Or", "valor": 2});
        let text = to_literal(&lote);
        assert_eq!(
            text,
            r"{'_id': '65a1f0c2e4b0a1b2c3d4e5f6', 'cerveza': 'Stout d\'Or', 'valor': 2}"
        );
        assert_eq!(parse_literal(&text).unwrap(), lote);
    }

    #[test]
    fn serializes_python_keywords() {
        assert_eq!(to_literal(&json!([null, true, false, "a\nb"])), r"[None, True, False, 'a\nb']");
    }
}
