use serde::{Serialize, Serializer};

pub const NODE_TYPE_KEY: &str = "nodeType";
pub const OBJECT_END_KEY: &str = "object";
pub const END_OF_STREAM_KEY: &str = "EOF";

/// What a token reports.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TokenKey {
    /// An object opened; the value is its item name.
    NodeType,
    /// The open object closed; the value is empty.
    ObjectEnd,
    /// An attribute closed; the value is its captured text.
    Attribute(String),
    /// Input exhausted; always the last token of a successful scan.
    EndOfStream,
}

impl TokenKey {
    pub fn as_str(&self) -> &str {
        match self {
            TokenKey::NodeType => NODE_TYPE_KEY,
            TokenKey::ObjectEnd => OBJECT_END_KEY,
            TokenKey::Attribute(name) => name,
            TokenKey::EndOfStream => END_OF_STREAM_KEY,
        }
    }
}

impl std::fmt::Display for TokenKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for TokenKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Token {
    pub key: TokenKey,
    pub value: String,
}

impl Token {
    pub fn node_type(item: impl Into<String>) -> Self {
        Self {
            key: TokenKey::NodeType,
            value: item.into(),
        }
    }

    pub fn object_end() -> Self {
        Self {
            key: TokenKey::ObjectEnd,
            value: String::new(),
        }
    }

    pub fn attribute(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            key: TokenKey::Attribute(name.into()),
            value: text.into(),
        }
    }

    pub fn end_of_stream() -> Self {
        Self {
            key: TokenKey::EndOfStream,
            value: String::new(),
        }
    }

    pub fn is_end_of_stream(&self) -> bool {
        self.key == TokenKey::EndOfStream
    }

    /// `(key, value)` as plain strings.
    pub fn as_pair(&self) -> (&str, &str) {
        (self.key.as_str(), &self.value)
    }
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}\t{}", self.key, self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pairs() {
        assert_eq!(Token::node_type("Person").as_pair(), ("nodeType", "Person"));
        assert_eq!(Token::object_end().as_pair(), ("object", ""));
        assert_eq!(Token::attribute("Name", "Alice").as_pair(), ("Name", "Alice"));
        assert_eq!(Token::end_of_stream().as_pair(), ("EOF", ""));
        assert!(Token::end_of_stream().is_end_of_stream());
    }

    #[test]
    fn test_attribute_named_like_a_reserved_key_stays_distinct() {
        let attribute = Token::attribute("object", "");
        assert_eq!(attribute.as_pair(), Token::object_end().as_pair());
        assert_ne!(attribute, Token::object_end());
    }

    #[test]
    fn test_serialize() {
        let json = serde_json::to_string(&Token::attribute("Name", "Al \"B\"")).unwrap();
        assert_eq!(json, r#"{"key":"Name","value":"Al \"B\""}"#);
        assert_eq!(Token::node_type("Person").to_string(), "nodeType\tPerson");
    }
}
