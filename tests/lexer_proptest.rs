//! Property-based tests for the marker lexer.

mod common;

use common::{BRACKET_PATTERNS, PERSON_PATTERNS};
use marklex::{MarkerLexer, Token};
use proptest::prelude::*;

/// An object with its attributes, as `(name, text)` pairs.
type Object = (&'static str, Vec<(&'static str, String)>);

fn object_strategy() -> impl Strategy<Value = Object> {
    let object = prop::sample::select(vec!["Person", "Place"]);
    let attribute = (
        prop::sample::select(vec!["Name", "Age", "City"]),
        "[a-z0-9 \n]{0,8}",
    );
    (object, prop::collection::vec(attribute, 0..4))
}

fn render(objects: &[Object]) -> String {
    let mut doc = String::from("<P>");
    for (object, attributes) in objects {
        doc.push_str(&format!("<{object}>"));
        for (name, text) in attributes {
            doc.push_str(&format!("<{name}>{text}</{name}>"));
        }
        doc.push_str(&format!("</{object}>"));
    }
    doc.push_str("</P>");
    doc
}

fn expected_tokens(objects: &[Object]) -> Vec<Token> {
    let mut tokens = Vec::new();
    for (object, attributes) in objects {
        tokens.push(Token::node_type(*object));
        for (name, text) in attributes {
            tokens.push(Token::attribute(*name, text.clone()));
        }
        tokens.push(Token::object_end());
    }
    tokens.push(Token::end_of_stream());
    tokens
}

proptest! {
    #[test]
    fn test_well_formed_documents(objects in prop::collection::vec(object_strategy(), 0..6)) {
        let lexer = MarkerLexer::new(PERSON_PATTERNS.clone());
        let tokens = lexer.scan(&render(&objects)).unwrap();
        prop_assert_eq!(tokens, expected_tokens(&objects));
    }

    #[test]
    fn test_text_around_process_is_ignored(
        before in "[a-z ]{0,16}",
        after in "[a-z<>/ ]{0,16}",
        objects in prop::collection::vec(object_strategy(), 0..3),
    ) {
        let lexer = MarkerLexer::new(PERSON_PATTERNS.clone());
        let doc = format!("{before}{}{after}", render(&objects));
        prop_assert_eq!(lexer.scan(&doc).unwrap(), expected_tokens(&objects));
    }

    #[test]
    fn test_marker_free_text_yields_only_end_of_stream(text in "[^<]{0,64}") {
        let lexer = MarkerLexer::new(PERSON_PATTERNS.clone());
        prop_assert_eq!(lexer.scan(&text).unwrap(), vec![Token::end_of_stream()]);
    }

    #[test]
    fn test_stray_attribute_ends_never_emit(text in "[a-z]{0,8}") {
        let lexer = MarkerLexer::new(PERSON_PATTERNS.clone());
        let doc = format!("<P><Person></Name>{text}</City></Person></P>");
        prop_assert_eq!(
            lexer.scan(&doc).unwrap(),
            vec![Token::node_type("Person"), Token::object_end(), Token::end_of_stream()]
        );
    }

    #[test]
    fn test_longest_start_marker_is_chosen(long in "[a-z]{0,8}", short in "[a-z]{0,8}") {
        let lexer = MarkerLexer::new(BRACKET_PATTERNS.clone());
        let doc = format!("[[{{@@{long};;@{short};}}]]");
        prop_assert_eq!(
            lexer.scan(&doc).unwrap(),
            vec![
                Token::node_type("Entry"),
                Token::attribute("KeyLong", long),
                Token::attribute("Key", short),
                Token::object_end(),
                Token::end_of_stream(),
            ]
        );
    }

    #[test]
    fn test_scan_is_deterministic(input in "[<>/PersonamgCity a-z]{0,64}") {
        let lexer = MarkerLexer::new(PERSON_PATTERNS.clone());
        prop_assert_eq!(lexer.scan(&input), lexer.scan(&input));
    }
}
