use std::{borrow::Cow, task::Poll};

use tracing::{debug, trace, warn};

use super::{state::LexState, token::Token, LexError, LexResult};
use crate::{
    compiler::{CompiledPatterns, Level, SearchList},
    config::UnclosedPolicy,
};

/// A marker matched at the cursor and accepted in the current context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MarkerEvent<'p> {
    Start { item: &'p str, level: Level },
    End { item: &'p str, level: Level },
}

/// Why the scan loop stopped.
enum Halt {
    Token(Token),
    Exhausted,
    /// The step budget ran out before a token was found.
    Paused,
}

/// One scan over one input string.
///
/// Owns every piece of mutable scan state; the compiled patterns are only
/// borrowed. Yields tokens in document order and ends with the end-of-stream
/// token, or with the error that stopped the scan.
#[derive(Debug, Clone)]
pub struct Scanner<'p, 'i> {
    patterns: &'p CompiledPatterns,
    policy: UnclosedPolicy,
    input: &'i str,
    /// Byte offset where the current token's text begins.
    start: usize,
    /// Byte offset of the cursor.
    pos: usize,
    /// Byte width of the last consumed unit.
    width: usize,
    state: LexState,
    search: Cow<'p, SearchList>,
    exhausted: bool,
}

impl<'p, 'i> Scanner<'p, 'i> {
    pub fn new(patterns: &'p CompiledPatterns, input: &'i str, policy: UnclosedPolicy) -> Self {
        Self {
            patterns,
            policy,
            input,
            start: 0,
            pos: 0,
            width: 0,
            state: LexState::Prelude,
            search: Cow::Borrowed(&patterns.search_lists().prelude),
            exhausted: false,
        }
    }

    pub fn state(&self) -> &LexState {
        &self.state
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn last_width(&self) -> usize {
        self.width
    }

    pub fn search_list(&self) -> &SearchList {
        &self.search
    }

    /// Like [`Iterator::next`], but gives up after `budget` cursor moves and
    /// returns [`Poll::Pending`]. Calling again resumes where it stopped.
    pub fn poll_steps(&mut self, budget: usize) -> Poll<Option<LexResult<Token>>> {
        self.advance(Some(budget))
    }

    fn advance(&mut self, budget: Option<usize>) -> Poll<Option<LexResult<Token>>> {
        if self.exhausted {
            return Poll::Ready(None);
        }
        let result = match self.scan_to_token(budget) {
            Ok(Halt::Token(token)) => return Poll::Ready(Some(Ok(token))),
            Ok(Halt::Paused) => return Poll::Pending,
            Ok(Halt::Exhausted) => self.finish(),
            Err(e) => Err(e),
        };
        self.exhausted = true;
        Poll::Ready(Some(result))
    }

    /// Runs the scan loop until a token is produced, the input ends or the
    /// budget runs out. `None` never pauses.
    fn scan_to_token(&mut self, mut budget: Option<usize>) -> LexResult<Halt> {
        let input = self.input;
        while !self.state.is_finished() && self.pos < input.len() {
            if let Some(left) = budget.as_mut() {
                if *left == 0 {
                    return Ok(Halt::Paused);
                }
                *left -= 1;
            }
            let rest = &input[self.pos..];
            if let Some(len) = self.search.longest_match(rest).map(str::len) {
                let marker = &rest[..len];
                if let Some(event) = self.resolve(marker)? {
                    let token = self.apply(event)?;
                    self.width = len;
                    self.pos += len;
                    self.start = self.pos;
                    if let Some(token) = token {
                        return Ok(Halt::Token(token));
                    }
                    continue;
                }
                trace!(
                    marker,
                    pos = self.pos,
                    state = self.state.as_ref(),
                    "marker rejected in context"
                );
            }
            self.step();
        }
        Ok(Halt::Exhausted)
    }

    /// Moves the cursor over one character, keeping the token start.
    fn step(&mut self) {
        self.width = self.input[self.pos..]
            .chars()
            .next()
            .map_or(0, char::len_utf8);
        self.pos += self.width;
    }

    /// Decides what `marker` means here. Start markers always resolve to
    /// their item; end markers only when they close what is open.
    fn resolve(&self, marker: &str) -> LexResult<Option<MarkerEvent<'p>>> {
        let patterns = self.patterns;

        if let Some(item) = patterns.markers().start_owner(marker) {
            let level = self.level_of(item)?;
            if level == Level::Attribute && self.state.open_object().is_none() {
                return Ok(None);
            }
            return Ok(Some(MarkerEvent::Start { item, level }));
        }

        for item in patterns.markers().end_owners(marker) {
            let level = self.level_of(item)?;
            let accepted = match level {
                Level::Process => true,
                Level::Object => self.state.open_object() == Some(item.as_str()),
                Level::Attribute => self.state.open_attribute() == Some(item.as_str()),
            };
            if accepted {
                return Ok(Some(MarkerEvent::End {
                    item: item.as_str(),
                    level,
                }));
            }
        }
        Ok(None)
    }

    fn level_of(&self, item: &str) -> LexResult<Level> {
        self.patterns
            .catalog()
            .level_of(item)
            .ok_or_else(|| LexError::UnknownKey {
                key: item.to_string(),
            })
    }

    /// Performs the transition for an accepted marker. The cursor still points
    /// at the marker, so attribute text ends at `self.pos`.
    fn apply(&mut self, event: MarkerEvent<'p>) -> LexResult<Option<Token>> {
        let patterns = self.patterns;
        let lists = patterns.search_lists();
        match event {
            MarkerEvent::Start {
                level: Level::Process,
                ..
            } => {
                if let Some(object) = self.state.open_object() {
                    debug!(object, "process restarted with an object open");
                }
                self.enter(LexState::Idle, Cow::Borrowed(&lists.idle));
                Ok(None)
            }
            MarkerEvent::Start {
                item,
                level: Level::Object,
            } => {
                if let Some(object) = self.state.open_object() {
                    debug!(object, next = item, "object left open by a new object start");
                }
                self.enter(
                    LexState::InObject {
                        object: item.to_string(),
                    },
                    Cow::Borrowed(&lists.in_object),
                );
                Ok(Some(Token::node_type(item)))
            }
            MarkerEvent::Start {
                item,
                level: Level::Attribute,
            } => {
                let object = match self.state.open_object() {
                    Some(object) => object.to_string(),
                    None => return Ok(None),
                };
                let search = patterns.attribute_search_list(item)?;
                self.enter(
                    LexState::InAttribute {
                        object,
                        attribute: item.to_string(),
                    },
                    Cow::Owned(search),
                );
                Ok(None)
            }
            MarkerEvent::End {
                level: Level::Process,
                ..
            } => {
                self.enter(LexState::Finished, Cow::Owned(SearchList::new()));
                Ok(None)
            }
            MarkerEvent::End {
                level: Level::Object,
                ..
            } => {
                if let Some(attribute) = self.state.open_attribute() {
                    debug!(attribute, "attribute abandoned by its object's end");
                }
                self.enter(LexState::Idle, Cow::Borrowed(&lists.idle));
                Ok(Some(Token::object_end()))
            }
            MarkerEvent::End {
                item,
                level: Level::Attribute,
            } => {
                let object = self.state.open_object().unwrap_or_default().to_string();
                let text = &self.input[self.start..self.pos];
                let token = Token::attribute(item, text);
                self.enter(
                    LexState::InObject { object },
                    Cow::Borrowed(&lists.in_object),
                );
                Ok(Some(token))
            }
        }
    }

    fn enter(&mut self, state: LexState, search: Cow<'p, SearchList>) {
        debug!(
            from = self.state.as_ref(),
            to = state.as_ref(),
            pos = self.pos,
            "transition"
        );
        self.state = state;
        self.search = search;
    }

    /// Closes the scan once the input is exhausted.
    fn finish(&mut self) -> LexResult<Token> {
        let object = self.state.open_object().map(str::to_string);
        let attribute = self.state.open_attribute().map(str::to_string);
        if object.is_some() {
            match self.policy {
                UnclosedPolicy::Strict => {
                    return Err(LexError::Unclosed { object, attribute });
                }
                UnclosedPolicy::Lenient => {
                    warn!(?object, ?attribute, "input ended inside an open scope");
                }
            }
        }
        Ok(Token::end_of_stream())
    }
}

impl Iterator for Scanner<'_, '_> {
    type Item = LexResult<Token>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.advance(None) {
            Poll::Ready(item) => item,
            Poll::Pending => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::ConfigTable;
    use pretty_assertions::assert_eq;

    fn patterns() -> CompiledPatterns {
        CompiledPatterns::compile(&ConfigTable::from_rows(vec![
            vec!["order", "process", "object", "attribute"],
            vec!["items"],
            vec!["process", "Doc"],
            vec!["object", "Person"],
            vec!["attribute", "Name"],
            vec!["attribute", "Age"],
            vec!["markers"],
            vec!["Doc", "<P>", "</P>"],
            vec!["Person", "<Person>", "</Person>"],
            vec!["Name", "<Name>", "</Name>"],
            vec!["Age", "<Age>", "</Age>"],
        ]))
        .unwrap()
    }

    fn pairs(patterns: &CompiledPatterns, input: &str) -> Vec<(String, String)> {
        Scanner::new(patterns, input, UnclosedPolicy::Lenient)
            .map(|token| {
                let token = token.unwrap();
                (token.key.to_string(), token.value)
            })
            .collect()
    }

    fn expected(tokens: &[(&str, &str)]) -> Vec<(String, String)> {
        tokens
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_state_walk() {
        let patterns = patterns();
        let mut scanner = Scanner::new(
            &patterns,
            "<P><Person><Name>Al</Name></Person></P>",
            UnclosedPolicy::Lenient,
        );
        assert_eq!(scanner.state(), &LexState::Prelude);

        assert_eq!(scanner.next().unwrap().unwrap(), Token::node_type("Person"));
        assert_eq!(
            scanner.state(),
            &LexState::InObject {
                object: "Person".to_string()
            }
        );
        assert_eq!(scanner.position(), "<P><Person>".len());

        assert_eq!(scanner.next().unwrap().unwrap(), Token::attribute("Name", "Al"));
        assert_eq!(scanner.last_width(), "</Name>".len());
        assert_eq!(scanner.next().unwrap().unwrap(), Token::object_end());
        assert_eq!(scanner.state(), &LexState::Idle);
        assert_eq!(scanner.next().unwrap().unwrap(), Token::end_of_stream());
        assert_eq!(scanner.state(), &LexState::Finished);
        assert!(scanner.next().is_none());
    }

    #[test]
    fn test_text_before_process_is_ignored() {
        let patterns = patterns();
        assert_eq!(
            pairs(&patterns, "<Person>junk<P><Person><Age>3</Age></Person></P>"),
            expected(&[("nodeType", "Person"), ("Age", "3"), ("object", ""), ("EOF", "")])
        );
    }

    #[test]
    fn test_text_after_process_end_is_ignored() {
        let patterns = patterns();
        assert_eq!(
            pairs(&patterns, "<P></P><Person><Name>x</Name></Person>"),
            expected(&[("EOF", "")])
        );
    }

    #[test]
    fn test_attribute_text_keeps_non_marker_text() {
        let patterns = patterns();
        assert_eq!(
            pairs(&patterns, "<P><Person><Name> a </Age> b\n</Name></Person></P>"),
            expected(&[
                ("nodeType", "Person"),
                ("Name", " a </Age> b\n"),
                ("object", ""),
                ("EOF", "")
            ])
        );
    }

    #[test]
    fn test_multibyte_text() {
        let patterns = patterns();
        assert_eq!(
            pairs(&patterns, "<P>日本<Person><Name>名前ü</Name>語</Person></P>"),
            expected(&[("nodeType", "Person"), ("Name", "名前ü"), ("object", ""), ("EOF", "")])
        );
    }

    #[test]
    fn test_object_end_closes_open_attribute() {
        let patterns = patterns();
        assert_eq!(
            pairs(
                &patterns,
                "<P><Person><Name>runaway</Person><Person><Age>1</Age></Person></P>"
            ),
            expected(&[
                ("nodeType", "Person"),
                ("object", ""),
                ("nodeType", "Person"),
                ("Age", "1"),
                ("object", ""),
                ("EOF", "")
            ])
        );
    }

    #[test]
    fn test_process_end_not_seen_inside_attribute() {
        let patterns = patterns();
        let mut scanner =
            Scanner::new(&patterns, "<P><Person><Name>a</P>", UnclosedPolicy::Lenient);
        assert_eq!(scanner.next().unwrap().unwrap(), Token::node_type("Person"));
        assert_eq!(scanner.next().unwrap().unwrap(), Token::end_of_stream());
        assert_eq!(scanner.state().open_attribute(), Some("Name"));
    }

    #[test]
    fn test_strict_policy_reports_open_scope() {
        let patterns = patterns();
        let result: LexResult<Vec<Token>> =
            Scanner::new(&patterns, "<P><Person><Name>a", UnclosedPolicy::Strict).collect();
        assert_eq!(
            result.unwrap_err(),
            LexError::Unclosed {
                object: Some("Person".to_string()),
                attribute: Some("Name".to_string()),
            }
        );

        let result: LexResult<Vec<Token>> =
            Scanner::new(&patterns, "<P><Person>", UnclosedPolicy::Strict).collect();
        assert_eq!(
            result.unwrap_err(),
            LexError::Unclosed {
                object: Some("Person".to_string()),
                attribute: None,
            }
        );
    }

    #[test]
    fn test_poll_steps_pauses_inside_long_text() {
        let patterns = patterns();
        let input = format!("<P>{}<Person></Person></P>", "x".repeat(100));
        let mut scanner = Scanner::new(&patterns, &input, UnclosedPolicy::Lenient);

        let mut paused = 0;
        let first = loop {
            match scanner.poll_steps(10) {
                Poll::Pending => paused += 1,
                Poll::Ready(item) => break item,
            }
        };
        assert!(paused >= 10);
        assert_eq!(first.unwrap().unwrap(), Token::node_type("Person"));
        assert_eq!(scanner.next().unwrap().unwrap(), Token::object_end());
        assert_eq!(scanner.poll_steps(10), Poll::Ready(Some(Ok(Token::end_of_stream()))));
        assert_eq!(scanner.poll_steps(10), Poll::Ready(None));
    }

    #[test]
    fn test_empty_input() {
        let patterns = patterns();
        assert_eq!(pairs(&patterns, ""), expected(&[("EOF", "")]));
    }
}
