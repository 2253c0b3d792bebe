//! Row-level parsing for comma separated pattern tables.
//!
//! A line is split into cells on `,`. Cells may be wrapped in double quotes,
//! in which case commas are literal and `""` stands for one quote. Unquoted
//! cells are trimmed, quoted cells are kept verbatim so markers can carry
//! leading or trailing whitespace.

use nom::{
    branch::alt,
    bytes::complete::{is_not, tag, take_while},
    character::complete::{char, space0},
    combinator::{all_consuming, map, value},
    error::{context, convert_error, VerboseError},
    multi::{fold_many0, separated_list1},
    sequence::delimited,
    IResult,
};

use super::{TableError, TableResult};

pub type ParserResult<'a, T> = IResult<&'a str, T, VerboseError<&'a str>>;

#[tracing::instrument(level = "trace", skip(input))]
fn parse_quoted_cell(input: &str) -> ParserResult<String> {
    context(
        "quoted cell",
        delimited(
            space0,
            delimited(
                char('"'),
                fold_many0(
                    alt((value("\"", tag("\"\"")), is_not("\""))),
                    String::new,
                    |mut cell: String, part: &str| {
                        cell.push_str(part);
                        cell
                    },
                ),
                char('"'),
            ),
            space0,
        ),
    )(input)
}

#[tracing::instrument(level = "trace", skip(input))]
fn parse_bare_cell(input: &str) -> ParserResult<String> {
    context(
        "bare cell",
        map(take_while(|c: char| c != ',' && c != '"'), |cell: &str| {
            cell.trim().to_string()
        }),
    )(input)
}

fn parse_cells(input: &str) -> ParserResult<Vec<String>> {
    context(
        "row",
        all_consuming(separated_list1(
            char(','),
            alt((parse_quoted_cell, parse_bare_cell)),
        )),
    )(input)
}

/// Parses one table line into its cells, dropping trailing empty cells.
///
/// `line_number` is 1-based and only used for error reporting.
pub fn parse_row(line: &str, line_number: usize) -> TableResult<Vec<String>> {
    match parse_cells(line) {
        Ok((_, mut cells)) => {
            while cells.last().is_some_and(|cell| cell.is_empty()) {
                cells.pop();
            }
            Ok(cells)
        }
        Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => Err(TableError::Parse {
            line: line_number,
            message: convert_error(line, e),
        }),
        Err(nom::Err::Incomplete(needed)) => Err(TableError::Parse {
            line: line_number,
            message: format!("Incomplete input, {:?}", needed),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_cells() {
        let cells = parse_row("order, process ,object,attribute", 1).unwrap();
        assert_eq!(cells, vec!["order", "process", "object", "attribute"]);
    }

    #[test]
    fn test_trailing_empty_cells_dropped() {
        let cells = parse_row("items,,", 1).unwrap();
        assert_eq!(cells, vec!["items"]);
    }

    #[test]
    fn test_interior_empty_cell_kept() {
        let cells = parse_row("Name,,</Name>", 1).unwrap();
        assert_eq!(cells, vec!["Name", "", "</Name>"]);
    }

    #[test]
    fn test_quoted_cell_keeps_commas_and_spaces() {
        let cells = parse_row(r#"Sep," , "," ;""#, 1).unwrap();
        assert_eq!(cells, vec!["Sep", " , ", " ;"]);
    }

    #[test]
    fn test_doubled_quote_escape() {
        let cells = parse_row(r#"Quote,"say ""","""""#, 1).unwrap();
        assert_eq!(cells, vec!["Quote", "say \"", "\""]);
    }

    #[test]
    fn test_garbage_after_quote_is_error() {
        let err = parse_row(r#"Name,"<Name>"x,</Name>"#, 7).unwrap_err();
        match err {
            TableError::Parse { line, .. } => assert_eq!(line, 7),
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
