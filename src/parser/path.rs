// Path expression grammar
//
// path    := "root" segment*
// segment := "[]" | "." ident | "[" quoted "]" | "[" digits "]"

use super::ast::{PathExpr, Segment};
use super::lexer::{identifier, index_literal, string_literal, ws};
use crate::error::AxisError;
use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::char,
    combinator::{all_consuming, map, value},
    multi::many0,
    sequence::{delimited, preceded},
    IResult,
};

#[derive(Debug, Clone, PartialEq)]
enum RawSegment {
    Marker,
    Step(Segment),
}

fn array_marker(input: &str) -> IResult<&str, RawSegment> {
    value(RawSegment::Marker, tag("[]"))(input)
}

fn dotted_field(input: &str) -> IResult<&str, RawSegment> {
    map(preceded(char('.'), identifier), |name| {
        RawSegment::Step(Segment::Field(name))
    })(input)
}

fn bracket_field(input: &str) -> IResult<&str, RawSegment> {
    map(delimited(char('['), string_literal, char(']')), |name| {
        RawSegment::Step(Segment::Field(name))
    })(input)
}

fn bracket_index(input: &str) -> IResult<&str, RawSegment> {
    map(delimited(char('['), index_literal, char(']')), |idx| {
        RawSegment::Step(Segment::Index(idx))
    })(input)
}

fn segment(input: &str) -> IResult<&str, RawSegment> {
    alt((array_marker, bracket_index, bracket_field, dotted_field))(input)
}

fn raw_path(input: &str) -> IResult<&str, Vec<RawSegment>> {
    preceded(tag("root"), many0(segment))(input)
}

/// Parse a path expression, splitting it at the array marker
pub fn parse_path_expr(source: &str) -> Result<PathExpr, AxisError> {
    let invalid = |reason: &str| AxisError::Path {
        path: source.to_string(),
        reason: reason.to_string(),
    };

    let (_, raw) = all_consuming(ws(raw_path))(source)
        .map_err(|_| invalid("expected `root` followed by `[]`, `.field`, `[\"field\"]` or `[index]`"))?;

    let mut array_path = Vec::new();
    let mut item_path = Vec::new();
    let mut has_marker = false;

    for seg in raw {
        match seg {
            RawSegment::Marker if has_marker => {
                return Err(invalid("only one array marker `[]` is supported"));
            }
            RawSegment::Marker => has_marker = true,
            RawSegment::Step(step) if has_marker => item_path.push(step),
            RawSegment::Step(step) => array_path.push(step),
        }
    }

    Ok(PathExpr {
        source: source.trim().to_string(),
        array_path,
        item_path,
        has_marker,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(name: &str) -> Segment {
        Segment::Field(name.to_string())
    }

    #[test]
    fn test_parse_root_iteration() {
        let expr = parse_path_expr("root[].createdAt").unwrap();
        assert!(expr.array_path.is_empty());
        assert!(expr.has_marker);
        assert_eq!(expr.item_path, vec![field("createdAt")]);
        assert_eq!(expr.field_name(), Some("createdAt"));
    }

    #[test]
    fn test_parse_nested_array() {
        let expr = parse_path_expr("root.data.items[].price.amount").unwrap();
        assert_eq!(expr.array_path, vec![field("data"), field("items")]);
        assert_eq!(expr.item_path, vec![field("price"), field("amount")]);
        assert_eq!(expr.field_name(), Some("amount"));
    }

    #[test]
    fn test_parse_without_marker() {
        let expr = parse_path_expr("root.values").unwrap();
        assert!(!expr.has_marker);
        assert_eq!(expr.array_path, vec![field("values")]);
        assert!(expr.item_path.is_empty());
        assert_eq!(expr.field_name(), Some("values"));
    }

    #[test]
    fn test_parse_brackets() {
        let expr = parse_path_expr(r#"root.pages[0].rows[]["unit price"]"#).unwrap();
        assert_eq!(
            expr.array_path,
            vec![field("pages"), Segment::Index(0), field("rows")]
        );
        assert_eq!(expr.item_path, vec![field("unit price")]);
    }

    #[test]
    fn test_parse_whitespace() {
        let expr = parse_path_expr("  root[].x ").unwrap();
        assert_eq!(expr.source, "root[].x");
    }

    #[test]
    fn test_parse_rejects_double_marker() {
        let err = parse_path_expr("root[].items[].price").unwrap_err();
        assert!(matches!(err, AxisError::Path { .. }));
    }

    #[test]
    fn test_parse_rejects_missing_root() {
        assert!(parse_path_expr("data[].x").is_err());
        assert!(parse_path_expr("rooted.x").is_err());
        assert!(parse_path_expr("root.").is_err());
    }
}
