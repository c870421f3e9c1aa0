use remote_eval::jtype::PrimitiveType;
use remote_eval::snapshot::fixture::Fixture;
use remote_eval::{FieldType, Value};
use std::str::FromStr;

/// Parses a command line literal for a field of the given type.
/// References are `null` or `@label` naming a snapshot object.
pub fn parse(text: &str, expected: &FieldType, fixture: &Fixture) -> Result<Value, String> {
    let text = text.trim();
    let invalid = || format!("{:?} is not a valid {} literal", text, describe(expected));
    match expected {
        FieldType::Reference(_) => match text {
            "null" => Ok(Value::Null),
            _ => text
                .strip_prefix('@')
                .and_then(|label| fixture.object(label))
                .map(Value::Object)
                .ok_or_else(invalid),
        },
        FieldType::Primitive(prim) => {
            let parsed = match prim {
                PrimitiveType::Boolean => parse_as::<bool>(text).map(Value::Boolean),
                PrimitiveType::Byte => parse_as::<i8>(text).map(Value::Byte),
                PrimitiveType::Short => parse_as::<i16>(text).map(Value::Short),
                PrimitiveType::Int => parse_as::<i32>(text).map(Value::Integer),
                PrimitiveType::Long => {
                    parse_as::<i64>(text.strip_suffix(['L', 'l']).unwrap_or(text)).map(Value::Long)
                }
                PrimitiveType::Float => {
                    parse_as::<f32>(text.strip_suffix(['F', 'f']).unwrap_or(text)).map(Value::Float)
                }
                PrimitiveType::Double => {
                    parse_as::<f64>(text.strip_suffix(['D', 'd']).unwrap_or(text)).map(Value::Double)
                }
                PrimitiveType::Char => {
                    let inner = text
                        .strip_prefix('\'')
                        .and_then(|t| t.strip_suffix('\''))
                        .unwrap_or(text);
                    let mut chars = inner.chars();
                    match (chars.next(), chars.next()) {
                        (Some(c), None) => u16::try_from(c as u32).ok().map(Value::Char),
                        _ => None,
                    }
                }
            };
            parsed.ok_or_else(invalid)
        }
    }
}

fn parse_as<T: FromStr>(text: &str) -> Option<T> {
    text.parse().ok()
}

fn describe(expected: &FieldType) -> &'static str {
    match expected {
        FieldType::Primitive(prim) => prim.java_name(),
        FieldType::Reference(_) => "reference",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const SNAPSHOT: &str = r#"
        [[types]]
        name = "com/example/Box"

        [[objects]]
        id = "b"
        type = "com/example/Box"
    "#;

    #[rstest]
    #[case("true", PrimitiveType::Boolean, Value::Boolean(true))]
    #[case("-3", PrimitiveType::Byte, Value::Byte(-3))]
    #[case("42", PrimitiveType::Int, Value::Integer(42))]
    #[case("7L", PrimitiveType::Long, Value::Long(7))]
    #[case("2.5f", PrimitiveType::Float, Value::Float(2.5))]
    #[case("0.25", PrimitiveType::Double, Value::Double(0.25))]
    #[case("'x'", PrimitiveType::Char, Value::Char('x' as u16))]
    fn parses_primitive_literals(#[case] text: &str, #[case] prim: PrimitiveType, #[case] expected: Value) {
        let fixture = Fixture::parse(SNAPSHOT).unwrap();
        assert_eq!(parse(text, &FieldType::Primitive(prim), &fixture), Ok(expected));
    }

    #[test]
    fn parses_references_by_label() {
        let fixture = Fixture::parse(SNAPSHOT).unwrap();
        let object_type = FieldType::Reference(fixture.process.java_lang_object_id());
        let b = fixture.object("b").unwrap();
        assert_eq!(parse("@b", &object_type, &fixture), Ok(Value::Object(b)));
        assert_eq!(parse("null", &object_type, &fixture), Ok(Value::Null));
        assert_eq!(
            parse("@nope", &object_type, &fixture),
            Err("\"@nope\" is not a valid reference literal".to_string())
        );
    }

    #[rstest]
    #[case("300", PrimitiveType::Byte)]
    #[case("yes", PrimitiveType::Boolean)]
    #[case("'ab'", PrimitiveType::Char)]
    fn rejects_out_of_range_or_malformed(#[case] text: &str, #[case] prim: PrimitiveType) {
        let fixture = Fixture::parse(SNAPSHOT).unwrap();
        assert!(parse(text, &FieldType::Primitive(prim), &fixture).is_err());
    }
}
