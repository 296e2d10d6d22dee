//! Literal extraction from annotation arguments.

use async_graphql_parser::types::ConstDirective;
use async_graphql_value::ConstValue;

use crate::types::{DirectiveArg, DirectiveArgs};

/// Extract all arguments of an annotation.
pub fn extract_arguments(directive: &ConstDirective) -> DirectiveArgs {
    let mut args = DirectiveArgs::new();
    for (name, value) in &directive.arguments {
        args.insert(name.node.as_str(), extract_literal(&value.node));
    }
    args
}

/// Convert one argument node into a literal, or keep it raw.
pub fn extract_literal(value: &ConstValue) -> DirectiveArg {
    match value {
        ConstValue::Number(n) => match n.as_i64() {
            Some(i) => DirectiveArg::Int(i),
            None => n
                .as_f64()
                .map(DirectiveArg::Float)
                .unwrap_or_else(|| DirectiveArg::Raw(value.clone())),
        },
        ConstValue::String(s) => DirectiveArg::String(s.clone()),
        ConstValue::Boolean(b) => DirectiveArg::Boolean(*b),
        other => DirectiveArg::Raw(other.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_graphql_parser::parse_schema;
    use async_graphql_parser::types::{TypeKind, TypeSystemDefinition};

    fn first_field_directive(sdl: &str) -> ConstDirective {
        let doc = parse_schema(sdl).unwrap();
        let TypeSystemDefinition::Type(ty) = &doc.definitions[0] else {
            panic!("expected a type definition");
        };
        let TypeKind::InputObject(input) = &ty.node.kind else {
            panic!("expected an input object");
        };
        input.fields[0].node.directives[0].node.clone()
    }

    #[test]
    fn extracts_scalar_literals() {
        let directive = first_field_directive(
            r#"input I { v: Int @Check(a: 3, b: 1.5, c: "x", d: true) }"#,
        );
        let args = extract_arguments(&directive);

        assert_eq!(args.int("a"), Some(3));
        assert_eq!(args.float("b"), Some(1.5));
        assert_eq!(args.string("c"), Some("x"));
        assert_eq!(args.boolean("d"), Some(true));
    }

    #[test]
    fn keeps_non_literals_raw() {
        let directive =
            first_field_directive(r#"input I { v: Int @Check(l: ["a"], e: RED, n: null) }"#);
        let args = extract_arguments(&directive);

        assert!(matches!(args.raw("l"), Some(ConstValue::List(_))));
        assert!(matches!(args.raw("e"), Some(ConstValue::Enum(_))));
        assert!(matches!(args.raw("n"), Some(ConstValue::Null)));
    }

    #[test]
    fn preserves_argument_order() {
        let directive = first_field_directive(r#"input I { v: Int @Length(max: 5, min: 1) }"#);
        let names: Vec<_> = extract_arguments(&directive)
            .iter()
            .map(|(name, _)| name.to_string())
            .collect();
        assert_eq!(names, ["max", "min"]);
    }
}
