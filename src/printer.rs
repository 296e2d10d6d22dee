//! SDL rendering for parsed documents.

use std::fmt::{self, Display};

use async_graphql_parser::{
    types::{
        ConstDirective, DirectiveDefinition, FieldDefinition, InputValueDefinition,
        SchemaDefinition, ServiceDocument, TypeDefinition, TypeKind, TypeSystemDefinition,
    },
    Positioned,
};

const INDENT: &str = "    ";

/// Render a document back to SDL.
pub fn print_document(document: &ServiceDocument) -> String {
    Sdl(document).to_string()
}

/// Display adapter printing a [`ServiceDocument`] as SDL.
pub struct Sdl<'a>(pub &'a ServiceDocument);

impl Display for Sdl<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, definition) in self.0.definitions.iter().enumerate() {
            if idx > 0 {
                writeln!(f)?;
            }
            match definition {
                TypeSystemDefinition::Schema(schema) => write_schema(f, &schema.node)?,
                TypeSystemDefinition::Type(ty) => write_type(f, &ty.node)?,
                TypeSystemDefinition::Directive(directive) => write_directive_definition(f, &directive.node)?,
            }
        }
        Ok(())
    }
}

struct Description<'a>(&'a str, &'a str);

impl Display for Description<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Description(description, indentation) = self;

        // Lines keep whatever indentation they have beyond the shared prefix.
        let common = description
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| line.len() - line.trim_start().len())
            .min()
            .unwrap_or(0);

        writeln!(f, r#"{indentation}""""#)?;
        for line in description.lines() {
            let line = line.get(common..).unwrap_or("").trim_end();
            if line.is_empty() {
                writeln!(f)?;
            } else {
                writeln!(f, "{indentation}{}", line.replace(r#"""""#, r#"\""""#))?;
            }
        }
        writeln!(f, r#"{indentation}""""#)
    }
}

fn write_description(
    f: &mut fmt::Formatter<'_>,
    description: &Option<Positioned<String>>,
    indentation: &str,
) -> fmt::Result {
    match description {
        Some(description) => Display::fmt(&Description(&description.node, indentation), f),
        None => Ok(()),
    }
}

fn write_directives(f: &mut fmt::Formatter<'_>, directives: &[Positioned<ConstDirective>]) -> fmt::Result {
    for directive in directives {
        let directive = &directive.node;
        write!(f, " @{}", directive.name.node)?;
        if directive.arguments.is_empty() {
            continue;
        }
        f.write_str("(")?;
        for (idx, (name, value)) in directive.arguments.iter().enumerate() {
            if idx > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}: {}", name.node, value.node)?;
        }
        f.write_str(")")?;
    }
    Ok(())
}

fn write_input_value(f: &mut fmt::Formatter<'_>, value: &InputValueDefinition) -> fmt::Result {
    write!(f, "{}: {}", value.name.node, value.ty.node)?;
    if let Some(default) = &value.default_value {
        write!(f, " = {}", default.node)?;
    }
    write_directives(f, &value.directives)
}

fn write_arguments(
    f: &mut fmt::Formatter<'_>,
    arguments: &[Positioned<InputValueDefinition>],
    indentation: &str,
) -> fmt::Result {
    if arguments.is_empty() {
        return Ok(());
    }

    if arguments.iter().any(|argument| argument.node.description.is_some()) {
        let inner = format!("{indentation}{INDENT}");
        f.write_str("(\n")?;
        for argument in arguments {
            write_description(f, &argument.node.description, &inner)?;
            f.write_str(&inner)?;
            write_input_value(f, &argument.node)?;
            writeln!(f)?;
        }
        return write!(f, "{indentation})");
    }

    f.write_str("(")?;
    for (idx, argument) in arguments.iter().enumerate() {
        if idx > 0 {
            f.write_str(", ")?;
        }
        write_input_value(f, &argument.node)?;
    }
    f.write_str(")")
}

fn write_field(f: &mut fmt::Formatter<'_>, field: &FieldDefinition) -> fmt::Result {
    write_description(f, &field.description, INDENT)?;
    write!(f, "{INDENT}{}", field.name.node)?;
    write_arguments(f, &field.arguments, INDENT)?;
    write!(f, ": {}", field.ty.node)?;
    write_directives(f, &field.directives)?;
    writeln!(f)
}

fn write_implements(f: &mut fmt::Formatter<'_>, implements: &[Positioned<async_graphql_value::Name>]) -> fmt::Result {
    if implements.is_empty() {
        return Ok(());
    }
    f.write_str(" implements ")?;
    for (idx, interface) in implements.iter().enumerate() {
        if idx > 0 {
            f.write_str(" & ")?;
        }
        write!(f, "{}", interface.node)?;
    }
    Ok(())
}

fn write_schema(f: &mut fmt::Formatter<'_>, schema: &SchemaDefinition) -> fmt::Result {
    if schema.extend {
        f.write_str("extend ")?;
    }
    f.write_str("schema")?;
    write_directives(f, &schema.directives)?;
    f.write_str(" {\n")?;
    let roots = [
        ("query", &schema.query),
        ("mutation", &schema.mutation),
        ("subscription", &schema.subscription),
    ];
    for (operation, name) in roots {
        if let Some(name) = name {
            writeln!(f, "{INDENT}{operation}: {}", name.node)?;
        }
    }
    writeln!(f, "}}")
}

fn write_type(f: &mut fmt::Formatter<'_>, ty: &TypeDefinition) -> fmt::Result {
    write_description(f, &ty.description, "")?;
    if ty.extend {
        f.write_str("extend ")?;
    }
    let name = &ty.name.node;

    match &ty.kind {
        TypeKind::Scalar => {
            write!(f, "scalar {name}")?;
            write_directives(f, &ty.directives)?;
            writeln!(f)
        }
        TypeKind::Object(object) => {
            write!(f, "type {name}")?;
            write_implements(f, &object.implements)?;
            write_directives(f, &ty.directives)?;
            write_fields(f, &object.fields)
        }
        TypeKind::Interface(interface) => {
            write!(f, "interface {name}")?;
            write_implements(f, &interface.implements)?;
            write_directives(f, &ty.directives)?;
            write_fields(f, &interface.fields)
        }
        TypeKind::Union(union) => {
            write!(f, "union {name}")?;
            write_directives(f, &ty.directives)?;
            if !union.members.is_empty() {
                f.write_str(" = ")?;
                for (idx, member) in union.members.iter().enumerate() {
                    if idx > 0 {
                        f.write_str(" | ")?;
                    }
                    write!(f, "{}", member.node)?;
                }
            }
            writeln!(f)
        }
        TypeKind::Enum(enum_type) => {
            write!(f, "enum {name}")?;
            write_directives(f, &ty.directives)?;
            if enum_type.values.is_empty() {
                return writeln!(f);
            }
            f.write_str(" {\n")?;
            for value in &enum_type.values {
                let value = &value.node;
                write_description(f, &value.description, INDENT)?;
                write!(f, "{INDENT}{}", value.value.node)?;
                write_directives(f, &value.directives)?;
                writeln!(f)?;
            }
            writeln!(f, "}}")
        }
        TypeKind::InputObject(input) => {
            write!(f, "input {name}")?;
            write_directives(f, &ty.directives)?;
            if input.fields.is_empty() {
                return writeln!(f);
            }
            f.write_str(" {\n")?;
            for field in &input.fields {
                let field = &field.node;
                write_description(f, &field.description, INDENT)?;
                f.write_str(INDENT)?;
                write_input_value(f, field)?;
                writeln!(f)?;
            }
            writeln!(f, "}}")
        }
    }
}

fn write_fields(f: &mut fmt::Formatter<'_>, fields: &[Positioned<FieldDefinition>]) -> fmt::Result {
    if fields.is_empty() {
        return writeln!(f);
    }
    f.write_str(" {\n")?;
    for field in fields {
        write_field(f, &field.node)?;
    }
    writeln!(f, "}}")
}

fn write_directive_definition(f: &mut fmt::Formatter<'_>, directive: &DirectiveDefinition) -> fmt::Result {
    write_description(f, &directive.description, "")?;
    write!(f, "directive @{}", directive.name.node)?;
    write_arguments(f, &directive.arguments, "")?;
    if directive.is_repeatable {
        f.write_str(" repeatable")?;
    }
    f.write_str(" on ")?;
    for (idx, location) in directive.locations.iter().enumerate() {
        if idx > 0 {
            f.write_str(" | ")?;
        }
        f.write_str(&location_name(&format!("{:?}", location.node)))?;
    }
    writeln!(f)
}

/// `InputFieldDefinition` -> `INPUT_FIELD_DEFINITION`
fn location_name(variant: &str) -> String {
    let mut out = String::with_capacity(variant.len() + 4);
    for (idx, c) in variant.chars().enumerate() {
        if c.is_ascii_uppercase() && idx > 0 {
            out.push('_');
        }
        out.push(c.to_ascii_uppercase());
    }
    out
}
