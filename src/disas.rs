use std::fmt;

use crate::ast::{Arg, Callee, Clause, Expr, Ident, LambdaSubject, Property, RefObject};
use crate::lambda::Lambda;
use crate::value::{Key, Value};
use crate::varref::{Base, Reference};

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Empty => Ok(()),

            Expr::Number { value } => write!(f, "{value}"),

            Expr::String { value } => write!(f, "{value:?}"),

            Expr::Boolean { value } => write!(f, "{value}"),

            Expr::Colour { value } => write!(f, "colour({value:?})"),

            Expr::Identifier { name: Ident::It } => write!(f, "it"),

            Expr::Identifier { name: Ident::Time } => write!(f, "time"),

            Expr::HookRef { name } => write!(f, "hooks({name:?})"),

            Expr::Ref { object, property } => {
                match object {
                    RefObject::Variables => write!(f, "ref($, ")?,
                    RefObject::TempVariables => write!(f, "ref(_, ")?,
                    RefObject::Expr(expr) => write!(f, "ref({expr}, ")?,
                }

                match property {
                    Property::Name(name) => write!(f, "{name:?})"),
                    Property::Computed(expr) => write!(f, "{expr})"),
                }
            },

            Expr::Get { reference } => write!(f, "{reference}.get()"),

            Expr::Infix { lhs, op, rhs } => write!(f, "{}({lhs}, {rhs})", op.name()),

            Expr::Not { rhs } => write!(f, "not({rhs})"),

            Expr::Group { value } => write!(f, "({value})"),

            Expr::Assign { dest, src, op } => write!(f, "makeAssignmentRequest({dest}, {src}, {:?})", op.name()),

            Expr::Lambda { subject, clause } => {
                write!(f, "Lambda.create(")?;

                match subject {
                    LambdaSubject::Implicit => write!(f, "null")?,
                    LambdaSubject::Param(name) => write!(f, "_{name}")?,
                    LambdaSubject::Expr(expr) => write!(f, "{expr}")?,
                }

                match clause {
                    Clause::Where(body) => write!(f, ", \"where\", {body})"),
                    Clause::Via(body) => write!(f, ", \"via\", {body})"),
                    Clause::With(name) => write!(f, ", \"with\", \"_{name}\")"),
                    Clause::Making(name) => write!(f, ", \"making\", \"_{name}\")"),
                }
            },

            Expr::Macro { callee, args } => {
                match callee {
                    Callee::Named(name) => write!(f, "Macros.run({name:?}, [")?,
                    Callee::Computed(expr) => write!(f, "Macros.run({expr}, [")?,
                }

                let mut first = true;
                for arg in args {
                    if first {
                        first = false;
                    } else {
                        write!(f, ", ")?;
                    }

                    match arg {
                        Arg::Value(expr) => write!(f, "{expr}")?,
                        Arg::Spread(expr) => write!(f, "...{expr}")?,
                    }
                }

                write!(f, "])")
            },

            Expr::Error { kind, message } => write!(f, "error({:?}, {message:?})", kind.to_string()),
        }
    }
}

/// Render a runtime value as source code that would produce it.
pub fn to_source(value: &Value) -> String {
    match value {
        Value::Number(n) => format!("{n}"),

        Value::String(s) => quote(s),

        Value::Boolean(b) => format!("{b}"),

        Value::Array(items) => call("a", items.iter().map(to_source)),

        Value::Map(map) => call("dm", map.iter().flat_map(|(k, v)| [key_source(k), to_source(v)])),

        Value::Set(set) => call("ds", set.iter().map(to_source)),

        Value::Colour(colour) => colour.to_string(),

        Value::Changer(changer) => changer.calls.iter()
        .map(|c| call(&c.name, c.params.iter().map(to_source)))
        .collect::<Vec<_>>()
        .join(" + "),

        Value::Lambda(lambda) => lambda_source(lambda),

        Value::HookSet(hooks) => format!("?{}", hooks.name),

        Value::Ref(reference) => ref_source(reference),

        Value::Assignment(request) => format!(
            "{} {} {}",
            ref_source(&request.dest),
            request.operator.name(),
            to_source(&request.src),
        ),

        Value::Error(err) => call("error", [quote(&err.message)].into_iter()),
    }
}

fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');

    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            _ => out.push(c),
        }
    }

    out.push('"');
    out
}

fn key_source(key: &Key) -> String {
    match key {
        Key::String(s) => quote(s),
        Key::Number(n) => format!("{n}"),
    }
}

fn call(name: &str, args: impl Iterator<Item=String>) -> String {
    let args: Vec<String> = args.collect();

    if args.is_empty() {
        format!("({name}:)")
    } else {
        format!("({name}: {})", args.join(", "))
    }
}

fn lambda_source(lambda: &Lambda) -> String {
    let mut parts = Vec::new();

    if let Some(name) = &lambda.loop_var {
        parts.push(format!("_{name}"));
    }

    if let Some(name) = &lambda.making {
        parts.push(format!("making _{name}"));
    }

    if let Some(name) = &lambda.with {
        parts.push(format!("with _{name}"));
    }

    if let Some(body) = &lambda.where_clause {
        parts.push(format!("where {body}"));
    }

    if let Some(body) = &lambda.via {
        parts.push(format!("via {body}"));
    }

    parts.join(" ")
}

fn ref_source(reference: &Reference) -> String {
    let mut keys = reference.keys();

    let mut out = match (&reference.object, keys.next()) {
        (Base::Variables, Some(name)) => format!("${name}"),
        (Base::TempVariables, Some(name)) => format!("_{name}"),
        (Base::Value(value), Some(key)) => format!("{}'s ({})", to_source(value), key_source(key)),
        (_, None) => String::new(),
    };

    for key in keys {
        out.push_str(&format!("'s ({})", key_source(key)));
    }

    out
}

#[cfg(test)]
mod test {
    use super::*;

    use pretty_assertions::assert_eq;

    use crate::value::{Changer, Colour, DataMap, DataSet, HookSet};

    #[test]
    fn collections_render_as_macro_calls() {
        let map: DataMap = [
            (Key::from("name"), Value::from("Ann \"A\"")),
            (Key::from(2.0), Value::Array(vec![1.into(), true.into()])),
        ].into_iter().collect();

        assert_eq!(to_source(&Value::Map(map)), r#"(dm: "name", "Ann \"A\"", 2, (a: 1, true))"#);
        assert_eq!(to_source(&Value::Set(DataSet::new())), "(ds:)");
    }

    #[test]
    fn other_values() {
        assert_eq!(to_source(&Value::Colour(Colour { r: 255, g: 0, b: 16 })), "#ff0010");
        assert_eq!(to_source(&Value::HookSet(HookSet::named("door"))), "?door");

        let changer = Changer::new("bold", vec![]).compose(Changer::new("text-colour", vec!["red".into()]));
        assert_eq!(to_source(&Value::Changer(changer)), r#"(bold:) + (text-colour: "red")"#);

        let reference = Reference {
            object: Base::Variables,
            path: vec![Key::from("inv")],
            property: Key::from(0.0),
        };
        assert_eq!(to_source(&Value::Ref(Box::new(reference))), "$inv's (0)");
    }
}
