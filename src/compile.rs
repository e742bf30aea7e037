//! Expression compiler. Turns a token list into an `Expr` by repeatedly
//! splitting it at the operator with the lowest precedence.
//!
//! Malformed code never aborts the compile: the offending part becomes an
//! `Expr::Error`, which evaluates to a syntax error value wherever it sits.

use std::sync::Arc;

use log::debug;

use crate::ast::{Arg, AssignOp, Binop, Callee, Clause, Expr, Ident, LambdaSubject, Property, RefObject};
use crate::error::ErrorKind;
use crate::token::{Tok, Token};

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum Scan {
    /// Split at the first occurrence.
    Head,

    /// Split at the last occurrence, so earlier operators bind tighter.
    Tail,
}

/// Operator groups, loosest first.
const PRECEDENCE: &[(&[Tok], Scan)] = &[
    (&[Tok::Comma], Scan::Head),
    (&[Tok::Spread], Scan::Head),
    (&[Tok::To], Scan::Head),
    (&[Tok::Into], Scan::Head),
    (&[Tok::Where, Tok::Via], Scan::Tail),
    (&[Tok::With, Tok::Making], Scan::Tail),
    (&[Tok::AugmentedAssign], Scan::Head),
    (&[Tok::And, Tok::Or], Scan::Tail),
    (&[Tok::Is, Tok::IsNot], Scan::Tail),
    (&[Tok::Contains, Tok::IsIn], Scan::Tail),
    (&[Tok::Inequality], Scan::Tail),
    (&[Tok::Addition, Tok::Subtraction], Scan::Tail),
    (&[Tok::Multiplication, Tok::Division], Scan::Tail),
    (&[Tok::Not], Scan::Head),
    (&[Tok::BelongingProperty], Scan::Head),
    (&[Tok::BelongingOperator, Tok::BelongingItOperator], Scan::Head),
    (&[Tok::Property], Scan::Tail),
    (&[Tok::ItsProperty], Scan::Tail),
    (&[Tok::BelongingItProperty], Scan::Tail),
    (&[Tok::PossessiveOperator, Tok::ItsOperator], Scan::Tail),
];

/// Compile a token list. With `is_ref`, variables and properties compile to
/// references instead of reads of their current value.
pub fn compile(tokens: &[Token], is_ref: bool) -> Expr {
    let tokens: Vec<&Token> = tokens.iter()
    .filter(|t| !t.is_whitespace())
    .collect();

    compile_tokens(&tokens, is_ref)
}

fn compile_tokens(tokens: &[&Token], is_ref: bool) -> Expr {
    if tokens.is_empty() {
        return Expr::Empty;
    }

    if let Some(at) = split_point(tokens) {
        return compile_operator(&tokens[..at], tokens[at], &tokens[at + 1..], is_ref);
    }

    match tokens {
        [token] => compile_leaf(token, is_ref),

        _ => {
            // Prefer reporting a token that can't be code at all
            if let Some(bad) = tokens.iter().find(|t| matches!(t.kind, Tok::Text | Tok::Error)) {
                return compile_leaf(bad, is_ref);
            }

            adjacent(tokens[0], tokens[1])
        },
    }
}

fn split_point(tokens: &[&Token]) -> Option<usize> {
    // `+` and `-` are signs unless they follow an operand
    let usable = |i: usize| match tokens[i].kind {
        Tok::Addition | Tok::Subtraction => i == 0 || tokens[i - 1].kind.ends_operand(),
        _ => true,
    };

    for &(kinds, scan) in PRECEDENCE {
        let mut hits = (0..tokens.len())
        .filter(|&i| kinds.contains(&tokens[i].kind) && usable(i));

        let found = match scan {
            Scan::Head => hits.next(),
            Scan::Tail => hits.last(),
        };

        if found.is_some() {
            return found;
        }
    }

    None
}

fn syntax(message: impl Into<String>) -> Expr {
    let message = message.into();
    debug!("Compiled a syntax error: {message}");
    Expr::error(ErrorKind::Syntax, message)
}

fn missing(side: &str, op: &Token) -> Expr {
    syntax(format!("I need usable code to the {side} of `{}`.", op.text.trim()))
}

fn adjacent(a: &Token, b: &Token) -> Expr {
    syntax(format!("There's nothing joining `{}` and `{}`.", a.text.trim(), b.text.trim()))
}

fn it() -> Expr {
    Expr::Identifier { name: Ident::It }
}

fn reference(object: RefObject, property: Property, is_ref: bool) -> Expr {
    let reference = Expr::Ref { object, property };

    if is_ref {
        reference
    } else {
        Expr::get(reference)
    }
}

fn object(expr: Expr) -> RefObject {
    RefObject::Expr(Box::new(expr))
}

fn computed(expr: Expr) -> Property {
    Property::Computed(Box::new(expr))
}

fn compile_leaf(token: &Token, is_ref: bool) -> Expr {
    let name = || token.name.clone().unwrap_or_default();

    match token.kind {
        Tok::Number | Tok::CssTime => Expr::Number {
            value: token.value.unwrap_or(f64::NAN),
        },

        Tok::String => {
            let raw = token.text.get(1..token.text.len().saturating_sub(1)).unwrap_or_default();
            Expr::String { value: unescape(raw) }
        },

        Tok::Boolean => Expr::Boolean {
            value: token.text.eq_ignore_ascii_case("true"),
        },

        Tok::Colour => Expr::Colour {
            value: token.colour.clone().unwrap_or_default(),
        },

        Tok::Identifier => Expr::Identifier {
            name: match token.name.as_deref() {
                Some("time") => Ident::Time,
                _ => Ident::It,
            },
        },

        Tok::HookRef => Expr::HookRef { name: name() },

        Tok::Variable => reference(RefObject::Variables, Property::Name(name()), is_ref),

        Tok::TempVariable => reference(RefObject::TempVariables, Property::Name(name()), is_ref),

        Tok::Grouping => Expr::Group {
            value: Box::new(compile(&token.children, is_ref)),
        },

        Tok::Macro => compile_macro(token),

        Tok::TwineLink => {
            let text = token.inner_text.clone().unwrap_or_default();
            let passage = token.passage.clone().unwrap_or_else(|| text.clone());

            Expr::Macro {
                callee: Callee::Named("link-goto".into()),
                args: vec![
                    Arg::Value(Expr::String { value: text }),
                    Arg::Value(Expr::String { value: passage }),
                ],
            }
        },

        Tok::Error => syntax(token.message.clone().unwrap_or_else(|| "This code is malformed.".into())),

        _ => syntax(format!("`{}` isn't valid code here.", token.text.trim())),
    }
}

fn compile_operator(left: &[&Token], op: &Token, right: &[&Token], is_ref: bool) -> Expr {
    let value = |tokens: &[&Token]| compile_tokens(tokens, false);
    let place = |tokens: &[&Token]| compile_tokens(tokens, true);

    match op.kind {
        Tok::Comma => syntax("Commas can only separate the values given to a macro."),

        Tok::Spread => syntax("`...` can only go in front of a value given to a macro."),

        Tok::To | Tok::Into | Tok::AugmentedAssign => {
            if left.is_empty() {
                return missing("left", op);
            }

            if right.is_empty() {
                return missing("right", op);
            }

            let (dest, src, assign) = match op.kind {
                Tok::Into => (place(right), value(left), AssignOp::Into),
                Tok::AugmentedAssign => (place(left), value(right), AssignOp::Augmented(op.operator.unwrap_or(Binop::Add))),
                _ => (place(left), value(right), AssignOp::To),
            };

            Expr::Assign {
                dest: Box::new(dest),
                src: Box::new(src),
                op: assign,
            }
        },

        Tok::Where | Tok::Via | Tok::With | Tok::Making => compile_lambda(left, op, right),

        Tok::And | Tok::Or => compile_logic(left, op, right),

        Tok::Is | Tok::IsNot | Tok::Contains | Tok::IsIn | Tok::Inequality => {
            if right.is_empty() {
                return missing("right", op);
            }

            let lhs = if left.is_empty() { it() } else { value(left) };
            comparison(lhs, op, value(right))
        },

        Tok::Addition | Tok::Subtraction | Tok::Multiplication | Tok::Division => {
            let signed = matches!(op.kind, Tok::Addition | Tok::Subtraction);

            let lhs = match left {
                [] if signed => Expr::Number { value: 0.0 },
                [] => return missing("left", op),
                _ => value(left),
            };

            if right.is_empty() {
                return missing("right", op);
            }

            let Some(binop) = op.operator else {
                return syntax(format!("`{}` isn't an operator I know.", op.text));
            };

            Expr::infix(lhs, binop, value(right))
        },

        Tok::Not => {
            if let Some(&last) = left.last() {
                return adjacent(last, op);
            }

            if right.is_empty() {
                return missing("right", op);
            }

            Expr::Not { rhs: Box::new(value(right)) }
        },

        Tok::BelongingProperty => {
            if let Some(&last) = left.last() {
                return adjacent(last, op);
            }

            if right.is_empty() {
                return missing("right", op);
            }

            reference(object(place(right)), Property::Name(op.name.clone().unwrap_or_default()), is_ref)
        },

        Tok::BelongingOperator => {
            if left.is_empty() {
                return missing("left", op);
            }

            if right.is_empty() {
                return missing("right", op);
            }

            reference(object(place(right)), computed(value(left)), is_ref)
        },

        Tok::BelongingItOperator => {
            if left.is_empty() {
                return missing("left", op);
            }

            if let Some(&first) = right.first() {
                return adjacent(op, first);
            }

            reference(object(it()), computed(value(left)), is_ref)
        },

        Tok::Property => {
            if left.is_empty() {
                return missing("left", op);
            }

            if let Some(&first) = right.first() {
                return adjacent(op, first);
            }

            reference(object(place(left)), Property::Name(op.name.clone().unwrap_or_default()), is_ref)
        },

        Tok::ItsProperty | Tok::BelongingItProperty => {
            if let Some(&last) = left.last() {
                return adjacent(last, op);
            }

            if let Some(&first) = right.first() {
                return adjacent(op, first);
            }

            reference(object(it()), Property::Name(op.name.clone().unwrap_or_default()), is_ref)
        },

        Tok::PossessiveOperator => {
            if left.is_empty() {
                return missing("left", op);
            }

            if right.is_empty() {
                return missing("right", op);
            }

            reference(object(place(left)), computed(value(right)), is_ref)
        },

        Tok::ItsOperator => {
            if let Some(&last) = left.last() {
                return adjacent(last, op);
            }

            if right.is_empty() {
                return missing("right", op);
            }

            reference(object(it()), computed(value(right)), is_ref)
        },

        _ => compile_leaf(op, is_ref),
    }
}

fn comparison_op(token: &Token) -> Option<Binop> {
    match token.kind {
        Tok::Is => Some(Binop::Is),
        Tok::IsNot => Some(Binop::IsNot),
        Tok::Contains => Some(Binop::Contains),
        Tok::IsIn => Some(Binop::IsIn),
        Tok::Inequality => token.operator,
        _ => None,
    }
}

fn comparison(lhs: Expr, op: &Token, rhs: Expr) -> Expr {
    let Some(binop) = comparison_op(op) else {
        return syntax(format!("`{}` isn't a comparison.", op.text.trim()));
    };

    let test = Expr::infix(lhs, binop, rhs);

    if op.negate {
        Expr::Not { rhs: Box::new(test) }
    } else {
        test
    }
}

/// The comparison whose left side `it` would hold after evaluating this side
/// of an `and`/`or`, if any.
fn elided_comparison<'t>(tokens: &[&'t Token]) -> Option<&'t Token> {
    let at = split_point(tokens)?;
    let token = tokens[at];

    if token.kind.is_comparison() {
        Some(token)
    } else if matches!(token.kind, Tok::And | Tok::Or) {
        elided_comparison(&tokens[..at])
    } else {
        None
    }
}

/// `and`/`or`. A bare value next to a comparison is compared against `it`
/// with the same operator, so `$a > 2 and 3` means `$a > 2 and it > 3`.
fn compile_logic(left: &[&Token], op: &Token, right: &[&Token]) -> Expr {
    if left.is_empty() {
        return missing("left", op);
    }

    if right.is_empty() {
        return missing("right", op);
    }

    let binop = if op.kind == Tok::And { Binop::And } else { Binop::Or };

    match (elided_comparison(left), elided_comparison(right)) {
        (Some(cmp), None) => {
            let elided = comparison(it(), cmp, compile_tokens(right, false));
            Expr::infix(compile_tokens(left, false), binop, elided)
        },

        // The comparison must run first so that `it` is set
        (None, Some(cmp)) => {
            let elided = comparison(it(), cmp, compile_tokens(left, false));
            Expr::infix(compile_tokens(right, false), binop, elided)
        },

        _ => Expr::infix(compile_tokens(left, false), binop, compile_tokens(right, false)),
    }
}

fn compile_lambda(left: &[&Token], op: &Token, right: &[&Token]) -> Expr {
    let subject = match left {
        [] => LambdaSubject::Implicit,
        [param] if param.kind == Tok::TempVariable => LambdaSubject::Param(param.name.clone().unwrap_or_default()),
        _ => LambdaSubject::Expr(Box::new(compile_tokens(left, false))),
    };

    let keyword = op.text.trim();

    let clause = match op.kind {
        Tok::Where | Tok::Via => {
            if right.is_empty() {
                return missing("right", op);
            }

            let body = Arc::new(compile_tokens(right, false));

            if op.kind == Tok::Where {
                Clause::Where(body)
            } else {
                Clause::Via(body)
            }
        },

        _ => match right {
            [var] if var.kind == Tok::TempVariable => {
                let name = var.name.clone().unwrap_or_default();

                if op.kind == Tok::With {
                    Clause::With(name)
                } else {
                    Clause::Making(name)
                }
            },

            _ => return syntax(format!("I need exactly one temp variable, like `_item`, after `{keyword}`.")),
        },
    };

    Expr::Lambda { subject, clause }
}

fn compile_macro(token: &Token) -> Expr {
    let tokens: Vec<&Token> = token.children.iter()
    .filter(|t| !t.is_whitespace())
    .collect();

    let Some((name, rest)) = tokens.split_first() else {
        return syntax("This macro call has no name.");
    };

    if name.kind != Tok::MacroName {
        return syntax(format!("`{}` isn't a macro name.", name.text.trim()));
    }

    let callee = if name.method_call {
        Callee::Computed(Box::new(compile(&name.children, false)))
    } else {
        Callee::Named(name.name.clone().unwrap_or_default())
    };

    let segments: Vec<&[&Token]> = rest.split(|t| t.kind == Tok::Comma).collect();
    let count = segments.len();
    let mut args = Vec::with_capacity(count);

    for (index, segment) in segments.into_iter().enumerate() {
        match segment {
            // No arguments at all, or a trailing comma
            [] if index + 1 == count => continue,

            [] => args.push(Arg::Value(syntax("This macro call has an empty value between two commas."))),

            [spread, value @ ..] if spread.kind == Tok::Spread => {
                if value.is_empty() {
                    args.push(Arg::Value(missing("right", spread)));
                } else {
                    args.push(Arg::Spread(compile_tokens(value, false)));
                }
            },

            _ => args.push(Arg::Value(compile_tokens(segment, false))),
        }
    }

    Expr::Macro { callee, args }
}

fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }

        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('\n') => (),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }

    out
}

#[cfg(test)]
mod test {
    use super::*;

    use pretty_assertions::assert_eq;

    use crate::lexer::{lex, lex_expression};

    fn code(src: &str) -> String {
        compile(&lex_expression(src).children, false).to_string()
    }

    fn is_syntax_error(src: &str) -> bool {
        matches!(
            compile(&lex_expression(src).children, false),
            Expr::Error { kind: ErrorKind::Syntax, .. }
        )
    }

    #[test]
    fn precedence() {
        assert_eq!(code("1 + 2 * 3"), "add(1, multiply(2, 3))");
        assert_eq!(code("(1 + 2) * 3"), "multiply((add(1, 2)), 3)");
        assert_eq!(code("1 - 2 - 3"), "subtract(subtract(1, 2), 3)");
        assert_eq!(code("1 + 2 is 3 and 4 > 1"), "and(is(add(1, 2), 3), gt(4, 1))");
    }

    #[test]
    fn signs() {
        assert_eq!(code("1 * -2"), "multiply(1, subtract(0, 2))");
        assert_eq!(code("-2 + 3"), "add(subtract(0, 2), 3)");
        assert_eq!(code("1 - -2"), "subtract(1, subtract(0, 2))");
    }

    #[test]
    fn property_chains() {
        assert_eq!(code("$a's b's c"), r#"ref(ref(ref($, "a"), "b"), "c").get()"#);
        assert_eq!(code("c of b of $a"), r#"ref(ref(ref($, "a"), "b"), "c").get()"#);
        assert_eq!(code("its length"), r#"ref(it, "length").get()"#);
        assert_eq!(code("$a's (1 + 1)"), r#"ref(ref($, "a"), (add(1, 1))).get()"#);
        assert_eq!(code("_t's 1st"), r#"ref(ref(_, "t"), "1st").get()"#);
    }

    #[test]
    fn implicit_it() {
        assert_eq!(code("< 5"), "lt(it, 5)");
        assert_eq!(code("is not 2"), "isNot(it, 2)");
        assert_eq!(code("$a does not contain 2"), r#"not(contains(ref($, "a").get(), 2))"#);
    }

    #[test]
    fn elided_comparisons() {
        assert_eq!(code("$a > 2 and 3"), r#"and(gt(ref($, "a").get(), 2), gt(it, 3))"#);
        assert_eq!(code("3 or $a is 4"), r#"or(is(ref($, "a").get(), 4), is(it, 3))"#);
        assert_eq!(code("$a is 1 or 2 or 3"), r#"or(or(is(ref($, "a").get(), 1), is(it, 2)), is(it, 3))"#);
        assert_eq!(code("$a > 2 and < 5"), r#"and(gt(ref($, "a").get(), 2), lt(it, 5))"#);
    }

    #[test]
    fn assignment() {
        assert_eq!(code("$a to 1"), r#"makeAssignmentRequest(ref($, "a"), 1, "to")"#);
        assert_eq!(code("1 into $a's b"), r#"makeAssignmentRequest(ref(ref($, "a"), "b"), 1, "into")"#);
        assert!(is_syntax_error("to 1"));
        assert!(is_syntax_error("$a into"));
    }

    #[test]
    fn lambdas() {
        assert_eq!(
            code("_x where _x > 2 via _x * 2"),
            r#"Lambda.create(Lambda.create(_x, "where", gt(ref(_, "x").get(), 2)), "via", multiply(ref(_, "x").get(), 2))"#,
        );
        assert_eq!(code("_x making _total"), r#"Lambda.create(_x, "making", "_total")"#);
        assert!(is_syntax_error("_x making 2"));
        assert!(is_syntax_error("_x with _a _b"));
    }

    #[test]
    fn macros() {
        let root = lex("(print: 1, ...$a)(a:)($f: 2,)");

        let compiled: Vec<String> = root.children.iter()
        .map(|t| compile(std::slice::from_ref(t), false).to_string())
        .collect();

        assert_eq!(compiled, vec![
            r#"Macros.run("print", [1, ...ref($, "a").get()])"#,
            r#"Macros.run("a", [])"#,
            r#"Macros.run(ref($, "f").get(), [2])"#,
        ]);
    }

    #[test]
    fn links_become_link_goto() {
        let root = lex("[[go->Hall]]");
        assert_eq!(compile(&root.children, false).to_string(), r#"Macros.run("link-goto", ["go", "Hall"])"#);
    }

    #[test]
    fn literals() {
        assert_eq!(code(r#""a\"b\n""#), r#""a\"b\n""#);
        assert_eq!(code("'single'"), r#""single""#);
        assert_eq!(code("2s"), "2000");
        assert_eq!(code("TRUE"), "true");
        assert_eq!(code("red"), r##"colour("#e61919")"##);
        assert_eq!(code("()"), "()");
    }

    #[test]
    fn malformed_code_is_a_value() {
        assert!(is_syntax_error("1 2"));
        assert!(is_syntax_error("1 +"));
        assert!(is_syntax_error("* 2"));
        assert!(is_syntax_error("1, 2"));
        assert!(is_syntax_error("$a's"));
        assert!(is_syntax_error("hello"));

        let root = lex("(print: 1 +)");
        let Expr::Macro { args, .. } = compile(&root.children, false) else {
            panic!("expected a macro call");
        };
        assert!(matches!(&args[0], Arg::Value(e) if e.is_error()));
    }
}
