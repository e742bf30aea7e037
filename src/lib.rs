pub mod patterns;
pub mod token;
pub mod lexer;
pub mod ast;
pub mod compile;
pub mod disas;

pub mod error;
pub mod value;
pub mod ops;
pub mod varref;
pub mod lambda;
pub mod eval;

use anyhow::Result;

/// Lex and compile a bare expression, such as the inside of a macro call.
pub fn compile_expression(src: &str) -> ast::Expr {
    compile::compile(&lexer::lex_expression(src).children, false)
}

/// Evaluate a bare expression, surfacing an error value as `Err`.
pub fn evaluate(src: &str, state: &mut eval::State, host: &dyn eval::Host) -> Result<value::Value> {
    let expr = compile_expression(src);
    eval::EvalContext::new(state, host).eval(&expr).into_result()
}

#[test]
fn markup_to_values() {
    use eval::dsl::TestHost;
    use eval::{EvalContext, State};
    use token::Tok;
    use value::Value;

    let source = "''Hi'' (set: $gold to 5)[spent (print: $gold - 2)] (print: $gold > 4)";
    let root = lexer::lex(source);

    let mut state = State::new();
    let mut printed = Vec::new();

    let mut stack = vec![&root];
    while let Some(token) = stack.pop() {
        if token.kind == Tok::Macro {
            let expr = compile::compile(std::slice::from_ref(token), false);
            printed.push(EvalContext::new(&mut state, &TestHost).eval(&expr));
        } else {
            stack.extend(token.children.iter().rev());
        }
    }

    assert_eq!(printed, vec![Value::from(""), Value::from(3), Value::Boolean(true)]);
}

#[test]
fn evaluate_lifts_errors() {
    let mut state = eval::State::new();
    let host = eval::NullHost;

    assert_eq!(evaluate("2 * 21", &mut state, &host).unwrap(), value::Value::from(42));

    let err = evaluate("1 / 0", &mut state, &host).unwrap_err();
    assert_eq!(err.to_string(), "range error: I can't divide 1 by zero.");
}
