use std::sync::Arc;

use crate::ast::{Clause, Expr};
use crate::error::{fail, ErrorKind, ScriptError};
use crate::eval::EvalContext;
use crate::value::{DataMap, Key, Value};

/// A user-written function, built one clause at a time:
/// `_item making _total via _total + _item`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Lambda {
    /// Temp variable bound to each value the lambda is applied to.
    pub loop_var: Option<String>,

    pub with: Option<String>,

    pub making: Option<String>,

    pub where_clause: Option<Arc<Expr>>,

    pub via: Option<Arc<Expr>>,
}

/// What a clause is attached to.
#[derive(Clone, Debug, PartialEq)]
pub enum Subject {
    /// No loop variable at all, as in `where it > 2`.
    Implicit,

    Param(String),

    /// An already evaluated subject, which must be a lambda.
    Value(Value),
}

/// Values bound when a lambda runs. Unset fields bind nothing.
#[derive(Clone, Debug, Default)]
pub struct LambdaArgs {
    pub loop_value: Option<Value>,

    pub with: Option<Value>,

    pub making: Option<Value>,

    /// Result when the `where` clause rejects the loop value.
    pub fail: Option<Value>,

    /// Result when there is no `via` clause.
    pub pass: Option<Value>,
}

/// Add `clause` to `subject`, producing a new lambda value.
pub fn create(subject: Subject, clause: Clause) -> Value {
    let mut lambda = match subject {
        Subject::Implicit => Lambda::default(),

        Subject::Param(name) => Lambda {
            loop_var: Some(name),
            ..Lambda::default()
        },

        Subject::Value(Value::Lambda(lambda)) => *lambda,

        Subject::Value(err @ Value::Error(_)) => return err,

        Subject::Value(other) => return Value::error(
            ErrorKind::Syntax,
            format!("A lambda needs a temp variable like _item before its clauses, not {}.", other.describe()),
        ),
    };

    match lambda.add_clause(clause).and_then(|()| lambda.check_names()) {
        Ok(()) => Value::Lambda(Box::new(lambda)),
        Err(err) => err.into(),
    }
}

impl Lambda {
    fn add_clause(&mut self, clause: Clause) -> Result<(), ScriptError> {
        match clause {
            Clause::Where(body) => fill("where", &mut self.where_clause, body),
            Clause::Via(body) => fill("via", &mut self.via, body),
            Clause::With(name) => fill("with", &mut self.with, name),
            Clause::Making(name) => fill("making", &mut self.making, name),
        }
    }

    /// Temp variable names bound by this lambda must all differ, ignoring
    /// case, `-` and `_`.
    fn check_names(&self) -> Result<(), ScriptError> {
        let names: Vec<&String> = [&self.loop_var, &self.with, &self.making].into_iter().flatten().collect();

        for (i, name) in names.iter().enumerate() {
            if names[..i].iter().any(|other| insensitive_name(other) == insensitive_name(name)) {
                fail!(Syntax, "This lambda has two variables named '_{name}'.");
            }
        }

        Ok(())
    }

    /// Run the lambda for one loop value. Its temp variables live in a fresh
    /// frame, and `it` is the loop value, until it returns.
    pub fn apply(&self, ctx: &mut EvalContext, args: LambdaArgs) -> Value {
        let mut frame = DataMap::new();

        for (name, value) in [(&self.loop_var, &args.loop_value), (&self.with, &args.with), (&self.making, &args.making)] {
            if let (Some(name), Some(value)) = (name, value) {
                frame.insert(Key::from(name.as_str()), value.clone());
            }
        }

        let saved = match &args.loop_value {
            Some(value) => std::mem::replace(&mut ctx.it, value.clone()),
            None => ctx.it.clone(),
        };

        ctx.push_temps(frame);
        let result = self.run(ctx, args);
        ctx.pop_temps();

        ctx.it = saved;
        result
    }

    fn run(&self, ctx: &mut EvalContext, args: LambdaArgs) -> Value {
        if let Some(test) = &self.where_clause {
            match ctx.eval(test) {
                Value::Boolean(true) => (),
                Value::Boolean(false) => return args.fail.unwrap_or(Value::Boolean(false)),
                err @ Value::Error(_) => return err,
                other => return Value::error(
                    ErrorKind::Type,
                    format!("A lambda's 'where' clause must be true or false, not {}.", other.describe()),
                ),
            }
        }

        match &self.via {
            Some(body) => ctx.eval(body),
            None => args.pass.or(args.loop_value).unwrap_or(Value::Boolean(true)),
        }
    }
}

fn fill<T>(clause: &str, slot: &mut Option<T>, value: T) -> Result<(), ScriptError> {
    if slot.is_some() {
        fail!(Syntax, "This lambda has two '{clause}' clauses.");
    }

    *slot = Some(value);
    Ok(())
}

/// Name with case, `-` and `_` ignored.
fn insensitive_name(name: &str) -> String {
    name.chars().filter(|c| !matches!(c, '-' | '_')).flat_map(char::to_lowercase).collect()
}

#[cfg(test)]
mod test {
    use super::*;

    use pretty_assertions::assert_eq;

    use crate::eval::dsl::{error_kind, eval, TestHost};
    use crate::eval::State;

    fn lambda(src: &str) -> Lambda {
        match eval(src) {
            Value::Lambda(lambda) => *lambda,
            other => panic!("{src} gave {other:?}"),
        }
    }

    fn looping(n: i32) -> LambdaArgs {
        LambdaArgs {
            loop_value: Some(n.into()),
            ..LambdaArgs::default()
        }
    }

    #[test]
    fn clauses_accumulate() {
        let l = lambda("_x where _x > 2 via _x * 2");
        assert_eq!(l.loop_var.as_deref(), Some("x"));
        assert!(l.where_clause.is_some());
        assert!(l.via.is_some());

        let l = lambda("_item making _total via _total + _item");
        assert_eq!(l.making.as_deref(), Some("total"));
    }

    #[test]
    fn duplicate_clauses_and_names() {
        assert_eq!(error_kind(&eval("_x where true where false")), Some(ErrorKind::Syntax));
        assert_eq!(error_kind(&eval("_x making _X")), Some(ErrorKind::Syntax));
        assert_eq!(error_kind(&eval("_x with _y making _z")), None);
    }

    #[test]
    fn insensitive_names() {
        assert_eq!(insensitive_name("Total_Sum"), "totalsum");
        assert_eq!(insensitive_name("a-b"), insensitive_name("AB"));
    }

    #[test]
    fn apply_binds_and_restores() {
        let mut state = State::default();
        let host = TestHost;
        let mut ctx = EvalContext::new(&mut state, &host);
        ctx.it = Value::from("before");

        let doubled = lambda("_x where _x > 2 via _x * 2");

        assert_eq!(doubled.apply(&mut ctx, looping(3)), Value::from(6));
        assert_eq!(doubled.apply(&mut ctx, looping(1)), Value::Boolean(false));
        assert_eq!(ctx.it, Value::from("before"));
        assert_eq!(ctx.temp(&Key::from("x")), None);

        let folded = lambda("_item making _total via _total + _item");
        let sum = folded.apply(&mut ctx, LambdaArgs {
            loop_value: Some(2.into()),
            making: Some(40.into()),
            ..LambdaArgs::default()
        });
        assert_eq!(sum, Value::from(42));
    }

    #[test]
    fn implicit_subject_uses_it() {
        let mut state = State::default();
        let host = TestHost;
        let mut ctx = EvalContext::new(&mut state, &host);

        let filter = lambda("where it > 2");
        let keep = |n| LambdaArgs {
            fail: Some("dropped".into()),
            ..looping(n)
        };

        assert_eq!(filter.apply(&mut ctx, keep(5)), Value::from(5));
        assert_eq!(filter.apply(&mut ctx, keep(1)), Value::from("dropped"));
    }

    #[test]
    fn where_must_be_boolean() {
        let mut state = State::default();
        let host = TestHost;
        let mut ctx = EvalContext::new(&mut state, &host);

        let bad = lambda("_x where _x + 1");
        let result = bad.apply(&mut ctx, looping(1));
        assert_eq!(error_kind(&result), Some(ErrorKind::Type));
    }
}
