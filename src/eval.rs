//! Evaluation module. Walks compiled expressions, producing runtime values,
//! and defines the state an evaluation runs against.
//!
//! Macro calls are dispatched to a `Host`, which owns the macro library and
//! hook selection. Everything else (operators, references, lambdas) is handled
//! here and in `ops`.

use std::fmt;
use std::iter;

use log::{trace, warn};

use crate::ast::{Arg, Callee, Expr, Ident, LambdaSubject, Property, RefObject};
use crate::disas::to_source;
use crate::error::{ErrorKind, ScriptError};
use crate::lambda::{self, Subject};
use crate::ops;
use crate::value::{Colour, DataMap, HookSet, Key, Value};
use crate::varref::{Base, Reference};

/// Story variables, which outlive any single evaluation.
#[derive(Clone, Debug, Default)]
pub struct State {
    pub variables: DataMap,
}

/// Evaluation settings.
#[derive(Clone, Debug)]
pub struct Options {
    /// What an unset story variable reads as.
    pub default_value: Value,

    /// Whether reading a temp variable that was never set is an error, rather
    /// than reading `default_value`.
    pub strict_temps: bool,
}

/// The macro to run for a call.
#[derive(Clone, Debug, PartialEq)]
pub enum MacroTarget {
    /// `(name: ...)`
    Name(String),

    /// `($value: ...)`, a method call on whatever the callee evaluated to.
    Value(Value),
}

/// Services an evaluation needs from whatever embeds it.
pub trait Host {
    /// Run a macro. Error arguments are passed through as-is; the macro
    /// decides whether to propagate them.
    fn run_macro(&self, target: &MacroTarget, args: Vec<Value>, ctx: &mut EvalContext) -> Value;

    /// Select the hooks named by `?name`.
    fn select_hook(&self, name: &str) -> Value {
        Value::HookSet(HookSet::named(name))
    }

    /// Milliseconds since the current section started, read by `time`.
    fn elapsed(&self) -> f64 {
        0.0
    }
}

/// A host with no macros at all.
#[derive(Copy, Clone, Debug, Default)]
pub struct NullHost;

/// Temporary context for expression evaluation
pub struct EvalContext<'a> {
    pub state: &'a mut State,

    pub host: &'a dyn Host,

    pub options: Options,

    /// The last comparison's left operand, or the destination of the current
    /// assignment.
    pub it: Value,

    /// Outermost temp variables, for the whole evaluation.
    base_temps: DataMap,

    /// Frames pushed by lambdas, innermost last.
    temps: Vec<DataMap>,
}

/// Where a reference's chain starts, while it is being built.
enum Parent {
    Base(Base),
    Ref(Reference),
}

impl State {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_values<K: Into<Key>>(values: impl IntoIterator<Item=(K, Value)>) -> Self {
        Self {
            variables: values.into_iter().map(|(name, value)| (name.into(), value)).collect(),
        }
    }
}

impl Default for Options {
    fn default() -> Self {
        Self {
            default_value: Value::Number(0.0),
            strict_temps: true,
        }
    }
}

impl Host for NullHost {
    fn run_macro(&self, target: &MacroTarget, _args: Vec<Value>, _ctx: &mut EvalContext) -> Value {
        Value::error(ErrorKind::Reference, format!("There isn't a {target} macro."))
    }
}

impl<'a> EvalContext<'a> {
    pub fn new(state: &'a mut State, host: &'a dyn Host) -> Self {
        Self {
            state,
            host,
            options: Options::default(),
            it: Value::Number(0.0),
            base_temps: DataMap::new(),
            temps: Vec::new(),
        }
    }

    pub fn with_options(mut self, options: Options) -> Self {
        self.options = options;
        self
    }

    pub fn push_temps(&mut self, frame: DataMap) {
        self.temps.push(frame);
    }

    pub fn pop_temps(&mut self) -> Option<DataMap> {
        let frame = self.temps.pop();

        if frame.is_none() {
            warn!("Tried to pop a temp variable frame, but only the outermost one is left");
        }

        frame
    }

    fn frames(&self) -> impl DoubleEndedIterator<Item=&DataMap> {
        iter::once(&self.base_temps).chain(self.temps.iter())
    }

    fn frames_mut(&mut self) -> impl DoubleEndedIterator<Item=&mut DataMap> {
        iter::once(&mut self.base_temps).chain(self.temps.iter_mut())
    }

    /// Innermost visible binding of a temp variable.
    pub fn temp(&self, name: &Key) -> Option<&Value> {
        self.frames().rev().find_map(|frame| frame.get(name))
    }

    pub(crate) fn temp_mut(&mut self, name: &Key) -> Option<&mut Value> {
        self.frames_mut().rev().find_map(|frame| frame.get_mut(name))
    }

    pub(crate) fn temp_frame(&self, name: &Key) -> Option<&DataMap> {
        self.frames().rev().find(|frame| frame.contains_key(name))
    }

    pub(crate) fn temp_frame_mut(&mut self, name: &Key) -> Option<&mut DataMap> {
        self.frames_mut().rev().find(|frame| frame.contains_key(name))
    }

    /// Frame that new temp variables go into.
    pub(crate) fn top_temps(&mut self) -> &mut DataMap {
        self.temps.last_mut().unwrap_or(&mut self.base_temps)
    }

    pub fn eval(&mut self, expr: &Expr) -> Value {
        match expr {
            Expr::Empty => Value::error(ErrorKind::Syntax, "There's nothing here to evaluate."),

            &Expr::Number { value } => Value::Number(value),

            Expr::String { value } => Value::String(value.clone()),

            &Expr::Boolean { value } => Value::Boolean(value),

            Expr::Colour { value } => match Colour::from_hex(value) {
                Some(colour) => Value::Colour(colour),
                None => Value::error(ErrorKind::Syntax, format!("{value} isn't a valid colour.")),
            },

            Expr::Identifier { name: Ident::It } => self.it.clone(),

            Expr::Identifier { name: Ident::Time } => Value::Number(self.host.elapsed()),

            Expr::HookRef { name } => self.host.select_hook(name),

            Expr::Ref { object, property } => match self.parent(object) {
                Ok(Parent::Base(base)) => match self.key(property) {
                    Ok(key) => ops::make_var_ref(self, base, vec![key]),
                    Err(err) => err.into(),
                },

                Ok(Parent::Ref(reference)) => match self.key(property).and_then(|key| reference.extend(self, key)) {
                    Ok(reference) => ops::remember(self, reference),
                    Err(err) => err.into(),
                },

                Err(err) => err.into(),
            },

            Expr::Get { reference } => match reference.as_ref() {
                Expr::Ref { object, property } => match self.reference(object, property) {
                    Ok(reference) => reference.get(self),
                    Err(err) => err.into(),
                },

                other => match self.eval(other) {
                    Value::Ref(reference) => reference.get(self),
                    value => value,
                },
            },

            Expr::Infix { lhs, op, rhs } => {
                let lhs = self.eval(lhs);
                let rhs = self.eval(rhs);
                ops::binary(self, *op, lhs, rhs)
            },

            Expr::Not { rhs } => {
                let rhs = self.eval(rhs);
                ops::not(rhs)
            },

            Expr::Group { value } => self.eval(value),

            Expr::Assign { dest, src, op } => {
                // the destination is evaluated first, so `it` is its old value
                let dest = self.eval(dest);
                let src = self.eval(src);
                ops::make_assignment_request(dest, src, *op)
            },

            Expr::Lambda { subject, clause } => {
                let subject = match subject {
                    LambdaSubject::Implicit => Subject::Implicit,
                    LambdaSubject::Param(name) => Subject::Param(name.clone()),
                    LambdaSubject::Expr(expr) => Subject::Value(self.eval(expr)),
                };

                lambda::create(subject, clause.clone())
            },

            Expr::Macro { callee, args } => self.call(callee, args),

            Expr::Error { kind, message } => Value::error(*kind, message.clone()),
        }
    }

    fn call(&mut self, callee: &Callee, args: &[Arg]) -> Value {
        let saved = self.it.clone();

        let target = match callee {
            Callee::Named(name) => MacroTarget::Name(name.clone()),

            Callee::Computed(expr) => match self.eval(expr) {
                err @ Value::Error(_) => {
                    self.it = saved;
                    return err;
                },

                value => MacroTarget::Value(value),
            },
        };

        let mut values = Vec::with_capacity(args.len());

        for arg in args {
            match arg {
                Arg::Value(expr) => values.push(self.eval(expr)),

                Arg::Spread(expr) => match self.eval(expr) {
                    Value::Array(items) => values.extend(items),
                    Value::Set(set) => values.extend(set),
                    Value::String(s) => values.extend(s.chars().map(|c| Value::String(c.to_string()))),
                    err @ Value::Error(_) => values.push(err),
                    other => values.push(Value::error(
                        ErrorKind::Type,
                        format!("I can't spread out {}, only arrays, datasets and strings.", other.describe()),
                    )),
                },
            }
        }

        trace!("Running {target} with {} argument(s)", values.len());

        let host = self.host;
        let result = host.run_macro(&target, values, self);

        self.it = saved;
        result
    }

    /// Start of a reference chain: a variable store, a reference produced by
    /// an inner expression, or a plain value.
    fn parent(&mut self, object: &RefObject) -> Result<Parent, ScriptError> {
        Ok(match object {
            RefObject::Variables => Parent::Base(Base::Variables),

            RefObject::TempVariables => Parent::Base(Base::TempVariables),

            RefObject::Expr(inner) => match inner.as_ref() {
                Expr::Ref { object, property } => Parent::Ref(self.reference(object, property)?),

                other => match self.eval(other) {
                    Value::Ref(reference) => Parent::Ref(*reference),
                    Value::Error(err) => return Err(*err),
                    value => Parent::Base(Base::Value(value)),
                },
            },
        })
    }

    fn key(&mut self, property: &Property) -> Result<Key, ScriptError> {
        match property {
            Property::Name(name) => Ok(Key::from(name.as_str())),
            Property::Computed(expr) => Key::try_from(self.eval(expr)),
        }
    }

    /// Build a reference without recording it as `it`.
    fn reference(&mut self, object: &RefObject, property: &Property) -> Result<Reference, ScriptError> {
        let parent = self.parent(object)?;
        let key = self.key(property)?;

        match parent {
            Parent::Base(base) => Reference::create(self, base, vec![key]),
            Parent::Ref(reference) => reference.extend(self, key),
        }
    }
}

impl fmt::Display for MacroTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MacroTarget::Name(name) => write!(f, "({name}:)"),
            MacroTarget::Value(value) => write!(f, "({}:)", to_source(value)),
        }
    }
}

#[cfg(test)]
pub mod dsl {
    use super::*;

    use crate::compile::compile;
    use crate::lambda::LambdaArgs;
    use crate::lexer::lex_expression;
    use crate::value::{Changer, DataSet};

    /// Host with a handful of collection, assignment and lambda macros.
    pub struct TestHost;

    impl Host for TestHost {
        fn run_macro(&self, target: &MacroTarget, args: Vec<Value>, ctx: &mut EvalContext) -> Value {
            if let Some(err) = args.iter().find(|v| v.is_error()) {
                return err.clone();
            }

            let MacroTarget::Name(name) = target else {
                return NullHost.run_macro(target, args, ctx);
            };

            match name.as_str() {
                "a" => Value::Array(args),

                "dm" => {
                    let mut map = DataMap::new();

                    for pair in args.chunks(2) {
                        let [name, value] = pair else {
                            return Value::error(ErrorKind::Type, "(dm:) needs a value after every name.");
                        };

                        match Key::try_from(name.clone()) {
                            Ok(key) => map.insert(key, value.clone()),
                            Err(err) => return err.into(),
                        };
                    }

                    Value::Map(map)
                },

                "ds" => Value::Set(args.into_iter().collect::<DataSet>()),

                "sealed" => match args.into_iter().next() {
                    Some(Value::Map(map)) => Value::Map(DataMap::sealed(map.iter().map(|(k, v)| (k.clone(), v.clone())))),
                    _ => Value::error(ErrorKind::Type, "(sealed:) needs a datamap."),
                },

                "set" | "put" => {
                    for arg in args {
                        let Value::Assignment(request) = arg else {
                            return Value::error(ErrorKind::Type, format!("({name}:) needs assignments, not {}.", arg.describe()));
                        };

                        if let Err(err) = request.perform(ctx) {
                            return err.into();
                        }
                    }

                    Value::String(String::new())
                },

                "print" => args.into_iter().next().unwrap_or_else(|| Value::String(String::new())),

                "bold" | "text-colour" => Value::Changer(Changer::new(name.as_str(), args)),

                "altered" => {
                    let mut args = args.into_iter();

                    let Some(Value::Lambda(lambda)) = args.next() else {
                        return Value::error(ErrorKind::Type, "(altered:) needs a lambda first.");
                    };

                    Value::Array(args.map(|value| lambda.apply(ctx, LambdaArgs {
                        loop_value: Some(value),
                        ..LambdaArgs::default()
                    })).collect())
                },

                _ => NullHost.run_macro(target, args, ctx),
            }
        }

        fn elapsed(&self) -> f64 {
            1500.0
        }
    }

    pub fn eval_in(state: &mut State, src: &str) -> Value {
        let expr = compile(&lex_expression(src).children, false);
        EvalContext::new(state, &TestHost).eval(&expr)
    }

    pub fn eval(src: &str) -> Value {
        eval_in(&mut State::default(), src)
    }

    pub fn error_kind(value: &Value) -> Option<ErrorKind> {
        match value {
            Value::Error(err) => Some(err.kind),
            _ => None,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use super::dsl::*;

    use crate::compile::compile;
    use crate::lexer::lex_expression;

    use pretty_assertions::assert_eq;

    #[test]
    fn literals_and_identifiers() {
        assert_eq!(eval("1 + 2 * 3"), Value::from(7));
        assert_eq!(eval("'a' + \"b\""), Value::from("ab"));
        assert_eq!(eval("2s"), Value::from(2000));
        assert_eq!(eval("red"), Value::Colour(Colour { r: 0xe6, g: 0x19, b: 0x19 }));
        assert_eq!(eval("time"), Value::from(1500));
        assert_eq!(eval("?door"), Value::HookSet(HookSet::named("door")));
        assert_eq!(error_kind(&eval("()")), Some(ErrorKind::Syntax));
    }

    #[test]
    fn unset_variables_read_as_zero() {
        assert_eq!(eval("$missing"), Value::from(0));
        assert_eq!(error_kind(&eval("_missing")), Some(ErrorKind::Reference));

        let mut state = State::new();
        let host = TestHost;
        let options = Options {
            default_value: Value::from(""),
            strict_temps: false,
        };

        let expr = compile(&lex_expression("_missing").children, false);
        let mut ctx = EvalContext::new(&mut state, &host).with_options(options);
        assert_eq!(ctx.eval(&expr), Value::from(""));
    }

    #[test]
    fn property_chains() {
        let mut state = State::new();
        eval_in(&mut state, "(set: $inv to (a: 'sword', (dm: 'name', 'gem')))");

        assert_eq!(eval_in(&mut state, "$inv's 1st"), Value::from("sword"));
        assert_eq!(eval_in(&mut state, "$inv's last's name"), Value::from("gem"));
        assert_eq!(eval_in(&mut state, "$inv's (1 + 1)'s name"), Value::from("gem"));
        assert_eq!(eval_in(&mut state, "$inv's length"), Value::from(2));

        eval_in(&mut state, "(set: $inv's 2nd's name to 'ruby')");
        assert_eq!(eval_in(&mut state, "$inv's 2nd's name"), Value::from("ruby"));
    }

    #[test]
    fn macros_save_it() {
        let mut state = State::new();
        let host = TestHost;
        let mut ctx = EvalContext::new(&mut state, &host);
        ctx.it = Value::from("before");

        let expr = compile(&lex_expression("(a: 5 > 1, it)").children, false);
        assert_eq!(ctx.eval(&expr), Value::Array(vec![true.into(), 5.into()]));
        assert_eq!(ctx.it, Value::from("before"));
    }

    #[test]
    fn spread_arguments() {
        assert_eq!(eval("(a: 1, ...(a: 2, 3), ...'ab')"), Value::Array(vec![
            1.into(), 2.into(), 3.into(), "a".into(), "b".into(),
        ]));
        assert_eq!(error_kind(&eval("(a: ...1)")), Some(ErrorKind::Type));
    }

    #[test]
    fn errors_pass_through_macros() {
        assert_eq!(error_kind(&eval("(a: 1 / 0)")), Some(ErrorKind::Range));
        assert_eq!(error_kind(&eval("(nonesuch: 1)")), Some(ErrorKind::Reference));
    }

    #[test]
    fn lambdas_run_through_macros() {
        assert_eq!(
            eval("(altered: _x via _x * 10, 1, 2)"),
            Value::Array(vec![10.into(), 20.into()]),
        );
    }

    #[test]
    fn sealed_maps() {
        let mut state = State::new();
        eval_in(&mut state, "(set: $m to (sealed: (dm: 'a', 1)))");
        assert_eq!(error_kind(&eval_in(&mut state, "(set: $m's b to 2)")), Some(ErrorKind::Operation));
        assert_eq!(error_kind(&eval_in(&mut state, "(set: $m's a to 2)")), None);
    }

    #[test]
    fn popping_the_base_frame_is_harmless() {
        let mut state = State::new();
        let host = NullHost;
        let mut ctx = EvalContext::new(&mut state, &host);

        assert!(ctx.pop_temps().is_none());
        ctx.top_temps().insert(Key::from("x"), 1.into());
        assert_eq!(ctx.temp(&Key::from("x")), Some(&Value::from(1)));
    }
}
