//! Debugging tool. Reads stdin as markup, then compiles and runs every macro
//! call in it, in order, against a small demonstration host.

use std::env::args;
use std::io::stdin;
use std::time::Instant;

use anyhow::{Context, Result};

use log::info;

use hookmark::compile::compile;
use hookmark::disas::to_source;
use hookmark::error::ErrorKind;
use hookmark::eval::{EvalContext, Host, MacroTarget, NullHost, State};
use hookmark::lexer::lex;
use hookmark::token::{Tok, Token};
use hookmark::value::{DataMap, DataSet, Key, Value};

struct DemoHost {
    started: Instant,
}

impl Host for DemoHost {
    fn run_macro(&self, target: &MacroTarget, args: Vec<Value>, ctx: &mut EvalContext) -> Value {
        if let Some(err) = args.iter().find(|v| v.is_error()) {
            return err.clone();
        }

        let MacroTarget::Name(name) = target else {
            return NullHost.run_macro(target, args, ctx);
        };

        match name.as_str() {
            "a" | "array" => Value::Array(args),

            "dm" | "datamap" => {
                let mut map = DataMap::new();

                for pair in args.chunks(2) {
                    let [key, value] = pair else {
                        return Value::error(ErrorKind::Type, "(dm:) needs a value after every name.");
                    };

                    match Key::try_from(key.clone()) {
                        Ok(key) => map.insert(key, value.clone()),
                        Err(err) => return err.into(),
                    };
                }

                Value::Map(map)
            },

            "ds" | "dataset" => Value::Set(args.into_iter().collect::<DataSet>()),

            "set" | "put" => {
                for arg in args {
                    let Value::Assignment(request) = arg else {
                        return NullHost.run_macro(target, vec![arg], ctx);
                    };

                    if let Err(err) = request.perform(ctx) {
                        return err.into();
                    }
                }

                Value::from("")
            },

            "print" => Value::from(args.iter().map(to_source).collect::<Vec<_>>().join(" ")),

            _ => NullHost.run_macro(target, args, ctx),
        }
    }

    fn elapsed(&self) -> f64 {
        self.started.elapsed().as_secs_f64() * 1000.0
    }
}

fn main() -> Result<()> {
    let verbosity: usize = match args().nth(1) {
        Some(arg) => arg.parse().context("Verbosity must be a number")?,
        None => 3,
    };

    stderrlog::new()
    .verbosity(verbosity)
    .init()?;

    let mut input = String::new();

    for line in stdin().lines() {
        let line = line?;
        input.push_str(&line);
        input.push('\n');
    }

    let root = lex(&input);

    let mut calls = Vec::new();
    collect_macros(&root, &mut calls);
    info!("Found {} macro call(s)", calls.len());

    let host = DemoHost { started: Instant::now() };
    let mut state = State::new();

    for call in calls {
        let expr = compile(std::slice::from_ref(call), false);
        let value = EvalContext::new(&mut state, &host).eval(&expr);

        println!("{}", call.text.trim());
        println!("  {expr}");
        println!("  => {}", to_source(&value));
    }

    println!("{}", to_source(&Value::Map(state.variables)));

    Ok(())
}

/// Outermost macro calls, in source order.
fn collect_macros<'t>(token: &'t Token, out: &mut Vec<&'t Token>) {
    if token.kind == Tok::Macro {
        out.push(token);
        return;
    }

    for child in &token.children {
        collect_macros(child, out);
    }
}
