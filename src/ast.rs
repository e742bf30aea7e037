use std::sync::Arc;

use crate::error::ErrorKind;

/// Compiled expression. Produced from a token list by `compile`, consumed by
/// `eval`, and printable as API-call code via `Display`.
#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    /// Nothing at all, as inside `()`.
    Empty,

    Number {
        value: f64,
    },

    String {
        value: String,
    },

    Boolean {
        value: bool,
    },

    Colour {
        value: String,
    },

    Identifier {
        name: Ident,
    },

    HookRef {
        name: String,
    },

    /// A variable or property reference, not yet read.
    Ref {
        object: RefObject,
        property: Property,
    },

    /// Read the value behind a reference.
    Get {
        reference: Box<Self>,
    },

    Infix {
        lhs: Box<Self>,
        op: Binop,
        rhs: Box<Self>,
    },

    Not {
        rhs: Box<Self>,
    },

    Group {
        value: Box<Self>,
    },

    Assign {
        dest: Box<Self>,
        src: Box<Self>,
        op: AssignOp,
    },

    Lambda {
        subject: LambdaSubject,
        clause: Clause,
    },

    Macro {
        callee: Callee,
        args: Vec<Arg>,
    },

    /// Compile-time failure, raised as an error value when evaluated.
    Error {
        kind: ErrorKind,
        message: String,
    },
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Ident {
    It,
    Time,
}

/// What a property chain starts from.
#[derive(Clone, Debug, PartialEq)]
pub enum RefObject {
    /// Story variables, `$name`.
    Variables,

    /// Temp variables, `_name`.
    TempVariables,

    Expr(Box<Expr>),
}

#[derive(Clone, Debug, PartialEq)]
pub enum Property {
    Name(String),

    /// Computed at run time, as in `$a's (1 + 1)`.
    Computed(Box<Expr>),
}

#[derive(Clone, Debug, PartialEq)]
pub enum Callee {
    Named(String),

    /// `($var: ...)`, calling whatever `$var` holds.
    Computed(Box<Expr>),
}

#[derive(Clone, Debug, PartialEq)]
pub enum Arg {
    Value(Expr),

    /// `...expr`, expanded into separate arguments.
    Spread(Expr),
}

#[derive(Clone, Debug, PartialEq)]
pub enum LambdaSubject {
    /// No loop variable; the loop value is only reachable as `it`.
    Implicit,

    /// A bare temp variable naming the loop parameter.
    Param(String),

    /// Another lambda, which this clause extends.
    Expr(Box<Expr>),
}

/// One lambda clause. Bodies are shared with every copy of the lambda.
#[derive(Clone, Debug, PartialEq)]
pub enum Clause {
    Where(Arc<Expr>),
    Via(Arc<Expr>),
    With(String),
    Making(String),
}

#[derive(Copy, Clone, Debug, Eq, Hash, PartialEq)]
pub enum Binop {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Lt,
    Lte,
    Gt,
    Gte,
    Is,
    IsNot,
    Contains,
    IsIn,
    And,
    Or,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum AssignOp {
    /// `put x into $a`
    Into,

    /// `set $a to x`
    To,

    /// `set $a += x`
    Augmented(Binop),
}

impl Binop {
    /// Name of the runtime operation this operator calls.
    pub fn name(self) -> &'static str {
        match self {
            Binop::Add => "add",
            Binop::Sub => "subtract",
            Binop::Mul => "multiply",
            Binop::Div => "divide",
            Binop::Mod => "modulo",
            Binop::Lt => "lt",
            Binop::Lte => "lte",
            Binop::Gt => "gt",
            Binop::Gte => "gte",
            Binop::Is => "is",
            Binop::IsNot => "isNot",
            Binop::Contains => "contains",
            Binop::IsIn => "isIn",
            Binop::And => "and",
            Binop::Or => "or",
        }
    }

    /// Whether the operator compares its operands, setting `it`.
    pub fn is_comparison(self) -> bool {
        matches!(self,
            Binop::Lt | Binop::Lte | Binop::Gt | Binop::Gte
            | Binop::Is | Binop::IsNot | Binop::Contains | Binop::IsIn
        )
    }
}

impl AssignOp {
    pub fn name(self) -> &'static str {
        match self {
            AssignOp::Into => "into",
            AssignOp::To => "to",
            AssignOp::Augmented(op) => op.name(),
        }
    }
}

impl Expr {
    pub fn error(kind: ErrorKind, message: impl Into<String>) -> Self {
        Expr::Error {
            kind,
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Expr::Error { .. })
    }

    /// Wrap a reference so that evaluating it reads the referenced value.
    pub fn get(reference: Expr) -> Self {
        Expr::Get {
            reference: Box::new(reference),
        }
    }

    pub fn infix(lhs: Expr, op: Binop, rhs: Expr) -> Self {
        Expr::Infix {
            lhs: Box::new(lhs),
            op,
            rhs: Box::new(rhs),
        }
    }

    /// First compile error anywhere in this expression, if any.
    pub fn first_error(&self) -> Option<&Expr> {
        match self {
            Expr::Error { .. } => Some(self),

            Expr::Ref { object, property } => {
                let object = match object {
                    RefObject::Expr(expr) => expr.first_error(),
                    _ => None,
                };

                let property = match property {
                    Property::Computed(expr) => expr.first_error(),
                    Property::Name(_) => None,
                };

                object.or(property)
            },

            Expr::Get { reference: value } | Expr::Not { rhs: value } | Expr::Group { value } => value.first_error(),

            Expr::Infix { lhs, rhs, .. } => lhs.first_error().or_else(|| rhs.first_error()),

            Expr::Assign { dest, src, .. } => dest.first_error().or_else(|| src.first_error()),

            Expr::Lambda { subject, clause } => {
                let subject = match subject {
                    LambdaSubject::Expr(expr) => expr.first_error(),
                    LambdaSubject::Implicit | LambdaSubject::Param(_) => None,
                };

                subject.or_else(|| match clause {
                    Clause::Where(body) | Clause::Via(body) => body.first_error(),
                    _ => None,
                })
            },

            Expr::Macro { callee, args } => {
                let callee = match callee {
                    Callee::Computed(expr) => expr.first_error(),
                    Callee::Named(_) => None,
                };

                callee.or_else(|| args.iter().find_map(|arg| match arg {
                    Arg::Value(expr) | Arg::Spread(expr) => expr.first_error(),
                }))
            },

            _ => None,
        }
    }
}

#[test]
fn finds_nested_errors() {
    let bad = Expr::error(ErrorKind::Syntax, "oops");
    let expr = Expr::Macro {
        callee: Callee::Named("print".into()),
        args: vec![Arg::Value(Expr::infix(Expr::Number { value: 1.0 }, Binop::Add, bad.clone()))],
    };

    assert_eq!(expr.first_error(), Some(&bad));
    assert_eq!(Expr::Number { value: 1.0 }.first_error(), None);
}
