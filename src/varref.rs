//! Assignable references: a base plus a chain of compiled property keys, such
//! as `$inv's 2nd's name`, which can be read, written and deleted through.

use std::iter;
use std::mem;

use crate::ast::AssignOp;
use crate::error::{fail, ScriptError};
use crate::eval::EvalContext;
use crate::ops;
use crate::value::{Key, Value};

#[derive(Clone, Debug, PartialEq)]
pub enum Base {
    /// Story variables.
    Variables,

    /// The innermost temp frame holding the name.
    TempVariables,

    /// A plain value. Readable, but nothing can be stored through it.
    Value(Value),
}

/// `object` followed by `path`, then `property`. Every key is already
/// compiled against the object it indexes, so positions are 0-based.
#[derive(Clone, Debug, PartialEq)]
pub struct Reference {
    pub object: Base,

    pub path: Vec<Key>,

    pub property: Key,
}

/// A deferred `set`/`put`, performed by whichever macro receives it.
#[derive(Clone, Debug, PartialEq)]
pub struct AssignmentRequest {
    pub dest: Reference,

    pub src: Value,

    pub operator: AssignOp,
}

impl Reference {
    /// Walk `chain` from `object`, compiling each key against the value it
    /// will index.
    pub fn create(ctx: &EvalContext, object: Base, chain: Vec<Key>) -> Result<Self, ScriptError> {
        let mut keys = chain.into_iter();

        let Some(first) = keys.next() else {
            fail!(Reference, "A reference needs at least one data name.");
        };

        let first = match &object {
            Base::Value(value) => ops::compile_property_index(value, first)?,
            Base::Variables | Base::TempVariables => first,
        };

        let mut reference = Reference {
            object,
            path: Vec::new(),
            property: first,
        };

        for key in keys {
            reference = reference.extend(ctx, key)?;
        }

        Ok(reference)
    }

    /// Append `key`, compiled against the value this reference currently
    /// resolves to.
    pub fn extend(mut self, ctx: &EvalContext, key: Key) -> Result<Self, ScriptError> {
        let current = self.resolve(ctx, self.path.len() + 1)?;
        let key = ops::compile_property_index(&current, key)?;

        self.path.push(mem::replace(&mut self.property, key));
        Ok(self)
    }

    /// Every key, outermost first.
    pub fn keys(&self) -> impl Iterator<Item=&Key> {
        self.path.iter().chain(iter::once(&self.property))
    }

    pub fn deepest_property(&self) -> &Key {
        &self.property
    }

    /// The value `property` is looked up in.
    pub fn deepest_object(&self, ctx: &EvalContext) -> Value {
        if !self.path.is_empty() {
            return self.resolve(ctx, self.path.len()).into();
        }

        match &self.object {
            Base::Variables => Value::Map(ctx.state.variables.clone()),
            Base::TempVariables => Value::Map(ctx.temp_frame(&self.property).cloned().unwrap_or_default()),
            Base::Value(value) => value.clone(),
        }
    }

    pub fn get(&self, ctx: &EvalContext) -> Value {
        self.resolve(ctx, self.path.len() + 1).into()
    }

    /// Value after following the first `depth` keys.
    fn resolve(&self, ctx: &EvalContext, depth: usize) -> Result<Value, ScriptError> {
        let mut keys = self.keys().take(depth);

        let Some(first) = keys.next() else {
            fail!(Reference, "A reference needs at least one data name.");
        };

        let mut value = match &self.object {
            Base::Variables => ctx.state.variables.get(first).cloned().unwrap_or_else(|| ctx.options.default_value.clone()),

            Base::TempVariables => match ctx.temp(first) {
                Some(value) => value.clone(),
                None if ctx.options.strict_temps => fail!(Reference, "There isn't a temp variable named _{first} in this place."),
                None => ctx.options.default_value.clone(),
            },

            Base::Value(value) => ops::get_compiled(value, first)?,
        };

        for key in keys {
            value = ops::get_compiled(&value, key)?;
        }

        Ok(value)
    }

    pub fn set(&self, ctx: &mut EvalContext, value: Value) -> Result<(), ScriptError> {
        let value = value.assign_value();

        match &value {
            Value::Error(err) => return Err((**err).clone()),
            Value::Ref(_) | Value::Assignment(_) => fail!(Type, "I can't store {} in a variable.", value.describe()),
            _ => (),
        }

        let Some((first, rest)) = self.path.split_first() else {
            return self.set_root(ctx, value);
        };

        let target = descend(self.root_mut(ctx, first)?, rest)?;
        ops::set_at(target, &self.property, value)
    }

    pub fn delete(&self, ctx: &mut EvalContext) -> Result<(), ScriptError> {
        let Some((first, rest)) = self.path.split_first() else {
            return self.delete_root(ctx);
        };

        let target = descend(self.root_mut(ctx, first)?, rest)?;
        ops::delete(target, &self.property)
    }

    fn set_root(&self, ctx: &mut EvalContext, value: Value) -> Result<(), ScriptError> {
        let name = &self.property;

        match &self.object {
            Base::Variables => {
                let variables = &mut ctx.state.variables;

                if variables.is_sealed() && !variables.contains_key(name) {
                    fail!(Operation, "There isn't a ${name} variable, and I can't make new ones here.");
                }

                variables.insert(name.clone(), value);
            },

            Base::TempVariables => match ctx.temp_mut(name) {
                Some(slot) => *slot = value,
                None => {
                    ctx.top_temps().insert(name.clone(), value);
                },
            },

            Base::Value(object) => fail!(Operation, "I can't store a new value in {}, because it isn't in a variable.", object.describe()),
        }

        Ok(())
    }

    fn delete_root(&self, ctx: &mut EvalContext) -> Result<(), ScriptError> {
        let name = &self.property;

        match &self.object {
            Base::Variables if ctx.state.variables.is_sealed() => fail!(Operation, "I can't delete the ${name} variable."),

            Base::Variables => {
                ctx.state.variables.remove(name);
            },

            Base::TempVariables => {
                if let Some(frame) = ctx.temp_frame_mut(name) {
                    frame.remove(name);
                }
            },

            Base::Value(object) => fail!(Operation, "I can't delete data from {}, because it isn't in a variable.", object.describe()),
        }

        Ok(())
    }

    fn root_mut<'c>(&self, ctx: &'c mut EvalContext, first: &Key) -> Result<&'c mut Value, ScriptError> {
        match &self.object {
            Base::Variables => match ctx.state.variables.get_mut(first) {
                Some(value) => Ok(value),
                None => fail!(Reference, "There isn't a ${first} variable with data in it."),
            },

            Base::TempVariables => match ctx.temp_mut(first) {
                Some(value) => Ok(value),
                None => fail!(Reference, "There isn't a temp variable named _{first} in this place."),
            },

            Base::Value(object) => fail!(Operation, "I can't change the data in {}, because it isn't in a variable.", object.describe()),
        }
    }
}

fn descend<'v>(mut value: &'v mut Value, keys: &[Key]) -> Result<&'v mut Value, ScriptError> {
    for key in keys {
        value = child_mut(value, key)?;
    }

    Ok(value)
}

fn child_mut<'v>(value: &'v mut Value, key: &Key) -> Result<&'v mut Value, ScriptError> {
    match (value, key) {
        (Value::Array(items), &Key::Number(n)) => {
            let len = items.len();
            match ops::resolve_index(n, len) {
                Some(i) if i < len => Ok(&mut items[i]),
                _ => fail!(Range, "This array has only {len} values, so I can't change anything inside position {}.", n + 1.0),
            }
        },

        (Value::Map(map), key) => match map.get_mut(key) {
            Some(value) => Ok(value),
            None => fail!(Reference, "I can't find a '{key}' data name in this datamap."),
        },

        (other, _) => fail!(Operation, "I can't change the data inside {}.", other.describe()),
    }
}

impl AssignmentRequest {
    /// Store `src` into `dest`, combining it with the current value first for
    /// augmented operators.
    pub fn perform(&self, ctx: &mut EvalContext) -> Result<(), ScriptError> {
        let value = match self.operator {
            AssignOp::To | AssignOp::Into => self.src.clone(),

            AssignOp::Augmented(op) => {
                let current = self.dest.get(ctx);
                ops::binary(ctx, op, current, self.src.clone())
            },
        };

        self.dest.set(ctx, value)
    }
}
