//! Runtime operations behind every operator, property access and assignment.
//!
//! Each public operation takes already-evaluated operands and returns a
//! `Value`. Error operands short-circuit: the first one found among the
//! top-level operands is returned unchanged. Comparisons also record their
//! left operand as `it`, which is what lets `$a > 2 and < 5` work.

use crate::ast::{AssignOp, Binop};
use crate::error::{fail, ErrorKind, ScriptError};
use crate::eval::EvalContext;
use crate::value::{first_error, DataMap, DataSet, Key, Value};
use crate::varref::{AssignmentRequest, Base, Reference};

pub fn binary(ctx: &mut EvalContext, op: Binop, lhs: Value, rhs: Value) -> Value {
    match op {
        Binop::Add => add(lhs, rhs),
        Binop::Sub => sub(lhs, rhs),
        Binop::Mul => mul(lhs, rhs),
        Binop::Div => div(lhs, rhs),
        Binop::Mod => modulo(lhs, rhs),
        Binop::Lt => lt(ctx, lhs, rhs),
        Binop::Lte => lte(ctx, lhs, rhs),
        Binop::Gt => gt(ctx, lhs, rhs),
        Binop::Gte => gte(ctx, lhs, rhs),
        Binop::Is => is(ctx, lhs, rhs),
        Binop::IsNot => is_not(ctx, lhs, rhs),
        Binop::Contains => contains(ctx, lhs, rhs),
        Binop::IsIn => is_in(ctx, lhs, rhs),
        Binop::And => and(lhs, rhs),
        Binop::Or => or(lhs, rhs),
    }
}

// {{{ arithmetic

pub fn add(lhs: Value, rhs: Value) -> Value {
    if let Some(err) = first_error(&[&lhs, &rhs]) {
        return err;
    }

    add_values(lhs, rhs).into()
}

fn add_values(lhs: Value, rhs: Value) -> Result<Value, ScriptError> {
    same_type("+", &lhs, &rhs)?;

    Ok(match (lhs, rhs) {
        (Value::Number(a), Value::Number(b)) => Value::Number(a + b),

        (Value::Array(mut a), Value::Array(b)) => {
            a.extend(b);
            Value::Array(a)
        },

        (Value::Map(a), Value::Map(b)) => {
            // the sum is a fresh map, never sealed
            let mut sum: DataMap = a.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
            sum.merge(b);
            Value::Map(sum)
        },

        (Value::Set(a), Value::Set(b)) => Value::Set(a.into_iter().chain(b).collect()),

        (Value::Changer(a), Value::Changer(b)) => Value::Changer(a.compose(b)),

        (Value::Colour(a), Value::Colour(b)) => Value::Colour(a.blend(b)),

        (lhs, rhs) => match (lhs.coerce_to_string(), rhs.coerce_to_string()) {
            (Some(a), Some(b)) => Value::String(a + &b),
            _ => fail!(Type, "I can't use + on {}.", lhs.describe()),
        },
    })
}

pub fn sub(lhs: Value, rhs: Value) -> Value {
    if let Some(err) = first_error(&[&lhs, &rhs]) {
        return err;
    }

    sub_values(lhs, rhs).into()
}

fn sub_values(lhs: Value, rhs: Value) -> Result<Value, ScriptError> {
    same_type("-", &lhs, &rhs)?;

    Ok(match (lhs, rhs) {
        (Value::Number(a), Value::Number(b)) => Value::Number(a - b),

        (Value::Array(mut a), Value::Array(b)) => {
            a.retain(|x| !b.iter().any(|y| structural_eq(x, y)));
            Value::Array(a)
        },

        (Value::Set(a), Value::Set(b)) => Value::Set(a.into_iter().filter(|v| !b.contains(v)).collect::<DataSet>()),

        (lhs, rhs) => match (lhs.coerce_to_string(), rhs.coerce_to_string()) {
            (Some(a), Some(b)) if b.is_empty() => Value::String(a),
            (Some(a), Some(b)) => Value::String(a.replace(&b, "")),
            _ => fail!(Type, "I can't use - on {}.", lhs.describe()),
        },
    })
}

pub fn mul(lhs: Value, rhs: Value) -> Value {
    if let Some(err) = first_error(&[&lhs, &rhs]) {
        return err;
    }

    numbers("*", &lhs, &rhs).map(|(a, b)| Value::Number(a * b)).into()
}

pub fn div(lhs: Value, rhs: Value) -> Value {
    if let Some(err) = first_error(&[&lhs, &rhs]) {
        return err;
    }

    numbers("/", &lhs, &rhs).and_then(|(a, b)| {
        if b == 0.0 {
            fail!(Range, "I can't divide {a} by zero.");
        }

        Ok(Value::Number(a / b))
    }).into()
}

pub fn modulo(lhs: Value, rhs: Value) -> Value {
    if let Some(err) = first_error(&[&lhs, &rhs]) {
        return err;
    }

    numbers("%", &lhs, &rhs).and_then(|(a, b)| {
        if b == 0.0 {
            fail!(Range, "I can't modulo {a} by zero.");
        }

        Ok(Value::Number(a % b))
    }).into()
}

/// Operands of different kinds never mix, unless both can become strings.
fn same_type(op: &str, lhs: &Value, rhs: &Value) -> Result<(), ScriptError> {
    if lhs.same_kind(rhs) || (lhs.coerce_to_string().is_some() && rhs.coerce_to_string().is_some()) {
        return Ok(());
    }

    Err(ScriptError::new(
        ErrorKind::Type,
        format!("I can't use {op} on {} and {}, because they aren't the same type of data.", lhs.describe(), rhs.describe()),
    ).with_explanation("Use (str:) or (num:) to convert one of them first."))
}

fn numbers(op: &str, lhs: &Value, rhs: &Value) -> Result<(f64, f64), ScriptError> {
    match (lhs, rhs) {
        (&Value::Number(a), &Value::Number(b)) => Ok((a, b)),
        (Value::Number(_), other) | (other, _) => fail!(Type, "I can only use {op} on numbers, not {}.", other.describe()),
    }
}

// }}}

// {{{ comparison

pub fn lt(ctx: &mut EvalContext, lhs: Value, rhs: Value) -> Value {
    compare(ctx, "<", lhs, rhs, |a, b| a < b)
}

pub fn lte(ctx: &mut EvalContext, lhs: Value, rhs: Value) -> Value {
    compare(ctx, "<=", lhs, rhs, |a, b| a <= b)
}

pub fn gt(ctx: &mut EvalContext, lhs: Value, rhs: Value) -> Value {
    compare(ctx, ">", lhs, rhs, |a, b| a > b)
}

pub fn gte(ctx: &mut EvalContext, lhs: Value, rhs: Value) -> Value {
    compare(ctx, ">=", lhs, rhs, |a, b| a >= b)
}

fn compare(ctx: &mut EvalContext, op: &str, lhs: Value, rhs: Value, cmp: fn(f64, f64) -> bool) -> Value {
    if let Some(err) = first_error(&[&lhs, &rhs]) {
        return err;
    }

    let result = numbers(op, &lhs, &rhs).map(|(a, b)| Value::Boolean(cmp(a, b)));
    ctx.it = lhs;
    result.into()
}

pub fn is(ctx: &mut EvalContext, lhs: Value, rhs: Value) -> Value {
    if let Some(err) = first_error(&[&lhs, &rhs]) {
        return err;
    }

    let result = structural_eq(&lhs, &rhs);
    ctx.it = lhs;
    Value::Boolean(result)
}

pub fn is_not(ctx: &mut EvalContext, lhs: Value, rhs: Value) -> Value {
    match is(ctx, lhs, rhs) {
        Value::Boolean(b) => Value::Boolean(!b),
        other => other,
    }
}

/// `container contains item`
pub fn contains(ctx: &mut EvalContext, lhs: Value, rhs: Value) -> Value {
    if let Some(err) = first_error(&[&lhs, &rhs]) {
        return err;
    }

    let result = holds(&lhs, &rhs).map(Value::Boolean);
    ctx.it = lhs;
    result.into()
}

/// `item is in container`
pub fn is_in(ctx: &mut EvalContext, lhs: Value, rhs: Value) -> Value {
    if let Some(err) = first_error(&[&lhs, &rhs]) {
        return err;
    }

    let result = holds(&rhs, &lhs).map(Value::Boolean);
    ctx.it = lhs;
    result.into()
}

fn holds(container: &Value, item: &Value) -> Result<bool, ScriptError> {
    Ok(match container {
        Value::Array(items) => items.iter().any(|v| structural_eq(v, item)),

        Value::Set(set) => set.contains(item),

        Value::Map(map) => match Key::try_from(item.clone()) {
            Ok(key) => map.contains_key(&key),
            Err(_) => false,
        },

        other => match (other.coerce_to_string(), item.coerce_to_string()) {
            (Some(haystack), Some(needle)) => haystack.contains(&needle),
            (Some(_), None) => fail!(Type, "I can only look for strings inside {}, not {}.", other.describe(), item.describe()),
            (None, _) => structural_eq(other, item),
        },
    })
}

/// Deep equality. Numbers compare by value, collections by contents, and
/// datasets regardless of order.
pub fn structural_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x == y,
        (Value::String(x), Value::String(y)) => x == y,
        (Value::Boolean(x), Value::Boolean(y)) => x == y,

        (Value::Array(x), Value::Array(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(x, y)| structural_eq(x, y))
        },

        (Value::Map(x), Value::Map(y)) => {
            x.len() == y.len() && x.iter().all(|(k, v)| y.get(k).is_some_and(|w| structural_eq(v, w)))
        },

        (Value::Set(x), Value::Set(y)) => x.len() == y.len() && x.iter().all(|v| y.contains(v)),

        (Value::Colour(x), Value::Colour(y)) => x == y,

        (Value::Changer(x), Value::Changer(y)) => {
            x.calls.len() == y.calls.len()
            && x.calls.iter().zip(&y.calls).all(|(x, y)| {
                x.name == y.name
                && x.params.len() == y.params.len()
                && x.params.iter().zip(&y.params).all(|(x, y)| structural_eq(x, y))
            })
        },

        (Value::Lambda(x), Value::Lambda(y)) => x == y,
        (Value::HookSet(x), Value::HookSet(y)) => x.name == y.name,
        (Value::Error(x), Value::Error(y)) => x == y,
        _ => false,
    }
}

// }}}

// {{{ logic

pub fn and(lhs: Value, rhs: Value) -> Value {
    logic("and", lhs, rhs, |a, b| a && b)
}

pub fn or(lhs: Value, rhs: Value) -> Value {
    logic("or", lhs, rhs, |a, b| a || b)
}

fn logic(op: &str, lhs: Value, rhs: Value, join: fn(bool, bool) -> bool) -> Value {
    if let Some(err) = first_error(&[&lhs, &rhs]) {
        return err;
    }

    match (&lhs, &rhs) {
        (&Value::Boolean(a), &Value::Boolean(b)) => Value::Boolean(join(a, b)),
        (Value::Boolean(_), other) | (other, _) => Value::error(
            ErrorKind::Type,
            format!("I can only use '{op}' to join true or false, not {}.", other.describe()),
        ),
    }
}

pub fn not(value: Value) -> Value {
    match value {
        Value::Boolean(b) => Value::Boolean(!b),
        err @ Value::Error(_) => err,
        other => Value::error(
            ErrorKind::Type,
            format!("I can only use 'not' to invert true or false, not {}.", other.describe()),
        ),
    }
}

// }}}

// {{{ properties

/// Turn a property name as written into the key actually looked up on
/// `object`. Sequences take 1-based positions, `last`, ordinals such as `2nd`
/// and `3rdlast`, and `length`; these become 0-based indices, negative ones
/// counting from the end.
pub fn compile_property_index(object: &Value, key: Key) -> Result<Key, ScriptError> {
    if let Key::String(name) = &key {
        if name.starts_with("__") {
            fail!(Reference, "Only I can use data names beginning with '__'.");
        }
    }

    match object {
        Value::Error(err) => Err((**err).clone()),

        Value::Array(_) | Value::String(_) => sequence_index(object, key),

        Value::Map(_) => Ok(key),

        Value::Set(_) => match key {
            Key::String(name) if name == "length" => Ok(Key::String(name)),
            _ => fail!(Type, "You can only get the 'length' of a dataset, because its values have no position."),
        },

        Value::Colour(colour) => match key {
            Key::String(name) if colour.channel(&name).is_some() => Ok(Key::String(name)),
            other => fail!(Reference, "Colours only have 'r', 'g' and 'b' data names, not '{other}'."),
        },

        other => fail!(Type, "You can't get data values from {}.", other.describe()),
    }
}

fn sequence_index(object: &Value, key: Key) -> Result<Key, ScriptError> {
    let position = match key {
        Key::Number(n) => n,

        Key::String(name) => {
            let lower = name.to_ascii_lowercase();

            if lower == "length" {
                return Ok(Key::String(lower));
            }

            if lower == "last" {
                return Ok(Key::Number(-1.0));
            }

            let from_end = lower.strip_suffix("last").map(|s| s.trim_end_matches('-'));

            match ordinal(from_end.unwrap_or(&lower)) {
                Some(n) if n > 0.0 && from_end.is_some() => return Ok(Key::Number(-n)),
                Some(n) => n,
                None => fail!(
                    Range,
                    "You can only use positions ('4th', 'last', '2ndlast', (2), etc.) and 'length' with {}, not '{name}'.",
                    object.describe(),
                ),
            }
        },
    };

    if position.is_nan() || position.fract() != 0.0 {
        fail!(Range, "{position} isn't a whole number, so it can't be a position.");
    }

    if position == 0.0 {
        fail!(Range, "You can't use position 0 with {}, because positions start at 1.", object.describe());
    }

    Ok(Key::Number(if position > 0.0 { position - 1.0 } else { position }))
}

/// `1st`, `22nd`, `3rd`, `4th`. The suffix isn't checked against the number.
fn ordinal(name: &str) -> Option<f64> {
    let digits = ["st", "nd", "rd", "th"].iter().find_map(|suffix| name.strip_suffix(suffix))?;

    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    digits.parse().ok()
}

/// Position `n` (negative counts from the end) within a sequence of `len`.
/// The result may be out of bounds; callers check.
pub(crate) fn resolve_index(n: f64, len: usize) -> Option<usize> {
    if n.is_nan() || n.fract() != 0.0 {
        return None;
    }

    let at = if n < 0.0 { len as f64 + n } else { n };
    (at >= 0.0).then_some(at as usize)
}

/// Read the value behind a key already compiled for `object`.
pub(crate) fn get_compiled(object: &Value, key: &Key) -> Result<Value, ScriptError> {
    match (object, key) {
        (Value::Error(err), _) => Err((**err).clone()),

        (Value::Array(items), &Key::Number(n)) => match resolve_index(n, items.len()).and_then(|i| items.get(i)) {
            Some(item) => Ok(item.clone()),
            None => fail!(Range, "This array has only {} values, so there's nothing at position {}.", items.len(), display_position(n)),
        },

        (Value::String(s), &Key::Number(n)) => {
            let count = s.chars().count();
            match resolve_index(n, count).and_then(|i| s.chars().nth(i)) {
                Some(c) => Ok(Value::String(c.to_string())),
                None => fail!(Range, "This string has only {count} characters, so there's nothing at position {}.", display_position(n)),
            }
        },

        (Value::Array(items), Key::String(name)) if name == "length" => Ok(Value::Number(items.len() as f64)),
        (Value::String(s), Key::String(name)) if name == "length" => Ok(Value::Number(s.chars().count() as f64)),
        (Value::Set(set), Key::String(name)) if name == "length" => Ok(Value::Number(set.len() as f64)),

        (Value::Map(map), key) => match map.get(key) {
            Some(value) => Ok(value.clone()),
            None => fail!(Reference, "I can't find a '{key}' data name in this datamap."),
        },

        (Value::Colour(colour), Key::String(name)) => match colour.channel(name) {
            Some(channel) => Ok(Value::Number(channel.into())),
            None => fail!(Reference, "Colours only have 'r', 'g' and 'b' data names, not '{name}'."),
        },

        (other, key) => fail!(Type, "I can't get '{key}' from {}.", other.describe()),
    }
}

/// 1-based position as written in source, for messages.
fn display_position(n: f64) -> String {
    if n < 0.0 {
        format!("{}last", -n)
    } else {
        format!("{}", n + 1.0)
    }
}

/// `object's key`
pub fn get(object: &Value, key: &Key) -> Value {
    compile_property_index(object, key.clone()).and_then(|key| get_compiled(object, &key)).into()
}

/// Check that `key` of `object` may be written.
fn can_set(object: &Value, key: &Key) -> Result<(), ScriptError> {
    match object {
        Value::Array(_) | Value::String(_) => match key {
            Key::Number(_) => Ok(()),
            Key::String(name) if name == "length" => fail!(Operation, "I can't forcibly alter the length of {}.", object.describe()),
            Key::String(name) => fail!(
                Range,
                "You can only use positions ('4th', 'last', '2ndlast', (2), etc.) with {}, not '{name}'.",
                object.describe(),
            ),
        },

        Value::Map(map) if map.is_sealed() && !map.contains_key(key) => {
            fail!(Operation, "This datamap is sealed, so I can't add a '{key}' data name to it.")
        },

        Value::Map(_) => Ok(()),

        other => fail!(Operation, "I can't modify {}.", other.describe()),
    }
}

/// Write `value` under a compiled `key` of `object`. Writing one past the end
/// of a sequence appends.
pub(crate) fn set_at(object: &mut Value, key: &Key, value: Value) -> Result<(), ScriptError> {
    can_set(object, key)?;

    match (object, key) {
        (Value::Array(items), &Key::Number(n)) => {
            let len = items.len();
            match resolve_index(n, len) {
                Some(i) if i < len => items[i] = value,
                Some(i) if i == len => items.push(value),
                _ => fail!(Range, "This array has only {len} values, so I can't put anything at position {}.", display_position(n)),
            }
        },

        (Value::String(s), &Key::Number(n)) => {
            let replacement = match &value {
                Value::String(c) if c.chars().count() == 1 => c.clone(),
                other => fail!(Type, "I can only put a single character into a string, not {}.", other.describe()),
            };

            let mut chars: Vec<String> = s.chars().map(String::from).collect();
            let len = chars.len();
            match resolve_index(n, len) {
                Some(i) if i < len => chars[i] = replacement,
                Some(i) if i == len => chars.push(replacement),
                _ => fail!(Range, "This string has only {len} characters, so I can't put anything at position {}.", display_position(n)),
            }

            *s = chars.concat();
        },

        (Value::Map(map), key) => {
            map.insert(key.clone(), value);
        },

        (other, _) => fail!(Operation, "I can't modify {}.", other.describe()),
    }

    Ok(())
}

/// Remove a compiled `key` from `object`.
pub fn delete(object: &mut Value, key: &Key) -> Result<(), ScriptError> {
    match (object, key) {
        (Value::Array(items), &Key::Number(n)) => {
            let len = items.len();
            match resolve_index(n, len) {
                Some(i) if i < len => {
                    items.remove(i);
                    Ok(())
                },
                _ => fail!(Range, "This array has only {len} values, so there's nothing at position {} to delete.", display_position(n)),
            }
        },

        (Value::Map(map), _) if map.is_sealed() => fail!(Operation, "This datamap is sealed, so I can't delete its '{key}' data name."),

        (Value::Map(map), key) => {
            map.remove(key);
            Ok(())
        },

        (other, key) => fail!(Operation, "I can't delete '{key}' from {}.", other.describe()),
    }
}

// }}}

// {{{ references

/// Build a reference from `object` through each key of `chain`, and record the
/// value it currently refers to as `it`.
pub fn make_var_ref(ctx: &mut EvalContext, object: Base, chain: Vec<Key>) -> Value {
    match Reference::create(ctx, object, chain) {
        Ok(reference) => remember(ctx, reference),
        Err(err) => err.into(),
    }
}

/// Wrap a finished reference as a value, recording its current value as `it`
/// so that `set $a to it + 1` reads the old `$a`.
pub(crate) fn remember(ctx: &mut EvalContext, reference: Reference) -> Value {
    ctx.it = reference.get(ctx);
    Value::Ref(Box::new(reference))
}

pub fn make_assignment_request(dest: Value, src: Value, operator: AssignOp) -> Value {
    if let Some(err) = first_error(&[&dest, &src]) {
        return err;
    }

    match dest {
        Value::Ref(dest) => Value::Assignment(Box::new(AssignmentRequest {
            dest: *dest,
            src,
            operator,
        })),

        other => Value::error(
            ErrorKind::Operation,
            format!("I can't store a new value in {}, only in variables and their data names.", other.describe()),
        ),
    }
}

// }}}

#[cfg(test)]
mod test {
    use super::*;

    use pretty_assertions::assert_eq;

    use crate::eval::dsl::{error_kind, eval, eval_in, TestHost};
    use crate::eval::State;
    use crate::value::{Changer, Colour};

    fn array(items: &[f64]) -> Value {
        Value::Array(items.iter().map(|&n| Value::Number(n)).collect())
    }

    #[test]
    fn arithmetic() {
        assert_eq!(add(2.into(), 3.into()), Value::Number(5.0));
        assert_eq!(sub(2.into(), 3.into()), Value::Number(-1.0));
        assert_eq!(mul(2.into(), 3.into()), Value::Number(6.0));
        assert_eq!(div(3.into(), 2.into()), Value::Number(1.5));
        assert_eq!(modulo(7.into(), 3.into()), Value::Number(1.0));
        assert_eq!(error_kind(&div(1.into(), 0.into())), Some(ErrorKind::Range));
        assert_eq!(error_kind(&modulo(1.into(), 0.into())), Some(ErrorKind::Range));
    }

    #[test]
    fn no_implicit_coercion() {
        assert_eq!(error_kind(&add("2".into(), 2.into())), Some(ErrorKind::Type));
        assert_eq!(error_kind(&add(true.into(), true.into())), Some(ErrorKind::Type));
        assert_eq!(error_kind(&mul("a".into(), 2.into())), Some(ErrorKind::Type));

        let mut host_text = crate::value::HookSet::named("h");
        host_text.text = Some("ab".into());
        assert_eq!(add(Value::HookSet(host_text), "c".into()), Value::from("abc"));
    }

    #[test]
    fn collections_add_and_subtract() {
        assert_eq!(add(array(&[1.0]), array(&[2.0, 3.0])), array(&[1.0, 2.0, 3.0]));
        assert_eq!(sub(array(&[1.0, 2.0, 1.0, 3.0]), array(&[1.0])), array(&[2.0, 3.0]));
        assert_eq!(sub("banana".into(), "an".into()), Value::from("ba"));

        let a: DataMap = [(Key::from("x"), Value::from(1)), (Key::from("y"), Value::from(2))].into_iter().collect();
        let b: DataMap = [(Key::from("y"), Value::from(3))].into_iter().collect();
        let Value::Map(sum) = add(DataMap::sealed(a.iter().map(|(k, v)| (k.clone(), v.clone()))).into(), b.into()) else {
            panic!("expected a map");
        };
        assert_eq!(sum.get(&Key::from("y")), Some(&Value::from(3)));
        assert!(!sum.is_sealed());

        let sets = add(
            Value::Set([1.into(), 2.into()].into_iter().collect()),
            Value::Set([2.into(), 3.into()].into_iter().collect()),
        );
        let Value::Set(union) = sets else { panic!("expected a set") };
        assert_eq!(union.len(), 3);

        let red = Colour { r: 200, g: 0, b: 0 };
        let blue = Colour { r: 0, g: 0, b: 200 };
        assert_eq!(add(red.into(), blue.into()), Value::Colour(Colour { r: 120, g: 0, b: 120 }));

        let composed = add(Value::Changer(Changer::new("bold", vec![])), Value::Changer(Changer::new("italic", vec![])));
        let Value::Changer(composed) = composed else { panic!("expected a changer") };
        assert_eq!(composed.calls.iter().map(|c| c.name.as_str()).collect::<Vec<_>>(), ["bold", "italic"]);
    }

    #[test]
    fn errors_win() {
        let err = Value::error(ErrorKind::Reference, "first");
        assert_eq!(add(err.clone(), Value::error(ErrorKind::Type, "second")), err);
        assert_eq!(and(true.into(), err.clone()), err);
        assert_eq!(not(err.clone()), err);
    }

    #[test]
    fn comparisons_set_it() {
        let mut state = State::default();
        let host = TestHost;
        let mut ctx = EvalContext::new(&mut state, &host);

        assert_eq!(lt(&mut ctx, 1.into(), 2.into()), Value::Boolean(true));
        assert_eq!(ctx.it, Value::from(1));

        assert_eq!(is(&mut ctx, array(&[1.0, 2.0]), array(&[1.0, 2.0])), Value::Boolean(true));
        assert_eq!(ctx.it, array(&[1.0, 2.0]));

        assert_eq!(is_not(&mut ctx, "a".into(), 1.into()), Value::Boolean(true));
        assert_eq!(error_kind(&gte(&mut ctx, "a".into(), 1.into())), Some(ErrorKind::Type));

        assert_eq!(contains(&mut ctx, "hello".into(), "ell".into()), Value::Boolean(true));
        assert_eq!(contains(&mut ctx, array(&[1.0]), 2.into()), Value::Boolean(false));
        assert_eq!(is_in(&mut ctx, 2.into(), array(&[1.0, 2.0])), Value::Boolean(true));
        assert_eq!(ctx.it, Value::from(2));
        assert_eq!(error_kind(&contains(&mut ctx, "hello".into(), 1.into())), Some(ErrorKind::Type));
    }

    #[test]
    fn logic_needs_booleans() {
        assert_eq!(and(true.into(), false.into()), Value::Boolean(false));
        assert_eq!(or(true.into(), false.into()), Value::Boolean(true));
        assert_eq!(error_kind(&and(1.into(), true.into())), Some(ErrorKind::Type));
        assert_eq!(error_kind(&not("x".into())), Some(ErrorKind::Type));
    }

    #[test]
    fn datasets_ignore_order() {
        let a: DataSet = [1.into(), "b".into()].into_iter().collect();
        let b: DataSet = ["b".into(), 1.into()].into_iter().collect();
        assert!(structural_eq(&a.into(), &b.into()));
        assert!(!structural_eq(&Value::from(1), &Value::from("1")));
    }

    #[test]
    fn position_sugar() {
        let list = array(&[10.0, 20.0, 30.0]);
        assert_eq!(get(&list, &Key::from(1.0)), Value::from(10));
        assert_eq!(get(&list, &Key::from("2nd")), Value::from(20));
        assert_eq!(get(&list, &Key::from("last")), Value::from(30));
        assert_eq!(get(&list, &Key::from("2ndlast")), Value::from(20));
        assert_eq!(get(&list, &Key::from(-1.0)), Value::from(30));
        assert_eq!(get(&list, &Key::from("length")), Value::from(3));
        assert_eq!(get(&"héllo".into(), &Key::from("2nd")), Value::from("é"));

        assert_eq!(error_kind(&get(&list, &Key::from(0.0))), Some(ErrorKind::Range));
        assert_eq!(error_kind(&get(&list, &Key::from(4.0))), Some(ErrorKind::Range));
        assert_eq!(error_kind(&get(&list, &Key::from("foo"))), Some(ErrorKind::Range));
        assert_eq!(error_kind(&get(&1.into(), &Key::from("x"))), Some(ErrorKind::Type));
    }

    #[test]
    fn map_and_colour_properties() {
        let map: DataMap = [(Key::from("a"), Value::from(1))].into_iter().collect();
        let map = Value::Map(map);
        assert_eq!(get(&map, &Key::from("a")), Value::from(1));
        assert_eq!(error_kind(&get(&map, &Key::from("b"))), Some(ErrorKind::Reference));
        assert_eq!(error_kind(&get(&map, &Key::from("__proto"))), Some(ErrorKind::Reference));

        let colour = Value::Colour(Colour { r: 1, g: 2, b: 3 });
        assert_eq!(get(&colour, &Key::from("g")), Value::from(2));
        assert_eq!(error_kind(&get(&colour, &Key::from("a"))), Some(ErrorKind::Reference));
    }

    #[test]
    fn writing_sequences() {
        let mut list = array(&[1.0, 2.0]);
        set_at(&mut list, &Key::Number(2.0), 3.into()).unwrap();
        set_at(&mut list, &Key::Number(-1.0), 4.into()).unwrap();
        assert_eq!(list, array(&[1.0, 2.0, 4.0]));
        assert_eq!(set_at(&mut list, &Key::Number(5.0), 0.into()).unwrap_err().kind, ErrorKind::Range);
        assert_eq!(set_at(&mut list, &Key::from("length"), 0.into()).unwrap_err().kind, ErrorKind::Operation);
        assert_eq!(set_at(&mut list, &Key::from("x"), 0.into()).unwrap_err().kind, ErrorKind::Range);

        let mut word = Value::from("cat");
        set_at(&mut word, &Key::Number(0.0), "b".into()).unwrap();
        assert_eq!(word, Value::from("bat"));
        assert_eq!(set_at(&mut word, &Key::Number(0.0), "ab".into()).unwrap_err().kind, ErrorKind::Type);

        delete(&mut list, &Key::Number(0.0)).unwrap();
        assert_eq!(list, array(&[2.0, 4.0]));
        assert_eq!(delete(&mut word, &Key::Number(0.0)).unwrap_err().kind, ErrorKind::Operation);
    }

    #[test]
    fn sealed_maps_refuse_new_names() {
        let mut map = Value::Map(DataMap::sealed([(Key::from("a"), Value::from(1))]));
        set_at(&mut map, &Key::from("a"), 2.into()).unwrap();
        assert_eq!(set_at(&mut map, &Key::from("b"), 2.into()).unwrap_err().kind, ErrorKind::Operation);
        assert_eq!(delete(&mut map, &Key::from("a")).unwrap_err().kind, ErrorKind::Operation);

        let mut hooks = Value::HookSet(crate::value::HookSet::named("h"));
        assert_eq!(set_at(&mut hooks, &Key::from("a"), 1.into()).unwrap_err().kind, ErrorKind::Operation);
    }

    #[test]
    fn var_refs_record_it() {
        let mut state = State::with_values([("a", Value::from(7))]);
        let host = TestHost;
        let mut ctx = EvalContext::new(&mut state, &host);

        let reference = make_var_ref(&mut ctx, Base::Variables, vec![Key::from("a")]);
        assert!(matches!(reference, Value::Ref(_)));
        assert_eq!(ctx.it, Value::from(7));

        let request = make_assignment_request(reference, 8.into(), AssignOp::To);
        assert!(matches!(request, Value::Assignment(_)));
        assert_eq!(error_kind(&make_assignment_request(1.into(), 8.into(), AssignOp::To)), Some(ErrorKind::Operation));
    }

    #[test]
    fn comparison_chains() {
        assert_eq!(eval("3 > 2 and < 5"), Value::Boolean(true));
        assert_eq!(eval("3 > 2 and it < 3"), Value::Boolean(false));
        assert_eq!(eval("'a' is 'a' or 'b'"), Value::Boolean(true));

        let mut state = State::with_values([("n", Value::from(4))]);
        assert_eq!(eval_in(&mut state, "$n is not 4 or > 3"), Value::Boolean(true));
    }
}
