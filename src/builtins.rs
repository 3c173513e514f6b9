//! Native functions available to every program.
//!
//! The table is a compile‑time perfect hash, built before any evaluation
//! and never mutated.  Each entry validates its argument count and types
//! before doing any work and reports a [`RuntimeError`] instead of panicking.
//! `map` and `reduce` call back into the evaluator through
//! [`Evaluator::apply_function`].

use std::fmt;
use std::io::Write;
use std::rc::Rc;

use log::debug;
use phf::phf_map;

use crate::error::RuntimeError;
use crate::evaluator::Evaluator;
use crate::object::{Object, ObjectType, NULL};

/// Signature shared by every builtin.
pub type BuiltinFunction = fn(&mut Evaluator<'_>, &[Object]) -> Result<Object, RuntimeError>;

/// A named native function.
pub struct Builtin {
    pub name: &'static str,
    pub func: BuiltinFunction,
}

impl fmt::Debug for Builtin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Builtin({})", self.name)
    }
}

pub static BUILTINS: phf::Map<&'static str, Builtin> = phf_map! {
    "len"    => Builtin { name: "len",    func: len },
    "first"  => Builtin { name: "first",  func: first },
    "last"   => Builtin { name: "last",   func: last },
    "rest"   => Builtin { name: "rest",   func: rest },
    "push"   => Builtin { name: "push",   func: push },
    "map"    => Builtin { name: "map",    func: map },
    "reduce" => Builtin { name: "reduce", func: reduce },
    "puts"   => Builtin { name: "puts",   func: puts },
};

// ───────────────────────────── argument checks ─────────────────────────────

fn check_arity(args: &[Object], want: usize) -> Result<(), RuntimeError> {
    if args.len() != want {
        return Err(RuntimeError::WrongArgumentCount {
            got: args.len(),
            want,
        });
    }

    Ok(())
}

/// The sole argument of `builtin` as an array.
fn array_arg<'o>(
    builtin: &'static str,
    arg: &'o Object,
) -> Result<&'o Rc<Vec<Object>>, RuntimeError> {
    match arg {
        Object::Array(elements) => Ok(elements),
        other => Err(RuntimeError::ArgumentType {
            builtin,
            expected: ObjectType::Array,
            got: other.object_type(),
        }),
    }
}

fn positional_type_error(
    position: &'static str,
    builtin: &'static str,
    expected: ObjectType,
    got: &Object,
) -> RuntimeError {
    RuntimeError::PositionalArgumentType {
        position,
        builtin,
        expected,
        got: got.object_type(),
    }
}

// ───────────────────────────── builtins ────────────────────────────────────

fn len(_: &mut Evaluator<'_>, args: &[Object]) -> Result<Object, RuntimeError> {
    check_arity(args, 1)?;

    match &args[0] {
        Object::String(s) => Ok(Object::Integer(s.len() as i64)),
        Object::Array(elements) => Ok(Object::Integer(elements.len() as i64)),
        other => Err(RuntimeError::UnsupportedArgument {
            builtin: "len",
            got: other.object_type(),
        }),
    }
}

fn first(_: &mut Evaluator<'_>, args: &[Object]) -> Result<Object, RuntimeError> {
    check_arity(args, 1)?;

    let elements = array_arg("first", &args[0])?;

    Ok(elements.first().cloned().unwrap_or(NULL))
}

fn last(_: &mut Evaluator<'_>, args: &[Object]) -> Result<Object, RuntimeError> {
    check_arity(args, 1)?;

    let elements = array_arg("last", &args[0])?;

    Ok(elements.last().cloned().unwrap_or(NULL))
}

fn rest(_: &mut Evaluator<'_>, args: &[Object]) -> Result<Object, RuntimeError> {
    check_arity(args, 1)?;

    let elements = array_arg("rest", &args[0])?;

    match elements.split_first() {
        Some((_, tail)) => Ok(Object::array(tail.to_vec())),
        None => Ok(NULL),
    }
}

fn push(_: &mut Evaluator<'_>, args: &[Object]) -> Result<Object, RuntimeError> {
    check_arity(args, 2)?;

    let elements = array_arg("push", &args[0])?;

    let mut pushed: Vec<Object> = Vec::with_capacity(elements.len() + 1);
    pushed.extend(elements.iter().cloned());
    pushed.push(args[1].clone());

    Ok(Object::array(pushed))
}

fn map(evaluator: &mut Evaluator<'_>, args: &[Object]) -> Result<Object, RuntimeError> {
    check_arity(args, 2)?;

    let Object::Array(elements) = &args[0] else {
        return Err(positional_type_error("first", "map", ObjectType::Array, &args[0]));
    };

    if !matches!(args[1], Object::Function(_)) {
        return Err(positional_type_error("second", "map", ObjectType::Function, &args[1]));
    }

    debug!("map over {} elements", elements.len());

    let mut mapped: Vec<Object> = Vec::with_capacity(elements.len());

    for el in elements.iter() {
        mapped.push(evaluator.apply_function(&args[1], std::slice::from_ref(el))?);
    }

    Ok(Object::array(mapped))
}

fn reduce(evaluator: &mut Evaluator<'_>, args: &[Object]) -> Result<Object, RuntimeError> {
    check_arity(args, 3)?;

    let Object::Array(elements) = &args[0] else {
        return Err(positional_type_error("first", "reduce", ObjectType::Array, &args[0]));
    };

    let Object::Integer(initial) = args[1] else {
        return Err(positional_type_error("second", "reduce", ObjectType::Integer, &args[1]));
    };

    if !matches!(args[2], Object::Function(_)) {
        return Err(positional_type_error("third", "reduce", ObjectType::Function, &args[2]));
    }

    debug!("reduce over {} elements from {}", elements.len(), initial);

    let mut acc: i64 = initial;

    for el in elements.iter() {
        match evaluator.apply_function(&args[2], &[Object::Integer(acc), el.clone()])? {
            Object::Integer(next) => acc = next,
            other => return Err(RuntimeError::ReduceAccumulator(other.object_type())),
        }
    }

    Ok(Object::Integer(acc))
}

fn puts(evaluator: &mut Evaluator<'_>, args: &[Object]) -> Result<Object, RuntimeError> {
    let output = evaluator.output();

    for arg in args {
        writeln!(output, "{}", arg).map_err(|e| RuntimeError::Output(e.to_string()))?;
    }

    Ok(NULL)
}
