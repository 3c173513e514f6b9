//! Runtime object model.
//!
//! [`Object`] is a closed sum type: adding a variant forces every operator
//! and builtin `match` to handle it.  Cloning an `Object` never copies an
//! aggregate: strings, arrays, functions and errors sit behind an `Rc`, so a
//! clone is another handle to the same instance.  `Boolean` and `Null` carry
//! no heap data at all; [`TRUE`], [`FALSE`] and [`NULL`] are the only values
//! of those variants the evaluator ever produces.

use std::fmt;
use std::rc::Rc;

use crate::ast::{BlockStatement, Identifier};
use crate::builtins::Builtin;
use crate::environment::Env;

pub const TRUE: Object = Object::Boolean(true);
pub const FALSE: Object = Object::Boolean(false);
pub const NULL: Object = Object::Null;

/// Type tag of an [`Object`], displayed in upper case in error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectType {
    Integer,
    String,
    Boolean,
    Null,
    Array,
    Function,
    Builtin,
    Error,
}

impl ObjectType {
    pub fn as_str(self) -> &'static str {
        match self {
            ObjectType::Integer => "INTEGER",
            ObjectType::String => "STRING",
            ObjectType::Boolean => "BOOLEAN",
            ObjectType::Null => "NULL",
            ObjectType::Array => "ARRAY",
            ObjectType::Function => "FUNCTION",
            ObjectType::Builtin => "BUILTIN",
            ObjectType::Error => "ERROR",
        }
    }
}

impl fmt::Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A user‑defined function together with the environment it closes over.
///
/// `env` is the defining frame itself, not a snapshot: bindings added to
/// that frame after the closure is created are visible when it runs.
pub struct Function {
    pub parameters: Vec<Identifier>,
    pub body: Rc<BlockStatement>,
    pub env: Env,
}

impl fmt::Debug for Function {
    // The captured environment usually contains this very function.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function")
            .field("parameters", &self.parameters)
            .field("body", &self.body)
            .finish_non_exhaustive()
    }
}

/// A runtime value.
#[derive(Debug, Clone)]
pub enum Object {
    Integer(i64),
    String(Rc<str>),
    Boolean(bool),
    Null,
    /// Arrays are never mutated in place; "modifying" builtins build a new one.
    Array(Rc<Vec<Object>>),
    Function(Rc<Function>),
    Builtin(&'static Builtin),
    /// A runtime failure surfaced to the host as a value.
    Error(Rc<str>),
}

impl Object {
    #[inline]
    pub fn object_type(&self) -> ObjectType {
        match self {
            Object::Integer(_) => ObjectType::Integer,
            Object::String(_) => ObjectType::String,
            Object::Boolean(_) => ObjectType::Boolean,
            Object::Null => ObjectType::Null,
            Object::Array(_) => ObjectType::Array,
            Object::Function(_) => ObjectType::Function,
            Object::Builtin(_) => ObjectType::Builtin,
            Object::Error(_) => ObjectType::Error,
        }
    }

    /// Maps a native `bool` onto the shared boolean values.
    #[inline]
    pub fn from_bool(value: bool) -> Object {
        if value {
            TRUE
        } else {
            FALSE
        }
    }

    pub fn string<S: AsRef<str>>(value: S) -> Object {
        Object::String(Rc::from(value.as_ref()))
    }

    pub fn array(elements: Vec<Object>) -> Object {
        Object::Array(Rc::new(elements))
    }

    pub fn error<S: fmt::Display>(message: S) -> Object {
        Object::Error(Rc::from(message.to_string()))
    }

    /// Only `false` and `null` are falsy; `0`, `""` and `[]` are truthy.
    #[inline]
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Object::Boolean(false) | Object::Null)
    }

    #[inline]
    pub fn is_error(&self) -> bool {
        matches!(self, Object::Error(_))
    }

    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Object::Null)
    }

    /// Identity for heap‑backed values, value equality for everything else.
    pub fn same_instance(&self, other: &Object) -> bool {
        match (self, other) {
            (Object::Integer(a), Object::Integer(b)) => a == b,
            (Object::Boolean(a), Object::Boolean(b)) => a == b,
            (Object::Null, Object::Null) => true,
            (Object::String(a), Object::String(b)) => Rc::ptr_eq(a, b),
            (Object::Array(a), Object::Array(b)) => Rc::ptr_eq(a, b),
            (Object::Function(a), Object::Function(b)) => Rc::ptr_eq(a, b),
            (Object::Builtin(a), Object::Builtin(b)) => std::ptr::eq(*a, *b),
            (Object::Error(a), Object::Error(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

/// Structural equality, used by tests and host code.  The language's own
/// `==` lives in the evaluator.
impl PartialEq for Object {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Object::String(a), Object::String(b)) => a == b,
            (Object::Array(a), Object::Array(b)) => a == b,
            (Object::Error(a), Object::Error(b)) => a == b,
            _ => self.same_instance(other),
        }
    }
}

impl fmt::Display for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Object::Integer(n) => {
                let mut buf: itoa::Buffer = itoa::Buffer::new();
                f.write_str(buf.format(*n))
            }

            Object::String(s) => f.write_str(s),

            Object::Boolean(b) => write!(f, "{}", b),

            Object::Null => f.write_str("null"),

            Object::Array(elements) => {
                f.write_str("[")?;
                for (i, el) in elements.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", el)?;
                }
                f.write_str("]")
            }

            Object::Function(function) => {
                f.write_str("fn(")?;
                for (i, param) in function.parameters.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", param)?;
                }
                write!(f, ") {}", function.body)
            }

            Object::Builtin(builtin) => write!(f, "builtin function {}", builtin.name),

            Object::Error(message) => write!(f, "ERROR: {}", message),
        }
    }
}
