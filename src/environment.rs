use crate::error::RuntimeError;
use crate::object::Object;
use log::trace;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// Shared handle to a frame.  Every closure created in a frame holds one,
/// so a frame lives as long as its longest‑lived holder.
pub type Env = Rc<RefCell<Environment>>;

/// One frame of the lexical scope chain.
#[derive(Debug, Default)]
pub struct Environment {
    values: HashMap<String, Object>,
    outer: Option<Env>,
}

impl Environment {
    /// A fresh global frame.
    pub fn new() -> Env {
        Rc::new(RefCell::new(Environment::default()))
    }

    /// A fresh empty frame whose parent is `outer`.
    pub fn new_enclosed(outer: &Env) -> Env {
        Rc::new(RefCell::new(Environment {
            values: HashMap::new(),
            outer: Some(Rc::clone(outer)),
        }))
    }

    /// Insert or overwrite a binding in this frame only.
    pub fn define(&mut self, name: &str, value: Object) {
        trace!("define '{}' = {}", name, value);
        self.values.insert(name.to_string(), value);
    }

    /// Look `name` up in this frame, then each enclosing frame.
    pub fn resolve(&self, name: &str) -> Result<Object, RuntimeError> {
        if let Some(value) = self.values.get(name) {
            Ok(value.clone())
        } else if let Some(outer) = &self.outer {
            outer.borrow().resolve(name)
        } else {
            Err(RuntimeError::IdentifierNotFound(name.to_string()))
        }
    }

    pub fn outer(&self) -> Option<&Env> {
        self.outer.as_ref()
    }
}
