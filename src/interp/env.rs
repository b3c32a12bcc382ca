//! Lexical environments
//!
//! An environment is a chain of frames. Frames are shared through `Rc` so a
//! closure can keep the chain it was created in alive, and bindings added to an
//! outer frame later on are visible through it.

use std::cell::RefCell;
use std::rc::Rc;

use indexmap::IndexMap;

use super::value::Value;

/// One frame of bindings plus a link to the enclosing frame
#[derive(Default)]
pub struct Environment {
    bindings: RefCell<IndexMap<String, Value>>,
    parent: Option<Rc<Environment>>,
}

impl Environment {
    /// Create a root frame
    pub fn new() -> Rc<Self> {
        Rc::new(Environment::default())
    }

    /// Create a frame whose parent is `self`
    pub fn child(self: &Rc<Self>) -> Rc<Self> {
        Rc::new(Environment {
            bindings: RefCell::new(IndexMap::new()),
            parent: Some(Rc::clone(self)),
        })
    }

    /// Find the innermost binding of `name`
    pub fn lookup(&self, name: &str) -> Option<Value> {
        let mut frame = self;
        loop {
            if let Some(value) = frame.bindings.borrow().get(name) {
                return Some(value.clone());
            }
            frame = frame.parent.as_deref()?;
        }
    }

    /// Bind `name` in this frame, shadowing any outer binding
    pub fn bind(&self, name: impl Into<String>, value: Value) {
        self.bindings.borrow_mut().insert(name.into(), value);
    }

    /// Bindings of this frame in insertion order
    pub fn local_bindings(&self) -> Vec<(String, Value)> {
        self.bindings
            .borrow()
            .iter()
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect()
    }

    /// Every visible binding, innermost first, shadowed names omitted
    pub fn visible_bindings(&self) -> Vec<(String, Value)> {
        let mut seen = IndexMap::new();
        let mut frame = Some(self);
        while let Some(current) = frame {
            for (name, value) in current.bindings.borrow().iter() {
                seen.entry(name.clone()).or_insert_with(|| value.clone());
            }
            frame = current.parent.as_deref();
        }
        seen.into_iter().collect()
    }

    /// Number of frames between this one and the root
    pub fn depth(&self) -> usize {
        let mut depth = 0;
        let mut frame = self.parent.as_deref();
        while let Some(current) = frame {
            depth += 1;
            frame = current.parent.as_deref();
        }
        depth
    }
}
