// Minimal owning-type emulation. Attribute lookup is where the
// explicit bind step happens: an annotable function stored on a class
// comes back as a fresh binding delegate on every access.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::error::{RuntimeError, RuntimeResult};
use crate::values::{Function, Value};

pub struct ClassType {
    name: String,
    attributes: RefCell<HashMap<String, Value>>,
}

impl ClassType {
    pub fn new(name: impl Into<String>) -> Rc<Self> {
        Rc::new(Self {
            name: name.into(),
            attributes: RefCell::new(HashMap::new()),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_attr(&self, name: impl Into<String>, value: Value) {
        self.attributes.borrow_mut().insert(name.into(), value);
    }

    /// Class-level attribute access: annotable functions are bound with
    /// no receiver, everything else is returned as stored.
    pub fn get_attr(self: &Rc<Self>, name: &str) -> RuntimeResult<Value> {
        let value = self
            .attributes
            .borrow()
            .get(name)
            .cloned()
            .ok_or_else(|| RuntimeError::UnknownAttribute {
                target: format!("class '{}'", self.name),
                attribute: name.to_string(),
            })?;
        Ok(bind_if_annotable(value, None, self))
    }

    pub(crate) fn raw_attr(&self, name: &str) -> Option<Value> {
        self.attributes.borrow().get(name).cloned()
    }
}

impl fmt::Debug for ClassType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassType").field("name", &self.name).finish()
    }
}

pub struct Instance {
    class: Rc<ClassType>,
    fields: RefCell<HashMap<String, Value>>,
}

impl Instance {
    pub fn new(class: Rc<ClassType>) -> Rc<Self> {
        Rc::new(Self {
            class,
            fields: RefCell::new(HashMap::new()),
        })
    }

    pub fn class(&self) -> &Rc<ClassType> {
        &self.class
    }

    pub fn set_field(&self, name: impl Into<String>, value: Value) {
        self.fields.borrow_mut().insert(name.into(), value);
    }

    /// Instance attribute access: own fields shadow class attributes;
    /// a class-attribute hit binds annotable functions with this
    /// instance as the receiver.
    pub fn get_attr(self: &Rc<Self>, name: &str) -> RuntimeResult<Value> {
        if let Some(value) = self.fields.borrow().get(name) {
            return Ok(value.clone());
        }
        let value = self
            .class
            .raw_attr(name)
            .ok_or_else(|| RuntimeError::UnknownAttribute {
                target: format!("instance of '{}'", self.class.name()),
                attribute: name.to_string(),
            })?;
        Ok(bind_if_annotable(
            value,
            Some(Value::Instance(self.clone())),
            &self.class,
        ))
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance")
            .field("class", &self.class.name())
            .field("fields", &self.fields.borrow().len())
            .finish()
    }
}

fn bind_if_annotable(value: Value, receiver: Option<Value>, owner: &Rc<ClassType>) -> Value {
    match value {
        Value::Function(Function::Annotable(wrapped)) => {
            Value::Function(Function::Bound(wrapped.bind(receiver, owner.clone())))
        }
        other => other,
    }
}
