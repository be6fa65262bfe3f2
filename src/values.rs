// Value system for annotable function values.
// Callables are first-class values here; annotations attach to the
// `Function::Annotable` variant and survive further decoration.

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::annotable::AnnotableFn;
use crate::annotation::AnnotationCapable;
use crate::binding::BoundFn;
use crate::class::{ClassType, Instance};
use crate::error::{RuntimeError, RuntimeResult};

#[derive(Debug, Clone)]
pub enum Value {
    Nil,
    Boolean(bool),
    Integer(i64),
    Float(f64),
    String(String),
    Vector(Vec<Value>),
    Map(HashMap<String, Value>),
    Function(Function),
    Class(Rc<ClassType>),
    Instance(Rc<Instance>),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "nil"),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Float(fl) => write!(f, "{}", fl),
            Value::String(s) => write!(f, "\"{}\"", s),
            Value::Vector(v) => {
                let items: Vec<String> = v.iter().map(|item| format!("{}", item)).collect();
                write!(f, "[{}]", items.join(" "))
            }
            Value::Map(m) => {
                let items: Vec<String> = m.iter().map(|(k, v)| format!("{} {}", k, v)).collect();
                write!(f, "{{{}}}", items.join(", "))
            }
            Value::Function(function) => write!(f, "#<{} {}>", function.type_name(), function.name()),
            Value::Class(class) => write!(f, "#<class {}>", class.name()),
            Value::Instance(instance) => write!(f, "#<instance of {}>", instance.class().name()),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Vector(a), Value::Vector(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            (Value::Function(a), Value::Function(b)) => a == b,
            // Classes and instances compare by identity.
            (Value::Class(a), Value::Class(b)) => Rc::ptr_eq(a, b),
            (Value::Instance(a), Value::Instance(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Nil => "nil",
            Value::Boolean(_) => "boolean",
            Value::Integer(_) => "integer",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Vector(_) => "vector",
            Value::Map(_) => "map",
            Value::Function(function) => function.type_name(),
            Value::Class(_) => "class",
            Value::Instance(_) => "instance",
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_string(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Call this value as a function, erroring on non-function values.
    pub fn call(&self, args: Vec<Value>) -> RuntimeResult<Value> {
        match self {
            Value::Function(function) => function.invoke(args),
            other => Err(RuntimeError::NotCallable {
                actual: other.type_name().to_string(),
            }),
        }
    }

    /// View of this value through the annotation contract, when it has one.
    pub fn as_annotation_capable(&self) -> Option<&dyn AnnotationCapable> {
        match self {
            Value::Function(function) => function.as_annotation_capable(),
            _ => None,
        }
    }

    /// Build a plain builtin function value.
    pub fn function<F>(name: &str, arity: Arity, func: F) -> Value
    where
        F: Fn(Vec<Value>) -> RuntimeResult<Value> + 'static,
    {
        Value::Function(Function::Builtin(BuiltinFunction::new(name, arity, Rc::new(func))))
    }

    /// Build a classmethod marker: not directly invocable, resolved
    /// against the owning class at binding time.
    pub fn class_method<F>(name: &str, arity: Arity, func: F) -> Value
    where
        F: Fn(Vec<Value>) -> RuntimeResult<Value> + 'static,
    {
        Value::Function(Function::ClassMethod(BuiltinFunction::new(
            name,
            arity,
            Rc::new(func),
        )))
    }

    /// Build a staticmethod marker: resolved at binding time, no
    /// receiver is ever injected.
    pub fn static_method<F>(name: &str, arity: Arity, func: F) -> Value
    where
        F: Fn(Vec<Value>) -> RuntimeResult<Value> + 'static,
    {
        Value::Function(Function::StaticMethod(BuiltinFunction::new(
            name,
            arity,
            Rc::new(func),
        )))
    }
}

#[derive(Clone)]
pub enum Function {
    Builtin(BuiltinFunction),
    /// Classmethod marker. Binding prepends the owning class.
    ClassMethod(BuiltinFunction),
    /// Staticmethod marker. Binding prepends nothing.
    StaticMethod(BuiltinFunction),
    /// Annotation-capable wrapper around one of the above.
    Annotable(Rc<AnnotableFn>),
    /// Per-access binding delegate produced by attribute lookup.
    Bound(Rc<BoundFn>),
}

impl Function {
    pub fn name(&self) -> &str {
        match self {
            Function::Builtin(b) | Function::ClassMethod(b) | Function::StaticMethod(b) => &b.name,
            Function::Annotable(wrapped) => wrapped.name(),
            Function::Bound(bound) => bound.name(),
        }
    }

    pub fn doc(&self) -> Option<&str> {
        match self {
            Function::Builtin(b) | Function::ClassMethod(b) | Function::StaticMethod(b) => {
                b.doc.as_deref()
            }
            Function::Annotable(wrapped) => wrapped.doc(),
            Function::Bound(bound) => bound.doc(),
        }
    }

    pub fn arity(&self) -> Option<Arity> {
        match self {
            Function::Builtin(b) | Function::ClassMethod(b) | Function::StaticMethod(b) => {
                Some(b.arity.clone())
            }
            Function::Annotable(wrapped) => wrapped.target().arity(),
            Function::Bound(bound) => bound.target().target().arity(),
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Function::Builtin(_) => "function",
            Function::ClassMethod(_) => "classmethod",
            Function::StaticMethod(_) => "staticmethod",
            Function::Annotable(_) => "annotable-function",
            Function::Bound(_) => "bound-method",
        }
    }

    pub fn invoke(&self, args: Vec<Value>) -> RuntimeResult<Value> {
        match self {
            Function::Builtin(b) => b.invoke(args),
            Function::ClassMethod(b) => Err(RuntimeError::UnboundMethod {
                function: b.name.clone(),
                kind: "classmethod",
            }),
            Function::StaticMethod(b) => Err(RuntimeError::UnboundMethod {
                function: b.name.clone(),
                kind: "staticmethod",
            }),
            Function::Annotable(wrapped) => wrapped.invoke(args),
            Function::Bound(bound) => bound.invoke(args),
        }
    }

    pub fn as_annotation_capable(&self) -> Option<&dyn AnnotationCapable> {
        match self {
            Function::Annotable(wrapped) => Some(wrapped.as_ref()),
            Function::Bound(bound) => Some(bound.as_ref()),
            _ => None,
        }
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Function::Builtin(b) => write!(f, "Builtin({})", b.name),
            Function::ClassMethod(b) => write!(f, "ClassMethod({})", b.name),
            Function::StaticMethod(b) => write!(f, "StaticMethod({})", b.name),
            Function::Annotable(wrapped) => write!(f, "Annotable({})", wrapped.name()),
            Function::Bound(bound) => write!(f, "Bound({})", bound.name()),
        }
    }
}

impl PartialEq for Function {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Function::Builtin(a), Function::Builtin(b)) => a == b,
            (Function::ClassMethod(a), Function::ClassMethod(b)) => a == b,
            (Function::StaticMethod(a), Function::StaticMethod(b)) => a == b,
            (Function::Annotable(a), Function::Annotable(b)) => Rc::ptr_eq(a, b),
            (Function::Bound(a), Function::Bound(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

#[derive(Clone)]
pub struct BuiltinFunction {
    pub name: String,
    pub doc: Option<String>,
    pub arity: Arity,
    pub func: Rc<dyn Fn(Vec<Value>) -> RuntimeResult<Value>>,
}

impl BuiltinFunction {
    pub fn new(
        name: impl Into<String>,
        arity: Arity,
        func: Rc<dyn Fn(Vec<Value>) -> RuntimeResult<Value>>,
    ) -> Self {
        Self {
            name: name.into(),
            doc: None,
            arity,
            func,
        }
    }

    pub fn with_doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }

    pub fn invoke(&self, args: Vec<Value>) -> RuntimeResult<Value> {
        self.arity.check(&self.name, args.len())?;
        (self.func)(args)
    }
}

impl fmt::Debug for BuiltinFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BuiltinFunction")
            .field("name", &self.name)
            .field("arity", &self.arity)
            .finish()
    }
}

impl PartialEq for BuiltinFunction {
    fn eq(&self, other: &Self) -> bool {
        // Compare builtin functions by name and arity, not by function pointer
        self.name == other.name && self.arity == other.arity
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Arity {
    Fixed(usize),
    Variadic(usize), // Minimum number of arguments
    Range(usize, usize),
}

impl Arity {
    pub fn accepts(&self, count: usize) -> bool {
        match self {
            Arity::Fixed(n) => count == *n,
            Arity::Variadic(min) => count >= *min,
            Arity::Range(lo, hi) => (*lo..=*hi).contains(&count),
        }
    }

    pub(crate) fn check(&self, function: &str, actual: usize) -> RuntimeResult<()> {
        if self.accepts(actual) {
            Ok(())
        } else {
            Err(RuntimeError::ArityMismatch {
                function: function.to_string(),
                expected: self.to_string(),
                actual,
            })
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arity::Fixed(n) => write!(f, "{}", n),
            Arity::Variadic(min) => write!(f, "at least {}", min),
            Arity::Range(lo, hi) => write!(f, "between {} and {}", lo, hi),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arity_accepts() {
        assert!(Arity::Fixed(2).accepts(2));
        assert!(!Arity::Fixed(2).accepts(3));
        assert!(Arity::Variadic(1).accepts(5));
        assert!(!Arity::Variadic(1).accepts(0));
        assert!(Arity::Range(1, 3).accepts(3));
        assert!(!Arity::Range(1, 3).accepts(4));
    }

    #[test]
    fn builtin_invoke_checks_arity() {
        let double = Value::function("double", Arity::Fixed(1), |mut args| {
            let n = args.remove(0).as_integer().unwrap_or(0);
            Ok(Value::Integer(n * 2))
        });

        assert_eq!(double.call(vec![Value::Integer(4)]), Ok(Value::Integer(8)));
        assert_eq!(
            double.call(vec![]),
            Err(RuntimeError::ArityMismatch {
                function: "double".to_string(),
                expected: "1".to_string(),
                actual: 0,
            })
        );
    }

    #[test]
    fn calling_a_non_function_errors() {
        let err = Value::Integer(7).call(vec![]).unwrap_err();
        assert_eq!(
            err,
            RuntimeError::NotCallable {
                actual: "integer".to_string()
            }
        );
    }

    #[test]
    fn markers_are_not_directly_invocable() {
        let marker = Value::class_method("describe", Arity::Fixed(1), |_| Ok(Value::Nil));
        assert!(matches!(
            marker.call(vec![]),
            Err(RuntimeError::UnboundMethod { kind: "classmethod", .. })
        ));
    }

    #[test]
    fn display_formats() {
        assert_eq!(format!("{}", Value::Nil), "nil");
        assert_eq!(format!("{}", Value::Integer(3)), "3");
        let f = Value::function("id", Arity::Fixed(1), |mut args| Ok(args.remove(0)));
        assert_eq!(format!("{}", f), "#<function id>");
    }
}
