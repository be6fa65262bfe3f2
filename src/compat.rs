// Decorator-compatibility adapters. A decorator run through these
// folds itself into an annotable target in place instead of wrapping
// it in an opaque layer that would hide the annotations.

use std::rc::Rc;

use crate::error::{RuntimeError, RuntimeResult};
use crate::values::{Arity, BuiltinFunction, Function, Value};

/// Make a decorator safe to apply above an annotation in a decoration
/// chain.
///
/// The returned wrapper mirrors the decorator's name and docstring.
/// Applied to an annotable target it calls `apply_decorator` on it and
/// returns the *same* value (identity and annotation list intact);
/// applied to anything else it behaves exactly like the original
/// decorator.
pub fn annotation_compatible(decorator: Value) -> RuntimeResult<Value> {
    let decorator = as_function(decorator)?;
    let name = decorator.name().to_string();
    let doc = decorator.doc().map(str::to_string);

    let inner = decorator.clone();
    let wrapper = move |mut args: Vec<Value>| -> RuntimeResult<Value> {
        let target = args.remove(0);
        match target {
            Value::Function(Function::Annotable(wrapped)) => {
                wrapped.apply_decorator(&Value::Function(inner.clone()))?;
                log::debug!("[compat] '{}' folded into '{}'", inner.name(), wrapped.name());
                Ok(Value::Function(Function::Annotable(wrapped)))
            }
            other => inner.invoke(vec![other]),
        }
    };

    let mut wrapper = BuiltinFunction::new(name, Arity::Fixed(1), Rc::new(wrapper));
    if let Some(doc) = doc {
        wrapper = wrapper.with_doc(doc);
    }
    Ok(Value::Function(Function::Builtin(wrapper)))
}

/// Factory-level variant of [`annotation_compatible`]: wraps a
/// decorator factory so that every decorator it produces is made
/// compatible automatically. The factory's name, docstring, and arity
/// are mirrored.
pub fn annotation_compatible_ex(factory: Value) -> RuntimeResult<Value> {
    let factory = as_function(factory)?;
    let name = factory.name().to_string();
    let doc = factory.doc().map(str::to_string);
    let arity = factory.arity().unwrap_or(Arity::Variadic(0));

    let inner = factory.clone();
    let wrapper = move |args: Vec<Value>| -> RuntimeResult<Value> {
        let decorator = inner.invoke(args)?;
        annotation_compatible(decorator)
    };

    let mut wrapper = BuiltinFunction::new(name, arity, Rc::new(wrapper));
    if let Some(doc) = doc {
        wrapper = wrapper.with_doc(doc);
    }
    Ok(Value::Function(Function::Builtin(wrapper)))
}

fn as_function(value: Value) -> RuntimeResult<Function> {
    match value {
        Value::Function(function) => Ok(function),
        other => Err(RuntimeError::InvalidDecorator {
            actual: other.type_name().to_string(),
        }),
    }
}
