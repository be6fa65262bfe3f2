// The annotable wrapper: owns one wrapped function target plus the
// ordered annotation list, and survives further decoration of the
// target without losing either.

use std::any::TypeId;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::annotation::{self, Annotation, AnnotationCapable};
use crate::binding::BoundFn;
use crate::class::ClassType;
use crate::error::{RuntimeError, RuntimeResult};
use crate::values::{Function, Value};

/// Introspection metadata mirrored from the wrapped function at
/// conversion time, so tooling sees the original name and docstring
/// through any number of wrapping layers.
#[derive(Debug, Clone, PartialEq)]
pub struct FnMetadata {
    pub name: String,
    pub doc: Option<String>,
}

/// A function value that carries annotations.
///
/// Wraps exactly one target (a plain function, classmethod marker, or
/// staticmethod marker) and an ordered list of annotations, insertion
/// order = application order. `apply_decorator` replaces the target in
/// place; the annotation list is never touched by decoration.
///
/// Handled as `Rc<AnnotableFn>`: identity is pointer identity, which is
/// what the compatibility adapters preserve.
pub struct AnnotableFn {
    meta: FnMetadata,
    target: RefCell<Function>,
    annotations: RefCell<Vec<Rc<dyn Annotation>>>,
}

impl AnnotableFn {
    /// Wrap a candidate target. Errors unless the value is a function,
    /// classmethod, or staticmethod — the marker kinds are accepted even
    /// though they are not directly invocable, because only binding can
    /// resolve them.
    pub fn new(target: Value) -> RuntimeResult<Rc<Self>> {
        let function = match target {
            Value::Function(function) => function,
            other => {
                return Err(RuntimeError::NotAnnotable {
                    actual: other.type_name().to_string(),
                })
            }
        };

        match &function {
            Function::Builtin(_) | Function::ClassMethod(_) | Function::StaticMethod(_) => {}
            other => {
                return Err(RuntimeError::NotAnnotable {
                    actual: other.type_name().to_string(),
                })
            }
        }

        let meta = FnMetadata {
            name: function.name().to_string(),
            doc: function.doc().map(str::to_string),
        };

        Ok(Rc::new(Self {
            meta,
            target: RefCell::new(function),
            annotations: RefCell::new(Vec::new()),
        }))
    }

    pub fn name(&self) -> &str {
        &self.meta.name
    }

    pub fn doc(&self) -> Option<&str> {
        self.meta.doc.as_deref()
    }

    pub fn metadata(&self) -> &FnMetadata {
        &self.meta
    }

    /// Current wrapped target. A clone: the slot may be replaced by a
    /// later `apply_decorator`.
    pub fn target(&self) -> Function {
        self.target.borrow().clone()
    }

    /// Replace the wrapped target with `decorator(target)`, leaving the
    /// annotation list untouched. This is what lets ordinary decorators
    /// pass through an annotable function instead of hiding it.
    pub fn apply_decorator(&self, decorator: &Value) -> RuntimeResult<()> {
        let decorator = match decorator {
            Value::Function(function) => function,
            other => {
                return Err(RuntimeError::InvalidDecorator {
                    actual: other.type_name().to_string(),
                })
            }
        };

        let current = self.target.borrow().clone();
        let replacement = match decorator.invoke(vec![Value::Function(current)])? {
            Value::Function(function) => function,
            other => {
                return Err(RuntimeError::TypeError {
                    expected: "function".to_string(),
                    actual: other.type_name().to_string(),
                    operation: format!("apply_decorator on '{}'", self.meta.name),
                })
            }
        };

        log::debug!(
            "[annotable] '{}' target replaced by decorator '{}'",
            self.meta.name,
            decorator.name()
        );
        *self.target.borrow_mut() = replacement;
        Ok(())
    }

    /// Explicit binding step: produce the per-access delegate used when
    /// this wrapper is stored on a class and retrieved through an
    /// instance (`receiver` present) or the class itself (absent).
    pub fn bind(self: &Rc<Self>, receiver: Option<Value>, owner: Rc<ClassType>) -> Rc<BoundFn> {
        log::trace!(
            "[annotable] binding '{}' on class '{}' ({})",
            self.meta.name,
            owner.name(),
            if receiver.is_some() { "instance access" } else { "class access" }
        );
        BoundFn::new(self.clone(), receiver, owner)
    }
}

impl AnnotationCapable for AnnotableFn {
    fn invoke(&self, args: Vec<Value>) -> RuntimeResult<Value> {
        // Marker targets error here; Function::invoke reports them.
        let target = self.target.borrow().clone();
        target.invoke(args)
    }

    fn add_annotation(&self, annotation: Rc<dyn Annotation>) {
        annotation::register_kind_of(annotation.as_ref());
        log::debug!(
            "[annotable] '{}' += {}",
            self.meta.name,
            annotation.kind_name()
        );
        self.annotations.borrow_mut().push(annotation);
    }

    fn get_annotation(&self, kind: TypeId) -> RuntimeResult<Option<Rc<dyn Annotation>>> {
        annotation::ensure_kind(kind)?;
        Ok(self
            .annotations
            .borrow()
            .iter()
            .rev()
            .find(|a| annotation::matches_kind(a.as_ref(), kind))
            .cloned())
    }

    fn get_annotations(&self, kind: TypeId) -> RuntimeResult<Vec<Rc<dyn Annotation>>> {
        annotation::ensure_kind(kind)?;
        Ok(self
            .annotations
            .borrow()
            .iter()
            .rev()
            .filter(|a| annotation::matches_kind(a.as_ref(), kind))
            .cloned()
            .collect())
    }

    fn get_annotations_by_types(&self, kinds: &[TypeId]) -> RuntimeResult<Vec<Rc<dyn Annotation>>> {
        for kind in kinds {
            annotation::ensure_kind(*kind)?;
        }
        Ok(self
            .annotations
            .borrow()
            .iter()
            .rev()
            .filter(|a| kinds.iter().any(|kind| annotation::matches_kind(a.as_ref(), *kind)))
            .cloned()
            .collect())
    }
}

impl fmt::Debug for AnnotableFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnnotableFn")
            .field("name", &self.meta.name)
            .field("target", &*self.target.borrow())
            .field("annotations", &self.annotations.borrow().len())
            .finish()
    }
}

/// Convert a function value into an annotable one, mirroring its
/// name and docstring. Already-annotable values are returned as-is.
pub fn convert_to_annotable(target: Value) -> RuntimeResult<Rc<AnnotableFn>> {
    if let Value::Function(Function::Annotable(existing)) = &target {
        return Ok(existing.clone());
    }
    let annotable = AnnotableFn::new(target)?;
    log::trace!("[annotable] converted '{}'", annotable.name());
    Ok(annotable)
}
