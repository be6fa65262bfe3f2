// Binding delegate: the short-lived view produced every time an
// annotable function stored on a class is accessed as an attribute.

use std::any::TypeId;
use std::fmt;
use std::rc::Rc;

use crate::annotable::{AnnotableFn, FnMetadata};
use crate::annotation::{Annotation, AnnotationCapable};
use crate::class::ClassType;
use crate::error::RuntimeResult;
use crate::values::{Function, Value};

/// A bound view of an [`AnnotableFn`]: back-reference to the wrapper,
/// the accessing receiver (absent for class-level access), and the
/// owning class. Holds no annotation state of its own — every query
/// forwards to the wrapper, so callers cannot tell the two apart.
pub struct BoundFn {
    target: Rc<AnnotableFn>,
    receiver: Option<Value>,
    owner: Rc<ClassType>,
}

impl BoundFn {
    pub(crate) fn new(
        target: Rc<AnnotableFn>,
        receiver: Option<Value>,
        owner: Rc<ClassType>,
    ) -> Rc<Self> {
        Rc::new(Self {
            target,
            receiver,
            owner,
        })
    }

    pub fn target(&self) -> &Rc<AnnotableFn> {
        &self.target
    }

    pub fn receiver(&self) -> Option<&Value> {
        self.receiver.as_ref()
    }

    pub fn owner(&self) -> &Rc<ClassType> {
        &self.owner
    }

    // Metadata mirrors the underlying wrapper's.

    pub fn name(&self) -> &str {
        self.target.name()
    }

    pub fn doc(&self) -> Option<&str> {
        self.target.doc()
    }

    pub fn metadata(&self) -> &FnMetadata {
        self.target.metadata()
    }
}

impl AnnotationCapable for BoundFn {
    /// Resolve the wrapped target against the access path and call it:
    /// classmethods receive the owning class, staticmethods nothing,
    /// plain functions the accessing instance (when there is one).
    fn invoke(&self, mut args: Vec<Value>) -> RuntimeResult<Value> {
        match self.target.target() {
            Function::ClassMethod(method) => {
                args.insert(0, Value::Class(self.owner.clone()));
                method.invoke(args)
            }
            Function::StaticMethod(method) => method.invoke(args),
            other => {
                if let Some(receiver) = &self.receiver {
                    args.insert(0, receiver.clone());
                }
                other.invoke(args)
            }
        }
    }

    fn add_annotation(&self, annotation: Rc<dyn Annotation>) {
        self.target.add_annotation(annotation)
    }

    fn get_annotation(&self, kind: TypeId) -> RuntimeResult<Option<Rc<dyn Annotation>>> {
        self.target.get_annotation(kind)
    }

    fn get_annotations(&self, kind: TypeId) -> RuntimeResult<Vec<Rc<dyn Annotation>>> {
        self.target.get_annotations(kind)
    }

    fn get_annotations_by_types(&self, kinds: &[TypeId]) -> RuntimeResult<Vec<Rc<dyn Annotation>>> {
        self.target.get_annotations_by_types(kinds)
    }
}

impl fmt::Debug for BoundFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundFn")
            .field("name", &self.target.name())
            .field("owner", &self.owner.name())
            .field("bound", &self.receiver.is_some())
            .finish()
    }
}
