// Annotation markers, the kind registry, and the capability contract
// shared by the wrapper and its binding delegate.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;
use std::sync::Mutex;

use lazy_static::lazy_static;

use crate::annotable::convert_to_annotable;
use crate::error::{RuntimeError, RuntimeResult};
use crate::values::{Function, Value};

/// Marker trait for metadata attachable to a function value.
///
/// Consumers implement this on their own types; a pure marker with no
/// fields and no overridden methods is valid. Instances are treated as
/// immutable once attached.
pub trait Annotation: Any + fmt::Debug {
    /// Human-readable kind name, used in logs and the kind registry.
    fn kind_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

impl dyn Annotation {
    /// Whether the concrete type of this annotation is `T`.
    pub fn is<T: Annotation>(&self) -> bool {
        self.type_id() == TypeId::of::<T>()
    }

    pub fn downcast_ref<T: Annotation>(&self) -> Option<&T> {
        (self as &dyn Any).downcast_ref::<T>()
    }
}

lazy_static! {
    // Kinds seen so far, plus the base kind that matches every annotation.
    // Names only; used to reject queries for types that are not
    // annotation kinds at all.
    static ref ANNOTATION_KINDS: Mutex<HashMap<TypeId, &'static str>> = {
        let mut kinds = HashMap::new();
        kinds.insert(TypeId::of::<dyn Annotation>(), "Annotation");
        Mutex::new(kinds)
    };
}

pub(crate) fn register_kind(id: TypeId, name: &'static str) {
    ANNOTATION_KINDS
        .lock()
        .expect("annotation kind registry poisoned")
        .entry(id)
        .or_insert(name);
}

pub(crate) fn register_kind_of(annotation: &dyn Annotation) {
    register_kind(annotation.type_id(), annotation.kind_name());
}

pub(crate) fn ensure_kind(kind: TypeId) -> RuntimeResult<()> {
    if ANNOTATION_KINDS
        .lock()
        .expect("annotation kind registry poisoned")
        .contains_key(&kind)
    {
        Ok(())
    } else {
        Err(RuntimeError::InvalidAnnotationType { type_id: kind })
    }
}

/// Whether `annotation` matches a query for `kind`. The base kind
/// matches everything, mirroring a query by the root annotation type.
pub(crate) fn matches_kind(annotation: &dyn Annotation, kind: TypeId) -> bool {
    kind == TypeId::of::<dyn Annotation>() || annotation.type_id() == kind
}

/// Checked annotation type token. Only constructible for types that
/// implement [`Annotation`], so a token in hand is always a valid kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnnotationType {
    id: TypeId,
    name: &'static str,
}

impl AnnotationType {
    pub fn of<T: Annotation>() -> Self {
        let id = TypeId::of::<T>();
        let name = std::any::type_name::<T>();
        register_kind(id, name);
        Self { id, name }
    }

    /// The base kind: a query with it returns every attached annotation.
    pub fn base() -> Self {
        Self {
            id: TypeId::of::<dyn Annotation>(),
            name: "Annotation",
        }
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

/// Contract satisfied by anything that carries annotations: the wrapper
/// itself and the binding delegates it produces. Query code written
/// against this trait cannot tell the two apart.
///
/// All query forms report most-recent-first: the latest-attached
/// (outermost in decoration order) annotation comes before earlier ones.
pub trait AnnotationCapable {
    fn invoke(&self, args: Vec<Value>) -> RuntimeResult<Value>;

    fn add_annotation(&self, annotation: Rc<dyn Annotation>);

    /// The most recently attached annotation of `kind`, if any.
    fn get_annotation(&self, kind: TypeId) -> RuntimeResult<Option<Rc<dyn Annotation>>>;

    /// Every attached annotation of `kind`, most-recent-first.
    fn get_annotations(&self, kind: TypeId) -> RuntimeResult<Vec<Rc<dyn Annotation>>>;

    /// Union filter over several kinds, most-recent-first, relative
    /// order among matches preserved.
    fn get_annotations_by_types(&self, kinds: &[TypeId]) -> RuntimeResult<Vec<Rc<dyn Annotation>>>;
}

/// Typed query sugar over [`AnnotationCapable`]. The kind is taken from
/// the type parameter, so an invalid kind cannot be expressed.
pub trait AnnotationQuery: AnnotationCapable {
    fn annotation<T: Annotation>(&self) -> Option<Rc<T>> {
        let kind = AnnotationType::of::<T>();
        match self.get_annotation(kind.id()) {
            Ok(found) => found.and_then(downcast_rc::<T>),
            Err(_) => None,
        }
    }

    fn annotations<T: Annotation>(&self) -> Vec<Rc<T>> {
        let kind = AnnotationType::of::<T>();
        match self.get_annotations(kind.id()) {
            Ok(found) => found.into_iter().filter_map(downcast_rc::<T>).collect(),
            Err(_) => Vec::new(),
        }
    }
}

impl<C: AnnotationCapable + ?Sized> AnnotationQuery for C {}

fn downcast_rc<T: Annotation>(annotation: Rc<dyn Annotation>) -> Option<Rc<T>> {
    let any: Rc<dyn Any> = annotation;
    any.downcast::<T>().ok()
}

/// Attach an annotation to a function value, wrapping the value into an
/// annotable function first when necessary. Returns the (possibly newly
/// wrapped) function value.
pub fn apply_annotation(annotation: Rc<dyn Annotation>, target: Value) -> RuntimeResult<Value> {
    let annotable = convert_to_annotable(target)?;
    log::trace!(
        "[annotation] applying {} to '{}'",
        annotation.kind_name(),
        annotable.name()
    );
    annotable.add_annotation(annotation);
    Ok(Value::Function(Function::Annotable(annotable)))
}

/// Decoration-time entry point: `MyAnnotation.apply(func)`.
pub trait AnnotationExt: Annotation + Sized {
    fn apply(self, target: Value) -> RuntimeResult<Value> {
        apply_annotation(Rc::new(self), target)
    }
}

impl<T: Annotation> AnnotationExt for T {}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Marker;
    impl Annotation for Marker {}

    #[derive(Debug)]
    struct Other;
    impl Annotation for Other {}

    #[test]
    fn kind_tokens_register_kinds() {
        let kind = AnnotationType::of::<Marker>();
        assert!(ensure_kind(kind.id()).is_ok());
        assert!(kind.name().contains("Marker"));
    }

    #[test]
    fn unknown_kinds_are_rejected() {
        let err = ensure_kind(TypeId::of::<String>()).unwrap_err();
        assert!(matches!(err, RuntimeError::InvalidAnnotationType { .. }));
    }

    #[test]
    fn base_kind_matches_everything() {
        let marker: Rc<dyn Annotation> = Rc::new(Marker);
        assert!(matches_kind(marker.as_ref(), AnnotationType::base().id()));
        assert!(matches_kind(marker.as_ref(), TypeId::of::<Marker>()));
        assert!(!matches_kind(marker.as_ref(), TypeId::of::<Other>()));
    }

    #[test]
    fn dyn_downcast() {
        let marker: Rc<dyn Annotation> = Rc::new(Marker);
        assert!(marker.is::<Marker>());
        assert!(!marker.is::<Other>());
        assert!(marker.downcast_ref::<Marker>().is_some());
    }
}
