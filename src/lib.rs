//! Queryable annotations for function values.
//!
//! A function value wrapped into an [`AnnotableFn`] carries an ordered
//! list of [`Annotation`] markers and can still be decorated by
//! ordinary higher-order decorators without losing them: decorators run
//! through the [`annotation_compatible`] adapters replace the wrapped
//! target in place instead of hiding the wrapper. When an annotable
//! function is stored on a [`ClassType`] and accessed through an
//! instance or the class, attribute lookup produces a [`BoundFn`]
//! delegate that reproduces receiver binding for plain methods,
//! classmethods, and staticmethods, and forwards every annotation
//! query to the wrapper.
//!
//! Queries report most-recent-first: the latest-attached annotation
//! (the outermost in decoration order) comes before earlier ones.
//!
//! ```
//! use annotable::{Annotation, AnnotationExt, AnnotationQuery, Arity, Value};
//!
//! #[derive(Debug)]
//! struct Traced;
//! impl Annotation for Traced {}
//!
//! let double = Value::function("double", Arity::Fixed(1), |mut args| {
//!     let n = args.remove(0).as_integer().unwrap_or(0);
//!     Ok(Value::Integer(n * 2))
//! });
//! let double = Traced.apply(double).unwrap();
//!
//! assert_eq!(double.call(vec![Value::Integer(21)]).unwrap(), Value::Integer(42));
//! let capable = double.as_annotation_capable().unwrap();
//! assert!(capable.annotation::<Traced>().is_some());
//! ```

pub mod annotable;
pub mod annotation;
pub mod binding;
pub mod class;
pub mod compat;
pub mod error;
pub mod values;

pub use annotable::{convert_to_annotable, AnnotableFn, FnMetadata};
pub use annotation::{
    apply_annotation, Annotation, AnnotationCapable, AnnotationExt, AnnotationQuery,
    AnnotationType,
};
pub use binding::BoundFn;
pub use class::{ClassType, Instance};
pub use compat::{annotation_compatible, annotation_compatible_ex};
pub use error::{RuntimeError, RuntimeResult};
pub use values::{Arity, BuiltinFunction, Function, Value};
