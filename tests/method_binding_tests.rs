use pretty_assertions::{assert_eq, assert_ne};

use annotable::{
    Annotation, AnnotationCapable, AnnotationExt, AnnotationQuery, Arity, ClassType, Function,
    Instance, RuntimeError, Value,
};

#[derive(Debug)]
struct Traced;
impl Annotation for Traced {}

/// `get_data(self)` — returns the receiver's `data` field.
fn get_data_method() -> Value {
    Value::function("get_data", Arity::Fixed(1), |mut args| {
        match args.remove(0) {
            Value::Instance(instance) => instance.get_attr("data"),
            other => Err(RuntimeError::TypeError {
                expected: "instance".to_string(),
                actual: other.type_name().to_string(),
                operation: "get_data".to_string(),
            }),
        }
    })
}

fn widget_class() -> std::rc::Rc<ClassType> {
    let class = ClassType::new("Widget");
    let get_data = Traced.apply(get_data_method()).unwrap();
    class.set_attr("get_data", get_data);
    class
}

#[test]
fn instance_access_binds_the_receiver() {
    let class = widget_class();
    let instance = Instance::new(class);
    instance.set_field("data", Value::String("test".to_string()));

    let method = instance.get_attr("get_data").unwrap();
    assert!(matches!(method, Value::Function(Function::Bound(_))));

    // The bound view satisfies the annotation contract...
    let capable = method.as_annotation_capable().unwrap();
    assert!(capable.annotation::<Traced>().is_some());

    // ...and calling it supplies the instance as the receiver.
    assert_eq!(method.call(vec![]).unwrap(), Value::String("test".to_string()));
}

#[test]
fn every_access_produces_a_fresh_delegate() {
    let class = widget_class();
    let instance = Instance::new(class);
    instance.set_field("data", Value::Integer(1));

    let first = instance.get_attr("get_data").unwrap();
    let second = instance.get_attr("get_data").unwrap();
    // Distinct delegates over the same wrapper.
    assert_ne!(first, second);
    assert_eq!(first.call(vec![]).unwrap(), second.call(vec![]).unwrap());
}

#[test]
fn class_access_binds_no_receiver() {
    let class = widget_class();
    let unbound = class.get_attr("get_data").unwrap();
    assert!(matches!(unbound, Value::Function(Function::Bound(_))));

    // No receiver is injected; the caller passes one explicitly.
    let instance = Instance::new(widget_class());
    instance.set_field("data", Value::String("explicit".to_string()));
    let result = unbound.call(vec![Value::Instance(instance)]).unwrap();
    assert_eq!(result, Value::String("explicit".to_string()));
}

#[test]
fn classmethod_resolves_against_the_owning_class() {
    let class = ClassType::new("Widget");
    let describe = Value::class_method("describe", Arity::Fixed(1), |mut args| {
        match args.remove(0) {
            Value::Class(owner) => Ok(Value::String(format!("class {}", owner.name()))),
            other => Err(RuntimeError::TypeError {
                expected: "class".to_string(),
                actual: other.type_name().to_string(),
                operation: "describe".to_string(),
            }),
        }
    });
    class.set_attr("describe", Traced.apply(describe).unwrap());

    // Through the class and through an instance: both receive the class.
    let via_class = class.get_attr("describe").unwrap().call(vec![]).unwrap();
    assert_eq!(via_class, Value::String("class Widget".to_string()));

    let instance = Instance::new(class);
    let via_instance = instance.get_attr("describe").unwrap().call(vec![]).unwrap();
    assert_eq!(via_instance, Value::String("class Widget".to_string()));
}

#[test]
fn staticmethod_receives_no_receiver() {
    let class = ClassType::new("Widget");
    let triple = Value::static_method("triple", Arity::Fixed(1), |mut args| {
        let n = args.remove(0).as_integer().unwrap_or(0);
        Ok(Value::Integer(n * 3))
    });
    class.set_attr("triple", Traced.apply(triple).unwrap());

    let instance = Instance::new(class.clone());
    let bound = instance.get_attr("triple").unwrap();
    assert_eq!(bound.call(vec![Value::Integer(7)]).unwrap(), Value::Integer(21));

    let via_class = class.get_attr("triple").unwrap();
    assert_eq!(via_class.call(vec![Value::Integer(2)]).unwrap(), Value::Integer(6));
}

#[test]
fn marker_targets_cannot_be_called_unbound() {
    let marker = Value::class_method("describe", Arity::Fixed(1), |_| Ok(Value::Nil));
    let wrapped = Traced.apply(marker).unwrap();
    let err = wrapped.call(vec![]).unwrap_err();
    assert_eq!(
        err,
        RuntimeError::UnboundMethod {
            function: "describe".to_string(),
            kind: "classmethod",
        }
    );
}

#[test]
fn annotations_added_through_the_delegate_reach_the_wrapper() {
    let class = widget_class();
    let instance = Instance::new(class.clone());
    instance.set_field("data", Value::Nil);

    let method = instance.get_attr("get_data").unwrap();
    let capable = method.as_annotation_capable().unwrap();
    capable.add_annotation(std::rc::Rc::new(Traced));

    // Visible through a later, independent access.
    let again = instance.get_attr("get_data").unwrap();
    let capable = again.as_annotation_capable().unwrap();
    assert_eq!(capable.annotations::<Traced>().len(), 2);
}

#[test]
fn delegate_mirrors_wrapper_metadata() {
    let class = widget_class();
    let instance = Instance::new(class);
    let method = instance.get_attr("get_data").unwrap();
    if let Value::Function(function) = &method {
        assert_eq!(function.name(), "get_data");
    } else {
        panic!("expected a function value");
    }
}

#[test]
fn fields_shadow_class_attributes_and_missing_names_error() {
    let class = widget_class();
    let instance = Instance::new(class);
    instance.set_field("get_data", Value::Integer(42));
    assert_eq!(instance.get_attr("get_data").unwrap(), Value::Integer(42));

    let err = instance.get_attr("nope").unwrap_err();
    assert!(matches!(err, RuntimeError::UnknownAttribute { .. }));
}
