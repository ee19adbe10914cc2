use tinymop::{ClassDef, ObjectError, ObjectSystem, RaisedError, Value};

fn error_class(sys: &mut ObjectSystem, name: &str, parents: &[tinymop::ClassId]) -> tinymop::ClassId {
    let parents = if parents.is_empty() {
        vec![sys.error_class]
    } else {
        parents.to_vec()
    };
    sys.create_class(
        &parents,
        ClassDef::named(name).data("name", Value::Str(name.to_string())),
    )
    .unwrap()
}

#[test]
fn raised_error_matches_every_ancestor() {
    let mut sys = ObjectSystem::new();
    let value_error = error_class(&mut sys, "ValueError", &[]);
    let range_error = error_class(&mut sys, "RangeError", &[value_error]);
    let other = error_class(&mut sys, "IoError", &[]);

    let err = sys.raise(range_error, Some("out of range"));
    let ObjectError::Raised(raised) = err else {
        panic!("expected a raised error, got {err}");
    };
    assert_eq!(raised.name(), "RangeError");
    assert_eq!(raised.message(), "out of range");
    assert_eq!(raised.class(), range_error);
    assert!(raised.is(range_error));
    assert!(raised.is(value_error));
    assert!(raised.is(sys.error_class));
    assert!(raised.is(sys.object_class));
    assert!(!raised.is(other));
}

#[test]
fn default_message_fills_in_when_none_is_given() {
    let mut sys = ObjectSystem::new();
    let parse_error = sys
        .create_class(
            &[sys.error_class],
            ClassDef::named("ParseError")
                .data("name", Value::Str("ParseError".to_string()))
                .data("default_message", Value::Str("malformed input".to_string())),
        )
        .unwrap();

    let ObjectError::Raised(raised) = sys.raise(parse_error, None) else {
        panic!("expected a raised error");
    };
    assert_eq!(raised.message(), "malformed input");
    assert_eq!(format!("{raised}"), "ParseError: malformed input");

    // An explicit message still wins.
    let ObjectError::Raised(raised) = sys.raise(parse_error, Some("line 3")) else {
        panic!("expected a raised error");
    };
    assert_eq!(raised.message(), "line 3");
}

#[test]
fn diamond_error_class_matches_both_branches() {
    let mut sys = ObjectSystem::new();
    let net = error_class(&mut sys, "NetworkError", &[]);
    let timeout = error_class(&mut sys, "TimeoutError", &[]);
    let req = sys
        .create_class(
            &[net, timeout],
            ClassDef::named("RequestTimeout")
                .data("name", Value::Str("RequestTimeout".to_string())),
        )
        .unwrap();

    let ObjectError::Raised(raised) = sys.raise(req, Some("no response")) else {
        panic!("expected a raised error");
    };
    assert!(raised.is(net));
    assert!(raised.is(timeout));
    assert!(raised.is(sys.error_class));
}

#[test]
fn raised_error_behaves_as_a_std_error() {
    let mut sys = ObjectSystem::new();
    let app_error = error_class(&mut sys, "AppError", &[]);
    let raised: Box<dyn std::error::Error> = match sys.raise(app_error, Some("boom")) {
        ObjectError::Raised(r) => Box::new(r),
        other => panic!("expected a raised error, got {other}"),
    };
    assert_eq!(raised.to_string(), "AppError: boom");
    let back = raised.downcast_ref::<RaisedError>().unwrap();
    assert!(back.is(app_error));
    assert!(!back.backtrace().to_string().is_empty());
}

#[test]
fn raised_errors_propagate_with_question_mark() {
    fn guarded(sys: &ObjectSystem, class: tinymop::ClassId, n: i64) -> Result<i64, ObjectError> {
        if n < 0 {
            return Err(sys.raise(class, Some("negative")));
        }
        Ok(n * 2)
    }

    let mut sys = ObjectSystem::new();
    let value_error = error_class(&mut sys, "ValueError", &[]);
    assert_eq!(guarded(&sys, value_error, 4).unwrap(), 8);
    let err = guarded(&sys, value_error, -1).unwrap_err();
    match err {
        ObjectError::Raised(r) => assert!(r.is(value_error)),
        other => panic!("expected a raised error, got {other}"),
    }
}

#[test]
fn raising_a_non_error_class_is_rejected() {
    let mut sys = ObjectSystem::new();
    let plain = sys.create_class(&[], ClassDef::named("Plain")).unwrap();
    let err = sys.raise(plain, Some("nope"));
    assert!(matches!(err, ObjectError::InvalidArgument(_)));
}

#[test]
fn error_initializers_cooperate_like_any_other() {
    let mut sys = ObjectSystem::new();
    let http_error = sys
        .create_class(
            &[sys.error_class],
            ClassDef::named("HttpError")
                .data("name", Value::Str("HttpError".to_string()))
                .init(|sys, this, sup, args| {
                    this.set_field("status", Value::Int(503));
                    // Pass the message through to the base initializer.
                    sup.call(sys, this, args)
                }),
        )
        .unwrap();

    let inst = sys
        .construct(http_error, &[Value::Str("unavailable".to_string())])
        .unwrap();
    assert_eq!(inst.field("status"), Some(&Value::Int(503)));
    assert_eq!(
        inst.field("message"),
        Some(&Value::Str("unavailable".to_string()))
    );

    let ObjectError::Raised(raised) = sys.raise(http_error, Some("unavailable")) else {
        panic!("expected a raised error");
    };
    assert_eq!(format!("{raised}"), "HttpError: unavailable");
}

#[test]
fn display_without_message_is_just_the_name() {
    let mut sys = ObjectSystem::new();
    let bare = error_class(&mut sys, "BareError", &[]);
    let ObjectError::Raised(raised) = sys.raise(bare, None) else {
        panic!("expected a raised error");
    };
    assert_eq!(format!("{raised}"), "BareError");
}
