use pretty_assertions::assert_eq;
use protoform_builder::{
    build, build_from, build_from_with_config, BuildError, BuildResult, Builder, BuilderConfig,
    FieldResolver,
};
use protoform_model::{
    DescriptorPool, FieldDescriptor, Message, MessageSchema, MessageType, ScalarType, Value,
};
use serde_json::json;
use std::collections::BTreeMap;

fn person() -> MessageType {
    DescriptorPool::new(vec![
        MessageSchema::new(
            "api.Person",
            vec![
                FieldDescriptor::string("name"),
                FieldDescriptor::message("friends", "api.Person").repeated(),
                FieldDescriptor::message("best_friend", "api.Person"),
                FieldDescriptor::message("field_mask", "api.FieldMask"),
                FieldDescriptor::map("favourite_foods", ScalarType::String),
                FieldDescriptor::message("logo", "api.Asset"),
                FieldDescriptor::bool("boolean_me"),
                FieldDescriptor::int64("age"),
            ],
        ),
        MessageSchema::new(
            "api.FieldMask",
            vec![FieldDescriptor::string("paths").repeated()],
        ),
        MessageSchema::new(
            "api.Asset",
            vec![FieldDescriptor::string("url"), FieldDescriptor::string("url_2x")],
        ),
    ])
    .unwrap()
    .message_type("api.Person")
    .unwrap()
}

fn friend_names(m: &Message) -> Vec<String> {
    m.get_repeated("friends")
        .unwrap()
        .iter()
        .map(|f| f.as_message().unwrap().get_str("name").unwrap().to_string())
        .collect()
}

fn int(v: Option<&Value>) -> i64 {
    v.and_then(Value::as_scalar).and_then(|s| s.as_i64()).unwrap()
}

// ── Scenario ─────────────────────────────────────────────────────

#[test]
fn person_scenario() {
    let person = build(&person(), |pb| {
        pb.set("name", vec![Value::from("Ada")], None)?;

        let mut block = |pb: &mut Builder<'_>, n: Option<&Value>| {
            pb.set("name", vec![Value::from(format!("F{}", int(n)))], None)
        };
        pb.set(
            "friends",
            vec![Value::sequence([1i64, 2])],
            Some(&mut block),
        )?;

        pb.set(
            "favourite_foods",
            vec![Value::mapping([("a", "b")])],
            None,
        )
    })
    .unwrap();

    assert_eq!(person.get_str("name"), Some("Ada"));
    assert_eq!(friend_names(&person), vec!["F1", "F2"]);
    assert_eq!(
        person.get_map_entry("favourite_foods", "a").unwrap(),
        Some(&Value::from("b"))
    );
}

#[test]
fn unknown_field_is_rejected() {
    let mut m = person().new_instance();
    let err = Builder::new(&mut m)
        .set("missing_field", vec![Value::from("x")], None)
        .unwrap_err();
    assert!(matches!(
        err,
        BuildError::UnknownField { message_type, field }
            if message_type == "api.Person" && field == "missing_field"
    ));
}

#[test]
fn block_on_scalar_is_rejected() {
    let mut m = person().new_instance();
    let mut block = |_: &mut Builder<'_>, _: Option<&Value>| -> BuildResult<()> { Ok(()) };
    let err = Builder::new(&mut m)
        .set("name", Vec::new(), Some(&mut block))
        .unwrap_err();
    assert!(matches!(err, BuildError::InvalidBlockUsage { field } if field == "name"));
}

// ── Building people ──────────────────────────────────────────────

#[test]
fn builds_a_person() {
    let person = build(&person(), |pb| {
        pb.set_value("name", "Hello world")?;
        pb.set_each("friends", 1i64..=3, |pb, n| {
            pb.set_value("name", format!("Friend #{}", int(Some(n))))
        })?;
        pb.set_nested("best_friend", |pb| pb.set_value("name", "Manuelo"))?;
        pb.set_nested("field_mask", |pb| {
            pb.set_value("paths", vec!["ok", "that's"])?;
            pb.set_value("paths", "cool")
        })?;
        pb.set_value(
            "favourite_foods",
            Value::mapping([
                ("Breakfast", "Eggs"),
                ("Lunch", "Shawarma"),
                ("Dinner", "Pizza"),
            ]),
        )
    })
    .unwrap();

    assert_eq!(person.get_str("name"), Some("Hello world"));
    assert_eq!(
        friend_names(&person),
        vec!["Friend #1", "Friend #2", "Friend #3"]
    );
    let mask = person.get_message("field_mask").unwrap().unwrap();
    assert_eq!(mask.get_repeated("paths").unwrap(), &[Value::from("cool")]);
    let best = person.get_message("best_friend").unwrap().unwrap();
    assert_eq!(best.get_str("name"), Some("Manuelo"));
    assert_eq!(
        person.get_map_entry("favourite_foods", "Breakfast").unwrap(),
        Some(&Value::from("Eggs"))
    );
}

#[test]
fn prefab_messages_are_assigned() {
    let ty = person();
    let max = build(&ty, |pb| pb.set_value("name", "Max Verstappen")).unwrap();
    let james = build(&ty, |pb| pb.set_value("name", "James Hunt")).unwrap();

    let person = build(&ty, |pb| {
        pb.set_value("name", "Niki Lauda")?;
        pb.set_value("friends", vec![max.clone(), james.clone()])?;
        pb.set_value("best_friend", james.clone())
    })
    .unwrap();

    assert_eq!(friend_names(&person), vec!["Max Verstappen", "James Hunt"]);
    assert_eq!(person.get_message("best_friend").unwrap(), Some(&james));
}

#[test]
fn repeated_messages_from_mappings() {
    let person = build(&person(), |pb| {
        pb.set_value(
            "friends",
            vec![Value::mapping([("name", "A")]), Value::mapping([("name", "B")])],
        )
    })
    .unwrap();
    assert_eq!(friend_names(&person), vec!["A", "B"]);
}

#[test]
fn repeated_assignment_replaces_previous_contents() {
    let first = build(&person(), |pb| {
        pb.set_nested("field_mask", |pb| pb.set_value("paths", vec!["ok", "that's"]))
    })
    .unwrap();

    let mut again = first.clone();
    Builder::new(&mut again)
        .set_nested("field_mask", |pb| pb.set_value("paths", vec!["ok", "that's"]))
        .unwrap();

    let mask = again.get_message("field_mask").unwrap().unwrap();
    assert_eq!(
        mask.get_repeated("paths").unwrap(),
        &[Value::from("ok"), Value::from("that's")]
    );
}

#[test]
fn callback_children_are_appended() {
    let mut m = person().new_instance();
    let mut pb = Builder::new(&mut m);
    pb.set_each("friends", ["A"], |pb, n| pb.set_value("name", n.clone()))
        .unwrap();
    pb.set_each("friends", ["B", "C"], |pb, n| pb.set_value("name", n.clone()))
        .unwrap();
    assert_eq!(friend_names(&m), vec!["A", "B", "C"]);
}

#[test]
fn singular_scope_builds_incrementally() {
    let person = build(&person(), |pb| {
        pb.set_nested("best_friend", |pb| pb.set_value("name", "Manuelo"))?;
        pb.set_nested("best_friend", |pb| pb.set_value("age", 30i64))
    })
    .unwrap();
    let best = person.get_message("best_friend").unwrap().unwrap();
    assert_eq!(best.get_str("name"), Some("Manuelo"));
    assert_eq!(best.get_i64("age"), Some(30));
}

#[test]
fn deeply_nested_scopes() {
    let person = build(&person(), |pb| {
        pb.set_nested("best_friend", |pb| {
            pb.set_value("name", "Max Verstappen")?;
            pb.set_nested("logo", |pb| {
                pb.set_value("url", "https://google.com/image.jpg")?;
                pb.set_value("url_2x", "https://google.com/image.jpg")
            })
        })
    })
    .unwrap();
    let logo = person
        .get_message("best_friend")
        .unwrap()
        .unwrap()
        .get_message("logo")
        .unwrap()
        .unwrap();
    assert_eq!(logo.get_str("url_2x"), Some("https://google.com/image.jpg"));
}

// ── Arity ────────────────────────────────────────────────────────

#[test]
fn repeated_block_needs_exactly_one_collection() {
    let mut m = person().new_instance();
    let mut block = |_: &mut Builder<'_>, _: Option<&Value>| -> BuildResult<()> { Ok(()) };
    let err = Builder::new(&mut m)
        .set("friends", Vec::new(), Some(&mut block))
        .unwrap_err();
    assert!(matches!(err, BuildError::ArityMismatch { found: 0, .. }));

    let err = Builder::new(&mut m)
        .set("friends", vec![Value::from("x")], Some(&mut block))
        .unwrap_err();
    assert!(matches!(err, BuildError::ExpectedCollection { found: "string", .. }));
}

#[test]
fn singular_block_takes_no_arguments() {
    let mut m = person().new_instance();
    let mut block = |_: &mut Builder<'_>, _: Option<&Value>| -> BuildResult<()> { Ok(()) };
    let err = Builder::new(&mut m)
        .set("best_friend", vec![Value::from("x")], Some(&mut block))
        .unwrap_err();
    assert!(matches!(err, BuildError::ArityMismatch { found: 1, .. }));
}

#[test]
fn set_without_arguments_marks_singular_message_present() {
    let mut m = person().new_instance();
    Builder::new(&mut m).set("best_friend", Vec::new(), None).unwrap();
    let best = m.get_message("best_friend").unwrap().unwrap();
    assert_eq!(best.get_str("name"), None);
}

#[test]
fn set_without_arguments_keeps_existing_child() {
    let mut m = person().new_instance();
    let mut pb = Builder::new(&mut m);
    pb.set_nested("logo", |pb| pb.set_value("url", "a.png")).unwrap();
    pb.set("logo", Vec::new(), None).unwrap();
    let logo = m.get_message("logo").unwrap().unwrap();
    assert_eq!(logo.get_str("url"), Some("a.png"));
}

#[test]
fn set_without_arguments_on_scalar_is_block_misuse() {
    let mut m = person().new_instance();
    let err = Builder::new(&mut m).set("name", Vec::new(), None).unwrap_err();
    assert!(matches!(err, BuildError::InvalidBlockUsage { ref field } if field == "name"));
}

#[test]
fn set_without_arguments_on_repeated_needs_collection() {
    let mut m = person().new_instance();
    let err = Builder::new(&mut m).set("friends", Vec::new(), None).unwrap_err();
    assert!(matches!(err, BuildError::ExpectedCollection { ref field, .. } if field == "friends"));
    assert!(m.get_repeated("friends").unwrap().is_empty());
}

// ── Partial failure ──────────────────────────────────────────────

#[test]
fn failing_callback_keeps_earlier_mutations() {
    let mut m = person().new_instance();
    let mut pb = Builder::new(&mut m);
    pb.set_value("name", "kept").unwrap();
    let err = pb
        .set_each("friends", [1i64, 2], |pb, n| {
            if int(Some(n)) == 2 {
                pb.set_value("nope", "x")
            } else {
                pb.set_value("name", "one")
            }
        })
        .unwrap_err();
    assert!(matches!(err, BuildError::UnknownField { .. }));
    assert_eq!(m.get_str("name"), Some("kept"));
    assert!(m.get_repeated("friends").unwrap().is_empty());
}

// ── Extraction ───────────────────────────────────────────────────

#[test]
fn extract_shorthand_on_repeated_and_singular() {
    let friends = Value::sequence([
        Value::mapping([("name", "Friend 1")]),
        Value::mapping([("name", "Friend 2")]),
    ]);
    let first = Value::mapping([("name", "Friend 1")]);

    let person = build(&person(), |pb| {
        pb.set_value("name", "Hello world")?;
        pb.set("friends", vec![friends.clone(), Value::from("name")], None)?;
        pb.set_extract("best_friend", first.clone(), &["name"])
    })
    .unwrap();

    assert_eq!(person.get_str("name"), Some("Hello world"));
    assert_eq!(friend_names(&person), vec!["Friend 1", "Friend 2"]);
    let best = person.get_message("best_friend").unwrap().unwrap();
    assert_eq!(best.get_str("name"), Some("Friend 1"));
}

#[test]
fn extract_copies_only_named_fields() {
    let source = json!({"name": "Ada", "age": 36, "boolean_me": true});
    let mut m = person().new_instance();
    Builder::new(&mut m).extract(&source, &["name", "age"]).unwrap();
    assert_eq!(m.get_str("name"), Some("Ada"));
    assert_eq!(m.get_i64("age"), Some(36));
    assert_eq!(m.get_bool("boolean_me"), Some(false));
}

#[test]
fn extract_unknown_field_fails() {
    let source = json!({"name": "Ada", "shoe_size": 9});
    let mut m = person().new_instance();
    let err = Builder::new(&mut m)
        .extract(&source, &["name", "shoe_size"])
        .unwrap_err();
    assert!(matches!(err, BuildError::UnknownField { field, .. } if field == "shoe_size"));
    assert_eq!(m.get_str("name"), Some("Ada"));
}

#[test]
fn extract_missing_attribute_fails() {
    let mut source = BTreeMap::new();
    source.insert("name".to_string(), Value::from("Ada"));
    let mut m = person().new_instance();
    let err = Builder::new(&mut m)
        .extract(&source, &["age"])
        .unwrap_err();
    assert!(matches!(err, BuildError::MissingAttribute { attribute } if attribute == "age"));
}

#[test]
fn extract_from_another_message() {
    let ty = person();
    let source = build(&ty, |pb| {
        pb.set_value("name", "Source")?;
        pb.set_value("age", 7i64)
    })
    .unwrap();
    let copy = build(&ty, |pb| pb.extract(&source, &["name", "age"])).unwrap();
    assert_eq!(copy.get_str("name"), Some("Source"));
    assert_eq!(copy.get_i64("age"), Some(7));
}

#[test]
fn extract_each_builds_one_child_per_element() {
    let sources = vec![json!({"name": "A"}), json!({"name": "B"})];
    let person = build(&person(), |pb| pb.extract_each("friends", &sources, &["name"])).unwrap();
    assert_eq!(friend_names(&person), vec!["A", "B"]);
}

#[test]
fn extract_shorthand_on_scalar_is_block_misuse() {
    let mut m = person().new_instance();
    let err = Builder::new(&mut m)
        .set_extract("name", Value::mapping([("name", "x")]), &["name"])
        .unwrap_err();
    assert!(matches!(err, BuildError::InvalidBlockUsage { .. }));
}

#[test]
fn extract_names_must_be_strings() {
    let mut m = person().new_instance();
    let err = Builder::new(&mut m)
        .set(
            "best_friend",
            vec![Value::mapping([("name", "x")]), Value::from(1i64)],
            None,
        )
        .unwrap_err();
    assert!(matches!(err, BuildError::InvalidAttributeName { found: "int" }));
}

// ── Helpers ──────────────────────────────────────────────────────

#[test]
fn new_child_for_returns_empty_nested_instance() {
    let mut m = person().new_instance();
    let pb = Builder::new(&mut m);
    let logo = pb.new_child_for("logo").unwrap();
    assert_eq!(logo.type_name(), "api.Asset");
    assert!(matches!(
        pb.new_child_for("missing").unwrap_err(),
        BuildError::UnknownField { .. }
    ));
}

#[test]
fn prefab_from_new_child_for_is_accepted() {
    let person = build(&person(), |pb| {
        let mut logo = pb.new_child_for("logo")?;
        logo.set("url", Value::from("u"))?;
        pb.set_value("logo", logo)
    })
    .unwrap();
    let logo = person.get_message("logo").unwrap().unwrap();
    assert_eq!(logo.get_str("url"), Some("u"));
}

#[test]
fn has_field_reports_schema_membership() {
    let mut m = person().new_instance();
    let pb = Builder::new(&mut m);
    assert!(pb.has_field("best_friend"));
    assert!(!pb.has_field("worst_enemy"));
}

#[test]
fn target_is_the_root_message() {
    let mut m = person().new_instance();
    let mut pb = Builder::new(&mut m);
    pb.set_value("name", "root").unwrap();
    assert_eq!(pb.target().get_str("name"), Some("root"));
}

#[test]
fn build_from_starts_with_payload() {
    let ty = person();
    let payload = Value::mapping([("name", Value::from("Ren")), ("age", Value::from(3i64))]);
    let person = build_from(&ty, &payload, |pb| pb.set_value("age", 4i64)).unwrap();
    assert_eq!(person.get_str("name"), Some("Ren"));
    assert_eq!(person.get_i64("age"), Some(4));
}

#[test]
fn build_from_with_config_applies_depth_limit() {
    let ty = person();
    let payload = Value::mapping([("name", Value::from("Ren"))]);
    let config = BuilderConfig {
        max_depth: 0,
        ..BuilderConfig::default()
    };
    let err = build_from_with_config(&ty, config, &payload, |pb| {
        pb.set_nested("best_friend", |_| Ok(()))
    })
    .unwrap_err();
    assert!(matches!(err, BuildError::DepthExceeded { max_depth: 0 }));

    let person = build_from_with_config(&ty, BuilderConfig::default(), &payload, |pb| {
        pb.set_nested("best_friend", |pb| pb.set_value("name", "Kai"))
    })
    .unwrap();
    assert_eq!(person.get_str("name"), Some("Ren"));
}

#[test]
fn resolver_sees_nested_scope_type() {
    build(&person(), |pb| {
        pb.set_nested("logo", |pb| {
            let field = FieldResolver::resolve(pb.target(), "url_2x")?;
            assert!(!field.is_repeated());
            assert!(FieldResolver::resolve(pb.target(), "name").is_err());
            Ok(())
        })
    })
    .unwrap();
}
