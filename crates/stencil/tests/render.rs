//! End-to-end rendering behavior.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use stencil::{
    parse, parse_count, render, render_data, render_data_with_partials, render_with,
    Delimiters, ParseError, RenderConfig, RenderError, Value, ValueMap,
};

fn object(pairs: &[(&str, Value)]) -> Value {
    Value::Object(pairs.iter().map(|(k, v)| (*k, v.clone())).collect())
}

#[test]
fn templates_without_tags_render_verbatim() {
    let out = render("no tags here, just text & <markup>", &Value::Null).unwrap();
    assert_eq!(out, "no tags here, just text & <markup>");
}

#[test]
fn variables_are_html_escaped_unless_raw() {
    let view = object(&[("x", Value::from("<a href=\"/\">&'`</a>"))]);
    assert_eq!(
        render("{{x}}", &view).unwrap(),
        "&lt;a href&#x3D;&quot;&#x2F;&quot;&gt;&amp;&#39;&#x60;&lt;&#x2F;a&gt;"
    );
    assert_eq!(render("{{{x}}}", &view).unwrap(), "<a href=\"/\">&'`</a>");
    assert_eq!(render("{{&x}}", &view).unwrap(), "<a href=\"/\">&'`</a>");
}

#[test]
fn sections_follow_loose_truthiness() {
    for (value, expected) in [
        (Value::Bool(true), "on"),
        (Value::Bool(false), ""),
        (Value::Null, ""),
        (Value::Number(0.0), ""),
        (Value::Number(1.0), "on"),
        (Value::from(""), ""),
        (Value::from("x"), "on"),
    ] {
        let view = object(&[("flag", value)]);
        assert_eq!(render("{{#flag}}on{{/flag}}", &view).unwrap(), expected);
    }
    // Missing name entirely.
    assert_eq!(render("{{#flag}}on{{/flag}}", &object(&[])).unwrap(), "");
}

#[test]
fn array_sections_iterate_in_order() {
    let view = object(&[("n", Value::from(vec![1, 2, 3]))]);
    assert_eq!(render("{{#n}}{{.}},{{/n}}", &view).unwrap(), "1,2,3,");
}

#[test]
fn empty_arrays_render_nothing_and_fire_inverted() {
    let view = object(&[("n", Value::Array(vec![]))]);
    assert_eq!(render("{{#n}}x{{/n}}", &view).unwrap(), "");
    assert_eq!(render("{{^n}}empty{{/n}}", &view).unwrap(), "empty");
}

#[test]
fn lookups_walk_the_scope_chain() {
    let view = object(&[
        ("site", Value::from("home")),
        (
            "user",
            object(&[("name", Value::from("ada")), ("site", Value::from("blog"))]),
        ),
    ]);
    assert_eq!(
        render("{{#user}}{{name}}@{{site}}{{/user}}", &view).unwrap(),
        "ada@blog"
    );
    // Not shadowed: falls through to the root.
    assert_eq!(
        render("{{#user}}{{name}}@{{site}}{{/user}} {{site}}", &view).unwrap(),
        "ada@blog home"
    );
}

#[test]
fn dotted_paths_descend_and_retry_outward() {
    let view = object(&[(
        "a",
        object(&[("b", object(&[("c", Value::from("deep"))]))]),
    )]);
    assert_eq!(render("{{a.b.c}}", &view).unwrap(), "deep");
    assert_eq!(render("{{a.b.missing}}", &view).unwrap(), "");
}

#[test]
fn dot_prefixed_lookups_never_walk_to_the_parent() {
    let view = object(&[
        ("flag", Value::from("set")),
        ("inner", object(&[("local", Value::from("here"))])),
    ]);
    // `flag` lives on the parent: a plain lookup finds it, a
    // dot-prefixed one does not.
    // The angle brackets are template text, appended verbatim; only the
    // interpolated value would be escaped.
    assert_eq!(
        render("{{#inner}}<{{flag}}>{{/inner}}", &view).unwrap(),
        "<set>"
    );
    assert_eq!(
        render("{{#inner}}{{#.flag}}Y{{/.flag}}{{/inner}}", &view).unwrap(),
        ""
    );
    assert_eq!(
        render("{{#inner}}{{.local}}{{/inner}}", &view).unwrap(),
        "here"
    );
}

#[test]
fn dot_prefixed_lookups_prefer_the_shadowed_local() {
    let view = object(&[
        ("b", Value::from(2)),
        ("a", object(&[("b", Value::from(1))])),
    ]);
    assert_eq!(render("{{#a}}{{.b}}{{/a}}", &view).unwrap(), "1");
    assert_eq!(render("{{#a}}{{b}}{{/a}}", &view).unwrap(), "1");
    assert_eq!(render("{{b}}", &view).unwrap(), "2");
}

#[test]
fn partials_recurse_through_nested_data() {
    let mut partials: HashMap<&str, &str> = HashMap::new();
    partials.insert("node", "{{name}}({{#children}}{{>node}}{{/children}})");

    #[derive(Serialize)]
    struct Node {
        name: String,
        children: Vec<Node>,
    }
    let tree = Node {
        name: "root".into(),
        children: vec![Node {
            name: "leaf".into(),
            children: vec![],
        }],
    };
    assert_eq!(
        render_data_with_partials("{{>node}}", &tree, &partials).unwrap(),
        "root(leaf())"
    );
}

#[test]
fn mismatched_section_close_names_the_closer() {
    let err = render("{{#a}}x{{/b}}", &Value::Null).unwrap_err();
    let RenderError::Parse(ParseError::SectionMismatch { open, close, .. }) = err else {
        panic!("expected a section mismatch, got {err:?}");
    };
    assert_eq!(open, "a");
    assert_eq!(close, "b");
}

#[test]
fn unterminated_tags_are_parse_errors() {
    let err = render("before {{oops", &Value::Null).unwrap_err();
    assert!(matches!(
        err,
        RenderError::Parse(ParseError::UnclosedTag { .. })
    ));
}

#[test]
fn delimiters_can_change_mid_template() {
    let view = object(&[("x", Value::from("v"))]);
    assert_eq!(
        render("{{x}} {{=<% %>=}}<% x %> {{x}}", &view).unwrap(),
        "v v {{x}}"
    );
}

#[test]
fn initial_delimiters_come_from_config() {
    let config = RenderConfig {
        tags: Some(Delimiters::new("[[", "]]")),
    };
    let view = object(&[("x", Value::from("v"))]);
    assert_eq!(
        render_with("[[x]] {{x}}", &view, &(), &config).unwrap(),
        "v {{x}}"
    );
}

#[test]
fn lambdas_see_raw_text_and_can_sub_render() {
    let view = object(&[
        ("who", Value::from("world")),
        (
            "shout",
            Value::lambda(|raw, sub| {
                assert_eq!(raw, "hi {{who}}");
                Some(sub(raw).ok()?.to_uppercase())
            }),
        ),
    ]);
    assert_eq!(
        render("{{#shout}}hi {{who}}{{/shout}}", &view).unwrap(),
        "HI WORLD"
    );
}

#[test]
fn render_data_serializes_plain_structs() {
    #[derive(Serialize)]
    struct View {
        title: String,
        tags: Vec<String>,
        draft: bool,
    }
    let view = View {
        title: "Post".into(),
        tags: vec!["a".into(), "b".into()],
        draft: false,
    };
    let out = render_data(
        "{{title}}: {{#tags}}#{{.}} {{/tags}}{{^draft}}(live){{/draft}}",
        &view,
    )
    .unwrap();
    assert_eq!(out, "Post: #a #b (live)");
}

#[test]
fn object_iteration_with_the_iter_marker() {
    let view = object(&[(
        "counts",
        object(&[("a", Value::from(1)), ("b", Value::from(2))]),
    )]);
    assert_eq!(
        render("{{#.counts|iter}}{{key}}={{value}};{{/.counts|iter}}", &view).unwrap(),
        "a=1;b=2;"
    );
}

#[test]
fn rendering_does_not_mutate_the_view() {
    let view = object(&[("n", Value::from(vec![1, 2]))]);
    let before = format!("{view:?}");
    render("{{#n}}{{.}}{{/n}}", &view).unwrap();
    assert_eq!(format!("{view:?}"), before);
}

// Cache assertions live in one test: clear_cache here while other
// tests run concurrently would only cause them to reparse, but their
// parses must not land between this test's own pointer checks.
#[test]
fn repeated_renders_reuse_the_cached_parse() {
    let template = "cache-probe {{x}} {{#s}}{{.}}{{/s}}";
    let before = parse_count();
    let first = parse(template, None).unwrap();
    assert!(parse_count() > before);
    let second = parse(template, None).unwrap();
    assert!(Arc::ptr_eq(&first, &second));

    let view = object(&[("x", Value::from(1)), ("s", Value::from(vec![2]))]);
    let a = render(template, &view).unwrap();
    let b = render(template, &view).unwrap();
    assert_eq!(a, b);
    assert!(Arc::ptr_eq(&first, &parse(template, None).unwrap()));
}

#[test]
fn thunks_evaluate_lazily_and_once_per_render() {
    use std::sync::atomic::{AtomicUsize, Ordering};
    static CALLS: AtomicUsize = AtomicUsize::new(0);

    let view = object(&[(
        "lazy",
        Value::thunk(|| {
            CALLS.fetch_add(1, Ordering::SeqCst);
            Value::from("computed")
        }),
    )]);
    assert_eq!(
        render("{{lazy}} and {{lazy}}", &view).unwrap(),
        "computed and computed"
    );
    assert_eq!(CALLS.load(Ordering::SeqCst), 1);

    // Untouched thunks never run.
    assert_eq!(render("static", &view).unwrap(), "static");
    assert_eq!(CALLS.load(Ordering::SeqCst), 1);
}

#[test]
fn context_sources_resolve_programmatically() {
    use stencil::ContextSource;

    struct Settings;
    impl ContextSource for Settings {
        fn resolve(&self, name: &str) -> Option<Value> {
            match name {
                "theme" => Some(Value::from("dark")),
                _ => None,
            }
        }
    }
    let view = object(&[("settings", Value::source(Settings))]);
    assert_eq!(
        render("{{settings.theme}}|{{settings.nope}}", &view).unwrap(),
        "dark|"
    );
}

#[test]
fn scalar_root_renders_through_dot() {
    let view = Value::from("top");
    assert_eq!(render("<{{.}}>", &view).unwrap(), "<top>");
}

#[test]
fn value_map_iterates_in_insertion_order() {
    let view: Value = [("b", Value::from(2)), ("a", Value::from(1))]
        .into_iter()
        .collect::<ValueMap>()
        .into();
    assert_eq!(
        render("{{#.|iter}}{{key}}{{/.|iter}}", &view).unwrap(),
        "ba"
    );
}
