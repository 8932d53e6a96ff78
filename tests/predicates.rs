//! End-to-end predicate behaviour on parsed C++.

use glud::cpp::{parse_source, Cursor, CppParser, ParseOptions, TranslationUnit};
use glud::predicates::*;
use glud::{all_of, any_of, descendants, walk, AccessSpecifier, Node};
use std::path::Path;

fn parse(source: &str) -> TranslationUnit {
    parse_source("tmp.cpp", source).unwrap()
}

fn spellings<'tu>(found: impl Iterator<Item = Cursor<'tu>>) -> Vec<String> {
    found.map(|c| c.spelling().to_string()).collect()
}

#[test]
fn test_find_classes() {
    let unit = parse("class Foo;\nclass Foo {};");
    assert_eq!(walk(is_class, unit.cursor()).count(), 2);
}

#[test]
fn test_can_ignore_forward_declaration() {
    let unit = parse("class Foo;\nclass Foo {};");
    assert_eq!(walk(is_class_definition, unit.cursor()).count(), 1);
}

#[test]
fn test_template_class_is_not_a_class() {
    let unit = parse("template<class T> class Foo {};");
    assert_eq!(walk(is_class, unit.cursor()).count(), 0);
    assert_eq!(walk(is_class_template, unit.cursor()).count(), 1);
}

#[test]
fn test_find_nested_classes() {
    let unit = parse(
        r#"
        class Foo {
            class Bar {};
        };
        "#,
    );
    let found = spellings(walk(is_class_definition, unit.cursor()));
    assert_eq!(found, vec!["Foo", "Bar"]);
}

#[test]
fn test_named_match_pinned_at_both_ends() {
    let unit = parse("void f();\nvoid f1();\nvoid f10();\nvoid xf();");
    let name_f = make_name_matcher("f").unwrap();
    let funcs: Vec<_> = walk(is_function, unit.cursor())
        .filter(|c| name_f(c))
        .collect();
    assert_eq!(funcs.len(), 1);
    assert!(matches_name("f", &funcs[0]).unwrap());
    assert!(!matches_name("f1", &funcs[0]).unwrap());
}

#[test]
fn test_name_pattern_is_a_regex() {
    let unit = parse("void f();\nvoid f1();\nvoid f10();\nvoid g();");
    let digits = make_name_matcher(r"f\d+").unwrap();
    assert_eq!(spellings(walk(digits, unit.cursor())), vec!["f1", "f10"]);
}

#[test]
fn test_invalid_name_pattern_is_reported() {
    let err = make_name_matcher::<Cursor<'_>>("f(").err().unwrap();
    assert!(matches!(err, PredicateError::InvalidPattern { ref pattern, .. } if pattern == "f("));

    let unit = parse("void f();");
    assert!(matches_name("[", &unit.cursor()).is_err());
}

#[test]
fn test_find_class_with_named_method() {
    let unit = parse(
        r#"
        class Foo {
        public:
            void f();
            void f(int);
        };

        class Bar {
        public:
            void f();
        };

        class Baz {
        public:
            void g();
        };
        "#,
    );
    let with_public_f = all_of![
        is_class_definition,
        any_child(all_of![is_public, is_method, make_name_matcher("f").unwrap()]),
    ];
    assert_eq!(
        spellings(walk(&with_public_f, unit.cursor())),
        vec!["Foo", "Bar"]
    );
}

#[test]
fn test_has_access_curried() {
    let unit = parse("class foo { protected: int x; int y; public: int z; };");
    let protected = has_access(AccessSpecifier::Protected);
    let fields = walk(all_of![protected, has_kind(glud::CursorKind::FieldDecl)], unit.cursor());
    assert_eq!(spellings(fields), vec!["x", "y"]);
}

#[test]
fn test_enum_types() {
    let unit = parse(
        r#"
        enum EmptyEnum {
        };

        enum Bar {
            XXX,
            YYY
        };

        namespace ns {
            enum Baz {
                AAA,
                BBB
            };
        }
        "#,
    );
    let types: Vec<_> = walk(is_enum, unit.cursor())
        .map(|e| e.ty().unwrap().spelling.clone())
        .collect();
    assert_eq!(types, vec!["EmptyEnum", "Bar", "ns::Baz"]);
}

#[test]
fn test_methods_in_file_with_primitive_result() {
    let unit = parse(
        r#"
        class Foo
        {
        public:
            void f();
        };
        "#,
    );
    let predicate = all_of![
        is_in_file(["tmp.cpp"]),
        is_method,
        make_name_matcher("f").unwrap(),
    ];
    let methods: Vec<_> = walk(&predicate, unit.cursor()).collect();
    assert_eq!(methods.len(), 1);
    assert!(is_primitive(methods[0].result_type().unwrap()));

    let elsewhere = all_of![is_in_file(["other.cpp"]), is_method];
    assert_eq!(walk(&elsewhere, unit.cursor()).count(), 0);
}

#[test]
fn test_access_specifiers() {
    let unit = parse(
        r#"
        class foo {
        public:
            void f1();
        protected:
            void g1();
            void g2();
        private:
            void h1();
            void h2();
            void h3();
        };
        "#,
    );
    let root = unit.cursor();
    assert_eq!(walk(all_of![is_method, is_public], root).count(), 1);
    assert_eq!(walk(all_of![is_method, is_protected], root).count(), 2);
    assert_eq!(walk(all_of![is_method, is_private], root).count(), 3);
}

#[test]
fn test_has_location() {
    let mut parser = CppParser::with_options(ParseOptions {
        detailed_preprocessing_record: true,
        ..ParseOptions::default()
    })
    .unwrap();
    let unit = parser.parse(Path::new("tmp.cpp"), "void f();").unwrap();
    let located = spellings(walk(has_location, unit.cursor()));
    // the translation unit itself has no location
    assert_eq!(located, vec!["f"]);
}

#[test]
fn test_function() {
    let unit = parse("void f();\nclass C { void m(); };");
    assert_eq!(spellings(walk(is_function, unit.cursor())), vec!["f"]);
}

#[test]
fn test_typename_match() {
    let unit = parse(
        r#"
        class foo;
        namespace bar {
            class foo;
        }
        "#,
    );
    let found: Vec<_> = walk(match_typename("bar::foo"), unit.cursor()).collect();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].semantic_parent().unwrap().spelling(), "bar");
}

#[test]
fn test_any_predecessor() {
    let unit = parse(
        r#"
        namespace foo {
            namespace bar {
                class baz {} ;
            }
            class biz {} ;
        }
        "#,
    );
    let under_bar = any_predecessor(semantic_parent, make_name_matcher("bar").unwrap());
    let classes = walk(all_of![is_class, under_bar], unit.cursor());
    assert_eq!(spellings(classes), vec!["baz"]);
}

#[test]
fn test_any_predecessor_excludes_the_node_itself() {
    let unit = parse("namespace bar { class baz {}; }");
    let under_bar = any_predecessor(semantic_parent, make_name_matcher("bar").unwrap());
    assert_eq!(spellings(walk(under_bar, unit.cursor())), vec!["baz"]);
}

#[test]
fn test_all_children() {
    let unit = parse(
        r#"
        class foo {
        public:
            int x;
            int y;
        };
        class bar {
        public:
            int x;
            int y;
        private:
            int z;
        };
        "#,
    );
    let all_public = all_of![is_class, all_children(is_public)];
    assert_eq!(spellings(walk(all_public, unit.cursor())), vec!["foo"]);
}

#[test]
fn test_all_children_is_vacuous_for_leaves() {
    let unit = parse("class empty {};");
    let found = walk(all_of![is_class, all_children(is_private)], unit.cursor());
    assert_eq!(spellings(found), vec!["empty"]);
}

#[test]
fn test_any_fn() {
    let unit = parse(
        r#"
        class biz {
            void f();
            int g;
            enum baz {};
            class moo {};
        };
        "#,
    );
    let found = spellings(walk(any_of![is_method, is_enum], unit.cursor()));
    assert_eq!(found, vec!["f", "baz"]);
}

#[test]
fn test_empty_combinators_are_identities() {
    let unit = parse("class a {}; void b();");
    let everything = all_fn::<Cursor<'_>, _>(Vec::new());
    let nothing = any_fn::<Cursor<'_>, _>(Vec::new());
    assert_eq!(walk(everything, unit.cursor()).count(), unit.len());
    assert_eq!(walk(nothing, unit.cursor()).count(), 0);
}

const ALL_PRED_SOURCE: &str = r#"
    namespace foo {
        namespace bar {
            class fizz;
        }
        class buzz;
        class mazz;
    }
"#;

#[test]
fn test_all_predecessors() {
    let unit = parse(ALL_PRED_SOURCE);
    let chain_ok = all_predecessors(
        semantic_parent,
        any_of![
            is_translation_unit,
            all_of![is_namespace, make_name_matcher("foo").unwrap()],
        ],
    );
    // bar fails itself, and everything below foo fails on its own kind
    let found = spellings(walk(chain_ok, unit.cursor()));
    assert_eq!(found, vec!["tmp.cpp", "foo"]);
}

#[test]
fn test_all_predecessors_checks_every_ancestor() {
    let unit = parse(ALL_PRED_SOURCE);
    let outside_bar = all_predecessors(semantic_parent, |c: &Cursor<'_>| c.spelling() != "bar");
    let found = spellings(walk(all_of![is_class, outside_bar], unit.cursor()));
    assert_eq!(found, vec!["buzz", "mazz"]);
}

#[test]
fn test_root_has_no_predecessors() {
    let unit = parse(ALL_PRED_SOURCE);
    let root = unit.cursor();
    assert!(all_predecessors(semantic_parent, is_translation_unit)(&root));
    assert!(!all_predecessors(semantic_parent, is_namespace)(&root));
    assert!(!any_predecessor(semantic_parent, |_: &Cursor<'_>| true)(&root));
}

#[test]
fn test_lexical_and_semantic_chains_differ() {
    let unit = parse(
        r#"
        namespace ns {
            struct S { void f(); };
        }
        void ns::S::f() {}
        "#,
    );
    let definition = walk(all_of![is_method, is_definition], unit.cursor())
        .next()
        .unwrap();
    let semantic: Vec<_> = predecessors(&definition, &semantic_parent)
        .map(|c| c.spelling().to_string())
        .collect();
    let lexical: Vec<_> = predecessors(&definition, &lexical_parent)
        .map(|c| c.spelling().to_string())
        .collect();
    assert_eq!(semantic, vec!["S", "ns", "tmp.cpp"]);
    assert_eq!(lexical, vec!["tmp.cpp"]);
}

#[test]
fn test_not_fn() {
    let unit = parse("class a {}; void b();");
    let not_class = not_fn(is_class);
    assert_eq!(
        walk(&not_class, unit.cursor()).count(),
        descendants(unit.cursor()).count() - 1
    );
}
