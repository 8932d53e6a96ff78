use crate::cpp::ParseOptions;
use crate::node::{AccessSpecifier, CursorKind, Node, UnknownName};
use crate::predicates::{
    all_children, all_fn, all_predecessors, any_child, any_fn, any_predecessor, boxed,
    has_access, has_kind, has_location, is_class, is_class_definition, is_class_template,
    is_definition, is_enum, is_function, is_in_file, is_method, is_namespace,
    is_translation_unit, lexical_parent, make_name_matcher, match_typename, not_fn,
    semantic_parent, BoxPredicate, PredicateError,
};
use regex::Regex;
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

/// A query file: metadata, parser knobs and one query expression.
#[derive(Debug, Deserialize, Clone)]
pub struct QueryConfig {
    #[serde(default)]
    pub meta: Metadata,
    #[serde(default)]
    pub parse: ParseOptions,
    pub query: QueryExpr,
}

impl QueryConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut issues = Vec::new();
        self.query.collect_issues("query", &mut issues);
        if issues.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { issues })
        }
    }
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct Metadata {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Declarative form of a predicate.
///
/// Each variant mirrors one predicate constructor; TOML spells them as
/// single-key tables, e.g. `{ any_child = { is = "method" } }`.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum QueryExpr {
    All(Vec<QueryExpr>),
    Any(Vec<QueryExpr>),
    Not(Box<QueryExpr>),
    Is(Category),
    Kind(CursorKind),
    Access(AccessSpecifier),
    /// Regular expression matched against the whole spelling.
    Name(String),
    /// Fully qualified type spelling.
    Typename(String),
    /// File base names.
    InFile(Vec<String>),
    AnyChild(Box<QueryExpr>),
    AllChildren(Box<QueryExpr>),
    AnyPredecessor(Ancestry),
    AllPredecessors(Ancestry),
}

/// Arguments of the ancestor navigators.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct Ancestry {
    #[serde(default)]
    pub step: Step,
    pub matches: Box<QueryExpr>,
}

/// Parent relation followed by ancestor queries.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    #[default]
    SemanticParent,
    LexicalParent,
}

impl Step {
    pub fn function<N: Node>(self) -> fn(&N) -> Option<N> {
        match self {
            Step::SemanticParent => semantic_parent::<N>,
            Step::LexicalParent => lexical_parent::<N>,
        }
    }
}

/// Named node categories, each backed by a leaf predicate.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Class,
    ClassDefinition,
    ClassTemplate,
    Function,
    Method,
    Enum,
    Namespace,
    TranslationUnit,
    Definition,
    HasLocation,
}

impl Category {
    pub const ALL: [Category; 10] = [
        Category::Class,
        Category::ClassDefinition,
        Category::ClassTemplate,
        Category::Function,
        Category::Method,
        Category::Enum,
        Category::Namespace,
        Category::TranslationUnit,
        Category::Definition,
        Category::HasLocation,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Category::Class => "class",
            Category::ClassDefinition => "class_definition",
            Category::ClassTemplate => "class_template",
            Category::Function => "function",
            Category::Method => "method",
            Category::Enum => "enum",
            Category::Namespace => "namespace",
            Category::TranslationUnit => "translation_unit",
            Category::Definition => "definition",
            Category::HasLocation => "has_location",
        }
    }

    pub fn predicate<'a, N: Node + 'a>(self) -> BoxPredicate<'a, N> {
        match self {
            Category::Class => boxed(is_class::<N>),
            Category::ClassDefinition => boxed(is_class_definition::<N>),
            Category::ClassTemplate => boxed(is_class_template::<N>),
            Category::Function => boxed(is_function::<N>),
            Category::Method => boxed(is_method::<N>),
            Category::Enum => boxed(is_enum::<N>),
            Category::Namespace => boxed(is_namespace::<N>),
            Category::TranslationUnit => boxed(is_translation_unit::<N>),
            Category::Definition => boxed(is_definition::<N>),
            Category::HasLocation => boxed(has_location::<N>),
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Category {
    type Err = UnknownName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('-', "_");
        Category::ALL
            .into_iter()
            .find(|category| category.name() == wanted)
            .ok_or_else(|| UnknownName {
                what: "category",
                name: s.to_string(),
            })
    }
}

impl QueryExpr {
    /// Build the predicate this expression describes.
    pub fn compile<'a, N: Node + 'a>(&self) -> Result<BoxPredicate<'a, N>, PredicateError> {
        let predicate = match self {
            QueryExpr::All(items) => boxed(all_fn(compile_all::<N>(items)?)),
            QueryExpr::Any(items) => boxed(any_fn(compile_all::<N>(items)?)),
            QueryExpr::Not(inner) => boxed(not_fn(inner.compile::<N>()?)),
            QueryExpr::Is(category) => category.predicate(),
            QueryExpr::Kind(kind) => boxed(has_kind::<N>(*kind)),
            QueryExpr::Access(level) => boxed(has_access::<N>(*level)),
            QueryExpr::Name(pattern) => boxed(make_name_matcher::<N>(pattern)?),
            QueryExpr::Typename(name) => boxed(match_typename::<N>(name.clone())),
            QueryExpr::InFile(files) => boxed(is_in_file::<N, _, _>(files.clone())),
            QueryExpr::AnyChild(inner) => boxed(any_child(inner.compile::<N>()?)),
            QueryExpr::AllChildren(inner) => boxed(all_children(inner.compile::<N>()?)),
            QueryExpr::AnyPredecessor(Ancestry { step, matches }) => {
                boxed(any_predecessor(step.function::<N>(), matches.compile::<N>()?))
            }
            QueryExpr::AllPredecessors(Ancestry { step, matches }) => {
                boxed(all_predecessors(step.function::<N>(), matches.compile::<N>()?))
            }
        };
        Ok(predicate)
    }

    fn collect_issues(&self, at: &str, issues: &mut Vec<ValidationIssue>) {
        match self {
            QueryExpr::All(items) | QueryExpr::Any(items) => {
                let key = if matches!(self, QueryExpr::All(_)) { "all" } else { "any" };
                for (idx, item) in items.iter().enumerate() {
                    item.collect_issues(&format!("{at}.{key}[{idx}]"), issues);
                }
            }
            QueryExpr::Not(inner) => inner.collect_issues(&format!("{at}.not"), issues),
            QueryExpr::AnyChild(inner) => inner.collect_issues(&format!("{at}.any_child"), issues),
            QueryExpr::AllChildren(inner) => {
                inner.collect_issues(&format!("{at}.all_children"), issues)
            }
            QueryExpr::AnyPredecessor(ancestry) => ancestry
                .matches
                .collect_issues(&format!("{at}.any_predecessor.matches"), issues),
            QueryExpr::AllPredecessors(ancestry) => ancestry
                .matches
                .collect_issues(&format!("{at}.all_predecessors.matches"), issues),
            QueryExpr::Name(pattern) => {
                if pattern.trim().is_empty() {
                    issues.push(ValidationIssue::EmptyValue {
                        at: format!("{at}.name"),
                    });
                } else if let Err(error) = Regex::new(pattern) {
                    issues.push(ValidationIssue::InvalidPattern {
                        at: format!("{at}.name"),
                        pattern: pattern.clone(),
                        message: error.to_string(),
                    });
                }
            }
            QueryExpr::Typename(name) => {
                if name.trim().is_empty() {
                    issues.push(ValidationIssue::EmptyValue {
                        at: format!("{at}.typename"),
                    });
                }
            }
            QueryExpr::InFile(files) => {
                if files.is_empty() || files.iter().any(|file| file.trim().is_empty()) {
                    issues.push(ValidationIssue::EmptyValue {
                        at: format!("{at}.in_file"),
                    });
                }
            }
            QueryExpr::Is(_) | QueryExpr::Kind(_) | QueryExpr::Access(_) => {}
        }
    }
}

fn compile_all<'a, N: Node + 'a>(
    items: &[QueryExpr],
) -> Result<Vec<BoxPredicate<'a, N>>, PredicateError> {
    items.iter().map(|item| item.compile::<N>()).collect()
}

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub issues: Vec<ValidationIssue>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, issue) in self.issues.iter().enumerate() {
            if idx > 0 {
                writeln!(f)?;
            }
            write!(f, "{issue}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationIssue {
    EmptyValue {
        at: String,
    },
    InvalidPattern {
        at: String,
        pattern: String,
        message: String,
    },
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationIssue::EmptyValue { at } => write!(f, "'{at}' must not be empty"),
            ValidationIssue::InvalidPattern {
                at,
                pattern,
                message,
            } => write!(f, "'{at}' has invalid pattern '{pattern}': {message}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cpp::{parse_source, Cursor};
    use crate::walk::walk;

    fn count(expr: &QueryExpr, source: &str) -> usize {
        let unit = parse_source("tmp.cpp", source).unwrap();
        let predicate = expr.compile::<Cursor<'_>>().unwrap();
        walk(&predicate, unit.cursor()).count()
    }

    #[test]
    fn categories_round_trip_through_names() {
        for category in Category::ALL {
            assert_eq!(category.name().parse::<Category>().unwrap(), category);
        }
        assert_eq!(
            "class-definition".parse::<Category>().unwrap(),
            Category::ClassDefinition
        );
        assert!("widget".parse::<Category>().is_err());
    }

    #[test]
    fn compiles_leaf_expressions() {
        let source = "class Foo { public: void f(); }; enum E {}; void g();";
        assert_eq!(count(&QueryExpr::Is(Category::Class), source), 1);
        assert_eq!(count(&QueryExpr::Kind(CursorKind::EnumDecl), source), 1);
        assert_eq!(count(&QueryExpr::Access(AccessSpecifier::Public), source), 2);
        assert_eq!(count(&QueryExpr::Name("[fg]".into()), source), 2);
    }

    #[test]
    fn compiles_nested_expressions() {
        let expr = QueryExpr::All(vec![
            QueryExpr::Is(Category::ClassDefinition),
            QueryExpr::AnyChild(Box::new(QueryExpr::All(vec![
                QueryExpr::Is(Category::Method),
                QueryExpr::Access(AccessSpecifier::Public),
            ]))),
        ]);
        let source = "class A { public: void f(); }; class B { void f(); }; class C;";
        assert_eq!(count(&expr, source), 1);
        assert_eq!(count(&QueryExpr::Not(Box::new(expr)), source), count_all(source) - 1);
    }

    fn count_all(source: &str) -> usize {
        parse_source("tmp.cpp", source).unwrap().len()
    }

    #[test]
    fn ancestor_expressions_follow_the_chosen_step() {
        let source = "namespace ns { class Foo { void f(); }; } void ns::Foo::f() {}";
        let within = |step| {
            QueryExpr::All(vec![
                QueryExpr::Is(Category::Method),
                QueryExpr::AnyPredecessor(Ancestry {
                    step,
                    matches: Box::new(QueryExpr::Is(Category::Namespace)),
                }),
            ])
        };
        assert_eq!(count(&within(Step::SemanticParent), source), 2);
        assert_eq!(count(&within(Step::LexicalParent), source), 1);
    }

    #[test]
    fn invalid_name_pattern_fails_to_compile() {
        let err = QueryExpr::Name("(".into())
            .compile::<Cursor<'_>>()
            .err()
            .unwrap();
        assert!(matches!(err, PredicateError::InvalidPattern { .. }));
    }

    #[test]
    fn validation_collects_every_issue() {
        let config = QueryConfig {
            meta: Metadata::default(),
            parse: ParseOptions::default(),
            query: QueryExpr::All(vec![
                QueryExpr::Name(" ".into()),
                QueryExpr::AnyChild(Box::new(QueryExpr::Name("[".into()))),
                QueryExpr::Typename(String::new()),
                QueryExpr::InFile(Vec::new()),
            ]),
        };
        let err = config.validate().unwrap_err();
        assert_eq!(err.issues.len(), 4);
        assert_eq!(
            err.issues[0],
            ValidationIssue::EmptyValue {
                at: "query.all[0].name".into()
            }
        );
        assert!(matches!(
            &err.issues[1],
            ValidationIssue::InvalidPattern { at, .. } if at == "query.all[1].any_child.name"
        ));
        assert!(err.to_string().contains("query.all[3].in_file"));
    }
}
