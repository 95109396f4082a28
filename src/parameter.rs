//! The parameter model.
//!
//! A command's formal arguments are an ordered list of [`Parameter`]s, each
//! fixed at registration: a kind, a declared type, an optional default and
//! some display metadata for help output. [`evaluate_parameters`] builds that
//! list from loosely written [`RawParameter`] declarations, resolving type
//! names such as `"Optional[User]"` against a [`TypeScope`].

use crate::converters::{BuiltinType, TypeDescriptor};
use crate::dispatch::Context;
use crate::error::{CommandError, RegistrationError};
use crate::value::Value;
use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// How a parameter consumes input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterKind {
    /// One word.
    Positional,
    /// Everything left, unsplit. Bound by name.
    Rest,
    /// Every remaining word, zero or more.
    Variadic,
}

/// Produces a default lazily, against the invocation it is needed for.
#[async_trait]
pub trait DefaultFactory: Send + Sync {
    async fn produce(&self, ctx: &Context) -> Result<Value, CommandError>;
}

struct DefaultFn<F>(F);

#[async_trait]
impl<F> DefaultFactory for DefaultFn<F>
where
    F: Fn(&Context) -> Value + Send + Sync,
{
    async fn produce(&self, ctx: &Context) -> Result<Value, CommandError> {
        Ok((self.0)(ctx))
    }
}

/// A default computed from the context, e.g. "the invoking author".
pub fn default_fn<F>(f: F) -> DefaultValue
where
    F: Fn(&Context) -> Value + Send + Sync + 'static,
{
    DefaultValue::Factory(Arc::new(DefaultFn(f)))
}

#[derive(Clone)]
pub enum DefaultValue {
    Value(Value),
    Factory(Arc<dyn DefaultFactory>),
}

impl DefaultValue {
    pub async fn resolve(&self, ctx: &Context) -> Result<Value, CommandError> {
        match self {
            Self::Value(value) => Ok(value.clone()),
            Self::Factory(factory) => factory.produce(ctx).await,
        }
    }
}

impl From<Value> for DefaultValue {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

macro_rules! default_from {
    ($($ty:ty),*) => {
        $(impl From<$ty> for DefaultValue {
            fn from(value: $ty) -> Self {
                Self::Value(Value::from(value))
            }
        })*
    };
}

default_from!(&str, String, bool, i64, f64);

impl fmt::Debug for DefaultValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(value) => f.debug_tuple("Value").field(value).finish(),
            Self::Factory(_) => f.write_str("Factory(..)"),
        }
    }
}

/// One formal argument of a command handler.
#[derive(Debug, Clone)]
pub struct Parameter {
    name: String,
    kind: ParameterKind,
    ty: TypeDescriptor,
    default: Option<DefaultValue>,
    display_name: Option<String>,
    display_default: Option<String>,
    description: Option<String>,
}

impl Parameter {
    pub fn new(name: impl Into<String>, kind: ParameterKind) -> Self {
        Self {
            name: name.into(),
            kind,
            ty: TypeDescriptor::Text,
            default: None,
            display_name: None,
            display_default: None,
            description: None,
        }
    }

    pub fn positional(name: impl Into<String>) -> Self {
        Self::new(name, ParameterKind::Positional)
    }

    pub fn rest(name: impl Into<String>) -> Self {
        Self::new(name, ParameterKind::Rest)
    }

    pub fn variadic(name: impl Into<String>) -> Self {
        Self::new(name, ParameterKind::Variadic)
    }

    pub fn of_type(mut self, ty: impl Into<TypeDescriptor>) -> Self {
        self.ty = ty.into();
        self
    }

    pub fn default(mut self, default: impl Into<DefaultValue>) -> Self {
        self.default = Some(default.into());
        self
    }

    pub fn display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = Some(display_name.into());
        self
    }

    pub fn display_default(mut self, display_default: impl Into<String>) -> Self {
        self.display_default = Some(display_default.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ParameterKind {
        self.kind
    }

    pub fn ty(&self) -> &TypeDescriptor {
        &self.ty
    }

    pub fn default_value(&self) -> Option<&DefaultValue> {
        self.default.as_ref()
    }

    /// True when there is no default to fall back on.
    pub fn required(&self) -> bool {
        self.default.is_none()
    }

    /// The name shown in usage strings.
    pub fn shown_name(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.name)
    }

    /// The default as shown in usage strings, if it can be shown.
    ///
    /// Explicit display text wins; plain values render themselves, except
    /// `None`. Factories have nothing to show without display text. A default
    /// that renders empty is not shown.
    pub fn shown_default(&self) -> Option<String> {
        let shown = match (&self.display_default, &self.default) {
            (Some(text), _) => text.clone(),
            (None, Some(DefaultValue::Value(value))) if !value.is_none() => value.to_string(),
            _ => return None,
        };
        (!shown.is_empty()).then_some(shown)
    }

    pub fn describe(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// `<name>`, `[name=default]`, `[name...]` or `<name...>`.
    pub fn usage(&self) -> String {
        let name = self.shown_name();
        match (self.kind, self.required()) {
            (ParameterKind::Variadic, _) => format!("[{name}...]"),
            (ParameterKind::Rest, true) => format!("<{name}...>"),
            (ParameterKind::Positional, true) => format!("<{name}>"),
            (_, false) => match self.shown_default() {
                Some(default) => format!("[{name}={default}]"),
                None => format!("[{name}]"),
            },
        }
    }
}

/// Declare a parameter with full metadata, for use as a raw default.
pub fn parameter(name: impl Into<String>) -> Parameter {
    Parameter::positional(name)
}

/// A declared type as written by the command author.
#[derive(Debug, Clone, Default)]
pub enum Annotation {
    #[default]
    Empty,
    Resolved(TypeDescriptor),
    /// A type name resolved at registration.
    Deferred(String),
}

#[derive(Debug, Clone, Default)]
pub enum RawDefault {
    #[default]
    Empty,
    Value(DefaultValue),
    /// A fully described parameter, used as-is.
    Descriptor(Parameter),
}

/// A formal argument before normalisation.
#[derive(Debug, Clone)]
pub struct RawParameter {
    pub name: String,
    pub kind: ParameterKind,
    pub annotation: Annotation,
    pub default: RawDefault,
}

impl RawParameter {
    pub fn new(name: impl Into<String>, kind: ParameterKind) -> Self {
        Self {
            name: name.into(),
            kind,
            annotation: Annotation::Empty,
            default: RawDefault::Empty,
        }
    }

    pub fn annotated(mut self, type_name: impl Into<String>) -> Self {
        self.annotation = Annotation::Deferred(type_name.into());
        self
    }

    pub fn typed(mut self, ty: impl Into<TypeDescriptor>) -> Self {
        self.annotation = Annotation::Resolved(ty.into());
        self
    }

    pub fn default(mut self, default: impl Into<DefaultValue>) -> Self {
        self.default = RawDefault::Value(default.into());
        self
    }

    pub fn described_by(mut self, parameter: Parameter) -> Self {
        self.default = RawDefault::Descriptor(parameter);
        self
    }
}

/// Named types available to deferred annotations.
#[derive(Debug, Clone)]
pub struct TypeScope {
    names: HashMap<String, TypeDescriptor>,
}

impl Default for TypeScope {
    fn default() -> Self {
        let mut names = HashMap::new();
        names.insert("str".to_string(), TypeDescriptor::Text);
        for builtin in BuiltinType::ALL {
            names.insert(builtin.type_name().to_string(), TypeDescriptor::Builtin(builtin));
        }
        Self { names }
    }
}

impl TypeScope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: impl Into<String>, ty: TypeDescriptor) -> &mut Self {
        self.names.insert(name.into(), ty);
        self
    }

    /// Resolve `int`, `Optional[User]`, `Union[int, bool]`, `Literal["a", "b"]`
    /// or `T | None`.
    pub fn resolve(&self, type_name: &str) -> Option<TypeDescriptor> {
        let type_name = type_name.trim();

        let alternatives = split_top_level(type_name, '|');
        if alternatives.len() > 1 {
            let optional = alternatives.iter().any(|a| a.trim() == "None");
            let members = alternatives
                .iter()
                .filter(|a| a.trim() != "None")
                .map(|a| self.resolve(a))
                .collect::<Option<Vec<_>>>()?;
            return Some(TypeDescriptor::Union { members, optional });
        }

        if let Some(inner) = generic_args(type_name, "Optional") {
            return self.resolve(inner).map(TypeDescriptor::optional);
        }
        if let Some(inner) = generic_args(type_name, "Union") {
            let parts = split_top_level(inner, ',');
            let optional = parts.iter().any(|p| p.trim() == "None");
            let members = parts
                .iter()
                .filter(|p| p.trim() != "None")
                .map(|p| self.resolve(p))
                .collect::<Option<Vec<_>>>()?;
            return Some(TypeDescriptor::Union { members, optional });
        }
        if let Some(inner) = generic_args(type_name, "Literal") {
            let values = split_top_level(inner, ',')
                .iter()
                .map(|v| unquote(v.trim()))
                .collect::<Option<Vec<_>>>()?;
            return Some(TypeDescriptor::Literal(values));
        }

        self.names.get(type_name).cloned()
    }
}

fn generic_args<'a>(type_name: &'a str, head: &str) -> Option<&'a str> {
    type_name
        .strip_prefix(head)?
        .trim_start()
        .strip_prefix('[')?
        .strip_suffix(']')
}

fn unquote(value: &str) -> Option<String> {
    ['"', '\'']
        .iter()
        .find_map(|q| value.strip_prefix(*q)?.strip_suffix(*q))
        .map(str::to_string)
}

/// Split on `sep` outside brackets and quotes.
fn split_top_level(input: &str, sep: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut start = 0;
    for (i, ch) in input.char_indices() {
        match (quote, ch) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(ch),
            (None, '[') => depth += 1,
            (None, ']') => depth = depth.saturating_sub(1),
            (None, c) if c == sep && depth == 0 => {
                parts.push(&input[start..i]);
                start = i + c.len_utf8();
            }
            _ => {}
        }
    }
    parts.push(&input[start..]);
    parts
}

/// Normalise raw declarations into the parameter list of a command.
pub fn evaluate_parameters(
    raws: Vec<RawParameter>,
    scope: &TypeScope,
) -> Result<Vec<Parameter>, RegistrationError> {
    raws.into_iter()
        .map(|raw| {
            let RawParameter {
                name,
                kind,
                annotation,
                default,
            } = raw;
            let default = match default {
                RawDefault::Descriptor(parameter) => return Ok(parameter),
                RawDefault::Value(value) => Some(value),
                RawDefault::Empty => None,
            };
            let ty = match annotation {
                Annotation::Empty => TypeDescriptor::Text,
                Annotation::Resolved(ty) => ty,
                Annotation::Deferred(type_name) => {
                    scope
                        .resolve(&type_name)
                        .ok_or_else(|| RegistrationError::UnresolvedType {
                            parameter: name.clone(),
                            type_name,
                        })?
                }
            };
            Ok(Parameter {
                name,
                kind,
                ty,
                default,
                display_name: None,
                display_default: None,
                description: None,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usage_forms() {
        assert_eq!(Parameter::positional("target").usage(), "<target>");
        assert_eq!(Parameter::positional("count").default(5i64).usage(), "[count=5]");
        assert_eq!(Parameter::positional("who").default(Value::None).usage(), "[who]");
        assert_eq!(
            Parameter::positional("who")
                .default(default_fn(|_| Value::None))
                .display_default("you")
                .usage(),
            "[who=you]"
        );
        assert_eq!(Parameter::variadic("items").usage(), "[items...]");
        assert_eq!(Parameter::rest("text").usage(), "<text...>");
        assert_eq!(Parameter::rest("text").default("").usage(), "[text]");
        assert_eq!(
            Parameter::positional("tag").default("").display_default("").usage(),
            "[tag]"
        );
        assert_eq!(Parameter::positional("sep").default(",").usage(), "[sep=,]");
        assert_eq!(Parameter::positional("u").display_name("user").usage(), "<user>");
    }

    #[test]
    fn test_required_derived_from_default() {
        assert!(Parameter::positional("a").required());
        assert!(!Parameter::positional("a").default(Value::None).required());
    }

    #[test]
    fn test_scope_resolves_generics() {
        let scope = TypeScope::new();
        assert!(matches!(scope.resolve("int"), Some(TypeDescriptor::Builtin(BuiltinType::Int))));
        assert!(scope.resolve("Optional[User]").is_some_and(|t| t.is_optional()));
        assert!(scope.resolve("int | None").is_some_and(|t| t.is_optional()));
        match scope.resolve("Union[int, bool]") {
            Some(TypeDescriptor::Union { members, optional }) => {
                assert_eq!(members.len(), 2);
                assert!(!optional);
            }
            other => panic!("unexpected {other:?}"),
        }
        match scope.resolve(r#"Literal["red", 'a, b']"#) {
            Some(TypeDescriptor::Literal(values)) => assert_eq!(values, vec!["red", "a, b"]),
            other => panic!("unexpected {other:?}"),
        }
        assert!(scope.resolve("Duration").is_none());
        assert!(scope.resolve("Optional[Duration]").is_none());
    }

    #[test]
    fn test_evaluate_uses_descriptor_as_is() {
        let described = parameter("shown").description("the target").default(Value::None);
        let raws = vec![
            RawParameter::new("a", ParameterKind::Positional).annotated("int"),
            RawParameter::new("b", ParameterKind::Positional).described_by(described),
            RawParameter::new("c", ParameterKind::Variadic),
        ];
        let params = evaluate_parameters(raws, &TypeScope::new()).unwrap();
        assert_eq!(params.len(), 3);
        assert_eq!(params[1].name(), "shown");
        assert_eq!(params[1].describe(), Some("the target"));
        assert!(matches!(params[2].ty(), TypeDescriptor::Text));
        assert_eq!(params[2].kind(), ParameterKind::Variadic);
    }

    #[test]
    fn test_evaluate_reports_unresolved_names() {
        let raws = vec![RawParameter::new("when", ParameterKind::Positional).annotated("Duration")];
        let err = evaluate_parameters(raws, &TypeScope::new()).unwrap_err();
        assert_eq!(
            err,
            RegistrationError::UnresolvedType {
                parameter: "when".into(),
                type_name: "Duration".into(),
            }
        );
    }

    #[test]
    fn test_registered_names_resolve() {
        let mut scope = TypeScope::new();
        scope.register("Color", TypeDescriptor::literal(["red", "blue"]));
        assert!(matches!(scope.resolve("Optional[Color]"), Some(TypeDescriptor::Union { optional: true, .. })));
    }
}
