//! Type-directed argument conversion.
//!
//! A parameter's [`TypeDescriptor`] decides how a raw token becomes a
//! [`Value`]. Plain text passes through untouched, unions try their members
//! in order, literals are matched exactly, and everything else goes through a
//! [`Converter`]. Well-known types ([`BuiltinType`]) are looked up in the
//! client's converter table first, so a client can swap the built-in `bool`
//! or `User` converter without touching any command.

mod builtin;
mod entity;

pub use builtin::{BoolConverter, FloatConverter, IntConverter};
pub use entity::{
    CategoryConverter, ChannelConverter, MemberConverter, RoleConverter, TextChannelConverter,
    UserConverter,
};

use crate::dispatch::Context;
use crate::error::{CommandError, ConverterError};
use crate::value::Value;
use async_trait::async_trait;
use futures_util::future::BoxFuture;
use slirc_view::Cursor;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Turns one token into a typed value.
#[async_trait]
pub trait Converter: Send + Sync {
    async fn convert(&self, ctx: &Context, argument: &str) -> Result<Value, ConverterError>;
}

struct ConverterFn<F>(F);

#[async_trait]
impl<F> Converter for ConverterFn<F>
where
    F: Fn(&Context, &str) -> Result<Value, ConverterError> + Send + Sync,
{
    async fn convert(&self, ctx: &Context, argument: &str) -> Result<Value, ConverterError> {
        (self.0)(ctx, argument)
    }
}

/// Wrap a synchronous closure as a converter.
pub fn converter_fn<F>(f: F) -> Arc<dyn Converter>
where
    F: Fn(&Context, &str) -> Result<Value, ConverterError> + Send + Sync + 'static,
{
    Arc::new(ConverterFn(f))
}

/// Types with a converter registered in the client's lookup table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinType {
    Bool,
    Int,
    Float,
    User,
    Member,
    Channel,
    TextChannel,
    Role,
    Category,
}

impl BuiltinType {
    pub const ALL: [BuiltinType; 9] = [
        Self::Bool,
        Self::Int,
        Self::Float,
        Self::User,
        Self::Member,
        Self::Channel,
        Self::TextChannel,
        Self::Role,
        Self::Category,
    ];

    /// The name used for this type in deferred type references.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Float => "float",
            Self::User => "User",
            Self::Member => "Member",
            Self::Channel => "Channel",
            Self::TextChannel => "TextChannel",
            Self::Role => "Role",
            Self::Category => "Category",
        }
    }

    /// The converter shipped for this type.
    pub fn default_converter(&self) -> Arc<dyn Converter> {
        match self {
            Self::Bool => Arc::new(BoolConverter),
            Self::Int => Arc::new(IntConverter),
            Self::Float => Arc::new(FloatConverter),
            Self::User => Arc::new(UserConverter),
            Self::Member => Arc::new(MemberConverter),
            Self::Channel => Arc::new(ChannelConverter),
            Self::TextChannel => Arc::new(TextChannelConverter),
            Self::Role => Arc::new(RoleConverter),
            Self::Category => Arc::new(CategoryConverter),
        }
    }
}

/// The lookup table every client starts with.
pub fn default_converters() -> HashMap<BuiltinType, Arc<dyn Converter>> {
    BuiltinType::ALL
        .iter()
        .map(|ty| (*ty, ty.default_converter()))
        .collect()
}

/// Declared type of a parameter.
#[derive(Clone, Default)]
pub enum TypeDescriptor {
    /// Raw text, no conversion.
    #[default]
    Text,
    Builtin(BuiltinType),
    /// First member that converts wins. `optional` unions yield
    /// [`Value::None`] and give the token back when every member fails.
    Union {
        members: Vec<TypeDescriptor>,
        optional: bool,
    },
    /// The token must equal one of these exactly.
    Literal(Vec<String>),
    /// `base` describes the shape, `converter` does the work.
    Annotated {
        base: Box<TypeDescriptor>,
        converter: Arc<dyn Converter>,
    },
    Converter(Arc<dyn Converter>),
}

impl TypeDescriptor {
    pub fn optional(inner: TypeDescriptor) -> Self {
        match inner {
            Self::Union { members, .. } => Self::Union {
                members,
                optional: true,
            },
            other => Self::Union {
                members: vec![other],
                optional: true,
            },
        }
    }

    pub fn union(members: Vec<TypeDescriptor>) -> Self {
        Self::Union {
            members,
            optional: false,
        }
    }

    pub fn literal<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Literal(values.into_iter().map(Into::into).collect())
    }

    pub fn annotated(base: TypeDescriptor, converter: Arc<dyn Converter>) -> Self {
        Self::Annotated {
            base: Box::new(base),
            converter,
        }
    }

    pub fn is_optional(&self) -> bool {
        match self {
            Self::Union { optional, .. } => *optional,
            Self::Annotated { base, .. } => base.is_optional(),
            _ => false,
        }
    }
}

impl From<BuiltinType> for TypeDescriptor {
    fn from(ty: BuiltinType) -> Self {
        Self::Builtin(ty)
    }
}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text => f.write_str("Text"),
            Self::Builtin(ty) => write!(f, "{}", ty.type_name()),
            Self::Union { members, optional } => {
                let name = if *optional { "Optional" } else { "Union" };
                f.debug_tuple(name).field(members).finish()
            }
            Self::Literal(values) => f.debug_tuple("Literal").field(values).finish(),
            Self::Annotated { base, .. } => f.debug_tuple("Annotated").field(base).finish(),
            Self::Converter(_) => f.write_str("Converter(..)"),
        }
    }
}

/// Convert `argument` for `parameter` according to `ty`.
///
/// An exhausted optional union undoes the cursor's last read, so the token
/// stays available to the next parameter.
pub fn convert_argument<'a>(
    ctx: &'a mut Context,
    argument: &'a str,
    ty: &'a TypeDescriptor,
    parameter: &'a str,
) -> BoxFuture<'a, Result<Value, CommandError>> {
    Box::pin(async move {
        match ty {
            TypeDescriptor::Text => Ok(Value::Text(argument.to_string())),
            TypeDescriptor::Builtin(builtin) => {
                let converter = ctx.client().converter(*builtin);
                run_converter(converter.as_ref(), ctx, argument, parameter).await
            }
            TypeDescriptor::Union { members, optional } => {
                for member in members {
                    if let Ok(value) = convert_argument(ctx, argument, member, parameter).await {
                        return Ok(value);
                    }
                }
                if *optional {
                    ctx.view.undo();
                    return Ok(Value::None);
                }
                Err(CommandError::Conversion {
                    parameter: parameter.to_string(),
                    source: ConverterError::Union(argument.to_string()),
                })
            }
            TypeDescriptor::Annotated { base, converter } => match base.as_ref() {
                TypeDescriptor::Union { optional, .. } => {
                    let reshaped = TypeDescriptor::Union {
                        members: vec![TypeDescriptor::Converter(Arc::clone(converter))],
                        optional: *optional,
                    };
                    convert_argument(ctx, argument, &reshaped, parameter).await
                }
                _ => run_converter(converter.as_ref(), ctx, argument, parameter).await,
            },
            TypeDescriptor::Literal(allowed) => {
                if allowed.iter().any(|literal| literal == argument) {
                    Ok(Value::Text(argument.to_string()))
                } else {
                    Err(CommandError::Conversion {
                        parameter: parameter.to_string(),
                        source: ConverterError::InvalidLiteral {
                            argument: argument.to_string(),
                            allowed: allowed.clone(),
                        },
                    })
                }
            }
            TypeDescriptor::Converter(converter) => {
                run_converter(converter.as_ref(), ctx, argument, parameter).await
            }
        }
    })
}

async fn run_converter(
    converter: &dyn Converter,
    ctx: &Context,
    argument: &str,
    parameter: &str,
) -> Result<Value, CommandError> {
    converter
        .convert(ctx, argument)
        .await
        .map_err(|source| CommandError::Conversion {
            parameter: parameter.to_string(),
            source,
        })
}
