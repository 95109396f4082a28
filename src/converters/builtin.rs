//! Scalar converters.

use super::Converter;
use crate::dispatch::Context;
use crate::error::ConverterError;
use crate::value::Value;
use async_trait::async_trait;

const TRUTHY: &[&str] = &["yes", "true", "ye", "y", "1", "on", "enable", "enabled"];
const FALSY: &[&str] = &["no", "false", "n", "f", "0", "off", "disable", "disabled"];

pub(crate) fn parse_bool(argument: &str) -> Result<bool, ConverterError> {
    let lowered = argument.to_lowercase();
    if TRUTHY.contains(&lowered.as_str()) {
        Ok(true)
    } else if FALSY.contains(&lowered.as_str()) {
        Ok(false)
    } else {
        Err(ConverterError::BadBool(lowered))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BoolConverter;

#[async_trait]
impl Converter for BoolConverter {
    async fn convert(&self, _ctx: &Context, argument: &str) -> Result<Value, ConverterError> {
        parse_bool(argument).map(Value::Bool)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct IntConverter;

#[async_trait]
impl Converter for IntConverter {
    async fn convert(&self, _ctx: &Context, argument: &str) -> Result<Value, ConverterError> {
        argument
            .parse::<i64>()
            .map(Value::Int)
            .map_err(|_| ConverterError::BadInt(argument.to_string()))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FloatConverter;

#[async_trait]
impl Converter for FloatConverter {
    async fn convert(&self, _ctx: &Context, argument: &str) -> Result<Value, ConverterError> {
        match argument.parse::<f64>() {
            Ok(x) if x.is_finite() => Ok(Value::Float(x)),
            _ => Err(ConverterError::BadFloat(argument.to_string())),
        }
    }
}
