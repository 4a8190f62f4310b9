use serde::Deserialize;

use crate::errors::Result;
use crate::io::{BinaryStream, StreamDevice};

/// Wire tag of a 3-float parameter.
pub const TAG_FLOAT3: i32 = 0xC;
/// Wire tag of a single-float parameter.
pub const TAG_FLOAT: i32 = 0xA;
/// Wire tag of a length-prefixed string parameter.
pub const TAG_STRING: i32 = 0x7;

pub const DEFAULT_SHADER: &str = "Shaders/standardskinned.ssh";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum ParamValue {
    Float3([f32; 3]),
    Float(f32),
    Text(String),
}

impl ParamValue {
    #[must_use]
    pub const fn type_tag(&self) -> i32 {
        match self {
            Self::Float3(_) => TAG_FLOAT3,
            Self::Float(_) => TAG_FLOAT,
            Self::Text(_) => TAG_STRING,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ShaderParam {
    pub name: String,
    #[serde(flatten)]
    pub value: ParamValue,
}

impl ShaderParam {
    pub fn new(name: impl Into<String>, value: ParamValue) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

/// The single material a static asset carries.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct MaterialDesc {
    pub shader: String,
    pub params: Vec<ShaderParam>,
}

impl Default for MaterialDesc {
    fn default() -> Self {
        Self {
            shader: DEFAULT_SHADER.to_string(),
            params: vec![
                ShaderParam::new("specularColor", ParamValue::Float3([0.0; 3])),
                ShaderParam::new("specularPower", ParamValue::Float(0.0)),
                ShaderParam::new("outlineThickness", ParamValue::Float(1.0)),
                ShaderParam::new("baseTexture", ParamValue::Text(String::new())),
                ShaderParam::new("bumpTexture", ParamValue::Text(String::new())),
                ShaderParam::new("specTexture", ParamValue::Text(String::new())),
            ],
        }
    }
}

impl MaterialDesc {
    /// Replaces the value of `name`, or appends it.
    pub fn set(&mut self, name: &str, value: ParamValue) -> &mut Self {
        match self.params.iter_mut().find(|p| p.name == name) {
            Some(param) => param.value = value,
            None => self.params.push(ShaderParam::new(name, value)),
        }
        self
    }

    /// Shader path, parameter count, then `name, tag, payload` per parameter.
    pub fn write<D: StreamDevice>(&self, stream: &mut BinaryStream<D>) -> Result<()> {
        stream.write_sized_string(&self.shader)?;
        stream.write_i32(self.params.len() as i32)?;
        for param in &self.params {
            stream.write_sized_string(&param.name)?;
            stream.write_i32(param.value.type_tag())?;
            match &param.value {
                ParamValue::Float3(v) => stream.write_f32x3(*v)?,
                ParamValue::Float(v) => stream.write_f32(*v)?,
                ParamValue::Text(s) => stream.write_sized_string(s)?,
            }
        }
        Ok(())
    }
}
