use crate::jtype::{JavaType, PrimitiveType};
use crate::keys::ObjectId;
use std::fmt::Display;

/// A value living in the target process, as carried by the debug protocol.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    Boolean(bool),
    Byte(i8),
    Char(u16),
    Short(i16),
    Integer(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Object(ObjectId),
    Null,
}

impl Value {
    pub fn as_nullable_obj_ref(&self) -> Option<Option<ObjectId>> {
        match self {
            Value::Object(id) => Some(Some(*id)),
            Value::Null => Some(None),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i32> {
        match self {
            Value::Integer(v) => Some(*v),
            _ => None,
        }
    }

    /// The primitive tag of this value, `None` for references and `null`.
    pub fn primitive_type(&self) -> Option<PrimitiveType> {
        match self {
            Value::Boolean(_) => Some(PrimitiveType::Boolean),
            Value::Byte(_) => Some(PrimitiveType::Byte),
            Value::Char(_) => Some(PrimitiveType::Char),
            Value::Short(_) => Some(PrimitiveType::Short),
            Value::Integer(_) => Some(PrimitiveType::Int),
            Value::Long(_) => Some(PrimitiveType::Long),
            Value::Float(_) => Some(PrimitiveType::Float),
            Value::Double(_) => Some(PrimitiveType::Double),
            Value::Object(_) | Value::Null => None,
        }
    }

    pub fn is_primitive(&self) -> bool {
        self.primitive_type().is_some()
    }
}

/// Zero value a freshly allocated slot of the given primitive type holds.
impl From<PrimitiveType> for Value {
    fn from(value: PrimitiveType) -> Self {
        match value {
            PrimitiveType::Boolean => Value::Boolean(false),
            PrimitiveType::Byte => Value::Byte(0),
            PrimitiveType::Char => Value::Char(0),
            PrimitiveType::Short => Value::Short(0),
            PrimitiveType::Int => Value::Integer(0),
            PrimitiveType::Long => Value::Long(0),
            PrimitiveType::Float => Value::Float(0.0),
            PrimitiveType::Double => Value::Double(0.0),
        }
    }
}

impl From<&JavaType> for Value {
    fn from(jtype: &JavaType) -> Self {
        match jtype {
            JavaType::Primitive(prim) => Value::from(*prim),
            JavaType::Instance(_) | JavaType::Array(_) => Value::Null,
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Boolean(v) => write!(f, "{}", v),
            Value::Byte(v) => write!(f, "{}", v),
            Value::Char(v) => match char::from_u32(*v as u32) {
                Some(c) => write!(f, "'{}'", c),
                None => write!(f, "'\\u{:04x}'", v),
            },
            Value::Short(v) => write!(f, "{}", v),
            Value::Integer(v) => write!(f, "{}", v),
            Value::Long(v) => write!(f, "{}L", v),
            Value::Float(v) => write!(f, "{}f", v),
            Value::Double(v) => write!(f, "{}", v),
            Value::Object(id) => write!(f, "{}", id),
            Value::Null => write!(f, "null"),
        }
    }
}
