use crate::error::RemoteError;
use num_enum::{IntoPrimitive, TryFromPrimitive};
use std::fmt::Display;

/// Primitive types, tagged with their descriptor character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum PrimitiveType {
    Boolean = b'Z',
    Byte = b'B',
    Char = b'C',
    Short = b'S',
    Int = b'I',
    Long = b'J',
    Float = b'F',
    Double = b'D',
}

impl PrimitiveType {
    pub const fn java_name(self) -> &'static str {
        match self {
            Self::Boolean => "boolean",
            Self::Byte => "byte",
            Self::Char => "char",
            Self::Short => "short",
            Self::Int => "int",
            Self::Long => "long",
            Self::Float => "float",
            Self::Double => "double",
        }
    }
}

/// Declared type of a field, parsed from a field descriptor (`I`, `Ljava/lang/String;`, `[J`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum JavaType {
    Primitive(PrimitiveType),
    Instance(String),
    Array(Box<JavaType>),
}

impl JavaType {
    /// Name of the type as the remote process registers it: internal form for classes,
    /// descriptor form for arrays, java name for primitives.
    pub fn type_name(&self) -> String {
        match self {
            JavaType::Primitive(prim) => prim.java_name().to_string(),
            JavaType::Instance(name) => name.clone(),
            JavaType::Array(_) => self.descriptor(),
        }
    }

    pub fn descriptor(&self) -> String {
        match self {
            JavaType::Primitive(prim) => char::from(u8::from(*prim)).to_string(),
            JavaType::Instance(name) => format!("L{};", name),
            JavaType::Array(element) => format!("[{}", element.descriptor()),
        }
    }

    pub fn is_reference(&self) -> bool {
        !matches!(self, JavaType::Primitive(_))
    }

    fn parse_prefix(desc: &str) -> Result<(JavaType, &str), RemoteError> {
        let invalid = || RemoteError::InvalidDescriptor(desc.to_string());
        let first = *desc.as_bytes().first().ok_or_else(invalid)?;
        match first {
            b'L' => {
                let end = desc.find(';').ok_or_else(invalid)?;
                let name = &desc[1..end];
                if name.is_empty() {
                    return Err(invalid());
                }
                Ok((JavaType::Instance(name.to_string()), &desc[end + 1..]))
            }
            b'[' => {
                let (element, rest) = Self::parse_prefix(&desc[1..])?;
                Ok((JavaType::Array(Box::new(element)), rest))
            }
            other => {
                let prim = PrimitiveType::try_from(other).map_err(|_| invalid())?;
                Ok((JavaType::Primitive(prim), &desc[1..]))
            }
        }
    }
}

impl TryFrom<&str> for JavaType {
    type Error = RemoteError;

    fn try_from(desc: &str) -> Result<Self, Self::Error> {
        match Self::parse_prefix(desc)? {
            (ty, "") => Ok(ty),
            _ => Err(RemoteError::InvalidDescriptor(desc.to_string())),
        }
    }
}

impl Display for JavaType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JavaType::Primitive(prim) => write!(f, "{}", prim.java_name()),
            JavaType::Instance(name) => write!(f, "{}", name.replace('/', ".")),
            JavaType::Array(element) => write!(f, "{}[]", element),
        }
    }
}
