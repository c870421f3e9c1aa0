//! TOML description of a suspended process: types with their fields, heap objects and the
//! current frame.
//!
//! ```toml
//! [config]
//! direct_lookup_fallback = true
//!
//! [[types]]
//! name = "com/example/Square"
//! super = "com/example/Shape"
//! interfaces = ["com/example/Named"]
//! fields = [
//!     { name = "side", descriptor = "I" },
//!     { name = "COUNT", descriptor = "I", static = true, value = 2 },
//! ]
//!
//! [[objects]]
//! id = "sq"
//! type = "com/example/Square"
//! fields = { side = 3 }
//!
//! [[objects]]
//! id = "sizes"
//! type = "[I"
//! elements = [1, 2, 3]
//!
//! [frame]
//! this = "sq"
//! declaring_type = "com/example/Square"
//! locals = { n = 5, other = "@sq", nothing = "null" }
//! ```

use crate::config::EvalConfig;
use crate::debug_log;
use crate::error::RemoteError;
use crate::eval::context::StackFrame;
use crate::jtype::{JavaType, PrimitiveType};
use crate::keys::{ObjectId, TypeId};
use crate::remote::RemoteProcess;
use crate::snapshot::{ClassState, SnapshotProcess};
use crate::value::Value;
use itertools::Itertools;
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt::Display;
use std::path::Path;

#[derive(Debug)]
pub enum FixtureError {
    Io(std::io::Error),
    Toml(toml::de::Error),
    Remote(RemoteError),
    Invalid(String),
}

impl From<std::io::Error> for FixtureError {
    fn from(value: std::io::Error) -> Self {
        FixtureError::Io(value)
    }
}

impl From<toml::de::Error> for FixtureError {
    fn from(value: toml::de::Error) -> Self {
        FixtureError::Toml(value)
    }
}

impl From<RemoteError> for FixtureError {
    fn from(value: RemoteError) -> Self {
        FixtureError::Remote(value)
    }
}

impl Display for FixtureError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FixtureError::Io(e) => write!(f, "cannot read snapshot: {}", e),
            FixtureError::Toml(e) => write!(f, "malformed snapshot: {}", e),
            FixtureError::Remote(e) => write!(f, "inconsistent snapshot: {}", e),
            FixtureError::Invalid(msg) => write!(f, "invalid snapshot: {}", msg),
        }
    }
}

impl std::error::Error for FixtureError {}

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SnapshotFile {
    config: Option<ConfigSection>,
    #[serde(default)]
    types: Vec<TypeSection>,
    #[serde(default)]
    objects: Vec<ObjectSection>,
    frame: Option<FrameSection>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigSection {
    #[serde(default = "default_true")]
    direct_lookup_fallback: bool,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Deserialize)]
#[serde(rename_all = "lowercase")]
enum KindSection {
    #[default]
    Class,
    Interface,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct TypeSection {
    name: String,
    #[serde(default)]
    kind: KindSection,
    #[serde(rename = "super")]
    super_name: Option<String>,
    #[serde(default)]
    interfaces: Vec<String>,
    #[serde(default = "default_true")]
    prepared: bool,
    #[serde(default)]
    fields: Vec<FieldSection>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct FieldSection {
    name: String,
    descriptor: String,
    #[serde(default, rename = "static")]
    is_static: bool,
    value: Option<toml::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ObjectSection {
    id: String,
    #[serde(rename = "type")]
    type_name: String,
    #[serde(default)]
    fields: toml::Table,
    elements: Option<Vec<toml::Value>>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct FrameSection {
    this: Option<String>,
    declaring_type: Option<String>,
    #[serde(default)]
    locals: toml::Table,
}

/// A loaded snapshot, ready to be evaluated against.
pub struct Fixture {
    pub process: SnapshotProcess,
    pub frame: StackFrame,
    pub config: EvalConfig,
    objects: HashMap<String, ObjectId>,
}

impl Fixture {
    pub fn load(path: &Path) -> Result<Self, FixtureError> {
        debug_log!("Loading snapshot from {:?}", path);
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    pub fn parse(contents: &str) -> Result<Self, FixtureError> {
        let file: SnapshotFile = toml::from_str(contents)?;
        let mut process = SnapshotProcess::new();
        let type_ids = define_types(&mut process, &file.types)?;

        let mut objects = HashMap::new();
        for object in &file.objects {
            let id = if object.type_name.starts_with('[') {
                let array_type = process.define_array(&object.type_name)?;
                let length = object.elements.as_ref().map_or(0, Vec::len);
                process.new_array(array_type, length)?
            } else {
                let type_id = process
                    .class_by_name(&object.type_name)?
                    .ok_or_else(|| RemoteError::ClassNotLoaded(object.type_name.clone()))?;
                process.new_instance(type_id)?
            };
            if objects.insert(object.id.clone(), id).is_some() {
                return Err(FixtureError::Invalid(format!("duplicate object id {:?}", object.id)));
            }
        }

        let mut fixture = Fixture {
            process,
            frame: StackFrame::default(),
            config: EvalConfig::default(),
            objects,
        };
        fixture.populate(&file, &type_ids)?;
        if let Some(config) = &file.config {
            fixture.config.direct_lookup_fallback = config.direct_lookup_fallback;
        }
        if let Some(frame) = &file.frame {
            fixture.frame = fixture.build_frame(frame)?;
        }
        Ok(fixture)
    }

    pub fn object(&self, label: &str) -> Option<ObjectId> {
        self.objects.get(label).copied()
    }

    pub fn label_of(&self, obj: ObjectId) -> Option<&str> {
        self.objects
            .iter()
            .find(|(_, id)| **id == obj)
            .map(|(label, _)| label.as_str())
    }

    fn populate(&self, file: &SnapshotFile, type_ids: &[TypeId]) -> Result<(), FixtureError> {
        for (section, type_id) in file.types.iter().zip(type_ids) {
            for field in section.fields.iter().filter(|f| f.is_static) {
                if let Some(raw) = &field.value {
                    let signature = JavaType::try_from(field.descriptor.as_str())?;
                    let value = self.convert(Some(&signature), raw)?;
                    self.process.set_static_field(*type_id, &field.name, value)?;
                }
            }
        }
        // static values are written while prepared; unprepared classes are demoted afterwards
        for (section, type_id) in file.types.iter().zip(type_ids) {
            if !section.prepared {
                self.process.set_class_state(*type_id, ClassState::Loaded)?;
            }
        }

        for object in &file.objects {
            let id = self.objects[&object.id];
            for (name, raw) in &object.fields {
                let field = self.process.instance_field(id, name)?.ok_or_else(|| {
                    FixtureError::Invalid(format!("{} has no instance field {:?}", object.id, name))
                })?;
                let value = self.convert(Some(&field.signature), raw)?;
                self.process.write_field(id, &field, value)?;
            }
            if let Some(elements) = &object.elements {
                let element_type = match JavaType::try_from(object.type_name.as_str())? {
                    JavaType::Array(element) => *element,
                    _ => return Err(FixtureError::Invalid(format!("{} is not an array", object.id))),
                };
                for (index, raw) in elements.iter().enumerate() {
                    let value = self.convert(Some(&element_type), raw)?;
                    self.process.write_array_element(id, index, value)?;
                }
            }
        }
        Ok(())
    }

    fn build_frame(&self, section: &FrameSection) -> Result<StackFrame, FixtureError> {
        let this_object = section
            .this
            .as_deref()
            .map(|label| {
                self.object(label)
                    .ok_or_else(|| FixtureError::Invalid(format!("unknown object {:?}", label)))
            })
            .transpose()?;
        let locals = section
            .locals
            .iter()
            .map(|(name, raw)| Ok((name.clone(), self.convert(None, raw)?)))
            .collect::<Result<HashMap<_, _>, FixtureError>>()?;
        Ok(StackFrame {
            this_object,
            declaring_type: section.declaring_type.clone(),
            locals,
        })
    }

    /// Converts a TOML value to a target value. Without a declared type, integers become
    /// `int`, floats `double`; strings are `"null"` or `"@label"` object references.
    fn convert(&self, target: Option<&JavaType>, raw: &toml::Value) -> Result<Value, FixtureError> {
        let mismatch = || {
            FixtureError::Invalid(format!(
                "{} is not a valid {}",
                raw,
                target.map_or("value".to_string(), |t| t.to_string())
            ))
        };
        let integer = || raw.as_integer().ok_or_else(mismatch);
        let float = || {
            raw.as_float()
                .or_else(|| raw.as_integer().map(|i| i as f64))
                .ok_or_else(mismatch)
        };

        match target {
            Some(JavaType::Primitive(prim)) => match prim {
                PrimitiveType::Boolean => raw.as_bool().map(Value::Boolean).ok_or_else(mismatch),
                PrimitiveType::Byte => Ok(Value::Byte(i8::try_from(integer()?).map_err(|_| mismatch())?)),
                PrimitiveType::Short => Ok(Value::Short(i16::try_from(integer()?).map_err(|_| mismatch())?)),
                PrimitiveType::Int => Ok(Value::Integer(i32::try_from(integer()?).map_err(|_| mismatch())?)),
                PrimitiveType::Long => Ok(Value::Long(integer()?)),
                PrimitiveType::Float => Ok(Value::Float(float()? as f32)),
                PrimitiveType::Double => Ok(Value::Double(float()?)),
                PrimitiveType::Char => {
                    let text = raw.as_str().ok_or_else(mismatch)?;
                    let mut chars = text.chars();
                    match (chars.next(), chars.next()) {
                        (Some(c), None) => u16::try_from(c as u32)
                            .map(Value::Char)
                            .map_err(|_| mismatch()),
                        _ => Err(mismatch()),
                    }
                }
            },
            Some(_) => raw
                .as_str()
                .ok_or_else(mismatch)
                .and_then(|text| self.reference(text).ok_or_else(mismatch)),
            None => match raw {
                toml::Value::Integer(i) => Ok(i32::try_from(*i)
                    .map(Value::Integer)
                    .unwrap_or(Value::Long(*i))),
                toml::Value::Float(f) => Ok(Value::Double(*f)),
                toml::Value::Boolean(b) => Ok(Value::Boolean(*b)),
                toml::Value::String(text) => self.reference(text).ok_or_else(mismatch),
                _ => Err(mismatch()),
            },
        }
    }

    fn reference(&self, text: &str) -> Option<Value> {
        match text {
            "null" => Some(Value::Null),
            _ => text
                .strip_prefix('@')
                .and_then(|label| self.object(label))
                .map(Value::Object),
        }
    }
}

/// Defines types in dependency order: a type is defined once its superclass and interfaces are.
fn define_types(process: &mut SnapshotProcess, sections: &[TypeSection]) -> Result<Vec<TypeId>, FixtureError> {
    let mut ids: Vec<Option<TypeId>> = vec![None; sections.len()];
    let mut remaining = sections.len();
    while remaining > 0 {
        let before = remaining;
        for (idx, section) in sections.iter().enumerate() {
            if ids[idx].is_some() {
                continue;
            }
            let deps_ready = section
                .super_name
                .iter()
                .chain(section.interfaces.iter())
                .all(|dep| matches!(process.class_by_name(dep), Ok(Some(_))));
            if !deps_ready {
                continue;
            }
            let interfaces = section.interfaces.iter().map(String::as_str).collect::<Vec<_>>();
            let type_id = match section.kind {
                KindSection::Class => {
                    process.define_class(&section.name, section.super_name.as_deref(), &interfaces)?
                }
                KindSection::Interface => {
                    if section.super_name.is_some() {
                        return Err(FixtureError::Invalid(format!(
                            "interface {} cannot have a superclass",
                            section.name
                        )));
                    }
                    process.define_interface(&section.name, &interfaces)?
                }
            };
            for field in &section.fields {
                process.add_field(type_id, &field.name, &field.descriptor, field.is_static)?;
                if !field.is_static && field.value.is_some() {
                    return Err(FixtureError::Invalid(format!(
                        "instance field {}.{} takes its value from objects",
                        section.name, field.name
                    )));
                }
            }
            ids[idx] = Some(type_id);
            remaining -= 1;
        }
        if remaining == before {
            let unresolved = sections
                .iter()
                .zip(&ids)
                .filter(|(_, id)| id.is_none())
                .map(|(s, _)| s.name.as_str())
                .join(", ");
            return Err(FixtureError::Invalid(format!(
                "unresolvable supertypes for {}",
                unresolved
            )));
        }
    }
    Ok(ids.into_iter().flatten().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EvaluationError;
    use crate::eval::context::EvaluationContext;
    use crate::path::ExpressionBuilder;

    const SHAPES: &str = r#"
        [[types]]
        name = "com/example/Square"
        super = "com/example/Shape"
        fields = [{ name = "side", descriptor = "I" }]

        [[types]]
        name = "com/example/Shape"
        interfaces = ["com/example/Named"]
        fields = [
            { name = "COUNT", descriptor = "I", static = true, value = 2 },
            { name = "tag", descriptor = "C" },
        ]

        [[types]]
        name = "com/example/Named"
        kind = "interface"
        fields = [{ name = "PREFIX", descriptor = "Ljava/lang/Object;", static = true, value = "@sq" }]

        [[types]]
        name = "com/example/Lazy"
        prepared = false
        fields = [{ name = "CACHE", descriptor = "J", static = true, value = 9 }]

        [[objects]]
        id = "sq"
        type = "com/example/Square"
        fields = { side = 3, tag = "s" }

        [[objects]]
        id = "sizes"
        type = "[I"
        elements = [4, 5]

        [frame]
        this = "sq"
        declaring_type = "com/example/Square"
        locals = { n = 5, sizes = "@sizes", nothing = "null" }
    "#;

    fn eval(fixture: &Fixture, expr: &str) -> Result<Value, EvaluationError> {
        let ctx = EvaluationContext::new(&fixture.process, &fixture.frame).with_config(fixture.config);
        let tree = ExpressionBuilder::build(expr, &ctx)?;
        Ok(tree.evaluate(&ctx)?.as_value().unwrap())
    }

    #[test]
    fn loads_types_out_of_order() {
        let fixture = Fixture::parse(SHAPES).unwrap();
        let sq = fixture.object("sq").unwrap();
        assert_eq!(eval(&fixture, "side").unwrap(), Value::Integer(3));
        assert_eq!(eval(&fixture, "this.tag").unwrap(), Value::Char('s' as u16));
        assert_eq!(eval(&fixture, "COUNT").unwrap(), Value::Integer(2));
        assert_eq!(eval(&fixture, "com.example.Named.PREFIX").unwrap(), Value::Object(sq));
        assert_eq!(eval(&fixture, "sizes.length").unwrap(), Value::Integer(2));
        assert_eq!(fixture.label_of(sq), Some("sq"));
    }

    #[test]
    fn unprepared_types_keep_their_values_hidden() {
        let fixture = Fixture::parse(SHAPES).unwrap();
        assert_eq!(
            eval(&fixture, "com.example.Lazy.CACHE"),
            Err(EvaluationError::RemoteAccessFailure(RemoteError::ClassNotPrepared(
                "com/example/Lazy".to_string()
            )))
        );
    }

    #[test]
    fn rejects_cyclic_or_missing_supertypes() {
        let err = Fixture::parse(
            r#"
            [[types]]
            name = "a/A"
            super = "a/B"
            "#,
        )
        .err()
        .unwrap();
        insta::assert_snapshot!(err, @"invalid snapshot: unresolvable supertypes for a/A");
    }

    #[test]
    fn rejects_values_of_the_wrong_type() {
        let err = Fixture::parse(
            r#"
            [[types]]
            name = "a/A"
            fields = [{ name = "X", descriptor = "Z", static = true, value = 1 }]
            "#,
        )
        .err()
        .unwrap();
        insta::assert_snapshot!(err, @"invalid snapshot: 1 is not a valid boolean");
    }
}
