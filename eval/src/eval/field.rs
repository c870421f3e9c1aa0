use crate::debug_log;
use crate::error::EvaluationError;
use crate::eval::context::EvaluationContext;
use crate::eval::{Binding, DeclaringEntity, EvaluationResult, Evaluator, Qualifier};
use crate::keys::{ObjectId, TypeId};
use crate::remote::{FieldRef, TypeKind};
use crate::resolve::HierarchyResolver;
use tracing_log::log::warn;

/// Arrays expose their element count through this pseudo-field.
pub const ARRAY_LENGTH_FIELD: &str = "length";

/// `qualifier.field_name`, where the qualifier is a class name or an object.
#[derive(Debug)]
pub struct FieldEvaluator {
    qualifier: Box<dyn Evaluator>,
    context_type: Option<String>,
    field_name: String,
}

impl FieldEvaluator {
    pub fn new(
        qualifier: Box<dyn Evaluator>,
        context_type: Option<String>,
        field_name: impl Into<String>,
    ) -> Self {
        Self {
            qualifier,
            context_type,
            field_name: field_name.into(),
        }
    }

    pub fn field_name(&self) -> &str {
        &self.field_name
    }

    fn find_field(
        &self,
        ctx: &EvaluationContext<'_>,
        ty: TypeId,
        accept: impl Fn(&FieldRef) -> bool,
    ) -> Result<Option<FieldRef>, EvaluationError> {
        let process = ctx.process();
        let resolved = HierarchyResolver::new(process)
            .with_owner_hint(self.context_type.as_deref())
            .resolve(ty, &self.field_name)?
            .filter(|f| accept(f));
        if resolved.is_some() || !ctx.config().direct_lookup_fallback {
            return Ok(resolved);
        }
        let direct = process
            .field_by_name(ty, &self.field_name)?
            .filter(|f| accept(f));
        if let Some(field) = &direct {
            warn!("Field \"{}\" found only by direct lookup on {}", field.name, ty);
        }
        Ok(direct)
    }

    fn evaluate_static(
        &self,
        ctx: &EvaluationContext<'_>,
        ty: TypeId,
    ) -> Result<EvaluationResult, EvaluationError> {
        let field = self
            .find_field(ctx, ty, |f| f.is_static)?
            .ok_or_else(|| EvaluationError::NoSuchStaticField(self.field_name.clone()))?;
        let value = ctx.process().read_static_field(ty, &field)?;
        Ok(EvaluationResult::bound(
            value,
            Binding {
                declaring: DeclaringEntity::Type(ty),
                field,
            },
        ))
    }

    fn evaluate_instance(
        &self,
        ctx: &EvaluationContext<'_>,
        obj: ObjectId,
    ) -> Result<EvaluationResult, EvaluationError> {
        let process = ctx.process();
        let ty = process.runtime_type(obj)?;
        match process.type_kind(ty)? {
            TypeKind::Class => {}
            TypeKind::Array => {
                if self.field_name == ARRAY_LENGTH_FIELD {
                    let length = process.array_length(obj)?;
                    return Ok(EvaluationResult::value(process.mirror_of_int(length)));
                }
            }
            TypeKind::Interface => {
                return Err(EvaluationError::TypeMismatch {
                    field: self.field_name.clone(),
                    found: process.type_name(ty)?.replace('/', "."),
                });
            }
        }

        let field = self
            .find_field(ctx, ty, |_| true)?
            .ok_or_else(|| EvaluationError::NoSuchField(self.field_name.clone()))?;
        if field.is_static {
            let value = process.read_static_field(ty, &field)?;
            Ok(EvaluationResult::bound(
                value,
                Binding {
                    declaring: DeclaringEntity::Type(ty),
                    field,
                },
            ))
        } else {
            let value = process.read_field(obj, &field)?;
            Ok(EvaluationResult::bound(
                value,
                Binding {
                    declaring: DeclaringEntity::Object(obj),
                    field,
                },
            ))
        }
    }

    #[hotpath::measure]
    fn evaluate_field(&self, ctx: &EvaluationContext<'_>) -> Result<EvaluationResult, EvaluationError> {
        let qualifier = self.qualifier.evaluate(ctx)?;
        let result = match Qualifier::classify(&qualifier.evaluated, &self.field_name)? {
            Qualifier::Null => Err(EvaluationError::NullDereference {
                field: self.field_name.clone(),
            }),
            Qualifier::TypeReference(ty) => self.evaluate_static(ctx, ty),
            Qualifier::ObjectHandle(obj) => self.evaluate_instance(ctx, obj),
        };
        debug_log!("Evaluated field \"{}\": {:?}", self.field_name, result);
        result
    }
}

impl Evaluator for FieldEvaluator {
    fn evaluate(&self, ctx: &EvaluationContext<'_>) -> Result<EvaluationResult, EvaluationError> {
        self.evaluate_field(ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EvalConfig;
    use crate::error::RemoteError;
    use crate::eval::context::StackFrame;
    use crate::eval::type_ref::TypeEvaluator;
    use crate::remote::{FieldType, Interfaces, RemoteProcess};
    use crate::snapshot::SnapshotProcess;
    use crate::value::Value;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Misses the first `misses` direct lookups and cannot name types.
    struct ForgetfulProcess {
        inner: SnapshotProcess,
        misses: AtomicUsize,
    }

    impl RemoteProcess for ForgetfulProcess {
        fn type_kind(&self, ty: TypeId) -> Result<TypeKind, RemoteError> {
            self.inner.type_kind(ty)
        }

        fn type_name(&self, _ty: TypeId) -> Result<String, RemoteError> {
            Err(RemoteError::Disconnected)
        }

        fn class_by_name(&self, name: &str) -> Result<Option<TypeId>, RemoteError> {
            self.inner.class_by_name(name)
        }

        fn field_by_name(&self, ty: TypeId, name: &str) -> Result<Option<FieldRef>, RemoteError> {
            let missed = self
                .misses
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok();
            if missed {
                return Ok(None);
            }
            self.inner.field_by_name(ty, name)
        }

        fn interfaces(&self, ty: TypeId) -> Result<Interfaces, RemoteError> {
            self.inner.interfaces(ty)
        }

        fn superclass(&self, ty: TypeId) -> Result<Option<TypeId>, RemoteError> {
            self.inner.superclass(ty)
        }

        fn runtime_type(&self, obj: ObjectId) -> Result<TypeId, RemoteError> {
            self.inner.runtime_type(obj)
        }

        fn read_field(&self, obj: ObjectId, field: &FieldRef) -> Result<Value, RemoteError> {
            self.inner.read_field(obj, field)
        }

        fn write_field(&self, obj: ObjectId, field: &FieldRef, value: Value) -> Result<(), RemoteError> {
            self.inner.write_field(obj, field, value)
        }

        fn read_static_field(&self, ty: TypeId, field: &FieldRef) -> Result<Value, RemoteError> {
            self.inner.read_static_field(ty, field)
        }

        fn write_static_field(
            &self,
            ty: TypeId,
            field: &FieldRef,
            value: Value,
        ) -> Result<(), RemoteError> {
            self.inner.write_static_field(ty, field, value)
        }

        fn array_length(&self, array: ObjectId) -> Result<i32, RemoteError> {
            self.inner.array_length(array)
        }

        fn field_type(&self, field: &FieldRef) -> Result<FieldType, RemoteError> {
            self.inner.field_type(field)
        }

        fn is_assignable(&self, from: TypeId, to: TypeId) -> Result<bool, RemoteError> {
            self.inner.is_assignable(from, to)
        }
    }

    fn forgetful() -> ForgetfulProcess {
        let mut inner = SnapshotProcess::new();
        let config = inner.define_class("com/example/Config", None, &[]).unwrap();
        inner.add_field(config, "LIMIT", "I", true).unwrap();
        inner.set_static_field(config, "LIMIT", Value::Integer(12)).unwrap();
        ForgetfulProcess {
            inner,
            misses: AtomicUsize::new(1),
        }
    }

    fn limit() -> FieldEvaluator {
        FieldEvaluator::new(Box::new(TypeEvaluator::new("com/example/Config")), None, "LIMIT")
    }

    #[test]
    fn direct_lookup_recovers_a_missed_resolution() {
        let process = forgetful();
        let frame = StackFrame::default();
        let ctx = EvaluationContext::new(&process, &frame);
        let result = limit().evaluate(&ctx).unwrap();
        assert_eq!(result.as_value(), Some(Value::Integer(12)));
    }

    #[test]
    fn missed_resolution_is_final_without_fallback() {
        let process = forgetful();
        let frame = StackFrame::default();
        let ctx = EvaluationContext::new(&process, &frame).with_config(EvalConfig {
            direct_lookup_fallback: false,
        });
        assert_eq!(
            limit().evaluate(&ctx).unwrap_err(),
            EvaluationError::NoSuchStaticField("LIMIT".to_string())
        );
    }
}
