use thiserror::Error;

use crate::core::descriptor::PartitioningDescriptor;
use crate::core::kind::KnownKind;

/// 可选的提前校验失败原因
///
/// 描述符构造本身从不校验；只有显式调用 [`validate`] 才会走到这里。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("unknown partitioning kind {0:?}")]
    UnknownKind(String),

    #[error("partition count must be at least 1, got {0}")]
    NonPositivePartitionCount(i32),

    #[error("{0} partitioning requires an expression payload")]
    MissingExpressions(KnownKind),

    #[error("single partitioning expects exactly 1 partition, got {0}")]
    SinglePartitionCount(i32),
}

/// 按顺序检查：kind → 分区数 → 表达式 → single 分区数，返回第一个失败。
///
/// 空（但存在）的表达式 payload 视为已提供，内容由 native 端解释。
pub fn validate(desc: &PartitioningDescriptor) -> Result<KnownKind, ValidationError> {
    let kind = desc
        .known_kind()
        .ok_or_else(|| ValidationError::UnknownKind(desc.kind().to_string()))?;

    let n = desc.partition_count();
    if n < 1 {
        return Err(ValidationError::NonPositivePartitionCount(n));
    }
    if kind.requires_expressions() && desc.expression_payload().is_none() {
        return Err(ValidationError::MissingExpressions(kind));
    }
    if kind == KnownKind::Single && n != 1 {
        return Err(ValidationError::SinglePartitionCount(n));
    }
    Ok(kind)
}
