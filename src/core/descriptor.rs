use serde::Serialize;

use crate::core::kind::KnownKind;

/// 分区描述符：planner 交给 native executor 的分区参数
///
/// - `kind`：策略短名（"single" / "rr" / "hash" / "range"，集合开放，不做校验）
/// - `partition_count`：目标分区数，原样保存（0 或负数也接受）
/// - `expression_payload`：序列化后的分区键表达式，`None` 表示未提供
/// - `schema_payload`：序列化后的 schema，与表达式独立可选
///
/// 构造后不可变。`None` 与 `Some(vec![])` 是两种不同状态，编码时保持区分。
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PartitioningDescriptor {
    kind: String,
    partition_count: i32,
    expression_payload: Option<Vec<u8>>,
    schema_payload: Option<Vec<u8>>,
}

impl PartitioningDescriptor {
    pub fn new(
        kind: impl Into<String>,
        partition_count: i32,
        expression_payload: Option<Vec<u8>>,
        schema_payload: Option<Vec<u8>>,
    ) -> Self {
        Self {
            kind: kind.into(),
            partition_count,
            expression_payload,
            schema_payload,
        }
    }

    /// single / rr 这类不需要 payload 的策略
    pub fn without_payloads(kind: impl Into<String>, partition_count: i32) -> Self {
        Self::new(kind, partition_count, None, None)
    }

    pub fn with_expressions(
        kind: impl Into<String>,
        partition_count: i32,
        expression_payload: Vec<u8>,
    ) -> Self {
        Self::new(kind, partition_count, Some(expression_payload), None)
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn partition_count(&self) -> i32 {
        self.partition_count
    }

    pub fn expression_payload(&self) -> Option<&[u8]> {
        self.expression_payload.as_deref()
    }

    pub fn schema_payload(&self) -> Option<&[u8]> {
        self.schema_payload.as_deref()
    }

    /// 未识别的短名返回 `None`
    pub fn known_kind(&self) -> Option<KnownKind> {
        KnownKind::from_short_name(&self.kind)
    }

    /// 移交所有权给消费端（不拷贝 payload）
    pub fn into_parts(self) -> (String, i32, Option<Vec<u8>>, Option<Vec<u8>>) {
        (
            self.kind,
            self.partition_count,
            self.expression_payload,
            self.schema_payload,
        )
    }
}
