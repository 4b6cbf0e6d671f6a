use std::fmt;

/// 已识别的分区策略
///
/// 描述符本身把 kind 当作不透明字符串；这里只是给消费端一个分类入口，
/// 未知名字返回 `None`，从不报错。
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum KnownKind {
    Single,
    RoundRobin,
    Hash,
    Range,
}

impl KnownKind {
    pub const ALL: [KnownKind; 4] = [
        KnownKind::Single,
        KnownKind::RoundRobin,
        KnownKind::Hash,
        KnownKind::Range,
    ];

    /// 精确匹配（区分大小写）
    pub fn from_short_name(name: &str) -> Option<Self> {
        match name {
            "single" => Some(KnownKind::Single),
            "rr" => Some(KnownKind::RoundRobin),
            "hash" => Some(KnownKind::Hash),
            "range" => Some(KnownKind::Range),
            _ => None,
        }
    }

    pub fn short_name(self) -> &'static str {
        match self {
            KnownKind::Single => "single",
            KnownKind::RoundRobin => "rr",
            KnownKind::Hash => "hash",
            KnownKind::Range => "range",
        }
    }

    /// hash / range 需要分区键表达式
    pub fn requires_expressions(self) -> bool {
        matches!(self, KnownKind::Hash | KnownKind::Range)
    }
}

impl fmt::Display for KnownKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}
