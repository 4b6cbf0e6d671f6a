use thiserror::Error;
use xxhash_rust::xxh3::xxh3_64;

use crate::core::PartitioningDescriptor;

const MAGIC: u32 = 0x3144_504E; // "NPD1"
const VERSION_CURRENT: u32 = 1;
pub const HEADER_SIZE: usize = 4 + 4 + 4 + 8; // magic + version + body_len + checksum

const FLAG_ABSENT: u8 = 0;
const FLAG_PRESENT: u8 = 1;

/// 解码 / 编码失败原因
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    #[error("frame too short: {len} bytes, header needs 20")]
    TooShort { len: usize },

    #[error("magic mismatch: {found:#x} != {expected:#x}")]
    BadMagic { found: u32, expected: u32 },

    #[error("unsupported format version {0}")]
    UnsupportedVersion(u32),

    #[error("body length mismatch: header says {expected}, found {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("checksum mismatch: {computed:#x} != {stored:#x}")]
    ChecksumMismatch { computed: u64, stored: u64 },

    #[error("truncated while reading {field}")]
    Truncated { field: &'static str },

    #[error("invalid presence flag {flag} for {field}")]
    InvalidPresenceFlag { field: &'static str, flag: u8 },

    #[error("kind is not valid UTF-8")]
    InvalidUtf8,

    #[error("{count} trailing bytes after schema_payload")]
    TrailingBytes { count: usize },

    #[error("{field} is {len} bytes, exceeds u32 length prefix")]
    FieldTooLarge { field: &'static str, len: usize },
}

/// 帧格式（全部 LE）：
///
/// ```text
/// header: magic u32 | version u32 | body_len u32 | xxh3_64(body) u64
/// body:   kind_len u32 | kind utf8
///         partition_count i32
///         expr_flag u8 [| expr_len u32 | expr]
///         schema_flag u8 [| schema_len u32 | schema]
/// ```
///
/// flag 区分 “未提供” 与 “长度为 0”。
pub fn encode(desc: &PartitioningDescriptor) -> Result<Vec<u8>, CodecError> {
    let mut body = Vec::with_capacity(encoded_len(desc) - HEADER_SIZE);
    put_bytes(&mut body, "kind", desc.kind().as_bytes())?;
    body.extend_from_slice(&desc.partition_count().to_le_bytes());
    put_optional(&mut body, "expression_payload", desc.expression_payload())?;
    put_optional(&mut body, "schema_payload", desc.schema_payload())?;

    let body_len = len_u32("body", body.len())?;
    let mut out = Vec::with_capacity(HEADER_SIZE + body.len());
    out.extend_from_slice(&MAGIC.to_le_bytes());
    out.extend_from_slice(&VERSION_CURRENT.to_le_bytes());
    out.extend_from_slice(&body_len.to_le_bytes());
    out.extend_from_slice(&xxh3_64(&body).to_le_bytes());
    out.extend_from_slice(&body);
    Ok(out)
}

/// `encode` 输出的精确字节数
pub fn encoded_len(desc: &PartitioningDescriptor) -> usize {
    fn optional_len(p: Option<&[u8]>) -> usize {
        1 + p.map_or(0, |b| 4 + b.len())
    }
    HEADER_SIZE
        + 4
        + desc.kind().len()
        + 4
        + optional_len(desc.expression_payload())
        + optional_len(desc.schema_payload())
}

/// 校验 magic / version / body_len / checksum 后解析 body，任何不一致都拒绝。
pub fn decode(data: &[u8]) -> Result<PartitioningDescriptor, CodecError> {
    if data.len() < HEADER_SIZE {
        return Err(CodecError::TooShort { len: data.len() });
    }

    let mut header = Reader::new(&data[..HEADER_SIZE]);
    let magic = header.u32("magic")?;
    let version = header.u32("version")?;
    let body_len = header.u32("body_len")? as usize;
    let stored = header.u64("checksum")?;

    if magic != MAGIC {
        return Err(CodecError::BadMagic {
            found: magic,
            expected: MAGIC,
        });
    }
    if version != VERSION_CURRENT {
        return Err(CodecError::UnsupportedVersion(version));
    }

    let body = &data[HEADER_SIZE..];
    if body.len() != body_len {
        return Err(CodecError::LengthMismatch {
            expected: body_len,
            actual: body.len(),
        });
    }
    let computed = xxh3_64(body);
    if computed != stored {
        return Err(CodecError::ChecksumMismatch { computed, stored });
    }

    decode_body(body)
}

fn decode_body(body: &[u8]) -> Result<PartitioningDescriptor, CodecError> {
    let mut r = Reader::new(body);
    let kind = std::str::from_utf8(r.bytes("kind")?)
        .map_err(|_| CodecError::InvalidUtf8)?
        .to_string();
    let partition_count = r.i32("partition_count")?;
    let expression_payload = r.optional("expression_payload")?;
    let schema_payload = r.optional("schema_payload")?;

    if r.remaining() != 0 {
        return Err(CodecError::TrailingBytes {
            count: r.remaining(),
        });
    }

    Ok(PartitioningDescriptor::new(
        kind,
        partition_count,
        expression_payload,
        schema_payload,
    ))
}

fn len_u32(field: &'static str, len: usize) -> Result<u32, CodecError> {
    u32::try_from(len).map_err(|_| CodecError::FieldTooLarge { field, len })
}

fn put_bytes(out: &mut Vec<u8>, field: &'static str, bytes: &[u8]) -> Result<(), CodecError> {
    out.extend_from_slice(&len_u32(field, bytes.len())?.to_le_bytes());
    out.extend_from_slice(bytes);
    Ok(())
}

fn put_optional(
    out: &mut Vec<u8>,
    field: &'static str,
    bytes: Option<&[u8]>,
) -> Result<(), CodecError> {
    match bytes {
        None => out.push(FLAG_ABSENT),
        Some(b) => {
            out.push(FLAG_PRESENT);
            put_bytes(out, field, b)?;
        }
    }
    Ok(())
}

struct Reader<'a> {
    buf: &'a [u8],
    off: usize,
}

impl<'a> Reader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, off: 0 }
    }

    fn remaining(&self) -> usize {
        self.buf.len() - self.off
    }

    fn take(&mut self, field: &'static str, n: usize) -> Result<&'a [u8], CodecError> {
        let end = self
            .off
            .checked_add(n)
            .ok_or(CodecError::Truncated { field })?;
        let s = self
            .buf
            .get(self.off..end)
            .ok_or(CodecError::Truncated { field })?;
        self.off = end;
        Ok(s)
    }

    fn array<const N: usize>(&mut self, field: &'static str) -> Result<[u8; N], CodecError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(field, N)?);
        Ok(out)
    }

    fn u8(&mut self, field: &'static str) -> Result<u8, CodecError> {
        Ok(self.array::<1>(field)?[0])
    }

    fn u32(&mut self, field: &'static str) -> Result<u32, CodecError> {
        Ok(u32::from_le_bytes(self.array(field)?))
    }

    fn i32(&mut self, field: &'static str) -> Result<i32, CodecError> {
        Ok(i32::from_le_bytes(self.array(field)?))
    }

    fn u64(&mut self, field: &'static str) -> Result<u64, CodecError> {
        Ok(u64::from_le_bytes(self.array(field)?))
    }

    fn bytes(&mut self, field: &'static str) -> Result<&'a [u8], CodecError> {
        let len = self.u32(field)? as usize;
        self.take(field, len)
    }

    fn optional(&mut self, field: &'static str) -> Result<Option<Vec<u8>>, CodecError> {
        match self.u8(field)? {
            FLAG_ABSENT => Ok(None),
            FLAG_PRESENT => Ok(Some(self.bytes(field)?.to_vec())),
            flag => Err(CodecError::InvalidPresenceFlag { field, flag }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 手工拼帧：header 自动补齐，body 任意（用于构造损坏输入）
    fn frame(body: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&MAGIC.to_le_bytes());
        out.extend_from_slice(&VERSION_CURRENT.to_le_bytes());
        out.extend_from_slice(&(body.len() as u32).to_le_bytes());
        out.extend_from_slice(&xxh3_64(body).to_le_bytes());
        out.extend_from_slice(body);
        out
    }

    #[test]
    fn scenarios_survive_encode_decode() {
        let cases = [
            PartitioningDescriptor::without_payloads("single", 1),
            PartitioningDescriptor::without_payloads("rr", 8),
            PartitioningDescriptor::with_expressions("hash", 16, vec![0x01, 0x02]),
            PartitioningDescriptor::new("range", 4, Some(vec![0x0A]), Some(vec![0x0B, 0x0C])),
            PartitioningDescriptor::without_payloads("unknown-kind", -7),
            PartitioningDescriptor::new("hash", 200_000, Some(vec![0xFF; 4096]), Some(Vec::new())),
        ];
        for d in cases {
            let bytes = encode(&d).unwrap();
            assert_eq!(bytes.len(), encoded_len(&d));
            assert_eq!(decode(&bytes).unwrap(), d);
        }
    }

    #[test]
    fn body_layout_is_fixed_order_little_endian() {
        let d = PartitioningDescriptor::new("rr", 8, None, Some(vec![0xAB]));
        let bytes = encode(&d).unwrap();
        let body = &bytes[HEADER_SIZE..];
        assert_eq!(
            body,
            &[
                2u8, 0, 0, 0, b'r', b'r', // kind
                8, 0, 0, 0, // partition_count
                0, // expr absent
                1, 1, 0, 0, 0, 0xAB, // schema present
            ]
        );
        assert_eq!(&bytes[0..4], b"NPD1");
        assert_eq!(&bytes[4..8], &1u32.to_le_bytes());
        assert_eq!(&bytes[8..12], &(body.len() as u32).to_le_bytes());
    }

    #[test]
    fn empty_and_absent_payloads_encode_differently() {
        let empty = PartitioningDescriptor::new("hash", 2, Some(Vec::new()), None);
        let absent = PartitioningDescriptor::new("hash", 2, None, None);

        let eb = encode(&empty).unwrap();
        let ab = encode(&absent).unwrap();
        assert_ne!(eb, ab);
        assert_eq!(decode(&eb).unwrap().expression_payload(), Some(&[][..]));
        assert_eq!(decode(&ab).unwrap().expression_payload(), None);
    }

    #[test]
    fn short_input_is_rejected() {
        assert_eq!(decode(&[0u8; 5]), Err(CodecError::TooShort { len: 5 }));
    }

    #[test]
    fn header_corruption_is_rejected() {
        let good = encode(&PartitioningDescriptor::without_payloads("rr", 8)).unwrap();

        let mut bad_magic = good.clone();
        bad_magic[0] ^= 0xFF;
        assert!(matches!(decode(&bad_magic), Err(CodecError::BadMagic { .. })));

        let mut bad_version = good.clone();
        bad_version[4..8].copy_from_slice(&9u32.to_le_bytes());
        assert_eq!(decode(&bad_version), Err(CodecError::UnsupportedVersion(9)));

        let mut cut = good.clone();
        cut.pop();
        assert!(matches!(decode(&cut), Err(CodecError::LengthMismatch { .. })));
    }

    #[test]
    fn flipped_body_byte_fails_checksum() {
        let mut bytes = encode(&PartitioningDescriptor::with_expressions("hash", 4, vec![1, 2, 3])).unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 0x01;
        assert!(matches!(
            decode(&bytes),
            Err(CodecError::ChecksumMismatch { .. })
        ));
    }

    #[test]
    fn malformed_bodies_report_the_field() {
        // kind 长度声明 10，实际只有 2 字节
        let truncated = frame(&[10, 0, 0, 0, b'r', b'r']);
        assert_eq!(
            decode(&truncated),
            Err(CodecError::Truncated { field: "kind" })
        );

        let bad_flag = frame(&[2, 0, 0, 0, b'r', b'r', 8, 0, 0, 0, 7]);
        assert_eq!(
            decode(&bad_flag),
            Err(CodecError::InvalidPresenceFlag {
                field: "expression_payload",
                flag: 7
            })
        );

        let bad_utf8 = frame(&[1, 0, 0, 0, 0xFF, 8, 0, 0, 0, 0, 0]);
        assert_eq!(decode(&bad_utf8), Err(CodecError::InvalidUtf8));

        let trailing = frame(&[2, 0, 0, 0, b'r', b'r', 8, 0, 0, 0, 0, 0, 0xEE, 0xEE]);
        assert_eq!(
            decode(&trailing),
            Err(CodecError::TrailingBytes { count: 2 })
        );
    }
}
