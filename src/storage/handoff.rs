use anyhow::Context;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::core::PartitioningDescriptor;
use crate::storage::codec;

static TMP_SEQ: AtomicU64 = AtomicU64::new(0);

/// 描述符交接文件（planner 写，native executor 读，两边不共享内存）
///
/// 落盘流程：
/// 1) 编码为完整帧（header + body）
/// 2) 写 `<path>.tmp-<pid>-<seq>` 并 fsync（每次写入独占一个 tmp）
/// 3) rename(tmp, target) — 原子替换
/// 4) fsync(dir) — 确保目录项更新落盘
///
/// 读取端要么看到旧帧，要么看到新帧，不会看到写了一半的文件；
/// 并发写入同一路径时最后一次 rename 生效。
pub struct HandoffStore {
    path: PathBuf,
}

impl HandoffStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn tmp_path(&self) -> PathBuf {
        let seq = TMP_SEQ.fetch_add(1, Ordering::Relaxed);
        let mut name = self.path.as_os_str().to_os_string();
        name.push(format!(".tmp-{}-{}", std::process::id(), seq));
        PathBuf::from(name)
    }

    pub async fn write_atomic(&self, desc: &PartitioningDescriptor) -> anyhow::Result<()> {
        let parent = self.path.parent().filter(|p| !p.as_os_str().is_empty());
        if let Some(parent) = parent {
            fs::create_dir_all(parent).await?;
        }

        let frame = codec::encode(desc)?;
        let tmp_path = self.tmp_path();
        let written: std::io::Result<()> = async {
            let mut file = fs::File::create(&tmp_path).await?;
            file.write_all(&frame).await?;
            file.sync_all().await?;
            drop(file);
            fs::rename(&tmp_path, &self.path).await
        }
        .await;
        if let Err(e) = written {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(e).with_context(|| format!("write handoff {}", self.path.display()));
        }

        if let Some(parent) = parent {
            if let Ok(dir) = fs::File::open(parent).await {
                let _ = dir.sync_all().await;
            }
        }

        tracing::debug!(
            "Handoff written: {:?} kind={} partitions={} bytes={}",
            self.path,
            desc.kind(),
            desc.partition_count(),
            frame.len()
        );
        Ok(())
    }

    /// 严格读取：帧损坏时返回 `CodecError`
    pub async fn load(&self) -> anyhow::Result<PartitioningDescriptor> {
        let data = fs::read(&self.path)
            .await
            .with_context(|| format!("read handoff {}", self.path.display()))?;
        Ok(codec::decode(&data)?)
    }

    /// 宽松读取：文件不存在或帧损坏都返回 `Ok(None)`，只有 I/O 错误上抛
    pub async fn load_if_valid(&self) -> anyhow::Result<Option<PartitioningDescriptor>> {
        if !fs::try_exists(&self.path).await? {
            return Ok(None);
        }

        let data = fs::read(&self.path)
            .await
            .with_context(|| format!("read handoff {}", self.path.display()))?;
        match codec::decode(&data) {
            Ok(desc) => Ok(Some(desc)),
            Err(e) => {
                tracing::warn!("Handoff {:?} rejected: {}", self.path, e);
                Ok(None)
            }
        }
    }
}
