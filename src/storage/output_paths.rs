use anyhow::{Context, Result};
use chrono::Utc;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Output file layout for one run. Dated runs land under
/// `<base>/YYYY/MM/DD/<run id>/`.
#[derive(Debug, Clone)]
pub struct OutputPaths {
    root: PathBuf,
    run_id: Uuid,
}

impl OutputPaths {
    pub fn new(base: impl AsRef<Path>, dated: bool) -> Self {
        let run_id = Uuid::new_v4();
        let base = base.as_ref();
        let root = if dated {
            let date = Utc::now().format("%Y/%m/%d").to_string();
            base.join(date).join(run_id.to_string())
        } else {
            base.to_path_buf()
        };
        Self { root, run_id }
    }

    pub fn ensure_dirs(&self) -> Result<()> {
        std::fs::create_dir_all(&self.root)
            .with_context(|| format!("Failed to create output directory: {}", self.root.display()))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn table(&self, name: &str, extension: &str) -> PathBuf {
        self.root.join(format!("{name}.{extension}"))
    }

    pub fn summary(&self) -> PathBuf {
        self.root.join("summary.json")
    }
}
