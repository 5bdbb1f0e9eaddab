use crate::utils::error::Result;
use std::path::Path;
use tempfile::TempDir;

const WORKSPACE_PREFIX: &str = "geotag-plots-";

/// Scratch directory for rendered images. Removed on drop, whatever the outcome of the run.
#[derive(Debug)]
pub struct RenderWorkspace {
    dir: TempDir,
}

impl RenderWorkspace {
    pub fn create() -> Result<Self> {
        let dir = tempfile::Builder::new().prefix(WORKSPACE_PREFIX).tempdir()?;
        tracing::debug!("Created render workspace at {}", dir.path().display());
        Ok(Self { dir })
    }

    pub fn create_in(parent: &Path) -> Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix(WORKSPACE_PREFIX)
            .tempdir_in(parent)?;
        tracing::debug!("Created render workspace at {}", dir.path().display());
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Removes the directory and reports failures instead of ignoring them.
    pub fn close(self) -> Result<()> {
        let path = self.dir.path().to_path_buf();
        self.dir.close()?;
        tracing::debug!("Removed render workspace {}", path.display());
        Ok(())
    }
}
