use crate::core::workspace::RenderWorkspace;
use crate::core::Pipeline;
use crate::domain::model::RunReport;
use crate::utils::error::Result;
use crate::utils::monitor::SystemMonitor;
use std::path::PathBuf;

/// Drives one conversion: extract, render into a scratch workspace, package.
pub struct DeckEngine<P: Pipeline> {
    pipeline: P,
    monitor: SystemMonitor,
    workspace_root: Option<PathBuf>,
}

impl<P: Pipeline> DeckEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self::new_with_monitoring(pipeline, false)
    }

    pub fn new_with_monitoring(pipeline: P, monitor_enabled: bool) -> Self {
        Self {
            pipeline,
            monitor: SystemMonitor::new(monitor_enabled),
            workspace_root: None,
        }
    }

    /// Creates the render workspace under `root` instead of the system temp directory.
    pub fn with_workspace_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.workspace_root = Some(root.into());
        self
    }

    pub async fn run(&self) -> Result<RunReport> {
        tracing::info!("🚀 Starting deck conversion");
        self.monitor.log_phase("Start");

        // Extract
        tracing::info!("📥 Reading input...");
        let document = self.pipeline.extract().await?;
        self.monitor.log_phase("Extract");

        // 工作目錄在離開此函式時一定會被刪除
        let workspace = match &self.workspace_root {
            Some(root) => RenderWorkspace::create_in(root)?,
            None => RenderWorkspace::create()?,
        };

        // Transform
        tracing::info!("🛠️ Building cards...");
        let assembled = self.pipeline.transform(document, workspace.path()).await?;
        self.monitor.log_phase("Transform");

        let deck_name = assembled.deck.name.clone();
        let card_count = assembled.deck.cards.len();
        let omitted = assembled.omitted.clone();

        // Load
        tracing::info!("📦 Writing package...");
        let output_path = self.pipeline.load(assembled).await?;
        self.monitor.log_phase("Load");

        // 套件已寫出，清理失敗不影響結果
        if let Err(e) = workspace.close() {
            tracing::warn!("⚠️ Could not remove render workspace: {}", e);
        }
        self.monitor.log_final_stats();

        tracing::info!(
            "✅ Deck '{}' with {} cards saved to {} ({} tags omitted)",
            deck_name,
            card_count,
            output_path,
            omitted.len()
        );

        Ok(RunReport {
            output_path,
            deck_name,
            card_count,
            omitted,
        })
    }
}
