use crate::core::bounds::BoundsCalculator;
use crate::core::ids::DeckIds;
use crate::core::naming::MediaNamer;
use crate::domain::model::{
    AssembledDeck, CardModel, CardRecord, Deck, OmissionReason, OmittedTag, TagCatalog,
};
use crate::domain::ports::{RenderJob, Renderer};
use crate::utils::error::{GeoDeckError, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Turns every non-empty tag into a card backed by a rendered map.
pub struct CardAssembler<R: Renderer + 'static> {
    renderer: Arc<R>,
    bounds: BoundsCalculator,
    workers: usize,
}

enum Slot {
    Empty(String),
    Rendered,
}

impl<R: Renderer + 'static> CardAssembler<R> {
    pub fn new(renderer: Arc<R>, bounds: BoundsCalculator, workers: usize) -> Self {
        Self {
            renderer,
            bounds,
            workers: workers.max(1),
        }
    }

    pub async fn assemble(
        &self,
        catalog: &TagCatalog,
        deck_name: String,
        ids: DeckIds,
        workspace: &Path,
    ) -> Result<AssembledDeck> {
        let mut namer = MediaNamer::new();
        let mut slots = Vec::with_capacity(catalog.len());
        let mut jobs = Vec::new();

        for tag in catalog.iter() {
            match self.bounds.region_for(tag) {
                Ok(region) => {
                    slots.push(Slot::Rendered);
                    jobs.push(RenderJob {
                        tag: tag.clone(),
                        region,
                        output_path: workspace.join(namer.file_name_for(&tag.name)),
                    });
                }
                Err(GeoDeckError::EmptyTag { tag }) => {
                    tracing::warn!("⚠️ Skipping tag '{}': it has no locations", tag);
                    slots.push(Slot::Empty(tag));
                }
                Err(e) => return Err(e),
            }
        }

        tracing::info!(
            "🗺️ Rendering {} tags with {} ({} workers)",
            jobs.len(),
            self.bounds.policy(),
            self.workers
        );
        let mut rendered = self.render_all(&jobs).await.into_iter().zip(jobs.iter());

        let mut cards = Vec::with_capacity(jobs.len());
        let mut media_files = Vec::with_capacity(jobs.len());
        let mut omitted = Vec::new();

        // 依照目錄順序組出卡片
        for slot in slots {
            match slot {
                Slot::Empty(tag) => omitted.push(OmittedTag {
                    tag,
                    reason: OmissionReason::NoLocations,
                }),
                Slot::Rendered => {
                    let Some((result, job)) = rendered.next() else {
                        break;
                    };
                    match result {
                        Ok(image_path) => {
                            media_files.push(image_path.clone());
                            cards.push(CardRecord {
                                tag: job.tag.clone(),
                                image_path,
                            });
                        }
                        Err(e) => {
                            tracing::warn!("⚠️ Omitting tag '{}': {}", job.tag.name, e);
                            omitted.push(OmittedTag {
                                tag: job.tag.name.clone(),
                                reason: OmissionReason::RenderFailed(e.to_string()),
                            });
                        }
                    }
                }
            }
        }

        Ok(AssembledDeck {
            deck: Deck {
                id: ids.deck_id,
                name: deck_name,
                model: CardModel::standard(ids.model_id),
                cards,
            },
            media_files,
            omitted,
        })
    }

    /// Renders every job on the blocking pool, at most `workers` at a time.
    /// Results come back in job order; one failure never affects another job.
    async fn render_all(&self, jobs: &[RenderJob]) -> Vec<Result<PathBuf>> {
        let total = jobs.len();
        let semaphore = Arc::new(Semaphore::new(self.workers));
        let mut set = JoinSet::new();

        for (idx, job) in jobs.iter().cloned().enumerate() {
            let renderer = Arc::clone(&self.renderer);
            let semaphore = Arc::clone(&semaphore);
            set.spawn(async move {
                let _permit = semaphore.acquire_owned().await.ok();
                let tag = job.tag.name.clone();
                let result = tokio::task::spawn_blocking(move || renderer.render(&job))
                    .await
                    .unwrap_or_else(|e| {
                        Err(GeoDeckError::Render {
                            tag,
                            message: format!("render worker aborted: {}", e),
                        })
                    });
                (idx, result)
            });
        }

        let mut results: Vec<Option<Result<PathBuf>>> = (0..total).map(|_| None).collect();
        let mut done = 0;
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok((idx, result)) => {
                    done += 1;
                    tracing::debug!("Generating cards {}/{} ({})", done, total, jobs[idx].tag.name);
                    results[idx] = Some(result);
                }
                Err(e) => tracing::error!("Render task failed to join: {}", e),
            }
        }

        results
            .into_iter()
            .zip(jobs)
            .map(|(result, job)| {
                result.unwrap_or_else(|| {
                    Err(GeoDeckError::Render {
                        tag: job.tag.name.clone(),
                        message: "render task did not complete".to_string(),
                    })
                })
            })
            .collect()
    }
}
