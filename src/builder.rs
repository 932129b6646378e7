//! Batch driver: one run renders and saves the cards for one news source.
//!
//! ```text
//! NewsClient::articles ──► [Article; n] ──► CardCompositor::compose ──► ImageWriter
//!                                             (per article, in order)
//! ```
//!
//! Cards are named `{source}-{NN}.jpg`, `NN` being the 1-based position of
//! the article, zero-padded to two digits. A card that fails to render or
//! save is reported and skipped; the rest of the batch still runs. Only a
//! failure to obtain the article list aborts the run.
//!
//! After the batch, cards left over from an earlier, larger run
//! (`{source}-{NN}.jpg` above the current count, up to [`MAX_COUNT`]) are
//! deleted so the output directory always holds exactly this run's cards.
//!
//! Progress is reported through an optional channel of [`BuildEvent`]s so
//! the CLI can print while the batch runs.

use crate::card::CardCompositor;
use crate::imaging::ImageBackend;
use crate::news::{NewsClient, NewsError};
use crate::writer::ImageWriter;
use std::fmt;
use std::sync::Arc;
use std::sync::mpsc::Sender;
use thiserror::Error;

/// Cards per run when the requested count is out of range.
pub const DEFAULT_COUNT: u32 = 10;
/// Largest number of cards per run.
pub const MAX_COUNT: u32 = 20;

#[derive(Error, Debug)]
pub enum BuildError {
    #[error("news source must not be empty")]
    MissingSource,
    #[error("API key must not be empty")]
    MissingKey,
    #[error("could not get articles: {0}")]
    News(#[from] NewsError),
}

/// Progress events emitted while a batch runs.
#[derive(Debug, Clone)]
pub enum BuildEvent {
    /// The article list is known; `count` cards will be rendered.
    Started {
        source: String,
        requested: u32,
        available: usize,
        count: usize,
    },
    CardWritten {
        index: usize,
        title: String,
        file_name: String,
        has_photo: bool,
    },
    CardFailed {
        index: usize,
        title: String,
        error: String,
    },
}

/// Outcome counts for a batch.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BuildSummary {
    pub written: usize,
    /// Written cards that show the placeholder instead of a photo.
    pub placeholders: usize,
    pub failed: usize,
}

impl fmt::Display for BuildSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} written", self.written)?;
        if self.placeholders > 0 {
            write!(f, " ({} without photo)", self.placeholders)?;
        }
        if self.failed > 0 {
            write!(f, ", {} failed", self.failed)?;
        }
        Ok(())
    }
}

/// `{source}-{NN}.jpg` for a 1-based `index`.
pub fn card_file_name(source: &str, index: usize) -> String {
    format!("{source}-{index:02}.jpg")
}

/// Clamp a requested card count: anything outside `1..=20` becomes 10.
pub fn effective_count(requested: u32) -> u32 {
    if (1..=MAX_COUNT).contains(&requested) {
        requested
    } else {
        tracing::warn!(
            requested,
            "count must be 1-{MAX_COUNT}, using {DEFAULT_COUNT}"
        );
        DEFAULT_COUNT
    }
}

pub struct NewsBuilder<B: ImageBackend> {
    news: NewsClient,
    compositor: CardCompositor<B>,
    writer: Arc<dyn ImageWriter>,
}

impl<B: ImageBackend> NewsBuilder<B> {
    pub fn new(
        news: NewsClient,
        compositor: CardCompositor<B>,
        writer: Arc<dyn ImageWriter>,
    ) -> Self {
        Self {
            news,
            compositor,
            writer,
        }
    }

    pub fn compositor(&self) -> &CardCompositor<B> {
        &self.compositor
    }

    /// Render and save up to `count` cards for `source`.
    pub fn create_images(
        &self,
        source: &str,
        key: &str,
        count: u32,
        events: Option<Sender<BuildEvent>>,
    ) -> Result<BuildSummary, BuildError> {
        if source.trim().is_empty() {
            return Err(BuildError::MissingSource);
        }
        if key.trim().is_empty() {
            return Err(BuildError::MissingKey);
        }
        let requested = count;
        let count = effective_count(count) as usize;

        let articles = self.news.articles(source, key)?;
        if articles.len() < count {
            tracing::info!(
                source,
                received = articles.len(),
                expected = count,
                "fewer articles than requested"
            );
        }
        let count = count.min(articles.len());
        emit(
            &events,
            BuildEvent::Started {
                source: source.to_string(),
                requested,
                available: articles.len(),
                count,
            },
        );

        let mut summary = BuildSummary::default();
        for (i, article) in articles.iter().take(count).enumerate() {
            let index = i + 1;
            let file_name = card_file_name(source, index);
            let result = self
                .compositor
                .compose(article)
                .map_err(|e| e.to_string())
                .and_then(|card| {
                    self.writer
                        .save_file(&file_name, &card.jpeg)
                        .map(|path| (card.has_photo, path))
                        .map_err(|e| format!("cannot write {file_name}: {e}"))
                });

            match result {
                Ok((has_photo, path)) => {
                    tracing::info!(path = %path.display(), "wrote card");
                    summary.written += 1;
                    if !has_photo {
                        summary.placeholders += 1;
                    }
                    emit(
                        &events,
                        BuildEvent::CardWritten {
                            index,
                            title: article.title.clone(),
                            file_name,
                            has_photo,
                        },
                    );
                }
                Err(error) => {
                    tracing::error!(source, index, %error, "card failed");
                    summary.failed += 1;
                    emit(
                        &events,
                        BuildEvent::CardFailed {
                            index,
                            title: article.title.clone(),
                            error,
                        },
                    );
                }
            }
        }

        for stale in count + 1..=MAX_COUNT as usize {
            self.writer.delete_file(&card_file_name(source, stale));
        }

        Ok(summary)
    }
}

fn emit(events: &Option<Sender<BuildEvent>>, event: BuildEvent) {
    if let Some(tx) = events {
        // A closed receiver only means nobody is printing.
        tx.send(event).ok();
    }
}
