//! Episode-level operations: scanning, parsing and translations together.

use crate::ass::{self, DialogueEvent, ParsedDocument};
use crate::classify::LyricFilter;
use crate::error::{Error, Result};
use crate::model::Translation;
use crate::scan::{self, AnimeInfo, EpisodeInfo};
use crate::service::{new_translation, TranslationService};
use crate::store::KvStore;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, trace};

/// Everything needed to show one episode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EpisodeView {
    pub episode_id: String,
    pub episode_number: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub episode_title: Option<String>,
    pub anime_title: String,
    pub anime_id: String,
    pub subtitles: Vec<DialogueEvent>,
    pub translations: Vec<Translation>,
}

/// A subtitle library on disk plus the store holding its translations.
pub struct Library<S: ?Sized> {
    root: PathBuf,
    filter: LyricFilter,
    service: TranslationService<S>,
}

impl<S: KvStore + ?Sized> Library<S> {
    pub fn new<P: Into<PathBuf>>(root: P, store: Arc<S>) -> Self {
        Self {
            root: root.into(),
            filter: LyricFilter::default(),
            service: TranslationService::new(store),
        }
    }

    /// Use a different lyric filter when parsing episodes.
    pub fn with_filter(mut self, filter: LyricFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn service(&self) -> &TranslationService<S> {
        &self.service
    }

    pub fn list(&self) -> Vec<AnimeInfo> {
        scan::scan_library(&self.root)
    }

    /// Find, read and parse one episode.
    pub fn parse_episode(&self, episode_id: &str) -> Result<(AnimeInfo, EpisodeInfo, ParsedDocument)> {
        trace!("parse_episode episode_id={episode_id}");
        let (anime, episode) = scan::find_episode(&self.root, episode_id)?;
        let text = scan::read_subtitle_file(&episode.subtitle_path)?;
        let doc = ass::parse_with(&text, &self.filter);
        Ok((anime, episode, doc))
    }

    /// Parsed dialogue of an episode together with its saved translations.
    pub async fn load_episode(&self, episode_id: &str) -> Result<EpisodeView> {
        let (anime, episode, doc) = self.parse_episode(episode_id)?;
        let translations = self.service.get_episode_translations(&episode.id).await?;
        info!(
            "loaded {} with {} lines and {} translations",
            episode.id,
            doc.dialogues.len(),
            translations.len()
        );
        Ok(EpisodeView {
            episode_id: episode.id,
            episode_number: episode.number,
            episode_title: episode.title,
            anime_title: anime.title,
            anime_id: anime.id,
            subtitles: doc.dialogues,
            translations,
        })
    }

    /// Save a translation for a line that exists in the episode as parsed now.
    pub async fn submit_translation(
        &self,
        episode_id: &str,
        subtitle_id: &str,
        translated_text: &str,
    ) -> Result<Translation> {
        let (_, episode, doc) = self.parse_episode(episode_id)?;
        let line = doc
            .dialogues
            .iter()
            .find(|d| d.id == subtitle_id)
            .ok_or_else(|| {
                Error::not_found(format!("subtitle {subtitle_id} in episode {}", episode.id))
            })?;
        let translation = new_translation(&episode.id, subtitle_id, &line.text, translated_text)?;
        self.service.save_translation(&translation).await?;
        Ok(translation)
    }

    pub async fn remove_translation(&self, episode_id: &str, subtitle_id: &str) -> Result<()> {
        self.service.delete_translation(episode_id, subtitle_id).await
    }
}
