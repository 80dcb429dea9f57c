//! Translation and study-progress bookkeeping on top of a [`KvStore`].

use crate::error::{Error, Result};
use crate::key::{
    all_translations_pattern, normalize_episode_id, progress_key, progress_pattern,
    translation_key, translation_pattern,
};
use crate::model::{Record, Translation, UserProgress};
use crate::store::KvStore;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, trace, warn};

/// Totals shown on a user's study page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudyStats {
    pub total_episodes: usize,
    pub completed_subtitles: usize,
    pub total_translations: usize,
}

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Build a translation record stamped with the current time.
/// All four fields are required.
pub fn new_translation(
    episode_id: &str,
    subtitle_id: &str,
    original_text: &str,
    translated_text: &str,
) -> Result<Translation> {
    let missing: Vec<&str> = [
        ("episodeId", episode_id),
        ("subtitleId", subtitle_id),
        ("originalText", original_text),
        ("translatedText", translated_text),
    ]
    .iter()
    .filter(|(_, v)| v.trim().is_empty())
    .map(|(name, _)| *name)
    .collect();
    if !missing.is_empty() {
        return Err(Error::invalid_input(format!(
            "missing required fields: {}",
            missing.join(", ")
        )));
    }
    Ok(Translation {
        id: format!("{episode_id}-{subtitle_id}"),
        episode_id: episode_id.to_string(),
        subtitle_id: subtitle_id.to_string(),
        original_text: original_text.to_string(),
        translated_text: translated_text.to_string(),
        timestamp: now_millis(),
    })
}

/// Reads and writes translations and progress through a shared store.
pub struct TranslationService<S: ?Sized> {
    store: Arc<S>,
}

impl<S: ?Sized> Clone for TranslationService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: KvStore + ?Sized> TranslationService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub async fn save_translation(&self, translation: &Translation) -> Result<()> {
        let key = translation_key(&translation.episode_id, &translation.subtitle_id);
        debug!(key = %key, episode_id = %translation.episode_id, "saving translation");
        self.store.set(&key, translation.clone().into()).await
    }

    pub async fn get_translation(
        &self,
        episode_id: &str,
        subtitle_id: &str,
    ) -> Result<Option<Translation>> {
        let key = translation_key(episode_id, subtitle_id);
        Ok(self.store.get(&key).await?.and_then(|r| expect_translation(&key, r)))
    }

    /// All translations of an episode, whichever encoding of its id is given.
    pub async fn get_episode_translations(&self, episode_id: &str) -> Result<Vec<Translation>> {
        let pattern = translation_pattern(episode_id);
        trace!("get_episode_translations pattern={pattern}");
        let keys = self.store.keys(&pattern).await?;
        if keys.is_empty() {
            return Ok(Vec::new());
        }
        let records = self.store.mget(&keys).await?;
        let translations: Vec<Translation> = keys
            .iter()
            .zip(records)
            .filter_map(|(key, record)| record.and_then(|r| expect_translation(key, r)))
            .collect();
        debug!(
            "found {} translations for {}",
            translations.len(),
            normalize_episode_id(episode_id)
        );
        Ok(translations)
    }

    pub async fn delete_translation(&self, episode_id: &str, subtitle_id: &str) -> Result<()> {
        let key = translation_key(episode_id, subtitle_id);
        debug!(key = %key, "deleting translation");
        self.store.del(&key).await
    }

    pub async fn save_progress(&self, progress: &UserProgress) -> Result<()> {
        let key = progress_key(&progress.user_id, &progress.episode_id);
        self.store.set(&key, progress.clone().into()).await
    }

    pub async fn get_progress(&self, user_id: &str, episode_id: &str) -> Result<Option<UserProgress>> {
        let key = progress_key(user_id, episode_id);
        Ok(self.store.get(&key).await?.and_then(|r| expect_progress(&key, r)))
    }

    pub async fn get_all_progress(&self, user_id: &str) -> Result<Vec<UserProgress>> {
        let keys = self.store.keys(&progress_pattern(user_id)).await?;
        if keys.is_empty() {
            return Ok(Vec::new());
        }
        let records = self.store.mget(&keys).await?;
        Ok(keys
            .iter()
            .zip(records)
            .filter_map(|(key, record)| record.and_then(|r| expect_progress(key, r)))
            .collect())
    }

    /// Record that `user_id` finished a subtitle line. Repeats are no-ops.
    pub async fn mark_subtitle_completed(
        &self,
        user_id: &str,
        episode_id: &str,
        subtitle_id: &str,
    ) -> Result<UserProgress> {
        let mut progress = match self.get_progress(user_id, episode_id).await? {
            Some(p) => p,
            None => UserProgress {
                user_id: user_id.to_string(),
                episode_id: episode_id.to_string(),
                completed_subtitles: Vec::new(),
                last_position: 0,
                updated_at: now_millis(),
            },
        };
        if !progress.completed_subtitles.iter().any(|s| s == subtitle_id) {
            progress.completed_subtitles.push(subtitle_id.to_string());
            progress.updated_at = now_millis();
            self.save_progress(&progress).await?;
            info!(user_id, subtitle_id, "marked subtitle completed");
        }
        Ok(progress)
    }

    pub async fn study_stats(&self, user_id: &str) -> Result<StudyStats> {
        let progress = self.get_all_progress(user_id).await?;
        let translation_keys = self.store.keys(&all_translations_pattern()).await?;
        Ok(StudyStats {
            total_episodes: progress.len(),
            completed_subtitles: progress.iter().map(|p| p.completed_subtitles.len()).sum(),
            total_translations: translation_keys.len(),
        })
    }
}

fn expect_translation(key: &str, record: Record) -> Option<Translation> {
    let translation = record.into_translation();
    if translation.is_none() {
        warn!(key, "expected a translation record");
    }
    translation
}

fn expect_progress(key: &str, record: Record) -> Option<UserProgress> {
    let progress = record.into_progress();
    if progress.is_none() {
        warn!(key, "expected a progress record");
    }
    progress
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::encode_component;
    use crate::store::MemoryStore;

    const EPISODE: &str = "[CASO&I.G][K-ON!!]-ep01-1920x1080";

    fn service() -> TranslationService<MemoryStore> {
        TranslationService::new(Arc::new(MemoryStore::new()))
    }

    fn translation(subtitle: &str) -> Translation {
        new_translation(
            EPISODE,
            subtitle,
            "お姉ちゃん そろそろ起きないと…",
            "Big sister, you should get up soon...",
        )
        .unwrap()
    }

    #[tokio::test]
    async fn saves_and_reads_back() {
        let svc = service();
        let t = translation("0:00:31.29-0:00:33.78-tzj8xw");
        svc.save_translation(&t).await.unwrap();
        let got = svc
            .get_translation(EPISODE, "0:00:31.29-0:00:33.78-tzj8xw")
            .await
            .unwrap();
        assert_eq!(got, Some(t));
    }

    #[tokio::test]
    async fn any_encoding_of_the_episode_finds_translations() {
        let svc = service();
        svc.save_translation(&translation("s1")).await.unwrap();
        svc.save_translation(&translation("s2")).await.unwrap();

        let once = encode_component(EPISODE);
        let twice = encode_component(&once);
        for id in [EPISODE, once.as_str(), twice.as_str()] {
            assert_eq!(svc.get_episode_translations(id).await.unwrap().len(), 2);
        }
        assert!(svc.get_translation(&twice, "s1").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn episodes_do_not_share_translations() {
        let svc = service();
        svc.save_translation(&translation("s1")).await.unwrap();
        let other = "[CASO&I.G][K-ON!!]-ep02-1920x1080";
        assert!(svc.get_episode_translations(other).await.unwrap().is_empty());
        assert!(svc.get_translation(other, "s1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn delete_removes_only_that_line() {
        let svc = service();
        svc.save_translation(&translation("s1")).await.unwrap();
        svc.save_translation(&translation("s2")).await.unwrap();
        svc.delete_translation(EPISODE, "s1").await.unwrap();
        let left = svc.get_episode_translations(EPISODE).await.unwrap();
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].subtitle_id, "s2");
    }

    #[test]
    fn new_translation_requires_all_fields() {
        let err = new_translation(EPISODE, "s1", "", " ")
            .unwrap_err();
        match err {
            Error::InvalidInput(msg) => {
                assert!(msg.contains("originalText"));
                assert!(msg.contains("translatedText"));
            }
            other => panic!("unexpected error {other:?}"),
        }
        let t = translation("s1");
        assert_eq!(t.id, format!("{EPISODE}-s1"));
        assert!(t.timestamp > 0);
    }

    #[tokio::test]
    async fn progress_is_tracked_per_user() {
        let svc = service();
        svc.mark_subtitle_completed("u1", EPISODE, "s1").await.unwrap();
        svc.mark_subtitle_completed("u1", EPISODE, "s1").await.unwrap();
        let p = svc.mark_subtitle_completed("u1", EPISODE, "s2").await.unwrap();
        assert_eq!(p.completed_subtitles, vec!["s1", "s2"]);
        svc.mark_subtitle_completed("u1", "other-ep01", "x").await.unwrap();
        svc.mark_subtitle_completed("u2", EPISODE, "s1").await.unwrap();
        svc.save_translation(&translation("s1")).await.unwrap();

        assert_eq!(svc.get_all_progress("u1").await.unwrap().len(), 2);
        let stats = svc.study_stats("u1").await.unwrap();
        assert_eq!(
            stats,
            StudyStats {
                total_episodes: 2,
                completed_subtitles: 3,
                total_translations: 1,
            }
        );
    }

    #[tokio::test]
    async fn clear_resets_everything() {
        let svc = service();
        svc.save_translation(&translation("s1")).await.unwrap();
        svc.mark_subtitle_completed("u1", EPISODE, "s1").await.unwrap();
        svc.store().clear().await.unwrap();
        let stats = svc.store().stats().await.unwrap();
        assert_eq!(stats.translations_count + stats.progress_count, 0);
    }
}
