use serde::{Deserialize, Serialize};

/// A user's translation of one dialogue line.
/// `subtitle_id` is a [`crate::ass::DialogueEvent`] id of the same episode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Translation {
    pub id: String,
    pub episode_id: String,
    pub subtitle_id: String,
    pub original_text: String,
    pub translated_text: String,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
}

/// How far a user got through an episode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProgress {
    pub user_id: String,
    pub episode_id: String,
    #[serde(default)]
    pub completed_subtitles: Vec<String>,
    #[serde(default)]
    pub last_position: u64,
    pub updated_at: i64,
}

/// A value held by a [`crate::store::KvStore`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Record {
    Translation(Translation),
    Progress(UserProgress),
}

impl Record {
    pub fn into_translation(self) -> Option<Translation> {
        match self {
            Record::Translation(t) => Some(t),
            Record::Progress(_) => None,
        }
    }

    pub fn into_progress(self) -> Option<UserProgress> {
        match self {
            Record::Progress(p) => Some(p),
            Record::Translation(_) => None,
        }
    }
}

impl From<Translation> for Record {
    fn from(t: Translation) -> Self {
        Record::Translation(t)
    }
}

impl From<UserProgress> for Record {
    fn from(p: UserProgress) -> Self {
        Record::Progress(p)
    }
}
