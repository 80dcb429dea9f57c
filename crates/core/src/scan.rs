//! Discovery of anime and episodes in a subtitle library.
//!
//! Layout: `<root>/<anime dir>/<release name>.JP.ass`. Each anime directory
//! becomes an [`AnimeInfo`], each Japanese subtitle file an [`EpisodeInfo`].

use crate::decode::decode;
use crate::error::{Error, Result};
use crate::key::episode_ids_equal;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, trace, warn};
use walkdir::WalkDir;

static BRACKET_NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[(\d+)\]").unwrap());
static EP_NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)EP(\d+)").unwrap());
static RESOLUTION: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d{3,4}x\d{3,4})").unwrap());
static SUBTITLE_SUFFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\.(JP|jp)\.ass$").unwrap());
static LEADING_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\[.*?\]").unwrap());
static TRAILING_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[.*?\]$").unwrap());
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
static DASHES: Lazy<Regex> = Lazy::new(|| Regex::new(r"-+").unwrap());

/// One anime directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnimeInfo {
    pub id: String,
    pub title: String,
    pub episodes: Vec<EpisodeInfo>,
}

/// One episode subtitle file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EpisodeInfo {
    pub id: String,
    pub number: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub subtitle_path: PathBuf,
    pub anime_id: String,
}

/// Scan `root` for anime directories with at least one episode.
/// An unreadable root is logged and yields an empty list.
pub fn scan_library(root: &Path) -> Vec<AnimeInfo> {
    trace!("scan_library root={}", root.display());
    let entries = match fs::read_dir(root) {
        Ok(entries) => entries,
        Err(e) => {
            warn!("failed to read subtitle library {}: {e}", root.display());
            return Vec::new();
        }
    };

    let mut anime_list = Vec::new();
    for entry in entries.flatten() {
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }
        let dir_name = entry.file_name().to_string_lossy().to_string();
        let episodes = scan_episodes(&path, &dir_name);
        if episodes.is_empty() {
            continue;
        }
        anime_list.push(AnimeInfo {
            id: anime_id(&dir_name),
            title: anime_title(&dir_name),
            episodes,
        });
    }
    anime_list.sort_by(|a, b| a.title.cmp(&b.title));
    debug!("found {} anime in {}", anime_list.len(), root.display());
    anime_list
}

fn scan_episodes(anime_path: &Path, dir_name: &str) -> Vec<EpisodeInfo> {
    let mut episodes = Vec::new();
    let files = WalkDir::new(anime_path)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file());
    for entry in files {
        let file_name = entry.file_name().to_string_lossy();
        if !is_japanese_subtitle(&file_name) {
            continue;
        }
        let Some(number) = episode_number(&file_name) else {
            debug!("no episode number in {file_name}, skipping");
            continue;
        };
        episodes.push(EpisodeInfo {
            id: episode_id(dir_name, number, Some(file_name.as_ref())),
            number,
            title: None,
            subtitle_path: entry.path().to_path_buf(),
            anime_id: anime_id(dir_name),
        });
    }
    episodes.sort_by_key(|e| e.number);
    episodes
}

fn is_japanese_subtitle(file_name: &str) -> bool {
    file_name.ends_with(".JP.ass") || file_name.ends_with(".jp.ass")
}

/// Episode number from a file name: `[NN]` first, then `EPNN`.
pub fn episode_number(file_name: &str) -> Option<u32> {
    BRACKET_NUMBER
        .captures(file_name)
        .or_else(|| EP_NUMBER.captures(file_name))
        .and_then(|caps| caps[1].parse().ok())
}

/// Anime id: the directory name with whitespace runs turned into single dashes.
pub fn anime_id(dir_name: &str) -> String {
    let id = WHITESPACE.replace_all(dir_name.trim(), "-");
    let id = DASHES.replace_all(&id, "-");
    if id.is_empty() {
        "anime".to_string()
    } else {
        id.into_owned()
    }
}

/// Display title: the directory name without leading/trailing release tags.
pub fn anime_title(dir_name: &str) -> String {
    let title = LEADING_TAG.replace(dir_name, "");
    let title = TRAILING_TAG.replace(&title, "");
    let title = title.trim();
    if title.is_empty() {
        dir_name.to_string()
    } else {
        title.to_string()
    }
}

/// `<anime id>-ep<NN>[-<WxH>]`
pub fn episode_id(dir_name: &str, number: u32, file_name: Option<&str>) -> String {
    let anime = anime_id(dir_name);
    let Some(file_name) = file_name else {
        return format!("{anime}-ep{number:02}");
    };
    let base = SUBTITLE_SUFFIX.replace(file_name, "");
    let episode = match BRACKET_NUMBER.captures(&base) {
        Some(caps) => format!("{:0>2}", &caps[1]),
        None => format!("{number:02}"),
    };
    match RESOLUTION.captures(&base) {
        Some(caps) => format!("{anime}-ep{episode}-{}", &caps[1]),
        None => format!("{anime}-ep{episode}"),
    }
}

/// Look an episode up by id. Ids compare modulo percent-encoding.
pub fn find_episode(root: &Path, episode_id: &str) -> Result<(AnimeInfo, EpisodeInfo)> {
    for anime in scan_library(root) {
        if let Some(episode) = anime
            .episodes
            .iter()
            .find(|ep| episode_ids_equal(&ep.id, episode_id))
            .cloned()
        {
            return Ok((anime, episode));
        }
    }
    Err(Error::not_found(format!("episode {episode_id}")))
}

/// Read and decode a subtitle file.
pub fn read_subtitle_file(path: &Path) -> Result<String> {
    trace!("read_subtitle_file path={}", path.display());
    match fs::read(path) {
        Ok(bytes) => Ok(decode(&bytes)),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            Err(Error::not_found(format!("subtitle file {}", path.display())))
        }
        Err(e) => Err(e.into()),
    }
}
