//! Calendar data directory layout
//!
//! ```text
//! <data_dir>/
//!   temporale.json                       core event list (JSON array)
//!   i18n/<locale>.json                   event_key -> display name
//!   lectionary/<category>/<locale>.json  flat categories
//!   lectionary/<category>/<YEAR>/<locale>.json   cycled categories
//!   lectionary/<category>/common/<locale>.json   cycled categories,
//!                                                entries with no year data
//! ```
//!
//! Locale availability is discovered from the filesystem: i18n locales are
//! the files under i18n/, lectionary locales are the files under the
//! Year-A folder of sundays_solemnities and the Year-I folder of
//! weekdays_ordinary (the authoritative folders; other year folders are
//! expected, but not required, to mirror them), plus the common folders
//! so that a calendar holding only non-year entries still resolves.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::temporale::classifier::{LectionaryCategory, YearCycle};
use crate::types::Result;

/// Subfolder of a cycled category holding entries without year-cycle data
pub const COMMON_FOLDER: &str = "common";

const ALL_CATEGORIES: [LectionaryCategory; 7] = [
    LectionaryCategory::SundaysSolemnities,
    LectionaryCategory::WeekdaysAdvent,
    LectionaryCategory::WeekdaysChristmas,
    LectionaryCategory::WeekdaysLent,
    LectionaryCategory::WeekdaysEaster,
    LectionaryCategory::WeekdaysOrdinary,
    LectionaryCategory::Sanctorum,
];

#[derive(Debug, Clone)]
pub struct CalendarPaths {
    root: PathBuf,
}

impl CalendarPaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The core event list file
    pub fn core_file(&self) -> PathBuf {
        self.root.join("temporale.json")
    }

    pub fn i18n_dir(&self) -> PathBuf {
        self.root.join("i18n")
    }

    pub fn i18n_file(&self, locale: &str) -> PathBuf {
        self.i18n_dir().join(format!("{}.json", locale))
    }

    pub fn lectionary_dir(&self) -> PathBuf {
        self.root.join("lectionary")
    }

    /// File of a flat category (or the sanctorum store) for a locale
    pub fn flat_file(&self, category: LectionaryCategory, locale: &str) -> PathBuf {
        self.lectionary_dir()
            .join(category.folder())
            .join(format!("{}.json", locale))
    }

    /// File of a cycled category for a year label and locale.
    /// Fails for flat categories or labels outside the cycle.
    pub fn year_file(
        &self,
        category: LectionaryCategory,
        label: &str,
        locale: &str,
    ) -> Result<PathBuf> {
        let folder = category.year_folder(label)?;
        Ok(self
            .lectionary_dir()
            .join(folder)
            .join(format!("{}.json", locale)))
    }

    /// File of a cycled category holding entries submitted without
    /// year-cycle data
    pub fn common_file(&self, category: LectionaryCategory, locale: &str) -> PathBuf {
        self.lectionary_dir()
            .join(category.folder())
            .join(COMMON_FOLDER)
            .join(format!("{}.json", locale))
    }

    /// All lectionary files a category can store entries in, across every
    /// locale currently on disk. Used by the delete reconciler.
    pub async fn category_files(&self, category: LectionaryCategory) -> Vec<PathBuf> {
        let mut folders = Vec::new();
        match category.cycle() {
            YearCycle::None => folders.push(self.lectionary_dir().join(category.folder())),
            cycle => {
                for label in cycle.labels() {
                    folders.push(self.lectionary_dir().join(category.folder()).join(label));
                }
                folders.push(
                    self.lectionary_dir()
                        .join(category.folder())
                        .join(COMMON_FOLDER),
                );
            }
        }

        let mut files = Vec::new();
        for folder in folders {
            files.extend(list_json_files(&folder).await);
        }
        files
    }

    /// Every lectionary file on disk, across all categories and locales
    pub async fn all_lectionary_files(&self) -> Vec<PathBuf> {
        let mut files = Vec::new();
        for category in ALL_CATEGORIES {
            files.extend(self.category_files(category).await);
        }
        files
    }

    /// Locales with a name-translation file
    pub async fn i18n_locales(&self) -> BTreeSet<String> {
        list_json_stems(&self.i18n_dir()).await
    }

    /// Locales with lectionary data, discovered from the authoritative
    /// Year-A and Year-I folders plus the common folders (a young
    /// calendar may hold nothing but non-year entries)
    pub async fn lectionary_locales(&self) -> BTreeSet<String> {
        let sundays = self
            .lectionary_dir()
            .join(LectionaryCategory::SundaysSolemnities.folder());
        let ordinary = self
            .lectionary_dir()
            .join(LectionaryCategory::WeekdaysOrdinary.folder());

        let mut locales = list_json_stems(&sundays.join("A")).await;
        locales.extend(list_json_stems(&ordinary.join("I")).await);
        locales.extend(list_json_stems(&sundays.join(COMMON_FOLDER)).await);
        locales.extend(list_json_stems(&ordinary.join(COMMON_FOLDER)).await);
        locales
    }
}

async fn list_json_files(dir: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    let Ok(mut entries) = fs::read_dir(dir).await else {
        return files;
    };
    while let Ok(Some(entry)) = entries.next_entry().await {
        let path = entry.path();
        if path.extension().is_some_and(|ext| ext == "json") {
            files.push(path);
        }
    }
    files.sort();
    files
}

async fn list_json_stems(dir: &Path) -> BTreeSet<String> {
    list_json_files(dir)
        .await
        .into_iter()
        .filter_map(|p| p.file_stem().map(|s| s.to_string_lossy().into_owned()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_layout() {
        let paths = CalendarPaths::new("/data");
        assert_eq!(paths.core_file(), PathBuf::from("/data/temporale.json"));
        assert_eq!(paths.i18n_file("en"), PathBuf::from("/data/i18n/en.json"));
        assert_eq!(
            paths.flat_file(LectionaryCategory::Sanctorum, "la"),
            PathBuf::from("/data/lectionary/sanctorum/la.json")
        );
        assert_eq!(
            paths
                .year_file(LectionaryCategory::SundaysSolemnities, "b", "en")
                .unwrap(),
            PathBuf::from("/data/lectionary/sundays_solemnities/B/en.json")
        );
        assert_eq!(
            paths.common_file(LectionaryCategory::SundaysSolemnities, "en"),
            PathBuf::from("/data/lectionary/sundays_solemnities/common/en.json")
        );
    }

    #[test]
    fn test_year_file_rejects_flat_category() {
        let paths = CalendarPaths::new("/data");
        assert!(paths
            .year_file(LectionaryCategory::WeekdaysLent, "A", "en")
            .is_err());
    }

    #[tokio::test]
    async fn test_locale_discovery() {
        let dir = TempDir::new().unwrap();
        let paths = CalendarPaths::new(dir.path());

        for locale in ["en", "la"] {
            let file = paths.i18n_file(locale);
            std::fs::create_dir_all(file.parent().unwrap()).unwrap();
            std::fs::write(&file, "{}").unwrap();
        }
        let sundays_a = paths
            .year_file(LectionaryCategory::SundaysSolemnities, "A", "it")
            .unwrap();
        std::fs::create_dir_all(sundays_a.parent().unwrap()).unwrap();
        std::fs::write(&sundays_a, "{}").unwrap();
        let ordinary_i = paths
            .year_file(LectionaryCategory::WeekdaysOrdinary, "I", "la")
            .unwrap();
        std::fs::create_dir_all(ordinary_i.parent().unwrap()).unwrap();
        std::fs::write(&ordinary_i, "{}").unwrap();
        let common = paths.common_file(LectionaryCategory::SundaysSolemnities, "pt");
        std::fs::create_dir_all(common.parent().unwrap()).unwrap();
        std::fs::write(&common, "{}").unwrap();

        let i18n = paths.i18n_locales().await;
        assert_eq!(i18n.into_iter().collect::<Vec<_>>(), vec!["en", "la"]);

        let lectionary = paths.lectionary_locales().await;
        assert_eq!(
            lectionary.into_iter().collect::<Vec<_>>(),
            vec!["it", "la", "pt"]
        );
    }

    #[tokio::test]
    async fn test_category_files_globs_year_and_common_folders() {
        let dir = TempDir::new().unwrap();
        let paths = CalendarPaths::new(dir.path());
        let category = LectionaryCategory::SundaysSolemnities;

        for label in ["A", "B"] {
            let file = paths.year_file(category, label, "en").unwrap();
            std::fs::create_dir_all(file.parent().unwrap()).unwrap();
            std::fs::write(&file, "{}").unwrap();
        }
        let common = paths.common_file(category, "en");
        std::fs::create_dir_all(common.parent().unwrap()).unwrap();
        std::fs::write(&common, "{}").unwrap();

        let files = paths.category_files(category).await;
        assert_eq!(files.len(), 3);
    }
}
