//! Category normalization: raw list file name -> canonical output category.

use std::collections::{HashMap, HashSet};

use crate::config::Config;

/// Outcome of normalizing one raw file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Category {
    /// The file is on the exclusion list and must never be read.
    Excluded,
    /// The file contributes to this canonical category.
    Canonical(String),
}

impl Category {
    pub fn is_included(&self) -> bool {
        matches!(self, Category::Canonical(_))
    }
}

/// Maps raw file names to canonical categories using an exclusion set and a
/// merge table. Both tables are fixed for the lifetime of the normalizer.
#[derive(Debug, Clone, Default)]
pub struct CategoryNormalizer {
    exclusions: HashSet<String>,
    merge_table: HashMap<String, String>,
    suffix: String,
}

impl CategoryNormalizer {
    /// Build a normalizer. Exclusion names and merge keys are matched lowercase.
    pub fn new<E, M, K, V>(exclusions: E, merge_table: M, list_extension: &str) -> Self
    where
        E: IntoIterator,
        E::Item: AsRef<str>,
        M: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        Self {
            exclusions: exclusions
                .into_iter()
                .map(|e| e.as_ref().to_lowercase())
                .collect(),
            merge_table: merge_table
                .into_iter()
                .map(|(k, v)| (k.as_ref().to_lowercase(), v.into()))
                .collect(),
            suffix: format!(".{}", list_extension.to_lowercase()),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            &config.exclusions,
            config
                .category_merge
                .iter()
                .map(|(k, v)| (k.as_str(), v.clone())),
            &config.list_extension,
        )
    }

    /// Check a file name against the exclusion set (case-insensitive).
    pub fn is_excluded(&self, file_name: &str) -> bool {
        self.exclusions.contains(&file_name.to_lowercase())
    }

    /// Lowercased file name with the list suffix stripped.
    pub fn raw_category(&self, file_name: &str) -> String {
        let lower = file_name.to_lowercase();
        if let Some(stem) = lower.strip_suffix(self.suffix.as_str()) {
            return stem.to_string();
        }
        lower
    }

    /// Check whether a file name carries the recognized list suffix.
    pub fn has_list_suffix(&self, file_name: &str) -> bool {
        file_name.to_lowercase().ends_with(&self.suffix)
    }

    /// List file name for a raw category (`Ads` -> `ads.txt`).
    pub fn list_file_name(&self, raw_category: &str) -> String {
        format!("{}{}", raw_category.to_lowercase(), self.suffix)
    }

    /// Normalize a raw file name.
    pub fn normalize(&self, file_name: &str) -> Category {
        if self.is_excluded(file_name) {
            return Category::Excluded;
        }

        let raw = self.raw_category(file_name);
        match self.merge_table.get(&raw) {
            Some(mapped) => Category::Canonical(mapped.clone()),
            None => Category::Canonical(raw),
        }
    }
}
