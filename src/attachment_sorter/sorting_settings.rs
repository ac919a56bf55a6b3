use serde::Deserialize;

pub const PLAIN_TEXT_EXTENSION: &str = ".txt";

fn default_allowed_extensions() -> Vec<String> {
    [".pdf", ".doc", ".docx", ".jpg", ".png"]
        .iter()
        .map(|ext| ext.to_string())
        .collect()
}

fn default_no_subject_sentinel() -> String {
    "无主题".to_string()
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct SortingSettings {
    #[serde(default = "default_allowed_extensions")]
    pub allowed_extensions: Vec<String>,
    /// Subject substituted for messages without one; never used for renames.
    #[serde(default = "default_no_subject_sentinel")]
    pub no_subject_sentinel: String,
}

impl Default for SortingSettings {
    fn default() -> Self {
        SortingSettings {
            allowed_extensions: default_allowed_extensions(),
            no_subject_sentinel: default_no_subject_sentinel(),
        }
    }
}

impl SortingSettings {
    pub fn with_plain_text(mut self, allow: bool) -> Self {
        let already_allowed = self
            .allowed_extensions
            .iter()
            .any(|ext| ext.eq_ignore_ascii_case(PLAIN_TEXT_EXTENSION));
        if allow && !already_allowed {
            self.allowed_extensions.push(PLAIN_TEXT_EXTENSION.to_string());
        }
        self
    }

    pub fn is_allowed(&self, filename: &str) -> bool {
        let lowercase = filename.to_lowercase();
        self.allowed_extensions
            .iter()
            .any(|ext| lowercase.ends_with(&ext.to_lowercase()))
    }
}
