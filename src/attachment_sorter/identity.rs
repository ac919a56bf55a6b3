use regex::Regex;
use serde::Serialize;

use crate::attachment_sorter::category::fold_fullwidth_digits;

/// Student ID and name guessed from a text fragment, used only to spot resubmissions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StudentIdentity {
    pub id: Option<String>,
    pub name: Option<String>,
}

pub struct IdentityExtractor {
    student_id: Regex,
    noise: Regex,
    non_name: Regex,
    han_name: Regex,
}

impl IdentityExtractor {
    pub fn new() -> Result<Self, regex::Error> {
        Ok(IdentityExtractor {
            student_id: Regex::new(r"[0-9]{8,}")?,
            noise: Regex::new(r"(?i)实验|作业|报告|课堂|文档|提交|修改|版|第|次|LAB|Homework")?,
            non_name: Regex::new(r"[A-Za-z0-9._\-()\s]")?,
            han_name: Regex::new(r"\p{Han}{2,4}")?,
        })
    }

    pub fn extract(&self, text: &str) -> StudentIdentity {
        let text = fold_fullwidth_digits(text);
        let id = self.student_id.find(&text).map(|m| m.as_str().to_string());
        let without_noise = self.noise.replace_all(&text, "");
        let remainder = self.non_name.replace_all(&without_noise, "");
        let name = self.han_name.find(&remainder).map(|m| m.as_str().to_string());
        StudentIdentity { id, name }
    }
}
