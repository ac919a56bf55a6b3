use regex::Regex;
use serde::Serialize;
use std::borrow::Cow;
use std::fmt;

// A run of ASCII digits or of Chinese numerals.
const NUMBER: &str = r"([0-9]+|[一二三四五六七八九十]+)";

// `lab` not glued to a preceding Latin letter ("label", "collab").
const LAB_KEYWORD: &str = r"(?:^|[^a-z])lab";

/// Assignment family and sequence number detected in a subject or filename.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Category {
    Lab(u32),
    ClassAssignment(u32),
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Category::Lab(n) => write!(f, "LAB{}", n),
            Category::ClassAssignment(n) => write!(f, "课堂作业{}", n),
        }
    }
}

fn chinese_numeral(token: &str) -> Option<&'static str> {
    match token {
        "一" => Some("1"),
        "二" => Some("2"),
        "三" => Some("3"),
        "四" => Some("4"),
        "五" => Some("5"),
        "六" => Some("6"),
        "七" => Some("7"),
        "八" => Some("8"),
        "九" => Some("9"),
        "十" => Some("10"),
        _ => None,
    }
}

/// Maps full-width digits (`０`..`９`, common with Chinese input methods) to ASCII.
pub fn fold_fullwidth_digits(text: &str) -> Cow<'_, str> {
    if !text.chars().any(|c| ('０'..='９').contains(&c)) {
        return Cow::Borrowed(text);
    }
    text.chars()
        .map(|c| match c {
            '０'..='９' => char::from(b'0' + (c as u32 - '０' as u32) as u8),
            _ => c,
        })
        .collect()
}

pub fn to_arabic(token: &str) -> &str {
    chinese_numeral(token).unwrap_or(token)
}

/// Digit strings longer than two characters are student IDs or years, not
/// assignment numbers.
pub fn is_assignment_number(number: &str) -> bool {
    let all_digits = !number.is_empty() && number.chars().all(|c| c.is_ascii_digit());
    !all_digits || number.len() <= 2
}

struct CategoryRule {
    name: &'static str,
    pattern: Regex,
    guarded: bool,
    family: fn(u32) -> Category,
}

impl CategoryRule {
    fn new(name: &'static str, pattern: &str, guarded: bool, family: fn(u32) -> Category) -> Result<Self, regex::Error> {
        Ok(CategoryRule {
            name,
            pattern: Regex::new(&format!("(?i){}", pattern))?,
            guarded,
            family,
        })
    }

    fn apply(&self, text: &str) -> Option<Category> {
        let captures = self.pattern.captures(text)?;
        let number = to_arabic(captures.get(1)?.as_str());
        if self.guarded && !is_assignment_number(number) {
            return None;
        }
        match number.parse::<u32>() {
            Ok(n) if n > 0 => Some((self.family)(n)),
            _ => None,
        }
    }
}

/// Ordered rule table; the first rule that yields a category wins.
pub struct CategoryExtractor {
    rules: Vec<CategoryRule>,
}

impl CategoryExtractor {
    pub fn new() -> Result<Self, regex::Error> {
        let rules = vec![
            // 第3次...实验报告
            CategoryRule::new(
                "ordinal lab",
                &format!(r"第\s*{}\s*次(?:.*?(?:实验|实践)|(?:.*?[^a-z])?lab)", NUMBER),
                false,
                Category::Lab,
            )?,
            // 实验作业2, LAB 4
            CategoryRule::new(
                "keyword lab",
                &format!(r"(?:实验报告|实验作业|实践|{}|实验).*?{}", LAB_KEYWORD, NUMBER),
                true,
                Category::Lab,
            )?,
            // 第三次课堂作业
            CategoryRule::new(
                "ordinal class assignment",
                &format!(r"第\s*{}\s*次.*?(?:课堂作业|作业)", NUMBER),
                false,
                Category::ClassAssignment,
            )?,
            // 课堂作业1, 作业 2
            CategoryRule::new(
                "keyword class assignment",
                &format!(r"(?:课堂作业|作业).*?{}", NUMBER),
                true,
                Category::ClassAssignment,
            )?,
        ];
        Ok(CategoryExtractor { rules })
    }

    pub fn extract(&self, text: &str) -> Option<Category> {
        if text.is_empty() {
            return None;
        }
        let text = fold_fullwidth_digits(text);
        self.rules.iter().find_map(|rule| {
            let category = rule.apply(&text)?;
            log::debug!("Rule '{}' matched {:?} in {}", rule.name, category, text);
            Some(category)
        })
    }
}
