//! Heuristic résumé field extraction.
//!
//! Best-effort, rule-based detection of contact details and section text.
//! Nothing here fails: a field that cannot be found is simply absent.

use std::collections::BTreeMap;
use std::ops::RangeInclusive;

use regex::Regex;
use serde::{Deserialize, Serialize};

const PHONE_PATTERN: &str = r"1[3-9][0-9]{9}";
const EMAIL_PATTERN: &str = r"[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}";

/// Names are short (CJK names are 2–4 characters).
const NAME_CHARS: RangeInclusive<usize> = 2..=4;

const EDUCATION_KEYWORDS: &[&str] = &["教育经历", "教育背景", "学历", "学校", "大学", "学院"];
const EXPERIENCE_KEYWORDS: &[&str] = &["工作经历", "工作经验", "实习经历", "项目经验", "工作背景"];

/// A named résumé section and the keywords that open it.
///
/// A section ends at the first line containing a keyword of any *other*
/// configured section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionRule {
    pub name: String,
    pub keywords: Vec<String>,
}

impl SectionRule {
    pub fn new(name: &str, keywords: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
        }
    }

    /// Education and experience rules for Chinese-language résumés.
    pub fn defaults() -> Vec<SectionRule> {
        vec![
            SectionRule::new("education", EDUCATION_KEYWORDS),
            SectionRule::new("experience", EXPERIENCE_KEYWORDS),
        ]
    }

    fn matches(&self, line: &str) -> bool {
        self.keywords.iter().any(|k| line.contains(k.as_str()))
    }
}

/// Fields pulled out of a résumé's plain text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResumeInfo {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    /// Section name → accumulated section text. Empty sections are omitted.
    pub sections: BTreeMap<String, String>,
}

#[cfg(test)]
impl ResumeInfo {
    pub fn section(&self, name: &str) -> Option<&str> {
        self.sections.get(name).map(String::as_str)
    }

    pub fn education(&self) -> Option<&str> {
        self.section("education")
    }

    pub fn experience(&self) -> Option<&str> {
        self.section("experience")
    }
}

#[derive(Debug, Clone)]
pub struct InfoExtractor {
    rules: Vec<SectionRule>,
    phone: Regex,
    email: Regex,
}

impl Default for InfoExtractor {
    fn default() -> Self {
        Self::new(SectionRule::defaults())
    }
}

impl InfoExtractor {
    pub fn new(rules: Vec<SectionRule>) -> Self {
        Self {
            rules,
            // both patterns are compile-time constants
            phone: Regex::new(PHONE_PATTERN).expect("phone pattern is valid"),
            email: Regex::new(EMAIL_PATTERN).expect("email pattern is valid"),
        }
    }

    pub fn extract(&self, content: &str) -> ResumeInfo {
        let sections = self
            .rules
            .iter()
            .filter_map(|rule| {
                let text = self.scan_section(content, rule);
                (!text.is_empty()).then(|| (rule.name.clone(), text))
            })
            .collect();

        ResumeInfo {
            name: extract_name(content),
            phone: self.phone.find(content).map(|m| m.as_str().to_string()),
            email: self.email.find(content).map(|m| m.as_str().to_string()),
            sections,
        }
    }

    /// Collects the lines of `target`'s section: from the first line holding
    /// one of its keywords up to (not including) the first later line holding
    /// a keyword of another section. Blank lines are skipped.
    fn scan_section(&self, content: &str, target: &SectionRule) -> String {
        let mut section = String::new();
        let mut inside = false;

        for line in content.lines().map(str::trim).filter(|l| !l.is_empty()) {
            if !inside {
                if target.matches(line) {
                    inside = true;
                    push_line(&mut section, line);
                }
                continue;
            }

            let leaves_section = self
                .rules
                .iter()
                .filter(|rule| rule.name != target.name)
                .any(|rule| rule.matches(line));
            if leaves_section {
                return section;
            }

            push_line(&mut section, line);
        }

        section
    }
}

fn extract_name(content: &str) -> Option<String> {
    let first = content.lines().map(str::trim).find(|l| !l.is_empty())?;
    NAME_CHARS
        .contains(&first.chars().count())
        .then(|| first.to_string())
}

fn push_line(buf: &mut String, line: &str) {
    buf.push_str(line);
    buf.push('\n');
}
