use serde::{Deserialize, Serialize};

///
/// Comment lead characters recognized by the classifier and the locator.
///
/// `comment_leads` start a whole-line comment at any indentation and an
/// inline comment on headers and postings. `top_level_comment_leads` start a
/// whole-line comment only in column 0.
///
#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LineSyntax {
    pub comment_leads: Vec<char>,
    pub top_level_comment_leads: Vec<char>,
}

impl Default for LineSyntax {
    fn default() -> Self {
        Self {
            comment_leads: vec![';'],
            top_level_comment_leads: vec!['#', '%', '|', '*'],
        }
    }
}

impl LineSyntax {
    pub fn with_comment_leads(mut self, leads: &[char]) -> Self {
        self.comment_leads = leads.to_vec();
        self
    }

    pub fn is_comment_lead(&self, c: char) -> bool {
        self.comment_leads.contains(&c)
    }

    pub fn is_top_level_comment_lead(&self, c: char) -> bool {
        self.top_level_comment_leads.contains(&c)
    }

    /// Byte index of the first inline comment lead in `text`.
    pub(crate) fn find_comment_lead(&self, text: &str) -> Option<usize> {
        text.find(|c| self.is_comment_lead(c))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_leads() {
        let syntax = LineSyntax::default();
        assert!(syntax.is_comment_lead(';'));
        assert!(!syntax.is_comment_lead('#'));
        assert!(syntax.is_top_level_comment_lead('#'));
        assert!(syntax.is_top_level_comment_lead('*'));
        assert_eq!(syntax.find_comment_lead("Assets  $1 ; x"), Some(11));
        assert_eq!(syntax.find_comment_lead("Assets  $1"), None);
    }

    #[test]
    fn custom_leads() {
        let syntax = LineSyntax::default().with_comment_leads(&[';', '#']);
        assert_eq!(syntax.find_comment_lead("Assets  $1 # x"), Some(11));
    }

    #[test]
    fn deserialize_partial() {
        let syntax: LineSyntax = toml::from_str("comment_leads = [';', '#']").unwrap();
        assert_eq!(syntax.comment_leads, vec![';', '#']);
        assert_eq!(
            syntax.top_level_comment_leads,
            LineSyntax::default().top_level_comment_leads
        );
    }
}
