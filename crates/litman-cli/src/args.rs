//! Argument groups shared by several commands

use clap::Args;

use litman_core::{Criteria, DetailFields};

/// Kind-specific fields, valid for `add` and `edit`
#[derive(Args, Debug, Clone, Default)]
pub struct DetailArgs {
    /// Journal name (article)
    #[arg(long)]
    pub journal: Option<String>,
    /// Issue or volume (article)
    #[arg(long)]
    pub issue: Option<u32>,
    /// Article or paper number (article, conference)
    #[arg(long)]
    pub number: Option<String>,
    /// Conference name (conference)
    #[arg(long)]
    pub conference: Option<String>,
    /// Conference location (conference)
    #[arg(long)]
    pub location: Option<String>,
    /// University (thesis)
    #[arg(long)]
    pub university: Option<String>,
    /// Department (thesis)
    #[arg(long)]
    pub department: Option<String>,
    /// Publisher (book)
    #[arg(long)]
    pub publisher: Option<String>,
    /// Edition (book)
    #[arg(long)]
    pub edition: Option<u32>,
    /// Note name (note)
    #[arg(long)]
    pub name: Option<String>,
}

impl From<DetailArgs> for DetailFields {
    fn from(args: DetailArgs) -> Self {
        Self {
            journal: args.journal,
            issue: args.issue,
            number: args.number,
            conference: args.conference,
            location: args.location,
            university: args.university,
            department: args.department,
            publisher: args.publisher,
            edition: args.edition,
            name: args.name,
        }
    }
}

/// Filters for `list` and `open`
#[derive(Args, Debug, Clone, Default)]
pub struct FilterArgs {
    /// Only these labels, in this order
    #[arg(long = "ref", num_args = 1.., value_name = "LABEL")]
    pub labels: Vec<String>,
    /// Terms matched against title, tags, authors, journal and year
    #[arg(short, long, num_args = 1.., value_name = "TERM")]
    pub search: Vec<String>,
    /// Authors that must all appear, as written
    #[arg(short, long = "author", num_args = 1.., value_name = "AUTHOR")]
    pub authors: Vec<String>,
    /// Categories to keep
    #[arg(short, long = "category", num_args = 1.., value_name = "CATEGORY")]
    pub categories: Vec<String>,
    /// Only important entries
    #[arg(long)]
    pub important: bool,
    /// Only printed entries
    #[arg(long)]
    pub printed: bool,
    /// Only unread entries
    #[arg(long)]
    pub to_read: bool,
    /// Only read entries
    #[arg(long)]
    pub read: bool,
}

impl From<FilterArgs> for Criteria {
    fn from(args: FilterArgs) -> Self {
        Self {
            labels: non_empty(args.labels),
            search: non_empty(args.search),
            authors: non_empty(args.authors),
            categories: non_empty(args.categories),
            important: args.important,
            printed: args.printed,
            to_read: args.to_read,
            read: args.read,
        }
    }
}

fn non_empty(values: Vec<String>) -> Option<Vec<String>> {
    if values.is_empty() {
        None
    } else {
        Some(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_filters_keep_everything() {
        let criteria = Criteria::from(FilterArgs::default());
        assert!(criteria.is_empty());
    }

    #[test]
    fn test_filters_to_criteria() {
        let criteria = Criteria::from(FilterArgs {
            search: vec!["neutrino".to_string()],
            categories: vec!["physics".to_string()],
            to_read: true,
            ..Default::default()
        });
        assert_eq!(criteria.labels, None);
        assert_eq!(criteria.search, Some(vec!["neutrino".to_string()]));
        assert_eq!(criteria.categories, Some(vec!["physics".to_string()]));
        assert!(criteria.to_read);
        assert!(!criteria.read);
    }

    #[test]
    fn test_detail_args_to_fields() {
        let fields = DetailFields::from(DetailArgs {
            publisher: Some("Press".to_string()),
            edition: Some(2),
            ..Default::default()
        });
        assert_eq!(fields.supplied(), vec!["publisher", "edition"]);
    }
}
