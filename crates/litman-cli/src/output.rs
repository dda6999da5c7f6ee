//! Output formatting for CLI
//!
//! Provides consistent output formatting across all commands:
//! - Human-readable default output
//! - JSON output (--json flag)
//! - Quiet mode for scripting (--quiet flag)

use anyhow::Result;
use serde::Serialize;

use litman_core::{Library, LibrarySummary, Reference};

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable output (default)
    Human,
    /// JSON output
    Json,
    /// Quiet mode - minimal output
    Quiet,
}

impl OutputFormat {
    /// Create format from CLI flags
    pub fn from_flags(json: bool, quiet: bool) -> Self {
        if quiet {
            OutputFormat::Quiet
        } else if json {
            OutputFormat::Json
        } else {
            OutputFormat::Human
        }
    }
}

/// How much of each reference to print
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListStyle {
    /// Leave out tags and notes
    pub compact: bool,
    /// Show citations and references with their titles
    pub links: bool,
}

/// Output helper for consistent formatting
pub struct Output {
    /// The output format
    pub format: OutputFormat,
    /// Skip confirmation prompts
    assume_yes: bool,
}

impl Output {
    pub fn new(format: OutputFormat) -> Self {
        Self {
            format,
            assume_yes: false,
        }
    }

    pub fn assume_yes(mut self, yes: bool) -> Self {
        self.assume_yes = yes;
        self
    }

    /// Check if output is in quiet mode
    pub fn is_quiet(&self) -> bool {
        matches!(self.format, OutputFormat::Quiet)
    }

    pub fn is_json(&self) -> bool {
        matches!(self.format, OutputFormat::Json)
    }

    /// Print a list of references
    ///
    /// `library` resolves linked labels to titles when `style.links` is set.
    pub fn print_references(
        &self,
        library: &Library,
        references: &[&Reference],
        style: ListStyle,
    ) -> Result<()> {
        match self.format {
            OutputFormat::Human => {
                if references.is_empty() {
                    println!("No references found.");
                    return Ok(());
                }
                for reference in references {
                    print!("{}", format_reference(library, reference, style));
                    println!();
                }
                println!("{} reference(s)", references.len());
            }
            OutputFormat::Json => print_json(&references)?,
            OutputFormat::Quiet => {
                for reference in references {
                    println!("{}", reference.label());
                }
            }
        }
        Ok(())
    }

    /// Print a single reference
    pub fn print_reference(&self, library: &Library, reference: &Reference) -> Result<()> {
        match self.format {
            OutputFormat::Human => {
                print!("{}", format_reference(library, reference, ListStyle::default()))
            }
            OutputFormat::Json => print_json(reference)?,
            OutputFormat::Quiet => println!("{}", reference.label()),
        }
        Ok(())
    }

    /// Print a list of tags
    pub fn print_tags(&self, tags: &[(String, usize)]) -> Result<()> {
        match self.format {
            OutputFormat::Human => {
                if tags.is_empty() {
                    println!("No tags found.");
                    return Ok(());
                }
                for (name, count) in tags {
                    println!("{} ({})", name, count);
                }
                println!("\n{} tag(s)", tags.len());
            }
            OutputFormat::Json => {
                let json_tags: Vec<_> = tags
                    .iter()
                    .map(|(name, count)| serde_json::json!({"name": name, "count": count}))
                    .collect();
                print_json(&json_tags)?;
            }
            OutputFormat::Quiet => {
                for (name, _) in tags {
                    println!("{}", name);
                }
            }
        }
        Ok(())
    }

    /// Print library counts and any integrity problems
    pub fn print_summary(&self, summary: &LibrarySummary, problems: &[String]) -> Result<()> {
        match self.format {
            OutputFormat::Human => {
                println!("References:  {}", summary.total);
                for (kind, count) in &summary.by_kind {
                    println!("  {:<11} {}", kind.as_str(), count);
                }
                println!("Categories:");
                for (category, count) in &summary.by_category {
                    println!("  {:<11} {}", category, count);
                }
                println!("Important:   {}", summary.important);
                println!("Printed:     {}", summary.printed);
                println!("Read:        {}", summary.read);
                println!("To read:     {}", summary.to_read);
                println!("Links:       {}", summary.links);
                println!("Tags:        {}", summary.tags.len());

                if !problems.is_empty() {
                    println!();
                    println!("⚠ {} integrity problem(s):", problems.len());
                    for problem in problems {
                        println!("  - {}", problem);
                    }
                }
            }
            OutputFormat::Json => print_json(&serde_json::json!({
                "summary": summary,
                "problems": problems,
            }))?,
            OutputFormat::Quiet => println!("{}", summary.total),
        }
        Ok(())
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        match self.format {
            OutputFormat::Human => println!("✓ {}", message),
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::json!({"status": "success", "message": message})
                );
            }
            OutputFormat::Quiet => {}
        }
    }

    /// Check if we should prompt for confirmation
    pub fn should_prompt(&self) -> bool {
        self.format == OutputFormat::Human && !self.assume_yes
    }

    /// Print an informational message
    pub fn message(&self, msg: &str) {
        match self.format {
            OutputFormat::Human => println!("{}", msg),
            OutputFormat::Json => {
                println!("{}", serde_json::json!({"message": msg}));
            }
            OutputFormat::Quiet => {}
        }
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Multi-line human rendering of a reference
fn format_reference(library: &Library, reference: &Reference, style: ListStyle) -> String {
    let mut out = String::new();

    let mut flags = Vec::new();
    if reference.important {
        flags.push("important");
    }
    if reference.printed {
        flags.push("printed");
    }
    flags.push(if reference.read { "read" } else { "to read" });

    out.push_str(&format!("{} [{}]\n", reference.label(), flags.join(", ")));
    out.push_str(&format!("  {}\n", reference.title));
    if !reference.authors.is_empty() {
        out.push_str(&format!("    {}\n", reference.author_line()));
    }
    out.push_str(&format!("    {}\n", reference.summary()));

    if !style.compact {
        out.push_str(&format!("  ({})\n", reference.tags().join(" ")));
        for (i, note) in reference.notes.iter().enumerate() {
            out.push_str(&format!("    {}. {}\n", i, truncate_line(note, 70)));
        }
        if let Some(ref file) = reference.file {
            out.push_str(&format!("  File: {}\n", file.display()));
        }
    }

    if style.links {
        out.push_str("  Citations:\n");
        push_linked(&mut out, library, reference.citations());
        out.push_str("  References:\n");
        push_linked(&mut out, library, reference.references());
    }
    out
}

fn push_linked(out: &mut String, library: &Library, labels: &[String]) {
    for (i, label) in labels.iter().enumerate() {
        let title = library
            .get(label)
            .map(|r| r.title.as_str())
            .unwrap_or("(missing)");
        out.push_str(&format!("    {}. {}: {}\n", i, label, truncate(title, 60)));
    }
}

/// Truncate a string to max characters, adding "..." if truncated
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Truncate to first line and max length
fn truncate_line(s: &str, max_len: usize) -> String {
    let first_line = s.lines().next().unwrap_or("");
    truncate(first_line, max_len)
}

#[cfg(test)]
mod tests {
    use super::*;
    use litman_core::{DetailFields, ReferenceFields, ReferenceKind};

    fn library() -> Library {
        let article = Reference::create(
            ReferenceKind::Article,
            ReferenceFields {
                title: Some("Neutrino oscillations".to_string()),
                authors: vec!["Jane Doe".to_string(), "John Smith".to_string()],
                year: Some(2020),
                category: Some("Neutrino".to_string()),
                tags: vec!["reactor".to_string()],
                details: DetailFields {
                    journal: Some("PRD".to_string()),
                    issue: Some(5),
                    number: Some("012345".to_string()),
                    ..Default::default()
                },
            },
        )
        .unwrap();
        let note = Reference::create(
            ReferenceKind::Note,
            ReferenceFields {
                title: Some("Beam notes".to_string()),
                year: Some(2021),
                category: Some("Accelerator".to_string()),
                details: DetailFields {
                    name: Some("Beam".to_string()),
                    ..Default::default()
                },
                ..Default::default()
            },
        )
        .unwrap();

        let mut library: Library = [article, note].into_iter().collect();
        library.link("PRD_5_012345_2020", "Beam_2021").unwrap();
        library
            .add_notes("PRD_5_012345_2020", ["check the fit\nsecond line"])
            .unwrap();
        library
    }

    #[test]
    fn test_format_from_flags() {
        assert_eq!(OutputFormat::from_flags(false, false), OutputFormat::Human);
        assert_eq!(OutputFormat::from_flags(true, false), OutputFormat::Json);
        assert_eq!(OutputFormat::from_flags(false, true), OutputFormat::Quiet);
        // Quiet takes precedence
        assert_eq!(OutputFormat::from_flags(true, true), OutputFormat::Quiet);
    }

    #[test]
    fn test_should_prompt() {
        assert!(Output::new(OutputFormat::Human).should_prompt());
        assert!(!Output::new(OutputFormat::Human)
            .assume_yes(true)
            .should_prompt());
        assert!(!Output::new(OutputFormat::Json).should_prompt());
    }

    #[test]
    fn test_format_reference() {
        let library = library();
        let article = library.get("PRD_5_012345_2020").unwrap();

        let text = format_reference(&library, article, ListStyle::default());
        assert!(text.starts_with("PRD_5_012345_2020 [to read]\n"));
        assert!(text.contains("    Jane Doe, John Smith\n"));
        assert!(text.contains("    PRD 5, 012345 (2020)\n"));
        assert!(text.contains("  (neutrino reactor)\n"));
        assert!(text.contains("    0. check the fit\n"));
        assert!(!text.contains("References:"));
    }

    #[test]
    fn test_format_compact_with_links() {
        let library = library();
        let article = library.get("PRD_5_012345_2020").unwrap();

        let style = ListStyle {
            compact: true,
            links: true,
        };
        let text = format_reference(&library, article, style);
        assert!(!text.contains("(neutrino reactor)"));
        assert!(text.contains("  References:\n    0. Beam_2021: Beam notes\n"));
    }

    #[test]
    fn test_note_without_authors() {
        let library = library();
        let note = library.get("Beam_2021").unwrap();
        let text = format_reference(&library, note, ListStyle::default());
        assert!(text.contains("  Beam notes\n    Note: Beam (2021)\n"));
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("this is a long string", 10), "this is...");
    }

    #[test]
    fn test_truncate_line() {
        assert_eq!(truncate_line("single line", 20), "single line");
        assert_eq!(truncate_line("line one\nline two", 20), "line one");
        assert_eq!(
            truncate_line("very long single line here", 10),
            "very lo..."
        );
    }
}
