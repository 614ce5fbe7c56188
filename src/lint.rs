//! `quire check`: content validation before a build is deployed.
//!
//! Unlike the loader, which only needs to know whether a post is usable,
//! the checker reports everything it finds, including softer problems
//! that still produce a working site.

use std::collections::BTreeMap;

use crate::{content::ContentSource, frontmatter, logger, toc};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    pub severity: Severity,
    pub message: String,
}

impl Finding {
    fn error(message: impl Into<String>) -> Self {
        Self { severity: Severity::Error, message: message.into() }
    }

    fn warning(message: impl Into<String>) -> Self {
        Self { severity: Severity::Warning, message: message.into() }
    }
}

#[derive(Debug)]
pub struct FileReport {
    pub id: String,
    pub findings: Vec<Finding>,
}

impl FileReport {
    pub fn is_valid(&self) -> bool {
        !self.findings.iter().any(|f| f.severity == Severity::Error)
    }
}

#[derive(Debug, Default)]
pub struct Report {
    pub files: Vec<FileReport>,
}

impl Report {
    fn count(&self, severity: Severity) -> usize {
        self.files
            .iter()
            .flat_map(|f| &f.findings)
            .filter(|f| f.severity == severity)
            .count()
    }

    pub fn errors(&self) -> usize {
        self.count(Severity::Error)
    }

    pub fn warnings(&self) -> usize {
        self.count(Severity::Warning)
    }

    pub fn passed(&self) -> usize {
        self.files.iter().filter(|f| f.is_valid()).count()
    }

    /// An empty content folder fails too: there is nothing to publish.
    pub fn is_ok(&self) -> bool {
        !self.files.is_empty() && self.errors() == 0
    }
}

/// Checks one raw document.
pub fn check_entry(raw: &str) -> Vec<Finding> {
    if raw.trim().is_empty() {
        return vec![Finding::error("file is empty")];
    }

    let (meta, body) = match frontmatter::parse(raw) {
        Ok(parsed) => parsed,
        Err(e) => return vec![Finding::error(e.to_string())],
    };

    let mut findings = Vec::new();
    if meta.tags.is_empty() {
        findings.push(Finding::warning("no tags specified"));
    }
    if body.is_empty() {
        findings.push(Finding::error("blog post body is empty"));
    }

    // Same-text headings produce the same anchor; only the first is reachable.
    let mut seen: BTreeMap<String, usize> = BTreeMap::new();
    for id in toc::flatten_ids(&toc::parse_headings(body)) {
        *seen.entry(id).or_default() += 1;
    }
    for (id, n) in seen.into_iter().filter(|(_, n)| *n > 1) {
        findings.push(Finding::warning(format!("duplicate heading id '{}' ({} headings)", id, n)));
    }

    findings
}

pub fn check_source(source: &dyn ContentSource) -> anyhow::Result<Report> {
    let mut report = Report::default();
    for id in source.list_entries()? {
        let findings = match source.read_entry(&id)? {
            Some(raw) => check_entry(&raw),
            None => vec![Finding::error("entry disappeared while checking")],
        };
        report.files.push(FileReport { id, findings });
    }
    Ok(report)
}

pub fn print_report(report: &Report) {
    logger::header("Validating blog posts");

    if report.files.is_empty() {
        logger::error("no markdown files found in the content directory");
    }

    for file in &report.files {
        logger::info(&format!("Checking: {}.md", file.id));
        for finding in &file.findings {
            match finding.severity {
                Severity::Error => logger::error(&format!("  {}", finding.message)),
                Severity::Warning => logger::warn(&format!("  {}", finding.message)),
            }
        }
        if file.is_valid() {
            logger::passed("  valid");
        }
    }

    println!();
    logger::header("Validation summary");
    logger::detail("files", &report.files.len().to_string());
    logger::detail("passed", &report.passed().to_string());
    logger::detail("warnings", &report.warnings().to_string());
    logger::detail("errors", &report.errors().to_string());
}
