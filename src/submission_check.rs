pub mod roster;

use anyhow::{bail, Context, Result};
use log::{info, warn};
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use crate::attachment_sorter::bucket_store::{BucketStore, DirectoryStore};
use crate::settings::Config;
use crate::submission_check::roster::{load_roster, Student};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub student: Student,
    pub filename: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubmissionReport {
    pub submitted: Vec<Submission>,
    pub missing: Vec<Student>,
}

/// Finds the file handed in by `student`: the student ID is decisive, the
/// name is accepted when it is longer than one character.
pub fn find_submission<'a>(student: &Student, files: &'a [String]) -> Option<&'a str> {
    let name_is_distinctive = student.name.chars().count() > 1;
    files
        .iter()
        .find(|file| file.contains(&student.id) || (name_is_distinctive && file.contains(&student.name)))
        .map(String::as_str)
}

pub fn analyze_submissions(students: &[Student], files: &[String]) -> SubmissionReport {
    let mut report = SubmissionReport::default();
    for student in students {
        match find_submission(student, files) {
            Some(filename) => report.submitted.push(Submission {
                student: student.clone(),
                filename: filename.to_string(),
            }),
            None => report.missing.push(student.clone()),
        }
    }
    report
}

impl SubmissionReport {
    pub fn total(&self) -> usize {
        self.submitted.len() + self.missing.len()
    }

    pub fn submission_rate(&self) -> f64 {
        if self.total() == 0 {
            return 0.0;
        }
        self.submitted.len() as f64 * 100.0 / self.total() as f64
    }

    pub fn render(&self) -> String {
        let rule = "=".repeat(60);
        let thin_rule = "-".repeat(40);
        let mut text = String::new();
        let _ = writeln!(text, "{}", rule);
        let _ = writeln!(text, "Homework submission report");
        let _ = writeln!(text, "{}", rule);
        let _ = writeln!(text, "Students: {}", self.total());
        let _ = writeln!(text, "Submitted: {}", self.submitted.len());
        let _ = writeln!(text, "Missing: {}", self.missing.len());
        let _ = writeln!(text, "Submission rate: {:.1}%", self.submission_rate());
        let _ = writeln!(text);

        let _ = writeln!(text, "Submitted:");
        let _ = writeln!(text, "{}", thin_rule);
        for submission in &self.submitted {
            let student = &submission.student;
            let _ = writeln!(
                text,
                "{:3}. {} {:<10} - {}",
                student.serial, student.id, student.name, submission.filename
            );
        }
        let _ = writeln!(text);

        let _ = writeln!(text, "Missing:");
        let _ = writeln!(text, "{}", thin_rule);
        for student in &self.missing {
            let _ = writeln!(text, "{:3}. {} {}", student.serial, student.id, student.name);
        }
        text.trim_end().to_string()
    }
}

pub fn default_report_path(bucket: &str) -> PathBuf {
    PathBuf::from(format!("{}_output.txt", bucket))
}

/// Checks one bucket against the roster and saves the report.
pub fn run(config: &Config, bucket: &str, output: Option<&Path>) -> Result<SubmissionReport> {
    let students = load_roster(&config.roster.students_file)?;
    let store = DirectoryStore::new(&config.download.directory);
    if !store.exists(bucket) {
        bail!("Folder {} does not exist", store.bucket_path(bucket).display());
    }

    let files = store.list(bucket)?;
    info!("Found {} files in {}", files.len(), bucket);
    if files.is_empty() {
        warn!("No submissions in {}", bucket);
    }

    let report = analyze_submissions(&students, &files);
    let text = report.render();
    println!("{}", text);

    let output = output.map(Path::to_path_buf).unwrap_or_else(|| default_report_path(bucket));
    fs::write(&output, &text).with_context(|| format!("Cannot save report to {}", output.display()))?;
    info!("Report saved to {}", output.display());
    Ok(report)
}
