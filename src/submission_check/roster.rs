use anyhow::{Context, Result};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use log::info;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    pub serial: u32,
    pub id: String,
    pub name: String,
}

/// Roster exports mark some names with `*`.
pub fn clean_name(name: &str) -> String {
    name.replace('*', "").trim().to_string()
}

pub fn parse_roster(reader: impl std::io::Read) -> Result<Vec<Student>> {
    let students: Vec<Student> = serde_json::from_reader(reader)?;
    let students: Vec<Student> = students
        .into_iter()
        .map(|student| Student {
            id: student.id.trim().to_string(),
            name: clean_name(&student.name),
            ..student
        })
        .filter(|student| !student.id.is_empty() && !student.name.is_empty())
        .sorted_by_key(|student| student.serial)
        .collect();
    Ok(students)
}

pub fn load_roster(path: &Path) -> Result<Vec<Student>> {
    let file = File::open(path).with_context(|| format!("Cannot open roster {}", path.display()))?;
    let students = parse_roster(BufReader::new(file))
        .with_context(|| format!("Cannot parse roster {}", path.display()))?;
    info!("Loaded {} students", students.len());
    Ok(students)
}
