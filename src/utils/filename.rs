use crate::error::{ProcessingError, Result};
use crate::utils::constants::{DEFAULT_OUTPUT_DIR, SPREADSHEET_EXTENSIONS};
use chrono::{Datelike, Local};
use std::path::{Path, PathBuf};

/// Generate default report filename with format: prediccion-semanal-{YYMMDD}.json
pub fn generate_default_report_filename() -> PathBuf {
    let now = Local::now();
    let year = now.year() % 100; // Get last 2 digits of year
    let month = now.month();
    let day = now.day();

    let filename = format!("prediccion-semanal-{:02}{:02}{:02}.json", year, month, day);
    PathBuf::from(DEFAULT_OUTPUT_DIR).join(filename)
}

/// Whether the file extension is one of the spreadsheet formats we can open
pub fn is_spreadsheet(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            SPREADSHEET_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
        .unwrap_or(false)
}

/// List spreadsheet files directly inside `dir`, sorted by path
pub fn spreadsheet_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(ProcessingError::MissingData(format!(
            "directory not found: {}",
            dir.display()
        )));
    }

    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && is_spreadsheet(&path) {
            files.push(path);
        }
    }
    files.sort();

    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_generate_default_report_filename() {
        let filename = generate_default_report_filename();
        let filename_str = filename.to_string_lossy();

        assert!(filename_str.starts_with("output/"));
        assert!(filename_str.contains("prediccion-semanal-"));
        assert!(filename_str.ends_with(".json"));
    }

    #[test]
    fn test_is_spreadsheet() {
        assert!(is_spreadsheet(Path::new("m218807.xlsx")));
        assert!(is_spreadsheet(Path::new("HDD_2023.XLSX")));
        assert!(is_spreadsheet(Path::new("export.csv")));
        assert!(!is_spreadsheet(Path::new("notes.txt")));
        assert!(!is_spreadsheet(Path::new("no_extension")));
    }

    #[test]
    fn test_spreadsheet_files_sorted_and_filtered() -> Result<()> {
        let dir = TempDir::new()?;
        std::fs::write(dir.path().join("b.csv"), "x")?;
        std::fs::write(dir.path().join("a.csv"), "x")?;
        std::fs::write(dir.path().join("readme.md"), "x")?;
        std::fs::create_dir(dir.path().join("nested.csv"))?;

        let files = spreadsheet_files(dir.path())?;
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();

        assert_eq!(names, vec!["a.csv", "b.csv"]);
        Ok(())
    }

    #[test]
    fn test_spreadsheet_files_missing_dir() {
        assert!(spreadsheet_files(Path::new("/definitely/not/here")).is_err());
    }
}
