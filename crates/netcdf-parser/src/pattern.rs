//! Source file discovery by filename pattern.
//!
//! Patterns are plain filenames with a `{year}` placeholder and `*`
//! wildcards, e.g. `tasmax_hadukgrid_uk_1km_mon_{year}*.nc`.

use std::path::{Path, PathBuf};
use tracing::debug;

use climate_common::Variable;

use crate::error::{NetCdfError, NetCdfResult};

/// A filename pattern for one variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePattern {
    pattern: String,
}

impl FilePattern {
    pub fn new(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
        }
    }

    /// The HadUK-Grid monthly 1 km naming for a variable.
    pub fn haduk(variable: Variable) -> Self {
        Self::new(format!(
            "{}_hadukgrid_uk_1km_mon_{{year}}*.nc",
            variable.netcdf_name()
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.pattern
    }

    /// Pattern text with the year substituted.
    pub fn for_year(&self, year: i32) -> String {
        self.pattern.replace("{year}", &year.to_string())
    }

    pub fn matches(&self, file_name: &str, year: i32) -> bool {
        wildcard_match(&self.for_year(year), file_name)
    }
}

/// Match `text` against `pattern` where `*` matches any run of characters.
fn wildcard_match(pattern: &str, text: &str) -> bool {
    let p: Vec<char> = pattern.chars().collect();
    let t: Vec<char> = text.chars().collect();
    let (mut pi, mut ti) = (0, 0);
    let mut star: Option<(usize, usize)> = None;

    while ti < t.len() {
        if pi < p.len() && p[pi] != '*' && p[pi] == t[ti] {
            pi += 1;
            ti += 1;
        } else if pi < p.len() && p[pi] == '*' {
            star = Some((pi, ti));
            pi += 1;
        } else if let Some((sp, st)) = star {
            pi = sp + 1;
            ti = st + 1;
            star = Some((sp, st + 1));
        } else {
            return false;
        }
    }
    p[pi..].iter().all(|&c| c == '*')
}

/// Find the source file for a variable and year under `dir`.
///
/// Subdirectories are searched too. When several files match, the first in
/// path order wins.
pub fn find_source_file(
    dir: &Path,
    pattern: &FilePattern,
    variable: Variable,
    year: i32,
) -> NetCdfResult<PathBuf> {
    if !dir.is_dir() {
        return Err(NetCdfError::MissingFile {
            variable,
            year,
            detail: format!("data directory {} does not exist", dir.display()),
        });
    }

    let expected = pattern.for_year(year);
    match first_match(dir, &expected)? {
        Some(path) => {
            debug!(variable = %variable, year, path = %path.display(), "Found source file");
            Ok(path)
        }
        None => Err(NetCdfError::MissingFile {
            variable,
            year,
            detail: format!("no file matching {} in {}", expected, dir.display()),
        }),
    }
}

/// First file under `dir`, in path order, whose name matches a pattern with
/// any year.
pub fn find_any_year(dir: &Path, pattern: &FilePattern) -> NetCdfResult<Option<PathBuf>> {
    if !dir.is_dir() {
        return Ok(None);
    }
    first_match(dir, &pattern.as_str().replace("{year}", "*"))
}

fn first_match(dir: &Path, expected: &str) -> NetCdfResult<Option<PathBuf>> {
    let mut matches = Vec::new();
    for entry in walkdir::WalkDir::new(dir).follow_links(true) {
        let entry = entry.map_err(|e| NetCdfError::IoError(std::io::Error::other(e.to_string())))?;
        if !entry.file_type().is_file() {
            continue;
        }
        if let Some(name) = entry.file_name().to_str() {
            if wildcard_match(expected, name) {
                matches.push(entry.into_path());
            }
        }
    }
    matches.sort();
    Ok(matches.into_iter().next())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_haduk_pattern() {
        let p = FilePattern::haduk(Variable::Temperature);
        assert_eq!(p.as_str(), "tasmax_hadukgrid_uk_1km_mon_{year}*.nc");
        assert!(p.matches("tasmax_hadukgrid_uk_1km_mon_202101-202112.nc", 2021));
        assert!(!p.matches("tasmax_hadukgrid_uk_1km_mon_202201-202212.nc", 2021));
        assert!(!p.matches("rainfall_hadukgrid_uk_1km_mon_202101-202112.nc", 2021));
        assert!(!p.matches("tasmax_hadukgrid_uk_1km_mon_202101-202112.nc.tmp", 2021));
    }

    #[test]
    fn test_wildcards() {
        assert!(wildcard_match("*", ""));
        assert!(wildcard_match("a*b*c", "axxbyyc"));
        assert!(wildcard_match("a**", "abc"));
        assert!(!wildcard_match("a*b", "acd"));
        assert!(wildcard_match("exact.nc", "exact.nc"));
        assert!(!wildcard_match("exact.nc", "exact.ncx"));
    }

    #[test]
    fn test_find_source_file() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("tasmax");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(nested.join("tasmax_hadukgrid_uk_1km_mon_202201-202212.nc"), b"x").unwrap();
        std::fs::write(nested.join("tasmax_hadukgrid_uk_1km_mon_202101-202112.nc"), b"x").unwrap();

        let pattern = FilePattern::haduk(Variable::Temperature);
        let found = find_source_file(dir.path(), &pattern, Variable::Temperature, 2022).unwrap();
        assert!(found.ends_with("tasmax_hadukgrid_uk_1km_mon_202201-202212.nc"));

        let any = find_any_year(dir.path(), &pattern).unwrap().unwrap();
        assert!(any.ends_with("tasmax_hadukgrid_uk_1km_mon_202101-202112.nc"));

        assert!(matches!(
            find_source_file(dir.path(), &pattern, Variable::Temperature, 2023),
            Err(NetCdfError::MissingFile { year: 2023, .. })
        ));
        assert!(matches!(
            find_source_file(&dir.path().join("nope"), &pattern, Variable::Temperature, 2022),
            Err(NetCdfError::MissingFile { .. })
        ));
    }
}
