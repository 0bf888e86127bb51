use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use std::path::Path;

/// Installation identifier (e.g. `M218807`), the join key across all per-installation series
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InstallationCode(String);

impl InstallationCode {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    /// Derive the code from the first run of digits following an `m` in the file stem
    /// (e.g. `m218820-1.xlsx` -> `M218820`)
    pub fn from_filename(path: &Path) -> Option<Self> {
        let stem = path.file_stem()?.to_str()?;
        let bytes = stem.as_bytes();

        bytes.iter().enumerate().find_map(|(pos, byte)| {
            if !byte.eq_ignore_ascii_case(&b'm') {
                return None;
            }
            let digits: String = stem[pos + 1..]
                .chars()
                .take_while(|c| c.is_ascii_digit())
                .collect();
            (!digits.is_empty()).then(|| Self(format!("M{}", digits)))
        })
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for InstallationCode {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InstallationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
