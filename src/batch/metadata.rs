use crate::error::{PipelineError, Result};
use std::path::Path;

/// Acquisition metadata encoded in a file name as `<date>.<treatment>.<name>.<ext>`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageMetadata {
    pub date: Option<String>,
    pub treatment: Option<String>,
    pub name: Option<String>,
}

impl ImageMetadata {
    /// Parse the file stem of `path`
    ///
    /// Treatment and name are lower-cased. Any further dotted components after the
    /// name (e.g. `.masked`) are ignored.
    pub fn parse(path: &Path) -> Result<Self> {
        let file_name = path
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        let parts: Vec<&str> = stem.split('.').collect();
        if parts.len() < 3 || parts[..3].iter().any(|p| p.is_empty()) {
            return Err(PipelineError::MalformedMetadata(file_name));
        }

        Ok(Self {
            date: Some(parts[0].to_string()),
            treatment: Some(parts[1].to_lowercase()),
            name: Some(parts[2].to_lowercase()),
        })
    }

    /// Parse, falling back to missing values (with a warning) on a malformed name
    pub fn parse_or_missing(path: &Path) -> Self {
        Self::parse(path).unwrap_or_else(|e| {
            tracing::warn!("{}", e);
            Self::default()
        })
    }

    #[cfg(test)]
    pub fn is_missing(&self) -> bool {
        self.date.is_none() && self.treatment.is_none() && self.name.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_well_formed_name() {
        let meta = ImageMetadata::parse(Path::new("/data/1_14_19.Ctrl.P001.jpg")).unwrap();
        assert_eq!(meta.date.as_deref(), Some("1_14_19"));
        assert_eq!(meta.treatment.as_deref(), Some("ctrl"));
        assert_eq!(meta.name.as_deref(), Some("p001"));
    }

    #[test]
    fn test_extra_components_are_ignored() {
        let meta = ImageMetadata::parse(Path::new("1_14_19.10_30_20.p001.masked.jpg")).unwrap();
        assert_eq!(meta.date.as_deref(), Some("1_14_19"));
        assert_eq!(meta.treatment.as_deref(), Some("10_30_20"));
        assert_eq!(meta.name.as_deref(), Some("p001"));
    }

    #[test]
    fn test_malformed_name() {
        let result = ImageMetadata::parse(Path::new("notadate.png"));
        assert!(matches!(result, Err(PipelineError::MalformedMetadata(ref n)) if n == "notadate.png"));

        // the extension does not count as the name
        assert!(ImageMetadata::parse(Path::new("2020.light.png")).is_err());
        assert!(ImageMetadata::parse(Path::new("2020..p1.png")).is_err());
    }

    #[test]
    fn test_parse_or_missing() {
        let meta = ImageMetadata::parse_or_missing(Path::new("notadate.png"));
        assert!(meta.is_missing());
    }
}
