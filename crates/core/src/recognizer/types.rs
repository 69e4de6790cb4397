//! Job, unit and recognition result types.

use serde::{Deserialize, Serialize};

use super::error::LoadError;

/// Description of a submitted job.
///
/// Exactly one source: a single image (by URL or inline base64) or an
/// ordered list of page images. Blank strings are treated as absent.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct JobDescriptor {
    /// URL of a single image.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,

    /// A single image, base64 encoded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_base64: Option<String>,

    /// URLs of pre-rendered pages, in page order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub page_urls: Vec<String>,
}

impl JobDescriptor {
    /// A job with one image.
    pub fn image(url: impl Into<String>) -> Self {
        Self {
            image_url: Some(url.into()),
            ..Default::default()
        }
    }

    /// A job with one inline image.
    pub fn inline_image(data: impl Into<String>) -> Self {
        Self {
            image_base64: Some(data.into()),
            ..Default::default()
        }
    }

    /// A multi-page job.
    pub fn pages<I, S>(urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            page_urls: urls.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    /// Drops blank sources.
    pub fn normalized(mut self) -> Self {
        self.image_url = self.image_url.filter(|url| !url.trim().is_empty());
        self.image_base64 = self.image_base64.filter(|data| !data.trim().is_empty());
        self.page_urls.retain(|url| !url.trim().is_empty());
        self
    }

    /// Checks that exactly one kind of source is present.
    pub fn validate(&self) -> Result<(), LoadError> {
        let sources = [
            self.image_url.is_some(),
            self.image_base64.is_some(),
            !self.page_urls.is_empty(),
        ]
        .into_iter()
        .filter(|present| *present)
        .count();

        match sources {
            0 => Err(LoadError::InvalidJob(
                "one of image_url, image_base64 or page_urls is required".to_string(),
            )),
            1 => Ok(()),
            _ => Err(LoadError::InvalidJob(
                "image_url, image_base64 and page_urls are mutually exclusive".to_string(),
            )),
        }
    }

    /// Whether this job is a multi-page document.
    pub fn is_multi_page(&self) -> bool {
        !self.page_urls.is_empty()
    }
}

/// One page of a job.
#[derive(Debug, Clone, PartialEq)]
pub struct Unit {
    /// Position within the job, 0-based.
    pub index: usize,
    /// Page number (1-based) for multi-page documents.
    pub page: Option<u32>,
    /// Encoded image bytes.
    pub data: Vec<u8>,
}

impl Unit {
    /// A standalone image unit.
    pub fn image(data: Vec<u8>) -> Self {
        Self {
            index: 0,
            page: None,
            data,
        }
    }

    /// A unit that is page `index + 1` of a document.
    pub fn page(index: usize, data: Vec<u8>) -> Self {
        Self {
            index,
            page: Some(index as u32 + 1),
            data,
        }
    }
}

/// Corner coordinates of a text region, in pixels from the top-left.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TextPosition {
    pub top_left: [f32; 2],
    pub top_right: [f32; 2],
    pub bottom_right: [f32; 2],
    pub bottom_left: [f32; 2],
}

/// One recognized text region.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TextRegion {
    pub text: String,
    /// Confidence score, 0-1.
    pub confidence: f32,
    pub position: TextPosition,
    /// Page the region was found on (multi-page documents only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
}

/// Aggregated result of a completed task.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct OcrResult {
    /// All regions across pages, in page order.
    pub results: Vec<TextRegion>,
    pub text_count: usize,
    /// Sum of per-page recognizer time (seconds).
    pub processing_time_secs: f64,
    /// End-to-end time from submission (milliseconds).
    pub duration_ms: f64,
    pub page_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_blank_sources() {
        let job = JobDescriptor {
            image_url: Some("   ".to_string()),
            image_base64: Some(String::new()),
            page_urls: vec!["".to_string(), "http://h/p1.png".to_string()],
        }
        .normalized();

        assert!(job.image_url.is_none());
        assert_eq!(job.page_urls, vec!["http://h/p1.png".to_string()]);
        assert!(job.validate().is_ok());
        assert!(job.is_multi_page());
    }

    #[test]
    fn test_validate_requires_a_source() {
        let job = JobDescriptor::default().normalized();
        assert!(matches!(job.validate(), Err(LoadError::InvalidJob(_))));
    }

    #[test]
    fn test_validate_rejects_both_sources() {
        let job = JobDescriptor {
            image_url: Some("http://h/a.png".to_string()),
            page_urls: vec!["http://h/p1.png".to_string()],
            ..Default::default()
        };
        assert!(job.validate().is_err());
    }

    #[test]
    fn test_validate_inline_image() {
        let job = JobDescriptor::inline_image("AQID");
        assert!(job.validate().is_ok());
        assert!(!job.is_multi_page());

        let both = JobDescriptor {
            image_url: Some("http://h/a.png".to_string()),
            image_base64: Some("AQID".to_string()),
            ..Default::default()
        };
        assert!(matches!(both.validate(), Err(LoadError::InvalidJob(_))));
    }

    #[test]
    fn test_job_deserialize() {
        let job: JobDescriptor =
            serde_json::from_str(r#"{"page_urls": ["a", "b"]}"#).unwrap();
        assert_eq!(job, JobDescriptor::pages(["a", "b"]));

        let job: JobDescriptor = serde_json::from_str(r#"{"image_base64": "AQID"}"#).unwrap();
        assert_eq!(job, JobDescriptor::inline_image("AQID"));
    }

    #[test]
    fn test_page_unit_numbering() {
        let unit = Unit::page(2, vec![1, 2, 3]);
        assert_eq!(unit.page, Some(3));
        assert_eq!(Unit::image(vec![]).page, None);
    }
}
