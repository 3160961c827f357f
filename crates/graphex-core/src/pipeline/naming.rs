//! Descriptive file names derived from object metadata and analysis.

use crate::config::NamingConfig;
use crate::types::{AnalysisResult, ImageObject, MimeType};

/// Builds names like `black-solid-square-2x2-obj12.png`.
pub struct SemanticNamer {
    config: NamingConfig,
}

impl SemanticNamer {
    pub fn new(config: NamingConfig) -> Self {
        Self { config }
    }

    /// Name an extracted image.
    ///
    /// With analysis the parts are color, detail, orientation, size and
    /// object number; pass-through payloads get `jpeg-like` in place of the
    /// color and detail parts.
    pub fn name(
        &self,
        image: &ImageObject,
        mime: MimeType,
        analysis: Option<&AnalysisResult>,
    ) -> String {
        let mut parts: Vec<String> = Vec::with_capacity(5);

        match analysis {
            Some(analysis) => {
                parts.push(analysis.primary_color.clone());
                parts.push(self.detail_tag(analysis).to_string());
                parts.push(analysis.orientation.to_string());
            }
            None => {
                parts.push("jpeg-like".to_string());
                parts.push(image.orientation().to_string());
            }
        }
        parts.push(format!("{}x{}", image.width, image.height));
        parts.push(format!("obj{}", image.object_number));

        format!("{}.{}", parts.join(&self.config.separator), mime.extension())
    }

    fn detail_tag(&self, analysis: &AnalysisResult) -> &'static str {
        match analysis.palette_size {
            Some(1) => "solid",
            Some(n) if n <= self.config.two_tone_max_palette => "two-tone",
            _ if analysis.mean_variance() < self.config.low_contrast_variance => "low-contrast",
            _ => "detailed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ColorSpace, Orientation, StreamFilter};

    fn image(object_number: u32, width: u32, height: u32) -> ImageObject {
        ImageObject {
            object_number,
            width,
            height,
            color_space: ColorSpace::DeviceRgb,
            bits_per_component: 8,
            filter: StreamFilter::Flate,
            raw_stream: vec![],
        }
    }

    fn analysis(palette_size: Option<usize>, variances: Vec<f64>) -> AnalysisResult {
        AnalysisResult {
            means: vec![0.0; variances.len()],
            min: vec![0; variances.len()],
            max: vec![0; variances.len()],
            variances,
            palette_size,
            primary_color: "black".to_string(),
            orientation: Orientation::Square,
        }
    }

    fn namer() -> SemanticNamer {
        SemanticNamer::new(NamingConfig::default())
    }

    #[test]
    fn test_solid_name() {
        let name = namer().name(
            &image(12, 2, 2),
            MimeType::Png,
            Some(&analysis(Some(1), vec![0.0])),
        );
        assert_eq!(name, "black-solid-square-2x2-obj12.png");
    }

    #[test]
    fn test_detail_tags() {
        let n = namer();
        let img = image(1, 4, 4);
        let tag = |a: AnalysisResult| n.name(&img, MimeType::Png, Some(&a));

        assert!(tag(analysis(Some(4), vec![9000.0])).contains("-two-tone-"));
        assert!(tag(analysis(Some(5), vec![100.0, 300.0, 500.0])).contains("-low-contrast-"));
        assert!(tag(analysis(None, vec![399.9])).contains("-low-contrast-"));
        assert!(tag(analysis(Some(5), vec![400.0])).contains("-detailed-"));
        assert!(tag(analysis(None, vec![1000.0, 2000.0, 3000.0])).contains("-detailed-"));
    }

    #[test]
    fn test_pass_through_name() {
        let name = namer().name(&image(9, 640, 480), MimeType::Jpeg, None);
        assert_eq!(name, "jpeg-like-landscape-640x480-obj9.jpg");
    }

    #[test]
    fn test_configurable_thresholds_and_separator() {
        let namer = SemanticNamer::new(NamingConfig {
            separator: "_".to_string(),
            two_tone_max_palette: 8,
            low_contrast_variance: 10.0,
        });
        let name = namer.name(
            &image(3, 1, 2),
            MimeType::Png,
            Some(&analysis(Some(7), vec![50.0])),
        );
        assert_eq!(name, "black_two-tone_square_1x2_obj3.png");
    }
}
