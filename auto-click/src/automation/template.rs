// Reference images loaded once at startup, in scan priority order

use crate::feature_matching::{FeatureExtractor, FeatureSet};
use image::{DynamicImage, GrayImage};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Marker files some platforms drop into every directory
const IGNORED_FILES: [&str; 2] = ["Thumbs.db", "desktop.ini"];

pub type TemplateResult<T> = Result<T, TemplateError>;

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("Failed to read template directory {path:?}: {source}")]
    DirectoryUnreadable {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to decode template {path:?}: {source}")]
    Undecodable {
        path: PathBuf,
        source: image::ImageError,
    },

    #[error("No template images found in {path:?}")]
    Empty { path: PathBuf },
}

/// A reference image with its features computed once
#[derive(Debug, Clone)]
pub struct TemplateImage {
    pub name: String,
    pub path: PathBuf,
    pub pixels: GrayImage,
    pub features: FeatureSet,
    /// Pattern radius the features were described at; frames are described to match
    pub descriptor_radius: u32,
}

impl TemplateImage {
    pub fn from_image(
        name: impl Into<String>,
        path: PathBuf,
        image: &DynamicImage,
        extractor: &FeatureExtractor,
    ) -> Self {
        let pixels = image.to_luma8();
        let descriptor_radius = extractor.descriptor_radius(pixels.width(), pixels.height());
        let features = extractor.extract_gray(&pixels);
        Self {
            name: name.into(),
            path,
            pixels,
            features,
            descriptor_radius,
        }
    }

    pub fn open(path: &Path, extractor: &FeatureExtractor) -> TemplateResult<Self> {
        let image = image::open(path).map_err(|source| TemplateError::Undecodable {
            path: path.to_path_buf(),
            source,
        })?;
        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("unknown")
            .to_string();
        Ok(Self::from_image(name, path.to_path_buf(), &image, extractor))
    }

    pub fn size(&self) -> (u32, u32) {
        self.pixels.dimensions()
    }
}

/// Ordered, immutable set of templates
#[derive(Debug, Clone, Default)]
pub struct TemplateStore {
    templates: Vec<TemplateImage>,
}

impl TemplateStore {
    /// Load every image in `dir`.
    ///
    /// Names listed in `priority` come first, in that order; the rest follow
    /// sorted by file name. Hidden files, platform marker files and
    /// subdirectories are skipped.
    pub fn load_from_directory(
        dir: &Path,
        priority: &[String],
        extractor: &FeatureExtractor,
    ) -> TemplateResult<Self> {
        let unreadable = |source| TemplateError::DirectoryUnreadable {
            path: dir.to_path_buf(),
            source,
        };

        let mut paths = Vec::new();
        for entry in std::fs::read_dir(dir).map_err(unreadable)? {
            let entry = entry.map_err(unreadable)?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            if let Some(file_name) = entry.file_name().to_str()
                && (file_name.starts_with('.') || IGNORED_FILES.contains(&file_name))
            {
                log::debug!("Skipping {file_name}");
                continue;
            }
            paths.push(path);
        }
        paths.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

        if paths.is_empty() {
            return Err(TemplateError::Empty { path: dir.to_path_buf() });
        }

        let templates = paths
            .iter()
            .map(|path| TemplateImage::open(path, extractor))
            .collect::<TemplateResult<Vec<_>>>()?;

        for t in &templates {
            let (width, height) = t.size();
            log::info!(
                "🖼️ Template '{}' {width}x{height} ({} features, radius {})",
                t.name,
                t.features.len(),
                t.descriptor_radius
            );
            if t.features.is_empty() {
                log::warn!("⚠️ Template '{}' has no features and can never match", t.name);
            }
        }

        Ok(Self::from_templates(templates, priority))
    }

    /// Order `templates` by `priority`, keeping the given order for the rest
    pub fn from_templates(mut templates: Vec<TemplateImage>, priority: &[String]) -> Self {
        let rank = |t: &TemplateImage| {
            priority
                .iter()
                .position(|name| *name == t.name)
                .unwrap_or(priority.len())
        };
        templates.sort_by_key(rank);

        for name in priority {
            if !templates.iter().any(|t| t.name == *name) {
                log::warn!("⚠️ Priority template '{name}' not found");
            }
        }

        Self { templates }
    }

    pub fn templates(&self) -> &[TemplateImage] {
        &self.templates
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&TemplateImage> {
        self.templates.iter().find(|t| t.name == name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.templates.iter().map(|t| t.name.as_str()).collect()
    }
}
