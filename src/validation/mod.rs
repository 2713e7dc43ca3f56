//! Collection validation.
//!
//! Checks a [`Collection`] for:
//! - Structural integrity (unique IDs, valid references)
//! - Data quality (non-empty names, valid dimensions)
//! - The persisted-box invariant (finite, positive extent, inside the image)
//!
//! Assembly runs this before writing; the `validate` command runs it on any
//! collection document.

mod report;

pub use report::{IssueCode, IssueContext, Severity, ValidationIssue, ValidationReport};

use std::collections::{HashMap, HashSet};

use crate::ir::{AnnotationId, CategoryId, Collection, ImageId};

/// Relative tolerance when comparing a stored area with `width × height`.
const AREA_TOLERANCE: f64 = 1e-6;

/// Options for validation behavior.
#[derive(Clone, Debug, Default)]
pub struct ValidateOptions {
    /// If true, treat warnings as errors.
    pub strict: bool,
}

/// Validates a collection and returns a report of all issues found.
pub fn validate_collection(collection: &Collection, _opts: &ValidateOptions) -> ValidationReport {
    let mut report = ValidationReport::new();

    let image_ids: HashSet<ImageId> = collection.images.iter().map(|i| i.id).collect();
    let category_ids: HashSet<CategoryId> = collection.categories.iter().map(|c| c.id).collect();

    validate_images(collection, &mut report);
    validate_categories(collection, &mut report);
    validate_annotations(collection, &image_ids, &category_ids, &mut report);

    report
}

fn validate_images(collection: &Collection, report: &mut ValidationReport) {
    let mut seen_ids: HashMap<ImageId, usize> = HashMap::new();

    for (idx, image) in collection.images.iter().enumerate() {
        let id = image.id.as_u64();

        if let Some(first_idx) = seen_ids.get(&image.id) {
            report.add(ValidationIssue::error(
                IssueCode::DuplicateImageId,
                format!(
                    "Duplicate image ID {} (first seen at index {})",
                    id, first_idx
                ),
                IssueContext::Image { id },
            ));
        } else {
            seen_ids.insert(image.id, idx);
        }

        if image.width == 0 || image.height == 0 {
            report.add(ValidationIssue::error(
                IssueCode::InvalidImageDimensions,
                format!(
                    "Invalid dimensions {}x{} (must be positive)",
                    image.width, image.height
                ),
                IssueContext::Image { id },
            ));
        }

        if image.file_name.is_empty() {
            report.add(ValidationIssue::warning(
                IssueCode::EmptyFileName,
                "Empty filename",
                IssueContext::Image { id },
            ));
        }

        if image.dimensions_estimated {
            report.add(ValidationIssue::warning(
                IssueCode::EstimatedDimensions,
                format!(
                    "Dimensions {}x{} are a fallback, not read from the file",
                    image.width, image.height
                ),
                IssueContext::Image { id },
            ));
        }
    }
}

fn validate_categories(collection: &Collection, report: &mut ValidationReport) {
    let mut seen_ids: HashMap<CategoryId, usize> = HashMap::new();
    let mut seen_names: HashMap<&str, CategoryId> = HashMap::new();

    for (idx, category) in collection.categories.iter().enumerate() {
        let id = category.id.as_u64();

        if let Some(first_idx) = seen_ids.get(&category.id) {
            report.add(ValidationIssue::error(
                IssueCode::DuplicateCategoryId,
                format!(
                    "Duplicate category ID {} (first seen at index {})",
                    id, first_idx
                ),
                IssueContext::Category { id },
            ));
        } else {
            seen_ids.insert(category.id, idx);
        }

        if category.name.is_empty() {
            report.add(ValidationIssue::warning(
                IssueCode::EmptyCategoryName,
                "Empty category name",
                IssueContext::Category { id },
            ));
        } else if let Some(first_id) = seen_names.get(category.name.as_str()) {
            report.add(ValidationIssue::warning(
                IssueCode::DuplicateCategoryName,
                format!(
                    "Duplicate category name '{}' (also used by category {})",
                    category.name, first_id
                ),
                IssueContext::Category { id },
            ));
        } else {
            seen_names.insert(&category.name, category.id);
        }
    }
}

fn validate_annotations(
    collection: &Collection,
    image_ids: &HashSet<ImageId>,
    category_ids: &HashSet<CategoryId>,
    report: &mut ValidationReport,
) {
    let mut seen_ids: HashMap<AnnotationId, usize> = HashMap::new();

    let image_dims: HashMap<ImageId, (u32, u32)> = collection
        .images
        .iter()
        .map(|i| (i.id, (i.width, i.height)))
        .collect();

    for (idx, annotation) in collection.annotations.iter().enumerate() {
        let id = annotation.id.as_u64();

        if let Some(first_idx) = seen_ids.get(&annotation.id) {
            report.add(ValidationIssue::error(
                IssueCode::DuplicateAnnotationId,
                format!(
                    "Duplicate annotation ID {} (first seen at index {})",
                    id, first_idx
                ),
                IssueContext::Annotation { id },
            ));
        } else {
            seen_ids.insert(annotation.id, idx);
        }

        if !image_ids.contains(&annotation.image_id) {
            report.add(ValidationIssue::error(
                IssueCode::MissingImageRef,
                format!("References non-existent image {}", annotation.image_id),
                IssueContext::Annotation { id },
            ));
        }

        if annotation.category_id.as_u64() == 0 {
            report.add(ValidationIssue::error(
                IssueCode::BackgroundCategoryUsed,
                "References the background category 0",
                IssueContext::Annotation { id },
            ));
        } else if !category_ids.contains(&annotation.category_id) {
            report.add(ValidationIssue::error(
                IssueCode::MissingCategoryRef,
                format!(
                    "References non-existent category {}",
                    annotation.category_id
                ),
                IssueContext::Annotation { id },
            ));
        }

        if annotation.iscrowd != 0 {
            report.add(ValidationIssue::warning(
                IssueCode::CrowdFlagSet,
                format!("iscrowd is {} (expected 0)", annotation.iscrowd),
                IssueContext::Annotation { id },
            ));
        }

        let bbox = &annotation.bbox;

        if !bbox.is_finite() {
            report.add(ValidationIssue::error(
                IssueCode::BBoxNotFinite,
                format!(
                    "Non-finite box [{}, {}, {}, {}]",
                    bbox.x, bbox.y, bbox.width, bbox.height
                ),
                IssueContext::Annotation { id },
            ));
            continue;
        }

        if bbox.is_degenerate() {
            report.add(ValidationIssue::error(
                IssueCode::DegenerateBBox,
                format!(
                    "Zero or negative extent {}x{}",
                    bbox.width, bbox.height
                ),
                IssueContext::Annotation { id },
            ));
        }

        let expected_area = bbox.area();
        if (annotation.area - expected_area).abs() > AREA_TOLERANCE * expected_area.abs().max(1.0) {
            report.add(ValidationIssue::warning(
                IssueCode::AreaMismatch,
                format!(
                    "Stored area {:.2} differs from width x height {:.2}",
                    annotation.area, expected_area
                ),
                IssueContext::Annotation { id },
            ));
        }

        if let Some(&(width, height)) = image_dims.get(&annotation.image_id) {
            if !bbox.within_image(width as f64, height as f64) {
                report.add(ValidationIssue::error(
                    IssueCode::BBoxOutOfBounds,
                    format!(
                        "Box [{:.1}, {:.1}, {:.1}, {:.1}] extends outside image bounds {}x{}",
                        bbox.x, bbox.y, bbox.width, bbox.height, width, height
                    ),
                    IssueContext::Annotation { id },
                ));
            }
        }
    }
}
