//! Collection document model.
//!
//! These types serialize directly to the COCO-shaped JSON document that
//! grapeset writes: `info`, `licenses`, `images`, `annotations`,
//! `categories`. Optional fields are omitted when unset so that assembled
//! collections stay minimal while single-image documents can carry the
//! extra capture metadata.

use serde::{Deserialize, Serialize};

use super::bbox::BBoxXYWH;
use super::ids::{AnnotationId, CategoryId, ImageId};
use super::space::Pixel;

/// An assembled annotation collection for one dataset split (or one image).
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Collection {
    #[serde(default)]
    pub info: CollectionInfo,

    #[serde(default)]
    pub images: Vec<Image>,

    #[serde(default)]
    pub annotations: Vec<Annotation>,

    #[serde(default)]
    pub categories: Vec<Category>,

    /// Written only for split collections.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub licenses: Option<Vec<License>>,
}

/// Free-text metadata about a collection.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct CollectionInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contributor: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license: Option<License>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub berry_count: Option<u64>,
}

/// A license reference (name + URL).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct License {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl License {
    pub fn with_url(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: Some(url.into()),
        }
    }
}

/// An image entry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Image {
    pub id: ImageId,

    pub width: u32,

    pub height: u32,

    /// Path relative to the dataset root, or the bare file name for
    /// single-image documents.
    pub file_name: String,

    /// File size in bytes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,

    /// Grape cultivar derived from the file-name prefix.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variety: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub berry_count: Option<u64>,

    /// Set when `width`/`height` are a fallback rather than measured.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub dimensions_estimated: bool,
}

impl Image {
    pub fn new(id: impl Into<ImageId>, file_name: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            id: id.into(),
            width,
            height,
            file_name: file_name.into(),
            size: None,
            format: None,
            url: None,
            hash: None,
            status: None,
            source: None,
            variety: None,
            berry_count: None,
            dimensions_estimated: false,
        }
    }
}

/// A category (class label).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,

    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supercategory: Option<String>,
}

impl Category {
    pub fn new(id: impl Into<CategoryId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            supercategory: None,
        }
    }

    pub fn with_supercategory(
        id: impl Into<CategoryId>,
        name: impl Into<String>,
        supercategory: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            supercategory: Some(supercategory.into()),
        }
    }

    /// The single foreground category of split collections.
    pub fn grape() -> Self {
        Self::with_supercategory(1u64, "grape", "fruit")
    }

    /// Labeling-tool placeholder; never referenced by annotations.
    pub fn background() -> Self {
        Self::with_supercategory(0u64, "background", "background")
    }
}

/// A bounding-box annotation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    pub id: AnnotationId,

    pub image_id: ImageId,

    pub category_id: CategoryId,

    /// `[x, y, width, height]` in pixels, top-left origin.
    pub bbox: BBoxXYWH<Pixel>,

    pub area: f64,

    pub iscrowd: u8,
}

impl Annotation {
    /// Creates an annotation; `area` is derived from `bbox` and `iscrowd`
    /// is always 0.
    pub fn new(
        id: impl Into<AnnotationId>,
        image_id: impl Into<ImageId>,
        category_id: impl Into<CategoryId>,
        bbox: BBoxXYWH<Pixel>,
    ) -> Self {
        Self {
            id: id.into(),
            image_id: image_id.into(),
            category_id: category_id.into(),
            area: bbox.area(),
            bbox,
            iscrowd: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn annotation_area_comes_from_bbox() {
        let ann = Annotation::new(1u64, 1u64, 1u64, BBoxXYWH::new(10.0, 20.0, 30.0, 4.0));
        assert_eq!(ann.area, 120.0);
        assert_eq!(ann.iscrowd, 0);
    }

    #[test]
    fn optional_image_fields_are_omitted() {
        let image = Image::new(1u64, "grapes/images/A.jpg", 1000, 800);
        let json = serde_json::to_value(&image).expect("serialize");
        let obj = json.as_object().expect("object");
        assert_eq!(obj.len(), 4);
        assert_eq!(obj["file_name"], "grapes/images/A.jpg");
        assert!(!obj.contains_key("dimensions_estimated"));
    }

    #[test]
    fn estimated_dimensions_are_flagged() {
        let mut image = Image::new(1u64, "A.jpg", 1920, 1080);
        image.dimensions_estimated = true;
        let json = serde_json::to_value(&image).expect("serialize");
        assert_eq!(json["dimensions_estimated"], true);
    }

    #[test]
    fn collection_tolerates_empty_arrays() {
        let collection: Collection =
            serde_json::from_str(r#"{"info": {}, "images": [], "annotations": [], "categories": []}"#)
                .expect("parse");
        assert!(collection.images.is_empty());
        assert!(collection.annotations.is_empty());
        assert!(collection.licenses.is_none());
    }
}
