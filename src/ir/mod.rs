//! Core data model and file codecs for grapeset.
//!
//! This module holds the typed representation of an annotation collection
//! together with the readers and writers for every per-image file the
//! dataset layout contains: normalized label files, box CSV files, images
//! (header probing only) and the collection document itself.
//!
//! # Design Principles
//!
//! 1. **Type Safety**: newtype ids keep image, annotation and category
//!    identifiers apart; marker types keep normalized and pixel geometry
//!    apart at compile time.
//!
//! 2. **Permissive Construction**: boxes may be built degenerate or outside
//!    the image, so that assembly can count them and validation can report
//!    them instead of panicking during parsing.
//!
//! 3. **Stable Output**: serialized documents depend only on their inputs
//!    (and, for single-image documents, on the id allocator).
//!
//! # Example
//!
//! ```
//! use grapeset::ir::{Annotation, BBoxXYWH, Category, Collection, Image, Pixel};
//!
//! let collection = Collection {
//!     images: vec![Image::new(1u64, "grapes/images/CDY_2015.jpg", 1000, 800)],
//!     categories: vec![Category::grape()],
//!     annotations: vec![Annotation::new(
//!         1u64, 1u64, 1u64,
//!         BBoxXYWH::<Pixel>::new(400.0, 300.0, 200.0, 200.0),
//!     )],
//!     ..Default::default()
//! };
//! assert_eq!(collection.annotations[0].area, 40000.0);
//! ```

mod bbox;
pub mod geometry;
mod ids;
pub mod io_box_csv;
pub mod io_coco_json;
pub mod io_image;
pub mod io_labelmap;
pub mod io_yolo;
mod model;
mod space;

pub use bbox::{BBoxCXCYWH, BBoxXYWH, EDGE_TOLERANCE};
pub use geometry::{AbsoluteBox, NormalizedBox};
pub use ids::{AnnotationId, CategoryId, IdAllocator, ImageId, RandomizedIds, SequentialIds};
pub use model::{Annotation, Category, Collection, CollectionInfo, Image, License};
pub use space::{Normalized, Pixel};
