/*!
 * Screenplay document model and its conversions.
 *
 * - `model`: canonical `Screenplay` / `Scene` / `Element` types
 * - `parser`: tagged paragraphs (FDX or JSON) to the canonical model
 * - `acts`: position-based act classification
 * - `serializer`: canonical model to Fountain-style text
 */

pub mod acts;
pub mod model;
pub mod parser;
pub mod serializer;

pub use self::acts::{act_for_position, classify_acts};
pub use self::model::{Act, Element, ElementType, Scene, Screenplay};
pub use self::parser::{
    load_document, parse_paragraphs, read_fdx, read_paragraph_json, DocumentFormat,
    FirstHeadingPolicy, Paragraph, ParserOptions,
};
pub use self::serializer::{scene_to_fountain, to_fountain};
