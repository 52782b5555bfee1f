pub mod dom;
pub mod parser;
pub mod sanitize;
pub mod style;

pub use dom::{Attribute, DomNode, Element, escape_text, is_void_element, serialize, serialize_element};
pub use parser::{decode_entities, parse_fragment};
pub use sanitize::{
    SanitizePolicy, Sanitizer, is_safe_style_value, sanitize, sanitize_image_src,
    sanitize_link_href, sanitize_style,
};
pub use style::StyleMap;
