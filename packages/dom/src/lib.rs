pub mod connection;
pub mod markup;
pub mod rehydrate;
pub mod server;
pub mod sink;

pub use connection::{
    create_node, get_node, insert_rule, matches_markers, query_node, MEDIA_ATTRIBUTE,
    REHYDRATION_ATTRIBUTE, SUPPORT_ATTRIBUTE, TYPE_ATTRIBUTE,
};
pub use markup::{parse_markup, serialize_document, style_tag_markup, MarkupError, MarkupResult};
pub use rehydrate::rehydrate;
pub use server::{render_to_markup, render_to_sheet_list, render_to_string, Sheet};
pub use sink::{attach, render, DomSink, SINK_NAME};
