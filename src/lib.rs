/*!
A low-level Rust library for generating PDF documents.

vellum builds conforming PDF files programmatically: callers construct a
[`Document`], draw vector graphics and text into per-page
[`DrawContext`]s, embed raster images and TrueType fonts (subset
automatically to the glyphs actually used), attach interactive form
widgets, tagged-PDF structure trees, optional-content groups and
transparency groups, and finally serialize everything into a single byte
buffer suitable for PDF/X, PDF/A or PDF/E output intents.

# Example

```no_run
use vellum::{Document, SerializeSettings};
use vellum::graphics::color::Color;

# fn main() -> vellum::error::Result<()> {
let mut settings = SerializeSettings::default();
settings.title = "Example".to_string();
let mut document = Document::new_with(settings)?;

// Draw a red rectangle onto a new page.
let mut ctx = document.new_page_context(200.0, 100.0);
{
    let mut state = ctx.push_gstate();
    state.set_nonstroke_color(&Color::rgb(1.0, 0.0, 0.0))?;
    state.cmd_re(10.0, 10.0, 50.0, 50.0);
    state.cmd_f();
}
document.add_page(ctx)?;

let pdf = document.finish()?;
std::fs::write("example.pdf", pdf).unwrap();
# Ok(())
# }
```
*/

#![deny(missing_docs)]
#![forbid(unsafe_code)]

mod object;
mod resource;
mod serialize;
mod util;

pub mod content;
pub mod document;
pub mod error;
pub mod geom;
pub mod graphics;
pub mod interactive;
pub mod interchange;
pub mod text;

use std::fmt::{Debug, Formatter};
use std::sync::Arc;

pub use content::{DrawContext, DrawContextType, GstateGuard};
pub use document::{
    Document, IntentSubtype, OptionalContentGroup, PageProperties, SerializeSettings,
};
pub use error::{Error, Result};
pub use util::DateTime;

/// A type that holds some bytes, e.g. the contents of a font file.
#[derive(Clone)]
pub struct Data(Arc<dyn AsRef<[u8]> + Send + Sync>);

impl AsRef<[u8]> for Data {
    fn as_ref(&self) -> &[u8] {
        self.0.as_ref().as_ref()
    }
}

impl From<Arc<dyn AsRef<[u8]> + Send + Sync>> for Data {
    fn from(value: Arc<dyn AsRef<[u8]> + Send + Sync>) -> Self {
        Self(value)
    }
}

impl From<Vec<u8>> for Data {
    fn from(value: Vec<u8>) -> Self {
        Self(Arc::new(value))
    }
}

impl From<Arc<Vec<u8>>> for Data {
    fn from(value: Arc<Vec<u8>>) -> Self {
        Self(value)
    }
}

impl Debug for Data {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Data {{..}}")
    }
}
