//! Annotations and interactive form widgets.

use crate::document::EmbeddedFileId;
use crate::geom::Rect;

/// What an annotation does.
#[derive(Debug, Clone, PartialEq)]
pub enum AnnotationKind {
    /// A text note.
    Text {
        /// The note contents.
        content: String,
    },
    /// A link opening a URI.
    Link {
        /// The target URI.
        uri: String,
    },
    /// A visible attachment of an embedded file.
    FileAttachment {
        /// The attached file.
        file: EmbeddedFileId,
    },
}

/// An annotation that can be attached to exactly one page.
#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    /// The annotation rectangle. Required.
    pub rect: Option<Rect>,
    /// The annotation behavior.
    pub kind: AnnotationKind,
}

impl Annotation {
    /// A text note annotation.
    pub fn new_text_annotation(content: String) -> Self {
        Annotation {
            rect: None,
            kind: AnnotationKind::Text { content },
        }
    }

    /// A URI link annotation.
    pub fn new_link_annotation(uri: String) -> Self {
        Annotation {
            rect: None,
            kind: AnnotationKind::Link { uri },
        }
    }

    /// A file attachment annotation.
    pub fn new_file_attachment_annotation(file: EmbeddedFileId) -> Self {
        Annotation {
            rect: None,
            kind: AnnotationKind::FileAttachment { file },
        }
    }

    /// Set the annotation rectangle.
    pub fn with_rect(mut self, rect: Rect) -> Self {
        self.rect = Some(rect);
        self
    }
}
