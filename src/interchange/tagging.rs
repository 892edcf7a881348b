//! Tagged-PDF structure items and roles.
//!
//! Structure items form a tree whose single root has no parent. Items are
//! attached to page content through marked-content sequences; each use on a
//! page is assigned a marked-content id, and the page's parent-tree entry
//! lists the items in that order.

use crate::document::{RoleId, StructureItemId};

/// A builtin structure element type.
#[allow(missing_docs)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum StructureType {
    Document,
    Part,
    Art,
    Sect,
    Div,
    BlockQuote,
    Caption,
    Toc,
    Toci,
    Index,
    NonStruct,
    Private,
    P,
    H,
    H1,
    H2,
    H3,
    H4,
    H5,
    H6,
    L,
    Li,
    Lbl,
    LBody,
    Table,
    Tr,
    Th,
    Td,
    THead,
    TBody,
    TFoot,
    Span,
    Quote,
    Note,
    Reference,
    BibEntry,
    Code,
    Link,
    Annot,
    Ruby,
    Rb,
    Rt,
    Rp,
    Warichu,
    Wt,
    Wp,
    Figure,
    Formula,
    Form,
}

impl StructureType {
    pub(crate) fn name(self) -> &'static str {
        match self {
            StructureType::Document => "Document",
            StructureType::Part => "Part",
            StructureType::Art => "Art",
            StructureType::Sect => "Sect",
            StructureType::Div => "Div",
            StructureType::BlockQuote => "BlockQuote",
            StructureType::Caption => "Caption",
            StructureType::Toc => "TOC",
            StructureType::Toci => "TOCI",
            StructureType::Index => "Index",
            StructureType::NonStruct => "NonStruct",
            StructureType::Private => "Private",
            StructureType::P => "P",
            StructureType::H => "H",
            StructureType::H1 => "H1",
            StructureType::H2 => "H2",
            StructureType::H3 => "H3",
            StructureType::H4 => "H4",
            StructureType::H5 => "H5",
            StructureType::H6 => "H6",
            StructureType::L => "L",
            StructureType::Li => "LI",
            StructureType::Lbl => "Lbl",
            StructureType::LBody => "LBody",
            StructureType::Table => "Table",
            StructureType::Tr => "TR",
            StructureType::Th => "TH",
            StructureType::Td => "TD",
            StructureType::THead => "THead",
            StructureType::TBody => "TBody",
            StructureType::TFoot => "TFoot",
            StructureType::Span => "Span",
            StructureType::Quote => "Quote",
            StructureType::Note => "Note",
            StructureType::Reference => "Reference",
            StructureType::BibEntry => "BibEntry",
            StructureType::Code => "Code",
            StructureType::Link => "Link",
            StructureType::Annot => "Annot",
            StructureType::Ruby => "Ruby",
            StructureType::Rb => "RB",
            StructureType::Rt => "RT",
            StructureType::Rp => "RP",
            StructureType::Warichu => "Warichu",
            StructureType::Wt => "WT",
            StructureType::Wp => "WP",
            StructureType::Figure => "Figure",
            StructureType::Formula => "Formula",
            StructureType::Form => "Form",
        }
    }
}

/// What a structure item is tagged as: a builtin type or a mapped role.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) enum StructItemKind {
    Builtin(StructureType),
    Role(RoleId),
}

#[derive(Debug, Clone)]
pub(crate) struct StructItem {
    /// The object reserved for this item.
    pub(crate) obj_id: usize,
    pub(crate) kind: StructItemKind,
    pub(crate) parent: Option<StructureItemId>,
}

/// Where a structure item was used: the page and the marked-content id
/// assigned within that page.
#[derive(Debug, Copy, Clone)]
pub(crate) struct StructureUsage {
    pub(crate) page_num: usize,
    pub(crate) mcid: i32,
}

#[derive(Debug, Clone)]
pub(crate) struct RolemapEntry {
    pub(crate) name: String,
    pub(crate) builtin: StructureType,
}
