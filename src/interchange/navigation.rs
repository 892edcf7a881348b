//! Page transitions and optional-content sub-page navigation.

use std::fmt::Write;

use crate::document::OptionalContentGroupId;
use crate::util::fmt_fixed;

/// A page transition style.
#[allow(missing_docs)]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TransitionStyle {
    Split,
    Blinds,
    Box,
    Wipe,
    Dissolve,
    Glitter,
    R,
    Fly,
    Push,
    Cover,
    Uncover,
    Fade,
}

impl TransitionStyle {
    fn name(self) -> &'static str {
        match self {
            TransitionStyle::Split => "Split",
            TransitionStyle::Blinds => "Blinds",
            TransitionStyle::Box => "Box",
            TransitionStyle::Wipe => "Wipe",
            TransitionStyle::Dissolve => "Dissolve",
            TransitionStyle::Glitter => "Glitter",
            TransitionStyle::R => "R",
            TransitionStyle::Fly => "Fly",
            TransitionStyle::Push => "Push",
            TransitionStyle::Cover => "Cover",
            TransitionStyle::Uncover => "Uncover",
            TransitionStyle::Fade => "Fade",
        }
    }
}

/// The dimension a split or blinds transition moves along.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TransitionDimension {
    /// Horizontal motion.
    Horizontal,
    /// Vertical motion.
    Vertical,
}

/// Whether a split or box transition moves inward or outward.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TransitionMotion {
    /// From the edges towards the center.
    Inward,
    /// From the center towards the edges.
    Outward,
}

/// A visual transition to a page or navigation step.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    /// The transition style.
    pub style: TransitionStyle,
    /// The duration in seconds.
    pub duration: Option<f32>,
    /// The motion dimension, for styles that use one.
    pub dimension: Option<TransitionDimension>,
    /// The motion direction, for styles that use one.
    pub motion: Option<TransitionMotion>,
    /// The direction in degrees, for styles that use one.
    pub direction: Option<i32>,
}

impl Transition {
    /// A transition of the given style with all optional fields unset.
    pub fn new(style: TransitionStyle) -> Self {
        Transition {
            style,
            duration: None,
            dimension: None,
            motion: None,
            direction: None,
        }
    }

    /// Write the transition dictionary entries, one per line, each prefixed
    /// with `indent`.
    pub(crate) fn write_dict_entries(&self, buf: &mut String, indent: &str) {
        let _ = writeln!(buf, "{}/Type /Trans", indent);
        let _ = writeln!(buf, "{}/S /{}", indent, self.style.name());
        if let Some(d) = self.duration {
            let _ = writeln!(buf, "{}/D {}", indent, fmt_fixed(d));
        }
        if let Some(dm) = self.dimension {
            let dm = match dm {
                TransitionDimension::Horizontal => "/H",
                TransitionDimension::Vertical => "/V",
            };
            let _ = writeln!(buf, "{}/Dm {}", indent, dm);
        }
        if let Some(m) = self.motion {
            let m = match m {
                TransitionMotion::Inward => "/I",
                TransitionMotion::Outward => "/O",
            };
            let _ = writeln!(buf, "{}/M {}", indent, m);
        }
        if let Some(di) = self.direction {
            let _ = writeln!(buf, "{}/Di {}", indent, di);
        }
    }
}

/// One step of a sub-page navigation sequence: the optional-content group it
/// reveals and the transition used while doing so.
#[derive(Debug, Clone, PartialEq)]
pub struct SubPageNavigation {
    /// The group this step turns on.
    pub id: OptionalContentGroupId,
    /// The transition towards this step.
    pub transition: Option<Transition>,
}
