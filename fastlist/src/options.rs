use alloc::sync::Arc;
use alloc::vec::Vec;
use core::fmt;

/// A size along the scroll axis: either a constant or a function of the entry's indices.
///
/// Equality is structural for constants and by `Arc` identity for functions, so re-submitting
/// the same closure does not invalidate the layout while a fresh closure always does.
pub enum Size<F: ?Sized> {
    Fixed(u32),
    Dynamic(Arc<F>),
}

/// Size of the list header/footer.
pub type EdgeSize = Size<dyn Fn() -> u32 + Send + Sync>;
/// Size of a section header or section footer, given the section index.
pub type SectionSize = Size<dyn Fn(usize) -> u32 + Send + Sync>;
/// Size of an item, given `(section, item)`.
pub type ItemSize = Size<dyn Fn(usize, usize) -> u32 + Send + Sync>;

impl<F: ?Sized> Size<F> {
    pub fn fixed(&self) -> Option<u32> {
        match self {
            Self::Fixed(v) => Some(*v),
            Self::Dynamic(_) => None,
        }
    }
}

impl EdgeSize {
    pub fn dynamic(f: impl Fn() -> u32 + Send + Sync + 'static) -> Self {
        Self::Dynamic(Arc::new(f))
    }

    pub(crate) fn resolve(&self) -> u32 {
        match self {
            Self::Fixed(v) => *v,
            Self::Dynamic(f) => f(),
        }
    }
}

impl SectionSize {
    pub fn dynamic(f: impl Fn(usize) -> u32 + Send + Sync + 'static) -> Self {
        Self::Dynamic(Arc::new(f))
    }

    pub(crate) fn resolve(&self, section: usize) -> u32 {
        match self {
            Self::Fixed(v) => *v,
            Self::Dynamic(f) => f(section),
        }
    }
}

impl ItemSize {
    pub fn dynamic(f: impl Fn(usize, usize) -> u32 + Send + Sync + 'static) -> Self {
        Self::Dynamic(Arc::new(f))
    }

    pub(crate) fn resolve(&self, section: usize, item: usize) -> u32 {
        match self {
            Self::Fixed(v) => *v,
            Self::Dynamic(f) => f(section, item),
        }
    }
}

impl<F: ?Sized> Clone for Size<F> {
    fn clone(&self) -> Self {
        match self {
            Self::Fixed(v) => Self::Fixed(*v),
            Self::Dynamic(f) => Self::Dynamic(Arc::clone(f)),
        }
    }
}

impl<F: ?Sized> PartialEq for Size<F> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Fixed(a), Self::Fixed(b)) => a == b,
            (Self::Dynamic(a), Self::Dynamic(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl<F: ?Sized> Default for Size<F> {
    fn default() -> Self {
        Self::Fixed(0)
    }
}

impl<F: ?Sized> fmt::Debug for Size<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fixed(v) => f.debug_tuple("Fixed").field(v).finish(),
            Self::Dynamic(_) => f.write_str("Dynamic(..)"),
        }
    }
}

/// Geometry configuration for [`crate::LayoutComputer`].
///
/// This is an immutable value: build a new one and hand it to `LayoutComputer::configure`, which
/// compares it against the current configuration to decide whether a full recompute is needed.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LayoutOptions {
    pub header_size: EdgeSize,
    pub footer_size: EdgeSize,
    pub section_size: SectionSize,
    pub section_footer_size: SectionSize,
    /// A fixed item size makes every section uniform (stored as one aggregate entry).
    pub item_size: ItemSize,
    /// Item count per section, in order.
    pub sections: Vec<usize>,
    /// Space before the header.
    pub inset_start: u32,
    /// Space after the footer.
    pub inset_end: u32,
    /// Keep the header and footer in every computed window.
    pub sticky_header_footer: bool,
}

impl LayoutOptions {
    /// Creates options for a list of uniform sections with no headers or footers.
    pub fn new(sections: impl Into<Vec<usize>>, item_size: u32) -> Self {
        Self {
            sections: sections.into(),
            item_size: Size::Fixed(item_size),
            ..Self::default()
        }
    }

    pub fn with_sections(mut self, sections: impl Into<Vec<usize>>) -> Self {
        self.sections = sections.into();
        self
    }

    pub fn with_header_size(mut self, size: u32) -> Self {
        self.header_size = Size::Fixed(size);
        self
    }

    pub fn with_header_size_fn(mut self, f: impl Fn() -> u32 + Send + Sync + 'static) -> Self {
        self.header_size = EdgeSize::dynamic(f);
        self
    }

    pub fn with_footer_size(mut self, size: u32) -> Self {
        self.footer_size = Size::Fixed(size);
        self
    }

    pub fn with_footer_size_fn(mut self, f: impl Fn() -> u32 + Send + Sync + 'static) -> Self {
        self.footer_size = EdgeSize::dynamic(f);
        self
    }

    pub fn with_section_size(mut self, size: u32) -> Self {
        self.section_size = Size::Fixed(size);
        self
    }

    pub fn with_section_size_fn(
        mut self,
        f: impl Fn(usize) -> u32 + Send + Sync + 'static,
    ) -> Self {
        self.section_size = SectionSize::dynamic(f);
        self
    }

    pub fn with_section_footer_size(mut self, size: u32) -> Self {
        self.section_footer_size = Size::Fixed(size);
        self
    }

    pub fn with_section_footer_size_fn(
        mut self,
        f: impl Fn(usize) -> u32 + Send + Sync + 'static,
    ) -> Self {
        self.section_footer_size = SectionSize::dynamic(f);
        self
    }

    /// Sets a constant item size, making every section uniform.
    pub fn with_item_size(mut self, size: u32) -> Self {
        self.item_size = Size::Fixed(size);
        self
    }

    pub fn with_item_size_fn(
        mut self,
        f: impl Fn(usize, usize) -> u32 + Send + Sync + 'static,
    ) -> Self {
        self.item_size = ItemSize::dynamic(f);
        self
    }

    pub fn with_insets(mut self, inset_start: u32, inset_end: u32) -> Self {
        self.inset_start = inset_start;
        self.inset_end = inset_end;
        self
    }

    pub fn with_sticky_header_footer(mut self, sticky: bool) -> Self {
        self.sticky_header_footer = sticky;
        self
    }
}
