//! Data structures and procedures for handling source locations.

use std::{
    fmt,
    ops::{Add, AddAssign, Range, Sub},
};

pub use source_map::{FileName, SourceFile, SourceFileIndex, SourceMap};
pub use spanned::Spanned;
pub use spanning::{PossiblySpanning, Spanning};

pub mod source_map;

/// A global byte index.
///
/// Here, "global" means relative to a [source map](SourceMap).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug, Hash, Default)]
pub struct ByteIndex(u32);

impl ByteIndex {
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    /// Map a global byte index to a local one.
    pub fn local(self, file: &SourceFile) -> LocalByteIndex {
        LocalByteIndex::new(self.0 - file.span().start.0)
    }
}

impl Add<u32> for ByteIndex {
    type Output = Self;

    fn add(self, offset: u32) -> Self::Output {
        Self(self.0 + offset)
    }
}

impl AddAssign<u32> for ByteIndex {
    fn add_assign(&mut self, offset: u32) {
        self.0 += offset;
    }
}

impl TryFrom<usize> for ByteIndex {
    type Error = std::num::TryFromIntError;

    fn try_from(index: usize) -> Result<Self, Self::Error> {
        Ok(Self(index.try_into()?))
    }
}

/// A file-local byte index.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug, Hash, Default)]
pub struct LocalByteIndex(u32);

impl LocalByteIndex {
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    /// Map a local byte index to a global one.
    pub fn global(self, file: &SourceFile) -> ByteIndex {
        ByteIndex::new(file.span().start.0 + self.0)
    }
}

impl From<LocalByteIndex> for usize {
    fn from(index: LocalByteIndex) -> Self {
        index.0 as usize
    }
}

impl TryFrom<usize> for LocalByteIndex {
    type Error = std::num::TryFromIntError;

    fn try_from(index: usize) -> Result<Self, Self::Error> {
        Ok(Self(index.try_into()?))
    }
}

impl Add<u32> for LocalByteIndex {
    type Output = Self;

    fn add(self, offset: u32) -> Self::Output {
        Self(self.0 + offset)
    }
}

impl Add<char> for LocalByteIndex {
    type Output = Self;

    fn add(self, character: char) -> Self::Output {
        self + character.len_utf8() as u32
    }
}

impl Sub for LocalByteIndex {
    type Output = Self;

    fn sub(self, other: Self) -> Self::Output {
        Self(self.0 - other.0)
    }
}

impl Sub<u32> for LocalByteIndex {
    type Output = Self;

    fn sub(self, offset: u32) -> Self::Output {
        Self(self.0 - offset)
    }
}

/// A global byte span of source code.
///
/// _Global_ means relative to a [`SourceMap`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Span {
    /// The start of the span, inclusive.
    pub(crate) start: ByteIndex,
    /// The end of the span, exclusive.
    pub(crate) end: ByteIndex,
}

impl Span {
    #[track_caller]
    pub fn new(start: ByteIndex, end: ByteIndex) -> Self {
        debug_assert!(start <= end, "span start ({}) > span end ({})", start.0, end.0);

        Self { start, end }
    }

    /// Create an empty span at the given index.
    pub fn empty(index: ByteIndex) -> Self {
        Self::new(index, index)
    }

    pub fn with_length(start: ByteIndex, length: u32) -> Self {
        Self::new(start, ByteIndex(start.0 + length))
    }

    pub fn length(self) -> u32 {
        self.end.0 - self.start.0
    }

    pub fn is_empty(self) -> bool {
        self.start == self.end
    }

    pub fn contains(self, index: ByteIndex) -> bool {
        self.start <= index && index <= self.end
    }

    pub fn start(self) -> Self {
        Self::empty(self.start)
    }

    pub fn end(self) -> Self {
        Self::empty(self.end)
    }

    pub fn local(self, file: &SourceFile) -> LocalSpan {
        LocalSpan::new(self.start.local(file), self.end.local(file))
    }

    #[must_use]
    pub fn merge(self, other: &impl PossiblySpanning) -> Self {
        match other.possible_span() {
            Some(other) => Self::new(self.start, other.end),
            None => self,
        }
    }

    pub fn merging<S: PossiblySpanning>(&mut self, other: S) -> S {
        if let Some(other) = other.possible_span() {
            self.end = other.end;
        }
        other
    }

    /// Similar to [`Self::merge`] except that the spans do not need to be disjoint.
    #[must_use]
    pub fn fit_end(self, other: &impl PossiblySpanning) -> Self {
        match other.possible_span() {
            Some(other) => Self::new(self.start, other.end),
            None => self,
        }
    }
}

impl fmt::Debug for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start.0, self.end.0)
    }
}

impl Spanning for Span {
    fn span(&self) -> Self {
        *self
    }
}

/// A span inside a single source file.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct LocalSpan {
    pub start: LocalByteIndex,
    pub end: LocalByteIndex,
}

impl LocalSpan {
    #[track_caller]
    pub fn new(start: LocalByteIndex, end: LocalByteIndex) -> Self {
        debug_assert!(start <= end);

        Self { start, end }
    }

    pub fn empty(index: LocalByteIndex) -> Self {
        Self::new(index, index)
    }

    pub fn with_length(start: LocalByteIndex, length: u32) -> Self {
        Self::new(start, start + length)
    }

    pub fn set_end(&mut self, index: LocalByteIndex) {
        self.end = index;
    }

    #[must_use]
    pub fn trim(self, amount: u32) -> Self {
        Self::new(self.start + amount, self.end - amount)
    }

    #[must_use]
    pub fn trim_start(self, amount: u32) -> Self {
        Self::new(self.start + amount, self.end)
    }

    pub fn global(self, file: &SourceFile) -> Span {
        Span::new(self.start.global(file), self.end.global(file))
    }
}

impl fmt::Debug for LocalSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", usize::from(self.start), usize::from(self.end))
    }
}

impl From<LocalSpan> for Range<usize> {
    fn from(span: LocalSpan) -> Self {
        span.start.into()..span.end.into()
    }
}

/// Convenience function for constructing a global span for test code.
pub fn span(start: u32, end: u32) -> Span {
    Span::new(ByteIndex::new(start), ByteIndex::new(end))
}

mod spanning {
    use super::Span;
    use utility::SmallVec;

    pub trait Spanning: PossiblySpanning {
        fn span(&self) -> Span;
    }

    impl<S: Spanning> Spanning for &S {
        fn span(&self) -> Span {
            (**self).span()
        }
    }

    pub trait PossiblySpanning {
        fn possible_span(&self) -> Option<Span>;
    }

    impl<S: Spanning> PossiblySpanning for S {
        fn possible_span(&self) -> Option<Span> {
            Some(self.span())
        }
    }

    impl<S: Spanning> PossiblySpanning for Vec<S> {
        fn possible_span(&self) -> Option<Span> {
            self.first().map(|item| {
                let mut span = item.span();
                span.merging(self.last());
                span
            })
        }
    }

    impl<S: Spanning, const N: usize> PossiblySpanning for SmallVec<S, N>
    where
        [S; N]: smallvec::Array<Item = S>,
    {
        fn possible_span(&self) -> Option<Span> {
            self.first().map(|item| {
                let mut span = item.span();
                span.merging(self.last());
                span
            })
        }
    }

    impl<S> PossiblySpanning for Option<S>
    where
        S: PossiblySpanning,
    {
        fn possible_span(&self) -> Option<Span> {
            self.as_ref().and_then(PossiblySpanning::possible_span)
        }
    }
}

mod spanned {
    use super::{Span, Spanning};
    use std::fmt;

    #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
    pub struct Spanned<Bare> {
        pub bare: Bare,
        pub span: Span,
    }

    impl<Bare> Spanned<Bare> {
        pub const fn new(span: Span, bare: Bare) -> Self {
            Self { bare, span }
        }

        /// Create a spanned item with an unknown location.
        pub fn bare(bare: Bare) -> Self {
            Self { bare, span: Span::default() }
        }

        pub fn map<Output>(self, mapper: impl FnOnce(Bare) -> Output) -> Spanned<Output> {
            Spanned { bare: mapper(self.bare), span: self.span }
        }

        pub const fn as_ref(&self) -> Spanned<&Bare> {
            Spanned { bare: &self.bare, span: self.span }
        }
    }

    impl<Bare> Spanning for Spanned<Bare> {
        fn span(&self) -> Span {
            self.span
        }
    }

    impl<Bare: fmt::Debug> fmt::Debug for Spanned<Bare> {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "{:?} {:?}", self.bare, self.span)
        }
    }

    impl<Bare: fmt::Display> fmt::Display for Spanned<Bare> {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            self.bare.fmt(f)
        }
    }
}
