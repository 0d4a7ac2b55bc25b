use std::ops::Range;

/// 代表源代码中的一个位置范围，包含起始和结束的字节索引。
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// 合并两个 span：从 `self` 的起点一直到 `other` 的终点。
    pub fn to(self, other: Span) -> Self {
        Self::new(self.start, other.end.max(self.start))
    }

    /// 把 span 整体平移 `offset` 个字节（用于插值字符串内部的重新扫描）。
    pub fn shifted(self, offset: usize) -> Self {
        Self::new(self.start + offset, self.end + offset)
    }

    pub fn into_range(self) -> Range<usize> {
        self.start..self.end
    }
}

impl From<Range<usize>> for Span {
    fn from(range: Range<usize>) -> Self {
        Self {
            start: range.start,
            end: range.end,
        }
    }
}
