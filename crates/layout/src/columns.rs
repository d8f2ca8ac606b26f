use quire_types::ColumnLayout;

/// Column geometry resolved against a concrete content width.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizedColumns {
    pub count: u32,
    pub gap: f32,
    pub width: f32,
}

impl NormalizedColumns {
    pub fn single(content_width: f32) -> Self {
        Self {
            count: 1,
            gap: 0.0,
            width: content_width,
        }
    }

    /// Horizontal offset of column `index` from the left edge of the content box.
    pub fn offset_of(&self, index: usize) -> f32 {
        index as f32 * (self.width + self.gap)
    }
}

/// Resolves a declared column layout against `content_width`.
///
/// The count is floored at one and the gap clamped at zero. When the gaps
/// leave no positive width per column, the result is a single column spanning
/// the whole content width.
pub fn normalize_columns(columns: Option<ColumnLayout>, content_width: f32) -> NormalizedColumns {
    let Some(columns) = columns else {
        return NormalizedColumns::single(content_width);
    };
    let count = columns.count.max(1);
    let gap = columns.gap.max(0.0);
    let width = (content_width - gap * (count - 1) as f32) / count as f32;

    if width <= 0.0 || !width.is_finite() {
        log::debug!(
            "Column layout {}x{} does not fit in {}px; falling back to a single column",
            columns.count,
            columns.gap,
            content_width
        );
        return NormalizedColumns::single(content_width);
    }

    NormalizedColumns { count, gap, width }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gap_wider_than_content_falls_back() {
        let cols = normalize_columns(Some(ColumnLayout { count: 3, gap: 500.0 }), 600.0);
        assert_eq!(
            cols,
            NormalizedColumns {
                count: 1,
                gap: 0.0,
                width: 600.0
            }
        );
    }

    #[test]
    fn test_two_columns_split_evenly() {
        let cols = normalize_columns(Some(ColumnLayout { count: 2, gap: 48.0 }), 612.0);
        assert_eq!(
            cols,
            NormalizedColumns {
                count: 2,
                gap: 48.0,
                width: 282.0
            }
        );
        assert_eq!(cols.offset_of(1), 330.0);
    }

    #[test]
    fn test_degenerate_inputs_are_clamped() {
        let cols = normalize_columns(Some(ColumnLayout { count: 0, gap: -10.0 }), 400.0);
        assert_eq!(cols.count, 1);
        assert_eq!(cols.gap, 0.0);
        assert_eq!(cols.width, 400.0);

        assert_eq!(normalize_columns(None, 300.0), NormalizedColumns::single(300.0));
    }
}
