//! Translation of surface measurements into page-local items and anchors.

use crate::block_compiler::{ElementKey, UnitBody, UnitPart, VisualUnit};
use crate::layout_ir::{AnchorPosition, CanvasItem, IdSource, MediaItem, PageId, Rect, TextItem};

/// Coordinate frame of the page currently being filled.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct AnchorFrame {
    pub page_id: PageId,
    pub step_index: usize,
    /// Surface origin in oracle coordinates.
    pub surface_left: f32,
    pub surface_top: f32,
    /// Page padding re-added to surface-relative positions.
    pub padding: f32,
    pub column_width: f32,
    pub gap: f32,
    pub column_count: usize,
}

impl AnchorFrame {
    /// Page-local position of a measured rect.
    pub(crate) fn to_page(&self, rect: &Rect) -> (f32, f32) {
        (
            rect.left - self.surface_left + self.padding,
            rect.top - self.surface_top + self.padding,
        )
    }

    /// 0-based column containing `rect`, clamped to the page's columns.
    pub(crate) fn column_of(&self, rect: &Rect) -> usize {
        let stride = self.column_width + self.gap;
        let max_column = self.column_count.max(1) - 1;
        if stride <= 0.0 {
            return 0;
        }
        let column = ((rect.left - self.surface_left) / stride).floor();
        if column.is_nan() || column <= 0.0 {
            return 0;
        }
        (column as usize).min(max_column)
    }

    fn anchor(&self, segment_id: &str, order_index: usize, rect: &Rect) -> AnchorPosition {
        let (x, y) = self.to_page(rect);
        AnchorPosition {
            segment_id: segment_id.to_string(),
            order_index,
            step_index: self.step_index,
            page_id: self.page_id.clone(),
            column: self.column_of(rect),
            x,
            y,
            width: rect.width,
            height: rect.height,
        }
    }
}

/// Items and anchors produced for one content unit.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct UnitPlacement {
    /// Items in emission order with ascending z.
    pub items: Vec<CanvasItem>,
    pub anchors: Vec<AnchorPosition>,
    /// Segments skipped because the surface reported no rect.
    pub unmeasured: Vec<String>,
}

impl UnitPlacement {
    /// First z index free after this placement.
    pub(crate) fn next_z(&self, z_start: u32) -> u32 {
        z_start.saturating_add(self.items.len() as u32)
    }
}

/// Measure every segment of a settled content unit and emit its items.
pub(crate) fn place_unit<M>(
    frame: &AnchorFrame,
    unit: &VisualUnit,
    z_start: u32,
    measure: M,
    ids: &mut dyn IdSource,
) -> UnitPlacement
where
    M: Fn(&ElementKey) -> Option<Rect>,
{
    let mut placement = UnitPlacement::default();
    let UnitBody::Flow(parts) = &unit.body else {
        return placement;
    };
    let step_index = unit.step_index();
    let mut z_index = z_start;

    for part in parts {
        match part {
            UnitPart::Text(run) => {
                let key = ElementKey::Segment {
                    step_index,
                    segment_id: run.segment_id.clone(),
                };
                let Some(rect) = measure(&key) else {
                    placement.unmeasured.push(run.segment_id.clone());
                    continue;
                };
                let anchor = frame.anchor(&run.segment_id, run.order_index, &rect);
                placement.items.push(CanvasItem::Text(TextItem {
                    id: ids.item_id(&frame.page_id, &run.segment_id),
                    content: run.html.clone(),
                    x: anchor.x,
                    y: anchor.y,
                    z_index,
                    style: run.style.clone(),
                    segment_id: run.segment_id.clone(),
                }));
                placement.anchors.push(anchor);
                z_index += 1;
            }
            UnitPart::Media(row) => {
                for cell in &row.cells {
                    let key = ElementKey::Segment {
                        step_index,
                        segment_id: cell.segment_id.clone(),
                    };
                    let Some(rect) = measure(&key) else {
                        placement.unmeasured.push(cell.segment_id.clone());
                        continue;
                    };
                    let anchor = frame.anchor(&cell.segment_id, cell.order_index, &rect);
                    placement.items.push(CanvasItem::Media(MediaItem {
                        id: ids.item_id(&frame.page_id, &cell.segment_id),
                        src: cell.src.clone(),
                        w: rect.width,
                        h: rect.height,
                        x: anchor.x,
                        y: anchor.y,
                        z_index,
                        segment_id: cell.segment_id.clone(),
                        media_type: cell.media_type,
                    }));
                    placement.anchors.push(anchor);
                    z_index += 1;
                }
            }
        }
    }
    placement
}

/// Anchor for a measured line/column break spacer.
pub(crate) fn spacer_anchor(frame: &AnchorFrame, block_id: &str, rect: &Rect) -> AnchorPosition {
    frame.anchor(block_id, 0, rect)
}

/// 1x1 placeholder anchor at the page's top-left padding offset.
pub(crate) fn page_break_anchor(frame: &AnchorFrame, block_id: &str) -> AnchorPosition {
    AnchorPosition {
        segment_id: block_id.to_string(),
        order_index: 0,
        step_index: frame.step_index,
        page_id: frame.page_id.clone(),
        column: 0,
        x: frame.padding,
        y: frame.padding,
        width: 1.0,
        height: 1.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block_compiler::{MediaCell, MediaRow, TextRun, UnitKey};
    use crate::layout_ir::SequentialIds;
    use slate_flow::{DefaultStyleResolver, MediaType, SegmentStyle, StyleResolver};
    use std::collections::BTreeMap;

    fn frame(column_count: usize) -> AnchorFrame {
        AnchorFrame {
            page_id: "slide".to_string(),
            step_index: 4,
            surface_left: 100.0,
            surface_top: 50.0,
            padding: 32.0,
            column_width: 596.0,
            gap: 24.0,
            column_count,
        }
    }

    fn unit() -> VisualUnit {
        let style = DefaultStyleResolver::default().to_render_style(&SegmentStyle::default());
        VisualUnit {
            key: UnitKey(4),
            block_id: "b4".to_string(),
            body: UnitBody::Flow(vec![
                UnitPart::Text(TextRun {
                    segment_id: "t0".to_string(),
                    order_index: 0,
                    html: "$x$".to_string(),
                    style,
                    typeset_html: Some("<span class=\"katex\">x</span>".to_string()),
                }),
                UnitPart::Media(MediaRow {
                    height: 120.0,
                    cells: vec![
                        MediaCell {
                            segment_id: "m1".to_string(),
                            order_index: 1,
                            src: "a.png".to_string(),
                            media_type: MediaType::Image,
                            width: 160.0,
                            height: 120.0,
                        },
                        MediaCell {
                            segment_id: "m2".to_string(),
                            order_index: 2,
                            src: "b.mp4".to_string(),
                            media_type: MediaType::Video,
                            width: 213.0,
                            height: 120.0,
                        },
                    ],
                }),
            ]),
        }
    }

    fn key(segment_id: &str) -> ElementKey {
        ElementKey::Segment {
            step_index: 4,
            segment_id: segment_id.to_string(),
        }
    }

    #[test]
    fn translates_rects_into_page_space_with_ascending_z() {
        let mut rects = BTreeMap::new();
        rects.insert(key("t0"), Rect::new(100.0, 50.0, 40.0, 39.2));
        rects.insert(key("m1"), Rect::new(100.0, 97.2, 160.0, 120.0));
        rects.insert(key("m2"), Rect::new(284.0, 97.2, 213.0, 120.0));
        let mut ids = SequentialIds::default();
        let placement = place_unit(&frame(1), &unit(), 3, |k| rects.get(k).copied(), &mut ids);

        assert_eq!(placement.items.len(), 3);
        let z: Vec<u32> = placement.items.iter().map(CanvasItem::z_index).collect();
        assert_eq!(z, vec![3, 4, 5]);
        assert_eq!(placement.next_z(3), 6);
        assert_eq!(placement.items[0].origin(), (32.0, 32.0));
        match &placement.items[0] {
            CanvasItem::Text(text) => assert_eq!(text.content, "$x$"),
            other => panic!("expected text item, got {other:?}"),
        }
        match &placement.items[2] {
            CanvasItem::Media(media) => {
                assert_eq!((media.w, media.h), (213.0, 120.0));
                assert_eq!(media.media_type, MediaType::Video);
                assert_eq!(media.x, 216.0);
                assert!((media.y - 79.2).abs() < 1e-3);
            }
            other => panic!("expected media item, got {other:?}"),
        }
        assert!(placement
            .anchors
            .iter()
            .all(|a| a.step_index == 4 && a.page_id == "slide" && a.column == 0));
        assert_eq!(placement.anchors[2].order_index, 2);
    }

    #[test]
    fn unmeasured_segments_get_neither_item_nor_anchor() {
        let mut rects = BTreeMap::new();
        rects.insert(key("m1"), Rect::new(100.0, 50.0, 160.0, 120.0));
        let mut ids = SequentialIds::default();
        let placement = place_unit(&frame(1), &unit(), 0, |k| rects.get(k).copied(), &mut ids);
        assert_eq!(placement.items.len(), 1);
        assert_eq!(placement.items[0].z_index(), 0);
        assert_eq!(placement.anchors.len(), 1);
        assert_eq!(placement.unmeasured, vec!["t0".to_string(), "m2".to_string()]);
    }

    #[test]
    fn column_index_is_clamped_to_page_columns() {
        let frame = frame(2);
        assert_eq!(frame.column_of(&Rect::new(100.0, 0.0, 1.0, 1.0)), 0);
        assert_eq!(frame.column_of(&Rect::new(719.0, 0.0, 1.0, 1.0)), 0);
        assert_eq!(frame.column_of(&Rect::new(720.0, 0.0, 1.0, 1.0)), 1);
        assert_eq!(frame.column_of(&Rect::new(5000.0, 0.0, 1.0, 1.0)), 1);
        assert_eq!(frame.column_of(&Rect::new(-40.0, 0.0, 1.0, 1.0)), 0);
    }

    #[test]
    fn page_break_anchor_is_a_padding_placeholder() {
        let anchor = page_break_anchor(&frame(3), "brk");
        assert_eq!((anchor.x, anchor.y, anchor.width, anchor.height), (32.0, 32.0, 1.0, 1.0));
        assert_eq!(anchor.column, 0);
        assert_eq!(anchor.segment_id, "brk");
    }
}
