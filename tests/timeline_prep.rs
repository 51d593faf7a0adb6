use slate_flow::{
    plain_text, AllowListSanitizer, BlockKind, DefaultStyleResolver, HtmlSanitizer, MediaType,
    StepBlock, StepSegment, StyleResolver, EMPTY_TEXT_PLACEHOLDER,
};

const TIMELINE: &str = r#"[
    {"id": "intro", "kind": "content", "segments": [
        {"type": "image", "id": "fig", "orderIndex": 1, "src": "fig.png", "width": 640, "height": 480},
        {"type": "text", "id": "title", "orderIndex": 0,
         "html": "<h1 onclick=\"x()\">Limits</h1><script>steal()</script>",
         "style": {"fontSize": 44, "fontWeight": "bold"}}
    ]},
    {"id": "gap", "kind": "line-break"},
    {"id": "next", "kind": "page-break"},
    {"id": "clip", "kind": "content", "segments": [
        {"type": "video", "id": "demo", "orderIndex": 0, "src": "demo.mp4"},
        {"type": "text", "id": "blank", "orderIndex": 1, "html": "   "}
    ]}
]"#;

fn timeline() -> Vec<StepBlock> {
    serde_json::from_str(TIMELINE).expect("timeline should parse")
}

#[test]
fn authored_timeline_parses_with_segment_order() {
    let blocks = timeline();
    let kinds: Vec<&BlockKind> = blocks.iter().map(|block| &block.kind).collect();
    assert_eq!(
        kinds,
        vec![
            &BlockKind::Content,
            &BlockKind::LineBreak,
            &BlockKind::PageBreak,
            &BlockKind::Content
        ]
    );
    assert!(blocks[1].segments.is_empty());

    let ordered: Vec<&str> = blocks[0]
        .ordered_segments()
        .into_iter()
        .filter_map(StepSegment::id)
        .collect();
    assert_eq!(ordered, vec!["title", "fig"]);
    assert_eq!(blocks[3].segments[0].media_type(), Some(MediaType::Video));
}

#[test]
fn text_segments_are_sanitized_and_styled_for_layout() {
    let blocks = timeline();
    let sanitizer = AllowListSanitizer::new();
    let styles = DefaultStyleResolver::default();
    let StepSegment::Text(title) = &blocks[0].segments[1] else {
        panic!("second authored segment is the title");
    };

    let clean = sanitizer.sanitize(&title.html);
    assert_eq!(clean, "Limits");
    assert_eq!(plain_text(&clean), "Limits");

    let style = styles.to_render_style(&title.style);
    assert_eq!(style.font_size_px, 44.0);
    assert_eq!(style.font_weight, 700);

    let StepSegment::Text(blank) = &blocks[3].segments[1] else {
        panic!("second clip segment is text");
    };
    assert_eq!(sanitizer.sanitize_non_empty(&blank.html), EMPTY_TEXT_PLACEHOLDER);
}

#[test]
fn timeline_round_trips_through_json() {
    let blocks = timeline();
    let json = serde_json::to_string(&blocks).expect("timeline should serialize");
    let again: Vec<StepBlock> = serde_json::from_str(&json).expect("timeline should reparse");
    assert_eq!(blocks, again);
}
