//! Layout scenarios and invariants, checked against the recording backend.
//!
//! The recording backend draws every character 5pt wide at its default 10pt
//! font size, with 12pt lines; a single line of text is 13.8pt tall
//! including the slack below it.

use stackpdf::backend::recording::{DrawOp, RecordingBackend};
use stackpdf::backend::{Backend, TextOptions};
use stackpdf::model::{Edges, PageConfig, PageSize};
use stackpdf::style::{Color, Dimension, HAlign, Style, VAlign};
use stackpdf::tree::ElementKind;
use stackpdf::{Document, DocumentState, Geometry, LayoutError, NodeId};

type TestDoc = Document<RecordingBackend>;

const TOL: f64 = 1e-6;

fn doc(width: f64, height: f64, margin: f64) -> TestDoc {
    Document::new(PageConfig {
        size: PageSize::Custom { width, height },
        margin: Edges::uniform(margin),
    })
}

fn geom(doc: &TestDoc, id: NodeId) -> Geometry {
    doc.geometry(id).expect("node has no geometry")
}

fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < TOL,
        "expected {expected}, got {actual}"
    );
}

fn words(count: usize) -> String {
    vec!["abcd"; count].join(" ")
}

fn width(w: f64) -> Style {
    Style {
        width: Some(Dimension::Pt(w)),
        ..Default::default()
    }
}

fn percent(p: f64) -> Style {
    Style {
        width: Some(Dimension::Percent(p)),
        ..Default::default()
    }
}

/// A Page holding `children`, appended to the document.
fn page(doc: &mut TestDoc, children: Vec<NodeId>) -> NodeId {
    let page = doc.tree_mut().page(Style::default(), children);
    doc.append(page);
    page
}

#[test]
fn test_full_width_stack_fills_the_content_area() {
    let mut d = doc(595.0, 842.0, 50.0);
    let tree = d.tree_mut();
    let text = tree.text("hello", Style::default());
    let stack = tree.vstack(percent(100.0), vec![text]);
    page(&mut d, vec![stack]);
    d.compute().unwrap();

    let g = geom(&d, stack);
    assert_close(g.width, 495.0);
    assert_close(g.start_x, 50.0);
    assert_close(g.start_y, 50.0);
    assert_eq!(g.start_page, 1);
    assert_eq!(d.max_page(), 1);
}

#[test]
fn test_percentage_cells_fill_rows_then_wrap() {
    let mut d = doc(200.0, 100.0, 10.0);
    let tree = d.tree_mut();
    let cells: Vec<NodeId> = ["a", "b", "c"].iter().map(|t| tree.text(*t, percent(50.0))).collect();
    let row = tree.hstack(Style::default(), cells.clone());
    page(&mut d, vec![row]);
    d.compute().unwrap();

    let (a, b, c) = (geom(&d, cells[0]), geom(&d, cells[1]), geom(&d, cells[2]));
    assert_close(a.width, 90.0);
    assert_close(b.start_x, 100.0);
    assert_close(b.start_y, a.start_y);
    assert_close(c.start_x, 10.0);
    assert_close(c.start_y, a.end_y());
}

#[test]
fn test_unbreakable_text_wraps_to_a_new_row() {
    let mut d = doc(300.0, 200.0, 50.0);
    let tree = d.tree_mut();
    let first = tree.text("a".repeat(30), Style::default());
    let second = tree.text("b".repeat(20), Style::default());
    let row = tree.hstack(Style::default(), vec![first, second]);
    page(&mut d, vec![row]);
    d.compute().unwrap();

    let (f, s) = (geom(&d, first), geom(&d, second));
    assert!(!f.is_wrapped);
    assert!(s.is_wrapped);
    assert_close(f.width, 150.0);
    assert_close(s.width, 100.0);
    assert_close(s.start_x, 50.0);
    assert_close(s.start_y, 63.8);
    assert_close(geom(&d, row).height, 27.6);
}

#[test]
fn test_absolute_image_anchors_to_bottom_right() {
    let mut d = doc(400.0, 300.0, 20.0);
    let tree = d.tree_mut();
    let image = tree.image(
        "logo.png",
        Style {
            width: Some(Dimension::Pt(100.0)),
            height: Some(Dimension::Pt(50.0)),
            right: Some(20.0),
            bottom: Some(30.0),
            ..Default::default()
        },
    );
    let text = tree.text("after", Style::default());
    page(&mut d, vec![image, text]);
    d.build().unwrap();

    let g = geom(&d, image);
    assert!(g.is_absolute);
    assert_close(g.start_x, 280.0);
    assert_close(g.start_y, 220.0);
    // Absolute boxes leave the flow alone.
    assert_close(geom(&d, text).start_y, 20.0);

    let ops = &d.backend().unwrap().ops;
    assert!(ops.iter().any(|op| matches!(
        op,
        DrawOp::Image { page: 1, x, y, w, h, .. }
            if (*x - 280.0).abs() < TOL && (*y - 220.0).abs() < TOL && *w == 100.0 && *h == 50.0
    )));
}

#[test]
fn test_anchored_stack_carries_its_children() {
    let mut d = doc(400.0, 300.0, 20.0);
    let tree = d.tree_mut();
    let label = tree.text("abcd", Style::default());
    let stack = tree.vstack(
        Style {
            padding: Some(Edges::uniform(5.0)),
            right: Some(20.0),
            bottom: Some(30.0),
            ..Default::default()
        },
        vec![label],
    );
    let text = tree.text("after", Style::default());
    page(&mut d, vec![stack, text]);
    d.compute().unwrap();

    let s = geom(&d, stack);
    assert!(s.is_absolute);
    assert_close(s.end_x(), 380.0);
    assert_close(s.end_y(), 270.0);
    assert_close(s.start_x, 350.0);
    assert_close(s.start_y, 246.2);

    let l = geom(&d, label);
    assert_close(l.start_x, s.padding_start_x());
    assert_close(l.start_y, s.padding_start_y());
    assert!(l.end_x() <= s.padding_end_x() + TOL);
    assert!(l.end_y() <= s.padding_end_y() + TOL);
    assert_close(geom(&d, text).start_y, 20.0);
}

#[test]
fn test_long_text_splits_into_page_fragments() {
    let mut d = doc(200.0, 100.0, 10.0);
    let content = words(84);
    let tree = d.tree_mut();
    let text = tree.text(
        content.as_str(),
        Style {
            margin: Some(Edges::new(20.0, 0.0, 0.0, 10.0)),
            ..Default::default()
        },
    );
    tree.set_id(text, "essay");
    let p = page(&mut d, vec![text]);
    d.build().unwrap();

    let tree = d.tree();
    let fragments = tree.children(p).to_vec();
    assert_eq!(fragments.len(), 3);
    assert!(tree.parent(text).is_none(), "the original node is detached");

    let pages: Vec<usize> = fragments.iter().map(|&f| geom(&d, f).start_page).collect();
    assert_eq!(pages, vec![1, 2, 3]);

    let first = geom(&d, fragments[0]);
    assert_close(first.margin.top, 20.0);
    assert_close(first.margin.left, 10.0);
    for &f in &fragments[1..] {
        let g = geom(&d, f);
        assert_close(g.margin.top, 0.0);
        assert_close(g.margin.left, 0.0);
        assert_close(g.start_y, 10.0);
    }

    let joined: String = fragments
        .iter()
        .map(|&f| tree.node(f).text().unwrap_or_default())
        .collect();
    assert_eq!(joined, content);

    assert_eq!(tree.node(fragments[0]).id.as_deref(), Some("essay"));
    assert_eq!(d.page_numbers().get("essay"), Some(&1));
    assert_eq!(d.max_page(), 3);

    // 4 lines fit under the top margin on page 1, 6 on page 2, the rest on page 3.
    let ops = &d.backend().unwrap().ops;
    let lines_on = |page: usize| {
        ops.iter()
            .filter(|op| matches!(op, DrawOp::Text { page: p, .. } if *p == page))
            .count()
    };
    assert_eq!((lines_on(1), lines_on(2), lines_on(3)), (4, 6, 2));
}

#[test]
fn test_split_at_a_blank_line_stays_on_the_page() {
    let mut d = doc(200.0, 100.0, 10.0);
    let content = "l1\nl2\nl3\nl4\nl5\nl6\n\nm1\nm2\nm3\nm4\nm5\nm6";
    let text = d.tree_mut().text(content, Style::default());
    let p = page(&mut d, vec![text]);
    d.build().unwrap();

    let tree = d.tree();
    let fragments = tree.children(p).to_vec();
    assert_eq!(fragments.len(), 3);
    for &f in &fragments {
        let g = geom(&d, f);
        assert!(g.end_y() <= 90.0 + TOL, "{} ends at {}", tree.label(f), g.end_y());
    }
    assert_eq!(tree.node(fragments[0]).text(), Some("l1\nl2\nl3\nl4\nl5\nl6\n"));
    assert_eq!(tree.node(fragments[1]).text(), Some("\nm1\nm2\nm3\nm4\nm5\n"));

    let joined: String = fragments
        .iter()
        .map(|&f| tree.node(f).text().unwrap_or_default())
        .collect();
    assert_eq!(joined, content);

    let ops = &d.backend().unwrap().ops;
    assert!(ops
        .iter()
        .filter_map(|op| match op {
            DrawOp::Text { y, .. } => Some(*y),
            _ => None,
        })
        .all(|y| y + 12.0 <= 90.0 + TOL));
}

#[test]
fn test_recompute_starts_from_the_unsplit_tree() {
    let mut d = doc(200.0, 100.0, 10.0);
    let tree = d.tree_mut();
    let text = tree.text(words(84).as_str(), Style::default());
    let p = page(&mut d, vec![text]);
    d.compute().unwrap();
    let before = geom(&d, p);
    let pages = d.max_page();

    d.recompute().unwrap();
    assert_eq!(d.state(), DocumentState::Computed);
    assert_eq!(d.max_page(), pages);
    assert_eq!(geom(&d, p), before);
}

#[test]
fn test_failed_compute_leaves_the_tree_as_built() {
    let mut d = doc(200.0, 100.0, 10.0);
    let content = words(84);
    let tree = d.tree_mut();
    let text = tree.text(content.as_str(), Style::default());
    let chart = tree.image("chart.png", width(20.0));
    let p = page(&mut d, vec![text, chart]);

    assert!(matches!(
        d.compute().unwrap_err(),
        LayoutError::MissingImageDimension { .. }
    ));
    assert_eq!(d.state(), DocumentState::Uncomputed);
    assert_eq!(d.tree().children(p), &[text, chart]);
    assert!(!d.tree().node(text).fragment);
    assert!(d.geometry(text).is_none());

    d.tree_mut().node_mut(chart).style.height = Some(Dimension::Pt(20.0));
    d.compute().unwrap();
    let split = d.tree().children(p).len();
    assert!(split > 2, "the paragraph split again");
    let before = geom(&d, p);

    d.recompute().unwrap();
    let tree = d.tree();
    assert_eq!(tree.children(p).len(), split);
    assert_eq!(geom(&d, p), before);
    let joined: String = tree
        .children(p)
        .iter()
        .filter_map(|&f| tree.node(f).text())
        .collect();
    assert_eq!(joined, content);
}

#[test]
fn test_compute_is_idempotent() {
    let mut d = doc(200.0, 100.0, 10.0);
    let tree = d.tree_mut();
    let text = tree.text(words(30).as_str(), Style::default());
    let stack = tree.vstack(Style::default(), vec![text]);
    page(&mut d, vec![stack]);
    let snapshot = |d: &TestDoc| -> Vec<Option<Geometry>> {
        d.tree().descendants(d.root()).into_iter().map(|id| d.geometry(id)).collect()
    };

    d.compute().unwrap();
    let first = snapshot(&d);
    d.compute().unwrap();
    assert_eq!(snapshot(&d), first);
    d.recompute().unwrap();
    assert_eq!(snapshot(&d), first);
}

#[test]
fn test_same_page_stack_moves_to_a_fresh_page() {
    for same_page in [false, true] {
        let mut d = doc(200.0, 100.0, 10.0);
        let tree = d.tree_mut();
        let filler = tree.text(
            "x",
            Style {
                height: Some(Dimension::Pt(50.0)),
                ..Default::default()
            },
        );
        let items: Vec<NodeId> = ["a", "b", "c"].iter().map(|t| tree.text(*t, Style::default())).collect();
        let stack = tree.vstack(
            Style {
                same_page,
                ..Default::default()
            },
            items.clone(),
        );
        page(&mut d, vec![filler, stack]);
        d.compute().unwrap();

        let g = geom(&d, stack);
        if same_page {
            assert_eq!((g.start_page, g.end_page), (2, 2));
            assert_close(g.start_y, 10.0);
            assert_close(g.height, 41.4);
            for &item in &items {
                assert_eq!(geom(&d, item).start_page, 2);
            }
        } else {
            assert_eq!((g.start_page, g.end_page), (1, 2));
            assert_eq!(geom(&d, items[2]).start_page, 2);
            assert_close(geom(&d, items[2]).start_y, 10.0);
        }
    }
}

/// A 40pt spacer, then a stack of four lines that crosses onto page 2,
/// then one more line.
fn spanning_stack(height: Option<f64>) -> (TestDoc, NodeId, NodeId) {
    let mut d = doc(200.0, 100.0, 10.0);
    let tree = d.tree_mut();
    let spacer = tree.vstack(
        Style {
            height: Some(Dimension::Pt(40.0)),
            ..Default::default()
        },
        vec![],
    );
    let items: Vec<NodeId> = ["a", "b", "c", "d"].iter().map(|t| tree.text(*t, Style::default())).collect();
    let stack = tree.vstack(
        Style {
            height: height.map(Dimension::Pt),
            background_color: Some(Color::BLACK),
            ..Default::default()
        },
        items,
    );
    let after = tree.text("after", Style::default());
    page(&mut d, vec![spacer, stack, after]);
    d.build().unwrap();
    (d, stack, after)
}

#[test]
fn test_page_spanning_stack_ends_on_its_last_page() {
    for height in [None, Some(50.0)] {
        let (d, stack, after) = spanning_stack(height);
        let g = geom(&d, stack);
        assert_eq!((g.start_page, g.end_page), (1, 2));
        assert_close(g.start_y, 50.0);
        // 40pt on page 1 plus two lines on page 2
        assert_close(g.height, 67.6);
        assert!(g.end_y() >= g.start_y);
        assert_close(g.page_end_y(), 37.6);
        assert!(g.page_end_y() <= 90.0 + TOL);

        let a = geom(&d, after);
        assert_eq!(a.start_page, 2);
        assert_close(a.start_y, 37.6);
        assert_eq!(d.max_page(), 2);

        let ops = &d.backend().unwrap().ops;
        let fill_on = |page: usize| {
            ops.iter().find_map(|op| match op {
                DrawOp::Rect { page: p, y, h, .. } if *p == page => Some((*y, *h)),
                _ => None,
            })
        };
        let (y1, h1) = fill_on(1).expect("background on page 1");
        let (y2, h2) = fill_on(2).expect("background on page 2");
        assert_close(y1, 50.0);
        assert_close(h1, 40.0);
        assert_close(y2, 10.0);
        assert_close(h2, 27.6);
    }
}

#[test]
fn test_stretch_absorbs_row_slack() {
    let mut d = doc(200.0, 100.0, 10.0);
    let tree = d.tree_mut();
    let grow = tree.text(
        "ab",
        Style {
            stretch: true,
            ..Default::default()
        },
    );
    let fixed = tree.text("cd", Style::default());
    let row = tree.hstack(Style::default(), vec![grow, fixed]);
    page(&mut d, vec![row]);
    d.compute().unwrap();

    let (g, f) = (geom(&d, grow), geom(&d, fixed));
    // slack = 180 - 20 = 160, all of it to the one stretch child
    assert_close(g.width - 10.0, 160.0);
    assert_close(f.width, 10.0);
    assert_close(f.start_x, 180.0);
    assert_close(f.end_x(), 190.0);

    // Two stretch children around a fixed one split the slack evenly.
    let mut d = doc(200.0, 100.0, 10.0);
    let tree = d.tree_mut();
    let stretch = || Style {
        stretch: true,
        ..Default::default()
    };
    let left = tree.text("ab", stretch());
    let middle = tree.text("cd", Style::default());
    let right = tree.text("ef", stretch());
    let row = tree.hstack(Style::default(), vec![left, middle, right]);
    page(&mut d, vec![row]);
    d.compute().unwrap();

    let (l, m, r) = (geom(&d, left), geom(&d, middle), geom(&d, right));
    // slack = 180 - 30 = 150, 75 to each stretch child
    assert_close(l.width, 85.0);
    assert_close(m.width, 10.0);
    assert_close(r.width, 85.0);
    assert_close(l.width + m.width + r.width, 180.0);
    assert_close(m.start_x, l.end_x());
    assert_close(r.start_x, m.end_x());
    assert_close(r.end_x(), 190.0);
}

#[test]
fn test_row_members_align_vertically() {
    let mut d = doc(200.0, 100.0, 10.0);
    let tree = d.tree_mut();
    let big = tree.text(
        "A",
        Style {
            font_size: Some(20.0),
            ..Default::default()
        },
    );
    let small = tree.text("b", Style::default());
    let row = tree.hstack(
        Style {
            vertical_align: Some(VAlign::Center),
            ..Default::default()
        },
        vec![big, small],
    );
    page(&mut d, vec![row]);
    d.compute().unwrap();

    let (b, s) = (geom(&d, big), geom(&d, small));
    assert_close(b.height, 27.6);
    assert_close(s.start_y - b.start_y, 6.9);
}

#[test]
fn test_column_children_align_horizontally() {
    let mut d = doc(400.0, 300.0, 20.0);
    let tree = d.tree_mut();
    let text = tree.text("abcd", Style::default());
    let column = tree.vstack(
        Style {
            align: Some(HAlign::Center),
            ..width(100.0)
        },
        vec![text],
    );
    page(&mut d, vec![column]);
    d.compute().unwrap();

    assert_close(geom(&d, text).start_x, 60.0);
}

#[test]
fn test_every_page_node_opens_a_page() {
    let mut d = doc(200.0, 100.0, 10.0);
    let first = d.tree_mut().text("one", Style::default());
    let second = d.tree_mut().text("two", Style::default());
    d.tree_mut().set_id(second, "two");
    page(&mut d, vec![first]);
    page(&mut d, vec![second]);
    d.build().unwrap();

    assert_eq!(geom(&d, first).start_page, 1);
    assert_eq!(geom(&d, second).start_page, 2);
    assert_close(geom(&d, second).start_y, 10.0);
    assert_eq!(d.page_numbers().get("two"), Some(&2));
    assert_eq!(d.backend().unwrap().page_count(), 2);
}

#[test]
fn test_page_binding_requires_absolute_position() {
    let mut d = doc(200.0, 100.0, 10.0);
    let text = d.tree_mut().text(
        "x",
        Style {
            page: Some(2),
            ..Default::default()
        },
    );
    page(&mut d, vec![text]);
    let err = d.compute().unwrap_err();
    assert!(matches!(err, LayoutError::InvalidPageBinding { page: 2, .. }));
    assert_eq!(d.state(), DocumentState::Uncomputed);
}

#[test]
fn test_absolute_node_bound_to_a_later_page() {
    let mut d = doc(200.0, 100.0, 10.0);
    let stamp = d.tree_mut().text(
        "draft",
        Style {
            page: Some(3),
            top: Some(5.0),
            left: Some(5.0),
            ..Default::default()
        },
    );
    page(&mut d, vec![stamp]);
    d.compute().unwrap();

    let g = geom(&d, stamp);
    assert_eq!(g.start_page, 3);
    assert_close(g.start_x, 5.0);
    assert_eq!(d.max_page(), 3);
}

#[test]
fn test_image_needs_both_dimensions() {
    let mut d = doc(200.0, 100.0, 10.0);
    let image = d.tree_mut().image("a.png", width(20.0));
    page(&mut d, vec![image]);
    assert!(matches!(
        d.compute().unwrap_err(),
        LayoutError::MissingImageDimension { .. }
    ));
}

#[test]
fn test_unknown_code_language_fails() {
    let mut d = doc(200.0, 100.0, 10.0);
    let block = d.tree_mut().code_block("cobol", "DISPLAY 'HI'.", Style::default());
    page(&mut d, vec![block]);
    assert!(matches!(
        d.compute().unwrap_err(),
        LayoutError::UnsupportedLanguage { language } if language == "cobol"
    ));
}

#[test]
fn test_code_block_lays_out_one_row_per_line() {
    let mut d = doc(400.0, 300.0, 20.0);
    let block = d
        .tree_mut()
        .code_block("rust", "fn main() {\n    run();\n}", Style::default());
    page(&mut d, vec![block]);
    d.compute().unwrap();

    let rows = d.tree().children(block).to_vec();
    assert_eq!(rows.len(), 3);
    for pair in rows.windows(2) {
        assert_close(geom(&d, pair[1]).start_y, geom(&d, pair[0]).end_y());
    }
    assert_eq!(d.tree().node(rows[0]).kind, ElementKind::HStack);
}

#[test]
fn test_unplaceable_text_reports_non_progress() {
    let mut d = doc(200.0, 100.0, 10.0);
    let text = d.tree_mut().text(
        words(50).as_str(),
        Style {
            margin: Some(Edges::new(1000.0, 0.0, 0.0, 0.0)),
            ..Default::default()
        },
    );
    page(&mut d, vec![text]);
    assert!(matches!(
        d.compute().unwrap_err(),
        LayoutError::LayoutNonProgress { .. }
    ));
}

#[test]
fn test_links_are_annotated_or_collected() {
    let mut d = doc(200.0, 100.0, 10.0);
    let tree = d.tree_mut();
    let external = tree.text(
        "site",
        Style {
            href: Some("https://example.com".to_string()),
            ..Default::default()
        },
    );
    let internal = tree.text(
        "see appendix",
        Style {
            href: Some("#appendix".to_string()),
            ..Default::default()
        },
    );
    page(&mut d, vec![external, internal]);
    d.build().unwrap();

    let ops = &d.backend().unwrap().ops;
    assert!(ops
        .iter()
        .any(|op| matches!(op, DrawOp::Link { url, .. } if url == "https://example.com")));
    assert_eq!(d.local_hrefs().len(), 1);
    assert_eq!(d.local_hrefs()[0].href, "#appendix");
    assert_eq!(d.local_hrefs()[0].page, 1);
}

#[test]
fn test_iterate_pages_visits_each_page_once() {
    let mut d = doc(200.0, 100.0, 10.0);
    let text = d.tree_mut().text(words(84).as_str(), Style::default());
    page(&mut d, vec![text]);
    let mut visited = Vec::new();
    d.iterate_pages(|backend, page| {
        visited.push(page);
        backend.draw_text(&format!("{page}"), 0.0, 0.0, &TextOptions::default());
        Ok(())
    })
    .unwrap();

    assert_eq!(visited, (1..=d.max_page()).collect::<Vec<_>>());
    let ops = &d.backend().unwrap().ops;
    for page in visited {
        assert!(ops.iter().any(
            |op| matches!(op, DrawOp::Text { page: p, text, .. } if *p == page && *text == page.to_string())
        ));
    }
}

/// A mixed document used for the structural invariants below.
fn mixed_document() -> (TestDoc, NodeId) {
    let mut d = doc(300.0, 200.0, 20.0);
    let tree = d.tree_mut();
    let heading = tree.text(
        "Quarterly numbers",
        Style {
            font_size: Some(16.0),
            font_weight: Some(700),
            ..Default::default()
        },
    );
    let cells: Vec<NodeId> = ["North", "1250", "South", "980"]
        .iter()
        .map(|t| tree.text(*t, percent(50.0)))
        .collect();
    let table = tree.hstack(Style::default(), cells);
    let paragraph = tree.text(words(120).as_str(), Style::default());
    let body = tree.vstack(
        Style {
            padding: Some(Edges::uniform(4.0)),
            ..Default::default()
        },
        vec![paragraph],
    );
    let image = tree.image(
        "chart.png",
        Style {
            width: Some(Dimension::Pt(100.0)),
            height: Some(Dimension::Pt(60.0)),
            ..Default::default()
        },
    );
    let code = tree.code_block("rust", "fn main() {\n    println!(\"hi\");\n}", Style::default());
    let p = tree.page(Style::default(), vec![heading, table, body, image, code]);
    d.append(p);
    d.compute().unwrap();
    (d, body)
}

#[test]
fn test_box_identity_and_page_order_hold() {
    let (d, _) = mixed_document();
    let tree = d.tree();
    for id in tree.descendants(d.root()) {
        let g = geom(&d, id);
        assert_close(
            g.end_x() - g.start_x,
            g.margin.horizontal() + g.padding.horizontal() + g.width,
        );
        assert!(g.end_page >= g.start_page, "{}", tree.label(id));
    }
    for id in tree.descendants(d.root()) {
        if !matches!(tree.node(id).kind, ElementKind::VStack | ElementKind::Page) {
            continue;
        }
        let pages: Vec<usize> = tree
            .children(id)
            .iter()
            .map(|&c| geom(&d, c))
            .filter(|g| !g.is_absolute)
            .map(|g| g.start_page)
            .collect();
        assert!(pages.windows(2).all(|w| w[0] <= w[1]), "{}", tree.label(id));
    }
}

#[test]
fn test_children_stay_inside_their_parents() {
    let (d, _) = mixed_document();
    let tree = d.tree();
    for id in tree.descendants(d.root()) {
        let parent = geom(&d, id);
        for &child in tree.children(id) {
            let g = geom(&d, child);
            if g.is_absolute {
                continue;
            }
            assert!(
                g.end_x() <= parent.max_x + TOL,
                "{} ends at {} past {}",
                tree.label(child),
                g.end_x(),
                parent.max_x
            );
            if g.start_page == parent.start_page {
                assert!(g.start_y + TOL >= parent.padding_start_y(), "{}", tree.label(child));
            }
        }
    }
}

#[test]
fn test_split_paragraph_keeps_every_character() {
    let (d, body) = mixed_document();
    let tree = d.tree();
    let joined: String = tree
        .children(body)
        .iter()
        .map(|&f| tree.node(f).text().unwrap_or_default())
        .collect();
    assert_eq!(joined, words(120));
    assert!(d.max_page() >= 2);
}
