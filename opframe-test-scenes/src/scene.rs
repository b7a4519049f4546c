use opframe::geometry::rect;
use opframe::pointer::{AreaOp, CursorName, CursorNameOp, InputOp, Kind, PaintOp, PassOp};
use opframe::{Color, Ops};

use crate::expectations::PixelExpectation;

// ── Grid layout constants ────────────────────────────────────────────────────

const TILE_SIZE: u32 = 40;
const COLUMNS: u32 = 4;
const ROWS: u32 = 3;

pub const CANVAS_WIDTH: u32 = TILE_SIZE * COLUMNS;
pub const CANVAS_HEIGHT: u32 = TILE_SIZE * ROWS;

/// Returns the pixel origin (top-left corner) of tile number `n` (1-based).
fn tile_origin(tile_number: u32) -> (i32, i32) {
    let index = tile_number - 1;
    let column = index % COLUMNS;
    let row = index / COLUMNS;
    ((column * TILE_SIZE) as i32, (row * TILE_SIZE) as i32)
}

fn paint(ops: &mut Ops, color: Color) {
    PaintOp { color }.add(ops);
}

fn at(origin: (i32, i32), dx: i32, dy: i32) -> (u32, u32) {
    ((origin.0 + dx) as u32, (origin.1 + dy) as u32)
}

fn background(origin: (i32, i32), dx: i32, dy: i32, label: &'static str) -> PixelExpectation {
    let (x, y) = at(origin, dx, dy);
    PixelExpectation::opaque(x, y, 255, 255, 255, label)
}

fn opaque(origin: (i32, i32), dx: i32, dy: i32, color: Color, label: &'static str) -> PixelExpectation {
    let (x, y) = at(origin, dx, dy);
    let [r, g, b, _] = color.to_array();
    PixelExpectation::opaque(x, y, r, g, b, label)
}

/// Appends the main test scene to `ops` and returns the pixel expectations
/// for a `CANVAS_WIDTH` x `CANVAS_HEIGHT` window.
///
/// Shared between the visual regression tests and the screenshot demo.
pub fn build_main_scene(ops: &mut Ops) -> Vec<PixelExpectation> {
    // Paint outside any area covers the whole canvas: the white background.
    paint(ops, Color::WHITE);

    let mut expectations: Vec<PixelExpectation> = Vec::new();
    expectations.extend(tile_01_rect_solid(ops));
    expectations.extend(tile_02_ellipse_solid(ops));
    expectations.extend(tile_03_child_overflow_is_clipped(ops));
    expectations.extend(tile_04_nested_3_levels(ops));
    expectations.extend(tile_05_siblings_overlap(ops));
    expectations.extend(tile_06_alpha_overlap(ops));
    expectations.extend(tile_07_fully_transparent(ops));
    expectations.extend(tile_08_ellipse_clipped_by_rect(ops));
    expectations.extend(tile_09_tiny_1px_area(ops));
    expectations.extend(tile_10_area_at_canvas_edge(ops));
    expectations.extend(tile_11_input_ops_do_not_paint(ops));
    expectations.extend(tile_12_repeated_shape(ops));
    expectations
}

fn tile_01_rect_solid(ops: &mut Ops) -> Vec<PixelExpectation> {
    let o = tile_origin(1);
    let red = Color::rgb(220, 50, 50);
    let area = AreaOp::rect(rect(o.0 + 5, o.1 + 5, o.0 + 35, o.1 + 35)).push(ops);
    paint(ops, red);
    area.pop(ops);

    vec![
        opaque(o, 20, 20, red, "t01_interior"),
        opaque(o, 5, 5, red, "t01_min_corner_inclusive"),
        background(o, 35, 35, "t01_max_corner_exclusive"),
        background(o, 2, 2, "t01_outside_is_canvas_bg"),
    ]
}

fn tile_02_ellipse_solid(ops: &mut Ops) -> Vec<PixelExpectation> {
    let o = tile_origin(2);
    let green = Color::rgb(50, 180, 50);
    let area = AreaOp::ellipse(rect(o.0 + 5, o.1 + 5, o.0 + 35, o.1 + 35)).push(ops);
    paint(ops, green);
    area.pop(ops);

    vec![
        opaque(o, 20, 20, green, "t02_interior"),
        opaque(o, 20, 7, green, "t02_top_edge"),
        // Inside the bounding box, outside the ellipse.
        background(o, 7, 7, "t02_corner_is_bg"),
    ]
}

fn tile_03_child_overflow_is_clipped(ops: &mut Ops) -> Vec<PixelExpectation> {
    let o = tile_origin(3);
    let parent_color = Color::rgb(200, 200, 200);
    let child_color = Color::rgb(50, 50, 220);
    let parent = AreaOp::rect(rect(o.0 + 5, o.1 + 5, o.0 + 25, o.1 + 25)).push(ops);
    paint(ops, parent_color);
    let child = AreaOp::rect(rect(o.0 + 15, o.1 + 15, o.0 + 38, o.1 + 38)).push(ops);
    paint(ops, child_color);
    child.pop(ops);
    parent.pop(ops);

    vec![
        opaque(o, 10, 10, parent_color, "t03_parent_only"),
        opaque(o, 20, 20, child_color, "t03_child_inside_parent"),
        background(o, 30, 30, "t03_child_overflow_clipped"),
    ]
}

fn tile_04_nested_3_levels(ops: &mut Ops) -> Vec<PixelExpectation> {
    let o = tile_origin(4);
    let levels = [
        (rect(o.0 + 2, o.1 + 2, o.0 + 38, o.1 + 38), Color::rgb(240, 200, 60)),
        (rect(o.0 + 10, o.1 + 10, o.0 + 30, o.1 + 30), Color::rgb(60, 160, 240)),
        (rect(o.0 + 16, o.1 + 16, o.0 + 60, o.1 + 24), Color::rgb(160, 40, 160)),
    ];
    let mut stacks = Vec::new();
    for (bounds, color) in levels {
        stacks.push(AreaOp::rect(bounds).push(ops));
        paint(ops, color);
    }
    while let Some(stack) = stacks.pop() {
        stack.pop(ops);
    }

    vec![
        opaque(o, 4, 4, levels[0].1, "t04_level_1"),
        opaque(o, 12, 12, levels[1].1, "t04_level_2"),
        opaque(o, 20, 20, levels[2].1, "t04_level_3"),
        // Level 3 reaches past level 2 on the right.
        opaque(o, 34, 20, levels[0].1, "t04_level_3_clipped_by_level_2"),
    ]
}

fn tile_05_siblings_overlap(ops: &mut Ops) -> Vec<PixelExpectation> {
    let o = tile_origin(5);
    let below = Color::rgb(220, 120, 30);
    let above = Color::rgb(30, 120, 220);
    let first = AreaOp::rect(rect(o.0 + 5, o.1 + 5, o.0 + 25, o.1 + 25)).push(ops);
    paint(ops, below);
    first.pop(ops);
    let second = AreaOp::rect(rect(o.0 + 15, o.1 + 15, o.0 + 35, o.1 + 35)).push(ops);
    paint(ops, above);
    second.pop(ops);

    vec![
        opaque(o, 8, 8, below, "t05_first_only"),
        opaque(o, 20, 20, above, "t05_overlap_later_on_top"),
        opaque(o, 32, 32, above, "t05_second_only"),
    ]
}

fn tile_06_alpha_overlap(ops: &mut Ops) -> Vec<PixelExpectation> {
    let o = tile_origin(6);
    let area = AreaOp::rect(rect(o.0 + 5, o.1 + 5, o.0 + 35, o.1 + 35)).push(ops);
    paint(ops, Color::rgb(255, 0, 0));
    paint(ops, Color::rgba(0, 0, 255, 128));
    area.pop(ops);

    let (x, y) = at(o, 20, 20);
    // Blended in linear light, then encoded back to sRGB.
    vec![PixelExpectation::opaque(x, y, 187, 0, 188, "t06_half_blue_over_red")]
}

fn tile_07_fully_transparent(ops: &mut Ops) -> Vec<PixelExpectation> {
    let o = tile_origin(7);
    let area = AreaOp::rect(rect(o.0 + 5, o.1 + 5, o.0 + 35, o.1 + 35)).push(ops);
    paint(ops, Color::TRANSPARENT);
    area.pop(ops);

    vec![background(o, 20, 20, "t07_transparent_paint_is_invisible")]
}

fn tile_08_ellipse_clipped_by_rect(ops: &mut Ops) -> Vec<PixelExpectation> {
    let o = tile_origin(8);
    let color = Color::rgb(20, 140, 90);
    let clip = AreaOp::rect(rect(o.0 + 5, o.1 + 5, o.0 + 20, o.1 + 35)).push(ops);
    let ellipse = AreaOp::ellipse(rect(o.0 + 5, o.1 + 5, o.0 + 35, o.1 + 35)).push(ops);
    paint(ops, color);
    ellipse.pop(ops);
    clip.pop(ops);

    vec![
        opaque(o, 15, 20, color, "t08_left_half_painted"),
        background(o, 25, 20, "t08_right_half_clipped"),
        background(o, 7, 7, "t08_outside_ellipse"),
    ]
}

fn tile_09_tiny_1px_area(ops: &mut Ops) -> Vec<PixelExpectation> {
    let o = tile_origin(9);
    let color = Color::rgb(10, 10, 10);
    let area = AreaOp::rect(rect(o.0 + 20, o.1 + 20, o.0 + 21, o.1 + 21)).push(ops);
    paint(ops, color);
    area.pop(ops);

    vec![
        opaque(o, 20, 20, color, "t09_single_pixel"),
        background(o, 21, 20, "t09_right_neighbour"),
        background(o, 20, 21, "t09_bottom_neighbour"),
    ]
}

fn tile_10_area_at_canvas_edge(ops: &mut Ops) -> Vec<PixelExpectation> {
    let o = tile_origin(10);
    let color = Color::rgb(120, 60, 200);
    // Extends past the bottom of the canvas.
    let area = AreaOp::rect(rect(o.0 + 10, o.1 + 30, o.0 + 30, o.1 + 80)).push(ops);
    paint(ops, color);
    area.pop(ops);

    vec![
        opaque(o, 20, 39, color, "t10_last_row"),
        background(o, 20, 25, "t10_above_area"),
    ]
}

fn tile_11_input_ops_do_not_paint(ops: &mut Ops) -> Vec<PixelExpectation> {
    let o = tile_origin(11);
    let pass = PassOp.push(ops);
    let area = AreaOp::rect(rect(o.0 + 5, o.1 + 5, o.0 + 35, o.1 + 35)).push(ops);
    InputOp::new("tile-11", Kind::PRESS | Kind::RELEASE).add(ops);
    CursorNameOp {
        name: CursorName::POINTER,
    }
    .add(ops);
    area.pop(ops);
    pass.pop(ops);

    vec![background(o, 20, 20, "t11_handlers_are_invisible")]
}

fn tile_12_repeated_shape(ops: &mut Ops) -> Vec<PixelExpectation> {
    let o = tile_origin(12);
    let last = Color::rgb(90, 200, 200);
    for color in [Color::rgb(200, 0, 0), Color::rgb(0, 200, 0), last] {
        let area = AreaOp::ellipse(rect(o.0 + 5, o.1 + 5, o.0 + 35, o.1 + 35)).push(ops);
        paint(ops, color);
        area.pop(ops);
    }

    vec![opaque(o, 20, 20, last, "t12_last_paint_wins")]
}
