use opframe::geometry::{point, rect, vector, Rect};
use opframe::ops::{Op, Reader};
use opframe::pointer::{
    AreaOp, CursorName, CursorNameOp, Event, InputOp, Kind, OpError, PassOp, Priority,
};
use opframe::{Ops, Router};

fn sample_rects() -> Vec<Rect> {
    let mut rects = Vec::new();
    for (x, y) in [(-20, -20), (0, 0), (5, 10), (40, 3)] {
        for (w, h) in [(1, 1), (10, 30), (50, 50)] {
            rects.push(rect(x, y, x + w, y + h));
        }
    }
    rects
}

fn handler(ops: &mut Ops, tag: &str, kinds: Kind) {
    InputOp::new(tag, kinds).add(ops);
}

fn tags(router: &mut Router, ops: &Ops, x: f32, y: f32, kind: Kind) -> Vec<(String, Priority)> {
    router
        .hits(ops, point(x, y), kind)
        .unwrap()
        .into_iter()
        .map(|hit| (hit.tag, hit.priority))
        .collect()
}

#[test]
fn decoding_preserves_push_pop_nesting() {
    let mut ops = Ops::new();
    let outer = AreaOp::rect(rect(0, 0, 100, 100)).push(&mut ops);
    let pass = PassOp.push(&mut ops);
    for r in sample_rects() {
        let area = AreaOp::ellipse(r).push(&mut ops);
        handler(&mut ops, "leaf", Kind::PRESS);
        let inner = AreaOp::rect(r).push(&mut ops);
        inner.pop(&mut ops);
        area.pop(&mut ops);
    }
    pass.pop(&mut ops);
    outer.pop(&mut ops);
    assert!(ops.is_balanced());

    let (mut areas, mut passes) = (0i32, 0i32);
    for op in Reader::new(&ops) {
        match op.unwrap() {
            Op::Area { .. } => areas += 1,
            Op::PopArea => areas -= 1,
            Op::Pass => passes += 1,
            Op::PopPass => passes -= 1,
            _ => {}
        }
        assert!(areas >= 0 && passes >= 0);
    }
    assert_eq!((areas, passes), (0, 0));
}

#[test]
fn decoding_twice_yields_the_same_ops() {
    let mut ops = Ops::new();
    let area = AreaOp::rect(rect(1, 2, 3, 4)).push(&mut ops);
    CursorNameOp {
        name: CursorName::POINTER,
    }
    .add(&mut ops);
    handler(&mut ops, "a", Kind::MOVE | Kind::SCROLL);
    area.pop(&mut ops);

    let first: Vec<_> = Reader::new(&ops).collect();
    let second: Vec<_> = Reader::new(&ops).collect();
    assert_eq!(first, second);
    assert_eq!(first.len(), 4);
}

#[test]
fn nested_areas_intersect() {
    let mut router = Router::new();
    for a in sample_rects() {
        for b in sample_rects() {
            let mut ops = Ops::new();
            let _outer = AreaOp::rect(a).push(&mut ops);
            let _inner = AreaOp::rect(b).push(&mut ops);

            let active = router.active_area(&ops).unwrap().unwrap();
            match a.intersection(&b) {
                Some(expected) => assert_eq!(active, expected),
                None => assert!(active.is_empty()),
            }

            let mut probe = Ops::new();
            let outer = AreaOp::rect(a).push(&mut probe);
            let inner = AreaOp::rect(b).push(&mut probe);
            handler(&mut probe, "probe", Kind::PRESS);
            inner.pop(&mut probe);
            outer.pop(&mut probe);
            for x in (active.min.x..active.max.x).step_by(7) {
                for y in (active.min.y..active.max.y).step_by(7) {
                    let p = point(x as f32 + 0.5, y as f32 + 0.5);
                    assert!(a.to_f32().contains(p) && b.to_f32().contains(p));
                    assert_eq!(router.hits(&probe, p, Kind::PRESS).unwrap().len(), 1);
                }
            }
        }
    }
}

#[test]
fn grab_is_grabbed_regardless_of_siblings() {
    let mut ops = Ops::new();
    let area = AreaOp::rect(rect(0, 0, 10, 10)).push(&mut ops);
    handler(&mut ops, "plain-1", Kind::PRESS);
    InputOp {
        grab: true,
        ..InputOp::new("grabber", Kind::PRESS)
    }
    .add(&mut ops);
    handler(&mut ops, "plain-2", Kind::PRESS);
    area.pop(&mut ops);

    let hits = tags(&mut Router::new(), &ops, 5.0, 5.0, Kind::PRESS);
    assert!(hits.contains(&("grabber".to_owned(), Priority::Grabbed)));
    assert_eq!(hits.len(), 3);
}

#[test]
fn sole_handler_is_foremost_and_competing_handlers_share() {
    let mut router = Router::new();

    let mut ops = Ops::new();
    let area = AreaOp::rect(rect(0, 0, 10, 10)).push(&mut ops);
    handler(&mut ops, "only", Kind::PRESS);
    area.pop(&mut ops);
    assert_eq!(
        tags(&mut router, &ops, 1.0, 1.0, Kind::PRESS),
        [("only".to_owned(), Priority::Foremost)]
    );

    let mut ops = Ops::new();
    let area = AreaOp::rect(rect(0, 0, 10, 10)).push(&mut ops);
    handler(&mut ops, "first", Kind::PRESS);
    handler(&mut ops, "second", Kind::PRESS);
    area.pop(&mut ops);
    assert_eq!(
        tags(&mut router, &ops, 1.0, 1.0, Kind::PRESS),
        [
            ("second".to_owned(), Priority::Shared),
            ("first".to_owned(), Priority::Shared)
        ]
    );
}

#[test]
fn handlers_outside_the_point_are_not_hit() {
    let mut ops = Ops::new();
    let area = AreaOp::ellipse(rect(0, 0, 10, 10)).push(&mut ops);
    handler(&mut ops, "round", Kind::PRESS);
    area.pop(&mut ops);

    let mut router = Router::new();
    assert_eq!(tags(&mut router, &ops, 5.0, 5.0, Kind::PRESS).len(), 1);
    // Inside the bounding box, outside the ellipse.
    assert!(tags(&mut router, &ops, 0.5, 0.5, Kind::PRESS).is_empty());
    assert!(tags(&mut router, &ops, 5.0, 5.0, Kind::RELEASE).is_empty());
}

#[test]
fn pass_lets_events_reach_handlers_underneath() {
    let mut ops = Ops::new();
    let below = AreaOp::rect(rect(0, 0, 10, 10)).push(&mut ops);
    handler(&mut ops, "below", Kind::PRESS);
    below.pop(&mut ops);
    let pass = PassOp.push(&mut ops);
    let above = AreaOp::rect(rect(0, 0, 10, 10)).push(&mut ops);
    handler(&mut ops, "above", Kind::PRESS);
    above.pop(&mut ops);
    pass.pop(&mut ops);

    let hits = tags(&mut Router::new(), &ops, 3.0, 3.0, Kind::PRESS);
    let names: Vec<_> = hits.iter().map(|(tag, _)| tag.as_str()).collect();
    assert_eq!(names, ["above", "below"]);
}

#[test]
fn delivered_scroll_stays_within_bounds() {
    let mut ops = Ops::new();
    let area = AreaOp::rect(rect(0, 0, 100, 100)).push(&mut ops);
    InputOp {
        scroll_bounds: rect(-5, 0, 20, 3),
        ..InputOp::new("list", Kind::SCROLL)
    }
    .add(&mut ops);
    area.pop(&mut ops);

    let mut router = Router::new();
    for (sx, sy) in [(0.0, 0.0), (-50.0, 50.0), (30.0, -1.0), (2.5, 1.5)] {
        let event = Event {
            scroll: vector(sx, sy),
            ..Event::new(Kind::SCROLL, point(10.0, 10.0))
        };
        let deliveries = router.deliver(&ops, &event).unwrap();
        assert_eq!(deliveries.len(), 1);
        let scroll = deliveries[0].event.scroll;
        assert!((-5.0..=20.0).contains(&scroll.x), "x = {}", scroll.x);
        assert!((0.0..=3.0).contains(&scroll.y), "y = {}", scroll.y);
        assert_eq!(deliveries[0].event.priority, Priority::Foremost);
    }
}

#[test]
fn scroll_bounds_must_contain_zero() {
    let mut ops = Ops::new();
    let op = InputOp {
        scroll_bounds: rect(1, 0, 5, 5),
        ..InputOp::new("bad", Kind::SCROLL)
    };
    assert_eq!(
        op.try_add(&mut ops),
        Err(OpError::InvalidScrollBounds {
            bounds: rect(1, 0, 5, 5)
        })
    );
    assert!(ops.is_empty());
}

#[test]
#[should_panic(expected = "both axes must contain zero")]
fn adding_invalid_scroll_bounds_panics() {
    let mut ops = Ops::new();
    InputOp {
        scroll_bounds: rect(-5, 1, 5, 5),
        ..InputOp::new("bad", Kind::SCROLL)
    }
    .add(&mut ops);
}

#[test]
fn topmost_cursor_wins() {
    let mut ops = Ops::new();
    let outer = AreaOp::rect(rect(0, 0, 20, 20)).push(&mut ops);
    CursorNameOp {
        name: CursorName::TEXT,
    }
    .add(&mut ops);
    let inner = AreaOp::rect(rect(0, 0, 5, 5)).push(&mut ops);
    CursorNameOp {
        name: CursorName::POINTER,
    }
    .add(&mut ops);
    inner.pop(&mut ops);
    outer.pop(&mut ops);

    let mut router = Router::new();
    assert_eq!(router.cursor(&ops, point(1.0, 1.0)).unwrap(), CursorName::POINTER);
    assert_eq!(router.cursor(&ops, point(10.0, 10.0)).unwrap(), CursorName::TEXT);
    assert_eq!(router.cursor(&ops, point(50.0, 50.0)).unwrap(), CursorName::DEFAULT);
}
