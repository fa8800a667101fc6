use std::f64::consts::PI;

use collatz_tree::{
    Point, SequenceTreeBuilder, TreeParams, collatz_step, measure, next_generation, plot_limits,
    stopping_time,
};

fn close(a: Point, b: Point) -> bool {
    (a.x - b.x).abs() < 1e-9 && (a.y - b.y).abs() < 1e-9
}

#[test]
fn step_rule_matches_parity() {
    for v in 2..2_000u64 {
        let next = collatz_step(v).unwrap();
        if v.is_multiple_of(2) {
            assert_eq!(next, v / 2, "even {v}");
        } else {
            assert_eq!(next, 3 * v + 1, "odd {v}");
        }
    }
    assert_eq!(collatz_step(1), Some(1));
    assert_eq!(next_generation(&[1, 1, 1]), Some(vec![1, 1, 1]));
}

#[test]
fn every_start_below_ten_thousand_converges() {
    let params = TreeParams::new(10_000, PI / 30.0, PI / 2.0).unwrap();
    let longest = params
        .starts()
        .map(|s| stopping_time(s).unwrap())
        .max()
        .unwrap();

    let mut builder = SequenceTreeBuilder::new(&params).unwrap();
    let count = builder.by_ref().count() as u64;
    assert!(builder.is_converged());
    assert_eq!(count, longest);
    assert_eq!(builder.iterations(), longest);
    assert!(builder.next_iteration().is_none());
}

#[test]
fn n3_emits_a_single_unit_segment() {
    let params = TreeParams::new(3, PI / 30.0, PI / 2.0).unwrap();
    let iterations: Vec<_> = SequenceTreeBuilder::new(&params).unwrap().collect();
    assert_eq!(iterations.len(), 1);

    let seg = iterations[0].segments[0];
    assert_eq!(seg.start_value, 2);
    assert_eq!(seg.from, Point::ORIGIN);
    let heading = PI / 2.0 - PI / 30.0;
    assert!(close(seg.to, Point::new(heading.cos(), heading.sin())));
    assert!((seg.length() - 1.0).abs() < 1e-12);
}

#[test]
fn n4_runs_for_the_longest_sequence() {
    let params = TreeParams::new(4, PI / 30.0, PI / 2.0).unwrap();
    let iterations: Vec<_> = SequenceTreeBuilder::new(&params).unwrap().collect();
    assert_eq!(iterations.len(), 7);

    // start 2 freezes after its first segment
    for it in &iterations[1..] {
        let frozen = it.segments[0];
        assert_eq!(frozen.start_value, 2);
        assert!(frozen.is_degenerate());
        assert!(!it.segments[1].is_degenerate());
    }
    let visible: usize = iterations.iter().map(|it| it.visible_segments().count()).sum();
    assert_eq!(visible, 8);
}

#[test]
fn segments_chain_end_to_start() {
    let params = TreeParams::new(40, 0.2, 0.3).unwrap();
    let mut builder = SequenceTreeBuilder::new(&params).unwrap();
    let mut last: Vec<Point> = builder.positions().collect();
    for it in builder.by_ref() {
        for seg in &it.segments {
            assert_eq!(seg.from, last[seg.index]);
            last[seg.index] = seg.to;
        }
    }
    assert_eq!(last, builder.positions().collect::<Vec<_>>());
}

#[test]
fn limits_contain_every_point() {
    let params = TreeParams::new(60, PI / 30.0, PI / 2.0).unwrap();
    let limits = plot_limits(&params).unwrap();
    assert!(limits.contains(Point::ORIGIN));
    for it in SequenceTreeBuilder::new(&params).unwrap() {
        for seg in &it.segments {
            assert!(limits.contains(seg.from));
            assert!(limits.contains(seg.to));
        }
    }
}

#[test]
fn measure_counts_origins_and_endpoints() {
    let params = TreeParams::new(4, PI / 30.0, PI / 2.0).unwrap();
    let extent = measure(SequenceTreeBuilder::new(&params).unwrap()).unwrap();
    // two origins + two sequences x seven iterations
    assert_eq!(extent.points, 2 + 2 * 7);
    assert_eq!(extent.iterations, 7);
}

#[test]
fn geometry_is_deterministic() {
    let params = TreeParams::new(200, PI / 30.0, PI / 2.0).unwrap();
    let a: Vec<_> = SequenceTreeBuilder::new(&params).unwrap().collect();
    let b: Vec<_> = SequenceTreeBuilder::new(&params).unwrap().collect();
    assert_eq!(a, b);
    assert_eq!(plot_limits(&params).unwrap(), plot_limits(&params).unwrap());
}

#[test]
fn explicit_starts_follow_sorted_order() {
    let builder = SequenceTreeBuilder::from_starts([9, 3, 9, 5], 0.1, 0.0).unwrap();
    let starts: Vec<u64> = builder.sequences().iter().map(|s| s.start).collect();
    assert_eq!(starts, vec![3, 5, 9]);
    assert_eq!(builder.sequence(5).unwrap().value, 5);
    assert!(builder.sequence(4).is_none());

    assert!(SequenceTreeBuilder::from_starts([0, 2], 0.1, 0.0).is_err());
    assert!(SequenceTreeBuilder::from_starts(std::iter::empty(), 0.1, 0.0).is_err());
}

#[test]
fn starts_near_the_u64_limit_are_rejected_not_panicking() {
    assert!(SequenceTreeBuilder::from_starts([u64::MAX], 0.1, 0.0).is_err());
    assert_eq!(collatz_step(u64::MAX), None);
    assert_eq!(stopping_time(u64::MAX), None);
}

#[test]
fn start_one_is_already_converged() {
    let mut builder = SequenceTreeBuilder::from_starts([1], 0.1, 0.0).unwrap();
    assert!(builder.is_converged());
    assert!(builder.next_iteration().is_none());
    assert_eq!(builder.iterations(), 0);
}
