use super::*;

#[test]
fn test_normalize_angle() {
    use std::f64::consts::PI;
    assert!((normalize_angle(3. * PI) - PI).abs() < 1e-9);
    assert!((normalize_angle(-PI / 2.) + PI / 2.).abs() < 1e-9);
    assert!((normalize_angle(2. * PI)).abs() < 1e-9);
}

#[test]
fn test_circle_segment() {
    let c = Shape::circle(point(1., 0.), 0.2);
    assert!(c.hits_segment(&point(0., 0.), &point(2., 0.)));
    assert!(!c.hits_segment(&point(0., 0.5), &point(2., 0.5)));
    // Segment ends before reaching the circle
    assert!(!c.hits_segment(&point(0., 0.), &point(0.7, 0.)));
}

#[test]
fn test_rect_segment() {
    let r = Shape::rect(point(1., 1.), point(-1., -1.));
    assert!(r.contains(&point(0., 0.)));
    assert!(r.hits_segment(&point(-2., 0.), &point(2., 0.)));
    assert!(r.hits_segment(&point(0., 0.), &point(0.2, 0.2)));
    assert!(!r.hits_segment(&point(-2., 2.), &point(2., 2.)));
    assert!(!r.hits_segment(&point(2., -2.), &point(2., 2.)));
    assert!(r.hits_segment(&point(-2., -1.5), &point(1.5, 2.)));
}

#[test]
fn test_shape_set() {
    let set: ShapeSet = vec![
        Shape::circle(point(0., 0.), 0.5),
        Shape::circle(point(3., 0.), 0.5),
    ]
    .into_iter()
    .collect();
    assert!(set.hit_point(&point(0.1, 0.)));
    let escaped = set.without_containing(&point(0.1, 0.));
    assert_eq!(escaped.len(), 1);
    assert!(!escaped.hit_point(&point(0.1, 0.)));

    let mut moved = ShapeSet::new();
    moved.push(Shape::circle(point(0.01, 0.), 0.5));
    moved.push(Shape::circle(point(3., 0.), 0.5));
    assert!(set.approx_eq(&moved, 0.05));
    assert!(!set.approx_eq(&moved, 0.001));
    assert!(!set.approx_eq(&escaped, 1.));
}
