use super::*;

#[test]
fn first_offer_goes_out() {
    let mut t = CursorThrottle::new(50);
    assert_eq!(t.offer(Point::new(1.0, 1.0), 0), Some(Point::new(1.0, 1.0)));
}

#[test]
fn offers_inside_window_are_held() {
    let mut t = CursorThrottle::new(50);
    t.offer(Point::new(1.0, 1.0), 0);
    assert!(t.offer(Point::new(2.0, 2.0), 10).is_none());
    assert!(t.offer(Point::new(3.0, 3.0), 20).is_none());
    assert!(t.tick(30).is_none());
    // Last value wins.
    assert_eq!(t.tick(50), Some(Point::new(3.0, 3.0)));
    assert!(t.tick(200).is_none());
}

#[test]
fn offer_after_window_sends_and_clears_pending() {
    let mut t = CursorThrottle::new(50);
    t.offer(Point::new(1.0, 1.0), 0);
    t.offer(Point::new(2.0, 2.0), 10);
    assert_eq!(t.offer(Point::new(4.0, 4.0), 60), Some(Point::new(4.0, 4.0)));
    assert!(t.tick(200).is_none());
}

#[test]
fn tick_restarts_window() {
    let mut t = CursorThrottle::new(50);
    t.offer(Point::new(1.0, 1.0), 0);
    t.offer(Point::new(2.0, 2.0), 10);
    assert!(t.tick(55).is_some());
    assert!(t.offer(Point::new(3.0, 3.0), 70).is_none());
}

#[test]
fn reset_drops_pending() {
    let mut t = CursorThrottle::new(50);
    t.offer(Point::new(1.0, 1.0), 0);
    t.offer(Point::new(2.0, 2.0), 10);
    t.reset();
    assert!(t.tick(100).is_none());
    assert!(t.offer(Point::new(5.0, 5.0), 101).is_some());
}
