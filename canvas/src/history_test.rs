use super::*;

fn history_of(ids: &[&str]) -> History {
    let mut h = History::new(100);
    for id in ids {
        h.push(*id);
    }
    h
}

#[test]
fn empty_history_has_nothing_to_do() {
    let mut h = History::new(100);
    assert_eq!(h.cursor(), None);
    assert!(h.undo().is_none());
    assert!(h.redo().is_none());
    assert!(h.is_empty());
}

#[test]
fn push_moves_cursor_to_newest() {
    let h = history_of(&["a", "b", "c"]);
    assert_eq!(h.cursor(), Some(2));
    assert!(h.can_undo());
    assert!(!h.can_redo());
}

#[test]
fn undo_walks_back_newest_first() {
    let mut h = history_of(&["a", "b"]);
    assert_eq!(h.undo().as_deref(), Some("b"));
    assert_eq!(h.undo().as_deref(), Some("a"));
    assert_eq!(h.cursor(), None);
    assert!(h.undo().is_none());
}

#[test]
fn undo_then_redo_restores_cursor() {
    let mut h = history_of(&["a", "b", "c"]);
    let before = h.cursor();
    assert_eq!(h.undo().as_deref(), Some("c"));
    assert_eq!(h.redo().as_deref(), Some("c"));
    assert_eq!(h.cursor(), before);
    assert!(h.redo().is_none());
}

#[test]
fn new_stroke_after_undo_discards_redo_future() {
    let mut h = history_of(&["a", "b", "c"]);
    h.undo();
    h.undo();
    h.push("d");

    assert_eq!(h.len(), 2);
    assert_eq!(h.cursor(), Some(1));
    assert!(!h.can_redo());
    assert!(h.redo().is_none());
    assert_eq!(h.undo().as_deref(), Some("d"));
    assert_eq!(h.undo().as_deref(), Some("a"));
}

#[test]
fn limit_evicts_oldest() {
    let mut h = History::new(3);
    for id in ["a", "b", "c", "d"] {
        h.push(id);
    }
    assert_eq!(h.len(), 3);
    assert_eq!(h.undo().as_deref(), Some("d"));
    assert_eq!(h.undo().as_deref(), Some("c"));
    assert_eq!(h.undo().as_deref(), Some("b"));
    assert!(h.undo().is_none());
}

#[test]
fn clear_resets_cursor() {
    let mut h = history_of(&["a", "b"]);
    h.undo();
    h.clear();
    assert!(h.is_empty());
    assert_eq!(h.cursor(), None);
    assert!(h.redo().is_none());
}
