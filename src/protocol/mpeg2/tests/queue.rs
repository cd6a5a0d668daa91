use crate::protocol::mpeg2::LookaheadQueue;

#[test]
fn test_fifo_order() {
    let mut queue = LookaheadQueue::new();
    queue.push_back(1);
    queue.push_back(2);
    queue.push_back(3);

    assert_eq!(queue.front(), Some(&1));
    assert_eq!(queue.back(), Some(&3));
    assert_eq!(queue.pop_front(), Some(1));
    assert_eq!(queue.len(), 2);
}

#[test]
fn test_both_ends() {
    let mut queue = LookaheadQueue::with_capacity(4);
    queue.push_back("b");
    queue.push_front("a");
    queue.push_back("c");

    assert_eq!(queue.iter().copied().collect::<Vec<_>>(), vec!["a", "b", "c"]);
    assert_eq!(queue.pop_back(), Some("c"));
    assert_eq!(queue.pop_front(), Some("a"));
}

#[test]
fn test_clear_and_empty() {
    let mut queue: LookaheadQueue<u32> = LookaheadQueue::default();
    assert!(queue.is_empty());
    assert_eq!(queue.pop_front(), None);

    queue.push_back(7);
    queue.clear();

    assert!(queue.is_empty());
    assert_eq!(queue.back(), None);
}
