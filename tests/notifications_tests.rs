// Notification inbox: read/unread bookkeeping, clearing and the simulated feed

use aquapercent::notifications::{
    MAX_NOTIFICATIONS, NewNotification, NotificationInbox, NotificationKind,
};

fn note(kind: NotificationKind, title: &str) -> NewNotification {
    NewNotification {
        kind,
        title: title.into(),
        message: format!("{title} message"),
    }
}

#[test]
fn added_notifications_are_unread_and_newest_first() {
    let inbox = NotificationInbox::with_seed(1);
    assert!(inbox.is_empty());

    let first = inbox.add(note(NotificationKind::Info, "First"));
    let second = inbox.add(note(NotificationKind::Alert, "Second"));
    assert!(!first.read);
    assert_ne!(first.id, second.id);
    assert!(second.timestamp >= first.timestamp);

    let titles: Vec<String> = inbox.list().into_iter().map(|n| n.title).collect();
    assert_eq!(titles, vec!["Second", "First"]);
    assert_eq!(inbox.unread_count(), 2);
}

#[test]
fn mark_as_read_updates_only_that_notification() {
    let inbox = NotificationInbox::with_seed(2);
    let a = inbox.add(note(NotificationKind::Warning, "A"));
    inbox.add(note(NotificationKind::Info, "B"));

    assert!(inbox.mark_as_read(&a.id));
    assert_eq!(inbox.unread_count(), 1);
    // Idempotent.
    assert!(inbox.mark_as_read(&a.id));
    assert_eq!(inbox.unread_count(), 1);

    assert!(!inbox.mark_as_read("notif-0-999"));
    assert_eq!(inbox.len(), 2);
}

#[test]
fn mark_all_as_read_reports_how_many_changed() {
    let inbox = NotificationInbox::with_seed(3);
    let a = inbox.add(note(NotificationKind::Info, "A"));
    inbox.add(note(NotificationKind::Info, "B"));
    inbox.add(note(NotificationKind::Info, "C"));
    inbox.mark_as_read(&a.id);

    assert_eq!(inbox.mark_all_as_read(), 2);
    assert_eq!(inbox.unread_count(), 0);
    assert_eq!(inbox.mark_all_as_read(), 0);
    assert_eq!(inbox.len(), 3);
}

#[test]
fn clear_removes_one_and_clear_all_empties() {
    let inbox = NotificationInbox::with_seed(4);
    let a = inbox.add(note(NotificationKind::Error, "A"));
    inbox.add(note(NotificationKind::Info, "B"));

    assert!(inbox.clear(&a.id));
    assert!(!inbox.clear(&a.id));
    assert_eq!(inbox.len(), 1);
    assert_eq!(inbox.unread_count(), 1);

    assert_eq!(inbox.clear_all(), 1);
    assert!(inbox.is_empty());
    assert_eq!(inbox.unread_count(), 0);
}

#[test]
fn inbox_keeps_the_newest_entries_when_full() {
    let inbox = NotificationInbox::with_seed(5);
    for i in 0..MAX_NOTIFICATIONS + 20 {
        inbox.add(note(NotificationKind::Info, &format!("n{i}")));
    }
    assert_eq!(inbox.len(), MAX_NOTIFICATIONS);
    let list = inbox.list();
    assert_eq!(list[0].title, format!("n{}", MAX_NOTIFICATIONS + 19));
    assert_eq!(list[MAX_NOTIFICATIONS - 1].title, "n20");
}

#[test]
fn feed_adds_a_notification_about_half_the_time() {
    let inbox = NotificationInbox::with_seed(6);
    let mut added = 0;
    for _ in 0..MAX_NOTIFICATIONS {
        if let Some(n) = inbox.simulate_feed_tick() {
            added += 1;
            assert!(!n.read);
            assert!(!n.title.is_empty());
            assert_eq!(inbox.list()[0].id, n.id);
        }
    }
    assert!((25..=75).contains(&added), "added {added}");
    assert_eq!(inbox.len(), added);
    assert_eq!(inbox.unread_count(), added);
}

#[test]
fn welcome_notification_is_a_success() {
    let inbox = NotificationInbox::with_seed(7);
    let welcome = inbox.add_welcome();
    assert_eq!(welcome.kind, NotificationKind::Success);
    assert_eq!(welcome.title, "System Online");
    assert_eq!(inbox.unread_count(), 1);
}

#[test]
fn critical_kinds() {
    assert!(NotificationKind::Alert.is_critical());
    assert!(NotificationKind::Error.is_critical());
    assert!(!NotificationKind::Warning.is_critical());
}

#[test]
fn notification_wire_shape() {
    let inbox = NotificationInbox::with_seed(8);
    let n = inbox.add(note(NotificationKind::Alert, "Pressure Alert"));
    let json = serde_json::to_value(&n).unwrap();
    assert_eq!(json["type"], "alert");
    assert_eq!(json["read"], false);
    assert!(json["id"].as_str().unwrap().starts_with("notif-"));

    let parsed: NewNotification = serde_json::from_value(serde_json::json!({
        "type": "warning",
        "title": "High Water Usage",
        "message": "District 3"
    }))
    .unwrap();
    assert_eq!(parsed.kind, NotificationKind::Warning);
}
