use guestbook_core::{Entry, EntryValidationError, Rating};

#[test]
fn new_entry_sets_defaults() {
    let entry = Entry::new("Alice", "Hello").unwrap();

    assert_eq!(entry.id(), None);
    assert_eq!(entry.name(), "Alice");
    assert_eq!(entry.text(), "Hello");
    assert!(entry.created_at() > 0);
    assert!(entry.likers().is_empty());
    assert!(entry.dislikers().is_empty());
    assert_eq!(entry.score(), 0);
}

#[test]
fn new_rejects_empty_and_whitespace_name() {
    assert_eq!(
        Entry::new("", "Hello").unwrap_err(),
        EntryValidationError::EmptyName
    );
    assert_eq!(
        Entry::new("   ", "Hello").unwrap_err(),
        EntryValidationError::EmptyName
    );
}

#[test]
fn new_rejects_empty_and_whitespace_text() {
    assert_eq!(
        Entry::new("Alice", "").unwrap_err(),
        EntryValidationError::EmptyText
    );
    assert_eq!(
        Entry::new("Alice", "\t\n").unwrap_err(),
        EntryValidationError::EmptyText
    );
}

#[test]
fn like_is_self_inverse_from_neutral() {
    let mut entry = Entry::new("Alice", "Hello").unwrap();

    entry.like("bob");
    assert!(entry.likers().contains("bob"));
    assert_eq!(entry.rating_for("bob"), Rating::Liked);

    entry.like("bob");
    assert!(!entry.likers().contains("bob"));
    assert!(!entry.dislikers().contains("bob"));
    assert_eq!(entry.rating_for("bob"), Rating::Neutral);
}

#[test]
fn dislike_is_self_inverse_from_neutral() {
    let mut entry = Entry::new("Alice", "Hello").unwrap();

    entry.dislike("bob");
    assert_eq!(entry.rating_for("bob"), Rating::Disliked);

    entry.dislike("bob");
    assert_eq!(entry.rating_for("bob"), Rating::Neutral);
    assert_eq!(entry.score(), 0);
}

#[test]
fn dislike_after_like_moves_user_between_axes() {
    let mut entry = Entry::new("Alice", "Hello").unwrap();

    entry.like("bob");
    assert!(entry.likers().contains("bob"));
    assert!(!entry.dislikers().contains("bob"));

    entry.dislike("bob");
    assert!(!entry.likers().contains("bob"));
    assert!(entry.dislikers().contains("bob"));
    assert!(entry.validate().is_ok());
}

#[test]
fn user_is_in_at_most_one_set_across_any_toggle_sequence() {
    let mut entry = Entry::new("Alice", "Hello").unwrap();

    let toggles: [fn(&mut Entry, &str); 4] = [Entry::like, Entry::dislike, Entry::like, Entry::like];
    for _ in 0..3 {
        for toggle in toggles {
            toggle(&mut entry, "bob");
            let in_both = entry.likers().contains("bob") && entry.dislikers().contains("bob");
            assert!(!in_both);
            assert!(entry.validate().is_ok());
        }
    }
}

#[test]
fn double_like_clears_a_prior_dislike() {
    let mut entry = Entry::new("Alice", "Hello").unwrap();

    entry.dislike("bob");
    entry.like("bob");
    entry.like("bob");

    // The like axis is restored; the first like already consumed the dislike.
    assert_eq!(entry.rating_for("bob"), Rating::Neutral);
    assert_eq!(entry.score(), 0);
}

#[test]
fn score_tracks_set_sizes() {
    let mut entry = Entry::new("Alice", "Hello").unwrap();

    entry.like("bob");
    entry.like("carol");
    entry.like("dave");
    entry.dislike("erin");
    assert_eq!(entry.score(), 2);

    entry.dislike("carol");
    assert_eq!(entry.score(), 0);

    entry.dislike("erin");
    assert_eq!(entry.score(), 1);
}

#[test]
fn like_then_dislike_twice_ends_neutral() {
    let mut entry = Entry::new("Alice", "Hello").unwrap();

    entry.like("bob");
    assert_eq!(entry.score(), 1);
    assert_eq!(entry.rating_for("bob"), Rating::Liked);

    entry.dislike("bob");
    assert_eq!(entry.score(), -1);
    assert_eq!(entry.rating_for("bob"), Rating::Disliked);

    entry.dislike("bob");
    assert_eq!(entry.score(), 0);
    assert_eq!(entry.rating_for("bob"), Rating::Neutral);
}

#[test]
fn serialization_uses_expected_wire_fields() {
    let mut entry = Entry::new("Alice", "Hello").unwrap();
    entry.like("bob");
    entry.dislike("carol");

    let json = serde_json::to_value(&entry).unwrap();
    assert_eq!(json["id"], serde_json::Value::Null);
    assert_eq!(json["name"], "Alice");
    assert_eq!(json["text"], "Hello");
    assert_eq!(json["created_at"], entry.created_at());
    assert_eq!(json["likers"], serde_json::json!(["bob"]));
    assert_eq!(json["dislikers"], serde_json::json!(["carol"]));

    let decoded: Entry = serde_json::from_value(json).unwrap();
    assert_eq!(decoded, entry);
}

#[test]
fn deserialize_accepts_persisted_entry_with_id() {
    let value = serde_json::json!({
        "id": "11111111-2222-4333-8444-555555555555",
        "name": "Alice",
        "text": "Hello",
        "created_at": 1_700_000_000_000_i64,
        "likers": ["bob"],
        "dislikers": []
    });

    let entry: Entry = serde_json::from_value(value).unwrap();
    assert!(entry.id().is_some());
    assert_eq!(entry.rating_for("bob"), Rating::Liked);
}

#[test]
fn deserialize_rejects_username_on_both_axes() {
    let value = serde_json::json!({
        "name": "Alice",
        "text": "Hello",
        "created_at": 1_700_000_000_000_i64,
        "likers": ["bob"],
        "dislikers": ["bob"]
    });

    let err = serde_json::from_value::<Entry>(value).unwrap_err();
    assert!(
        err.to_string()
            .contains("cannot be in both likers and dislikers"),
        "unexpected error: {err}"
    );
}

#[test]
fn deserialize_rejects_blank_name_and_text() {
    let blank_name = serde_json::json!({
        "name": "  ",
        "text": "Hello",
        "created_at": 0
    });
    assert!(serde_json::from_value::<Entry>(blank_name).is_err());

    let blank_text = serde_json::json!({
        "name": "Alice",
        "text": "",
        "created_at": 0
    });
    assert!(serde_json::from_value::<Entry>(blank_text).is_err());
}

#[test]
fn deserialize_rejects_blank_username_in_sets() {
    let value = serde_json::json!({
        "name": "Alice",
        "text": "Hello",
        "created_at": 0,
        "likers": [" "]
    });

    let err = serde_json::from_value::<Entry>(value).unwrap_err();
    assert!(
        err.to_string().contains("blank usernames"),
        "unexpected error: {err}"
    );
}
