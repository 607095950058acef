//! # Statistics Tests

use pretty_assertions::assert_eq;
use rlpf_core::stats::{ChildStats, ControllerStats, STATS_SECTIONS};

fn sample() -> ControllerStats {
    let mut stats = ControllerStats::new(&["stride", "tagged"]);
    stats.epochs = 10;
    stats.accesses = 400;
    stats.misses = 100;
    stats.explored = 1;
    stats.action_use = vec![7, 3];
    stats.children[0].notifications = 280;
    stats.children[0].issued = 50;
    stats.children[0].useful = 25;
    stats
}

#[test]
fn new_stats_are_zeroed_per_child() {
    let stats = ControllerStats::new(&["a", "b", "c"]);
    assert_eq!(stats.action_use, vec![0, 0, 0]);
    assert_eq!(stats.children.len(), 3);
    assert_eq!(
        stats.children[2],
        ChildStats {
            label: "c".to_owned(),
            ..ChildStats::default()
        }
    );
    assert_eq!(stats.miss_rate(), 0.0);
}

#[test]
fn miss_rate() {
    assert_eq!(sample().miss_rate(), 0.25);
}

#[test]
fn render_all_sections() {
    let text = sample().render_sections(&[]);
    assert!(text.contains("PREFETCH CONTROLLER STATISTICS"));
    assert!(text.contains("miss_rate                25.00%"));
    assert!(text.contains("ACTION USAGE"));
    assert!(text.contains("accuracy: 50.00%"));
}

#[test]
fn render_selected_section_only() {
    let text = sample().render_sections(&["children".to_owned()]);
    assert!(text.contains("CHILDREN"));
    assert!(!text.contains("ACTION USAGE"));
    assert!(!text.contains("miss_rate"));
}

#[test]
fn section_names() {
    assert_eq!(STATS_SECTIONS, &["summary", "actions", "children"]);
}

#[test]
fn json_export() {
    let json = sample().to_json().unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["epochs"], 10);
    assert_eq!(value["action_use"][1], 3);
    assert_eq!(value["children"][0]["label"], "stride");
    assert_eq!(value["children"][0]["useful"], 25);
}
