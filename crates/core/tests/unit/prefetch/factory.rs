//! Child Factory Tests.

use rlpf_core::common::AccessInfo;
use rlpf_core::config::{ChildConfig, PrefetcherKind};
use rlpf_core::prefetch::build_child;

#[test]
fn built_children_carry_kind_labels() {
    for (kind, label) in [
        (PrefetcherKind::NextLine, "next_line"),
        (PrefetcherKind::Stride, "stride"),
        (PrefetcherKind::Stream, "stream"),
        (PrefetcherKind::Tagged, "tagged"),
    ] {
        assert_eq!(build_child(&ChildConfig::new(kind)).label(), label);
    }
}

#[test]
fn custom_label_is_used() {
    let mut config = ChildConfig::new(PrefetcherKind::NextLine);
    config.label = Some("nl4".to_owned());
    assert_eq!(build_child(&config).label(), "nl4");
}

#[test]
fn built_child_uses_configured_degree() {
    let mut child = build_child(&ChildConfig::new(PrefetcherKind::NextLine).with_degree(3));
    assert_eq!(
        child.observe(&AccessInfo::new(0, 0x1000, false)),
        vec![0x1040, 0x1080, 0x10C0]
    );
}
