use hotspot::analysis::analyze_hotspots;
use hotspot::domain::{Frame, Sample, BLOCKED_EVENT};
use hotspot::render::{render_call_tree, render_report, render_table, truncate_name, RenderOptions};
use hotspot::session::ReplayFile;

const PLAIN: RenderOptions = RenderOptions { color: false };

fn fixture() -> ReplayFile {
    let json = include_str!("fixtures/foo_bar.json");
    serde_json::from_str(json).expect("Invalid fixture")
}

#[test]
fn test_foo_bar_report() {
    let batch = fixture().batches.remove(0);
    let report = analyze_hotspots(batch);

    // The empty-stack sample neither groups nor counts
    assert_eq!(report.total_weight, 180);
    assert_eq!(report.sample_count, 3);
    assert_eq!(report.skipped_samples, 1);
    assert_eq!(report.hotspots.len(), 2);

    let table = render_table(&report, &PLAIN);
    let rows: Vec<&str> = table.lines().skip(4).take(2).collect();
    assert_eq!(rows[0], format!("  {:<78}{:<20}{:<40}83.33%", "foo", 150, "a.so"));
    assert_eq!(rows[1], format!("  {:<78}{:<20}{:<40}16.67%", "bar", 30, "b.so"));

    let tree = render_call_tree(&report, &PLAIN);
    let lines: Vec<&str> = tree.lines().skip(2).collect();
    assert_eq!(
        lines,
        vec![
            format!("|——{:<110}83.33%", "foo /opt/app/lib/a.so"),
            "  |——main /opt/app/bin/app".to_string(),
            format!("|——{:<110}16.67%", "bar b.so"),
        ]
    );
}

#[test]
fn test_blocked_cycle() {
    let batch = fixture().batches.remove(2);
    let report = analyze_hotspots(batch);
    assert_eq!(report.total_weight, 80);

    // Off-CPU samples rank and weigh like any other
    let blocked = &report.hotspots[0];
    assert!(blocked.group.is_blocked());
    assert!((blocked.percent - 75.0).abs() < 1e-9);

    let table = render_table(&report, &PLAIN);
    let rows: Vec<&str> = table.lines().skip(4).take(2).collect();
    let raw = format!("0x{:x}", 140_312_000_123_456u64);
    assert_eq!(rows[0], format!("  {raw:<78}{:<20}{:<40}75.00%", 60, "UNKNOWN"));
    assert_eq!(rows[1], format!("  {:<78}{:<20}{:<40}25.00%", "0x1b00", 20, "app"));

    let colored = render_table(&report, &RenderOptions { color: true });
    if std::env::var_os("NO_COLOR").is_none() {
        let colored_rows: Vec<&str> = colored.lines().skip(4).take(2).collect();
        assert_ne!(colored_rows[0], rows[0]);
        assert!(colored_rows[0].contains(&raw));
        assert_eq!(colored_rows[1], rows[1]);
    }
}

#[test]
fn test_empty_cycle_report() {
    let batch = fixture().batches.remove(1);
    let report = analyze_hotspots(batch);
    assert!(report.is_empty());

    let out = render_report(2, 3, &report, &PLAIN);
    assert!(out.starts_with("cycle 2/3: 0 samples, total weight 0\n"));
    assert!(out.contains(" Function"));
    assert!(out.contains("Print the call stack of the hotspot function"));
    assert!(!out.lines().any(|l| l.starts_with("|——")));
}

#[test]
fn test_long_symbol_is_truncated_in_table_only() {
    let long_name = format!("{}::{}", "very_long_namespace".repeat(4), "function_name_that_keeps_going_and_going");
    assert!(long_name.len() > 78);

    let report = analyze_hotspots(vec![Sample {
        event_name: "cycles".to_string(),
        weight: 1,
        stack: vec![Frame { symbol_name: Some(long_name.clone()), ..Frame::default() }],
    }]);

    let table = render_table(&report, &PLAIN);
    let row = table.lines().nth(4).unwrap();
    let shown = truncate_name(&long_name);
    assert_eq!(shown.len(), 78);
    assert!(row.starts_with(&format!("  {shown}")));
    assert!(shown.starts_with(&long_name[..38]));
    assert!(shown.ends_with(&long_name[long_name.len() - 37..]));

    // The call tree prints the full identity
    let tree = render_call_tree(&report, &PLAIN);
    assert!(tree.contains(&long_name));
}

#[test]
fn test_blocked_and_on_cpu_same_stack_stay_apart() {
    let frame = Frame { symbol_name: Some("poll".to_string()), ..Frame::default() };
    let report = analyze_hotspots(vec![
        Sample { event_name: "cpu-clock".to_string(), weight: 10, stack: vec![frame.clone()] },
        Sample { event_name: BLOCKED_EVENT.to_string(), weight: 30, stack: vec![frame] },
    ]);
    assert_eq!(report.hotspots.len(), 2);
    assert!(report.hotspots[0].group.is_blocked());
    assert!(!report.hotspots[1].group.is_blocked());
}
