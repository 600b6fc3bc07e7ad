use stackcfa::registry::Registry;
use stackcfa::report::{disassembly_report, ReportOptions};
use stackcfa::Program;

#[test]
fn disassembly_report_names_blocks_and_exits() {
    let p = Program::new(vec![0x60, 0x04, 0x56, 0x5b, 0x00]);
    let text = disassembly_report(&p, &Registry::empty(), ReportOptions::default());
    assert!(text.contains("/* Block 0 */"));
    assert!(text.contains("loc_1:"));
    assert!(text.contains("Exits to"));
    assert!(text.contains("JUMP"));
}

#[test]
fn disassembly_report_suppresses_stack_ops_by_default() {
    // PUSH1 1; PUSH1 2; DUP2; STOP
    let p = Program::new(vec![0x60, 0x01, 0x60, 0x02, 0x81, 0x00]);
    let text = disassembly_report(&p, &Registry::empty(), ReportOptions::default());
    assert!(!text.contains("DUP2"));

    let shown = disassembly_report(
        &p,
        &Registry::empty(),
        ReportOptions {
            show_stack_ops: true,
            show_unreachable: false,
        },
    );
    assert!(shown.contains("DUP2"));
}

#[test]
fn known_entry_points_render_when_registry_matches() {
    // PUSH4 0xa9059cbb; CALLDATALOAD; EQ; STOP (contrived, not real calldata access)
    let bytes = vec![
        0x63, 0xa9, 0x05, 0x9c, 0xbb, // PUSH4 selector
        0x60, 0x00, // PUSH1 0
        0x14, // EQ
        0x00, // STOP
    ];
    let registry_text = "0xa9059cbb transfer 2 to amount address uint256\n";
    let dir = std::env::temp_dir().join(format!("stackcfa-registry-test-{}", std::process::id()));
    std::fs::write(&dir, registry_text).unwrap();
    let registry = Registry::load(&dir).unwrap();
    let p = Program::new(bytes);
    let text = disassembly_report(&p, &registry, ReportOptions::default());
    std::fs::remove_file(&dir).ok();
    assert!(text.contains("transfer"));
}
