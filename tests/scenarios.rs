use stackcfa::Program;

#[test]
fn e1_empty_bytecode_is_invalid() {
    let p = Program::new(Vec::new());
    assert!(!p.is_valid());
    assert!(p.instructions().is_empty());
    assert!(p.blocks().is_empty());
    assert!(p.created_contracts().is_empty());
}

#[test]
fn e2_single_stop() {
    let p = Program::new(vec![0x00]);
    assert_eq!(p.instructions().len(), 1);
    assert_eq!(p.blocks().len(), 1);
    let b0 = &p.blocks()[&0];
    assert!(!b0.is_jump_dest);
    assert!(b0.is_reachable());
    assert!(b0.next.is_empty());
    assert_eq!(b0.entry_states.len(), 1);
    assert!(b0.entry_states.contains_key(&Vec::new()));
}

#[test]
fn e3_push_add_stop_folds_constant() {
    let p = Program::new(vec![0x60, 0x01, 0x60, 0x02, 0x01, 0x00]);
    let add = &p.instructions()[&4];
    assert_eq!(add.opcode.name, "ADD");
    assert!(add.outputs[0].is_constant);
    assert_eq!(add.outputs[0].constant_value, vec![0x03]);
    let b0 = &p.blocks()[&0];
    let (exit_stack, _) = b0.exit_states.iter().next().unwrap();
    assert_eq!(exit_stack.len(), 1);
    assert!(exit_stack[0].is_constant);
}

#[test]
fn e4_unconditional_jump() {
    let p = Program::new(vec![0x60, 0x04, 0x56, 0x5b, 0x00]);
    assert_eq!(p.blocks().len(), 2);
    let b0 = &p.blocks()[&0];
    let b1 = &p.blocks()[&3];
    assert!(b1.is_jump_dest);
    assert!(b0.next.contains(&3));
    assert!(b1.is_reachable());
}

#[test]
fn e5_invalid_jump_records_issue() {
    let p = Program::new(vec![0x60, 0x02, 0x56, 0x00]);
    assert_eq!(p.issues().len(), 1);
    assert_eq!(p.issues()[0].offset, 2);
    assert!(p.blocks()[&0].next.is_empty());
}

#[test]
fn e6_conditional_jumpi_has_two_reachable_successors() {
    let p = Program::new(vec![0x60, 0x06, 0x60, 0x01, 0x57, 0x00, 0x5b, 0x00]);
    assert_eq!(p.blocks().len(), 3);
    let fall = &p.blocks()[&5];
    let branch = &p.blocks()[&6];
    assert!(fall.is_reachable());
    assert!(branch.is_reachable());
    assert!(branch.is_jump_dest);
}

#[test]
fn invariant_partitioning_covers_every_instruction_offset() {
    let p = Program::new(vec![0x60, 0x06, 0x60, 0x01, 0x57, 0x00, 0x5b, 0x00]);
    for offset in p.instructions().keys() {
        let covering = p
            .blocks()
            .values()
            .filter(|b| b.start <= *offset && *offset < b.end)
            .count();
        assert_eq!(covering, 1, "offset {} not covered exactly once", offset);
    }
}

#[test]
fn invariant_entry_block_starts_with_empty_stack() {
    let p = Program::new(vec![0x60, 0x01, 0x00]);
    let entry = &p.blocks()[&0];
    assert!(entry.entry_states.contains_key(&Vec::new()));
}

#[test]
fn invariant_symbol_ids_are_unique_across_two_pushes() {
    let p = Program::new(vec![0x60, 0x01, 0x60, 0x01, 0x00]);
    let first = &p.instructions()[&0].outputs[0];
    let second = &p.instructions()[&2].outputs[0];
    assert_ne!(first.idx, second.idx);
    assert_eq!(first.constant_value, second.constant_value);
}

#[test]
fn invariant_dup_and_swap_preserve_identity() {
    // PUSH1 1; PUSH1 2; DUP2; SWAP1; STOP
    let p = Program::new(vec![0x60, 0x01, 0x60, 0x02, 0x81, 0x90, 0x00]);
    let dup = &p.instructions()[&4];
    assert_eq!(dup.outputs[0].idx, dup.operands[1].idx);
    let swap = &p.instructions()[&5];
    assert_eq!(swap.outputs[0].idx, swap.operands[1].idx);
    assert_eq!(swap.outputs[1].idx, swap.operands[0].idx);
}

#[test]
fn invariant_termination_on_self_looping_cycle() {
    // JUMPDEST; PUSH1 0; JUMP
    let p = Program::new(vec![0x5b, 0x60, 0x00, 0x56]);
    assert_eq!(p.blocks().len(), 1);
    assert!(p.blocks()[&0].is_reachable());
}

#[test]
fn nested_child_contract_is_recursively_analyzed() {
    let code_offset = 12u8;
    let bytes = vec![
        0x60, 0x01, 0x60, code_offset, 0x60, 0x00, 0x39, 0x60, 0x01, 0x60, 0x00, 0xf3, 0x00,
    ];
    let p = Program::new(bytes);
    assert_eq!(p.created_contracts().len(), 1);
    let child = &p.created_contracts()[0];
    assert!(child.is_valid());
    assert_eq!(child.blocks().len(), 1);
}
