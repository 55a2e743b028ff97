//! Small machine-code programs run through the public API.

use gameboy_cpu::{Cpu, CpuState, Flag, HaltReason, RunOutcome, Snapshot};

/// Load a program at the post-boot entry point, 0x0100.
fn setup_program(program: &[u8]) -> Cpu {
    let mut cpu = Cpu::new();
    cpu.memory.load_at(0x0100, program);
    cpu
}

fn run_to_halt(cpu: &mut Cpu) -> Snapshot {
    match cpu.run(Some(10_000)) {
        RunOutcome::Halted(snapshot) => snapshot,
        other => panic!("program did not halt: {other:?}"),
    }
}

#[test]
fn test_countdown_loop_sums_into_a() {
    let mut cpu = setup_program(&[
        0x06, 0x05, // LD B,5
        0x3E, 0x00, // LD A,0
        0x80, // loop: ADD A,B
        0x05, // DEC B
        0x20, 0xFC, // JR NZ,loop
        0x76, // HALT
    ]);
    let snap = run_to_halt(&mut cpu);

    assert_eq!(snap.reason, Some(HaltReason::HaltInstruction));
    assert_eq!(snap.a, 15);
    assert_eq!(snap.b, 0);
    assert!(snap.zero, "DEC B to zero sets Z");
    assert!(snap.subtract);
    assert!(!snap.carry);
    assert_eq!(snap.pc, 0x0109);
    assert_eq!(snap.executed, 2 + 5 * 3);
}

#[test]
fn test_call_and_return() {
    let mut cpu = setup_program(&[
        0x31, 0xFE, 0xDF, // LD SP,0xDFFE
        0xCD, 0x10, 0x01, // CALL 0x0110
        0x76, // HALT
    ]);
    cpu.memory.load_at(0x0110, &[0x3E, 0x42, 0xC9]); // LD A,0x42; RET
    let snap = run_to_halt(&mut cpu);

    assert_eq!(snap.a, 0x42);
    assert_eq!(snap.sp, 0xDFFE, "RET should rebalance the stack");
    assert_eq!(snap.pc, 0x0107);
    // Return address left behind on the stack, high byte on top
    assert_eq!(cpu.memory.read_byte(0xDFFD), 0x01);
    assert_eq!(cpu.memory.read_byte(0xDFFC), 0x06);
}

#[test]
fn test_push_pop_swaps_pairs() {
    let mut cpu = setup_program(&[
        0x01, 0x34, 0x12, // LD BC,0x1234
        0x11, 0x78, 0x56, // LD DE,0x5678
        0xC5, // PUSH BC
        0xD5, // PUSH DE
        0xC1, // POP BC
        0xD1, // POP DE
        0x76, // HALT
    ]);
    run_to_halt(&mut cpu);

    assert_eq!(cpu.registers.bc(), 0x5678);
    assert_eq!(cpu.registers.de(), 0x1234);
    assert_eq!(cpu.registers.sp, 0xFFFE);
}

#[test]
fn test_hl_post_increment_walks_memory() {
    let mut cpu = setup_program(&[
        0x21, 0x00, 0xC0, // LD HL,0xC000
        0x36, 0xAA, // LD (HL),0xAA
        0x2A, // LD A,(HL+)
        0x32, // LD (HL-),A
        0x76, // HALT
    ]);
    run_to_halt(&mut cpu);

    assert_eq!(cpu.registers.a, 0xAA);
    assert_eq!(cpu.memory.read_byte(0xC001), 0xAA);
    assert_eq!(cpu.registers.hl(), 0xC000);
}

#[test]
fn test_cb_swap_then_bit() {
    let mut cpu = setup_program(&[
        0x3E, 0x0F, // LD A,0x0F
        0xCB, 0x37, // SWAP A
        0xCB, 0x7F, // BIT 7,A
        0x76, // HALT
    ]);
    run_to_halt(&mut cpu);

    assert_eq!(cpu.registers.a, 0xF0);
    assert!(!cpu.registers.get_flag(Flag::Zero), "bit 7 is set");
    assert!(cpu.registers.get_flag(Flag::HalfCarry));
}

#[test]
fn test_unrecognized_opcode_reports_where_it_stopped() {
    let mut cpu = setup_program(&[0x00, 0xD3, 0x00]);
    let snap = run_to_halt(&mut cpu);

    assert_eq!(cpu.state(), CpuState::Halted);
    assert_eq!(snap.reason, Some(HaltReason::UnknownOpcode));
    assert_eq!(snap.pc, 0x0102);
    let text = snap.to_string();
    assert!(text.contains("Instruction 0xD3 at 0x0101 not recognized"), "{text}");
    assert!(text.contains("PC: 0x0102"));
}

#[test]
fn test_ret_on_empty_stack_underflows() {
    let mut cpu = setup_program(&[0xC9]); // RET with SP at 0xFFFE
    let snap = run_to_halt(&mut cpu);

    assert_eq!(snap.reason, Some(HaltReason::StackUnderflow));
    assert_eq!(snap.sp, 0xFFFE, "a failed pop leaves SP alone");
}

#[test]
fn test_push_below_zero_overflows() {
    let mut cpu = setup_program(&[
        0x31, 0x01, 0x00, // LD SP,0x0001
        0xC5, // PUSH BC
    ]);
    let snap = run_to_halt(&mut cpu);

    assert_eq!(snap.reason, Some(HaltReason::StackOverflow));
    assert_eq!(snap.sp, 0x0001);
}

#[test]
fn test_budget_exhaustion_keeps_running_state() {
    let mut cpu = setup_program(&[0x18, 0xFE]); // JR -2
    assert_eq!(cpu.run(Some(100)), RunOutcome::BudgetExhausted { executed: 100 });
    assert_eq!(cpu.state(), CpuState::Running);
    assert_eq!(cpu.snapshot().reason, None);

    // A second run picks up where the first stopped
    assert_eq!(cpu.run(Some(5)), RunOutcome::BudgetExhausted { executed: 5 });
    assert_eq!(cpu.executed(), 105);
}

#[test]
fn test_halted_snapshot_is_stable() {
    let mut cpu = setup_program(&[0x10, 0x00, 0x3C]); // STOP; INC A
    let first = run_to_halt(&mut cpu);
    cpu.step();
    let second = run_to_halt(&mut cpu);

    assert_eq!(first.reason, Some(HaltReason::StopInstruction));
    assert_eq!(first, second);
    assert_eq!(cpu.registers.a, 0x01);
}
