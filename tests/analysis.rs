//! Integration tests for decoding and static control-flow analysis.
//!
//! These tests drive the full path from raw record bytes through the decoder into
//! the analyzer, checking the documented branch-sentinel semantics, reachability
//! fixed points and loop detection.

use scriptscope::prelude::*;

/// Builds one compact instruction record.
fn record(opcode: u16, true_byte: u8, false_byte: u8, operands: [u8; 8]) -> Vec<u8> {
    let mut bytes = opcode.to_le_bytes().to_vec();
    bytes.push(true_byte);
    bytes.push(false_byte);
    bytes.extend_from_slice(&operands);
    bytes
}

fn routine_from(records: &[Vec<u8>]) -> Result<Routine> {
    let data: Vec<u8> = records.iter().flatten().copied().collect();
    Routine::from_records(
        ScriptId::new(0x1000),
        RoutineFormat::Compact,
        0,
        0,
        0,
        &data,
    )
}

#[test]
fn three_instruction_loop_scenario() -> Result<()> {
    // Step 1: decode a 3-instruction routine:
    //   0: conditional, true -> 1, false -> 2
    //   1: conditional, true -> 0 (loop), false -> 0xFE (ret-false)
    //   2: true -> 0xFF (ret-true)
    let routine = routine_from(&[
        record(0x0001, 1, 2, [0; 8]),
        record(0x0001, 0, 0xFE, [0; 8]),
        record(0x0001, 0xFF, 0xFF, [0; 8]),
    ])?;

    // Step 2: analyze from entry 0.
    let report = analyze(&routine);

    // Step 3: loop pairs, reachability and its complement.
    assert_eq!(report.loop_pairs, vec![(1, 0)]);
    assert_eq!(
        report.reachable,
        [0, 1, 2].into_iter().collect::<std::collections::BTreeSet<_>>()
    );
    assert!(report.unreachable.is_empty());
    assert!(report.flags.contains(AnalysisFlags::HAS_LOOPS));
    assert!(!report.flags.contains(AnalysisFlags::HAS_UNREACHABLE));

    Ok(())
}

#[test]
fn decoding_is_deterministic() -> Result<()> {
    let data: Vec<u8> = [
        record(0x0000, 1, 1, [1, 2, 3, 4, 5, 6, 7, 8]),
        record(0x9999, 0xFF, 0xFE, [0xAA; 8]),
    ]
    .into_iter()
    .flatten()
    .collect();

    let first = decode_records(RoutineFormat::Compact, &data)?;
    let second = decode_records(RoutineFormat::Compact, &data)?;
    assert_eq!(first, second);

    // Unknown opcode: flagged, nothing fabricated.
    match first[1].annotation() {
        Annotation::Unknown(code) => assert_eq!(code, 0x9999),
        Annotation::Known(_) => panic!("0x9999 must be unknown"),
    }

    // Encoding is the exact inverse.
    assert_eq!(encode_records(&first), data);
    Ok(())
}

#[test]
fn sentinels_are_terminal_and_indices_are_followed() -> Result<()> {
    // Every sentinel byte classifies as routine-terminal.
    for sentinel in [0xFD, 0xFE, 0xFF] {
        let routine = routine_from(&[record(0x0000, sentinel, sentinel, [0; 8])])?;
        let trace = Simulator::new(&routine).run();
        assert_eq!(trace.steps.len(), 1);
        assert!(trace.steps[0].next.is_none());
        assert!(trace.findings.is_empty());
    }

    // Valid indices are followed.
    let routine = routine_from(&[
        record(0x0000, 1, 1, [0; 8]),
        record(0x0000, 0xFF, 0xFF, [0; 8]),
    ])?;
    let trace = Simulator::new(&routine).run();
    assert_eq!(trace.outcome, TraceOutcome::ReturnedTrue);
    assert_eq!(trace.steps[0].next, Some(1));

    // Out-of-range non-sentinel values are findings, never panics.
    let routine = routine_from(&[record(0x0000, 0x20, 0xFF, [0; 8])])?;
    let report = analyze(&routine);
    assert!(report.flags.contains(AnalysisFlags::HAS_MALFORMED_BRANCHES));
    assert!(matches!(
        report.findings[0],
        Finding::BranchOutOfBounds {
            index: 0,
            raw_target: 0x20
        }
    ));
    Ok(())
}

#[test]
fn reachability_is_a_fixed_point() -> Result<()> {
    let routine = routine_from(&[
        record(0x0001, 1, 3, [0; 8]),
        record(0x0001, 2, 0xFE, [0; 8]),
        record(0x0001, 0xFF, 0xFF, [0; 8]),
        record(0x0001, 0xFD, 0xFD, [0; 8]),
        record(0x0001, 0xFF, 0xFF, [0; 8]), // nothing branches here
    ])?;

    let cfg = ControlFlowGraph::build(&routine);
    let first = cfg.reachable_from(0);
    for _ in 0..5 {
        assert_eq!(cfg.reachable_from(0), first);
    }

    // Every reachable index has a resolved-branch path; index 4 has none.
    assert!(first.contains(&3));
    assert!(!first.contains(&4));
    assert_eq!(cfg.unreachable_from(0), [4].into_iter().collect());
    Ok(())
}

#[test]
fn strictly_increasing_routines_have_no_loops() -> Result<()> {
    let routine = routine_from(&[
        record(0x0001, 1, 2, [0; 8]),
        record(0x0001, 2, 3, [0; 8]),
        record(0x0001, 3, 3, [0; 8]),
        record(0x0001, 0xFF, 0xFE, [0; 8]),
    ])?;

    let report = analyze(&routine);
    assert!(report.loop_pairs.is_empty());
    assert!(!report.flags.contains(AnalysisFlags::HAS_LOOPS));
    Ok(())
}

#[test]
fn budget_exhaustion_is_a_reported_outcome() -> Result<()> {
    // 0 -> 1 -> 0 forever on the simulated path.
    let routine = routine_from(&[
        record(0x0000, 1, 1, [0; 8]),
        record(0x0000, 0, 0, [0; 8]),
    ])?;

    let trace = Simulator::with_budget(&routine, 100).run();
    assert_eq!(trace.outcome, TraceOutcome::BudgetExhausted);
    assert_eq!(trace.steps.len(), 100);
    assert!(trace
        .findings
        .contains(&Finding::StepBudgetExhausted { steps: 100 }));

    // The analyzer surfaces it as a flag without panicking; the default budget
    // also cuts this routine off.
    let report = analyze(&routine);
    assert!(report.flags.contains(AnalysisFlags::BUDGET_EXHAUSTED));
    Ok(())
}

#[test]
fn unknown_opcode_census_over_a_container() -> Result<()> {
    let mut container = ScriptContainer::new("objects.bin");
    container.insert_routine(routine_from(&[
        record(0x9001, 0xFF, 0xFF, [0; 8]),
        record(0x0000, 0xFF, 0xFF, [0; 8]),
    ])?)?;

    let data: Vec<u8> = [
        record(0x9001, 0xFF, 0xFF, [0; 8]),
        record(0x9002, 0xFF, 0xFF, [0; 8]),
    ]
    .into_iter()
    .flatten()
    .collect();
    container.insert_routine(Routine::from_records(
        ScriptId::new(0x1001),
        RoutineFormat::Compact,
        0,
        0,
        0,
        &data,
    )?)?;

    let mut census = UnknownOpcodeCensus::new();
    census.scan_container(&container);

    assert_eq!(census.frequency(), vec![(0x9001, 2), (0x9002, 1)]);
    assert_eq!(
        census.sites(0x9001).unwrap(),
        &[(ScriptId::new(0x1000), 0), (ScriptId::new(0x1001), 0)]
    );
    Ok(())
}

#[test]
fn extended_format_analyzes_identically() -> Result<()> {
    // The same control-flow shape in the 16-byte-operand layout.
    let mut data = Vec::new();
    for (t, f) in [(1u8, 2u8), (0, 0xFE), (0xFF, 0xFF)] {
        data.extend_from_slice(&0x0001u16.to_le_bytes());
        data.push(t);
        data.push(f);
        data.extend_from_slice(&[0; 16]);
    }

    let routine = Routine::from_records(
        ScriptId::new(0x1000),
        RoutineFormat::Extended,
        0,
        0,
        0,
        &data,
    )?;
    assert_eq!(routine.instruction(0).unwrap().operands.width(), 16);

    let report = analyze(&routine);
    assert_eq!(report.loop_pairs, vec![(1, 0)]);
    assert!(report.unreachable.is_empty());
    Ok(())
}
