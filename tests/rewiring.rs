//! Integration tests for identifier remapping, call-site rewiring and the
//! scope patchers.

use scriptscope::prelude::*;

/// Builds a gosub instruction record targeting `callee`.
fn gosub_record(callee: u16, true_byte: u8, false_byte: u8) -> Vec<u8> {
    let mut bytes = 0x000Du16.to_le_bytes().to_vec();
    bytes.push(true_byte);
    bytes.push(false_byte);
    bytes.extend_from_slice(&callee.to_le_bytes());
    bytes.extend_from_slice(&[0; 6]);
    bytes
}

fn routine(id: u16, records: &[Vec<u8>]) -> Result<Routine> {
    let data: Vec<u8> = records.iter().flatten().copied().collect();
    Routine::from_records(ScriptId::new(id), RoutineFormat::Compact, 0, 0, 0, &data)
}

fn mutate_pipeline() -> MutationPipeline {
    let mut pipeline = MutationPipeline::new();
    pipeline.set_mode(PipelineMode::Mutate);
    pipeline
}

#[test]
fn remap_and_rewire_scenario() -> Result<()> {
    // Step 1: a container with an object-local routine 0x1000 and a caller
    // encoding 0x1000 in a 2-byte little-endian field at operand offset 0.
    let mut container = ScriptContainer::new("objects.bin");
    container.insert_routine(routine(0x1000, &[gosub_record(0x0010, 0xFF, 0xFE)])?)?;
    container.insert_routine(routine(0x1001, &[gosub_record(0x1000, 0xFF, 0xFE)])?)?;

    // Step 2: plan the renumbering - start offset 0x1050, avoid set {0x1050},
    // so the first free slot is 0x1051.
    let map = Remapper::new(0x1050)
        .avoid(ScriptId::new(0x1050))
        .remap(&container, &[ScriptId::new(0x1000)], Some(ScopeClass::ObjectLocal))?;
    assert_eq!(map.get(ScriptId::new(0x1000)), Some(ScriptId::new(0x1051)));

    // Step 3: rewire through the pipeline.
    let mut pipeline = mutate_pipeline();
    let report = CallRewirer::rewire(&mut pipeline, &mut container, &map)?;
    assert_eq!(report.committed(), 1);

    // Step 4: the call site's operand bytes are the new identifier, little-endian.
    let caller = container.routine(ScriptId::new(0x1001)).unwrap();
    let operands = caller.instruction(0).unwrap().operands.as_bytes();
    assert_eq!(&operands[0..2], &[0x51, 0x10]);

    // The caller's gosub to the global 0x0010 was not in the map: untouched.
    let callee_site_target = container
        .routine(ScriptId::new(0x1000))
        .unwrap()
        .instruction(0)
        .unwrap()
        .operands
        .read_u16(0)?;
    assert_eq!(callee_site_target, 0x0010);
    Ok(())
}

#[test]
fn remapping_is_a_bijection_onto_unused_destinations() -> Result<()> {
    let mut container = ScriptContainer::new("objects.bin");
    for id in [0x1000u16, 0x1001, 0x1002, 0x1003, 0x1200] {
        container.insert_routine(routine(id, &[gosub_record(0x0010, 0xFF, 0xFE)])?)?;
    }

    let selected = [
        ScriptId::new(0x1000),
        ScriptId::new(0x1001),
        ScriptId::new(0x1002),
        ScriptId::new(0x1003),
    ];
    let avoid = [ScriptId::new(0x1201), ScriptId::new(0x1203)];
    let map = Remapper::new(0x1200)
        .avoid_all(avoid)
        .remap(&container, &selected, None)?;

    // N distinct keys, N distinct values.
    assert_eq!(map.len(), selected.len());
    let values: std::collections::BTreeSet<ScriptId> = map.iter().map(|(_, to)| to).collect();
    assert_eq!(values.len(), selected.len());

    // No value in the avoid set or on an unselected routine.
    for value in &values {
        assert!(!avoid.contains(value));
        assert_ne!(*value, ScriptId::new(0x1200));
    }
    Ok(())
}

#[test]
fn rewiring_with_inverse_restores_bytes_exactly() -> Result<()> {
    let mut container = ScriptContainer::new("objects.bin");
    container.insert_routine(routine(0x1000, &[gosub_record(0x0010, 0xFF, 0xFE)])?)?;
    container.insert_routine(routine(
        0x1001,
        &[
            gosub_record(0x1000, 0x01, 0xFE),
            gosub_record(0x1000, 0xFF, 0xFE),
        ],
    )?)?;

    let originals: Vec<Vec<u8>> = container.routines().map(Routine::to_record_bytes).collect();

    let mut map = IdentifierMap::new();
    map.insert(ScriptId::new(0x1000), ScriptId::new(0x1444))?;

    let mut pipeline = mutate_pipeline();
    let forward = CallRewirer::rewire(&mut pipeline, &mut container, &map)?;
    assert_eq!(forward.committed(), 2);

    let back = CallRewirer::rewire(&mut pipeline, &mut container, &map.invert())?;
    assert_eq!(back.committed(), 2);

    let restored: Vec<Vec<u8>> = container.routines().map(Routine::to_record_bytes).collect();
    assert_eq!(originals, restored);
    Ok(())
}

#[test]
fn global_patch_rejects_out_of_scope_identifier() -> Result<()> {
    // A map claiming to be global but keyed by 0x1100, which is outside the
    // global range.
    let mut container = ScriptContainer::new("objects.bin");
    container.insert_routine(routine(0x1001, &[gosub_record(0x1100, 0xFF, 0xFE)])?)?;
    let before = container
        .routine(ScriptId::new(0x1001))
        .unwrap()
        .to_record_bytes();

    let mut map = IdentifierMap::new();
    map.insert(ScriptId::new(0x1100), ScriptId::new(0x0050))?;

    let mut pipeline = mutate_pipeline();
    let error = GlobalPatcher::patch(&mut pipeline, &mut container, &map).unwrap_err();

    // Rejected with a scope-mismatch reason before any byte is touched.
    assert!(matches!(error, Error::ScopeMismatch { .. }));
    assert!(error.to_string().contains("expected global"));
    let after = container
        .routine(ScriptId::new(0x1001))
        .unwrap()
        .to_record_bytes();
    assert_eq!(before, after);
    assert!(pipeline.audit().is_empty(), "nothing may reach the pipeline");
    Ok(())
}

#[test]
fn full_patch_renumbers_routines_and_callers() -> Result<()> {
    let mut container = ScriptContainer::new("objects.bin");
    container.insert_routine(routine(0x1000, &[gosub_record(0x0010, 0xFF, 0xFE)])?)?;
    container.insert_routine(routine(0x1001, &[gosub_record(0x1000, 0xFF, 0xFE)])?)?;

    let map = Remapper::new(0x1800).remap(
        &container,
        &[ScriptId::new(0x1000)],
        Some(ScopeClass::ObjectLocal),
    )?;

    let mut pipeline = mutate_pipeline();
    let report = ObjectLocalPatcher::patch(&mut pipeline, &mut container, &map)?;

    assert_eq!(report.rewire.committed(), 1);
    assert_eq!(report.renumbered.len(), 1);
    assert!(report.renumbered[0].outcome.is_committed());

    // The routine moved and the caller follows it.
    assert!(!container.contains(ScriptId::new(0x1000)));
    assert!(container.contains(ScriptId::new(0x1800)));
    let encoded = container
        .routine(ScriptId::new(0x1001))
        .unwrap()
        .instruction(0)
        .unwrap()
        .operands
        .read_u16(0)?;
    assert_eq!(encoded, 0x1800);

    // Intra-routine branch targets were never touched.
    let moved = container.routine(ScriptId::new(0x1800)).unwrap();
    assert_eq!(moved.instruction(0).unwrap().true_target, BranchTarget::ReturnTrue);
    Ok(())
}

#[test]
fn override_injection_end_to_end() -> Result<()> {
    // The shared global routine lives outside the object container.
    let shared = routine(0x0010, &[gosub_record(0x0011, 0xFF, 0xFE)])?.with_name("shared tick");

    let mut container = ScriptContainer::new("object.bin");
    container.insert_routine(routine(0x1001, &[gosub_record(0x0010, 0xFF, 0xFE)])?)?;

    let mut pipeline = mutate_pipeline();
    let report = GlobalPatcher::inject_override(
        &mut pipeline,
        &mut container,
        &shared,
        ScriptId::new(0x1900),
    )?;

    assert!(report.insert.is_committed());
    assert_eq!(report.rewire.committed(), 1);

    // The clone shadows the shared routine for this object only.
    let clone = container.routine(ScriptId::new(0x1900)).unwrap();
    assert_eq!(clone.name(), Some("shared tick"));
    assert_eq!(clone.to_record_bytes(), shared.to_record_bytes());

    let encoded = container
        .routine(ScriptId::new(0x1001))
        .unwrap()
        .instruction(0)
        .unwrap()
        .operands
        .read_u16(0)?;
    assert_eq!(encoded, 0x1900);
    Ok(())
}

#[test]
fn per_site_failures_do_not_abort_the_batch() -> Result<()> {
    let mut container = ScriptContainer::new("objects.bin");
    container.insert_routine(routine(0x1001, &[gosub_record(0x1000, 0xFF, 0xFE)])?)?;

    // 0x1000 is claimed by the map but absent from the container.
    let mut map = IdentifierMap::new();
    map.insert(ScriptId::new(0x1000), ScriptId::new(0x1050))?;
    map.insert(ScriptId::new(0x1FF0), ScriptId::new(0x1051))?;

    let mut pipeline = mutate_pipeline();
    let report = ObjectLocalPatcher::patch(&mut pipeline, &mut container, &map)?;

    // Both missing routines reported; the call site still rewires because its
    // encoded target matches a map key.
    assert_eq!(report.missing.len(), 2);
    assert_eq!(report.rewire.committed(), 1);
    assert!(report.renumbered.is_empty());
    Ok(())
}
