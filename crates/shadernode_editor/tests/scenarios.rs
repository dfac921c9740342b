// SPDX-License-Identifier: MIT OR Apache-2.0
//! End-to-end editing scenarios run through the history.

mod common;

use common::*;
use shadernode_editor::gesture::{self, plan_add_node};
use shadernode_editor::{ConnectionError, History, HistoryError, OperationError};
use shadernode_graph::{swizzle, MappingList, ShaderNodeVariable};

fn attach(
    history: &mut History,
    material: &mut shadernode_graph::MaterialDef,
    source: &ShaderNodeVariable,
    target: &ShaderNodeVariable,
) -> bool {
    match gesture::plan_attach(material, TECHNIQUE, source, target).unwrap() {
        Some(operation) => {
            history.execute(material, operation).unwrap();
            true
        }
        None => false,
    }
}

#[test]
fn test_vertex_output_becomes_varying() {
    let mut material = material();
    let mut history = History::new();

    assert!(attach(
        &mut history,
        &mut material,
        &output("V1", "output"),
        &input("F1", "input", "vec2"),
    ));

    let technique_def = technique(&material);
    let mapping = &technique_def.find_node("F1").unwrap().input_mapping()[0];
    assert_eq!(mapping.right_swizzle(), "xy");
    assert_eq!(mapping.left_swizzle(), "");
    assert!(mapping.right_variable().unwrap().shader_output);

    let varyings = &technique_def.generation_info.varyings;
    assert_eq!(varyings, &vec![output("V1", "output")]);
    assert!(varyings[0].shader_output);
    let swizzled = swizzle::apply(&[1.0, 2.0, 3.0, 4.0], mapping.right_swizzle()).unwrap();
    assert_eq!(swizzled, vec![1.0, 2.0]);

    history.undo(&mut material).unwrap();
    assert!(technique(&material).generation_info.varyings.is_empty());
}

#[test]
fn test_remove_node_restores_dependents() {
    let mut material = material();
    let mut history = History::new();
    attach(&mut history, &mut material, &output("V1", "output"), &input("F1", "input", "vec2"));
    let before = snapshot(&material);

    let events = history
        .execute(
            &mut material,
            Box::new(shadernode_editor::operations::RemoveShaderNodeOperation::new(
                TECHNIQUE,
                "V1",
                [5.0, 5.0],
            )),
        )
        .unwrap();
    let observed = record(&events);
    assert_eq!(observed.removed_nodes, vec!["V1"]);
    assert_eq!(observed.removed_mappings.len(), 1);
    assert_eq!(observed.removed_mappings[0].0, "F1");

    let technique_after = technique(&material);
    assert_eq!(technique_after.node_names(), vec!["F1"]);
    assert!(technique_after.find_node("F1").unwrap().input_mapping().is_empty());

    let events = history.undo(&mut material).unwrap();
    let observed = record(&events);
    assert_eq!(observed.added_nodes, vec![("V1".to_string(), [5.0, 5.0])]);
    assert_eq!(observed.added_mappings.len(), 1);
    assert_eq!(technique(&material).node_index("V1"), Some(0));
    assert_eq!(snapshot(&material), before);
}

#[test]
fn test_added_node_gets_numeric_suffix() {
    let mut material = material();
    let mut history = History::new();
    let add = std::sync::Arc::new(
        shadernode_graph::ShaderNodeDefinition::new("Add", shadernode_graph::ShaderType::Fragment)
            .with_input("a", "float")
            .with_input("b", "float")
            .with_output("result", "float"),
    );

    let first =
        plan_add_node(&material, TECHNIQUE, std::sync::Arc::clone(&add), [0.0, 0.0]).unwrap();
    assert_eq!(first.node_name(), "Add");
    history.execute(&mut material, Box::new(first)).unwrap();

    let second = plan_add_node(&material, TECHNIQUE, add, [0.0, 0.0]).unwrap();
    assert_eq!(second.node_name(), "Add1");
    history.execute(&mut material, Box::new(second)).unwrap();

    let technique_def = technique(&material);
    assert_eq!(technique_def.node_names(), vec!["V1", "F1", "Add", "Add1"]);
    assert!(technique_def.check_partition());
}

#[test]
fn test_producer_moves_before_consumer() {
    let mut material = ordered_material();
    let mut history = History::new();
    assert_eq!(technique(&material).node_names(), vec!["B", "X", "A"]);

    assert!(attach(
        &mut history,
        &mut material,
        &output("A", "output"),
        &input("B", "input", "vec2"),
    ));
    assert_eq!(technique(&material).node_names(), vec!["A", "B", "X"]);

    history.undo(&mut material).unwrap();
    assert_eq!(technique(&material).node_names(), vec!["B", "X", "A"]);
    assert!(technique(&material).find_node("B").unwrap().input_mapping().is_empty());

    history.redo(&mut material).unwrap();
    assert_eq!(technique(&material).node_names(), vec!["A", "B", "X"]);
}

#[test]
fn test_producer_already_first_keeps_order() {
    let mut material = ordered_material();
    let mut history = History::new();
    attach(&mut history, &mut material, &output("B", "output"), &input("A", "input", "vec2"));
    assert_eq!(technique(&material).node_names(), vec!["B", "X", "A"]);
}

#[test]
fn test_material_parameter_declared_as_uniform() {
    let mut material = material();
    let mut history = History::new();
    let color = ShaderNodeVariable::material_parameter("color", "vec4");

    assert!(attach(&mut history, &mut material, &color, &input("F1", "color", "vec3")));
    let technique_after = technique(&material);
    let mapping = &technique_after.find_node("F1").unwrap().input_mapping()[0];
    assert_eq!(mapping.right_swizzle(), "xyz");
    assert_eq!(technique_after.generation_info.fragment_uniforms, vec![color.clone()]);
    assert!(technique_after.generation_info.vertex_uniforms.is_empty());

    history.undo(&mut material).unwrap();
    assert!(technique(&material).generation_info.fragment_uniforms.is_empty());
}

#[test]
fn test_preexisting_uniform_survives_undo() {
    let mut material = material();
    let color = ShaderNodeVariable::material_parameter("color", "vec4");
    material
        .technique_mut(TECHNIQUE)
        .unwrap()
        .generation_info
        .fragment_uniforms
        .push(color.clone());
    let mut history = History::new();

    attach(&mut history, &mut material, &color, &input("F1", "color", "vec3"));
    assert_eq!(technique(&material).generation_info.fragment_uniforms, vec![color.clone()]);

    history.undo(&mut material).unwrap();
    assert_eq!(technique(&material).generation_info.fragment_uniforms, vec![color]);
}

#[test]
fn test_reattaching_same_mapping_is_skipped() {
    let mut material = material();
    let mut history = History::new();
    let color = ShaderNodeVariable::material_parameter("color", "vec4");
    let target = input("F1", "color", "vec3");

    assert!(attach(&mut history, &mut material, &color, &target));
    assert!(!attach(&mut history, &mut material, &color, &target));
    assert_eq!(history.undo_depth(), 1);
}

#[test]
fn test_reattach_replaces_mapping_in_place() {
    let mut material = material();
    let mut history = History::new();
    let target = input("F1", "input", "vec2");
    attach(&mut history, &mut material, &output("V1", "output"), &target);

    let events = {
        let operation = gesture::plan_attach(
            &material,
            TECHNIQUE,
            &ShaderNodeVariable::material_parameter("color", "vec4"),
            &target,
        )
        .unwrap()
        .unwrap();
        history.execute(&mut material, operation).unwrap()
    };
    assert_eq!(record(&events).replaced_mappings, 1);

    let inputs =
        technique(&material).find_node("F1").unwrap().mappings(MappingList::Input).to_vec();
    assert_eq!(inputs.len(), 1);
    assert_eq!(inputs[0].right_variable().unwrap().name, "color");
}

#[test]
fn test_global_output_takes_single_producer() {
    let mut material = ordered_material();
    let mut history = History::new();
    let color = ShaderNodeVariable::global("color", "vec4");
    for name in ["A", "B", "X"] {
        material
            .technique_mut(TECHNIQUE)
            .unwrap()
            .generation_info
            .mark_unused(name);
    }

    attach(&mut history, &mut material, &output("A", "outColor"), &color);
    attach(&mut history, &mut material, &output("B", "outColor"), &color);

    let technique_after = technique(&material);
    assert!(technique_after.find_node("A").unwrap().output_mapping().is_empty());
    assert_eq!(technique_after.find_node("B").unwrap().output_mapping().len(), 1);
    assert_eq!(technique_after.generation_info.unused_nodes, vec!["X"]);

    history.undo(&mut material).unwrap();
    let technique_after = technique(&material);
    assert_eq!(technique_after.find_node("A").unwrap().output_mapping().len(), 1);
    assert!(technique_after.find_node("B").unwrap().output_mapping().is_empty());
    assert_eq!(technique_after.generation_info.unused_nodes, vec!["B", "X"]);
}

#[test]
fn test_upstream_nodes_reactivated_by_global_attach() {
    let mut material = ordered_material();
    let mut history = History::new();
    for name in ["A", "B", "X"] {
        material
            .technique_mut(TECHNIQUE)
            .unwrap()
            .generation_info
            .mark_unused(name);
    }
    // Feeding A into B makes A used already
    attach(&mut history, &mut material, &output("A", "output"), &input("B", "input", "vec2"));
    assert_eq!(technique(&material).generation_info.unused_nodes, vec!["B", "X"]);

    attach(&mut history, &mut material, &output("X", "output"), &input("A", "input", "vec2"));
    attach(
        &mut history,
        &mut material,
        &output("B", "outColor"),
        &ShaderNodeVariable::global("color", "vec4"),
    );
    assert!(technique(&material).generation_info.unused_nodes.is_empty());
    assert_eq!(technique(&material).compute_unused_nodes(), Vec::<String>::new());
}

#[test]
fn test_rejected_connections() {
    let material = material();
    let reject = |source: &ShaderNodeVariable, target: &ShaderNodeVariable| {
        match gesture::plan_attach(&material, TECHNIQUE, source, target) {
            Err(OperationError::Connection(e)) => e,
            other => panic!("expected a rejected connection, got {other:?}"),
        }
    };

    assert_eq!(
        reject(&output("F1", "output"), &input("V1", "input", "vec4")),
        ConnectionError::StageMismatch {
            variable: "F1.output".to_string(),
            target: shadernode_graph::ShaderType::Vertex,
        }
    );
    assert_eq!(
        reject(&output("F1", "output"), &input("F1", "input", "vec2")),
        ConnectionError::SelfLoop
    );
    assert!(matches!(
        reject(&ShaderNodeVariable::attribute("inPosition", "vec3"), &input("F1", "color", "vec3")),
        ConnectionError::StageMismatch { .. }
    ));
    assert!(matches!(
        gesture::plan_attach(
            &material,
            TECHNIQUE,
            &ShaderNodeVariable::material_parameter("missing", "vec4"),
            &input("F1", "color", "vec3"),
        ),
        Err(OperationError::Graph(_))
    ));
    assert!(matches!(
        HistoryError::from(OperationError::InvalidOperation("x".to_string())),
        HistoryError::Operation(_)
    ));
}
