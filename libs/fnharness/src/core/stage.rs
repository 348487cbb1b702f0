// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

use std::collections::{BTreeMap, BTreeSet};

use fnharness_model::{FunctionSpec, ParDoPayload, SideInputDeclaration, StageDescriptor};

use crate::core::error::{HarnessError, Result};

/// A stage descriptor with its payload decoded and its main input resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedStage {
    pub node_id: String,
    /// Reference to the user function.
    pub user_fn: FunctionSpec,
    pub main_output: String,
    pub main_input: String,
    /// Side-input declarations in label order.
    pub side_inputs: Vec<(String, SideInputDeclaration)>,
    pub inputs: BTreeMap<String, String>,
    pub outputs: BTreeMap<String, String>,
}

impl ParsedStage {
    /// Collection id feeding the main input. `None` if `main_input` is not
    /// a key of `inputs`, which `parse_stage` never produces.
    pub fn main_input_collection(&self) -> Option<&str> {
        self.inputs.get(&self.main_input).map(String::as_str)
    }
}

/// Decode a stage's payload and determine its main input.
///
/// The main input is the single input label that is not declared as a side
/// input.
pub fn parse_stage(node_id: &str, stage: &StageDescriptor) -> Result<ParsedStage> {
    let payload = ParDoPayload::from_msgpack(&stage.spec.payload).map_err(|source| {
        HarnessError::MalformedPayload {
            node_id: node_id.to_string(),
            source,
        }
    })?;

    let side_labels: BTreeSet<&str> = payload.side_inputs.keys().map(String::as_str).collect();
    let candidates: Vec<String> = stage
        .inputs
        .keys()
        .filter(|label| !side_labels.contains(label.as_str()))
        .cloned()
        .collect();

    let main_input = match <[String; 1]>::try_from(candidates) {
        Ok([label]) => label,
        Err(candidates) => {
            return Err(HarnessError::AmbiguousMainInput {
                node_id: node_id.to_string(),
                candidates,
            });
        }
    };

    tracing::debug!(
        "Parsed stage '{}': fn={}, main input '{}', {} side input(s)",
        node_id,
        payload.do_fn.urn,
        main_input,
        payload.side_inputs.len()
    );

    Ok(ParsedStage {
        node_id: node_id.to_string(),
        user_fn: payload.do_fn,
        main_output: payload.main_output,
        main_input,
        side_inputs: payload.side_inputs.into_iter().collect(),
        inputs: stage.inputs.clone(),
        outputs: stage.outputs.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use fnharness_model::urns;

    fn stage_with(payload: ParDoPayload, inputs: &[(&str, &str)]) -> StageDescriptor {
        let mut stage = StageDescriptor::new(urns::PAR_DO_TRANSFORM, payload.to_msgpack().unwrap())
            .with_output("out", "c_out");
        for (label, collection) in inputs {
            stage = stage.with_input(*label, *collection);
        }
        stage
    }

    fn payload() -> ParDoPayload {
        ParDoPayload::new(FunctionSpec::new("urn:fn:identity"), "out")
    }

    #[test]
    fn test_single_input_is_main() {
        let stage = stage_with(payload(), &[("in", "c1")]);

        let parsed = parse_stage("n1", &stage).unwrap();
        assert_eq!(parsed.main_input, "in");
        assert_eq!(parsed.main_input_collection(), Some("c1"));
        assert_eq!(parsed.main_output, "out");
        assert_eq!(parsed.user_fn.urn, "urn:fn:identity");
        assert!(parsed.side_inputs.is_empty());
    }

    #[test]
    fn test_side_input_label_is_excluded() {
        let payload = payload().with_side_input(
            "side",
            SideInputDeclaration::multimap(urns::MULTIMAP_VIEW_FN),
        );
        let stage = stage_with(payload, &[("in", "c1"), ("side", "c2")]);

        let parsed = parse_stage("n1", &stage).unwrap();
        assert_eq!(parsed.main_input, "in");
        assert_eq!(parsed.side_inputs.len(), 1);
        assert_eq!(parsed.side_inputs[0].0, "side");
    }

    #[test]
    fn test_no_main_input() {
        let payload = payload().with_side_input(
            "side",
            SideInputDeclaration::multimap(urns::MULTIMAP_VIEW_FN),
        );
        let stage = stage_with(payload, &[("side", "c2")]);

        let err = parse_stage("n1", &stage).unwrap_err();
        assert!(matches!(
            err,
            HarnessError::AmbiguousMainInput { ref candidates, .. } if candidates.is_empty()
        ));
    }

    #[test]
    fn test_two_main_inputs() {
        let stage = stage_with(payload(), &[("a", "c1"), ("b", "c2")]);

        let err = parse_stage("n1", &stage).unwrap_err();
        match err {
            HarnessError::AmbiguousMainInput {
                node_id,
                candidates,
            } => {
                assert_eq!(node_id, "n1");
                assert_eq!(candidates, vec!["a".to_string(), "b".to_string()]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_unbound_main_input_has_no_collection() {
        let mut parsed = parse_stage("n1", &stage_with(payload(), &[("in", "c1")])).unwrap();
        parsed.main_input = "renamed".to_string();

        assert_eq!(parsed.main_input_collection(), None);
    }

    #[test]
    fn test_malformed_payload() {
        let stage = StageDescriptor::new(urns::PAR_DO_TRANSFORM, vec![0xc1]).with_input("in", "c1");

        let err = parse_stage("n1", &stage).unwrap_err();
        assert!(matches!(err, HarnessError::MalformedPayload { ref node_id, .. } if node_id == "n1"));
        assert!(err.to_string().contains("malformed payload for node 'n1'"));
    }
}
