//! Gradient-boosted tree ensemble read from a LightGBM JSON model dump
//! (`Booster.dump_model()`).
//!
//! Only numerical `<=` splits are supported. Missing values follow LightGBM:
//!
//! | `missing_type` | NaN            | 0.0             |
//! |----------------|----------------|-----------------|
//! | `None`         | treated as 0.0 | compared        |
//! | `Zero`         | default side   | default side    |
//! | `NaN`          | default side   | compared        |

use std::path::Path;

use serde::Deserialize;

use crate::error::PredictError;
use crate::refine::check_input;

/// Values with a smaller magnitude count as zero for `missing_type = "Zero"`.
const ZERO_THRESHOLD: f64 = 1e-35;

pub trait Regressor: Send + Sync {
    fn n_features(&self) -> usize;

    fn predict(&self, features: &[f32]) -> Result<f64, PredictError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingType {
    None,
    Zero,
    NaN,
}

impl MissingType {
    fn parse(s: &str) -> Option<Self> {
        match s {
            "None" => Some(Self::None),
            "Zero" => Some(Self::Zero),
            "NaN" => Some(Self::NaN),
            _ => None,
        }
    }
}

/// Transformation applied to the raw ensemble score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputLink {
    Identity,
    /// log-link objectives: poisson, gamma, tweedie
    Exp,
    /// regression objectives trained with `reg_sqrt`: `sign(raw) * raw^2`
    SignedSquare,
}

impl OutputLink {
    /// The dump writes the objective name followed by its parameters,
    /// e.g. `"regression sqrt"` or `"tweedie tweedie_variance_power:1.5"`.
    fn from_objective(objective: &str) -> Option<Self> {
        let mut tokens = objective.split_whitespace();
        let name = tokens.next().unwrap_or("regression");
        let sqrt = tokens.any(|t| t == "sqrt");
        match name {
            "regression" | "regression_l2" | "l2" | "mean_squared_error" | "mse" | "rmse"
            | "regression_l1" | "l1" | "mean_absolute_error" | "mae" | "huber" | "fair"
            | "quantile" | "mape" => Some(if sqrt { Self::SignedSquare } else { Self::Identity }),
            "poisson" | "gamma" | "tweedie" if !sqrt => Some(Self::Exp),
            _ => None,
        }
    }

    fn apply(self, raw: f64) -> f64 {
        match self {
            Self::Identity => raw,
            Self::Exp => raw.exp(),
            Self::SignedSquare => raw.signum() * raw * raw,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Node {
    Split {
        feature: usize,
        threshold: f64,
        default_left: bool,
        missing: MissingType,
        left: usize,
        right: usize,
    },
    Leaf(f64),
}

/// One tree flattened into an arena; the root is node 0.
#[derive(Debug, Clone, PartialEq)]
struct Tree {
    nodes: Vec<Node>,
}

impl Tree {
    fn evaluate(&self, features: &[f32]) -> f64 {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                Node::Leaf(value) => return *value,
                Node::Split {
                    feature,
                    threshold,
                    default_left,
                    missing,
                    left,
                    right,
                } => {
                    let go_left =
                        decide(f64::from(features[*feature]), *threshold, *default_left, *missing);
                    idx = if go_left { *left } else { *right };
                }
            }
        }
    }
}

fn decide(mut value: f64, threshold: f64, default_left: bool, missing: MissingType) -> bool {
    if missing != MissingType::NaN && value.is_nan() {
        value = 0.0;
    }
    let is_missing = match missing {
        MissingType::Zero => value.abs() <= ZERO_THRESHOLD,
        MissingType::NaN => value.is_nan(),
        MissingType::None => false,
    };
    if is_missing {
        default_left
    } else {
        value <= threshold
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TreeEnsemble {
    trees: Vec<Tree>,
    n_features: usize,
    average_output: bool,
    link: OutputLink,
}

impl TreeEnsemble {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, PredictError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| PredictError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let ensemble = Self::from_json(&contents).map_err(|e| PredictError::format(path, e))?;
        tracing::info!(
            path = %path.display(),
            n_trees = ensemble.n_trees(),
            n_features = ensemble.n_features,
            link = ?ensemble.link,
            "regressor loaded"
        );
        Ok(ensemble)
    }

    /// Parse a model dump. Errors are plain messages; [`TreeEnsemble::load`] attaches the path.
    pub fn from_json(json: &str) -> Result<Self, String> {
        let raw: RawModel = serde_json::from_str(json).map_err(|e| e.to_string())?;

        if raw.num_class != 1 || raw.num_tree_per_iteration != 1 {
            return Err(format!(
                "only single-output regression models are supported, got num_class={}",
                raw.num_class
            ));
        }
        let objective = raw.objective.as_deref().unwrap_or("regression");
        let link = OutputLink::from_objective(objective)
            .ok_or_else(|| format!("unsupported objective `{objective}`"))?;
        if raw.tree_info.is_empty() {
            return Err("model contains no trees".to_string());
        }

        let n_features = raw.max_feature_idx + 1;
        let trees = raw
            .tree_info
            .into_iter()
            .map(|info| {
                let mut nodes = Vec::new();
                flatten(info.tree_structure, n_features, &mut nodes)
                    .map_err(|e| format!("tree {}: {e}", info.tree_index))?;
                Ok(Tree { nodes })
            })
            .collect::<Result<Vec<_>, String>>()?;

        Ok(Self {
            trees,
            n_features,
            average_output: raw.average_output,
            link,
        })
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn link(&self) -> OutputLink {
        self.link
    }
}

impl Regressor for TreeEnsemble {
    fn n_features(&self) -> usize {
        self.n_features
    }

    fn predict(&self, features: &[f32]) -> Result<f64, PredictError> {
        check_input("regressor", self.n_features, features)?;
        let mut score: f64 = self.trees.iter().map(|t| t.evaluate(features)).sum();
        if self.average_output {
            score /= self.trees.len() as f64;
        }
        Ok(self.link.apply(score))
    }
}

/// Appends `node` and its subtree to `nodes`, returning its index.
fn flatten(node: RawNode, n_features: usize, nodes: &mut Vec<Node>) -> Result<usize, String> {
    match node {
        RawNode::Leaf { leaf_value } => {
            nodes.push(Node::Leaf(leaf_value));
            Ok(nodes.len() - 1)
        }
        RawNode::Split {
            split_feature,
            threshold,
            decision_type,
            default_left,
            missing_type,
            left_child,
            right_child,
        } => {
            if decision_type != "<=" {
                return Err(format!("unsupported decision type `{decision_type}`"));
            }
            if split_feature >= n_features {
                return Err(format!(
                    "split on feature {split_feature} but model has {n_features} features"
                ));
            }
            let missing = MissingType::parse(&missing_type)
                .ok_or_else(|| format!("unknown missing type `{missing_type}`"))?;

            let idx = nodes.len();
            // placeholder until both children have indices
            nodes.push(Node::Leaf(0.0));
            let left = flatten(*left_child, n_features, nodes)?;
            let right = flatten(*right_child, n_features, nodes)?;
            nodes[idx] = Node::Split {
                feature: split_feature,
                threshold,
                default_left,
                missing,
                left,
                right,
            };
            Ok(idx)
        }
    }
}

fn one() -> usize {
    1
}

#[derive(Deserialize)]
struct RawModel {
    #[serde(default = "one")]
    num_class: usize,
    #[serde(default = "one")]
    num_tree_per_iteration: usize,
    max_feature_idx: usize,
    #[serde(default)]
    objective: Option<String>,
    #[serde(default)]
    average_output: bool,
    tree_info: Vec<RawTree>,
}

#[derive(Deserialize)]
struct RawTree {
    #[serde(default)]
    tree_index: usize,
    tree_structure: RawNode,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawNode {
    Split {
        split_feature: usize,
        threshold: f64,
        decision_type: String,
        default_left: bool,
        missing_type: String,
        left_child: Box<RawNode>,
        right_child: Box<RawNode>,
    },
    Leaf {
        leaf_value: f64,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    /// f0 <= 0.5 ? (f1 <= 10 ? 1 : 2) : 3, plus a constant 0.25 tree.
    fn two_tree_dump(missing_type: &str, default_left: bool) -> String {
        format!(
            r#"{{
  "name": "tree",
  "version": "v4",
  "num_class": 1,
  "num_tree_per_iteration": 1,
  "max_feature_idx": 2,
  "objective": "regression",
  "average_output": false,
  "feature_names": ["f0", "f1", "f2"],
  "tree_info": [
    {{
      "tree_index": 0,
      "num_leaves": 3,
      "shrinkage": 1,
      "tree_structure": {{
        "split_index": 0,
        "split_feature": 0,
        "threshold": 0.5,
        "decision_type": "<=",
        "default_left": {default_left},
        "missing_type": "{missing_type}",
        "left_child": {{
          "split_index": 1,
          "split_feature": 1,
          "threshold": 10.0,
          "decision_type": "<=",
          "default_left": true,
          "missing_type": "None",
          "left_child": {{ "leaf_index": 0, "leaf_value": 1.0 }},
          "right_child": {{ "leaf_index": 1, "leaf_value": 2.0 }}
        }},
        "right_child": {{ "leaf_index": 2, "leaf_value": 3.0 }}
      }}
    }},
    {{ "tree_index": 1, "num_leaves": 1, "tree_structure": {{ "leaf_value": 0.25 }} }}
  ]
}}"#
        )
    }

    #[test]
    fn sums_leaf_values_across_trees() {
        let model = TreeEnsemble::from_json(&two_tree_dump("None", true)).unwrap();
        assert_eq!(model.n_features(), 3);
        assert_eq!(model.n_trees(), 2);

        assert_eq!(model.predict(&[0.0, 5.0, 0.0]).unwrap(), 1.25);
        assert_eq!(model.predict(&[0.5, 11.0, 0.0]).unwrap(), 2.25);
        assert_eq!(model.predict(&[0.6, 0.0, 0.0]).unwrap(), 3.25);
    }

    #[test]
    fn none_missing_type_treats_nan_as_zero() {
        // default_left=false must not matter: NaN becomes 0.0 and goes left by comparison
        let model = TreeEnsemble::from_json(&two_tree_dump("None", false)).unwrap();
        assert_eq!(model.predict(&[f32::NAN, 5.0, 0.0]).unwrap(), 1.25);
    }

    #[test]
    fn nan_missing_type_uses_default_side() {
        let right = TreeEnsemble::from_json(&two_tree_dump("NaN", false)).unwrap();
        assert_eq!(right.predict(&[f32::NAN, 5.0, 0.0]).unwrap(), 3.25);
        // zero is a regular value here
        assert_eq!(right.predict(&[0.0, 5.0, 0.0]).unwrap(), 1.25);
    }

    #[test]
    fn zero_missing_type_routes_zero_and_nan_to_default() {
        let model = TreeEnsemble::from_json(&two_tree_dump("Zero", false)).unwrap();
        assert_eq!(model.predict(&[0.0, 5.0, 0.0]).unwrap(), 3.25);
        assert_eq!(model.predict(&[f32::NAN, 5.0, 0.0]).unwrap(), 3.25);
        assert_eq!(model.predict(&[0.1, 5.0, 0.0]).unwrap(), 1.25);
    }

    #[test]
    fn average_output_and_log_link() {
        let dump = two_tree_dump("None", true)
            .replace(r#""average_output": false"#, r#""average_output": true"#)
            .replace(r#""objective": "regression""#, r#""objective": "poisson max_delta_step:0.7""#);
        let model = TreeEnsemble::from_json(&dump).unwrap();
        assert_eq!(model.link(), OutputLink::Exp);

        let expected = ((3.0f64 + 0.25) / 2.0).exp();
        let got = model.predict(&[1.0, 0.0, 0.0]).unwrap();
        assert!((got - expected).abs() < 1e-12);
    }

    #[test]
    fn sqrt_trained_regression_squares_with_sign() {
        let single_leaf = |objective: &str, leaf: f64| {
            format!(
                r#"{{"max_feature_idx": 0, "objective": "{objective}",
                    "tree_info": [{{"tree_structure": {{"leaf_value": {leaf}}}}}]}}"#
            )
        };

        let model = TreeEnsemble::from_json(&single_leaf("regression sqrt", 10.0)).unwrap();
        assert_eq!(model.link(), OutputLink::SignedSquare);
        assert_eq!(model.predict(&[0.0]).unwrap(), 100.0);

        let model = TreeEnsemble::from_json(&single_leaf("regression_l1 sqrt", -3.0)).unwrap();
        assert_eq!(model.predict(&[0.0]).unwrap(), -9.0);

        let plain = TreeEnsemble::from_json(&single_leaf("huber alpha:0.9", 10.0)).unwrap();
        assert_eq!(plain.link(), OutputLink::Identity);
        assert_eq!(plain.predict(&[0.0]).unwrap(), 10.0);

        assert!(TreeEnsemble::from_json(&single_leaf("poisson sqrt", 1.0)).is_err());
    }

    #[test]
    fn wrong_feature_count_is_a_dimension_error() {
        let model = TreeEnsemble::from_json(&two_tree_dump("None", true)).unwrap();
        assert!(matches!(
            model.predict(&[0.0, 1.0]),
            Err(PredictError::Dimension {
                stage: "regressor",
                expected: 3,
                actual: 2,
            })
        ));
    }

    #[test]
    fn unsupported_models_are_rejected() {
        let categorical = two_tree_dump("None", true)
            .replacen(r#""decision_type": "<=""#, r#""decision_type": "==""#, 1);
        let err = TreeEnsemble::from_json(&categorical).unwrap_err();
        assert!(err.contains("decision type"), "{err}");

        let binary = two_tree_dump("None", true)
            .replace(r#""objective": "regression""#, r#""objective": "binary sigmoid:1""#);
        assert!(TreeEnsemble::from_json(&binary).unwrap_err().contains("objective"));

        let out_of_range = two_tree_dump("None", true)
            .replace(r#""max_feature_idx": 2"#, r#""max_feature_idx": 0"#);
        assert!(TreeEnsemble::from_json(&out_of_range).unwrap_err().contains("feature 1"));

        assert!(TreeEnsemble::from_json(r#"{"max_feature_idx": 0, "tree_info": []}"#).is_err());
    }

    #[test]
    fn load_reports_the_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("regressor.json");
        std::fs::write(&path, "{ not json").unwrap();

        match TreeEnsemble::load(&path) {
            Err(PredictError::ModelFormat { path: reported, .. }) => assert_eq!(reported, path),
            other => panic!("unexpected: {other:?}"),
        }
        assert!(matches!(
            TreeEnsemble::load(dir.path().join("missing.json")),
            Err(PredictError::Io { .. })
        ));
    }
}
