//! Property-based tests for the backend
//!
//! - Mangling is injective and always yields a legal C++ identifier
//! - `[cppname]` values are accepted exactly when every component is a
//!   C++ identifier
//! - Dispatch emits one case label per branch, in order
//! - Every jump targets a label defined exactly once, after assigning
//!   exactly the join point's parameters
//! - Emission is deterministic

use std::collections::HashSet;

use proptest::prelude::*;

use llnf_emit::name::NameComponent;
use llnf_emit::test_support::*;
use llnf_emit::{declare_foreign_name, mangle, AttributeError, Binding, Body, Environment, Name};

// ============================================================================
// Generators
// ============================================================================

fn arb_component() -> impl Strategy<Value = NameComponent> {
    prop_oneof![
        3 => "[a-zA-Z0-9_'.αλ]{0,4}".prop_map(NameComponent::Str),
        1 => (0u64..1000).prop_map(NameComponent::Num),
    ]
}

fn arb_name() -> impl Strategy<Value = Name> {
    prop::collection::vec(arb_component(), 0..4).prop_map(Name::from_components)
}

/// Shape of a function with join points: arity of each join point, and
/// for each join point and each branch, where it jumps (`None` returns).
#[derive(Debug, Clone)]
struct JoinShape {
    arities: Vec<usize>,
    jp_targets: Vec<Option<usize>>,
    branch_targets: Vec<Option<usize>>,
}

fn arb_join_shape() -> impl Strategy<Value = JoinShape> {
    (prop::collection::vec(0usize..4, 1..5), 1usize..5).prop_flat_map(|(arities, branches)| {
        let n = arities.len();
        // join point i may only jump to an earlier one
        let jp_targets: Vec<BoxedStrategy<Option<usize>>> = (0..n)
            .map(|i| {
                if i == 0 {
                    Just(None).boxed()
                } else {
                    prop::option::of(0..i).boxed()
                }
            })
            .collect();
        let branch_targets = prop::collection::vec(prop::option::of(0..n), branches);
        (Just(arities), jp_targets, branch_targets).prop_map(|(arities, jp_targets, branch_targets)| {
            JoinShape {
                arities,
                jp_targets,
                branch_targets,
            }
        })
    })
}

impl JoinShape {
    /// Variable ids: 0 is the function parameter, join point `i` is
    /// `100 + i`, its parameters are `200 + 10 * i + k`.
    fn jump_to(&self, target: Option<usize>) -> Body {
        match target {
            None => body(vec![], ret(0)),
            Some(j) => {
                let args = vec![0; self.arities[j]];
                body(vec![], jmp(100 + j as u32, &args))
            }
        }
    }

    fn function_body(&self) -> Body {
        let joins: Vec<Binding> = self
            .arities
            .iter()
            .enumerate()
            .map(|(i, arity)| {
                let params = (0..*arity)
                    .map(|k| obj_param(200 + 10 * i as u32 + k as u32))
                    .collect();
                join(100 + i as u32, params, self.jump_to(self.jp_targets[i]))
            })
            .collect();
        let branches = self
            .branch_targets
            .iter()
            .map(|t| self.jump_to(*t))
            .collect();
        body(joins, cases(0, branches))
    }

    /// Label numeral of each join point: the parameter takes 1, then each
    /// join point's parameters and its label are numbered in turn
    fn labels(&self) -> Vec<u32> {
        let mut next = 2u32;
        self.arities
            .iter()
            .map(|arity| {
                let label = next + *arity as u32;
                next = label + 1;
                label
            })
            .collect()
    }

    fn fixture(&self) -> ModuleFixture {
        ModuleFixture::new("Shape", &[]).function(
            "f",
            obj_arrow(1),
            vec![obj_param(0)],
            self.function_body(),
        )
    }
}

// ============================================================================
// Mangling
// ============================================================================

proptest! {
    #[test]
    fn mangling_is_injective(a in arb_name(), b in arb_name()) {
        if a != b {
            prop_assert_ne!(mangle(&a), mangle(&b));
        } else {
            prop_assert_eq!(mangle(&a), mangle(&b));
        }
    }

    #[test]
    fn mangled_names_are_identifiers(name in arb_name()) {
        let mangled = mangle(&name);
        prop_assert!(mangled.starts_with("l_"));
        prop_assert!(mangled.chars().all(|c| c.is_ascii_alphanumeric() || c == '_'), "{}", mangled);
    }

    #[test]
    fn numeric_cppname_components_are_rejected(
        prefix in prop::collection::vec("[a-z]{1,3}", 0..3),
        n in 0u64..100,
    ) {
        let base = prefix.iter().fold(Name::anonymous(), |acc, s| Name::str(&acc, s.as_str()));
        let value = Name::num(&base, n);
        let result = declare_foreign_name(&Environment::new(), &Name::from("f"), &value, true);
        prop_assert_eq!(result.err(), Some(AttributeError::NumericComponent(value)));
    }

    #[test]
    fn identifier_cppnames_are_accepted(parts in prop::collection::vec("[A-Za-z_][A-Za-z0-9_]{0,5}", 1..4)) {
        let value = Name::from_components(parts.into_iter().map(NameComponent::Str).collect());
        let result = declare_foreign_name(&Environment::new(), &Name::from("f"), &value, true);
        prop_assert!(result.is_ok(), "{}", value);
    }

    #[test]
    fn non_identifier_components_are_rejected(
        head in "[a-z]{1,3}",
        bad in "[a-z]{0,2}[-+ ][a-z]{0,2}",
    ) {
        let value = Name::from_components(vec![
            NameComponent::Str(head),
            NameComponent::Str(bad.clone()),
        ]);
        let result = declare_foreign_name(&Environment::new(), &Name::from("f"), &value, true);
        prop_assert_eq!(
            result.err(),
            Some(AttributeError::InvalidIdentifier { name: value, component: bad })
        );
    }
}

// ============================================================================
// Lowering
// ============================================================================

proptest! {
    #[test]
    fn dispatch_emits_one_case_per_branch(k in 1usize..10) {
        let branches = (0..k).map(|_| body(vec![], ret(0))).collect();
        let out = ModuleFixture::new("Dispatch", &[])
            .function("f", obj_arrow(1), vec![obj_param(0)], body(vec![], cases(0, branches)))
            .emit_ok();
        let expected: Vec<u32> = (0..k as u32).collect();
        prop_assert_eq!(case_labels(&out), expected);
    }

    #[test]
    fn jumps_target_defined_labels(shape in arb_join_shape()) {
        let out = shape.fixture().emit_ok();
        let labels = shape.labels();

        let defined = defined_labels(&out);
        let unique: HashSet<u32> = defined.iter().copied().collect();
        prop_assert_eq!(unique.len(), defined.len(), "label defined twice:\n{}", out);
        prop_assert_eq!(&defined, &labels);

        for target in goto_targets(&out) {
            prop_assert!(unique.contains(&target), "goto lbl_{} undefined:\n{}", target, out);
        }
    }

    #[test]
    fn jumps_assign_every_parameter(shape in arb_join_shape()) {
        let out = shape.fixture().emit_ok();
        let labels = shape.labels();
        for (target, assigned) in assignments_before_gotos(&out) {
            let jp = labels.iter().position(|l| *l == target);
            prop_assert!(jp.is_some(), "goto lbl_{} undefined", target);
            if let Some(jp) = jp {
                prop_assert_eq!(assigned, shape.arities[jp], "jump to lbl_{}:\n{}", target, out);
            }
        }
    }

    #[test]
    fn emission_is_deterministic(shape in arb_join_shape()) {
        prop_assert_eq!(shape.fixture().emit_ok(), shape.fixture().emit_ok());
    }
}
