// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Test tree construction
//!
//! The tree is a static declaration of the methods a run intends to execute, built
//! once before the first test starts. Classes and methods keep their first-discovered
//! order, and a method listed several times (data-driven invocations) yields a
//! single leaf.

use std::collections::{HashMap, HashSet};

use testinprogress_messages::Event;

use crate::host::{MethodDescriptor, RunContext, run_display_name};
use crate::registry::{IdRegistry, class_key, method_key};

/// Methods declared by one class, in discovery order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassGroup {
    /// Fully qualified class name
    pub class_name: String,
    /// Distinct method names
    pub methods: Vec<String>,
}

/// Run → class → method grouping of a run's declared methods
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestTree {
    /// Display name of the run node
    pub run_name: String,
    /// Classes in discovery order
    pub classes: Vec<ClassGroup>,
}

/// One announced node, ready to become a `TSTTREE` record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeNode {
    /// Node identifier
    pub test_id: String,
    /// Display name
    pub name: String,
    /// Parent identifier, `None` for the run node
    pub parent_id: Option<String>,
    /// Run and class nodes are containers
    pub is_container: bool,
    /// Number of children, 1 for methods
    pub child_count: usize,
}

impl TreeNode {
    /// Convert into the wire event
    #[must_use]
    pub fn into_event(self) -> Event {
        Event::TreeNode {
            test_id: self.test_id,
            name: self.name,
            parent_id: self.parent_id,
            is_container: self.is_container,
            child_count: self.child_count,
        }
    }
}

impl TestTree {
    /// Build the tree of every method the host declared for a run
    #[must_use]
    pub fn build(run: &dyn RunContext) -> Self {
        Self::from_methods(run_display_name(run.test_name()), run.test_methods())
    }

    /// Group methods by declaring class
    #[must_use]
    pub fn from_methods<'a>(
        run_name: &str,
        methods: impl IntoIterator<Item = &'a MethodDescriptor>,
    ) -> Self {
        let mut classes: Vec<ClassGroup> = Vec::new();
        let mut class_index: HashMap<&str, usize> = HashMap::new();
        let mut seen: HashSet<(&str, &str)> = HashSet::new();

        for method in methods {
            if !seen.insert((method.class_name.as_str(), method.method_name.as_str())) {
                continue;
            }
            let idx = *class_index
                .entry(method.class_name.as_str())
                .or_insert_with(|| {
                    classes.push(ClassGroup {
                        class_name: method.class_name.clone(),
                        methods: Vec::new(),
                    });
                    classes.len() - 1
                });
            classes[idx].methods.push(method.method_name.clone());
        }

        Self {
            run_name: run_name.to_string(),
            classes,
        }
    }

    /// Number of classes
    #[must_use]
    pub fn class_count(&self) -> usize {
        self.classes.len()
    }

    /// Number of distinct methods across all classes
    #[must_use]
    pub fn method_count(&self) -> usize {
        self.classes.iter().map(|c| c.methods.len()).sum()
    }

    /// Nodes in announcement order: the run, then each class followed by its methods
    #[must_use]
    pub fn nodes(&self, run_key: &str, registry: &IdRegistry) -> Vec<TreeNode> {
        let run_id = registry.resolve(run_key);
        let mut nodes = Vec::with_capacity(1 + self.class_count() + self.method_count());
        nodes.push(TreeNode {
            test_id: run_id.clone(),
            name: self.run_name.clone(),
            parent_id: None,
            is_container: true,
            child_count: self.class_count(),
        });

        for class in &self.classes {
            let class_id = registry.resolve(&class_key(run_key, &class.class_name));
            nodes.push(TreeNode {
                test_id: class_id.clone(),
                name: class.class_name.clone(),
                parent_id: Some(run_id.clone()),
                is_container: true,
                child_count: class.methods.len(),
            });

            for method_name in &class.methods {
                let method = MethodDescriptor::new(class.class_name.as_str(), method_name.as_str());
                nodes.push(TreeNode {
                    test_id: registry.resolve(&method_key(run_key, &method)),
                    name: method.display_name(),
                    parent_id: Some(class_id.clone()),
                    is_container: false,
                    child_count: 1,
                });
            }
        }
        nodes
    }
}
