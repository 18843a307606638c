//! Module forest builders

use version_align::model::{Artifact, ArtifactKind, GroupArtifact, Module, ModuleForest, ModuleId};

pub const GROUP: &str = "org.foo";

pub fn ga(artifact: &str) -> GroupArtifact {
    GroupArtifact::new(GROUP, artifact)
}

pub fn module(artifact: &str) -> Module {
    Module::new(GROUP, artifact, "1.0")
}

pub fn child_of(parent: &str, artifact: &str) -> Module {
    module(artifact).with_parent(ga(parent))
}

pub fn dependency(group: &str, artifact: &str, version: &str) -> (ArtifactKind, Artifact) {
    (
        ArtifactKind::Dependency,
        Artifact::new(group, artifact, Some(version)),
    )
}

/// root -> child1 -> child2, with `shared.version=1.0` declared only in root
/// and child2 depending on `org.dep:lib:${shared.version}`.
pub fn three_module_chain() -> ModuleForest {
    let (kind, artifact) = dependency("org.dep", "lib", "${shared.version}");
    ModuleForest::new(vec![
        module("root").with_property("shared.version", "1.0"),
        child_of("root", "child1"),
        child_of("child1", "child2").with_artifact(kind, artifact),
    ])
    .unwrap()
}

pub fn id(forest: &ModuleForest, artifact: &str) -> ModuleId {
    forest.find(&ga(artifact)).unwrap()
}

pub fn property<'a>(forest: &'a ModuleForest, artifact: &str, key: &str) -> Option<&'a str> {
    forest
        .module(id(forest, artifact))
        .properties
        .get(key)
        .map(String::as_str)
}
